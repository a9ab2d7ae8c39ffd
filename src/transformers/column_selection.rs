//! ## Transformers for selecting columns
//!
//! - **DropFeatures:** Removes columns that carry no signal for the model (identifiers, free text,
//!   leaked targets).
//!
//! Dropping a column the dataset does not have is an error: it almost always means the data and
//! the configuration disagree about the schema.

use crate::exceptions::{TabularPrepError, TabularPrepResult};
use crate::transformers::validate_columns;
use datafusion::prelude::DataFrame;
use datafusion_expr::{ident, Expr};

/// Removes the configured columns from the DataFrame.
#[derive(Debug, Clone)]
pub struct DropFeatures {
    pub columns: Vec<String>,
}

impl DropFeatures {
    const NAME: &'static str = "DropFeatures";

    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// This transformer is stateless; the columns to drop are only checked.
    pub async fn fit(&mut self, df: &DataFrame) -> TabularPrepResult<()> {
        validate_columns(df, Self::NAME, &self.columns)
    }

    /// Returns a new DataFrame without the configured columns.
    pub async fn transform(&self, df: DataFrame) -> TabularPrepResult<DataFrame> {
        validate_columns(&df, Self::NAME, &self.columns)?;
        let exprs: Vec<Expr> = df
            .schema()
            .fields()
            .iter()
            .filter(|field| !self.columns.contains(field.name()))
            .map(|field| ident(field.name()))
            .collect();
        df.select(exprs).map_err(TabularPrepError::from)
    }

    fn inherent_is_stateful(&self) -> bool {
        false
    }
}

crate::impl_transformer!(DropFeatures);
