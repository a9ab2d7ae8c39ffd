//! ## Transformers for creating new features
//!
//! - **TemporalVariableEstimator:** Replaces temporal columns (e.g. a construction year) by their
//!   distance to a reference column (e.g. the year of the sale).
//!
//! Target and reference columns must exist and be numeric.

use crate::exceptions::{TabularPrepError, TabularPrepResult};
use crate::transformers::require_numeric_column;
use datafusion::prelude::DataFrame;
use datafusion_expr::{ident, Expr};

/// Replaces every target column with `reference - column`.
#[derive(Debug, Clone)]
pub struct TemporalVariableEstimator {
    pub columns: Vec<String>,
    pub reference: String,
}

impl TemporalVariableEstimator {
    const NAME: &'static str = "TemporalVariableEstimator";

    pub fn new(columns: Vec<String>, reference: String) -> Self {
        Self { columns, reference }
    }

    fn validate(&self, df: &DataFrame) -> TabularPrepResult<()> {
        require_numeric_column(df, Self::NAME, &self.reference)?;
        for col_name in &self.columns {
            require_numeric_column(df, Self::NAME, col_name)?;
        }
        Ok(())
    }

    /// This transformer is stateless; the target and reference columns are only checked.
    pub async fn fit(&mut self, df: &DataFrame) -> TabularPrepResult<()> {
        self.validate(df)
    }

    /// Returns a new DataFrame where every target column holds its distance to the reference.
    pub async fn transform(&self, df: DataFrame) -> TabularPrepResult<DataFrame> {
        self.validate(&df)?;
        let exprs: Vec<Expr> = df
            .schema()
            .fields()
            .iter()
            .map(|field| {
                let name = field.name();
                if self.columns.contains(name) {
                    (ident(self.reference.as_str()) - ident(name)).alias(name)
                } else {
                    ident(name)
                }
            })
            .collect();
        df.select(exprs).map_err(TabularPrepError::from)
    }

    fn inherent_is_stateful(&self) -> bool {
        false
    }
}

crate::impl_transformer!(TemporalVariableEstimator);
