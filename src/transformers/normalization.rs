//! ## Transformers for normalizing raw categorical text
//!
//! - **CategoricalToNumerical**: Turns numbers stored as text (e.g. `"1,234"`) into `Float64`.
//! - **BestEffortLabelExtraction**: Keeps only the first label of comma-joined multi-label strings.
//!
//! Both transformers are stateless. `CategoricalToNumerical` fails on a value it cannot parse;
//! `BestEffortLabelExtraction` never fails because of cell contents and leaves columns it cannot
//! split unchanged. That leniency belongs to label extraction only.

use crate::exceptions::{TabularPrepError, TabularPrepResult};
use crate::transformers::{column_type, is_text_type, validate_columns};
use arrow::datatypes::DataType;
use datafusion::prelude::DataFrame;
use datafusion::scalar::ScalarValue;
use datafusion_expr::{cast, ident, lit, try_cast, Expr};
use datafusion_functions::string;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Character separating thousands in numbers stored as text.
const THOUSANDS_SEPARATOR: &str = ",";

/// Character separating the labels of a multi-label string.
const LABEL_SEPARATOR: &str = ",";

/// Trims surrounding whitespace and removes every thousands separator.
fn strip_separators(e: Expr) -> Expr {
    let trimmed = string::btrim().call(vec![e]);
    string::replace().call(vec![trimmed, lit(THOUSANDS_SEPARATOR), lit("")])
}

/// Selects every column of `df`, replacing the ones present in `replacements`.
fn replace_columns(
    df: DataFrame,
    replacements: &BTreeMap<&str, Expr>,
) -> TabularPrepResult<DataFrame> {
    let exprs: Vec<Expr> = df
        .schema()
        .fields()
        .iter()
        .map(|field| {
            let name = field.name();
            match replacements.get(name.as_str()) {
                Some(expr) => expr.clone().alias(name),
                None => ident(name),
            }
        })
        .collect();
    df.select(exprs).map_err(TabularPrepError::from)
}

/// Casts text columns holding formatted numbers to `Float64`.
///
/// Surrounding whitespace and thousands separators are removed before parsing. Missing values
/// stay missing. Columns that are already numeric are only cast to `Float64`.
#[derive(Debug, Clone)]
pub struct CategoricalToNumerical {
    pub columns: Vec<String>,
}

impl CategoricalToNumerical {
    const NAME: &'static str = "CategoricalToNumerical";

    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// This transformer is stateless; the target columns are only checked.
    pub async fn fit(&mut self, df: &DataFrame) -> TabularPrepResult<()> {
        validate_columns(df, Self::NAME, &self.columns)
    }

    /// Fails with a conversion error naming the first non-missing value that does not parse.
    async fn check_convertible(
        &self,
        df: &DataFrame,
        col_name: &str,
        cleaned: Expr,
    ) -> TabularPrepResult<()> {
        let offending = df
            .clone()
            .filter(
                ident(col_name)
                    .is_not_null()
                    .and(try_cast(cleaned, DataType::Float64).is_null()),
            )?
            .select(vec![cast(ident(col_name), DataType::Utf8).alias("value")])?
            .limit(0, Some(1))?
            .collect()
            .await?;
        for batch in offending {
            if batch.num_rows() > 0 {
                let value = ScalarValue::try_from_array(batch.column(0), 0)?;
                return Err(TabularPrepError::Conversion {
                    transformer: Self::NAME.to_string(),
                    column: col_name.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Returns a new DataFrame with every target column converted to `Float64`.
    pub async fn transform(&self, df: DataFrame) -> TabularPrepResult<DataFrame> {
        let mut converted = BTreeMap::new();
        for col_name in &self.columns {
            let data_type = column_type(&df, Self::NAME, col_name)?;
            let expr = if is_text_type(&data_type) {
                let cleaned = strip_separators(ident(col_name));
                self.check_convertible(&df, col_name, cleaned.clone())
                    .await?;
                cast(cleaned, DataType::Float64)
            } else if data_type.is_numeric() || data_type == DataType::Null {
                cast(ident(col_name), DataType::Float64)
            } else {
                return Err(TabularPrepError::schema_mismatch(
                    Self::NAME,
                    col_name,
                    format!("cannot read numbers from a {} column", data_type),
                ));
            };
            converted.insert(col_name.as_str(), expr);
        }
        replace_columns(df, &converted)
    }

    fn inherent_is_stateful(&self) -> bool {
        false
    }
}

/// Keeps the first comma-delimited label of every cell in the target columns.
///
/// Extraction is best effort: a target column whose cells are not text cannot be split and is
/// passed through unchanged instead of failing the whole transform. A missing target column is
/// still a schema mismatch.
#[derive(Debug, Clone)]
pub struct BestEffortLabelExtraction {
    pub columns: Vec<String>,
}

impl BestEffortLabelExtraction {
    const NAME: &'static str = "BestEffortLabelExtraction";

    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// This transformer is stateless; the target columns are only checked.
    pub async fn fit(&mut self, df: &DataFrame) -> TabularPrepResult<()> {
        validate_columns(df, Self::NAME, &self.columns)
    }

    /// Returns a new DataFrame where every text cell of the target columns holds its first label.
    pub async fn transform(&self, df: DataFrame) -> TabularPrepResult<DataFrame> {
        let mut extracted = BTreeMap::new();
        for col_name in &self.columns {
            let data_type = column_type(&df, Self::NAME, col_name)?;
            if is_text_type(&data_type) {
                let first_label = string::split_part().call(vec![
                    ident(col_name),
                    lit(LABEL_SEPARATOR),
                    lit(1_i64),
                ]);
                extracted.insert(col_name.as_str(), first_label);
            } else if data_type == DataType::Null {
                debug!(column = %col_name, "no labels to extract from an all-missing column");
            } else {
                warn!(
                    column = %col_name,
                    data_type = %data_type,
                    "cannot split labels of a non-text column, leaving it unchanged"
                );
            }
        }
        replace_columns(df, &extracted)
    }

    fn inherent_is_stateful(&self) -> bool {
        false
    }
}

crate::impl_transformer!(CategoricalToNumerical);
crate::impl_transformer!(BestEffortLabelExtraction);
