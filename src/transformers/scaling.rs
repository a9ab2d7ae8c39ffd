//! ## Transformers for rescaling numeric features
//!
//! - **MinMaxScaler:** Maps every column onto [0, 1] using the minimum and maximum seen at fit time.
//!
//! The scaler is the last stage before the classifier, so it insists that every column it sees
//! is numeric.

use crate::exceptions::{TabularPrepError, TabularPrepResult};
use crate::transformers::require_numeric_column;
use approx::abs_diff_eq;
use arrow::datatypes::DataType;
use datafusion::functions_aggregate::expr_fn::{max, min};
use datafusion::prelude::DataFrame;
use datafusion::scalar::ScalarValue;
use datafusion_expr::{cast, ident, lit, Expr};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Minimum and maximum of a column at fit time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

/// State learned by [`MinMaxScaler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxState {
    pub ranges: BTreeMap<String, FeatureRange>,
}

fn as_f64(scalar: ScalarValue) -> Option<f64> {
    match scalar {
        ScalarValue::Float64(value) => value,
        _ => None,
    }
}

/// Computes the min and max of a numeric column.
async fn compute_range(df: &DataFrame, col_name: &str) -> TabularPrepResult<Option<FeatureRange>> {
    let value = cast(ident(col_name), DataType::Float64);
    let batches = df
        .clone()
        .aggregate(
            vec![],
            vec![
                min(value.clone()).alias("min"),
                max(value).alias("max"),
            ],
        )?
        .collect()
        .await?;
    let Some(batch) = batches.iter().find(|batch| batch.num_rows() > 0) else {
        return Ok(None);
    };
    let min_val = as_f64(ScalarValue::try_from_array(batch.column(0), 0)?);
    let max_val = as_f64(ScalarValue::try_from_array(batch.column(1), 0)?);
    Ok(min_val
        .zip(max_val)
        .map(|(min, max)| FeatureRange { min, max }))
}

/// Rescales every column to `(x - min) / (max - min)` as `Float64`.
///
/// A column that was constant at fit time is treated as having a range of 1, so it maps to
/// `x - min`: the fitted constant becomes 0 and later values keep their offset from it.
#[derive(Debug, Clone, Default)]
pub struct MinMaxScaler {
    state: Option<MinMaxState>,
}

impl MinMaxScaler {
    const NAME: &'static str = "MinMaxScaler";

    pub fn new() -> Self {
        Self { state: None }
    }

    /// Rebuild a fitted scaler from previously learned state.
    pub fn from_state(state: MinMaxState) -> Self {
        Self { state: Some(state) }
    }

    pub fn state(&self) -> Option<&MinMaxState> {
        self.state.as_ref()
    }

    /// Learn the range of every column. All columns must be numeric.
    pub async fn fit(&mut self, df: &DataFrame) -> TabularPrepResult<()> {
        let mut ranges = BTreeMap::new();
        for field in df.schema().fields() {
            let col_name = field.name();
            require_numeric_column(df, Self::NAME, col_name)?;
            let range = compute_range(df, col_name).await?.ok_or_else(|| {
                TabularPrepError::InvalidParameter(format!(
                    "{}: column '{}' has no non-missing values to compute a range from",
                    Self::NAME,
                    col_name
                ))
            })?;
            debug!(column = %col_name, min = range.min, max = range.max, "learned feature range");
            ranges.insert(col_name.to_string(), range);
        }
        self.state = Some(MinMaxState { ranges });
        Ok(())
    }

    /// Returns a new DataFrame with every fitted column rescaled.
    pub async fn transform(&self, df: DataFrame) -> TabularPrepResult<DataFrame> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| TabularPrepError::unfit(Self::NAME))?;
        for field in df.schema().fields() {
            require_numeric_column(&df, Self::NAME, field.name())?;
        }
        for col_name in state.ranges.keys() {
            require_numeric_column(&df, Self::NAME, col_name)?;
        }
        let exprs: Vec<Expr> = df
            .schema()
            .fields()
            .iter()
            .map(|field| {
                let name = field.name();
                match state.ranges.get(name) {
                    Some(range) => scaled_expr(name, range).alias(name),
                    None => ident(name),
                }
            })
            .collect();
        df.select(exprs).map_err(TabularPrepError::from)
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

fn scaled_expr(name: &str, range: &FeatureRange) -> Expr {
    let value = cast(ident(name), DataType::Float64);
    let span = range.max - range.min;
    if abs_diff_eq!(span, 0.0) {
        value - lit(range.min)
    } else {
        (value - lit(range.min)) / lit(span)
    }
}

crate::impl_transformer!(MinMaxScaler);
