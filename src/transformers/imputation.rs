//! ## Transformers for imputing missing values
//!
//! - **NumericalImputer**: Learns the mode of every numeric column and fills its missing values with it.
//! - **CategoricalImputer**: Fills missing values of the given text columns with the `"Missing"` label.
//!
//! Each transformer returns a new DataFrame; columns that are not targeted pass through untouched.
//! Errors are returned as `TabularPrepError` and results are wrapped in `TabularPrepResult`.

use crate::exceptions::{TabularPrepError, TabularPrepResult};
use crate::transformers::{
    numeric_value_counts, require_numeric_column, require_text_column, validate_columns,
};
use datafusion::prelude::DataFrame;
use datafusion_expr::expr::Case;
use datafusion_expr::{cast, ident, lit, not, Expr};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Label substituted for missing categorical values.
pub const MISSING_LABEL: &str = "Missing";

/// Constructs an expression equivalent to SQL COALESCE(col, fallback).
fn coalesce_expr_for(name: &str, fallback: Expr) -> Expr {
    Expr::Case(Case {
        expr: None,
        when_then_expr: vec![(
            Box::new(not(ident(name).is_null())),
            Box::new(ident(name)),
        )],
        else_expr: Some(Box::new(fallback)),
    })
}

/// Replaces every target column for which `get_fallback` returns an expression by
/// `COALESCE(column, fallback)`; all other columns are kept as they are.
fn apply_imputation<F>(df: DataFrame, get_fallback: F) -> TabularPrepResult<DataFrame>
where
    F: Fn(&str) -> Option<Expr>,
{
    let exprs: Vec<Expr> = df
        .schema()
        .fields()
        .iter()
        .map(|field| {
            let name = field.name();
            match get_fallback(name) {
                Some(fallback_expr) => coalesce_expr_for(name, fallback_expr).alias(name),
                None => ident(name),
            }
        })
        .collect();
    df.select(exprs).map_err(TabularPrepError::from)
}

/// Picks the most frequent value; ties go to the smallest value.
fn mode_of(counts: &[(f64, i64)]) -> Option<f64> {
    counts
        .iter()
        .copied()
        .reduce(|best, candidate| {
            let smaller = candidate.0.total_cmp(&best.0).is_lt();
            if candidate.1 > best.1 || (candidate.1 == best.1 && smaller) {
                candidate
            } else {
                best
            }
        })
        .map(|(value, _)| value)
}

/// State learned by [`NumericalImputer`]: the fill value of every numeric column seen at fit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericalImputerState {
    pub fill_values: BTreeMap<String, f64>,
}

/// Replaces missing values in numeric columns with the column's mode.
///
/// The numeric columns are detected from the schema of the DataFrame given to `fit`.
/// Floating-point `NaN` is not missing: it is neither counted towards the mode nor filled.
#[derive(Debug, Clone, Default)]
pub struct NumericalImputer {
    state: Option<NumericalImputerState>,
}

impl NumericalImputer {
    const NAME: &'static str = "NumericalImputer";

    /// Create a new, unfitted imputer.
    pub fn new() -> Self {
        Self { state: None }
    }

    /// Rebuild a fitted imputer from previously learned state.
    pub fn from_state(state: NumericalImputerState) -> Self {
        Self { state: Some(state) }
    }

    /// The learned fill values, if the imputer has been fitted.
    pub fn state(&self) -> Option<&NumericalImputerState> {
        self.state.as_ref()
    }

    /// Compute the mode of every numeric column.
    pub async fn fit(&mut self, df: &DataFrame) -> TabularPrepResult<()> {
        let numeric_columns: Vec<String> = df
            .schema()
            .fields()
            .iter()
            .filter(|field| field.data_type().is_numeric())
            .map(|field| field.name().to_string())
            .collect();

        let mut fill_values = BTreeMap::new();
        for col_name in &numeric_columns {
            let counts = numeric_value_counts(df, col_name).await?;
            let mode = mode_of(&counts).ok_or_else(|| {
                TabularPrepError::InvalidParameter(format!(
                    "{}: column '{}' has no non-missing values to compute a mode from",
                    Self::NAME,
                    col_name
                ))
            })?;
            debug!(column = %col_name, mode, "learned numeric fill value");
            fill_values.insert(col_name.clone(), mode);
        }
        self.state = Some(NumericalImputerState { fill_values });
        Ok(())
    }

    /// Returns a new DataFrame where missing values of every fitted column are replaced with its mode.
    pub async fn transform(&self, df: DataFrame) -> TabularPrepResult<DataFrame> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| TabularPrepError::unfit(Self::NAME))?;
        let mut fallbacks = BTreeMap::new();
        for (col_name, value) in &state.fill_values {
            let data_type = require_numeric_column(&df, Self::NAME, col_name)?;
            // Keep the column's own type; the mode of an integer column is an integer.
            fallbacks.insert(col_name.as_str(), cast(lit(*value), data_type));
        }
        apply_imputation(df, |name| fallbacks.get(name).cloned())
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

/// Replaces missing values in the given text columns with [`MISSING_LABEL`].
///
/// The fill label is fixed rather than learned, so the imputer carries no state.
#[derive(Debug, Clone)]
pub struct CategoricalImputer {
    pub columns: Vec<String>,
}

impl CategoricalImputer {
    const NAME: &'static str = "CategoricalImputer";

    /// Create a new categorical imputer for the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// Nothing is learned; the target columns are only checked.
    pub async fn fit(&mut self, df: &DataFrame) -> TabularPrepResult<()> {
        validate_columns(df, Self::NAME, &self.columns)
    }

    /// Returns a new DataFrame where missing values of the target columns are replaced with `"Missing"`.
    pub async fn transform(&self, df: DataFrame) -> TabularPrepResult<DataFrame> {
        for col_name in &self.columns {
            require_text_column(&df, Self::NAME, col_name)?;
        }
        apply_imputation(df, |name| {
            if self.columns.iter().any(|c| c == name) {
                Some(lit(MISSING_LABEL))
            } else {
                None
            }
        })
    }

    fn inherent_is_stateful(&self) -> bool {
        false
    }
}

crate::impl_transformer!(NumericalImputer);
crate::impl_transformer!(CategoricalImputer);
