//! # Categorical Encoding Transformers
//!
//! - **RareLabelEncoder:** Groups infrequent categories into a single `"Rare"` label.
//! - **OneHotEncoder:** Expands categorical columns into numeric indicator columns.
//!
//! Both encoders learn per-column state in an asynchronous `fit` and apply it unchanged in
//! `transform`. Their state is plain data and can be saved and handed back through `from_state`.

use crate::exceptions::{TabularPrepError, TabularPrepResult};
use crate::transformers::{require_text_column, text_value_counts};
use arrow::datatypes::DataType;
use datafusion::prelude::DataFrame;
use datafusion_expr::expr::Case;
use datafusion_expr::{cast, ident, lit, Expr};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Label substituted for categories below the frequency tolerance.
pub const RARE_LABEL: &str = "Rare";

/// Builds `CASE WHEN <cond> THEN <then> ELSE <otherwise> END`.
fn case_expr(condition: Expr, then: Expr, otherwise: Expr) -> Expr {
    Expr::Case(Case {
        expr: None,
        when_then_expr: vec![(Box::new(condition), Box::new(then))],
        else_expr: Some(Box::new(otherwise)),
    })
}

// ------------------------- RareLabelEncoder -------------------------

/// State learned by [`RareLabelEncoder`]: the frequent categories of every target column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RareLabelState {
    pub frequent_labels: BTreeMap<String, BTreeSet<String>>,
}

/// Replaces every category whose training frequency is below `tolerance` with `"Rare"`.
///
/// Frequencies are counts divided by the total number of rows, missing values included, so a
/// missing value is never frequent and becomes `"Rare"` as well.
#[derive(Debug, Clone)]
pub struct RareLabelEncoder {
    columns: Vec<String>,
    tolerance: f64,
    state: Option<RareLabelState>,
}

impl RareLabelEncoder {
    const NAME: &'static str = "RareLabelEncoder";

    /// Create a new encoder. The tolerance must lie in (0, 1].
    pub fn new(columns: Vec<String>, tolerance: f64) -> TabularPrepResult<Self> {
        if !(tolerance > 0.0 && tolerance <= 1.0) {
            return Err(TabularPrepError::InvalidParameter(format!(
                "{}: tolerance {} must be in (0, 1]",
                Self::NAME,
                tolerance
            )));
        }
        Ok(Self {
            columns,
            tolerance,
            state: None,
        })
    }

    /// Rebuild a fitted encoder from previously learned state.
    pub fn from_state(
        columns: Vec<String>,
        tolerance: f64,
        state: RareLabelState,
    ) -> TabularPrepResult<Self> {
        let mut encoder = Self::new(columns, tolerance)?;
        encoder.state = Some(state);
        Ok(encoder)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn state(&self) -> Option<&RareLabelState> {
        self.state.as_ref()
    }

    /// Learn which categories of each target column reach the tolerance.
    pub async fn fit(&mut self, df: &DataFrame) -> TabularPrepResult<()> {
        for col_name in &self.columns {
            require_text_column(df, Self::NAME, col_name)?;
        }
        let total = df.clone().count().await? as f64;
        let mut frequent_labels = BTreeMap::new();
        for col_name in &self.columns {
            let counts = text_value_counts(df, col_name).await?;
            let frequent: BTreeSet<String> = counts
                .into_iter()
                .filter(|(_, cnt)| total > 0.0 && *cnt as f64 / total >= self.tolerance)
                .map(|(label, _)| label)
                .collect();
            debug!(column = %col_name, frequent = frequent.len(), "learned frequent labels");
            frequent_labels.insert(col_name.clone(), frequent);
        }
        self.state = Some(RareLabelState { frequent_labels });
        Ok(())
    }

    /// Returns a new DataFrame where infrequent categories of the target columns read `"Rare"`.
    pub async fn transform(&self, df: DataFrame) -> TabularPrepResult<DataFrame> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| TabularPrepError::unfit(Self::NAME))?;
        let mut replacements = BTreeMap::new();
        for col_name in &self.columns {
            require_text_column(&df, Self::NAME, col_name)?;
            let expr = match state.frequent_labels.get(col_name) {
                Some(frequent) if !frequent.is_empty() => {
                    let list = frequent.iter().map(|label| lit(label.as_str())).collect();
                    case_expr(
                        ident(col_name).in_list(list, false),
                        cast(ident(col_name), DataType::Utf8),
                        lit(RARE_LABEL),
                    )
                }
                Some(_) => lit(RARE_LABEL),
                None => {
                    return Err(TabularPrepError::schema_mismatch(
                        Self::NAME,
                        col_name,
                        "column was not seen when the encoder was fitted",
                    ))
                }
            };
            replacements.insert(col_name.as_str(), expr);
        }
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

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

// ------------------------- OneHotEncoder -------------------------

/// State learned by [`OneHotEncoder`]: the sorted vocabulary of every target column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotState {
    pub vocabularies: BTreeMap<String, Vec<String>>,
}

/// Expands each target column into `Float64` indicator columns named `<column>_<index>`, one
/// per category seen at fit time, and drops the target column.
///
/// Indicator columns are appended after the remaining columns, in target column order and then
/// vocabulary order. A value not in the vocabulary (an unseen category, `"Rare"` if it was never
/// seen, or a missing value) sets every indicator of its column to 0.
#[derive(Debug, Clone)]
pub struct OneHotEncoder {
    columns: Vec<String>,
    state: Option<OneHotState>,
}

impl OneHotEncoder {
    const NAME: &'static str = "OneHotEncoder";

    /// Create a new OneHotEncoder for the specified columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            state: None,
        }
    }

    /// Rebuild a fitted encoder from previously learned state.
    pub fn from_state(columns: Vec<String>, state: OneHotState) -> Self {
        Self {
            columns,
            state: Some(state),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn state(&self) -> Option<&OneHotState> {
        self.state.as_ref()
    }

    /// Names of the indicator columns produced by `transform`, or `None` before fitting.
    pub fn output_columns(&self) -> Option<Vec<String>> {
        let state = self.state.as_ref()?;
        let mut names = Vec::new();
        for col_name in &self.columns {
            let size = state.vocabularies.get(col_name).map_or(0, Vec::len);
            names.extend((0..size).map(|i| format!("{}_{}", col_name, i)));
        }
        Some(names)
    }

    /// Learn the sorted distinct categories of every target column.
    pub async fn fit(&mut self, df: &DataFrame) -> TabularPrepResult<()> {
        for col_name in &self.columns {
            require_text_column(df, Self::NAME, col_name)?;
        }
        let counts = try_join_all(
            self.columns
                .iter()
                .map(|col_name| text_value_counts(df, col_name)),
        )
        .await?;
        let mut vocabularies = BTreeMap::new();
        for (col_name, col_counts) in self.columns.iter().zip(counts) {
            let mut vocabulary: Vec<String> =
                col_counts.into_iter().map(|(label, _)| label).collect();
            vocabulary.sort();
            debug!(column = %col_name, categories = vocabulary.len(), "learned vocabulary");
            vocabularies.insert(col_name.clone(), vocabulary);
        }
        self.state = Some(OneHotState { vocabularies });
        Ok(())
    }

    /// Transform the DataFrame by replacing each target column with its indicator columns.
    pub async fn transform(&self, df: DataFrame) -> TabularPrepResult<DataFrame> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| TabularPrepError::unfit(Self::NAME))?;
        for col_name in &self.columns {
            require_text_column(&df, Self::NAME, col_name)?;
        }

        let mut exprs: Vec<Expr> = df
            .schema()
            .fields()
            .iter()
            .filter(|field| !self.columns.contains(field.name()))
            .map(|field| ident(field.name()))
            .collect();
        for col_name in &self.columns {
            let vocabulary = state.vocabularies.get(col_name).ok_or_else(|| {
                TabularPrepError::schema_mismatch(
                    Self::NAME,
                    col_name,
                    "column was not seen when the encoder was fitted",
                )
            })?;
            for (i, category) in vocabulary.iter().enumerate() {
                exprs.push(
                    case_expr(
                        ident(col_name).eq(lit(category.as_str())),
                        lit(1.0_f64),
                        lit(0.0_f64),
                    )
                    .alias(format!("{}_{}", col_name, i)),
                );
            }
        }
        df.select(exprs).map_err(TabularPrepError::from)
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

crate::impl_transformer!(RareLabelEncoder);
crate::impl_transformer!(OneHotEncoder);
