//! # Transformer Implementations
//!
//! The submodules contain the transformers that make up the preprocessing recipe.
//! Shared helpers for schema checks and value counting live here.

pub mod categorical_encoding;
pub mod column_selection;
pub mod feature_creation;
pub mod imputation;
pub mod normalization;
pub mod scaling;

use crate::exceptions::{TabularPrepError, TabularPrepResult};
use arrow::array::{Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use datafusion::functions_aggregate::expr_fn::count;
use datafusion::prelude::DataFrame;
use datafusion_expr::{cast, ident, lit};

/// Returns true for the Arrow string types.
pub(crate) fn is_text_type(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
    )
}

/// Returns the data type of a column, or a schema mismatch naming `transformer` if it is absent.
pub(crate) fn column_type(
    df: &DataFrame,
    transformer: &str,
    col_name: &str,
) -> TabularPrepResult<DataType> {
    df.schema()
        .field_with_name(None, col_name)
        .map(|field| field.data_type().clone())
        .map_err(|_| TabularPrepError::schema_mismatch(transformer, col_name, "column not found"))
}

/// Validates that every column in `target_cols` exists in the DataFrame.
pub(crate) fn validate_columns(
    df: &DataFrame,
    transformer: &str,
    target_cols: &[String],
) -> TabularPrepResult<()> {
    for col_name in target_cols {
        column_type(df, transformer, col_name)?;
    }
    Ok(())
}

/// Validates that a column exists and holds text.
pub(crate) fn require_text_column(
    df: &DataFrame,
    transformer: &str,
    col_name: &str,
) -> TabularPrepResult<()> {
    let data_type = column_type(df, transformer, col_name)?;
    // A column of nothing but nulls has no text type yet but coerces to one.
    if is_text_type(&data_type) || data_type == DataType::Null {
        Ok(())
    } else {
        Err(TabularPrepError::schema_mismatch(
            transformer,
            col_name,
            format!("expected a text column, found {}", data_type),
        ))
    }
}

/// Validates that a column exists and is numeric, returning its type.
pub(crate) fn require_numeric_column(
    df: &DataFrame,
    transformer: &str,
    col_name: &str,
) -> TabularPrepResult<DataType> {
    let data_type = column_type(df, transformer, col_name)?;
    if data_type.is_numeric() {
        Ok(data_type)
    } else {
        Err(TabularPrepError::schema_mismatch(
            transformer,
            col_name,
            format!("expected a numeric column, found {}", data_type),
        ))
    }
}

fn downcast_error(col_name: &str, expected: &str) -> TabularPrepError {
    TabularPrepError::DataFusionError(datafusion::error::DataFusionError::Plan(format!(
        "Expected {} array for column {}",
        expected, col_name
    )))
}

/// Counts the occurrences of every non-missing value of a column, read as text.
pub(crate) async fn text_value_counts(
    df: &DataFrame,
    col_name: &str,
) -> TabularPrepResult<Vec<(String, i64)>> {
    let grouped = df
        .clone()
        .filter(ident(col_name).is_not_null())?
        .select(vec![cast(ident(col_name), DataType::Utf8).alias("value")])?
        .aggregate(vec![ident("value")], vec![count(lit(1)).alias("cnt")])?;
    let batches = grouped.collect().await?;
    let mut counts = Vec::new();
    for batch in batches {
        let values = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| downcast_error(col_name, "Utf8"))?;
        let cnt = batch
            .column(1)
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| downcast_error(col_name, "Int64"))?;
        for i in 0..batch.num_rows() {
            if !values.is_null(i) {
                counts.push((values.value(i).to_string(), cnt.value(i)));
            }
        }
    }
    Ok(counts)
}

/// Counts the occurrences of every non-missing value of a numeric column.
///
/// `NaN` is not a value to learn from and is left out of the counts.
pub(crate) async fn numeric_value_counts(
    df: &DataFrame,
    col_name: &str,
) -> TabularPrepResult<Vec<(f64, i64)>> {
    let grouped = df
        .clone()
        .filter(ident(col_name).is_not_null())?
        .select(vec![cast(ident(col_name), DataType::Float64).alias("value")])?
        .aggregate(vec![ident("value")], vec![count(lit(1)).alias("cnt")])?;
    let batches = grouped.collect().await?;
    let mut counts = Vec::new();
    for batch in batches {
        let values = batch
            .column(0)
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| downcast_error(col_name, "Float64"))?;
        let cnt = batch
            .column(1)
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| downcast_error(col_name, "Int64"))?;
        for i in 0..batch.num_rows() {
            if !values.is_null(i) && !values.value(i).is_nan() {
                counts.push((values.value(i), cnt.value(i)));
            }
        }
    }
    Ok(counts)
}
