//! ## Dataset ingestion
//!
//! Transformers operate on DataFusion [`DataFrame`]s. The column types of a dataset are fixed
//! when it is ingested through one of the helpers below and travel with it in the schema, so
//! no transformer has to guess whether a column is numeric or textual.
//!
//! The sessions created here run every plan in a single partition. Transformers only project
//! columns, so a single partition keeps rows in their original order from ingestion to the
//! classifier.

use crate::exceptions::{TabularPrepError, TabularPrepResult};
use arrow::record_batch::RecordBatch;
use datafusion::prelude::{
    CsvReadOptions, DataFrame, ParquetReadOptions, SessionConfig, SessionContext,
};
use std::path::Path;

/// Creates a session whose plans preserve row order.
pub fn session_context() -> SessionContext {
    SessionContext::new_with_config(SessionConfig::new().with_target_partitions(1))
}

/// Wraps an in-memory record batch in a DataFrame.
pub fn dataframe_from_batch(batch: RecordBatch) -> TabularPrepResult<DataFrame> {
    session_context()
        .read_batch(batch)
        .map_err(TabularPrepError::from)
}

/// Loads a CSV or Parquet file, choosing the reader from the file extension.
pub async fn load_data(path: &str) -> TabularPrepResult<DataFrame> {
    let ctx = session_context();
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    let df = match extension.as_deref() {
        Some("parquet") => ctx.read_parquet(path, ParquetReadOptions::default()).await?,
        Some("csv") => ctx.read_csv(path, CsvReadOptions::new()).await?,
        _ => {
            return Err(TabularPrepError::UnsupportedFormat(format!(
                "'{}': expected a .csv or .parquet file",
                path
            )))
        }
    };
    Ok(df)
}

/// Returns the column names of a DataFrame in schema order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.schema()
        .fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect()
}
