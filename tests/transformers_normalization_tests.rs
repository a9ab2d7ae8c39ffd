use std::sync::Arc;

use approx::assert_relative_eq;
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use datafusion::prelude::*;

use tabular_prep::dataset::dataframe_from_batch;
use tabular_prep::exceptions::{TabularPrepError, TabularPrepResult};
use tabular_prep::transformers::normalization::{
    BestEffortLabelExtraction, CategoricalToNumerical,
};

/// Creates a DataFrame with:
///   - "attendance": numbers stored as text with thousands separators.
///   - "genres": comma-joined labels.
///   - "rank": an integer column.
fn create_dataframe(attendance: Vec<Option<&str>>) -> DataFrame {
    let rows = attendance.len();
    let schema = Arc::new(Schema::new(vec![
        Field::new("attendance", DataType::Utf8, true),
        Field::new("genres", DataType::Utf8, true),
        Field::new("rank", DataType::Int64, true),
    ]));
    let genres = vec![
        Some("drama,comedy"),
        Some("action"),
        None,
        Some(",horror"),
        Some("a,b,c"),
    ];
    let attendance_array: ArrayRef = Arc::new(StringArray::from(attendance));
    let genres_array: ArrayRef = Arc::new(StringArray::from(genres[..rows].to_vec()));
    let rank_array: ArrayRef = Arc::new(Int64Array::from(
        (0..rows as i64).map(Some).collect::<Vec<_>>(),
    ));
    let batch =
        RecordBatch::try_new(schema, vec![attendance_array, genres_array, rank_array]).unwrap();
    dataframe_from_batch(batch).unwrap()
}

async fn collect_batch(df: DataFrame) -> RecordBatch {
    let batches = df.collect().await.unwrap();
    concat_batches(&batches[0].schema(), &batches).unwrap()
}

fn strings(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    let array =
        cast(batch.column(batch.schema().index_of(name).unwrap()), &DataType::Utf8).unwrap();
    let array = array.as_any().downcast_ref::<StringArray>().unwrap();
    array.iter().map(|v| v.map(str::to_string)).collect()
}

#[tokio::test]
async fn test_categorical_to_numerical_strips_separators() -> TabularPrepResult<()> {
    let df = create_dataframe(vec![
        Some("1,234"),
        Some("12"),
        None,
        Some(" 1,000,000.5 "),
    ]);
    let mut converter = CategoricalToNumerical::new(vec!["attendance".to_string()]);
    converter.fit(&df).await?;
    let batch = collect_batch(converter.transform(df).await?).await;

    let column = batch.column(batch.schema().index_of("attendance").unwrap());
    assert_eq!(column.data_type(), &DataType::Float64);
    let values = column.as_any().downcast_ref::<Float64Array>().unwrap();
    assert_relative_eq!(values.value(0), 1234.0);
    assert_relative_eq!(values.value(1), 12.0);
    // Missing values pass through unconverted.
    assert!(values.is_null(2));
    assert_relative_eq!(values.value(3), 1_000_000.5);

    // Untargeted columns keep their type and position.
    assert_eq!(batch.schema().field(1).name(), "genres");
    assert_eq!(batch.schema().field(2).data_type(), &DataType::Int64);
    Ok(())
}

#[tokio::test]
async fn test_categorical_to_numerical_reports_unparseable_value() {
    let df = create_dataframe(vec![Some("1,234"), Some("n/a"), Some("7")]);
    let converter = CategoricalToNumerical::new(vec!["attendance".to_string()]);
    let result = converter.transform(df).await;
    match result {
        Err(TabularPrepError::Conversion {
            transformer,
            column,
            value,
        }) => {
            assert_eq!(transformer, "CategoricalToNumerical");
            assert_eq!(column, "attendance");
            assert_eq!(value, "n/a");
        }
        other => panic!("expected a conversion error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_categorical_to_numerical_rejects_empty_text() {
    let df = create_dataframe(vec![Some("5"), Some("")]);
    let converter = CategoricalToNumerical::new(vec!["attendance".to_string()]);
    let result = converter.transform(df).await;
    assert!(matches!(result, Err(TabularPrepError::Conversion { .. })));
}

#[tokio::test]
async fn test_categorical_to_numerical_casts_numeric_columns() -> TabularPrepResult<()> {
    let df = create_dataframe(vec![Some("1"), Some("2")]);
    let converter = CategoricalToNumerical::new(vec!["rank".to_string()]);
    let batch = collect_batch(converter.transform(df).await?).await;
    assert_eq!(
        batch.schema().field_with_name("rank").unwrap().data_type(),
        &DataType::Float64
    );
    Ok(())
}

#[tokio::test]
async fn test_categorical_to_numerical_does_not_depend_on_fit() -> TabularPrepResult<()> {
    let rows = vec![Some("1,5"), None, Some("3")];
    let mut fitted = CategoricalToNumerical::new(vec!["attendance".to_string()]);
    fitted.fit(&create_dataframe(rows.clone())).await?;
    let never_fitted = CategoricalToNumerical::new(vec!["attendance".to_string()]);

    let a = collect_batch(fitted.transform(create_dataframe(rows.clone())).await?).await;
    let b = collect_batch(never_fitted.transform(create_dataframe(rows)).await?).await;
    assert_eq!(a, b);
    Ok(())
}

#[tokio::test]
async fn test_categorical_to_numerical_missing_column() {
    let converter = CategoricalToNumerical::new(vec!["price".to_string()]);
    let result = converter.transform(create_dataframe(vec![Some("1")])).await;
    assert!(matches!(
        result,
        Err(TabularPrepError::SchemaMismatch { column, .. }) if column == "price"
    ));
}

#[tokio::test]
async fn test_label_extraction_keeps_first_label() -> TabularPrepResult<()> {
    let df = create_dataframe(vec![Some("1"), Some("2"), Some("3"), Some("4"), Some("5")]);
    let mut extractor = BestEffortLabelExtraction::new(vec!["genres".to_string()]);
    extractor.fit(&df).await?;
    let batch = collect_batch(extractor.transform(df).await?).await;
    assert_eq!(
        strings(&batch, "genres"),
        vec![
            Some("drama".to_string()),
            Some("action".to_string()),
            None,
            Some("".to_string()),
            Some("a".to_string()),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_label_extraction_leaves_non_text_column_unchanged() -> TabularPrepResult<()> {
    let df = create_dataframe(vec![Some("1"), Some("2"), Some("3")]);
    let extractor =
        BestEffortLabelExtraction::new(vec!["rank".to_string(), "genres".to_string()]);
    let batch = collect_batch(extractor.transform(df).await?).await;

    // The integer column cannot be split; it is passed through as it was.
    let rank = batch.column(batch.schema().index_of("rank").unwrap());
    assert_eq!(rank.data_type(), &DataType::Int64);
    let rank = rank.as_any().downcast_ref::<Int64Array>().unwrap();
    assert_eq!(rank.values().to_vec(), vec![0, 1, 2]);

    // The other target column is still processed.
    assert_eq!(strings(&batch, "genres")[0], Some("drama".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_label_extraction_missing_column_is_an_error() {
    let extractor = BestEffortLabelExtraction::new(vec!["tags".to_string()]);
    let result = extractor.transform(create_dataframe(vec![Some("1")])).await;
    assert!(matches!(
        result,
        Err(TabularPrepError::SchemaMismatch { transformer, .. })
            if transformer == "BestEffortLabelExtraction"
    ));
}
