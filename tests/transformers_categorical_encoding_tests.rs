use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use datafusion::prelude::*;

use tabular_prep::dataset::dataframe_from_batch;
use tabular_prep::exceptions::{TabularPrepError, TabularPrepResult};
use tabular_prep::transformers::categorical_encoding::{
    OneHotEncoder, OneHotState, RareLabelEncoder, RARE_LABEL,
};

/// Helper function to create a DataFrame with a categorical "color" column and a numeric
/// "score" column.
fn create_categorical_df(colors: Vec<Option<&str>>) -> DataFrame {
    let schema = Arc::new(Schema::new(vec![
        Field::new("color", DataType::Utf8, true),
        Field::new("score", DataType::Float64, true),
    ]));
    let scores: Vec<Option<f64>> = (0..colors.len()).map(|i| Some(i as f64)).collect();
    let color_array: ArrayRef = Arc::new(StringArray::from(colors));
    let score_array: ArrayRef = Arc::new(Float64Array::from(scores));
    let batch = RecordBatch::try_new(schema, vec![color_array, score_array]).unwrap();
    dataframe_from_batch(batch).unwrap()
}

/// Ten rows: "A" 60%, "B" 30%, "C" 10%.
fn create_frequency_df() -> DataFrame {
    let mut colors = vec![Some("A"); 6];
    colors.extend(vec![Some("B"); 3]);
    colors.push(Some("C"));
    create_categorical_df(colors)
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

fn floats(batch: &RecordBatch, name: &str) -> Vec<f64> {
    let array = batch
        .column(batch.schema().index_of(name).unwrap())
        .as_any()
        .downcast_ref::<Float64Array>()
        .expect("Expected Float64Array for indicator column");
    array.values().to_vec()
}

fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect()
}

#[tokio::test]
async fn test_rare_label_encoder_collapses_infrequent_categories() -> TabularPrepResult<()> {
    let df = create_frequency_df();
    let mut encoder = RareLabelEncoder::new(vec!["color".to_string()], 0.2)?;
    encoder.fit(&df).await?;

    let frequent = &encoder.state().unwrap().frequent_labels["color"];
    assert_eq!(
        frequent.iter().cloned().collect::<Vec<_>>(),
        vec!["A".to_string(), "B".to_string()]
    );

    let batch = collect_batch(encoder.transform(df).await?).await;
    let colors = strings(&batch, "color");
    assert_eq!(colors.len(), 10);
    for (i, value) in colors.iter().enumerate() {
        let expected = match i {
            0..=5 => "A",
            6..=8 => "B",
            _ => RARE_LABEL,
        };
        assert_eq!(value.as_deref(), Some(expected), "row {}", i);
    }
    Ok(())
}

#[tokio::test]
async fn test_rare_label_encoder_frequency_equal_to_tolerance_is_kept() -> TabularPrepResult<()> {
    let df = create_frequency_df();
    let mut encoder = RareLabelEncoder::new(vec!["color".to_string()], 0.3)?;
    encoder.fit(&df).await?;
    assert!(encoder.state().unwrap().frequent_labels["color"].contains("B"));
    Ok(())
}

#[tokio::test]
async fn test_rare_label_encoder_everything_rare() -> TabularPrepResult<()> {
    let df = create_frequency_df();
    let mut encoder = RareLabelEncoder::new(vec!["color".to_string()], 1.0)?;
    encoder.fit(&df).await?;
    assert!(encoder.state().unwrap().frequent_labels["color"].is_empty());

    let batch = collect_batch(encoder.transform(df).await?).await;
    assert!(strings(&batch, "color")
        .iter()
        .all(|v| v.as_deref() == Some(RARE_LABEL)));
    Ok(())
}

#[tokio::test]
async fn test_rare_label_encoder_applies_training_frequencies() -> TabularPrepResult<()> {
    let mut encoder = RareLabelEncoder::new(vec!["color".to_string()], 0.2)?;
    encoder.fit(&create_frequency_df()).await?;

    // "C" dominates the new data, but it was rare at training time.
    let new_df = create_categorical_df(vec![Some("C"), Some("C"), Some("A"), Some("Z"), None]);
    let batch = collect_batch(encoder.transform(new_df).await?).await;
    assert_eq!(
        strings(&batch, "color"),
        vec![
            Some(RARE_LABEL.to_string()),
            Some(RARE_LABEL.to_string()),
            Some("A".to_string()),
            Some(RARE_LABEL.to_string()),
            Some(RARE_LABEL.to_string()),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_rare_label_encoder_rejects_bad_tolerance() {
    for tolerance in [0.0, -0.5, 1.5] {
        let result = RareLabelEncoder::new(vec!["color".to_string()], tolerance);
        assert!(
            matches!(result, Err(TabularPrepError::InvalidParameter(_))),
            "tolerance {} should be rejected",
            tolerance
        );
    }
}

#[tokio::test]
async fn test_rare_label_encoder_requires_fit() -> TabularPrepResult<()> {
    let encoder = RareLabelEncoder::new(vec!["color".to_string()], 0.1)?;
    let result = encoder.transform(create_frequency_df()).await;
    assert!(matches!(result, Err(TabularPrepError::UnfitState { .. })));
    Ok(())
}

#[tokio::test]
async fn test_one_hot_encoder_ignores_unknown_categories() -> TabularPrepResult<()> {
    let train = create_categorical_df(vec![Some("red"), Some("blue"), Some("red")]);
    let mut encoder = OneHotEncoder::new(vec!["color".to_string()]);
    encoder.fit(&train).await?;
    assert_eq!(
        encoder.state().unwrap().vocabularies["color"],
        vec!["blue".to_string(), "red".to_string()]
    );

    let test = create_categorical_df(vec![Some("red"), Some("blue"), Some("green"), None]);
    let batch = collect_batch(encoder.transform(test).await?).await;

    // The original column is dropped, other columns keep their place, indicators are appended.
    assert_eq!(
        column_names(&batch),
        vec!["score".to_string(), "color_0".to_string(), "color_1".to_string()]
    );
    // color_0 is "blue", color_1 is "red"; "green" and missing values are all zeros.
    assert_eq!(floats(&batch, "color_0"), vec![0.0, 1.0, 0.0, 0.0]);
    assert_eq!(floats(&batch, "color_1"), vec![1.0, 0.0, 0.0, 0.0]);
    assert_eq!(floats(&batch, "score"), vec![0.0, 1.0, 2.0, 3.0]);
    Ok(())
}

#[tokio::test]
async fn test_one_hot_encoder_output_shape_is_fixed_by_fit() -> TabularPrepResult<()> {
    let mut encoder = OneHotEncoder::new(vec!["color".to_string()]);
    encoder.fit(&create_frequency_df()).await?;
    let expected = encoder.output_columns().unwrap();
    assert_eq!(expected, vec!["color_0", "color_1", "color_2"]);

    for colors in [
        vec![Some("A")],
        vec![Some("Q"), Some("R"), Some("S"), Some("T")],
        vec![None, Some("C")],
    ] {
        let batch = collect_batch(encoder.transform(create_categorical_df(colors)).await?).await;
        let names = column_names(&batch);
        assert_eq!(names[1..].to_vec(), expected);
    }
    Ok(())
}

#[tokio::test]
async fn test_one_hot_encoder_multiple_columns() -> TabularPrepResult<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("home", DataType::Utf8, false),
        Field::new("goals", DataType::Float64, false),
        Field::new("away", DataType::Utf8, false),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec!["x", "y"])),
            Arc::new(Float64Array::from(vec![1.0, 2.0])),
            Arc::new(StringArray::from(vec!["p", "q"])),
        ],
    )
    .unwrap();
    let df = dataframe_from_batch(batch)?;

    let mut encoder = OneHotEncoder::new(vec!["away".to_string(), "home".to_string()]);
    encoder.fit(&df).await?;
    let batch = collect_batch(encoder.transform(df).await?).await;
    assert_eq!(
        column_names(&batch),
        vec!["goals", "away_0", "away_1", "home_0", "home_1"]
    );
    assert_eq!(floats(&batch, "away_1"), vec![0.0, 1.0]);
    assert_eq!(floats(&batch, "home_0"), vec![1.0, 0.0]);
    Ok(())
}

#[tokio::test]
async fn test_one_hot_encoder_from_saved_state() -> TabularPrepResult<()> {
    let mut encoder = OneHotEncoder::new(vec!["color".to_string()]);
    encoder.fit(&create_frequency_df()).await?;

    let saved = serde_json::to_value(encoder.state().unwrap()).unwrap();
    assert_eq!(saved["vocabularies"]["color"], serde_json::json!(["A", "B", "C"]));
    let state: OneHotState = serde_json::from_value(saved).unwrap();
    let restored = OneHotEncoder::from_state(vec!["color".to_string()], state);

    let df = create_categorical_df(vec![Some("B")]);
    let batch = collect_batch(restored.transform(df).await?).await;
    assert_eq!(floats(&batch, "color_1"), vec![1.0]);
    Ok(())
}

#[tokio::test]
async fn test_one_hot_encoder_requires_text_column() {
    let mut encoder = OneHotEncoder::new(vec!["score".to_string()]);
    let result = encoder.fit(&create_frequency_df()).await;
    assert!(matches!(
        result,
        Err(TabularPrepError::SchemaMismatch { column, .. }) if column == "score"
    ));
}

#[tokio::test]
async fn test_one_hot_encoder_requires_fit() {
    let encoder = OneHotEncoder::new(vec!["color".to_string()]);
    let result = encoder.transform(create_frequency_df()).await;
    assert!(matches!(
        result,
        Err(TabularPrepError::UnfitState { transformer }) if transformer == "OneHotEncoder"
    ));
}
