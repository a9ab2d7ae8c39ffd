// Run `cargo run --example basic_usage` to preprocess a small in-memory dataset
// Run `cargo run --example basic_usage -- <file.csv> <settings.json>` to preprocess your own data

use std::error::Error;
use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use datafusion::prelude::DataFrame;
use tabular_prep::dataset::{dataframe_from_batch, load_data};
use tabular_prep::recipe::build_pipeline;
use tabular_prep::settings::PreprocessingSettings;

const SAMPLE_SETTINGS: &str = r#"{
    "drop_features": ["match_id"],
    "numerical_vars_from_numerical": ["attendance"],
    "categorical_vars": ["venue", "genres"],
    "categorical_label_extraction": ["genres"],
    "rare_label_tolerance": 0.2
}"#;

fn sample_data() -> Result<DataFrame, Box<dyn Error>> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("match_id", DataType::Int64, false),
        Field::new("venue", DataType::Utf8, true),
        Field::new("attendance", DataType::Utf8, true),
        Field::new("genres", DataType::Utf8, true),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5, 6])),
        Arc::new(StringArray::from(vec![
            Some("home"),
            Some("away"),
            Some("home"),
            None,
            Some("home"),
            Some("neutral"),
        ])),
        Arc::new(StringArray::from(vec![
            Some("12,500"),
            Some("8,100"),
            None,
            Some("8,100"),
            Some("15,000"),
            Some("40,250"),
        ])),
        Arc::new(StringArray::from(vec![
            Some("league,derby"),
            Some("league"),
            Some("cup,final"),
            Some("league"),
            None,
            Some("cup"),
        ])),
    ];
    let batch = RecordBatch::try_new(schema, columns)?;
    Ok(dataframe_from_batch(batch)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let (input_df, settings) = match args.as_slice() {
        [data_path, settings_path] => {
            let settings: PreprocessingSettings =
                serde_json::from_str(&std::fs::read_to_string(settings_path)?)?;
            (load_data(data_path).await?, settings)
        }
        _ => (sample_data()?, serde_json::from_str(SAMPLE_SETTINGS)?),
    };

    // Show the first 5 rows of the raw data
    input_df.clone().limit(0, Some(5))?.show().await?;

    // Fit the pipeline on the data and show the resulting features
    let mut pipeline = build_pipeline(&settings, true)?;
    let features = pipeline.fit(&input_df).await?;
    features.limit(0, Some(5))?.show().await?;

    // The fitted pipeline can be applied to new data with the same raw schema
    let again = pipeline.transform(input_df).await?;
    println!("{} rows after replaying the fitted pipeline", again.count().await?);

    Ok(())
}
