//! ## Preprocessing recipe
//!
//! Builds the fixed-order pipeline that turns raw match data into the all-numeric matrix the
//! classifier is trained on:
//!
//! 1. `drop_features` - [`DropFeatures`]
//! 2. `categorical_to_numerical` - [`CategoricalToNumerical`]
//! 3. `numerical_imputer` - [`NumericalImputer`]
//! 4. `categorical_imputer` - [`CategoricalImputer`]
//! 5. `temporal_variable` - [`TemporalVariableEstimator`], only when temporal columns are configured
//! 6. `label_extraction` - [`BestEffortLabelExtraction`]
//! 7. `rare_label_encoder` - [`RareLabelEncoder`]
//! 8. `categorical_encoder` - [`OneHotEncoder`]
//! 9. `scaler` - [`MinMaxScaler`], unless `scale_features` is off
//!
//! ```rust,no_run
//! use tabular_prep::recipe::build_pipeline;
//! use tabular_prep::settings::PreprocessingSettings;
//!
//! # async fn run(train: datafusion::prelude::DataFrame) -> tabular_prep::exceptions::TabularPrepResult<()> {
//! let settings = PreprocessingSettings {
//!     drop_features: vec!["id".to_string()],
//!     categorical_vars: vec!["venue".to_string()],
//!     ..Default::default()
//! };
//! let mut pipeline = build_pipeline(&settings, false)?;
//! let features = pipeline.fit(&train).await?;
//! # Ok(())
//! # }
//! ```

use crate::exceptions::TabularPrepResult;
use crate::pipeline::{Pipeline, Step};
use crate::settings::PreprocessingSettings;
use crate::transformers::categorical_encoding::{OneHotEncoder, RareLabelEncoder};
use crate::transformers::column_selection::DropFeatures;
use crate::transformers::feature_creation::TemporalVariableEstimator;
use crate::transformers::imputation::{CategoricalImputer, NumericalImputer};
use crate::transformers::normalization::{BestEffortLabelExtraction, CategoricalToNumerical};
use crate::transformers::scaling::MinMaxScaler;

/// Builds the preprocessing pipeline described by `settings`.
pub fn build_pipeline(
    settings: &PreprocessingSettings,
    verbose: bool,
) -> TabularPrepResult<Pipeline> {
    settings.validate()?;

    let mut steps: Vec<(String, Step)> = vec![
        (
            "drop_features".to_string(),
            Box::new(DropFeatures::new(settings.drop_features.clone())),
        ),
        (
            "categorical_to_numerical".to_string(),
            Box::new(CategoricalToNumerical::new(
                settings.numerical_vars_from_numerical.clone(),
            )),
        ),
        (
            "numerical_imputer".to_string(),
            Box::new(NumericalImputer::new()),
        ),
        (
            "categorical_imputer".to_string(),
            Box::new(CategoricalImputer::new(settings.categorical_vars.clone())),
        ),
    ];
    if let Some(reference) = &settings.reference_variable {
        if !settings.temporal_vars.is_empty() {
            steps.push((
                "temporal_variable".to_string(),
                Box::new(TemporalVariableEstimator::new(
                    settings.temporal_vars.clone(),
                    reference.clone(),
                )),
            ));
        }
    }
    steps.push((
        "label_extraction".to_string(),
        Box::new(BestEffortLabelExtraction::new(
            settings.categorical_label_extraction.clone(),
        )),
    ));
    steps.push((
        "rare_label_encoder".to_string(),
        Box::new(RareLabelEncoder::new(
            settings.categorical_vars.clone(),
            settings.rare_label_tolerance,
        )?),
    ));
    steps.push((
        "categorical_encoder".to_string(),
        Box::new(OneHotEncoder::new(settings.categorical_vars.clone())),
    ));
    if settings.scale_features {
        steps.push(("scaler".to_string(), Box::new(MinMaxScaler::new())));
    }
    Ok(Pipeline::new(steps, verbose))
}
