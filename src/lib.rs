//! # Tabular Prep
//!
//! Fit-once, apply-many preprocessing for tabular classifier features, built on Apache DataFusion.
//!
//! Every transformer learns its parameters with `fit` on a training [`DataFrame`] and applies the
//! same parameters with `transform` to any later DataFrame with the same schema. Transformers are
//! chained by a [`pipeline::Pipeline`]; [`recipe::build_pipeline`] assembles the standard order
//! from [`settings::PreprocessingSettings`].
//!
//! [`DataFrame`]: datafusion::prelude::DataFrame

pub mod dataset;
pub mod exceptions;
mod logging;
pub mod pipeline;
pub mod recipe;
pub mod settings;
pub mod transformers;
