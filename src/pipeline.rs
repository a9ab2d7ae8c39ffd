//! ## Tabular Prep Pipeline
//!
//! This module provides the fit/transform contract shared by every transformer and the
//! [`Pipeline`] that chains them.
//!
//! ### Overview
//!
//! - The [`Transformer`] trait defines the common interface. `fit` learns whatever state the
//!   transformer needs from a training DataFrame; `transform` applies that state to any
//!   DataFrame with a compatible schema and returns a new DataFrame.
//! - The [`Pipeline`] struct runs named steps in a fixed order. Fitting feeds each step the
//!   transformed output of the previous one; transforming replays the same order without
//!   learning anything.
//! - Macros [`crate::impl_transformer`] and [`crate::make_pipeline`] simplify implementing the
//!   trait and building pipelines.
//!
//! A fitted transformer is never mutated by `transform`, so a fitted pipeline can be shared
//! and applied to several datasets at the same time.

use crate::exceptions::{TabularPrepError, TabularPrepResult};
use async_trait::async_trait;
use datafusion::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Trait for components used in the data transformation pipeline.
#[async_trait]
pub trait Transformer {
    /// Learn the transformer's parameters from a DataFrame.
    ///
    /// Stateless transformers only check that the configured columns are usable.
    async fn fit(&mut self, df: &DataFrame) -> TabularPrepResult<()>;

    /// Transform the input DataFrame, returning a new DataFrame with the transformation applied.
    ///
    /// Stateful transformers return [`TabularPrepError::UnfitState`] when called before `fit`.
    async fn transform(&self, df: DataFrame) -> TabularPrepResult<DataFrame>;

    /// Returns true if the transformer is stateful (i.e. requires a call to fit before transform can be called).
    fn is_stateful(&self) -> bool;
}

/// Macro to implement the [`Transformer`] trait for Tabular Prep transformers.
///
/// The type must already have inherent methods:
/// - `async fn fit(&mut self, &DataFrame) -> TabularPrepResult<()>`
/// - `async fn transform(&self, DataFrame) -> TabularPrepResult<DataFrame>`
/// - `fn inherent_is_stateful(&self) -> bool`
#[macro_export]
macro_rules! impl_transformer {
    ($ty:ty) => {
        #[async_trait::async_trait]
        impl $crate::pipeline::Transformer for $ty {
            async fn fit(
                &mut self,
                df: &datafusion::prelude::DataFrame,
            ) -> $crate::exceptions::TabularPrepResult<()> {
                <$ty>::fit(self, df).await
            }
            async fn transform(
                &self,
                df: datafusion::prelude::DataFrame,
            ) -> $crate::exceptions::TabularPrepResult<datafusion::prelude::DataFrame> {
                <$ty>::transform(self, df).await
            }
            fn is_stateful(&self) -> bool {
                <$ty>::inherent_is_stateful(self)
            }
        }
    };
}

/// A boxed pipeline step.
pub type Step = Box<dyn Transformer + Send + Sync>;

/// A pipeline that chains a sequence of transformers.
pub struct Pipeline {
    steps: Vec<(String, Step)>,
    verbose: bool,
}

impl Pipeline {
    /// Creates a new pipeline.
    ///
    /// # Arguments
    ///
    /// * `steps` - A vector of (name, transformer) pairs, in execution order.
    /// * `verbose` - If true, step timings are logged at `INFO` instead of `DEBUG`.
    pub fn new(steps: Vec<(String, Step)>, verbose: bool) -> Self {
        Self { steps, verbose }
    }

    /// Names of the steps in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn ensure_not_empty(&self) -> TabularPrepResult<()> {
        if self.steps.is_empty() {
            return Err(TabularPrepError::InvalidParameter(
                "Pipeline must have at least one transformer.".to_string(),
            ));
        }
        Ok(())
    }

    /// Fits each transformer in order and returns the transformed training data.
    ///
    /// Every step is fitted on the output of the previous (already fitted) step.
    pub async fn fit(&mut self, df: &DataFrame) -> TabularPrepResult<DataFrame> {
        self.ensure_not_empty()?;
        let mut current_df = df.clone();
        for (name, step) in self.steps.iter_mut() {
            let start = Instant::now();
            step.fit(&current_df).await.map_err(|e| step_failed(name, e))?;
            current_df = step
                .transform(current_df)
                .await
                .map_err(|e| step_failed(name, e))?;
            log_step(self.verbose, "fitted step", name, Some(start));
        }
        Ok(current_df)
    }

    /// Applies the `transform` method of each transformer (without fitting).
    pub async fn transform(&self, df: DataFrame) -> TabularPrepResult<DataFrame> {
        self.ensure_not_empty()?;
        let mut current_df = df;
        for (name, step) in self.steps.iter() {
            log_step(self.verbose, "applying step", name, None);
            current_df = step
                .transform(current_df)
                .await
                .map_err(|e| step_failed(name, e))?;
        }
        Ok(current_df)
    }

    /// Convenience method to call `fit` and then return the final transformed DataFrame.
    pub async fn fit_transform(&mut self, df: &DataFrame) -> TabularPrepResult<DataFrame> {
        self.fit(df).await
    }
}

fn log_step(verbose: bool, message: &str, name: &str, start: Option<Instant>) {
    match (verbose, start) {
        (true, Some(start)) => info!(step = name, elapsed = ?start.elapsed(), "{}", message),
        (true, None) => info!(step = name, "{}", message),
        (false, Some(start)) => debug!(step = name, elapsed = ?start.elapsed(), "{}", message),
        (false, None) => debug!(step = name, "{}", message),
    }
}

fn step_failed(name: &str, source: TabularPrepError) -> TabularPrepError {
    TabularPrepError::StepFailed {
        step: name.to_string(),
        source: Box::new(source),
    }
}

/// Macro to simplify pipeline creation by automatically boxing transformers.
///
/// # Example
///
/// ```rust,no_run
/// use tabular_prep::make_pipeline;
/// use tabular_prep::transformers::column_selection::DropFeatures;
///
/// let pipeline = make_pipeline!(false,
///     ("drop_features", DropFeatures::new(vec!["id".to_string()])),
/// );
/// ```
#[macro_export]
macro_rules! make_pipeline {
    ($verbose:expr, $(($name:expr, $transformer:expr)),+ $(,)?) => {
        {
            let steps: Vec<(String, $crate::pipeline::Step)> = vec![
                $(
                    ($name.to_string(), Box::new($transformer)),
                )+
            ];
            $crate::pipeline::Pipeline::new(steps, $verbose)
        }
    };
}
