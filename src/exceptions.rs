//! ## Custom Errors for Tabular Prep
//!
//! This module defines the error type shared by every transformer and the pipeline.
//! It uses the `thiserror` crate to derive the `Error` trait.
//!
//! Errors raised by a transformer name the transformer and the column involved, so a
//! misconfigured pipeline can be diagnosed from the message alone. The pipeline wraps
//! a failing step in [`TabularPrepError::StepFailed`], which keeps the original error
//! available through [`std::error::Error::source`].
//!
//! ### Example
//!
//! ```rust
//! use tabular_prep::exceptions::{TabularPrepError, TabularPrepResult};
//!
//! fn check_tolerance(tol: f64) -> TabularPrepResult<()> {
//!     if tol <= 0.0 || tol > 1.0 {
//!         return Err(TabularPrepError::InvalidParameter(format!(
//!             "tolerance {} must be in (0, 1]",
//!             tol
//!         )));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_tolerance(0.0).is_err());
//! ```

use thiserror::Error;

/// Errors specific to the Tabular Prep library.
#[derive(Debug, Error)]
pub enum TabularPrepError {
    /// Wraps underlying I/O errors.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Wraps errors from DataFusion.
    #[error("DataFusion error: {0}")]
    DataFusionError(#[from] datafusion::error::DataFusionError),

    /// Wraps errors from Arrow.
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// Indicates that an invalid parameter was provided (e.g., a tolerance out of range).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Indicates that the provided data format is unsupported (e.g., unknown file extension).
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A stateful transformer was asked to transform before it was fitted.
    #[error("{transformer}: transform called before fit")]
    UnfitState { transformer: String },

    /// A configured column is absent, or its type does not match what the transformer needs.
    #[error("{transformer}: schema mismatch on column '{column}': {reason}")]
    SchemaMismatch {
        transformer: String,
        column: String,
        reason: String,
    },

    /// A value could not be converted to a number.
    #[error("{transformer}: cannot convert value '{value}' in column '{column}' to a number")]
    Conversion {
        transformer: String,
        column: String,
        value: String,
    },

    /// A pipeline step failed; `source` is the error the step returned.
    #[error("step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<TabularPrepError>,
    },
}

impl TabularPrepError {
    pub(crate) fn unfit(transformer: &str) -> Self {
        Self::UnfitState {
            transformer: transformer.to_string(),
        }
    }

    pub(crate) fn schema_mismatch(
        transformer: &str,
        column: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::SchemaMismatch {
            transformer: transformer.to_string(),
            column: column.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the innermost error, looking through any `StepFailed` wrappers.
    pub fn root_cause(&self) -> &TabularPrepError {
        match self {
            Self::StepFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// A convenient result type for Tabular Prep operations.
pub type TabularPrepResult<T> = std::result::Result<T, TabularPrepError>;
