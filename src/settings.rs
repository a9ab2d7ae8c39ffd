//! ## Preprocessing Settings
//!
//! [`PreprocessingSettings`] is the configuration surface of the preprocessing recipe. It only
//! names columns and parameters; loading it from a file is left to the caller, so any
//! `serde` format works.
//!
//! ```rust
//! use tabular_prep::settings::PreprocessingSettings;
//!
//! let settings = PreprocessingSettings {
//!     drop_features: vec!["id".to_string()],
//!     categorical_vars: vec!["league".to_string()],
//!     ..Default::default()
//! };
//! assert_eq!(settings.rare_label_tolerance, 0.01);
//! assert!(settings.validate().is_ok());
//! ```

use crate::exceptions::{TabularPrepError, TabularPrepResult};
use serde::{Deserialize, Serialize};

/// Default tolerance used by the rare label encoder.
pub const DEFAULT_RARE_LABEL_TOLERANCE: f64 = 0.01;

fn default_tolerance() -> f64 {
    DEFAULT_RARE_LABEL_TOLERANCE
}

fn default_scale_features() -> bool {
    true
}

/// Column lists and parameters for one instantiation of the preprocessing recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingSettings {
    /// Columns removed before anything else runs.
    pub drop_features: Vec<String>,
    /// Text columns holding numbers with thousands separators (e.g. `"1,234"`).
    pub numerical_vars_from_numerical: Vec<String>,
    /// Categorical columns that are imputed, rare-label encoded and one-hot encoded.
    pub categorical_vars: Vec<String>,
    /// Columns holding comma-joined labels of which only the first is kept.
    pub categorical_label_extraction: Vec<String>,
    /// Minimum relative frequency a category needs to avoid being collapsed into `"Rare"`.
    #[serde(default = "default_tolerance")]
    pub rare_label_tolerance: f64,
    /// Numeric columns replaced by their distance to `reference_variable`.
    pub temporal_vars: Vec<String>,
    pub reference_variable: Option<String>,
    /// Whether the recipe ends with min-max scaling.
    #[serde(default = "default_scale_features")]
    pub scale_features: bool,
}

impl Default for PreprocessingSettings {
    fn default() -> Self {
        Self {
            drop_features: Vec::new(),
            numerical_vars_from_numerical: Vec::new(),
            categorical_vars: Vec::new(),
            categorical_label_extraction: Vec::new(),
            rare_label_tolerance: DEFAULT_RARE_LABEL_TOLERANCE,
            temporal_vars: Vec::new(),
            reference_variable: None,
            scale_features: true,
        }
    }
}

impl PreprocessingSettings {
    /// Checks the parameters that can be wrong independently of any dataset.
    pub fn validate(&self) -> TabularPrepResult<()> {
        if !(self.rare_label_tolerance > 0.0 && self.rare_label_tolerance <= 1.0) {
            return Err(TabularPrepError::InvalidParameter(format!(
                "rare_label_tolerance {} must be in (0, 1]",
                self.rare_label_tolerance
            )));
        }
        if !self.temporal_vars.is_empty() && self.reference_variable.is_none() {
            return Err(TabularPrepError::InvalidParameter(
                "temporal_vars requires a reference_variable".to_string(),
            ));
        }
        Ok(())
    }
}
