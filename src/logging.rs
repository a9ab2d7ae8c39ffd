//! ## Logging Configuration
//!
//! Logging is set up at program startup using the `ctor` crate.
//! It is controlled by the `DEBUG_TABULAR_PREP` environment variable:
//!
//! - **Disabled** (default): If the variable is unset, empty, or explicitly set to `"0"` or `"false"`,
//!   no subscriber is installed.
//! - **Enabled**: Any other value installs a `tracing-subscriber` formatter with a maximum level of `DEBUG`.
//!
//! Transformers emit `debug!` events describing the state they learn, and the pipeline emits
//! `info!` events with step timings when it is verbose.
//!
//! ```sh
//! export DEBUG_TABULAR_PREP=true
//! ```

use ctor::ctor;
use tracing::Level;

fn logging_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| !(v.is_empty() || v == "0" || v == "false"))
}

#[ctor]
fn set_debug_level() {
    let value = std::env::var("DEBUG_TABULAR_PREP").ok();
    if logging_enabled(value.as_deref()) {
        // Another subscriber may already be installed by the host application.
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .try_init();
    }
}
