//! Tracing subscriber setup
//!
//! Log lines carry a bracketed subsystem prefix (`[SESSION]`, `[CLOCK]`,
//! `[ORACLE]`, `[SETTINGS]`, `[TURN_STATE]`). Verbosity follows `RUST_LOG`
//! when set, otherwise [`DEFAULT_FILTER`].

use crate::core::error::{CoreError, CoreResult};
use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "chess_session=info";

/// Install the global fmt subscriber
pub fn init_tracing() -> CoreResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| CoreError::Logging {
            message: e.to_string(),
        })
}
