//! Core module - configuration, persistence, logging and time
//!
//! Everything here is independent of game rules and is shared by the
//! session controller and the binary.

pub mod error;
pub mod logging;
pub mod resources;
pub mod settings_persistence;
pub mod time;

pub use error::{CoreError, CoreResult};
pub use logging::init_tracing;
pub use resources::SessionSettings;
pub use settings_persistence::{load_settings, save_settings, settings_path, try_load_settings};
pub use time::{ManualClock, TimeSource, WallClock};
