//! Session-wide configuration
//!
//! [`SessionSettings`] is loaded once at startup (see
//! [`crate::core::settings_persistence`]) and copied into each new session,
//! so changing it never affects a game already in progress.

use crate::core::error::{CoreError, CoreResult};
use crate::game::components::PlayerSide;
use serde::{Deserialize, Serialize};

/// Three minutes per side
pub const DEFAULT_STARTING_TIME_MS: i64 = 180_000;

/// Time control and interaction preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Bank each side starts with
    pub starting_time_ms: i64,

    /// Fischer increment credited after each move, also passed to the engine
    pub increment_ms: i64,

    /// Period of the display clock tick
    pub tick_period_ms: i64,

    /// Which colors the local player controls
    pub player_side: PlayerSide,

    /// Whether to show legal target hints for the selected piece
    pub show_hints: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            starting_time_ms: DEFAULT_STARTING_TIME_MS,
            increment_ms: 0,
            tick_period_ms: crate::game::resources::DEFAULT_TICK_PERIOD_MS,
            player_side: PlayerSide::White,
            show_hints: true,
        }
    }
}

impl SessionSettings {
    /// Reject values the clock cannot run with
    pub fn validate(&self) -> CoreResult<()> {
        if self.starting_time_ms <= 0 {
            return Err(CoreError::InvalidSetting {
                field: "starting_time_ms",
                message: format!("must be positive, got {}", self.starting_time_ms),
            });
        }
        if self.increment_ms < 0 {
            return Err(CoreError::InvalidSetting {
                field: "increment_ms",
                message: format!("must not be negative, got {}", self.increment_ms),
            });
        }
        if self.tick_period_ms <= 0 {
            return Err(CoreError::InvalidSetting {
                field: "tick_period_ms",
                message: format!("must be positive, got {}", self.tick_period_ms),
            });
        }
        Ok(())
    }

    /// Human-readable time control, e.g. `3+0` or `10+5`
    pub fn time_control(&self) -> String {
        let minutes = self.starting_time_ms as f64 / 60_000.0;
        let increment = self.increment_ms / 1_000;
        if minutes.fract() == 0.0 {
            format!("{}+{}", minutes as i64, increment)
        } else {
            format!("{:.1}+{}", minutes, increment)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SessionSettings::default();
        assert_eq!(settings.starting_time_ms, 180_000);
        assert_eq!(settings.increment_ms, 0);
        assert_eq!(settings.tick_period_ms, 33);
        assert!(settings.validate().is_ok());
        assert_eq!(settings.time_control(), "3+0");
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        //! Older settings files without newer fields still load
        let settings: SessionSettings =
            serde_json::from_str(r#"{ "increment_ms": 5000 }"#).unwrap();
        assert_eq!(settings.increment_ms, 5_000);
        assert_eq!(settings.starting_time_ms, DEFAULT_STARTING_TIME_MS);
        assert_eq!(settings.time_control(), "3+5");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let settings = SessionSettings {
            tick_period_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(CoreError::InvalidSetting {
                field: "tick_period_ms",
                ..
            })
        ));
    }
}
