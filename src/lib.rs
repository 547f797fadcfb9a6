pub mod core;
pub mod game;

pub use crate::core::{ManualClock, SessionSettings, TimeSource, WallClock};
pub use crate::game::{GameOutcome, Oracle, PlayerSide, Session, SessionError, Square};
