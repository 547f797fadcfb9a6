//! Turn management resources
//!
//! Manages turn phases, oracle solicitation tracking and game timing.

pub mod pending;
pub mod state;
pub mod timer;

// Re-export all public items
pub use pending::{PendingCall, SolicitationGuard, Ticket};
pub use state::*;
pub use timer::*;
