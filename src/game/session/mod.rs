//! Session orchestrator
//!
//! [`Session`] wires the synchronous [`SessionState`] to an [`Oracle`] and a
//! [`TimeSource`]. Each operation takes the state lock only long enough to
//! decide what to ask, releases it while the oracle works, and then hands
//! the answer back together with the ticket it was issued under. The lock is
//! never held across an `.await`, so clock ticks and pointer input keep
//! flowing while an oracle call is outstanding.
//!
//! # Turn flow
//!
//! ```text
//! start_session ──► setup ──► is_checkmate ──► Idle | OracleTurn
//! press/release ──► valid_targets ──► Selecting
//!               └─► validate_move ──► apply_move ──► is_checkmate ──► Idle | OracleTurn
//! play_oracle_turn ──► engine_move ──► is_checkmate ──► Idle | OracleTurn
//! tick ──► timeout ──► Terminal
//! ```

pub mod driver;
pub mod state;
pub mod view;

use crate::core::resources::SessionSettings;
use crate::core::time::{TimeSource, WallClock};
use crate::game::codec::{Position, Square, SquareSet};
use crate::game::components::{PieceColor, PlayerSide};
use crate::game::error::SessionResult;
use crate::game::events::SessionEvent;
use crate::game::oracle::{Oracle, OracleResult};
use crate::game::resources::{GameOutcome, Ticket, TurnPhase};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

pub use driver::{DriverExit, DriverHandle, SessionCommand, SessionDriver};
pub use state::{EngineRequest, IngestReport, IngestStep, PointerAction, SessionState};
pub use view::{BoardView, CellView, Hint};

/// What became of a move submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSubmission {
    /// Not the player's turn, another call outstanding, or the answer came too late
    Ignored,
    /// Refused locally or by the oracle; the board is unchanged
    Illegal,
    Played(IngestReport),
}

/// What became of a pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    Ignored,
    /// A piece was selected; these are its legal targets
    Selected(SquareSet),
    Submitted(MoveSubmission),
}

/// A game session against an oracle
pub struct Session<O, C = WallClock> {
    state: Arc<Mutex<SessionState>>,
    oracle: Arc<O>,
    time: Arc<C>,
}

impl<O, C> Clone for Session<O, C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            oracle: Arc::clone(&self.oracle),
            time: Arc::clone(&self.time),
        }
    }
}

impl<O> Session<O, WallClock>
where
    O: Oracle + 'static,
{
    pub fn with_wall_clock(oracle: O, settings: SessionSettings) -> Self {
        Self::new(oracle, WallClock, settings)
    }
}

impl<O, C> Session<O, C>
where
    O: Oracle + 'static,
    C: TimeSource + 'static,
{
    pub fn new(oracle: O, time: C, settings: SessionSettings) -> Self {
        Self::from_shared(Arc::new(oracle), Arc::new(time), settings)
    }

    pub fn from_shared(oracle: Arc<O>, time: Arc<C>, settings: SessionSettings) -> Self {
        let state = SessionState::new(settings, time.now());
        Self {
            state: Arc::new(Mutex::new(state)),
            oracle,
            time,
        }
    }

    pub fn oracle(&self) -> &Arc<O> {
        &self.oracle
    }

    /// Start a new game as `side`
    ///
    /// Resets the clocks, invalidates every outstanding oracle call and waits
    /// for the setup position.
    pub async fn start_session(&self, side: PlayerSide) -> SessionResult<IngestReport> {
        let now = self.time.now();
        let ticket = self.state.lock().begin(side, now);

        let code = self.call(ticket, self.oracle.setup()).await?;
        self.ingest(ticket, &code).await
    }

    /// Pointer pressed on `square`
    pub async fn press(&self, square: Square) -> SessionResult<PointerOutcome> {
        let action = self.state.lock().press(square)?;
        self.perform(action).await
    }

    /// Pointer released on `square`
    pub async fn release(&self, square: Square) -> SessionResult<PointerOutcome> {
        let action = self.state.lock().release(square)?;
        self.perform(action).await
    }

    /// Submit `from -> to` for the side to move
    pub async fn submit_human_move(&self, from: Square, to: Square) -> SessionResult<MoveSubmission> {
        let action = self.state.lock().request_submission(from, to)?;
        match self.perform(action).await? {
            PointerOutcome::Submitted(submission) => Ok(submission),
            PointerOutcome::Ignored | PointerOutcome::Selected(_) => Ok(MoveSubmission::Ignored),
        }
    }

    /// Let the oracle move if the side to move is not human-controlled
    ///
    /// Returns `None` when no engine move is due or one is already outstanding.
    pub async fn play_oracle_turn(&self) -> SessionResult<Option<IngestReport>> {
        let request = self.state.lock().begin_oracle_turn();
        let Some(request) = request else {
            return Ok(None);
        };

        let code = self
            .call(
                request.ticket,
                self.oracle.engine_move(request.remaining_ms, request.param),
            )
            .await?;
        let report = self.ingest(request.ticket, &code).await?;
        Ok(Some(report))
    }

    /// One clock tick; returns the outcome if a side just flagged
    pub fn tick(&self) -> Option<GameOutcome> {
        let now = self.time.now();
        self.state.lock().tick(now)
    }

    pub fn hover(&self, square: Option<Square>) {
        self.state.lock().hover(square);
    }

    /// Whether [`Session::play_oracle_turn`] would solicit an engine move
    pub fn awaiting_oracle(&self) -> bool {
        self.state.lock().awaiting_oracle()
    }

    pub fn view(&self) -> BoardView {
        self.state.lock().view()
    }

    pub fn outcome(&self) -> GameOutcome {
        self.state.lock().outcome()
    }

    pub fn phase(&self) -> TurnPhase {
        self.state.lock().phase()
    }

    pub fn position(&self) -> Option<Position> {
        self.state.lock().position().cloned()
    }

    pub fn side_to_move(&self) -> Option<PieceColor> {
        self.state.lock().side_to_move()
    }

    pub fn remaining_ms(&self, color: PieceColor) -> i64 {
        self.state.lock().clock().remaining_ms(color)
    }

    pub fn drain_events(&self) -> Vec<SessionEvent> {
        self.state.lock().drain_events()
    }

    async fn perform(&self, action: PointerAction) -> SessionResult<PointerOutcome> {
        match action {
            PointerAction::Ignored => Ok(PointerOutcome::Ignored),
            PointerAction::Rejected { .. } => {
                Ok(PointerOutcome::Submitted(MoveSubmission::Illegal))
            }
            PointerAction::QueryTargets {
                ticket,
                square,
                side,
            } => {
                let mask = self
                    .call(ticket, self.oracle.valid_targets(square, side))
                    .await?;
                let accepted = self.state.lock().receive_targets(ticket, mask);
                Ok(if accepted {
                    PointerOutcome::Selected(SquareSet::from_bits(mask))
                } else {
                    PointerOutcome::Ignored
                })
            }
            PointerAction::Submit {
                ticket,
                from,
                to,
                side,
            } => {
                let submission = self.submit(ticket, from, to, side).await?;
                Ok(PointerOutcome::Submitted(submission))
            }
        }
    }

    async fn submit(
        &self,
        ticket: Ticket,
        from: Square,
        to: Square,
        side: PlayerSide,
    ) -> SessionResult<MoveSubmission> {
        let handle = self
            .call(ticket, self.oracle.validate_move(from, to, side))
            .await?;

        let Some(handle) = handle else {
            let rejected = self.state.lock().reject_submission(ticket)?;
            return Ok(if rejected {
                MoveSubmission::Illegal
            } else {
                MoveSubmission::Ignored
            });
        };

        let current = self.state.lock().is_current(&ticket);
        if !current {
            info!("[SESSION] Dropping validated move {} -> {}: session moved on", from, to);
            return Ok(MoveSubmission::Ignored);
        }

        let code = self.call(ticket, self.oracle.apply_move(handle)).await?;
        let report = self.ingest(ticket, &code).await?;
        Ok(MoveSubmission::Played(report))
    }

    /// Decode, reconcile, then poll for checkmate
    async fn ingest(&self, ticket: Ticket, code: &str) -> SessionResult<IngestReport> {
        let now = self.time.now();
        let step = self.state.lock().ingest(ticket, code, now)?;

        let poll = match step {
            IngestStep::Stale => return Ok(IngestReport::Stale),
            IngestStep::Finished(outcome) => return Ok(IngestReport::Finished(outcome)),
            IngestStep::PollCheckmate(poll) => poll,
        };

        let mated = self.call(poll, self.oracle.is_checkmate()).await?;
        self.state.lock().conclude(poll, mated)
    }

    /// Await an oracle call, releasing `ticket` if it fails
    async fn call<T, F>(&self, ticket: Ticket, request: F) -> SessionResult<T>
    where
        F: Future<Output = OracleResult<T>>,
    {
        match request.await {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("[ORACLE] {:?} failed: {}", ticket.call(), e);
                self.state.lock().abandon(ticket);
                Err(e.into())
            }
        }
    }
}
