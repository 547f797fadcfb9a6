//! Synchronous session core
//!
//! [`SessionState`] holds everything a session owns (position, phase,
//! selection, clocks, outcome) and decides what to ask the oracle next. It
//! never performs I/O: each operation returns the solicitation to issue as a
//! value carrying a [`Ticket`], and responses are fed back through
//! [`SessionState::ingest`] and friends. Tickets that no longer match the
//! outstanding solicitation are dropped, which is how late responses from a
//! previous game or from before a game ended are discarded.

use crate::core::resources::SessionSettings;
use crate::game::codec::{Position, Square, SquareSet};
use crate::game::components::{PieceColor, PlayerSide};
use crate::game::error::SessionResult;
use crate::game::events::SessionEvent;
use crate::game::resources::{
    DualClock, GameOutcome, PendingCall, SelectionState, SolicitationGuard, Ticket,
    TurnPhase,
};
use crate::game::session::view::{BoardView, CellView, Hint};
use tracing::{debug, info, warn};
use web_time::Instant;

/// Result of feeding a position code into the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStep {
    /// Ticket no longer current; nothing changed
    Stale,
    /// A clock ran out when the move arrived
    Finished(GameOutcome),
    /// Position replaced; the side to move must be polled for checkmate
    PollCheckmate(Ticket),
}

/// Where the session stands after a position was fully processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestReport {
    Stale,
    Ongoing {
        side_to_move: PieceColor,
        oracle_turn: bool,
    },
    Finished(GameOutcome),
}

/// Solicitation requested by a pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Ignored,
    QueryTargets {
        ticket: Ticket,
        square: Square,
        side: PlayerSide,
    },
    Submit {
        ticket: Ticket,
        from: Square,
        to: Square,
        side: PlayerSide,
    },
    /// Destination outside the selected piece's targets; refused locally
    Rejected { from: Square, to: Square },
}

/// Engine move solicitation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineRequest {
    pub ticket: Ticket,
    /// Banked time of the side the engine plays
    pub remaining_ms: i64,
    pub param: i64,
}

#[derive(Debug)]
pub struct SessionState {
    settings: SessionSettings,
    player_side: PlayerSide,
    position: Option<Position>,
    phase: TurnPhase,
    selection: SelectionState,
    clock: DualClock,
    outcome: GameOutcome,
    guard: SolicitationGuard,
    events: Vec<SessionEvent>,
}

impl SessionState {
    pub fn new(settings: SessionSettings, now: Instant) -> Self {
        let clock = DualClock::new(
            settings.starting_time_ms,
            settings.increment_ms,
            settings.tick_period_ms,
            now,
        );
        Self {
            player_side: settings.player_side,
            settings,
            position: None,
            phase: TurnPhase::Idle,
            selection: SelectionState::default(),
            clock,
            outcome: GameOutcome::InProgress,
            guard: SolicitationGuard::default(),
            events: Vec::new(),
        }
    }

    /// Reset everything and request the setup position
    ///
    /// Every ticket issued before this call becomes stale.
    pub fn begin(&mut self, side: PlayerSide, now: Instant) -> Ticket {
        self.player_side = side;
        self.position = None;
        self.phase.force(TurnPhase::Idle);
        self.selection = SelectionState::default();
        self.outcome = GameOutcome::InProgress;
        self.clock.reset(self.settings.starting_time_ms, now);
        let ticket = self.guard.restart(PendingCall::Setup);

        info!(
            "[SESSION] New session: player side {}, time control {}",
            side,
            self.settings.time_control()
        );
        self.events.push(SessionEvent::SessionStarted { side });
        ticket
    }

    /// Accept a position code answering `ticket`
    ///
    /// Setup positions only re-stamp the clocks. Positions answering a move
    /// reconcile the clock of the side that was to move. Malformed codes are
    /// rejected without touching the board.
    pub fn ingest(&mut self, ticket: Ticket, code: &str, now: Instant) -> SessionResult<IngestStep> {
        if self.is_stale(&ticket) {
            debug!("[SESSION] Dropping stale position for {:?}", ticket.call());
            return Ok(IngestStep::Stale);
        }

        let position = match Position::decode(code) {
            Ok(position) => position,
            Err(e) => {
                warn!("[SESSION] Oracle sent malformed position {:?}: {}", code, e);
                self.abandon(ticket);
                return Err(e.into());
            }
        };

        let Some(poll) = self.guard.hand_over(ticket, PendingCall::CheckmatePoll) else {
            return Ok(IngestStep::Stale);
        };

        let mover = match ticket.call() {
            PendingCall::Setup => None,
            _ => self.position.as_ref().map(Position::side_to_move),
        };
        let timeout = match mover {
            Some(mover) => self.clock.reconcile_on_turn_change(mover, now),
            None => {
                self.clock.stamp(now);
                None
            }
        };

        let side_to_move = position.side_to_move();
        self.position = Some(position);
        self.selection.clear();
        self.events.push(SessionEvent::PositionChanged { side_to_move });
        if let Some(by) = mover {
            self.events.push(SessionEvent::MovePlayed { by });
        }

        if let Some(timeout) = timeout {
            let outcome = GameOutcome::timeout(timeout.flagged);
            self.finish(outcome);
            return Ok(IngestStep::Finished(outcome));
        }

        Ok(IngestStep::PollCheckmate(poll))
    }

    /// Apply the checkmate verdict for the position ingested under `ticket`
    pub fn conclude(&mut self, ticket: Ticket, mated: bool) -> SessionResult<IngestReport> {
        if self.is_stale(&ticket) || !self.guard.complete(ticket) {
            return Ok(IngestReport::Stale);
        }
        let Some(side_to_move) = self.side_to_move() else {
            return Ok(IngestReport::Stale);
        };

        if mated {
            let outcome = GameOutcome::checkmate(side_to_move);
            self.finish(outcome);
            return Ok(IngestReport::Finished(outcome));
        }

        let oracle_turn = self.settle_phase(side_to_move)?;
        Ok(IngestReport::Ongoing {
            side_to_move,
            oracle_turn,
        })
    }

    /// Pointer pressed on `square`
    ///
    /// Pressing a piece of the side to move selects it (and starts a drag).
    /// Pressing anything else while a piece is selected submits a move there.
    pub fn press(&mut self, square: Square) -> SessionResult<PointerAction> {
        let Some(side_to_move) = self.input_side() else {
            return Ok(PointerAction::Ignored);
        };
        let piece = self
            .position
            .as_ref()
            .and_then(|position| position.piece_at(square));

        match piece {
            Some(piece) if piece.color == side_to_move => {
                self.cancel_target_query();
                let Some(ticket) = self.guard.request(PendingCall::Targets { square }) else {
                    return Ok(PointerAction::Ignored);
                };
                self.phase.transition_to(TurnPhase::Selecting)?;
                self.selection.select(square, piece);
                debug!("[SESSION] Selected {} on {}", piece, square);
                Ok(PointerAction::QueryTargets {
                    ticket,
                    square,
                    side: self.player_side,
                })
            }
            _ => match self.selection.origin() {
                Some(from) => self.submit_selected(from, square),
                None => Ok(PointerAction::Ignored),
            },
        }
    }

    /// Pointer released on `square`
    ///
    /// Releasing over the origin ends the drag but keeps the selection, so a
    /// second press can complete a click-to-move.
    pub fn release(&mut self, square: Square) -> SessionResult<PointerAction> {
        if self.input_side().is_none() || !self.selection.is_dragging() {
            return Ok(PointerAction::Ignored);
        }
        let Some(from) = self.selection.origin() else {
            return Ok(PointerAction::Ignored);
        };

        if square == from {
            self.selection.drop_piece();
            return Ok(PointerAction::Ignored);
        }
        self.submit_selected(from, square)
    }

    /// Submit `from -> to` directly, bypassing selection and target hints
    pub fn request_submission(&mut self, from: Square, to: Square) -> SessionResult<PointerAction> {
        if self.input_side().is_none() {
            return Ok(PointerAction::Ignored);
        }
        self.submit(from, to)
    }

    /// Store the target mask answering `ticket`; false if it arrived too late
    pub fn receive_targets(&mut self, ticket: Ticket, mask: u64) -> bool {
        let PendingCall::Targets { square } = ticket.call() else {
            return false;
        };
        if self.is_stale(&ticket) || !self.guard.complete(ticket) {
            return false;
        }
        if self.selection.origin() != Some(square) {
            return false;
        }
        self.selection.set_targets(SquareSet::from_bits(mask));
        true
    }

    /// The oracle refused the submission held by `ticket`
    pub fn reject_submission(&mut self, ticket: Ticket) -> SessionResult<bool> {
        let PendingCall::Submission { from, to } = ticket.call() else {
            return Ok(false);
        };
        if self.is_stale(&ticket) || !self.guard.complete(ticket) {
            return Ok(false);
        }
        info!("[SESSION] Illegal move {} -> {}", from, to);
        self.selection.clear();
        self.phase.transition_to(TurnPhase::Idle)?;
        self.events.push(SessionEvent::IllegalMove { from, to });
        Ok(true)
    }

    /// Release the slot held by a solicitation that failed
    ///
    /// The turn flow falls back to where it can be retried: input is accepted
    /// again after a failed selection or submission, an engine turn is
    /// solicited again after a failed engine move.
    pub fn abandon(&mut self, ticket: Ticket) -> bool {
        if !self.guard.is_current(&ticket) {
            return false;
        }
        self.guard.cancel();

        match ticket.call() {
            PendingCall::Targets { .. } | PendingCall::Submission { .. } => {
                self.selection.clear();
                if !self.phase.is_terminal() {
                    self.phase.force(TurnPhase::Idle);
                }
            }
            PendingCall::CheckmatePoll => {
                if let Some(side_to_move) = self.side_to_move() {
                    if let Err(e) = self.settle_phase(side_to_move) {
                        warn!("[SESSION] Could not settle turn after failed checkmate poll: {}", e);
                    }
                }
            }
            PendingCall::Setup | PendingCall::EngineMove => {}
        }
        true
    }

    /// Solicit an engine move if the side to move belongs to the oracle
    pub fn begin_oracle_turn(&mut self) -> Option<EngineRequest> {
        if !self.phase.is_awaiting_oracle() || self.outcome.is_game_over() {
            return None;
        }
        let side_to_move = self.side_to_move()?;
        if self.player_side.controls(side_to_move) {
            return None;
        }

        let ticket = self.guard.request(PendingCall::EngineMove)?;
        let remaining_ms = self.clock.remaining_ms(side_to_move);
        debug!(
            "[SESSION] Engine to move for {} with {} ms",
            side_to_move, remaining_ms
        );
        Some(EngineRequest {
            ticket,
            remaining_ms,
            param: self.settings.increment_ms,
        })
    }

    /// Advance the display clock of the side to move
    pub fn tick(&mut self, now: Instant) -> Option<GameOutcome> {
        if self.outcome.is_game_over() {
            return None;
        }
        let side_to_move = self.side_to_move()?;
        let timeout = self.clock.tick(side_to_move, now)?;

        let outcome = GameOutcome::timeout(timeout.flagged);
        self.finish(outcome);
        Some(outcome)
    }

    /// End the game: freeze the clocks, drop input and outstanding calls
    pub fn finish(&mut self, outcome: GameOutcome) {
        self.outcome = outcome;
        self.phase.force(TurnPhase::Terminal);
        self.selection.clear();
        self.guard.advance();
        info!("[SESSION] Game over: {}", outcome);
        self.events.push(SessionEvent::GameOver { outcome });
    }

    pub fn hover(&mut self, square: Option<Square>) {
        self.selection.hovered = square;
    }

    /// Whether an engine move should be solicited right now
    pub fn awaiting_oracle(&self) -> bool {
        self.phase.is_awaiting_oracle() && !self.guard.is_pending()
    }

    pub fn view(&self) -> BoardView {
        let selected = self.selection.selected;
        let dragging = self.selection.is_dragging();
        let show_hints = self.settings.show_hints && selected.is_some();

        let cells = match &self.position {
            Some(position) => Square::all()
                .map(|square| {
                    let occupant = position.piece_at(square);
                    let is_origin = selected.is_some_and(|s| s.square == square);
                    let hint = (show_hints && self.selection.targets.contains(square)).then(|| {
                        if occupant.is_some() {
                            Hint::Capture
                        } else {
                            Hint::Quiet
                        }
                    });
                    CellView {
                        square,
                        piece: if is_origin && dragging { None } else { occupant },
                        selected: is_origin,
                        hovered: self.selection.hovered == Some(square),
                        hint,
                    }
                })
                .collect(),
            None => Vec::new(),
        };

        BoardView {
            cells,
            side_to_move: self.side_to_move(),
            dragged: selected.filter(|s| s.dragging).map(|s| s.piece),
            white_clock: self.clock.display(PieceColor::White),
            black_clock: self.clock.display(PieceColor::Black),
            banner: self.outcome.banner(),
            phase: self.phase,
        }
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn side_to_move(&self) -> Option<PieceColor> {
        self.position.as_ref().map(Position::side_to_move)
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn outcome(&self) -> GameOutcome {
        self.outcome
    }

    pub fn player_side(&self) -> PlayerSide {
        self.player_side
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn clock(&self) -> &DualClock {
        &self.clock
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        !self.is_stale(ticket)
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    fn is_stale(&self, ticket: &Ticket) -> bool {
        self.outcome.is_game_over() || !self.guard.is_current(ticket)
    }

    /// Side to move, if the local player may act on it now
    fn input_side(&self) -> Option<PieceColor> {
        if !self.phase.accepts_input() || self.outcome.is_game_over() {
            return None;
        }
        let side_to_move = self.side_to_move()?;
        self.player_side
            .controls(side_to_move)
            .then_some(side_to_move)
    }

    /// Submit a drop of the selected piece
    ///
    /// Refused locally only once the target set is known; a drop that beats
    /// the target query goes to the oracle for validation.
    fn submit_selected(&mut self, from: Square, to: Square) -> SessionResult<PointerAction> {
        if self.selection.rules_out(to) {
            info!("[SESSION] {} is not a target of {}", to, from);
            self.cancel_target_query();
            self.selection.clear();
            self.phase.transition_to(TurnPhase::Idle)?;
            self.events.push(SessionEvent::IllegalMove { from, to });
            return Ok(PointerAction::Rejected { from, to });
        }
        self.submit(from, to)
    }

    fn submit(&mut self, from: Square, to: Square) -> SessionResult<PointerAction> {
        self.cancel_target_query();
        let Some(ticket) = self.guard.request(PendingCall::Submission { from, to }) else {
            return Ok(PointerAction::Ignored);
        };
        self.phase.transition_to(TurnPhase::Submitting)?;
        self.selection.drop_piece();
        debug!("[SESSION] Submitting {} -> {}", from, to);
        Ok(PointerAction::Submit {
            ticket,
            from,
            to,
            side: self.player_side,
        })
    }

    fn cancel_target_query(&mut self) {
        if matches!(self.guard.in_flight(), Some(PendingCall::Targets { .. })) {
            self.guard.cancel();
        }
    }

    /// Idle for a human-controlled side to move, OracleTurn otherwise
    fn settle_phase(&mut self, side_to_move: PieceColor) -> SessionResult<bool> {
        let oracle_turn = !self.player_side.controls(side_to_move);
        let next = if oracle_turn {
            TurnPhase::OracleTurn
        } else {
            TurnPhase::Idle
        };
        self.phase.transition_to(next)?;
        Ok(oracle_turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::components::{Piece, PieceKind};
    use crate::game::error::SessionError;
    use std::time::Duration;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn started(side: PlayerSide) -> (SessionState, Instant) {
        let t0 = Instant::now();
        let mut state = SessionState::new(SessionSettings::default(), t0);
        let setup = state.begin(side, t0);
        let IngestStep::PollCheckmate(poll) = state.ingest(setup, START, t0).unwrap() else {
            panic!("setup should request a checkmate poll");
        };
        state.conclude(poll, false).unwrap();
        state.drain_events();
        (state, t0)
    }

    #[test]
    fn test_setup_lands_in_idle_for_human_white() {
        let (state, _) = started(PlayerSide::White);
        assert_eq!(state.phase(), TurnPhase::Idle);
        assert_eq!(state.side_to_move(), Some(PieceColor::White));
        assert!(!state.awaiting_oracle());
    }

    #[test]
    fn test_setup_lands_in_oracle_turn_for_human_black() {
        let (state, _) = started(PlayerSide::Black);
        assert_eq!(state.phase(), TurnPhase::OracleTurn);
        assert!(state.awaiting_oracle());
    }

    #[test]
    fn test_press_own_piece_queries_targets() {
        let (mut state, _) = started(PlayerSide::White);
        let action = state.press(sq("e2")).unwrap();

        assert!(matches!(
            action,
            PointerAction::QueryTargets { square, side: PlayerSide::White, .. } if square == sq("e2")
        ));
        assert_eq!(state.phase(), TurnPhase::Selecting);
        assert!(state.selection().is_dragging());
    }

    #[test]
    fn test_press_ignored_for_opponent_piece_and_empty_square() {
        let (mut state, _) = started(PlayerSide::White);
        assert_eq!(state.press(sq("e7")).unwrap(), PointerAction::Ignored);
        assert_eq!(state.press(sq("e4")).unwrap(), PointerAction::Ignored);
        assert_eq!(state.phase(), TurnPhase::Idle);
    }

    #[test]
    fn test_press_ignored_when_side_not_controlled() {
        //! Black's pieces can't be selected by a White-only player, even on Black's turn
        let (mut state, t0) = started(PlayerSide::White);
        let PointerAction::Submit { ticket, .. } = state.request_submission(sq("e2"), sq("e4")).unwrap() else {
            panic!("submission expected");
        };
        let IngestStep::PollCheckmate(poll) = state.ingest(ticket, AFTER_E4, t0).unwrap() else {
            panic!("poll expected");
        };
        state.conclude(poll, false).unwrap();

        assert_eq!(state.phase(), TurnPhase::OracleTurn);
        assert_eq!(state.press(sq("e7")).unwrap(), PointerAction::Ignored);
        assert!(!state.selection().is_selected());
    }

    #[test]
    fn test_drag_release_submits_target() {
        let (mut state, _) = started(PlayerSide::White);
        let PointerAction::QueryTargets { ticket, .. } = state.press(sq("e2")).unwrap() else {
            panic!("target query expected");
        };
        let mask = (1u64 << sq("e3").index()) | (1u64 << sq("e4").index());
        assert!(state.receive_targets(ticket, mask));

        let action = state.release(sq("e4")).unwrap();
        assert!(matches!(action, PointerAction::Submit { from, to, .. } if from == sq("e2") && to == sq("e4")));
        assert_eq!(state.phase(), TurnPhase::Submitting);
    }

    #[test]
    fn test_click_to_move() {
        //! Release over the origin keeps the selection; the next press submits
        let (mut state, _) = started(PlayerSide::White);
        let PointerAction::QueryTargets { ticket, .. } = state.press(sq("g1")).unwrap() else {
            panic!("target query expected");
        };
        state.receive_targets(ticket, 1u64 << sq("f3").index());

        assert_eq!(state.release(sq("g1")).unwrap(), PointerAction::Ignored);
        assert!(state.selection().is_selected());
        assert!(!state.selection().is_dragging());

        let action = state.press(sq("f3")).unwrap();
        assert!(matches!(action, PointerAction::Submit { to, .. } if to == sq("f3")));
    }

    #[test]
    fn test_non_target_rejected_locally() {
        let (mut state, _) = started(PlayerSide::White);
        let PointerAction::QueryTargets { ticket, .. } = state.press(sq("e2")).unwrap() else {
            panic!("target query expected");
        };
        state.receive_targets(ticket, 1u64 << sq("e4").index());

        let action = state.release(sq("e5")).unwrap();
        assert_eq!(
            action,
            PointerAction::Rejected {
                from: sq("e2"),
                to: sq("e5")
            }
        );
        assert_eq!(state.phase(), TurnPhase::Idle);
        assert!(!state.selection().is_selected());
        assert_eq!(
            state.drain_events(),
            vec![SessionEvent::IllegalMove {
                from: sq("e2"),
                to: sq("e5")
            }]
        );
    }

    #[test]
    fn test_release_before_targets_goes_to_oracle() {
        //! A drop that beats the target query is validated by the oracle, not refused
        let (mut state, _) = started(PlayerSide::White);
        let PointerAction::QueryTargets { ticket: query, .. } = state.press(sq("e2")).unwrap() else {
            panic!("target query expected");
        };

        let action = state.release(sq("e4")).unwrap();
        assert!(matches!(
            action,
            PointerAction::Submit { from, to, .. } if from == sq("e2") && to == sq("e4")
        ));
        assert_eq!(state.phase(), TurnPhase::Submitting);
        assert!(state.drain_events().is_empty());

        // The superseded target answer is dropped
        assert!(!state.receive_targets(query, 1u64 << sq("e4").index()));
        assert!(!state.selection().targets_known);
    }

    #[test]
    fn test_reselect_supersedes_target_query() {
        let (mut state, _) = started(PlayerSide::White);
        let PointerAction::QueryTargets { ticket: first, .. } = state.press(sq("e2")).unwrap() else {
            panic!("target query expected");
        };
        let PointerAction::QueryTargets { ticket: second, .. } = state.press(sq("d2")).unwrap() else {
            panic!("target query expected");
        };

        assert!(!state.receive_targets(first, u64::MAX));
        assert!(state.receive_targets(second, 1u64 << sq("d4").index()));
        assert_eq!(state.selection().origin(), Some(sq("d2")));
    }

    #[test]
    fn test_oracle_rejection_returns_to_idle() {
        let (mut state, _) = started(PlayerSide::White);
        let PointerAction::Submit { ticket, .. } = state.request_submission(sq("e2"), sq("e5")).unwrap() else {
            panic!("submission expected");
        };

        assert!(state.reject_submission(ticket).unwrap());
        assert_eq!(state.phase(), TurnPhase::Idle);
        assert_eq!(state.position().map(Position::encode), Some(Position::decode(START).unwrap().encode()));
    }

    #[test]
    fn test_move_reconciles_mover_clock() {
        let (mut state, t0) = started(PlayerSide::White);
        let PointerAction::Submit { ticket, .. } = state.request_submission(sq("e2"), sq("e4")).unwrap() else {
            panic!("submission expected");
        };

        let t1 = t0 + Duration::from_millis(2_500);
        let IngestStep::PollCheckmate(poll) = state.ingest(ticket, AFTER_E4, t1).unwrap() else {
            panic!("poll expected");
        };
        let report = state.conclude(poll, false).unwrap();

        assert_eq!(
            report,
            IngestReport::Ongoing {
                side_to_move: PieceColor::Black,
                oracle_turn: true
            }
        );
        assert_eq!(state.clock().side(PieceColor::White).banked_ms, 177_500);
        assert_eq!(state.clock().side(PieceColor::Black).banked_ms, 180_000);
        assert_eq!(
            state.drain_events(),
            vec![
                SessionEvent::PositionChanged {
                    side_to_move: PieceColor::Black
                },
                SessionEvent::MovePlayed {
                    by: PieceColor::White
                },
            ]
        );

        let request = state.begin_oracle_turn().unwrap();
        assert_eq!(request.remaining_ms, 180_000);
        assert_eq!(request.param, 0);
        assert!(state.begin_oracle_turn().is_none());
    }

    #[test]
    fn test_failed_checkmate_poll_settles_turn() {
        let (mut state, t0) = started(PlayerSide::White);
        let PointerAction::Submit { ticket, .. } = state.request_submission(sq("e2"), sq("e4")).unwrap() else {
            panic!("submission expected");
        };
        let IngestStep::PollCheckmate(poll) = state.ingest(ticket, AFTER_E4, t0).unwrap() else {
            panic!("poll expected");
        };

        assert!(state.abandon(poll));
        assert!(!state.abandon(poll));
        assert_eq!(state.phase(), TurnPhase::OracleTurn);
        assert_eq!(state.side_to_move(), Some(PieceColor::Black));
        assert!(state.begin_oracle_turn().is_some());
    }

    #[test]
    fn test_malformed_position_keeps_board() {
        let (mut state, t0) = started(PlayerSide::White);
        let PointerAction::Submit { ticket, .. } = state.request_submission(sq("e2"), sq("e4")).unwrap() else {
            panic!("submission expected");
        };

        let err = state.ingest(ticket, "8/8/8 b", t0).unwrap_err();
        assert!(matches!(err, SessionError::MalformedPosition(_)));
        assert_eq!(state.side_to_move(), Some(PieceColor::White));
        assert_eq!(state.phase(), TurnPhase::Idle);
        assert!(!state.is_current(&ticket));
    }

    #[test]
    fn test_checkmate_finishes_game() {
        let (mut state, t0) = started(PlayerSide::Neither);
        let request = state.begin_oracle_turn().unwrap();
        let mated = "8/8/8/8/8/8/8/k1K4R b";
        let IngestStep::PollCheckmate(poll) = state.ingest(request.ticket, mated, t0).unwrap() else {
            panic!("poll expected");
        };

        let report = state.conclude(poll, true).unwrap();
        assert_eq!(report, IngestReport::Finished(GameOutcome::WhiteWon));
        assert_eq!(state.phase(), TurnPhase::Terminal);
        assert_eq!(state.view().banner.as_deref(), Some("White won!"));
        assert!(state.begin_oracle_turn().is_none());
    }

    #[test]
    fn test_timeout_on_tick_freezes_session() {
        let t0 = Instant::now();
        let settings = SessionSettings {
            starting_time_ms: 100,
            ..Default::default()
        };
        let mut state = SessionState::new(settings, t0);
        let setup = state.begin(PlayerSide::White, t0);
        let IngestStep::PollCheckmate(poll) = state.ingest(setup, START, t0).unwrap() else {
            panic!("poll expected");
        };
        state.conclude(poll, false).unwrap();

        let mut outcome = None;
        for n in 1..=10u64 {
            outcome = state.tick(t0 + Duration::from_millis(33 * n));
            if outcome.is_some() {
                break;
            }
        }

        assert_eq!(outcome, Some(GameOutcome::BlackWonByTime));
        assert_eq!(state.press(sq("e2")).unwrap(), PointerAction::Ignored);
        assert_eq!(state.request_submission(sq("e2"), sq("e4")).unwrap(), PointerAction::Ignored);
        let black = state.clock().side(PieceColor::Black).display_ms;
        assert_eq!(state.tick(t0 + Duration::from_secs(5)), None);
        assert_eq!(state.clock().side(PieceColor::Black).display_ms, black);
    }

    #[test]
    fn test_restart_makes_responses_stale() {
        let (mut state, t0) = started(PlayerSide::Neither);
        let request = state.begin_oracle_turn().unwrap();

        let setup = state.begin(PlayerSide::White, t0);
        assert_eq!(
            state.ingest(request.ticket, AFTER_E4, t0).unwrap(),
            IngestStep::Stale
        );
        assert_eq!(state.position(), None);
        assert!(matches!(
            state.ingest(setup, START, t0).unwrap(),
            IngestStep::PollCheckmate(_)
        ));
    }

    #[test]
    fn test_view_hides_dragged_origin_and_marks_hints() {
        let (mut state, _) = started(PlayerSide::White);
        let PointerAction::QueryTargets { ticket, .. } = state.press(sq("b1")).unwrap() else {
            panic!("target query expected");
        };
        let mask = (1u64 << sq("a3").index()) | (1u64 << sq("c3").index()) | (1u64 << sq("d2").index());
        state.receive_targets(ticket, mask);
        state.hover(Some(sq("c3")));

        let view = state.view();
        let origin = view.cell(sq("b1")).unwrap();
        assert_eq!(origin.piece, None);
        assert!(origin.selected);
        assert_eq!(view.dragged, Some(Piece::new(PieceColor::White, PieceKind::Knight)));
        assert_eq!(view.cell(sq("a3")).unwrap().hint, Some(Hint::Quiet));
        assert_eq!(view.cell(sq("d2")).unwrap().hint, Some(Hint::Capture));
        assert!(view.cell(sq("c3")).unwrap().hovered);
        assert_eq!(view.hints().count(), 3);
        assert_eq!(view.white_clock, "03:00");
    }
}
