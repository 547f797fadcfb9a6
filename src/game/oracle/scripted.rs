//! Scripted oracle for replays, tests and development
//!
//! Serves a fixed list of position codes instead of computing anything.
//! Every accepted move and every engine request consumes the next reply in
//! order, and every call is recorded so tests can assert on what the session
//! asked for.
//!
//! # Script format
//!
//! One entry per line. Blank lines and lines starting with `#` are ignored.
//!
//! ```text
//! # setup
//! rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w
//! e2-e4                                          # human move
//! rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b
//! rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w
//! 8/8/8/8/8/8/8/k1K4R b                          #mate
//! ```
//!
//! The first position line is the setup; later position lines are replies.
//! `from-to` lines are human moves, consumed by whoever drives the session.
//! A trailing `#mate` marks a reply whose side to move is checkmated.

use super::{MoveHandle, Oracle, OracleError, OracleResult};
use crate::game::codec::Square;
use crate::game::components::PlayerSide;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// One non-setup script entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Position { code: String, checkmate: bool },
    Move { from: Square, to: Square },
}

/// Parsed replay script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub setup: String,
    pub steps: Vec<ScriptStep>,
}

impl Script {
    pub fn parse(text: &str) -> OracleResult<Self> {
        let mut setup = None;
        let mut steps = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let (body, marker) = match line.split_once('#') {
                Some((body, marker)) => (body.trim(), marker.trim()),
                None => (line.trim(), ""),
            };
            if body.is_empty() {
                continue;
            }

            if let Some((from, to)) = parse_move(body) {
                if setup.is_none() {
                    return Err(OracleError::Protocol {
                        message: format!("line {}: move before the setup position", index + 1),
                    });
                }
                steps.push(ScriptStep::Move { from, to });
                continue;
            }

            if setup.is_none() {
                setup = Some(body.to_string());
            } else {
                steps.push(ScriptStep::Position {
                    code: body.to_string(),
                    checkmate: marker.eq_ignore_ascii_case("mate"),
                });
            }
        }

        let setup = setup.ok_or_else(|| OracleError::Protocol {
            message: "script has no setup position".to_string(),
        })?;
        Ok(Self { setup, steps })
    }

    /// Human moves in script order
    pub fn moves(&self) -> impl Iterator<Item = (Square, Square)> + '_ {
        self.steps.iter().filter_map(|step| match step {
            ScriptStep::Move { from, to } => Some((*from, *to)),
            ScriptStep::Position { .. } => None,
        })
    }
}

fn parse_move(body: &str) -> Option<(Square, Square)> {
    let (from, to) = body.split_once('-')?;
    Some((
        Square::from_algebraic(from.trim())?,
        Square::from_algebraic(to.trim())?,
    ))
}

/// A call the session made, as recorded by [`ScriptedOracle`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleCall {
    Setup,
    ValidTargets { square: Square, side: PlayerSide },
    ValidateMove { from: Square, to: Square, side: PlayerSide },
    ApplyMove { handle: MoveHandle },
    EngineMove { remaining_ms: i64, param: i64 },
    IsCheckmate,
}

/// Oracle calls that can be held open until released by the test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatedCall {
    Setup,
    ValidTargets,
    ValidateMove,
    ApplyMove,
    EngineMove,
}

#[derive(Debug, Default)]
struct ScriptState {
    setup: String,
    replies: VecDeque<String>,
    /// Empty means every move is legal
    legal: Vec<(Square, Square)>,
    checkmates: HashSet<String>,
    current: Option<String>,
    accepted: HashMap<MoveHandle, (Square, Square)>,
    next_handle: u32,
    calls: Vec<OracleCall>,
}

impl ScriptState {
    fn next_reply(&mut self) -> OracleResult<String> {
        let code = self.replies.pop_front().ok_or_else(|| OracleError::Unavailable {
            message: "script exhausted".to_string(),
        })?;
        self.current = Some(code.clone());
        Ok(code)
    }
}

/// Oracle that replays canned position codes
#[derive(Debug)]
pub struct ScriptedOracle {
    state: Mutex<ScriptState>,
    gates: HashMap<GatedCall, Arc<Notify>>,
}

impl ScriptedOracle {
    pub fn new(setup: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(ScriptState {
                setup: setup.into(),
                next_handle: 1,
                ..Default::default()
            }),
            gates: HashMap::new(),
        }
    }

    pub fn from_script(script: &Script) -> Self {
        let mut oracle = Self::new(script.setup.clone());
        let state = oracle.state.get_mut();
        for step in &script.steps {
            if let ScriptStep::Position { code, checkmate } = step {
                state.replies.push_back(code.clone());
                if *checkmate {
                    state.checkmates.insert(code.clone());
                }
            }
        }
        oracle
    }

    /// Queue replies served by `apply_move` and `engine_move`, in order
    pub fn with_replies<I, S>(mut self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state
            .get_mut()
            .replies
            .extend(replies.into_iter().map(Into::into));
        self
    }

    /// Restrict legality to `moves`; targets are derived from the same list
    pub fn with_legal_moves(mut self, moves: impl IntoIterator<Item = (Square, Square)>) -> Self {
        self.state.get_mut().legal.extend(moves);
        self
    }

    /// Report checkmate whenever `code` is the current position
    pub fn with_checkmate(mut self, code: impl Into<String>) -> Self {
        self.state.get_mut().checkmates.insert(code.into());
        self
    }

    /// Hold every `call` until `gate` is notified, once per call
    pub fn with_gate(mut self, call: GatedCall, gate: Arc<Notify>) -> Self {
        self.gates.insert(call, gate);
        self
    }

    /// Hold every `engine_move` until `gate` is notified
    pub fn with_engine_gate(self, gate: Arc<Notify>) -> Self {
        self.with_gate(GatedCall::EngineMove, gate)
    }

    pub fn push_reply(&self, code: impl Into<String>) {
        self.state.lock().replies.push_back(code.into());
    }

    /// Every call made so far, oldest first
    pub fn calls(&self) -> Vec<OracleCall> {
        self.state.lock().calls.clone()
    }

    pub fn remaining_replies(&self) -> usize {
        self.state.lock().replies.len()
    }

    fn record(&self, call: OracleCall) {
        debug!("[ORACLE] {:?}", call);
        self.state.lock().calls.push(call);
    }

    async fn pass_gate(&self, call: GatedCall) {
        if let Some(gate) = self.gates.get(&call) {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn setup(&self) -> OracleResult<String> {
        self.record(OracleCall::Setup);
        self.pass_gate(GatedCall::Setup).await;
        let mut state = self.state.lock();
        let setup = state.setup.clone();
        state.current = Some(setup.clone());
        Ok(setup)
    }

    async fn valid_targets(&self, square: Square, side: PlayerSide) -> OracleResult<u64> {
        self.record(OracleCall::ValidTargets { square, side });
        self.pass_gate(GatedCall::ValidTargets).await;
        let state = self.state.lock();
        if state.legal.is_empty() {
            return Ok(u64::MAX);
        }
        Ok(state
            .legal
            .iter()
            .filter(|(from, _)| *from == square)
            .fold(0, |mask, (_, to)| mask | (1u64 << to.index())))
    }

    async fn validate_move(
        &self,
        from: Square,
        to: Square,
        side: PlayerSide,
    ) -> OracleResult<Option<MoveHandle>> {
        self.record(OracleCall::ValidateMove { from, to, side });
        self.pass_gate(GatedCall::ValidateMove).await;
        let mut state = self.state.lock();
        if !state.legal.is_empty() && !state.legal.contains(&(from, to)) {
            return Ok(None);
        }

        let handle = MoveHandle::from_raw(state.next_handle).ok_or_else(|| {
            OracleError::Protocol {
                message: "move handle space exhausted".to_string(),
            }
        })?;
        state.next_handle = state.next_handle.wrapping_add(1);
        state.accepted.insert(handle, (from, to));
        Ok(Some(handle))
    }

    async fn apply_move(&self, handle: MoveHandle) -> OracleResult<String> {
        self.record(OracleCall::ApplyMove { handle });
        self.pass_gate(GatedCall::ApplyMove).await;
        let mut state = self.state.lock();
        if state.accepted.remove(&handle).is_none() {
            warn!("[ORACLE] apply_move with unknown handle {}", handle);
            return Err(OracleError::Protocol {
                message: format!("unknown move handle {handle}"),
            });
        }
        state.next_reply()
    }

    async fn engine_move(&self, remaining_ms: i64, param: i64) -> OracleResult<String> {
        self.record(OracleCall::EngineMove {
            remaining_ms,
            param,
        });
        self.pass_gate(GatedCall::EngineMove).await;
        self.state.lock().next_reply()
    }

    async fn is_checkmate(&self) -> OracleResult<bool> {
        self.record(OracleCall::IsCheckmate);
        let state = self.state.lock();
        Ok(state
            .current
            .as_ref()
            .is_some_and(|code| state.checkmates.contains(code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    #[test]
    fn test_parse_script() {
        //! Comments, setup, moves, replies and the mate marker
        let text = format!(
            "# opening\n\n{START}\ne2-e4   # king pawn\n{AFTER_E4}\n8/8/8/8/8/8/8/k1K4R b #mate\n"
        );
        let script = Script::parse(&text).unwrap();

        assert_eq!(script.setup, START);
        assert_eq!(script.moves().collect::<Vec<_>>(), vec![(sq("e2"), sq("e4"))]);
        assert_eq!(
            script.steps[2],
            ScriptStep::Position {
                code: "8/8/8/8/8/8/8/k1K4R b".to_string(),
                checkmate: true,
            }
        );
    }

    #[test]
    fn test_parse_rejects_empty_script() {
        assert!(matches!(
            Script::parse("# nothing here\n"),
            Err(OracleError::Protocol { .. })
        ));
        assert!(Script::parse("e2-e4\n").is_err());
    }

    #[tokio::test]
    async fn test_targets_follow_legal_moves() {
        let oracle = ScriptedOracle::new(START)
            .with_legal_moves([(sq("e2"), sq("e3")), (sq("e2"), sq("e4")), (sq("g1"), sq("f3"))]);

        let mask = oracle.valid_targets(sq("e2"), PlayerSide::White).await.unwrap();
        assert_eq!(mask, (1u64 << sq("e3").index()) | (1u64 << sq("e4").index()));
    }

    #[tokio::test]
    async fn test_illegal_move_has_no_handle() {
        let oracle = ScriptedOracle::new(START).with_legal_moves([(sq("e2"), sq("e4"))]);
        let handle = oracle
            .validate_move(sq("e2"), sq("e5"), PlayerSide::White)
            .await
            .unwrap();
        assert_eq!(handle, None);
    }

    #[tokio::test]
    async fn test_replies_served_in_order_then_exhausted() {
        let oracle = ScriptedOracle::new(START).with_replies([AFTER_E4]);

        let handle = oracle
            .validate_move(sq("e2"), sq("e4"), PlayerSide::White)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(oracle.apply_move(handle).await.unwrap(), AFTER_E4);

        let err = oracle.engine_move(1_000, 0).await.unwrap_err();
        assert!(matches!(err, OracleError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_unknown_handle_is_protocol_error() {
        let oracle = ScriptedOracle::new(START).with_replies([AFTER_E4]);
        let bogus = MoveHandle::from_raw(99).unwrap();
        assert!(matches!(
            oracle.apply_move(bogus).await,
            Err(OracleError::Protocol { .. })
        ));
        assert_eq!(oracle.remaining_replies(), 1);
    }

    #[tokio::test]
    async fn test_checkmate_tracks_current_position() {
        let mated = "8/8/8/8/8/8/8/k1K4R b";
        let oracle = ScriptedOracle::new(START)
            .with_replies([mated])
            .with_checkmate(mated);

        oracle.setup().await.unwrap();
        assert!(!oracle.is_checkmate().await.unwrap());
        oracle.engine_move(1_000, 0).await.unwrap();
        assert!(oracle.is_checkmate().await.unwrap());
    }

    #[tokio::test]
    async fn test_calls_are_recorded() {
        let oracle = ScriptedOracle::new(START).with_replies([AFTER_E4]);
        oracle.setup().await.unwrap();
        oracle.engine_move(42_000, 5).await.unwrap();

        assert_eq!(
            oracle.calls(),
            vec![
                OracleCall::Setup,
                OracleCall::EngineMove {
                    remaining_ms: 42_000,
                    param: 5
                },
            ]
        );
    }
}
