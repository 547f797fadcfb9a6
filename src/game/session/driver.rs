//! Event loop driving a [`Session`] in real time
//!
//! The driver owns the clock tick, the engine turn and the command queue:
//!
//! - A [`tokio::time::interval`] fires at the configured tick period and
//!   advances the display clock of the side to move.
//! - Whenever the session awaits an engine move, exactly one engine future
//!   is kept in flight and polled alongside everything else.
//! - [`SessionCommand`]s from a [`DriverHandle`] start sessions and forward
//!   pointer input. Setup and pointer work are polled as futures of their
//!   own, so a slow oracle never stalls the clock or the command queue.
//!   Pointer commands are handled one at a time in arrival order: a release
//!   is not looked at before the press ahead of it has finished.
//!
//! An engine failure halts engine solicitation until the next
//! [`SessionCommand::Start`]. No engine move is solicited while a setup is
//! outstanding. A start drops queued pointer input but does not cancel an
//! engine future that is already running; its answer is recognised as stale
//! and dropped.

use super::{IngestReport, PointerOutcome, Session};
use crate::core::time::TimeSource;
use crate::game::codec::Square;
use crate::game::components::PlayerSide;
use crate::game::error::{SessionError, SessionResult};
use crate::game::oracle::Oracle;
use crate::game::resources::GameOutcome;
use futures_lite::future::{self, Boxed};
use futures_lite::FutureExt;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Input accepted by a running driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Start(PlayerSide),
    Press(Square),
    Release(Square),
    Hover(Option<Square>),
    Shutdown,
}

/// Why [`SessionDriver::run`] returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverExit {
    /// Shutdown requested or every handle dropped
    Shutdown,
    /// The game ended and the driver was told to stop on game over
    GameOver(GameOutcome),
    /// The engine failed and the driver was told to stop on errors
    Failed(SessionError),
}

/// Sending side of a driver's command queue
#[derive(Debug, Clone)]
pub struct DriverHandle {
    commands: mpsc::Sender<SessionCommand>,
}

impl DriverHandle {
    /// Queue `command`; false once the driver has stopped
    pub async fn send(&self, command: SessionCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    pub async fn start(&self, side: PlayerSide) -> bool {
        self.send(SessionCommand::Start(side)).await
    }

    pub async fn press(&self, square: Square) -> bool {
        self.send(SessionCommand::Press(square)).await
    }

    pub async fn release(&self, square: Square) -> bool {
        self.send(SessionCommand::Release(square)).await
    }

    pub async fn shutdown(&self) -> bool {
        self.send(SessionCommand::Shutdown).await
    }
}

type EngineTurn = Boxed<SessionResult<Option<IngestReport>>>;
type SetupTurn = Boxed<SessionResult<IngestReport>>;
type PointerTurn = Boxed<SessionResult<PointerOutcome>>;

pub struct SessionDriver<O, C> {
    session: Session<O, C>,
    commands: mpsc::Receiver<SessionCommand>,
    /// Pointer commands waiting for the one in flight to finish
    pointer_queue: VecDeque<SessionCommand>,
    tick_period: Duration,
    halted: bool,
    stop_on_error: bool,
    stop_on_game_over: bool,
}

impl<O, C> SessionDriver<O, C>
where
    O: Oracle + 'static,
    C: TimeSource + 'static,
{
    /// Create a driver for `session` and the handle that feeds it
    pub fn new(session: Session<O, C>, tick_period: Duration, capacity: usize) -> (Self, DriverHandle) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let driver = Self {
            session,
            commands: rx,
            pointer_queue: VecDeque::new(),
            tick_period,
            halted: false,
            stop_on_error: false,
            stop_on_game_over: false,
        };
        (driver, DriverHandle { commands: tx })
    }

    /// Return from [`run`](Self::run) on the first engine failure
    pub fn stop_on_error(mut self) -> Self {
        self.stop_on_error = true;
        self
    }

    /// Return from [`run`](Self::run) once the game is decided
    pub fn stop_on_game_over(mut self) -> Self {
        self.stop_on_game_over = true;
        self
    }

    pub fn session(&self) -> &Session<O, C> {
        &self.session
    }

    pub async fn run(mut self) -> DriverExit {
        let mut ticker = tokio::time::interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut setup: Option<SetupTurn> = None;
        let mut engine: Option<EngineTurn> = None;
        let mut pointer: Option<PointerTurn> = None;

        info!(
            "[SESSION] Driver running with a {} ms tick",
            self.tick_period.as_millis()
        );

        loop {
            let outcome = self.session.outcome();
            if self.stop_on_game_over && outcome.is_game_over() {
                return DriverExit::GameOver(outcome);
            }

            if pointer.is_none() {
                pointer = self
                    .pointer_queue
                    .pop_front()
                    .and_then(|command| self.pointer_turn(command));
            }

            if engine.is_none() && setup.is_none() && !self.halted && self.session.awaiting_oracle()
            {
                let session = self.session.clone();
                engine = Some(async move { session.play_oracle_turn().await }.boxed());
            }

            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(outcome) = self.session.tick() {
                        info!("[CLOCK] {}", outcome);
                    }
                }
                result = next_turn(&mut setup) => {
                    setup = None;
                    match result {
                        Ok(report) => debug!("[SESSION] Setup finished: {:?}", report),
                        Err(e) => error!("[SESSION] Could not start session: {}", e),
                    }
                }
                result = next_turn(&mut engine) => {
                    engine = None;
                    match result {
                        Ok(report) => debug!("[SESSION] Engine turn finished: {:?}", report),
                        Err(e) => {
                            error!("[SESSION] Engine turn failed, halting: {}", e);
                            if self.stop_on_error {
                                return DriverExit::Failed(e);
                            }
                            self.halted = true;
                        }
                    }
                }
                result = next_turn(&mut pointer) => {
                    pointer = None;
                    match result {
                        Ok(outcome) => debug!("[SESSION] Pointer input handled: {:?}", outcome),
                        Err(e) => error!("[SESSION] Pointer input failed: {}", e),
                    }
                }
                command = self.commands.recv() => {
                    match command {
                        None | Some(SessionCommand::Shutdown) => {
                            info!("[SESSION] Driver shutting down");
                            return DriverExit::Shutdown;
                        }
                        Some(SessionCommand::Start(side)) => {
                            self.halted = false;
                            self.pointer_queue.clear();
                            pointer = None;
                            let session = self.session.clone();
                            setup = Some(async move { session.start_session(side).await }.boxed());
                        }
                        Some(SessionCommand::Hover(square)) => self.session.hover(square),
                        Some(command) => self.pointer_queue.push_back(command),
                    }
                }
            }
        }
    }

    fn pointer_turn(&self, command: SessionCommand) -> Option<PointerTurn> {
        let session = self.session.clone();
        match command {
            SessionCommand::Press(square) => Some(async move { session.press(square).await }.boxed()),
            SessionCommand::Release(square) => {
                Some(async move { session.release(square).await }.boxed())
            }
            SessionCommand::Start(_) | SessionCommand::Hover(_) | SessionCommand::Shutdown => None,
        }
    }
}

/// Resolve with the running turn, or never if there is none
async fn next_turn<T>(turn: &mut Option<Boxed<T>>) -> T {
    match turn {
        Some(turn) => turn.await,
        None => future::pending().await,
    }
}
