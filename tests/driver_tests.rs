//! Session Driver Integration Tests
//!
//! Tests for the real-time event loop including:
//! - Engine-against-engine play to a result
//! - Clock ticks flagging the side to move
//! - Halting after engine failures and resuming on restart
//! - Pointer commands forwarded to the session in order
//! - Commands served while setup is outstanding

use chess_session::core::{ManualClock, SessionSettings};
use chess_session::game::oracle::{GatedCall, OracleCall, ScriptedOracle};
use chess_session::game::{
    DriverExit, GameOutcome, PieceColor, PlayerSide, Session, SessionDriver, Square,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
const AFTER_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
const FOOLS_MATE: &str = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";

const TICK: Duration = Duration::from_millis(33);

type TestSession = Session<ScriptedOracle, ManualClock>;

fn sq(name: &str) -> Square {
    Square::from_algebraic(name).unwrap()
}

fn session_with(oracle: ScriptedOracle, settings: SessionSettings) -> (TestSession, ManualClock) {
    let clock = ManualClock::new();
    let session = Session::new(oracle, clock.clone(), settings);
    (session, clock)
}

fn engine_call_count(session: &TestSession) -> usize {
    session
        .oracle()
        .calls()
        .iter()
        .filter(|call| matches!(call, OracleCall::EngineMove { .. }))
        .count()
}

fn call_count(session: &TestSession, matches: impl Fn(&OracleCall) -> bool) -> usize {
    session.oracle().calls().iter().filter(|call| matches(call)).count()
}

/// Let the driver run until `done` holds, failing after a generous bound
async fn wait_until(mut done: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}

// ============================================================================
// Engine Play Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_engine_game_plays_to_checkmate() {
    let oracle = ScriptedOracle::new(START)
        .with_replies([AFTER_E4, FOOLS_MATE])
        .with_checkmate(FOOLS_MATE);
    let (session, _clock) = session_with(oracle, SessionSettings::default());

    let (driver, handle) = SessionDriver::new(session.clone(), TICK, 8);
    let task = tokio::spawn(driver.stop_on_game_over().run());
    assert!(handle.start(PlayerSide::Neither).await);

    let exit = task.await.unwrap();

    assert_eq!(exit, DriverExit::GameOver(GameOutcome::BlackWon));
    assert_eq!(engine_call_count(&session), 2);
    assert_eq!(session.view().banner.as_deref(), Some("Black won!"));
}

#[tokio::test(start_paused = true)]
async fn test_ticks_flag_idle_player() {
    let settings = SessionSettings {
        starting_time_ms: 500,
        ..Default::default()
    };
    let (session, clock) = session_with(ScriptedOracle::new(START), settings);

    let (driver, handle) = SessionDriver::new(session.clone(), TICK, 8);
    let task = tokio::spawn(driver.stop_on_game_over().run());
    handle.start(PlayerSide::White).await;
    wait_until(|| session.side_to_move().is_some()).await;

    clock.advance_ms(600);
    let exit = task.await.unwrap();

    assert_eq!(exit, DriverExit::GameOver(GameOutcome::BlackWonByTime));
    assert_eq!(session.remaining_ms(PieceColor::White), 0);
    assert_eq!(session.remaining_ms(PieceColor::Black), 500);
}

// ============================================================================
// Failure Handling Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_engine_failure_halts_until_restart() {
    let (session, _clock) = session_with(ScriptedOracle::new(START), SessionSettings::default());

    let (driver, handle) = SessionDriver::new(session.clone(), TICK, 8);
    let task = tokio::spawn(driver.run());
    handle.start(PlayerSide::Neither).await;
    wait_until(|| engine_call_count(&session) == 1).await;

    // Halted: a reply becoming available is not picked up on its own
    session.oracle().push_reply(AFTER_E4);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(engine_call_count(&session), 1);

    handle.start(PlayerSide::Neither).await;
    wait_until(|| engine_call_count(&session) == 3).await;
    assert_eq!(session.side_to_move(), Some(PieceColor::Black));

    assert!(handle.shutdown().await);
    assert_eq!(task.await.unwrap(), DriverExit::Shutdown);
}

#[tokio::test(start_paused = true)]
async fn test_stop_on_error_reports_failure() {
    let (session, _clock) = session_with(ScriptedOracle::new(START), SessionSettings::default());

    let (driver, handle) = SessionDriver::new(session, TICK, 8);
    let task = tokio::spawn(driver.stop_on_error().run());
    handle.start(PlayerSide::Neither).await;

    assert!(matches!(task.await.unwrap(), DriverExit::Failed(_)));
}

// ============================================================================
// Pointer Command Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_drag_and_drop_then_engine_reply() {
    let oracle = ScriptedOracle::new(START).with_replies([AFTER_E4, AFTER_E5]);
    let (session, _clock) = session_with(oracle, SessionSettings::default());

    let (driver, handle) = SessionDriver::new(session.clone(), TICK, 8);
    let task = tokio::spawn(driver.run());
    handle.start(PlayerSide::White).await;
    wait_until(|| session.side_to_move() == Some(PieceColor::White)).await;

    handle.press(sq("e2")).await;
    wait_until(|| session.view().dragged.is_some()).await;
    handle.release(sq("e4")).await;

    wait_until(|| session.oracle().remaining_replies() == 0).await;
    wait_until(|| session.side_to_move() == Some(PieceColor::White)).await;
    assert_eq!(
        session.position().unwrap().encode(),
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w"
    );

    drop(handle);
    assert_eq!(task.await.unwrap(), DriverExit::Shutdown);
}

#[tokio::test(start_paused = true)]
async fn test_release_waits_for_press_to_finish() {
    let gate = Arc::new(Notify::new());
    let oracle = ScriptedOracle::new(START)
        .with_legal_moves([(sq("e2"), sq("e4"))])
        .with_replies([AFTER_E4, AFTER_E5])
        .with_gate(GatedCall::ValidTargets, Arc::clone(&gate));
    let (session, _clock) = session_with(oracle, SessionSettings::default());

    let (driver, handle) = SessionDriver::new(session.clone(), TICK, 8);
    let task = tokio::spawn(driver.run());
    handle.start(PlayerSide::White).await;
    wait_until(|| session.side_to_move() == Some(PieceColor::White)).await;

    handle.press(sq("e2")).await;
    handle.release(sq("e4")).await;
    wait_until(|| call_count(&session, |call| matches!(call, OracleCall::ValidTargets { .. })) == 1).await;
    tokio::time::sleep(TICK * 10).await;
    assert_eq!(
        call_count(&session, |call| matches!(call, OracleCall::ValidateMove { .. })),
        0
    );

    gate.notify_one();
    wait_until(|| session.oracle().remaining_replies() == 0).await;
    wait_until(|| session.side_to_move() == Some(PieceColor::White)).await;
    assert_eq!(
        session.position().unwrap().encode(),
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w"
    );
    assert_eq!(
        call_count(&session, |call| matches!(call, OracleCall::ValidateMove { .. })),
        1
    );

    drop(handle);
    assert_eq!(task.await.unwrap(), DriverExit::Shutdown);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_served_while_setup_outstanding() {
    let gate = Arc::new(Notify::new());
    let oracle = ScriptedOracle::new(START).with_gate(GatedCall::Setup, Arc::clone(&gate));
    let (session, _clock) = session_with(oracle, SessionSettings::default());

    let (driver, handle) = SessionDriver::new(session.clone(), TICK, 8);
    let task = tokio::spawn(driver.run());
    handle.start(PlayerSide::White).await;
    wait_until(|| call_count(&session, |call| matches!(call, OracleCall::Setup)) == 1).await;

    handle.shutdown().await;
    let exit = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("driver should not wait on setup")
        .unwrap();
    assert_eq!(exit, DriverExit::Shutdown);
    assert_eq!(session.side_to_move(), None);
}
