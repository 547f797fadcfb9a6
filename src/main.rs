use anyhow::{Context, Result};
use chess_session::core::{self, SessionSettings};
use chess_session::game::oracle::{Script, ScriptedOracle};
use chess_session::game::{
    DriverExit, MoveSubmission, OracleError, PlayerSide, PointerOutcome, Session, SessionDriver,
    SessionError, SessionEvent,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

const COMMAND_QUEUE: usize = 64;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Step through a script, playing its human moves as pointer input
    Replay(SessionArgs),

    /// Run a script engine-against-engine in real time with ticking clocks
    Watch(SessionArgs),
}

#[derive(Args, Debug)]
struct SessionArgs {
    /// Script of position codes and human moves
    #[arg(long)]
    script: PathBuf,

    /// Colors the local player controls: white, black, both or neither
    #[arg(long)]
    side: Option<PlayerSide>,

    /// Bank each side starts with, in milliseconds
    #[arg(long)]
    starting_time_ms: Option<i64>,

    /// Fischer increment per move, in milliseconds
    #[arg(long)]
    increment_ms: Option<i64>,

    /// Settings file (defaults to the user configuration directory)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    save: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    core::init_tracing()?;

    match cli.command {
        Command::Replay(args) => replay(args).await,
        Command::Watch(args) => watch(args).await,
    }
}

fn load_config(args: &SessionArgs) -> Result<(SessionSettings, Script)> {
    let path = args.settings.clone().unwrap_or_else(core::settings_path);
    let mut settings = core::load_settings(&path);

    if let Some(ms) = args.starting_time_ms {
        settings.starting_time_ms = ms;
    }
    if let Some(ms) = args.increment_ms {
        settings.increment_ms = ms;
    }
    if let Some(side) = args.side {
        settings.player_side = side;
    }
    settings.validate()?;

    if args.save {
        core::save_settings(&settings, &path)?;
    }

    let text = std::fs::read_to_string(&args.script)
        .with_context(|| format!("reading script {:?}", args.script))?;
    let script = Script::parse(&text)?;
    Ok((settings, script))
}

async fn replay(args: SessionArgs) -> Result<()> {
    let (settings, script) = load_config(&args)?;
    let side = settings.player_side;
    let session = Session::with_wall_clock(ScriptedOracle::from_script(&script), settings);

    session
        .start_session(side)
        .await
        .context("loading the setup position")?;
    report(&session);

    let mut moves = script.moves();
    while !session.outcome().is_game_over() {
        session.tick();

        if session.awaiting_oracle() {
            match session.play_oracle_turn().await {
                Ok(_) => {}
                Err(SessionError::Oracle(OracleError::Unavailable { .. })) => {
                    info!("[SESSION] Script exhausted");
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        } else if session.phase().accepts_input() {
            let Some((from, to)) = moves.next() else {
                info!("[SESSION] No scripted moves left");
                break;
            };
            println!("> {from}-{to}");
            session.press(from).await?;
            let outcome = session.press(to).await?;
            if outcome == PointerOutcome::Submitted(MoveSubmission::Illegal) {
                warn!("[SESSION] Scripted move {}-{} was refused", from, to);
            }
        } else {
            break;
        }

        report(&session);
    }

    println!("{}", session.outcome());
    Ok(())
}

async fn watch(args: SessionArgs) -> Result<()> {
    let (settings, script) = load_config(&args)?;
    let tick_period = Duration::from_millis(u64::try_from(settings.tick_period_ms)?);
    let session = Session::with_wall_clock(ScriptedOracle::from_script(&script), settings);

    let (driver, handle) = SessionDriver::new(session.clone(), tick_period, COMMAND_QUEUE);
    let task = tokio::spawn(driver.stop_on_error().stop_on_game_over().run());
    handle.start(PlayerSide::Neither).await;

    let exit = task.await?;
    report(&session);

    match exit {
        DriverExit::GameOver(outcome) => println!("{outcome}"),
        DriverExit::Failed(SessionError::Oracle(OracleError::Unavailable { .. })) => {
            println!("Script exhausted: {}", session.outcome());
        }
        DriverExit::Failed(e) => return Err(e.into()),
        DriverExit::Shutdown => {}
    }
    Ok(())
}

fn report<O, C>(session: &Session<O, C>)
where
    O: chess_session::Oracle + 'static,
    C: chess_session::TimeSource + 'static,
{
    for event in session.drain_events() {
        match event {
            SessionEvent::IllegalMove { from, to } => warn!("[SESSION] Illegal move {}-{}", from, to),
            SessionEvent::GameOver { outcome } => info!("[SESSION] {}", outcome),
            other => info!("[SESSION] {:?}", other),
        }
    }
    println!("{}\n", session.view());
}
