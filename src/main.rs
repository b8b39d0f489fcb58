use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rust_chess::config::{Difficulty, EngineConfig};
use rust_chess::display::{GameSummary, board_diagram};
use rust_chess::domain::{PieceColor, PieceType, UciMove};
use rust_chess::error::EngineError;
use rust_chess::models::{EngineSession, GameMode, GameModel};

#[derive(Parser)]
#[command(name = "rust-chess", version, about = "Chess rules and a UCI engine opponent")]
struct Cli {
    /// JSON engine configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Engine executable, overrides the config file
    #[arg(long, global = true)]
    engine: Option<PathBuf>,

    #[arg(long, value_enum, global = true)]
    difficulty: Option<Difficulty>,

    /// Milliseconds to wait for each engine move
    #[arg(long, global = true)]
    move_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay moves in UCI notation and report the resulting position
    Moves {
        /// Moves such as e2e4 or e7e8q
        moves: Vec<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Play against the engine, entering moves on stdin
    Play {
        #[arg(long, value_enum, default_value = "white")]
        color: Side,
        /// Let the engine play both sides
        #[arg(long)]
        self_play: bool,
        /// Stop self-play after this many plies
        #[arg(long, default_value_t = 200)]
        max_plies: usize,
    },
    /// Print the JSON Schema of the config file
    Schema,
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    White,
    Black,
}

impl From<Side> for PieceColor {
    fn from(side: Side) -> Self {
        match side {
            Side::White => PieceColor::White,
            Side::Black => PieceColor::Black,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Moves { moves, json } => replay(moves, *json),
        Command::Schema => {
            println!("{}", EngineConfig::json_schema());
            Ok(())
        }
        Command::Play {
            color,
            self_play,
            max_plies,
        } => {
            let config = load_config(&cli)?;
            if *self_play {
                self_play_game(&config, *max_plies).await
            } else {
                play_human(&config, (*color).into()).await
            }
        }
    }
}

/// Config file first, then command-line overrides
fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(engine) = &cli.engine {
        config.path = engine.clone();
    }
    if let Some(difficulty) = cli.difficulty {
        config.difficulty = difficulty;
    }
    if let Some(ms) = cli.move_timeout_ms {
        config.move_timeout_ms = ms;
    }
    Ok(config)
}

fn replay(tokens: &[String], json: bool) -> Result<()> {
    let mut game = GameModel::default();
    for token in tokens {
        let uci = UciMove::from_uci(token).with_context(|| format!("not a UCI move: {token}"))?;
        let legal = game
            .play_uci(uci)
            .with_context(|| format!("cannot play {token}"))?;
        if !legal {
            bail!("illegal move {token} in position {}", game.board().to_fen());
        }
    }

    let summary = GameSummary::from_game(&game);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary.render(game.board()));
    }
    Ok(())
}

async fn self_play_game(config: &EngineConfig, max_plies: usize) -> Result<()> {
    let mut session = EngineSession::start(config).await.context("starting engine")?;
    let mut game = GameModel::default();

    for _ in 0..max_plies {
        if game.is_game_over() {
            break;
        }
        let Some(uci) = engine_move(&mut session, &game, config).await? else {
            break;
        };
        game.apply_engine_move(uci)?;
        report_last_move(&game);
    }

    print!("{}", GameSummary::from_game(&game).render(game.board()));
    session.shutdown().await?;
    Ok(())
}

async fn play_human(config: &EngineConfig, human: PieceColor) -> Result<()> {
    let mut session = EngineSession::start(config).await.context("starting engine")?;
    let mut game = GameModel::new(GameMode::VsEngine {
        human,
        difficulty: config.difficulty,
    });
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    print!("{}", board_diagram(game.board()));
    while !game.is_game_over() {
        if game.is_engine_turn() {
            let Some(uci) = engine_move(&mut session, &game, config).await? else {
                break;
            };
            game.apply_engine_move(uci)?;
            report_last_move(&game);
            print!("{}", board_diagram(game.board()));
            continue;
        }

        if game.promotion_pending() {
            println!("Promote to (q, r, b, n):");
        } else {
            println!("{} to move:", game.turn());
        }
        let Some(line) = input.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line == "quit" {
            break;
        }

        let outcome = if game.promotion_pending() {
            match line.chars().next().and_then(PieceType::from_promotion_char) {
                Some(to) => game.promote(to).map(|()| true),
                None => Ok(false),
            }
        } else {
            match UciMove::from_uci(line) {
                Some(uci) => game.play_uci(uci),
                None => Ok(false),
            }
        };
        match outcome {
            Ok(true) => {
                report_last_move(&game);
                print!("{}", board_diagram(game.board()));
            }
            Ok(false) => println!("Illegal move: {line}"),
            Err(err) => println!("{err}"),
        }
    }

    let status = game.status();
    if status.is_over() {
        println!("{status}");
    }
    session.shutdown().await?;
    Ok(())
}

/// Ask the engine for a move. `None` when the engine has no move to give or
/// the user interrupted the search.
async fn engine_move(
    session: &mut EngineSession,
    game: &GameModel,
    config: &EngineConfig,
) -> Result<Option<UciMove>> {
    let difficulty = match game.mode() {
        GameMode::VsEngine { difficulty, .. } => difficulty,
        GameMode::TwoPlayer => config.difficulty,
    };
    tokio::select! {
        result = session.best_move(game.board(), difficulty, config.move_timeout()) => match result {
            Ok(uci) => Ok(Some(uci)),
            Err(EngineError::NoMove) => {
                info!("engine has no legal move");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        },
        _ = tokio::signal::ctrl_c() => {
            warn!("search interrupted");
            Ok(None)
        }
    }
}

fn report_last_move(game: &GameModel) {
    if let Some(played) = game.board().last_move() {
        let status = game.status().to_string();
        if status.is_empty() {
            println!("{played}");
        } else {
            println!("{played} {status}");
        }
    }
}
