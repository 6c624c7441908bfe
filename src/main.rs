use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use ml_maze::maze::MazeConfig;
use ml_maze::rl::HyperParams;
use ml_maze::worker::{Command, EventSink, Worker, WorkerConfig};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::unbounded_channel;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ml_maze")]
#[command(version, about = "DQN agent that learns to drive grid mazes")]
struct Cli {
    /// What to run
    #[arg(long, default_value = "train")]
    mode: Mode,

    /// Maze JSON file (repeat for several training mazes)
    #[arg(long = "maze")]
    mazes: Vec<PathBuf>,

    /// Hyperparameter JSON file; overrides --preset
    #[arg(long)]
    hyper_params: Option<PathBuf>,

    /// Hyperparameter preset: light, balanced or thorough
    #[arg(long, default_value = "balanced")]
    preset: String,

    /// Episode budget; ε decay is rescaled to two thirds of it
    #[arg(long)]
    episodes: Option<usize>,

    /// Discard any loaded agent before training
    #[arg(long)]
    fresh: bool,

    /// Test maze rows
    #[arg(long, default_value = "8")]
    rows: usize,

    /// Test maze columns
    #[arg(long, default_value = "8")]
    cols: usize,

    /// Number of test mazes
    #[arg(long, default_value = "5")]
    count: usize,

    /// Directory holding saved model slots
    #[arg(long, default_value = "models")]
    model_dir: PathBuf,

    /// Load this slot before running
    #[arg(long)]
    load_slot: Option<usize>,

    /// Save the agent to this slot afterwards
    #[arg(long)]
    save_slot: Option<usize>,

    /// Name stored with --save-slot
    #[arg(long, default_value = "")]
    name: String,

    /// Skip pacing pauses between reported steps
    #[arg(long)]
    fast: bool,
}

#[derive(Clone, ValueEnum)]
enum Mode {
    /// Train on the given mazes
    Train,
    /// Evaluate on seeded test mazes
    Test,
    /// Run the agent once on a single maze
    Play,
}

fn load_maze(path: &Path) -> Result<MazeConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read maze from {:?}", path))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse maze {:?}", path))
}

fn load_hyper_params(cli: &Cli) -> Result<HyperParams> {
    let mut hyper_params = match &cli.hyper_params {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read hyperparameters from {:?}", path))?;
            serde_json::from_str(&json).context("Failed to parse hyperparameters")?
        }
        None => match HyperParams::preset(&cli.preset) {
            Some(preset) => preset,
            None => bail!("unknown preset {:?}", cli.preset),
        },
    };

    if let Some(episodes) = cli.episodes {
        hyper_params.max_episodes = episodes;
        hyper_params = hyper_params.with_auto_decay();
    }
    Ok(hyper_params)
}

/// Translate the command line into the worker commands to run in order
fn build_commands(cli: &Cli) -> Result<Vec<Command>> {
    let mut commands = Vec::new();

    if let Some(slot) = cli.load_slot {
        commands.push(Command::LoadModel { slot });
    }

    let mazes = cli
        .mazes
        .iter()
        .map(|path| load_maze(path))
        .collect::<Result<Vec<_>>>()?;

    match cli.mode {
        Mode::Train => {
            if mazes.is_empty() {
                bail!("train mode needs at least one --maze file");
            }
            commands.push(Command::StartTrain {
                mazes,
                hyper_params: load_hyper_params(cli)?,
                fresh: cli.fresh,
            });
        }
        Mode::Test => commands.push(Command::StartTest {
            rows: cli.rows,
            cols: cli.cols,
            count: cli.count,
        }),
        Mode::Play => {
            let Some(maze) = mazes.into_iter().next() else {
                bail!("play mode needs a --maze file");
            };
            commands.push(Command::Play { maze });
        }
    }

    if let Some(slot) = cli.save_slot {
        commands.push(Command::SaveModel {
            slot,
            name: cli.name.clone(),
        });
    }

    Ok(commands)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let commands = build_commands(&cli)?;

    // Events go to stdout as JSON lines
    let (events, mut events_rx) = EventSink::channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(err) => warn!(error = %err, "failed to encode event"),
            }
        }
    });

    // Ctrl+C stops the active run
    let (commands_tx, mut commands_rx) = unbounded_channel();
    let stop_tx = commands_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() && stop_tx.send(Command::Stop).is_err() {
            debug!("worker already finished");
        }
    });

    let mut config = WorkerConfig::new(cli.model_dir.clone());
    if cli.fast {
        config = config.fast();
    }
    let mut worker = Worker::new(config, events);

    info!(commands = commands.len(), "starting");
    for command in commands {
        worker.handle(command, &mut commands_rx).await;
    }

    drop(worker);
    drop(commands_tx);
    printer.await.context("event printer panicked")?;

    Ok(())
}
