use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use matrix_arena::{
    arena::{Algorithm, ArenaRegistry, ArenaRunBuilder, ObserverError},
    core::GameId,
    evaluation::{EvalConfig, Evaluator, JsonLinesSink, MetricSink, NullSink},
    selfplay::{TrainConfig, train},
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, long_about = None)]
#[command(name = "matrix-arena")]
#[command(about = "Repeated matrix games under online learning and self-play")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream arena snapshots as JSON lines
    Arena {
        /// rps, mp or pd
        #[arg(short, long, default_value = "rps")]
        game: GameId,
        #[arg(short, long)]
        seed: Option<u32>,
        #[arg(long, default_value_t = 0.5)]
        lr: f64,
        #[arg(long, default_value_t = 10)]
        steps_per_tick: usize,
        /// Milliseconds between ticks
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,
        /// How many snapshots to print before stopping
        #[arg(short, long, default_value_t = 20)]
        ticks: usize,
    },
    /// Evaluate a pairing of learning rules
    Eval {
        #[arg(short, long, default_value = "rps")]
        game: GameId,
        /// hedge, regret or fp
        #[arg(long, default_value = "hedge")]
        alg_a: Algorithm,
        #[arg(long, default_value = "hedge")]
        alg_b: Algorithm,
        #[arg(long, value_delimiter = ',', default_value = "1")]
        seeds: Vec<u32>,
        #[arg(short, long, default_value_t = 10)]
        episodes: usize,
        #[arg(long, default_value_t = 50)]
        steps_per_ep: usize,
        #[arg(long, default_value_t = 0.5)]
        lr: f64,
        /// Also write `<run_id>.jsonl` into this directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Train self-play policies
    Train {
        #[arg(short, long, default_value = "pd")]
        game: GameId,
        #[arg(short, long, default_value_t = 1)]
        seed: u32,
        #[arg(short, long, default_value_t = 200)]
        episodes: usize,
        #[arg(long, default_value_t = 50)]
        steps_per_ep: usize,
        #[arg(long, default_value_t = 0.05)]
        lr: f64,
        #[arg(long, default_value_t = 16)]
        hidden: usize,
        /// Train this many independent workers (1 to 16) and aggregate
        #[arg(short, long)]
        workers: Option<usize>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Arena {
            game,
            seed,
            lr,
            steps_per_tick,
            interval_ms,
            ticks,
        } => {
            let mut builder = ArenaRunBuilder::default()
                .game(game)
                .learning_rate(lr)
                .steps_per_tick(steps_per_tick)
                .tick_interval(Duration::from_millis(interval_ms));
            if let Some(seed) = seed {
                builder = builder.seed(seed);
            }
            run_arena(builder, ticks).await
        }
        Commands::Eval {
            game,
            alg_a,
            alg_b,
            seeds,
            episodes,
            steps_per_ep,
            lr,
            out,
        } => run_eval(
            EvalConfig::new(game, alg_a, alg_b)
                .with_seeds(seeds)
                .with_episodes(episodes)
                .with_steps_per_ep(steps_per_ep)
                .with_lr(lr),
            out,
        ),
        Commands::Train {
            game,
            seed,
            episodes,
            steps_per_ep,
            lr,
            hidden,
            workers,
        } => run_train(
            TrainConfig::new(game, seed)
                .with_episodes(episodes)
                .with_steps_per_ep(steps_per_ep)
                .with_lr(lr)
                .with_hidden(hidden),
            workers,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_arena(builder: ArenaRunBuilder, ticks: usize) -> Result<(), Box<dyn std::error::Error>> {
    let registry = ArenaRegistry::new();
    let handle = registry.start(builder)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _subscription = handle.on_tick(move |snapshot| {
        tx.send(snapshot.clone()).map_err(|_| ObserverError::Closed)
    });

    for _ in 0..ticks {
        match rx.recv().await {
            Some(snapshot) => println!("{}", serde_json::to_string(&snapshot)?),
            None => break,
        }
    }

    registry.stop(&handle.id());
    Ok(())
}

fn run_eval(config: EvalConfig, out: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let evaluator = Evaluator::new(config)?;
    let mut sink: Box<dyn MetricSink> = match out {
        Some(dir) => Box::new(JsonLinesSink::new(dir)),
        None => Box::new(NullSink),
    };
    let report = evaluator.run(sink.as_mut());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_train(config: TrainConfig, workers: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = train(config, workers)?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
