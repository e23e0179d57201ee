use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use serde::{de::DeserializeOwned, Deserialize};
use setlist_engine::{
    apply_operations, check_capacity, Config, EditOperation, GenerationRequest,
    SetConfig, SetlistGenerator, SetlistItem, Song,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line host for the setlist engine. Reads JSON, writes JSON.
#[derive(Parser, Debug)]
#[command(name = "setlist-engine")]
#[command(about = "Order, edit and generate band setlists")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// JSON input file (stdin when omitted)
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a setlist from a song pool
    Generate {
        /// Seed for reproducible runs (overrides SETLIST_SEED)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Report vocal pacing problems per set
    Pacing,
    /// Report sets holding more songs than configured
    Capacity,
    /// Replay a batch of edits over an item snapshot
    Apply,
}

#[derive(Debug, Deserialize)]
struct PacingInput {
    items: Vec<SetlistItem>,
    songs: Vec<Song>,
}

#[derive(Debug, Deserialize)]
struct CapacityInput {
    items: Vec<SetlistItem>,
    sets: Vec<SetConfig>,
}

#[derive(Debug, Deserialize)]
struct ApplyInput {
    items: Vec<SetlistItem>,
    operations: Vec<EditOperation>,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,setlist_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let generator = SetlistGenerator::new(config.generation.clone());
    let raw = read_input(args.input.as_deref())?;

    let output = match args.command {
        Command::Generate { seed } => {
            let request: GenerationRequest = parse(&raw)?;
            let result = match seed.or(config.seed) {
                Some(seed) => {
                    tracing::info!("Using fixed seed {}", seed);
                    generator.generate(&request, &mut StdRng::seed_from_u64(seed))
                }
                None => generator.generate(&request, &mut rand::thread_rng()),
            }
            .context("Setlist generation failed")?;
            serde_json::to_value(result)?
        }
        Command::Pacing => {
            let input: PacingInput = parse(&raw)?;
            serde_json::to_value(generator.check_pacing(&input.items, &input.songs))?
        }
        Command::Capacity => {
            let input: CapacityInput = parse(&raw)?;
            serde_json::to_value(check_capacity(&input.items, &input.sets))?
        }
        Command::Apply => {
            let input: ApplyInput = parse(&raw)?;
            let items = apply_operations(&input.items, &input.operations)
                .context("Edit batch rejected")?;
            tracing::info!(
                "Applied {} edits, {} items",
                input.operations.len(),
                items.len()
            );
            serde_json::to_value(items)?
        }
    };

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", rendered);

    Ok(())
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read stdin")?;
            Ok(raw)
        }
    }
}

fn parse<T: DeserializeOwned>(raw: &str) -> anyhow::Result<T> {
    serde_json::from_str(raw).context("Input is not valid JSON for this command")
}
