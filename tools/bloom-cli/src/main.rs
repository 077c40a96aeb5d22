// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueHint};
use serde::Serialize;
use st_bloom::config::{BloomSettings, ConfigLayering, LayeredConfig};
use st_bloom::{
    derive_signature, map_bloom_to_expression, telemetry, BloomAggregator, BloomDocument,
    BloomEvent, BloomState,
};
use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

type DynError = Box<dyn Error>;

type Result<T> = std::result::Result<T, DynError>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Bloom → expression pipeline driver for SpiralTorch"
)]
struct Cli {
    /// Directory holding base.toml / site.toml / run.json
    /// (defaults to BLOOM_CONFIG_ROOT or ~/.spiraltorch/bloom)
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute a bloom from phase momentum and emotional energy
    Bloom(BloomArgs),

    /// Map a bloom-state JSON object onto expression channels
    Express(ExpressArgs),

    /// Derive the symbolic signature of an emotion at a resonance
    Sign(SignArgs),

    /// Compile an events JSON array into significant signatures and a summary
    Digest(DigestArgs),
}

#[derive(Args)]
struct BloomArgs {
    /// Phase momentum (linear coefficient)
    #[arg(long, allow_hyphen_values = true)]
    phase: f64,

    /// Emotional energy (constant term)
    #[arg(long, allow_hyphen_values = true)]
    energy: f64,
}

#[derive(Args)]
struct ExpressArgs {
    /// Bloom-state JSON file (emotion → intensity)
    #[arg(long, value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Emit the 4-bit hex encoding instead of floats
    #[arg(long)]
    hex: bool,

    /// Destination file; STDOUT when omitted
    #[arg(long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct SignArgs {
    /// Emotion label (joy, grief, awe, rage, longing, fear, curiosity)
    #[arg(long)]
    emotion: String,

    /// Resonance in [0, 1]
    #[arg(long)]
    resonance: f64,

    /// Print the sigil projection instead of the full signature
    #[arg(long)]
    sigil: bool,
}

#[derive(Args)]
struct DigestArgs {
    /// Events JSON file (array of {emotion, resonance, timestamp})
    #[arg(long, value_hint = ValueHint::FilePath)]
    events: PathBuf,

    /// Significance threshold; overrides [aggregator] significance
    #[arg(long)]
    threshold: Option<f64>,

    /// Destination file; STDOUT when omitted
    #[arg(long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

fn main() {
    telemetry::init_tracing();
    let code = match try_main() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    };
    telemetry::flush_tracing();
    std::process::exit(code);
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;
    match &cli.command {
        Command::Bloom(args) => run_bloom(&settings, args),
        Command::Express(args) => run_express(args),
        Command::Sign(args) => run_sign(args),
        Command::Digest(args) => run_digest(&settings, args),
    }
}

fn load_settings(root: Option<&Path>) -> Result<BloomSettings> {
    let layering = match root {
        Some(dir) => ConfigLayering::discover_in(dir),
        None => ConfigLayering::discover(),
    };
    let layered = LayeredConfig::load(layering)?;
    Ok(BloomSettings::from_layered(&layered)?)
}

fn run_bloom(settings: &BloomSettings, args: &BloomArgs) -> Result<()> {
    let result = settings.calculator()?.compute_bloom(args.phase, args.energy)?;
    info!(blooming = result.is_blooming, "bloom computed");
    write_json(&result, None)
}

fn run_express(args: &ExpressArgs) -> Result<()> {
    let raw: serde_json::Value = serde_json::from_str(&read_text(&args.input)?)?;
    let state = BloomState::from_json(&raw)?;
    let expression = map_bloom_to_expression(&state);
    if args.hex {
        write_json(&expression.to_hex(), args.output.as_deref())
    } else {
        write_json(&expression, args.output.as_deref())
    }
}

fn run_sign(args: &SignArgs) -> Result<()> {
    let signature = derive_signature(&args.emotion, args.resonance, Utc::now())?;
    if args.sigil {
        write_json(&signature.as_sigil(), None)
    } else {
        write_json(&signature, None)
    }
}

fn run_digest(settings: &BloomSettings, args: &DigestArgs) -> Result<()> {
    let events: Vec<BloomEvent> = serde_json::from_str(&read_text(&args.events)?)?;
    let aggregator = match args.threshold {
        Some(threshold) => BloomAggregator::new(threshold)?,
        None => settings.aggregator()?,
    };
    let now = Utc::now();
    let digest = aggregator.digest(&events, now)?;
    info!(
        events = events.len(),
        significant = digest.signatures.len(),
        "digest complete"
    );
    let document = BloomDocument::new(now).with_digest(digest);
    write_json(&document, args.output.as_deref())
}

fn read_text(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) => Err(format!("failed to read {}: {err}", path.display()).into()),
    }
}

fn write_json<T: Serialize>(value: &T, destination: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match destination {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(path, text)?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{text}")?;
        }
    }
    Ok(())
}
