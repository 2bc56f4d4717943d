//! Phase-tracking conductor for multi-phase model conversations.
//!
//! Keeps conversation state in `.conductor/`. Each `conductor turn` feeds one
//! complete model response through the directive decoders, advances the
//! phase, and writes the next prompt.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use conductor::core::batch::decode_batch_signal;
use conductor::core::intent::decode_intent_handover;
use conductor::core::phase::PhaseEvent;
use conductor::exit_codes;
use conductor::io::init::{InitOptions, init_conductor};
use conductor::status::read_status;
use conductor::turn::run_turn;

#[derive(Parser)]
#[command(
    name = "conductor",
    version,
    about = "Directive extraction and phase tracking for model conversations"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.conductor/` with default config and a fresh session.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Process one complete model response and write the next prompt.
    Turn {
        /// File holding the response; reads stdin when omitted or `-`.
        #[arg(short, long)]
        response: Option<PathBuf>,
    },
    /// Print the current phase and handover goals as JSON.
    Status,
    /// Decode a response without touching conversation state.
    Decode {
        /// Which directive to look for.
        directive: Directive,
        /// File holding the response; reads stdin when omitted or `-`.
        #[arg(short, long)]
        response: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Directive {
    /// Orientation → exploration handover.
    Intent,
    /// Workflow or step-help batch signal.
    Batch,
}

fn main() {
    let cli = Cli::parse();
    conductor::logging::init(cli.verbose);
    match run(cli.command) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(command: Command) -> Result<i32> {
    match command {
        Command::Init { force } => cmd_init(force),
        Command::Turn { response } => cmd_turn(response.as_deref()),
        Command::Status => cmd_status(),
        Command::Decode {
            directive,
            response,
        } => cmd_decode(directive, response.as_deref()),
    }
}

fn cmd_init(force: bool) -> Result<i32> {
    let paths = init_conductor(Path::new("."), &InitOptions { force })?;
    println!("initialized {}", paths.conductor_dir.display());
    Ok(exit_codes::OK)
}

fn cmd_turn(response: Option<&Path>) -> Result<i32> {
    let text = read_response(response)?;
    let outcome = run_turn(Path::new("."), &text)?;
    if !outcome.user_response.is_empty() {
        println!("{}", outcome.user_response);
    }
    eprintln!(
        "turn {}: {} -> {} (next prompt: {})",
        outcome.turn,
        outcome.phase_before,
        outcome.phase_after,
        outcome.turn_paths.prompt_path.display()
    );
    Ok(match outcome.event {
        PhaseEvent::EnteredExploration | PhaseEvent::EnteredExecution => exit_codes::ADVANCED,
        PhaseEvent::StepHelpRequested { .. } => exit_codes::STEP_HELP,
        PhaseEvent::Stayed => exit_codes::OK,
    })
}

fn cmd_status() -> Result<i32> {
    let report = read_status(Path::new("."))?;
    print_json(&report)?;
    Ok(exit_codes::OK)
}

fn cmd_decode(directive: Directive, response: Option<&Path>) -> Result<i32> {
    let text = read_response(response)?;
    match directive {
        Directive::Intent => print_json(&decode_intent_handover(&text))?,
        Directive::Batch => print_json(&decode_batch_signal(&text))?,
    }
    Ok(exit_codes::OK)
}

/// Read a response from `path`, or from stdin when `path` is absent or `-`.
fn read_response(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => {
            fs::read_to_string(path).with_context(|| format!("read response {}", path.display()))
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("read response from stdin")?;
            Ok(buf)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{payload}");
    Ok(())
}
