//! Case simulation engine CLI.
//!
//! Validates authored case files, shows the reveal frontier for a given
//! state, and replays scripted attempts to a score.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use engine::core::reveal::frontier_for;
use engine::io::case_store::load_case_file;
use engine::io::config::load_config;
use engine::io::fs_util::StoreLayout;
use engine::replay::{load_script, run_replay};
use engine::{Engine, EngineError, exit_codes, logging};

#[derive(Parser)]
#[command(
    name = "engine",
    version,
    about = "Clinical case simulation and reasoning-evaluation engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a case file against the schema and case invariants.
    Validate {
        case: PathBuf,
    },
    /// List findings and actions available from a given state.
    Frontier {
        case: PathBuf,
        /// Comma-separated ids of revealed findings.
        #[arg(long, value_delimiter = ',')]
        revealed: Vec<String>,
        /// Comma-separated ids of used actions.
        #[arg(long, value_delimiter = ',')]
        used: Vec<String>,
        /// Include the emergency set (as after a complication).
        #[arg(long)]
        emergency: bool,
    },
    /// Run a scripted attempt and print its score as JSON.
    Replay {
        case: PathBuf,
        script: PathBuf,
        /// Engine config (TOML). Defaults apply when omitted or missing.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Persist case, attempt and score under this store root.
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_code_for(&err));
    }
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<EngineError>() {
        Some(engine_err) if engine_err.is_rejection() => exit_codes::REJECTED,
        _ => exit_codes::INVALID,
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Validate { case } => cmd_validate(&case),
        Command::Frontier {
            case,
            revealed,
            used,
            emergency,
        } => cmd_frontier(&case, revealed, used, emergency),
        Command::Replay {
            case,
            script,
            config,
            store,
        } => cmd_replay(&case, &script, config, store),
    }
}

fn cmd_validate(path: &Path) -> Result<()> {
    let case = load_case_file(path)?;
    println!(
        "ok: case={} version={} findings={} actions={}",
        case.id(),
        case.version(),
        case.findings().len(),
        case.actions().len()
    );
    Ok(())
}

fn cmd_frontier(path: &Path, revealed: Vec<String>, used: Vec<String>, emergency: bool) -> Result<()> {
    let case = load_case_file(path)?;
    let revealed: BTreeSet<String> = revealed.into_iter().filter(|id| !id.is_empty()).collect();
    let used: BTreeSet<String> = used.into_iter().filter(|id| !id.is_empty()).collect();
    let frontier = frontier_for(&case, &revealed, &used, emergency);
    for finding in frontier.findings {
        println!(
            "finding\t{}\t{}\tcost={}",
            finding.id,
            finding.category.label(),
            finding.reveal_cost
        );
    }
    for action in frontier.actions {
        let risky = if action.risky { "\trisky" } else { "" };
        println!("action\t{}\tcost={}{}", action.id, action.cost, risky);
    }
    Ok(())
}

fn cmd_replay(
    case_path: &Path,
    script_path: &Path,
    config: Option<PathBuf>,
    store: Option<PathBuf>,
) -> Result<()> {
    let config = match config {
        Some(path) => load_config(&path)?,
        None => Default::default(),
    };
    let engine = Engine::new(config)?;
    let case = load_case_file(case_path)?;
    let script = load_script(script_path)?;
    let layout = store.map(StoreLayout::new);

    let outcome = run_replay(&engine, &case, &script, layout.as_ref())?;
    let payload = match &outcome.score {
        Some(score) => serde_json::to_string_pretty(score).context("serialize score")?,
        None => serde_json::to_string_pretty(&serde_json::json!({
            "attempt_id": outcome.attempt.id(),
            "status": outcome.attempt.status(),
        }))
        .context("serialize attempt status")?,
    };
    println!("{}", payload);
    Ok(())
}
