//! Reporting over a case/attempt/score store: per-student, per-teacher and
//! per-case statistics.

mod cli;
mod outcome;
mod report;
mod roster;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "review", version, about = "Statistics over stored case attempts")]
struct Cli {
    /// Print summaries as JSON.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Attempts, completions and average points for one student.
    Student {
        student_id: String,
        #[arg(long)]
        store: PathBuf,
    },
    /// Classes, students and authored cases for one teacher.
    Teacher {
        teacher_id: String,
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        roster: PathBuf,
    },
    /// Outcome distribution and average points for one case.
    Case {
        case_id: String,
        #[arg(long)]
        store: PathBuf,
    },
}

fn main() -> Result<()> {
    engine::logging::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Student { student_id, store } => cli::report_student(&store, &student_id, cli.json),
        Command::Teacher {
            teacher_id,
            store,
            roster,
        } => cli::report_teacher(&store, &roster, &teacher_id, cli.json),
        Command::Case { case_id, store } => cli::report_case(&store, &case_id, cli.json),
    }
}
