//! CLI command implementations.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use engine::io::attempt_store::list_attempts;
use engine::io::fs_util::StoreLayout;

use crate::report::{summarize_case, summarize_student, summarize_teacher};
use crate::roster::load_roster;

pub fn report_student(store: &Path, student: &str, json: bool) -> Result<()> {
    let layout = StoreLayout::new(store);
    let (attempts, warnings) = list_attempts(&layout)?;
    debug!(attempts = attempts.len(), "attempts loaded");
    let summary = summarize_student(&attempts, student);
    if json {
        print_json(&summary)?;
    } else {
        println!("student: id={} attempts={}", summary.student, summary.attempts);
        println!(
            "student: scored={} abandoned={} avg_points={}",
            summary.scored,
            summary.abandoned,
            format_avg(summary.avg_points)
        );
        println!(
            "student: cases_attempted={} [{}]",
            summary.cases_attempted.len(),
            summary.cases_attempted.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }
    print_warnings(&warnings);
    Ok(())
}

pub fn report_teacher(store: &Path, roster_path: &Path, teacher: &str, json: bool) -> Result<()> {
    let layout = StoreLayout::new(store);
    let roster = load_roster(roster_path).context("load roster")?;
    let (attempts, mut warnings) = list_attempts(&layout)?;
    let (summary, case_warnings) = summarize_teacher(&layout, &roster, &attempts, teacher)?;
    warnings.extend(case_warnings);
    if json {
        print_json(&summary)?;
    } else {
        println!(
            "teacher: id={} classes={} students={}",
            summary.teacher, summary.classes, summary.students
        );
        println!(
            "teacher: cases_authored={} [{}]",
            summary.cases_authored.len(),
            summary.cases_authored.iter().cloned().collect::<Vec<_>>().join(", ")
        );
        println!(
            "teacher: roster_attempts={} avg_points={}",
            summary.roster_attempts,
            format_avg(summary.roster_avg_points)
        );
    }
    print_warnings(&warnings);
    Ok(())
}

pub fn report_case(store: &Path, case_id: &str, json: bool) -> Result<()> {
    let layout = StoreLayout::new(store);
    let (attempts, warnings) = list_attempts(&layout)?;
    let summary = summarize_case(&attempts, case_id);
    if json {
        print_json(&summary)?;
    } else {
        println!(
            "case: id={} attempts={} avg_points={}",
            summary.case_id,
            summary.attempts,
            format_avg(summary.avg_points)
        );
        for (label, count) in &summary.outcomes {
            println!("case: outcome {} {}", label, count);
        }
    }
    print_warnings(&warnings);
    Ok(())
}

fn format_avg(avg: Option<f64>) -> String {
    avg.map_or_else(|| "-".to_string(), |avg| format!("{:.1}", avg))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize summary")?;
    println!("{}", payload);
    Ok(())
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("warning: {}", warning);
    }
}
