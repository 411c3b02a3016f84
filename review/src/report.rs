//! Aggregate statistics over stored attempts.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use serde::Serialize;

use engine::core::attempt::Attempt;
use engine::core::types::AttemptStatus;
use engine::io::case_store::{list_case_ids, load_latest};
use engine::io::fs_util::StoreLayout;

use crate::outcome::{Outcome, classify_outcome};
use crate::roster::Roster;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct StudentSummary {
    pub student: String,
    pub attempts: usize,
    pub scored: usize,
    pub abandoned: usize,
    pub avg_points: Option<f64>,
    pub cases_attempted: BTreeSet<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct TeacherSummary {
    pub teacher: String,
    pub classes: usize,
    pub students: usize,
    pub cases_authored: BTreeSet<String>,
    pub roster_attempts: usize,
    pub roster_avg_points: Option<f64>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CaseSummary {
    pub case_id: String,
    pub attempts: usize,
    pub outcomes: BTreeMap<&'static str, usize>,
    pub avg_points: Option<f64>,
}

pub fn summarize_student(attempts: &[Attempt], student: &str) -> StudentSummary {
    let mine: Vec<&Attempt> = attempts
        .iter()
        .filter(|attempt| attempt.student() == student)
        .collect();
    StudentSummary {
        student: student.to_string(),
        attempts: mine.len(),
        scored: count_status(&mine, AttemptStatus::Scored),
        abandoned: count_status(&mine, AttemptStatus::Abandoned),
        avg_points: average_points(&mine),
        cases_attempted: mine
            .iter()
            .map(|attempt| attempt.case_id().to_string())
            .collect(),
    }
}

/// Classes and students come from the roster; authored cases from the
/// latest stored version of each case.
pub fn summarize_teacher(
    layout: &StoreLayout,
    roster: &Roster,
    attempts: &[Attempt],
    teacher: &str,
) -> Result<(TeacherSummary, Vec<String>)> {
    let mut warnings = Vec::new();
    let mut cases_authored = BTreeSet::new();
    for case_id in list_case_ids(layout)? {
        match load_latest(layout, &case_id) {
            Ok(case) => {
                if case.definition().author.as_deref() == Some(teacher) {
                    cases_authored.insert(case_id);
                }
            }
            Err(err) => warnings.push(format!("skip case {case_id}: {err:#}")),
        }
    }

    let students = roster.students_for(teacher);
    let roster_attempts: Vec<&Attempt> = attempts
        .iter()
        .filter(|attempt| students.contains(attempt.student()))
        .collect();

    let summary = TeacherSummary {
        teacher: teacher.to_string(),
        classes: roster.classes_for(teacher).count(),
        students: students.len(),
        cases_authored,
        roster_attempts: roster_attempts.len(),
        roster_avg_points: average_points(&roster_attempts),
    };
    Ok((summary, warnings))
}

pub fn summarize_case(attempts: &[Attempt], case_id: &str) -> CaseSummary {
    let on_case: Vec<&Attempt> = attempts
        .iter()
        .filter(|attempt| attempt.case_id() == case_id)
        .collect();
    let mut outcomes: BTreeMap<&'static str, usize> =
        Outcome::ALL.iter().map(|outcome| (outcome.label(), 0)).collect();
    for attempt in &on_case {
        *outcomes.entry(classify_outcome(attempt).label()).or_insert(0) += 1;
    }
    CaseSummary {
        case_id: case_id.to_string(),
        attempts: on_case.len(),
        outcomes,
        avg_points: average_points(&on_case),
    }
}

fn count_status(attempts: &[&Attempt], status: AttemptStatus) -> usize {
    attempts
        .iter()
        .filter(|attempt| attempt.status() == status)
        .count()
}

/// Mean of the latest score revision's points over scored attempts.
fn average_points(attempts: &[&Attempt]) -> Option<f64> {
    let points: Vec<u32> = attempts
        .iter()
        .filter_map(|attempt| attempt.latest_score())
        .map(|score| score.points)
        .collect();
    if points.is_empty() {
        return None;
    }
    Some(points.iter().map(|p| f64::from(*p)).sum::<f64>() / points.len() as f64)
}
