//! Test-only helpers for constructing cases and attempts.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};

use crate::core::attempt::Attempt;
use crate::core::case::{ActionOption, ActionTriggers, Case, CaseDefinition, FindingNode, ReferencePathway};
use crate::core::types::{FindingCategory, Identity};

/// Create a prerequisite-free history finding.
pub fn finding(id: &str, reveal_cost: u32) -> FindingNode {
    FindingNode {
        id: id.to_string(),
        category: FindingCategory::History,
        prerequisites: Vec::new(),
        content: format!("{} content", id),
        reveal_cost,
        emergency: false,
    }
}

/// Create a finding gated on `prerequisites`.
pub fn finding_with_prereqs(id: &str, reveal_cost: u32, prerequisites: &[&str]) -> FindingNode {
    FindingNode {
        prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
        category: FindingCategory::Lab,
        ..finding(id, reveal_cost)
    }
}

/// Create a safe, reusable action with no triggers.
pub fn action(id: &str, cost: u32) -> ActionOption {
    ActionOption {
        id: id.to_string(),
        label: format!("{} label", id),
        cost,
        risky: false,
        single_use: false,
        triggers: ActionTriggers::default(),
        complication_probability: None,
        resolves_complication: false,
    }
}

/// Findings `a` (cost 1) and `b` (cost 2, requires `a`); reference `{a, b}`.
pub fn two_finding_definition() -> CaseDefinition {
    CaseDefinition {
        id: "cough-fever".to_string(),
        version: 1,
        title: "Cough and fever".to_string(),
        vignette: "A 54-year-old presents with three days of productive cough.".to_string(),
        author: Some("teacher-1".to_string()),
        difficulty: None,
        patient: BTreeMap::new(),
        findings: vec![finding("a", 1), finding_with_prereqs("b", 2, &["a"])],
        actions: Vec::new(),
        reference: ReferencePathway {
            required: vec!["a".to_string(), "b".to_string()],
            ordered: false,
            diagnosis: "Community-acquired pneumonia".to_string(),
            near_misses: Vec::new(),
            management_plan: vec!["antibiotics".to_string()],
        },
    }
}

pub fn two_finding_case() -> Case {
    Case::from_definition(two_finding_definition()).expect("two-finding case is valid")
}

/// Fixed timestamp for log entries.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

/// An in-progress attempt owned by `student-1`.
pub fn started_attempt(case: &Case, id: &str) -> Attempt {
    let mut attempt = Attempt::new(id, case, &Identity::student("student-1")).expect("attempt");
    attempt.start().expect("start");
    attempt
}

/// Case file text for the two-finding case, as authored TOML.
pub fn two_finding_toml() -> String {
    toml::to_string_pretty(&two_finding_definition()).expect("serialize case")
}

/// Temporary store root that is removed on drop.
pub fn temp_store() -> tempfile::TempDir {
    tempfile::tempdir().expect("tempdir")
}
