//! Semantic case invariants not expressible via JSON Schema.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::core::case::CaseDefinition;

/// Check semantic invariants of an authored case:
/// - Slug id, `version > 0`, non-empty title and diagnosis
/// - Unique ids across findings and actions
/// - Prerequisites, trigger reveals and reference items reference known ids
/// - No duplicate reference items
/// - Complication probabilities within `[0, 1]`
/// - Prerequisite graph is acyclic
///
/// Returns every violation as a stable message (empty on success).
pub fn validate_case_definition(def: &CaseDefinition) -> Vec<String> {
    let mut errors = Vec::new();

    if let Err(message) = validate_case_id(&def.id) {
        errors.push(message);
    }
    if def.version == 0 {
        errors.push("version must be > 0".to_string());
    }
    if def.title.trim().is_empty() {
        errors.push("title must be non-empty".to_string());
    }
    if def.reference.diagnosis.trim().is_empty() {
        errors.push("reference.diagnosis must be non-empty".to_string());
    }

    let mut seen = BTreeSet::new();
    let finding_ids: BTreeSet<&str> = def.findings.iter().map(|f| f.id.as_str()).collect();
    for id in def
        .findings
        .iter()
        .map(|f| &f.id)
        .chain(def.actions.iter().map(|a| &a.id))
    {
        if id.trim().is_empty() {
            errors.push("finding and action ids must be non-empty".to_string());
        } else if !seen.insert(id.as_str()) {
            errors.push(format!("duplicate id '{}'", id));
        }
    }

    for finding in &def.findings {
        for prerequisite in &finding.prerequisites {
            if prerequisite == &finding.id {
                errors.push(format!("finding '{}' lists itself as a prerequisite", finding.id));
            } else if !finding_ids.contains(prerequisite.as_str()) {
                errors.push(format!(
                    "finding '{}' has unknown prerequisite '{}'",
                    finding.id, prerequisite
                ));
            }
        }
    }

    for action in &def.actions {
        for reveal in &action.triggers.reveals {
            if !finding_ids.contains(reveal.as_str()) {
                errors.push(format!(
                    "action '{}' reveals unknown finding '{}'",
                    action.id, reveal
                ));
            }
        }
        if let Some(probability) = action.complication_probability
            && !(0.0..=1.0).contains(&probability)
        {
            errors.push(format!(
                "action '{}' complication_probability {} outside [0, 1]",
                action.id, probability
            ));
        }
    }

    let mut required_seen = BTreeSet::new();
    for id in &def.reference.required {
        if !seen.contains(id.as_str()) {
            errors.push(format!("reference requires unknown id '{}'", id));
        }
        if !required_seen.insert(id.as_str()) {
            errors.push(format!("reference lists '{}' more than once", id));
        }
    }

    if let Some(cycle) = prerequisite_cycle(def) {
        errors.push(format!(
            "prerequisite cycle among findings: {}",
            cycle.join(", ")
        ));
    }

    errors
}

/// Kahn's algorithm over the prerequisite graph.
///
/// Returns the ids left with unresolved prerequisites (sorted) when the graph
/// has a cycle. Unknown and self prerequisites are reported elsewhere and
/// ignored here.
fn prerequisite_cycle(def: &CaseDefinition) -> Option<Vec<String>> {
    let ids: BTreeSet<&str> = def.findings.iter().map(|f| f.id.as_str()).collect();
    let mut in_degree: BTreeMap<&str, usize> = ids.iter().map(|id| (*id, 0)).collect();
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for finding in &def.findings {
        let prerequisites: BTreeSet<&str> = finding
            .prerequisites
            .iter()
            .map(String::as_str)
            .filter(|p| *p != finding.id && ids.contains(p))
            .collect();
        for prerequisite in prerequisites {
            *in_degree.entry(finding.id.as_str()).or_insert(0) += 1;
            dependents
                .entry(prerequisite)
                .or_default()
                .push(finding.id.as_str());
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| *id)
        .collect();
    while let Some(id) = queue.pop_front() {
        for &dependent in dependents.get(id).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(dependent);
                }
            }
        }
    }

    let remaining: Vec<String> = in_degree
        .into_iter()
        .filter(|(_, degree)| *degree > 0)
        .map(|(id, _)| id.to_string())
        .collect();
    if remaining.is_empty() {
        None
    } else {
        Some(remaining)
    }
}

fn validate_case_id(id: &str) -> Result<(), String> {
    if id.trim().is_empty() {
        return Err("case id must be non-empty".to_string());
    }
    if !id
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_')
    {
        return Err(format!("case id '{}' must use [a-z0-9_-] only", id));
    }
    Ok(())
}
