//! Case file loading (schema + invariant validation) and the versioned case store.
//!
//! Case files are TOML (or JSON, by extension). Loading checks the file against
//! the bundled JSON Schema first, then the semantic invariants enforced by
//! [`Case::from_definition`]. Stored versions are write-once: an edited case is
//! saved under a new version and attempts keep scoring against the version they
//! started on.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde_json::Value;

use crate::core::case::{Case, CaseDefinition};
use crate::error::EngineError;
use crate::io::fs_util::{StoreLayout, ensure_path_safe_id, write_atomic};

const CASE_SCHEMA: &str = include_str!("../../schemas/case/v1.schema.json");

/// Load and validate a case file.
pub fn load_case_file(path: &Path) -> Result<Case> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read case {}", path.display()))?;
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    parse_case(&contents, is_json).with_context(|| format!("load case {}", path.display()))
}

/// Parse case text (TOML, or JSON when `is_json`) and validate it.
pub fn parse_case(contents: &str, is_json: bool) -> Result<Case> {
    let value: Value = if is_json {
        serde_json::from_str(contents).context("parse case json")?
    } else {
        let table: toml::Table = toml::from_str(contents).context("parse case toml")?;
        serde_json::to_value(table).context("convert case toml")?
    };
    validate_schema(&value)?;
    let definition: CaseDefinition =
        serde_json::from_value(value).context("deserialize case")?;
    Ok(Case::from_definition(definition)?)
}

fn validate_schema(case: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(CASE_SCHEMA).context("parse bundled case schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(case) {
        let messages = compiled
            .iter_errors(case)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(EngineError::MalformedCase(messages).into());
    }
    Ok(())
}

/// Persist `case` under `<root>/cases/<id>/v<version>.toml`.
///
/// Re-saving identical content is a no-op; saving different content under an
/// existing version fails.
pub fn save_case(layout: &StoreLayout, case: &Case) -> Result<PathBuf> {
    let path = layout.case_path(case.id(), case.version());
    let mut buf = toml::to_string_pretty(case.definition()).context("serialize case toml")?;
    buf.push('\n');
    if path.exists() {
        let existing = load_case_file(&path)?;
        if existing.definition() == case.definition() {
            return Ok(path);
        }
        return Err(anyhow!(
            "case {} already stored with different content; bump the version",
            case.key()
        ));
    }
    write_atomic(&path, &buf)?;
    tracing::info!(case = %case.key(), path = %path.display(), "stored case");
    Ok(path)
}

/// Load a stored case version.
pub fn load_case(layout: &StoreLayout, case_id: &str, version: u32) -> Result<Case> {
    ensure_path_safe_id("case", case_id)?;
    let path = layout.case_path(case_id, version);
    if !path.exists() {
        return Err(anyhow!("case {}@v{} not found", case_id, version));
    }
    let case = load_case_file(&path)?;
    if case.id() != case_id || case.version() != version {
        return Err(anyhow!(
            "{} holds {} instead of {}@v{}",
            path.display(),
            case.key(),
            case_id,
            version
        ));
    }
    Ok(case)
}

/// Stored versions of `case_id`, ascending.
pub fn list_versions(layout: &StoreLayout, case_id: &str) -> Result<Vec<u32>> {
    ensure_path_safe_id("case", case_id)?;
    let dir = layout.case_dir(case_id);
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut versions = Vec::new();
    for entry in fs::read_dir(&dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry.context("read entry")?;
        let name = entry.file_name();
        let Some(version) = name
            .to_str()
            .and_then(|name| name.strip_prefix('v'))
            .and_then(|rest| rest.strip_suffix(".toml"))
            .and_then(|digits| digits.parse::<u32>().ok())
        else {
            continue;
        };
        versions.push(version);
    }
    versions.sort_unstable();
    Ok(versions)
}

/// Load the highest stored version of `case_id`.
pub fn load_latest(layout: &StoreLayout, case_id: &str) -> Result<Case> {
    let versions = list_versions(layout, case_id)?;
    let version = versions
        .last()
        .copied()
        .ok_or_else(|| anyhow!("case {} not found", case_id))?;
    load_case(layout, case_id, version)
}

/// Every stored case id, sorted.
pub fn list_case_ids(layout: &StoreLayout) -> Result<Vec<String>> {
    let dir = layout.cases_dir();
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut ids = Vec::new();
    for entry in fs::read_dir(&dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry.context("read entry")?;
        if entry.path().is_dir()
            && let Some(name) = entry.file_name().to_str()
        {
            ids.push(name.to_string());
        }
    }
    ids.sort();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{two_finding_case, two_finding_toml};

    /// Verifies a stored case loads back with the same definition.
    #[test]
    fn save_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let layout = StoreLayout::new(temp.path());
        let case = two_finding_case();

        let path = save_case(&layout, &case).expect("save");
        assert!(path.ends_with("cases/cough-fever/v1.toml"));
        let loaded = load_case(&layout, "cough-fever", 1).expect("load");
        assert_eq!(loaded.definition(), case.definition());
    }

    /// A stored version cannot be overwritten with different content.
    #[test]
    fn stored_versions_are_write_once() {
        let temp = tempfile::tempdir().expect("tempdir");
        let layout = StoreLayout::new(temp.path());
        let case = two_finding_case();
        save_case(&layout, &case).expect("save");
        save_case(&layout, &case).expect("identical re-save");

        let mut edited = case.definition().clone();
        edited.title = "Edited".to_string();
        let edited = Case::from_definition(edited).expect("edited");
        let err = save_case(&layout, &edited).expect_err("overwrite");
        assert!(err.to_string().contains("bump the version"));

        let mut bumped = edited.definition().clone();
        bumped.version = 2;
        save_case(&layout, &Case::from_definition(bumped).expect("v2")).expect("save v2");
        assert_eq!(list_versions(&layout, "cough-fever").expect("versions"), vec![1, 2]);
        assert_eq!(load_latest(&layout, "cough-fever").expect("latest").title(), "Edited");
        assert_eq!(load_case(&layout, "cough-fever", 1).expect("v1").title(), "Cough and fever");
    }

    #[test]
    fn parses_authored_toml() {
        let case = parse_case(&two_finding_toml(), false).expect("parse");
        assert_eq!(case.key(), "cough-fever@v1");
        assert_eq!(case.findings().len(), 2);
    }

    /// Structural problems are caught by the schema before semantic checks run.
    #[test]
    fn schema_rejects_unknown_category() {
        let text = two_finding_toml().replace("category = \"history\"", "category = \"vibes\"");
        let err = parse_case(&text, false).expect_err("schema");
        let engine_err = err.downcast_ref::<EngineError>().expect("engine error");
        assert!(matches!(engine_err, EngineError::MalformedCase(_)));
    }

    /// Semantic invariants (here a prerequisite cycle) are reported after the schema passes.
    #[test]
    fn invariants_reject_prerequisite_cycle() {
        let mut def = two_finding_case().definition().clone();
        def.findings[0].prerequisites.push("b".to_string());
        let json = serde_json::to_string(&def).expect("serialize");
        let err = parse_case(&json, true).expect_err("cycle");
        assert!(err.to_string().contains("prerequisite cycle among findings: a, b"));
    }

    #[test]
    fn missing_case_is_reported() {
        let temp = tempfile::tempdir().expect("tempdir");
        let layout = StoreLayout::new(temp.path());
        assert!(load_case(&layout, "nope", 1).is_err());
        assert!(list_case_ids(&layout).expect("ids").is_empty());
    }
}
