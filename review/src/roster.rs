//! Class rosters (TOML): which students belong to which teacher's classes.
//!
//! ```toml
//! [[classes]]
//! id = "resp-101"
//! teacher = "teacher-1"
//! students = ["student-1", "student-2"]
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub classes: Vec<ClassRoster>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRoster {
    pub id: String,
    pub teacher: String,
    #[serde(default)]
    pub students: Vec<String>,
}

impl Roster {
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for class in &self.classes {
            if class.id.trim().is_empty() {
                return Err(anyhow!("class id must be non-empty"));
            }
            if class.teacher.trim().is_empty() {
                return Err(anyhow!("class '{}' has no teacher", class.id));
            }
            if !seen.insert(class.id.as_str()) {
                return Err(anyhow!("duplicate class id '{}'", class.id));
            }
        }
        Ok(())
    }

    pub fn classes_for<'a>(&'a self, teacher: &'a str) -> impl Iterator<Item = &'a ClassRoster> + 'a {
        self.classes.iter().filter(move |class| class.teacher == teacher)
    }

    /// Distinct students across every class taught by `teacher`.
    pub fn students_for(&self, teacher: &str) -> BTreeSet<String> {
        self.classes_for(teacher)
            .flat_map(|class| class.students.iter().cloned())
            .collect()
    }
}

pub fn load_roster(path: &Path) -> Result<Roster> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read roster {}", path.display()))?;
    let roster: Roster =
        toml::from_str(&contents).with_context(|| format!("parse roster {}", path.display()))?;
    roster
        .validate()
        .with_context(|| format!("validate roster {}", path.display()))?;
    Ok(roster)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        toml::from_str(
            r#"
[[classes]]
id = "resp-101"
teacher = "teacher-1"
students = ["student-1", "student-2"]

[[classes]]
id = "resp-102"
teacher = "teacher-1"
students = ["student-2", "student-3"]

[[classes]]
id = "cardio-201"
teacher = "teacher-2"
students = ["student-4"]
"#,
        )
        .expect("parse roster")
    }

    /// Students shared between two classes of one teacher are counted once.
    #[test]
    fn students_are_deduplicated_across_classes() {
        let roster = roster();
        assert_eq!(roster.classes_for("teacher-1").count(), 2);
        let students: Vec<String> = roster.students_for("teacher-1").into_iter().collect();
        assert_eq!(students, vec!["student-1", "student-2", "student-3"]);
        assert!(roster.students_for("nobody").is_empty());
    }

    #[test]
    fn duplicate_class_ids_are_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("roster.toml");
        fs::write(
            &path,
            "[[classes]]\nid = \"a\"\nteacher = \"t\"\n\n[[classes]]\nid = \"a\"\nteacher = \"t\"\n",
        )
        .expect("write");
        let err = load_roster(&path).expect_err("duplicate");
        assert!(format!("{err:#}").contains("duplicate class id 'a'"));
    }
}
