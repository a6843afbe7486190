//! Declarative YAML scenarios

use std::path::{Path, PathBuf};

use molview_waiters::{Locator, MissingElement, Predicate};
use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};

/// A complete scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Steps to execute in order
    pub steps: Vec<Step>,
}

/// A single step in a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to a path relative to the base URL
    Navigate {
        #[serde(default)]
        url: String,
    },

    /// Click the first matching element
    Click { locator: Locator },

    /// Click the `index`-th match inside a container
    ClickNth {
        within: Locator,
        locator: Locator,
        index: usize,
    },

    /// Type file paths into a file input; relative paths resolve against
    /// the test files directory
    Upload { field: Locator, files: Vec<PathBuf> },

    /// Execute a script in the page
    Execute { script: String },

    /// Wait for a fixed amount of time (use sparingly)
    Sleep { ms: u64 },

    /// Poll until a condition holds
    Wait {
        until: WaitSpec,
        #[serde(default)]
        timeout_ms: Option<u64>,
        #[serde(default)]
        missing: Option<MissingElement>,
    },

    /// Open a tab through its trigger, optionally inside a dropdown
    SwitchTab {
        tab: String,
        #[serde(default)]
        dropdown: Option<String>,
    },

    /// Assert how many elements match inside a container
    AssertCount {
        within: Locator,
        locator: Locator,
        #[serde(default)]
        skip_header: bool,
        #[serde(default)]
        equals: Option<usize>,
        #[serde(default)]
        at_least: Option<usize>,
    },

    /// Assert the current value of an input
    AssertValue { locator: Locator, equals: String },

    /// Log a message (for debugging)
    Log { message: String },
}

/// A wait condition as written in a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "condition", rename_all = "snake_case")]
pub enum WaitSpec {
    HasClass {
        locator: Locator,
        class: String,
    },
    HasAttribute {
        locator: Locator,
        attribute: String,
        token: String,
    },
    Unchanged {
        locator: Locator,
    },
    NotDisabled {
        locator: Locator,
    },
    Absent {
        locator: Locator,
    },
    ScriptTruthy {
        script: String,
    },
}

impl WaitSpec {
    /// Build a fresh predicate for one wait
    pub fn predicate<E>(&self, missing: MissingElement) -> Predicate<E> {
        let predicate = match self {
            WaitSpec::HasClass { locator, class } => Predicate::has_class(locator.clone(), class),
            WaitSpec::HasAttribute {
                locator,
                attribute,
                token,
            } => Predicate::has_attribute_value(locator.clone(), attribute, token),
            WaitSpec::Unchanged { locator } => Predicate::unchanged(locator.clone()),
            WaitSpec::NotDisabled { locator } => Predicate::not_disabled(locator.clone()),
            WaitSpec::Absent { locator } => Predicate::absent(locator.clone()),
            WaitSpec::ScriptTruthy { script } => Predicate::script_truthy(script),
        };
        predicate.on_missing(missing)
    }
}

impl Step {
    /// Short name used in logs and results
    pub fn name(&self) -> String {
        match self {
            Step::Navigate { url } => format!("navigate:{}", if url.is_empty() { "/" } else { url }),
            Step::Click { locator } => format!("click:{}", locator),
            Step::ClickNth { locator, index, .. } => format!("click:{}[{}]", locator, index),
            Step::Upload { field, files } => format!("upload:{}({} files)", field, files.len()),
            Step::Execute { .. } => "execute".to_string(),
            Step::Sleep { ms } => format!("sleep:{}ms", ms),
            Step::Wait { until, .. } => format!("wait:{}", until.name()),
            Step::SwitchTab { tab, .. } => format!("switch_tab:{}", tab),
            Step::AssertCount { within, locator, .. } => {
                format!("assert_count:{} in {}", locator, within)
            }
            Step::AssertValue { locator, .. } => format!("assert_value:{}", locator),
            Step::Log { message } => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
        }
    }
}

impl WaitSpec {
    fn name(&self) -> String {
        match self {
            WaitSpec::HasClass { locator, class } => format!("{} has class {}", locator, class),
            WaitSpec::HasAttribute {
                locator, attribute, ..
            } => format!("{} has {}", locator, attribute),
            WaitSpec::Unchanged { locator } => format!("{} unchanged", locator),
            WaitSpec::NotDisabled { locator } => format!("{} enabled", locator),
            WaitSpec::Absent { locator } => format!("{} absent", locator),
            WaitSpec::ScriptTruthy { .. } => "script".to_string(),
        }
    }
}

impl Scenario {
    /// Parse a scenario from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| {
            E2eError::ScenarioParse(format!("{}: {}", path.display(), e))
        })
    }

    /// Load all scenarios from a directory, ordered by path
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        if !dir.is_dir() {
            return Err(E2eError::ScenarioParse(format!(
                "scenario directory not found: {}",
                dir.display()
            )));
        }

        let mut paths: Vec<PathBuf> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| {
                p.extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        paths.iter().map(|p| Self::from_file(p)).collect()
    }

    /// Narrow to an optional tag, then an optional exact name
    pub fn select(scenarios: &[Self], tag: Option<&str>, name: Option<&str>) -> Vec<Self> {
        let tagged = match tag {
            Some(tag) => Self::filter_by_tag(scenarios, tag),
            None => scenarios.iter().collect(),
        };
        tagged
            .into_iter()
            .filter(|s| name.map_or(true, |n| s.name == n))
            .cloned()
            .collect()
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(scenarios: &'a [Self], tag: &str) -> Vec<&'a Self> {
        scenarios
            .iter()
            .filter(|s| s.tags.iter().any(|t| t == tag))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use molview_waiters::PredicateKind;

    #[test]
    fn test_parse_cut_scenario() {
        let yaml = r#"
name: ligand-cut
description: Cut a bond and check that a core was set
tags:
  - cut
steps:
  - action: navigate
  - action: upload
    field: { id: protein-file-field }
    files: [7A4R_1.pdb]
  - action: click
    locator: { id: structure-upload-button }
  - action: wait
    until: { condition: has_class, locator: { id: cut-tab-trigger }, class: active }
  - action: wait
    until: { condition: script_truthy, script: "return app.$data.core !== undefined" }
    timeout_ms: 5000
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert_eq!(scenario.name, "ligand-cut");
        assert_eq!(scenario.steps.len(), 5);

        match &scenario.steps[4] {
            Step::Wait {
                until, timeout_ms, ..
            } => {
                assert_eq!(*timeout_ms, Some(5000));
                assert!(matches!(until, WaitSpec::ScriptTruthy { .. }));
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn test_wait_missing_policy() {
        let yaml = r#"
name: spinner
steps:
  - action: wait
    until: { condition: absent, locator: { class_name: spinner-grow } }
  - action: wait
    until: { condition: not_disabled, locator: { id: clip-button } }
    missing: not_yet
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        match &scenario.steps[1] {
            Step::Wait { missing, .. } => assert_eq!(*missing, Some(MissingElement::NotYet)),
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn test_wait_spec_builds_predicate() {
        let spec = WaitSpec::HasClass {
            locator: Locator::id("query-tab"),
            class: "active".into(),
        };
        let predicate: Predicate<u32> = spec.predicate(MissingElement::Error);
        assert_eq!(
            predicate.kind(),
            &PredicateKind::HasAttributeValue {
                locator: Locator::id("query-tab"),
                attribute: "class".into(),
                token: "active".into(),
            }
        );
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let yaml = r#"
name: bad
steps:
  - action: teleport
"#;
        assert!(Scenario::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_step_names() {
        let step = Step::SwitchTab {
            tab: "query-tab".into(),
            dropdown: Some("growing-dropdown".into()),
        };
        assert_eq!(step.name(), "switch_tab:query-tab");
        assert_eq!(Step::Navigate { url: String::new() }.name(), "navigate:/");
    }
}
