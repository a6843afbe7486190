//! Scenario discovery and the scenarios shipped with the repo

use std::fs;
use std::path::PathBuf;

use molview_e2e::{E2eError, Scenario, Step};

fn shipped_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../scenarios")
}

#[test]
fn test_shipped_scenarios_parse() {
    let scenarios = Scenario::load_all(&shipped_dir()).unwrap();

    let names: Vec<&str> = scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "cut",
            "grow",
            "grow-interactions",
            "interactions",
            "upload-ensemble-and-sdf",
            "upload-multiple-pdbs",
            "upload-pdb",
            "upload-pdb-and-sdf",
        ]
    );
    for scenario in &scenarios {
        assert!(
            matches!(scenario.steps.first(), Some(Step::Navigate { .. })),
            "{} should start from the app",
            scenario.name
        );
    }
}

#[test]
fn test_shipped_scenarios_by_tag() {
    let scenarios = Scenario::load_all(&shipped_dir()).unwrap();

    let grow: Vec<&str> = Scenario::filter_by_tag(&scenarios, "grow")
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(grow, vec!["grow", "grow-interactions"]);
    assert_eq!(Scenario::filter_by_tag(&scenarios, "upload").len(), 4);
}

#[test]
fn test_load_all_walks_nested_yaml_in_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("b.yaml"), "name: b\nsteps: []\n").unwrap();
    fs::write(dir.path().join("a.yml"), "name: a\ntags: [fast]\nsteps: []\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "not a scenario").unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("nested/c.yaml"), "name: c\ntags: [fast]\nsteps: []\n").unwrap();

    let scenarios = Scenario::load_all(dir.path()).unwrap();

    let names: Vec<&str> = scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(Scenario::filter_by_tag(&scenarios, "fast").len(), 2);
}

#[test]
fn test_load_all_reports_bad_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.yaml"), "name: broken\nsteps:\n  - action: fly\n").unwrap();

    let err = Scenario::load_all(dir.path()).unwrap_err();

    match err {
        E2eError::ScenarioParse(message) => assert!(message.contains("broken.yaml"), "{}", message),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_load_all_missing_dir() {
    let dir = tempfile::tempdir().unwrap();
    let err = Scenario::load_all(&dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, E2eError::ScenarioParse(_)));
}

#[test]
fn test_select_by_tag_and_name() {
    let scenarios = Scenario::load_all(&shipped_dir()).unwrap();

    let names = |selected: Vec<Scenario>| -> Vec<String> {
        selected.into_iter().map(|s| s.name).collect()
    };
    assert_eq!(names(Scenario::select(&scenarios, None, None)).len(), scenarios.len());
    assert_eq!(
        names(Scenario::select(&scenarios, Some("grow"), None)),
        vec!["grow", "grow-interactions"]
    );
    assert_eq!(
        names(Scenario::select(&scenarios, Some("grow"), Some("grow-interactions"))),
        vec!["grow-interactions"]
    );
    assert!(Scenario::select(&scenarios, Some("upload"), Some("cut")).is_empty());
}
