//! End-to-end scenarios S1-S6 from the external-interfaces design, driven
//! through the public `ingest`/`resolve` pipeline exactly as `bin/dappi.rs`'s
//! `run` subcommand would.

use dappi::{ingest, resolve, ResolutionError};

fn selections(json: &str) -> Vec<(String, Option<String>)> {
    let repo = ingest(json).unwrap();
    let repo = resolve(repo).unwrap();
    repo.iter_names()
        .map(|(_, name)| {
            let selected = name.selection.map(|id| repo.package(id).id_str.clone());
            (name.name_str.clone(), selected)
        })
        .collect()
}

#[test]
fn s1_entry_with_no_deps_selects_it() {
    let json = r#"{
        "daps": { "A1": { "version": "1.0.0" } },
        "names": { "A": { "known": ["A1"] } },
        "entry": "A1"
    }"#;
    assert_eq!(selections(json), vec![("A".to_owned(), Some("A1".to_owned()))]);
}

#[test]
fn s2_no_entry_prefers_unselected() {
    let json = r#"{
        "daps": { "A1": { "version": "1.0.0" }, "A2": { "version": "2.0.0" } },
        "names": { "A": { "known": ["A1", "A2"] } }
    }"#;
    assert_eq!(selections(json), vec![("A".to_owned(), None)]);
}

#[test]
fn s3_forced_selection_chooses_latest() {
    let json = r#"{
        "daps": {
            "A1": { "version": "1.0.0" },
            "A2": { "version": "2.0.0" },
            "ROOT": { "version": "1.0.0", "dependencies": [{"name": "A"}] }
        },
        "names": {
            "A": { "known": ["A1", "A2"] },
            "ROOT": { "known": ["ROOT"] }
        },
        "entry": "ROOT"
    }"#;
    let got = selections(json);
    assert!(got.contains(&("A".to_owned(), Some("A2".to_owned()))));
    // ROOT's pkg_var is forced true by the entry unit clause (which is what
    // keeps A's dependency gate live), but that never forces ROOT's own
    // nc_var, and the penalty objective is summed globally across all names
    // (see DESIGN.md's Open Question on entry/name selection): selecting
    // ROOT's own candidate would only add a penalty point for no benefit, so
    // the unique optimum leaves ROOT's name unselected.
    assert!(got.contains(&("ROOT".to_owned(), None)));
}

#[test]
fn s4_version_constraint_forces_downgrade() {
    let json = r#"{
        "daps": {
            "A1": { "version": "1.0.0" },
            "A2": { "version": "2.0.0" },
            "ROOT": { "version": "1.0.0", "dependencies": [{"name": "A", "requiredVersion": "^1"}] }
        },
        "names": {
            "A": { "known": ["A1", "A2"] },
            "ROOT": { "known": ["ROOT"] }
        },
        "entry": "ROOT"
    }"#;
    let got = selections(json);
    assert!(got.contains(&("A".to_owned(), Some("A1".to_owned()))));
}

#[test]
fn s5_unsatisfiable_dependency_is_an_error() {
    let json = r#"{
        "daps": {
            "A1": { "version": "1.0.0" },
            "ROOT": { "version": "1.0.0", "dependencies": [{"name": "A", "requiredVersion": "^3"}] }
        },
        "names": {
            "A": { "known": ["A1"] },
            "ROOT": { "known": ["ROOT"] }
        },
        "entry": "ROOT"
    }"#;
    let err = ingest(json).and_then(resolve).unwrap_err();
    assert!(matches!(err, ResolutionError::UnsatisfiableEdge { .. }));
}

#[test]
fn s6_lock_dominates_version_preference() {
    let json = r#"{
        "daps": {
            "A1": { "version": "1.0.0" },
            "A2": { "version": "2.0.0" },
            "ROOT": { "version": "1.0.0", "dependencies": [{"name": "A"}] }
        },
        "names": {
            "A": { "known": ["A1", "A2"], "locked": "A1" },
            "ROOT": { "known": ["ROOT"] }
        },
        "entry": "ROOT"
    }"#;
    let got = selections(json);
    assert!(got.contains(&("A".to_owned(), Some("A1".to_owned()))));
}

#[test]
fn idempotent_resolution() {
    let json = r#"{
        "daps": {
            "A1": { "version": "1.0.0" },
            "A2": { "version": "2.0.0" },
            "ROOT": { "version": "1.0.0", "dependencies": [{"name": "A", "requiredVersion": "^1"}] }
        },
        "names": {
            "A": { "known": ["A1", "A2"] },
            "ROOT": { "known": ["ROOT"] }
        },
        "entry": "ROOT"
    }"#;
    assert_eq!(selections(json), selections(json));
}
