use domus::core::store::Store;
use domus::plugins::directory;
use domus::plugins::export::{self, ExportFormat};
use std::fs;
use tempfile::tempdir;

fn seeded_store(tmp: &tempfile::TempDir) -> Store {
    let store = Store::new(tmp.path().join("store"));
    fs::create_dir_all(&store.root).unwrap();
    directory::add_resident(&store, "Alice", "Ward", 123456, "secret-a").unwrap();
    directory::add_resident(&store, "Ben", "Carver", 222333, "secret-b").unwrap();
    store
}

#[test]
fn exports_all_four_formats() {
    let tmp = tempdir().unwrap();
    let store = seeded_store(&tmp);
    let out_dir = tmp.path().join("out");

    let written = export::export_residents(&store, &out_dir, &ExportFormat::ALL).unwrap();
    assert_eq!(written.len(), 4);

    for name in [
        "residents.json",
        "residents.csv",
        "residents.xml",
        "residents.yaml",
    ] {
        assert!(out_dir.join(name).exists(), "{} missing", name);
    }
}

#[test]
fn json_export_excludes_credentials() {
    let tmp = tempdir().unwrap();
    let store = seeded_store(&tmp);
    let out_dir = tmp.path().join("out");

    export::export_residents(&store, &out_dir, &[ExportFormat::Json]).unwrap();

    let content = fs::read_to_string(out_dir.join("residents.json")).unwrap();
    let rows: serde_json::Value = serde_json::from_str(&content).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["given_name"], "Alice");
    assert_eq!(rows[1]["ticket"], 222333);
    assert!(rows[0].get("credential").is_none());
    assert!(!content.contains("secret-a"));
}

#[test]
fn csv_export_has_header_and_rows() {
    let tmp = tempdir().unwrap();
    let store = seeded_store(&tmp);
    let out_dir = tmp.path().join("out");

    export::export_residents(&store, &out_dir, &[ExportFormat::Csv]).unwrap();

    let content = fs::read_to_string(out_dir.join("residents.csv")).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("id,given_name,family_name,ticket"));
    assert_eq!(lines.clone().count(), 2);
    assert!(lines.any(|l| l.contains("Ben,Carver,222333")));
}

#[test]
fn yaml_export_round_trips() {
    let tmp = tempdir().unwrap();
    let store = seeded_store(&tmp);
    let out_dir = tmp.path().join("out");

    export::export_residents(&store, &out_dir, &[ExportFormat::Yaml]).unwrap();

    let content = fs::read_to_string(out_dir.join("residents.yaml")).unwrap();
    let rows: serde_yaml::Value = serde_yaml::from_str(&content).unwrap();
    let rows = rows.as_sequence().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["family_name"], "Ward");
}

#[test]
fn xml_export_nests_resident_elements() {
    let tmp = tempdir().unwrap();
    let store = seeded_store(&tmp);
    let out_dir = tmp.path().join("out");

    export::export_residents(&store, &out_dir, &[ExportFormat::Xml]).unwrap();

    let content = fs::read_to_string(out_dir.join("residents.xml")).unwrap();
    assert!(content.contains("<residents>"));
    assert_eq!(content.matches("<resident>").count(), 2);
    assert!(content.contains("<family_name>Carver</family_name>"));
    assert!(!content.contains("credential"));
}

#[test]
fn empty_roster_still_exports() {
    let tmp = tempdir().unwrap();
    let store = Store::new(tmp.path().join("store"));
    fs::create_dir_all(&store.root).unwrap();
    let out_dir = tmp.path().join("out");

    let written = export::export_residents(&store, &out_dir, &[ExportFormat::Json]).unwrap();
    assert_eq!(written.len(), 1);
    let content = fs::read_to_string(&written[0]).unwrap();
    assert_eq!(content.trim(), "[]");
}
