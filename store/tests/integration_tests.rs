use std::io::{Cursor, Read, Write};

use hwgrid_bundle::{NoDocs, ReportCache, parse_bundle, report_for};
use hwgrid_core::{BundleIdentity, REPORT_FORMAT_VERSION, Report};
use hwgrid_store::{BundleStore, DirReportCache, GridConfig, StoreError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn minimal_bundle(run: &str, manufacturer: &str) -> Vec<u8> {
    let dmi = format!("System Information\n\tManufacturer: {manufacturer}\n\tProduct Name: Widget\n");
    let results = r#"{"tests": [{"test": "1-/t/suspend.py:Suspend.test", "status": "PASS", "fail_reason": "", "whiteboard": ""}]}"#;
    let entries = [
        ("sysinfo/pre/dmidecode", dmi.as_str()),
        ("sysinfo/pre/lscpu", "Model name:   Acme CPU\n"),
        ("sysinfo/pre/libinput-list-devices", ""),
        ("sysinfo/pre/lsusb_-v", ""),
        ("sysinfo/pre/lspci_-vvnn", ""),
        ("sysinfo/pre/iw_phy", ""),
        ("results.json", results),
        ("test-results/1-_t_suspend.py:Suspend.test/debug.log", "suspend ok\n"),
        ("test-results/1-_t_suspend.py:Suspend.test/whiteboard", ""),
    ];

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, body) in entries {
        writer.start_file(format!("{run}/{name}"), options).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn identity_of(report: &Report) -> BundleIdentity {
    let run = report.testruns.last().unwrap();
    BundleIdentity::from_sysinfo(&report.sysinfo, run).unwrap()
}

// ---------------------------------------------------------------------------
// Ingest and cache
// ---------------------------------------------------------------------------

#[test]
fn test_ingest_parse_and_cache_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = BundleStore::open(dir.path().join("bundles")).unwrap();
    let cache = DirReportCache::new(dir.path().join("cache"));

    let bytes = minimal_bundle("run1", "Acme");
    let report = parse_bundle(&bytes, &NoDocs).unwrap();
    let stored = store.ingest(&bytes, &identity_of(&report)).unwrap();
    cache.store(&stored.id, &report);

    assert_eq!(stored.identity.manufacturer, "Acme");
    assert_eq!(stored.identity.product, "Widget");
    assert_eq!(stored.identity.unique_identifier, "run1");

    let cached = report_for(
        &cache,
        &stored.id,
        || -> Result<Vec<u8>, StoreError> { panic!("cache should be current") },
        &NoDocs,
        false,
    )
    .unwrap();
    assert_eq!(cached, report);

    let regenerated =
        report_for(&cache, &stored.id, || store.read(&stored.id), &NoDocs, true).unwrap();
    assert_eq!(regenerated, report);
}

#[test]
fn test_outdated_cache_regenerates_from_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = BundleStore::open(dir.path().join("bundles")).unwrap();
    let cache_dir = dir.path().join("cache");
    let cache = DirReportCache::new(&cache_dir);

    let bytes = minimal_bundle("run1", "Acme");
    let report = parse_bundle(&bytes, &NoDocs).unwrap();
    let stored = store.ingest(&bytes, &identity_of(&report)).unwrap();

    std::fs::create_dir_all(&cache_dir).unwrap();
    std::fs::write(
        cache_dir.join(format!("{}.json", stored.id)),
        r#"{"version": 3}"#,
    )
    .unwrap();

    let got = report_for(&cache, &stored.id, || store.read(&stored.id), &NoDocs, false).unwrap();
    assert_eq!(got, report);
    assert_eq!(
        cache.load(&stored.id).unwrap()["version"],
        REPORT_FORMAT_VERSION
    );
}

#[test]
fn test_same_main_run_cannot_be_ingested_twice() {
    let dir = tempfile::tempdir().unwrap();
    let store = BundleStore::open(dir.path()).unwrap();

    let first = minimal_bundle("run1", "Acme");
    let report = parse_bundle(&first, &NoDocs).unwrap();
    store.ingest(&first, &identity_of(&report)).unwrap();

    let second = minimal_bundle("run1", "Other");
    let report = parse_bundle(&second, &NoDocs).unwrap();
    let err = store.ingest(&second, &identity_of(&report)).unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(_)));
}

#[test]
fn test_missing_bundle_surfaces_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = BundleStore::open(dir.path()).unwrap();
    let cache = DirReportCache::new(dir.path().join("cache"));

    let err = report_for(&cache, "ghost", || store.read("ghost"), &NoDocs, false).unwrap_err();
    assert!(matches!(err, StoreError::BundleNotFound(ref id) if id == "ghost"));
}

// ---------------------------------------------------------------------------
// Artifact extraction
// ---------------------------------------------------------------------------

#[test]
fn test_extract_entry_and_directory() {
    let dir = tempfile::tempdir().unwrap();
    let store = BundleStore::open(dir.path()).unwrap();
    let bytes = minimal_bundle("run1", "Acme");
    let report = parse_bundle(&bytes, &NoDocs).unwrap();
    let stored = store.ingest(&bytes, &identity_of(&report)).unwrap();

    let log = store
        .extract_entry(
            &stored.id,
            "run1/test-results/1-_t_suspend.py:Suspend.test/debug.log",
        )
        .unwrap();
    assert_eq!(log, b"suspend ok\n");

    let err = store.extract_entry(&stored.id, "run1/nope").unwrap_err();
    assert!(matches!(err, StoreError::EntryNotFound { .. }));

    let packed = store.extract_dir(&stored.id, &report.tests[0].dir).unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(packed)).unwrap();
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    assert_eq!(names, ["debug.log", "whiteboard"]);

    let mut body = String::new();
    archive
        .by_name("debug.log")
        .unwrap()
        .read_to_string(&mut body)
        .unwrap();
    assert_eq!(body, "suspend ok\n");
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn test_config_paths_anchor_to_config_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hwgrid.yaml");
    std::fs::write(
        &path,
        "version: \"1.0\"\nstorage:\n  bundles_dir: b\n  cache_dir: c\nparse:\n  jobs: 2\n  always_regenerate: false\n",
    )
    .unwrap();

    let mut config = GridConfig::load(&path).unwrap();
    config.anchor_paths(dir.path());
    assert_eq!(config.storage.bundles_dir, dir.path().join("b"));
    assert_eq!(config.storage.cache_dir, dir.path().join("c"));
    assert_eq!(config.parse.jobs, 2);
}

#[test]
fn test_config_with_zero_jobs_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hwgrid.yaml");
    std::fs::write(&path, "version: \"1.0\"\nparse:\n  jobs: 0\n  always_regenerate: false\n").unwrap();
    assert!(matches!(
        GridConfig::load(&path),
        Err(StoreError::InvalidConfig(_))
    ));
}
