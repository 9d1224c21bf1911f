mod common;

use common::{date, midnight, utc};
use enigma_license::{
    EngineFixture, KeyDate, License, LicenseError, MemoryEngine, ProtectionEngine, StoredKey,
    Trial, TrialCounters, TrialStatus,
};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

const FIXTURE: &str = r#"
protected = true
integrated = true
hardware_id = "DEV-0001"

[stored_key]
name = "Ada Lovelace"
key = "ABCD-1234"

[[keys]]
name = "Ada Lovelace"
key = "ABCD-1234"
info = { use_executions_limit = true, executions_count = 50, creation = { year = 2026, month = 2, day = 1 } }

[[keys]]
name = "Charles Babbage"
key = "EFGH-5678"

[trial]
executions = { total = 30, left = 12 }
days = { total = 14, left = 9 }
expiration_date = "2027-01-31"
"#;

fn write_fixture(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn parses_full_fixture() {
    let file = write_fixture(FIXTURE);
    let fixture = EngineFixture::load_from(file.path()).unwrap();

    assert!(fixture.protected);
    assert!(fixture.integrated);
    assert_eq!(fixture.hardware_id.as_deref(), Some("DEV-0001"));
    assert_eq!(
        fixture.stored_key,
        Some(StoredKey::new("Ada Lovelace", "ABCD-1234"))
    );
    assert_eq!(fixture.keys.len(), 2);
    assert_eq!(fixture.keys[0].info.executions_limit(), Some(50));
    assert_eq!(fixture.keys[0].info.creation, KeyDate::new(2026, 2, 1));
    assert_eq!(fixture.keys[1].info.executions_limit(), None);
    assert_eq!(fixture.trial.executions, Some(TrialCounters::new(30, 12)));
    assert_eq!(fixture.trial.days, Some(TrialCounters::new(14, 9)));
    assert_eq!(fixture.trial.expiration_date, Some(date(2027, 1, 31)));
}

#[test]
fn fixture_engine_answers_like_the_fixture() {
    let file = write_fixture(FIXTURE);
    let engine = MemoryEngine::load_fixture(file.path()).unwrap();

    assert!(engine.is_protected());
    assert_eq!(engine.hardware_id(), "DEV-0001");
    assert!(engine.load_and_check_key());
    assert!(engine.check_key("Charles Babbage", "EFGH-5678"));
    assert!(!engine.check_key("Charles Babbage", "ABCD-1234"));

    let now = utc(2026, 10, 16, 12, 0, 0);
    let trial = Trial::compute_at(&engine, now);
    assert_eq!(trial.expiration_date(), midnight(2027, 1, 31));
    assert_eq!(trial.check_trial_at(now), TrialStatus::Valid);
}

#[test]
fn fixture_drives_the_facade() {
    let file = write_fixture(FIXTURE);
    let license = License::new(Arc::new(MemoryEngine::load_fixture(file.path()).unwrap()));

    assert_eq!(license.registration().name(), "Ada Lovelace");
    assert_eq!(license.registration().key_info().executions_limit(), Some(50));
    assert!(license.trial().executions_enabled());
}

#[test]
fn empty_fixture_uses_defaults() {
    let file = write_fixture("");
    let fixture = EngineFixture::load_from(file.path()).unwrap();

    assert!(!fixture.protected);
    assert!(!fixture.integrated);
    assert!(fixture.hardware_id.is_none());
    assert!(fixture.stored_key.is_none());
    assert!(fixture.keys.is_empty());
    assert!(fixture.trial.expiration_date.is_none());

    let engine = MemoryEngine::from_fixture(fixture);
    assert_eq!(engine.hardware_id(), enigma_license::DEV_HARDWARE_ID);
    assert!(!engine.load_and_check_key());
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = EngineFixture::load_from(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(LicenseError::FixtureRead { .. })));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let file = write_fixture("protected = \"sometimes\"");
    let result = EngineFixture::load_from(file.path());
    assert!(matches!(result, Err(LicenseError::FixtureParse(_))));
}

#[test]
fn memory_engine_save_and_delete() {
    let engine = MemoryEngine::new();
    engine.accept_key("n", "k", Default::default());

    assert!(!engine.check_and_save_key("n", "wrong"));
    assert_eq!(engine.load_key(), None);

    assert!(engine.check_and_save_key("n", "k"));
    assert_eq!(engine.load_key(), Some(StoredKey::new("n", "k")));
    assert!(engine.load_and_check_key());

    assert!(engine.delete_key());
    assert!(!engine.delete_key());
    assert!(!engine.load_and_check_key());
}
