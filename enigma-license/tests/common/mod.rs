//! Shared test helpers for license tests.

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use enigma_license::{KeyDate, KeyInformation, MemoryEngine, StoredKey};
use std::sync::Arc;

pub const NAME: &str = "Ada Lovelace";
pub const KEY: &str = "ADA-0001-ANALYTICAL";
pub const OTHER_NAME: &str = "Charles Babbage";
pub const OTHER_KEY: &str = "CB-0002-DIFFERENCE";

/// Metadata for a key with an execution limit and an expiration date.
pub fn limited_key_info() -> KeyInformation {
    KeyInformation {
        creation: KeyDate::new(2026, 1, 15),
        use_key_expiration: true,
        expiration: KeyDate::new(2027, 1, 15),
        use_executions_limit: true,
        executions_count: 500,
        ..KeyInformation::default()
    }
}

/// Metadata for a hardware-locked key with no limits.
pub fn perpetual_key_info() -> KeyInformation {
    KeyInformation {
        creation: KeyDate::new(2025, 6, 1),
        use_hardware_locking: true,
        ..KeyInformation::default()
    }
}

/// An engine accepting `NAME`/`KEY` and `OTHER_NAME`/`OTHER_KEY`, nothing persisted.
pub fn engine_with_keys() -> Arc<MemoryEngine> {
    let engine = MemoryEngine::new();
    engine.accept_key(NAME, KEY, limited_key_info());
    engine.accept_key(OTHER_NAME, OTHER_KEY, perpetual_key_info());
    Arc::new(engine)
}

/// Like `engine_with_keys`, with `NAME`/`KEY` already persisted.
pub fn engine_with_stored_key() -> Arc<MemoryEngine> {
    let engine = engine_with_keys();
    engine.store_key(Some(StoredKey::new(NAME, KEY)));
    engine
}

pub fn utc(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, sec).unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Seconds since epoch of midnight UTC on the given day.
pub fn midnight(year: i32, month: u32, day: u32) -> i64 {
    utc(year, month, day, 0, 0, 0).timestamp()
}
