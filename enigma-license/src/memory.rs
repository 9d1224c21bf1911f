//! In-process protection engine.
//!
//! Stands in for the protector when the binary is not wrapped (development
//! builds) and in tests. Every answer comes from plain state that can be
//! scripted through the setters or loaded from a TOML fixture:
//!
//! ```toml
//! protected = false
//! integrated = true
//! hardware_id = "DEV-0001"
//!
//! [stored_key]
//! name = "Ada Lovelace"
//! key = "ABCD-1234"
//!
//! [[keys]]
//! name = "Ada Lovelace"
//! key = "ABCD-1234"
//! info = { use_executions_limit = true, executions_count = 50 }
//!
//! [trial]
//! executions = { total = 30, left = 12 }
//! days = { total = 14, left = 9 }
//! expiration_date = "2027-01-31"
//! ```

use crate::engine::{ProtectionEngine, StoredKey, TrialCounters};
use crate::error::{LicenseError, LicenseResult};
use crate::key_info::KeyInformation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

/// Hardware id reported when a fixture does not set one.
pub const DEV_HARDWARE_ID: &str = "DEV-UNPROTECTED";

/// A key the engine accepts, with the metadata it reports for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptedKey {
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub info: KeyInformation,
}

/// Trial section of a fixture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialFixture {
    pub executions: Option<TrialCounters>,
    pub days: Option<TrialCounters>,
    pub expiration_date: Option<NaiveDate>,
}

/// Declarative description of a `MemoryEngine`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineFixture {
    pub protected: bool,
    pub integrated: bool,
    /// Falls back to [`DEV_HARDWARE_ID`] when absent.
    pub hardware_id: Option<String>,
    pub stored_key: Option<StoredKey>,
    pub keys: Vec<AcceptedKey>,
    pub trial: TrialFixture,
}

impl EngineFixture {
    /// Loads a fixture from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    pub fn load_from(path: impl AsRef<Path>) -> LicenseResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| LicenseError::FixtureRead {
            path: path.to_path_buf(),
            source,
        })?;
        let fixture: Self = toml::from_str(&contents)?;
        info!(
            "Loaded engine fixture from {:?} ({} accepted keys)",
            path,
            fixture.keys.len()
        );
        Ok(fixture)
    }
}

#[derive(Debug)]
struct MemoryState {
    protected: bool,
    integrated: bool,
    hardware_id: String,
    stored: Option<StoredKey>,
    accepted: HashMap<(String, String), KeyInformation>,
    executions: Option<TrialCounters>,
    days: Option<TrialCounters>,
    expiration_date: Option<NaiveDate>,
    key_information_available: bool,
}

/// Protection engine backed by in-memory state.
#[derive(Debug)]
pub struct MemoryEngine {
    state: Mutex<MemoryState>,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    /// An unprotected engine with no keys and no trial limits.
    pub fn new() -> Self {
        Self::from_fixture(EngineFixture::default())
    }

    pub fn from_fixture(fixture: EngineFixture) -> Self {
        let accepted = fixture
            .keys
            .into_iter()
            .map(|k| ((k.name, k.key), k.info))
            .collect();

        Self {
            state: Mutex::new(MemoryState {
                protected: fixture.protected,
                integrated: fixture.integrated,
                hardware_id: fixture
                    .hardware_id
                    .unwrap_or_else(|| DEV_HARDWARE_ID.to_string()),
                stored: fixture.stored_key,
                accepted,
                executions: fixture.trial.executions,
                days: fixture.trial.days,
                expiration_date: fixture.trial.expiration_date,
                key_information_available: true,
            }),
        }
    }

    /// Loads a fixture file and builds an engine from it.
    ///
    /// # Errors
    ///
    /// See [`EngineFixture::load_from`].
    pub fn load_fixture(path: impl AsRef<Path>) -> LicenseResult<Self> {
        EngineFixture::load_from(path).map(Self::from_fixture)
    }

    /// Makes the engine accept `(name, key)` and report `info` for it.
    pub fn accept_key(&self, name: &str, key: &str, info: KeyInformation) {
        self.state()
            .accepted
            .insert((name.to_string(), key.to_string()), info);
    }

    /// Stops accepting `(name, key)`. A persisted copy stays persisted.
    pub fn revoke_key(&self, name: &str, key: &str) {
        self.state()
            .accepted
            .remove(&(name.to_string(), key.to_string()));
    }

    /// Overwrites the persisted slot without validation.
    pub fn store_key(&self, stored: Option<StoredKey>) {
        self.state().stored = stored;
    }

    /// The currently persisted pair.
    pub fn stored_key(&self) -> Option<StoredKey> {
        self.state().stored.clone()
    }

    /// When false, `key_information` returns `None` even for accepted keys,
    /// while `check_key` and `check_and_save_key` keep succeeding.
    pub fn set_key_information_available(&self, available: bool) {
        self.state().key_information_available = available;
    }

    pub fn set_protected(&self, protected: bool) {
        self.state().protected = protected;
    }

    pub fn set_integrated(&self, integrated: bool) {
        self.state().integrated = integrated;
    }

    pub fn set_hardware_id(&self, hardware_id: impl Into<String>) {
        self.state().hardware_id = hardware_id.into();
    }

    pub fn set_trial_executions(&self, executions: Option<TrialCounters>) {
        self.state().executions = executions;
    }

    pub fn set_trial_days(&self, days: Option<TrialCounters>) {
        self.state().days = days;
    }

    pub fn set_trial_expiration_date(&self, date: Option<NaiveDate>) {
        self.state().expiration_date = date;
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_accepted(state: &MemoryState, name: &str, key: &str) -> bool {
        state
            .accepted
            .contains_key(&(name.to_string(), key.to_string()))
    }
}

impl ProtectionEngine for MemoryEngine {
    fn is_protected(&self) -> bool {
        self.state().protected
    }

    fn is_integrated(&self) -> bool {
        self.state().integrated
    }

    fn hardware_id(&self) -> String {
        self.state().hardware_id.clone()
    }

    fn load_key(&self) -> Option<StoredKey> {
        self.state().stored.clone()
    }

    fn check_key(&self, name: &str, key: &str) -> bool {
        Self::is_accepted(&self.state(), name, key)
    }

    fn check_and_save_key(&self, name: &str, key: &str) -> bool {
        let mut state = self.state();
        if !Self::is_accepted(&state, name, key) {
            return false;
        }
        state.stored = Some(StoredKey::new(name, key));
        true
    }

    fn load_and_check_key(&self) -> bool {
        let state = self.state();
        state
            .stored
            .as_ref()
            .is_some_and(|s| Self::is_accepted(&state, &s.name, &s.key))
    }

    fn key_information(&self, name: &str, key: &str) -> Option<KeyInformation> {
        let state = self.state();
        if !state.key_information_available {
            return None;
        }
        state
            .accepted
            .get(&(name.to_string(), key.to_string()))
            .cloned()
    }

    fn delete_key(&self) -> bool {
        self.state().stored.take().is_some()
    }

    fn trial_executions(&self) -> Option<TrialCounters> {
        self.state().executions
    }

    fn trial_days(&self) -> Option<TrialCounters> {
        self.state().days
    }

    fn trial_expiration_date(&self) -> Option<NaiveDate> {
        self.state().expiration_date
    }
}
