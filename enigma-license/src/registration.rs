//! Registration: the process's authority over the active license key.
//!
//! `load_key` and `save_key` change what this process considers its
//! registration. The remaining queries (`check_stored_key`,
//! `check_candidate_key`, `key_information`) go straight to the engine and
//! never touch the held triple, so a key-entry dialog can probe candidates
//! without disturbing the registration established at startup.
//!
//! A failed `load_key` or `save_key` leaves the previous triple in place.
//! Nothing is cleared on failure.

use crate::engine::ProtectionEngine;
use crate::key_info::KeyInformation;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Whether a registration has ever been adopted by this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationState {
    /// No load or save has succeeded yet.
    Unloaded,
    /// The last successful load or save populated the triple.
    Registered,
}

/// The (name, key, metadata) triple adopted after a successful load or save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredKey {
    pub name: String,
    #[serde(skip_serializing)]
    pub key: String,
    pub key_info: KeyInformation,
}

pub struct Registration {
    engine: Arc<dyn ProtectionEngine>,
    // Held only while copying or replacing the triple, never across engine calls.
    current: RwLock<Option<RegisteredKey>>,
}

impl Registration {
    /// Creates the registration and attempts to load the persisted key.
    pub fn new(engine: Arc<dyn ProtectionEngine>) -> Self {
        let registration = Self::unloaded(engine);
        registration.load_key();
        registration
    }

    /// Creates a registration without consulting persisted storage.
    pub fn unloaded(engine: Arc<dyn ProtectionEngine>) -> Self {
        Self {
            engine,
            current: RwLock::new(None),
        }
    }

    /// Loads the persisted key through the engine and adopts it if the engine
    /// still accepts it.
    ///
    /// Returns `false` and leaves the current triple untouched if there is no
    /// stored key, the key no longer verifies, or its metadata is unavailable.
    pub fn load_key(&self) -> bool {
        let Some(stored) = self.engine.load_key() else {
            debug!("No persisted license key");
            return false;
        };

        if !self.engine.check_key(&stored.name, &stored.key) {
            warn!(name = %stored.name, "Persisted license key rejected by protection engine");
            return false;
        }

        let Some(key_info) = self.engine.key_information(&stored.name, &stored.key) else {
            warn!(name = %stored.name, "Key information unavailable for persisted license key");
            return false;
        };

        self.adopt(stored.name, stored.key, key_info);
        true
    }

    /// Validates and persists a new pair, adopting it on success.
    ///
    /// If the engine persists the pair but then reports no metadata for it,
    /// this returns `false` and the held triple stays as it was while storage
    /// already holds the new pair. A later `load_key` reconciles the two.
    pub fn save_key(&self, name: &str, key: &str) -> bool {
        if !self.engine.check_and_save_key(name, key) {
            info!(name = %name, "License key rejected");
            return false;
        }

        let Some(key_info) = self.engine.key_information(name, key) else {
            warn!(name = %name, "Key saved but key information unavailable");
            return false;
        };

        self.adopt(name.to_string(), key.to_string(), key_info);
        true
    }

    /// Asks the engine to remove the persisted key.
    ///
    /// The held triple is left as is; the engine owns what deletion means.
    pub fn delete_key(&self) -> bool {
        let deleted = self.engine.delete_key();
        debug!(deleted, "Persisted license key delete requested");
        deleted
    }

    /// Whether the key currently persisted by the engine is valid.
    #[must_use]
    pub fn check_stored_key(&self) -> bool {
        self.engine.load_and_check_key()
    }

    /// Whether a specific pair is valid. Nothing is persisted or adopted.
    #[must_use]
    pub fn check_candidate_key(&self, name: &str, key: &str) -> bool {
        self.engine.check_key(name, key)
    }

    /// Metadata for a specific pair, `None` if the engine rejects it.
    #[must_use]
    pub fn key_information(&self, name: &str, key: &str) -> Option<KeyInformation> {
        self.engine.key_information(name, key)
    }

    #[must_use]
    pub fn state(&self) -> RegistrationState {
        if self.read(|current| current.is_some()) {
            RegistrationState::Registered
        } else {
            RegistrationState::Unloaded
        }
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.state() == RegistrationState::Registered
    }

    /// Snapshot of the adopted triple, `None` while unloaded.
    #[must_use]
    pub fn current(&self) -> Option<RegisteredKey> {
        self.read(Clone::clone)
    }

    /// Registrant name, empty while unloaded.
    #[must_use]
    pub fn name(&self) -> String {
        self.read(|c| c.as_ref().map(|r| r.name.clone()).unwrap_or_default())
    }

    /// Key string, empty while unloaded.
    #[must_use]
    pub fn key(&self) -> String {
        self.read(|c| c.as_ref().map(|r| r.key.clone()).unwrap_or_default())
    }

    /// Key metadata, default while unloaded.
    #[must_use]
    pub fn key_info(&self) -> KeyInformation {
        self.read(|c| c.as_ref().map(|r| r.key_info.clone()).unwrap_or_default())
    }

    fn read<T>(&self, f: impl FnOnce(&Option<RegisteredKey>) -> T) -> T {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        f(&*guard)
    }

    fn adopt(&self, name: String, key: String, key_info: KeyInformation) {
        info!(name = %name, stolen = key_info.stolen, "License key registered");
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(RegisteredKey {
            name,
            key,
            key_info,
        });
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("state", &self.state())
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}
