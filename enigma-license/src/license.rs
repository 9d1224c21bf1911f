//! The license facade.
//!
//! Composes one `Registration` and one `Trial`, each built on first access,
//! and forwards the protection flags and hardware id to the engine on every
//! read. No decision logic lives here.

use crate::engine::ProtectionEngine;
use crate::error::{LicenseError, LicenseResult};
use crate::registration::Registration;
use crate::trial::Trial;
use std::sync::{Arc, OnceLock};
use tracing::info;

pub struct License {
    engine: Arc<dyn ProtectionEngine>,
    registration: OnceLock<Registration>,
    trial: OnceLock<Trial>,
}

impl License {
    pub fn new(engine: Arc<dyn ProtectionEngine>) -> Self {
        Self {
            engine,
            registration: OnceLock::new(),
            trial: OnceLock::new(),
        }
    }

    /// Builds both sub-objects now: loads the persisted key and computes the
    /// trial.
    pub fn initialize(&self) -> &Self {
        let registration = self.registration();
        let trial = self.trial();
        info!(
            registered = registration.is_registered(),
            trial = ?trial.check_trial(),
            "License initialized"
        );
        self
    }

    /// The registration authority. The persisted key is loaded on first call.
    pub fn registration(&self) -> &Registration {
        self.registration
            .get_or_init(|| Registration::new(Arc::clone(&self.engine)))
    }

    /// The trial, computed on first call and fixed afterwards.
    pub fn trial(&self) -> &Trial {
        self.trial.get_or_init(|| Trial::compute(self.engine.as_ref()))
    }

    /// Whether the binary runs under the protector. Not cached.
    #[must_use]
    pub fn is_protected(&self) -> bool {
        self.engine.is_protected()
    }

    /// Whether the protection runtime initialized correctly. Not cached.
    #[must_use]
    pub fn is_integrated(&self) -> bool {
        self.engine.is_integrated()
    }

    /// Machine identifier for binding a key request. Not cached.
    #[must_use]
    pub fn hardware_id(&self) -> String {
        self.engine.hardware_id()
    }
}

impl std::fmt::Debug for License {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("License")
            .field("registration", &self.registration.get())
            .field("trial", &self.trial.get())
            .finish_non_exhaustive()
    }
}

static GLOBAL: OnceLock<License> = OnceLock::new();

/// Installs the process-wide facade over `engine` and initializes it.
///
/// Concurrent first calls still build exactly one facade; every caller but
/// the winner gets `AlreadyInstalled`.
///
/// # Errors
///
/// Returns `LicenseError::AlreadyInstalled` if a facade already exists.
pub fn install(engine: Arc<dyn ProtectionEngine>) -> LicenseResult<&'static License> {
    let mut installed = false;
    let license = GLOBAL.get_or_init(|| {
        installed = true;
        License::new(engine)
    });

    if !installed {
        return Err(LicenseError::AlreadyInstalled);
    }
    Ok(license.initialize())
}

/// The process-wide facade.
///
/// # Errors
///
/// Returns `LicenseError::NotInstalled` before [`install`] has run.
pub fn global() -> LicenseResult<&'static License> {
    GLOBAL.get().ok_or(LicenseError::NotInstalled)
}
