//! License key registration and trial evaluation.
//!
//! This crate decides whether the running application may execute, either
//! under a registered license key or under a trial. The heavy lifting (key
//! cryptography, persistence, hardware ids, anti-tamper) belongs to the
//! protection engine; this crate turns its raw answers into a few
//! well-defined states:
//!
//! - **Registration**: registered / not registered, with the key's metadata
//! - **Trial**: valid / expired / disabled
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use enigma_license::{MemoryEngine, TrialStatus};
//!
//! let license = enigma_license::install(Arc::new(MemoryEngine::new()))?;
//! if !license.registration().is_registered()
//!     && license.trial().check_trial() == TrialStatus::Expired
//! {
//!     // prompt for a key
//! }
//! # Ok::<(), enigma_license::LicenseError>(())
//! ```
//!
//! # Failure reporting
//!
//! The engine does not distinguish "unavailable", "malformed" and "rejected";
//! neither do `Registration` and `Trial`. Every decision comes back as `bool`
//! or `Option`, and a failed `load_key` / `save_key` leaves the previous
//! registration untouched.

mod engine;
mod error;
mod key_info;
mod license;
mod memory;
mod registration;
#[cfg(all(feature = "enigma-sdk", windows))]
mod sdk;
mod trial;

pub use engine::{ProtectionEngine, StoredKey, TrialCounters, decode_packed_date};
pub use error::{LicenseError, LicenseResult};
pub use key_info::{KeyDate, KeyInformation};
pub use license::{License, global, install};
pub use memory::{AcceptedKey, DEV_HARDWARE_ID, EngineFixture, MemoryEngine, TrialFixture};
pub use registration::{RegisteredKey, Registration, RegistrationState};
pub use trial::{Trial, TrialStatus};

#[cfg(all(feature = "enigma-sdk", windows))]
pub use sdk::EnigmaSdk;
