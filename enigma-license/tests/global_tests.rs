//! Process-wide facade. Runs as its own test binary so the global starts
//! empty; everything lives in one test to keep the ordering deterministic.

mod common;

use common::{NAME, engine_with_stored_key};
use enigma_license::{LicenseError, MemoryEngine, global, install};
use std::sync::Arc;
use std::thread;

#[test]
fn install_once_then_global() {
    assert!(matches!(global(), Err(LicenseError::NotInstalled)));

    let results: Vec<bool> = (0..4)
        .map(|_| thread::spawn(|| install(engine_with_stored_key()).is_ok()))
        .collect::<Vec<_>>()
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect();
    assert_eq!(results.iter().filter(|ok| **ok).count(), 1);

    let license = global().unwrap();
    assert!(license.registration().is_registered());
    assert_eq!(license.registration().name(), NAME);

    assert!(matches!(
        install(Arc::new(MemoryEngine::new())),
        Err(LicenseError::AlreadyInstalled)
    ));
    assert!(std::ptr::eq(global().unwrap(), license));
}
