//! Protection engine backed by the Enigma Protector SDK (`enigma_ide`).
//!
//! This is the only place that knows about wide strings, out-pointers and the
//! packed trial date. Everything above it works with `String`, `Option` and
//! `NaiveDate`.

use crate::engine::{ProtectionEngine, StoredKey, TrialCounters, decode_packed_date};
use crate::key_info::{KeyDate, KeyInformation};
use chrono::NaiveDate;
use std::ffi::c_int;
use tracing::warn;

type Bool = c_int;
type WChar = u16;

/// Mirrors `TKeyInformation` from `enigma_ide.h`.
#[repr(C)]
#[derive(Default)]
struct RawKeyInformation {
    stolen: Bool,
    creation_year: u16,
    creation_month: u16,
    creation_day: u16,
    use_key_expiration: Bool,
    expiration_year: u16,
    expiration_month: u16,
    expiration_day: u16,
    use_hardware_locking: Bool,
    use_executions_limit: Bool,
    executions_count: u32,
    use_days_limit: Bool,
    days_count: u32,
    use_run_time_limit: Bool,
    run_time_minutes: u32,
    use_global_time_limit: Bool,
    global_time_minutes: u32,
    use_county_limit: Bool,
    country_code: u32,
    use_register_after: Bool,
    register_after_year: u16,
    register_after_month: u16,
    register_after_day: u16,
    use_register_before: Bool,
    register_before_year: u16,
    register_before_month: u16,
    register_before_day: u16,
    encrypted_sections: [Bool; 16],
}

impl From<&RawKeyInformation> for KeyInformation {
    fn from(raw: &RawKeyInformation) -> Self {
        Self {
            stolen: raw.stolen != 0,
            creation: KeyDate::new(raw.creation_year, raw.creation_month, raw.creation_day),
            use_key_expiration: raw.use_key_expiration != 0,
            expiration: KeyDate::new(raw.expiration_year, raw.expiration_month, raw.expiration_day),
            use_hardware_locking: raw.use_hardware_locking != 0,
            use_executions_limit: raw.use_executions_limit != 0,
            executions_count: raw.executions_count,
            use_days_limit: raw.use_days_limit != 0,
            days_count: raw.days_count,
            use_run_time_limit: raw.use_run_time_limit != 0,
            run_time_minutes: raw.run_time_minutes,
            use_global_time_limit: raw.use_global_time_limit != 0,
            global_time_minutes: raw.global_time_minutes,
            use_county_limit: raw.use_county_limit != 0,
            country_code: raw.country_code,
            use_register_after: raw.use_register_after != 0,
            register_after: KeyDate::new(
                raw.register_after_year,
                raw.register_after_month,
                raw.register_after_day,
            ),
            use_register_before: raw.use_register_before != 0,
            register_before: KeyDate::new(
                raw.register_before_year,
                raw.register_before_month,
                raw.register_before_day,
            ),
        }
    }
}

#[link(name = "enigma_ide")]
unsafe extern "system" {
    fn EP_CheckupIsProtected() -> Bool;
    fn EP_CheckupIsEnigmaOk() -> Bool;
    fn EP_RegHardwareIDW() -> *const WChar;
    fn EP_RegLoadKeyW(name: *mut *mut WChar, key: *mut *mut WChar) -> Bool;
    fn EP_RegCheckKeyW(name: *const WChar, key: *const WChar) -> Bool;
    fn EP_RegCheckAndSaveKeyW(name: *const WChar, key: *const WChar) -> Bool;
    fn EP_RegLoadAndCheckKey() -> Bool;
    fn EP_RegKeyInformationW(
        name: *const WChar,
        key: *const WChar,
        info: *mut RawKeyInformation,
    ) -> Bool;
    fn EP_RegDeleteKey() -> Bool;
    fn EP_TrialExecutions(total: *mut c_int, left: *mut c_int) -> Bool;
    fn EP_TrialDays(total: *mut c_int, left: *mut c_int) -> Bool;
    fn EP_TrialExpirationDateEx() -> c_int;
}

/// The protector's runtime, reached through its exported API.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnigmaSdk;

impl EnigmaSdk {
    pub fn new() -> Self {
        Self
    }
}

/// NUL-terminated UTF-16 copy of `s`, `None` if `s` holds an interior NUL.
fn to_wide(s: &str) -> Option<Vec<WChar>> {
    let mut wide: Vec<WChar> = s.encode_utf16().collect();
    if wide.contains(&0) {
        warn!("Refusing to pass string with interior NUL to protection engine");
        return None;
    }
    wide.push(0);
    Some(wide)
}

/// Copies a NUL-terminated UTF-16 string owned by the engine.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated UTF-16 buffer.
unsafe fn from_wide(ptr: *const WChar) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let mut len = 0;
    // SAFETY: the buffer is NUL-terminated per the caller's contract.
    unsafe {
        while *ptr.add(len) != 0 {
            len += 1;
        }
        Some(String::from_utf16_lossy(std::slice::from_raw_parts(ptr, len)))
    }
}

fn wide_pair(name: &str, key: &str) -> Option<(Vec<WChar>, Vec<WChar>)> {
    Some((to_wide(name)?, to_wide(key)?))
}

impl ProtectionEngine for EnigmaSdk {
    fn is_protected(&self) -> bool {
        // SAFETY: takes no arguments and only reads engine state.
        unsafe { EP_CheckupIsProtected() != 0 }
    }

    fn is_integrated(&self) -> bool {
        // SAFETY: takes no arguments and only reads engine state.
        unsafe { EP_CheckupIsEnigmaOk() != 0 }
    }

    fn hardware_id(&self) -> String {
        // SAFETY: the engine returns null or a NUL-terminated buffer it owns.
        unsafe { from_wide(EP_RegHardwareIDW()) }.unwrap_or_default()
    }

    fn load_key(&self) -> Option<StoredKey> {
        let mut name: *mut WChar = std::ptr::null_mut();
        let mut key: *mut WChar = std::ptr::null_mut();
        // SAFETY: both out-pointers are valid; on success the engine points
        // them at NUL-terminated buffers it owns.
        unsafe {
            if EP_RegLoadKeyW(&mut name, &mut key) == 0 {
                return None;
            }
            Some(StoredKey {
                name: from_wide(name)?,
                key: from_wide(key)?,
            })
        }
    }

    fn check_key(&self, name: &str, key: &str) -> bool {
        let Some((name, key)) = wide_pair(name, key) else {
            return false;
        };
        // SAFETY: both buffers are NUL-terminated and outlive the call.
        unsafe { EP_RegCheckKeyW(name.as_ptr(), key.as_ptr()) != 0 }
    }

    fn check_and_save_key(&self, name: &str, key: &str) -> bool {
        let Some((name, key)) = wide_pair(name, key) else {
            return false;
        };
        // SAFETY: both buffers are NUL-terminated and outlive the call.
        unsafe { EP_RegCheckAndSaveKeyW(name.as_ptr(), key.as_ptr()) != 0 }
    }

    fn load_and_check_key(&self) -> bool {
        // SAFETY: takes no arguments.
        unsafe { EP_RegLoadAndCheckKey() != 0 }
    }

    fn key_information(&self, name: &str, key: &str) -> Option<KeyInformation> {
        let (name, key) = wide_pair(name, key)?;
        let mut raw = RawKeyInformation::default();
        // SAFETY: both buffers are NUL-terminated and outlive the call; `raw`
        // is a properly laid out TKeyInformation.
        let ok = unsafe { EP_RegKeyInformationW(name.as_ptr(), key.as_ptr(), &mut raw) != 0 };
        ok.then(|| KeyInformation::from(&raw))
    }

    fn delete_key(&self) -> bool {
        // SAFETY: takes no arguments.
        unsafe { EP_RegDeleteKey() != 0 }
    }

    fn trial_executions(&self) -> Option<TrialCounters> {
        let mut counters = TrialCounters::default();
        // SAFETY: both out-pointers refer to live i32 fields of `counters`.
        let enabled = unsafe { EP_TrialExecutions(&mut counters.total, &mut counters.left) != 0 };
        enabled.then_some(counters)
    }

    fn trial_days(&self) -> Option<TrialCounters> {
        let mut counters = TrialCounters::default();
        // SAFETY: both out-pointers refer to live i32 fields of `counters`.
        let enabled = unsafe { EP_TrialDays(&mut counters.total, &mut counters.left) != 0 };
        enabled.then_some(counters)
    }

    fn trial_expiration_date(&self) -> Option<NaiveDate> {
        // SAFETY: takes no arguments and returns a plain integer.
        let packed = unsafe { EP_TrialExpirationDateEx() };
        decode_packed_date(packed as u32)
    }
}
