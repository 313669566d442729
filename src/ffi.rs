//! FFI bindings for Focus Flux
//!
//! This module provides C-compatible functions for calling Focus Flux from other
//! languages. All functions take null-terminated UTF-8 strings and return
//! allocated memory that must be freed by the caller using `focus_flux_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::adapter::{parse_samples, prepare_samples};
use crate::error::ComputeError;
use crate::pipeline::{
    dashboard_to_json, passport_to_json, replay_to_json, timeline_to_json, FocusProcessor,
};
use crate::config::FocusConfig;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Hand a pipeline result across the boundary, recording any error
fn into_c_result(result: Result<String, ComputeError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Shared body of the stateless entry points. A NULL config means defaults.
unsafe fn run_stateless(
    samples_json: *const c_char,
    config_json: *const c_char,
    run: fn(&str, Option<&str>) -> Result<String, ComputeError>,
) -> *mut c_char {
    clear_last_error();

    let samples = match cstr_to_string(samples_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid samples JSON string pointer");
            return ptr::null_mut();
        }
    };

    let config = if config_json.is_null() {
        None
    } else {
        match cstr_to_string(config_json) {
            Some(s) => Some(s),
            None => {
                set_last_error("Invalid config JSON string (not UTF-8)");
                return ptr::null_mut();
            }
        }
    };

    into_c_result(run(&samples, config.as_deref()))
}

// ============================================================================
// Stateless API
// ============================================================================

/// Classify samples JSON and return a timeline payload.
///
/// # Safety
/// - `samples_json` must be a valid null-terminated C string.
/// - `config_json` must be a valid null-terminated C string or NULL for defaults.
/// - Returns a newly allocated string that must be freed with `focus_flux_free_string`.
/// - Returns NULL on error; call `focus_flux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn focus_flux_timeline(
    samples_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    run_stateless(samples_json, config_json, timeline_to_json)
}

/// Classify samples JSON and return a compressed, downsampled timeline payload.
///
/// # Safety
/// Same contract as `focus_flux_timeline`.
#[no_mangle]
pub unsafe extern "C" fn focus_flux_dashboard(
    samples_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    run_stateless(samples_json, config_json, dashboard_to_json)
}

/// Classify samples JSON and return a replay payload.
///
/// # Safety
/// Same contract as `focus_flux_timeline`.
#[no_mangle]
pub unsafe extern "C" fn focus_flux_replay(
    samples_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    run_stateless(samples_json, config_json, replay_to_json)
}

/// Classify samples JSON and return a passport payload.
///
/// # Safety
/// Same contract as `focus_flux_timeline`.
#[no_mangle]
pub unsafe extern "C" fn focus_flux_passport(
    samples_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    run_stateless(samples_json, config_json, passport_to_json)
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a FocusProcessor
pub struct FocusProcessorHandle {
    processor: FocusProcessor,
}

/// Create a new FocusProcessor.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string or NULL for defaults.
/// - Must be freed with `focus_flux_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn focus_flux_processor_new(
    config_json: *const c_char,
) -> *mut FocusProcessorHandle {
    clear_last_error();

    let processor = if config_json.is_null() {
        Ok(FocusProcessor::new())
    } else {
        match cstr_to_string(config_json) {
            Some(json) => FocusConfig::from_json(&json).and_then(FocusProcessor::with_config),
            None => Err(ComputeError::InvalidConfig("config is not UTF-8".to_string())),
        }
    };

    match processor {
        Ok(processor) => Box::into_raw(Box::new(FocusProcessorHandle { processor })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a FocusProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `focus_flux_processor_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn focus_flux_processor_free(processor: *mut FocusProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Classify samples with the processor's profile and return a timeline payload.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `focus_flux_processor_new`.
/// - `samples_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `focus_flux_free_string`.
/// - Returns NULL on error; call `focus_flux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn focus_flux_processor_timeline(
    processor: *mut FocusProcessorHandle,
    samples_json: *const c_char,
    dashboard: bool,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    let json = match cstr_to_string(samples_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid samples JSON string pointer");
            return ptr::null_mut();
        }
    };

    into_c_result(handle.processor.timeline_json(&json, dashboard))
}

/// Learn profile baselines from samples history.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `focus_flux_processor_new`.
/// - `samples_json` must be a valid null-terminated C string.
/// - Returns 1 if the profile changed, 0 if history had no activity, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn focus_flux_processor_learn(
    processor: *mut FocusProcessorHandle,
    samples_json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }
    let handle = &mut *processor;

    let json = match cstr_to_string(samples_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid samples JSON string pointer");
            return -1;
        }
    };

    match parse_samples(&json).and_then(prepare_samples) {
        Ok(samples) => i32::from(handle.processor.learn(&samples)),
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Store an externally calibrated focus percentile. Returns the clamped value,
/// or a negative number for a NULL processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `focus_flux_processor_new`.
#[no_mangle]
pub unsafe extern "C" fn focus_flux_processor_apply_calibration(
    processor: *mut FocusProcessorHandle,
    percentile: f64,
) -> f64 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1.0;
    }
    let handle = &mut *processor;
    handle.processor.apply_calibration(percentile)
}

/// Save the processor's focus profile to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `focus_flux_processor_new`.
/// - Returns a newly allocated string that must be freed with `focus_flux_free_string`.
/// - Returns NULL on error; call `focus_flux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn focus_flux_processor_save_profile(
    processor: *mut FocusProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;
    into_c_result(handle.processor.save_profile())
}

/// Load a focus profile from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `focus_flux_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn focus_flux_processor_load_profile(
    processor: *mut FocusProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }
    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid profile JSON string pointer");
            return -1;
        }
    };

    match handle.processor.load_profile(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Focus Flux functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Focus Flux function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn focus_flux_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string, valid until the next
///   Focus Flux call on this thread. Do NOT free it.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn focus_flux_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn focus_flux_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
