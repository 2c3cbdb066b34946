//! Unit tests for error.rs
//!
//! Tests Error variants, Display text, and the engine_err!/engine_bail! macros.

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_invalid_configuration_display() {
    let err = Error::InvalidConfiguration("width must be non-zero".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid configuration"));
    assert!(display.contains("width must be non-zero"));
}

#[test]
fn test_invalid_handle_display() {
    let err = Error::InvalidHandle("texture handle 7v1 is not registered".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid handle"));
    assert!(display.contains("7v1"));
}

#[test]
fn test_range_and_shape_display() {
    let range = Error::RangeError("mip 3 >= 1".to_string());
    assert!(format!("{}", range).starts_with("Range error"));

    let shape = Error::ShapeMismatch("expected 4x4".to_string());
    assert!(format!("{}", shape).starts_with("Shape mismatch"));
}

#[test]
fn test_usage_and_sync_display() {
    let usage = Error::UsageError("not CPU cached".to_string());
    assert!(format!("{}", usage).starts_with("Usage error"));

    let sync = Error::SynchronizationFailure("device lost".to_string());
    assert!(format!("{}", sync).contains("device lost"));
}

#[test]
fn test_out_of_memory_display() {
    let err = Error::OutOfMemory;
    assert_eq!(format!("{}", err), "Out of GPU memory");
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_clone_keeps_message() {
    let err1 = Error::ShapeMismatch("16 colors for a 4x4 surface".to_string());
    let err2 = err1.clone();
    assert_eq!(format!("{}", err1), format!("{}", err2));
}

#[test]
fn test_kind_name() {
    assert_eq!(Error::InvalidConfiguration(String::new()).kind_name(), "InvalidConfiguration");
    assert_eq!(Error::InvalidHandle(String::new()).kind_name(), "InvalidHandle");
    assert_eq!(Error::RangeError(String::new()).kind_name(), "RangeError");
    assert_eq!(Error::ShapeMismatch(String::new()).kind_name(), "ShapeMismatch");
    assert_eq!(Error::UsageError(String::new()).kind_name(), "UsageError");
    assert_eq!(Error::SynchronizationFailure(String::new()).kind_name(), "SynchronizationFailure");
    assert_eq!(Error::OutOfMemory.kind_name(), "OutOfMemory");
}

// ============================================================================
// MACRO TESTS
// ============================================================================

#[test]
fn test_engine_err_with_variant() {
    let err = crate::engine_err!("lumen::test", RangeError, "face {} >= {}", 6, 1);
    match err {
        Error::RangeError(msg) => assert_eq!(msg, "face 6 >= 1"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_engine_err_defaults_to_backend_error() {
    let err = crate::engine_err!("lumen::test", "queue closed after {} commands", 3);
    assert!(matches!(err, Error::BackendError(ref msg) if msg == "queue closed after 3 commands"));
}

#[test]
fn test_engine_bail_returns_early() {
    fn check(value: u32) -> Result<u32> {
        if value == 0 {
            crate::engine_bail!("lumen::test", InvalidConfiguration, "value must be non-zero");
        }
        Ok(value)
    }

    assert_eq!(check(5).unwrap(), 5);
    assert!(matches!(check(0), Err(Error::InvalidConfiguration(_))));
}

// ============================================================================
// ERROR PROPAGATION TESTS
// ============================================================================

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<i32> {
        Err(Error::OutOfMemory)
    }

    fn outer() -> Result<i32> {
        inner()?;
        Ok(42)
    }

    assert!(matches!(outer(), Err(Error::OutOfMemory)));
}
