//! Translation of managed failures into the foreign side's error mechanism.
//!
//! A callable with the error convention never hands its error back as a value.
//! The glue records the message in a per-thread slot and returns a zero value;
//! the foreign side checks `crossbind_error_pending()` after the call and
//! raises its native exception with `crossbind_error_message()`.

use std::cell::RefCell;
use std::ffi::{CString, c_char};
use std::fmt::Display;
use std::ptr;
use std::sync::Arc;

use tracing::debug;

use crate::{BridgeFault, HandleTable};

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Record an error for the current thread, replacing any pending one.
pub fn set_error(message: impl Into<String>) {
    let message = message.into().replace('\0', "\u{fffd}");
    debug!(%message, "managed call raised");
    let text = CString::new(message).unwrap_or_default();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(text));
}

/// Take the pending error of the current thread.
pub fn take_error() -> Option<String> {
    LAST_ERROR.with(|slot| slot.borrow_mut().take().map(|s| s.to_string_lossy().into_owned()))
}

pub fn error_pending() -> bool {
    LAST_ERROR.with(|slot| slot.borrow().is_some())
}

/// Result of a managed call, as seen by the glue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome<T> {
    Value(T),
    /// The call failed; the message is pending in the error slot.
    Raised,
}

impl<T> CallOutcome<T> {
    /// Convert a managed result, recording the error if there is one.
    pub fn from_result<E: Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => CallOutcome::Value(value),
            Err(err) => {
                set_error(err.to_string());
                CallOutcome::Raised
            }
        }
    }

    pub fn is_raised(&self) -> bool {
        matches!(self, CallOutcome::Raised)
    }

    /// The value, or `fallback` when the call raised.
    pub fn value_or(self, fallback: T) -> T {
        match self {
            CallOutcome::Value(value) => value,
            CallOutcome::Raised => fallback,
        }
    }
}

impl<T: Default> CallOutcome<T> {
    /// The value, or the zero value the foreign side ignores when an error is pending.
    pub fn value_or_default(self) -> T {
        self.value_or(T::default())
    }
}

impl<T: std::any::Any + Send + Sync> CallOutcome<Arc<T>> {
    /// Hand a wrapped result to the foreign side.
    ///
    /// The object passes through `acquire` exactly once. A raised call yields
    /// handle 0, which is never a managed id.
    pub fn into_handle(self, table: &HandleTable) -> Result<i64, BridgeFault> {
        match self {
            CallOutcome::Value(obj) => Ok(table.acquire_object(&obj)?.get()),
            CallOutcome::Raised => Ok(0),
        }
    }
}

/// 1 if the current thread has a pending error.
#[unsafe(no_mangle)]
pub extern "C" fn crossbind_error_pending() -> u8 {
    u8::from(error_pending())
}

/// Message of the pending error, or null.
///
/// The pointer stays valid until the error is cleared or replaced on this thread.
#[unsafe(no_mangle)]
pub extern "C" fn crossbind_error_message() -> *const c_char {
    LAST_ERROR.with(|slot| slot.borrow().as_ref().map_or(ptr::null(), |s| s.as_ptr()))
}

#[unsafe(no_mangle)]
pub extern "C" fn crossbind_error_clear() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}
