//! Runtime half of crossbind: the reference bridge.
//!
//! - [`HandleTable`] - address to handle id with live reference counts
//! - [`ffi`] - process-wide bridge and its C ABI exports
//! - [`CallOutcome`] - failure indicators raised as foreign-side errors

mod call;
pub mod ffi;
mod handle_table;

pub use call::{CallOutcome, error_pending, set_error, take_error};
pub use ffi::{bridge, install_bridge};
pub use handle_table::{BridgeFault, HandleId, HandleTable, ManagedAddr, Released};
