//! C ABI exports of the process-wide reference bridge.
//!
//! Generated glue on both sides calls these. A [`BridgeFault`] here means the
//! binding layer itself is corrupt, so it is logged and the process aborts.

use once_cell::sync::OnceCell;
use tracing::{error, info};

use crate::{BridgeFault, HandleId, HandleTable, ManagedAddr};

static BRIDGE: OnceCell<HandleTable> = OnceCell::new();

/// The process-wide bridge, created with default settings on first use.
pub fn bridge() -> &'static HandleTable {
    BRIDGE.get_or_init(HandleTable::new)
}

/// Install the process-wide bridge with a custom first handle id.
///
/// Must run before any handle crosses the boundary. Returns `false` if a
/// bridge was already in place.
pub fn install_bridge(start: i64) -> bool {
    let installed = BRIDGE.set(HandleTable::with_start(start)).is_ok();
    if installed {
        info!(start, "installed reference bridge");
    }
    installed
}

fn fatal(fault: BridgeFault) -> ! {
    error!(%fault, "reference bridge corrupted, aborting");
    std::process::abort()
}

/// Track a reference to a managed address and return its handle id.
#[unsafe(no_mangle)]
pub extern "C" fn crossbind_acquire(addr: usize) -> i64 {
    match bridge().acquire(ManagedAddr::new(addr)) {
        Ok(handle) => handle.get(),
        Err(fault) => fatal(fault),
    }
}

/// Drop a reference to a managed address. Aborts on an untracked address.
#[unsafe(no_mangle)]
pub extern "C" fn crossbind_release(addr: usize) {
    if let Err(fault) = bridge().release(ManagedAddr::new(addr)) {
        fatal(fault);
    }
}

/// Drop a reference by handle id. Aborts on an unknown handle.
#[unsafe(no_mangle)]
pub extern "C" fn crossbind_release_handle(handle: i64) {
    if let Err(fault) = bridge().release_handle(HandleId::new(handle)) {
        fatal(fault);
    }
}

/// Address behind a live handle, or 0 if the handle is not tracked.
#[unsafe(no_mangle)]
pub extern "C" fn crossbind_lookup(handle: i64) -> usize {
    bridge()
        .lookup(HandleId::new(handle))
        .map_or(0, ManagedAddr::get)
}
