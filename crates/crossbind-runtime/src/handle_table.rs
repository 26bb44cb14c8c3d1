//! Reference bridge between the managed heap and a refcounted foreign runtime.
//!
//! The foreign side never sees managed addresses. It holds [`HandleId`]s and
//! calls [`HandleTable::acquire`] / [`HandleTable::release`] as its proxies are
//! created and destroyed. While an address has a positive count the table keeps
//! the object it refers to alive.
//!
//! Managed handle ids are negative and strictly decreasing; an id is never
//! handed out twice, even after its entry is removed. The positive range is
//! left to the foreign side.
//!
//! All operations take one lock. Anchors (`Arc` clones) are created before the
//! lock is taken and dropped after it is released, so the critical section is
//! a couple of map operations.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::trace;

/// Keeps a managed object alive while the foreign side references it.
type Anchor = Arc<dyn Any + Send + Sync>;

/// Address of a managed object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ManagedAddr(usize);

impl ManagedAddr {
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    /// Address of the object behind an `Arc`.
    pub fn of<T: ?Sized>(obj: &Arc<T>) -> Self {
        Self(Arc::as_ptr(obj) as *const () as usize)
    }

    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Debug for ManagedAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ManagedAddr({:#x})", self.0)
    }
}

impl fmt::Display for ManagedAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Opaque id the foreign side uses to refer to a managed object.
///
/// Negative values belong to the managed side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct HandleId(i64);

impl HandleId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// Check if this id was issued by a managed-side table.
    pub const fn is_managed(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Table corruption detected by the bridge.
///
/// None of these are recoverable; the C ABI exports abort on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BridgeFault {
    #[error("release of untracked address {0}")]
    UnknownAddress(ManagedAddr),

    #[error("release of unknown handle {0}")]
    UnknownHandle(HandleId),

    #[error("managed handle space exhausted")]
    HandleSpaceExhausted,
}

/// Outcome of a successful release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Released {
    /// Other references remain.
    Retained { handle: HandleId, remaining: u64 },
    /// The last reference was dropped and the entry removed.
    Removed { handle: HandleId },
}

impl Released {
    pub fn handle(self) -> HandleId {
        match self {
            Released::Retained { handle, .. } | Released::Removed { handle } => handle,
        }
    }

    pub fn is_removed(self) -> bool {
        matches!(self, Released::Removed { .. })
    }
}

struct Entry {
    handle: HandleId,
    count: u64,
    anchor: Option<Anchor>,
}

struct State {
    next: i64,
    by_addr: FxHashMap<ManagedAddr, Entry>,
    by_handle: FxHashMap<HandleId, ManagedAddr>,
}

impl State {
    /// Track one more reference. Returns the handle and any anchor that was not needed.
    fn acquire(&mut self, addr: ManagedAddr, anchor: Option<Anchor>) -> Result<(HandleId, Option<Anchor>), BridgeFault> {
        if let Some(entry) = self.by_addr.get_mut(&addr) {
            entry.count += 1;
            let spare = if entry.anchor.is_none() {
                entry.anchor = anchor;
                None
            } else {
                anchor
            };
            return Ok((entry.handle, spare));
        }

        if self.next == i64::MIN {
            return Err(BridgeFault::HandleSpaceExhausted);
        }
        let handle = HandleId(self.next);
        self.next -= 1;
        self.by_addr.insert(
            addr,
            Entry {
                handle,
                count: 1,
                anchor,
            },
        );
        self.by_handle.insert(handle, addr);
        Ok((handle, None))
    }

    /// Drop one reference. Returns the outcome and the anchor to drop once unlocked.
    fn release(&mut self, addr: ManagedAddr) -> Result<(Released, Option<Anchor>), BridgeFault> {
        let Some(entry) = self.by_addr.get_mut(&addr) else {
            return Err(BridgeFault::UnknownAddress(addr));
        };
        entry.count -= 1;
        if entry.count > 0 {
            return Ok((
                Released::Retained {
                    handle: entry.handle,
                    remaining: entry.count,
                },
                None,
            ));
        }

        let handle = entry.handle;
        let anchor = self.by_addr.remove(&addr).and_then(|e| e.anchor);
        self.by_handle.remove(&handle);
        Ok((Released::Removed { handle }, anchor))
    }
}

/// Thread-safe table from managed addresses to handle ids and live counts.
///
/// # Example
///
/// ```
/// use crossbind_runtime::{HandleTable, ManagedAddr};
///
/// let table = HandleTable::new();
/// let addr = ManagedAddr::new(0x1000);
///
/// let h1 = table.acquire(addr).unwrap();
/// let h2 = table.acquire(addr).unwrap();
/// assert_eq!(h1, h2);
/// assert_eq!(table.count(addr), Some(2));
///
/// assert!(!table.release(addr).unwrap().is_removed());
/// assert!(table.release(addr).unwrap().is_removed());
/// assert!(table.release(addr).is_err());
/// ```
pub struct HandleTable {
    state: Mutex<State>,
}

impl HandleTable {
    /// First handle id issued by [`HandleTable::new`].
    pub const DEFAULT_START: i64 = -1;

    pub fn new() -> Self {
        Self::with_start(Self::DEFAULT_START)
    }

    /// Create a table whose first handle id is `start`.
    ///
    /// Non-negative starts are clamped to `-1`; the positive range belongs
    /// to the foreign side.
    pub fn with_start(start: i64) -> Self {
        Self {
            state: Mutex::new(State {
                next: start.min(-1),
                by_addr: FxHashMap::default(),
                by_handle: FxHashMap::default(),
            }),
        }
    }

    // ==========================================================================
    // Reference counting
    // ==========================================================================

    /// Track a reference to `addr`, returning its handle.
    ///
    /// A tracked address gets its count bumped and keeps its handle; an
    /// untracked one is assigned the next id with a count of 1.
    pub fn acquire(&self, addr: ManagedAddr) -> Result<HandleId, BridgeFault> {
        let (handle, _) = self.state.lock().acquire(addr, None)?;
        trace!(%addr, %handle, "acquire");
        Ok(handle)
    }

    /// Track a reference to a managed object and keep it alive until the
    /// count drops to zero.
    pub fn acquire_object<T: Any + Send + Sync>(&self, obj: &Arc<T>) -> Result<HandleId, BridgeFault> {
        let addr = ManagedAddr::of(obj);
        let anchor: Anchor = obj.clone();
        let (handle, spare) = self.state.lock().acquire(addr, Some(anchor))?;
        drop(spare);
        trace!(%addr, %handle, "acquire object");
        Ok(handle)
    }

    /// Drop a reference to `addr`.
    ///
    /// Releasing an untracked address is a [`BridgeFault::UnknownAddress`].
    pub fn release(&self, addr: ManagedAddr) -> Result<Released, BridgeFault> {
        let (released, anchor) = self.state.lock().release(addr)?;
        drop(anchor);
        trace!(%addr, ?released, "release");
        Ok(released)
    }

    /// Drop a reference by handle id.
    pub fn release_handle(&self, handle: HandleId) -> Result<Released, BridgeFault> {
        let (released, anchor) = {
            let mut state = self.state.lock();
            let addr = *state
                .by_handle
                .get(&handle)
                .ok_or(BridgeFault::UnknownHandle(handle))?;
            state.release(addr)?
        };
        drop(anchor);
        trace!(%handle, ?released, "release handle");
        Ok(released)
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Address behind a live handle.
    pub fn lookup(&self, handle: HandleId) -> Option<ManagedAddr> {
        self.state.lock().by_handle.get(&handle).copied()
    }

    /// Handle of a tracked address.
    pub fn handle_of(&self, addr: ManagedAddr) -> Option<HandleId> {
        self.state.lock().by_addr.get(&addr).map(|e| e.handle)
    }

    /// Live reference count of a tracked address.
    pub fn count(&self, addr: ManagedAddr) -> Option<u64> {
        self.state.lock().by_addr.get(&addr).map(|e| e.count)
    }

    /// Resolve a handle to the anchored object.
    ///
    /// Returns `None` if the handle is unknown, was acquired by address only,
    /// or refers to a different type.
    pub fn get<T: Any + Send + Sync>(&self, handle: HandleId) -> Option<Arc<T>> {
        let anchor = {
            let state = self.state.lock();
            let addr = state.by_handle.get(&handle)?;
            state.by_addr.get(addr)?.anchor.clone()?
        };
        anchor.downcast::<T>().ok()
    }

    /// Number of tracked addresses.
    pub fn len(&self) -> usize {
        self.state.lock().by_addr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("HandleTable")
            .field("tracked", &state.by_addr.len())
            .field("next", &state.next)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_twice_shares_handle() {
        let table = HandleTable::new();
        let a = ManagedAddr::new(0x10);
        let h = table.acquire(a).unwrap();
        assert_eq!(table.acquire(a).unwrap(), h);
        assert_eq!(table.count(a), Some(2));
        assert_eq!(table.len(), 1);
        assert!(h.is_managed());
    }

    #[test]
    fn release_removes_at_zero_and_third_release_faults() {
        let table = HandleTable::new();
        let a = ManagedAddr::new(0x10);
        let h = table.acquire(a).unwrap();
        table.acquire(a).unwrap();

        assert_eq!(table.release(a).unwrap(), Released::Retained { handle: h, remaining: 1 });
        assert_eq!(table.release(a).unwrap(), Released::Removed { handle: h });
        assert!(table.is_empty());
        assert_eq!(table.lookup(h), None);
        assert_eq!(table.release(a), Err(BridgeFault::UnknownAddress(a)));
    }

    #[test]
    fn ids_decrease_and_are_never_reused() {
        let table = HandleTable::new();
        let a = ManagedAddr::new(0x10);
        let b = ManagedAddr::new(0x20);

        let h1 = table.acquire(a).unwrap();
        table.release(a).unwrap();
        let h2 = table.acquire(a).unwrap();
        let h3 = table.acquire(b).unwrap();

        assert_eq!(h1, HandleId::new(-1));
        assert!(h2 < h1);
        assert!(h3 < h2);
    }

    #[test]
    fn custom_start_is_clamped_negative() {
        assert_eq!(HandleTable::with_start(-24).acquire(ManagedAddr::new(1)).unwrap(), HandleId::new(-24));
        assert_eq!(HandleTable::with_start(5).acquire(ManagedAddr::new(1)).unwrap(), HandleId::new(-1));
    }

    #[test]
    fn handle_space_exhaustion() {
        let table = HandleTable::with_start(i64::MIN + 1);
        table.acquire(ManagedAddr::new(1)).unwrap();
        assert_eq!(table.acquire(ManagedAddr::new(2)), Err(BridgeFault::HandleSpaceExhausted));
    }

    #[test]
    fn release_by_handle() {
        let table = HandleTable::new();
        let a = ManagedAddr::new(0x30);
        let h = table.acquire(a).unwrap();
        assert_eq!(table.lookup(h), Some(a));
        assert!(table.release_handle(h).unwrap().is_removed());
        assert_eq!(table.release_handle(h), Err(BridgeFault::UnknownHandle(h)));
    }

    #[test]
    fn anchored_object_lives_until_last_release() {
        let table = HandleTable::new();
        let obj = Arc::new(String::from("person"));
        let h = table.acquire_object(&obj).unwrap();
        table.acquire_object(&obj).unwrap();
        assert_eq!(Arc::strong_count(&obj), 2);

        let got: Arc<String> = table.get(h).unwrap();
        assert_eq!(*got, "person");
        assert!(table.get::<u32>(h).is_none());
        drop(got);

        table.release_handle(h).unwrap();
        assert_eq!(Arc::strong_count(&obj), 2);
        table.release_handle(h).unwrap();
        assert_eq!(Arc::strong_count(&obj), 1);
    }

    #[test]
    fn address_only_entries_have_no_object() {
        let table = HandleTable::new();
        let h = table.acquire(ManagedAddr::new(0x40)).unwrap();
        assert!(table.get::<String>(h).is_none());
    }
}
