//! Classified symbols.
//!
//! A [`Symbol`] is the one canonical record per distinct source type reachable
//! from the exposed surface. Its [`SymbolKind`] is a closed variant over the
//! supported type grammar; emitters match on it exhaustively instead of
//! inspecting types at runtime.

use bitflags::bitflags;
use serde::Serialize;

use crate::{BasicKind, CType, QualifiedName, TypeHash};

/// Stable identity of a symbol (hash of its canonical key).
pub type SymbolId = TypeHash;

bitflags! {
    /// Protocols a bound type satisfies on the foreign side.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    #[serde(transparent)]
    pub struct Protocols: u8 {
        /// Provides its own textual representation.
        const STRINGER = 1 << 0;
        /// Indexable item get/set (arrays and slices).
        const SEQUENCE = 1 << 1;
        /// Supports append (slices).
        const APPENDABLE = 1 << 2;
        /// Keyed get/set (maps).
        const MAPPING = 1 << 3;
    }
}

/// A struct field as seen through the symbol table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSymbol {
    pub name: String,
    pub symbol: SymbolId,
    /// 1-based position among all declared fields, exported or not.
    pub index: usize,
    pub doc: String,
    pub embedded: bool,
}

/// Shape of a classified type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SymbolKind {
    /// Registered before its constituents; replaced once they resolve.
    Pending,
    Basic { basic: BasicKind },
    Struct { fields: Vec<FieldSymbol> },
    Array { len: u64, elem: SymbolId },
    Slice { elem: SymbolId },
    Map { key: SymbolId, value: SymbolId },
    Signature {
        params: Vec<SymbolId>,
        results: Vec<SymbolId>,
        variadic: bool,
    },
    Pointer { elem: SymbolId },
    /// The universal empty interface.
    Interface,
    /// The failure indicator.
    Error,
}

/// How a value of a symbol crosses the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "repr", content = "c_type", rename_all = "snake_case")]
pub enum WireRepr {
    /// Copied by value as the given C type.
    Value(CType),
    /// Passed as an opaque handle id tracked by the reference bridge.
    Handle,
}

impl WireRepr {
    pub fn c_type(self) -> CType {
        match self {
            WireRepr::Value(c) => c,
            WireRepr::Handle => CType::Handle,
        }
    }

    pub fn is_handle(self) -> bool {
        matches!(self, WireRepr::Handle)
    }
}

/// One classified type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Symbol {
    /// Hash of the canonical key.
    pub hash: SymbolId,
    /// Generated identifier (e.g. `main_Person`, `slice_float64`).
    pub id: String,
    /// Source rendering (e.g. `[]*main.Node`).
    pub display_name: String,
    /// Name of the opaque C type generated for this symbol.
    pub c_name: String,
    /// Declared name, for named types.
    pub named: Option<QualifiedName>,
    /// Symbol of the underlying shape, for named types.
    pub underlying: Option<SymbolId>,
    pub kind: SymbolKind,
    /// Container protocols of the shape, plus `STRINGER` once a text method is found.
    pub protocols: Protocols,
    pub doc: String,
}

impl Symbol {
    /// Create a placeholder symbol for a type whose constituents are not yet classified.
    pub fn pending(hash: SymbolId, id: String, display_name: String) -> Self {
        let c_name = format!("cgo_type_{id}");
        Self {
            hash,
            id,
            display_name,
            c_name,
            named: None,
            underlying: None,
            kind: SymbolKind::Pending,
            protocols: Protocols::empty(),
            doc: String::new(),
        }
    }

    // === Classification ===

    pub fn is_pending(&self) -> bool {
        matches!(self.kind, SymbolKind::Pending)
    }

    /// Maps to a primitive (including named aliases of primitives).
    pub fn is_basic(&self) -> bool {
        matches!(self.kind, SymbolKind::Basic { .. })
    }

    pub fn is_named(&self) -> bool {
        self.named.is_some()
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, SymbolKind::Struct { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, SymbolKind::Array { .. })
    }

    pub fn is_slice(&self) -> bool {
        matches!(self.kind, SymbolKind::Slice { .. })
    }

    pub fn is_map(&self) -> bool {
        matches!(self.kind, SymbolKind::Map { .. })
    }

    pub fn is_signature(&self) -> bool {
        matches!(self.kind, SymbolKind::Signature { .. })
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.kind, SymbolKind::Pointer { .. })
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, SymbolKind::Interface)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, SymbolKind::Error)
    }

    /// Emitters generate a wrapper type for every symbol that is not a bare primitive.
    pub fn is_type(&self) -> bool {
        self.is_named() || !(self.is_basic() || self.is_error())
    }

    pub fn basic_kind(&self) -> Option<BasicKind> {
        match self.kind {
            SymbolKind::Basic { basic } => Some(basic),
            _ => None,
        }
    }

    /// Element symbol for arrays, slices and pointers; value symbol for maps.
    pub fn elem(&self) -> Option<SymbolId> {
        match self.kind {
            SymbolKind::Array { elem, .. }
            | SymbolKind::Slice { elem }
            | SymbolKind::Pointer { elem } => Some(elem),
            SymbolKind::Map { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Container protocols implied by the shape.
    pub fn container_protocols(&self) -> Protocols {
        match self.kind {
            SymbolKind::Array { .. } => Protocols::SEQUENCE,
            SymbolKind::Slice { .. } => Protocols::SEQUENCE | Protocols::APPENDABLE,
            SymbolKind::Map { .. } => Protocols::MAPPING,
            _ => Protocols::empty(),
        }
    }
}

/// Read access to a set of classified symbols.
///
/// Wrap policy is derived here rather than stored on each symbol, so a pointer
/// whose target was still a placeholder at classification time reports the
/// target's final shape.
pub trait SymbolLookup {
    fn symbol(&self, id: SymbolId) -> Option<&Symbol>;

    /// Byte width of the platform-sized integer family.
    fn word_size(&self) -> u8;

    /// Whether values of this symbol must cross as opaque handles.
    fn needs_wrapping(&self, id: SymbolId) -> bool {
        let mut current = id;
        let mut seen: Vec<SymbolId> = Vec::new();
        loop {
            let Some(sym) = self.symbol(current) else {
                return false;
            };
            match &sym.kind {
                SymbolKind::Struct { .. }
                | SymbolKind::Array { .. }
                | SymbolKind::Slice { .. }
                | SymbolKind::Map { .. }
                | SymbolKind::Signature { .. }
                | SymbolKind::Interface => return true,
                SymbolKind::Pointer { elem } => {
                    // pointer chains can only loop through named pointer types
                    if seen.contains(elem) {
                        return false;
                    }
                    seen.push(current);
                    current = *elem;
                }
                SymbolKind::Basic { .. } | SymbolKind::Error | SymbolKind::Pending => return false,
            }
        }
    }

    /// Wire representation of a symbol.
    fn wire_repr(&self, id: SymbolId) -> WireRepr {
        if self.needs_wrapping(id) {
            return WireRepr::Handle;
        }
        match self.symbol(id).map(|s| &s.kind) {
            Some(SymbolKind::Basic { basic }) => WireRepr::Value(basic.c_type(self.word_size())),
            Some(SymbolKind::Error) => WireRepr::Value(CType::CString),
            _ => WireRepr::Value(CType::Address),
        }
    }
}
