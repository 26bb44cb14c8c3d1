//! Normalized callables.
//!
//! A [`Func`] is the call contract produced by the signature analyzer: ordered
//! parameters, the value result with the failure indicator stripped, and the
//! error-convention flag.

use serde::Serialize;

use crate::{Protocols, SymbolId, TypeHash};

/// A parameter or value-result slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    /// Declared name, or a positional name (`arg_0`, `ret`) when undeclared.
    pub name: String,
    pub symbol: SymbolId,
}

impl Param {
    pub fn new(name: impl Into<String>, symbol: SymbolId) -> Self {
        Self {
            name: name.into(),
            symbol,
        }
    }
}

/// Receiver of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Receiver {
    /// The owning type's symbol.
    pub symbol: SymbolId,
    /// Declared on `*T`.
    pub pointer: bool,
}

/// What role a callable plays for emitters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FuncKind {
    /// Package-level function.
    Function,
    /// Method on a bound type.
    Method,
    /// Free function promoted into a type's constructor list.
    Constructor,
    /// Synthesized zero-value constructor of a type.
    New,
    /// Synthesized textual representation of a type.
    Str,
    /// Synthesized getter (constants, variables, struct fields).
    Getter,
    /// Synthesized setter (variables, struct fields).
    Setter,
}

/// A normalized callable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Func {
    /// Source-level name.
    pub name: String,
    /// Generated identifier, unique per (scope, name).
    pub id: String,
    /// Fully qualified descriptor (`import/path.Type.Name`).
    pub descriptor: String,
    pub hash: TypeHash,
    pub kind: FuncKind,
    /// Owning type; `None` for package-level functions.
    pub owner: Option<SymbolId>,
    pub receiver: Option<Receiver>,
    pub params: Vec<Param>,
    /// Value results with any failure indicator removed (zero or one entry).
    pub results: Vec<Param>,
    /// The one permissible value result.
    pub ret: Option<SymbolId>,
    /// The callable reports failure through a trailing error result.
    pub has_error: bool,
    pub variadic: bool,
    /// Protocols this callable implements for its owner (`STRINGER` on the text method).
    pub protocols: Protocols,
    pub doc: String,
}

impl Func {
    pub fn is_constructor(&self) -> bool {
        self.kind == FuncKind::Constructor
    }

    pub fn is_method(&self) -> bool {
        self.kind == FuncKind::Method
    }

    pub fn is_package_level(&self) -> bool {
        self.owner.is_none()
    }

    /// Provides its owner's textual representation.
    pub fn is_text_method(&self) -> bool {
        self.protocols.contains(Protocols::STRINGER)
    }

    /// Zero-argument, single non-error result.
    pub fn is_nullary_getter_shape(&self) -> bool {
        self.params.is_empty() && self.results.len() == 1 && !self.has_error
    }

    /// Symbols of the parameters, in order.
    pub fn param_symbols(&self) -> Vec<SymbolId> {
        self.params.iter().map(|p| p.symbol).collect()
    }

    /// Create a synthesized accessor callable.
    #[allow(clippy::too_many_arguments)]
    pub fn synthesized(
        kind: FuncKind,
        name: impl Into<String>,
        id: impl Into<String>,
        descriptor: impl Into<String>,
        owner: Option<SymbolId>,
        params: Vec<Param>,
        ret: Option<SymbolId>,
        doc: impl Into<String>,
    ) -> Self {
        let id = id.into();
        let hash = TypeHash::from_accessor(owner.unwrap_or(TypeHash::EMPTY), &id);
        let results = ret.map(|r| vec![Param::new("ret", r)]).unwrap_or_default();
        Self {
            name: name.into(),
            id,
            descriptor: descriptor.into(),
            hash,
            kind,
            owner,
            receiver: None,
            params,
            results,
            ret,
            has_error: false,
            variadic: false,
            protocols: Protocols::empty(),
            doc: doc.into(),
        }
    }
}
