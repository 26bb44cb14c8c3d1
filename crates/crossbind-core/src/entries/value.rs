//! Package-level constants and variables.

use serde::Serialize;

use crate::{Func, SymbolId};

/// An exported constant, readable through its getter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Const {
    pub name: String,
    pub id: String,
    pub symbol: SymbolId,
    pub doc: String,
    /// Source rendering of the value, when the provider supplied it.
    pub value: Option<String>,
    pub getter: Func,
}

/// An exported variable, accessible through a getter/setter pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Var {
    pub name: String,
    pub id: String,
    pub symbol: SymbolId,
    pub doc: String,
    pub getter: Func,
    pub setter: Func,
}
