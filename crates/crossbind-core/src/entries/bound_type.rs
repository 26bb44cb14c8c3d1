//! Exposed named types with their constructors, methods and fields.

use serde::Serialize;

use crate::{Func, Protocols, QualifiedName, SymbolId};

/// An exported struct field with its accessor ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundField {
    pub name: String,
    pub symbol: SymbolId,
    /// 1-based position among all declared fields.
    pub index: usize,
    pub doc: String,
    /// Declared without a name; bound under its type name.
    pub embedded: bool,
    pub getter_id: String,
    pub setter_id: String,
}

/// An exposed named type.
///
/// Built once per type by the entity builder; emitters reference it by `id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundType {
    pub name: QualifiedName,
    pub symbol: SymbolId,
    /// Symbol of `*T`, whose method set was enumerated.
    pub pointer_symbol: SymbolId,
    pub id: String,
    pub doc: String,
    pub is_struct: bool,
    /// Promoted constructors, in promotion order.
    pub ctors: Vec<Func>,
    /// Exported methods of `*T`, sorted by name.
    pub methods: Vec<Func>,
    /// Exported struct fields (empty for non-struct types).
    pub fields: Vec<BoundField>,
    pub protocols: Protocols,
    /// Id of the method `str_fn` delegates to; `None` falls back to a debug rendering.
    pub text_fn: Option<String>,
    /// Synthesized zero-value constructor.
    pub new_fn: Func,
    /// Synthesized textual representation.
    pub str_fn: Func,
}

impl BoundType {
    pub fn simple_name(&self) -> &str {
        self.name.simple_name()
    }

    pub fn is_stringer(&self) -> bool {
        self.protocols.contains(Protocols::STRINGER)
    }

    /// The method providing the textual representation, if any.
    pub fn text_method(&self) -> Option<&Func> {
        let id = self.text_fn.as_deref()?;
        self.methods.iter().find(|m| m.id == id)
    }

    pub fn find_method(&self, name: &str) -> Option<&Func> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn find_ctor(&self, name: &str) -> Option<&Func> {
        self.ctors.iter().find(|c| c.name == name)
    }

    pub fn find_field(&self, name: &str) -> Option<&BoundField> {
        self.fields.iter().find(|f| f.name == name)
    }
}
