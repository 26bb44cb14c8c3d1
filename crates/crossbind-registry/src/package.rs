//! The fully built, read-only binding model of one package.

use crossbind_core::{BoundType, Const, Func, SymbolId, SymbolLookup, Var, WireRepr};

use crate::SymbolTable;

/// Emission-ready model of one package.
///
/// Produced by [`PackageBuilder`](crate::PackageBuilder); immutable afterwards.
/// Emitters read it and never mutate classification state.
#[derive(Debug, Clone)]
pub struct Package {
    pub(crate) name: String,
    pub(crate) import_path: String,
    pub(crate) doc: String,
    /// Method name recognized as a type's textual representation.
    pub(crate) text_method: String,
    pub(crate) symbols: SymbolTable,
    /// Bound types sorted by name.
    pub(crate) types: Vec<BoundType>,
    /// Free functions left after constructor promotion, sorted by name.
    pub(crate) funcs: Vec<Func>,
    pub(crate) consts: Vec<Const>,
    pub(crate) vars: Vec<Var>,
}

/// One emission-ready entity, in the order emitters must process them.
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    /// A bound named type that is not a struct.
    Type(&'a BoundType),
    Struct(&'a BoundType),
    Constructor { owner: &'a BoundType, func: &'a Func },
    Func(&'a Func),
    Const(&'a Const),
    Var(&'a Var),
}

impl<'a> Entity<'a> {
    /// Generated id of the entity.
    pub fn id(&self) -> &'a str {
        match *self {
            Entity::Type(t) | Entity::Struct(t) => &t.id,
            Entity::Constructor { func, .. } | Entity::Func(func) => &func.id,
            Entity::Const(c) => &c.id,
            Entity::Var(v) => &v.id,
        }
    }
}

impl Package {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn import_path(&self) -> &str {
        &self.import_path
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn text_method(&self) -> &str {
        &self.text_method
    }

    /// The classified symbols.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// All bound types, structs included.
    pub fn types(&self) -> &[BoundType] {
        &self.types
    }

    /// Bound struct types.
    pub fn structs(&self) -> impl Iterator<Item = &BoundType> {
        self.types.iter().filter(|t| t.is_struct)
    }

    pub fn funcs(&self) -> &[Func] {
        &self.funcs
    }

    pub fn consts(&self) -> &[Const] {
        &self.consts
    }

    pub fn vars(&self) -> &[Var] {
        &self.vars
    }

    pub fn find_type(&self, name: &str) -> Option<&BoundType> {
        self.types.iter().find(|t| t.simple_name() == name)
    }

    pub fn find_func(&self, name: &str) -> Option<&Func> {
        self.funcs.iter().find(|f| f.name == name)
    }

    /// Wire representation of a symbol.
    pub fn wire_repr(&self, id: SymbolId) -> WireRepr {
        self.symbols.wire_repr(id)
    }

    /// Check if the package exposes nothing.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.funcs.is_empty() && self.consts.is_empty() && self.vars.is_empty()
    }

    /// Every entity in emission order: types, structs, constructors, free
    /// functions, constants, variables.
    ///
    /// Each entity only references entities that precede it.
    pub fn entities(&self) -> Vec<Entity<'_>> {
        let mut out = Vec::new();
        out.extend(self.types.iter().filter(|t| !t.is_struct).map(Entity::Type));
        out.extend(self.structs().map(Entity::Struct));
        for owner in &self.types {
            out.extend(owner.ctors.iter().map(|func| Entity::Constructor { owner, func }));
        }
        out.extend(self.funcs.iter().map(Entity::Func));
        out.extend(self.consts.iter().map(Entity::Const));
        out.extend(self.vars.iter().map(Entity::Var));
        out
    }
}
