//! SymbolTable - canonical registry of classified types.
//!
//! One [`Symbol`] exists per distinct source type reachable from the exposed
//! surface, keyed by the hash of its canonical key. Classification is
//! idempotent: asking twice returns the same id.
//!
//! # Cycles
//!
//! A type is registered as a `Pending` placeholder before its constituents are
//! classified. A self-referential type (`type Node struct { Kids []*Node }`)
//! reaches the placeholder on the way down and records its id instead of
//! recursing forever. The placeholder is filled in once the constituents
//! resolve.
//!
//! A named type whose underlying symbol is itself still a placeholder
//! (`type A struct{ Xs []B }; type B A`, visited from `A`) stays pending until
//! the top-level `classify` returns, then takes the settled kind. Only a name
//! that never settles (`type A A`) is an error.
//!
//! # Failure
//!
//! A failed top-level `classify` rolls back every symbol it inserted, so the
//! table never holds placeholders or symbols that point at them.
//!
//! # Example
//!
//! ```
//! use crossbind_core::{BasicKind, SourceType, SymbolLookup, WireRepr, CType};
//! use crossbind_registry::SymbolTable;
//!
//! let mut table = SymbolTable::new(8);
//! let id = table.classify(&SourceType::slice(SourceType::basic(BasicKind::Float64)), "main.Sum").unwrap();
//! assert_eq!(table.get(id).unwrap().id, "slice_float64");
//! assert_eq!(table.wire_repr(id), WireRepr::Handle);
//!
//! let int = table.classify(&SourceType::basic(BasicKind::Int), "main.Sum").unwrap();
//! assert_eq!(table.wire_repr(int), WireRepr::Value(CType::Int64));
//! ```

use rustc_hash::FxHashMap;
use tracing::trace;

use crossbind_core::{
    ClassifyError, ClassifyResult, FieldSymbol, Protocols, QualifiedName, SourceType, Symbol,
    SymbolId, SymbolKind, SymbolLookup, TypeHash, is_exported,
};

/// A named type the classifier can resolve `Named` references against.
#[derive(Debug, Clone)]
struct NamedDecl {
    underlying: SourceType,
    doc: String,
}

/// Outcome of resolving a type's constituents.
struct Resolved {
    kind: SymbolKind,
    named: Option<QualifiedName>,
    underlying: Option<SymbolId>,
    doc: String,
}

/// Registry of classified symbols for one generation run.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    // === Classified symbols ===
    symbols: FxHashMap<SymbolId, Symbol>,
    /// Insertion order, used to roll back a failed classification.
    order: Vec<SymbolId>,

    // === Resolution inputs ===
    named: FxHashMap<QualifiedName, NamedDecl>,

    word_size: u8,
}

impl SymbolTable {
    /// Create an empty table for the given platform word size (4 or 8 bytes).
    pub fn new(word_size: u8) -> Self {
        Self {
            symbols: FxHashMap::default(),
            order: Vec::new(),
            named: FxHashMap::default(),
            word_size,
        }
    }

    // ==========================================================================
    // Named type declarations
    // ==========================================================================

    /// Make a named type resolvable.
    ///
    /// Declaring the same name twice is a [`ClassifyError::DuplicateDeclaration`].
    pub fn declare_named(
        &mut self,
        name: QualifiedName,
        underlying: SourceType,
        doc: impl Into<String>,
    ) -> ClassifyResult<()> {
        if self.named.contains_key(&name) {
            return Err(ClassifyError::DuplicateDeclaration {
                name: name.to_string(),
            });
        }
        self.named.insert(
            name,
            NamedDecl {
                underlying,
                doc: doc.into(),
            },
        );
        Ok(())
    }

    /// Check if a named type has been declared.
    pub fn is_declared(&self, name: &QualifiedName) -> bool {
        self.named.contains_key(name)
    }

    // ==========================================================================
    // Classification
    // ==========================================================================

    /// Classify a type, returning the id of its canonical symbol.
    ///
    /// `decl` names the declaration the type appears in and is carried into
    /// any error.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn classify(&mut self, ty: &SourceType, decl: &str) -> ClassifyResult<SymbolId> {
        let mark = self.order.len();
        let result = match self.classify_inner(ty, decl) {
            Ok(id) => self.settle_deferred(mark, decl).map(|()| id),
            Err(err) => Err(err),
        };
        if result.is_err() {
            for id in self.order.drain(mark..) {
                self.symbols.remove(&id);
            }
        }
        result
    }

    /// Classify a type and return the symbol itself.
    pub fn classify_symbol(&mut self, ty: &SourceType, decl: &str) -> ClassifyResult<&Symbol> {
        let id = self.classify(ty, decl)?;
        Ok(&self.symbols[&id])
    }

    fn classify_inner(&mut self, ty: &SourceType, decl: &str) -> ClassifyResult<SymbolId> {
        let key = ty.canonical_key();
        let hash = TypeHash::from_name(&key);
        if self.symbols.contains_key(&hash) {
            return Ok(hash);
        }

        reject_unsupported(ty, decl)?;

        self.insert(Symbol::pending(hash, ty.mangled(), key));
        let resolved = self.resolve(ty, decl)?;

        if let Some(sym) = self.symbols.get_mut(&hash) {
            sym.kind = resolved.kind;
            sym.protocols = sym.container_protocols();
            sym.named = resolved.named;
            sym.underlying = resolved.underlying;
            sym.doc = resolved.doc;
            trace!(id = %sym.id, display = %sym.display_name, "classified symbol");
        }
        Ok(hash)
    }

    /// Fill named symbols whose underlying shape was still a placeholder when
    /// they were first reached.
    fn settle_deferred(&mut self, mark: usize, decl: &str) -> ClassifyResult<()> {
        loop {
            let mut settled = Vec::new();
            for id in &self.order[mark..] {
                let Some(sym) = self.symbols.get(id) else {
                    continue;
                };
                let Some(under) = sym.underlying.filter(|_| sym.is_pending()) else {
                    continue;
                };
                if let Some(target) = self.symbols.get(&under).filter(|t| !t.is_pending()) {
                    settled.push((*id, target.kind.clone()));
                }
            }
            if settled.is_empty() {
                break;
            }
            for (id, kind) in settled {
                if let Some(sym) = self.symbols.get_mut(&id) {
                    sym.kind = kind;
                    sym.protocols = sym.container_protocols();
                    trace!(id = %sym.id, "settled deferred named type");
                }
            }
        }

        let stuck = self.order[mark..]
            .iter()
            .filter_map(|id| self.symbols.get(id))
            .find(|sym| sym.is_pending());
        match stuck {
            Some(sym) => Err(ClassifyError::UnsupportedType {
                decl: decl.to_string(),
                ty: sym.display_name.clone(),
                reason: "named type is defined in terms of itself",
            }),
            None => Ok(()),
        }
    }

    /// Classify the constituents of a type and build its kind.
    fn resolve(&mut self, ty: &SourceType, decl: &str) -> ClassifyResult<Resolved> {
        let kind = match ty {
            SourceType::Named(name) => return self.resolve_named(name, decl),
            SourceType::TypeParam(_) => {
                return Err(ClassifyError::UnsupportedType {
                    decl: decl.to_string(),
                    ty: ty.to_string(),
                    reason: "generic type parameters cannot be classified",
                });
            }
            SourceType::Basic(basic) => SymbolKind::Basic { basic: *basic },
            SourceType::Error => SymbolKind::Error,
            SourceType::Interface { .. } => SymbolKind::Interface,
            SourceType::Pointer(elem) => SymbolKind::Pointer {
                elem: self.classify_inner(elem, decl)?,
            },
            SourceType::Slice(elem) => SymbolKind::Slice {
                elem: self.classify_inner(elem, decl)?,
            },
            SourceType::Array { len, elem } => SymbolKind::Array {
                len: *len,
                elem: self.classify_inner(elem, decl)?,
            },
            SourceType::Map { key, value } => SymbolKind::Map {
                key: self.classify_inner(key, decl)?,
                value: self.classify_inner(value, decl)?,
            },
            SourceType::Struct(fields) => {
                let mut out = Vec::new();
                for (i, field) in fields.iter().enumerate() {
                    if !is_exported(&field.name) {
                        continue;
                    }
                    let symbol = self.classify_inner(&field.ty, decl)?;
                    out.push(FieldSymbol {
                        name: field.name.clone(),
                        symbol,
                        index: i + 1,
                        doc: field.doc.clone(),
                        embedded: field.embedded,
                    });
                }
                SymbolKind::Struct { fields: out }
            }
            SourceType::Signature(sig) => {
                let mut params = Vec::with_capacity(sig.params.len());
                for p in &sig.params {
                    params.push(self.classify_inner(&p.ty, decl)?);
                }
                let mut results = Vec::with_capacity(sig.results.len());
                for r in &sig.results {
                    results.push(self.classify_inner(&r.ty, decl)?);
                }
                SymbolKind::Signature {
                    params,
                    results,
                    variadic: sig.variadic,
                }
            }
        };
        Ok(Resolved {
            kind,
            named: None,
            underlying: None,
            doc: String::new(),
        })
    }

    /// A named type takes the kind of its underlying shape.
    fn resolve_named(&mut self, name: &QualifiedName, decl: &str) -> ClassifyResult<Resolved> {
        let Some(target) = self.named.get(name).cloned() else {
            return Err(ClassifyError::UnknownNamedType {
                decl: decl.to_string(),
                name: name.to_string(),
            });
        };
        let under = self.classify_inner(&target.underlying, decl)?;
        // a pending underlying is settled once the top-level classify unwinds
        let kind = match self.symbols.get(&under) {
            Some(sym) if !sym.is_pending() => sym.kind.clone(),
            _ => SymbolKind::Pending,
        };
        Ok(Resolved {
            kind,
            named: Some(name.clone()),
            underlying: Some(under),
            doc: target.doc,
        })
    }

    /// Record protocols found after classification (a text method on a bound type).
    pub(crate) fn add_protocols(&mut self, id: SymbolId, protocols: Protocols) {
        if let Some(sym) = self.symbols.get_mut(&id) {
            sym.protocols |= protocols;
        }
    }

    fn insert(&mut self, sym: Symbol) {
        self.order.push(sym.hash);
        self.symbols.insert(sym.hash, sym);
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Get a symbol by id.
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(&id)
    }

    /// Look up an already classified type without classifying it.
    pub fn lookup(&self, ty: &SourceType) -> Option<&Symbol> {
        self.symbols.get(&TypeHash::from_name(&ty.canonical_key()))
    }

    /// Look up the symbol of a classified named type.
    pub fn lookup_named(&self, name: &QualifiedName) -> Option<&Symbol> {
        self.symbols.get(&name.to_type_hash())
    }

    /// All symbols, sorted by display name.
    pub fn names(&self) -> Vec<&Symbol> {
        let mut out: Vec<&Symbol> = self.symbols.values().collect();
        out.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        out
    }

    /// Iterate symbols in classification order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.order.iter().filter_map(|id| self.symbols.get(id))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl SymbolLookup for SymbolTable {
    fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(&id)
    }

    fn word_size(&self) -> u8 {
        self.word_size
    }
}

fn reject_unsupported(ty: &SourceType, decl: &str) -> ClassifyResult<()> {
    match ty {
        SourceType::Interface { methods } if !methods.is_empty() => {
            Err(ClassifyError::UnsupportedType {
                decl: decl.to_string(),
                ty: ty.to_string(),
                reason: "only the empty interface can cross the boundary",
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbind_core::{
        BasicKind, CType, FieldDecl, InterfaceMethod, ParamDecl, SignatureDecl, WireRepr,
    };

    fn node_table() -> SymbolTable {
        let mut table = SymbolTable::new(8);
        let node = SourceType::named("main", "Node");
        table
            .declare_named(
                QualifiedName::new("main", "Node"),
                SourceType::Struct(vec![
                    FieldDecl::new("Value", SourceType::basic(BasicKind::Int)),
                    FieldDecl::new("Kids", SourceType::slice(SourceType::pointer(node))),
                ]),
                "Node is a tree node.",
            )
            .unwrap();
        table
    }

    #[test]
    fn classify_is_idempotent() {
        let mut table = SymbolTable::new(8);
        let ty = SourceType::map(SourceType::basic(BasicKind::String), SourceType::basic(BasicKind::Int));
        let a = table.classify(&ty, "main.F").unwrap();
        let len = table.len();
        let b = table.classify(&ty, "main.G").unwrap();
        assert_eq!(a, b);
        assert_eq!(table.len(), len);
        assert_eq!(table.get(a).unwrap().id, "map_string_int");
    }

    #[test]
    fn ids_are_stable_across_tables() {
        let ty = SourceType::slice(SourceType::pointer(SourceType::named("main", "Node")));
        let mut first = node_table();
        let mut second = node_table();
        let a = first.classify(&ty, "main.F").unwrap();
        let b = second.classify(&ty, "main.F").unwrap();
        assert_eq!(a, b);
        assert_eq!(first.get(a).unwrap().id, second.get(b).unwrap().id);
        assert_eq!(first.get(a).unwrap().id, "slice_ptr_main_Node");
    }

    #[test]
    fn self_referential_struct_terminates() {
        let mut table = node_table();
        let id = table.classify(&SourceType::named("main", "Node"), "main.Node").unwrap();

        let node = table.get(id).unwrap();
        assert!(node.is_struct());
        assert!(node.is_named());
        assert_eq!(node.doc, "Node is a tree node.");
        assert!(table.iter().all(|s| !s.is_pending()));

        let SymbolKind::Struct { fields } = &node.kind else {
            panic!("expected struct");
        };
        let kids = table.get(fields[1].symbol).unwrap();
        assert_eq!(kids.display_name, "[]*main.Node");
        let ptr = table.get(kids.elem().unwrap()).unwrap();
        assert_eq!(ptr.elem(), Some(id));
        assert!(table.needs_wrapping(ptr.hash));
    }

    #[test]
    fn unexported_fields_are_skipped_but_indexed() {
        let mut table = SymbolTable::new(8);
        let ty = SourceType::Struct(vec![
            FieldDecl::new("hidden", SourceType::basic(BasicKind::Bool)),
            FieldDecl::new("Shown", SourceType::basic(BasicKind::Int)),
        ]);
        let sym = table.classify_symbol(&ty, "main.T").unwrap();
        let SymbolKind::Struct { fields } = &sym.kind else {
            panic!("expected struct");
        };
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "Shown");
        assert_eq!(fields[0].index, 2);
    }

    #[test]
    fn embedded_fields_keep_their_flag() {
        let mut table = SymbolTable::new(8);
        table
            .declare_named(QualifiedName::new("main", "Base"), SourceType::Struct(vec![]), "")
            .unwrap();
        let ty = SourceType::Struct(vec![
            FieldDecl::embed("Base", SourceType::named("main", "Base")),
            FieldDecl::new("Age", SourceType::basic(BasicKind::Int)),
        ]);
        let sym = table.classify_symbol(&ty, "main.T").unwrap();
        let SymbolKind::Struct { fields } = &sym.kind else {
            panic!("expected struct");
        };
        assert!(fields[0].embedded);
        assert_eq!(fields[0].name, "Base");
        assert!(!fields[1].embedded);
    }

    #[test]
    fn named_alias_of_basic_crosses_by_value() {
        let mut table = SymbolTable::new(4);
        table
            .declare_named(QualifiedName::new("main", "Celsius"), SourceType::basic(BasicKind::Int), "")
            .unwrap();
        let id = table.classify(&SourceType::named("main", "Celsius"), "main.Temp").unwrap();
        let sym = table.get(id).unwrap();
        assert!(sym.is_basic());
        assert!(sym.is_named());
        assert!(sym.is_type());
        assert_eq!(table.wire_repr(id), WireRepr::Value(CType::Int32));
    }

    #[test]
    fn empty_interface_is_a_handle() {
        let mut table = SymbolTable::new(8);
        let id = table.classify(&SourceType::empty_interface(), "main.Any").unwrap();
        assert_eq!(table.get(id).unwrap().id, "iface");
        assert!(table.wire_repr(id).is_handle());
    }

    #[test]
    fn rejects_unsupported_shapes() {
        let mut table = SymbolTable::new(8);
        let err = table
            .classify(&SourceType::slice(SourceType::TypeParam("T".into())), "main.Generic")
            .unwrap_err();
        assert!(matches!(err, ClassifyError::UnsupportedType { ref decl, .. } if decl == "main.Generic"));

        let stringer = SourceType::Interface {
            methods: vec![InterfaceMethod {
                name: "String".into(),
                signature: SignatureDecl::new(vec![], vec![ParamDecl::unnamed(SourceType::basic(BasicKind::String))]),
            }],
        };
        assert!(table.classify(&stringer, "main.Show").is_err());
    }

    #[test]
    fn failed_classification_rolls_back() {
        let mut table = SymbolTable::new(8);
        let ty = SourceType::map(
            SourceType::basic(BasicKind::String),
            SourceType::slice(SourceType::named("other", "Missing")),
        );
        let err = table.classify(&ty, "main.Lookup").unwrap_err();
        assert_eq!(
            err,
            ClassifyError::UnknownNamedType {
                decl: "main.Lookup".into(),
                name: "other.Missing".into()
            }
        );
        assert!(table.is_empty());
    }

    #[test]
    fn recursive_named_type_is_rejected() {
        let mut table = SymbolTable::new(8);
        table
            .declare_named(QualifiedName::new("main", "A"), SourceType::named("main", "A"), "")
            .unwrap();
        assert!(table.classify(&SourceType::named("main", "A"), "main.A").is_err());
        assert!(table.is_empty());
    }

    fn mutual_pair() -> SymbolTable {
        let mut table = SymbolTable::new(8);
        table
            .declare_named(
                QualifiedName::new("main", "A"),
                SourceType::Struct(vec![FieldDecl::new("Xs", SourceType::slice(SourceType::named("main", "B")))]),
                "",
            )
            .unwrap();
        table
            .declare_named(QualifiedName::new("main", "B"), SourceType::named("main", "A"), "")
            .unwrap();
        table
    }

    #[test]
    fn named_alias_of_pending_type_settles() {
        let mut table = mutual_pair();
        let a = table.classify(&SourceType::named("main", "A"), "main.A").unwrap();
        let b = table.lookup_named(&QualifiedName::new("main", "B")).unwrap();
        assert!(b.is_struct());
        assert_eq!(b.underlying, Some(a));
        assert_eq!(b.kind, table.get(a).unwrap().kind);
        assert!(table.iter().all(|s| !s.is_pending()));
        assert!(table.needs_wrapping(b.hash));
    }

    #[test]
    fn visit_order_does_not_change_symbols() {
        let mut from_a = mutual_pair();
        from_a.classify(&SourceType::named("main", "A"), "main.A").unwrap();
        from_a.classify(&SourceType::named("main", "B"), "main.B").unwrap();

        let mut from_b = mutual_pair();
        from_b.classify(&SourceType::named("main", "B"), "main.B").unwrap();
        from_b.classify(&SourceType::named("main", "A"), "main.A").unwrap();

        assert_eq!(from_a.names(), from_b.names());
    }

    #[test]
    fn mutual_aliases_are_rejected() {
        let mut table = SymbolTable::new(8);
        table
            .declare_named(QualifiedName::new("main", "A"), SourceType::named("main", "B"), "")
            .unwrap();
        table
            .declare_named(QualifiedName::new("main", "B"), SourceType::named("main", "A"), "")
            .unwrap();
        let err = table.classify(&SourceType::named("main", "A"), "main.A").unwrap_err();
        assert!(matches!(err, ClassifyError::UnsupportedType { .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn duplicate_named_declaration() {
        let mut table = SymbolTable::new(8);
        let name = QualifiedName::new("main", "T");
        table.declare_named(name.clone(), SourceType::basic(BasicKind::Int), "").unwrap();
        let err = table
            .declare_named(name, SourceType::basic(BasicKind::Bool), "")
            .unwrap_err();
        assert_eq!(err, ClassifyError::DuplicateDeclaration { name: "main.T".into() });
    }

    #[test]
    fn names_sorted_by_display_name() {
        let mut table = SymbolTable::new(8);
        table.classify(&SourceType::basic(BasicKind::String), "x").unwrap();
        table.classify(&SourceType::slice(SourceType::basic(BasicKind::Bool)), "x").unwrap();
        table.classify(&SourceType::basic(BasicKind::Bool), "x").unwrap();
        let names: Vec<_> = table.names().iter().map(|s| s.display_name.as_str()).collect();
        assert_eq!(names, vec!["[]bool", "bool", "string"]);
    }

    #[test]
    fn signature_symbols_record_constituents() {
        let mut table = SymbolTable::new(8);
        let sig = SourceType::Signature(SignatureDecl::new(
            vec![ParamDecl::new("x", SourceType::basic(BasicKind::Float64))],
            vec![ParamDecl::unnamed(SourceType::Error)],
        ));
        let id = table.classify(&sig, "main.Apply").unwrap();
        let sym = table.get(id).unwrap();
        assert!(sym.is_signature());
        assert!(table.lookup(&SourceType::Error).unwrap().is_error());
        assert!(table.wire_repr(id).is_handle());
    }
}
