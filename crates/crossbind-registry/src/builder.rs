//! PackageBuilder - assembles classified symbols and callables into a [`Package`].
//!
//! The build runs in two phases:
//!
//! 1. Classify every exported type (and its pointer), its methods, and every
//!    exported free function.
//! 2. Promote constructors: a free function whose value result is a bound
//!    type moves into that type's constructor list. This has to wait for
//!    phase 1 because a constructor may be declared before its type.
//!
//! Constants and variables are classified last and get synthesized
//! getter/setter callables.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, warn};

use crossbind_core::{
    BasicKind, BoundField, BoundType, ClassifyError, ClassifyResult, Const, DocIndex, Func,
    FuncKind, PackageDecl, Param, Protocols, QualifiedName, SourceType, SymbolId, SymbolKind,
    TypeDecl, TypeHash, Var, is_exported,
};

use crate::{Package, Scope, SignatureAnalyzer, SymbolTable};

/// Knobs that change the built model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Byte width of `int`/`uint`/`uintptr` on the wire (4 or 8).
    pub word_size: u8,
    /// Name of the method that provides a type's textual representation.
    pub text_method: String,
    /// Fail when two constructors of one type share a parameter list.
    pub reject_ambiguous_constructors: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            word_size: 8,
            text_method: "String".to_string(),
            reject_ambiguous_constructors: true,
        }
    }
}

/// Builds a [`Package`] from provider declarations.
///
/// # Example
///
/// ```
/// use crossbind_core::PackageDecl;
/// use crossbind_registry::{BuildOptions, PackageBuilder};
///
/// let decl = PackageDecl::new("empty");
/// let pkg = PackageBuilder::new(&decl, BuildOptions::default()).build().unwrap();
/// assert!(pkg.is_empty());
/// assert!(pkg.entities().is_empty());
/// ```
pub struct PackageBuilder<'a> {
    decl: &'a PackageDecl,
    options: BuildOptions,
}

impl<'a> PackageBuilder<'a> {
    pub fn new(decl: &'a PackageDecl, options: BuildOptions) -> Self {
        Self { decl, options }
    }

    /// Run the whole pipeline. Any classification error aborts the build.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(self) -> ClassifyResult<Package> {
        let decl = self.decl;
        check_duplicates(decl)?;

        let mut table = SymbolTable::new(self.options.word_size);
        for t in &decl.types {
            table.declare_named(decl.qualify(&t.name), t.underlying.clone(), t.doc.clone())?;
        }
        for ext in &decl.external_types {
            table.declare_named(ext.name.clone(), ext.underlying.clone(), "")?;
        }

        let docs = DocIndex::from_package(decl);
        let analyzer = SignatureAnalyzer::new(decl, &docs, &self.options.text_method);

        // Phase 1: types, methods, free functions.
        let mut types = Vec::new();
        for t in sorted_exported(&decl.types, |t| &t.name) {
            types.push(self.bind_type(&mut table, &analyzer, t)?);
        }

        let mut candidates = Vec::new();
        for f in sorted_exported(&decl.funcs, |f| &f.name) {
            candidates.push(analyzer.analyze(&mut table, &f.name, &f.signature, Scope::Package)?);
        }

        // Phase 2: constructor promotion.
        let funcs = self.promote_constructors(&mut types, candidates)?;

        let mut consts = Vec::new();
        for c in sorted_exported(&decl.consts, |c| &c.name) {
            let name = decl.qualify(&c.name);
            let symbol = table.classify(&c.ty, &name.to_string())?;
            let id = name.mangled();
            let doc = docs.lookup("", &c.name).to_string();
            let getter = Func::synthesized(
                FuncKind::Getter,
                c.name.clone(),
                format!("{id}_get"),
                format!("{}.{}", decl.import_path, c.name),
                None,
                Vec::new(),
                Some(symbol),
                doc.clone(),
            );
            consts.push(Const {
                name: c.name.clone(),
                id,
                symbol,
                doc,
                value: c.value.clone(),
                getter,
            });
        }

        let mut vars = Vec::new();
        for v in sorted_exported(&decl.vars, |v| &v.name) {
            let name = decl.qualify(&v.name);
            let symbol = table.classify(&v.ty, &name.to_string())?;
            let id = name.mangled();
            let doc = docs.lookup("", &v.name).to_string();
            let descriptor = format!("{}.{}", decl.import_path, v.name);
            let getter = Func::synthesized(
                FuncKind::Getter,
                v.name.clone(),
                format!("{id}_get"),
                descriptor.clone(),
                None,
                Vec::new(),
                Some(symbol),
                doc.clone(),
            );
            let setter = Func::synthesized(
                FuncKind::Setter,
                v.name.clone(),
                format!("{id}_set"),
                descriptor,
                None,
                vec![Param::new("val", symbol)],
                None,
                doc.clone(),
            );
            vars.push(Var {
                name: v.name.clone(),
                id,
                symbol,
                doc,
                getter,
                setter,
            });
        }

        info!(
            package = %decl.name,
            symbols = table.len(),
            types = types.len(),
            funcs = funcs.len(),
            consts = consts.len(),
            vars = vars.len(),
            "built package"
        );

        Ok(Package {
            text_method: self.options.text_method.clone(),
            name: decl.name.clone(),
            import_path: decl.import_path.clone(),
            doc: decl.doc.clone(),
            symbols: table,
            types,
            funcs,
            consts,
            vars,
        })
    }

    /// Classify one exported type with its pointer, methods and fields.
    fn bind_type(
        &self,
        table: &mut SymbolTable,
        analyzer: &SignatureAnalyzer<'_>,
        t: &TypeDecl,
    ) -> ClassifyResult<BoundType> {
        let decl = self.decl;
        let name = decl.qualify(&t.name);
        let display = name.to_string();
        let named = SourceType::Named(name.clone());

        let symbol = table.classify(&named, &display)?;
        let pointer_symbol = table.classify(&SourceType::pointer(named), &display)?;
        let string = table.classify(&SourceType::basic(BasicKind::String), &display)?;

        let Some(sym) = table.get(symbol) else {
            return Err(ClassifyError::UnknownNamedType {
                decl: display,
                name: name.to_string(),
            });
        };
        let id = sym.id.clone();
        let is_struct = sym.is_struct();
        let mut protocols = sym.container_protocols();
        let fields: Vec<BoundField> = match &sym.kind {
            SymbolKind::Struct { fields } => fields
                .iter()
                .map(|f| BoundField {
                    name: f.name.clone(),
                    symbol: f.symbol,
                    index: f.index,
                    doc: f.doc.clone(),
                    embedded: f.embedded,
                    getter_id: format!("{id}_getter_{}", f.index),
                    setter_id: format!("{id}_setter_{}", f.index),
                })
                .collect(),
            _ => Vec::new(),
        };

        // The method set of *T covers both value and pointer receivers.
        // Promoted methods of embedded fields arrive already listed in `t.methods`.
        let mut methods = Vec::new();
        let mut text_fn = None;
        for m in sorted_exported(&t.methods, |m| &m.name) {
            let scope = Scope::Method {
                type_name: &t.name,
                owner: symbol,
                pointer: m.pointer_receiver,
            };
            let mut func = analyzer.analyze(table, &m.name, &m.signature, scope)?;
            if analyzer.is_text_method(table, &func) {
                func.protocols |= Protocols::STRINGER;
                protocols |= Protocols::STRINGER;
                text_fn = Some(func.id.clone());
            }
            methods.push(func);
        }
        table.add_protocols(symbol, protocols);

        let descriptor = |member: &str| format!("{}.{}.{member}", decl.import_path, t.name);
        let new_fn = Func::synthesized(
            FuncKind::New,
            "new",
            format!("{id}_new"),
            descriptor("new"),
            Some(symbol),
            Vec::new(),
            Some(symbol),
            format!("{}() {display}\n\nnew returns a zero value of {display}.", t.name),
        );
        let str_doc = match &text_fn {
            Some(text) => {
                format!("str returns the textual representation of {display} from {text}.")
            }
            None => format!("str returns a debug rendering of {display}."),
        };
        let str_fn = Func::synthesized(
            FuncKind::Str,
            "str",
            format!("{id}_str"),
            descriptor("str"),
            Some(symbol),
            vec![Param::new("self", symbol)],
            Some(string),
            str_doc,
        );

        debug!(
            %id,
            methods = methods.len(),
            fields = fields.len(),
            protocols = ?protocols,
            "bound type"
        );

        Ok(BoundType {
            name,
            symbol,
            pointer_symbol,
            id,
            doc: t.doc.clone(),
            is_struct,
            ctors: Vec::new(),
            methods,
            fields,
            protocols,
            text_fn,
            new_fn,
            str_fn,
        })
    }

    /// Move free functions returning a bound type into its constructor list.
    fn promote_constructors(
        &self,
        types: &mut [BoundType],
        candidates: Vec<Func>,
    ) -> ClassifyResult<Vec<Func>> {
        let by_symbol: FxHashMap<SymbolId, usize> =
            types.iter().enumerate().map(|(i, t)| (t.symbol, i)).collect();

        let mut free = Vec::new();
        for mut func in candidates {
            let Some(index) = func.ret.and_then(|ret| by_symbol.get(&ret).copied()) else {
                free.push(func);
                continue;
            };
            let owner = &mut types[index];

            let params = func.param_symbols();
            if let Some(existing) = owner
                .ctors
                .iter()
                .find(|c| c.param_symbols() == params && c.variadic == func.variadic)
            {
                if self.options.reject_ambiguous_constructors {
                    return Err(ClassifyError::AmbiguousConstructor {
                        type_name: owner.name.to_string(),
                        first: existing.name.clone(),
                        second: func.name.clone(),
                    });
                }
                warn!(
                    type_name = %owner.name,
                    first = %existing.name,
                    second = %func.name,
                    "ambiguous constructor left as a free function"
                );
                free.push(func);
                continue;
            }

            debug!(ctor = %func.id, owner = %owner.id, "promoted constructor");
            func.kind = FuncKind::Constructor;
            func.owner = Some(owner.symbol);
            func.hash = TypeHash::from_constructor(owner.symbol, &func.name, &params);
            owner.ctors.push(func);
        }
        Ok(free)
    }
}

/// Exported declarations sorted by name.
fn sorted_exported<T>(items: &[T], name: impl Fn(&T) -> &String) -> Vec<&T> {
    let mut out: Vec<&T> = items.iter().filter(|i| is_exported(name(*i))).collect();
    out.sort_by(|a, b| name(*a).cmp(name(*b)));
    out
}

/// Reject two package-level declarations, or two methods of one type, with the same name.
fn check_duplicates(decl: &PackageDecl) -> ClassifyResult<()> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let names = decl
        .consts
        .iter()
        .map(|c| c.name.as_str())
        .chain(decl.vars.iter().map(|v| v.name.as_str()))
        .chain(decl.funcs.iter().map(|f| f.name.as_str()))
        .chain(decl.types.iter().map(|t| t.name.as_str()));
    for name in names {
        if !seen.insert(name) {
            return Err(ClassifyError::DuplicateDeclaration {
                name: decl.qualify(name).to_string(),
            });
        }
    }

    for t in &decl.types {
        let mut methods: FxHashSet<&str> = FxHashSet::default();
        for m in &t.methods {
            if !methods.insert(m.name.as_str()) {
                return Err(ClassifyError::DuplicateDeclaration {
                    name: QualifiedName::new(decl.name.clone(), format!("{}.{}", t.name, m.name)).to_string(),
                });
            }
        }
    }
    Ok(())
}
