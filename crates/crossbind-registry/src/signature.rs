//! SignatureAnalyzer - raw signatures to normalized call contracts.
//!
//! Result arity:
//!
//! - no results: no value, no error
//! - `error`: error-only
//! - `T`: value `T`
//! - `(T, error)`: value `T` with error convention
//! - `(T, U)` where `U` is not `error`: rejected
//! - three or more: rejected

use tracing::trace;

use crossbind_core::{
    BasicKind, ClassifyError, ClassifyResult, DocIndex, Func, FuncKind, PackageDecl, Param,
    Protocols, QualifiedName, Receiver, SignatureDecl, SourceType, SymbolId, SymbolLookup,
    TypeHash,
};

use crate::SymbolTable;

/// Where a callable is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    /// Package-level function.
    Package,
    /// Method on a named type.
    Method {
        /// Simple name of the owning type.
        type_name: &'a str,
        owner: SymbolId,
        pointer: bool,
    },
}

impl Scope<'_> {
    /// Scope name used for documentation lookup ("" at package level).
    pub fn doc_scope(&self) -> &str {
        match self {
            Scope::Package => "",
            Scope::Method { type_name, .. } => *type_name,
        }
    }
}

/// Normalizes callables of one package.
pub struct SignatureAnalyzer<'a> {
    package: &'a str,
    import_path: &'a str,
    docs: &'a DocIndex,
    text_method: &'a str,
}

impl<'a> SignatureAnalyzer<'a> {
    pub fn new(decl: &'a PackageDecl, docs: &'a DocIndex, text_method: &'a str) -> Self {
        Self {
            package: &decl.name,
            import_path: &decl.import_path,
            docs,
            text_method,
        }
    }

    /// Analyze one callable.
    ///
    /// Constituent types are classified into `table` as a side effect.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn analyze(
        &self,
        table: &mut SymbolTable,
        name: &str,
        sig: &SignatureDecl,
        scope: Scope<'_>,
    ) -> ClassifyResult<Func> {
        let callable = self.callable_name(name, scope);

        let (value, has_error) = match sig.results.as_slice() {
            [] => (None, false),
            [only] if only.ty.is_error() => (None, true),
            [only] => (Some(only), false),
            [first, second] => {
                if !second.ty.is_error() {
                    return Err(ClassifyError::SecondResultNotError {
                        callable,
                        found: second.ty.to_string(),
                    });
                }
                (Some(first), true)
            }
            more => {
                return Err(ClassifyError::TooManyResults {
                    callable,
                    count: more.len(),
                });
            }
        };

        let mut params = Vec::with_capacity(sig.params.len());
        for (i, p) in sig.params.iter().enumerate() {
            let symbol = table.classify(&p.ty, &callable)?;
            let pname = if p.name.is_empty() {
                format!("arg_{i}")
            } else {
                p.name.clone()
            };
            params.push(Param::new(pname, symbol));
        }

        let mut results = Vec::new();
        let mut ret = None;
        if let Some(v) = value {
            let symbol = table.classify(&v.ty, &callable)?;
            let rname = if v.name.is_empty() { "ret" } else { v.name.as_str() };
            results.push(Param::new(rname, symbol));
            ret = Some(symbol);
        }

        let param_hashes: Vec<TypeHash> = params.iter().map(|p| p.symbol).collect();
        let (id, descriptor, hash, kind, owner, receiver) = match scope {
            Scope::Package => (
                QualifiedName::new(self.package, name).mangled(),
                format!("{}.{name}", self.import_path),
                TypeHash::from_function(&QualifiedName::new(self.package, name).to_string(), &param_hashes),
                FuncKind::Function,
                None,
                None,
            ),
            Scope::Method {
                type_name,
                owner,
                pointer,
            } => (
                QualifiedName::new(self.package, format!("{type_name}_{name}")).mangled(),
                format!("{}.{type_name}.{name}", self.import_path),
                TypeHash::from_method(owner, name, &param_hashes),
                FuncKind::Method,
                Some(owner),
                Some(Receiver {
                    symbol: owner,
                    pointer,
                }),
            ),
        };

        let doc = documented_signature(name, sig, self.docs.lookup(scope.doc_scope(), name));
        trace!(%id, has_error, "analyzed callable");

        Ok(Func {
            name: name.to_string(),
            id,
            descriptor,
            hash,
            kind,
            owner,
            receiver,
            params,
            results,
            ret,
            has_error,
            variadic: sig.variadic,
            protocols: Protocols::empty(),
            doc,
        })
    }

    /// Check whether a method provides the type's textual representation.
    ///
    /// The method must be named after the configured text method, take no
    /// arguments and return exactly one string.
    pub fn is_text_method(&self, table: &SymbolTable, func: &Func) -> bool {
        func.name == self.text_method
            && func.is_nullary_getter_shape()
            && func
                .ret
                .and_then(|r| table.symbol(r))
                .and_then(|s| s.basic_kind())
                == Some(BasicKind::String)
    }

    /// Name used in error messages (`pkg.Name` or `pkg.Type.Name`).
    fn callable_name(&self, name: &str, scope: Scope<'_>) -> String {
        match scope {
            Scope::Package => format!("{}.{name}", self.package),
            Scope::Method { type_name, .. } => format!("{}.{type_name}.{name}", self.package),
        }
    }
}

/// Prefix a doc string with the rendered signature line.
///
/// `Name(type name, ...) results`, then a blank line and the doc text.
pub fn documented_signature(name: &str, sig: &SignatureDecl, doc: &str) -> String {
    let params: Vec<String> = sig
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let last = i + 1 == sig.params.len();
            let ty = match (&p.ty, sig.variadic && last) {
                (SourceType::Slice(elem), true) => format!("...{elem}"),
                (ty, _) => ty.to_string(),
            };
            if p.name.is_empty() { ty } else { format!("{ty} {}", p.name) }
        })
        .collect();

    let results: Vec<String> = sig.results.iter().map(|r| r.ty.to_string()).collect();
    let results = match results.len() {
        0 => String::new(),
        1 => format!(" {}", results[0]),
        _ => format!(" ({})", results.join(", ")),
    };

    let line = format!("{name}({}){results}", params.join(", "));
    if doc.is_empty() {
        line
    } else {
        format!("{line}\n\n{doc}")
    }
}
