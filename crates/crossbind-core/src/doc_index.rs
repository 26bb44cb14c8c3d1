//! Documentation lookup keyed by (owning scope, member name).

use rustc_hash::FxHashMap;

use crate::PackageDecl;

/// Read-only documentation index built from the provider's declarations.
///
/// The scope is the owning type's simple name, or the empty string for
/// package-level members. A missing entry resolves to an empty string.
#[derive(Debug, Clone, Default)]
pub struct DocIndex {
    entries: FxHashMap<(String, String), String>,
}

impl DocIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every documented declaration of a package.
    pub fn from_package(pkg: &PackageDecl) -> Self {
        let mut index = Self::new();
        for c in &pkg.consts {
            index.insert("", &c.name, &c.doc);
        }
        for v in &pkg.vars {
            index.insert("", &v.name, &v.doc);
        }
        for f in &pkg.funcs {
            index.insert("", &f.name, &f.doc);
        }
        for t in &pkg.types {
            index.insert("", &t.name, &t.doc);
            for m in &t.methods {
                index.insert(&t.name, &m.name, &m.doc);
            }
        }
        index
    }

    /// Record a doc string. Empty docs are not stored.
    pub fn insert(&mut self, scope: &str, name: &str, doc: &str) {
        if doc.is_empty() {
            return;
        }
        self.entries
            .insert((scope.to_string(), name.to_string()), doc.to_string());
    }

    /// Look up a member's doc string.
    pub fn lookup(&self, scope: &str, name: &str) -> &str {
        self.entries
            .get(&(scope.to_string(), name.to_string()))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FuncDecl, MethodDecl, SignatureDecl, SourceType, TypeDecl};

    #[test]
    fn missing_doc_is_empty() {
        let index = DocIndex::new();
        assert_eq!(index.lookup("", "Nope"), "");
        assert_eq!(index.lookup("Person", "Nope"), "");
    }

    #[test]
    fn scope_separates_members() {
        let pkg = PackageDecl::new("main")
            .with_func(FuncDecl::new("Len", SignatureDecl::default()).with_doc("free Len"))
            .with_type(
                TypeDecl::new("Person", SourceType::Struct(vec![]))
                    .with_doc("a person")
                    .with_method(MethodDecl::new("Len", SignatureDecl::default()).with_doc("method Len")),
            );
        let index = DocIndex::from_package(&pkg);
        assert_eq!(index.lookup("", "Len"), "free Len");
        assert_eq!(index.lookup("Person", "Len"), "method Len");
        assert_eq!(index.lookup("", "Person"), "a person");
        assert_eq!(index.len(), 3);
    }
}
