//! Declarations supplied by the upstream provider.
//!
//! Package discovery and documentation extraction happen outside this crate.
//! The provider hands over one [`PackageDecl`] per bound package: every
//! declaration with its name, doc string and fully resolved type.

use serde::{Deserialize, Serialize};

use crate::{QualifiedName, SignatureDecl, SourceType};

/// Check whether a declared name is part of the exported surface.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// A named type declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    /// Underlying shape of the named type.
    pub underlying: SourceType,
    /// Declared methods (value and pointer receivers).
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>, underlying: SourceType) -> Self {
        Self {
            name: name.into(),
            doc: String::new(),
            underlying,
            methods: Vec::new(),
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }
}

/// A method declared on a named type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    /// Declared on `*T` rather than `T`.
    #[serde(default)]
    pub pointer_receiver: bool,
    pub signature: SignatureDecl,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, signature: SignatureDecl) -> Self {
        Self {
            name: name.into(),
            doc: String::new(),
            pointer_receiver: false,
            signature,
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    pub fn on_pointer(mut self) -> Self {
        self.pointer_receiver = true;
        self
    }
}

/// A package-level function declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    pub signature: SignatureDecl,
}

impl FuncDecl {
    pub fn new(name: impl Into<String>, signature: SignatureDecl) -> Self {
        Self {
            name: name.into(),
            doc: String::new(),
            signature,
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }
}

/// A package-level constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstDecl {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    #[serde(rename = "type")]
    pub ty: SourceType,
    /// Source rendering of the constant's value, if known.
    #[serde(default)]
    pub value: Option<String>,
}

impl ConstDecl {
    pub fn new(name: impl Into<String>, ty: SourceType) -> Self {
        Self {
            name: name.into(),
            doc: String::new(),
            ty,
            value: None,
        }
    }
}

/// A package-level variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    #[serde(rename = "type")]
    pub ty: SourceType,
}

impl VarDecl {
    pub fn new(name: impl Into<String>, ty: SourceType) -> Self {
        Self {
            name: name.into(),
            doc: String::new(),
            ty,
        }
    }
}

/// Everything the provider knows about one package.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PackageDecl {
    /// Package name (e.g. "main").
    pub name: String,
    /// Import path (e.g. "example.com/people").
    #[serde(default)]
    pub import_path: String,
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub consts: Vec<ConstDecl>,
    #[serde(default)]
    pub vars: Vec<VarDecl>,
    #[serde(default)]
    pub funcs: Vec<FuncDecl>,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    /// Named types declared in other packages but reachable from this one.
    #[serde(default)]
    pub external_types: Vec<ExternalTypeDecl>,
}

impl PackageDecl {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            import_path: name.clone(),
            name,
            ..Self::default()
        }
    }

    pub fn with_import_path(mut self, path: impl Into<String>) -> Self {
        self.import_path = path.into();
        self
    }

    pub fn with_type(mut self, decl: TypeDecl) -> Self {
        self.types.push(decl);
        self
    }

    pub fn with_func(mut self, decl: FuncDecl) -> Self {
        self.funcs.push(decl);
        self
    }

    pub fn with_const(mut self, decl: ConstDecl) -> Self {
        self.consts.push(decl);
        self
    }

    pub fn with_var(mut self, decl: VarDecl) -> Self {
        self.vars.push(decl);
        self
    }

    /// Qualify a simple name with this package.
    pub fn qualify(&self, name: &str) -> QualifiedName {
        QualifiedName::new(self.name.clone(), name)
    }

    /// Find a type declared in this package by simple name.
    pub fn find_type(&self, name: &str) -> Option<&TypeDecl> {
        self.types.iter().find(|t| t.name == name)
    }
}

/// A named type owned by another package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalTypeDecl {
    pub name: QualifiedName,
    pub underlying: SourceType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BasicKind;

    #[test]
    fn exported_names() {
        assert!(is_exported("Person"));
        assert!(is_exported("Ünicode"));
        assert!(!is_exported("person"));
        assert!(!is_exported("_Person"));
        assert!(!is_exported(""));
    }

    #[test]
    fn package_from_json() {
        let json = r#"{
            "name": "main",
            "import_path": "example.com/people",
            "types": [{
                "name": "Person",
                "underlying": {"struct": [
                    {"name": "Name", "type": {"basic": "string"}},
                    {"name": "Age", "type": {"basic": "int"}}
                ]},
                "methods": [{
                    "name": "Greet",
                    "signature": {"results": [{"type": {"basic": "string"}}]}
                }]
            }],
            "funcs": [{
                "name": "NewPerson",
                "signature": {
                    "params": [{"name": "n", "type": {"basic": "string"}}],
                    "results": [{"type": {"named": "main.Person"}}, {"type": "error"}]
                }
            }]
        }"#;
        let pkg: PackageDecl = serde_json::from_str(json).unwrap();
        assert_eq!(pkg.qualify("Person").to_string(), "main.Person");
        let person = pkg.find_type("Person").unwrap();
        assert_eq!(person.methods.len(), 1);
        assert!(!person.methods[0].pointer_receiver);
        assert_eq!(pkg.funcs[0].signature.results.len(), 2);
        assert_eq!(
            pkg.funcs[0].signature.params[0].ty,
            SourceType::basic(BasicKind::String)
        );
    }
}
