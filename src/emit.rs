//! Emitter seam and the JSON manifest emitter.
//!
//! Target-language emitters implement [`Emitter`] and read the built
//! [`Package`]. The manifest emitter dumps the whole model so external
//! template tools can consume it.

use std::io::Write;

use serde::Serialize;
use tracing::debug;

use crossbind_core::{BoundType, Const, Func, Symbol, SymbolLookup, Var, WireRepr};
use crossbind_registry::Package;

use crate::Result;

/// Consumer of a fully built package.
pub trait Emitter {
    /// Write the generated artifact for `package` to `out`.
    fn emit(&mut self, package: &Package, out: &mut dyn Write) -> Result<()>;
}

/// Writes the package model as JSON.
#[derive(Debug, Clone)]
pub struct ManifestEmitter {
    output_name: String,
    pretty: bool,
}

#[derive(Serialize)]
struct Manifest<'a> {
    name: &'a str,
    package: &'a str,
    import_path: &'a str,
    doc: &'a str,
    /// Entity ids in emission order.
    order: Vec<&'a str>,
    symbols: Vec<SymbolEntry<'a>>,
    types: &'a [BoundType],
    funcs: &'a [Func],
    consts: &'a [Const],
    vars: &'a [Var],
}

#[derive(Serialize)]
struct SymbolEntry<'a> {
    #[serde(flatten)]
    symbol: &'a Symbol,
    needs_wrapping: bool,
    wire: WireRepr,
}

impl ManifestEmitter {
    pub fn new(output_name: impl Into<String>) -> Self {
        Self {
            output_name: output_name.into(),
            pretty: true,
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Render the manifest to a string.
    pub fn render(&self, package: &Package) -> Result<String> {
        let mut buf = Vec::new();
        self.write_manifest(package, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn write_manifest(&self, package: &Package, out: &mut dyn Write) -> Result<()> {
        let table = package.symbols();
        let symbols = table
            .names()
            .into_iter()
            .map(|symbol| SymbolEntry {
                symbol,
                needs_wrapping: table.needs_wrapping(symbol.hash),
                wire: table.wire_repr(symbol.hash),
            })
            .collect();

        let manifest = Manifest {
            name: &self.output_name,
            package: package.name(),
            import_path: package.import_path(),
            doc: package.doc(),
            order: package.entities().iter().map(|e| e.id()).collect(),
            symbols,
            types: package.types(),
            funcs: package.funcs(),
            consts: package.consts(),
            vars: package.vars(),
        };

        if self.pretty {
            serde_json::to_writer_pretty(&mut *out, &manifest)?;
        } else {
            serde_json::to_writer(&mut *out, &manifest)?;
        }
        writeln!(out)?;
        debug!(name = %self.output_name, "wrote manifest");
        Ok(())
    }
}

impl Emitter for ManifestEmitter {
    fn emit(&mut self, package: &Package, out: &mut dyn Write) -> Result<()> {
        self.write_manifest(package, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbind_core::{
        BasicKind, FieldDecl, FuncDecl, MethodDecl, PackageDecl, ParamDecl, SignatureDecl,
        SourceType, TypeDecl,
    };
    use crossbind_registry::{BuildOptions, PackageBuilder};

    fn package() -> Package {
        let decl = PackageDecl::new("main").with_func(FuncDecl::new(
            "Sum",
            SignatureDecl::new(
                vec![ParamDecl::new("xs", SourceType::slice(SourceType::basic(BasicKind::Float64)))],
                vec![ParamDecl::unnamed(SourceType::basic(BasicKind::Float64))],
            ),
        ));
        PackageBuilder::new(&decl, BuildOptions::default()).build().unwrap()
    }

    #[test]
    fn manifest_lists_symbols_and_order() {
        let json = ManifestEmitter::new("mathx").render(&package()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["name"], "mathx");
        assert_eq!(value["order"], serde_json::json!(["main_Sum"]));

        let symbols = value["symbols"].as_array().unwrap();
        let slice = symbols.iter().find(|s| s["id"] == "slice_float64").unwrap();
        assert_eq!(slice["needs_wrapping"], true);
        assert_eq!(slice["wire"]["repr"], "handle");

        let float = symbols.iter().find(|s| s["id"] == "float64").unwrap();
        assert_eq!(float["wire"]["c_type"], "double");
    }

    #[test]
    fn manifest_symbols_carry_type_protocols() {
        let decl = PackageDecl::new("main").with_type(
            TypeDecl::new(
                "Person",
                SourceType::Struct(vec![FieldDecl::new("Name", SourceType::basic(BasicKind::String))]),
            )
            .with_method(MethodDecl::new(
                "String",
                SignatureDecl::new(vec![], vec![ParamDecl::unnamed(SourceType::basic(BasicKind::String))]),
            )),
        );
        let pkg = PackageBuilder::new(&decl, BuildOptions::default()).build().unwrap();
        let json = ManifestEmitter::new("people").render(&pkg).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let symbols = value["symbols"].as_array().unwrap();
        let person = symbols.iter().find(|s| s["id"] == "main_Person").unwrap();
        assert!(person["protocols"].as_str().unwrap().contains("STRINGER"));

        let text = &value["types"][0]["methods"][0];
        assert_eq!(text["name"], "String");
        assert!(text["protocols"].as_str().unwrap().contains("STRINGER"));
        assert_eq!(value["types"][0]["text_fn"], "main_Person_String");
    }

    #[test]
    fn manifest_is_stable() {
        let mut emitter = ManifestEmitter::new("mathx").with_pretty(false);
        let mut a = Vec::new();
        let mut b = Vec::new();
        emitter.emit(&package(), &mut a).unwrap();
        emitter.emit(&package(), &mut b).unwrap();
        assert_eq!(a, b);
    }
}
