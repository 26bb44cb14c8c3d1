//! Core types shared by the crossbind crates.
//!
//! - [`TypeHash`] / [`QualifiedName`] - deterministic identity
//! - [`SourceType`] and the `*Decl` types - what the declaration provider supplies
//! - [`Symbol`], [`SymbolKind`], [`WireRepr`] - the classified type model
//! - [`Func`], [`BoundType`], [`Const`], [`Var`] - emission-ready entities
//! - [`ClassifyError`] - build-time failures

mod decl;
mod doc_index;
pub mod entries;
mod error;
mod qualified_name;
mod source_type;
mod symbol;
mod type_hash;

pub use decl::{
    ConstDecl, ExternalTypeDecl, FuncDecl, MethodDecl, PackageDecl, TypeDecl, VarDecl, is_exported,
};
pub use doc_index::DocIndex;
pub use entries::{BoundField, BoundType, Const, Func, FuncKind, Param, Receiver, Var};
pub use error::{ClassifyError, ClassifyResult};
pub use qualified_name::QualifiedName;
pub use source_type::{
    BasicKind, CType, FieldDecl, InterfaceMethod, ParamDecl, SignatureDecl, SourceType,
};
pub use symbol::{FieldSymbol, Protocols, Symbol, SymbolId, SymbolKind, SymbolLookup, WireRepr};
pub use type_hash::{TypeHash, hash_constants};
