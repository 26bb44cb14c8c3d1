//! Build-time classification for crossbind.
//!
//! - [`SymbolTable`] - type classifier, one symbol per distinct type
//! - [`SignatureAnalyzer`] - normalizes callables and their error convention
//! - [`PackageBuilder`] - two-phase assembly into an emission-ready [`Package`]
//!
//! Everything here is single-threaded and deterministic: building the same
//! declarations twice yields identical ids.

mod builder;
mod package;
mod signature;
mod symbol_table;

pub use builder::{BuildOptions, PackageBuilder};
pub use package::{Entity, Package};
pub use signature::{Scope, SignatureAnalyzer, documented_signature};
pub use symbol_table::SymbolTable;
