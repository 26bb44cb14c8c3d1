//! crossbind - binding generator core.
//!
//! Exposes the exported surface of a garbage-collected module to a foreign
//! runtime that uses manual reference counting and a flat C ABI.
//!
//! # Pipeline
//!
//! ```text
//! PackageDecl ──► SymbolTable ──► SignatureAnalyzer ──► PackageBuilder ──► Package ──► Emitter
//!                 (classify)      (call contracts)      (ctors, methods)
//! ```
//!
//! At runtime the generated glue talks to the reference bridge in
//! [`crossbind_runtime`].
//!
//! # Example
//!
//! ```
//! use crossbind::{BasicKind, BindConfig, FieldDecl, PackageDecl, SourceType, TypeDecl, generate};
//!
//! let decl = PackageDecl::new("main").with_type(TypeDecl::new(
//!     "Point",
//!     SourceType::Struct(vec![
//!         FieldDecl::new("X", SourceType::basic(BasicKind::Float64)),
//!         FieldDecl::new("Y", SourceType::basic(BasicKind::Float64)),
//!     ]),
//! ));
//!
//! let package = generate(&decl, &BindConfig::default()).unwrap();
//! assert_eq!(package.find_type("Point").unwrap().fields.len(), 2);
//! ```

pub mod config;
pub mod emit;
mod error;

use std::path::Path;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use crossbind_core::{
    BasicKind, BoundField, BoundType, CType, ClassifyError, ConstDecl, FieldDecl, Func, FuncDecl,
    FuncKind, MethodDecl, PackageDecl, ParamDecl, Protocols, QualifiedName, SignatureDecl,
    SourceType, Symbol, SymbolKind, SymbolLookup, TypeDecl, VarDecl, WireRepr,
};
pub use crossbind_registry::{BuildOptions, Entity, Package, PackageBuilder, SymbolTable};
pub use crossbind_runtime::{BridgeFault, CallOutcome, HandleId, HandleTable, ManagedAddr};

pub use config::{BindConfig, ConfigError};
pub use emit::{Emitter, ManifestEmitter};
pub use error::{BindError, Result};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbosity` picks the level for the
/// crossbind crates (0 = warn, 1 = info, 2 = debug, 3+ = trace). Calling this
/// again after a subscriber is installed does nothing.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let fallback = format!("crossbind={level},crossbind_registry={level},crossbind_runtime={level}");
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init();
}

/// Read a JSON declaration file produced by the declaration provider.
pub fn load_declarations(path: impl AsRef<Path>) -> Result<PackageDecl> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| BindError::ReadDeclarations {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Classify a package and build its binding model.
///
/// Fails as a whole on the first classification error.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn generate(decl: &PackageDecl, config: &BindConfig) -> Result<Package> {
    config.validate()?;
    info!(
        package = %decl.name,
        output = %config.output_name_for(&decl.name),
        "generating bindings"
    );
    PackageBuilder::new(decl, config.build_options())
        .build()
        .map_err(|err| {
            error!(decl = %err.declaration(), %err, "generation aborted");
            BindError::from(err)
        })
}

/// Install the process-wide reference bridge using the configured handle start.
///
/// Returns `false` if the bridge was already in use.
pub fn install_bridge(config: &BindConfig) -> bool {
    crossbind_runtime::install_bridge(config.handle_start)
}
