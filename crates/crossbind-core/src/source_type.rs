//! Source type grammar supplied by the declaration provider.
//!
//! [`SourceType`] is the fully resolved shape of a type as it appears on the
//! managed side. Named types are referenced by [`QualifiedName`] and resolved
//! against the package's type declarations during classification.

use std::fmt;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

use crate::QualifiedName;

/// Primitive kinds that cross the boundary by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
}

impl BasicKind {
    /// Get the source-level name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
        }
    }

    /// Get the C type this kind crosses the boundary as.
    ///
    /// `word_size` is the byte width of the platform-sized integer family
    /// (`int`, `uint`, `uintptr`).
    pub const fn c_type(self, word_size: u8) -> CType {
        let wide = word_size >= 8;
        match self {
            BasicKind::Bool => CType::Bool,
            BasicKind::Int8 => CType::Int8,
            BasicKind::Int16 => CType::Int16,
            BasicKind::Int32 => CType::Int32,
            BasicKind::Int64 => CType::Int64,
            BasicKind::Uint8 => CType::Uint8,
            BasicKind::Uint16 => CType::Uint16,
            BasicKind::Uint32 => CType::Uint32,
            BasicKind::Uint64 => CType::Uint64,
            BasicKind::Int if wide => CType::Int64,
            BasicKind::Int => CType::Int32,
            BasicKind::Uint | BasicKind::Uintptr if wide => CType::Uint64,
            BasicKind::Uint | BasicKind::Uintptr => CType::Uint32,
            BasicKind::Float32 => CType::Float,
            BasicKind::Float64 => CType::Double,
            BasicKind::Complex64 => CType::ComplexFloat,
            BasicKind::Complex128 => CType::ComplexDouble,
            BasicKind::String => CType::CString,
        }
    }
}

impl fmt::Display for BasicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fixed C types used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CType {
    /// `uint8_t` carrying 0 or 1.
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float,
    Double,
    ComplexFloat,
    ComplexDouble,
    /// NUL-terminated UTF-8 text.
    CString,
    /// Opaque handle id (`int64_t`).
    Handle,
    /// Raw address-sized value.
    Address,
}

impl CType {
    /// C declaration spelling.
    pub const fn c_decl(self) -> &'static str {
        match self {
            CType::Bool => "uint8_t",
            CType::Int8 => "int8_t",
            CType::Int16 => "int16_t",
            CType::Int32 => "int32_t",
            CType::Int64 => "int64_t",
            CType::Uint8 => "uint8_t",
            CType::Uint16 => "uint16_t",
            CType::Uint32 => "uint32_t",
            CType::Uint64 => "uint64_t",
            CType::Float => "float",
            CType::Double => "double",
            CType::ComplexFloat => "float _Complex",
            CType::ComplexDouble => "double _Complex",
            CType::CString => "const char*",
            CType::Handle => "int64_t",
            CType::Address => "uintptr_t",
        }
    }
}

/// A parameter or result slot in a signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    /// Declared name; may be empty for unnamed results.
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: SourceType,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: SourceType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn unnamed(ty: SourceType) -> Self {
        Self::new("", ty)
    }
}

/// A raw callable signature.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SignatureDecl {
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub results: Vec<ParamDecl>,
    /// The final parameter is variadic (declared as a slice of its element).
    #[serde(default)]
    pub variadic: bool,
}

impl SignatureDecl {
    pub fn new(params: Vec<ParamDecl>, results: Vec<ParamDecl>) -> Self {
        Self {
            params,
            results,
            variadic: false,
        }
    }
}

/// A struct field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: SourceType,
    #[serde(default)]
    pub doc: String,
    /// Declared without a name. The field is still bound by its type name;
    /// methods promoted from it are expected in the owner's
    /// [`TypeDecl::methods`](crate::TypeDecl::methods).
    #[serde(default)]
    pub embedded: bool,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: SourceType) -> Self {
        Self {
            name: name.into(),
            ty,
            doc: String::new(),
            embedded: false,
        }
    }

    /// An embedded field, named after its type.
    pub fn embed(name: impl Into<String>, ty: SourceType) -> Self {
        Self {
            embedded: true,
            ..Self::new(name, ty)
        }
    }
}

/// An interface method requirement (only used to reject non-empty interfaces).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceMethod {
    pub name: String,
    pub signature: SignatureDecl,
}

/// Fully resolved shape of a managed-side type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Basic(BasicKind),
    /// Reference to a declared named type.
    Named(QualifiedName),
    Pointer(Box<SourceType>),
    Array { len: u64, elem: Box<SourceType> },
    Slice(Box<SourceType>),
    Map { key: Box<SourceType>, value: Box<SourceType> },
    Struct(Vec<FieldDecl>),
    Signature(SignatureDecl),
    /// Interface type; an empty method list is the universal interface.
    Interface {
        #[serde(default)]
        methods: Vec<InterfaceMethod>,
    },
    /// The failure indicator.
    Error,
    /// Unconstrained generic placeholder.
    TypeParam(String),
}

impl SourceType {
    pub fn basic(kind: BasicKind) -> Self {
        SourceType::Basic(kind)
    }

    pub fn named(package: &str, name: &str) -> Self {
        SourceType::Named(QualifiedName::new(package, name))
    }

    pub fn pointer(elem: SourceType) -> Self {
        SourceType::Pointer(Box::new(elem))
    }

    pub fn slice(elem: SourceType) -> Self {
        SourceType::Slice(Box::new(elem))
    }

    pub fn array(len: u64, elem: SourceType) -> Self {
        SourceType::Array {
            len,
            elem: Box::new(elem),
        }
    }

    pub fn map(key: SourceType, value: SourceType) -> Self {
        SourceType::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn empty_interface() -> Self {
        SourceType::Interface {
            methods: Vec::new(),
        }
    }

    /// Check if this is the failure indicator.
    pub fn is_error(&self) -> bool {
        matches!(self, SourceType::Error)
    }

    /// Canonical registry key. Equal keys denote the same type.
    pub fn canonical_key(&self) -> String {
        self.to_string()
    }

    /// Deterministic identifier-safe name used for generated artifacts.
    pub fn mangled(&self) -> String {
        match self {
            SourceType::Basic(kind) => kind.name().to_string(),
            SourceType::Named(name) => name.mangled(),
            SourceType::Pointer(elem) => format!("ptr_{}", elem.mangled()),
            SourceType::Array { len, elem } => format!("array_{len}_{}", elem.mangled()),
            SourceType::Slice(elem) => format!("slice_{}", elem.mangled()),
            SourceType::Map { key, value } => format!("map_{}_{}", key.mangled(), value.mangled()),
            SourceType::Struct(_) => format!("struct_{:016x}", xxh64(self.canonical_key().as_bytes(), 0)),
            SourceType::Signature(_) => format!("func_{:016x}", xxh64(self.canonical_key().as_bytes(), 0)),
            SourceType::Interface { methods } if methods.is_empty() => "iface".to_string(),
            SourceType::Interface { .. } => format!("iface_{:016x}", xxh64(self.canonical_key().as_bytes(), 0)),
            SourceType::Error => "error".to_string(),
            SourceType::TypeParam(name) => format!("tparam_{name}"),
        }
    }
}

fn write_tuple(f: &mut fmt::Formatter<'_>, slots: &[ParamDecl]) -> fmt::Result {
    for (i, slot) in slots.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", slot.ty)?;
    }
    Ok(())
}

fn write_signature(f: &mut fmt::Formatter<'_>, sig: &SignatureDecl) -> fmt::Result {
    write!(f, "(")?;
    write_tuple(f, &sig.params)?;
    if sig.variadic {
        write!(f, "...")?;
    }
    write!(f, ")")?;
    match sig.results.len() {
        0 => Ok(()),
        1 => write!(f, " {}", sig.results[0].ty),
        _ => {
            write!(f, " (")?;
            write_tuple(f, &sig.results)?;
            write!(f, ")")
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Basic(kind) => write!(f, "{kind}"),
            SourceType::Named(name) => write!(f, "{name}"),
            SourceType::Pointer(elem) => write!(f, "*{elem}"),
            SourceType::Array { len, elem } => write!(f, "[{len}]{elem}"),
            SourceType::Slice(elem) => write!(f, "[]{elem}"),
            SourceType::Map { key, value } => write!(f, "map[{key}]{value}"),
            SourceType::Struct(fields) => {
                write!(f, "struct{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    if field.embedded {
                        write!(f, "{}", field.ty)?;
                    } else {
                        write!(f, "{} {}", field.name, field.ty)?;
                    }
                }
                write!(f, "}}")
            }
            SourceType::Signature(sig) => {
                write!(f, "func")?;
                write_signature(f, sig)
            }
            SourceType::Interface { methods } => {
                write!(f, "interface{{")?;
                for (i, m) in methods.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", m.name)?;
                    write_signature(f, &m.signature)?;
                }
                write!(f, "}}")
            }
            SourceType::Error => write!(f, "error"),
            SourceType::TypeParam(name) => write!(f, "{name}"),
        }
    }
}
