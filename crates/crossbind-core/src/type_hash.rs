//! Deterministic hash-based identity for symbols and callables.
//!
//! This module provides [`TypeHash`], a 64-bit hash that identifies classified
//! types, free functions, methods and synthesized accessors. Hashes are computed
//! from canonical names and parameter identities, so the same input surface always
//! produces the same ids:
//!
//! - Re-running generation yields byte-identical identifiers
//! - No dependency on the order declarations are visited
//! - Same canonical key = same hash across independent symbol tables
//!
//! # Hash Computation
//!
//! Uses XXHash64 with domain-specific mixing constants so a type named `Foo`
//! and a function named `Foo` never share an id.
//!
//! # Examples
//!
//! ```
//! use crossbind_core::TypeHash;
//!
//! let a = TypeHash::from_name("main.Person");
//! let b = TypeHash::from_name("main.Person");
//! assert_eq!(a, b);
//!
//! let f1 = TypeHash::from_function("main.Greet", &[TypeHash::from_name("string")]);
//! let f2 = TypeHash::from_function("main.Greet", &[TypeHash::from_name("int")]);
//! assert_ne!(f1, f2);
//! ```

use std::fmt;

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Separator constant used when folding parameter hashes.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for package-level function hashes.
    pub const FUNCTION: u64 = 0x5ea77ffbcdf5f302;

    /// Domain marker for method hashes.
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for constructor hashes.
    pub const CONSTRUCTOR: u64 = 0x9a7f3d5e2b8c4601;

    /// Domain marker for synthesized getter/setter hashes.
    pub const ACCESSOR: u64 = 0x3e9f5d2a8c7b1403;

    /// Parameter position mixing constants.
    ///
    /// Each position gets its own constant so `(int, string)` and `(string, int)`
    /// hash differently.
    pub const PARAM_MARKERS: [u64; 16] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
        0x7c3e9f2a5b8d1403,
        0x5d8c7b4a3e9f2106,
        0x3f1e9d8c7b5a4203,
        0x1a2b3c4d5e6f7089,
        0x9f8e7d6c5b4a3210,
        0x2468ace013579bdf,
        0xfdb97531eca86420,
        0x0f1e2d3c4b5a6978,
    ];
}

/// A deterministic 64-bit hash identifying a symbol or callable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a canonical type key.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a function hash from a qualified name and parameter type hashes.
    ///
    /// Parameter order matters.
    #[inline]
    pub fn from_function(name: &str, param_hashes: &[TypeHash]) -> Self {
        let seed = hash_constants::FUNCTION ^ xxh64(name.as_bytes(), 0);
        TypeHash(fold_params(seed, param_hashes))
    }

    /// Create a method hash from the owning type, method name and parameter hashes.
    ///
    /// Two methods with the same name on different types never collide because the
    /// owner participates in the seed.
    #[inline]
    pub fn from_method(owner: TypeHash, name: &str, param_hashes: &[TypeHash]) -> Self {
        let seed = hash_constants::METHOD ^ owner.0 ^ xxh64(name.as_bytes(), 0);
        TypeHash(fold_params(seed, param_hashes))
    }

    /// Create a constructor hash from the owning type and parameter hashes.
    #[inline]
    pub fn from_constructor(owner: TypeHash, name: &str, param_hashes: &[TypeHash]) -> Self {
        let seed = hash_constants::CONSTRUCTOR ^ owner.0 ^ xxh64(name.as_bytes(), 0);
        TypeHash(fold_params(seed, param_hashes))
    }

    /// Create a hash for a synthesized accessor (`get`, `set`, `new`, `str`, field getters).
    #[inline]
    pub fn from_accessor(owner: TypeHash, accessor: &str) -> Self {
        TypeHash(hash_constants::ACCESSOR ^ owner.0 ^ xxh64(accessor.as_bytes(), 0))
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

fn fold_params(seed: u64, param_hashes: &[TypeHash]) -> u64 {
    let mut hash = seed;
    for (i, param) in param_hashes.iter().enumerate() {
        let marker = hash_constants::PARAM_MARKERS
            .get(i)
            .copied()
            .unwrap_or_else(|| hash_constants::PARAM_MARKERS[0].wrapping_add(i as u64));
        // wrapping_mul keeps the fold non-commutative
        hash = hash.wrapping_mul(hash_constants::SEP).wrapping_add(marker ^ param.0);
    }
    hash
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_hash_determinism() {
        assert_eq!(TypeHash::from_name("main.Person"), TypeHash::from_name("main.Person"));
        assert_ne!(TypeHash::from_name("main.Person"), TypeHash::from_name("main.Persons"));
    }

    #[test]
    fn function_hash_parameter_order_matters() {
        let int = TypeHash::from_name("int");
        let string = TypeHash::from_name("string");
        let a = TypeHash::from_function("main.F", &[int, string]);
        let b = TypeHash::from_function("main.F", &[string, int]);
        assert_ne!(a, b);
    }

    #[test]
    fn method_hash_includes_owner() {
        let foo = TypeHash::from_name("main.Foo");
        let bar = TypeHash::from_name("main.Bar");
        assert_ne!(
            TypeHash::from_method(foo, "Len", &[]),
            TypeHash::from_method(bar, "Len", &[])
        );
    }

    #[test]
    fn domains_do_not_collide() {
        let owner = TypeHash::from_name("main.Foo");
        let type_hash = TypeHash::from_name("Len");
        let func = TypeHash::from_function("Len", &[]);
        let method = TypeHash::from_method(owner, "Len", &[]);
        let ctor = TypeHash::from_constructor(owner, "Len", &[]);
        let accessor = TypeHash::from_accessor(owner, "Len");

        let all = [type_hash, func, method, ctor, accessor];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn many_parameters_supported() {
        let params: Vec<TypeHash> = (0..40).map(|i| TypeHash::from_name(&format!("T{i}"))).collect();
        let a = TypeHash::from_function("main.Wide", &params);
        let b = TypeHash::from_function("main.Wide", &params[..39]);
        assert_ne!(a, b);
    }

    #[test]
    fn hash_display() {
        let hash = TypeHash(0x1234);
        assert_eq!(hash.to_string(), "0x0000000000001234");
        assert_eq!(format!("{hash:?}"), "TypeHash(0x0000000000001234)");
        assert!(TypeHash::EMPTY.is_empty());
        assert_eq!(hash.as_u64(), 0x1234);
    }
}
