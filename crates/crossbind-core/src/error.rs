//! Build-time error types.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ClassifyError
//! ├── UnsupportedType        - shape outside the supported grammar
//! ├── UnknownNamedType       - reference to a type no declaration provides
//! ├── TooManyResults         - callable with three or more results
//! ├── SecondResultNotError   - two results, second is not the failure indicator
//! ├── AmbiguousConstructor   - two ctors with the same foreign-visible signature
//! └── DuplicateDeclaration   - two declarations share a name
//! ```
//!
//! Every variant names the offending declaration. Any of them aborts the whole
//! generation run; partial output is never produced.
//!
//! Runtime bridge faults live in `crossbind-runtime`.

use thiserror::Error;

/// Errors raised while classifying the exposed surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// A type shape that cannot be deterministically classified.
    #[error("{decl}: unsupported type '{ty}': {reason}")]
    UnsupportedType {
        /// Declaration in which the type appears.
        decl: String,
        /// Source rendering of the type.
        ty: String,
        reason: &'static str,
    },

    /// A named type reference that no declaration resolves.
    #[error("{decl}: unknown named type '{name}'")]
    UnknownNamedType { decl: String, name: String },

    /// More than two results.
    #[error("{callable}: too many results to return ({count}); at most a value and an error are supported")]
    TooManyResults { callable: String, count: usize },

    /// Two results where the second is not the failure indicator.
    #[error("{callable}: second result value must be of type error, found '{found}'")]
    SecondResultNotError { callable: String, found: String },

    /// Two constructors of one type with identical foreign-visible signatures.
    #[error("type '{type_name}' has ambiguous constructors '{first}' and '{second}' with identical signatures")]
    AmbiguousConstructor {
        type_name: String,
        first: String,
        second: String,
    },

    /// Two declarations with the same name in one scope.
    #[error("duplicate declaration: {name}")]
    DuplicateDeclaration { name: String },
}

impl ClassifyError {
    /// Name of the declaration this error is about.
    pub fn declaration(&self) -> &str {
        match self {
            ClassifyError::UnsupportedType { decl, .. } => decl,
            ClassifyError::UnknownNamedType { decl, .. } => decl,
            ClassifyError::TooManyResults { callable, .. } => callable,
            ClassifyError::SecondResultNotError { callable, .. } => callable,
            ClassifyError::AmbiguousConstructor { type_name, .. } => type_name,
            ClassifyError::DuplicateDeclaration { name } => name,
        }
    }
}

/// Result alias for classification.
pub type ClassifyResult<T> = Result<T, ClassifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_declaration() {
        let err = ClassifyError::TooManyResults {
            callable: "main.Triple".into(),
            count: 3,
        };
        assert!(err.to_string().starts_with("main.Triple:"));
        assert_eq!(err.declaration(), "main.Triple");

        let err = ClassifyError::SecondResultNotError {
            callable: "main.Pair".into(),
            found: "int".into(),
        };
        assert_eq!(
            err.to_string(),
            "main.Pair: second result value must be of type error, found 'int'"
        );
    }
}
