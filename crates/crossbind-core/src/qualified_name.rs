use std::fmt;

use serde::{Deserialize, Serialize};

/// Package-qualified name of a declared type or member.
///
/// Used as the primary key when resolving `Named` type references. Types that live
/// in the universe scope (such as `error`) have an empty package.
///
/// # Examples
///
/// ```
/// use crossbind_core::QualifiedName;
///
/// let person = QualifiedName::new("main", "Person");
/// assert_eq!(person.to_string(), "main.Person");
///
/// let parsed = QualifiedName::from_qualified_string("main.Person");
/// assert_eq!(parsed, person);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct QualifiedName {
    /// Owning package name (e.g. "main"); empty for universe-scope names.
    pub package: String,
    /// Simple name (e.g. "Person").
    pub name: String,
}

impl QualifiedName {
    /// Create a qualified name inside a package.
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Create a universe-scope name.
    pub fn universe(name: impl Into<String>) -> Self {
        Self {
            package: String::new(),
            name: name.into(),
        }
    }

    /// Parse `pkg.Name`. The last `.` separates the package from the name.
    pub fn from_qualified_string(s: &str) -> Self {
        match s.rsplit_once('.') {
            Some((package, name)) => Self::new(package, name),
            None => Self::universe(s),
        }
    }

    /// Check if this name lives in the universe scope.
    pub fn is_universe(&self) -> bool {
        self.package.is_empty()
    }

    /// Get the simple (unqualified) name.
    pub fn simple_name(&self) -> &str {
        &self.name
    }

    /// Identifier-safe rendering used when deriving generated names (`pkg_Name`).
    pub fn mangled(&self) -> String {
        if self.is_universe() {
            self.name.clone()
        } else {
            format!("{}_{}", self.package.replace(['.', '/', '-'], "_"), self.name)
        }
    }

    /// Compute the type hash of this name.
    pub fn to_type_hash(&self) -> crate::TypeHash {
        crate::TypeHash::from_name(&self.to_string())
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_universe() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.package, self.name)
        }
    }
}

impl From<String> for QualifiedName {
    fn from(s: String) -> Self {
        Self::from_qualified_string(&s)
    }
}

impl From<&str> for QualifiedName {
    fn from(s: &str) -> Self {
        Self::from_qualified_string(s)
    }
}

impl From<QualifiedName> for String {
    fn from(name: QualifiedName) -> Self {
        name.to_string()
    }
}
