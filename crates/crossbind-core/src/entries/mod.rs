//! Emission-ready entity descriptors.
//!
//! - [`Func`] - normalized callable (functions, methods, constructors, accessors)
//! - [`BoundType`] - exposed named type with ctors, methods and fields
//! - [`Const`] / [`Var`] - package-level values with synthesized accessors

mod bound_type;
mod func;
mod value;

pub use bound_type::{BoundField, BoundType};
pub use func::{Func, FuncKind, Param, Receiver};
pub use value::{Const, Var};
