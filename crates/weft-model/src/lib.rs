//! Input side of the weft binding generator.
//!
//! Holds the read-only description of a native API as produced by an
//! external header parser, and the override configuration that corrects
//! the mechanical translation of that API.
//!
//! ## Modules
//!
//! - [`ctype`] — Raw type descriptor parser
//! - [`model`] — Foreign declarations (functions, structs, enums, typedefs, opaque classes)
//! - [`overrides`] — Type and callable overrides plus global settings

pub mod ctype;
pub mod error;
pub mod model;
pub mod overrides;

// Re-export key types for convenience
pub use ctype::{ForeignParam, ForeignType, FunctionShape, TypeRef};
pub use error::ModelError;
pub use model::{ForeignDeclaration, ForeignModel};
pub use overrides::{
    CallableOverride, CallingConvention, OverrideConfig, ParameterOverrideTarget, Settings,
    TypeOverride, Visibility,
};
