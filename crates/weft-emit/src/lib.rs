//! C# P/Invoke declaration generation for the weft binding generator.
//!
//! Turns a [`ForeignModel`](weft_model::ForeignModel) and an
//! [`OverrideConfig`](weft_model::OverrideConfig) into one deterministic
//! C# source file: opaque handle aliases, extern entry points grouped by
//! header, unmanaged delegates, sequential structs and enums.
//!
//! ## Modules
//!
//! - [`naming`] — Foreign identifier → host identifier rules
//! - [`translate`] — Type reference translation and marshalling strategy
//! - [`emit`] — Per-kind declaration emitters
//! - [`pipeline`] — Fixed-order driver producing [`Bindings`]
//! - [`output`] — Structured output and rendering
//! - [`diagnostics`] — Non-fatal warnings raised during a run
//! - [`report`] — Summary of a run

pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod translate;

// Re-export key types for convenience
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use emit::opaque::OpaqueRegistry;
pub use error::EmitError;
pub use output::{Bindings, OutputItem, Section, SectionKind, Unrecognized};
pub use pipeline::{generate, generate_from_str};
pub use report::GenerationReport;
pub use translate::{MarshalStrategy, TranslatedType, TypeTranslator};
