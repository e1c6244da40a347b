//! Generation report summarizing one run.

use std::fmt;

use crate::diagnostics::Diagnostic;
use crate::output::{Bindings, SectionKind};

/// Summary report of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// Target namespace.
    pub namespace: String,
    /// SHA-256 of the rendered output.
    pub fingerprint: String,
    pub opaque_aliases: usize,
    pub functions: usize,
    /// Number of distinct source headers the functions came from.
    pub source_files: usize,
    pub delegates: usize,
    /// Delegate candidates emitted as placeholders.
    pub unrecognized_delegates: usize,
    pub structs: usize,
    pub enums: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerationReport {
    pub fn from_bindings(bindings: &Bindings) -> Self {
        let count = |kind| {
            bindings
                .section(kind)
                .map(|s| s.declarations().count())
                .unwrap_or(0)
        };

        Self {
            namespace: bindings.namespace.clone(),
            fingerprint: bindings.fingerprint(),
            opaque_aliases: count(SectionKind::OpaqueAliases),
            functions: count(SectionKind::Functions),
            source_files: bindings
                .section(SectionKind::Functions)
                .map(|s| s.groups.len())
                .unwrap_or(0),
            delegates: count(SectionKind::Delegates),
            unrecognized_delegates: bindings
                .section(SectionKind::Delegates)
                .map(|s| s.unrecognized().count())
                .unwrap_or(0),
            structs: count(SectionKind::Structs),
            enums: count(SectionKind::Enums),
            diagnostics: bindings.diagnostics.clone(),
        }
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Generation Report ===")?;
        writeln!(f, "Namespace: {}", self.namespace)?;
        writeln!(f, "Fingerprint: {}", self.fingerprint)?;
        writeln!(f)?;

        writeln!(f, "--- Declarations ---")?;
        writeln!(f, "  Opaque aliases: {}", self.opaque_aliases)?;
        writeln!(
            f,
            "  Functions: {} (from {} source files)",
            self.functions, self.source_files
        )?;
        writeln!(
            f,
            "  Delegates: {} ({} unrecognized)",
            self.delegates, self.unrecognized_delegates
        )?;
        writeln!(f, "  Structs: {}", self.structs)?;
        writeln!(f, "  Enums: {}", self.enums)?;

        writeln!(f)?;
        if self.diagnostics.is_empty() {
            writeln!(f, "--- Diagnostics: none ---")?;
        } else {
            writeln!(f, "--- Diagnostics ({}) ---", self.diagnostics.len())?;
            for diagnostic in &self.diagnostics {
                writeln!(f, "  {diagnostic}")?;
            }
        }

        Ok(())
    }
}
