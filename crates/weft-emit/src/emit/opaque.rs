//! Opaque class aliases and the handle registry.

use std::collections::BTreeMap;

use weft_model::{ForeignModel, OverrideConfig};

use crate::naming::type_host_name;
use crate::output::{Declaration, OutputItem, Section, SectionKind};

/// Fully qualified host type standing in for every opaque handle.
pub const HANDLE_TYPE: &str = "System.IntPtr";

/// Canonical name → host alias of every opaque class in the model.
///
/// Built once, before any type translation happens, and read-only
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpaqueRegistry {
    handles: BTreeMap<String, String>,
}

impl OpaqueRegistry {
    /// Register every opaque class of the model.
    pub fn build(model: &ForeignModel, config: &OverrideConfig) -> Self {
        let handles = model
            .opaque_classes()
            .map(|decl| (decl.name.clone(), type_host_name(config, &decl.name)))
            .collect();
        Self { handles }
    }

    /// Host alias for an opaque class.
    pub fn handle(&self, canonical: &str) -> Option<&str> {
        self.handles.get(canonical).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// (canonical, alias) pairs ordered by canonical name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.handles.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Emit one `using` alias per opaque class, ordered by canonical name, and
/// return the registry the translator needs.
pub fn emit(model: &ForeignModel, config: &OverrideConfig) -> (Section, OpaqueRegistry) {
    let registry = OpaqueRegistry::build(model, config);
    let items = registry
        .iter()
        .map(|(native, alias)| {
            OutputItem::Declaration(Declaration {
                native: native.to_string(),
                name: alias.to_string(),
                lines: vec![format!("using {alias} = {HANDLE_TYPE};")],
            })
        })
        .collect();
    tracing::debug!(count = registry.len(), "emitted opaque aliases");
    (Section::single(SectionKind::OpaqueAliases, items), registry)
}
