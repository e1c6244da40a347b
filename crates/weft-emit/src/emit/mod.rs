//! Declaration emitters, one per declaration kind.
//!
//! Every emitter sorts its own output; none relies on the order of the
//! foreign model.

pub mod delegates;
pub mod enums;
pub mod functions;
pub mod opaque;
pub mod structs;

use weft_model::{CallableOverride, ParameterOverrideTarget};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::naming::clean;
use crate::translate::TranslatedType;

/// A translated callable signature, shared by functions and delegates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CallableSignature {
    pub return_type: TranslatedType,
    /// (host parameter name, translated type)
    pub parameters: Vec<(String, TranslatedType)>,
    pub is_variadic: bool,
}

impl CallableSignature {
    /// Attribute line to place before the declaration, if the return value
    /// needs marshalling.
    pub fn return_attribute(&self) -> Option<String> {
        self.return_type
            .boolean_marshal()
            .map(|unmanaged| format!("[return: MarshalAs(UnmanagedType.{unmanaged})]"))
    }

    /// `(int a, [MarshalAs(UnmanagedType.I1)] bool b)`
    pub fn parameter_list(&self) -> String {
        let mut parts: Vec<String> = self
            .parameters
            .iter()
            .map(|(name, ty)| match ty.boolean_marshal() {
                Some(unmanaged) => format!("[MarshalAs(UnmanagedType.{unmanaged})] {} {name}", ty.host),
                None => format!("{} {name}", ty.host),
            })
            .collect();
        if self.is_variadic {
            parts.push("__arglist".to_string());
        }
        format!("({})", parts.join(", "))
    }

    pub fn needs_unsafe(&self) -> bool {
        self.return_type.needs_unsafe() || self.parameters.iter().any(|(_, ty)| ty.needs_unsafe())
    }
}

/// Host name of the parameter at `index`; unnamed parameters get `argN`.
pub(crate) fn parameter_name(raw: &str, index: usize) -> String {
    if raw.trim().is_empty() {
        format!("arg{index}")
    } else {
        clean(raw, false)
    }
}

/// Explicit host type for a callable position, if configured.
pub(crate) fn override_for(
    callable: Option<&CallableOverride>,
    target: ParameterOverrideTarget,
) -> Option<&str> {
    callable.and_then(|ov| ov.type_for(target))
}

/// Report override indices past the end of the signature. They are
/// otherwise ignored.
pub(crate) fn check_override_range(
    callable: Option<&CallableOverride>,
    native: &str,
    parameter_count: usize,
    diagnostics: &mut Diagnostics,
) {
    let Some(ov) = callable else {
        return;
    };
    for index in ov.out_of_range(parameter_count) {
        diagnostics.push(
            DiagnosticKind::OverrideIndexOutOfRange,
            native,
            format!("override for parameter {index} ignored; signature has {parameter_count} parameters"),
        );
    }
}
