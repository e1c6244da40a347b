//! Foreign type reference → host type translation.
//!
//! Precedence, highest first:
//! 1. an explicit override for the position, used verbatim;
//! 2. boolean-semantic types (`bool`, `_Bool`, configured typedefs whose
//!    chain resolves to a one- or four-byte integer);
//! 3. the structural default: opaque handles, struct pointers, delegates,
//!    typedef resolution and the primitive table.
//!
//! Anything that matches none of these falls back to a pointer-sized or
//! `int` approximation and raises a diagnostic.

use weft_model::model::{StructDecl, TypedefDecl};
use weft_model::{ForeignDeclaration, ForeignModel, ForeignType, OverrideConfig, TypeRef};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::emit::delegates;
use crate::emit::opaque::OpaqueRegistry;
use crate::naming::{callable_host_name, type_host_name};

/// Host type for raw pointers and opaque handles.
pub const POINTER_TYPE: &str = "IntPtr";

/// Host type used when a non-pointer type cannot be recognized.
pub const FALLBACK_SCALAR: &str = "int";

/// Host type for boolean-semantic references.
pub const BOOLEAN_TYPE: &str = "bool";

/// Typedef chains longer than this are treated as cyclic.
const TYPEDEF_DEPTH_LIMIT: usize = 16;

/// How a translated reference crosses the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarshalStrategy {
    /// Bit-compatible transfer (primitives, enums, structs by value).
    Direct,
    /// One-byte boolean converted to and from the host boolean.
    BooleanByte,
    /// Four-byte boolean (Win32 `BOOL`) converted to and from the host boolean.
    BooleanInt,
    /// Registered opaque handle.
    OpaqueHandle,
    /// Typed pointer to a sized struct.
    StructPointer,
    /// Function pointer passed as a delegate or raw pointer.
    Callback,
    /// Host type supplied by an override.
    Override,
    /// Approximation for an unrecognized shape.
    Fallback,
}

/// Result of translating one type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedType {
    /// Name the reference is looked up under.
    pub canonical: String,
    /// Host type spelling.
    pub host: String,
    /// Whether the native storage is an integer carrying a boolean.
    pub is_boolean: bool,
    pub strategy: MarshalStrategy,
}

impl TranslatedType {
    fn new(canonical: impl Into<String>, host: impl Into<String>, strategy: MarshalStrategy) -> Self {
        Self {
            canonical: canonical.into(),
            host: host.into(),
            is_boolean: false,
            strategy,
        }
    }

    fn boolean(canonical: impl Into<String>, strategy: MarshalStrategy) -> Self {
        Self {
            canonical: canonical.into(),
            host: BOOLEAN_TYPE.to_string(),
            is_boolean: true,
            strategy,
        }
    }

    /// `UnmanagedType` member a boolean is marshalled as.
    pub fn boolean_marshal(&self) -> Option<&'static str> {
        match self.strategy {
            MarshalStrategy::BooleanByte => Some("I1"),
            MarshalStrategy::BooleanInt => Some("Bool"),
            _ => None,
        }
    }

    /// Integer type holding a boolean inside a struct.
    pub fn boolean_storage(&self) -> Option<&'static str> {
        match self.strategy {
            MarshalStrategy::BooleanByte => Some("byte"),
            MarshalStrategy::BooleanInt => Some("int"),
            _ => None,
        }
    }

    /// Whether the host type is an unmanaged pointer and needs an unsafe
    /// context.
    pub fn needs_unsafe(&self) -> bool {
        self.host.ends_with('*')
    }
}

/// Primitive table for builtin scalar types.
fn primitive_host(ty: &ForeignType) -> Option<&'static str> {
    let host = match ty {
        ForeignType::Void => "void",
        ForeignType::Char | ForeignType::SignedChar | ForeignType::Int8 => "sbyte",
        ForeignType::UnsignedChar | ForeignType::UInt8 => "byte",
        ForeignType::Short | ForeignType::Int16 => "short",
        ForeignType::UnsignedShort | ForeignType::UInt16 => "ushort",
        // `long` is 32 bits on the Windows ABI the bindings target.
        ForeignType::Int | ForeignType::Long | ForeignType::Int32 => "int",
        ForeignType::UnsignedInt | ForeignType::UnsignedLong | ForeignType::UInt32 => "uint",
        ForeignType::LongLong | ForeignType::Int64 => "long",
        ForeignType::UnsignedLongLong | ForeignType::UInt64 => "ulong",
        ForeignType::Float => "float",
        ForeignType::Double | ForeignType::LongDouble => "double",
        ForeignType::SizeT | ForeignType::UIntPtrT => "UIntPtr",
        ForeignType::PtrDiffT | ForeignType::IntPtrT => "IntPtr",
        _ => return None,
    };
    Some(host)
}

/// Boolean marshalling for a configured boolean typedef, decided by the
/// width its typedef chain resolves to. `None` unless that width is one or
/// four bytes.
pub fn boolean_strategy(model: &ForeignModel, name: &str) -> Option<MarshalStrategy> {
    let mut current = name.to_string();
    for _ in 0..=TYPEDEF_DEPTH_LIMIT {
        let Some(ForeignDeclaration::Typedef(decl)) = model.find(&current) else {
            return None;
        };
        let aliased = decl.aliased.parse().ok()?;
        match aliased.strip_const() {
            ForeignType::Bool
            | ForeignType::Char
            | ForeignType::SignedChar
            | ForeignType::UnsignedChar
            | ForeignType::Int8
            | ForeignType::UInt8 => return Some(MarshalStrategy::BooleanByte),
            ForeignType::Int
            | ForeignType::UnsignedInt
            | ForeignType::Long
            | ForeignType::UnsignedLong
            | ForeignType::Int32
            | ForeignType::UInt32 => return Some(MarshalStrategy::BooleanInt),
            ForeignType::Named(next) => current = next.clone(),
            _ => return None,
        }
    }
    None
}

/// Translates type references against one model, configuration and opaque
/// registry. Holds no mutable state; identical inputs always give identical
/// output.
pub struct TypeTranslator<'a> {
    model: &'a ForeignModel,
    config: &'a OverrideConfig,
    opaque: &'a OpaqueRegistry,
}

impl<'a> TypeTranslator<'a> {
    /// The opaque registry must be complete: translation consults it for
    /// every pointer to a named type.
    pub fn new(model: &'a ForeignModel, config: &'a OverrideConfig, opaque: &'a OpaqueRegistry) -> Self {
        Self {
            model,
            config,
            opaque,
        }
    }

    pub fn config(&self) -> &'a OverrideConfig {
        self.config
    }

    /// Translate a raw type reference.
    ///
    /// `explicit` is the override for this exact position, if any.
    /// `subject` names the position in diagnostics.
    pub fn translate(
        &self,
        type_ref: &TypeRef,
        explicit: Option<&str>,
        subject: &str,
        diagnostics: &mut Diagnostics,
    ) -> TranslatedType {
        if let Some(host) = explicit {
            let canonical = type_ref
                .parse()
                .map(|ty| ty.base_name())
                .unwrap_or_else(|_| type_ref.as_str().trim().to_string());
            return TranslatedType::new(canonical, host, MarshalStrategy::Override);
        }

        match type_ref.parse() {
            Ok(ty) => self.translate_type(&ty, None, subject, diagnostics),
            Err(e) => self.fallback(
                type_ref.as_str().trim(),
                type_ref.looks_like_pointer(),
                subject,
                &e.to_string(),
                diagnostics,
            ),
        }
    }

    /// Translate an already parsed type.
    pub fn translate_type(
        &self,
        ty: &ForeignType,
        explicit: Option<&str>,
        subject: &str,
        diagnostics: &mut Diagnostics,
    ) -> TranslatedType {
        if let Some(host) = explicit {
            return TranslatedType::new(ty.base_name(), host, MarshalStrategy::Override);
        }

        match self.structural(ty, 0) {
            Ok(translated) => translated,
            Err(reason) => {
                let spelling = ty.to_string();
                let pointer_like =
                    ty.is_pointer() || spelling.contains('*') || self.aliases_pointer(ty, 0);
                self.fallback(&spelling, pointer_like, subject, &reason, diagnostics)
            }
        }
    }

    fn fallback(
        &self,
        spelling: &str,
        pointer_like: bool,
        subject: &str,
        reason: &str,
        diagnostics: &mut Diagnostics,
    ) -> TranslatedType {
        let host = if pointer_like {
            POINTER_TYPE
        } else {
            FALLBACK_SCALAR
        };
        diagnostics.push(
            DiagnosticKind::UnrecognizedType,
            subject,
            format!("cannot translate '{spelling}' ({reason}); approximated as {host}"),
        );
        TranslatedType::new(spelling, host, MarshalStrategy::Fallback)
    }

    /// Whether `ty` names a typedef chain ending in a pointer-shaped
    /// descriptor.
    fn aliases_pointer(&self, ty: &ForeignType, depth: usize) -> bool {
        if depth > TYPEDEF_DEPTH_LIMIT {
            return false;
        }
        let ForeignType::Named(name) = ty.strip_const() else {
            return false;
        };
        match self.model.find(name) {
            Some(ForeignDeclaration::Typedef(decl)) => {
                decl.aliased.looks_like_pointer()
                    || decl
                        .aliased
                        .parse()
                        .is_ok_and(|aliased| self.aliases_pointer(&aliased, depth + 1))
            }
            _ => false,
        }
    }

    fn structural(&self, ty: &ForeignType, depth: usize) -> Result<TranslatedType, String> {
        if depth > TYPEDEF_DEPTH_LIMIT {
            return Err("typedef chain is cyclic or too deep".to_string());
        }

        let canonical = ty.base_name();
        match ty.strip_const() {
            ForeignType::Bool => Ok(TranslatedType::boolean(canonical, MarshalStrategy::BooleanByte)),
            ForeignType::Named(name) => self.named(name, depth),
            ForeignType::Pointer(inner) => match inner.strip_const() {
                ForeignType::Named(name) => self.pointer_to_named(name, depth),
                // void*, char*, scalar pointers, pointers to pointers
                _ => Ok(TranslatedType::new(canonical, POINTER_TYPE, MarshalStrategy::Direct)),
            },
            ForeignType::FunctionPointer(_) => Ok(TranslatedType::new(
                canonical,
                POINTER_TYPE,
                MarshalStrategy::Callback,
            )),
            // Arrays in signatures decay to pointers.
            ForeignType::Array(..) => Ok(TranslatedType::new(
                canonical,
                POINTER_TYPE,
                MarshalStrategy::Direct,
            )),
            other => primitive_host(other)
                .map(|host| TranslatedType::new(canonical, host, MarshalStrategy::Direct))
                .ok_or_else(|| format!("no host type for '{other}'")),
        }
    }

    /// A named type used by value.
    fn named(&self, name: &str, depth: usize) -> Result<TranslatedType, String> {
        if self.config.is_boolean_type(name) {
            // Other widths keep their native type.
            if let Some(strategy) = boolean_strategy(self.model, name) {
                return Ok(TranslatedType::boolean(name, strategy));
            }
        }
        if let Some(handle) = self.opaque.handle(name) {
            return Ok(TranslatedType::new(name, handle, MarshalStrategy::OpaqueHandle));
        }

        match self.model.find(name) {
            Some(ForeignDeclaration::Struct(decl)) => Ok(TranslatedType::new(
                name,
                self.struct_name(decl),
                MarshalStrategy::Direct,
            )),
            Some(ForeignDeclaration::Enum(decl)) => Ok(TranslatedType::new(
                name,
                type_host_name(self.config, &decl.name),
                MarshalStrategy::Direct,
            )),
            Some(ForeignDeclaration::Typedef(decl)) => self.typedef(decl, depth),
            Some(ForeignDeclaration::OpaqueClass(_)) => Ok(TranslatedType::new(
                name,
                POINTER_TYPE,
                MarshalStrategy::OpaqueHandle,
            )),
            Some(ForeignDeclaration::Function(_)) => {
                Err(format!("'{name}' names a function, not a type"))
            }
            None => Err(format!("unknown type '{name}'")),
        }
    }

    /// A typedef used by value: function pointer typedefs become their
    /// delegate, everything else resolves to the aliased type.
    ///
    /// A function pointer the delegate emitter rejects has no host type.
    fn typedef(&self, decl: &TypedefDecl, depth: usize) -> Result<TranslatedType, String> {
        let aliased = decl
            .aliased
            .parse()
            .map_err(|e| format!("typedef '{}' aliases an unrecognized type: {e}", decl.name))?;

        if let ForeignType::FunctionPointer(_) = aliased.strip_const() {
            delegates::recognize(decl)
                .map_err(|reason| format!("callback '{}' has no delegate: {reason}", decl.name))?;
            return Ok(TranslatedType::new(
                decl.name.as_str(),
                callable_host_name(self.config, &decl.name),
                MarshalStrategy::Callback,
            ));
        }

        let mut resolved = self.structural(&aliased, depth + 1)?;
        resolved.canonical = decl.name.clone();
        Ok(resolved)
    }

    /// A pointer whose pointee is a named type.
    fn pointer_to_named(&self, name: &str, depth: usize) -> Result<TranslatedType, String> {
        if depth > TYPEDEF_DEPTH_LIMIT {
            return Err("typedef chain is cyclic or too deep".to_string());
        }
        if let Some(handle) = self.opaque.handle(name) {
            return Ok(TranslatedType::new(name, handle, MarshalStrategy::OpaqueHandle));
        }

        match self.model.find(name) {
            Some(ForeignDeclaration::Struct(decl)) => Ok(TranslatedType::new(
                name,
                format!("{}*", self.struct_name(decl)),
                MarshalStrategy::StructPointer,
            )),
            Some(ForeignDeclaration::Typedef(decl)) => {
                let aliased = decl.aliased.parse().map_err(|e| {
                    format!("typedef '{}' aliases an unrecognized type: {e}", decl.name)
                })?;
                match aliased.strip_const() {
                    ForeignType::Named(target) => self.pointer_to_named(target, depth + 1),
                    _ => Ok(TranslatedType::new(name, POINTER_TYPE, MarshalStrategy::Direct)),
                }
            }
            Some(ForeignDeclaration::OpaqueClass(_)) => Ok(TranslatedType::new(
                name,
                POINTER_TYPE,
                MarshalStrategy::OpaqueHandle,
            )),
            Some(ForeignDeclaration::Enum(_)) => {
                Ok(TranslatedType::new(name, POINTER_TYPE, MarshalStrategy::Direct))
            }
            Some(ForeignDeclaration::Function(_)) => {
                Err(format!("'{name}' names a function, not a type"))
            }
            None => Err(format!("unknown type '{name}'")),
        }
    }

    fn struct_name(&self, decl: &StructDecl) -> String {
        type_host_name(self.config, &decl.name)
    }
}
