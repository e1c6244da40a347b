//! Foreign declaration model.
//!
//! The model is the read-only output of the external header parser: every
//! function, struct, enum and typedef of the native API, keyed by canonical
//! name. It is read from a JSON document:
//!
//! ```json
//! { "declarations": [
//!   { "kind": "struct", "name": "sfVector2f", "size": 8,
//!     "fields": [ { "name": "x", "type": "float" }, { "name": "y", "type": "float" } ] },
//!   { "kind": "typedef", "name": "sfCallback", "type": "void (*)(void *)" }
//! ] }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ctype::TypeRef;
use crate::error::{ModelError, Result};

/// One declaration of the native API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForeignDeclaration {
    Function(FunctionDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    Typedef(TypedefDecl),
    /// A struct of unknown size, only ever handled through pointers.
    OpaqueClass(StructDecl),
}

impl ForeignDeclaration {
    /// Canonical foreign name.
    pub fn name(&self) -> &str {
        match self {
            ForeignDeclaration::Function(decl) => &decl.name,
            ForeignDeclaration::Struct(decl) | ForeignDeclaration::OpaqueClass(decl) => &decl.name,
            ForeignDeclaration::Enum(decl) => &decl.name,
            ForeignDeclaration::Typedef(decl) => &decl.name,
        }
    }

    /// Header the declaration was read from.
    pub fn source(&self) -> &str {
        match self {
            ForeignDeclaration::Function(decl) => &decl.source,
            ForeignDeclaration::Struct(decl) | ForeignDeclaration::OpaqueClass(decl) => {
                &decl.source
            }
            ForeignDeclaration::Enum(decl) => &decl.source,
            ForeignDeclaration::Typedef(decl) => &decl.source,
        }
    }

    /// Promote a zero-sized struct to an opaque class.
    fn normalize(self) -> Self {
        match self {
            ForeignDeclaration::Struct(decl) if decl.size == 0 => {
                ForeignDeclaration::OpaqueClass(decl)
            }
            other => other,
        }
    }
}

/// A native function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    /// Exported symbol name.
    pub name: String,
    /// Parameters in declaration order.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Return type.
    #[serde(rename = "return", default = "void_type")]
    pub return_type: TypeRef,
    /// Whether the function takes `...`.
    #[serde(default)]
    pub variadic: bool,
    /// Header path as reported by the parser.
    #[serde(default)]
    pub source: String,
}

fn void_type() -> TypeRef {
    TypeRef::new("void")
}

/// A named, typed function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
}

/// A native struct. Size zero marks an opaque class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDecl {
    pub name: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Fields in native layout order.
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub source: String,
}

/// A struct field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
}

/// A native enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub name: String,
    /// Items in declaration order.
    #[serde(default)]
    pub items: Vec<EnumItem>,
    #[serde(default)]
    pub source: String,
}

/// An enumerant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumItem {
    pub name: String,
    pub value: EnumValue,
}

/// Value of an enumerant exactly as the header spells it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    Literal(i64),
    Unsigned(u64),
    Expression(String),
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumValue::Literal(v) => write!(f, "{v}"),
            EnumValue::Unsigned(v) => write!(f, "{v}"),
            EnumValue::Expression(expr) => f.write_str(expr),
        }
    }
}

/// A typedef.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedefDecl {
    pub name: String,
    /// The aliased type.
    #[serde(rename = "type")]
    pub aliased: TypeRef,
    #[serde(default)]
    pub source: String,
}

impl TypedefDecl {
    /// Whether this typedef may denote a function pointer: its aliased type
    /// is pointer-shaped, whether or not it is structurally recognizable.
    pub fn is_delegate_candidate(&self) -> bool {
        match self.aliased.parse() {
            Ok(ty) => ty.is_pointer(),
            Err(_) => self.aliased.looks_like_pointer(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelDocument {
    #[serde(default)]
    declarations: Vec<ForeignDeclaration>,
}

/// The parsed surface of a native API.
#[derive(Debug, Clone, Default)]
pub struct ForeignModel {
    declarations: Vec<ForeignDeclaration>,
    by_name: BTreeMap<String, usize>,
}

impl ForeignModel {
    /// Build a model from parser output. Zero-sized structs become
    /// [`ForeignDeclaration::OpaqueClass`].
    pub fn new(declarations: Vec<ForeignDeclaration>) -> Self {
        let declarations: Vec<_> = declarations
            .into_iter()
            .map(ForeignDeclaration::normalize)
            .collect();
        let mut by_name = BTreeMap::new();
        for (i, decl) in declarations.iter().enumerate() {
            by_name.entry(decl.name().to_string()).or_insert(i);
        }
        Self {
            declarations,
            by_name,
        }
    }

    /// Parse a model from a JSON document.
    pub fn parse(input: &str) -> Result<Self> {
        let doc: ModelDocument = serde_json::from_str(input)?;
        if let Some(unnamed) = doc.declarations.iter().position(|d| d.name().is_empty()) {
            return Err(ModelError::InvalidModel {
                detail: format!("declaration #{unnamed} has no name"),
            });
        }
        Ok(Self::new(doc.declarations))
    }

    /// Parse a model from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// All declarations in parser order.
    pub fn declarations(&self) -> &[ForeignDeclaration] {
        &self.declarations
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Look up a declaration by canonical name.
    pub fn find(&self, name: &str) -> Option<&ForeignDeclaration> {
        self.by_name.get(name).map(|&i| &self.declarations[i])
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.declarations.iter().filter_map(|d| match d {
            ForeignDeclaration::Function(f) => Some(f),
            _ => None,
        })
    }

    /// Structs with a known, non-zero size.
    pub fn structs(&self) -> impl Iterator<Item = &StructDecl> {
        self.declarations.iter().filter_map(|d| match d {
            ForeignDeclaration::Struct(s) => Some(s),
            _ => None,
        })
    }

    pub fn opaque_classes(&self) -> impl Iterator<Item = &StructDecl> {
        self.declarations.iter().filter_map(|d| match d {
            ForeignDeclaration::OpaqueClass(s) => Some(s),
            _ => None,
        })
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumDecl> {
        self.declarations.iter().filter_map(|d| match d {
            ForeignDeclaration::Enum(e) => Some(e),
            _ => None,
        })
    }

    pub fn typedefs(&self) -> impl Iterator<Item = &TypedefDecl> {
        self.declarations.iter().filter_map(|d| match d {
            ForeignDeclaration::Typedef(t) => Some(t),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
{
  "declarations": [
    { "kind": "function", "name": "sfWindow_close", "source": "SFML/Window/Window.h",
      "return": "void", "parameters": [ { "name": "window", "type": "sfWindow *" } ] },
    { "kind": "function", "name": "sfClock_create", "source": "SFML/System/Clock.h",
      "return": "sfClock *" },
    { "kind": "struct", "name": "sfVector2f", "size": 8,
      "fields": [ { "name": "x", "type": "float" }, { "name": "y", "type": "float" } ] },
    { "kind": "struct", "name": "sfWindow", "size": 0 },
    { "kind": "opaque_class", "name": "sfClock" },
    { "kind": "enum", "name": "sfStyle",
      "items": [ { "name": "sfNone", "value": 0 }, { "name": "sfDefault", "value": "sfTitlebar | sfClose" } ] },
    { "kind": "typedef", "name": "sfCallback", "type": "void (*)(void *)" },
    { "kind": "typedef", "name": "sfBool", "type": "int" }
  ]
}
"#;

    #[test]
    fn parse_sample_model() {
        let model = ForeignModel::parse(SAMPLE).unwrap();
        assert_eq!(model.len(), 8);
        assert_eq!(model.functions().count(), 2);
        assert_eq!(model.structs().count(), 1);
        assert_eq!(model.opaque_classes().count(), 2);
        assert_eq!(model.enums().count(), 1);
        assert_eq!(model.typedefs().count(), 2);
    }

    #[test]
    fn zero_size_struct_is_opaque() {
        let model = ForeignModel::parse(SAMPLE).unwrap();
        assert!(matches!(
            model.find("sfWindow"),
            Some(ForeignDeclaration::OpaqueClass(_))
        ));
        assert!(matches!(
            model.find("sfVector2f"),
            Some(ForeignDeclaration::Struct(_))
        ));
    }

    #[test]
    fn function_defaults() {
        let model = ForeignModel::parse(SAMPLE).unwrap();
        let create = model.functions().find(|f| f.name == "sfClock_create").unwrap();
        assert!(create.parameters.is_empty());
        assert!(!create.variadic);
        assert_eq!(create.return_type.as_str(), "sfClock *");
    }

    #[test]
    fn enum_values_kept_verbatim() {
        let model = ForeignModel::parse(SAMPLE).unwrap();
        let style = model.enums().next().unwrap();
        assert_eq!(style.items[0].value, EnumValue::Literal(0));
        assert_eq!(style.items[1].value.to_string(), "sfTitlebar | sfClose");
    }

    #[test]
    fn delegate_candidates() {
        let model = ForeignModel::parse(SAMPLE).unwrap();
        let candidates: Vec<_> = model
            .typedefs()
            .filter(|t| t.is_delegate_candidate())
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(candidates, vec!["sfCallback"]);

        let broken = TypedefDecl {
            name: "sfArrayPtr".to_string(),
            aliased: TypeRef::new("int (*)[4]"),
            source: String::new(),
        };
        assert!(broken.is_delegate_candidate());
    }

    #[test]
    fn rejects_unnamed_declaration() {
        let json = r#"{ "declarations": [ { "kind": "enum", "name": "" } ] }"#;
        assert!(ForeignModel::parse(json).is_err());
    }

    #[test]
    fn rejects_unknown_kind() {
        let json = r#"{ "declarations": [ { "kind": "macro", "name": "X" } ] }"#;
        assert!(ForeignModel::parse(json).is_err());
    }

    #[test]
    fn empty_document() {
        let model = ForeignModel::parse("{}").unwrap();
        assert!(model.is_empty());
        assert!(model.find("anything").is_none());
    }
}
