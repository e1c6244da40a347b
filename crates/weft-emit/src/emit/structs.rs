//! Sequential-layout value types with synthesized accessors and equality.
//!
//! Emission happens in two steps. [`plan`] decides, per field, the storage
//! name and type, the visibility and the accessor; [`StructPlan::render`]
//! turns the plan into source lines. Field order is never changed: it is
//! the native memory layout.

use weft_model::model::{Field, StructDecl};
use weft_model::{ForeignModel, ForeignType, TypeOverride, Visibility};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::naming::{clean, pascal_case, type_host_name};
use crate::output::{Declaration, OutputItem, Section, SectionKind};
use crate::translate::{MarshalStrategy, TranslatedType, TypeTranslator};

const MEMBER_INDENT: &str = "    ";

/// Element types a `fixed` buffer may hold.
const FIXED_ELEMENT_TYPES: &[&str] = &[
    "bool", "byte", "char", "double", "float", "int", "long", "sbyte", "short", "uint", "ulong",
    "ushort",
];

/// Types compared with `==` in synthesized equality. Everything else goes
/// through `Equals`.
const OPERATOR_EQ_TYPES: &[&str] = &[
    "IntPtr", "UIntPtr", "bool", "byte", "char", "int", "long", "sbyte", "short", "uint", "ulong",
    "ushort",
];

/// How an accessor converts between storage and the exposed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    PassThrough,
    /// `byte` storage exposed as `bool`.
    BooleanByte,
    /// `int` storage exposed as `bool`.
    BooleanInt,
}

impl Conversion {
    fn for_type(ty: &TranslatedType) -> Self {
        match ty.strategy {
            MarshalStrategy::BooleanByte => Conversion::BooleanByte,
            MarshalStrategy::BooleanInt => Conversion::BooleanInt,
            _ => Conversion::PassThrough,
        }
    }

    fn getter(self, storage: &str) -> String {
        match self {
            Conversion::PassThrough => format!("get => {storage};"),
            Conversion::BooleanByte => format!("get => {storage} > 0;"),
            Conversion::BooleanInt => format!("get => {storage} != 0;"),
        }
    }

    fn setter(self, storage: &str) -> String {
        match self {
            Conversion::PassThrough => format!("set => {storage} = value;"),
            Conversion::BooleanByte => format!("set => {storage} = value ? (byte)1 : (byte)0;"),
            Conversion::BooleanInt => format!("set => {storage} = value ? 1 : 0;"),
        }
    }
}

/// Public property wrapping a private backing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorPlan {
    pub name: String,
    pub host_type: String,
    pub settable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPlan {
    /// Foreign field name.
    pub native: String,
    pub storage_name: String,
    pub storage_type: String,
    /// Element count of a `fixed` buffer.
    pub fixed_len: Option<usize>,
    pub is_public: bool,
    pub readonly: bool,
    /// The foreign name carried the private prefix.
    pub private_by_convention: bool,
    pub conversion: Conversion,
    pub accessor: Option<AccessorPlan>,
}

impl FieldPlan {
    fn declaration(&self) -> String {
        let visibility = if self.is_public { "public" } else { "private" };
        let readonly = if self.readonly { "readonly " } else { "" };
        match self.fixed_len {
            Some(len) => format!(
                "{visibility} fixed {} {}[{len}];",
                self.storage_type, self.storage_name
            ),
            None => format!(
                "{visibility} {readonly}{} {};",
                self.storage_type, self.storage_name
            ),
        }
    }

    fn is_pointer(&self) -> bool {
        self.storage_type.ends_with('*')
    }

    /// Storage expressions covered by equality and hashing: one per field,
    /// one per element for fixed buffers.
    fn elements(&self, receiver: Option<&str>) -> Vec<String> {
        let base = match receiver {
            Some(r) => format!("{r}.{}", self.storage_name),
            None => self.storage_name.clone(),
        };
        match self.fixed_len {
            Some(len) => (0..len).map(|i| format!("{base}[{i}]")).collect(),
            None => vec![base],
        }
    }

    fn comparisons(&self, other: &str) -> Vec<String> {
        let uses_operator = self.fixed_len.is_some()
            || self.is_pointer()
            || OPERATOR_EQ_TYPES.contains(&self.storage_type.as_str());
        self.elements(None)
            .into_iter()
            .zip(self.elements(Some(other)))
            .map(|(mine, theirs)| {
                if uses_operator {
                    format!("{mine} == {theirs}")
                } else {
                    format!("{mine}.Equals({theirs})")
                }
            })
            .collect()
    }

    fn hash_terms(&self) -> Vec<String> {
        self.elements(None)
            .into_iter()
            .map(|element| {
                if self.is_pointer() {
                    format!("(IntPtr){element}")
                } else {
                    element
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructPlan {
    pub native: String,
    pub name: String,
    pub visibility: Visibility,
    pub is_unsafe: bool,
    pub equality: bool,
    pub fields: Vec<FieldPlan>,
}

/// Storage decided for one field.
enum Storage {
    Scalar(TranslatedType),
    Fixed { element: String, len: usize },
    /// Array whose elements cannot live in a `fixed` buffer: one field per
    /// element.
    Expanded { element: TranslatedType, len: usize },
    /// Zero-length array; takes no space.
    Empty,
}

/// Flatten nested arrays into (element type, total length).
fn flatten_array(ty: &ForeignType) -> Option<(&ForeignType, usize)> {
    let ForeignType::Array(..) = ty.strip_const() else {
        return None;
    };
    let mut len = 1usize;
    let mut current = ty.strip_const();
    while let ForeignType::Array(inner, n) = current {
        len = len.saturating_mul(*n);
        current = inner.strip_const();
    }
    Some((current, len))
}

fn field_storage(
    field: &Field,
    explicit: Option<&str>,
    translator: &TypeTranslator<'_>,
    subject: &str,
    diagnostics: &mut Diagnostics,
) -> Storage {
    if explicit.is_some() {
        return Storage::Scalar(translator.translate(&field.type_ref, explicit, subject, diagnostics));
    }

    let Ok(ty) = field.type_ref.parse() else {
        return Storage::Scalar(translator.translate(&field.type_ref, None, subject, diagnostics));
    };
    let Some((element, len)) = flatten_array(&ty) else {
        return Storage::Scalar(translator.translate_type(&ty, None, subject, diagnostics));
    };

    if len == 0 {
        diagnostics.push(
            DiagnosticKind::UnrecognizedType,
            subject,
            format!("zero-length array '{}' has no storage; omitted", field.type_ref),
        );
        return Storage::Empty;
    }

    let translated = translator.translate_type(element, None, subject, diagnostics);
    let element_host = translated
        .boolean_storage()
        .map_or_else(|| translated.host.clone(), str::to_string);
    if FIXED_ELEMENT_TYPES.contains(&element_host.as_str()) {
        Storage::Fixed {
            element: element_host,
            len,
        }
    } else {
        Storage::Expanded {
            element: translated,
            len,
        }
    }
}

/// Decide storage, naming and accessors for one struct.
pub fn plan(decl: &StructDecl, translator: &TypeTranslator<'_>, diagnostics: &mut Diagnostics) -> StructPlan {
    let config = translator.config();
    let defaults = TypeOverride::default();
    let ov = config.type_override(&decl.name).unwrap_or(&defaults);
    let internal = ov.is_internal();
    let properties = ov.properties && !internal;
    let prefix = config.settings.private_field_prefix.as_str();

    let mut fields = Vec::with_capacity(decl.fields.len());
    for field in &decl.fields {
        let (stripped, private_by_convention) = match field.name.strip_prefix(prefix) {
            Some(rest) if !prefix.is_empty() => (rest, true),
            _ => (field.name.as_str(), false),
        };
        let subject = format!("{}.{}", decl.name, field.name);
        let storage = field_storage(field, ov.member_type(&field.name), translator, &subject, diagnostics);

        let cleaned = clean(stripped, false);
        let renamed = || {
            ov.member_name(&field.name)
                .map(str::to_string)
                .unwrap_or_else(|| cleaned.clone())
        };

        let (storage_type, fixed_len, conversion, exposed_type) = match storage {
            Storage::Empty => continue,
            Storage::Expanded { element, len } => {
                let base = if private_by_convention || internal {
                    cleaned.clone()
                } else {
                    renamed()
                };
                fields.extend((0..len).map(|index| FieldPlan {
                    native: format!("{}[{index}]", field.name),
                    storage_name: format!("{base}_{index}"),
                    storage_type: element.host.clone(),
                    fixed_len: None,
                    is_public: !private_by_convention,
                    readonly: ov.readonly,
                    private_by_convention,
                    conversion: Conversion::PassThrough,
                    accessor: None,
                }));
                continue;
            }
            Storage::Fixed { element, len } => (element, Some(len), Conversion::PassThrough, None),
            Storage::Scalar(t) => {
                let storage_type = t
                    .boolean_storage()
                    .map_or_else(|| t.host.clone(), str::to_string);
                (storage_type, None, Conversion::for_type(&t), Some(t.host))
            }
        };

        let mut plan = FieldPlan {
            native: field.name.clone(),
            storage_name: cleaned.clone(),
            storage_type,
            fixed_len,
            is_public: true,
            readonly: ov.readonly && fixed_len.is_none(),
            private_by_convention,
            conversion,
            accessor: None,
        };

        match exposed_type {
            _ if private_by_convention => plan.is_public = false,
            _ if internal => {}
            // Fixed buffers and property-less types expose the field itself.
            None => plan.storage_name = renamed(),
            Some(_) if !properties => plan.storage_name = renamed(),
            Some(host_type) => {
                let name = ov
                    .member_name(&field.name)
                    .map(str::to_string)
                    .unwrap_or_else(|| pascal_case(stripped));
                if name == plan.storage_name {
                    plan.storage_name = format!("_{}", plan.storage_name);
                }
                plan.is_public = false;
                plan.accessor = Some(AccessorPlan {
                    name,
                    host_type,
                    settable: !ov.readonly,
                });
            }
        }
        fields.push(plan);
    }

    let is_unsafe = fields.iter().any(|f| f.fixed_len.is_some() || f.is_pointer());
    StructPlan {
        native: decl.name.clone(),
        name: type_host_name(config, &decl.name),
        visibility: ov.visibility,
        is_unsafe,
        equality: ov.equality,
        fields,
    }
}

impl StructPlan {
    /// Name of the `Equals(T)` parameter, clear of every storage name.
    fn other_name(&self) -> String {
        let mut name = "other".to_string();
        while self.fields.iter().any(|f| f.storage_name == name) {
            name.insert(0, '_');
        }
        name
    }

    fn equality_members(&self) -> Vec<Vec<String>> {
        let name = &self.name;
        let other = self.other_name();

        let comparisons: Vec<String> = self
            .fields
            .iter()
            .flat_map(|f| f.comparisons(&other))
            .collect();
        let mut equals = vec![
            format!("public bool Equals({name} {other})"),
            "{".to_string(),
        ];
        match comparisons.split_first() {
            None => equals.push(format!("{MEMBER_INDENT}return true;")),
            Some((first, rest)) => {
                let mut body = format!("{MEMBER_INDENT}return {first}");
                for term in rest {
                    equals.push(body);
                    body = format!("{MEMBER_INDENT}{MEMBER_INDENT}&& {term}");
                }
                equals.push(format!("{body};"));
            }
        }
        equals.push("}".to_string());

        let mut hash = vec![
            "public override int GetHashCode()".to_string(),
            "{".to_string(),
            format!("{MEMBER_INDENT}var hash = new HashCode();"),
        ];
        for term in self.fields.iter().flat_map(FieldPlan::hash_terms) {
            hash.push(format!("{MEMBER_INDENT}hash.Add({term});"));
        }
        hash.push(format!("{MEMBER_INDENT}return hash.ToHashCode();"));
        hash.push("}".to_string());

        vec![
            equals,
            vec![format!(
                "public override bool Equals(object obj) => obj is {name} value && Equals(value);"
            )],
            vec![
                format!("public static bool operator ==({name} left, {name} right) => left.Equals(right);"),
                format!("public static bool operator !=({name} left, {name} right) => !left.Equals(right);"),
            ],
            hash,
        ]
    }

    /// Source lines of the struct declaration.
    pub fn render(&self) -> Vec<String> {
        let modifiers = if self.is_unsafe {
            format!("{} unsafe", self.visibility)
        } else {
            self.visibility.to_string()
        };
        let interfaces = if self.equality {
            format!(" : IEquatable<{}>", self.name)
        } else {
            String::new()
        };

        let mut blocks: Vec<Vec<String>> = Vec::new();
        if !self.fields.is_empty() {
            blocks.push(self.fields.iter().map(FieldPlan::declaration).collect());
        }
        for field in &self.fields {
            let Some(accessor) = &field.accessor else {
                continue;
            };
            let mut block = vec![
                format!("public {} {}", accessor.host_type, accessor.name),
                "{".to_string(),
                format!("{MEMBER_INDENT}{}", field.conversion.getter(&field.storage_name)),
            ];
            if accessor.settable {
                block.push(format!("{MEMBER_INDENT}{}", field.conversion.setter(&field.storage_name)));
            }
            block.push("}".to_string());
            blocks.push(block);
        }
        if self.equality {
            blocks.extend(self.equality_members());
        }

        let mut lines = vec![
            "[StructLayout(LayoutKind.Sequential)]".to_string(),
            format!("{modifiers} struct {}{interfaces}", self.name),
            "{".to_string(),
        ];
        for (i, block) in blocks.into_iter().enumerate() {
            if i > 0 {
                lines.push(String::new());
            }
            lines.extend(block.into_iter().map(|l| format!("{MEMBER_INDENT}{l}")));
        }
        lines.push("}".to_string());
        lines
    }
}

/// Emit every sized struct, ordered by canonical name.
pub fn emit(model: &ForeignModel, translator: &TypeTranslator<'_>, diagnostics: &mut Diagnostics) -> Section {
    let mut decls: Vec<&StructDecl> = model.structs().collect();
    decls.sort_by(|a, b| a.name.cmp(&b.name));

    let items: Vec<OutputItem> = decls
        .into_iter()
        .map(|decl| {
            let plan = plan(decl, translator, diagnostics);
            OutputItem::Declaration(Declaration {
                native: plan.native.clone(),
                name: plan.name.clone(),
                lines: plan.render(),
            })
        })
        .collect();
    tracing::debug!(count = items.len(), "emitted structs");
    Section::single(SectionKind::Structs, items)
}
