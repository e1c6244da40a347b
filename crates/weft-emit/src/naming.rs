//! Foreign identifier → host identifier conversion.

use weft_model::OverrideConfig;

/// C# reserved keywords. Sorted for binary search.
const RESERVED: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Whether `name` is a reserved word of the host language.
pub fn is_reserved(name: &str) -> bool {
    RESERVED.binary_search(&name).is_ok()
}

/// Convert a foreign identifier into a valid host identifier.
///
/// General identifiers keep their spelling apart from character
/// sanitizing and keyword escaping. Enum members are additionally
/// stripped of leading underscores and converted from `SCREAMING_SNAKE`
/// to `PascalCase`. Never fails.
pub fn clean(raw: &str, is_enum_member: bool) -> String {
    let sanitized = sanitize(raw);
    let name = if is_enum_member {
        enumerant_case(&sanitized)
    } else {
        sanitized
    };

    finish(name)
}

/// Host name of a struct, enum or opaque class: the override's target name,
/// else the cleaned canonical name.
pub fn type_host_name(config: &OverrideConfig, canonical: &str) -> String {
    config
        .type_override(canonical)
        .and_then(|ov| ov.name.clone())
        .unwrap_or_else(|| clean(canonical, false))
}

/// Host name of a function or delegate typedef.
pub fn callable_host_name(config: &OverrideConfig, canonical: &str) -> String {
    config
        .callable_override(canonical)
        .and_then(|ov| ov.name.clone())
        .unwrap_or_else(|| clean(canonical, false))
}

/// `line_width` → `LineWidth`, `y` → `Y`. Used for accessor names.
pub fn pascal_case(identifier: &str) -> String {
    let joined: String = sanitize(identifier)
        .split('_')
        .filter(|segment| !segment.is_empty())
        .map(capitalize_first)
        .collect();
    finish(joined)
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn enumerant_case(name: &str) -> String {
    name.trim_start_matches('_')
        .split('_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if segment.chars().any(|c| c.is_ascii_lowercase()) {
                capitalize_first(segment)
            } else {
                let lower = segment.to_ascii_lowercase();
                capitalize_first(&lower)
            }
        })
        .collect()
}

fn capitalize_first(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn finish(name: String) -> String {
    if name.is_empty() {
        return "_".to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("_{name}");
    }
    if is_reserved(&name) {
        return format!("@{name}");
    }
    name
}
