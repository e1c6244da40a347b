//! Raw type descriptor parser.
//!
//! The header parser hands every type reference over as its C spelling
//! (`const char *`, `struct sfWindow *`, `int (*)(void *, int)`, `float[4]`).
//! This module turns that spelling into a structural [`ForeignType`].
//!
//! Handles builtin and stdint types, `const`/`volatile` qualifiers, tagged
//! names, pointers, fixed-size arrays and function pointers (including
//! function pointers nested in parameter lists). Pointers to arrays and
//! other parenthesized declarators are rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// A structural C type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForeignType {
    Void,
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Float,
    Double,
    LongDouble,
    // stdint / stddef types
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    SizeT,
    PtrDiffT,
    IntPtrT,
    UIntPtrT,
    /// Pointer to another type.
    Pointer(Box<ForeignType>),
    /// Const-qualified type.
    Const(Box<ForeignType>),
    /// Fixed-size array.
    Array(Box<ForeignType>, usize),
    /// Reference to a struct, enum or typedef by name.
    Named(String),
    /// Pointer to a function.
    FunctionPointer(Box<FunctionShape>),
}

/// Return type and parameters of a function pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionShape {
    /// Return type.
    pub return_type: ForeignType,
    /// Parameters (excluding variadic `...`).
    pub parameters: Vec<ForeignParam>,
    /// Whether the function is variadic (`...`).
    pub is_variadic: bool,
}

/// A function pointer parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignParam {
    /// Parameter type.
    pub param_type: ForeignType,
    /// Parameter name (may be empty if unnamed).
    pub name: String,
}

impl ForeignType {
    /// Parse a raw type descriptor.
    ///
    /// Examples:
    /// - `"unsigned int"`
    /// - `"const struct sfWindow *"`
    /// - `"void (*)(void *, int)"`
    /// - `"float[4]"`
    pub fn parse(input: &str) -> Result<Self> {
        let (ty, name) = parse_declaration(input)?;
        if !name.is_empty() {
            return Err(invalid(input, format!("unexpected identifier '{name}'")));
        }
        Ok(ty)
    }

    /// Whether this type is void.
    pub fn is_void(&self) -> bool {
        matches!(self.strip_const(), ForeignType::Void)
    }

    /// Whether this type is pointer-shaped (data or function pointer).
    pub fn is_pointer(&self) -> bool {
        matches!(
            self.strip_const(),
            ForeignType::Pointer(_) | ForeignType::FunctionPointer(_)
        )
    }

    /// Strip const qualifiers from outer level.
    pub fn strip_const(&self) -> &ForeignType {
        match self {
            ForeignType::Const(inner) => inner.strip_const(),
            other => other,
        }
    }

    /// The name this type is looked up under: the innermost named type
    /// below pointers, arrays and qualifiers, or the spelling of the
    /// innermost builtin.
    pub fn base_name(&self) -> String {
        match self {
            ForeignType::Pointer(inner) | ForeignType::Const(inner) | ForeignType::Array(inner, _) => {
                inner.base_name()
            }
            ForeignType::Named(name) => name.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ForeignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForeignType::Void => write!(f, "void"),
            ForeignType::Bool => write!(f, "_Bool"),
            ForeignType::Char => write!(f, "char"),
            ForeignType::SignedChar => write!(f, "signed char"),
            ForeignType::UnsignedChar => write!(f, "unsigned char"),
            ForeignType::Short => write!(f, "short"),
            ForeignType::UnsignedShort => write!(f, "unsigned short"),
            ForeignType::Int => write!(f, "int"),
            ForeignType::UnsignedInt => write!(f, "unsigned int"),
            ForeignType::Long => write!(f, "long"),
            ForeignType::UnsignedLong => write!(f, "unsigned long"),
            ForeignType::LongLong => write!(f, "long long"),
            ForeignType::UnsignedLongLong => write!(f, "unsigned long long"),
            ForeignType::Float => write!(f, "float"),
            ForeignType::Double => write!(f, "double"),
            ForeignType::LongDouble => write!(f, "long double"),
            ForeignType::Int8 => write!(f, "int8_t"),
            ForeignType::Int16 => write!(f, "int16_t"),
            ForeignType::Int32 => write!(f, "int32_t"),
            ForeignType::Int64 => write!(f, "int64_t"),
            ForeignType::UInt8 => write!(f, "uint8_t"),
            ForeignType::UInt16 => write!(f, "uint16_t"),
            ForeignType::UInt32 => write!(f, "uint32_t"),
            ForeignType::UInt64 => write!(f, "uint64_t"),
            ForeignType::SizeT => write!(f, "size_t"),
            ForeignType::PtrDiffT => write!(f, "ptrdiff_t"),
            ForeignType::IntPtrT => write!(f, "intptr_t"),
            ForeignType::UIntPtrT => write!(f, "uintptr_t"),
            ForeignType::Pointer(inner) => write!(f, "{inner}*"),
            ForeignType::Const(inner) => write!(f, "const {inner}"),
            ForeignType::Array(inner, len) => write!(f, "{inner}[{len}]"),
            ForeignType::Named(name) => write!(f, "{name}"),
            ForeignType::FunctionPointer(shape) => write!(f, "{shape}"),
        }
    }
}

impl fmt::Display for FunctionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (*)(", self.return_type)?;
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param.param_type)?;
            if !param.name.is_empty() {
                write!(f, " {}", param.name)?;
            }
        }
        if self.is_variadic {
            if !self.parameters.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "...")?;
        }
        write!(f, ")")
    }
}

/// A raw type descriptor as it appears in the foreign model.
///
/// Kept as text so that a descriptor the parser cannot make sense of still
/// survives into diagnostics and fallback decisions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRef(String);

impl TypeRef {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self(descriptor.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the descriptor into its structural shape.
    pub fn parse(&self) -> Result<ForeignType> {
        ForeignType::parse(&self.0)
    }

    /// Whether the spelling mentions a pointer or a parenthesized
    /// declarator, regardless of whether it parses.
    pub fn looks_like_pointer(&self) -> bool {
        self.0.contains('*') || self.0.contains('(')
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeRef {
    fn from(descriptor: &str) -> Self {
        Self::new(descriptor)
    }
}

fn invalid(descriptor: &str, detail: impl Into<String>) -> ModelError {
    ModelError::InvalidType {
        descriptor: descriptor.to_string(),
        detail: detail.into(),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse a declaration: a type optionally followed by a declarator name.
fn parse_declaration(input: &str) -> Result<(ForeignType, String)> {
    let s = input.trim();
    if s.is_empty() {
        return Err(invalid(input, "empty type"));
    }

    if let Some(open) = s.find('(') {
        return parse_function_pointer(s, open);
    }

    let (rest, dims) = split_array_suffix(s)?;
    let (base, name) = parse_declarator(rest)?;
    let ty = dims
        .iter()
        .rev()
        .fold(base, |acc, &len| ForeignType::Array(Box::new(acc), len));
    Ok((ty, name))
}

/// Strip trailing `[N]` suffixes, returning the dimensions outermost first.
fn split_array_suffix(s: &str) -> Result<(&str, Vec<usize>)> {
    let mut rest = s.trim_end();
    let mut dims = Vec::new();
    while rest.ends_with(']') {
        let open = rest.rfind('[').ok_or_else(|| invalid(s, "unbalanced ']'"))?;
        let size = rest[open + 1..rest.len() - 1].trim();
        // `[]` is a flexible array member
        let len = if size.is_empty() {
            0
        } else {
            size.parse::<usize>()
                .map_err(|_| invalid(s, format!("unsupported array size '{size}'")))?
        };
        dims.push(len);
        rest = rest[..open].trim_end();
    }
    dims.reverse();
    Ok((rest, dims))
}

/// Parse `ret (*name)(params)`; `name` may be empty.
fn parse_function_pointer(s: &str, open: usize) -> Result<(ForeignType, String)> {
    let close = s[open..]
        .find(')')
        .map(|i| open + i)
        .ok_or_else(|| invalid(s, "unbalanced '('"))?;

    let declarator = s[open + 1..close].trim();
    let Some(mut inner) = declarator.strip_prefix('*') else {
        return Err(invalid(s, "parenthesized declarator is not a function pointer"));
    };

    // `(**fn)` is a pointer to a function pointer
    let mut indirection = 0;
    loop {
        inner = inner.trim_start();
        if let Some(rest) = inner.strip_prefix('*') {
            indirection += 1;
            inner = rest;
        } else if let Some(rest) = inner
            .strip_prefix("const")
            .filter(|rest| !rest.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_'))
        {
            inner = rest;
        } else {
            break;
        }
    }
    let name = inner.trim();
    if !name.is_empty() && !is_identifier(name) {
        return Err(invalid(s, format!("unexpected declarator '{name}'")));
    }

    let params = s[close + 1..]
        .trim()
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| invalid(s, "expected parameter list after function pointer declarator"))?;

    let (return_type, return_name) = parse_declaration(&s[..open])?;
    if !return_name.is_empty() {
        return Err(invalid(s, format!("unexpected identifier '{return_name}' in return type")));
    }
    let (parameters, is_variadic) = parse_params(params)?;

    let mut ty = ForeignType::FunctionPointer(Box::new(FunctionShape {
        return_type,
        parameters,
        is_variadic,
    }));
    for _ in 0..indirection {
        ty = ForeignType::Pointer(Box::new(ty));
    }
    Ok((ty, name.to_string()))
}

/// Split a parameter list on commas that are not nested in parentheses.
fn split_params(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Parse the parameter list between `(` and `)`.
fn parse_params(s: &str) -> Result<(Vec<ForeignParam>, bool)> {
    let s = s.trim();

    // Handle `void` or empty parameter lists
    if s.is_empty() || s == "void" {
        return Ok((Vec::new(), false));
    }

    let parts = split_params(s);
    let mut params = Vec::new();
    let mut is_variadic = false;

    for (i, part) in parts.iter().enumerate() {
        let part = part.trim();
        if part == "..." {
            if i != parts.len() - 1 {
                return Err(invalid(s, "'...' must be the last parameter"));
            }
            is_variadic = true;
            continue;
        }

        let (param_type, name) = parse_declaration(part)?;
        params.push(ForeignParam { param_type, name });
    }

    Ok((params, is_variadic))
}

/// Tokenize a declaration fragment, splitting on whitespace but keeping `*`
/// as separate tokens.
fn tokenize(s: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    for part in s.split_whitespace() {
        let mut remaining = part;
        while !remaining.is_empty() {
            if let Some(star_pos) = remaining.find('*') {
                if star_pos > 0 {
                    tokens.push(&remaining[..star_pos]);
                }
                tokens.push("*");
                remaining = &remaining[star_pos + 1..];
            } else {
                tokens.push(remaining);
                break;
            }
        }
    }
    tokens
}

/// Parse `base-type [const] [*...] [name]`.
fn parse_declarator(s: &str) -> Result<(ForeignType, String)> {
    let tokens = tokenize(s);
    if tokens.is_empty() {
        return Err(invalid(s, "expected type"));
    }

    let (mut ty, consumed) = parse_base_type(s, &tokens)?;
    let mut name = String::new();
    let mut seen_pointer = false;

    for tok in &tokens[consumed..] {
        match *tok {
            "*" => {
                if !name.is_empty() {
                    return Err(invalid(s, "'*' after declarator name"));
                }
                seen_pointer = true;
                ty = ForeignType::Pointer(Box::new(ty));
            }
            // `char const *` qualifies the pointee; `char * const` the
            // pointer itself, which has no host-side meaning.
            "const" => {
                if !seen_pointer && !matches!(ty, ForeignType::Const(_)) {
                    ty = ForeignType::Const(Box::new(ty));
                }
            }
            "volatile" | "restrict" | "__restrict" => {}
            ident if is_identifier(ident) && name.is_empty() => name = ident.to_string(),
            other => {
                return Err(invalid(s, format!("unexpected token '{other}'")));
            }
        }
    }

    Ok((ty, name))
}

/// Parse a type specifier from the front of a token sequence.
fn parse_base_type(descriptor: &str, tokens: &[&str]) -> Result<(ForeignType, usize)> {
    let mut pos = 0;
    let mut is_const = false;

    // Leading qualifiers
    while pos < tokens.len() && matches!(tokens[pos], "const" | "volatile") {
        is_const |= tokens[pos] == "const";
        pos += 1;
    }
    if pos >= tokens.len() {
        return Err(invalid(descriptor, "expected type after qualifier"));
    }

    let qualify = |ct: ForeignType| {
        if is_const {
            ForeignType::Const(Box::new(ct))
        } else {
            ct
        }
    };

    // Tagged names
    if matches!(tokens[pos], "struct" | "union" | "enum") {
        pos += 1;
        match tokens.get(pos) {
            Some(name) if is_identifier(name) => {
                return Ok((qualify(ForeignType::Named(name.to_string())), pos + 1));
            }
            _ => return Err(invalid(descriptor, "expected tag name")),
        }
    }

    // Optional trailing `int` after short/long/unsigned
    let skip_int = |pos: usize| -> usize {
        if tokens.get(pos) == Some(&"int") {
            pos + 1
        } else {
            pos
        }
    };

    let is_unsigned = tokens[pos] == "unsigned";
    let is_signed = tokens[pos] == "signed";

    if is_unsigned || is_signed {
        pos += 1;
        let ct = match tokens.get(pos).copied() {
            Some("char") => {
                pos += 1;
                if is_unsigned { ForeignType::UnsignedChar } else { ForeignType::SignedChar }
            }
            Some("short") => {
                pos = skip_int(pos + 1);
                if is_unsigned { ForeignType::UnsignedShort } else { ForeignType::Short }
            }
            Some("int") => {
                pos += 1;
                if is_unsigned { ForeignType::UnsignedInt } else { ForeignType::Int }
            }
            Some("long") => {
                pos += 1;
                if tokens.get(pos) == Some(&"long") {
                    pos = skip_int(pos + 1);
                    if is_unsigned { ForeignType::UnsignedLongLong } else { ForeignType::LongLong }
                } else {
                    pos = skip_int(pos);
                    if is_unsigned { ForeignType::UnsignedLong } else { ForeignType::Long }
                }
            }
            // bare `unsigned` or `signed` means `unsigned int` / `signed int`
            _ => {
                if is_unsigned { ForeignType::UnsignedInt } else { ForeignType::Int }
            }
        };
        return Ok((qualify(ct), pos));
    }

    let ct = match tokens[pos] {
        "void" => { pos += 1; ForeignType::Void }
        "char" => { pos += 1; ForeignType::Char }
        "short" => { pos = skip_int(pos + 1); ForeignType::Short }
        "int" => { pos += 1; ForeignType::Int }
        "long" => {
            pos += 1;
            match tokens.get(pos).copied() {
                Some("long") => { pos = skip_int(pos + 1); ForeignType::LongLong }
                Some("double") => { pos += 1; ForeignType::LongDouble }
                _ => { pos = skip_int(pos); ForeignType::Long }
            }
        }
        "float" => { pos += 1; ForeignType::Float }
        "double" => { pos += 1; ForeignType::Double }
        "_Bool" | "bool" => { pos += 1; ForeignType::Bool }
        "size_t" => { pos += 1; ForeignType::SizeT }
        "ptrdiff_t" | "ssize_t" => { pos += 1; ForeignType::PtrDiffT }
        "intptr_t" => { pos += 1; ForeignType::IntPtrT }
        "uintptr_t" => { pos += 1; ForeignType::UIntPtrT }
        "int8_t" => { pos += 1; ForeignType::Int8 }
        "int16_t" => { pos += 1; ForeignType::Int16 }
        "int32_t" => { pos += 1; ForeignType::Int32 }
        "int64_t" => { pos += 1; ForeignType::Int64 }
        "uint8_t" => { pos += 1; ForeignType::UInt8 }
        "uint16_t" => { pos += 1; ForeignType::UInt16 }
        "uint32_t" => { pos += 1; ForeignType::UInt32 }
        "uint64_t" => { pos += 1; ForeignType::UInt64 }
        ident if is_identifier(ident) => { pos += 1; ForeignType::Named(ident.to_string()) }
        other => {
            return Err(invalid(descriptor, format!("unknown type '{other}'")));
        }
    };
    Ok((qualify(ct), pos))
}
