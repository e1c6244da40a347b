//! Emitted declarations and their rendering into one C# source file.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::diagnostics::Diagnostic;
use crate::emit::opaque::OpaqueRegistry;
use crate::report::GenerationReport;

/// Output sections, in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionKind {
    OpaqueAliases,
    Functions,
    Delegates,
    Structs,
    Enums,
}

impl SectionKind {
    pub const ORDER: [SectionKind; 5] = [
        SectionKind::OpaqueAliases,
        SectionKind::Functions,
        SectionKind::Delegates,
        SectionKind::Structs,
        SectionKind::Enums,
    ];
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::OpaqueAliases => write!(f, "opaque aliases"),
            SectionKind::Functions => write!(f, "functions"),
            SectionKind::Delegates => write!(f, "delegates"),
            SectionKind::Structs => write!(f, "structs"),
            SectionKind::Enums => write!(f, "enums"),
        }
    }
}

/// One emitted host declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Canonical foreign name.
    pub native: String,
    /// Host name.
    pub name: String,
    /// Source lines, unindented.
    pub lines: Vec<String>,
}

/// Placeholder for a declaration whose shape could not be recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unrecognized {
    pub native: String,
    /// The raw type descriptor that failed recognition.
    pub descriptor: String,
    pub reason: String,
}

/// An entry of a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputItem {
    Declaration(Declaration),
    Unrecognized(Unrecognized),
}

impl OutputItem {
    pub fn native(&self) -> &str {
        match self {
            OutputItem::Declaration(decl) => &decl.native,
            OutputItem::Unrecognized(item) => &item.native,
        }
    }

    pub fn is_unrecognized(&self) -> bool {
        matches!(self, OutputItem::Unrecognized(_))
    }

    fn lines(&self) -> Vec<String> {
        match self {
            OutputItem::Declaration(decl) => decl.lines.clone(),
            OutputItem::Unrecognized(item) => vec![format!(
                "// unrecognized: {} = {} ({})",
                item.native, item.descriptor, item.reason
            )],
        }
    }
}

/// Items sharing a label (the source header for functions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemGroup {
    pub label: Option<String>,
    pub items: Vec<OutputItem>,
}

/// All output of one emitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub groups: Vec<ItemGroup>,
}

impl Section {
    /// A section with a single unlabeled group.
    pub fn single(kind: SectionKind, items: Vec<OutputItem>) -> Self {
        Self {
            kind,
            groups: vec![ItemGroup { label: None, items }],
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &OutputItem> {
        self.groups.iter().flat_map(|g| g.items.iter())
    }

    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.items().filter_map(|item| match item {
            OutputItem::Declaration(decl) => Some(decl),
            OutputItem::Unrecognized(_) => None,
        })
    }

    pub fn unrecognized(&self) -> impl Iterator<Item = &Unrecognized> {
        self.items().filter_map(|item| match item {
            OutputItem::Unrecognized(u) => Some(u),
            OutputItem::Declaration(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.items.is_empty())
    }
}

/// The complete result of a generation run.
#[derive(Debug, Clone)]
pub struct Bindings {
    pub namespace: String,
    pub class: String,
    pub library: String,
    /// Sections in [`SectionKind::ORDER`].
    pub sections: Vec<Section>,
    pub diagnostics: Vec<Diagnostic>,
    pub opaque: OpaqueRegistry,
}

const INDENT: &str = "    ";

const HEADER: &[&str] = &[
    "// <auto-generated>",
    "//     Generated by weft. Do not edit by hand.",
    "// </auto-generated>",
];

fn write_lines(out: &mut String, depth: usize, lines: &[String]) {
    for line in lines {
        if !line.is_empty() {
            for _ in 0..depth {
                out.push_str(INDENT);
            }
            out.push_str(line);
        }
        out.push('\n');
    }
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl Bindings {
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Render the bindings as C# source text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in HEADER {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        out.push_str("using System;\n");
        out.push_str("using System.Runtime.InteropServices;\n");

        if let Some(aliases) = self.section(SectionKind::OpaqueAliases) {
            if !aliases.is_empty() {
                out.push('\n');
                for item in aliases.items() {
                    write_lines(&mut out, 0, &item.lines());
                }
            }
        }

        out.push('\n');
        out.push_str(&format!("namespace {}\n{{\n", self.namespace));

        out.push_str(&format!(
            "{INDENT}public static unsafe partial class {}\n{INDENT}{{\n",
            self.class
        ));
        out.push_str(&format!(
            "{INDENT}{INDENT}public const string LibraryName = \"{}\";\n",
            escape_literal(&self.library)
        ));
        if let Some(functions) = self.section(SectionKind::Functions) {
            for group in &functions.groups {
                out.push('\n');
                if let Some(label) = &group.label {
                    write_lines(&mut out, 2, &[format!("// {label}")]);
                }
                for (i, item) in group.items.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    write_lines(&mut out, 2, &item.lines());
                }
            }
        }
        out.push_str(&format!("{INDENT}}}\n"));

        for kind in [SectionKind::Delegates, SectionKind::Structs, SectionKind::Enums] {
            if let Some(section) = self.section(kind) {
                for item in section.items() {
                    out.push('\n');
                    write_lines(&mut out, 1, &item.lines());
                }
            }
        }

        out.push_str("}\n");
        out
    }

    /// SHA-256 of the rendered text, hex encoded.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.render().as_bytes());
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Summary counts for this run.
    pub fn report(&self) -> GenerationReport {
        GenerationReport::from_bindings(self)
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
