//! Enums, with optional `[Flags]`.

use weft_model::model::EnumDecl;
use weft_model::{ForeignModel, OverrideConfig, Visibility};

use crate::naming::{clean, type_host_name};
use crate::output::{Declaration, OutputItem, Section, SectionKind};

fn render(decl: &EnumDecl, config: &OverrideConfig) -> Declaration {
    let ov = config.type_override(&decl.name);
    let name = type_host_name(config, &decl.name);
    let visibility = ov.map(|o| o.visibility).unwrap_or(Visibility::Public);

    let mut lines = Vec::new();
    if ov.is_some_and(|o| o.flags) {
        lines.push("[Flags]".to_string());
    }
    lines.push(format!("{visibility} enum {name}"));
    lines.push("{".to_string());
    // Items keep declaration order and their source value spelling.
    for item in &decl.items {
        let item_name = ov
            .and_then(|o| o.member_name(&item.name))
            .map(str::to_string)
            .unwrap_or_else(|| clean(&item.name, true));
        lines.push(format!("    {item_name} = {},", item.value));
    }
    lines.push("}".to_string());

    Declaration {
        native: decl.name.clone(),
        name,
        lines,
    }
}

/// Emit every enum, ordered by canonical name.
pub fn emit(model: &ForeignModel, config: &OverrideConfig) -> Section {
    let mut decls: Vec<&EnumDecl> = model.enums().collect();
    decls.sort_by(|a, b| a.name.cmp(&b.name));

    let items: Vec<OutputItem> = decls
        .into_iter()
        .map(|decl| OutputItem::Declaration(render(decl, config)))
        .collect();
    tracing::debug!(count = items.len(), "emitted enums");
    Section::single(SectionKind::Enums, items)
}
