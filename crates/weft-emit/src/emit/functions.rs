//! Extern entry points, grouped by originating header.

use std::collections::BTreeMap;

use weft_model::model::FunctionDecl;
use weft_model::{ForeignModel, ParameterOverrideTarget};

use super::{check_override_range, override_for, parameter_name, CallableSignature};
use crate::diagnostics::Diagnostics;
use crate::naming::callable_host_name;
use crate::output::{Declaration, ItemGroup, OutputItem, Section, SectionKind};
use crate::translate::TypeTranslator;

/// Lower-case a header path and use `/` as the only separator.
pub fn normalize_source(path: &str) -> String {
    path.trim().replace('\\', "/").to_lowercase()
}

/// Group key of a normalized path: (directory, file name).
fn group_key(normalized: &str) -> (String, String) {
    match normalized.rsplit_once('/') {
        Some((dir, file)) => (dir.to_string(), file.to_string()),
        None => (String::new(), normalized.to_string()),
    }
}

/// Translate the signature of one function.
pub(crate) fn signature(
    decl: &FunctionDecl,
    translator: &TypeTranslator<'_>,
    diagnostics: &mut Diagnostics,
) -> CallableSignature {
    let callable = translator.config().callable_override(&decl.name);
    check_override_range(callable, &decl.name, decl.parameters.len(), diagnostics);

    let return_type = translator.translate(
        &decl.return_type,
        override_for(callable, ParameterOverrideTarget::ReturnValue),
        &format!("{}.return", decl.name),
        diagnostics,
    );

    let parameters = decl
        .parameters
        .iter()
        .enumerate()
        .map(|(index, param)| {
            let name = parameter_name(&param.name, index);
            let subject = format!("{}.{}", decl.name, name);
            let ty = translator.translate(
                &param.type_ref,
                override_for(callable, ParameterOverrideTarget::Parameter(index)),
                &subject,
                diagnostics,
            );
            (name, ty)
        })
        .collect();

    CallableSignature {
        return_type,
        parameters,
        is_variadic: decl.variadic,
    }
}

fn render(decl: &FunctionDecl, translator: &TypeTranslator<'_>, diagnostics: &mut Diagnostics) -> Declaration {
    let config = translator.config();
    let name = callable_host_name(config, &decl.name);
    let sig = signature(decl, translator, diagnostics);

    let mut lines = vec![format!(
        "[DllImport(LibraryName, CallingConvention = CallingConvention.{}, EntryPoint = \"{}\")]",
        config.settings.calling_convention, decl.name
    )];
    if let Some(attribute) = sig.return_attribute() {
        lines.push(attribute);
    }
    lines.push(format!(
        "public static extern {} {}{};",
        sig.return_type.host,
        name,
        sig.parameter_list()
    ));

    Declaration {
        native: decl.name.clone(),
        name,
        lines,
    }
}

/// Emit every function, one group per normalized source path.
///
/// Groups are ordered by (directory, file name) and functions inside a
/// group by canonical name.
pub fn emit(model: &ForeignModel, translator: &TypeTranslator<'_>, diagnostics: &mut Diagnostics) -> Section {
    let mut grouped: BTreeMap<(String, String), (String, Vec<&FunctionDecl>)> = BTreeMap::new();
    for decl in model.functions() {
        let normalized = normalize_source(&decl.source);
        grouped
            .entry(group_key(&normalized))
            .or_insert_with(|| (normalized.clone(), Vec::new()))
            .1
            .push(decl);
    }

    let mut count = 0;
    let groups = grouped
        .into_values()
        .map(|(path, mut decls)| {
            decls.sort_by(|a, b| a.name.cmp(&b.name));
            count += decls.len();
            ItemGroup {
                label: (!path.is_empty()).then_some(path),
                items: decls
                    .into_iter()
                    .map(|decl| OutputItem::Declaration(render(decl, translator, diagnostics)))
                    .collect(),
            }
        })
        .collect();

    tracing::debug!(count, "emitted functions");
    Section {
        kind: SectionKind::Functions,
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::emit::opaque::OpaqueRegistry;
    use weft_model::model::{Parameter, StructDecl, TypedefDecl};
    use weft_model::{ForeignDeclaration, OverrideConfig, TypeRef};

    fn function(name: &str, source: &str, ret: &str, params: &[(&str, &str)]) -> ForeignDeclaration {
        ForeignDeclaration::Function(FunctionDecl {
            name: name.to_string(),
            parameters: params
                .iter()
                .map(|(n, t)| Parameter {
                    name: n.to_string(),
                    type_ref: TypeRef::new(*t),
                })
                .collect(),
            return_type: TypeRef::new(ret),
            variadic: false,
            source: source.to_string(),
        })
    }

    fn run(model: &ForeignModel, config: &OverrideConfig) -> (Section, Diagnostics) {
        let opaque = OpaqueRegistry::build(model, config);
        let translator = TypeTranslator::new(model, config, &opaque);
        let mut diags = Diagnostics::new();
        let section = emit(model, &translator, &mut diags);
        (section, diags)
    }

    #[test]
    fn source_normalization() {
        assert_eq!(normalize_source(r"SFML\Window\Window.h"), "sfml/window/window.h");
        assert_eq!(normalize_source("SFML/Window/Window.h"), "sfml/window/window.h");
        assert_eq!(group_key("sfml/window/window.h"), ("sfml/window".to_string(), "window.h".to_string()));
        assert_eq!(group_key("top.h"), (String::new(), "top.h".to_string()));
    }

    #[test]
    fn grouping_is_stable() {
        let model = ForeignModel::new(vec![
            function("sfWindow_close", r"SFML\Window\Window.h", "void", &[]),
            function("sfClock_create", "SFML/System/Clock.h", "void", &[]),
            function("sfWindow_clear", "sfml/window/WINDOW.h", "void", &[]),
            function("sfAudio_play", "SFML/Audio/Sound.h", "void", &[]),
            function("sfClock_copy", "SFML/System/Clock.h", "void", &[]),
        ]);
        let (section, _) = run(&model, &OverrideConfig::default());

        let labels: Vec<_> = section.groups.iter().map(|g| g.label.clone().unwrap()).collect();
        assert_eq!(
            labels,
            vec![
                "sfml/audio/sound.h",
                "sfml/system/clock.h",
                "sfml/window/window.h",
            ]
        );
        let window: Vec<_> = section.groups[2].items.iter().map(|i| i.native()).collect();
        assert_eq!(window, vec!["sfWindow_clear", "sfWindow_close"]);
        let clock: Vec<_> = section.groups[1].items.iter().map(|i| i.native()).collect();
        assert_eq!(clock, vec!["sfClock_copy", "sfClock_create"]);
    }

    #[test]
    fn extern_declaration_shape() {
        let model = ForeignModel::new(vec![
            ForeignDeclaration::Struct(StructDecl {
                name: "sfWindow".to_string(),
                size: 0,
                fields: Vec::new(),
                source: String::new(),
            }),
            function(
                "sfWindow_setVisible",
                "Window.h",
                "_Bool",
                &[("window", "sfWindow *"), ("visible", "_Bool")],
            ),
        ]);
        let config = OverrideConfig::parse(
            r#"
[settings]
calling_convention = "StdCall"
"#,
        )
        .unwrap();
        let (section, diags) = run(&model, &config);
        assert!(diags.is_empty());

        let decl = section.declarations().next().unwrap();
        assert_eq!(
            decl.lines,
            vec![
                "[DllImport(LibraryName, CallingConvention = CallingConvention.StdCall, EntryPoint = \"sfWindow_setVisible\")]",
                "[return: MarshalAs(UnmanagedType.I1)]",
                "public static extern bool sfWindow_setVisible(sfWindow window, [MarshalAs(UnmanagedType.I1)] bool visible);",
            ]
        );
    }

    #[test]
    fn rejected_callback_typedef_is_a_raw_pointer() {
        let model = ForeignModel::new(vec![
            ForeignDeclaration::Typedef(TypedefDecl {
                name: "log_cb".to_string(),
                aliased: TypeRef::new("void (*)(const char *, ...)"),
                source: String::new(),
            }),
            function("set_log", "log.h", "void", &[("cb", "log_cb")]),
        ]);
        let (section, diags) = run(&model, &OverrideConfig::default());
        assert_eq!(
            section.declarations().next().unwrap().lines.last().unwrap(),
            "public static extern void set_log(IntPtr cb);"
        );
        assert_eq!(diags.count(DiagnosticKind::UnrecognizedType), 1);
    }

    #[test]
    fn callable_override_applies() {
        let model = ForeignModel::new(vec![function(
            "sfWindow_create",
            "Window.h",
            "void *",
            &[("title", "const char *"), ("", "int")],
        )]);
        let config = OverrideConfig::parse(
            r#"
[callables.sfWindow_create]
name = "CreateWindow"
[callables.sfWindow_create.parameters]
"-1" = "WindowHandle"
"0" = "string"
"7" = "int"
"#,
        )
        .unwrap();
        let (section, diags) = run(&model, &config);
        let decl = section.declarations().next().unwrap();
        assert_eq!(decl.name, "CreateWindow");
        assert!(decl.lines[0].contains("EntryPoint = \"sfWindow_create\""));
        assert_eq!(
            decl.lines.last().unwrap(),
            "public static extern WindowHandle CreateWindow(string title, int arg1);"
        );
        assert_eq!(diags.count(DiagnosticKind::OverrideIndexOutOfRange), 1);
    }

    #[test]
    fn variadic_uses_arglist() {
        let mut decl = FunctionDecl {
            name: "log_printf".to_string(),
            parameters: vec![Parameter {
                name: "format".to_string(),
                type_ref: TypeRef::new("const char *"),
            }],
            return_type: TypeRef::new("int"),
            variadic: true,
            source: String::new(),
        };
        let model = ForeignModel::new(vec![ForeignDeclaration::Function(decl.clone())]);
        let (section, _) = run(&model, &OverrideConfig::default());
        assert_eq!(section.groups[0].label, None);
        assert_eq!(
            section.declarations().next().unwrap().lines.last().unwrap(),
            "public static extern int log_printf(IntPtr format, __arglist);"
        );

        decl.variadic = false;
        let model = ForeignModel::new(vec![ForeignDeclaration::Function(decl)]);
        let (section, _) = run(&model, &OverrideConfig::default());
        assert!(!section.declarations().next().unwrap().lines[1].contains("__arglist"));
    }
}
