//! Function-pointer typedefs as unmanaged delegates.

use weft_model::model::TypedefDecl;
use weft_model::{ForeignModel, ForeignType, FunctionShape, ParameterOverrideTarget};

use super::{check_override_range, override_for, parameter_name, CallableSignature};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::naming::callable_host_name;
use crate::output::{Declaration, OutputItem, Section, SectionKind, Unrecognized};
use crate::translate::TypeTranslator;

/// Recognize the aliased type of a delegate candidate as a function pointer.
///
/// The error is the reason the shape was rejected.
pub fn recognize(decl: &TypedefDecl) -> Result<FunctionShape, String> {
    let ty = decl.aliased.parse().map_err(|e| e.to_string())?;
    match ty.strip_const() {
        ForeignType::FunctionPointer(shape) if shape.is_variadic => {
            Err("variadic callbacks cannot be marshalled".to_string())
        }
        ForeignType::FunctionPointer(shape) => Ok((**shape).clone()),
        other => Err(format!("'{other}' is not a function pointer")),
    }
}

fn signature(
    decl: &TypedefDecl,
    shape: &FunctionShape,
    translator: &TypeTranslator<'_>,
    diagnostics: &mut Diagnostics,
) -> CallableSignature {
    let callable = translator.config().callable_override(&decl.name);
    check_override_range(callable, &decl.name, shape.parameters.len(), diagnostics);

    let return_type = translator.translate_type(
        &shape.return_type,
        override_for(callable, ParameterOverrideTarget::ReturnValue),
        &format!("{}.return", decl.name),
        diagnostics,
    );
    let parameters = shape
        .parameters
        .iter()
        .enumerate()
        .map(|(index, param)| {
            let name = parameter_name(&param.name, index);
            let ty = translator.translate_type(
                &param.param_type,
                override_for(callable, ParameterOverrideTarget::Parameter(index)),
                &format!("{}.{}", decl.name, name),
                diagnostics,
            );
            (name, ty)
        })
        .collect();

    CallableSignature {
        return_type,
        parameters,
        is_variadic: false,
    }
}

fn render(
    decl: &TypedefDecl,
    shape: &FunctionShape,
    translator: &TypeTranslator<'_>,
    diagnostics: &mut Diagnostics,
) -> Declaration {
    let config = translator.config();
    let name = callable_host_name(config, &decl.name);
    let sig = signature(decl, shape, translator, diagnostics);

    let mut lines = vec![format!(
        "[UnmanagedFunctionPointer(CallingConvention.{})]",
        config.settings.calling_convention
    )];
    if let Some(attribute) = sig.return_attribute() {
        lines.push(attribute);
    }
    let modifier = if sig.needs_unsafe() { "public unsafe" } else { "public" };
    lines.push(format!(
        "{modifier} delegate {} {}{};",
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

/// Emit a delegate for every pointer typedef, ordered by canonical name.
///
/// Candidates that are not function pointers become [`Unrecognized`]
/// placeholders.
pub fn emit(model: &ForeignModel, translator: &TypeTranslator<'_>, diagnostics: &mut Diagnostics) -> Section {
    let mut candidates: Vec<&TypedefDecl> = model
        .typedefs()
        .filter(|decl| decl.is_delegate_candidate())
        .collect();
    candidates.sort_by(|a, b| a.name.cmp(&b.name));

    let items: Vec<OutputItem> = candidates
        .into_iter()
        .map(|decl| match recognize(decl) {
            Ok(shape) => OutputItem::Declaration(render(decl, &shape, translator, diagnostics)),
            Err(reason) => {
                diagnostics.push(
                    DiagnosticKind::UnrecognizedDelegate,
                    decl.name.as_str(),
                    format!("'{}' emitted as placeholder: {reason}", decl.aliased),
                );
                OutputItem::Unrecognized(Unrecognized {
                    native: decl.name.clone(),
                    descriptor: decl.aliased.to_string(),
                    reason,
                })
            }
        })
        .collect();

    tracing::debug!(
        count = items.len(),
        unrecognized = items.iter().filter(|i| i.is_unrecognized()).count(),
        "emitted delegates"
    );
    Section::single(SectionKind::Delegates, items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::opaque::OpaqueRegistry;
    use weft_model::model::StructDecl;
    use weft_model::{ForeignDeclaration, OverrideConfig, TypeRef};

    fn typedef(name: &str, aliased: &str) -> ForeignDeclaration {
        ForeignDeclaration::Typedef(TypedefDecl {
            name: name.to_string(),
            aliased: TypeRef::new(aliased),
            source: String::new(),
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
    fn recognition() {
        let ok = TypedefDecl {
            name: "cb".to_string(),
            aliased: TypeRef::new("void (*)(int, void *)"),
            source: String::new(),
        };
        assert_eq!(recognize(&ok).unwrap().parameters.len(), 2);

        for aliased in ["char *", "int (*)[4]", "void (*)(const char *, ...)"] {
            let bad = TypedefDecl {
                name: "bad".to_string(),
                aliased: TypeRef::new(aliased),
                source: String::new(),
            };
            assert!(recognize(&bad).is_err(), "{aliased}");
        }
    }

    #[test]
    fn one_unrecognized_among_many() {
        let model = ForeignModel::new(vec![
            typedef("cb_c", "void (*)(int)"),
            typedef("cb_a", "int (*)(void)"),
            typedef("weird", "int (*)[4]"),
            typedef("cb_b", "void (*)(void *, float)"),
            typedef("counter_t", "unsigned int"),
        ]);
        let (section, diags) = run(&model, &OverrideConfig::default());

        assert_eq!(section.declarations().count(), 3);
        assert_eq!(section.unrecognized().count(), 1);
        assert_eq!(diags.count(DiagnosticKind::UnrecognizedDelegate), 1);

        let order: Vec<_> = section.items().map(|i| i.native()).collect();
        assert_eq!(order, vec!["cb_a", "cb_b", "cb_c", "weird"]);
    }

    #[test]
    fn delegate_shape() {
        let model = ForeignModel::new(vec![
            ForeignDeclaration::Struct(StructDecl {
                name: "sfVector2f".to_string(),
                size: 8,
                fields: Vec::new(),
                source: String::new(),
            }),
            typedef("sfFilter", "sfBool (*)(const sfVector2f *point, void *userData)"),
            typedef("sfBool", "int"),
        ]);
        let config = OverrideConfig::parse(
            r#"
[settings]
boolean_types = ["sfBool"]

[callables.sfFilter]
name = "Filter"
[callables.sfFilter.parameters]
"1" = "IntPtr"
"#,
        )
        .unwrap();
        let (section, diags) = run(&model, &config);
        assert!(diags.is_empty());

        let decl = section.declarations().next().unwrap();
        assert_eq!(
            decl.lines,
            vec![
                "[UnmanagedFunctionPointer(CallingConvention.Cdecl)]",
                "[return: MarshalAs(UnmanagedType.Bool)]",
                "public unsafe delegate bool Filter(sfVector2f* point, IntPtr userData);",
            ]
        );
    }

    #[test]
    fn boolean_parameter_marshalled() {
        let model = ForeignModel::new(vec![typedef("toggle_fn", "void (*)(_Bool)")]);
        let (section, _) = run(&model, &OverrideConfig::default());
        assert_eq!(
            section.declarations().next().unwrap().lines.last().unwrap(),
            "public delegate void toggle_fn([MarshalAs(UnmanagedType.I1)] bool arg0);"
        );
    }
}
