//! Pipeline driver: validates settings, runs every emitter in the fixed
//! order and assembles [`Bindings`].

use tracing::info;
use weft_model::{ForeignDeclaration, ForeignModel, OverrideConfig};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::emit::{delegates, enums, functions, opaque, structs};
use crate::error::{EmitError, Result};
use crate::output::Bindings;
use crate::translate::{boolean_strategy, TypeTranslator};

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Reject settings the output cannot be produced without.
pub fn validate_settings(config: &OverrideConfig) -> Result<()> {
    let settings = &config.settings;
    let required = [
        ("namespace", &settings.namespace),
        ("class", &settings.class),
        ("library", &settings.library),
    ];
    for (key, value) in required {
        if value.trim().is_empty() {
            return Err(EmitError::MissingSetting { key });
        }
    }

    if !settings.namespace.split('.').all(is_identifier) {
        return Err(EmitError::InvalidSetting {
            key: "namespace",
            detail: format!("'{}' is not a dotted identifier", settings.namespace),
        });
    }
    if !is_identifier(&settings.class) {
        return Err(EmitError::InvalidSetting {
            key: "class",
            detail: format!("'{}' is not an identifier", settings.class),
        });
    }
    Ok(())
}

/// Warn about overrides that can never apply.
fn check_overrides(model: &ForeignModel, config: &OverrideConfig, diagnostics: &mut Diagnostics) {
    for name in &config.settings.boolean_types {
        if matches!(name.as_str(), "bool" | "_Bool") || boolean_strategy(model, name).is_some() {
            continue;
        }
        diagnostics.push(
            DiagnosticKind::UnsupportedBooleanType,
            name.as_str(),
            "not a typedef of a one- or four-byte integer; translated as its native type",
        );
    }

    for name in config.types.keys() {
        match model.find(name) {
            Some(
                ForeignDeclaration::Struct(_)
                | ForeignDeclaration::Enum(_)
                | ForeignDeclaration::OpaqueClass(_),
            ) => {}
            Some(other) => diagnostics.push(
                DiagnosticKind::StaleTypeOverride,
                name.as_str(),
                format!("'{}' is not a struct, enum or opaque class", other.name()),
            ),
            None => diagnostics.push(
                DiagnosticKind::StaleTypeOverride,
                name.as_str(),
                "type override matches nothing in the model",
            ),
        }
    }

    for (name, callable) in &config.callables {
        match model.find(name) {
            Some(ForeignDeclaration::Function(_) | ForeignDeclaration::Typedef(_)) => {}
            Some(_) => diagnostics.push(
                DiagnosticKind::StaleCallableOverride,
                name.as_str(),
                "callable override names a type, not a function or typedef",
            ),
            None => diagnostics.push(
                DiagnosticKind::StaleCallableOverride,
                name.as_str(),
                "callable override matches nothing in the model",
            ),
        }
        for key in &callable.malformed_keys {
            diagnostics.push(
                DiagnosticKind::MalformedOverrideKey,
                name.as_str(),
                format!("parameter key '{key}' is neither an index nor -1; ignored"),
            );
        }
    }
}

/// Generate bindings for a model.
///
/// Fails only on unusable settings. Everything else degrades to a fallback
/// or placeholder and is reported in [`Bindings::diagnostics`].
pub fn generate(model: &ForeignModel, config: &OverrideConfig) -> Result<Bindings> {
    validate_settings(config)?;

    let mut diagnostics = Diagnostics::new();
    check_overrides(model, config, &mut diagnostics);

    // The registry must be complete before any translation happens.
    let (aliases, registry) = opaque::emit(model, config);
    let translator = TypeTranslator::new(model, config, &registry);

    let sections = vec![
        aliases,
        functions::emit(model, &translator, &mut diagnostics),
        delegates::emit(model, &translator, &mut diagnostics),
        structs::emit(model, &translator, &mut diagnostics),
        enums::emit(model, config),
    ];

    let settings = &config.settings;
    let bindings = Bindings {
        namespace: settings.namespace.clone(),
        class: settings.class.clone(),
        library: settings.library.clone(),
        sections,
        diagnostics: diagnostics.into_vec(),
        opaque: registry,
    };

    info!(
        namespace = %bindings.namespace,
        declarations = model.len(),
        diagnostics = bindings.diagnostics.len(),
        "bindings generated"
    );
    Ok(bindings)
}

/// Parse a JSON model and a TOML configuration, then [`generate`].
pub fn generate_from_str(model_json: &str, config_toml: &str) -> Result<Bindings> {
    let model = ForeignModel::parse(model_json)?;
    let config = OverrideConfig::parse(config_toml)?;
    generate(&model, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::SectionKind;

    const SETTINGS: &str = r#"
[settings]
namespace = "Demo.Native"
class = "Native"
library = "demo"
"#;

    const MODEL: &str = r#"
{ "declarations": [
  { "kind": "struct", "name": "sfWindow", "size": 0 },
  { "kind": "struct", "name": "Point", "size": 8,
    "fields": [ { "name": "_private_x", "type": "int32_t" }, { "name": "y", "type": "int32_t" } ] },
  { "kind": "enum", "name": "Flags",
    "items": [ { "name": "None", "value": 0 }, { "name": "A", "value": 1 }, { "name": "B", "value": 2 } ] },
  { "kind": "typedef", "name": "sfCallback", "type": "void (*)(void *)" },
  { "kind": "typedef", "name": "sfShapeFn", "type": "sfBool (*)(sfWindow *, Point)" },
  { "kind": "typedef", "name": "sfBool", "type": "int" },
  { "kind": "typedef", "name": "sfMatrixPtr", "type": "float (*)[16]" },
  { "kind": "function", "name": "sfWindow_close", "source": "SFML\\Window\\Window.h",
    "parameters": [ { "name": "window", "type": "sfWindow *" } ] },
  { "kind": "function", "name": "sfWindow_isOpen", "source": "SFML/Window/Window.h",
    "return": "sfBool", "parameters": [ { "name": "window", "type": "const sfWindow *" } ] },
  { "kind": "function", "name": "sfSleep", "source": "SFML/System/Sleep.h",
    "parameters": [ { "name": "duration", "type": "int64_t" } ] }
] }
"#;

    fn config(extra: &str) -> String {
        format!(
            r#"{SETTINGS}boolean_types = ["sfBool"]
{extra}"#
        )
    }

    #[test]
    fn deterministic_output() {
        let first = generate_from_str(MODEL, &config("")).unwrap();
        let second = generate_from_str(MODEL, &config("")).unwrap();
        assert_eq!(first.render(), second.render());
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn input_order_does_not_matter() {
        let model = ForeignModel::parse(MODEL).unwrap();
        let mut reversed: Vec<_> = model.declarations().to_vec();
        reversed.reverse();
        let reversed = ForeignModel::new(reversed);

        let config = OverrideConfig::parse(&config("")).unwrap();
        let a = generate(&model, &config).unwrap();
        let b = generate(&reversed, &config).unwrap();
        assert_eq!(a.render(), b.render());
    }

    #[test]
    fn section_order_and_contents() {
        let bindings = generate_from_str(MODEL, &config("")).unwrap();
        let kinds: Vec<_> = bindings.sections.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, SectionKind::ORDER.to_vec());

        let text = bindings.render();
        let alias = text.find("using sfWindow = System.IntPtr;").unwrap();
        let function = text.find("sfWindow_close").unwrap();
        let delegate = text.find("public delegate void sfCallback").unwrap();
        let point = text.find("public struct Point").unwrap();
        let flags = text.find("public enum Flags").unwrap();
        assert!(alias < function && function < delegate && delegate < point && point < flags);

        assert!(text.contains(
            "public static extern bool sfWindow_isOpen(sfWindow window);"
        ));
        assert!(text.contains(
            "public delegate bool sfShapeFn(sfWindow arg0, Point arg1);"
        ));
    }

    #[test]
    fn non_fatal_degradation() {
        let bindings = generate_from_str(MODEL, &config("")).unwrap();
        let delegates = bindings.section(SectionKind::Delegates).unwrap();
        assert_eq!(delegates.declarations().count(), 2);
        assert_eq!(delegates.unrecognized().count(), 1);
        assert_eq!(delegates.unrecognized().next().unwrap().native, "sfMatrixPtr");
        assert!(bindings
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::UnrecognizedDelegate && d.subject == "sfMatrixPtr"));
        assert!(bindings.render().contains("// unrecognized: sfMatrixPtr"));
    }

    #[test]
    fn function_groups() {
        let bindings = generate_from_str(MODEL, &config("")).unwrap();
        let functions = bindings.section(SectionKind::Functions).unwrap();
        let labels: Vec<_> = functions
            .groups
            .iter()
            .map(|g| g.label.as_deref().unwrap())
            .collect();
        assert_eq!(labels, vec!["sfml/system/sleep.h", "sfml/window/window.h"]);
        let window: Vec<_> = functions.groups[1].items.iter().map(|i| i.native()).collect();
        assert_eq!(window, vec!["sfWindow_close", "sfWindow_isOpen"]);
    }

    #[test]
    fn point_and_flags_scenarios() {
        let bindings = generate_from_str(
            MODEL,
            &config(
                r#"
[types.Flags]
flags = true
"#,
            ),
        )
        .unwrap();
        let text = bindings.render();
        assert!(text.contains("        private int x;\n        private int y;\n"));
        assert!(text.contains("        public int Y\n"));
        assert!(!text.contains("public int X"));
        assert!(text.contains("    [Flags]\n    public enum Flags\n    {\n        None = 0,\n        A = 1,\n        B = 2,\n    }\n"));
    }

    #[test]
    fn override_precedence() {
        let bindings = generate_from_str(
            MODEL,
            &config(
                r#"
[types.Point.member_types]
y = "CustomInt"

[callables.sfWindow_isOpen.parameters]
"-1" = "int"
"0" = "ref WindowState"
"#,
            ),
        )
        .unwrap();
        let text = bindings.render();
        assert!(text.contains("private CustomInt y;"));
        assert!(text.contains("public static extern int sfWindow_isOpen(ref WindowState window);"));
        assert!(!text.contains("[return: MarshalAs(UnmanagedType.Bool)]\n        public static extern int"));
    }

    #[test]
    fn stale_and_malformed_overrides_warn() {
        let bindings = generate_from_str(
            MODEL,
            &config(
                r#"
[types.Gone]
name = "Gone"

[types.sfCallback]
name = "Cb"

[callables.sfRemoved]
name = "Removed"

[callables.sfSleep.parameters]
"first" = "long"
"3" = "long"
"#,
            ),
        )
        .unwrap();
        let count = |kind: DiagnosticKind| bindings.diagnostics.iter().filter(|d| d.kind == kind).count();
        assert_eq!(count(DiagnosticKind::StaleTypeOverride), 2);
        assert_eq!(count(DiagnosticKind::StaleCallableOverride), 1);
        assert_eq!(count(DiagnosticKind::MalformedOverrideKey), 1);
        assert_eq!(count(DiagnosticKind::OverrideIndexOutOfRange), 1);
        assert!(bindings.render().contains("public static extern void sfSleep(long duration);"));
    }

    #[test]
    fn four_byte_boolean_typedef() {
        let bindings = generate_from_str(MODEL, &config("")).unwrap();
        let text = bindings.render();
        assert!(text.contains(
            "        [return: MarshalAs(UnmanagedType.Bool)]\n        public static extern bool sfWindow_isOpen(sfWindow window);"
        ));
        assert!(!text.contains("UnmanagedType.I1"));
        assert!(bindings
            .diagnostics
            .iter()
            .all(|d| d.kind != DiagnosticKind::UnsupportedBooleanType));
    }

    #[test]
    fn unsupported_boolean_type_warns() {
        let bindings = generate_from_str(
            MODEL,
            &format!("{SETTINGS}boolean_types = [\"sfBool\", \"sfMatrixPtr\", \"sfMissing\", \"_Bool\"]\n"),
        )
        .unwrap();
        let flagged: Vec<_> = bindings
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::UnsupportedBooleanType)
            .map(|d| d.subject.as_str())
            .collect();
        assert_eq!(flagged, vec!["sfMatrixPtr", "sfMissing"]);
    }

    #[test]
    fn variadic_callback_parameter_is_a_raw_pointer() {
        let model = r#"
{ "declarations": [
  { "kind": "typedef", "name": "log_cb", "type": "void (*)(const char *, ...)" },
  { "kind": "function", "name": "set_log", "source": "log.h",
    "parameters": [ { "name": "cb", "type": "log_cb" } ] }
] }
"#;
        let bindings = generate_from_str(model, SETTINGS).unwrap();
        let text = bindings.render();
        assert!(text.contains("public static extern void set_log(IntPtr cb);"));
        assert!(text.contains("// unrecognized: log_cb"));
        assert!(!text.contains("log_cb cb"));
        let kinds: Vec<_> = bindings.diagnostics.iter().map(|d| d.kind).collect();
        assert!(kinds.contains(&DiagnosticKind::UnrecognizedDelegate));
        assert!(kinds.contains(&DiagnosticKind::UnrecognizedType));
    }

    #[test]
    fn missing_settings_are_fatal() {
        let err = generate_from_str(MODEL, "").unwrap_err();
        assert!(matches!(err, EmitError::MissingSetting { key: "namespace" }));

        let err = generate_from_str(
            MODEL,
            r#"
[settings]
namespace = "Demo"
class = "Native"
library = "  "
"#,
        )
        .unwrap_err();
        assert!(matches!(err, EmitError::MissingSetting { key: "library" }));
    }

    #[test]
    fn invalid_settings_are_fatal() {
        let config = |ns: &str, class: &str| {
            format!("[settings]\nnamespace = \"{ns}\"\nclass = \"{class}\"\nlibrary = \"demo\"\n")
        };
        assert!(generate_from_str(MODEL, &config("Demo.Native", "Native")).is_ok());
        assert!(matches!(
            generate_from_str(MODEL, &config("Demo..Native", "Native")),
            Err(EmitError::InvalidSetting { key: "namespace", .. })
        ));
        assert!(matches!(
            generate_from_str(MODEL, &config("Demo", "9Native")),
            Err(EmitError::InvalidSetting { key: "class", .. })
        ));
    }

    #[test]
    fn bad_input_surfaces_model_error() {
        assert!(matches!(
            generate_from_str("{ not json", SETTINGS),
            Err(EmitError::Model(_))
        ));
    }
}
