//! `weft check` — run the pipeline and print the report without writing
//! any bindings.

use std::path::Path;

use anyhow::{bail, Result};

use super::load_and_generate;

pub fn run(model: &Path, config: &Path, strict: bool) -> Result<()> {
    let bindings = load_and_generate(model, config)?;
    let report = bindings.report();
    print!("{report}");

    if strict && !report.diagnostics.is_empty() {
        bail!(
            "{} diagnostic(s) raised with --strict",
            report.diagnostics.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;

    #[test]
    fn lenient_check_passes_with_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let (model, config) = fixtures::write(dir.path(), fixtures::CONFIG);
        run(&model, &config, false).unwrap();
        // nothing is written next to the inputs
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 2);
    }

    #[test]
    fn strict_check_fails_on_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let (model, config) = fixtures::write(dir.path(), fixtures::CONFIG);
        let err = run(&model, &config, true).unwrap_err();
        assert!(err.to_string().contains("1 diagnostic(s)"));
    }

    #[test]
    fn strict_check_passes_when_clean() {
        let dir = tempfile::tempdir().unwrap();
        let clean_model = r#"{ "declarations": [
            { "kind": "enum", "name": "sfMode", "items": [ { "name": "ON", "value": 1 } ] }
        ] }"#;
        let (model, config) = fixtures::write(dir.path(), fixtures::CONFIG);
        std::fs::write(&model, clean_model).unwrap();
        // the sfVector2i override is now stale
        assert!(run(&model, &config, true).is_err());

        let config_text = "[settings]\nnamespace = \"A\"\nclass = \"B\"\nlibrary = \"c\"\n";
        std::fs::write(&config, config_text).unwrap();
        run(&model, &config, true).unwrap();
    }
}
