//! CLI command implementations.

pub mod check;
pub mod generate;

use std::path::Path;

use anyhow::{bail, Context, Result};
use weft_emit::Bindings;
use weft_model::{ForeignModel, OverrideConfig};

/// Load both inputs and run the pipeline.
pub fn load_and_generate(model_path: &Path, config_path: &Path) -> Result<Bindings> {
    if !model_path.is_file() {
        bail!("model file not found: {}", model_path.display());
    }
    if !config_path.is_file() {
        bail!("config file not found: {}", config_path.display());
    }

    let model = ForeignModel::load(model_path)
        .with_context(|| format!("loading {}", model_path.display()))?;
    let config = OverrideConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    weft_emit::generate(&model, &config)
        .with_context(|| format!("generating bindings with {}", config_path.display()))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::{Path, PathBuf};

    pub const MODEL: &str = r#"
{ "declarations": [
  { "kind": "struct", "name": "sfWindow", "size": 0 },
  { "kind": "struct", "name": "sfVector2i", "size": 8,
    "fields": [ { "name": "x", "type": "int" }, { "name": "y", "type": "int" } ] },
  { "kind": "typedef", "name": "sfOdd", "type": "int (*)[2]" },
  { "kind": "function", "name": "sfWindow_getPosition", "source": "SFML/Window/Window.h",
    "return": "sfVector2i", "parameters": [ { "name": "window", "type": "const sfWindow *" } ] }
] }
"#;

    pub const CONFIG: &str = r#"
[settings]
namespace = "SFML.Window"
class = "Native"
library = "csfml-window"

[types.sfVector2i]
name = "Vector2i"
"#;

    /// Write the fixture pair into `dir`, returning (model, config) paths.
    pub fn write(dir: &Path, config: &str) -> (PathBuf, PathBuf) {
        let model = dir.join("api.json");
        let config_path = dir.join("weft.toml");
        std::fs::write(&model, MODEL).unwrap();
        std::fs::write(&config_path, config).unwrap();
        (model, config_path)
    }
}
