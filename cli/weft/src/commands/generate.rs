//! `weft generate` — write bindings to a file or stdout.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::load_and_generate;

pub fn run(model: &Path, config: &Path, output: Option<&Path>, report: bool) -> Result<()> {
    let bindings = load_and_generate(model, config)?;
    let text = bindings.render();

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            std::fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
            eprintln!(
                "Generated bindings for '{}' ({} warnings) → {}",
                bindings.namespace,
                bindings.diagnostics.len(),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .context("writing bindings to stdout")?;
        }
    }

    if report {
        eprint!("{}", bindings.report());
    }
    Ok(())
}
