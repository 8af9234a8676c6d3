//! Layout command: print table positions as JSON.

use super::{load_schema, CommonArgs};
use crate::layout::layout_schema;
use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

/// Run the layout command
pub fn run(file: PathBuf, output: Option<PathBuf>, common: CommonArgs) -> Result<()> {
    let config = common.resolve_config()?;
    // Status lines only when stdout is not the JSON stream
    let schema = load_schema(&file, &common, output.is_none())?;

    let positioned = layout_schema(&schema, &config.layout);
    let json = serde_json::to_string_pretty(&positioned)?;

    match output {
        Some(path) => {
            fs::write(&path, format!("{}\n", json))
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Layout saved to: {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", json)?;
        }
    }

    Ok(())
}
