//! Render command: parse, lay out and write a diagram.

use super::{load_schema, CommonArgs};
use crate::generator::{generate_miro, to_drawio, OutputFormat};
use crate::layout::layout_schema;
use crate::schema::{Schema, Table};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Run the render command
pub fn run(
    file: PathBuf,
    output: Option<PathBuf>,
    format: Option<String>,
    common: CommonArgs,
    miro_token: Option<String>,
    miro_board_id: Option<String>,
) -> Result<()> {
    let format = resolve_format(format.as_deref(), output.as_deref())?;
    let config = common.resolve_config()?;

    // Fail on missing credentials before doing any work
    let miro_credentials = match format {
        OutputFormat::Miro => Some(miro_credentials(miro_token, miro_board_id)?),
        OutputFormat::Drawio => None,
    };

    let schema = load_schema(&file, &common, false)?;

    eprintln!("Calculating layout...");
    let positioned = layout_schema(&schema, &config.layout);

    match miro_credentials {
        None => {
            let output_path = output.unwrap_or_else(|| default_output(&file, format));
            let xml = to_drawio(&positioned, &config.drawio_options());
            fs::write(&output_path, xml)
                .with_context(|| format!("failed to write {}", output_path.display()))?;
            eprintln!("Diagram saved to: {}", output_path.display());
        }
        Some((token, board_id)) => {
            eprintln!("Creating shapes on Miro board {}...", board_id);
            let result = generate_miro(&positioned, &token, &board_id, &config.miro)?;
            eprintln!(
                "Created {} tables and {} connectors",
                result.tables_created, result.connectors_created
            );
            eprintln!("View your diagram at: {}", result.board_url);
        }
    }

    print_summary(&schema);
    Ok(())
}

/// Explicit format wins; otherwise infer from the output extension
fn resolve_format(format: Option<&str>, output: Option<&Path>) -> Result<OutputFormat> {
    if let Some(f) = format {
        return f.parse().map_err(|e| anyhow::anyhow!("{}", e));
    }
    Ok(output
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .and_then(OutputFormat::from_extension)
        .unwrap_or_default())
}

fn miro_credentials(token: Option<String>, board_id: Option<String>) -> Result<(String, String)> {
    let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
        bail!(
            "Miro access token required. Use --miro-token or set MIRO_ACCESS_TOKEN env var.\n\
             Get your token at: https://developers.miro.com/docs/getting-started"
        );
    };
    let Some(board_id) = board_id.filter(|b| !b.trim().is_empty()) else {
        bail!(
            "Miro board ID required. Use --miro-board-id or set MIRO_BOARD_ID env var.\n\
             Find board ID in the URL: https://miro.com/app/board/<BOARD_ID>/"
        );
    };
    Ok((token, board_id))
}

fn default_output(input: &Path, format: OutputFormat) -> PathBuf {
    input.with_extension(format.extension().unwrap_or("drawio"))
}

/// One line per table: `- name: N columns, K FK, M indexes`
pub fn summary_line(table: &Table) -> String {
    let mut parts = vec![format!("{} columns", table.columns.len())];
    if !table.foreign_keys.is_empty() {
        parts.push(format!("{} FK", table.foreign_keys.len()));
    }
    if !table.indexes.is_empty() {
        parts.push(format!("{} indexes", table.indexes.len()));
    }
    format!("  - {}: {}", table.qualified_name(), parts.join(", "))
}

fn print_summary(schema: &Schema) {
    eprintln!("\nSummary:");
    for table in &schema.tables {
        eprintln!("{}", summary_line(table));
    }
}
