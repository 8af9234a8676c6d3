mod filter;
mod layout;
mod render;

use crate::config::DiagramConfig;
use crate::layout::Direction;
use crate::schema::{parse_file, Dialect, Schema};
use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::{Path, PathBuf};

pub use filter::TableFilter;

#[derive(Parser)]
#[command(name = "db-diagram")]
#[command(author = "Helge Sverre <helge.sverre@gmail.com>")]
#[command(version)]
#[command(about = "Convert SQL schemas to editable ER diagrams", long_about = None)]
pub struct Cli {
    /// Show debug diagnostics (unresolved references, layout details)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a SQL schema as a Draw.io file or on a Miro board
    #[command(after_help = "Examples:
  db-diagram render schema.sql -o diagram.drawio
  db-diagram render schema.sql --direction LR
  db-diagram render schema.sql -f miro --miro-token TOKEN --miro-board-id BOARD_ID
  MIRO_ACCESS_TOKEN=... MIRO_BOARD_ID=... db-diagram render schema.sql -f miro")]
    Render {
        /// Input SQL file containing CREATE TABLE statements
        file: PathBuf,

        /// Output file path (default: <input>.drawio). Not used for miro
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: drawio, miro (default: from output extension, else drawio)
        #[arg(short, long)]
        format: Option<String>,

        #[command(flatten)]
        common: CommonArgs,

        /// Miro API access token
        #[arg(long, env = "MIRO_ACCESS_TOKEN", hide_env_values = true)]
        miro_token: Option<String>,

        /// Miro board ID to create shapes on
        #[arg(long, env = "MIRO_BOARD_ID")]
        miro_board_id: Option<String>,
    },

    /// Compute table positions and print them as JSON
    Layout {
        /// Input SQL file containing CREATE TABLE statements
        file: PathBuf,

        /// Output JSON file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options shared by commands that parse and lay out a schema
#[derive(clap::Args, Debug, Clone)]
pub struct CommonArgs {
    /// SQL dialect: postgresql, mysql, sqlite, sqlserver
    #[arg(short, long, default_value = "postgresql")]
    pub dialect: String,

    /// Layout direction: TB (top-bottom) or LR (left-right)
    #[arg(long)]
    pub direction: Option<String>,

    /// YAML config file with layout and style options
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Only include tables matching these patterns (comma-separated, supports globs)
    #[arg(short, long)]
    pub tables: Option<String>,

    /// Exclude tables matching these patterns (comma-separated, supports globs)
    #[arg(short, long)]
    pub exclude: Option<String>,
}

impl CommonArgs {
    /// Load the config file, then apply command-line overrides
    pub fn resolve_config(&self) -> anyhow::Result<DiagramConfig> {
        let mut config = match &self.config {
            Some(path) => DiagramConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => DiagramConfig::default(),
        };

        if let Some(ref direction) = self.direction {
            config.layout.direction = direction
                .parse::<Direction>()
                .map_err(|e| anyhow::anyhow!("{}", e))?;
        }

        Ok(config)
    }

    pub fn dialect(&self) -> anyhow::Result<Dialect> {
        self.dialect
            .parse::<Dialect>()
            .map_err(|e| anyhow::anyhow!("{}", e))
    }

    pub fn filter(&self) -> anyhow::Result<TableFilter> {
        TableFilter::new(self.tables.as_deref(), self.exclude.as_deref())
    }
}

/// Parse the input file and apply table filters
fn load_schema(file: &Path, common: &CommonArgs, quiet: bool) -> anyhow::Result<Schema> {
    if !file.exists() {
        anyhow::bail!("input file does not exist: {}", file.display());
    }

    let dialect = common.dialect()?;
    let filter = common.filter()?;

    if !quiet {
        eprintln!("Parsing {} SQL...", dialect);
    }
    let mut schema = parse_file(file, dialect)?;

    let before = schema.len();
    filter.apply(&mut schema);
    if !quiet {
        if schema.len() < before {
            eprintln!("Found {} tables ({} after filtering)", before, schema.len());
        } else {
            eprintln!("Found {} tables", schema.len());
        }
    }

    Ok(schema)
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Render {
            file,
            output,
            format,
            common,
            miro_token,
            miro_board_id,
        } => render::run(file, output, format, common, miro_token, miro_board_id),
        Commands::Layout {
            file,
            output,
            common,
        } => layout::run(file, output, common),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "db-diagram", &mut io::stdout());
            Ok(())
        }
    }
}
