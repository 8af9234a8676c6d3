//! Diagram generators for positioned schemas.
//!
//! - Draw.io XML documents ([`to_drawio`])
//! - Shapes and connectors on a Miro board ([`MiroGenerator`])

pub mod drawio;
pub mod miro;

pub use drawio::{to_drawio, DrawioOptions};
pub use miro::{generate_miro, BoardApi, MiroClient, MiroError, MiroGenerator, MiroOptions, MiroResult};

use crate::schema::{Column, PositionedSchema, TableIndex};
use ahash::AHashMap;
use std::fmt;
use std::str::FromStr;

/// Output format for diagram export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Draw.io / diagrams.net XML
    #[default]
    Drawio,
    /// Shapes created on a Miro board
    Miro,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "drawio" | "draw.io" | "diagrams.net" => Ok(OutputFormat::Drawio),
            "miro" => Ok(OutputFormat::Miro),
            _ => Err(format!(
                "Unknown format: {}. Valid options: drawio, miro",
                s
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Drawio => write!(f, "drawio"),
            OutputFormat::Miro => write!(f, "miro"),
        }
    }
}

impl OutputFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            OutputFormat::Drawio => Some("drawio"),
            OutputFormat::Miro => None,
        }
    }

    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "drawio" | "xml" => Some(OutputFormat::Drawio),
            _ => None,
        }
    }
}

/// Sequential identifiers scoped to one generation run
#[derive(Debug)]
pub struct IdSequence {
    prefix: &'static str,
    last: u64,
}

impl IdSequence {
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, last: 0 }
    }

    /// Next identifier: `{prefix}-1`, `{prefix}-2`, ...
    pub fn next_id(&mut self) -> String {
        self.last += 1;
        format!("{}-{}", self.prefix, self.last)
    }
}

/// Column label with type and constraint tags, e.g. `id: SERIAL [PK]`
pub fn column_label(col: &Column) -> String {
    let mut label = format!("{}: {}", col.name, col.col_type);
    let mut tags: Vec<&str> = Vec::new();

    if col.primary_key {
        tags.push("PK");
    }
    if col.is_foreign_key() {
        tags.push("FK");
    }
    if !col.nullable && !col.primary_key {
        tags.push("NN");
    }
    if col.unique {
        tags.push("UQ");
    }

    if !tags.is_empty() {
        label.push_str(&format!(" [{}]", tags.join(", ")));
    }

    label
}

/// Row fill colors by column role
#[derive(Debug, Clone, Copy)]
pub struct ColumnColors<'a> {
    pub column: &'a str,
    pub pk: &'a str,
    pub fk: &'a str,
}

impl<'a> ColumnColors<'a> {
    pub fn fill_for(&self, col: &Column) -> &'a str {
        if col.primary_key {
            self.pk
        } else if col.is_foreign_key() {
            self.fk
        } else {
            self.column
        }
    }
}

/// Escape text for XML attributes and HTML content
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Element ids of one drawn table: its header and each column row
#[derive(Debug, Clone, Default)]
pub struct TableAnchors {
    pub header: String,
    pub columns: AHashMap<String, String>,
}

impl TableAnchors {
    pub fn new(header: String) -> Self {
        Self {
            header,
            columns: AHashMap::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&str> {
        self.columns.get(name).map(String::as_str)
    }

    /// Column element, or the header when the column is unknown
    pub fn column_or_header(&self, name: Option<&str>) -> &str {
        name.and_then(|n| self.column(n)).unwrap_or(&self.header)
    }
}

/// A foreign key resolved to positions in [`PositionedSchema::tables`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub from_table: usize,
    pub from_column: String,
    pub to_table: usize,
    /// First referenced column, if any was declared
    pub to_column: Option<String>,
    pub name: Option<String>,
}

/// Resolve every foreign key of a positioned schema to a table pair.
///
/// Targets resolve with the same rules as layout. Foreign keys without local
/// columns or with an unknown target are skipped.
pub fn relationships(schema: &PositionedSchema) -> Vec<Relationship> {
    let index = TableIndex::new(schema.tables.iter().map(|t| &t.table));

    // Index id -> first table position with that qualified name
    let mut position_of: Vec<Option<usize>> = vec![None; index.len()];
    for (pos, table) in schema.tables.iter().enumerate() {
        if let Some(id) = index.get(&table.qualified_name()) {
            position_of[id].get_or_insert(pos);
        }
    }

    let mut out = Vec::new();
    for (from_table, table) in schema.tables.iter().enumerate() {
        for fk in &table.table.foreign_keys {
            let Some(from_column) = fk.columns.first() else {
                continue;
            };
            let Some(to_table) = index
                .resolve_from(&table.table, &fk.referenced_table)
                .and_then(|id| position_of[id])
            else {
                tracing::debug!(
                    table = %table.qualified_name(),
                    referenced = %fk.referenced_table,
                    "skipping connector for unresolved foreign key"
                );
                continue;
            };

            out.push(Relationship {
                from_table,
                from_column: from_column.clone(),
                to_table,
                to_column: fk.referenced_columns.first().cloned(),
                name: fk.name.clone(),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{layout_schema, LayoutOptions};
    use crate::schema::{ForeignKey, Schema, Table};

    #[test]
    fn test_column_label() {
        assert_eq!(
            column_label(&Column::new("id", "SERIAL").as_primary_key()),
            "id: SERIAL [PK]"
        );
        let mut email = Column::new("email", "TEXT").not_null();
        email.unique = true;
        assert_eq!(column_label(&email), "email: TEXT [NN, UQ]");
        assert_eq!(column_label(&Column::new("note", "TEXT")), "note: TEXT");
    }

    #[test]
    fn test_id_sequence_is_scoped() {
        let mut a = IdSequence::new("cell");
        assert_eq!(a.next_id(), "cell-1");
        assert_eq!(a.next_id(), "cell-2");
        let mut b = IdSequence::new("cell");
        assert_eq!(b.next_id(), "cell-1");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("A & B"), "A &amp; B");
        assert_eq!(escape_html("\"quoted\""), "&quot;quoted&quot;");
        assert_eq!(escape_html("it's"), "it&#x27;s");
    }

    #[test]
    fn test_relationships_resolve_same_schema() {
        let schema = Schema {
            tables: vec![
                Table::new("users").in_schema("public"),
                Table::new("users").in_schema("audit"),
                Table::new("log").in_schema("audit").with_foreign_key(ForeignKey::new(
                    vec!["user_id".to_string()],
                    "users",
                    vec!["id".to_string()],
                )),
                Table::new("broken").with_foreign_key(ForeignKey::new(
                    vec!["x".to_string()],
                    "nowhere",
                    vec!["id".to_string()],
                )),
                Table::new("empty").with_foreign_key(ForeignKey::new(
                    Vec::new(),
                    "users",
                    Vec::new(),
                )),
            ],
            ..Schema::default()
        };
        let positioned = layout_schema(&schema, &LayoutOptions::default());
        let rels = relationships(&positioned);

        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].from_table, 2);
        assert_eq!(rels[0].to_table, 1);
        assert_eq!(rels[0].to_column.as_deref(), Some("id"));
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("drawio".parse::<OutputFormat>(), Ok(OutputFormat::Drawio));
        assert_eq!("MIRO".parse::<OutputFormat>(), Ok(OutputFormat::Miro));
        assert!("svg".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::from_extension("drawio"), Some(OutputFormat::Drawio));
        assert_eq!(OutputFormat::from_extension("png"), None);
    }
}
