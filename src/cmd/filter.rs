//! Include/exclude table filters from comma-separated glob patterns.

use crate::schema::{Schema, Table};
use glob::Pattern;

/// Table selection by name patterns.
///
/// A pattern matches when it matches either the simple or the
/// schema-qualified table name, case-insensitively.
#[derive(Debug, Default)]
pub struct TableFilter {
    include: Option<Vec<Pattern>>,
    exclude: Vec<Pattern>,
}

impl TableFilter {
    pub fn new(tables: Option<&str>, exclude: Option<&str>) -> anyhow::Result<Self> {
        Ok(Self {
            include: tables.map(parse_patterns).transpose()?,
            exclude: exclude.map(parse_patterns).transpose()?.unwrap_or_default(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_none() && self.exclude.is_empty()
    }

    pub fn matches(&self, table: &Table) -> bool {
        let simple = table.name.to_lowercase();
        let qualified = table.qualified_name().to_lowercase();
        let hit = |p: &Pattern| p.matches(&simple) || p.matches(&qualified);

        if let Some(ref include) = self.include {
            if !include.iter().any(hit) {
                return false;
            }
        }
        !self.exclude.iter().any(hit)
    }

    /// Keep only matching tables, preserving order
    pub fn apply(&self, schema: &mut Schema) {
        if self.is_empty() {
            return;
        }
        schema.tables.retain(|t| self.matches(t));
    }
}

fn parse_patterns(list: &str) -> anyhow::Result<Vec<Pattern>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Pattern::new(&s.to_lowercase())
                .map_err(|e| anyhow::anyhow!("invalid table pattern '{}': {}", s, e))
        })
        .collect()
}
