//! Hierarchical layout of tables.
//!
//! This module provides:
//! - A reference graph built from foreign keys ([`TableGraph`])
//! - Rank assignment by topological generations, with an in-degree fallback for cycles
//! - Table size estimation from content
//! - Row (TB) or column (LR) packing of generations
//!
//! Layout is pure: the same schema and options always give the same positions.

pub mod dimensions;
pub mod graph;
pub mod placement;

pub use dimensions::{column_line, estimate, TableSize, HEADER_EXTRA};
pub use graph::TableGraph;
pub use placement::{place, Point, ORIGIN};

use crate::schema::{PositionedSchema, PositionedTable, Schema};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Layout direction for diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Generations stack top to bottom, tables in a generation flow left to right
    #[default]
    #[serde(alias = "tb")]
    TB,
    /// Generations flow left to right, tables in a generation stack top to bottom
    #[serde(alias = "lr")]
    LR,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tb" | "td" | "top-bottom" | "top-down" | "vertical" => Ok(Direction::TB),
            "lr" | "left-right" | "horizontal" => Ok(Direction::LR),
            _ => Err(format!("Unknown direction: {}. Valid options: TB, LR", s)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::TB => write!(f, "TB"),
            Direction::LR => write!(f, "LR"),
        }
    }
}

/// Options for layout calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Estimated width of one character
    pub char_width: f64,
    /// Height of one column row (the header band is one row plus 4)
    pub row_height: f64,
    /// Horizontal padding on each side and bottom padding
    pub padding: f64,
    pub min_table_width: f64,
    /// Gap between tables of the same generation
    pub node_gap: f64,
    /// Gap between consecutive generations
    pub rank_gap: f64,
    pub direction: Direction,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            row_height: 26.0,
            padding: 20.0,
            min_table_width: 150.0,
            node_gap: 80.0,
            rank_gap: 120.0,
            direction: Direction::TB,
        }
    }
}

/// Calculate positions and sizes for all tables in a schema.
///
/// Every input table yields exactly one positioned table, in input order,
/// with its relational fields untouched. Unresolvable foreign keys and
/// reference cycles never fail the layout.
pub fn layout_schema(schema: &Schema, options: &LayoutOptions) -> PositionedSchema {
    if schema.is_empty() {
        return PositionedSchema {
            tables: Vec::new(),
            dialect: schema.dialect,
        };
    }

    let graph = TableGraph::from_tables(&schema.tables);

    // Sizes per node; a repeated qualified name keeps its first declaration
    let mut sizes: Vec<Option<TableSize>> = vec![None; graph.node_count()];
    for (pos, table) in schema.tables.iter().enumerate() {
        if let Some(node) = graph.node_of_table(pos) {
            if sizes[node].is_none() {
                sizes[node] = Some(estimate(table, options));
            }
        }
    }
    let sizes: Vec<TableSize> = sizes.into_iter().map(Option::unwrap_or_default).collect();

    let names = graph.node_names();
    let mut generations = graph.generations();
    for generation in &mut generations {
        generation.sort_by(|&a, &b| names[a].cmp(&names[b]));
    }

    tracing::debug!(
        tables = schema.len(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        generations = generations.len(),
        direction = %options.direction,
        "layout computed"
    );

    let positions = place(&generations, &sizes, options);

    let tables = schema
        .tables
        .iter()
        .enumerate()
        .map(|(pos, table)| {
            let (point, size) = graph
                .node_of_table(pos)
                .map(|node| (positions[node], sizes[node]))
                .unwrap_or_default();
            PositionedTable {
                table: table.clone(),
                x: point.x,
                y: point.y,
                width: size.width,
                height: size.height,
            }
        })
        .collect();

    PositionedSchema {
        tables,
        dialect: schema.dialect,
    }
}
