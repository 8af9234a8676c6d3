//! Schema model for ERD generation.
//!
//! This module provides:
//! - Data models for tables, columns, foreign keys and indexes
//! - DDL parsing for extracting schema information from CREATE TABLE dumps
//! - Foreign key target resolution across schemas (see [`TableIndex`])
//! - Positioned variants produced by the layout engine

mod ddl;
mod resolve;

pub use ddl::*;
pub use resolve::TableIndex;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SQL dialect tag carried by a schema.
///
/// Metadata only: it never influences layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgresql,
    Mysql,
    Sqlserver,
    Sqlite,
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Ok(Dialect::Postgresql),
            "mysql" | "mariadb" => Ok(Dialect::Mysql),
            "sqlserver" | "mssql" => Ok(Dialect::Sqlserver),
            "sqlite" => Ok(Dialect::Sqlite),
            _ => Err(format!(
                "Unsupported dialect: {}. Valid options: postgresql, mysql, sqlite, sqlserver",
                s
            )),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Postgresql => write!(f, "postgresql"),
            Dialect::Mysql => write!(f, "mysql"),
            Dialect::Sqlserver => write!(f, "sqlserver"),
            Dialect::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Reference from a column to another table's column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnReference {
    /// Referenced table (simple name)
    pub table: String,
    /// Referenced column
    pub column: String,
    /// Schema of the referenced table, when the reference was qualified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Constraint name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_name: Option<String>,
}

/// Column definition within a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Declared type as written (normalized to upper case keyword)
    #[serde(rename = "type")]
    pub col_type: String,
    /// Whether this column allows NULL values
    pub nullable: bool,
    /// Whether this column is part of the primary key
    pub primary_key: bool,
    /// Whether this column carries a UNIQUE constraint
    pub unique: bool,
    /// Default value literal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Table/column this column references
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<ColumnReference>,
}

impl Column {
    /// Create a nullable, unconstrained column
    pub fn new(name: impl Into<String>, col_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            col_type: col_type.into(),
            nullable: true,
            primary_key: false,
            unique: false,
            default_value: None,
            references: None,
        }
    }

    /// Mark as primary key (implies NOT NULL)
    pub fn as_primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Mark as NOT NULL
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Attach a reference to `table.column`
    pub fn with_reference(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.references = Some(ColumnReference {
            table: table.into(),
            column: column.into(),
            schema: None,
            constraint_name: None,
        });
        self
    }

    /// Whether this column references another table
    pub fn is_foreign_key(&self) -> bool {
        self.references.is_some()
    }
}

/// Foreign key constraint definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Local column names
    pub columns: Vec<String>,
    /// Referenced table name, possibly schema-qualified
    pub referenced_table: String,
    /// Referenced column names
    pub referenced_columns: Vec<String>,
    /// Constraint name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ForeignKey {
    pub fn new(
        columns: Vec<String>,
        referenced_table: impl Into<String>,
        referenced_columns: Vec<String>,
    ) -> Self {
        Self {
            columns,
            referenced_table: referenced_table.into(),
            referenced_columns,
            name: None,
        }
    }
}

/// Index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name
    pub name: String,
    /// Columns in the index
    pub columns: Vec<String>,
    /// Whether this is a unique index
    pub unique: bool,
}

/// Table definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name (without schema)
    pub name: String,
    /// Schema/namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Column definitions in order
    pub columns: Vec<Column>,
    /// Explicit primary key column list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<Vec<String>>,
    /// Foreign key constraints
    pub foreign_keys: Vec<ForeignKey>,
    /// Index definitions
    pub indexes: Vec<Index>,
}

impl Table {
    /// Create a new empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            columns: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Place the table in a schema
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Schema name, treating an empty string as absent
    pub fn schema_name(&self) -> Option<&str> {
        self.schema.as_deref().filter(|s| !s.is_empty())
    }

    /// Identity key of this table, see [`qualified_name`]
    pub fn qualified_name(&self) -> String {
        qualified_name(self)
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get a mutable column by name (case-insensitive fallback)
    pub fn get_column_mut(&mut self, name: &str) -> Option<&mut Column> {
        let pos = self
            .columns
            .iter()
            .position(|c| c.name == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.name.eq_ignore_ascii_case(name))
            })?;
        self.columns.get_mut(pos)
    }
}

/// Qualified name of a table: `"schema.name"` when the schema is a non-empty
/// string, otherwise just `"name"`.
pub fn qualified_name(table: &Table) -> String {
    match table.schema_name() {
        Some(schema) => format!("{}.{}", schema, table.name),
        None => table.name.clone(),
    }
}

/// Complete database schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Tables in declaration order
    pub tables: Vec<Table>,
    pub dialect: Dialect,
}

impl Schema {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            tables: Vec::new(),
            dialect,
        }
    }

    /// Get the number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if schema is empty
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Find a table by qualified name
    pub fn get_table(&self, qualified: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.qualified_name() == qualified)
    }
}

/// Table annotated with layout geometry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedTable {
    #[serde(flatten)]
    pub table: Table,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PositionedTable {
    pub fn qualified_name(&self) -> String {
        self.table.qualified_name()
    }
}

/// Schema whose tables carry layout geometry
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PositionedSchema {
    pub tables: Vec<PositionedTable>,
    pub dialect: Dialect,
}

impl PositionedSchema {
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
