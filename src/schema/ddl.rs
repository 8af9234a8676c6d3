//! DDL parsing for schema extraction.
//!
//! Parses CREATE TABLE, CREATE INDEX and ALTER TABLE statements to extract:
//! - Column definitions with types, nullability, defaults and inline references
//! - Primary key, unique and foreign key constraints
//! - Indexes
//!
//! Identifiers may be quoted MySQL (`` `x` ``), PostgreSQL (`"x"`) or MSSQL
//! (`[x]`) style and may be schema-qualified.

use super::{Column, ColumnReference, Dialect, ForeignKey, Index, Schema, Table};
use crate::parser::{Parser, StatementType, SMALL_BUFFER_SIZE};
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A single, possibly quoted identifier
const IDENT: &str = r#"(?:"[^"]+"|`[^`]+`|\[[^\]]+\]|[\w$]+)"#;

/// Dotted identifier chain, e.g. `db.schema.table`
static QUALIFIED: Lazy<String> = Lazy::new(|| format!(r"{IDENT}(?:\s*\.\s*{IDENT})*"));

/// Regex to extract the (qualified) table name from CREATE TABLE
static CREATE_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^\s*CREATE\s+(?:OR\s+REPLACE\s+)?(?:(?:GLOBAL|LOCAL)\s+)?(?:(?:TEMP|TEMPORARY|UNLOGGED)\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?({})",
        *QUALIFIED
    ))
    .unwrap()
});

/// Regex to extract the (qualified) table name from ALTER TABLE
static ALTER_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^\s*ALTER\s+TABLE\s+(?:IF\s+EXISTS\s+)?(?:ONLY\s+)?({})",
        *QUALIFIED
    ))
    .unwrap()
});

/// Column name followed by its type.
/// Handles multi-word types, parameters, MySQL UNSIGNED/ZEROFILL, time zone suffixes and arrays.
static COLUMN_DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^\s*({IDENT})\s+([A-Za-z_]\w*(?:\s+(?:VARYING|PRECISION|UNSIGNED))?(?:\s*\([^)]*\))?(?:\s+UNSIGNED)?(?:\s+ZEROFILL)?(?:\s+(?:WITH|WITHOUT)\s+TIME\s+ZONE)?(?:\s*\[\s*\])*)"
    ))
    .unwrap()
});

/// Regex for PRIMARY KEY constraint
/// Supports MSSQL CLUSTERED/NONCLUSTERED keywords: PRIMARY KEY CLUSTERED ([col])
static PRIMARY_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)PRIMARY\s+KEY\s*(?:CLUSTERED\s+|NONCLUSTERED\s+)?\(([^)]+)\)").unwrap()
});

/// Regex for inline PRIMARY KEY on column
static INLINE_PRIMARY_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bPRIMARY\s+KEY\b").unwrap());

/// Regex for inline UNIQUE on column
static INLINE_UNIQUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bUNIQUE\b").unwrap());

/// Regex to detect NOT NULL constraint
static NOT_NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bNOT\s+NULL\b").unwrap());

/// Regex for DEFAULT literal: quoted string, parenthesized expression,
/// function call, number or bare word
static DEFAULT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bDEFAULT\s+('(?:[^']|'')*'|\([^)]*\)|-?\d+(?:\.\d+)?|[\w.]+(?:\s*\([^)]*\))?)")
        .unwrap()
});

/// Regex for inline REFERENCES on a column, with optional constraint name
static INLINE_REFERENCES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:CONSTRAINT\s+({IDENT})\s+)?REFERENCES\s+({})\s*(?:\(\s*({IDENT})[^)]*\))?",
        *QUALIFIED
    ))
    .unwrap()
});

/// Regex for FOREIGN KEY constraint with optional constraint name.
/// The referenced column list is optional and defaults to `id`.
static FOREIGN_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:CONSTRAINT\s+({IDENT})\s+)?FOREIGN\s+KEY\s*\(([^)]+)\)\s*REFERENCES\s+({})\s*(?:\(([^)]+)\))?",
        *QUALIFIED
    ))
    .unwrap()
});

/// Regex for table-level UNIQUE (cols)
static UNIQUE_CONSTRAINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:CONSTRAINT\s+\S+\s+)?UNIQUE\s*(?:KEY\s+|INDEX\s+)?(?:CLUSTERED\s+|NONCLUSTERED\s+)?\(([^)]+)\)").unwrap()
});

/// Regex for inline INDEX/KEY in CREATE TABLE
/// Matches: INDEX idx_name (col1, col2), KEY idx_name (col1), UNIQUE INDEX idx_name (col1)
static INLINE_INDEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^(?:(UNIQUE)\s+)?(?:INDEX|KEY)\s+[\[`"]?(\w+)[\]`"]?\s*\(([^)]+)\)"#).unwrap()
});

/// Regex for CREATE INDEX statement
/// Matches: CREATE [UNIQUE] INDEX [CONCURRENTLY] [IF NOT EXISTS] idx_name ON [ONLY] table [USING method] (columns)
static CREATE_INDEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)CREATE\s+(UNIQUE\s+)?(?:CLUSTERED\s+|NONCLUSTERED\s+)?INDEX\s+(?:CONCURRENTLY\s+)?(?:IF\s+NOT\s+EXISTS\s+)?({IDENT})\s+ON\s+(?:ONLY\s+)?({})\s*(?:USING\s+\w+\s*)?\(([^)]+)\)",
        *QUALIFIED
    ))
    .unwrap()
});

/// Start of a table-level constraint rather than a column definition.
/// The keyword must end at a word boundary and be followed by the shape the
/// constraint takes, so columns named `key`, `index` or `constraint_id` stay columns.
/// An index column list never starts with a digit or a quote (`key VARCHAR(50)`).
static TABLE_CONSTRAINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"(?i)^(?:CONSTRAINT\s+{IDENT}\s+(?:PRIMARY|FOREIGN|UNIQUE|CHECK|EXCLUDE)\b|PRIMARY\s+KEY\b|FOREIGN\s+KEY\b|CHECK\s*\(|EXCLUDE\s+(?:USING\b|\()|(?:(?:UNIQUE|FULLTEXT|SPATIAL)\b\s*(?:(?:KEY|INDEX)\b\s*)?|(?:KEY|INDEX)\b\s*)(?:(?:CLUSTERED|NONCLUSTERED)\s+)?(?:{IDENT}\s*)?(?:USING\s+\w+\s*)?\(\s*[A-Za-z_`"\[])"#
    ))
    .unwrap()
});

/// Builder for constructing a schema from DDL statements
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new(dialect: Dialect) -> Self {
        Self {
            schema: Schema::new(dialect),
        }
    }

    /// Route a statement to the matching parse method
    pub fn parse_statement(&mut self, stmt: &str) {
        match Parser::<&[u8]>::parse_statement(stmt) {
            StatementType::CreateTable => {
                self.parse_create_table(stmt);
            }
            StatementType::CreateIndex => {
                self.parse_create_index(stmt);
            }
            StatementType::AlterTable => {
                self.parse_alter_table(stmt);
            }
            StatementType::Unknown => {}
        }
    }

    /// Parse a CREATE TABLE statement and add it to the schema.
    /// Returns the position of the table in the schema.
    pub fn parse_create_table(&mut self, stmt: &str) -> Option<usize> {
        let raw_name = CREATE_TABLE_NAME_RE.captures(stmt)?.get(1)?.as_str();
        let (schema_name, table_name) = split_qualified(raw_name)?;

        if let Some(pos) = self.position(schema_name.as_deref(), &table_name) {
            tracing::debug!(table = %table_name, "duplicate CREATE TABLE ignored");
            return Some(pos);
        }

        let mut table = Table::new(table_name);
        table.schema = schema_name;

        let body = extract_table_body(stmt)?;
        parse_table_body(&body, &mut table);

        self.schema.tables.push(table);
        Some(self.schema.tables.len() - 1)
    }

    /// Parse an ALTER TABLE statement, attaching any FOREIGN KEY constraints it adds
    pub fn parse_alter_table(&mut self, stmt: &str) -> Option<usize> {
        let raw_name = ALTER_TABLE_NAME_RE.captures(stmt)?.get(1)?.as_str();
        let (schema_name, table_name) = split_qualified(raw_name)?;
        let pos = self.find_table(schema_name.as_deref(), &table_name)?;

        let table = &mut self.schema.tables[pos];
        for fk in parse_foreign_keys(stmt) {
            mark_referencing_columns(table, &fk);
            table.foreign_keys.push(fk);
        }

        Some(pos)
    }

    /// Parse a CREATE INDEX statement and add it to the appropriate table
    pub fn parse_create_index(&mut self, stmt: &str) -> Option<usize> {
        let caps = CREATE_INDEX_RE.captures(stmt)?;

        let unique = caps.get(1).is_some();
        let name = unquote(caps.get(2)?.as_str());
        let (schema_name, table_name) = split_qualified(caps.get(3)?.as_str())?;
        let columns = parse_column_list(caps.get(4)?.as_str());

        let pos = self.find_table(schema_name.as_deref(), &table_name)?;
        self.schema.tables[pos].indexes.push(Index {
            name,
            columns,
            unique,
        });

        Some(pos)
    }

    /// Finalize the schema
    pub fn build(self) -> Schema {
        self.schema
    }

    /// Get current schema (for inspection during building)
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Exact (schema, name) position
    fn position(&self, schema: Option<&str>, name: &str) -> Option<usize> {
        self.schema
            .tables
            .iter()
            .position(|t| t.name == name && t.schema_name() == schema)
    }

    /// Match by schema and name when qualified, otherwise first table by name
    fn find_table(&self, schema: Option<&str>, name: &str) -> Option<usize> {
        match schema {
            Some(_) => self.position(schema, name),
            None => self.schema.tables.iter().position(|t| t.name == name),
        }
    }
}

/// Parse every supported statement from a reader
pub fn parse_reader<R: Read>(reader: R, dialect: Dialect) -> anyhow::Result<Schema> {
    let mut parser = Parser::new(reader, SMALL_BUFFER_SIZE);
    let mut builder = SchemaBuilder::new(dialect);

    while let Some(stmt) = parser.read_statement()? {
        builder.parse_statement(&stmt);
    }

    Ok(builder.build())
}

/// Parse DDL text
pub fn parse_sql(sql: &str, dialect: Dialect) -> Schema {
    let mut builder = SchemaBuilder::new(dialect);
    let mut parser = Parser::new(sql.as_bytes(), SMALL_BUFFER_SIZE);
    // Reading from an in-memory slice cannot fail
    while let Ok(Some(stmt)) = parser.read_statement() {
        builder.parse_statement(&stmt);
    }
    builder.build()
}

/// Parse a DDL file
pub fn parse_file(path: &Path, dialect: Dialect) -> anyhow::Result<Schema> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    parse_reader(file, dialect).with_context(|| format!("failed to read {}", path.display()))
}

/// Split a dotted identifier chain into (schema, table), stripping quotes.
/// For three-part names the database part is dropped.
pub fn split_qualified(raw: &str) -> Option<(Option<String>, String)> {
    let mut parts = split_dotted(raw);
    let name = parts.pop().filter(|n| !n.is_empty())?;
    let schema = parts.pop().filter(|s| !s.is_empty());
    Some((schema, name))
}

/// Split on dots that are outside quotes
fn split_dotted(raw: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut closing: Option<char> = None;

    for ch in raw.chars() {
        match closing {
            Some(c) if ch == c => {
                closing = None;
                current.push(ch);
            }
            Some(_) => current.push(ch),
            None => match ch {
                '"' => {
                    closing = Some('"');
                    current.push(ch);
                }
                '`' => {
                    closing = Some('`');
                    current.push(ch);
                }
                '[' => {
                    closing = Some(']');
                    current.push(ch);
                }
                '.' => {
                    parts.push(unquote(&current));
                    current.clear();
                }
                c if c.is_whitespace() => {}
                _ => current.push(ch),
            },
        }
    }
    parts.push(unquote(&current));
    parts
}

/// Strip one layer of identifier quoting
pub fn unquote(ident: &str) -> String {
    let s = ident.trim();
    let stripped = s
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .or_else(|| s.strip_prefix('`').and_then(|r| r.strip_suffix('`')))
        .or_else(|| s.strip_prefix('[').and_then(|r| r.strip_suffix(']')));
    stripped.unwrap_or(s).to_string()
}

/// Extract the body of a CREATE TABLE statement (between first ( and matching ))
fn extract_table_body(stmt: &str) -> Option<String> {
    let bytes = stmt.as_bytes();
    let mut depth = 0;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &b) in bytes.iter().enumerate() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if b == b'\\' && in_string {
            escape_next = true;
            continue;
        }

        if b == b'\'' {
            in_string = !in_string;
            continue;
        }

        if in_string {
            continue;
        }

        if b == b'(' {
            if depth == 0 {
                start = Some(i + 1);
            }
            depth += 1;
        } else if b == b')' {
            depth -= 1;
            if depth == 0 {
                if let Some(s) = start {
                    return Some(stmt[s..i].to_string());
                }
            }
        }
    }

    None
}

/// Parse the body of a CREATE TABLE to extract columns and constraints
fn parse_table_body(body: &str, table: &mut Table) {
    let mut pk_columns: Vec<String> = Vec::new();

    for part in split_table_body(body) {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }

        if TABLE_CONSTRAINT_RE.is_match(trimmed) {
            if let Some(cols) = parse_primary_key_constraint(trimmed) {
                for col in cols {
                    if !pk_columns.contains(&col) {
                        pk_columns.push(col);
                    }
                }
            }

            for fk in parse_foreign_keys(trimmed) {
                mark_referencing_columns(table, &fk);
                table.foreign_keys.push(fk);
            }

            if let Some(idx) = parse_inline_index(trimmed) {
                table.indexes.push(idx);
            } else if let Some(cols) = parse_unique_constraint(trimmed) {
                table.indexes.push(Index {
                    name: format!("{}_{}_unique", table.name, cols.join("_")),
                    columns: cols,
                    unique: true,
                });
            }
        } else if let Some(col) = parse_column_def(trimmed) {
            if col.primary_key && !pk_columns.contains(&col.name) {
                pk_columns.push(col.name.clone());
            }
            if let Some(reference) = &col.references {
                let referenced_table = match &reference.schema {
                    Some(schema) => format!("{}.{}", schema, reference.table),
                    None => reference.table.clone(),
                };
                table.foreign_keys.push(ForeignKey {
                    columns: vec![col.name.clone()],
                    referenced_table,
                    referenced_columns: vec![reference.column.clone()],
                    name: reference.constraint_name.clone(),
                });
            }
            table.columns.push(col);
        }
    }

    for name in &pk_columns {
        if let Some(col) = table.get_column_mut(name) {
            col.primary_key = true;
            col.nullable = false;
        }
    }

    if !pk_columns.is_empty() {
        table.primary_key = Some(pk_columns);
    }
}

/// Record the referenced column on each local column of a foreign key
fn mark_referencing_columns(table: &mut Table, fk: &ForeignKey) {
    let (ref_schema, ref_table) = match split_qualified(&fk.referenced_table) {
        Some(parts) => parts,
        None => return,
    };

    for (i, local) in fk.columns.iter().enumerate() {
        let ref_column = fk
            .referenced_columns
            .get(i)
            .cloned()
            .unwrap_or_else(|| "id".to_string());
        if let Some(col) = table.get_column_mut(local) {
            if col.references.is_none() {
                col.references = Some(ColumnReference {
                    table: ref_table.clone(),
                    column: ref_column,
                    schema: ref_schema.clone(),
                    constraint_name: fk.name.clone(),
                });
            }
        }
    }
}

/// Split table body by commas, respecting nested parentheses
pub fn split_table_body(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for ch in body.chars() {
        if escape_next {
            current.push(ch);
            escape_next = false;
            continue;
        }

        if ch == '\\' && in_string {
            current.push(ch);
            escape_next = true;
            continue;
        }

        if ch == '\'' {
            in_string = !in_string;
            current.push(ch);
            continue;
        }

        if in_string {
            current.push(ch);
            continue;
        }

        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

/// Parse a column definition
fn parse_column_def(def: &str) -> Option<Column> {
    let caps = COLUMN_DEF_RE.captures(def)?;
    let name = unquote(caps.get(1)?.as_str());
    let col_type = normalize_type(caps.get(2)?.as_str());
    let rest = &def[caps.get(0)?.end()..];

    let primary_key = INLINE_PRIMARY_KEY_RE.is_match(rest);
    let nullable = !primary_key && !NOT_NULL_RE.is_match(rest);
    let unique = INLINE_UNIQUE_RE.is_match(rest);
    let default_value = DEFAULT_RE
        .captures(rest)
        .and_then(|c| c.get(1))
        .map(|m| normalize_default(m.as_str()));
    let references = parse_inline_reference(rest);

    Some(Column {
        name,
        col_type,
        nullable,
        primary_key,
        unique,
        default_value,
        references,
    })
}

/// Parse an inline `REFERENCES t(col)` clause
fn parse_inline_reference(rest: &str) -> Option<ColumnReference> {
    let caps = INLINE_REFERENCES_RE.captures(rest)?;
    let constraint_name = caps.get(1).map(|m| unquote(m.as_str()));
    let (schema, table) = split_qualified(caps.get(2)?.as_str())?;
    let column = caps
        .get(3)
        .map(|m| unquote(m.as_str()))
        .unwrap_or_else(|| "id".to_string());

    Some(ColumnReference {
        table,
        column,
        schema,
        constraint_name,
    })
}

/// Upper-case a type keyword, collapse whitespace and keep parameters
fn normalize_type(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let collapsed = collapsed.replace(" (", "(").replace(" [", "[");
    match collapsed.find('(') {
        Some(open) => {
            let (head, params) = collapsed.split_at(open);
            let close = params.find(')').map(|i| i + 1).unwrap_or(params.len());
            let (args, tail) = params.split_at(close);
            let args = args
                .trim_start_matches('(')
                .trim_end_matches(')')
                .split(',')
                .map(str::trim)
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}({}){}", head.to_uppercase(), args, tail.to_uppercase())
        }
        None => collapsed.to_uppercase(),
    }
}

/// Normalize a DEFAULT literal
fn normalize_default(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('\'') {
        return trimmed.to_string();
    }
    match trimmed.to_uppercase().as_str() {
        "TRUE" | "FALSE" | "NULL" => return trimmed.to_uppercase(),
        _ => {}
    }
    if let Some(open) = trimmed.find('(') {
        if open > 0 {
            return format!("{}()", trimmed[..open].trim());
        }
    }
    trimmed.to_string()
}

/// Parse PRIMARY KEY constraint, returns column names
fn parse_primary_key_constraint(constraint: &str) -> Option<Vec<String>> {
    let caps = PRIMARY_KEY_RE.captures(constraint)?;
    let cols_str = caps.get(1)?.as_str();
    Some(parse_column_list(cols_str))
}

/// Parse table-level UNIQUE (cols), returns column names
fn parse_unique_constraint(constraint: &str) -> Option<Vec<String>> {
    let caps = UNIQUE_CONSTRAINT_RE.captures(constraint)?;
    let cols = parse_column_list(caps.get(1)?.as_str());
    (!cols.is_empty()).then_some(cols)
}

/// Parse inline INDEX/KEY constraint from CREATE TABLE body
fn parse_inline_index(constraint: &str) -> Option<Index> {
    let caps = INLINE_INDEX_RE.captures(constraint)?;

    let unique = caps.get(1).is_some();
    let name = caps.get(2)?.as_str().to_string();
    let columns = parse_column_list(caps.get(3)?.as_str());

    Some(Index {
        name,
        columns,
        unique,
    })
}

/// Parse FOREIGN KEY constraints from a statement
fn parse_foreign_keys(stmt: &str) -> Vec<ForeignKey> {
    let mut fks = Vec::new();

    for caps in FOREIGN_KEY_RE.captures_iter(stmt) {
        let name = caps.get(1).map(|m| unquote(m.as_str()));
        let local_cols = caps
            .get(2)
            .map(|m| parse_column_list(m.as_str()))
            .unwrap_or_default();
        let ref_table = caps
            .get(3)
            .and_then(|m| split_qualified(m.as_str()))
            .map(|(schema, table)| match schema {
                Some(schema) => format!("{}.{}", schema, table),
                None => table,
            })
            .unwrap_or_default();
        let mut ref_cols = caps
            .get(4)
            .map(|m| parse_column_list(m.as_str()))
            .unwrap_or_default();
        if ref_cols.is_empty() {
            ref_cols.push("id".to_string());
        }

        if !local_cols.is_empty() && !ref_table.is_empty() {
            fks.push(ForeignKey {
                columns: local_cols,
                referenced_table: ref_table,
                referenced_columns: ref_cols,
                name,
            });
        }
    }

    fks
}

/// Parse a comma-separated column list, stripping quotes (backticks, double quotes, brackets)
pub fn parse_column_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|c| {
            c.trim()
                .trim_matches('`')
                .trim_matches('"')
                .trim_matches('[')
                .trim_matches(']')
                .to_string()
        })
        .filter(|c| !c.is_empty())
        .collect()
}
