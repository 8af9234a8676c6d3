//! Foreign key target resolution.
//!
//! A foreign key's `referenced_table` may be schema-qualified, a bare table
//! name that is unique across schemas, or a bare name shared by tables in
//! several schemas. [`TableIndex`] maps all three shapes to a dense table id.

use super::{qualified_name, Table};
use ahash::AHashMap;

/// Lookup over a set of tables keyed by qualified name and by simple name.
///
/// Ids are dense and assigned in first-declaration order. Tables that repeat
/// an already indexed qualified name share the id of the first declaration.
#[derive(Debug, Default)]
pub struct TableIndex {
    /// Qualified name per id
    names: Vec<String>,
    /// Schema per id (empty schemas normalized to `None`)
    schemas: Vec<Option<String>>,
    by_qualified: AHashMap<String, usize>,
    /// Simple name -> ids, in declaration order
    by_name: AHashMap<String, Vec<usize>>,
}

impl TableIndex {
    /// Build the index from tables in declaration order
    pub fn new<'a, I>(tables: I) -> Self
    where
        I: IntoIterator<Item = &'a Table>,
    {
        let mut index = Self::default();
        for table in tables {
            index.insert(table);
        }
        index
    }

    /// Insert a table, returning its id (existing id for a repeated qualified name)
    pub fn insert(&mut self, table: &Table) -> usize {
        let qualified = qualified_name(table);
        if let Some(&id) = self.by_qualified.get(&qualified) {
            return id;
        }

        let id = self.names.len();
        self.by_qualified.insert(qualified.clone(), id);
        self.by_name.entry(table.name.clone()).or_default().push(id);
        self.names.push(qualified);
        self.schemas.push(table.schema_name().map(str::to_string));
        id
    }

    /// Number of distinct qualified names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Id of a table by exact qualified name
    pub fn get(&self, qualified: &str) -> Option<usize> {
        self.by_qualified.get(qualified).copied()
    }

    /// Qualified name for an id
    pub fn name(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// All qualified names, indexed by id
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Resolve a foreign key target seen from a table in `from_schema`.
    ///
    /// 1. An exact qualified-name match wins.
    /// 2. Otherwise the value is treated as a simple name; a single candidate
    ///    is returned as-is.
    /// 3. With several candidates, the one in `from_schema` is preferred,
    ///    falling back to the first declared candidate.
    ///
    /// Returns `None` when nothing matches.
    pub fn resolve(&self, from_schema: Option<&str>, referenced: &str) -> Option<usize> {
        if let Some(id) = self.get(referenced) {
            return Some(id);
        }

        let candidates = self.by_name.get(referenced)?;
        match candidates.as_slice() {
            [] => None,
            [only] => Some(*only),
            [first, ..] => {
                let same_schema = from_schema.filter(|s| !s.is_empty()).and_then(|schema| {
                    candidates
                        .iter()
                        .copied()
                        .find(|&id| self.schemas[id].as_deref() == Some(schema))
                });
                Some(same_schema.unwrap_or(*first))
            }
        }
    }

    /// Resolve a foreign key declared on `table`
    pub fn resolve_from(&self, table: &Table, referenced: &str) -> Option<usize> {
        self.resolve(table.schema_name(), referenced)
    }
}
