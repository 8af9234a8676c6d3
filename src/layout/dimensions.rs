//! Table size estimation from content.

use super::LayoutOptions;
use crate::schema::{Column, Table};

/// Extra height of the header band on top of one row
pub const HEADER_EXTRA: f64 = 4.0;

/// Width and height of a laid out table
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TableSize {
    pub width: f64,
    pub height: f64,
}

/// One-line rendering of a column used for width estimation:
/// `name: type` followed by `PK`, `FK` and `NN` tags where they apply.
pub fn column_line(col: &Column) -> String {
    let mut line = format!("{}: {}", col.name, col.col_type);
    if col.primary_key {
        line.push_str(" PK");
    }
    if col.is_foreign_key() {
        line.push_str(" FK");
    }
    if !col.nullable && !col.primary_key {
        line.push_str(" NN");
    }
    line
}

/// Estimate a table's size from its own name and columns
pub fn estimate(table: &Table, opts: &LayoutOptions) -> TableSize {
    let longest = table
        .columns
        .iter()
        .map(|c| column_line(c).chars().count())
        .fold(table.name.chars().count(), usize::max);

    let width = opts
        .min_table_width
        .max(longest as f64 * opts.char_width + opts.padding * 2.0);

    let header_height = opts.row_height + HEADER_EXTRA;
    let height = header_height + table.columns.len() as f64 * opts.row_height + opts.padding;

    TableSize { width, height }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_line_tags() {
        assert_eq!(column_line(&Column::new("id", "SERIAL").as_primary_key()), "id: SERIAL PK");
        assert_eq!(
            column_line(&Column::new("user_id", "INT").not_null().with_reference("users", "id")),
            "user_id: INT FK NN"
        );
        assert_eq!(column_line(&Column::new("note", "TEXT")), "note: TEXT");
    }

    #[test]
    fn test_minimum_width_applies() {
        let table = Table::new("t").with_column(Column::new("id", "INT"));
        let size = estimate(&table, &LayoutOptions::default());
        assert_eq!(size.width, 150.0);
        // header (26 + 4) + 1 row (26) + padding (20)
        assert_eq!(size.height, 76.0);
    }

    #[test]
    fn test_width_from_longest_line() {
        let table = Table::new("accounts")
            .with_column(Column::new("description", "VARCHAR(255)").not_null());
        let size = estimate(&table, &LayoutOptions::default());
        // "description: VARCHAR(255) NN" is 28 chars
        assert_eq!(size.width, 28.0 * 8.0 + 40.0);
    }

    #[test]
    fn test_empty_table_uses_name() {
        let name = "a_really_long_table_name_without_columns";
        let size = estimate(&Table::new(name), &LayoutOptions::default());
        assert_eq!(size.width, name.len() as f64 * 8.0 + 40.0);
        assert_eq!(size.height, 50.0);
    }
}
