//! Streaming SQL statement reader and statement classification.

use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{BufRead, BufReader, Read};

pub const SMALL_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementType {
    Unknown,
    CreateTable,
    CreateIndex,
    AlterTable,
}

static CREATE_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*CREATE\s+(?:OR\s+REPLACE\s+)?(?:(?:GLOBAL|LOCAL)\s+)?(?:(?:TEMP|TEMPORARY|UNLOGGED)\s+)?TABLE\b",
    )
    .unwrap()
});

static CREATE_INDEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*CREATE\s+(?:UNIQUE\s+)?(?:CLUSTERED\s+|NONCLUSTERED\s+)?INDEX\b").unwrap()
});

static ALTER_TABLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*ALTER\s+TABLE\b").unwrap());

/// Lexical state carried across buffer refills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lex {
    Normal,
    SingleQuote,
    DoubleQuote,
    LineComment,
    BlockComment,
}

/// Reads `;`-terminated statements from a byte stream.
///
/// Terminators inside quoted strings and comments are ignored. Comment text
/// is dropped from the returned statements.
pub struct Parser<R: Read> {
    reader: BufReader<R>,
    stmt_buffer: Vec<u8>,
    state: Lex,
    escaped: bool,
    prev: u8,
}

impl<R: Read> Parser<R> {
    pub fn new(reader: R, buffer_size: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(buffer_size, reader),
            stmt_buffer: Vec::with_capacity(4 * 1024),
            state: Lex::Normal,
            escaped: false,
            prev: 0,
        }
    }

    /// Next non-blank statement, trimmed, including its `;` terminator when present
    pub fn read_statement(&mut self) -> std::io::Result<Option<String>> {
        loop {
            match self.read_raw()? {
                None => return Ok(None),
                Some(stmt) => {
                    let text = String::from_utf8_lossy(&stmt).trim().to_string();
                    if text.is_empty() || text == ";" {
                        continue;
                    }
                    return Ok(Some(text));
                }
            }
        }
    }

    fn read_raw(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        self.stmt_buffer.clear();

        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                self.state = Lex::Normal;
                self.prev = 0;
                if self.stmt_buffer.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(std::mem::take(&mut self.stmt_buffer)));
            }

            let mut consumed = buf.len();
            let mut found_terminator = false;

            for (i, &b) in buf.iter().enumerate() {
                match self.state {
                    Lex::Normal => {
                        if b == b'-' && self.prev == b'-' {
                            self.stmt_buffer.pop();
                            self.state = Lex::LineComment;
                            self.prev = 0;
                            continue;
                        }
                        if b == b'*' && self.prev == b'/' {
                            self.stmt_buffer.pop();
                            self.state = Lex::BlockComment;
                            self.prev = 0;
                            continue;
                        }
                        self.stmt_buffer.push(b);
                        match b {
                            b'\'' => self.state = Lex::SingleQuote,
                            b'"' => self.state = Lex::DoubleQuote,
                            b';' => {
                                consumed = i + 1;
                                found_terminator = true;
                                self.prev = 0;
                                break;
                            }
                            _ => {}
                        }
                    }
                    Lex::SingleQuote | Lex::DoubleQuote => {
                        self.stmt_buffer.push(b);
                        if self.escaped {
                            self.escaped = false;
                        } else if b == b'\\' {
                            self.escaped = true;
                        } else if (b == b'\'' && self.state == Lex::SingleQuote)
                            || (b == b'"' && self.state == Lex::DoubleQuote)
                        {
                            self.state = Lex::Normal;
                            self.prev = 0;
                            continue;
                        }
                    }
                    Lex::LineComment => {
                        if b == b'\n' {
                            self.stmt_buffer.push(b'\n');
                            self.state = Lex::Normal;
                            self.prev = 0;
                            continue;
                        }
                    }
                    Lex::BlockComment => {
                        if b == b'/' && self.prev == b'*' {
                            self.stmt_buffer.push(b' ');
                            self.state = Lex::Normal;
                            self.prev = 0;
                            continue;
                        }
                    }
                }
                self.prev = b;
            }

            self.reader.consume(consumed);
            if found_terminator {
                return Ok(Some(std::mem::take(&mut self.stmt_buffer)));
            }
        }
    }

    /// Classify a statement by its leading keywords
    pub fn parse_statement(stmt: &str) -> StatementType {
        if CREATE_TABLE_RE.is_match(stmt) {
            StatementType::CreateTable
        } else if CREATE_INDEX_RE.is_match(stmt) {
            StatementType::CreateIndex
        } else if ALTER_TABLE_RE.is_match(stmt) {
            StatementType::AlterTable
        } else {
            StatementType::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statements(sql: &str, buffer_size: usize) -> Vec<String> {
        let mut parser = Parser::new(sql.as_bytes(), buffer_size);
        let mut out = Vec::new();
        while let Some(stmt) = parser.read_statement().unwrap() {
            out.push(stmt);
        }
        out
    }

    #[test]
    fn test_parse_create_table() {
        assert_eq!(
            Parser::<&[u8]>::parse_statement("CREATE TABLE users (id INT);"),
            StatementType::CreateTable
        );
        assert_eq!(
            Parser::<&[u8]>::parse_statement("create unlogged table t (id int);"),
            StatementType::CreateTable
        );
    }

    #[test]
    fn test_parse_create_index() {
        assert_eq!(
            Parser::<&[u8]>::parse_statement("CREATE UNIQUE INDEX idx ON users (email);"),
            StatementType::CreateIndex
        );
    }

    #[test]
    fn test_parse_alter_and_unknown() {
        assert_eq!(
            Parser::<&[u8]>::parse_statement("ALTER TABLE orders ADD COLUMN status INT;"),
            StatementType::AlterTable
        );
        assert_eq!(
            Parser::<&[u8]>::parse_statement("INSERT INTO t VALUES (1);"),
            StatementType::Unknown
        );
    }

    #[test]
    fn test_read_statement_basic() {
        let stmts = statements("CREATE TABLE t1 (id INT); CREATE TABLE t2 (id INT);", 1024);
        assert_eq!(
            stmts,
            vec!["CREATE TABLE t1 (id INT);", "CREATE TABLE t2 (id INT);"]
        );
    }

    #[test]
    fn test_read_statement_with_strings() {
        let stmts = statements("INSERT INTO t1 VALUES ('hello; world');", 1024);
        assert_eq!(stmts, vec!["INSERT INTO t1 VALUES ('hello; world');"]);
    }

    #[test]
    fn test_comments_are_stripped() {
        let sql = "-- header; comment\nCREATE TABLE a (\n  id INT, -- the id; really\n  /* block; */ name TEXT\n);";
        let stmts = statements(sql, 1024);
        assert_eq!(stmts.len(), 1);
        assert!(!stmts[0].contains("--"));
        assert!(!stmts[0].contains("really"));
        assert!(!stmts[0].contains("block"));
        assert!(stmts[0].contains("name TEXT"));
    }

    #[test]
    fn test_small_buffer_split_comment_marker() {
        let sql = "CREATE TABLE a (id INT); -- x; y\nCREATE TABLE b (id INT);";
        let stmts = statements(sql, 2);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[1], "CREATE TABLE b (id INT);");
    }

    #[test]
    fn test_trailing_statement_without_terminator() {
        let stmts = statements("CREATE TABLE a (id INT);\nCREATE TABLE b (id INT)\n", 1024);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[1], "CREATE TABLE b (id INT)");
    }
}
