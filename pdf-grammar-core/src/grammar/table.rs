use crate::grammar::row::{GrammarRow, KeyPattern};
use std::path::{Path, PathBuf};

/// A data row that could not be turned into a [`GrammarRow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDefect {
    /// 1-based line number in the grammar file.
    pub line: usize,
    pub key: String,
    pub message: String,
}

/// A parsed grammar file: the schema for one link name.
#[derive(Debug, Clone)]
pub struct GrammarTable {
    link: String,
    source: PathBuf,
    header: Vec<String>,
    rows: Vec<GrammarRow>,
    defects: Vec<RowDefect>,
}

impl GrammarTable {
    pub(crate) fn new(
        link: impl Into<String>,
        source: impl Into<PathBuf>,
        header: Vec<String>,
        rows: Vec<GrammarRow>,
        defects: Vec<RowDefect>,
    ) -> Self {
        Self {
            link: link.into(),
            source: source.into(),
            header,
            rows,
            defects,
        }
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Header columns as read; empty for an empty file.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[GrammarRow] {
        &self.rows
    }

    /// Rows skipped at load because they were malformed.
    pub fn defects(&self) -> &[RowDefect] {
        &self.defects
    }

    /// True when the file had no lines at all.
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.rows.is_empty() && self.defects.is_empty()
    }

    pub fn row(&self, key: &str) -> Option<&GrammarRow> {
        self.rows
            .iter()
            .find(|row| matches!(&row.key, KeyPattern::Name(name) if name == key))
    }

    /// Row for a dictionary key or, for a numeric label, an array index.
    pub fn row_for(&self, label: &str) -> Option<&GrammarRow> {
        match KeyPattern::parse(label) {
            KeyPattern::Wildcard => None,
            pattern => self.rows.iter().find(|row| row.key == pattern),
        }
    }

    pub fn wildcard(&self) -> Option<&GrammarRow> {
        self.rows.iter().find(|row| row.key == KeyPattern::Wildcard)
    }

    /// Whether the table describes an array (index and wildcard keys only).
    pub fn is_array_table(&self) -> bool {
        self.rows
            .iter()
            .any(|row| matches!(row.key, KeyPattern::Index(_)))
            && !self.has_named_keys()
    }

    /// Whether any row names a dictionary key.
    pub fn has_named_keys(&self) -> bool {
        self.rows
            .iter()
            .any(|row| matches!(row.key, KeyPattern::Name(_)))
    }

    pub fn names_key(&self, key: &str) -> bool {
        self.row(key).is_some()
    }

    pub fn names_index(&self, index: usize) -> bool {
        self.rows.iter().any(|row| row.key == KeyPattern::Index(index))
    }
}
