//! Shared fixtures: grammar folders written to a temporary directory.

#![allow(dead_code)]

use pdf_grammar::grammar::GrammarCache;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const HEADER: &str = "Key\tTYPE\tSinceVersion\tDeprecatedIn\tREQUIRED\tINDIRECTREFERENCE\tRequiredValue\tDefaultValue\tPossibleValues\tSpecialCase\tLink";

/// A grammar row written with `|` between columns; missing trailing columns
/// are left empty.
pub fn row(columns: &str) -> String {
    let mut fields: Vec<&str> = columns.split('|').collect();
    fields.resize(11, "");
    fields.join("\t")
}

pub struct GrammarFolder {
    dir: TempDir,
}

impl GrammarFolder {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// Write `<link>.tsv` with the standard header and the given rows.
    pub fn table(self, link: &str, rows: &[&str]) -> Self {
        let mut text = String::from(HEADER);
        text.push('\n');
        for columns in rows {
            text.push_str(&row(columns));
            text.push('\n');
        }
        self.raw(&format!("{link}.tsv"), &text)
    }

    /// Write a file verbatim.
    pub fn raw(self, name: &str, content: &str) -> Self {
        fs::write(self.dir.path().join(name), content).expect("write grammar file");
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn cache(&self) -> GrammarCache {
        GrammarCache::from_folder(self.dir.path())
    }
}
