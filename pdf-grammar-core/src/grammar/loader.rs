//! Reading grammar files.
//!
//! A grammar folder holds one delimiter-separated file per link name, e.g.
//! `Catalog.tsv` for the link `Catalog`. [`GrammarLoader::load`] parses a
//! file; only a header too short to name every column stops it. Rows that
//! cannot be built (missing columns, bad expressions, misaligned segments)
//! are kept as [`RowDefect`]s and [`GrammarLoader::validate`] reports them
//! together with header and type defects, one by one.

use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::error::{GrammarError, Result};
use crate::grammar::row::{column, GrammarRow, HEADER};
use crate::grammar::table::{GrammarTable, RowDefect};
use crate::grammar::types::TypeToken;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Options for reading grammar files.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Column delimiter
    pub delimiter: char,
    /// File extension of grammar files, without the dot
    pub extension: String,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            extension: "tsv".to_string(),
        }
    }
}

impl LoaderOptions {
    /// Set the column delimiter
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the grammar file extension
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

#[derive(Debug, Clone)]
pub struct GrammarLoader {
    folder: PathBuf,
    options: LoaderOptions,
}

impl GrammarLoader {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self::with_options(folder, LoaderOptions::default())
    }

    pub fn with_options(folder: impl Into<PathBuf>, options: LoaderOptions) -> Self {
        Self {
            folder: folder.into(),
            options,
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn path_for(&self, link: &str) -> PathBuf {
        self.folder
            .join(format!("{link}.{}", self.options.extension))
    }

    /// Link names of every grammar file in the folder, sorted.
    pub fn links(&self) -> Result<Vec<String>> {
        let mut links = Vec::new();
        for entry in fs::read_dir(&self.folder)? {
            let path = entry?.path();
            let matches = path
                .extension()
                .is_some_and(|ext| ext == self.options.extension.as_str());
            if matches && path.is_file() {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    links.push(stem.to_string());
                }
            }
        }
        links.sort();
        Ok(links)
    }

    pub fn load_link(&self, link: &str) -> Result<GrammarTable> {
        let path = self.path_for(link);
        let text = fs::read_to_string(&path)?;
        self.parse(link, &path, &text)
    }

    /// Load a grammar file; the link name is the file stem.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<GrammarTable> {
        let path = path.as_ref();
        let link = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let text = fs::read_to_string(path)?;
        self.parse(&link, path, &text)
    }

    /// Parse grammar text. `source` is only used in messages.
    pub fn parse(&self, link: &str, source: &Path, text: &str) -> Result<GrammarTable> {
        let mut header: Option<Vec<String>> = None;
        let mut rows = Vec::new();
        let mut defects = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<String> = line
                .split(self.options.delimiter)
                .map(str::to_string)
                .collect();

            if header.is_none() {
                if fields.len() < column::COUNT {
                    return Err(GrammarError::MalformedHeader {
                        path: source.to_path_buf(),
                        message: format!(
                            "expected {} columns, found {}",
                            column::COUNT,
                            fields.len()
                        ),
                    });
                }
                header = Some(fields.iter().map(|f| f.trim().to_string()).collect());
                continue;
            }

            match GrammarRow::from_fields(&fields, index + 1) {
                Ok(row) => rows.push(row),
                Err(message) => {
                    debug!(link, line = index + 1, %message, "skipping malformed grammar row");
                    defects.push(RowDefect {
                        line: index + 1,
                        key: fields[0].trim().to_string(),
                        message,
                    });
                }
            }
        }

        debug!(
            link,
            path = %source.display(),
            rows = rows.len(),
            defects = defects.len(),
            "loaded grammar table"
        );
        Ok(GrammarTable::new(
            link,
            source,
            header.unwrap_or_default(),
            rows,
            defects,
        ))
    }

    /// Report every defect of a loaded table: empty file, each wrong header
    /// column, each malformed row and each unknown type token, rows in file
    /// order. Returns `true` if there were none.
    pub fn validate(table: &GrammarTable, sink: &mut dyn DiagnosticSink) -> bool {
        let context = table.source().display().to_string();
        if table.is_empty() {
            sink.report(Diagnostic::new(
                DiagnosticKind::StructuralError,
                table.link(),
                &context,
                "empty grammar file",
            ));
            return false;
        }

        let mut valid = true;
        for (i, expected) in HEADER.iter().enumerate() {
            let found = table.header().get(i).map(String::as_str);
            if found != Some(*expected) {
                sink.report(
                    Diagnostic::new(
                        DiagnosticKind::MalformedHeader,
                        table.link(),
                        &context,
                        format!(
                            "header column {} should be '{expected}', found '{}'",
                            i + 1,
                            found.unwrap_or_default()
                        ),
                    )
                    .with_key(*expected),
                );
                valid = false;
            }
        }

        let mut row_findings: Vec<(usize, String, String)> = table
            .defects()
            .iter()
            .map(|d| (d.line, d.key.clone(), format!("line {}: {}", d.line, d.message)))
            .collect();
        for row in table.rows() {
            for token in &row.types {
                if let TypeToken::Unknown(name) = token {
                    row_findings.push((
                        row.line,
                        row.key.to_string(),
                        format!("unknown type '{name}' on line {}", row.line),
                    ));
                }
            }
        }
        row_findings.sort_by_key(|(line, _, _)| *line);

        for (_, key, message) in row_findings {
            sink.report(
                Diagnostic::new(DiagnosticKind::StructuralError, table.link(), &context, message)
                    .with_key(key),
            );
            valid = false;
        }

        valid
    }
}
