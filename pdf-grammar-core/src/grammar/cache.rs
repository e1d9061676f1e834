//! Process-wide cache of loaded grammar tables.

use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::error::{GrammarError, Result};
use crate::grammar::loader::GrammarLoader;
use crate::grammar::table::GrammarTable;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
enum CacheEntry {
    Ready(Arc<GrammarTable>),
    /// Loading or validation failed; the reason is kept so later lookups fail
    /// the same way without touching the file system again.
    Failed(String),
}

impl CacheEntry {
    fn to_result(&self, link: &str) -> Result<Arc<GrammarTable>> {
        match self {
            CacheEntry::Ready(table) => Ok(Arc::clone(table)),
            CacheEntry::Failed(reason) => Err(GrammarError::SchemaMissing {
                link: link.to_string(),
                reason: reason.clone(),
            }),
        }
    }
}

/// Grammar tables by link name, each file parsed and validated at most once.
///
/// The cache is `Send + Sync`; share it between runs behind an `Arc`.
/// Grammar defects are reported to the sink of the lookup that first loads
/// the file.
#[derive(Debug)]
pub struct GrammarCache {
    loader: GrammarLoader,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl GrammarCache {
    pub fn new(loader: GrammarLoader) -> Self {
        Self {
            loader,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_folder(folder: impl Into<PathBuf>) -> Self {
        Self::new(GrammarLoader::new(folder))
    }

    pub fn loader(&self) -> &GrammarLoader {
        &self.loader
    }

    /// Look up the table for `link`, loading and validating it on first use.
    pub fn get(&self, link: &str, sink: &mut dyn DiagnosticSink) -> Result<Arc<GrammarTable>> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = entries.get(link) {
                return entry.to_result(link);
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have loaded it while we waited for the lock
        if let Some(entry) = entries.get(link) {
            return entry.to_result(link);
        }

        let entry = match self.loader.load_link(link) {
            Ok(table) => {
                if GrammarLoader::validate(&table, sink) {
                    CacheEntry::Ready(Arc::new(table))
                } else {
                    warn!(link, "grammar table has defects");
                    CacheEntry::Failed("grammar file has defects".to_string())
                }
            }
            Err(e) => {
                warn!(link, error = %e, "failed to load grammar table");
                if let Some(diagnostic) = load_failure(link, &e) {
                    sink.report(diagnostic);
                }
                CacheEntry::Failed(e.to_string())
            }
        };
        debug!(link, cached = entries.len() + 1, "grammar cache entry created");

        let result = entry.to_result(link);
        entries.insert(link.to_string(), entry);
        result
    }

    /// Load every grammar file in the folder; returns the links that failed.
    pub fn load_all(&self, sink: &mut dyn DiagnosticSink) -> Result<Vec<String>> {
        let mut failed = Vec::new();
        for link in self.loader.links()? {
            if self.get(&link, sink).is_err() {
                failed.push(link);
            }
        }
        Ok(failed)
    }

    pub fn contains(&self, link: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(link)
    }

    /// Number of links looked up so far, loaded or failed.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Grammar defects found while loading become diagnostics; a missing or
/// unreadable file does not, the caller reports it where it was needed.
fn load_failure(link: &str, error: &GrammarError) -> Option<Diagnostic> {
    match error {
        GrammarError::MalformedHeader { path, message } => Some(Diagnostic::new(
            DiagnosticKind::MalformedHeader,
            link,
            path.display().to_string(),
            message.clone(),
        )),
        _ => None,
    }
}
