//! Graph validation
//!
//! A [`GraphValidator`] walks an object graph breadth-first from one or more
//! seeds, checking every container against the grammar table its parent's
//! row links it to. Each (object, link) pair is checked at most once per run,
//! which is what makes cyclic graphs terminate.
//!
//! # Example
//!
//! ```rust,no_run
//! use pdf_grammar::grammar::GrammarCache;
//! use pdf_grammar::objects::ObjectStore;
//! use pdf_grammar::validator::{GraphValidator, ValidatorOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = GrammarCache::from_folder("tsv/latest");
//! let store = ObjectStore::new();
//!
//! let mut validator = GraphValidator::with_options(&store, &cache, ValidatorOptions::default());
//! validator.add_work_item(store.trailer(), "FileTrailer", "Trailer");
//!
//! let mut diagnostics = Vec::new();
//! let stats = validator.run(&mut diagnostics)?;
//! println!("checked {} objects, {} findings", stats.checked, diagnostics.len());
//! # Ok(())
//! # }
//! ```

use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::error::{GrammarError, Result};
use crate::grammar::{GrammarCache, PdfVersion};
use crate::objects::{dereference, Object, ObjectId, ObjectProvider};
use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{debug, trace};

mod checks;
pub mod resolver;
pub mod trees;
pub mod work;

pub use resolver::{LinkResolver, Resolution};
pub use trees::TreeKind;
pub use work::{Identity, ProcessedRecord, WorkItem};

/// Options for a validation run
#[derive(Debug, Clone, Default)]
pub struct ValidatorOptions {
    /// Version to validate against; otherwise the document's, otherwise 2.0
    pub pdf_version: Option<PdfVersion>,
    /// Stop after checking this many objects
    pub max_items: Option<usize>,
    /// Stop when this flag is raised
    pub cancel: Option<Arc<AtomicBool>>,
}

impl ValidatorOptions {
    /// Validate against a specific PDF version
    pub fn with_pdf_version(mut self, version: PdfVersion) -> Self {
        self.pdf_version = Some(version);
        self
    }

    /// Limit the number of objects checked
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    /// Set a cancellation flag, checked between objects
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Summary of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// The version the run validated against.
    pub version: PdfVersion,
    /// Objects checked.
    pub checked: usize,
    /// Repeat visits turned away by the processed record.
    pub suppressed: usize,
    /// Work left in the queue when the run stopped early.
    pub remaining: usize,
    /// The run stopped because of the cancel flag or the item budget.
    pub cancelled: bool,
}

/// One validation run over one document.
pub struct GraphValidator<'a> {
    provider: &'a dyn ObjectProvider,
    cache: &'a GrammarCache,
    options: ValidatorOptions,
    version: PdfVersion,
    queue: VecDeque<WorkItem<'a>>,
    processed: ProcessedRecord,
    checked: Vec<(Identity, String)>,
}

impl<'a> GraphValidator<'a> {
    pub fn new(provider: &'a dyn ObjectProvider, cache: &'a GrammarCache) -> Self {
        Self::with_options(provider, cache, ValidatorOptions::default())
    }

    pub fn with_options(
        provider: &'a dyn ObjectProvider,
        cache: &'a GrammarCache,
        options: ValidatorOptions,
    ) -> Self {
        let version = options
            .pdf_version
            .or_else(|| provider.version())
            .unwrap_or_default();
        Self {
            provider,
            cache,
            options,
            version,
            queue: VecDeque::new(),
            processed: ProcessedRecord::new(),
            checked: Vec::new(),
        }
    }

    /// The version rows are evaluated against.
    pub fn version(&self) -> PdfVersion {
        self.version
    }

    /// Seed the queue. Seeds are always enqueued, even if the same pair was
    /// seeded before.
    pub fn add_work_item(&mut self, object: &'a Object, link: &str, context: &str) {
        let (object, reference) = match dereference(self.provider, object) {
            Some(resolved) => resolved,
            None => (object, object.as_reference()),
        };
        let identity = Identity::of(object, reference);
        self.processed.insert(identity.clone(), link);
        self.queue.push_back(WorkItem {
            object,
            identity,
            link: link.to_string(),
            context: context.to_string(),
            seeded: true,
        });
    }

    /// Drain the queue, reporting every finding to `sink`.
    ///
    /// Fails only when the grammar for a seed cannot be loaded. A missing
    /// grammar for anything discovered along the way is reported as
    /// `SchemaMissing` and that subtree is skipped.
    pub fn run(&mut self, sink: &mut dyn DiagnosticSink) -> Result<RunStats> {
        let mut checked = 0;
        let mut cancelled = false;
        debug!(version = %self.version, seeds = self.queue.len(), "starting validation run");

        while !self.queue.is_empty() {
            if self.should_stop(checked) {
                cancelled = true;
                break;
            }
            let Some(item) = self.queue.pop_front() else {
                break;
            };

            let table = match self.cache.get(&item.link, sink) {
                Ok(table) => table,
                Err(e) if item.seeded => return Err(e),
                Err(e) => {
                    let reason = match e {
                        GrammarError::SchemaMissing { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    sink.report(Diagnostic::new(
                        DiagnosticKind::SchemaMissing,
                        &item.link,
                        &item.context,
                        format!("cannot load grammar: {reason}"),
                    ));
                    continue;
                }
            };

            trace!(link = %item.link, identity = %item.identity, context = %item.context, "checking object");
            self.checked.push((item.identity.clone(), item.link.clone()));
            checked += 1;
            self.check_object(&item, &table, sink);
        }

        let stats = RunStats {
            version: self.version,
            checked,
            suppressed: self.processed.suppressed(),
            remaining: self.queue.len(),
            cancelled,
        };
        debug!(?stats, "validation run finished");
        Ok(stats)
    }

    /// Every (identity, link) pair checked so far, in order.
    pub fn checked(&self) -> &[(Identity, String)] {
        &self.checked
    }

    pub fn processed(&self) -> &ProcessedRecord {
        &self.processed
    }

    /// Items waiting to be checked.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn should_stop(&self, checked: usize) -> bool {
        let cancelled = self
            .options
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed));
        let exhausted = self.options.max_items.is_some_and(|max| checked >= max);
        cancelled || exhausted
    }

    /// Schedule a discovered container unless the pair was already scheduled.
    pub(crate) fn enqueue(
        &mut self,
        object: &'a Object,
        reference: Option<ObjectId>,
        link: &str,
        context: String,
    ) -> bool {
        let identity = Identity::of(object, reference);
        if !self.processed.insert(identity.clone(), link) {
            trace!(link, %identity, "already scheduled");
            return false;
        }
        self.queue.push_back(WorkItem {
            object,
            identity,
            link: link.to_string(),
            context,
            seeded: false,
        });
        true
    }
}
