//! # pdf-grammar
//!
//! Validate PDF object graphs against a declarative, table-driven grammar.
//!
//! The grammar is a folder of tab-separated files, one per structure ("link"),
//! each row describing one key: its types, the versions that define it,
//! whether it is required or must be indirect, the values it may take and the
//! structures its value links to. The validator walks a document's object
//! graph breadth-first from the trailer and reports every place the document
//! departs from the grammar.
//!
//! ## Features
//!
//! - **Grammar loading**: strict header and row checks, every defect reported
//! - **Version aware**: requirements and values gated on the PDF version
//! - **Polymorphic links**: candidate structures chosen by their discriminator keys
//! - **Name and number trees**: `Limits` and key order checked across the whole tree
//! - **Cycle safe**: each object is checked once per structure, whatever the graph shape
//!
//! ## Quick Start
//!
//! ```rust
//! use pdf_grammar::grammar::{GrammarCache, GrammarLoader};
//! use pdf_grammar::objects::{Dictionary, Object, ObjectStore};
//! use pdf_grammar::validator::GraphValidator;
//! use pdf_grammar::DiagnosticKind;
//! use std::fs;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = std::env::temp_dir().join("pdf-grammar-doc");
//! fs::create_dir_all(&dir)?;
//! fs::write(
//!     dir.join("Catalog.tsv"),
//!     "Key\tTYPE\tSinceVersion\tDeprecatedIn\tREQUIRED\tINDIRECTREFERENCE\tRequiredValue\tDefaultValue\tPossibleValues\tSpecialCase\tLink\n\
//!      Type\tname\t1.0\t\tTRUE\tFALSE\tCatalog\t\t\t\t\n\
//!      Pages\tdictionary\t1.0\t\tTRUE\tTRUE\t\t\t\t\t\n",
//! )?;
//!
//! let cache = GrammarCache::new(GrammarLoader::new(&dir));
//! let mut store = ObjectStore::new();
//! let catalog = store.add(Dictionary::new().with("Type", Object::Name("Catalog".into())));
//!
//! let root = Object::Reference(catalog);
//! let mut validator = GraphValidator::new(&store, &cache);
//! validator.add_work_item(&root, "Catalog", "Root");
//!
//! let mut diagnostics = Vec::new();
//! validator.run(&mut diagnostics)?;
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].kind, DiagnosticKind::MissingRequiredKey);
//! # Ok(())
//! # }
//! ```

pub mod diagnostics;
pub mod error;
pub mod grammar;
pub mod objects;
pub mod validator;

pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, OutputFormat, WriterSink};
pub use error::{GrammarError, Result};
pub use grammar::{GrammarCache, GrammarLoader, GrammarTable, PdfVersion};
pub use objects::{Object, ObjectId, ObjectProvider, ObjectStore};
pub use validator::{GraphValidator, RunStats, ValidatorOptions};

/// Current version of pdf-grammar
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Link of the trailer dictionary in the standard grammar.
pub const TRAILER_LINK: &str = "FileTrailer";

/// Validate a whole store from its trailer.
///
/// Convenience for the common case of one document per run; use
/// [`GraphValidator`] directly to seed several roots.
pub fn validate_store(
    store: &ObjectStore,
    cache: &GrammarCache,
    link: &str,
    options: ValidatorOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<RunStats> {
    let mut validator = GraphValidator::with_options(store, cache, options);
    validator.add_work_item(store.trailer(), link, "Trailer");
    validator.run(sink)
}
