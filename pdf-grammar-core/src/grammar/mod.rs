//! The grammar: one table per link name, describing the keys a dictionary or
//! array may carry, their types, versions and constraints.

mod cache;
pub(crate) mod expr;
mod loader;
mod predicate;
mod row;
mod table;
mod types;
mod values;
mod version;

pub use cache::GrammarCache;
pub use loader::{GrammarLoader, LoaderOptions};
pub use predicate::Predicate;
pub use row::{column, GrammarRow, KeyPattern, HEADER};
pub use table::{GrammarTable, RowDefect};
pub use types::{parse_pdf_date, select_type, split_types, PdfType, TypeToken, TYPE_SEPARATOR};
pub use values::{
    Comparison, EvalContext, Literal, Operand, PossibleValues, ValueItem, VersionContext,
};
pub use version::PdfVersion;
