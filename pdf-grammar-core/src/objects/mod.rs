//! In-memory document object model.
//!
//! The validator never parses PDF files itself. It walks whatever graph an
//! [`ObjectProvider`] exposes; [`ObjectStore`] is the provider used by the
//! command line tool and the tests.

mod dictionary;
mod primitive;
mod store;
mod stream;

pub use dictionary::Dictionary;
pub use primitive::{Object, ObjectId, ObjectKind};
pub(crate) use store::dereference;
pub use store::{ObjectProvider, ObjectStore};
pub use stream::Stream;
