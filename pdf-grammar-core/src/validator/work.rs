//! Queue entries and the record of what has been scheduled.

use crate::objects::{Object, ObjectId};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Stable identity of an object for deduplication.
///
/// Objects reached through a reference are identified by their id; direct
/// objects by a hash of their contents, so two equal direct dictionaries are
/// the same object as far as the validator is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identity {
    Indirect(ObjectId),
    Direct([u8; 32]),
}

impl Identity {
    /// Identity of `object`, reached through `reference` if it was indirect.
    pub fn of(object: &Object, reference: Option<ObjectId>) -> Identity {
        match reference {
            Some(id) => Identity::Indirect(id),
            None => Identity::Direct(fingerprint(object)),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Indirect(id) => write!(f, "{id}"),
            Identity::Direct(hash) => {
                f.write_str("#")?;
                for byte in &hash[..8] {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

enum Piece<'a> {
    Object(&'a Object),
    Key(&'a str),
}

/// SHA-256 over a length-prefixed encoding of a direct object. References
/// inside it are hashed by id and not followed.
pub fn fingerprint(object: &Object) -> [u8; 32] {
    let mut hasher = Sha256::new();
    let mut stack = vec![Piece::Object(object)];

    while let Some(piece) = stack.pop() {
        let object = match piece {
            Piece::Key(key) => {
                hasher.update(b"k");
                hasher.update((key.len() as u64).to_be_bytes());
                hasher.update(key.as_bytes());
                continue;
            }
            Piece::Object(object) => object,
        };

        match object {
            Object::Null => hasher.update(b"n"),
            Object::Boolean(true) => hasher.update(b"t"),
            Object::Boolean(false) => hasher.update(b"f"),
            Object::Integer(i) => {
                hasher.update(b"i");
                hasher.update(i.to_be_bytes());
            }
            Object::Real(r) => {
                hasher.update(b"r");
                hasher.update(r.to_bits().to_be_bytes());
            }
            Object::String(s) => {
                hasher.update(b"s");
                hasher.update((s.len() as u64).to_be_bytes());
                hasher.update(s.as_bytes());
            }
            Object::Name(n) => {
                hasher.update(b"/");
                hasher.update((n.len() as u64).to_be_bytes());
                hasher.update(n.as_bytes());
            }
            Object::Array(items) => {
                hasher.update(b"[");
                hasher.update((items.len() as u64).to_be_bytes());
                stack.extend(items.iter().rev().map(Piece::Object));
            }
            Object::Dictionary(dict) => {
                hasher.update(b"<");
                hasher.update((dict.len() as u64).to_be_bytes());
                push_entries(&mut stack, dict.iter());
            }
            Object::Stream(stream) => {
                hasher.update(b"S");
                hasher.update((stream.data().len() as u64).to_be_bytes());
                hasher.update(stream.data());
                hasher.update((stream.dictionary().len() as u64).to_be_bytes());
                push_entries(&mut stack, stream.dictionary().iter());
            }
            Object::Reference(id) => {
                hasher.update(b"R");
                hasher.update(id.number().to_be_bytes());
                hasher.update(id.generation().to_be_bytes());
            }
        }
    }

    hasher.finalize().into()
}

fn push_entries<'a>(
    stack: &mut Vec<Piece<'a>>,
    entries: impl Iterator<Item = (&'a String, &'a Object)>,
) {
    let entries: Vec<_> = entries.collect();
    for (key, value) in entries.into_iter().rev() {
        stack.push(Piece::Object(value));
        stack.push(Piece::Key(key));
    }
}

/// One unit of work: check `object` against the table for `link`.
#[derive(Debug, Clone)]
pub struct WorkItem<'a> {
    /// The object after dereferencing.
    pub object: &'a Object,
    pub identity: Identity,
    pub link: String,
    /// Breadcrumb for diagnostics only.
    pub context: String,
    /// Added by the host rather than discovered during the run.
    pub seeded: bool,
}

/// The (identity, link) pairs scheduled so far in one run.
#[derive(Debug, Default)]
pub struct ProcessedRecord {
    seen: HashMap<Identity, HashSet<String>>,
    recorded: usize,
    suppressed: usize,
}

impl ProcessedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pair. Returns `false`, and counts the repeat, if it was
    /// already recorded.
    pub fn insert(&mut self, identity: Identity, link: &str) -> bool {
        let links = self.seen.entry(identity).or_default();
        if links.contains(link) {
            self.suppressed += 1;
            return false;
        }
        links.insert(link.to_string());
        self.recorded += 1;
        true
    }

    pub fn contains(&self, identity: &Identity, link: &str) -> bool {
        self.seen
            .get(identity)
            .is_some_and(|links| links.contains(link))
    }

    pub fn len(&self) -> usize {
        self.recorded
    }

    pub fn is_empty(&self) -> bool {
        self.recorded == 0
    }

    /// Number of repeats turned away.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }
}
