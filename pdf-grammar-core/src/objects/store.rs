use crate::grammar::PdfVersion;
use crate::objects::{Dictionary, Object, ObjectId};
use std::collections::HashMap;

/// Source of the object graph being validated.
///
/// Kind introspection, dictionary lookup and array access are methods of
/// [`Object`]; a provider only has to dereference indirect objects. The
/// validator never mutates anything it gets from a provider.
pub trait ObjectProvider {
    /// Resolve an indirect reference. `None` means the object does not exist,
    /// which PDF treats the same as `null`.
    fn resolve(&self, id: ObjectId) -> Option<&Object>;

    /// The version the document declares, if any.
    fn version(&self) -> Option<PdfVersion> {
        None
    }
}

/// Follow a chain of references down to a direct object.
///
/// Returns the resolved object and the id of the last reference followed, or
/// `None` for dangling references and reference loops.
pub(crate) fn dereference<'a>(
    provider: &'a dyn ObjectProvider,
    object: &'a Object,
) -> Option<(&'a Object, Option<ObjectId>)> {
    let mut current = object;
    let mut id = None;
    // A reference that points at another reference is legal but rare; a
    // bounded walk is enough to reject loops.
    for _ in 0..32 {
        match current {
            Object::Reference(next) => {
                id = Some(*next);
                current = provider.resolve(*next)?;
            }
            _ => return Some((current, id)),
        }
    }
    None
}

/// In-memory object table plus trailer.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    objects: HashMap<ObjectId, Object>,
    /// Always a dictionary; kept as an object so validation can start at it.
    trailer: Object,
    version: Option<PdfVersion>,
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self {
            objects: HashMap::new(),
            trailer: Object::Dictionary(Dictionary::new()),
            version: None,
        }
    }
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: PdfVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Insert an indirect object, returning its id for use in references.
    pub fn insert(&mut self, id: ObjectId, object: impl Into<Object>) -> ObjectId {
        self.objects.insert(id, object.into());
        id
    }

    /// Insert an indirect object under the next free object number.
    pub fn add(&mut self, object: impl Into<Object>) -> ObjectId {
        let number = self
            .objects
            .keys()
            .map(ObjectId::number)
            .max()
            .unwrap_or(0)
            + 1;
        self.insert(ObjectId::new(number, 0), object)
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn set_trailer(&mut self, trailer: Dictionary) {
        self.trailer = Object::Dictionary(trailer);
    }

    /// The trailer dictionary, wrapped as an object.
    pub fn trailer(&self) -> &Object {
        &self.trailer
    }
}

impl ObjectProvider for ObjectStore {
    fn resolve(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    fn version(&self) -> Option<PdfVersion> {
        self.version
    }
}

#[cfg(feature = "serde")]
mod json {
    use super::*;
    use crate::error::{GrammarError, Result};
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct IndirectObject {
        id: ObjectId,
        object: Object,
    }

    #[derive(Serialize, Deserialize)]
    struct StoreDump {
        #[serde(default)]
        version: Option<PdfVersion>,
        #[serde(default)]
        trailer: Dictionary,
        #[serde(default)]
        objects: Vec<IndirectObject>,
    }

    impl ObjectStore {
        /// Read an object graph dump.
        pub fn from_json(text: &str) -> Result<Self> {
            let dump: StoreDump = serde_json::from_str(text)
                .map_err(|e| GrammarError::InvalidDocument(e.to_string()))?;
            Ok(Self {
                objects: dump
                    .objects
                    .into_iter()
                    .map(|entry| (entry.id, entry.object))
                    .collect(),
                trailer: Object::Dictionary(dump.trailer),
                version: dump.version,
            })
        }

        /// Write an object graph dump, objects ordered by id.
        pub fn to_json(&self) -> Result<String> {
            let mut objects: Vec<_> = self
                .objects
                .iter()
                .map(|(id, object)| IndirectObject {
                    id: *id,
                    object: object.clone(),
                })
                .collect();
            objects.sort_by_key(|entry| entry.id);
            let dump = StoreDump {
                version: self.version,
                trailer: self.trailer.as_dict().cloned().unwrap_or_default(),
                objects,
            };
            serde_json::to_string_pretty(&dump)
                .map_err(|e| GrammarError::InvalidDocument(e.to_string()))
        }
    }
}
