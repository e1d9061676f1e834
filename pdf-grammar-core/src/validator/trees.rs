//! Name tree and number tree traversal.
//!
//! Both trees have the same shape: a node holds either sorted key/value
//! pairs (`Names` or `Nums`) or references to child nodes (`Kids`), and every
//! node but the root bounds its keys with `Limits [low high]`. The walker
//! visits nodes with its own queue and hands every value to the validator
//! with the links the grammar row declares for tree values.

use super::work::Identity;
use super::GraphValidator;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::objects::{dereference, Dictionary, Object, ObjectId};
use std::collections::VecDeque;
use std::fmt;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeKind {
    /// Keys are strings, entries under `Names`.
    Name,
    /// Keys are integers, entries under `Nums`.
    Number,
}

impl TreeKind {
    pub fn entries_key(&self) -> &'static str {
        match self {
            TreeKind::Name => "Names",
            TreeKind::Number => "Nums",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            TreeKind::Name => "NameTree",
            TreeKind::Number => "NumberTree",
        }
    }

    fn key_kind(&self) -> &'static str {
        match self {
            TreeKind::Name => "string",
            TreeKind::Number => "integer",
        }
    }

    fn key_of(&self, object: &Object) -> Option<TreeKey> {
        match (self, object) {
            (TreeKind::Name, Object::String(s)) => Some(TreeKey::Text(s.clone())),
            (TreeKind::Number, Object::Integer(i)) => Some(TreeKey::Number(*i)),
            _ => None,
        }
    }
}

/// A tree key. Keys of one tree are all of the same variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum TreeKey {
    Text(String),
    Number(i64),
}

impl fmt::Display for TreeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeKey::Text(text) => write!(f, "({text})"),
            TreeKey::Number(n) => write!(f, "{n}"),
        }
    }
}

struct Node<'a> {
    object: &'a Object,
    context: String,
    /// `None` for the root and for children of nodes with unusable Limits.
    parent_limits: Option<(TreeKey, TreeKey)>,
    is_root: bool,
}

/// Walks one name or number tree on behalf of a [`GraphValidator`].
pub(crate) struct ContainerWalker<'v, 'a> {
    validator: &'v mut GraphValidator<'a>,
    kind: TreeKind,
    links: &'v [String],
    /// Link under which tree nodes are recorded, e.g. `NameTree<Dest>`.
    interpretation: String,
}

impl<'v, 'a> ContainerWalker<'v, 'a> {
    pub(crate) fn new(
        validator: &'v mut GraphValidator<'a>,
        kind: TreeKind,
        links: &'v [String],
    ) -> Self {
        let interpretation = format!("{}<{}>", kind.label(), links.join(","));
        Self {
            validator,
            kind,
            links,
            interpretation,
        }
    }

    /// Walk the tree rooted at `root`. The root's own `Limits` are not
    /// checked.
    pub(crate) fn walk(
        mut self,
        root: &'a Object,
        reference: Option<ObjectId>,
        context: String,
        sink: &mut dyn DiagnosticSink,
    ) {
        if !self.record(root, reference) {
            return;
        }

        let mut pending = VecDeque::from([Node {
            object: root,
            context,
            parent_limits: None,
            is_root: true,
        }]);

        while let Some(node) = pending.pop_front() {
            trace!(tree = %self.interpretation, context = %node.context, "walking tree node");
            let Some(dict) = node.object.as_dict() else {
                self.report(
                    sink,
                    DiagnosticKind::MalformedContainer,
                    &node.context,
                    format!("tree node is a {}, expected a dictionary", node.object.kind()),
                );
                continue;
            };

            let entries = self.value(dict, self.kind.entries_key());
            let kids = self.value(dict, "Kids");
            if entries.is_some() && kids.is_some() {
                self.report(
                    sink,
                    DiagnosticKind::MixedContainerNode,
                    &node.context,
                    format!("node has both {} and Kids", self.kind.entries_key()),
                );
            }

            let mut limits_reported = false;
            let limits = if node.is_root {
                None
            } else {
                match self.limits(dict) {
                    Ok(limits) => Some(limits),
                    Err(message) => {
                        self.report(sink, DiagnosticKind::LimitsViolation, &node.context, message);
                        limits_reported = true;
                        None
                    }
                }
            };

            if let (Some((low, high)), Some((parent_low, parent_high))) =
                (&limits, &node.parent_limits)
            {
                if low < parent_low || high > parent_high {
                    self.report(
                        sink,
                        DiagnosticKind::LimitsViolation,
                        &node.context,
                        format!(
                            "Limits [{low} {high}] fall outside parent Limits [{parent_low} {parent_high}]"
                        ),
                    );
                    limits_reported = true;
                }
            }

            if let Some(entries) = entries {
                let outside = self.walk_entries(entries, limits.as_ref(), &node.context, sink);
                if outside && !limits_reported {
                    if let Some((low, high)) = &limits {
                        self.report(
                            sink,
                            DiagnosticKind::LimitsViolation,
                            &node.context,
                            format!("entries fall outside Limits [{low} {high}]"),
                        );
                    }
                }
            }

            if let Some(kids) = kids {
                let Some(items) = kids.as_array() else {
                    self.report(
                        sink,
                        DiagnosticKind::MalformedContainer,
                        &node.context,
                        format!("Kids is a {}, expected an array", kids.kind()),
                    );
                    continue;
                };
                for (i, kid) in items.iter().enumerate() {
                    let context = format!("{}/Kids[{i}]", node.context);
                    let Some((child, child_ref)) = dereference(self.validator.provider, kid)
                    else {
                        self.report(
                            sink,
                            DiagnosticKind::MalformedContainer,
                            &context,
                            "child node does not resolve".to_string(),
                        );
                        continue;
                    };
                    if self.record(child, child_ref) {
                        pending.push_back(Node {
                            object: child,
                            context,
                            parent_limits: limits.clone(),
                            is_root: false,
                        });
                    }
                }
            }
        }
    }

    /// Check the key/value pairs of a node and schedule the values. Returns
    /// whether any key falls outside `limits`.
    fn walk_entries(
        &mut self,
        entries: &'a Object,
        limits: Option<&(TreeKey, TreeKey)>,
        context: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> bool {
        let key_name = self.kind.entries_key();
        let Some(items) = entries.as_array() else {
            self.report(
                sink,
                DiagnosticKind::MalformedContainer,
                context,
                format!("{key_name} is a {}, expected an array", entries.kind()),
            );
            return false;
        };
        if items.len() % 2 != 0 {
            self.report(
                sink,
                DiagnosticKind::MalformedContainer,
                context,
                format!("{key_name} has an odd number of elements ({})", items.len()),
            );
        }

        let mut outside = false;
        let mut unsorted_reported = false;
        let mut previous: Option<TreeKey> = None;
        for (i, pair) in items.chunks(2).enumerate() {
            let key = dereference(self.validator.provider, &pair[0])
                .and_then(|(object, _)| self.kind.key_of(object));
            let Some(key) = key else {
                self.report(
                    sink,
                    DiagnosticKind::MalformedContainer,
                    context,
                    format!(
                        "{key_name}[{}] is not a valid {} key",
                        i * 2,
                        self.kind.key_kind()
                    ),
                );
                continue;
            };

            if !unsorted_reported && previous.as_ref().is_some_and(|p| *p > key) {
                self.report(
                    sink,
                    DiagnosticKind::MalformedContainer,
                    context,
                    format!("{key_name} keys are not sorted at {key}"),
                );
                unsorted_reported = true;
            }
            if let Some((low, high)) = limits {
                outside |= key < *low || key > *high;
            }

            if let Some(value) = pair.get(1) {
                let value_context = format!("{context}[{key}]");
                self.schedule_value(value, &key, value_context, sink);
            }
            previous = Some(key);
        }
        outside
    }

    fn schedule_value(
        &mut self,
        value: &'a Object,
        key: &TreeKey,
        context: String,
        sink: &mut dyn DiagnosticSink,
    ) {
        let Some((object, reference)) = dereference(self.validator.provider, value) else {
            return;
        };
        if object.is_null() {
            return;
        }
        if !object.is_container() {
            self.report(
                sink,
                DiagnosticKind::TypeMismatch,
                &context,
                format!("tree value {key} is a {}, expected a container", object.kind()),
            );
            return;
        }

        let label = key.to_string();
        let interpretation = self.interpretation.clone();
        if let Some(link) =
            self.validator
                .choose_link(object, self.links, &interpretation, &label, &context, sink)
        {
            self.validator.enqueue(object, reference, &link, context);
        }
    }

    /// Parse a non-root node's `Limits`.
    fn limits(&self, dict: &'a Dictionary) -> Result<(TreeKey, TreeKey), String> {
        let Some(limits) = self.value(dict, "Limits") else {
            return Err("node has no Limits".to_string());
        };
        let Some(bounds) = limits.as_array() else {
            return Err(format!("Limits is a {}, expected an array", limits.kind()));
        };
        let [low, high] = bounds.as_slice() else {
            return Err(format!("Limits has {} elements, expected 2", bounds.len()));
        };
        let key = |object: &'a Object| {
            dereference(self.validator.provider, object)
                .and_then(|(object, _)| self.kind.key_of(object))
        };
        let (Some(low), Some(high)) = (key(low), key(high)) else {
            return Err(format!("Limits must hold two {} keys", self.kind.key_kind()));
        };
        if low > high {
            return Err(format!("Limits [{low} {high}] are reversed"));
        }
        Ok((low, high))
    }

    /// Dereferenced, non-null value of `key`.
    fn value(&self, dict: &'a Dictionary, key: &str) -> Option<&'a Object> {
        dict.get(key)
            .and_then(|value| dereference(self.validator.provider, value))
            .map(|(object, _)| object)
            .filter(|object| !object.is_null())
    }

    /// Record a node; `false` if it was already visited under this tree's
    /// interpretation.
    fn record(&mut self, node: &Object, reference: Option<ObjectId>) -> bool {
        let identity = Identity::of(node, reference);
        self.validator
            .processed
            .insert(identity, &self.interpretation)
    }

    fn report(
        &self,
        sink: &mut dyn DiagnosticSink,
        kind: DiagnosticKind,
        context: &str,
        message: String,
    ) {
        sink.report(Diagnostic::new(kind, &self.interpretation, context, message));
    }
}
