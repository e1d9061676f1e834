//! Row checks for one container.

use super::trees::{ContainerWalker, TreeKind};
use super::{GraphValidator, LinkResolver, Resolution, WorkItem};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::grammar::{
    select_type, EvalContext, GrammarRow, GrammarTable, KeyPattern, Literal, PdfType, PdfVersion,
};
use crate::objects::{dereference, Dictionary, Object, ObjectProvider};

/// The entries of a dictionary, stream dictionary or array.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Container<'a> {
    Dictionary(&'a Dictionary),
    Array(&'a [Object]),
}

impl<'a> Container<'a> {
    pub(crate) fn of(object: &'a Object) -> Option<Self> {
        match object {
            Object::Array(items) => Some(Container::Array(items)),
            other => other.as_dict_like().map(Container::Dictionary),
        }
    }

    /// Value under a key, or under an index for arrays.
    pub(crate) fn lookup(&self, label: &str) -> Option<&'a Object> {
        match self {
            Container::Dictionary(dict) => dict.get(label),
            Container::Array(items) => label.parse::<usize>().ok().and_then(|i| items.get(i)),
        }
    }

    fn child_context(&self, context: &str, label: &str) -> String {
        match self {
            Container::Dictionary(_) => format!("{context}/{label}"),
            Container::Array(_) => format!("{context}[{label}]"),
        }
    }
}

/// Evaluation context over one container: presence and sibling values come
/// from the container, falling back to the grammar's declared defaults.
pub(crate) struct ContainerContext<'c> {
    pub(crate) container: Container<'c>,
    pub(crate) table: &'c GrammarTable,
    pub(crate) provider: &'c dyn ObjectProvider,
    pub(crate) version: PdfVersion,
}

impl<'c> ContainerContext<'c> {
    /// The dereferenced, non-null value under `label`.
    pub(crate) fn present(&self, label: &str) -> Option<&'c Object> {
        let value = self.container.lookup(label)?;
        dereference(self.provider, value)
            .map(|(object, _)| object)
            .filter(|object| !object.is_null())
    }
}

impl EvalContext for ContainerContext<'_> {
    fn version(&self) -> PdfVersion {
        self.version
    }

    fn is_present(&self, key: &str) -> bool {
        self.present(key).is_some()
    }

    fn sibling(&self, key: &str) -> Option<Literal> {
        match self.present(key) {
            Some(object) => Literal::from_object(object),
            None => self.table.row_for(key).and_then(GrammarRow::default_value),
        }
    }
}

impl<'a> GraphValidator<'a> {
    /// Check every row of `table` against the container in `item`.
    pub(crate) fn check_object(
        &mut self,
        item: &WorkItem<'a>,
        table: &GrammarTable,
        sink: &mut dyn DiagnosticSink,
    ) {
        let Some(container) = Container::of(item.object) else {
            sink.report(Diagnostic::new(
                DiagnosticKind::TypeMismatch,
                table.link(),
                &item.context,
                format!(
                    "expected a dictionary, array or stream, found {}",
                    item.object.kind()
                ),
            ));
            return;
        };
        let ctx = ContainerContext {
            container,
            table,
            provider: self.provider,
            version: self.version,
        };

        for row in table.rows() {
            match (&row.key, container) {
                (KeyPattern::Name(key), Container::Dictionary(dict)) => {
                    self.check_entry(row, &ctx, key, dict.get(key), &item.context, sink);
                }
                (KeyPattern::Index(index), Container::Array(items)) => {
                    let label = index.to_string();
                    self.check_entry(row, &ctx, &label, items.get(*index), &item.context, sink);
                }
                (KeyPattern::Wildcard, Container::Dictionary(dict)) => {
                    for (key, value) in dict.iter().filter(|(key, _)| !table.names_key(key)) {
                        self.check_entry(row, &ctx, key, Some(value), &item.context, sink);
                    }
                }
                (KeyPattern::Wildcard, Container::Array(items)) => {
                    for (index, value) in items.iter().enumerate() {
                        if !table.names_index(index) {
                            let label = index.to_string();
                            self.check_entry(row, &ctx, &label, Some(value), &item.context, sink);
                        }
                    }
                }
                // Key rows do not apply to arrays, index rows not to dictionaries
                _ => {}
            }
        }
    }

    fn check_entry(
        &mut self,
        row: &GrammarRow,
        ctx: &ContainerContext<'_>,
        label: &str,
        value: Option<&'a Object>,
        context: &str,
        sink: &mut dyn DiagnosticSink,
    ) {
        let link = ctx.table.link();
        let report = |sink: &mut dyn DiagnosticSink, kind: DiagnosticKind, message: String| {
            sink.report(Diagnostic::new(kind, link, context, message).with_key(label));
        };

        let resolved = value
            .and_then(|value| dereference(self.provider, value))
            .filter(|(object, _)| !object.is_null());
        let Some((object, reference)) = resolved else {
            if row.is_required(ctx) {
                report(
                    sink,
                    DiagnosticKind::MissingRequiredKey,
                    format!("required {} is missing", row.type_list()),
                );
            }
            return;
        };

        if !row.is_current(self.version) {
            report(sink, DiagnosticKind::VersionMismatch, self.version_message(row));
        }

        let Some(index) = select_type(&row.types, object, self.provider) else {
            report(
                sink,
                DiagnosticKind::TypeMismatch,
                format!("expected {}, found {}", row.type_list(), object.kind()),
            );
            return;
        };
        let Some(pdf_type) = row.types[index].known() else {
            return;
        };

        if reference.is_none() && row.must_be_indirect.evaluate(ctx) {
            report(
                sink,
                DiagnosticKind::IndirectionViolation,
                "must be an indirect reference".to_string(),
            );
        }

        if let Some(literal) = Literal::from_object(object) {
            match (&row.required_value, row.possible_values_for(index)) {
                (Some(required), _) if !required.matches(&literal) => report(
                    sink,
                    DiagnosticKind::PossibleValueViolation,
                    format!("value {literal} must be {required}"),
                ),
                (_, Some(possible)) if !possible.allows(&literal, ctx) => report(
                    sink,
                    DiagnosticKind::PossibleValueViolation,
                    format!("value {literal} is not one of {possible}"),
                ),
                _ => {}
            }
        }

        let links = row.links_for(index);
        if links.is_empty() || !object.is_container() {
            return;
        }
        let child_context = ctx.container.child_context(context, label);

        if pdf_type.is_tree() {
            let kind = if pdf_type == PdfType::NameTree {
                TreeKind::Name
            } else {
                TreeKind::Number
            };
            ContainerWalker::new(self, kind, links).walk(object, reference, child_context, sink);
            return;
        }

        if let Some(chosen) = self.choose_link(object, links, link, label, &child_context, sink) {
            self.enqueue(object, reference, &chosen, child_context);
        }
    }

    fn version_message(&self, row: &GrammarRow) -> String {
        match (row.since_version, row.deprecated_in) {
            (Some(since), _) if since > self.version => {
                format!("introduced in PDF {since}, validating PDF {}", self.version)
            }
            (_, Some(deprecated)) => {
                format!("deprecated in PDF {deprecated}, validating PDF {}", self.version)
            }
            _ => format!("not defined in PDF {}", self.version),
        }
    }

    /// Pick the link for a container value, reporting ambiguity and
    /// resolution failures against the parent's table and key.
    pub(crate) fn choose_link(
        &mut self,
        object: &Object,
        links: &[String],
        parent_link: &str,
        label: &str,
        context: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<String> {
        if let [only] = links {
            return Some(only.clone());
        }

        let resolver = LinkResolver::new(self.cache, self.provider, self.version);
        match resolver.resolve(object, links, context, sink) {
            Resolution::Resolved(link) => Some(link),
            Resolution::Ambiguous { chosen, matching } => {
                sink.report(
                    Diagnostic::new(
                        DiagnosticKind::AmbiguousLink,
                        parent_link,
                        context,
                        format!("[{}] all fit, using {chosen}", matching.join(",")),
                    )
                    .with_key(label),
                );
                Some(chosen)
            }
            Resolution::Unresolved => {
                sink.report(
                    Diagnostic::new(
                        DiagnosticKind::UnresolvedLink,
                        parent_link,
                        context,
                        format!("no link in [{}] fits this {}", links.join(","), object.kind()),
                    )
                    .with_key(label),
                );
                None
            }
        }
    }
}
