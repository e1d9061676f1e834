//! Choosing one link among several candidates.
//!
//! A row like `Kids  ARRAY  ...  [PageTreeNode,Page]` allows values of more
//! than one structure. The resolver loads each candidate's table and looks at
//! the discriminator keys (`Type`, `Subtype` and friends, or any row with a
//! `RequiredValue`) to decide which structure the object is.

use super::checks::{Container, ContainerContext};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::grammar::{
    select_type, GrammarCache, GrammarRow, GrammarTable, KeyPattern, Literal, PdfVersion,
};
use crate::objects::{Object, ObjectProvider};
use std::collections::HashSet;
use tracing::trace;

lazy_static::lazy_static! {
    /// Keys that identify which structure a dictionary is.
    static ref DISCRIMINATOR_KEYS: HashSet<&'static str> = {
        let mut keys = HashSet::new();
        keys.insert("Type");
        keys.insert("Subtype");
        keys.insert("S");
        keys.insert("FT");
        keys.insert("ShadingType");
        keys.insert("PatternType");
        keys.insert("FunctionType");
        keys
    };
}

/// Outcome of link resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    /// More than one candidate fits equally well; `chosen` is the first in
    /// declaration order.
    Ambiguous {
        chosen: String,
        matching: Vec<String>,
    },
    Unresolved,
}

/// How well a candidate table fits an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Fit {
    None,
    /// Nothing contradicts the table, but no discriminator confirms it.
    Weak,
    /// At least one discriminator is present and satisfied.
    Strong,
}

pub struct LinkResolver<'r> {
    cache: &'r GrammarCache,
    provider: &'r dyn ObjectProvider,
    version: PdfVersion,
}

impl<'r> LinkResolver<'r> {
    pub fn new(
        cache: &'r GrammarCache,
        provider: &'r dyn ObjectProvider,
        version: PdfVersion,
    ) -> Self {
        Self {
            cache,
            provider,
            version,
        }
    }

    /// Pick the candidate that fits `object` (already dereferenced). Strong
    /// fits win over weak ones. Candidates whose grammar cannot be loaded are
    /// reported and skipped.
    pub fn resolve(
        &self,
        object: &Object,
        candidates: &[String],
        context: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Resolution {
        let mut strong = Vec::new();
        let mut weak = Vec::new();

        for link in candidates {
            let table = match self.cache.get(link, sink) {
                Ok(table) => table,
                Err(e) => {
                    sink.report(Diagnostic::new(
                        DiagnosticKind::SchemaMissing,
                        link,
                        context,
                        format!("cannot load candidate grammar: {e}"),
                    ));
                    continue;
                }
            };
            let fit = self.fit(&table, object);
            trace!(link, ?fit, "link candidate");
            match fit {
                Fit::Strong => strong.push(link.clone()),
                Fit::Weak => weak.push(link.clone()),
                Fit::None => {}
            }
        }

        let mut matching = if strong.is_empty() { weak } else { strong };
        matching.dedup();
        match matching.len() {
            0 => Resolution::Unresolved,
            1 => Resolution::Resolved(matching.remove(0)),
            _ => Resolution::Ambiguous {
                chosen: matching[0].clone(),
                matching,
            },
        }
    }

    fn fit(&self, table: &GrammarTable, object: &Object) -> Fit {
        let Some(container) = Container::of(object) else {
            return Fit::None;
        };
        let shape_fits = match container {
            Container::Array(_) => !table.has_named_keys(),
            Container::Dictionary(_) => !table.is_array_table(),
        };
        if !shape_fits {
            return Fit::None;
        }

        let ctx = ContainerContext {
            container,
            table,
            provider: self.provider,
            version: self.version,
        };
        let mut fit = Fit::Weak;
        for row in table.rows().iter().filter(|row| is_discriminator(row)) {
            let label = row.key.to_string();
            let Some(value) = ctx.present(&label) else {
                if row.is_required(&ctx) {
                    return Fit::None;
                }
                continue;
            };

            let Some(index) = select_type(&row.types, value, self.provider) else {
                return Fit::None;
            };
            let Some(literal) = Literal::from_object(value) else {
                continue;
            };
            if let Some(required) = &row.required_value {
                if !required.matches(&literal) {
                    return Fit::None;
                }
            }
            if let Some(possible) = row.possible_values_for(index) {
                if !possible.allows(&literal, &ctx) {
                    return Fit::None;
                }
            }
            fit = Fit::Strong;
        }
        fit
    }
}

fn is_discriminator(row: &GrammarRow) -> bool {
    if row.key == KeyPattern::Wildcard {
        return false;
    }
    if row.required_value.is_some() {
        return true;
    }
    matches!(&row.key, KeyPattern::Name(key) if DISCRIMINATOR_KEYS.contains(key.as_str()))
        && row.possible_values.iter().any(|values| !values.is_unconstrained())
}
