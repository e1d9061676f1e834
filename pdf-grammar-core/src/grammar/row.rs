//! One line of a grammar file.

use crate::grammar::predicate::Predicate;
use crate::grammar::types::{split_types, TypeToken, TYPE_SEPARATOR};
use crate::grammar::values::{EvalContext, Literal, PossibleValues};
use crate::grammar::version::{self, PdfVersion};
use std::fmt;

/// Column positions of a grammar file.
pub mod column {
    pub const KEY: usize = 0;
    pub const TYPE: usize = 1;
    pub const SINCE_VERSION: usize = 2;
    pub const DEPRECATED_IN: usize = 3;
    pub const REQUIRED: usize = 4;
    pub const INDIRECT_REFERENCE: usize = 5;
    pub const REQUIRED_VALUE: usize = 6;
    pub const DEFAULT_VALUE: usize = 7;
    pub const POSSIBLE_VALUES: usize = 8;
    pub const SPECIAL_CASE: usize = 9;
    pub const LINK: usize = 10;
    pub const COUNT: usize = 11;
}

/// The exact header line every grammar file starts with.
pub const HEADER: [&str; column::COUNT] = [
    "Key",
    "TYPE",
    "SinceVersion",
    "DeprecatedIn",
    "REQUIRED",
    "INDIRECTREFERENCE",
    "RequiredValue",
    "DefaultValue",
    "PossibleValues",
    "SpecialCase",
    "Link",
];

/// How a row's key selects values from a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPattern {
    /// A dictionary key.
    Name(String),
    /// An array index.
    Index(usize),
    /// Every key or index no other row names.
    Wildcard,
}

impl KeyPattern {
    pub fn parse(key: &str) -> KeyPattern {
        let key = key.trim();
        if key == "*" {
            KeyPattern::Wildcard
        } else if let Ok(index) = key.parse::<usize>() {
            KeyPattern::Index(index)
        } else {
            KeyPattern::Name(key.to_string())
        }
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPattern::Name(name) => f.write_str(name),
            KeyPattern::Index(index) => write!(f, "{index}"),
            KeyPattern::Wildcard => f.write_str("*"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrammarRow {
    pub key: KeyPattern,
    pub types: Vec<TypeToken>,
    pub since_version: Option<PdfVersion>,
    pub deprecated_in: Option<PdfVersion>,
    pub required: Predicate,
    pub must_be_indirect: Predicate,
    pub required_value: Option<Literal>,
    /// Raw `DefaultValue` column; see [`GrammarRow::default_value`].
    pub default_value: String,
    /// One entry per declared type.
    pub possible_values: Vec<PossibleValues>,
    pub special_case: Option<String>,
    /// One link set per declared type; empty where the type has no sub-schema.
    pub links: Vec<Vec<String>>,
    /// 1-based line number in the grammar file.
    pub line: usize,
}

impl GrammarRow {
    /// Build a row from the split columns of one line. Errors are
    /// human-readable messages; the loader adds file and line context.
    pub(crate) fn from_fields(fields: &[String], line: usize) -> Result<GrammarRow, String> {
        if fields.len() < column::COUNT {
            return Err(format!(
                "expected {} columns, found {}",
                column::COUNT,
                fields.len()
            ));
        }
        let field = |i: usize| fields[i].trim();

        let types = split_types(field(column::TYPE));
        if types.is_empty() {
            return Err("no type declared".to_string());
        }

        let since_version = version::parse_optional(field(column::SINCE_VERSION))?;
        let deprecated_in = version::parse_optional(field(column::DEPRECATED_IN))?;
        if let (Some(since), Some(deprecated)) = (since_version, deprecated_in) {
            if deprecated <= since {
                return Err(format!("deprecated in {deprecated} before introduction in {since}"));
            }
        }

        let required = Predicate::parse(field(column::REQUIRED)).map_err(|e| e.to_string())?;
        let must_be_indirect =
            Predicate::parse(field(column::INDIRECT_REFERENCE)).map_err(|e| e.to_string())?;

        let required_value = match field(column::REQUIRED_VALUE) {
            "" => None,
            text => Some(
                Literal::parse(text).ok_or_else(|| format!("invalid required value '{text}'"))?,
            ),
        };

        let possible_values =
            split_aligned(field(column::POSSIBLE_VALUES), types.len(), "possible value")?
                .iter()
                .map(|segment| PossibleValues::parse(segment).map_err(|e| e.to_string()))
                .collect::<Result<Vec<_>, _>>()?;

        let links = split_aligned(field(column::LINK), types.len(), "link")?
            .iter()
            .map(|segment| parse_link_set(segment))
            .collect::<Result<Vec<_>, _>>()?;

        let special_case = match field(column::SPECIAL_CASE) {
            "" => None,
            text => Some(text.to_string()),
        };

        Ok(GrammarRow {
            key: KeyPattern::parse(field(column::KEY)),
            types,
            since_version,
            deprecated_in,
            required,
            must_be_indirect,
            required_value,
            default_value: field(column::DEFAULT_VALUE).to_string(),
            possible_values,
            special_case,
            links,
            line,
        })
    }

    /// The scalar default, when the default is a scalar.
    pub fn default_value(&self) -> Option<Literal> {
        Literal::parse(&self.default_value)
    }

    /// Whether the key must be present, in the context's version.
    ///
    /// A key is never required before the version that introduced it.
    pub fn is_required(&self, ctx: &dyn EvalContext) -> bool {
        let introduced = self.since_version.map_or(true, |since| since <= ctx.version());
        introduced && self.required.evaluate(ctx)
    }

    /// Whether a present key is current in the context's version.
    pub fn is_current(&self, version: PdfVersion) -> bool {
        version.is_within(self.since_version, self.deprecated_in)
    }

    pub fn links_for(&self, type_index: usize) -> &[String] {
        self.links.get(type_index).map_or(&[], Vec::as_slice)
    }

    pub fn possible_values_for(&self, type_index: usize) -> Option<&PossibleValues> {
        self.possible_values.get(type_index)
    }

    /// `TYPE` column in canonical form, for messages.
    pub fn type_list(&self) -> String {
        self.types
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Split a per-type column into exactly `count` segments.
///
/// An empty column yields `count` empty segments. Otherwise the column is
/// split on `;` outside brackets and quotes, a trailing `;` producing a final
/// empty segment, and the segment count must equal `count`.
fn split_aligned(field: &str, count: usize, what: &str) -> Result<Vec<String>, String> {
    if field.is_empty() {
        return Ok(vec![String::new(); count]);
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut quoted = false;
    for c in field.chars() {
        match c {
            '\'' => quoted = !quoted,
            '[' | '(' if !quoted => depth += 1,
            ']' | ')' if !quoted => depth -= 1,
            c if c == TYPE_SEPARATOR && depth == 0 && !quoted => {
                segments.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    segments.push(current);

    if segments.len() != count {
        return Err(format!(
            "{} {what} segments for {count} types",
            segments.len()
        ));
    }
    Ok(segments)
}

fn parse_link_set(segment: &str) -> Result<Vec<String>, String> {
    let mut text = segment.trim();
    if let Some(inner) = text.strip_prefix('[') {
        text = inner
            .strip_suffix(']')
            .ok_or_else(|| format!("unbalanced link set '{segment}'"))?;
    }
    let mut links = Vec::new();
    for name in text.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(format!("invalid link name '{name}'"));
        }
        links.push(name.to_string());
    }
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::types::PdfType;
    use crate::grammar::values::VersionContext;

    fn fields(line: &str) -> Vec<String> {
        line.split('\t').map(String::from).collect()
    }

    #[test]
    fn test_simple_row() {
        let row = GrammarRow::from_fields(
            &fields("Type\tname\t\t\tTRUE\tFALSE\tCatalog\t\t\t\t"),
            2,
        )
        .unwrap();
        assert_eq!(row.key, KeyPattern::Name("Type".into()));
        assert_eq!(row.types, vec![TypeToken::Known(PdfType::Name)]);
        assert_eq!(row.required, Predicate::TRUE);
        assert_eq!(row.required_value, Some(Literal::Text("Catalog".into())));
        assert_eq!(row.links, vec![Vec::<String>::new()]);
        assert!(row.possible_values[0].is_unconstrained());
    }

    #[test]
    fn test_aligned_multi_type_row() {
        let row = GrammarRow::from_fields(
            &fields("Dests\tNAME-TREE;dictionary\t1.2\t\tFALSE\tTRUE\t\t\t;\t\t[Dest];[DestsMap]"),
            5,
        )
        .unwrap();
        assert_eq!(row.type_list(), "NAME-TREE;DICTIONARY");
        assert_eq!(row.links_for(0), ["Dest".to_string()]);
        assert_eq!(row.links_for(1), ["DestsMap".to_string()]);
        assert_eq!(row.possible_values.len(), 2);
        assert_eq!(row.since_version, Some(PdfVersion::new(1, 2)));
    }

    #[test]
    fn test_misaligned_links_are_rejected() {
        let err = GrammarRow::from_fields(
            &fields("Kids\tarray;dictionary\t\t\tTRUE\t\t\t\t\t\t[ArrayOfKids]"),
            3,
        )
        .unwrap_err();
        assert!(err.contains("1 link segments for 2 types"), "{err}");

        let err = GrammarRow::from_fields(
            &fields("Kids\tarray\t\t\tTRUE\t\t\t\t[1];[2]\t\t"),
            3,
        )
        .unwrap_err();
        assert!(err.contains("2 possible value segments for 1 types"), "{err}");
    }

    #[test]
    fn test_segment_split_respects_brackets() {
        let segments = split_aligned("[fn:SinceVersion(1.5,a)];['x;y']", 2, "possible value").unwrap();
        assert_eq!(segments, vec!["[fn:SinceVersion(1.5,a)]", "['x;y']"]);
        let segments = split_aligned("[A];", 2, "link").unwrap();
        assert_eq!(segments, vec!["[A]", ""]);
    }

    #[test]
    fn test_version_gated_requirement() {
        let row = GrammarRow::from_fields(
            &fields("Lang\tstring\t2.0\t\tTRUE\t\t\t\t\t\t"),
            4,
        )
        .unwrap();
        assert!(row.is_required(&VersionContext(PdfVersion::V2_0)));
        assert!(!row.is_required(&VersionContext(PdfVersion::new(1, 7))));
        assert!(!row.is_current(PdfVersion::new(1, 7)));
    }

    #[test]
    fn test_bad_fields() {
        assert!(GrammarRow::from_fields(&fields("A\t\t\t\tTRUE\t\t\t\t\t\t"), 2).is_err());
        assert!(GrammarRow::from_fields(&fields("A\tinteger\t1.9\t\t\t\t\t\t\t\t"), 2).is_err());
        assert!(GrammarRow::from_fields(&fields("A\tinteger\t2.0\t1.4\t\t\t\t\t\t\t"), 2).is_err());
        assert!(GrammarRow::from_fields(&fields("A\tinteger\t\t\tperhaps\t\t\t\t\t\t"), 2).is_err());
        assert!(GrammarRow::from_fields(&fields("A\tdictionary\t\t\t\t\t\t\t\t\t[Bad Name]"), 2).is_err());
        assert!(GrammarRow::from_fields(&fields("A\tinteger"), 2).is_err());
    }

    #[test]
    fn test_key_patterns() {
        assert_eq!(KeyPattern::parse("*"), KeyPattern::Wildcard);
        assert_eq!(KeyPattern::parse("3"), KeyPattern::Index(3));
        assert_eq!(KeyPattern::parse("Kids"), KeyPattern::Name("Kids".into()));
    }

    #[test]
    fn test_scalar_defaults() {
        let row = GrammarRow::from_fields(
            &fields("Rotate\tinteger\t\t\tFALSE\t\t\t0\t[0,90,180,270]\t\t"),
            6,
        )
        .unwrap();
        assert_eq!(row.default_value(), Some(Literal::Integer(0)));
    }
}
