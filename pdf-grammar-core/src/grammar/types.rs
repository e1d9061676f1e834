//! The closed type vocabulary of the grammar and runtime type selection.

use crate::objects::{Object, ObjectProvider};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use std::fmt;

/// Separator between the per-type segments of `TYPE`, `Link` and
/// `PossibleValues`.
pub const TYPE_SEPARATOR: char = ';';

/// A type from the grammar's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PdfType {
    Boolean,
    Number,
    Integer,
    Name,
    String,
    Date,
    Stream,
    Array,
    Dictionary,
    Rectangle,
    NameTree,
    NumberTree,
}

impl PdfType {
    pub const ALL: [PdfType; 12] = [
        PdfType::Boolean,
        PdfType::Number,
        PdfType::Integer,
        PdfType::Name,
        PdfType::String,
        PdfType::Date,
        PdfType::Stream,
        PdfType::Array,
        PdfType::Dictionary,
        PdfType::Rectangle,
        PdfType::NameTree,
        PdfType::NumberTree,
    ];

    /// Canonical (upper-case) token.
    pub fn token(&self) -> &'static str {
        match self {
            PdfType::Boolean => "BOOLEAN",
            PdfType::Number => "NUMBER",
            PdfType::Integer => "INTEGER",
            PdfType::Name => "NAME",
            PdfType::String => "STRING",
            PdfType::Date => "DATE",
            PdfType::Stream => "STREAM",
            PdfType::Array => "ARRAY",
            PdfType::Dictionary => "DICTIONARY",
            PdfType::Rectangle => "RECTANGLE",
            PdfType::NameTree => "NAME-TREE",
            PdfType::NumberTree => "NUMBER-TREE",
        }
    }

    pub fn from_token(token: &str) -> Option<PdfType> {
        PdfType::ALL
            .into_iter()
            .find(|t| t.token().eq_ignore_ascii_case(token.trim()))
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, PdfType::NameTree | PdfType::NumberTree)
    }

    /// Whether a direct object has this type.
    ///
    /// `NUMBER` accepts integers, `DATE` only strings that parse as PDF
    /// dates and `RECTANGLE` only arrays of four numbers.
    pub fn matches(&self, object: &Object, provider: &dyn ObjectProvider) -> bool {
        match (self, object) {
            (PdfType::Boolean, Object::Boolean(_)) => true,
            (PdfType::Integer, Object::Integer(_)) => true,
            (PdfType::Number, Object::Integer(_) | Object::Real(_)) => true,
            (PdfType::Name, Object::Name(_)) => true,
            (PdfType::String, Object::String(_)) => true,
            (PdfType::Date, Object::String(s)) => parse_pdf_date(s).is_some(),
            (PdfType::Stream, Object::Stream(_)) => true,
            (PdfType::Array, Object::Array(_)) => true,
            (PdfType::Rectangle, Object::Array(items)) => {
                items.len() == 4
                    && items.iter().all(|item| {
                        let item = match item {
                            Object::Reference(id) => provider.resolve(*id),
                            direct => Some(direct),
                        };
                        item.and_then(Object::as_real).is_some()
                    })
            }
            (
                PdfType::Dictionary | PdfType::NameTree | PdfType::NumberTree,
                Object::Dictionary(_),
            ) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PdfType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One entry of a row's `TYPE` column. Unknown tokens are kept so that
/// grammar validation can report them with their row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeToken {
    Known(PdfType),
    Unknown(String),
}

impl TypeToken {
    pub fn parse(token: &str) -> TypeToken {
        let token = token.trim().to_ascii_uppercase();
        PdfType::from_token(&token).map_or(TypeToken::Unknown(token), TypeToken::Known)
    }

    pub fn known(&self) -> Option<PdfType> {
        match self {
            TypeToken::Known(t) => Some(*t),
            TypeToken::Unknown(_) => None,
        }
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeToken::Known(t) => write!(f, "{t}"),
            TypeToken::Unknown(token) => f.write_str(token),
        }
    }
}

/// Split a `TYPE` column into tokens. An empty column declares no types.
pub fn split_types(field: &str) -> Vec<TypeToken> {
    if field.trim().is_empty() {
        return Vec::new();
    }
    field.split(TYPE_SEPARATOR).map(TypeToken::parse).collect()
}

/// Index of the first declared type the object matches, in declaration order.
pub fn select_type(
    types: &[TypeToken],
    object: &Object,
    provider: &dyn ObjectProvider,
) -> Option<usize> {
    types
        .iter()
        .position(|token| token.known().is_some_and(|t| t.matches(object, provider)))
}

/// Parse a PDF date string: `D:YYYYMMDDHHmmSSOHH'mm'`, every field after the
/// year optional, the `D:` prefix tolerated as missing.
pub fn parse_pdf_date(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.strip_prefix("D:").unwrap_or(text);
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (numbers, zone) = text.split_at(split);
    if !matches!(numbers.len(), 4 | 6 | 8 | 10 | 12 | 14) {
        return None;
    }

    let field = |start: usize, default: u32| -> Option<u32> {
        match numbers.get(start..start + 2) {
            Some(digits) => digits.parse().ok(),
            None => Some(default),
        }
    };

    let year: i32 = numbers[0..4].parse().ok()?;
    let month = field(4, 1)?;
    let day = field(6, 1)?;
    let hour = field(8, 0)?;
    let minute = field(10, 0)?;
    let second = field(12, 0)?;

    let offset = match zone {
        // `Z` is UTC; it never carries a nonzero offset
        "" | "Z" | "Z00" | "Z00'" | "Z00'00" | "Z00'00'" => 0,
        zone => {
            let sign = match zone.as_bytes()[0] {
                b'+' => 1,
                b'-' => -1,
                _ => return None,
            };
            let rest: String = zone[1..].chars().filter(|c| *c != '\'').collect();
            if rest.len() != 2 && rest.len() != 4 || !rest.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let hours: i32 = rest[0..2].parse().ok()?;
            let minutes: i32 = rest.get(2..4).map_or(Ok(0), str::parse).ok()?;
            if hours > 23 || minutes > 59 {
                return None;
            }
            sign * (hours * 3600 + minutes * 60)
        }
    };

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    FixedOffset::east_opt(offset)?
        .from_local_datetime(&naive)
        .single()
}
