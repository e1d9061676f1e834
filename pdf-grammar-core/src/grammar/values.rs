//! Literal values and the `PossibleValues` expression language.
//!
//! One segment of the `PossibleValues` column constrains the value of a key
//! for one declared type:
//!
//! ```text
//! possible := "" | "[" [item ("," item)*] "]"
//! item     := LITERAL
//!           | operand ".." operand            inclusive numeric range
//!           | ("<" | "<=" | ">" | ">=") operand
//!           | "@" KEY                          equal to a sibling's value
//!           | fn:SinceVersion(VERSION, item)  only allowed from VERSION on
//!           | fn:BeforeVersion(VERSION, item) only allowed before VERSION
//! operand  := NUMBER | "@" KEY
//! ```
//!
//! An empty segment, or `[]`, places no constraint on the value.

use crate::error::Result;
use crate::grammar::expr::{Parser, Token};
use crate::grammar::PdfVersion;
use crate::objects::Object;
use std::fmt;

/// What expressions can ask about the value being checked.
pub trait EvalContext {
    /// Active PDF version.
    fn version(&self) -> PdfVersion;
    /// Whether the container holds a non-null value for `key`.
    fn is_present(&self, key: &str) -> bool;
    /// The literal value of `key`, or its declared default when absent.
    fn sibling(&self, key: &str) -> Option<Literal>;
}

/// Context with a version and no container, e.g. for evaluating defaults.
#[derive(Debug, Clone, Copy)]
pub struct VersionContext(pub PdfVersion);

impl EvalContext for VersionContext {
    fn version(&self) -> PdfVersion {
        self.0
    }

    fn is_present(&self, _key: &str) -> bool {
        false
    }

    fn sibling(&self, _key: &str) -> Option<Literal> {
        None
    }
}

/// A scalar value from the grammar or from the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    /// Names and strings compare by text.
    Text(String),
}

impl Literal {
    /// Parse a single value column such as `RequiredValue` or `DefaultValue`.
    ///
    /// Surrounding brackets and quotes are stripped. Returns `None` for
    /// empty fields and for values that are not scalars (array defaults).
    pub fn parse(field: &str) -> Option<Literal> {
        let mut text = field.trim();
        if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            text = inner.trim();
        }
        if text.is_empty() || text.contains(char::is_whitespace) && !text.starts_with('\'') {
            return None;
        }
        if let Some(inner) = text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
            return Some(Literal::Text(inner.to_string()));
        }
        Some(Self::from_word(text))
    }

    fn from_word(word: &str) -> Literal {
        if word.eq_ignore_ascii_case("true") {
            Literal::Boolean(true)
        } else if word.eq_ignore_ascii_case("false") {
            Literal::Boolean(false)
        } else if let Ok(i) = word.parse::<i64>() {
            Literal::Integer(i)
        } else if let Ok(f) = word.parse::<f64>() {
            Literal::Real(f)
        } else {
            Literal::Text(word.to_string())
        }
    }

    /// Scalar view of a direct object; containers have none.
    pub fn from_object(object: &Object) -> Option<Literal> {
        match object {
            Object::Boolean(b) => Some(Literal::Boolean(*b)),
            Object::Integer(i) => Some(Literal::Integer(*i)),
            Object::Real(f) => Some(Literal::Real(*f)),
            Object::Name(n) => Some(Literal::Text(n.clone())),
            Object::String(s) => Some(Literal::Text(s.clone())),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Literal::Integer(i) => Some(*i as f64),
            Literal::Real(f) => Some(*f),
            _ => None,
        }
    }

    /// Equality with numeric promotion between integers and reals.
    pub fn matches(&self, other: &Literal) -> bool {
        match (self, other) {
            (Literal::Boolean(a), Literal::Boolean(b)) => a == b,
            (Literal::Text(a), Literal::Text(b)) => a == b,
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Boolean(true) => f.write_str("TRUE"),
            Literal::Boolean(false) => f.write_str("FALSE"),
            Literal::Integer(i) => write!(f, "{i}"),
            Literal::Real(r) => write!(f, "{r}"),
            Literal::Text(t) => f.write_str(t),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    Sibling(String),
}

impl Operand {
    fn resolve(&self, ctx: &dyn EvalContext) -> Option<f64> {
        match self {
            Operand::Number(n) => Some(*n),
            Operand::Sibling(key) => ctx.sibling(key).and_then(|l| l.as_number()),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Number(n) => write!(f, "{n}"),
            Operand::Sibling(key) => write!(f, "@{key}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn holds(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Lt => lhs < rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Gt => lhs > rhs,
            Comparison::Ge => lhs >= rhs,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueItem {
    Literal(Literal),
    Range(Operand, Operand),
    Compare(Comparison, Operand),
    Sibling(String),
    Gated {
        since: Option<PdfVersion>,
        before: Option<PdfVersion>,
        item: Box<ValueItem>,
    },
}

impl ValueItem {
    /// Items that reference a sibling which is absent and has no default are
    /// treated as satisfied: there is nothing to compare against.
    fn allows(&self, value: &Literal, ctx: &dyn EvalContext) -> bool {
        match self {
            ValueItem::Literal(literal) => literal.matches(value),
            ValueItem::Range(lo, hi) => {
                let (Some(lo), Some(hi)) = (lo.resolve(ctx), hi.resolve(ctx)) else {
                    return true;
                };
                value.as_number().is_some_and(|v| lo <= v && v <= hi)
            }
            ValueItem::Compare(op, rhs) => {
                let Some(rhs) = rhs.resolve(ctx) else {
                    return true;
                };
                value.as_number().is_some_and(|v| op.holds(v, rhs))
            }
            ValueItem::Sibling(key) => ctx.sibling(key).map_or(true, |s| s.matches(value)),
            ValueItem::Gated {
                since,
                before,
                item,
            } => ctx.version().is_within(*since, *before) && item.allows(value, ctx),
        }
    }
}

impl fmt::Display for ValueItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueItem::Literal(literal) => write!(f, "{literal}"),
            ValueItem::Range(lo, hi) => write!(f, "{lo}..{hi}"),
            ValueItem::Compare(op, rhs) => write!(f, "{}{rhs}", op.symbol()),
            ValueItem::Sibling(key) => write!(f, "@{key}"),
            ValueItem::Gated {
                since: Some(v),
                item,
                ..
            } => write!(f, "fn:SinceVersion({v},{item})"),
            ValueItem::Gated {
                before: Some(v),
                item,
                ..
            } => write!(f, "fn:BeforeVersion({v},{item})"),
            ValueItem::Gated { item, .. } => write!(f, "{item}"),
        }
    }
}

/// Parsed `PossibleValues` segment for one declared type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PossibleValues {
    items: Vec<ValueItem>,
}

impl PossibleValues {
    pub fn parse(segment: &str) -> Result<Self> {
        let mut parser = Parser::new(segment)?;
        if parser.is_done() {
            return Ok(Self::default());
        }
        let bracketed = parser.eat(&Token::LBracket);
        let mut items = Vec::new();
        let closes = |p: &Parser| bracketed && p.peek() == Some(&Token::RBracket);
        if !closes(&parser) {
            loop {
                items.push(parse_item(&mut parser)?);
                if !parser.eat(&Token::Comma) {
                    break;
                }
            }
        }
        if bracketed {
            parser.expect(&Token::RBracket)?;
        }
        parser.finish()?;
        Ok(Self { items })
    }

    pub fn items(&self) -> &[ValueItem] {
        &self.items
    }

    pub fn is_unconstrained(&self) -> bool {
        self.items.is_empty()
    }

    pub fn allows(&self, value: &Literal, ctx: &dyn EvalContext) -> bool {
        self.is_unconstrained() || self.items.iter().any(|item| item.allows(value, ctx))
    }
}

impl fmt::Display for PossibleValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{item}")?;
        }
        f.write_str("]")
    }
}

fn parse_number(parser: &Parser, text: &str) -> Result<f64> {
    text.parse()
        .map_err(|_| parser.error(format!("invalid number '{text}'")))
}

fn parse_operand(parser: &mut Parser) -> Result<Operand> {
    match parser.next() {
        Some(Token::Number(text)) => Ok(Operand::Number(parse_number(parser, &text)?)),
        Some(Token::At) => Ok(Operand::Sibling(parser.key()?)),
        other => Err(parser.error(format!("expected number or @key, found {other:?}"))),
    }
}

fn parse_item(parser: &mut Parser) -> Result<ValueItem> {
    let comparison = match parser.peek() {
        Some(Token::Lt) => Some(Comparison::Lt),
        Some(Token::Le) => Some(Comparison::Le),
        Some(Token::Gt) => Some(Comparison::Gt),
        Some(Token::Ge) => Some(Comparison::Ge),
        _ => None,
    };
    if let Some(op) = comparison {
        parser.next();
        return Ok(ValueItem::Compare(op, parse_operand(parser)?));
    }

    match parser.next() {
        Some(Token::At) => {
            let key = parser.key()?;
            if parser.eat(&Token::DotDot) {
                Ok(ValueItem::Range(Operand::Sibling(key), parse_operand(parser)?))
            } else {
                Ok(ValueItem::Sibling(key))
            }
        }
        Some(Token::Number(text)) => {
            if parser.eat(&Token::DotDot) {
                let lo = Operand::Number(parse_number(parser, &text)?);
                Ok(ValueItem::Range(lo, parse_operand(parser)?))
            } else {
                Ok(ValueItem::Literal(Literal::from_word(&text)))
            }
        }
        Some(Token::Word(word)) if parser.peek() == Some(&Token::LParen) => {
            parse_gated(parser, &word)
        }
        Some(Token::Word(word)) => Ok(ValueItem::Literal(Literal::from_word(&word))),
        Some(Token::Quoted(text)) => Ok(ValueItem::Literal(Literal::Text(text))),
        other => Err(parser.error(format!("expected value, found {other:?}"))),
    }
}

fn parse_gated(parser: &mut Parser, function: &str) -> Result<ValueItem> {
    let since = function.eq_ignore_ascii_case("fn:SinceVersion");
    let before = function.eq_ignore_ascii_case("fn:BeforeVersion");
    if !since && !before {
        return Err(parser.error(format!("unknown function '{function}'")));
    }
    parser.expect(&Token::LParen)?;
    let version = parser.version()?;
    parser.expect(&Token::Comma)?;
    let item = parse_item(parser)?;
    parser.expect(&Token::RParen)?;
    Ok(ValueItem::Gated {
        since: since.then_some(version),
        before: before.then_some(version),
        item: Box::new(item),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Siblings {
        version: PdfVersion,
        values: HashMap<&'static str, Literal>,
    }

    impl EvalContext for Siblings {
        fn version(&self) -> PdfVersion {
            self.version
        }

        fn is_present(&self, key: &str) -> bool {
            self.values.contains_key(key)
        }

        fn sibling(&self, key: &str) -> Option<Literal> {
            self.values.get(key).cloned()
        }
    }

    fn ctx() -> VersionContext {
        VersionContext(PdfVersion::V2_0)
    }

    #[test]
    fn test_literal_parse() {
        assert_eq!(Literal::parse(""), None);
        assert_eq!(Literal::parse("[Catalog]"), Some(Literal::Text("Catalog".into())));
        assert_eq!(Literal::parse("true"), Some(Literal::Boolean(true)));
        assert_eq!(Literal::parse("12"), Some(Literal::Integer(12)));
        assert_eq!(Literal::parse("0.5"), Some(Literal::Real(0.5)));
        assert_eq!(Literal::parse("'a b'"), Some(Literal::Text("a b".into())));
        assert_eq!(Literal::parse("[0 0 612 792]"), None);
    }

    #[test]
    fn test_numeric_promotion() {
        assert!(Literal::Integer(1).matches(&Literal::Real(1.0)));
        assert!(!Literal::Integer(1).matches(&Literal::Text("1".into())));
        assert!(!Literal::Boolean(true).matches(&Literal::Integer(1)));
    }

    #[test]
    fn test_empty_segments_are_unconstrained() {
        assert!(PossibleValues::parse("").unwrap().is_unconstrained());
        assert!(PossibleValues::parse("  ").unwrap().is_unconstrained());
        assert!(PossibleValues::parse("[]").unwrap().is_unconstrained());
        let any = PossibleValues::parse("[]").unwrap();
        assert!(any.allows(&Literal::Integer(5), &ctx()));
    }

    #[test]
    fn test_literal_list() {
        let values = PossibleValues::parse("[Catalog,Pages,'Two Words']").unwrap();
        assert_eq!(values.items().len(), 3);
        assert!(values.allows(&Literal::Text("Pages".into()), &ctx()));
        assert!(values.allows(&Literal::Text("Two Words".into()), &ctx()));
        assert!(!values.allows(&Literal::Text("Page".into()), &ctx()));
    }

    #[test]
    fn test_digit_led_names_in_lists() {
        let values = PossibleValues::parse("[3D,3DView]").unwrap();
        assert_eq!(values.items().len(), 2);
        assert!(values.allows(&Literal::Text("3D".into()), &ctx()));
        assert!(values.allows(&Literal::Text("3DView".into()), &ctx()));
        assert!(!values.allows(&Literal::Integer(3), &ctx()));
    }

    #[test]
    fn test_ranges_and_comparisons() {
        let values = PossibleValues::parse("[0..3,>=10]").unwrap();
        assert!(values.allows(&Literal::Integer(0), &ctx()));
        assert!(values.allows(&Literal::Real(2.5), &ctx()));
        assert!(!values.allows(&Literal::Integer(4), &ctx()));
        assert!(values.allows(&Literal::Integer(10), &ctx()));
        assert!(!values.allows(&Literal::Text("3".into()), &ctx()));
    }

    #[test]
    fn test_sibling_formulas() {
        let siblings = Siblings {
            version: PdfVersion::V2_0,
            values: HashMap::from([("Count", Literal::Integer(4))]),
        };
        let values = PossibleValues::parse("[0..@Count]").unwrap();
        assert!(values.allows(&Literal::Integer(4), &siblings));
        assert!(!values.allows(&Literal::Integer(5), &siblings));

        let equal = PossibleValues::parse("[@Count]").unwrap();
        assert!(equal.allows(&Literal::Integer(4), &siblings));
        assert!(!equal.allows(&Literal::Integer(3), &siblings));

        // Nothing to compare against: not a violation.
        let absent = PossibleValues::parse("[<@Missing]").unwrap();
        assert!(absent.allows(&Literal::Integer(100), &siblings));
    }

    #[test]
    fn test_version_gated_values() {
        let values = PossibleValues::parse("[None,fn:SinceVersion(2.0,Forms)]").unwrap();
        let old = VersionContext(PdfVersion::new(1, 7));
        assert!(values.allows(&Literal::Text("Forms".into()), &ctx()));
        assert!(!values.allows(&Literal::Text("Forms".into()), &old));
        assert!(values.allows(&Literal::Text("None".into()), &old));
    }

    #[test]
    fn test_bare_list_without_brackets() {
        let values = PossibleValues::parse("1,2").unwrap();
        assert!(values.allows(&Literal::Integer(2), &ctx()));
    }

    #[test]
    fn test_malformed_segments() {
        assert!(PossibleValues::parse("[1,2").is_err());
        assert!(PossibleValues::parse("[1,]").is_err());
        assert!(PossibleValues::parse("[1..]").is_err());
        assert!(PossibleValues::parse("[fn:Bogus(1.0,2)]").is_err());
        assert!(PossibleValues::parse("[1] 2").is_err());
    }

    #[test]
    fn test_display_is_canonical() {
        let values = PossibleValues::parse("[ 1 .. 3 , @N ,fn:sinceversion(1.5, X)]").unwrap();
        assert_eq!(values.to_string(), "[1..3,@N,fn:SinceVersion(1.5,X)]");
    }
}
