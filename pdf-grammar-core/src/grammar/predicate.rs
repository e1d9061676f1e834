//! Predicates for the `REQUIRED` and `INDIRECTREFERENCE` columns.
//!
//! ```text
//! predicate := or
//! or        := and ("||" and)*
//! and       := unary ("&&" unary)*
//! unary     := "!" unary | "(" predicate ")" | TRUE | FALSE
//!            | fn:SinceVersion(VERSION [, predicate])
//!            | fn:BeforeVersion(VERSION [, predicate])
//!            | fn:IsPresent(KEY) | fn:NotPresent(KEY)
//!            | "@" KEY ("==" | "!=") LITERAL
//! ```
//!
//! Keywords and function names are case-insensitive, key names are not. An
//! empty column is `FALSE`.

use crate::error::Result;
use crate::grammar::expr::{Parser, Token};
use crate::grammar::values::{EvalContext, Literal};
use crate::grammar::PdfVersion;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Const(bool),
    Not(Box<Predicate>),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    /// True from `version` on, and then only if the inner predicate holds.
    SinceVersion(PdfVersion, Box<Predicate>),
    /// True before `version`, and then only if the inner predicate holds.
    BeforeVersion(PdfVersion, Box<Predicate>),
    IsPresent(String),
    NotPresent(String),
    KeyEquals {
        key: String,
        value: Literal,
        negated: bool,
    },
}

impl Predicate {
    pub const TRUE: Predicate = Predicate::Const(true);
    pub const FALSE: Predicate = Predicate::Const(false);

    pub fn parse(text: &str) -> Result<Self> {
        let mut parser = Parser::new(text)?;
        if parser.is_done() {
            return Ok(Predicate::FALSE);
        }
        let predicate = parse_or(&mut parser)?;
        parser.finish()?;
        Ok(predicate)
    }

    /// The value of a predicate that does not depend on its context.
    pub fn as_const(&self) -> Option<bool> {
        match self {
            Predicate::Const(b) => Some(*b),
            _ => None,
        }
    }

    pub fn evaluate(&self, ctx: &dyn EvalContext) -> bool {
        match self {
            Predicate::Const(b) => *b,
            Predicate::Not(inner) => !inner.evaluate(ctx),
            Predicate::And(a, b) => a.evaluate(ctx) && b.evaluate(ctx),
            Predicate::Or(a, b) => a.evaluate(ctx) || b.evaluate(ctx),
            Predicate::SinceVersion(version, inner) => {
                ctx.version() >= *version && inner.evaluate(ctx)
            }
            Predicate::BeforeVersion(version, inner) => {
                ctx.version() < *version && inner.evaluate(ctx)
            }
            Predicate::IsPresent(key) => ctx.is_present(key),
            Predicate::NotPresent(key) => !ctx.is_present(key),
            // A comparison against an absent sibling never holds.
            Predicate::KeyEquals {
                key,
                value,
                negated,
            } => ctx
                .sibling(key)
                .is_some_and(|sibling| sibling.matches(value) != *negated),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Const(true) => f.write_str("TRUE"),
            Predicate::Const(false) => f.write_str("FALSE"),
            Predicate::Not(inner) => write!(f, "!({inner})"),
            Predicate::And(a, b) => write!(f, "({a} && {b})"),
            Predicate::Or(a, b) => write!(f, "({a} || {b})"),
            Predicate::SinceVersion(v, inner) => write!(f, "fn:SinceVersion({v},{inner})"),
            Predicate::BeforeVersion(v, inner) => write!(f, "fn:BeforeVersion({v},{inner})"),
            Predicate::IsPresent(key) => write!(f, "fn:IsPresent({key})"),
            Predicate::NotPresent(key) => write!(f, "fn:NotPresent({key})"),
            Predicate::KeyEquals {
                key,
                value,
                negated,
            } => write!(f, "@{key}{}{value}", if *negated { "!=" } else { "==" }),
        }
    }
}

fn parse_or(parser: &mut Parser) -> Result<Predicate> {
    let mut lhs = parse_and(parser)?;
    while parser.eat(&Token::OrOr) {
        let rhs = parse_and(parser)?;
        lhs = Predicate::Or(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn parse_and(parser: &mut Parser) -> Result<Predicate> {
    let mut lhs = parse_unary(parser)?;
    while parser.eat(&Token::AndAnd) {
        let rhs = parse_unary(parser)?;
        lhs = Predicate::And(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn parse_unary(parser: &mut Parser) -> Result<Predicate> {
    match parser.next() {
        Some(Token::Bang) => Ok(Predicate::Not(Box::new(parse_unary(parser)?))),
        Some(Token::LParen) => {
            let inner = parse_or(parser)?;
            parser.expect(&Token::RParen)?;
            Ok(inner)
        }
        Some(Token::At) => {
            let key = parser.key()?;
            let negated = match parser.next() {
                Some(Token::EqEq) => false,
                Some(Token::NotEq) => true,
                other => return Err(parser.error(format!("expected == or !=, found {other:?}"))),
            };
            let value = match parser.next() {
                Some(Token::Word(word)) | Some(Token::Number(word)) => Literal::parse(&word)
                    .ok_or_else(|| parser.error(format!("invalid literal '{word}'")))?,
                Some(Token::Quoted(text)) => Literal::Text(text),
                other => return Err(parser.error(format!("expected literal, found {other:?}"))),
            };
            Ok(Predicate::KeyEquals {
                key,
                value,
                negated,
            })
        }
        Some(Token::Word(word)) if word.eq_ignore_ascii_case("true") => Ok(Predicate::TRUE),
        Some(Token::Word(word)) if word.eq_ignore_ascii_case("false") => Ok(Predicate::FALSE),
        Some(Token::Word(word)) if parser.peek() == Some(&Token::LParen) => {
            parse_call(parser, &word)
        }
        other => Err(parser.error(format!("unexpected {other:?}"))),
    }
}

fn parse_call(parser: &mut Parser, function: &str) -> Result<Predicate> {
    parser.expect(&Token::LParen)?;
    let lower = function.to_ascii_lowercase();
    let predicate = match lower.as_str() {
        "fn:sinceversion" | "fn:beforeversion" => {
            let version = parser.version()?;
            let inner = if parser.eat(&Token::Comma) {
                parse_or(parser)?
            } else {
                Predicate::TRUE
            };
            if lower == "fn:sinceversion" {
                Predicate::SinceVersion(version, Box::new(inner))
            } else {
                Predicate::BeforeVersion(version, Box::new(inner))
            }
        }
        "fn:ispresent" => Predicate::IsPresent(parser.key()?),
        "fn:notpresent" => Predicate::NotPresent(parser.key()?),
        _ => return Err(parser.error(format!("unknown function '{function}'"))),
    };
    parser.expect(&Token::RParen)?;
    Ok(predicate)
}
