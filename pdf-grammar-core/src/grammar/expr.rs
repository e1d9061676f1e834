//! Tokenizer shared by the grammar's expression columns.
//!
//! `REQUIRED`, `INDIRECTREFERENCE` and `PossibleValues` each hold a tiny
//! expression language. They share this token set:
//!
//! | token   | text                                           |
//! |---------|------------------------------------------------|
//! | `[ ]`   | list brackets                                  |
//! | `( )`   | grouping and call parentheses                  |
//! | `,`     | list / argument separator                      |
//! | `@`     | sibling key reference prefix                   |
//! | `!`     | negation                                       |
//! | `&& \|\|` | conjunction, disjunction                     |
//! | `== !=` | equality tests                                 |
//! | `< <= > >=` | numeric comparisons                        |
//! | `..`    | inclusive range                                |
//! | number  | `-?digits(.digits)?`                           |
//! | word    | letters, digits and `_ : . - # * +`; a digit run glued to a letter (`3D`) is a word |
//! | quoted  | `'...'`, no escapes                            |
//!
//! Whitespace separates tokens and is otherwise ignored.

use crate::error::{GrammarError, Result};
use crate::grammar::PdfVersion;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    At,
    Bang,
    AndAnd,
    OrOr,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    DotDot,
    Number(String),
    Word(String),
    Quoted(String),
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-' | '#' | '*' | '+')
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '[' => push(&mut tokens, &mut i, Token::LBracket, 1),
            ']' => push(&mut tokens, &mut i, Token::RBracket, 1),
            '(' => push(&mut tokens, &mut i, Token::LParen, 1),
            ')' => push(&mut tokens, &mut i, Token::RParen, 1),
            ',' => push(&mut tokens, &mut i, Token::Comma, 1),
            '@' => push(&mut tokens, &mut i, Token::At, 1),
            '&' if next == Some('&') => push(&mut tokens, &mut i, Token::AndAnd, 2),
            '|' if next == Some('|') => push(&mut tokens, &mut i, Token::OrOr, 2),
            '=' if next == Some('=') => push(&mut tokens, &mut i, Token::EqEq, 2),
            '!' if next == Some('=') => push(&mut tokens, &mut i, Token::NotEq, 2),
            '!' => push(&mut tokens, &mut i, Token::Bang, 1),
            '<' if next == Some('=') => push(&mut tokens, &mut i, Token::Le, 2),
            '<' => push(&mut tokens, &mut i, Token::Lt, 1),
            '>' if next == Some('=') => push(&mut tokens, &mut i, Token::Ge, 2),
            '>' => push(&mut tokens, &mut i, Token::Gt, 1),
            '.' if next == Some('.') => push(&mut tokens, &mut i, Token::DotDot, 2),
            '\'' => {
                let start = i + 1;
                let end = chars[start..]
                    .iter()
                    .position(|&c| c == '\'')
                    .map(|offset| start + offset)
                    .ok_or_else(|| GrammarError::expression(input, "unterminated quote"))?;
                tokens.push(Token::Quoted(chars[start..end].iter().collect()));
                i = end + 1;
            }
            c if c.is_ascii_digit()
                || ((c == '-' || c == '+' || c == '.')
                    && next.is_some_and(|n| n.is_ascii_digit())) =>
            {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                // A single dot followed by a digit continues the number; `..`
                // starts a range.
                if i < chars.len()
                    && chars[i] == '.'
                    && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())
                {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                if i < chars.len() && is_word_char(chars[i]) && !starts_range(&chars, i) {
                    i = word_end(&chars, i);
                    tokens.push(Token::Word(chars[start..i].iter().collect()));
                } else {
                    tokens.push(Token::Number(chars[start..i].iter().collect()));
                }
            }
            c if is_word_char(c) => {
                let start = i;
                i = word_end(&chars, i);
                tokens.push(Token::Word(chars[start..i].iter().collect()));
            }
            other => {
                return Err(GrammarError::expression(
                    input,
                    format!("unexpected character '{other}'"),
                ))
            }
        }
    }

    Ok(tokens)
}

fn starts_range(chars: &[char], i: usize) -> bool {
    chars[i] == '.' && chars.get(i + 1) == Some(&'.')
}

/// End of the word starting at `i`; a range operator glued to a word is not
/// part of it.
fn word_end(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && is_word_char(chars[i]) && !starts_range(chars, i) {
        i += 1;
    }
    i
}

fn push(tokens: &mut Vec<Token>, i: &mut usize, token: Token, width: usize) {
    tokens.push(token);
    *i += width;
}

/// Cursor over a token stream, used by the recursive-descent parsers.
pub(crate) struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(source: &'a str) -> Result<Self> {
        Ok(Self {
            source,
            tokens: tokenize(source)?,
            pos: 0,
        })
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    pub(crate) fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, token: &Token) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected {token:?}, found {:?}", self.peek())))
        }
    }

    pub(crate) fn is_done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub(crate) fn finish(&self) -> Result<()> {
        if self.is_done() {
            Ok(())
        } else {
            Err(self.error(format!("trailing input at {:?}", self.peek())))
        }
    }

    /// A bare key name, as used after `@` or inside `fn:IsPresent(...)`.
    pub(crate) fn key(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Word(word)) | Some(Token::Number(word)) => Ok(word),
            other => Err(self.error(format!("expected key name, found {other:?}"))),
        }
    }

    pub(crate) fn version(&mut self) -> Result<PdfVersion> {
        match self.next() {
            Some(Token::Number(text)) => text.parse().map_err(|e: String| self.error(e)),
            other => Err(self.error(format!("expected PDF version, found {other:?}"))),
        }
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> GrammarError {
        GrammarError::expression(self.source, message)
    }
}
