use logos::Logos;
use std::fmt;
use std::ops::Range;

use tb_core::{TbError, TbResult};

/// Token type for formulas.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Integer or decimal literal.
    Number(f64),
    /// Dice term `NdM`: count, sides.
    Dice(u32, u32),
    /// Variable reference `{name}`, braces stripped.
    Var(String),
    /// Bare identifier; only valid as a function name.
    Ident(String),
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    EqEq,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Dice(count, sides) => write!(f, "{count}d{sides}"),
            Token::Var(name) => write!(f, "{{{name}}}"),
            Token::Ident(name) => write!(f, "{name}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Ge => write!(f, ">="),
            Token::EqEq => write!(f, "=="),
        }
    }
}

/// Internal logos token, converted to an owned [`Token`] after lexing.
#[derive(Logos, Debug)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
    #[regex(r"[0-9]+(\.[0-9]+)?|\.[0-9]+")]
    Number,

    #[regex(r"[0-9]+[dD][0-9]+")]
    Dice,

    #[regex(r"\{[^}]*\}")]
    Var,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(",")]
    Comma,

    #[token("<")]
    Lt,

    #[token("<=")]
    Le,

    #[token(">")]
    Gt,

    #[token(">=")]
    Ge,

    #[token("==")]
    EqEq,
}

/// Lex a formula into `(Token, span)` pairs.
///
/// There is no recovery: the first bad character aborts with a calculation
/// error pointing at it.
pub fn lex(source: &str) -> TbResult<Vec<(Token, Range<usize>)>> {
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let slice = lexer.slice();
        let token = match result {
            Ok(RawToken::Number) => {
                let n = slice.parse::<f64>().map_err(|_| {
                    TbError::calculation_at(format!("invalid number: {slice}"), span.clone())
                })?;
                Token::Number(n)
            }
            Ok(RawToken::Dice) => {
                let (count, sides) = split_dice(slice).ok_or_else(|| {
                    TbError::calculation_at(format!("invalid dice term: {slice}"), span.clone())
                })?;
                Token::Dice(count, sides)
            }
            Ok(RawToken::Var) => {
                let name = slice[1..slice.len() - 1].trim();
                if name.is_empty() {
                    return Err(TbError::calculation_at("empty variable name", span));
                }
                Token::Var(name.to_string())
            }
            Ok(RawToken::Ident) => Token::Ident(slice.to_string()),
            Ok(RawToken::Plus) => Token::Plus,
            Ok(RawToken::Minus) => Token::Minus,
            Ok(RawToken::Star) => Token::Star,
            Ok(RawToken::Slash) => Token::Slash,
            Ok(RawToken::LParen) => Token::LParen,
            Ok(RawToken::RParen) => Token::RParen,
            Ok(RawToken::Comma) => Token::Comma,
            Ok(RawToken::Lt) => Token::Lt,
            Ok(RawToken::Le) => Token::Le,
            Ok(RawToken::Gt) => Token::Gt,
            Ok(RawToken::Ge) => Token::Ge,
            Ok(RawToken::EqEq) => Token::EqEq,
            Err(()) => {
                let message = if slice.starts_with('{') {
                    "unterminated variable reference".to_string()
                } else {
                    format!("unexpected character: {slice:?}")
                };
                return Err(TbError::calculation_at(message, span));
            }
        };
        tokens.push((token, span));
    }

    Ok(tokens)
}

/// Split `2d6` / `2D6` into `(2, 6)`. Counts that overflow `u32` fail.
fn split_dice(slice: &str) -> Option<(u32, u32)> {
    let idx = slice.find(['d', 'D'])?;
    let count = slice[..idx].parse().ok()?;
    let sides = slice[idx + 1..].parse().ok()?;
    Some((count, sides))
}
