//! Tokenizer for pattern-definition files.

use logos::Logos;

use crate::errors::{SyntaxError, SyntaxErrorKind};

/// Byte range in the pattern source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

fn parse_hex(lex: &logos::Lexer<'_, Token>) -> Option<i64> {
    let digits = &lex.slice()[2..];
    u64::from_str_radix(digits, 16)
        .ok()
        .map(|v| i64::from_ne_bytes(v.to_ne_bytes()))
}

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    #[regex(r"//[^\n]*", logos::skip)]
    Comment,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token("|")]
    Pipe,
    #[token("->")]
    Arrow,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("@")]
    At,

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    #[regex(r"0x[0-9a-fA-F]+", parse_hex)]
    Int(i64),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Ident(String),
}

impl Token {
    /// Short human-readable description for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("identifier `{name}`"),
            Token::Int(v) => format!("number `{v}`"),
            Token::Comment => "comment".to_owned(),
            other => format!("`{}`", other.punct()),
        }
    }

    fn punct(&self) -> &'static str {
        match self {
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::Colon => ":",
            Token::Semi => ";",
            Token::Pipe => "|",
            Token::Arrow => "->",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::At => "@",
            Token::Int(_) | Token::Ident(_) | Token::Comment => "",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub span: Span,
}

/// Tokenize a whole document.
///
/// Characters that do not start a token are reported and skipped, so one
/// stray byte does not hide later errors.
pub fn tokenize(source: &str) -> (Vec<Spanned>, Vec<SyntaxError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(range.start, range.end);
        match result {
            Ok(token) => tokens.push(Spanned { token, span }),
            Err(()) => {
                let text = &source[range];
                let kind = if text.starts_with(|c: char| c.is_ascii_digit()) {
                    SyntaxErrorKind::InvalidNumber(text.to_owned())
                } else {
                    SyntaxErrorKind::InvalidCharacter(text.to_owned())
                };
                errors.push(SyntaxError { kind, span });
            }
        }
    }

    (tokens, errors)
}
