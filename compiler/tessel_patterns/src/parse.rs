//! Recursive-descent parser for pattern-definition documents.
//!
//! ```text
//! document   := group*
//! group      := IDENT ':' conversion ('|' conversion)* ';'
//! conversion := expr '->' item+
//! expr       := '(' capture? TYPE? IDENT arg* ')' | capture? IDENT
//! arg        := expr | '-'? INT
//! capture    := '<' IDENT '>'
//! item       := '[' ( '@' IDENT | MNEMONIC ('.' IDENT)? operands? | operand ) ']'
//! operand    := atom ('*' INT)?
//! atom       := '<' IDENT ('.' IDENT)* (':' IDENT)? '>'
//!             | '[' term (('+' term) | ('-' INT))* ']'
//!             | '-'? INT | IDENT | '@' IDENT
//! term       := atom ('*' INT)?
//! ```
//!
//! A syntax error abandons the current group: the parser records it, skips
//! past the next `;` and carries on, so one bad group does not hide errors
//! in the rest of the file.

use crate::ast::{Conversion, Document, Expr, GroupDef, Item, MemTerm, Operand};
use crate::errors::{SyntaxError, SyntaxErrorKind};
use crate::lexer::{tokenize, Span, Spanned, Token};

type PResult<T> = Result<T, SyntaxError>;

/// Parse a whole document, collecting every lexer and parser error.
pub fn parse_document(source: &str) -> Result<Document, Vec<SyntaxError>> {
    let (tokens, mut errors) = tokenize(source);
    let mut parser = Parser::new(&tokens, Span::new(source.len(), source.len()));
    let document = parser.document();
    errors.append(&mut parser.errors);

    if errors.is_empty() {
        Ok(document)
    } else {
        errors.sort_by_key(|e| e.span.start);
        Err(errors)
    }
}

/// A capture name syntactically looks like a type when it is `I` followed
/// by digits. Whether the width exists is the compiler's business.
fn looks_like_type(name: &str) -> bool {
    name.len() > 1 && name.starts_with('I') && name[1..].bytes().all(|b| b.is_ascii_digit())
}

/// Mnemonics are all upper case (`ADD`, `CMOV`, `MOVZX`).
fn is_mnemonic(name: &str) -> bool {
    name.bytes().any(|b| b.is_ascii_uppercase())
        && name
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    eof: Span,
    errors: Vec<SyntaxError>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned], eof: Span) -> Self {
        Self {
            tokens,
            pos: 0,
            eof,
            errors: Vec::new(),
        }
    }

    // Token access

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset).map(|t| &t.token)
    }

    fn span(&self) -> Span {
        self.tokens.get(self.pos).map_or(self.eof, |t| t.span)
    }

    fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(self.eof, |t| t.span)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn bump(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn error(&self, expected: &'static str) -> SyntaxError {
        let kind = match self.peek() {
            Some(found) => SyntaxErrorKind::UnexpectedToken {
                expected,
                found: found.describe(),
            },
            None => SyntaxErrorKind::UnexpectedEof { expected },
        };
        SyntaxError {
            kind,
            span: self.span(),
        }
    }

    fn expect(&mut self, token: &Token, expected: &'static str) -> PResult<Span> {
        if self.check(token) {
            let span = self.span();
            self.bump();
            Ok(span)
        } else {
            Err(self.error(expected))
        }
    }

    fn expect_ident(&mut self, expected: &'static str) -> PResult<(String, Span)> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let span = self.span();
                self.bump();
                Ok((name.clone(), span))
            }
            _ => Err(self.error(expected)),
        }
    }

    /// `INT` or `- INT`.
    fn expect_int(&mut self, expected: &'static str) -> PResult<(i64, Span)> {
        let start = self.span();
        let negative = self.eat(&Token::Minus);
        match self.peek() {
            Some(Token::Int(v)) => {
                let span = start.to(self.span());
                self.bump();
                Ok((if negative { v.wrapping_neg() } else { *v }, span))
            }
            _ => Err(self.error(expected)),
        }
    }

    /// Skip past the next `;` (or to the end of input).
    fn recover(&mut self) {
        while let Some(token) = self.peek() {
            self.bump();
            if *token == Token::Semi {
                break;
            }
        }
    }

    // Groups

    fn document(&mut self) -> Document {
        let mut document = Document::default();
        while !self.is_at_end() {
            match self.group() {
                Ok(group) => document.groups.push(group),
                Err(err) => {
                    self.errors.push(err);
                    self.recover();
                }
            }
        }
        document
    }

    fn group(&mut self) -> PResult<GroupDef> {
        let (name, start) = self.expect_ident("group name")?;
        self.expect(&Token::Colon, "`:` after group name")?;

        let mut conversions = vec![self.conversion()?];
        while self.eat(&Token::Pipe) {
            conversions.push(self.conversion()?);
        }
        let end = self.expect(&Token::Semi, "`|` or `;`")?;

        Ok(GroupDef {
            name,
            span: start.to(end),
            conversions,
        })
    }

    fn conversion(&mut self) -> PResult<Conversion> {
        let expr = self.expr()?;
        self.expect(&Token::Arrow, "`->`")?;

        if !self.check(&Token::LBracket) {
            return Err(self.error("template item `[`"));
        }
        let mut template = Vec::new();
        while self.check(&Token::LBracket) {
            template.push(self.item()?);
        }

        Ok(Conversion {
            span: expr.span().to(self.previous_span()),
            expr,
            template,
        })
    }

    // Expressions

    fn capture(&mut self) -> PResult<Option<String>> {
        if !self.eat(&Token::Lt) {
            return Ok(None);
        }
        let (name, _) = self.expect_ident("capture name")?;
        self.expect(&Token::Gt, "`>` closing the capture")?;
        Ok(Some(name))
    }

    fn expr(&mut self) -> PResult<Expr> {
        let start = self.span();
        match self.peek() {
            Some(Token::LParen) => {
                self.bump();
                let capture = self.capture()?;
                let (first, first_span) = self.expect_ident("operation name")?;
                let (ty, op) = if looks_like_type(&first)
                    && matches!(self.peek(), Some(Token::Ident(_)))
                {
                    let (op, _) = self.expect_ident("operation name")?;
                    (Some((first, first_span)), op)
                } else {
                    (None, first)
                };

                let mut args = Vec::new();
                while !self.check(&Token::RParen) {
                    if self.is_at_end() {
                        return Err(self.error("`)`"));
                    }
                    args.push(self.arg()?);
                }
                let end = self.expect(&Token::RParen, "`)`")?;

                Ok(Expr::Op {
                    capture,
                    ty,
                    op,
                    args,
                    span: start.to(end),
                })
            }
            Some(Token::Lt | Token::Ident(_)) => {
                let capture = self.capture()?;
                let (name, end) = self.expect_ident("group or identifier name")?;
                Ok(Expr::Name {
                    capture,
                    name,
                    span: start.to(end),
                })
            }
            _ => Err(self.error("pattern expression")),
        }
    }

    fn arg(&mut self) -> PResult<Expr> {
        match self.peek() {
            Some(Token::Int(_) | Token::Minus) => {
                let (value, span) = self.expect_int("number")?;
                Ok(Expr::Number { value, span })
            }
            _ => self.expr(),
        }
    }

    // Templates

    fn item(&mut self) -> PResult<Item> {
        let start = self.expect(&Token::LBracket, "`[`")?;

        let item = match (self.peek(), self.peek_at(1)) {
            (Some(Token::At), _) => {
                self.bump();
                let (name, _) = self.expect_ident("label name")?;
                let end = self.expect(&Token::RBracket, "`]`")?;
                Item::Label {
                    name,
                    span: start.to(end),
                }
            }
            (Some(Token::Ident(name)), next)
                if is_mnemonic(name) && next != Some(&Token::Star) =>
            {
                let mnemonic = name.clone();
                self.bump();
                let condition = if self.eat(&Token::Dot) {
                    Some(self.expect_ident("condition code")?)
                } else {
                    None
                };
                let mut operands = Vec::new();
                if !self.check(&Token::RBracket) {
                    operands.push(self.operand()?);
                    while self.eat(&Token::Comma) {
                        operands.push(self.operand()?);
                    }
                }
                let end = self.expect(&Token::RBracket, "`,` or `]`")?;
                Item::Instruction {
                    mnemonic,
                    condition,
                    operands,
                    span: start.to(end),
                }
            }
            _ => {
                let operand = self.operand()?;
                self.expect(&Token::RBracket, "`]`")?;
                Item::Operand(operand)
            }
        };
        Ok(item)
    }

    fn operand(&mut self) -> PResult<Operand> {
        let atom = self.atom()?;
        if self.eat(&Token::Star) {
            let (scale, end) = self.expect_int("scale")?;
            let span = atom.span().to(end);
            return Ok(Operand::Scaled {
                index: Box::new(atom),
                scale,
                span,
            });
        }
        Ok(atom)
    }

    fn term(&mut self) -> PResult<MemTerm> {
        let atom = self.atom()?;
        let scale = if self.eat(&Token::Star) {
            Some(self.expect_int("scale")?.0)
        } else {
            None
        };
        Ok(MemTerm { atom, scale })
    }

    fn atom(&mut self) -> PResult<Operand> {
        let start = self.span();
        match self.peek() {
            Some(Token::Lt) => {
                self.bump();
                let (head, _) = self.expect_ident("identifier")?;
                let mut path = vec![head];
                while self.eat(&Token::Dot) {
                    path.push(self.expect_ident("identifier after `.`")?.0);
                }
                let ty = if self.eat(&Token::Colon) {
                    Some(self.expect_ident("type")?)
                } else {
                    None
                };
                let end = self.expect(&Token::Gt, "`>` closing the reference")?;
                Ok(Operand::Reference {
                    path,
                    ty,
                    span: start.to(end),
                })
            }
            Some(Token::LBracket) => {
                self.bump();
                let mut terms = vec![self.term()?];
                loop {
                    if self.eat(&Token::Plus) {
                        terms.push(self.term()?);
                    } else if self.check(&Token::Minus) {
                        let (value, span) = self.expect_int("offset")?;
                        terms.push(MemTerm {
                            atom: Operand::Number { value, span },
                            scale: None,
                        });
                    } else {
                        break;
                    }
                }
                let end = self.expect(&Token::RBracket, "`+`, `-` or `]`")?;
                Ok(Operand::Memory {
                    terms,
                    span: start.to(end),
                })
            }
            Some(Token::Int(_) | Token::Minus) => {
                let (value, span) = self.expect_int("number")?;
                Ok(Operand::Number { value, span })
            }
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.bump();
                Ok(Operand::Name { name, span: start })
            }
            Some(Token::At) => {
                self.bump();
                let (name, end) = self.expect_ident("label name")?;
                Ok(Operand::Label {
                    name,
                    span: start.to(end),
                })
            }
            _ => Err(self.error("operand")),
        }
    }
}
