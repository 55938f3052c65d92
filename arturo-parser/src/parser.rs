// arturo-parser - Parser for Arturo
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Parser for Arturo source code.
//!
//! Consumes the token stream and produces the root `Block` value. The AST is
//! itself a value: a block of tagged values. Sugar forms expand here:
//! `#[...]` becomes `dictionary [...]`, `@[...]` becomes `array [...]` and
//! `$[params][body]` becomes `function [params] [body]`.

use std::fmt;
use std::rc::Rc;

use crate::lexer::{Lexer, LexerError, Token};
use crate::value::{ArturoBlock, ArturoRegex, ArturoVal, TypeVal};

/// Parse error with position information.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, line: usize, column: usize) -> ParseError {
        ParseError {
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {}:{})", self.message, self.line, self.column)
    }
}

impl std::error::Error for ParseError {}

impl From<LexerError> for ParseError {
    fn from(e: LexerError) -> ParseError {
        ParseError {
            message: e.message,
            line: e.line,
            column: e.column,
        }
    }
}

/// The parser assembles tokens into the root block value.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<(Token, usize, usize)>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Parser<'a> {
        Parser {
            lexer: Lexer::new(source),
            peeked: None,
        }
    }

    /// Parse a whole source string into its root block.
    pub fn parse_str(source: &str) -> Result<ArturoBlock, ParseError> {
        Parser::new(source).parse_root()
    }

    /// Parse everything up to end of input.
    pub fn parse_root(&mut self) -> Result<ArturoBlock, ParseError> {
        let (items, lines) = self.read_values(None)?;
        Ok(ArturoBlock::with_lines(items, lines))
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn next(&mut self) -> Result<(Token, usize, usize), ParseError> {
        if let Some(entry) = self.peeked.take() {
            return Ok(entry);
        }
        let line = self.lexer.line();
        let column = self.lexer.column();
        let token = self.lexer.next_token()?;
        Ok((token, line, column))
    }

    fn peek(&mut self) -> Result<&Token, ParseError> {
        if self.peeked.is_none() {
            let line = self.lexer.line();
            let column = self.lexer.column();
            let token = self.lexer.next_token()?;
            self.peeked = Some((token, line, column));
        }
        Ok(&self.peeked.as_ref().unwrap().0)
    }

    /// Read values until the closing token (or end of input when `None`).
    /// Returns items with their source lines.
    fn read_values(
        &mut self,
        until: Option<&Token>,
    ) -> Result<(Vec<ArturoVal>, Vec<u32>), ParseError> {
        let mut items = Vec::new();
        let mut lines = Vec::new();
        loop {
            let (token, line, column) = self.next()?;
            match (&token, until) {
                (Token::Eof, None) => break,
                (Token::Eof, Some(closing)) => {
                    return Err(ParseError::new(
                        format!("Unterminated block: expected '{}'", closing),
                        line,
                        column,
                    ));
                }
                (t, Some(closing)) if *t == *closing => break,
                _ => {}
            }
            self.read_one(token, line, column, &mut items, &mut lines)?;
        }
        Ok((items, lines))
    }

    /// Turn one token into one or more values, handling sugar and paths.
    fn read_one(
        &mut self,
        token: Token,
        line: usize,
        column: usize,
        items: &mut Vec<ArturoVal>,
        lines: &mut Vec<u32>,
    ) -> Result<(), ParseError> {
        let mut push = |v: ArturoVal, items: &mut Vec<ArturoVal>, lines: &mut Vec<u32>| {
            items.push(v);
            lines.push(line as u32);
        };

        match token {
            Token::LBracket => {
                let (inner, inner_lines) = self.read_values(Some(&Token::RBracket))?;
                push(
                    ArturoVal::Block(ArturoBlock::with_lines(inner, inner_lines)),
                    items,
                    lines,
                );
            }
            Token::LParen => {
                let (inner, inner_lines) = self.read_values(Some(&Token::RParen))?;
                push(
                    ArturoVal::Inline(ArturoBlock::with_lines(inner, inner_lines)),
                    items,
                    lines,
                );
            }
            Token::DictStart => {
                let (inner, inner_lines) = self.read_values(Some(&Token::RBracket))?;
                push(ArturoVal::word("dictionary"), items, lines);
                push(
                    ArturoVal::Block(ArturoBlock::with_lines(inner, inner_lines)),
                    items,
                    lines,
                );
            }
            Token::ArrayStart => {
                let (inner, inner_lines) = self.read_values(Some(&Token::RBracket))?;
                push(ArturoVal::word("array"), items, lines);
                push(
                    ArturoVal::Block(ArturoBlock::with_lines(inner, inner_lines)),
                    items,
                    lines,
                );
            }
            Token::FuncStart => {
                let (params, param_lines) = self.read_values(Some(&Token::RBracket))?;
                let (next, nline, ncolumn) = self.next()?;
                if next != Token::LBracket {
                    return Err(ParseError::new(
                        "Expected a body block after function parameters",
                        nline,
                        ncolumn,
                    ));
                }
                let (body, body_lines) = self.read_values(Some(&Token::RBracket))?;
                push(ArturoVal::word("function"), items, lines);
                push(
                    ArturoVal::Block(ArturoBlock::with_lines(params, param_lines)),
                    items,
                    lines,
                );
                push(
                    ArturoVal::Block(ArturoBlock::with_lines(body, body_lines)),
                    items,
                    lines,
                );
            }
            Token::Word(name) => {
                let value = self.maybe_path(ArturoVal::word(&name), false)?;
                push(value, items, lines);
            }
            Token::Literal(name) => {
                let value = self.maybe_path(ArturoVal::literal(&name), true)?;
                push(value, items, lines);
            }
            Token::Label(name) => push(ArturoVal::label(&name), items, lines),
            Token::Attribute(name) => push(ArturoVal::attribute(&name), items, lines),
            Token::AttributeLabel(name) => {
                push(ArturoVal::AttributeLabel(Rc::from(name.as_str())), items, lines)
            }
            Token::TypeLit(name) => {
                push(ArturoVal::Type(TypeVal::from_name(&name)), items, lines)
            }
            Token::Integer(n) => push(ArturoVal::Integer(n), items, lines),
            Token::BigInteger(n) => push(ArturoVal::big_integer(n), items, lines),
            Token::Floating(x) => push(ArturoVal::Floating(x), items, lines),
            Token::Version(v) => push(ArturoVal::Version(Rc::new(v)), items, lines),
            Token::Str(s) => push(ArturoVal::string(&s), items, lines),
            Token::CharLit(c) => push(ArturoVal::Char(c), items, lines),
            Token::ColorLit(c) => push(ArturoVal::Color(c), items, lines),
            Token::RegexLit(pattern) => {
                let regex = ArturoRegex::new(&pattern).map_err(|e| {
                    ParseError::new(format!("Invalid regex literal: {}", e), line, column)
                })?;
                push(ArturoVal::Regex(regex), items, lines);
            }
            Token::Sym(s) => push(ArturoVal::Symbol(s), items, lines),
            Token::SymLiteral(s) => push(ArturoVal::SymbolLiteral(s), items, lines),
            Token::Backslash => {
                return Err(ParseError::new(
                    "A path separator needs a preceding word",
                    line,
                    column,
                ));
            }
            Token::RBracket => {
                return Err(ParseError::new("Unexpected ']'", line, column));
            }
            Token::RParen => {
                return Err(ParseError::new("Unexpected ')'", line, column));
            }
            Token::Eof => {}
        }
        Ok(())
    }

    /// After a word or literal, fold `\`-separated segments into a path.
    ///
    /// `a\b\0` is a `Path`, `a\b:` a `PathLabel`, and `'a\b` a `PathLiteral`.
    fn maybe_path(&mut self, head: ArturoVal, quoted: bool) -> Result<ArturoVal, ParseError> {
        if *self.peek()? != Token::Backslash {
            return Ok(head);
        }

        // The quote belongs to the path tag, not to its first segment.
        let head = if quoted {
            match head {
                ArturoVal::Literal(name) => ArturoVal::Word(name),
                other => other,
            }
        } else {
            head
        };
        let mut segments = vec![head];
        let mut is_label = false;
        while *self.peek()? == Token::Backslash {
            self.next()?; // consume backslash
            let (token, line, column) = self.next()?;
            match token {
                Token::Word(name) => segments.push(ArturoVal::word(&name)),
                Token::Label(name) => {
                    segments.push(ArturoVal::word(&name));
                    is_label = true;
                    break;
                }
                Token::Integer(n) => segments.push(ArturoVal::Integer(n)),
                Token::LParen => {
                    let (inner, inner_lines) = self.read_values(Some(&Token::RParen))?;
                    segments.push(ArturoVal::Inline(ArturoBlock::with_lines(
                        inner,
                        inner_lines,
                    )));
                }
                other => {
                    return Err(ParseError::new(
                        format!("Invalid path segment: '{}'", other),
                        line,
                        column,
                    ));
                }
            }
        }

        let segments = Rc::new(segments);
        Ok(if is_label {
            ArturoVal::PathLabel(segments)
        } else if quoted {
            ArturoVal::PathLiteral(segments)
        } else {
            ArturoVal::Path(segments)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ArturoSymbol;

    fn parse(src: &str) -> Vec<ArturoVal> {
        Parser::parse_str(src).expect("parse error").to_vec()
    }

    #[test]
    fn test_flat_statement() {
        let items = parse("print \"Hello world!\"");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], ArturoVal::word("print"));
        assert_eq!(items[1], ArturoVal::string("Hello world!"));
    }

    #[test]
    fn test_nested_blocks() {
        let items = parse("loop 1..3 'x [print x]");
        assert_eq!(items.len(), 6);
        assert_eq!(items[1], ArturoVal::Integer(1));
        assert_eq!(items[2], ArturoVal::Symbol(ArturoSymbol::DotDot));
        assert_eq!(items[4], ArturoVal::literal("x"));
        match &items[5] {
            ArturoVal::Block(b) => assert_eq!(b.len(), 2),
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn test_function_sugar() {
        let items = parse("f: $[x][x]");
        assert_eq!(items[0], ArturoVal::label("f"));
        assert_eq!(items[1], ArturoVal::word("function"));
        assert!(matches!(items[2], ArturoVal::Block(_)));
        assert!(matches!(items[3], ArturoVal::Block(_)));
    }

    #[test]
    fn test_dict_sugar() {
        let items = parse("#[a: 1]");
        assert_eq!(items[0], ArturoVal::word("dictionary"));
        match &items[1] {
            ArturoVal::Block(b) => {
                assert_eq!(b.get(0).unwrap(), ArturoVal::label("a"));
                assert_eq!(b.get(1).unwrap(), ArturoVal::Integer(1));
            }
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn test_inline() {
        let items = parse("(add 1 2)");
        match &items[0] {
            ArturoVal::Inline(b) => assert_eq!(b.len(), 3),
            other => panic!("expected inline, got {:?}", other),
        }
    }

    #[test]
    fn test_paths() {
        let items = parse("user\\name");
        match &items[0] {
            ArturoVal::Path(p) => {
                assert_eq!(p[0], ArturoVal::word("user"));
                assert_eq!(p[1], ArturoVal::word("name"));
            }
            other => panic!("expected path, got {:?}", other),
        }

        let items = parse("user\\name: \"Jane\"");
        assert!(matches!(items[0], ArturoVal::PathLabel(_)));

        let items = parse("'user\\name");
        assert!(matches!(items[0], ArturoVal::PathLiteral(_)));
    }

    #[test]
    fn test_unterminated_block() {
        assert!(Parser::parse_str("[1 2").is_err());
        assert!(Parser::parse_str("(1 2").is_err());
    }

    #[test]
    fn test_type_literals() {
        let items = parse("to :integer \"2020\"");
        assert_eq!(items[0], ArturoVal::word("to"));
        match &items[1] {
            ArturoVal::Type(t) => assert_eq!(t.name(), "integer"),
            other => panic!("expected type, got {:?}", other),
        }
    }

    #[test]
    fn test_line_tracking() {
        let block = Parser::parse_str("a\nb\nc").unwrap();
        let lines = block.inner().lines.borrow().clone();
        assert_eq!(lines, vec![1, 2, 3]);
    }
}
