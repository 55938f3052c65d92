// arturo-parser - Lexer for Arturo
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Lexer (tokenizer) for Arturo source code.
//!
//! Converts a source string into a stream of tokens. Words, labels,
//! literals and attributes are distinguished here by their sigils, so the
//! parser only has to assemble containers and paths.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use num_bigint::BigInt;

use crate::value::{ArturoSymbol, Color, VersionVal};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Delimiters
    LBracket, // [
    RBracket, // ]
    LParen,   // (
    RParen,   // )

    // Sugar openers
    DictStart,  // #[
    ArrayStart, // @[
    FuncStart,  // $[

    // Path separator
    Backslash, // \

    // Identifiers
    Word(String),           // name
    Label(String),          // name:
    Literal(String),        // 'name
    Attribute(String),      // .name
    AttributeLabel(String), // .name:
    TypeLit(String),        // :name

    // Literals
    Integer(i64),
    BigInteger(BigInt),
    Floating(f64),
    Version(VersionVal),
    Str(String),
    CharLit(char),
    ColorLit(Color),
    RegexLit(String),

    // Operator glyphs
    Sym(ArturoSymbol),
    SymLiteral(ArturoSymbol), // '+

    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::DictStart => write!(f, "#["),
            Token::ArrayStart => write!(f, "@["),
            Token::FuncStart => write!(f, "$["),
            Token::Backslash => write!(f, "\\"),
            Token::Word(s) => write!(f, "{}", s),
            Token::Label(s) => write!(f, "{}:", s),
            Token::Literal(s) => write!(f, "'{}", s),
            Token::Attribute(s) => write!(f, ".{}", s),
            Token::AttributeLabel(s) => write!(f, ".{}:", s),
            Token::TypeLit(s) => write!(f, ":{}", s),
            Token::Integer(n) => write!(f, "{}", n),
            Token::BigInteger(n) => write!(f, "{}", n),
            Token::Floating(n) => write!(f, "{}", n),
            Token::Version(v) => write!(f, "{}", v),
            Token::Str(s) => write!(f, "\"{}\"", s),
            Token::CharLit(c) => write!(f, "`{}`", c),
            Token::ColorLit(c) => write!(f, "{}", c),
            Token::RegexLit(p) => write!(f, "{{/{}/}}", p),
            Token::Sym(s) => write!(f, "{}", s),
            Token::SymLiteral(s) => write!(f, "'{}", s),
            Token::Eof => write!(f, "EOF"),
        }
    }
}

/// Lexer error with position information.
#[derive(Debug, Clone)]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (at {}:{})",
            self.message, self.line, self.column
        )
    }
}

impl std::error::Error for LexerError {}

/// The lexer converts source code into tokens.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    /// Whether the previous token could terminate an expression. Decides if
    /// `-` starts a negative literal or is the subtraction glyph.
    prev_was_value: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
            prev_was_value: false,
        }
    }

    /// Current line (1-indexed).
    pub fn line(&self) -> usize {
        self.line
    }

    /// Current column (1-indexed).
    pub fn column(&self) -> usize {
        self.column
    }

    /// Get the next token from the source.
    pub fn next_token(&mut self) -> Result<Token, LexerError> {
        self.skip_whitespace_and_comments();

        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        let token = match c {
            '[' => {
                self.advance();
                Token::LBracket
            }
            ']' => {
                self.advance();
                Token::RBracket
            }
            '(' => {
                self.advance();
                Token::LParen
            }
            ')' => {
                self.advance();
                Token::RParen
            }
            '\\' => {
                self.advance();
                Token::Backslash
            }
            '"' => self.read_string()?,
            '{' => self.read_curly()?,
            '`' => self.read_char()?,
            '\'' => self.read_quoted()?,
            ':' => self.read_type()?,
            '.' => self.read_dot()?,
            '#' => self.read_hash()?,
            '@' => self.read_at()?,
            '$' => self.read_dollar(),
            '0'..='9' => self.read_number(false)?,
            '-' => self.read_minus()?,
            _ if is_word_start(c) => self.read_word()?,
            _ => self.read_symbol()?,
        };

        self.prev_was_value = matches!(
            token,
            Token::Word(_)
                | Token::Integer(_)
                | Token::BigInteger(_)
                | Token::Floating(_)
                | Token::Version(_)
                | Token::Str(_)
                | Token::CharLit(_)
                | Token::ColorLit(_)
                | Token::RParen
                | Token::RBracket
        );

        Ok(token)
    }

    /// Collect all tokens, for tests and tooling.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if matches!(token, Token::Eof) {
                break;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(ch) = c {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        c
    }

    fn error(&self, message: impl Into<String>) -> LexerError {
        LexerError {
            message: message.into(),
            line: self.line,
            column: self.column,
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() || c == ',' => {
                    self.advance();
                }
                Some(';') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if is_word_continue(c) {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        name
    }

    fn read_word(&mut self) -> Result<Token, LexerError> {
        let name = self.read_identifier();
        if self.peek() == Some(':') {
            self.advance();
            Ok(Token::Label(name))
        } else {
            Ok(Token::Word(name))
        }
    }

    /// `'name`, `'a\b` (handled by the parser via Backslash) or `'+`.
    fn read_quoted(&mut self) -> Result<Token, LexerError> {
        self.advance(); // consume '
        match self.peek() {
            Some(c) if is_word_start(c) => Ok(Token::Literal(self.read_identifier())),
            Some(_) => {
                let sym = self.read_glyph()?;
                Ok(Token::SymLiteral(sym))
            }
            None => Err(self.error("Dangling quote at end of input")),
        }
    }

    fn read_type(&mut self) -> Result<Token, LexerError> {
        self.advance(); // consume :
        match self.peek() {
            Some(c) if is_word_start(c) => Ok(Token::TypeLit(self.read_identifier())),
            _ => Err(self.error("Expected type name after ':'")),
        }
    }

    /// `.name`, `.name:` or the `..` glyph.
    fn read_dot(&mut self) -> Result<Token, LexerError> {
        self.advance(); // consume .
        match self.peek() {
            Some('.') => {
                self.advance();
                Ok(Token::Sym(ArturoSymbol::DotDot))
            }
            Some(c) if is_word_start(c) => {
                let name = self.read_identifier();
                if self.peek() == Some(':') {
                    self.advance();
                    Ok(Token::AttributeLabel(name))
                } else {
                    Ok(Token::Attribute(name))
                }
            }
            _ => Err(self.error("Expected attribute name after '.'")),
        }
    }

    /// `#[` opens a dictionary block; `#` plus hex digits is a color.
    fn read_hash(&mut self) -> Result<Token, LexerError> {
        self.advance(); // consume #
        if self.peek() == Some('[') {
            self.advance();
            return Ok(Token::DictStart);
        }
        let mut hex = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_hexdigit() {
                hex.push(c);
                self.advance();
            } else {
                break;
            }
        }
        match Color::from_hex(&hex) {
            Some(color) => Ok(Token::ColorLit(color)),
            None => Err(self.error(format!("Invalid color literal: #{}", hex))),
        }
    }

    fn read_at(&mut self) -> Result<Token, LexerError> {
        self.advance(); // consume @
        if self.peek() == Some('[') {
            self.advance();
            Ok(Token::ArrayStart)
        } else {
            Err(self.error("Expected '[' after '@'"))
        }
    }

    fn read_dollar(&mut self) -> Token {
        self.advance(); // consume $
        if self.peek() == Some('[') {
            self.advance();
            Token::FuncStart
        } else {
            Token::Sym(ArturoSymbol::Dollar)
        }
    }

    fn read_minus(&mut self) -> Result<Token, LexerError> {
        // `x-1` subtracts; `x: -1` is a negative literal.
        let mut clone = self.chars.clone();
        clone.next();
        let next = clone.peek().copied();
        if !self.prev_was_value && matches!(next, Some('0'..='9')) {
            self.advance(); // consume -
            self.read_number(true)
        } else {
            self.read_symbol()
        }
    }

    fn read_number(&mut self, negative: bool) -> Result<Token, LexerError> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        // Fraction, version or plain integer.
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // consume .
            let mut second = String::new();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    second.push(c);
                    self.advance();
                } else {
                    break;
                }
            }

            if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
                // Three components: a version literal.
                self.advance();
                let mut third = String::new();
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        third.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
                let mut prerelease = None;
                if self.peek() == Some('-') {
                    self.advance();
                    let tag = self.read_identifier();
                    if tag.is_empty() {
                        return Err(self.error("Expected prerelease tag after '-'"));
                    }
                    prerelease = Some(tag);
                }
                if negative {
                    return Err(self.error("Version literals cannot be negative"));
                }
                let full = match &prerelease {
                    Some(tag) => format!("{}.{}.{}-{}", text, second, third, tag),
                    None => format!("{}.{}.{}", text, second, third),
                };
                return match VersionVal::parse(&full) {
                    Some(v) => Ok(Token::Version(v)),
                    None => Err(self.error(format!("Invalid version literal: {}", full))),
                };
            }

            let mut float_text = format!("{}.{}", text, second);
            if matches!(self.peek(), Some('e') | Some('E')) {
                float_text.push('e');
                self.advance();
                if matches!(self.peek(), Some('+') | Some('-')) {
                    float_text.push(self.advance().unwrap());
                }
                let mut any = false;
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        float_text.push(c);
                        self.advance();
                        any = true;
                    } else {
                        break;
                    }
                }
                if !any {
                    return Err(self.error("Invalid exponent in numeric literal"));
                }
            }
            let value: f64 = float_text
                .parse()
                .map_err(|_| self.error(format!("Invalid numeric literal: {}", float_text)))?;
            return Ok(Token::Floating(if negative { -value } else { value }));
        }

        match text.parse::<i64>() {
            Ok(value) => Ok(Token::Integer(if negative { -value } else { value })),
            Err(_) => {
                let big: BigInt = text
                    .parse()
                    .map_err(|_| self.error(format!("Invalid numeric literal: {}", text)))?;
                Ok(Token::BigInteger(if negative { -big } else { big }))
            }
        }
    }

    fn peek_second(&mut self) -> Option<char> {
        let mut clone = self.chars.clone();
        clone.next();
        clone.next()
    }

    fn read_string(&mut self) -> Result<Token, LexerError> {
        let start_line = self.line;
        let start_column = self.column;
        self.advance(); // consume "
        let mut text = String::new();
        loop {
            match self.advance() {
                Some('"') => return Ok(Token::Str(text)),
                Some('\\') => match self.advance() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some('0') => text.push('\0'),
                    Some('\\') => text.push('\\'),
                    Some('"') => text.push('"'),
                    Some(other) => {
                        return Err(self.error(format!("Invalid escape sequence: \\{}", other)));
                    }
                    None => {
                        return Err(LexerError {
                            message: "Unterminated string".to_string(),
                            line: start_line,
                            column: start_column,
                        });
                    }
                },
                Some(c) => text.push(c),
                None => {
                    return Err(LexerError {
                        message: "Unterminated string".to_string(),
                        line: start_line,
                        column: start_column,
                    });
                }
            }
        }
    }

    /// `{...}` verbatim strings and `{/.../}` regex literals.
    fn read_curly(&mut self) -> Result<Token, LexerError> {
        let start_line = self.line;
        let start_column = self.column;
        self.advance(); // consume {

        if self.peek() == Some('/') {
            self.advance();
            let mut pattern = String::new();
            loop {
                match self.advance() {
                    Some('/') if self.peek() == Some('}') => {
                        self.advance();
                        return Ok(Token::RegexLit(pattern));
                    }
                    Some(c) => pattern.push(c),
                    None => {
                        return Err(LexerError {
                            message: "Unterminated regex literal".to_string(),
                            line: start_line,
                            column: start_column,
                        });
                    }
                }
            }
        }

        let mut text = String::new();
        let mut depth = 1usize;
        loop {
            match self.advance() {
                Some('{') => {
                    depth += 1;
                    text.push('{');
                }
                Some('}') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(Token::Str(trim_verbatim(&text)));
                    }
                    text.push('}');
                }
                Some(c) => text.push(c),
                None => {
                    return Err(LexerError {
                        message: "Unterminated string".to_string(),
                        line: start_line,
                        column: start_column,
                    });
                }
            }
        }
    }

    fn read_char(&mut self) -> Result<Token, LexerError> {
        self.advance(); // consume `
        let c = match self.advance() {
            Some('\\') => match self.advance() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('r') => '\r',
                Some('0') => '\0',
                Some('\\') => '\\',
                Some('`') => '`',
                _ => return Err(self.error("Invalid character escape")),
            },
            Some(c) => c,
            None => return Err(self.error("Unterminated character literal")),
        };
        if self.advance() != Some('`') {
            return Err(self.error("Unterminated character literal"));
        }
        Ok(Token::CharLit(c))
    }

    fn read_symbol(&mut self) -> Result<Token, LexerError> {
        let sym = self.read_glyph()?;
        Ok(Token::Sym(sym))
    }

    fn read_glyph(&mut self) -> Result<ArturoSymbol, LexerError> {
        let c = self
            .peek()
            .ok_or_else(|| self.error("Expected a symbol"))?;
        self.advance();
        let sym = match c {
            '+' => ArturoSymbol::Plus,
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    ArturoSymbol::ArrowRight
                } else {
                    ArturoSymbol::Minus
                }
            }
            '*' => ArturoSymbol::Asterisk,
            '/' => {
                if self.peek() == Some('/') {
                    self.advance();
                    ArturoSymbol::DoubleSlash
                } else {
                    ArturoSymbol::Slash
                }
            }
            '%' => ArturoSymbol::Percent,
            '^' => ArturoSymbol::Caret,
            '=' => match self.peek() {
                Some('<') => {
                    self.advance();
                    ArturoSymbol::LessEqual
                }
                Some('>') => {
                    self.advance();
                    ArturoSymbol::FatArrow
                }
                _ => ArturoSymbol::Equal,
            },
            '<' => {
                if self.peek() == Some('>') {
                    self.advance();
                    ArturoSymbol::NotEqual
                } else {
                    ArturoSymbol::LessThan
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    ArturoSymbol::GreaterEqual
                } else {
                    ArturoSymbol::GreaterThan
                }
            }
            '|' => ArturoSymbol::Pipe,
            '&' => ArturoSymbol::Ampersand,
            '$' => ArturoSymbol::Dollar,
            other => return Err(self.error(format!("Unexpected character: '{}'", other))),
        };
        Ok(sym)
    }
}

/// A verbatim `{...}` string drops a single leading newline and trailing
/// whitespace-only tail, so block-style strings read naturally.
fn trim_verbatim(text: &str) -> String {
    let text = text.strip_prefix('\n').unwrap_or(text);
    text.trim_end().to_string()
}

fn is_word_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_word_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '?' || c == '!'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        Lexer::new(src).tokenize().expect("lexer error")
    }

    #[test]
    fn test_words_and_labels() {
        assert_eq!(
            lex("print x: 'y"),
            vec![
                Token::Word("print".into()),
                Token::Label("x".into()),
                Token::Literal("y".into()),
            ]
        );
    }

    #[test]
    fn test_attributes() {
        assert_eq!(
            lex(".binary .step: 2"),
            vec![
                Token::Attribute("binary".into()),
                Token::AttributeLabel("step".into()),
                Token::Integer(2),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(lex("42"), vec![Token::Integer(42)]);
        assert_eq!(lex("3.14"), vec![Token::Floating(3.14)]);
        assert_eq!(
            lex("1.2.3"),
            vec![Token::Version(VersionVal::parse("1.2.3").unwrap())]
        );
        assert_eq!(
            lex("123456789012345678901234567890"),
            vec![Token::BigInteger(
                "123456789012345678901234567890".parse().unwrap()
            )]
        );
    }

    #[test]
    fn test_negative_numbers_vs_subtraction() {
        assert_eq!(lex("-1"), vec![Token::Integer(-1)]);
        assert_eq!(
            lex("x-1"),
            vec![
                Token::Word("x".into()),
                Token::Sym(ArturoSymbol::Minus),
                Token::Integer(1),
            ]
        );
        assert_eq!(
            lex("x: -1"),
            vec![Token::Label("x".into()), Token::Integer(-1)]
        );
    }

    #[test]
    fn test_range_symbol() {
        assert_eq!(
            lex("1..3"),
            vec![
                Token::Integer(1),
                Token::Sym(ArturoSymbol::DotDot),
                Token::Integer(3),
            ]
        );
    }

    #[test]
    fn test_strings_and_chars() {
        assert_eq!(lex("\"a\\nb\""), vec![Token::Str("a\nb".into())]);
        assert_eq!(lex("`x`"), vec![Token::CharLit('x')]);
        assert_eq!(lex("{hello there}"), vec![Token::Str("hello there".into())]);
    }

    #[test]
    fn test_unterminated_string() {
        assert!(Lexer::new("\"abc").tokenize().is_err());
    }

    #[test]
    fn test_sugar_openers() {
        assert_eq!(
            lex("#[a: 1]"),
            vec![
                Token::DictStart,
                Token::Label("a".into()),
                Token::Integer(1),
                Token::RBracket,
            ]
        );
        assert_eq!(lex("@[")[0], Token::ArrayStart);
        assert_eq!(lex("$[")[0], Token::FuncStart);
    }

    #[test]
    fn test_color_literal() {
        assert_eq!(
            lex("#FF0000"),
            vec![Token::ColorLit(Color::rgb(255, 0, 0))]
        );
    }

    #[test]
    fn test_type_literal() {
        assert_eq!(lex(":integer"), vec![Token::TypeLit("integer".into())]);
    }

    #[test]
    fn test_multichar_symbols() {
        assert_eq!(
            lex("<> >= =< ->"),
            vec![
                Token::Sym(ArturoSymbol::NotEqual),
                Token::Sym(ArturoSymbol::GreaterEqual),
                Token::Sym(ArturoSymbol::LessEqual),
                Token::Sym(ArturoSymbol::ArrowRight),
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            lex("1 ; a comment\n2"),
            vec![Token::Integer(1), Token::Integer(2)]
        );
    }

    #[test]
    fn test_regex_literal() {
        assert_eq!(lex("{/[a-z]+/}"), vec![Token::RegexLit("[a-z]+".into())]);
    }
}
