//! Lexer: source text in, [`Token`]s out.
//!
//! [`Scanner`] is a fused iterator of `Result<Token<'a>>`.  Whitespace and
//! `//` comments never surface; every lexeme borrows from the input.  A bad
//! character or an unterminated string yields one `Err` and scanning carries
//! on, so a caller can collect every lexical error of a file in one pass.
//! The stream always closes with a single `EOF` token.
//!
//! # Example
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! let kinds: Vec<&str> = Scanner::new("var x = 1; // note")
//!     .filter_map(Result::ok)
//!     .map(|token| token.token_type.name())
//!     .collect();
//!
//! assert_eq!(kinds, ["VAR", "IDENTIFIER", "EQUAL", "NUMBER", "SEMICOLON", "EOF"]);
//! ```

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::{memchr, memchr_iter};
use phf::phf_map;
use std::iter::FusedIterator;

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "and"    => TokenType::AND,
    "class"  => TokenType::CLASS,
    "else"   => TokenType::ELSE,
    "false"  => TokenType::FALSE,
    "fun"    => TokenType::FUN,
    "for"    => TokenType::FOR,
    "if"     => TokenType::IF,
    "nil"    => TokenType::NIL,
    "or"     => TokenType::OR,
    "print"  => TokenType::PRINT,
    "return" => TokenType::RETURN,
    "super"  => TokenType::SUPER,
    "this"   => TokenType::THIS,
    "true"   => TokenType::TRUE,
    "var"    => TokenType::VAR,
    "while"  => TokenType::WHILE,
};

/// Cursor over one source text.  `start..pos` is the lexeme being built.
pub struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    start: usize,
    pos: usize,
    line: usize,
    finished: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        info!("Scanner created over {} bytes", text.len());

        Self {
            text,
            bytes: text.as_bytes(),
            start: 0,
            pos: 0,
            line: 1,
            finished: false,
        }
    }

    #[inline(always)]
    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Byte `offset` places past the cursor, or `0` beyond the input.
    #[inline(always)]
    fn peek_at(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn bump(&mut self) -> u8 {
        let b = self.peek_at(0);
        self.pos += 1;
        b
    }

    #[inline(always)]
    fn eat(&mut self, expected: u8) -> bool {
        let hit = !self.at_end() && self.peek_at(0) == expected;
        if hit {
            self.pos += 1;
        }
        hit
    }

    /// `two` if the next byte is `=`, else `one`.
    #[inline(always)]
    fn with_equal(&mut self, two: TokenType, one: TokenType) -> TokenType {
        if self.eat(b'=') {
            two
        } else {
            one
        }
    }

    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while !self.at_end() && pred(self.peek_at(0)) {
            self.pos += 1;
        }
    }

    fn lexeme(&self) -> &'a str {
        &self.text[self.start..self.pos]
    }

    /// Scan from `start`.  `Ok(None)` means trivia was consumed and nothing
    /// is to be emitted.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let kind = match self.bump() {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,

            b'!' => self.with_equal(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.with_equal(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.with_equal(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.with_equal(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'/' if self.eat(b'/') => {
                // the newline itself is left for the next call to count
                self.pos = match memchr(b'\n', &self.bytes[self.pos..]) {
                    Some(offset) => self.pos + offset,
                    None => self.bytes.len(),
                };
                return Ok(None);
            }
            b'/' => TokenType::SLASH,

            b' ' | b'\r' | b'\t' => return Ok(None),

            b'\n' => {
                self.line += 1;
                return Ok(None);
            }

            b'"' => self.string()?,

            b'0'..=b'9' => self.number()?,

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            other => {
                let c: char = self.text[self.start..]
                    .chars()
                    .next()
                    .unwrap_or(other as char);
                self.pos = self.start + c.len_utf8();

                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", c),
                ));
            }
        };

        Ok(Some(kind))
    }

    /// The opening quote is consumed.  Strings may span lines.
    fn string(&mut self) -> Result<TokenType> {
        let rest: &[u8] = &self.bytes[self.pos..];

        match memchr(b'"', rest) {
            Some(offset) => {
                let body: &str = &self.text[self.pos..self.pos + offset];

                self.line += memchr_iter(b'\n', body.as_bytes()).count();
                self.pos += offset + 1;

                Ok(TokenType::STRING(body.to_owned()))
            }

            None => {
                self.line += memchr_iter(b'\n', rest).count();
                self.pos = self.bytes.len();

                Err(LoxError::lex(self.line, "Unterminated string."))
            }
        }
    }

    /// Digits with an optional `.digits` tail; `1.` and `.1` are not numbers.
    fn number(&mut self) -> Result<TokenType> {
        self.eat_while(|b| b.is_ascii_digit());

        if self.peek_at(0) == b'.' && self.peek_at(1).is_ascii_digit() {
            self.pos += 1;
            self.eat_while(|b| b.is_ascii_digit());
        }

        let lexeme = self.lexeme();

        lexeme
            .parse::<f64>()
            .map(TokenType::NUMBER)
            .map_err(|_| LoxError::lex(self.line, format!("Invalid number: {}", lexeme)))
    }

    fn identifier(&mut self) -> TokenType {
        self.eat_while(|b| b.is_ascii_alphanumeric() || b == b'_');

        KEYWORDS
            .get(self.lexeme())
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.at_end() {
                if self.finished {
                    return None;
                }

                self.finished = true;
                debug!("Reached end of input at line {}", self.line);

                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            self.start = self.pos;

            match self.scan_token() {
                Ok(Some(kind)) => {
                    debug!("Scanned {} on line {}", kind.name(), self.line);

                    return Some(Ok(Token::new(kind, self.lexeme(), self.line)));
                }

                Ok(None) => continue,

                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
