use thiserror::Error;

use super::{
    token::{KEYWORDS, ONE_SYMBOL_TOKENS, TWO_SYMBOLS_TOKENS},
    TokenKind,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

#[derive(Error, Debug, PartialEq)]
pub enum LexError {
    #[error("unexpected character '{ch}' at line {line}")]
    UnexpectedCharacter { ch: char, line: usize },

    #[error("integer literal {literal} does not fit in 32 bits at line {line}")]
    IntegerOverflow { literal: String, line: usize },

    #[error("comment opened at line {line} is never closed")]
    UnterminatedComment { line: usize },
}

#[derive(Debug)]
pub struct Lexer {
    tokens: Vec<Token>,
    index: usize,
    line: usize,
}

impl Lexer {
    fn new() -> Self {
        Self {
            tokens: vec![],
            index: 0,
            line: 1,
        }
    }

    fn new_token(&mut self, kind: TokenKind, len: usize) {
        self.tokens.push(Token {
            kind,
            line: self.line,
        });
        self.index += len;
    }

    fn parse_number(&mut self, chars: &[char]) -> Result<(), LexError> {
        let s: String = chars.iter().take_while(|c| c.is_ascii_digit()).collect();
        let value = s.parse().map_err(|_| LexError::IntegerOverflow {
            literal: s.clone(),
            line: self.line,
        })?;
        self.new_token(TokenKind::Num(value), s.len());
        Ok(())
    }

    fn parse_identifier(&mut self, chars: &[char]) {
        let s: String = chars
            .iter()
            .take_while(|&&c| c.is_ascii_alphanumeric() || c == '_')
            .collect();

        let len = s.len();
        if let Some(kind) = KEYWORDS.get(s.as_str()) {
            self.new_token(kind.clone(), len);
        } else {
            self.new_token(TokenKind::Ident(s), len);
        }
    }

    fn skip_comment(&mut self, chars: &[char]) -> Result<(), LexError> {
        let start_line = self.line;
        self.index += 2;
        while self.index + 1 < chars.len() {
            if chars[self.index] == '*' && chars[self.index + 1] == '/' {
                self.index += 2;
                return Ok(());
            }
            if chars[self.index] == '\n' {
                self.line += 1;
            }
            self.index += 1;
        }
        Err(LexError::UnterminatedComment { line: start_line })
    }

    fn _tokenize(&mut self, s: &str) -> Result<(), LexError> {
        let chars: Vec<_> = s.chars().collect();

        while self.index < chars.len() {
            let c = chars[self.index];
            let c2 = chars[self.index..].iter().take(2).collect::<String>();

            if c == '\n' {
                self.line += 1;
                self.index += 1;
            } else if c.is_whitespace() {
                self.index += 1;
            } else if c2 == "/*" {
                self.skip_comment(&chars)?;
            } else if c.is_ascii_digit() {
                self.parse_number(&chars[self.index..])?;
            } else if c.is_ascii_alphabetic() || c == '_' {
                self.parse_identifier(&chars[self.index..]);
            } else if let Some(kind) = TWO_SYMBOLS_TOKENS.get(c2.as_str()) {
                self.new_token(kind.clone(), 2);
            } else if let Some(kind) = ONE_SYMBOL_TOKENS.get(&c) {
                self.new_token(kind.clone(), 1);
            } else {
                return Err(LexError::UnexpectedCharacter {
                    ch: c,
                    line: self.line,
                });
            }
        }
        Ok(())
    }

    pub fn tokenize(s: &str) -> Result<Vec<Token>, LexError> {
        let mut lexer = Lexer::new();
        lexer._tokenize(s)?;

        Ok(lexer.tokens)
    }
}
