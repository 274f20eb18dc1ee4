use std::fmt;

use phf::phf_map;

pub static KEYWORDS: phf::Map<&str, TokenKind> = phf_map! {
    "int" => TokenKind::Int,
    "void" => TokenKind::Void,
    "if" => TokenKind::If,
    "else" => TokenKind::Else,
    "while" => TokenKind::While,
    "return" => TokenKind::Return,
};

pub static TWO_SYMBOLS_TOKENS: phf::Map<&str, TokenKind> = phf_map! {
    "<=" => TokenKind::LessEqual,
    ">=" => TokenKind::GreaterEqual,
    "==" => TokenKind::DoubleEqual,
    "!=" => TokenKind::NotEqual,
};

pub static ONE_SYMBOL_TOKENS: phf::Map<char, TokenKind> = phf_map! {
    '+' => TokenKind::Plus,
    '-' => TokenKind::Minus,
    '*' => TokenKind::Star,
    '/' => TokenKind::Slash,
    '<' => TokenKind::LessThan,
    '>' => TokenKind::GreaterThan,
    '=' => TokenKind::Equal,
    ';' => TokenKind::SemiColon,
    ',' => TokenKind::Comma,
    '(' => TokenKind::OpenParen,
    ')' => TokenKind::CloseParen,
    '[' => TokenKind::OpenSquareBrace,
    ']' => TokenKind::CloseSquareBrace,
    '{' => TokenKind::OpenCurlyBrace,
    '}' => TokenKind::CloseCurlyBrace,
};

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Num(i32),
    Ident(String),

    Int,
    Void,
    If,
    Else,
    While,
    Return,

    Plus,
    Minus,
    Star,
    Slash,

    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    DoubleEqual,
    NotEqual,

    Equal,
    SemiColon,
    Comma,
    OpenParen,
    CloseParen,
    OpenSquareBrace,
    CloseSquareBrace,
    OpenCurlyBrace,
    CloseCurlyBrace,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Num(num) => return write!(f, "number `{num}`"),
            TokenKind::Ident(name) => return write!(f, "identifier `{name}`"),
            TokenKind::Int => "int",
            TokenKind::Void => "void",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::Return => "return",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::LessThan => "<",
            TokenKind::LessEqual => "<=",
            TokenKind::GreaterThan => ">",
            TokenKind::GreaterEqual => ">=",
            TokenKind::DoubleEqual => "==",
            TokenKind::NotEqual => "!=",
            TokenKind::Equal => "=",
            TokenKind::SemiColon => ";",
            TokenKind::Comma => ",",
            TokenKind::OpenParen => "(",
            TokenKind::CloseParen => ")",
            TokenKind::OpenSquareBrace => "[",
            TokenKind::CloseSquareBrace => "]",
            TokenKind::OpenCurlyBrace => "{",
            TokenKind::CloseCurlyBrace => "}",
        };
        write!(f, "`{s}`")
    }
}
