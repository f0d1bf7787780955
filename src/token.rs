use phf::phf_map;
use std::fmt;
use strum_macros::Display;

#[rustfmt::skip]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Single-character tokens.
    LeftParen, RightParen, LeftBrace, RightBrace, LeftBracket, RightBracket,
    Comma, Dot, Semicolon, Minus, Plus, Slash, Star, Bang,

    // One or two character tokens.
    Equal, EqualEqual, BangEqual,
    Greater, GreaterEqual,
    Less, LessEqual,
    PlusEqual, MinusEqual, StarEqual, SlashEqual,

    // Literals.
    Identifier, String, Number,

    // Keywords.
    And, Class, Const, Else, False, For, Function, If, Import,
    Meow, Or, Return, True, Var, While,

    Eof
}

pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "and" => TokenKind::And,
    "class" => TokenKind::Class,
    "const" => TokenKind::Const,
    "else" => TokenKind::Else,
    "false" => TokenKind::False,
    "for" => TokenKind::For,
    "function" => TokenKind::Function,
    "if" => TokenKind::If,
    "import" => TokenKind::Import,
    "meow" => TokenKind::Meow,
    "or" => TokenKind::Or,
    "return" => TokenKind::Return,
    "true" => TokenKind::True,
    "var" => TokenKind::Var,
    "while" => TokenKind::While,
};

/// Classifies a word as a keyword or a plain identifier.
pub fn keyword_or_identifier(word: &str) -> TokenKind {
    KEYWORDS.get(word).copied().unwrap_or(TokenKind::Identifier)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: &str, line: usize, column: usize) -> Token {
        Token {
            kind,
            text: text.to_string(),
            line,
            column,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<12} {}", self.kind.to_string(), self.text)
    }
}

#[cfg(test)]
mod token_tests {
    use crate::token::{keyword_or_identifier, Token, TokenKind};

    #[test]
    fn keywords_are_reserved() {
        assert_eq!(keyword_or_identifier("var"), TokenKind::Var);
        assert_eq!(keyword_or_identifier("meow"), TokenKind::Meow);
        assert_eq!(keyword_or_identifier("function"), TokenKind::Function);
        assert_eq!(keyword_or_identifier("variable"), TokenKind::Identifier);
        assert_eq!(keyword_or_identifier("print"), TokenKind::Identifier);
    }

    #[test]
    fn display_shows_kind_and_text() {
        let token = Token::new(TokenKind::Identifier, "x", 1, 1);
        assert_eq!(token.to_string().trim_end(), "Identifier   x");
        assert!(token.is(TokenKind::Identifier));
    }
}
