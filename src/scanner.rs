use crate::token::{keyword_or_identifier, Token, TokenKind};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("[line {line}:{column}] Error: unrecognized input near '{found}'")]
    UnrecognizedInput {
        line: usize,
        column: usize,
        found: String,
    },
    #[error("[line {line}:{column}] Error: unterminated string")]
    UnterminatedString { line: usize, column: usize },
}

/// What a rule recognizes at the start of the remaining input.
#[derive(Debug, Clone, Copy)]
enum Pattern {
    Word,
    Number,
    Whitespace,
    Quoted,
    Comment,
    Literal(&'static str),
}

/// What to do with the recognized text.
#[derive(Debug, Clone, Copy)]
enum Action {
    Symbol,
    Number,
    Skip,
    String,
    Emit(TokenKind),
}

struct Rule {
    pattern: Pattern,
    action: Action,
}

macro_rules! rules {
    ($($pattern:expr => $action:expr),+ $(,)?) => {
        &[ $( Rule { pattern: $pattern, action: $action } ),+ ]
    };
}

// The first rule that matches wins, so multi-character operators must come
// before their single-character prefixes.
#[rustfmt::skip]
static RULES: &[Rule] = rules!(
    Pattern::Word          => Action::Symbol,
    Pattern::Number        => Action::Number,
    Pattern::Whitespace    => Action::Skip,
    Pattern::Quoted        => Action::String,
    Pattern::Comment       => Action::Skip,
    Pattern::Literal("<=") => Action::Emit(TokenKind::LessEqual),
    Pattern::Literal(">=") => Action::Emit(TokenKind::GreaterEqual),
    Pattern::Literal("==") => Action::Emit(TokenKind::EqualEqual),
    Pattern::Literal("!=") => Action::Emit(TokenKind::BangEqual),
    Pattern::Literal("+=") => Action::Emit(TokenKind::PlusEqual),
    Pattern::Literal("-=") => Action::Emit(TokenKind::MinusEqual),
    Pattern::Literal("*=") => Action::Emit(TokenKind::StarEqual),
    Pattern::Literal("/=") => Action::Emit(TokenKind::SlashEqual),
    Pattern::Literal(".")  => Action::Emit(TokenKind::Dot),
    Pattern::Literal("(")  => Action::Emit(TokenKind::LeftParen),
    Pattern::Literal(")")  => Action::Emit(TokenKind::RightParen),
    Pattern::Literal("{")  => Action::Emit(TokenKind::LeftBrace),
    Pattern::Literal("}")  => Action::Emit(TokenKind::RightBrace),
    Pattern::Literal("[")  => Action::Emit(TokenKind::LeftBracket),
    Pattern::Literal("]")  => Action::Emit(TokenKind::RightBracket),
    Pattern::Literal(",")  => Action::Emit(TokenKind::Comma),
    Pattern::Literal(";")  => Action::Emit(TokenKind::Semicolon),
    Pattern::Literal("<")  => Action::Emit(TokenKind::Less),
    Pattern::Literal(">")  => Action::Emit(TokenKind::Greater),
    Pattern::Literal("+")  => Action::Emit(TokenKind::Plus),
    Pattern::Literal("-")  => Action::Emit(TokenKind::Minus),
    Pattern::Literal("*")  => Action::Emit(TokenKind::Star),
    Pattern::Literal("/")  => Action::Emit(TokenKind::Slash),
    Pattern::Literal("=")  => Action::Emit(TokenKind::Equal),
    Pattern::Literal("!")  => Action::Emit(TokenKind::Bang),
);

impl Pattern {
    /// Length in bytes of the match at the start of `rest`, if any.
    fn matches(self, rest: &str) -> Option<usize> {
        let len = match self {
            Pattern::Word => {
                let mut chars = rest.char_indices();
                match chars.next() {
                    Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => chars
                        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
                        .map_or(rest.len(), |(idx, _)| idx),
                    _ => 0,
                }
            }
            Pattern::Number => {
                let digits = leading_digits(rest);
                if digits == 0 {
                    0
                } else if rest[digits..].starts_with('.') {
                    let fraction = leading_digits(&rest[digits + 1..]);
                    if fraction == 0 {
                        digits
                    } else {
                        digits + 1 + fraction
                    }
                } else {
                    digits
                }
            }
            Pattern::Whitespace => rest
                .char_indices()
                .find(|(_, c)| !c.is_whitespace())
                .map_or(rest.len(), |(idx, _)| idx),
            Pattern::Quoted => {
                if rest.starts_with('"') {
                    rest[1..].find('"').map_or(0, |end| end + 2)
                } else {
                    0
                }
            }
            Pattern::Comment => {
                if rest.starts_with("##") {
                    rest.find('\n').unwrap_or_else(|| rest.len())
                } else {
                    0
                }
            }
            Pattern::Literal(text) => {
                if rest.starts_with(text) {
                    text.len()
                } else {
                    0
                }
            }
        };
        if len > 0 {
            Some(len)
        } else {
            None
        }
    }
}

fn leading_digits(text: &str) -> usize {
    text.bytes().take_while(|b| b.is_ascii_digit()).count()
}

struct Scanner<'a> {
    source: &'a str,
    current: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut scanner = Scanner {
        source,
        current: 0,
        line: 1,
        column: 1,
        tokens: Vec::new(),
    };
    while scanner.current < scanner.source.len() {
        scanner.scan_token()?;
    }
    scanner
        .tokens
        .push(Token::new(TokenKind::Eof, "", scanner.line, scanner.column));
    tracing::debug!(count = scanner.tokens.len(), "tokenized source");
    Ok(scanner.tokens)
}

impl<'a> Scanner<'a> {
    fn scan_token(&mut self) -> Result<(), LexError> {
        let rest = &self.source[self.current..];
        for rule in RULES {
            if let Some(len) = rule.pattern.matches(rest) {
                let text = &rest[..len];
                match rule.action {
                    Action::Skip => (),
                    Action::Symbol => self.push(keyword_or_identifier(text), text),
                    Action::Number => self.push(TokenKind::Number, text),
                    Action::String => self.push(TokenKind::String, &text[1..len - 1]),
                    Action::Emit(kind) => self.push(kind, text),
                }
                self.advance(text);
                return Ok(());
            }
        }
        if rest.starts_with('"') {
            return Err(LexError::UnterminatedString {
                line: self.line,
                column: self.column,
            });
        }
        Err(LexError::UnrecognizedInput {
            line: self.line,
            column: self.column,
            found: rest.chars().take(16).collect(),
        })
    }

    fn push(&mut self, kind: TokenKind, text: &str) {
        self.tokens
            .push(Token::new(kind, text, self.line, self.column));
    }

    fn advance(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.current += text.len();
    }
}

#[cfg(test)]
mod scanner_tests {
    use crate::scanner::{tokenize, LexError};
    use crate::token::TokenKind;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn basic_scanner_test() {
        let tokens = tokenize("x = 2").unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "x");
        assert_eq!(tokens[1].kind, TokenKind::Equal);
        assert_eq!(tokens[2].kind, TokenKind::Number);
        assert_eq!(tokens[2].text, "2");
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn number_parsing() {
        let tokens = tokenize("1+2.5 3.").unwrap();
        assert_eq!(tokens[0].text, "1");
        assert_eq!(tokens[1].kind, TokenKind::Plus);
        assert_eq!(tokens[2].kind, TokenKind::Number);
        assert_eq!(tokens[2].text, "2.5");
        assert_eq!(tokens[3].text, "3");
        assert_eq!(tokens[4].kind, TokenKind::Dot);
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("var const function meow for while import classy"),
            vec![
                TokenKind::Var,
                TokenKind::Const,
                TokenKind::Function,
                TokenKind::Meow,
                TokenKind::For,
                TokenKind::While,
                TokenKind::Import,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_character_operators_win_over_prefixes() {
        assert_eq!(
            kinds("<= >= == != += -= *= /= < = !"),
            vec![
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::PlusEqual,
                TokenKind::MinusEqual,
                TokenKind::StarEqual,
                TokenKind::SlashEqual,
                TokenKind::Less,
                TokenKind::Equal,
                TokenKind::Bang,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn strings_drop_quotes_and_keep_contents() {
        let tokens = tokenize("\"hello ## not a comment\"").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "hello ## not a comment");
    }

    #[test]
    fn comments_and_whitespace_are_skipped() {
        let tokens = tokenize("## a comment\n  x ## trailing\ny").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "x");
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[0].column, 3);
        assert_eq!(tokens[1].text, "y");
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn unrecognized_input_is_fatal() {
        match tokenize("var x = 1;\nvar y = @;") {
            Err(LexError::UnrecognizedInput { line, column, found }) => {
                assert_eq!(line, 2);
                assert_eq!(column, 9);
                assert!(found.starts_with('@'));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn unterminated_string_is_fatal() {
        assert_eq!(
            tokenize("var s = \"oops;"),
            Err(LexError::UnterminatedString { line: 1, column: 9 })
        );
    }
}
