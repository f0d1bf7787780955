pub mod ast;
pub mod builtins;
pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod grammar;
pub mod interpreter;
pub mod module;
pub mod parser;
pub mod scanner;
pub mod token;
pub mod value;

pub use crate::error::{MeowError, RuntimeError};
pub use crate::interpreter::Interpreter;
pub use crate::value::Value;

use crate::ast::Program;
use crate::scanner::LexError;
use crate::token::Token;
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Installs a subscriber filtered by `RUST_LOG`. Does nothing when the
/// variable is unset, and nothing after the first call.
///
/// Events go to stderr because stdout carries the script's own output.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}

/// Runs a program against stdout.
pub fn run(source: &str) -> Result<(), MeowError> {
    Interpreter::new().run(source)
}

pub fn parse_and_dump(source: &str) -> Result<Program, MeowError> {
    let tokens = scanner::tokenize(source)?;
    let (program, _) = parser::parse(&tokens)?;
    Ok(program)
}

pub fn tokenize_and_dump(source: &str) -> Result<Vec<Token>, LexError> {
    scanner::tokenize(source)
}

#[cfg(test)]
mod lib_tests {
    use crate::ast::{Expression, Statement};
    use crate::token::TokenKind;
    use crate::{parse_and_dump, tokenize_and_dump, MeowError};
    use pretty_assertions::assert_eq;

    #[test]
    fn dumps() {
        let tokens = tokenize_and_dump("meow 1;").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|token| token.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Meow,
                TokenKind::Number,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );

        let program = parse_and_dump("meow 1;").unwrap();
        assert_eq!(
            program.statements,
            vec![Statement::Print(vec![Expression::NumberLiteral(
                "1".to_string()
            )])]
        );
    }

    #[test]
    fn parse_and_dump_reports_both_error_layers() {
        assert!(matches!(parse_and_dump("var x = @;"), Err(MeowError::Lex(_))));
        assert!(matches!(parse_and_dump("var x = ;"), Err(MeowError::Parse(_))));
    }

    #[test]
    fn parsing_is_deterministic() {
        let source = "function f(a int) (int) { return a * 2; } meow f(3);";
        assert_eq!(parse_and_dump(source).unwrap(), parse_and_dump(source).unwrap());
    }
}
