use crate::parser::ParseError;
use crate::scanner::LexError;
use crate::value::ValueKind;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("unknown class '{0}'")]
    UnknownClass(String),
    #[error("{owner} has no member '{member}'")]
    UnknownMember { owner: String, member: String },
    #[error("class {class} has no field '{field}'")]
    UnknownField { class: String, field: String },
    #[error("{0} is not callable")]
    NotCallable(String),
    #[error("cannot apply '{operator}' to {left} and {right}")]
    TypeMismatch {
        operator: String,
        left: ValueKind,
        right: ValueKind,
    },
    #[error("cannot apply prefix '{operator}' to {operand}")]
    BadOperand { operator: String, operand: ValueKind },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow in '{0}'")]
    IntegerOverflow(String),
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),
    #[error("index out of range: index {index} but length {length}")]
    IndexOutOfRange { index: i64, length: usize },
    #[error("index must be int but got {0}")]
    IndexKind(ValueKind),
    #[error("cannot index {0}")]
    NotIndexable(ValueKind),
    #[error("{name} expects {expected} argument(s) but got {found}")]
    WrongArity {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("argument {position} of {name} must be {expected} but got {found}")]
    ArgumentKind {
        name: String,
        position: usize,
        expected: String,
        found: String,
    },
    #[error("{name} must return {expected} value(s) but returned {found}")]
    ReturnArity {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("return value {position} of {name} must be {expected} but got {found}")]
    ReturnKind {
        name: String,
        position: usize,
        expected: String,
        found: String,
    },
    #[error("field {field} of class {class} must be {expected} but got {found}")]
    FieldKind {
        class: String,
        field: String,
        expected: String,
        found: String,
    },
    #[error("array of {expected} cannot hold {found}")]
    MixedArray { expected: ValueKind, found: ValueKind },
    #[error("invalid assignment target")]
    InvalidAssignmentTarget,
    #[error("cannot assign to constant '{0}'")]
    ConstantAssignment(String),
    #[error("cannot destructure {found} value(s) into {expected} name(s)")]
    Destructure { expected: usize, found: usize },
    #[error("'{name}' is declared {expected} but got {found}")]
    DeclarationKind {
        name: String,
        expected: String,
        found: String,
    },
    #[error("class {class} declares method {method} but no function {method} is defined")]
    MissingMethodDefinition { class: String, method: String },
    #[error("function {method} does not match its signature in class {class}: {reason}")]
    MethodSignature {
        class: String,
        method: String,
        reason: String,
    },
    #[error("maximum call depth of {0} exceeded")]
    StackOverflow(usize),
    #[error("module '{0}' imports itself")]
    CyclicImport(String),
    #[error("cannot read module '{path}': {source}")]
    ImportRead { path: String, source: io::Error },
    #[error("in module '{path}': {source}")]
    Import {
        path: String,
        source: Box<MeowError>,
    },
    #[error("cannot write output: {0}")]
    Output(#[from] io::Error),
}

/// Everything that can stop a script: a fatal lexical or structural error
/// before execution, or a runtime error during it.
#[derive(Debug, Error)]
pub enum MeowError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Runtime Error: {0}")]
    Runtime(#[from] RuntimeError),
}

#[cfg(test)]
mod error_tests {
    use crate::error::{MeowError, RuntimeError};
    use crate::scanner::LexError;
    use crate::value::ValueKind;

    #[test]
    fn messages() {
        let error = RuntimeError::IndexOutOfRange {
            index: 5,
            length: 3,
        };
        assert!(error.to_string().starts_with("index out of range"));
        let error = RuntimeError::TypeMismatch {
            operator: "+".to_string(),
            left: ValueKind::String,
            right: ValueKind::Integer,
        };
        assert_eq!(error.to_string(), "cannot apply '+' to string and int");
    }

    #[test]
    fn conversions_into_meow_error() {
        let error: MeowError = RuntimeError::DivisionByZero.into();
        assert_eq!(error.to_string(), "Runtime Error: division by zero");
        let error: MeowError = LexError::UnterminatedString { line: 2, column: 4 }.into();
        assert!(matches!(error, MeowError::Lex(_)));
    }
}
