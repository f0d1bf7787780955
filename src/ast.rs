use std::fmt;
use std::rc::Rc;
use strum_macros::Display;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    #[strum(to_string = "+")]
    Add,
    #[strum(to_string = "-")]
    Subtract,
    #[strum(to_string = "*")]
    Multiply,
    #[strum(to_string = "/")]
    Divide,
    #[strum(to_string = "<")]
    Less,
    #[strum(to_string = "<=")]
    LessEqual,
    #[strum(to_string = ">")]
    Greater,
    #[strum(to_string = ">=")]
    GreaterEqual,
    #[strum(to_string = "==")]
    Equal,
    #[strum(to_string = "!=")]
    NotEqual,
    #[strum(to_string = "and")]
    And,
    #[strum(to_string = "or")]
    Or,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    #[strum(to_string = "-")]
    Negate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Number text as written; the evaluator decides Integer or Float.
    NumberLiteral(String),
    StringLiteral(String),
    BooleanLiteral(bool),
    Symbol(String),
    BinaryOp {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    PrefixOp {
        operator: PrefixOperator,
        operand: Box<Expression>,
    },
    /// `operator` is `None` for plain `=` and the combining operator for
    /// `+=`, `-=`, `*=` and `/=`.
    Assignment {
        target: Box<Expression>,
        operator: Option<BinaryOperator>,
        value: Box<Expression>,
    },
    ClassInstanceLiteral {
        class: String,
        fields: Vec<(String, Expression)>,
    },
    ArrayLiteral(Vec<Expression>),
    ArrayIndex {
        array: Box<Expression>,
        index: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    MemberAccess {
        object: Box<Expression>,
        member: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Named(String),
    Array(Box<Type>),
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Named(name) => write!(f, "{}", name),
            Type::Array(element) => write!(f, "[]{}", element),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub annotation: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub returns: Vec<Type>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub annotation: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    pub name: String,
    pub parameters: Vec<Type>,
    pub returns: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDeclaration {
    pub name: String,
    pub fields: Vec<Field>,
    pub methods: Vec<MethodSignature>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Block(Vec<Statement>),
    Expression(Expression),
    VariableDeclaration {
        names: Vec<String>,
        annotation: Option<Type>,
        initializer: Option<Expression>,
        constant: bool,
    },
    ClassDeclaration(ClassDeclaration),
    FunctionDeclaration(Rc<FunctionDeclaration>),
    Return(Vec<Expression>),
    If {
        condition: Expression,
        then_branch: Vec<Statement>,
        else_branch: Option<Vec<Statement>>,
    },
    While {
        conditions: Vec<Expression>,
        body: Vec<Statement>,
    },
    Import {
        name: String,
        path: String,
    },
    Print(Vec<Expression>),
}

fn parenthesize(f: &mut fmt::Formatter<'_>, name: &str, args: &[&Expression]) -> fmt::Result {
    write!(f, "({}", name)?;
    for arg in args {
        write!(f, " {}", arg)?;
    }
    write!(f, ")")
}

/// Renders an expression as a fully parenthesized prefix form, e.g.
/// `(+ 1 (* 2 3))`.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::NumberLiteral(text) => write!(f, "{}", text),
            Expression::StringLiteral(text) => write!(f, "\"{}\"", text),
            Expression::BooleanLiteral(value) => write!(f, "{}", value),
            Expression::Symbol(name) => write!(f, "{}", name),
            Expression::BinaryOp {
                left,
                operator,
                right,
            } => parenthesize(
                f,
                &operator.to_string(),
                &[left.as_ref(), right.as_ref()],
            ),
            Expression::PrefixOp { operator, operand } => {
                parenthesize(f, &operator.to_string(), &[operand.as_ref()])
            }
            Expression::Assignment {
                target,
                operator,
                value,
            } => {
                let name = match operator {
                    Some(op) => format!("{}=", op),
                    None => "=".to_string(),
                };
                parenthesize(f, &name, &[target.as_ref(), value.as_ref()])
            }
            Expression::ClassInstanceLiteral { class, fields } => {
                write!(f, "(new {}", class)?;
                for (name, value) in fields {
                    write!(f, " ({} {})", name, value)?;
                }
                write!(f, ")")
            }
            Expression::ArrayLiteral(elements) => {
                parenthesize(f, "array", &elements.iter().collect::<Vec<_>>())
            }
            Expression::ArrayIndex { array, index } => {
                parenthesize(f, "index", &[array.as_ref(), index.as_ref()])
            }
            Expression::Call { callee, arguments } => {
                let mut args = vec![callee.as_ref()];
                args.extend(arguments.iter());
                parenthesize(f, "call", &args)
            }
            Expression::MemberAccess { object, member } => {
                write!(f, "(. {} {})", object, member)
            }
        }
    }
}

#[cfg(test)]
mod ast_tests {
    use crate::ast::{BinaryOperator, Expression, PrefixOperator, Type};

    fn number(text: &str) -> Box<Expression> {
        Box::new(Expression::NumberLiteral(text.to_string()))
    }

    #[test]
    fn basic_ast_test() {
        let expression = Expression::BinaryOp {
            left: Box::new(Expression::PrefixOp {
                operator: PrefixOperator::Negate,
                operand: number("123"),
            }),
            operator: BinaryOperator::Multiply,
            right: number("45.67"),
        };
        assert_eq!(expression.to_string(), "(* (- 123) 45.67)");
    }

    #[test]
    fn compound_assignment_and_calls() {
        let expression = Expression::Assignment {
            target: Box::new(Expression::Symbol("x".to_string())),
            operator: Some(BinaryOperator::Add),
            value: Box::new(Expression::Call {
                callee: Box::new(Expression::MemberAccess {
                    object: Box::new(Expression::Symbol("p".to_string())),
                    member: "norm".to_string(),
                }),
                arguments: vec![Expression::StringLiteral("a".to_string())],
            }),
        };
        assert_eq!(expression.to_string(), "(+= x (call (. p norm) \"a\"))");
    }

    #[test]
    fn type_display() {
        let nested = Type::Array(Box::new(Type::Array(Box::new(Type::Named(
            "int".to_string(),
        )))));
        assert_eq!(nested.to_string(), "[][]int");
    }
}
