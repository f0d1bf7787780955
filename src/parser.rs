use crate::ast::{
    BinaryOperator, ClassDeclaration, Expression, Field, FunctionDeclaration, MethodSignature,
    Parameter, PrefixOperator, Program, Statement, Type,
};
use crate::grammar::{BindingPower, Grammar};
use crate::token::{Token, TokenKind};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("[line {line}:{column}] Parse Error: expected {expected} but found {found}")]
    Expected {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },
    #[error("[line {line}:{column}] Parse Error: expected expression but found {found}")]
    ExpectedExpression {
        found: String,
        line: usize,
        column: usize,
    },
    #[error("[line {line}:{column}] Parse Error: expected type but found {found}")]
    ExpectedType {
        found: String,
        line: usize,
        column: usize,
    },
    #[error("[line {line}:{column}] Parse Error: duplicate member '{name}' in class {class}")]
    DuplicateMember {
        class: String,
        name: String,
        line: usize,
        column: usize,
    },
    #[error("[line {line}:{column}] Parse Error: declaration needs a type or an initializer")]
    MissingTypeOrInitializer { line: usize, column: usize },
    #[error("[line {line}:{column}] Parse Error: nesting deeper than {limit} levels")]
    TooDeeplyNested {
        limit: usize,
        line: usize,
        column: usize,
    },
}

/// How deep statements and expressions may nest, counting each operator
/// applied to an operand as one level.
pub const MAX_NESTING: usize = 256;

/// A problem that does not stop parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[line {}:{}] Warning: {}",
            self.line, self.column, self.message
        )
    }
}

static EOF: Token = Token {
    kind: TokenKind::Eof,
    text: String::new(),
    line: 0,
    column: 0,
};

fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Eof => "end of input".to_string(),
        TokenKind::String => format!("\"{}\"", token.text),
        _ => format!("'{}'", token.text),
    }
}

pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    grammar: &'a Grammar,
    diagnostics: Vec<Diagnostic>,
    depth: usize,
}

pub fn parse(tokens: &[Token]) -> Result<(Program, Vec<Diagnostic>), ParseError> {
    parse_with(&Grammar::new(), tokens)
}

pub fn parse_with(
    grammar: &Grammar,
    tokens: &[Token],
) -> Result<(Program, Vec<Diagnostic>), ParseError> {
    let mut parser = Parser::new(grammar, tokens);
    let statements = parser.statements_until(TokenKind::Eof)?;
    tracing::debug!(
        statements = statements.len(),
        diagnostics = parser.diagnostics.len(),
        "parsed program"
    );
    Ok((Program { statements }, parser.diagnostics))
}

impl<'a> Parser<'a> {
    pub fn new(grammar: &'a Grammar, tokens: &'a [Token]) -> Parser<'a> {
        Parser {
            tokens,
            current: 0,
            grammar,
            diagnostics: Vec::new(),
            depth: 0,
        }
    }

    fn peek(&self) -> &'a Token {
        self.tokens.get(self.current).unwrap_or(&EOF)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().is(kind)
    }

    fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn advance_if(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> Result<&'a Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.peek();
            Err(ParseError::Expected {
                expected: expected.to_string(),
                found: describe(found),
                line: found.line,
                column: found.column,
            })
        }
    }

    fn identifier(&mut self, what: &str) -> Result<String, ParseError> {
        Ok(self.consume(TokenKind::Identifier, what)?.text.clone())
    }

    fn warn(&mut self, token: &Token, message: &str) {
        let diagnostic = Diagnostic {
            message: message.to_string(),
            line: token.line,
            column: token.column,
        };
        tracing::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn nest(&mut self, token: &Token) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::TooDeeplyNested {
                limit: MAX_NESTING,
                line: token.line,
                column: token.column,
            });
        }
        self.depth += 1;
        Ok(())
    }

    /// Parses an expression whose infix operators all bind tighter than
    /// `threshold`.
    pub fn expression(&mut self, threshold: BindingPower) -> Result<Expression, ParseError> {
        let depth = self.depth;
        let result = self.pratt(threshold);
        self.depth = depth;
        result
    }

    fn pratt(&mut self, threshold: BindingPower) -> Result<Expression, ParseError> {
        let token = self.advance();
        self.nest(token)?;
        let prefix = match self.grammar.prefix_rule(token.kind) {
            Some(handler) => handler,
            None => {
                return Err(ParseError::ExpectedExpression {
                    found: describe(token),
                    line: token.line,
                    column: token.column,
                })
            }
        };
        let mut left = prefix(self, token)?;
        while let Some((power, infix)) = self.grammar.infix_rule(self.peek().kind) {
            if power <= threshold {
                break;
            }
            let token = self.advance();
            self.nest(token)?;
            left = infix(self, left, token)?;
        }
        Ok(left)
    }

    pub fn parse_type(&mut self) -> Result<Type, ParseError> {
        let token = self.advance();
        match self.grammar.type_rule(token.kind) {
            Some(handler) => handler(self, token),
            None => Err(ParseError::ExpectedType {
                found: describe(token),
                line: token.line,
                column: token.column,
            }),
        }
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        let depth = self.depth;
        let token = self.peek();
        let result = self.nest(token).and_then(|_| self.statement_body());
        self.depth = depth;
        result
    }

    fn statement_body(&mut self) -> Result<Statement, ParseError> {
        if let Some(handler) = self.grammar.statement_rule(self.peek().kind) {
            let token = self.advance();
            return handler(self, token);
        }
        let expression = self.expression(BindingPower::Default)?;
        self.consume(TokenKind::Semicolon, "';' after expression")?;
        Ok(Statement::Expression(expression))
    }

    fn statements_until(&mut self, end: TokenKind) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        let mut returned = false;
        let mut warned_unreachable = false;
        while !self.check(end) && !self.is_at_end() {
            let start = self.peek();
            if self.advance_if(TokenKind::Semicolon) {
                self.warn(start, "empty statement");
                continue;
            }
            let statement = self.statement()?;
            if returned && !warned_unreachable {
                self.warn(start, "unreachable statement after return");
                warned_unreachable = true;
            }
            if let Statement::Return(_) = statement {
                returned = true;
            }
            statements.push(statement);
        }
        Ok(statements)
    }

    fn block(&mut self) -> Result<Vec<Statement>, ParseError> {
        self.consume(TokenKind::LeftBrace, "'{' before block")?;
        let statements = self.statements_until(TokenKind::RightBrace)?;
        self.consume(TokenKind::RightBrace, "'}' after block")?;
        Ok(statements)
    }

    /// Items separated by commas up to and including `close`. A trailing
    /// comma is allowed.
    fn delimited<T, F>(
        &mut self,
        close: TokenKind,
        what: &str,
        mut item: F,
    ) -> Result<Vec<T>, ParseError>
    where
        F: FnMut(&mut Parser<'a>) -> Result<T, ParseError>,
    {
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(item(self)?);
            if !self.advance_if(TokenKind::Comma) {
                break;
            }
        }
        self.consume(close, what)?;
        Ok(items)
    }

    /// Expressions separated by commas, each parsed at the comma threshold.
    fn expression_list(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut expressions = vec![self.expression(BindingPower::Comma)?];
        while self.advance_if(TokenKind::Comma) {
            expressions.push(self.expression(BindingPower::Comma)?);
        }
        Ok(expressions)
    }

    fn optional_semicolon(&mut self) {
        self.advance_if(TokenKind::Semicolon);
    }
}

pub(crate) fn number(_: &mut Parser<'_>, token: &Token) -> Result<Expression, ParseError> {
    Ok(Expression::NumberLiteral(token.text.clone()))
}

pub(crate) fn string(_: &mut Parser<'_>, token: &Token) -> Result<Expression, ParseError> {
    Ok(Expression::StringLiteral(token.text.clone()))
}

pub(crate) fn boolean(_: &mut Parser<'_>, token: &Token) -> Result<Expression, ParseError> {
    Ok(Expression::BooleanLiteral(token.is(TokenKind::True)))
}

pub(crate) fn symbol(_: &mut Parser<'_>, token: &Token) -> Result<Expression, ParseError> {
    Ok(Expression::Symbol(token.text.clone()))
}

pub(crate) fn grouping(parser: &mut Parser<'_>, _: &Token) -> Result<Expression, ParseError> {
    let expression = parser.expression(BindingPower::Default)?;
    parser.consume(TokenKind::RightParen, "')' after expression")?;
    Ok(expression)
}

pub(crate) fn array(parser: &mut Parser<'_>, _: &Token) -> Result<Expression, ParseError> {
    let elements = parser.delimited(TokenKind::RightBracket, "']' after array elements", |p| {
        p.expression(BindingPower::Comma)
    })?;
    Ok(Expression::ArrayLiteral(elements))
}

pub(crate) fn negation(parser: &mut Parser<'_>, _: &Token) -> Result<Expression, ParseError> {
    let operand = parser.expression(BindingPower::Unary)?;
    Ok(Expression::PrefixOp {
        operator: PrefixOperator::Negate,
        operand: Box::new(operand),
    })
}

/// `!!Name(field = value, ...)`
pub(crate) fn class_instance(parser: &mut Parser<'_>, _: &Token) -> Result<Expression, ParseError> {
    parser.consume(TokenKind::Bang, "'!!' before class name")?;
    let class = parser.identifier("class name")?;
    parser.consume(TokenKind::LeftParen, "'(' after class name")?;
    let fields = parser.delimited(TokenKind::RightParen, "')' after fields", |p| {
        let name = p.identifier("field name")?;
        p.consume(TokenKind::Equal, "'=' after field name")?;
        let value = p.expression(BindingPower::Assignment)?;
        Ok((name, value))
    })?;
    Ok(Expression::ClassInstanceLiteral { class, fields })
}

pub(crate) fn binary(
    parser: &mut Parser<'_>,
    left: Expression,
    token: &Token,
) -> Result<Expression, ParseError> {
    let operator = match token.kind {
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Minus => BinaryOperator::Subtract,
        TokenKind::Star => BinaryOperator::Multiply,
        TokenKind::Slash => BinaryOperator::Divide,
        TokenKind::Less => BinaryOperator::Less,
        TokenKind::LessEqual => BinaryOperator::LessEqual,
        TokenKind::Greater => BinaryOperator::Greater,
        TokenKind::GreaterEqual => BinaryOperator::GreaterEqual,
        TokenKind::EqualEqual => BinaryOperator::Equal,
        TokenKind::BangEqual => BinaryOperator::NotEqual,
        TokenKind::And => BinaryOperator::And,
        TokenKind::Or => BinaryOperator::Or,
        _ => unreachable!("binary handler registered for {}", token.kind),
    };
    let power = parser.grammar.binding_power(token.kind);
    let right = parser.expression(power)?;
    Ok(Expression::BinaryOp {
        left: Box::new(left),
        operator,
        right: Box::new(right),
    })
}

pub(crate) fn assignment(
    parser: &mut Parser<'_>,
    target: Expression,
    token: &Token,
) -> Result<Expression, ParseError> {
    let operator = match token.kind {
        TokenKind::PlusEqual => Some(BinaryOperator::Add),
        TokenKind::MinusEqual => Some(BinaryOperator::Subtract),
        TokenKind::StarEqual => Some(BinaryOperator::Multiply),
        TokenKind::SlashEqual => Some(BinaryOperator::Divide),
        _ => None,
    };
    let value = parser.expression(BindingPower::Assignment.lower())?;
    Ok(Expression::Assignment {
        target: Box::new(target),
        operator,
        value: Box::new(value),
    })
}

pub(crate) fn call(
    parser: &mut Parser<'_>,
    callee: Expression,
    _: &Token,
) -> Result<Expression, ParseError> {
    let arguments = parser.delimited(TokenKind::RightParen, "')' after arguments", |p| {
        p.expression(BindingPower::Comma)
    })?;
    Ok(Expression::Call {
        callee: Box::new(callee),
        arguments,
    })
}

pub(crate) fn index(
    parser: &mut Parser<'_>,
    array: Expression,
    _: &Token,
) -> Result<Expression, ParseError> {
    let index = parser.expression(BindingPower::Default)?;
    parser.consume(TokenKind::RightBracket, "']' after index")?;
    Ok(Expression::ArrayIndex {
        array: Box::new(array),
        index: Box::new(index),
    })
}

pub(crate) fn member(
    parser: &mut Parser<'_>,
    object: Expression,
    _: &Token,
) -> Result<Expression, ParseError> {
    let member = parser.identifier("member name after '.'")?;
    Ok(Expression::MemberAccess {
        object: Box::new(object),
        member,
    })
}

/// `var a, b [type] [= value];` and the same with `const`.
pub(crate) fn variable_declaration(
    parser: &mut Parser<'_>,
    token: &Token,
) -> Result<Statement, ParseError> {
    let mut names = vec![parser.identifier("variable name")?];
    while parser.advance_if(TokenKind::Comma) {
        names.push(parser.identifier("variable name")?);
    }
    let annotation = if parser.advance_if(TokenKind::Equal) {
        None
    } else {
        let annotation = match parser.grammar.type_rule(parser.peek().kind) {
            Some(_) => Some(parser.parse_type()?),
            None => None,
        };
        if !parser.advance_if(TokenKind::Equal) {
            if annotation.is_none() {
                return Err(ParseError::MissingTypeOrInitializer {
                    line: token.line,
                    column: token.column,
                });
            }
            parser.consume(TokenKind::Semicolon, "';' after variable declaration")?;
            return Ok(Statement::VariableDeclaration {
                names,
                annotation,
                initializer: None,
                constant: token.is(TokenKind::Const),
            });
        }
        annotation
    };
    let initializer = parser.expression(BindingPower::Default)?;
    parser.consume(TokenKind::Semicolon, "';' after variable declaration")?;
    Ok(Statement::VariableDeclaration {
        names,
        annotation,
        initializer: Some(initializer),
        constant: token.is(TokenKind::Const),
    })
}

/// `class Name(type field, rettype method(ptype, ...), ...)`
pub(crate) fn class_declaration(
    parser: &mut Parser<'_>,
    _: &Token,
) -> Result<Statement, ParseError> {
    let name = parser.identifier("class name")?;
    parser.consume(TokenKind::LeftParen, "'(' after class name")?;
    let mut seen = HashSet::new();
    let mut fields = Vec::new();
    let mut methods = Vec::new();
    while !parser.check(TokenKind::RightParen) {
        let annotation = parser.parse_type()?;
        let member = parser.consume(TokenKind::Identifier, "member name")?;
        if !seen.insert(member.text.clone()) {
            return Err(ParseError::DuplicateMember {
                class: name,
                name: member.text.clone(),
                line: member.line,
                column: member.column,
            });
        }
        if parser.advance_if(TokenKind::LeftParen) {
            let parameters = parser.delimited(
                TokenKind::RightParen,
                "')' after method parameter types",
                |p| p.parse_type(),
            )?;
            methods.push(MethodSignature {
                name: member.text.clone(),
                parameters,
                returns: annotation,
            });
        } else {
            fields.push(Field {
                name: member.text.clone(),
                annotation,
            });
        }
        if !parser.advance_if(TokenKind::Comma) {
            break;
        }
    }
    parser.consume(TokenKind::RightParen, "')' after class members")?;
    parser.optional_semicolon();
    Ok(Statement::ClassDeclaration(ClassDeclaration {
        name,
        fields,
        methods,
    }))
}

/// `function name(p type, ...) [(rettype, ...)] { body }`
pub(crate) fn function_declaration(
    parser: &mut Parser<'_>,
    _: &Token,
) -> Result<Statement, ParseError> {
    let name = parser.identifier("function name")?;
    parser.consume(TokenKind::LeftParen, "'(' after function name")?;
    let parameters = parser.delimited(TokenKind::RightParen, "')' after parameters", |p| {
        let name = p.identifier("parameter name")?;
        let annotation = p.parse_type()?;
        Ok(Parameter { name, annotation })
    })?;
    let returns = if parser.advance_if(TokenKind::LeftParen) {
        parser.delimited(TokenKind::RightParen, "')' after return types", |p| {
            p.parse_type()
        })?
    } else {
        Vec::new()
    };
    let body = parser.block()?;
    parser.optional_semicolon();
    Ok(Statement::FunctionDeclaration(Rc::new(FunctionDeclaration {
        name,
        parameters,
        returns,
        body,
    })))
}

pub(crate) fn return_statement(
    parser: &mut Parser<'_>,
    _: &Token,
) -> Result<Statement, ParseError> {
    let values = if parser.check(TokenKind::Semicolon) {
        Vec::new()
    } else {
        parser.expression_list()?
    };
    parser.consume(TokenKind::Semicolon, "';' after return values")?;
    Ok(Statement::Return(values))
}

pub(crate) fn if_statement(parser: &mut Parser<'_>, _: &Token) -> Result<Statement, ParseError> {
    parser.consume(TokenKind::LeftParen, "'(' after 'if'")?;
    let condition = parser.expression(BindingPower::Default)?;
    parser.consume(TokenKind::RightParen, "')' after condition")?;
    let then_branch = parser.block()?;
    let else_branch = if parser.advance_if(TokenKind::Else) {
        if parser.check(TokenKind::If) {
            let token = parser.advance();
            Some(vec![if_statement(parser, token)?])
        } else {
            Some(parser.block()?)
        }
    } else {
        None
    };
    parser.optional_semicolon();
    Ok(Statement::If {
        condition,
        then_branch,
        else_branch,
    })
}

/// `for (cond; cond; ...) { body }`, also spelled `while`.
pub(crate) fn while_statement(
    parser: &mut Parser<'_>,
    token: &Token,
) -> Result<Statement, ParseError> {
    let after = format!("'(' after '{}'", token.text);
    parser.consume(TokenKind::LeftParen, &after)?;
    let mut conditions = vec![parser.expression(BindingPower::Default)?];
    while parser.advance_if(TokenKind::Semicolon) {
        conditions.push(parser.expression(BindingPower::Default)?);
    }
    parser.consume(TokenKind::RightParen, "')' after loop conditions")?;
    let body = parser.block()?;
    parser.optional_semicolon();
    Ok(Statement::While { conditions, body })
}

/// `import name "path";`
pub(crate) fn import_statement(
    parser: &mut Parser<'_>,
    _: &Token,
) -> Result<Statement, ParseError> {
    let name = parser.identifier("module name after 'import'")?;
    let path = parser.consume(TokenKind::String, "module path")?.text.clone();
    parser.consume(TokenKind::Semicolon, "';' after import")?;
    Ok(Statement::Import { name, path })
}

pub(crate) fn print_statement(parser: &mut Parser<'_>, _: &Token) -> Result<Statement, ParseError> {
    let values = parser.expression_list()?;
    parser.consume(TokenKind::Semicolon, "';' after values")?;
    Ok(Statement::Print(values))
}

pub(crate) fn block_statement(parser: &mut Parser<'_>, _: &Token) -> Result<Statement, ParseError> {
    let statements = parser.statements_until(TokenKind::RightBrace)?;
    parser.consume(TokenKind::RightBrace, "'}' after block")?;
    Ok(Statement::Block(statements))
}

pub(crate) fn named_type(_: &mut Parser<'_>, token: &Token) -> Result<Type, ParseError> {
    Ok(Type::Named(token.text.clone()))
}

pub(crate) fn array_type(parser: &mut Parser<'_>, _: &Token) -> Result<Type, ParseError> {
    parser.consume(TokenKind::RightBracket, "']' in array type")?;
    Ok(Type::Array(Box::new(parser.parse_type()?)))
}

#[cfg(test)]
mod parser_tests {
    use crate::ast::{Expression, Field, MethodSignature, Statement, Type};
    use crate::grammar::Grammar;
    use crate::parser::{parse, parse_with, Diagnostic, ParseError, MAX_NESTING};
    use crate::scanner::tokenize;
    use pretty_assertions::assert_eq;

    fn statements(source: &str) -> Vec<Statement> {
        let tokens = tokenize(source).unwrap();
        parse(&tokens).unwrap().0.statements
    }

    fn expression(source: &str) -> String {
        match statements(source).pop() {
            Some(Statement::Expression(expression)) => expression.to_string(),
            other => panic!("expected an expression statement, got {:?}", other),
        }
    }

    fn error(source: &str) -> ParseError {
        let tokens = tokenize(source).unwrap();
        parse(&tokens).unwrap_err()
    }

    fn diagnostics(source: &str) -> Vec<Diagnostic> {
        let tokens = tokenize(source).unwrap();
        parse(&tokens).unwrap().1
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(expression("1 + 2 * 3;"), "(+ 1 (* 2 3))");
        assert_eq!(expression("1 - 2 - 3;"), "(- (- 1 2) 3)");
        assert_eq!(expression("(1 + 2) * 3;"), "(* (+ 1 2) 3)");
        assert_eq!(expression("a < b and c >= d;"), "(and (< a b) (>= c d))");
        assert_eq!(expression("-a * b;"), "(* (- a) b)");
        assert_eq!(expression("-f(x);"), "(- (call f x))");
    }

    #[test]
    fn assignment_is_right_recursive() {
        assert_eq!(expression("a = b = 1;"), "(= a (= b 1))");
        assert_eq!(expression("a += 1 + 2;"), "(+= a (+ 1 2))");
        assert_eq!(expression("p.x = 3;"), "(= (. p x) 3)");
        assert_eq!(expression("xs[0] = 3;"), "(= (index xs 0) 3)");
    }

    #[test]
    fn postfix_chains() {
        assert_eq!(expression("m.f(1, 2)[0].y;"), "(. (index (call (. m f) 1 2) 0) y)");
        assert_eq!(expression("[1, 2, 3,];"), "(array 1 2 3)");
        assert_eq!(expression("f();"), "(call f)");
    }

    #[test]
    fn class_instance_literal() {
        assert_eq!(
            expression("!!Point(x = 1, y = 2 + 3);"),
            "(new Point (x 1) (y (+ 2 3)))"
        );
    }

    #[test]
    fn variable_declarations() {
        assert_eq!(
            statements("var a, b = f(); const c int;"),
            vec![
                Statement::VariableDeclaration {
                    names: vec!["a".to_string(), "b".to_string()],
                    annotation: None,
                    initializer: Some(Expression::Call {
                        callee: Box::new(Expression::Symbol("f".to_string())),
                        arguments: vec![],
                    }),
                    constant: false,
                },
                Statement::VariableDeclaration {
                    names: vec!["c".to_string()],
                    annotation: Some(Type::Named("int".to_string())),
                    initializer: None,
                    constant: true,
                },
            ]
        );
        match error("var x;") {
            ParseError::MissingTypeOrInitializer { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn class_declaration() {
        match &statements("class Point(int x, []int ys, int norm(int, float),)")[..] {
            [Statement::ClassDeclaration(class)] => {
                assert_eq!(class.name, "Point");
                assert_eq!(
                    class.fields,
                    vec![
                        Field {
                            name: "x".to_string(),
                            annotation: Type::Named("int".to_string()),
                        },
                        Field {
                            name: "ys".to_string(),
                            annotation: Type::Array(Box::new(Type::Named("int".to_string()))),
                        },
                    ]
                );
                assert_eq!(
                    class.methods,
                    vec![MethodSignature {
                        name: "norm".to_string(),
                        parameters: vec![
                            Type::Named("int".to_string()),
                            Type::Named("float".to_string()),
                        ],
                        returns: Type::Named("int".to_string()),
                    }]
                );
            }
            other => panic!("unexpected statements {:?}", other),
        }
    }

    #[test]
    fn duplicate_class_member() {
        match error("class P(int x, float x);") {
            ParseError::DuplicateMember { class, name, .. } => {
                assert_eq!(class, "P");
                assert_eq!(name, "x");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn function_declaration() {
        match &statements("function swap(a int, b int) (int, int) { return b, a; };")[..] {
            [Statement::FunctionDeclaration(function)] => {
                assert_eq!(function.name, "swap");
                assert_eq!(function.parameters.len(), 2);
                assert_eq!(function.parameters[1].name, "b");
                assert_eq!(function.returns.len(), 2);
                assert_eq!(
                    function.body,
                    vec![Statement::Return(vec![
                        Expression::Symbol("b".to_string()),
                        Expression::Symbol("a".to_string()),
                    ])]
                );
            }
            other => panic!("unexpected statements {:?}", other),
        }
        match &statements("function hello() { meow \"hi\"; }")[..] {
            [Statement::FunctionDeclaration(function)] => assert!(function.returns.is_empty()),
            other => panic!("unexpected statements {:?}", other),
        }
    }

    #[test]
    fn control_flow() {
        let parsed = statements("if (a) { b; } else if (c) { d; } else { e; } for (x; y) { z; }");
        assert_eq!(parsed.len(), 2);
        match &parsed[0] {
            Statement::If {
                else_branch: Some(else_branch),
                ..
            } => match &else_branch[..] {
                [Statement::If {
                    else_branch: Some(last),
                    ..
                }] => assert_eq!(last.len(), 1),
                other => panic!("unexpected else branch {:?}", other),
            },
            other => panic!("unexpected statement {:?}", other),
        }
        match &parsed[1] {
            Statement::While { conditions, body } => {
                assert_eq!(conditions.len(), 2);
                assert_eq!(body.len(), 1);
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn import_print_and_blocks() {
        assert_eq!(
            statements("import lib \"lib.meow\"; meow 1, \"two\"; { }"),
            vec![
                Statement::Import {
                    name: "lib".to_string(),
                    path: "lib.meow".to_string(),
                },
                Statement::Print(vec![
                    Expression::NumberLiteral("1".to_string()),
                    Expression::StringLiteral("two".to_string()),
                ]),
                Statement::Block(vec![]),
            ]
        );
    }

    #[test]
    fn missing_tokens_are_reported_with_location() {
        match error("var x = 1\nvar y = 2;") {
            ParseError::Expected {
                expected,
                found,
                line,
                column,
            } => {
                assert_eq!(expected, "';' after variable declaration");
                assert_eq!(found, "'var'");
                assert_eq!(line, 2);
                assert_eq!(column, 1);
            }
            other => panic!("unexpected error {:?}", other),
        }
        match error("x = ;") {
            ParseError::ExpectedExpression { found, .. } => assert_eq!(found, "';'"),
            other => panic!("unexpected error {:?}", other),
        }
        match error("function f(a 1) {}") {
            ParseError::ExpectedType { found, .. } => assert_eq!(found, "'1'"),
            other => panic!("unexpected error {:?}", other),
        }
        match error("{ meow 1;") {
            ParseError::Expected { found, .. } => assert_eq!(found, "end of input"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn nesting_is_bounded() {
        let nested = |depth: usize| format!("meow {}1{};", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(statements(&nested(100)).len(), 1);
        match error(&nested(20_000)) {
            ParseError::TooDeeplyNested { limit, line, .. } => {
                assert_eq!(limit, MAX_NESTING);
                assert_eq!(line, 1);
            }
            other => panic!("unexpected error {:?}", other),
        }

        let blocks = format!("{}{}", "{".repeat(20_000), "}".repeat(20_000));
        assert!(matches!(error(&blocks), ParseError::TooDeeplyNested { .. }));

        let chain = format!("meow 1{};", " + 1".repeat(20_000));
        assert!(matches!(error(&chain), ParseError::TooDeeplyNested { .. }));
        let short_chain = format!("meow 1{};", " + 1".repeat(50));
        assert_eq!(statements(&short_chain).len(), 1);
    }

    #[test]
    fn diagnostics_for_empty_and_unreachable_statements() {
        let found = diagnostics("function f() (int) { return 1; meow 2; meow 3; };;");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].message, "unreachable statement after return");
        assert_eq!(found[0].column, 32);
        assert_eq!(found[1].message, "empty statement");
        assert!(diagnostics("meow 1;").is_empty());
    }

    #[test]
    fn parsing_is_deterministic() {
        let source = "class P(int x,) function f(p P) (int) { return p.x * 2; } \
                      var v = f(!!P(x = 4)); for (v > 0) { v -= 1; }";
        let tokens = tokenize(source).unwrap();
        let grammar = Grammar::new();
        let first = parse_with(&grammar, &tokens).unwrap();
        let second = parse_with(&grammar, &tokens).unwrap();
        assert_eq!(first, second);
    }
}
