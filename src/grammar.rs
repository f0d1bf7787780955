use crate::ast::{Expression, Statement, Type};
use crate::parser::{self, ParseError, Parser};
use crate::token::{Token, TokenKind};
use num_enum::TryFromPrimitive;
use std::collections::HashMap;
use std::convert::TryFrom;
use strum_macros::Display;

/// How tightly an infix operator holds its left operand. An infix rule only
/// extends an expression when its power is strictly greater than the
/// threshold the expression is being parsed at.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, TryFromPrimitive)]
#[repr(u8)]
pub enum BindingPower {
    Default,
    Comma,
    Assignment,
    Logical,
    Relational,
    Additive,
    Multiplicative,
    Unary,
    Call,
    Member,
    Primary,
}

impl BindingPower {
    /// The next weaker power. Parsing an operand at `lower()` of its own
    /// operator makes that operator right-associative.
    pub fn lower(self) -> BindingPower {
        BindingPower::try_from((self as u8).saturating_sub(1)).unwrap_or(BindingPower::Default)
    }
}

pub type PrefixHandler = fn(&mut Parser<'_>, &Token) -> Result<Expression, ParseError>;
pub type InfixHandler = fn(&mut Parser<'_>, Expression, &Token) -> Result<Expression, ParseError>;
pub type StatementHandler = fn(&mut Parser<'_>, &Token) -> Result<Statement, ParseError>;
pub type TypeHandler = fn(&mut Parser<'_>, &Token) -> Result<Type, ParseError>;

/// Dispatch tables for the parser, keyed by the kind of the token that
/// starts (or continues) a construct. Build one with `Grammar::new()` and
/// share it by reference between parses.
#[derive(Default)]
pub struct Grammar {
    prefix: HashMap<TokenKind, PrefixHandler>,
    infix: HashMap<TokenKind, (BindingPower, InfixHandler)>,
    statements: HashMap<TokenKind, StatementHandler>,
    types: HashMap<TokenKind, TypeHandler>,
}

impl Grammar {
    /// A grammar with no rules at all.
    pub fn empty() -> Grammar {
        Grammar::default()
    }

    #[rustfmt::skip]
    pub fn new() -> Grammar {
        use BindingPower::*;
        use TokenKind as T;

        let mut grammar = Grammar::empty();
        grammar
            .register_prefix(T::Number,       parser::number)
            .register_prefix(T::String,       parser::string)
            .register_prefix(T::True,         parser::boolean)
            .register_prefix(T::False,        parser::boolean)
            .register_prefix(T::Identifier,   parser::symbol)
            .register_prefix(T::LeftParen,    parser::grouping)
            .register_prefix(T::LeftBracket,  parser::array)
            .register_prefix(T::Minus,        parser::negation)
            .register_prefix(T::Bang,         parser::class_instance)

            .register_infix(T::LeftParen,    Call,           parser::call)
            .register_infix(T::LeftBracket,  Call,           parser::index)
            .register_infix(T::Dot,          Member,         parser::member)
            .register_infix(T::Plus,         Additive,       parser::binary)
            .register_infix(T::Minus,        Additive,       parser::binary)
            .register_infix(T::Star,         Multiplicative, parser::binary)
            .register_infix(T::Slash,        Multiplicative, parser::binary)
            .register_infix(T::Less,         Relational,     parser::binary)
            .register_infix(T::LessEqual,    Relational,     parser::binary)
            .register_infix(T::Greater,      Relational,     parser::binary)
            .register_infix(T::GreaterEqual, Relational,     parser::binary)
            .register_infix(T::EqualEqual,   Relational,     parser::binary)
            .register_infix(T::BangEqual,    Relational,     parser::binary)
            .register_infix(T::And,          Logical,        parser::binary)
            .register_infix(T::Or,           Logical,        parser::binary)
            .register_infix(T::Equal,        Assignment,     parser::assignment)
            .register_infix(T::PlusEqual,    Assignment,     parser::assignment)
            .register_infix(T::MinusEqual,   Assignment,     parser::assignment)
            .register_infix(T::StarEqual,    Assignment,     parser::assignment)
            .register_infix(T::SlashEqual,   Assignment,     parser::assignment)

            .register_statement(T::Var,       parser::variable_declaration)
            .register_statement(T::Const,     parser::variable_declaration)
            .register_statement(T::Class,     parser::class_declaration)
            .register_statement(T::Function,  parser::function_declaration)
            .register_statement(T::Return,    parser::return_statement)
            .register_statement(T::If,        parser::if_statement)
            .register_statement(T::For,       parser::while_statement)
            .register_statement(T::While,     parser::while_statement)
            .register_statement(T::Import,    parser::import_statement)
            .register_statement(T::Meow,      parser::print_statement)
            .register_statement(T::LeftBrace, parser::block_statement)

            .register_type(T::Identifier,  parser::named_type)
            .register_type(T::LeftBracket, parser::array_type);
        grammar
    }

    pub fn register_prefix(&mut self, kind: TokenKind, handler: PrefixHandler) -> &mut Grammar {
        self.prefix.insert(kind, handler);
        self
    }

    pub fn register_infix(
        &mut self,
        kind: TokenKind,
        power: BindingPower,
        handler: InfixHandler,
    ) -> &mut Grammar {
        self.infix.insert(kind, (power, handler));
        self
    }

    pub fn register_statement(
        &mut self,
        kind: TokenKind,
        handler: StatementHandler,
    ) -> &mut Grammar {
        self.statements.insert(kind, handler);
        self
    }

    pub fn register_type(&mut self, kind: TokenKind, handler: TypeHandler) -> &mut Grammar {
        self.types.insert(kind, handler);
        self
    }

    pub fn prefix_rule(&self, kind: TokenKind) -> Option<PrefixHandler> {
        self.prefix.get(&kind).copied()
    }

    pub fn infix_rule(&self, kind: TokenKind) -> Option<(BindingPower, InfixHandler)> {
        self.infix.get(&kind).copied()
    }

    /// `Default` for tokens with no infix rule, which never extends an
    /// expression.
    pub fn binding_power(&self, kind: TokenKind) -> BindingPower {
        self.infix
            .get(&kind)
            .map_or(BindingPower::Default, |(power, _)| *power)
    }

    pub fn statement_rule(&self, kind: TokenKind) -> Option<StatementHandler> {
        self.statements.get(&kind).copied()
    }

    pub fn type_rule(&self, kind: TokenKind) -> Option<TypeHandler> {
        self.types.get(&kind).copied()
    }
}
