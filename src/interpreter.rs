use crate::ast::{BinaryOperator, Expression, Program, Statement, Type};
use crate::builtins::{self, Builtin};
use crate::callable::Function;
use crate::class::Class;
use crate::environment::Environment;
use crate::error::{MeowError, RuntimeError};
use crate::grammar::Grammar;
use crate::module::{self, FileLoader, Module, ModuleLoader};
use crate::parser;
use crate::scanner;
use crate::value::{conform, default_value, Array, Value};
use std::io::{self, Write};
use std::mem;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Continue,
    Return(Vec<Value>),
}

pub struct Interpreter {
    globals: Environment,
    grammar: Grammar,
    out: Box<dyn Write>,
    loader: Box<dyn ModuleLoader>,
    base_dir: PathBuf,
    max_call_depth: usize,
    call_depth: usize,
    importing: Vec<PathBuf>,
}

impl Default for Interpreter {
    fn default() -> Interpreter {
        Interpreter::new()
    }
}

impl Interpreter {
    pub fn new() -> Interpreter {
        Interpreter {
            globals: Environment::new(),
            grammar: Grammar::new(),
            out: Box::new(io::stdout()),
            loader: Box::new(FileLoader),
            base_dir: PathBuf::new(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            call_depth: 0,
            importing: Vec::new(),
        }
    }

    /// Where `print` and `meow` write.
    pub fn with_output(mut self, out: impl Write + 'static) -> Interpreter {
        self.out = Box::new(out);
        self
    }

    pub fn with_loader(mut self, loader: impl ModuleLoader + 'static) -> Interpreter {
        self.loader = Box::new(loader);
        self
    }

    /// The directory relative imports of the main program resolve against.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Interpreter {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Interpreter {
        self.max_call_depth = max_call_depth;
        self
    }

    /// The environment of the main program.
    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    /// Tokenizes, parses and runs `source` in the global environment.
    pub fn run(&mut self, source: &str) -> Result<(), MeowError> {
        let tokens = scanner::tokenize(source)?;
        let (program, _) = parser::parse_with(&self.grammar, &tokens)?;
        self.interpret(&program)?;
        Ok(())
    }

    pub fn interpret(&mut self, program: &Program) -> Result<(), RuntimeError> {
        let globals = self.globals.clone();
        let result = self.execute_block(&program.statements, &globals);
        self.out.flush()?;
        result.map(|_| ())
    }

    pub(crate) fn enter_call(&mut self) -> Result<(), RuntimeError> {
        if self.call_depth >= self.max_call_depth {
            return Err(RuntimeError::StackOverflow(self.max_call_depth));
        }
        self.call_depth += 1;
        Ok(())
    }

    pub(crate) fn exit_call(&mut self) {
        self.call_depth -= 1;
    }

    /// Runs statements in `env`, stopping at the first `return`.
    pub fn execute_block(
        &mut self,
        statements: &[Statement],
        env: &Environment,
    ) -> Result<Signal, RuntimeError> {
        for statement in statements {
            if let Signal::Return(values) = self.execute(statement, env)? {
                return Ok(Signal::Return(values));
            }
        }
        Ok(Signal::Continue)
    }

    pub fn execute(
        &mut self,
        statement: &Statement,
        env: &Environment,
    ) -> Result<Signal, RuntimeError> {
        match statement {
            Statement::Expression(expression) => {
                self.evaluate(expression, env)?;
            }
            Statement::Print(expressions) => {
                let values = self.evaluate_all(expressions, env)?;
                builtins::write_values(&mut *self.out, &values)?;
            }
            Statement::VariableDeclaration {
                names,
                annotation,
                initializer,
                constant,
            } => self.declare(names, annotation.as_ref(), initializer.as_ref(), *constant, env)?,
            Statement::ClassDeclaration(declaration) => {
                let class = Class::declare(declaration, env)?;
                env.set(&declaration.name, Value::Class(class));
            }
            Statement::FunctionDeclaration(declaration) => {
                let function = Function::new(declaration.clone(), env.clone());
                env.set(&declaration.name, Value::Function(function));
            }
            Statement::Return(expressions) => {
                let mut values = Vec::new();
                for value in self.evaluate_all(expressions, env)? {
                    match value {
                        Value::MultiReturn(inner) => values.extend(inner),
                        value => values.push(value),
                    }
                }
                return Ok(Signal::Return(values));
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition, env)?.is_truthy() {
                    return self.execute_block(then_branch, env);
                } else if let Some(else_branch) = else_branch {
                    return self.execute_block(else_branch, env);
                }
            }
            Statement::While { conditions, body } => loop {
                let mut all_true = true;
                for condition in conditions {
                    all_true &= self.evaluate(condition, env)?.is_truthy();
                }
                if !all_true {
                    break;
                }
                if let Signal::Return(values) = self.execute_block(body, env)? {
                    return Ok(Signal::Return(values));
                }
            },
            Statement::Import { name, path } => {
                let module = self.import(name, path)?;
                env.set(name, Value::Module(module));
            }
            Statement::Block(statements) => {
                return self.execute_block(statements, &env.new_child());
            }
        }
        Ok(Signal::Continue)
    }

    fn declare(
        &mut self,
        names: &[String],
        annotation: Option<&Type>,
        initializer: Option<&Expression>,
        constant: bool,
        env: &Environment,
    ) -> Result<(), RuntimeError> {
        let values = match initializer {
            Some(initializer) => match (self.evaluate(initializer, env)?, names.len()) {
                (Value::MultiReturn(values), count) if values.len() == count => values,
                (Value::MultiReturn(values), count) => {
                    return Err(RuntimeError::Destructure {
                        expected: count,
                        found: values.len(),
                    })
                }
                (value, 1) => vec![value],
                (_, count) => {
                    return Err(RuntimeError::Destructure {
                        expected: count,
                        found: 1,
                    })
                }
            },
            None => names
                .iter()
                .map(|_| annotation.map_or(Value::Null, default_value))
                .collect(),
        };
        for (name, value) in names.iter().zip(values) {
            let value = match annotation {
                Some(annotation) => {
                    let found = value.type_name();
                    conform(annotation, value).map_err(|_| RuntimeError::DeclarationKind {
                        name: name.clone(),
                        expected: annotation.to_string(),
                        found,
                    })?
                }
                None => value,
            };
            if env.get_local(name).is_some() && env.is_constant(name) {
                return Err(RuntimeError::ConstantAssignment(name.clone()));
            }
            if constant {
                env.define_constant(name, value);
            } else {
                env.set(name, value);
            }
        }
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    fn import(&mut self, name: &str, path: &str) -> Result<Module, RuntimeError> {
        let resolved = module::resolve(&self.base_dir, path);
        let display = resolved.display().to_string();
        if self.importing.contains(&resolved) {
            return Err(RuntimeError::CyclicImport(display));
        }
        let source = self
            .loader
            .load(&resolved)
            .map_err(|source| RuntimeError::ImportRead {
                path: display.clone(),
                source,
            })?;

        let environment = Environment::new();
        let module_dir = resolved.parent().map(Path::to_path_buf).unwrap_or_default();
        let importer_dir = mem::replace(&mut self.base_dir, module_dir);
        self.importing.push(resolved);
        let result = self.run_module(&source, &environment);
        self.importing.pop();
        self.base_dir = importer_dir;
        result.map_err(|error| RuntimeError::Import {
            path: display,
            source: Box::new(error),
        })?;

        tracing::debug!("module loaded");
        Ok(Module {
            name: name.to_string(),
            environment,
        })
    }

    fn run_module(&mut self, source: &str, environment: &Environment) -> Result<(), MeowError> {
        let tokens = scanner::tokenize(source)?;
        let (program, _) = parser::parse_with(&self.grammar, &tokens)?;
        self.execute_block(&program.statements, environment)?;
        Ok(())
    }

    fn evaluate_all(
        &mut self,
        expressions: &[Expression],
        env: &Environment,
    ) -> Result<Vec<Value>, RuntimeError> {
        expressions
            .iter()
            .map(|expression| self.evaluate(expression, env))
            .collect()
    }

    pub fn evaluate(
        &mut self,
        expression: &Expression,
        env: &Environment,
    ) -> Result<Value, RuntimeError> {
        match expression {
            Expression::NumberLiteral(text) => Value::number(text),
            Expression::StringLiteral(text) => Ok(Value::String(text.clone())),
            Expression::BooleanLiteral(value) => Ok(Value::Boolean(*value)),
            Expression::Symbol(name) => env
                .get(name)
                .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone())),
            Expression::BinaryOp {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left, env)?;
                let right = self.evaluate(right, env)?;
                Value::binary(*operator, &left, &right)
            }
            Expression::PrefixOp { operator, operand } => {
                let operand = self.evaluate(operand, env)?;
                Value::prefix(*operator, &operand)
            }
            Expression::Assignment {
                target,
                operator,
                value,
            } => self.assign(target, *operator, value, env),
            Expression::ClassInstanceLiteral { class, fields } => {
                let mut instance = match env.get(class) {
                    Some(Value::Class(template)) => template,
                    _ => return Err(RuntimeError::UnknownClass(class.clone())),
                };
                for (field, value) in fields {
                    let value = self.evaluate(value, env)?;
                    instance.set_field(field, value)?;
                }
                Ok(Value::Class(instance))
            }
            Expression::ArrayLiteral(elements) => {
                let values = self.evaluate_all(elements, env)?;
                Ok(Value::Array(Array::from_values(values)?))
            }
            Expression::ArrayIndex { array, index } => {
                let array = self.evaluate(array, env)?;
                let index = self.evaluate(index, env)?;
                array.index(&index)
            }
            Expression::Call { callee, arguments } => self.call(callee, arguments, env),
            Expression::MemberAccess { object, member } => {
                match self.evaluate(object, env)? {
                    Value::Class(instance) => match instance.field(member) {
                        Some(value) => Ok(value.clone()),
                        None => match instance.find_method(member) {
                            Some(method) => Ok(Value::Function(method.clone())),
                            None => Err(RuntimeError::UnknownMember {
                                owner: format!("class {}", instance.name()),
                                member: member.clone(),
                            }),
                        },
                    },
                    Value::Module(module) => {
                        module
                            .environment
                            .get(member)
                            .ok_or_else(|| RuntimeError::UnknownMember {
                                owner: format!("module {}", module.name),
                                member: member.clone(),
                            })
                    }
                    other => Err(RuntimeError::UnknownMember {
                        owner: other.type_name(),
                        member: member.clone(),
                    }),
                }
            }
        }
    }

    fn call(
        &mut self,
        callee: &Expression,
        arguments: &[Expression],
        env: &Environment,
    ) -> Result<Value, RuntimeError> {
        match callee {
            Expression::Symbol(name) => {
                if let Some(builtin) = Builtin::lookup(name) {
                    let arguments = self.evaluate_all(arguments, env)?;
                    return builtin.call(arguments, &mut *self.out);
                }
                match env.get(name) {
                    Some(Value::Function(function)) => {
                        let arguments = self.evaluate_all(arguments, env)?;
                        function.call(self, arguments)
                    }
                    Some(other) => Err(RuntimeError::NotCallable(other.type_name())),
                    None => Err(RuntimeError::UnknownFunction(name.clone())),
                }
            }
            Expression::MemberAccess { object, member } => {
                let receiver = self.evaluate(object, env)?;
                let arguments = self.evaluate_all(arguments, env)?;
                self.call_member(receiver, member, arguments)
            }
            other => match self.evaluate(other, env)? {
                Value::Function(function) => {
                    let arguments = self.evaluate_all(arguments, env)?;
                    function.call(self, arguments)
                }
                value => Err(RuntimeError::NotCallable(value.type_name())),
            },
        }
    }

    fn call_member(
        &mut self,
        receiver: Value,
        member: &str,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        match receiver {
            Value::Class(instance) => {
                let method = match instance.find_method(member) {
                    Some(method) => method.clone(),
                    None => {
                        return Err(RuntimeError::UnknownMember {
                            owner: format!("class {}", instance.name()),
                            member: member.to_string(),
                        })
                    }
                };
                // Inside the method the class name refers to the receiver.
                let closure = method.closure();
                let name = instance.name().to_string();
                let shadowed = closure.get_local(&name);
                closure.set(&name, Value::Class(instance));
                let result = method.call(self, arguments);
                match shadowed {
                    Some(previous) => closure.set(&name, previous),
                    None => {
                        closure.delete(&name);
                    }
                }
                result
            }
            Value::Module(module) => match module.environment.get(member) {
                Some(Value::Function(function)) => function.call(self, arguments),
                Some(other) => Err(RuntimeError::NotCallable(other.type_name())),
                None => Err(RuntimeError::UnknownMember {
                    owner: format!("module {}", module.name),
                    member: member.to_string(),
                }),
            },
            other => Err(RuntimeError::UnknownMember {
                owner: other.type_name(),
                member: member.to_string(),
            }),
        }
    }

    fn assign(
        &mut self,
        target: &Expression,
        operator: Option<BinaryOperator>,
        value: &Expression,
        env: &Environment,
    ) -> Result<Value, RuntimeError> {
        let value = self.evaluate(value, env)?;
        let value = match operator {
            Some(operator) => {
                let current = self.evaluate(target, env)?;
                Value::binary(operator, &current, &value)?
            }
            None => value,
        };
        self.store(target, value.clone(), env)?;
        Ok(value)
    }

    /// Writes `value` to an assignable place. Class fields and array
    /// elements are updated on a copy that is then stored back into the
    /// place it came from.
    fn store(
        &mut self,
        target: &Expression,
        value: Value,
        env: &Environment,
    ) -> Result<(), RuntimeError> {
        match target {
            Expression::Symbol(name) => {
                if env.get(name).is_none() {
                    return Err(RuntimeError::UndefinedVariable(name.clone()));
                }
                if env.is_constant(name) {
                    return Err(RuntimeError::ConstantAssignment(name.clone()));
                }
                env.set(name, value);
                Ok(())
            }
            Expression::MemberAccess { object, member } => match self.evaluate(object, env)? {
                Value::Class(mut instance) => {
                    instance.set_field(member, value)?;
                    self.store(object, Value::Class(instance), env)
                }
                Value::Module(module) => {
                    if module.environment.is_constant(member) {
                        return Err(RuntimeError::ConstantAssignment(member.clone()));
                    }
                    module.environment.set(member, value);
                    Ok(())
                }
                other => Err(RuntimeError::UnknownMember {
                    owner: other.type_name(),
                    member: member.clone(),
                }),
            },
            Expression::ArrayIndex { array, index } => match self.evaluate(array, env)? {
                Value::Array(mut elements) => {
                    let index = self.evaluate(index, env)?;
                    elements.set(&index, value)?;
                    self.store(array, Value::Array(elements), env)
                }
                other => Err(RuntimeError::NotIndexable(other.kind())),
            },
            _ => Err(RuntimeError::InvalidAssignmentTarget),
        }
    }
}
