use crate::ast::FunctionDeclaration;
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::interpreter::{Interpreter, Signal};
use crate::value::{conform, Value};
use std::fmt;
use std::rc::Rc;

/// A user-defined function together with the environment it was declared
/// in.
#[derive(Clone)]
pub struct Function {
    declaration: Rc<FunctionDeclaration>,
    closure: Environment,
    is_method: bool,
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name())
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("is_method", &self.is_method)
            .finish()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.declaration, &other.declaration) && self.closure.equals(&other.closure)
    }
}

impl Function {
    pub fn new(declaration: Rc<FunctionDeclaration>, closure: Environment) -> Function {
        Function {
            declaration,
            closure,
            is_method: false,
        }
    }

    /// The same function, bound into a class's method table.
    pub fn as_method(&self) -> Function {
        Function {
            is_method: true,
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    pub fn arity(&self) -> usize {
        self.declaration.parameters.len()
    }

    pub fn declaration(&self) -> &FunctionDeclaration {
        &self.declaration
    }

    pub fn closure(&self) -> &Environment {
        &self.closure
    }

    pub fn is_method(&self) -> bool {
        self.is_method
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(name = %self.name(), method = self.is_method)
    )]
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let declaration = &self.declaration;
        if arguments.len() != declaration.parameters.len() {
            return Err(RuntimeError::WrongArity {
                name: self.name().to_string(),
                expected: declaration.parameters.len(),
                found: arguments.len(),
            });
        }

        let environment = self.closure.new_child();
        for (position, (parameter, argument)) in
            declaration.parameters.iter().zip(arguments).enumerate()
        {
            let found = argument.type_name();
            let value = conform(&parameter.annotation, argument).map_err(|_| {
                RuntimeError::ArgumentKind {
                    name: self.name().to_string(),
                    position: position + 1,
                    expected: parameter.annotation.to_string(),
                    found,
                }
            })?;
            environment.set(&parameter.name, value);
        }

        interpreter.enter_call()?;
        let result = interpreter.execute_block(&declaration.body, &environment);
        interpreter.exit_call();
        let values = match result? {
            Signal::Return(values) => values,
            Signal::Continue => Vec::new(),
        };

        if values.len() != declaration.returns.len() {
            return Err(RuntimeError::ReturnArity {
                name: self.name().to_string(),
                expected: declaration.returns.len(),
                found: values.len(),
            });
        }
        let mut checked = Vec::with_capacity(values.len());
        for (position, (annotation, value)) in
            declaration.returns.iter().zip(values).enumerate()
        {
            let found = value.type_name();
            checked.push(conform(annotation, value).map_err(|_| {
                RuntimeError::ReturnKind {
                    name: self.name().to_string(),
                    position: position + 1,
                    expected: annotation.to_string(),
                    found,
                }
            })?);
        }
        Ok(match checked.len() {
            0 => Value::Null,
            1 => checked.remove(0),
            _ => Value::MultiReturn(checked),
        })
    }
}
