use crate::ast::{ClassDeclaration, Field};
use crate::callable::Function;
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::value::{conform, default_value, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// The parts of a class every instance shares: declared fields and bound
/// methods.
#[derive(Debug)]
struct Schema {
    name: String,
    fields: Vec<Field>,
    methods: BTreeMap<String, Function>,
}

/// A class value. The template bound by a class declaration and every
/// instance built from it share one schema; field values are copied, never
/// shared.
#[derive(Clone)]
pub struct Class {
    schema: Rc<Schema>,
    values: Vec<Value>,
}

impl Class {
    /// Builds the template for `declaration`, binding each method signature
    /// to the function of the same name visible from `environment`.
    pub fn declare(
        declaration: &ClassDeclaration,
        environment: &Environment,
    ) -> Result<Class, RuntimeError> {
        let mut methods = BTreeMap::new();
        for signature in &declaration.methods {
            let function = match environment.get(&signature.name) {
                Some(Value::Function(function)) => function,
                _ => {
                    return Err(RuntimeError::MissingMethodDefinition {
                        class: declaration.name.clone(),
                        method: signature.name.clone(),
                    })
                }
            };
            let mismatch = |reason: String| RuntimeError::MethodSignature {
                class: declaration.name.clone(),
                method: signature.name.clone(),
                reason,
            };
            let parameters: Vec<_> = function
                .declaration()
                .parameters
                .iter()
                .map(|parameter| parameter.annotation.clone())
                .collect();
            if parameters.len() != signature.parameters.len() {
                return Err(mismatch(format!(
                    "expected {} parameter(s) but the function takes {}",
                    signature.parameters.len(),
                    parameters.len()
                )));
            }
            if parameters != signature.parameters {
                return Err(mismatch("parameter types differ".to_string()));
            }
            if function.declaration().returns != [signature.returns.clone()] {
                return Err(mismatch(format!(
                    "expected a single {} return value",
                    signature.returns
                )));
            }
            methods.insert(signature.name.clone(), function.as_method());
        }
        let values = declaration
            .fields
            .iter()
            .map(|field| default_value(&field.annotation))
            .collect();
        Ok(Class {
            schema: Rc::new(Schema {
                name: declaration.name.clone(),
                fields: declaration.fields.clone(),
                methods,
            }),
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    fn slot(&self, field: &str) -> Option<usize> {
        self.schema.fields.iter().position(|f| f.name == field)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.slot(name).map(|slot| &self.values[slot])
    }

    /// Stores a field value after checking it against the declared type.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let slot = self.slot(name).ok_or_else(|| RuntimeError::UnknownField {
            class: self.name().to_string(),
            field: name.to_string(),
        })?;
        let annotation = &self.schema.fields[slot].annotation;
        let found = value.type_name();
        let value = conform(annotation, value).map_err(|_| RuntimeError::FieldKind {
            class: self.schema.name.clone(),
            field: name.to_string(),
            expected: annotation.to_string(),
            found,
        })?;
        self.values[slot] = value;
        Ok(())
    }

    pub fn find_method(&self, name: &str) -> Option<&Function> {
        self.schema.methods.get(name)
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Class) -> bool {
        Rc::ptr_eq(&self.schema, &other.schema) && self.values == other.values
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name())?;
        for (i, (field, value)) in self.schema.fields.iter().zip(&self.values).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} = {}", field.name, value)?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self)
    }
}

#[cfg(test)]
mod class_tests {
    use crate::ast::{ClassDeclaration, Field, FunctionDeclaration, MethodSignature, Type};
    use crate::callable::Function;
    use crate::class::Class;
    use crate::environment::Environment;
    use crate::error::RuntimeError;
    use crate::value::Value;
    use std::rc::Rc;

    fn named(name: &str) -> Type {
        Type::Named(name.to_string())
    }

    fn point() -> ClassDeclaration {
        ClassDeclaration {
            name: "Point".to_string(),
            fields: vec![
                Field {
                    name: "x".to_string(),
                    annotation: named("int"),
                },
                Field {
                    name: "y".to_string(),
                    annotation: named("float"),
                },
            ],
            methods: vec![],
        }
    }

    #[test]
    fn template_has_default_fields() {
        let class = Class::declare(&point(), &Environment::new()).unwrap();
        assert_eq!(class.name(), "Point");
        assert_eq!(class.field("x"), Some(&Value::Integer(0)));
        assert_eq!(class.to_string(), "Point(x = 0, y = 0.0)");
    }

    #[test]
    fn fields_are_type_checked_and_copied() {
        let template = Class::declare(&point(), &Environment::new()).unwrap();
        let mut instance = template.clone();
        instance.set_field("x", Value::Integer(3)).unwrap();
        instance.set_field("y", Value::Integer(4)).unwrap();
        assert_eq!(instance.to_string(), "Point(x = 3, y = 4.0)");
        assert_eq!(template.field("x"), Some(&Value::Integer(0)));
        assert!(matches!(
            instance.set_field("x", Value::String("no".to_string())),
            Err(RuntimeError::FieldKind { .. })
        ));
        assert!(matches!(
            instance.set_field("z", Value::Integer(1)),
            Err(RuntimeError::UnknownField { .. })
        ));
    }

    #[test]
    fn methods_bind_to_functions_in_scope() {
        let environment = Environment::new();
        let mut declaration = point();
        declaration.methods.push(MethodSignature {
            name: "norm".to_string(),
            parameters: vec![],
            returns: named("int"),
        });
        assert!(matches!(
            Class::declare(&declaration, &environment),
            Err(RuntimeError::MissingMethodDefinition { .. })
        ));

        let norm = Rc::new(FunctionDeclaration {
            name: "norm".to_string(),
            parameters: vec![],
            returns: vec![named("int")],
            body: vec![],
        });
        environment.set("norm", Value::Function(Function::new(norm, environment.clone())));
        let class = Class::declare(&declaration, &environment).unwrap();
        let method = class.find_method("norm").unwrap();
        assert!(method.is_method());
        assert_eq!(method.arity(), 0);

        declaration.methods[0].parameters.push(named("int"));
        assert!(matches!(
            Class::declare(&declaration, &environment),
            Err(RuntimeError::MethodSignature { .. })
        ));
    }
}
