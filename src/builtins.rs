use crate::error::RuntimeError;
use crate::value::Value;
use std::io::Write;
use std::str::FromStr;
use strum_macros::{Display, EnumString};

/// Functions every program can call without declaring them. They take
/// precedence over user functions of the same name.
#[derive(Debug, Display, EnumString, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    #[strum(serialize = "print")]
    Print,
    #[strum(serialize = "length")]
    Length,
    #[strum(serialize = "typeof")]
    Typeof,
    #[strum(serialize = "stringify")]
    Stringify,
    #[strum(serialize = "append")]
    Append,
}

fn expect_arity(name: Builtin, arguments: &[Value], expected: usize) -> Result<(), RuntimeError> {
    if arguments.len() == expected {
        Ok(())
    } else {
        Err(RuntimeError::WrongArity {
            name: name.to_string(),
            expected,
            found: arguments.len(),
        })
    }
}

/// Writes display strings separated by spaces, then a newline.
pub fn write_values(out: &mut dyn Write, values: &[Value]) -> Result<(), RuntimeError> {
    let line = values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(out, "{}", line)?;
    Ok(())
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Builtin> {
        Builtin::from_str(name).ok()
    }

    pub fn call(self, arguments: Vec<Value>, out: &mut dyn Write) -> Result<Value, RuntimeError> {
        match self {
            Builtin::Print => {
                write_values(out, &arguments)?;
                Ok(Value::Null)
            }
            Builtin::Length => {
                expect_arity(self, &arguments, 1)?;
                match &arguments[0] {
                    Value::String(text) => Ok(Value::Integer(text.chars().count() as i64)),
                    Value::Array(array) => Ok(Value::Integer(array.len() as i64)),
                    other => Err(RuntimeError::ArgumentKind {
                        name: self.to_string(),
                        position: 1,
                        expected: "string or array".to_string(),
                        found: other.type_name(),
                    }),
                }
            }
            Builtin::Typeof => {
                expect_arity(self, &arguments, 1)?;
                Ok(Value::String(arguments[0].kind().to_string()))
            }
            Builtin::Stringify => {
                expect_arity(self, &arguments, 1)?;
                Ok(Value::String(arguments[0].to_string()))
            }
            Builtin::Append => {
                expect_arity(self, &arguments, 2)?;
                let mut arguments = arguments.into_iter();
                match (arguments.next(), arguments.next()) {
                    (Some(Value::Array(mut array)), Some(value)) => {
                        array.push(value)?;
                        Ok(Value::Array(array))
                    }
                    (Some(other), _) => Err(RuntimeError::ArgumentKind {
                        name: self.to_string(),
                        position: 1,
                        expected: "array".to_string(),
                        found: other.type_name(),
                    }),
                    _ => unreachable!("arity checked above"),
                }
            }
        }
    }
}

#[cfg(test)]
mod builtins_tests {
    use crate::builtins::Builtin;
    use crate::error::RuntimeError;
    use crate::value::{Array, Value};

    fn call(builtin: Builtin, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        builtin.call(arguments, &mut Vec::<u8>::new())
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(Builtin::lookup("print"), Some(Builtin::Print));
        assert_eq!(Builtin::lookup("typeof"), Some(Builtin::Typeof));
        assert_eq!(Builtin::lookup("len"), None);
        assert_eq!(Builtin::Append.to_string(), "append");
    }

    #[test]
    fn print_writes_a_line() {
        let mut out: Vec<u8> = Vec::new();
        let result = Builtin::Print
            .call(vec![Value::Integer(1), Value::String("cat".to_string())], &mut out)
            .unwrap();
        assert_eq!(result, Value::Null);
        assert_eq!(String::from_utf8(out).unwrap(), "1 cat\n");
    }

    #[test]
    fn length_of_strings_and_arrays() {
        assert_eq!(
            call(Builtin::Length, vec![Value::String("meow".to_string())]).unwrap(),
            Value::Integer(4)
        );
        let array = Array::from_values(vec![Value::Integer(1), Value::Integer(2)]).unwrap();
        assert_eq!(
            call(Builtin::Length, vec![Value::Array(array)]).unwrap(),
            Value::Integer(2)
        );
        assert!(matches!(
            call(Builtin::Length, vec![Value::Integer(1)]),
            Err(RuntimeError::ArgumentKind { .. })
        ));
        assert!(matches!(
            call(Builtin::Length, vec![]),
            Err(RuntimeError::WrongArity { expected: 1, found: 0, .. })
        ));
    }

    #[test]
    fn typeof_and_stringify() {
        assert_eq!(
            call(Builtin::Typeof, vec![Value::Float(1.5)]).unwrap(),
            Value::String("float".to_string())
        );
        assert_eq!(
            call(Builtin::Stringify, vec![Value::Float(2.0)]).unwrap(),
            Value::String("2.0".to_string())
        );
    }

    #[test]
    fn append_returns_a_new_array() {
        let array = Value::Array(Array::from_values(vec![Value::Integer(1)]).unwrap());
        let appended = call(Builtin::Append, vec![array.clone(), Value::Integer(2)]).unwrap();
        assert_eq!(appended.to_string(), "[1, 2]");
        assert_eq!(array.to_string(), "[1]");
        assert!(matches!(
            call(Builtin::Append, vec![array, Value::Boolean(true)]),
            Err(RuntimeError::MixedArray { .. })
        ));
    }
}
