use crate::ast::{BinaryOperator, PrefixOperator, Type};
use crate::callable::Function;
use crate::class::Class;
use crate::error::RuntimeError;
use crate::module::Module;
use std::fmt;
use strum_macros::Display;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    #[strum(to_string = "int")]
    Integer,
    #[strum(to_string = "float")]
    Float,
    #[strum(to_string = "string")]
    String,
    #[strum(to_string = "bool")]
    Boolean,
    #[strum(to_string = "null")]
    Null,
    #[strum(to_string = "array")]
    Array,
    #[strum(to_string = "function")]
    Function,
    #[strum(to_string = "class")]
    Class,
    #[strum(to_string = "module")]
    Module,
    #[strum(to_string = "multi")]
    MultiReturn,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
    Array(Array),
    Function(Function),
    Class(Class),
    Module(Module),
    MultiReturn(Vec<Value>),
}

/// A homogeneous list. The element kind is fixed by the first element (or
/// by the declared type of an empty array) and checked on every insert.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Array {
    elements: Vec<Value>,
    kind: Option<ValueKind>,
}

impl Array {
    pub fn new(kind: Option<ValueKind>) -> Array {
        Array {
            elements: Vec::new(),
            kind,
        }
    }

    pub fn from_values(values: Vec<Value>) -> Result<Array, RuntimeError> {
        let mut array = Array::default();
        for value in values {
            array.push(value)?;
        }
        Ok(array)
    }

    pub fn kind(&self) -> Option<ValueKind> {
        self.kind
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn admit(&mut self, value: &Value) -> Result<(), RuntimeError> {
        match self.kind {
            Some(kind) if kind != value.kind() => Err(RuntimeError::MixedArray {
                expected: kind,
                found: value.kind(),
            }),
            Some(_) => Ok(()),
            None => {
                self.kind = Some(value.kind());
                Ok(())
            }
        }
    }

    pub fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        self.admit(&value)?;
        self.elements.push(value);
        Ok(())
    }

    fn position(&self, index: &Value) -> Result<usize, RuntimeError> {
        position(index, self.elements.len())
    }

    pub fn get(&self, index: &Value) -> Result<Value, RuntimeError> {
        let position = self.position(index)?;
        Ok(self.elements[position].clone())
    }

    pub fn set(&mut self, index: &Value, value: Value) -> Result<(), RuntimeError> {
        let position = self.position(index)?;
        self.admit(&value)?;
        self.elements[position] = value;
        Ok(())
    }
}

/// Checks an index value against a length.
fn position(index: &Value, length: usize) -> Result<usize, RuntimeError> {
    match index {
        Value::Integer(i) if *i >= 0 && (*i as u64) < length as u64 => Ok(*i as usize),
        Value::Integer(i) => Err(RuntimeError::IndexOutOfRange { index: *i, length }),
        other => Err(RuntimeError::IndexKind(other.kind())),
    }
}

impl Value {
    /// Whole-valued numbers that fit an i64 become Integer, anything else
    /// Float.
    pub fn number(text: &str) -> Result<Value, RuntimeError> {
        if let Ok(integer) = text.parse::<i64>() {
            return Ok(Value::Integer(integer));
        }
        let float = text
            .parse::<f64>()
            .map_err(|_| RuntimeError::InvalidNumber(text.to_string()))?;
        if float.fract() == 0.0 && float >= i64::MIN as f64 && float < i64::MAX as f64 {
            Ok(Value::Integer(float as i64))
        } else {
            Ok(Value::Float(float))
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Null => ValueKind::Null,
            Value::Array(_) => ValueKind::Array,
            Value::Function(_) => ValueKind::Function,
            Value::Class(_) => ValueKind::Class,
            Value::Module(_) => ValueKind::Module,
            Value::MultiReturn(_) => ValueKind::MultiReturn,
        }
    }

    /// A finer description than `kind` for error messages: the class name
    /// for instances and the element kind for arrays.
    pub fn type_name(&self) -> String {
        match self {
            Value::Class(class) => class.name().to_string(),
            Value::Array(array) => match array.kind() {
                Some(kind) => format!("[]{}", kind),
                None => "[]".to_string(),
            },
            other => other.kind().to_string(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            _ => true,
        }
    }

    pub fn binary(
        operator: BinaryOperator,
        left: &Value,
        right: &Value,
    ) -> Result<Value, RuntimeError> {
        use BinaryOperator::*;
        match (left, right) {
            (Value::Integer(l), Value::Integer(r)) => integer_binary(operator, *l, *r),
            (Value::Float(l), Value::Float(r)) => float_binary(operator, *l, *r),
            (Value::Integer(l), Value::Float(r)) => float_binary(operator, *l as f64, *r),
            (Value::Float(l), Value::Integer(r)) => float_binary(operator, *l, *r as f64),
            (Value::String(l), Value::String(r)) => match operator {
                Add => Ok(Value::String(format!("{}{}", l, r))),
                Equal => Ok(Value::Boolean(l == r)),
                NotEqual => Ok(Value::Boolean(l != r)),
                _ => Err(mismatch(operator, left, right)),
            },
            (Value::Boolean(l), Value::Boolean(r)) => match operator {
                And => Ok(Value::Boolean(*l && *r)),
                Or => Ok(Value::Boolean(*l || *r)),
                Equal => Ok(Value::Boolean(l == r)),
                NotEqual => Ok(Value::Boolean(l != r)),
                _ => Err(mismatch(operator, left, right)),
            },
            _ => Err(mismatch(operator, left, right)),
        }
    }

    pub fn prefix(operator: PrefixOperator, operand: &Value) -> Result<Value, RuntimeError> {
        match (operator, operand) {
            (PrefixOperator::Negate, Value::Integer(i)) => i
                .checked_neg()
                .map(Value::Integer)
                .ok_or_else(|| RuntimeError::IntegerOverflow(operator.to_string())),
            (PrefixOperator::Negate, Value::Float(x)) => Ok(Value::Float(-x)),
            _ => Err(RuntimeError::BadOperand {
                operator: operator.to_string(),
                operand: operand.kind(),
            }),
        }
    }

    /// Indexes an array by position, or a string by character.
    pub fn index(&self, index: &Value) -> Result<Value, RuntimeError> {
        match self {
            Value::Array(array) => array.get(index),
            Value::String(text) => {
                let length = text.chars().count();
                let position = position(index, length)?;
                Ok(Value::String(
                    text.chars().skip(position).take(1).collect::<String>(),
                ))
            }
            other => Err(RuntimeError::NotIndexable(other.kind())),
        }
    }
}

fn mismatch(operator: BinaryOperator, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch {
        operator: operator.to_string(),
        left: left.kind(),
        right: right.kind(),
    }
}

fn integer_binary(operator: BinaryOperator, l: i64, r: i64) -> Result<Value, RuntimeError> {
    use BinaryOperator::*;
    let checked = |result: Option<i64>| {
        result
            .map(Value::Integer)
            .ok_or_else(|| RuntimeError::IntegerOverflow(operator.to_string()))
    };
    match operator {
        Add => checked(l.checked_add(r)),
        Subtract => checked(l.checked_sub(r)),
        Multiply => checked(l.checked_mul(r)),
        Divide if r == 0 => Err(RuntimeError::DivisionByZero),
        Divide => checked(l.checked_div(r)),
        Less => Ok(Value::Boolean(l < r)),
        LessEqual => Ok(Value::Boolean(l <= r)),
        Greater => Ok(Value::Boolean(l > r)),
        GreaterEqual => Ok(Value::Boolean(l >= r)),
        Equal => Ok(Value::Boolean(l == r)),
        NotEqual => Ok(Value::Boolean(l != r)),
        And | Or => Err(RuntimeError::TypeMismatch {
            operator: operator.to_string(),
            left: ValueKind::Integer,
            right: ValueKind::Integer,
        }),
    }
}

fn float_binary(operator: BinaryOperator, l: f64, r: f64) -> Result<Value, RuntimeError> {
    use BinaryOperator::*;
    match operator {
        Add => Ok(Value::Float(l + r)),
        Subtract => Ok(Value::Float(l - r)),
        Multiply => Ok(Value::Float(l * r)),
        Divide if r == 0.0 => Err(RuntimeError::DivisionByZero),
        Divide => Ok(Value::Float(l / r)),
        Less => Ok(Value::Boolean(l < r)),
        LessEqual => Ok(Value::Boolean(l <= r)),
        Greater => Ok(Value::Boolean(l > r)),
        GreaterEqual => Ok(Value::Boolean(l >= r)),
        Equal => Ok(Value::Boolean(l == r)),
        NotEqual => Ok(Value::Boolean(l != r)),
        And | Or => Err(RuntimeError::TypeMismatch {
            operator: operator.to_string(),
            left: ValueKind::Float,
            right: ValueKind::Float,
        }),
    }
}

/// The kind of value a declared type holds. `None` for class names, whose
/// slots also accept `null`.
pub fn kind_of(annotation: &Type) -> Option<ValueKind> {
    match annotation {
        Type::Array(_) => Some(ValueKind::Array),
        Type::Named(name) => match name.as_str() {
            "int" => Some(ValueKind::Integer),
            "float" => Some(ValueKind::Float),
            "string" => Some(ValueKind::String),
            "bool" => Some(ValueKind::Boolean),
            "function" => Some(ValueKind::Function),
            "module" => Some(ValueKind::Module),
            _ => None,
        },
    }
}

/// The value an annotated slot holds before anything is assigned to it.
pub fn default_value(annotation: &Type) -> Value {
    match annotation {
        Type::Array(element) => Value::Array(Array::new(element_kind(element))),
        Type::Named(_) => match kind_of(annotation) {
            Some(ValueKind::Integer) => Value::Integer(0),
            Some(ValueKind::Float) => Value::Float(0.0),
            Some(ValueKind::String) => Value::String(String::new()),
            Some(ValueKind::Boolean) => Value::Boolean(false),
            _ => Value::Null,
        },
    }
}

fn element_kind(element: &Type) -> Option<ValueKind> {
    kind_of(element).or(Some(ValueKind::Class))
}

/// Checks `value` against a declared type. Integers are widened where a
/// float is declared. Returns the value back on mismatch.
pub fn conform(annotation: &Type, value: Value) -> Result<Value, Value> {
    match (annotation, value) {
        (Type::Array(element), Value::Array(array)) => {
            let expected = element_kind(element);
            let widening =
                array.kind == Some(ValueKind::Integer) && expected == Some(ValueKind::Float);
            if !(array.kind.is_none() || array.kind == expected || widening) {
                return Err(Value::Array(array));
            }
            let converted: Option<Vec<Value>> = array
                .elements
                .iter()
                .map(|item| conform(element, item.clone()).ok())
                .collect();
            match converted {
                Some(elements) => Ok(Value::Array(Array {
                    elements,
                    kind: expected,
                })),
                None => Err(Value::Array(array)),
            }
        }
        (Type::Named(name), value) => match (kind_of(annotation), value) {
            (Some(ValueKind::Float), Value::Integer(i)) => Ok(Value::Float(i as f64)),
            (Some(kind), value) if value.kind() == kind => Ok(value),
            (None, Value::Class(class)) if class.name() == name.as_str() => {
                Ok(Value::Class(class))
            }
            (None, Value::Null) => Ok(Value::Null),
            (_, value) => Err(value),
        },
        (_, value) => Err(value),
    }
}

fn float_to_string(x: f64) -> String {
    let text = x.to_string();
    if x.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

fn join(f: &mut fmt::Formatter<'_>, values: &[Value]) -> fmt::Result {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", value)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", float_to_string(*x)),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::Array(array) => {
                write!(f, "[")?;
                join(f, array.elements())?;
                write!(f, "]")
            }
            Value::Function(function) => write!(f, "{}", function),
            Value::Class(class) => write!(f, "{}", class),
            Value::Module(module) => write!(f, "{}", module),
            Value::MultiReturn(values) => join(f, values),
        }
    }
}
