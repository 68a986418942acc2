use std::{cmp::Ordering, fmt, sync::Arc};

use smol_str::SmolStr;

use crate::number::Number;

use super::Memory;

/// Computes the text of a lazy value on demand.
pub type Evaluator = fn(&Memory) -> String;

/// A lazily evaluated piece of text.
///
/// Evaluation never mutates the memory, so a value may be evaluated any
/// number of times.
#[derive(Clone, Default)]
pub enum Value {
    /// Undefined. Distinct from the empty text and evaluates to nothing.
    #[default]
    Null,
    Const(SmolStr),
    Lazy(Evaluator),
    /// Values pushed together and read as the concatenation of their texts.
    Glued(Arc<[Value]>),
}

impl Value {
    pub fn new(text: impl Into<SmolStr>) -> Self {
        Value::Const(text.into())
    }

    pub fn lazy(evaluator: Evaluator) -> Self {
        Value::Lazy(evaluator)
    }

    /// Combines values popped from a frame. A single value stays as it is.
    pub fn glue(mut values: Vec<Value>) -> Self {
        if values.len() == 1 {
            values.remove(0)
        } else {
            Value::Glued(values.into())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn eval(&self, memory: &Memory) -> String {
        let mut text = String::new();
        self.write(memory, &mut text);
        text
    }

    fn write(&self, memory: &Memory, out: &mut String) {
        match self {
            Value::Null => {}
            Value::Const(text) => out.push_str(text),
            Value::Lazy(evaluator) => out.push_str(&evaluator(memory)),
            Value::Glued(values) => values.iter().for_each(|value| value.write(memory, out)),
        }
    }

    pub fn number(&self, memory: &Memory) -> Option<Number> {
        match self {
            Value::Null => None,
            Value::Const(text) => Number::parse(text),
            _ => Number::parse(&self.eval(memory)),
        }
    }

    /// Null, the empty text, `false` and `0` are false. Everything else is true.
    pub fn is_truthy(&self, memory: &Memory) -> bool {
        if self.is_null() {
            return false;
        }
        let text = self.eval(memory);
        let text = text.trim();
        !(text.is_empty() || text == "false" || Number::parse(text).is_some_and(|n| n.is_zero()))
    }

    /// Compares two values, returning `-1`, `0` or `1`.
    ///
    /// Null sorts before everything and equals only itself. Two numbers
    /// compare numerically, anything else compares by text.
    pub fn compare(&self, other: &Value, memory: &Memory) -> i32 {
        match (self.is_null(), other.is_null()) {
            (true, true) => return 0,
            (true, false) => return -1,
            (false, true) => return 1,
            (false, false) => {}
        }

        if let (Some(left), Some(right)) = (self.number(memory), other.number(memory)) {
            return left.signum_of_difference(right);
        }

        match self.eval(memory).cmp(&other.eval(memory)) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::new(text)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::new(text)
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        Value::new(number.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::new(if value { "true" } else { "false" })
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::new(value.to_string())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Const(text) => write!(f, "{text:?}"),
            Value::Lazy(_) => write!(f, "<lazy>"),
            Value::Glued(values) => f.debug_list().entries(values.iter()).finish(),
        }
    }
}
