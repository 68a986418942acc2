use itertools::Itertools;
use regex_lite::{Captures, Regex};
use serde_json::{Map, Value as Json};

use crate::{
    diagnostic::{Message, MessageKind},
    reference::Reference,
    runtime::{BufferConsole, Console, Environment, ExecutionError, Memory, Value, json},
};

use super::{Arithmetic, Instruction, Op, Pack};

type Origin = Option<Reference>;

impl Instruction {
    /// Runs the instruction against `memory`.
    ///
    /// An error aborts the run where it happens; frames and consoles
    /// acquired by enclosing instructions are left as they are.
    pub fn exec(&self, environment: &Environment, memory: &mut Memory) -> Result<(), ExecutionError> {
        let origin = &self.reference;

        match &self.op {
            Op::Idle => {}
            Op::Block(instructions) => {
                for instruction in instructions {
                    instruction.exec(environment, memory)?;
                }
            }

            Op::PushConst(value) => memory.push(value.clone()),
            Op::Dup => {
                let a = memory.pop(origin)?;
                memory.push(a.clone());
                memory.push(a);
            }
            Op::Swap => {
                let b = memory.pop(origin)?;
                let a = memory.pop(origin)?;
                memory.push(b);
                memory.push(a);
            }
            Op::Swap3 => {
                let c = memory.pop(origin)?;
                let b = memory.pop(origin)?;
                let a = memory.pop(origin)?;
                memory.push(c);
                memory.push(b);
                memory.push(a);
            }
            Op::Swap4 => {
                let d = memory.pop(origin)?;
                let c = memory.pop(origin)?;
                let b = memory.pop(origin)?;
                let a = memory.pop(origin)?;
                memory.push(d);
                memory.push(b);
                memory.push(c);
                memory.push(a);
            }
            Op::Pop => {
                memory.pop(origin)?;
            }

            Op::PushFrame => memory.push_frame(origin.clone()),
            Op::PopFrame => {
                memory.pop_frame(origin)?;
            }
            Op::GlueFrame => glue(memory),
            Op::DumpFrame => {
                glue(memory);
                memory.pop_frame(origin)?;
            }
            Op::Pack(kind) => {
                let values = memory.drain_frame();
                memory.pop_frame(origin)?;
                let packed = pack(*kind, &values, memory, origin)?;
                memory.push(Value::new(packed.to_string()));
            }

            Op::Alloc => {
                let value = memory.pop(origin)?;
                let address = memory.pop(origin)?.eval(memory);
                memory.alloc(address, value);
            }
            Op::Access => {
                let address = memory.pop(origin)?.eval(memory);
                let value = memory.access(&address);
                memory.push(value);
            }
            Op::Defined => {
                let value = memory.pop(origin)?;
                memory.push(Value::from(!value.is_null()));
            }

            Op::Get => {
                let key = memory.pop(origin)?.eval(memory);
                let object = memory.pop(origin)?.eval(memory);
                let value = match json::decode(&object) {
                    Json::Object(map) => map.get(&key).map(json::encode),
                    Json::Array(array) => key
                        .trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|index| array.get(index))
                        .map(json::encode),
                    _ => {
                        return Err(ExecutionError::illegal(
                            origin,
                            format!("GET expected an object or an array but got `{object}`"),
                        ));
                    }
                };
                memory.push(value.unwrap_or_default());
            }
            Op::Pair => {
                let value = memory.pop(origin)?;
                let key = memory.pop(origin)?.eval(memory);
                let mut map = Map::new();
                map.insert(key, to_json(&value, memory));
                memory.push(Value::new(Json::Object(map).to_string()));
            }
            Op::Put => {
                let other = memory.pop(origin)?;
                let object = memory.pop(origin)?;
                let mut map = object_of(&object, memory, origin, "PUT")?;
                map.extend(object_of(&other, memory, origin, "PUT")?);
                memory.push(Value::new(Json::Object(map).to_string()));
            }
            Op::Remove => {
                let key = memory.pop(origin)?.eval(memory);
                let object = memory.pop(origin)?;
                let mut map = object_of(&object, memory, origin, "REMOVE")?;
                map.remove(&key);
                memory.push(Value::new(Json::Object(map).to_string()));
            }
            Op::Spread => {
                let array = memory.pop(origin)?.eval(memory);
                let elements = json::decode_array(&array).ok_or_else(|| {
                    ExecutionError::illegal(origin, format!("SPREAD expected an array but got `{array}`"))
                })?;
                for element in elements.iter().rev() {
                    memory.push(json::encode(element));
                }
            }

            Op::Compare => {
                let right = memory.pop(origin)?;
                let left = memory.pop(origin)?;
                let order = left.compare(&right, memory);
                memory.push(Value::from(order));
            }
            Op::Equals => {
                let right = memory.pop(origin)?;
                let left = memory.pop(origin)?;
                let equal = match (left.is_null(), right.is_null()) {
                    (true, true) => true,
                    (false, false) => left.eval(memory) == right.eval(memory),
                    _ => false,
                };
                memory.push(Value::from(equal));
            }
            Op::Not => {
                let value = memory.pop(origin)?;
                let result = !value.is_truthy(memory);
                memory.push(Value::from(result));
            }
            Op::And => {
                let right = memory.pop(origin)?;
                let left = memory.pop(origin)?;
                let result = left.is_truthy(memory) && right.is_truthy(memory);
                memory.push(Value::from(result));
            }
            Op::Or => {
                let right = memory.pop(origin)?;
                let left = memory.pop(origin)?;
                let result = left.is_truthy(memory) || right.is_truthy(memory);
                memory.push(Value::from(result));
            }
            Op::Negate => {
                let value = memory.pop(origin)?;
                let number = value.number(memory).ok_or_else(|| {
                    ExecutionError::illegal(origin, format!("NEG expected a number but got `{}`", value.eval(memory)))
                })?;
                memory.push(Value::from(-number));
            }
            Op::Arithmetic(kind) => {
                let right = memory.pop(origin)?;
                let left = memory.pop(origin)?;
                let result = arithmetic(*kind, &left, &right, memory, origin)?;
                memory.push(result);
            }

            Op::Print => {
                let text = memory.pop(origin)?.eval(memory);
                memory.print(&text);
            }
            Op::PrintConst(text) => memory.print(text),
            Op::Replace => {
                let definitions = memory.pop(origin)?.eval(memory);
                let text = memory.pop(origin)?.eval(memory);
                let replaced = replace(text, &definitions, memory);
                memory.push(Value::new(replaced));
            }
            Op::Console => {
                let name = memory.pop(origin)?.eval(memory);
                tracing::debug!(output = %name, "redirecting console");
                let buffer = memory.output(&name);
                let mut previous = memory.set_console(Box::new(buffer));
                previous.close();
                memory.alloc_global("__OUTPUT__", Value::new(name));
            }
            Op::Message => {
                let text = memory.pop(origin)?.eval(memory);
                let mut message = Message::new(MessageKind::Note, text);
                if let Some(reference) = origin {
                    message = message.with_reference(reference.clone());
                }
                environment.report(message.with_references(memory.trace()));
            }
            Op::Fail => {
                let message = memory.pop(origin)?.eval(memory);
                return Err(ExecutionError::UserDefined {
                    reference: origin.clone(),
                    message,
                });
            }

            Op::Branch { then, otherwise } => {
                let condition = memory.pop(origin)?;
                if condition.is_truthy(memory) {
                    then.exec(environment, memory)?;
                } else {
                    otherwise.exec(environment, memory)?;
                }
            }
            Op::Repeat(body) => loop {
                memory.tick(origin)?;
                body.exec(environment, memory)?;
                let condition = memory.pop(origin)?;
                if !condition.is_truthy(memory) {
                    break;
                }
            },
            Op::Capture(body) => {
                let mut buffer = BufferConsole::new();
                let original = memory.set_console(Box::new(buffer.clone()));
                body.exec(environment, memory)?;
                // The body may have swapped the console again.
                let mut current = memory.set_console(original);
                current.close();
                buffer.close();
                memory.push(Value::new(buffer.read()));
            }
        }

        Ok(())
    }
}

fn glue(memory: &mut Memory) {
    let values = memory.drain_frame();
    memory.push(Value::glue(values));
}

fn to_json(value: &Value, memory: &Memory) -> Json {
    if value.is_null() {
        Json::Null
    } else {
        json::decode(&value.eval(memory))
    }
}

/// Reads `value` as an object. Null and the empty text are the empty object.
fn object_of(value: &Value, memory: &Memory, origin: &Origin, name: &str) -> Result<Map<String, Json>, ExecutionError> {
    let text = value.eval(memory);
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    json::decode_object(&text)
        .ok_or_else(|| ExecutionError::illegal(origin, format!("{name} expected an object but got `{text}`")))
}

fn pack(kind: Pack, values: &[Value], memory: &Memory, origin: &Origin) -> Result<Json, ExecutionError> {
    match kind {
        Pack::Array => Ok(Json::Array(values.iter().map(|value| to_json(value, memory)).collect())),
        Pack::Object => {
            let mut map = Map::new();
            for value in values {
                map.extend(object_of(value, memory, origin, "PACK")?);
            }
            Ok(Json::Object(map))
        }
    }
}

fn arithmetic(
    kind: Arithmetic,
    left: &Value,
    right: &Value,
    memory: &Memory,
    origin: &Origin,
) -> Result<Value, ExecutionError> {
    let numbers = left.number(memory).zip(right.number(memory));

    let Some((l, r)) = numbers else {
        if kind == Arithmetic::Sum {
            return Ok(Value::new(left.eval(memory) + &right.eval(memory)));
        }
        return Err(ExecutionError::illegal(
            origin,
            format!(
                "{} expected two numbers but got `{}` and `{}`",
                kind.name(),
                left.eval(memory),
                right.eval(memory)
            ),
        ));
    };

    let result = match kind {
        Arithmetic::Sum => l + r,
        Arithmetic::Difference => l - r,
        Arithmetic::Product => l * r,
        Arithmetic::Quotient => l
            .checked_div(r)
            .ok_or_else(|| ExecutionError::ZeroDivision(origin.clone()))?,
        Arithmetic::Modulo => l
            .checked_rem(r)
            .ok_or_else(|| ExecutionError::ZeroDivision(origin.clone()))?,
    };

    Ok(Value::from(result))
}

/// Replaces every definition name in `text` in a single pass, preferring the
/// longest name at each position. Substituted values are never scanned again.
fn replace(text: String, definitions: &str, memory: &Memory) -> String {
    let Some(definitions) = json::decode_object(definitions) else {
        return text;
    };

    let pattern = definitions
        .keys()
        .filter(|name| !name.is_empty())
        .sorted_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)))
        .map(|name| regex_lite::escape(name))
        .join("|");
    if pattern.is_empty() {
        return text;
    }

    let names = match Regex::new(&pattern) {
        Ok(names) => names,
        Err(error) => {
            tracing::warn!(%error, "definitions left unreplaced");
            return text;
        }
    };

    names
        .replace_all(&text, |captures: &Captures<'_>| {
            definitions
                .get(&captures[0])
                .map(|value| json::encode(value).eval(memory))
                .unwrap_or_default()
        })
        .into_owned()
}
