//! Native callables.
//!
//! [`install`] injects the global registry into one top-level environment
//! (the script's globals, and each module's own top level).  The rest of the
//! module is the method tables for builtin value kinds: every entry is a
//! closure bound to the receiver, handed out on property access.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::info;

use crate::environment::Environment;
use crate::file::FileHandle;
use crate::value::{stringify, Builtin, Value};

pub fn install(globals: &Rc<RefCell<Environment>>) {
    info!("Installing builtin registry");

    let mut env = globals.borrow_mut();

    env.define("clock", Builtin::new("clock", 0, clock));
    env.define("len", Builtin::new("len", 1, len));
    env.define("range", Builtin::new("range", -1, range));
    env.define("assert", Builtin::new("assert", 2, assert_builtin));
    env.define("type", Builtin::new("type", 1, type_builtin));
    env.define("is_truthy", Builtin::new("is_truthy", 1, is_truthy));
    env.define("is_falsey", Builtin::new("is_falsey", 1, is_falsey));
    env.define("str", Builtin::new("str", 1, str_builtin));
    env.define("open", Builtin::new("open", 2, open));
}

// ─────────────────────────────────────────────────────────────────────────
// Registry bodies
// ─────────────────────────────────────────────────────────────────────────

fn clock(_args: &[Value]) -> Result<Value, String> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("Clock error: {}", e))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}

fn len(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
        Value::List(elements) => Ok(Value::Number(elements.borrow().len() as f64)),
        Value::Dict(entries) => Ok(Value::Number(entries.borrow().len() as f64)),
        other => Err(format!("len() not supported for type {}", other.type_name())),
    }
}

/// range(end) / range(start, end) / range(start, end, step)
fn range(args: &[Value]) -> Result<Value, String> {
    let number = |value: &Value| -> Result<f64, String> {
        match value {
            Value::Number(n) => Ok(*n),
            other => Err(format!(
                "range() expects numbers, got {}",
                other.type_name()
            )),
        }
    };

    let (start, end, step) = match args {
        [end] => (0.0, number(end)?, 1.0),
        [start, end] => (number(start)?, number(end)?, 1.0),
        [start, end, step] => (number(start)?, number(end)?, number(step)?),
        _ => return Err("range() expects 1 to 3 arguments.".to_string()),
    };

    if step == 0.0 {
        return Err("range() step must not be zero.".to_string());
    }

    let mut result: Vec<Value> = Vec::new();

    let mut current = start;
    if step > 0.0 {
        while current < end {
            result.push(Value::Number(current));
            current += step;
        }
    } else {
        while current > end {
            result.push(Value::Number(current));
            current += step;
        }
    }

    Ok(Value::list(result))
}

fn assert_builtin(args: &[Value]) -> Result<Value, String> {
    if args[0].is_truthy() {
        Ok(Value::Nil)
    } else {
        Err(format!("Assertion failed: {}", stringify(&args[1])))
    }
}

fn type_builtin(args: &[Value]) -> Result<Value, String> {
    Ok(Value::String(args[0].type_name().to_string()))
}

/// Container-aware predicate for scripts.  Distinct from language-level
/// truthiness: empty strings and collections count as falsey here.
fn container_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::List(elements) => !elements.borrow().is_empty(),
        Value::Dict(entries) => !entries.borrow().is_empty(),
        _ => true,
    }
}

fn is_truthy(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Bool(container_truthy(&args[0])))
}

fn is_falsey(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Bool(!container_truthy(&args[0])))
}

fn str_builtin(args: &[Value]) -> Result<Value, String> {
    Ok(Value::String(stringify(&args[0])))
}

fn open(args: &[Value]) -> Result<Value, String> {
    let (path, mode) = match (&args[0], &args[1]) {
        (Value::String(path), Value::String(mode)) => (path, mode),
        _ => return Err("open(path, mode) expects strings".to_string()),
    };

    let handle = FileHandle::open(path, mode)?;

    Ok(Value::File(Rc::new(RefCell::new(handle))))
}

// ─────────────────────────────────────────────────────────────────────────
// List methods
// ─────────────────────────────────────────────────────────────────────────

pub fn list_method(list: &Rc<RefCell<Vec<Value>>>, name: &str) -> Option<Value> {
    match name {
        "append" => {
            let list = Rc::clone(list);
            Some(Builtin::new("append", 1, move |args| {
                list.borrow_mut().push(args[0].clone());
                Ok(Value::Nil)
            }))
        }

        "pop" => {
            let list = Rc::clone(list);
            Some(Builtin::new("pop", 0, move |_| {
                Ok(list.borrow_mut().pop().unwrap_or(Value::Nil))
            }))
        }

        "insert" => {
            let list = Rc::clone(list);
            Some(Builtin::new("insert", 2, move |args| {
                let index = match &args[0] {
                    Value::Number(n) => *n as i64,
                    _ => return Ok(Value::Nil),
                };

                let mut elements = list.borrow_mut();
                if index < 0 || index as usize > elements.len() {
                    return Ok(Value::Nil);
                }

                elements.insert(index as usize, args[1].clone());
                Ok(Value::Nil)
            }))
        }

        "remove" => {
            let list = Rc::clone(list);
            Some(Builtin::new("remove", 1, move |args| {
                let index = match &args[0] {
                    Value::Number(n) => *n as i64,
                    _ => return Ok(Value::Nil),
                };

                let mut elements = list.borrow_mut();
                if index < 0 || index as usize >= elements.len() {
                    return Ok(Value::Nil);
                }

                elements.remove(index as usize);
                Ok(Value::Nil)
            }))
        }

        "clear" => {
            let list = Rc::clone(list);
            Some(Builtin::new("clear", 0, move |_| {
                list.borrow_mut().clear();
                Ok(Value::Nil)
            }))
        }

        "length" => {
            let list = Rc::clone(list);
            Some(Builtin::new("length", 0, move |_| {
                Ok(Value::Number(list.borrow().len() as f64))
            }))
        }

        "contains" => {
            let list = Rc::clone(list);
            Some(Builtin::new("contains", 1, move |args| {
                Ok(Value::Bool(
                    list.borrow().iter().any(|element| element == &args[0]),
                ))
            }))
        }

        "index_of" => {
            let list = Rc::clone(list);
            Some(Builtin::new("index_of", 1, move |args| {
                match list.borrow().iter().position(|element| element == &args[0]) {
                    Some(index) => Ok(Value::Number(index as f64)),
                    None => Ok(Value::Nil),
                }
            }))
        }

        "reverse" => {
            let list = Rc::clone(list);
            Some(Builtin::new("reverse", 0, move |_| {
                list.borrow_mut().reverse();
                Ok(Value::Nil)
            }))
        }

        "join" => {
            let list = Rc::clone(list);
            Some(Builtin::new("join", 1, move |args| {
                let separator = match &args[0] {
                    Value::String(s) => s.clone(),
                    _ => return Ok(Value::Nil),
                };

                let parts: Vec<String> =
                    list.borrow().iter().map(stringify).collect();

                Ok(Value::String(parts.join(&separator)))
            }))
        }

        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Dict methods
// ─────────────────────────────────────────────────────────────────────────

pub fn dict_method(dict: &Rc<RefCell<HashMap<String, Value>>>, name: &str) -> Option<Value> {
    match name {
        "get" => {
            let dict = Rc::clone(dict);
            Some(Builtin::new("get", 1, move |args| {
                let key = string_key(&args[0], "get")?;
                Ok(dict.borrow().get(&key).cloned().unwrap_or(Value::Nil))
            }))
        }

        "set" => {
            let dict = Rc::clone(dict);
            Some(Builtin::new("set", 2, move |args| {
                let key = string_key(&args[0], "set")?;
                dict.borrow_mut().insert(key, args[1].clone());
                Ok(Value::Nil)
            }))
        }

        "remove" => {
            let dict = Rc::clone(dict);
            Some(Builtin::new("remove", 1, move |args| {
                let key = string_key(&args[0], "remove")?;
                Ok(Value::Bool(dict.borrow_mut().remove(&key).is_some()))
            }))
        }

        "keys" => {
            let dict = Rc::clone(dict);
            Some(Builtin::new("keys", 0, move |_| {
                Ok(Value::list(
                    dict.borrow()
                        .keys()
                        .map(|key| Value::String(key.clone()))
                        .collect(),
                ))
            }))
        }

        "values" => {
            let dict = Rc::clone(dict);
            Some(Builtin::new("values", 0, move |_| {
                Ok(Value::list(dict.borrow().values().cloned().collect()))
            }))
        }

        "clear" => {
            let dict = Rc::clone(dict);
            Some(Builtin::new("clear", 0, move |_| {
                dict.borrow_mut().clear();
                Ok(Value::Nil)
            }))
        }

        "contains" => {
            let dict = Rc::clone(dict);
            Some(Builtin::new("contains", 1, move |args| match &args[0] {
                Value::String(key) => Ok(Value::Bool(dict.borrow().contains_key(key))),
                _ => Ok(Value::Bool(false)),
            }))
        }

        "length" => {
            let dict = Rc::clone(dict);
            Some(Builtin::new("length", 0, move |_| {
                Ok(Value::Number(dict.borrow().len() as f64))
            }))
        }

        _ => None,
    }
}

fn string_key(value: &Value, method: &str) -> Result<String, String> {
    match value {
        Value::String(key) => Ok(key.clone()),
        other => Err(format!(
            "dict.{}: key must be a string, got {}",
            method,
            other.type_name()
        )),
    }
}

// ─────────────────────────────────────────────────────────────────────────
// String methods
// ─────────────────────────────────────────────────────────────────────────

pub fn string_method(text: &str, name: &str) -> Option<Value> {
    match name {
        "length" => {
            let text = text.to_string();
            Some(Builtin::new("length", 0, move |_| {
                Ok(Value::Number(text.chars().count() as f64))
            }))
        }

        "upper" => {
            let text = text.to_string();
            Some(Builtin::new("upper", 0, move |_| {
                Ok(Value::String(text.to_uppercase()))
            }))
        }

        "lower" => {
            let text = text.to_string();
            Some(Builtin::new("lower", 0, move |_| {
                Ok(Value::String(text.to_lowercase()))
            }))
        }

        "split" => {
            let text = text.to_string();
            Some(Builtin::new("split", 1, move |args| {
                let separator = match &args[0] {
                    Value::String(s) => s.clone(),
                    other => {
                        return Err(format!(
                            "split() expects a string separator, got {}",
                            other.type_name()
                        ))
                    }
                };

                let parts: Vec<Value> = if separator.is_empty() {
                    text.chars().map(|c| Value::String(c.to_string())).collect()
                } else {
                    text.split(&separator)
                        .map(|part| Value::String(part.to_string()))
                        .collect()
                };

                Ok(Value::list(parts))
            }))
        }

        "replace" => {
            let text = text.to_string();
            Some(Builtin::new("replace", 2, move |args| {
                match (&args[0], &args[1]) {
                    (Value::String(from), Value::String(to)) => {
                        Ok(Value::String(text.replace(from.as_str(), to)))
                    }
                    _ => Err("replace(from, to) expects strings".to_string()),
                }
            }))
        }

        "contains" => {
            let text = text.to_string();
            Some(Builtin::new("contains", 1, move |args| match &args[0] {
                Value::String(needle) => Ok(Value::Bool(text.contains(needle.as_str()))),
                other => Err(format!(
                    "contains() expects a string, got {}",
                    other.type_name()
                )),
            }))
        }

        "index_of" => {
            let text = text.to_string();
            Some(Builtin::new("index_of", 1, move |args| match &args[0] {
                Value::String(needle) => match text.find(needle.as_str()) {
                    Some(byte_index) => {
                        Ok(Value::Number(text[..byte_index].chars().count() as f64))
                    }
                    None => Ok(Value::Nil),
                },
                other => Err(format!(
                    "index_of() expects a string, got {}",
                    other.type_name()
                )),
            }))
        }

        "last_index_of" => {
            let text = text.to_string();
            Some(Builtin::new("last_index_of", 1, move |args| {
                match &args[0] {
                    Value::String(needle) => match text.rfind(needle.as_str()) {
                        Some(byte_index) => {
                            Ok(Value::Number(text[..byte_index].chars().count() as f64))
                        }
                        None => Ok(Value::Nil),
                    },
                    other => Err(format!(
                        "last_index_of() expects a string, got {}",
                        other.type_name()
                    )),
                }
            }))
        }

        "trim" => {
            let text = text.to_string();
            Some(Builtin::new("trim", 0, move |_| {
                Ok(Value::String(text.trim().to_string()))
            }))
        }

        "to_number" => {
            let text = text.to_string();
            Some(Builtin::new("to_number", 0, move |_| {
                match text.trim().parse::<f64>() {
                    Ok(number) => Ok(Value::Number(number)),
                    Err(_) => Ok(Value::Nil),
                }
            }))
        }

        _ => None,
    }
}
