//! Allow-listed function library available to bindings.
//!
//! Only the names below can be called; everything else is a runtime error.

use indexmap::IndexMap;

use super::error::ExprError;
use super::value::{format_number, Value};

/// Namespaces that may prefix a call, e.g. `Math.max(a, b)`.
pub const NAMESPACES: &[&str] = &["Math", "JSON", "Object"];

/// Free functions, e.g. `String(x)`.
pub const GLOBALS: &[&str] = &["String", "Number", "Boolean"];

pub fn is_global_name(name: &str) -> bool {
    NAMESPACES.contains(&name) || GLOBALS.contains(&name)
}

pub fn call_global(name: &str, args: &[Value]) -> Result<Value, ExprError> {
    let first = args.first().cloned().unwrap_or(Value::Null);
    match name {
        "String" => Ok(Value::String(first.to_display_string())),
        "Number" => Ok(Value::Number(first.as_number().unwrap_or(f64::NAN))),
        "Boolean" => Ok(Value::Bool(first.is_truthy())),
        _ => Err(not_a_function(name)),
    }
}

pub fn call_namespace(namespace: &str, name: &str, args: &[Value]) -> Result<Value, ExprError> {
    match (namespace, name) {
        ("Math", "max") => Ok(Value::Number(numbers(args)?.into_iter().fold(f64::NEG_INFINITY, f64::max))),
        ("Math", "min") => Ok(Value::Number(numbers(args)?.into_iter().fold(f64::INFINITY, f64::min))),
        ("Math", "round") => unary_math(args, f64::round),
        ("Math", "floor") => unary_math(args, f64::floor),
        ("Math", "ceil") => unary_math(args, f64::ceil),
        ("Math", "abs") => unary_math(args, f64::abs),
        ("JSON", "stringify") => Ok(Value::String(
            args.first().map(|v| v.to_json().to_string()).unwrap_or_default(),
        )),
        ("JSON", "parse") => {
            let text = args.first().and_then(Value::as_str).unwrap_or("null");
            serde_json::from_str::<serde_json::Value>(text)
                .map(Value::from)
                .map_err(|e| ExprError::runtime(format!("JSON.parse failed: {}", e)))
        }
        ("Object", "keys") => match args.first() {
            Some(Value::Map(map)) => Ok(Value::List(map.keys().cloned().map(Value::String).collect())),
            _ => Ok(Value::List(Vec::new())),
        },
        ("Object", "values") => match args.first() {
            Some(Value::Map(map)) => Ok(Value::List(map.values().cloned().collect())),
            _ => Ok(Value::List(Vec::new())),
        },
        _ => Err(not_a_function(&format!("{}.{}", namespace, name))),
    }
}

pub fn call_method(receiver: &Value, name: &str, args: &[Value]) -> Result<Value, ExprError> {
    match (receiver, name) {
        (Value::Null, _) => Err(ExprError::runtime(format!(
            "Cannot read properties of null (reading '{}')",
            name
        ))),
        (Value::String(s), "toUpperCase") => Ok(Value::String(s.to_uppercase())),
        (Value::String(s), "toLowerCase") => Ok(Value::String(s.to_lowercase())),
        (Value::String(s), "trim") => Ok(Value::String(s.trim().to_string())),
        (Value::String(s), "includes") => Ok(Value::Bool(s.contains(&arg_string(args, 0)))),
        (Value::String(s), "startsWith") => Ok(Value::Bool(s.starts_with(&arg_string(args, 0)))),
        (Value::String(s), "endsWith") => Ok(Value::Bool(s.ends_with(&arg_string(args, 0)))),
        (Value::String(s), "indexOf") => Ok(Value::Number(
            s.find(&arg_string(args, 0))
                .map(|byte| s[..byte].chars().count() as f64)
                .unwrap_or(-1.0),
        )),
        (Value::String(s), "split") => {
            let separator = arg_string(args, 0);
            Ok(Value::List(
                s.split(separator.as_str())
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            ))
        }
        (Value::String(s), "slice") => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = slice_bounds(chars.len(), args);
            Ok(Value::String(chars[start..end].iter().collect()))
        }
        (Value::List(items), "includes") => {
            let needle = args.first().cloned().unwrap_or(Value::Null);
            Ok(Value::Bool(items.iter().any(|item| item.strict_eq(&needle))))
        }
        (Value::List(items), "indexOf") => {
            let needle = args.first().cloned().unwrap_or(Value::Null);
            Ok(Value::Number(
                items
                    .iter()
                    .position(|item| item.strict_eq(&needle))
                    .map(|i| i as f64)
                    .unwrap_or(-1.0),
            ))
        }
        (Value::List(items), "join") => {
            let separator = if args.is_empty() { ",".to_string() } else { arg_string(args, 0) };
            Ok(Value::String(
                items
                    .iter()
                    .map(Value::to_display_string)
                    .collect::<Vec<_>>()
                    .join(&separator),
            ))
        }
        (Value::List(items), "slice") => {
            let (start, end) = slice_bounds(items.len(), args);
            Ok(Value::List(items[start..end].to_vec()))
        }
        (Value::Number(n), "toFixed") => {
            let digits = args.first().and_then(Value::as_number).unwrap_or(0.0).clamp(0.0, 20.0) as usize;
            Ok(Value::String(format!("{:.*}", digits, n)))
        }
        (Value::Number(n), "toString") => Ok(Value::String(format_number(*n))),
        (other, "toString") => Ok(Value::String(other.to_display_string())),
        (other, _) => Err(ExprError::runtime(format!(
            "{}.{} is not a function",
            other.type_name(),
            name
        ))),
    }
}

/// Property read on a value, e.g. `list.length` or `row.name`.
pub fn get_property(receiver: &Value, name: &str) -> Result<Value, ExprError> {
    match receiver {
        Value::Null => Err(ExprError::runtime(format!(
            "Cannot read properties of null (reading '{}')",
            name
        ))),
        Value::Loading => Ok(Value::Loading),
        Value::Map(map) => Ok(map.get(name).cloned().unwrap_or(Value::Null)),
        Value::List(items) => {
            if name == "length" {
                return Ok(Value::Number(items.len() as f64));
            }
            Ok(name
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i).cloned())
                .unwrap_or(Value::Null))
        }
        Value::String(s) if name == "length" => Ok(Value::Number(s.chars().count() as f64)),
        _ => Ok(Value::Null),
    }
}

/// Computed index read, e.g. `list[0]` or `row['name']`.
pub fn get_index(receiver: &Value, index: &Value) -> Result<Value, ExprError> {
    match (receiver, index) {
        (Value::List(items), Value::Number(n)) => {
            if *n < 0.0 || n.fract() != 0.0 {
                return Ok(Value::Null);
            }
            Ok(items.get(*n as usize).cloned().unwrap_or(Value::Null))
        }
        (Value::String(s), Value::Number(n)) => Ok(s
            .chars()
            .nth(*n as usize)
            .map(|c| Value::String(c.to_string()))
            .unwrap_or(Value::Null)),
        (_, Value::Loading) => Ok(Value::Loading),
        (receiver, key) => get_property(receiver, &key.to_display_string()),
    }
}

pub fn make_object(fields: Vec<(String, Value)>) -> Value {
    let map: IndexMap<String, Value> = fields.into_iter().collect();
    Value::Map(map)
}

fn numbers(args: &[Value]) -> Result<Vec<f64>, ExprError> {
    args.iter()
        .map(|arg| {
            arg.as_number()
                .ok_or_else(|| ExprError::runtime(format!("expected a number, got {}", arg.type_name())))
        })
        .collect()
}

fn unary_math(args: &[Value], f: fn(f64) -> f64) -> Result<Value, ExprError> {
    let n = numbers(args)?.first().copied().unwrap_or(f64::NAN);
    Ok(Value::Number(f(n)))
}

fn arg_string(args: &[Value], i: usize) -> String {
    args.get(i).map(Value::to_display_string).unwrap_or_default()
}

fn slice_bounds(len: usize, args: &[Value]) -> (usize, usize) {
    let resolve = |v: Option<&Value>, default: usize| -> usize {
        match v.and_then(Value::as_number) {
            Some(n) if n < 0.0 => len.saturating_sub((-n) as usize),
            Some(n) => (n as usize).min(len),
            None => default,
        }
    };
    let start = resolve(args.first(), 0);
    let end = resolve(args.get(1), len);
    (start, end.max(start))
}

fn not_a_function(name: &str) -> ExprError {
    ExprError::runtime(format!("{} is not a function", name))
}
