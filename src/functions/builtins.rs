//! Built-in helper functions available to every template

use std::cmp::Ordering;

use super::registry::FunctionError;
use crate::value::Value;

/// Signature of a built-in helper
pub type Builtin = fn(&[Value]) -> Result<Value, FunctionError>;

static BUILTINS: &[(&str, Builtin)] = &[
    ("and", and as Builtin),
    ("or", or as Builtin),
    ("not", not as Builtin),
    ("eq", eq as Builtin),
    ("ne", ne as Builtin),
    ("lt", lt as Builtin),
    ("le", le as Builtin),
    ("gt", gt as Builtin),
    ("ge", ge as Builtin),
    ("len", len as Builtin),
    ("index", index as Builtin),
    ("print", print as Builtin),
    ("println", println as Builtin),
    ("upper", upper as Builtin),
    ("lower", lower as Builtin),
    ("trim", trim as Builtin),
    ("join", join as Builtin),
    ("repeat", repeat as Builtin),
];

/// Longest string `repeat` may produce
const MAX_REPEAT_LEN: usize = 1 << 24;

/// Look up a built-in helper by name
pub fn builtin(name: &str) -> Option<Builtin> {
    BUILTINS.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}

/// Names of all built-in helpers
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(name, _)| *name)
}

pub(crate) fn all() -> &'static [(&'static str, Builtin)] {
    BUILTINS
}

fn expect_arity(name: &str, args: &[Value], expected: usize) -> Result<(), FunctionError> {
    if args.len() != expected {
        return Err(format!(
            "{}: expected {} argument(s), got {}",
            name,
            expected,
            args.len()
        )
        .into());
    }
    Ok(())
}

fn expect_str<'a>(name: &str, value: &'a Value) -> Result<&'a str, FunctionError> {
    value
        .as_str()
        .ok_or_else(|| format!("{}: expected string, got {}", name, value.kind_name()).into())
}

fn and(args: &[Value]) -> Result<Value, FunctionError> {
    let (last, rest) = args.split_last().ok_or("and: expected at least 1 argument")?;
    Ok(rest
        .iter()
        .find(|v| !v.is_truthy())
        .unwrap_or(last)
        .clone())
}

fn or(args: &[Value]) -> Result<Value, FunctionError> {
    let (last, rest) = args.split_last().ok_or("or: expected at least 1 argument")?;
    Ok(rest.iter().find(|v| v.is_truthy()).unwrap_or(last).clone())
}

fn not(args: &[Value]) -> Result<Value, FunctionError> {
    expect_arity("not", args, 1)?;
    Ok(Value::Bool(!args[0].is_truthy()))
}

fn values_equal(a: &Value, b: &Value) -> Result<bool, FunctionError> {
    match (a, b) {
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => {
            Ok((*x as f64) == *y)
        }
        (Value::Nil, _) | (_, Value::Nil) => Ok(a == b),
        _ if a.kind_name() == b.kind_name() => Ok(a == b),
        _ => Err(format!(
            "incompatible types for comparison: {} and {}",
            a.kind_name(),
            b.kind_name()
        )
        .into()),
    }
}

/// True when the first argument equals any of the others
fn eq(args: &[Value]) -> Result<Value, FunctionError> {
    let (first, rest) = args.split_first().ok_or("eq: expected at least 2 arguments")?;
    if rest.is_empty() {
        return Err("eq: expected at least 2 arguments".into());
    }
    for other in rest {
        if values_equal(first, other)? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

fn ne(args: &[Value]) -> Result<Value, FunctionError> {
    expect_arity("ne", args, 2)?;
    Ok(Value::Bool(!values_equal(&args[0], &args[1])?))
}

fn compare(name: &str, args: &[Value]) -> Result<Ordering, FunctionError> {
    expect_arity(name, args, 2)?;
    let ordering = match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
        (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (a, b) => {
            return Err(format!(
                "{}: cannot compare {} and {}",
                name,
                a.kind_name(),
                b.kind_name()
            )
            .into())
        }
    };
    ordering.ok_or_else(|| format!("{}: values are not comparable", name).into())
}

fn lt(args: &[Value]) -> Result<Value, FunctionError> {
    Ok(Value::Bool(compare("lt", args)? == Ordering::Less))
}

fn le(args: &[Value]) -> Result<Value, FunctionError> {
    Ok(Value::Bool(compare("le", args)? != Ordering::Greater))
}

fn gt(args: &[Value]) -> Result<Value, FunctionError> {
    Ok(Value::Bool(compare("gt", args)? == Ordering::Greater))
}

fn ge(args: &[Value]) -> Result<Value, FunctionError> {
    Ok(Value::Bool(compare("ge", args)? != Ordering::Less))
}

/// Length in characters, elements or entries
fn len(args: &[Value]) -> Result<Value, FunctionError> {
    expect_arity("len", args, 1)?;
    let n = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(map) => map.len(),
        other => return Err(format!("len of {}", other.kind_name()).into()),
    };
    Ok(Value::from(n))
}

/// `index collection key...` walks lists by integer and maps by string key
fn index(args: &[Value]) -> Result<Value, FunctionError> {
    let (collection, keys) = args.split_first().ok_or("index: expected at least 1 argument")?;
    let mut current = collection.clone();
    for key in keys {
        current = match (&current, key) {
            (Value::List(items), Value::Int(i)) => usize::try_from(*i)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or_else(|| format!("index out of range: {}", i))?,
            (Value::Map(map), Value::String(k)) => map.get(k).cloned().unwrap_or(Value::Nil),
            (Value::Record(record), Value::String(k)) => record
                .get(k)
                .cloned()
                .ok_or_else(|| format!("record has no field {}", k))?,
            (c, k) => {
                return Err(format!("cannot index {} with {}", c.kind_name(), k.kind_name()).into())
            }
        };
    }
    Ok(current)
}

/// Concatenate operands, adding spaces between operands when neither is a string
fn print(args: &[Value]) -> Result<Value, FunctionError> {
    let mut out = String::new();
    for (i, value) in args.iter().enumerate() {
        if i > 0 {
            let prev_is_string = matches!(args[i - 1], Value::String(_));
            let is_string = matches!(value, Value::String(_));
            if !prev_is_string && !is_string {
                out.push(' ');
            }
        }
        out.push_str(&value.to_string());
    }
    Ok(Value::String(out))
}

/// Operands separated by spaces, followed by a newline
fn println(args: &[Value]) -> Result<Value, FunctionError> {
    let mut out = args
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    out.push('\n');
    Ok(Value::String(out))
}

fn upper(args: &[Value]) -> Result<Value, FunctionError> {
    expect_arity("upper", args, 1)?;
    Ok(Value::String(expect_str("upper", &args[0])?.to_uppercase()))
}

fn lower(args: &[Value]) -> Result<Value, FunctionError> {
    expect_arity("lower", args, 1)?;
    Ok(Value::String(expect_str("lower", &args[0])?.to_lowercase()))
}

fn trim(args: &[Value]) -> Result<Value, FunctionError> {
    expect_arity("trim", args, 1)?;
    Ok(Value::String(expect_str("trim", &args[0])?.trim().to_string()))
}

/// `join list separator`
fn join(args: &[Value]) -> Result<Value, FunctionError> {
    expect_arity("join", args, 2)?;
    let separator = expect_str("join", &args[1])?;
    match &args[0] {
        Value::List(items) => Ok(Value::String(
            items
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(separator),
        )),
        other => Err(format!("join: expected list, got {}", other.kind_name()).into()),
    }
}

/// `repeat string count`
fn repeat(args: &[Value]) -> Result<Value, FunctionError> {
    expect_arity("repeat", args, 2)?;
    let text = expect_str("repeat", &args[0])?;
    let count = args[1]
        .as_int()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or("repeat: count must be a non-negative integer")?;
    match text.len().checked_mul(count) {
        Some(len) if len <= MAX_REPEAT_LEN => Ok(Value::String(text.repeat(count))),
        _ => Err(format!("repeat: result longer than {} bytes", MAX_REPEAT_LEN).into()),
    }
}
