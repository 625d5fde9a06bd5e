//! Declared-parameter loading and type coercion.

use praxis_core::{AttributeMap, ParamDescriptor, ParamType, RestError, RestResult, Value};
use serde_json::Map;

/// Loads the declared parameters from a raw parameter map.
///
/// Present values are coerced to the declared type; absent values fall
/// back to the declared default silently; absent required values fail
/// with a missing-parameter error. Undeclared context entries are not
/// copied through.
pub fn load_params(
    declared: &[ParamDescriptor],
    context: &AttributeMap,
) -> RestResult<AttributeMap> {
    let mut params = AttributeMap::new();
    for descriptor in declared {
        let value = match context.get(&descriptor.name) {
            Some(value) => value.clone(),
            None if descriptor.required => {
                return Err(RestError::missing_parameter(descriptor.name.clone()));
            }
            None => match &descriptor.default {
                Some(default) => default.clone(),
                None => continue,
            },
        };
        params.insert(
            descriptor.name.clone(),
            cast_value(descriptor.param_type, &value),
        );
    }
    Ok(params)
}

/// Coerces a wire value to a declared parameter type.
///
/// Coercion is forgiving in the way dynamic languages cast: numeric
/// strings become numbers, anything non-empty is truthy, scalars wrap
/// into one-element arrays. Unconvertible values fall back to a zero
/// value rather than failing.
#[must_use]
pub fn cast_value(param_type: ParamType, value: &Value) -> Value {
    match param_type {
        ParamType::String => match value {
            Value::String(_) => value.clone(),
            Value::Null => Value::String(String::new()),
            other => Value::String(other.to_string()),
        },
        ParamType::Integer => Value::from(to_i64(value)),
        ParamType::Float => {
            serde_json::Number::from_f64(to_f64(value)).map_or(Value::from(0), Value::Number)
        }
        ParamType::Boolean => Value::Bool(truthy(value)),
        ParamType::Array => match value {
            Value::Array(_) => value.clone(),
            Value::Null => Value::Array(Vec::new()),
            other => Value::Array(vec![other.clone()]),
        },
        ParamType::Object => match value {
            Value::Object(_) => value.clone(),
            Value::Null => Value::Object(Map::new()),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other.clone());
                Value::Object(map)
            }
        },
    }
}

fn to_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or_else(|| {
            n.as_f64().map_or(0, |f| {
                if f.is_finite() {
                    // Fractional values truncate toward zero.
                    f.trunc() as i64
                } else {
                    0
                }
            })
        }),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        Value::Bool(true) => 1,
        _ => 0,
    }
}

fn to_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0" && s != "false",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
