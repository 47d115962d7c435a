//! Argument coercion against a tool's parameter list.
//!
//! Clients (and the language models behind them) are loose about JSON types:
//! `"5"` arrives where `5` was declared, `2.0` where an integer was expected.
//! Coercion is best-effort; a value that cannot be brought to its declared
//! type is an [`ToolError::InvalidArguments`].

use serde_json::{Map, Number, Value};

use super::ToolError;
use super::schema::{ParameterSpec, TypeTag};

/// Named tool arguments as they arrive on the wire.
pub type ToolArguments = Map<String, Value>;

/// Validate and coerce `args` against `params`, filling in defaults.
///
/// The result contains exactly the declared parameters that are either
/// supplied or defaulted, in declaration order.
pub fn coerce_arguments(
    params: &[ParameterSpec],
    mut args: ToolArguments,
) -> Result<ToolArguments, ToolError> {
    if let Some(unexpected) = args
        .keys()
        .find(|key| !params.iter().any(|p| &p.name == *key))
    {
        return Err(ToolError::invalid_arguments(format!(
            "unexpected argument '{unexpected}'"
        )));
    }

    let mut coerced = Map::with_capacity(params.len());
    for param in params {
        match args.remove(&param.name) {
            None | Some(Value::Null) => {
                if param.required {
                    return Err(ToolError::invalid_arguments(format!(
                        "missing required argument '{}'",
                        param.name
                    )));
                }
                if let Some(default) = &param.default {
                    coerced.insert(param.name.clone(), default.clone());
                }
            }
            Some(value) => {
                coerced.insert(param.name.clone(), coerce_value(param, value)?);
            }
        }
    }

    Ok(coerced)
}

/// Bring one value to the parameter's declared type.
fn coerce_value(param: &ParameterSpec, value: Value) -> Result<Value, ToolError> {
    let coerced = match (param.type_tag, value) {
        (TypeTag::Unknown, value) => Some(value),

        (TypeTag::String, Value::String(s)) => Some(Value::String(s)),
        (TypeTag::String, Value::Number(n)) => Some(Value::String(n.to_string())),
        (TypeTag::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

        (TypeTag::Integer, Value::Number(n)) => integer_from_number(&n),
        (TypeTag::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),

        (TypeTag::Number, Value::Number(n)) => Some(Value::Number(n)),
        (TypeTag::Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),

        (TypeTag::Boolean, Value::Bool(b)) => Some(Value::Bool(b)),
        (TypeTag::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(Value::Bool(true)),
            "false" | "0" | "no" => Some(Value::Bool(false)),
            _ => None,
        },

        (TypeTag::Object, Value::Object(o)) => Some(Value::Object(o)),
        (TypeTag::Object, Value::String(s)) => {
            serde_json::from_str::<Value>(&s).ok().filter(Value::is_object)
        }

        (TypeTag::Array, Value::Array(a)) => Some(Value::Array(a)),
        (TypeTag::Array, Value::String(s)) => {
            serde_json::from_str::<Value>(&s).ok().filter(Value::is_array)
        }

        (tag, value) => {
            return Err(mismatch(&param.name, tag, &value));
        }
    };

    coerced.ok_or_else(|| {
        ToolError::invalid_arguments(format!(
            "argument '{}' cannot be converted to {}",
            param.name, param.type_tag
        ))
    })
}

fn integer_from_number(n: &Number) -> Option<Value> {
    if n.is_i64() || n.is_u64() {
        return Some(Value::Number(n.clone()));
    }
    n.as_f64()
        .filter(|f| f.is_finite() && f.fract() == 0.0)
        .filter(|f| *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
        .map(|f| Value::from(f as i64))
}

fn mismatch(name: &str, expected: TypeTag, got: &Value) -> ToolError {
    let kind = match got {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    ToolError::invalid_arguments(format!("argument '{name}' expects {expected}, got {kind}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::schema::ToolSchema;
    use serde_json::json;

    fn params() -> Vec<ParameterSpec> {
        ToolSchema::builder("")
            .required("text", TypeTag::String)
            .optional("times", TypeTag::Integer, 1)
            .optional("ratio", TypeTag::Number, 0.5)
            .optional("loud", TypeTag::Boolean, false)
            .optional("tags", TypeTag::Array, json!([]))
            .optional("meta", TypeTag::Object, json!({}))
            .optional("anything", TypeTag::Unknown, Value::Null)
            .build()
            .unwrap()
            .parameters
    }

    fn args(value: Value) -> ToolArguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_defaults_are_filled() {
        let coerced = coerce_arguments(&params(), args(json!({"text": "hi"}))).unwrap();
        assert_eq!(coerced["text"], "hi");
        assert_eq!(coerced["times"], 1);
        assert_eq!(coerced["loud"], false);
        assert_eq!(coerced["anything"], Value::Null);
    }

    #[test]
    fn test_missing_required() {
        let err = coerce_arguments(&params(), args(json!({"times": 2}))).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(ref m) if m.contains("text")));
    }

    #[test]
    fn test_null_required_is_missing() {
        let err = coerce_arguments(&params(), args(json!({"text": null}))).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn test_unexpected_argument() {
        let err =
            coerce_arguments(&params(), args(json!({"text": "a", "bogus": 1}))).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(ref m) if m.contains("bogus")));
    }

    #[test]
    fn test_loose_values_are_coerced() {
        let coerced = coerce_arguments(
            &params(),
            args(json!({
                "text": 42,
                "times": "3",
                "ratio": "0.25",
                "loud": "yes",
                "tags": "[1, 2]",
                "meta": "{\"a\": 1}",
                "anything": [true]
            })),
        )
        .unwrap();

        assert_eq!(coerced["text"], "42");
        assert_eq!(coerced["times"], 3);
        assert_eq!(coerced["ratio"], 0.25);
        assert_eq!(coerced["loud"], true);
        assert_eq!(coerced["tags"], json!([1, 2]));
        assert_eq!(coerced["meta"], json!({"a": 1}));
        assert_eq!(coerced["anything"], json!([true]));
    }

    #[test]
    fn test_whole_float_becomes_integer() {
        let coerced =
            coerce_arguments(&params(), args(json!({"text": "a", "times": 2.0}))).unwrap();
        assert_eq!(coerced["times"], 2);
    }

    #[test]
    fn test_uncoercible_values() {
        for bad in [
            json!({"text": "a", "times": 2.5}),
            json!({"text": "a", "times": "two"}),
            json!({"text": "a", "loud": "maybe"}),
            json!({"text": "a", "tags": {"not": "array"}}),
            json!({"text": "a", "meta": "[1]"}),
            json!({"text": ["a"]}),
        ] {
            let result = coerce_arguments(&params(), args(bad.clone()));
            assert!(
                matches!(result, Err(ToolError::InvalidArguments(_))),
                "expected failure for {bad}"
            );
        }
    }
}
