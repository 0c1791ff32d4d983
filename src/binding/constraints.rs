use serde_json::{Number, Value};

use crate::binding::report::ErrorKind;
use crate::inputs::RawValue;

/// Target type a raw value is coerced into before constraint checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamType {
    #[default]
    Str,
    Int,
    Float,
    Bool,
    Json,
}

/// Declared bounds for one parameter.
///
/// Numeric bounds apply to numeric values, length bounds to strings;
/// checks run in the fixed order gt, ge, lt, le, min_length, max_length
/// and the first failing check is reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub gt: Option<f64>,
    pub ge: Option<f64>,
    pub lt: Option<f64>,
    pub le: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.gt.is_none()
            && self.ge.is_none()
            && self.lt.is_none()
            && self.le.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
    }
}

/// Coerces a raw value into the declared type.
pub(crate) fn coerce(raw: RawValue<'_>, ty: ParamType) -> Result<Value, (ErrorKind, String)> {
    match raw {
        RawValue::Text(s) => coerce_text(s, ty),
        RawValue::Json(v) => coerce_json(v, ty),
    }
}

fn coerce_text(s: &str, ty: ParamType) -> Result<Value, (ErrorKind, String)> {
    match ty {
        ParamType::Str => Ok(Value::String(s.to_string())),
        ParamType::Int => s.parse::<i64>().map(Value::from).map_err(|_| {
            (
                ErrorKind::IntParsing,
                format!("'{}' is not a valid integer", s),
            )
        }),
        ParamType::Float => s
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| {
                (
                    ErrorKind::FloatParsing,
                    format!("'{}' is not a valid number", s),
                )
            }),
        ParamType::Bool => match s.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err((
                ErrorKind::BoolParsing,
                format!("'{}' is not a valid boolean", s),
            )),
        },
        ParamType::Json => serde_json::from_str(s)
            .map_err(|e| (ErrorKind::JsonInvalid, format!("invalid JSON value: {}", e))),
    }
}

fn coerce_json(v: &Value, ty: ParamType) -> Result<Value, (ErrorKind, String)> {
    match ty {
        ParamType::Json => Ok(v.clone()),
        ParamType::Str => v
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| (ErrorKind::JsonType, "expected a string".to_string())),
        ParamType::Int => v
            .as_i64()
            .map(Value::from)
            .ok_or_else(|| (ErrorKind::JsonType, "expected an integer".to_string())),
        ParamType::Float => v
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| (ErrorKind::JsonType, "expected a number".to_string())),
        ParamType::Bool => v
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| (ErrorKind::JsonType, "expected a boolean".to_string())),
    }
}

/// Applies declared bounds to an already-coerced value.
pub(crate) fn check(value: &Value, constraints: &Constraints) -> Result<(), (ErrorKind, String)> {
    if let Some(n) = value.as_f64() {
        if let Some(bound) = constraints.gt {
            if n <= bound {
                return Err((
                    ErrorKind::GreaterThan,
                    format!("must be greater than {}", bound),
                ));
            }
        }
        if let Some(bound) = constraints.ge {
            if n < bound {
                return Err((
                    ErrorKind::GreaterThanEqual,
                    format!("must be greater than or equal to {}", bound),
                ));
            }
        }
        if let Some(bound) = constraints.lt {
            if n >= bound {
                return Err((ErrorKind::LessThan, format!("must be less than {}", bound)));
            }
        }
        if let Some(bound) = constraints.le {
            if n > bound {
                return Err((
                    ErrorKind::LessThanEqual,
                    format!("must be less than or equal to {}", bound),
                ));
            }
        }
    }

    if let Some(s) = value.as_str() {
        let length = s.chars().count();
        if let Some(min) = constraints.min_length {
            if length < min {
                return Err((
                    ErrorKind::MinLength,
                    format!("must be at least {} characters", min),
                ));
            }
        }
        if let Some(max) = constraints.max_length {
            if length > max {
                return Err((
                    ErrorKind::MaxLength,
                    format!("must be at most {} characters", max),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_text_to_int() {
        assert_eq!(coerce(RawValue::Text("42"), ParamType::Int).unwrap(), json!(42));
        assert_eq!(
            coerce(RawValue::Text("abc"), ParamType::Int).unwrap_err().0,
            ErrorKind::IntParsing
        );
    }

    #[test]
    fn test_coerce_text_to_float() {
        assert_eq!(
            coerce(RawValue::Text("2.5"), ParamType::Float).unwrap(),
            json!(2.5)
        );
        assert_eq!(
            coerce(RawValue::Text("two"), ParamType::Float).unwrap_err().0,
            ErrorKind::FloatParsing
        );
    }

    #[test]
    fn test_coerce_text_to_bool() {
        assert_eq!(coerce(RawValue::Text("true"), ParamType::Bool).unwrap(), json!(true));
        assert_eq!(coerce(RawValue::Text("0"), ParamType::Bool).unwrap(), json!(false));
        assert_eq!(
            coerce(RawValue::Text("maybe"), ParamType::Bool).unwrap_err().0,
            ErrorKind::BoolParsing
        );
    }

    #[test]
    fn test_coerce_text_passthrough() {
        assert_eq!(
            coerce(RawValue::Text("hello"), ParamType::Str).unwrap(),
            json!("hello")
        );
    }

    #[test]
    fn test_coerce_json_type_checks() {
        let number = json!(7);
        assert_eq!(coerce(RawValue::Json(&number), ParamType::Int).unwrap(), json!(7));

        let text = json!("seven");
        assert_eq!(
            coerce(RawValue::Json(&text), ParamType::Int).unwrap_err().0,
            ErrorKind::JsonType
        );
    }

    #[test]
    fn test_numeric_bounds_order() {
        let constraints = Constraints {
            gt: Some(0.0),
            le: Some(100.0),
            ..Default::default()
        };
        assert!(check(&json!(50), &constraints).is_ok());
        assert!(check(&json!(100), &constraints).is_ok());
        assert_eq!(check(&json!(0), &constraints).unwrap_err().0, ErrorKind::GreaterThan);
        assert_eq!(
            check(&json!(101), &constraints).unwrap_err().0,
            ErrorKind::LessThanEqual
        );
    }

    #[test]
    fn test_inclusive_bounds() {
        let constraints = Constraints {
            ge: Some(1.0),
            lt: Some(10.0),
            ..Default::default()
        };
        assert!(check(&json!(1), &constraints).is_ok());
        assert_eq!(
            check(&json!(0), &constraints).unwrap_err().0,
            ErrorKind::GreaterThanEqual
        );
        assert_eq!(check(&json!(10), &constraints).unwrap_err().0, ErrorKind::LessThan);
    }

    #[test]
    fn test_string_length_counts_chars() {
        let constraints = Constraints {
            min_length: Some(2),
            max_length: Some(4),
            ..Default::default()
        };
        assert!(check(&json!("日本語"), &constraints).is_ok());
        assert_eq!(check(&json!("a"), &constraints).unwrap_err().0, ErrorKind::MinLength);
        assert_eq!(
            check(&json!("abcde"), &constraints).unwrap_err().0,
            ErrorKind::MaxLength
        );
    }

    #[test]
    fn test_bounds_skip_non_numeric_values() {
        let constraints = Constraints {
            ge: Some(1.0),
            ..Default::default()
        };
        assert!(check(&json!("text"), &constraints).is_ok());
    }
}
