use std::fmt;

use serde::Serialize;

/// Classification of a single parameter failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Missing,
    IntParsing,
    FloatParsing,
    BoolParsing,
    JsonInvalid,
    JsonType,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    MinLength,
    MaxLength,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Missing => "missing",
            ErrorKind::IntParsing => "int_parsing",
            ErrorKind::FloatParsing => "float_parsing",
            ErrorKind::BoolParsing => "bool_parsing",
            ErrorKind::JsonInvalid => "json_invalid",
            ErrorKind::JsonType => "json_type",
            ErrorKind::GreaterThan => "greater_than",
            ErrorKind::GreaterThanEqual => "greater_than_equal",
            ErrorKind::LessThan => "less_than",
            ErrorKind::LessThanEqual => "less_than_equal",
            ErrorKind::MinLength => "min_length",
            ErrorKind::MaxLength => "max_length",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field-addressable validation failure.
///
/// `location` starts with the source category followed by the looked-up
/// name, e.g. `["query", "skip"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub location: Vec<String>,
    pub kind: ErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn new(location: Vec<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            location,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location.join("."), self.message)
    }
}

/// Aggregated validation failures for one resolution attempt.
///
/// Every raw-source parameter across the whole plan is attempted before
/// the report is returned, so one request surfaces every failing field
/// at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "; {}", error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_display() {
        let mut report = ValidationReport::new();
        report.push(FieldError::new(
            vec!["query".into(), "skip".into()],
            ErrorKind::Missing,
            "required parameter is missing",
        ));
        assert_eq!(
            report.to_string(),
            "1 validation error(s); query.skip: required parameter is missing"
        );
    }

    #[test]
    fn test_report_serializes_kind_as_snake_case() {
        let error = FieldError::new(
            vec!["query".into(), "limit".into()],
            ErrorKind::GreaterThanEqual,
            "must be greater than or equal to 1",
        );
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(value["kind"], "greater_than_equal");
        assert_eq!(value["location"][0], "query");
    }
}
