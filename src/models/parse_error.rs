use thiserror::Error;

/// Raised for every schema, type or semantic violation while building a
/// `Test` or `Testcase` from raw input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A required key is absent
    #[error("missing required field `{field}`")]
    MissingField { field: String },

    /// The key is present but holds the wrong kind of value
    #[error("field `{field}` must be {expected}")]
    InvalidType {
        field: String,
        expected: &'static str,
    },

    /// The value has the right shape but cannot be resolved
    #[error("field `{field}` is invalid: {reason}")]
    InvalidValue { field: String, reason: String },

    /// More than one key of a mutually exclusive group is present
    #[error("ambiguous {group} source: only one of {fields:?} may be set")]
    AmbiguousSource {
        group: &'static str,
        fields: Vec<&'static str>,
    },
}

impl ParseError {
    pub(crate) fn missing(field: &str) -> Self {
        ParseError::MissingField {
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid_type(field: &str, expected: &'static str) -> Self {
        ParseError::InvalidType {
            field: field.to_string(),
            expected,
        }
    }

    pub(crate) fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        ParseError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Name of the offending key. For ambiguous sources this is the first
    /// conflicting key.
    pub fn field(&self) -> &str {
        match self {
            ParseError::MissingField { field }
            | ParseError::InvalidType { field, .. }
            | ParseError::InvalidValue { field, .. } => field.as_str(),
            ParseError::AmbiguousSource { fields, group } => {
                fields.first().copied().unwrap_or(*group)
            }
        }
    }
}
