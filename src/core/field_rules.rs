use std::collections::BTreeMap;
use serde_json::{Map, Value};
use crate::models::parse_error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Text,
    NonEmptyText,
    Mapping,
    Integer,
    Sequence,
}

impl FieldKind {
    fn expected(&self) -> &'static str {
        match self {
            FieldKind::Text => "a string",
            FieldKind::NonEmptyText => "a non-empty string",
            FieldKind::Mapping => "a mapping of strings",
            FieldKind::Integer => "an integer",
            FieldKind::Sequence => "a sequence",
        }
    }
}

/// One entry of the validator table: key, whether it must be present, and
/// the kind its value is checked and coerced against. A present key holding
/// null is always a type error, never treated as absent.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule { name, kind, required: true }
}

const fn optional(name: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule { name, kind, required: false }
}

// suite
pub(crate) const TEST_NAME: FieldRule = required("name", FieldKind::NonEmptyText);
pub(crate) const TESTCASES: FieldRule = required("testcases", FieldKind::Sequence);

// request
pub(crate) const NAME: FieldRule = required("name", FieldKind::NonEmptyText);
pub(crate) const METHOD: FieldRule = optional("method", FieldKind::NonEmptyText);
pub(crate) const URL: FieldRule = required("url", FieldKind::Text);
pub(crate) const QUERY_PARAMS: FieldRule = optional("query_params", FieldKind::Mapping);
pub(crate) const HEADERS: FieldRule = optional("headers", FieldKind::Mapping);
pub(crate) const AUTH: FieldRule = optional("auth", FieldKind::Text);
pub(crate) const BODY: FieldRule = optional("body", FieldKind::Text);
pub(crate) const FORM_BODY: FieldRule = optional("form_body", FieldKind::Mapping);
pub(crate) const BASE64_BODY: FieldRule = optional("base64_body", FieldKind::Text);
pub(crate) const FILE_BODY: FieldRule = optional("file_body", FieldKind::Text);

// expected response
pub(crate) const CODE: FieldRule = optional("code", FieldKind::Integer);
pub(crate) const RESPONSE_URL: FieldRule = optional("response_url", FieldKind::Text);
pub(crate) const RESPONSE_HEADERS: FieldRule = optional("response_headers", FieldKind::Mapping);
pub(crate) const RESPONSE_BODY: FieldRule = optional("response_body", FieldKind::Text);
pub(crate) const BASE64_RESPONSE_BODY: FieldRule = optional("base64_response_body", FieldKind::Text);
pub(crate) const FILE_RESPONSE_BODY: FieldRule = optional("file_response_body", FieldKind::Text);

// hooks
pub(crate) const ON_REQUEST: FieldRule = optional("on_request", FieldKind::Text);
pub(crate) const ON_RESPONSE: FieldRule = optional("on_response", FieldKind::Text);

pub(crate) const TESTCASE_FIELDS: [FieldRule; 18] = [
    NAME,
    METHOD,
    URL,
    QUERY_PARAMS,
    HEADERS,
    AUTH,
    BODY,
    FORM_BODY,
    BASE64_BODY,
    FILE_BODY,
    CODE,
    RESPONSE_URL,
    RESPONSE_HEADERS,
    RESPONSE_BODY,
    BASE64_RESPONSE_BODY,
    FILE_RESPONSE_BODY,
    ON_REQUEST,
    ON_RESPONSE,
];

pub(crate) const TEST_FIELDS: [FieldRule; 2] = [TEST_NAME, TESTCASES];

/// A value that passed its rule's predicate, already coerced.
#[derive(Debug, PartialEq)]
pub(crate) enum Checked<'a> {
    Text(&'a str),
    Mapping(BTreeMap<String, String>),
    Integer(i64),
    Sequence(&'a [Value]),
}

/// Look up `rule.name` in `raw` and check it against the rule.
pub(crate) fn check_field<'a>(
    raw: &'a Map<String, Value>,
    rule: &FieldRule,
) -> Result<Option<Checked<'a>>, ParseError> {
    match raw.get(rule.name) {
        Some(value) => coerce(rule, value).map(Some),
        None if rule.required => Err(ParseError::missing(rule.name)),
        None => Ok(None),
    }
}

fn coerce<'a>(rule: &FieldRule, value: &'a Value) -> Result<Checked<'a>, ParseError> {
    let mismatch = || ParseError::invalid_type(rule.name, rule.kind.expected());
    match (rule.kind, value) {
        (FieldKind::Text, Value::String(s)) => Ok(Checked::Text(s)),
        (FieldKind::NonEmptyText, Value::String(s)) if !s.trim().is_empty() => Ok(Checked::Text(s)),
        (FieldKind::Mapping, Value::Object(map)) => coerce_mapping(rule.name, map).map(Checked::Mapping),
        (FieldKind::Integer, value) => coerce_integer(value).map(Checked::Integer).ok_or_else(mismatch),
        (FieldKind::Sequence, Value::Array(items)) => Ok(Checked::Sequence(items)),
        _ => Err(mismatch()),
    }
}

// Scalars become their textual form; nested values and null are rejected.
fn coerce_mapping(field: &str, map: &Map<String, Value>) -> Result<BTreeMap<String, String>, ParseError> {
    map.iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(ParseError::invalid_value(
                        field,
                        format!("value for key `{}` must be a string", key),
                    ))
                }
            };
            Ok((key.clone(), text))
        })
        .collect()
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        // Fractional numbers are rejected rather than truncated to an integer.
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn text<'a>(raw: &'a Map<String, Value>, rule: &FieldRule) -> Result<Option<&'a str>, ParseError> {
    match check_field(raw, rule)? {
        Some(Checked::Text(s)) => Ok(Some(s)),
        None => Ok(None),
        Some(_) => Err(ParseError::invalid_type(rule.name, rule.kind.expected())),
    }
}

pub(crate) fn required_text<'a>(raw: &'a Map<String, Value>, rule: &FieldRule) -> Result<&'a str, ParseError> {
    text(raw, rule)?.ok_or_else(|| ParseError::missing(rule.name))
}

pub(crate) fn mapping(raw: &Map<String, Value>, rule: &FieldRule) -> Result<Option<BTreeMap<String, String>>, ParseError> {
    match check_field(raw, rule)? {
        Some(Checked::Mapping(map)) => Ok(Some(map)),
        None => Ok(None),
        Some(_) => Err(ParseError::invalid_type(rule.name, rule.kind.expected())),
    }
}

pub(crate) fn integer(raw: &Map<String, Value>, rule: &FieldRule) -> Result<Option<i64>, ParseError> {
    match check_field(raw, rule)? {
        Some(Checked::Integer(n)) => Ok(Some(n)),
        None => Ok(None),
        Some(_) => Err(ParseError::invalid_type(rule.name, rule.kind.expected())),
    }
}

pub(crate) fn sequence<'a>(raw: &'a Map<String, Value>, rule: &FieldRule) -> Result<&'a [Value], ParseError> {
    match check_field(raw, rule)? {
        Some(Checked::Sequence(items)) => Ok(items),
        None => Err(ParseError::missing(rule.name)),
        Some(_) => Err(ParseError::invalid_type(rule.name, rule.kind.expected())),
    }
}

/// Keys of `raw` that no rule in `table` recognizes.
pub(crate) fn unknown_keys<'a>(
    raw: &'a Map<String, Value>,
    table: &'a [FieldRule],
) -> impl Iterator<Item = &'a str> + 'a {
    raw.keys()
        .map(String::as_str)
        .filter(move |key| !table.iter().any(|rule| rule.name == *key))
}
