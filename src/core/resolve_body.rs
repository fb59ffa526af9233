use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{Map, Value};
use crate::core::encode_form_data::encode_form_data;
use crate::core::field_rules::{self, FieldRule};
use crate::core::file_reader::FileReader;
use crate::models::body::{BodyType, Payload, RequestBody, ResponseBody, ResponseBodyType};
use crate::models::parse_error::ParseError;

const BODY_SOURCES: [(BodyType, FieldRule); 4] = [
    (BodyType::Body, field_rules::BODY),
    (BodyType::FormBody, field_rules::FORM_BODY),
    (BodyType::Base64Body, field_rules::BASE64_BODY),
    (BodyType::FileBody, field_rules::FILE_BODY),
];

const RESPONSE_BODY_SOURCES: [(ResponseBodyType, FieldRule); 3] = [
    (ResponseBodyType::ResponseBody, field_rules::RESPONSE_BODY),
    (ResponseBodyType::Base64ResponseBody, field_rules::BASE64_RESPONSE_BODY),
    (ResponseBodyType::FileResponseBody, field_rules::FILE_RESPONSE_BODY),
];

/// Resolve the request body group. At most one of `body`, `form_body`,
/// `base64_body` and `file_body` may be present.
pub(crate) fn resolve_body(
    raw: &Map<String, Value>,
    files: &dyn FileReader,
) -> Result<Option<RequestBody>, ParseError> {
    let Some((kind, rule)) = single_source(raw, "body", &BODY_SOURCES)? else {
        return Ok(None);
    };
    let payload = match kind {
        BodyType::Body => Payload::Text(field_rules::required_text(raw, rule)?.to_string()),
        BodyType::FormBody => {
            let form = field_rules::mapping(raw, rule)?.unwrap_or_default();
            Payload::Text(encode_form_data(&form))
        }
        BodyType::Base64Body => decode_base64(rule, field_rules::required_text(raw, rule)?)?,
        BodyType::FileBody => read_file(files, rule, field_rules::required_text(raw, rule)?)?,
    };
    tracing::trace!("resolved request body from `{}`", kind.as_str());
    Ok(Some(RequestBody { kind, payload }))
}

/// Resolve the expected response body group; same rules as the request body
/// without the form variant.
pub(crate) fn resolve_response_body(
    raw: &Map<String, Value>,
    files: &dyn FileReader,
) -> Result<Option<ResponseBody>, ParseError> {
    let Some((kind, rule)) = single_source(raw, "response body", &RESPONSE_BODY_SOURCES)? else {
        return Ok(None);
    };
    let value = field_rules::required_text(raw, rule)?;
    let payload = match kind {
        ResponseBodyType::ResponseBody => Payload::Text(value.to_string()),
        ResponseBodyType::Base64ResponseBody => decode_base64(rule, value)?,
        ResponseBodyType::FileResponseBody => read_file(files, rule, value)?,
    };
    tracing::trace!("resolved response body from `{}`", kind.as_str());
    Ok(Some(ResponseBody { kind, payload }))
}

// Presence alone counts: a key holding null still conflicts with its siblings.
fn single_source<'r, K: Copy>(
    raw: &Map<String, Value>,
    group: &'static str,
    sources: &'r [(K, FieldRule)],
) -> Result<Option<(K, &'r FieldRule)>, ParseError> {
    let present: Vec<&'r (K, FieldRule)> = sources
        .iter()
        .filter(|(_, rule)| raw.contains_key(rule.name))
        .collect();
    match present.len() {
        0 => Ok(None),
        1 => {
            let (kind, rule) = present[0];
            Ok(Some((*kind, rule)))
        }
        _ => Err(ParseError::AmbiguousSource {
            group,
            fields: present.iter().map(|(_, rule)| rule.name).collect(),
        }),
    }
}

// Line breaks from block scalars and wrapped encodings are not part of the data.
fn decode_base64(rule: &FieldRule, value: &str) -> Result<Payload, ParseError> {
    let compact: String = value.split_ascii_whitespace().collect();
    BASE64
        .decode(compact)
        .map(Payload::Bytes)
        .map_err(|e| ParseError::invalid_value(rule.name, format!("invalid base64: {}", e)))
}

fn read_file(files: &dyn FileReader, rule: &FieldRule, path: &str) -> Result<Payload, ParseError> {
    files
        .read_to_string(path)
        .map(Payload::Text)
        .map_err(|e| ParseError::invalid_value(rule.name, format!("cannot read `{}`: {}", path, e)))
}
