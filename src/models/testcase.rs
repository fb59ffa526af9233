use std::collections::BTreeMap;
use serde::Serialize;
use serde_json::Value;
use crate::core::field_rules::{self, FieldRule, TESTCASE_FIELDS};
use crate::core::file_reader::{FileReader, FsReader};
use crate::core::resolve_body::{resolve_body, resolve_response_body};
use crate::models::auth::Auth;
use crate::models::body::{BodyType, Payload, RequestBody, ResponseBody, ResponseBodyType};
use crate::models::hook::Hook;
use crate::models::parse_error::ParseError;

pub const DEFAULT_METHOD: &str = "GET";

/// One request to issue and the response expected back.
///
/// Built only through [`Testcase::parse`] / [`Testcase::parse_with`], so every
/// value has passed validation. Validation stops at the first violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Testcase {
    name: String,
    method: String,
    url: String,
    query_params: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
    auth: Option<Auth>,
    body: Option<RequestBody>,
    code: Option<i64>,
    response_url: Option<String>,
    response_headers: BTreeMap<String, String>,
    response_body: Option<ResponseBody>,
    on_request: Option<Hook>,
    on_response: Option<Hook>,
}

impl Testcase {
    /// Parse with file bodies read relative to the working directory.
    pub fn parse(raw: &Value) -> Result<Testcase, ParseError> {
        Testcase::parse_with(raw, &FsReader::default())
    }

    pub fn parse_with(raw: &Value, files: &dyn FileReader) -> Result<Testcase, ParseError> {
        let raw = raw
            .as_object()
            .ok_or_else(|| ParseError::invalid_type("testcase", "a mapping"))?;

        let name = field_rules::required_text(raw, &field_rules::NAME)?.to_string();
        let method = field_rules::text(raw, &field_rules::METHOD)?
            .unwrap_or(DEFAULT_METHOD)
            .trim()
            .to_uppercase();
        let url = field_rules::required_text(raw, &field_rules::URL)?.to_string();
        let query_params = field_rules::mapping(raw, &field_rules::QUERY_PARAMS)?.unwrap_or_default();
        let headers = field_rules::mapping(raw, &field_rules::HEADERS)?.unwrap_or_default();
        let auth = field_rules::text(raw, &field_rules::AUTH)?
            .map(|value| Auth::parse(field_rules::AUTH.name, value))
            .transpose()?;
        let body = resolve_body(raw, files)?;

        let code = field_rules::integer(raw, &field_rules::CODE)?;
        let response_url = field_rules::text(raw, &field_rules::RESPONSE_URL)?.map(str::to_string);
        let response_headers = field_rules::mapping(raw, &field_rules::RESPONSE_HEADERS)?.unwrap_or_default();
        let response_body = resolve_response_body(raw, files)?;

        let on_request = compile_hook(raw, &field_rules::ON_REQUEST)?;
        let on_response = compile_hook(raw, &field_rules::ON_RESPONSE)?;

        for key in field_rules::unknown_keys(raw, &TESTCASE_FIELDS) {
            tracing::trace!("testcase `{}`: ignoring unknown key `{}`", name, key);
        }
        tracing::debug!("parsed testcase `{}`: {} {}", name, method, url);

        Ok(Testcase {
            name,
            method,
            url,
            query_params,
            headers,
            auth,
            body,
            code,
            response_url,
            response_headers,
            response_body,
            on_request,
            on_response,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Upper-cased HTTP method, `GET` unless the input set one.
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query_params(&self) -> &BTreeMap<String, String> {
        &self.query_params
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn auth(&self) -> Option<&Auth> {
        self.auth.as_ref()
    }

    pub fn body_type(&self) -> Option<BodyType> {
        self.body.as_ref().map(|body| body.kind)
    }

    pub fn body(&self) -> Option<&Payload> {
        self.body.as_ref().map(|body| &body.payload)
    }

    /// Expected status code.
    pub fn code(&self) -> Option<i64> {
        self.code
    }

    pub fn response_url(&self) -> Option<&str> {
        self.response_url.as_deref()
    }

    pub fn response_headers(&self) -> &BTreeMap<String, String> {
        &self.response_headers
    }

    pub fn response_body_type(&self) -> Option<ResponseBodyType> {
        self.response_body.as_ref().map(|body| body.kind)
    }

    pub fn response_body(&self) -> Option<&Payload> {
        self.response_body.as_ref().map(|body| &body.payload)
    }

    pub fn on_request(&self) -> Option<&Hook> {
        self.on_request.as_ref()
    }

    pub fn on_response(&self) -> Option<&Hook> {
        self.on_response.as_ref()
    }
}

fn compile_hook(raw: &serde_json::Map<String, Value>, rule: &FieldRule) -> Result<Option<Hook>, ParseError> {
    field_rules::text(raw, rule)?
        .map(|source| Hook::compile(source).map_err(|e| ParseError::invalid_value(rule.name, e.to_string())))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::models::auth::AuthScheme;

    fn build(extra: Value) -> Result<Testcase, ParseError> {
        let mut data = json!({"name": "foo", "url": "http://www.google.com"});
        if let (Some(data), Value::Object(extra)) = (data.as_object_mut(), extra) {
            data.extend(extra);
        }
        Testcase::parse(&data)
    }

    #[test]
    fn minimal_testcase_gets_defaults() {
        let testcase = build(json!({})).unwrap();
        assert_eq!(testcase.name(), "foo");
        assert_eq!(testcase.method(), "GET");
        assert_eq!(testcase.url(), "http://www.google.com");
        assert!(testcase.query_params().is_empty());
        assert!(testcase.headers().is_empty());
        assert_eq!(testcase.auth(), None);
        assert_eq!(testcase.body_type(), None);
        assert_eq!(testcase.body(), None);
        assert_eq!(testcase.code(), None);
        assert_eq!(testcase.response_url(), None);
        assert!(testcase.response_headers().is_empty());
        assert_eq!(testcase.response_body_type(), None);
        assert_eq!(testcase.response_body(), None);
        assert!(testcase.on_request().is_none());
        assert!(testcase.on_response().is_none());
    }

    #[test]
    fn requires_a_mapping() {
        let err = Testcase::parse(&json!(["name", "url"])).unwrap_err();
        assert_eq!(err.field(), "testcase");
    }

    #[test]
    fn name_and_url_are_required() {
        assert_eq!(
            Testcase::parse(&json!({"url": "foo"})).unwrap_err(),
            ParseError::missing("name")
        );
        assert_eq!(
            Testcase::parse(&json!({"name": "foo"})).unwrap_err(),
            ParseError::missing("url")
        );
        assert!(build(json!({"name": ""})).is_err());
        assert!(build(json!({"url": 42})).is_err());
    }

    #[test]
    fn method_is_upper_cased() {
        assert_eq!(build(json!({"method": "get"})).unwrap().method(), "GET");
        assert_eq!(build(json!({"method": "Patch"})).unwrap().method(), "PATCH");
        assert!(build(json!({"method": null})).is_err());
        assert!(build(json!({"method": ""})).is_err());
        assert_eq!(build(json!({"method": " post "})).unwrap().method(), "POST");
        assert_eq!(
            build(json!({"method": "  "})).unwrap_err(),
            ParseError::invalid_type("method", "a non-empty string")
        );
    }

    #[test]
    fn mappings_must_be_mappings_when_present() {
        let testcase = build(json!({
            "query_params": {"hello": "world"},
            "headers": {"foo": "bar"},
            "response_headers": {"foo": "baz"},
        }))
        .unwrap();
        assert_eq!(testcase.query_params()["hello"], "world");
        assert_eq!(testcase.headers()["foo"], "bar");
        assert_eq!(testcase.response_headers()["foo"], "baz");

        for key in ["query_params", "headers", "response_headers"] {
            let err = build(json!({ key: null })).unwrap_err();
            assert_eq!(err.field(), key);
        }
    }

    #[test]
    fn auth_resolves_scheme() {
        let auth = build(json!({"auth": "basic user pass"})).unwrap().auth().cloned().unwrap();
        assert_eq!(auth.scheme, AuthScheme::Basic);
        assert_eq!(auth.username, "user");
        assert_eq!(auth.password, "pass");

        let auth = build(json!({"auth": "digest user pass"})).unwrap().auth().cloned().unwrap();
        assert_eq!(auth.scheme, AuthScheme::Digest);

        assert!(build(json!({"auth": "unknown user pass"})).is_err());
        assert!(build(json!({"auth": null})).is_err());
    }

    #[test]
    fn body_sources() {
        let testcase = build(json!({"body": "body test"})).unwrap();
        assert_eq!(testcase.body_type(), Some(BodyType::Body));
        assert_eq!(testcase.body(), Some(&Payload::Text("body test".into())));

        let testcase = build(json!({"form_body": {"hello": "world", "foo": "bar"}})).unwrap();
        assert_eq!(testcase.body_type(), Some(BodyType::FormBody));
        let body = testcase.body().and_then(Payload::as_text).unwrap();
        assert!(["hello=world&foo=bar", "foo=bar&hello=world"].contains(&body));
        assert!(build(json!({"form_body": "invalidbody"})).is_err());

        let testcase = build(json!({"base64_body": "aGVsbG8="})).unwrap();
        assert_eq!(testcase.body(), Some(&Payload::Bytes(b"hello".to_vec())));
        assert!(build(json!({"base64_body": "invalid base64 string"})).is_err());
    }

    #[test]
    fn multiple_body_sources_fail() {
        let err = build(json!({"body": "plaintext body", "file_body": "./test/nonfile.txt"})).unwrap_err();
        assert!(matches!(err, ParseError::AmbiguousSource { group: "body", .. }));

        let err = build(json!({"response_body": "plaintext body", "file_response_body": "./test/nonfile.txt"}))
            .unwrap_err();
        assert!(matches!(err, ParseError::AmbiguousSource { group: "response body", .. }));
    }

    #[test]
    fn code_coerces_to_integer() {
        assert_eq!(build(json!({"code": "400"})).unwrap().code(), Some(400));
        assert_eq!(build(json!({"code": 200})).unwrap().code(), Some(200));
        assert!(build(json!({"code": null})).is_err());
        assert!(build(json!({"code": "teapot"})).is_err());
    }

    #[test]
    fn response_fields() {
        let testcase = build(json!({"response_url": "foobar", "response_body": "body test"})).unwrap();
        assert_eq!(testcase.response_url(), Some("foobar"));
        assert_eq!(testcase.response_body_type(), Some(ResponseBodyType::ResponseBody));
        assert_eq!(testcase.response_body(), Some(&Payload::Text("body test".into())));
        assert!(Testcase::parse(&json!({"name": "foo", "response_url": null})).is_err());
        assert!(build(json!({"response_url": null})).is_err());

        let testcase = build(json!({"base64_response_body": "aGVsbG8="})).unwrap();
        assert_eq!(testcase.response_body_type(), Some(ResponseBodyType::Base64ResponseBody));
        assert_eq!(testcase.response_body(), Some(&Payload::Bytes(b"hello".to_vec())));
        assert!(build(json!({"base64_response_body": "invalid base64 string"})).is_err());
    }

    #[test]
    fn hooks_compile_at_parse_time() {
        let testcase = build(json!({
            "on_request": "print 'request ' + request.url",
            "on_response": "assert response.code == 200",
        }))
        .unwrap();
        assert_eq!(testcase.on_request().unwrap().source(), "print 'request ' + request.url");
        assert!(testcase.on_response().is_some());

        for key in ["on_request", "on_response"] {
            let err = build(json!({ key: "!!!" })).unwrap_err();
            assert_eq!(err.field(), key);
            assert!(build(json!({ key: "not valid code ???" })).is_err());
        }
    }

    #[test]
    fn unknown_keys_are_ignored() {
        assert!(build(json!({"retries": 3, "description": "ignored"})).is_ok());
    }

    #[test]
    fn reparsing_is_deterministic() {
        let raw = json!({
            "name": "complex",
            "method": "post",
            "url": "http://example.com",
            "auth": "basic u p",
            "form_body": {"a": "1", "b": "2"},
            "code": "201",
            "on_response": "print response.code",
        });
        assert_eq!(Testcase::parse(&raw).unwrap(), Testcase::parse(&raw).unwrap());
    }

    #[test]
    fn serializes_for_reports() {
        let value = serde_json::to_value(build(json!({"base64_body": "aGVsbG8="})).unwrap()).unwrap();
        assert_eq!(value["method"], "GET");
        assert_eq!(value["body"]["kind"], "base64_body");
        assert_eq!(value["body"]["payload"], "aGVsbG8=");
    }
}
