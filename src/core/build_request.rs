use std::str::FromStr;
use anyhow::{Context, Error};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use crate::models::auth::AuthScheme;
use crate::models::body::{BodyType, Payload};
use crate::models::testcase::Testcase;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Turn a parsed testcase into a request ready to send. Nothing goes over
/// the wire here.
///
/// Digest auth needs the server's challenge, so it is left for the executor
/// to negotiate after the first 401.
pub fn build_request(client: &Client, testcase: &Testcase) -> anyhow::Result<RequestBuilder> {
    let method = Method::from_str(testcase.method())
        .map_err(|_| Error::msg(format!("invalid method `{}`", testcase.method())))?;
    let mut request = client.request(method, testcase.url());

    if !testcase.query_params().is_empty() {
        request = request.query(testcase.query_params());
    }

    let mut headers = HeaderMap::new();
    for (name, value) in testcase.headers() {
        let header_name = name
            .parse::<HeaderName>()
            .with_context(|| format!("invalid header name `{}`", name))?;
        let header_value = value
            .parse::<HeaderValue>()
            .with_context(|| format!("invalid value for header `{}`", name))?;
        headers.insert(header_name, header_value);
    }
    if testcase.body_type() == Some(BodyType::FormBody) && !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
    }
    request = request.headers(headers);

    if let Some(auth) = testcase.auth() {
        match auth.scheme {
            AuthScheme::Basic => request = request.basic_auth(&auth.username, Some(&auth.password)),
            AuthScheme::Digest => {
                tracing::debug!("testcase `{}`: digest auth deferred to executor", testcase.name());
            }
        }
    }

    match testcase.body() {
        Some(Payload::Text(text)) => request = request.body(text.clone()),
        Some(Payload::Bytes(bytes)) => request = request.body(bytes.clone()),
        None => {}
    }
    Ok(request)
}
