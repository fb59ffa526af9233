use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Serialize, Serializer};

/// Which request body key supplied the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    Body,
    FormBody,
    Base64Body,
    FileBody,
}

impl BodyType {
    pub const ALL: [BodyType; 4] = [
        BodyType::Body,
        BodyType::FormBody,
        BodyType::Base64Body,
        BodyType::FileBody,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BodyType::Body => "body",
            BodyType::FormBody => "form_body",
            BodyType::Base64Body => "base64_body",
            BodyType::FileBody => "file_body",
        }
    }
}

/// Which response body key supplied the expected body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseBodyType {
    ResponseBody,
    Base64ResponseBody,
    FileResponseBody,
}

impl ResponseBodyType {
    pub const ALL: [ResponseBodyType; 3] = [
        ResponseBodyType::ResponseBody,
        ResponseBodyType::Base64ResponseBody,
        ResponseBodyType::FileResponseBody,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseBodyType::ResponseBody => "response_body",
            ResponseBodyType::Base64ResponseBody => "base64_response_body",
            ResponseBodyType::FileResponseBody => "file_response_body",
        }
    }
}

/// Resolved body content. Base64 sources decode to raw bytes, everything
/// else stays text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Bytes(Vec<u8>),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(text) => text.as_bytes(),
            Payload::Bytes(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Bytes(_) => None,
        }
    }
}

// Byte payloads serialize as base64 so reports stay valid JSON text.
impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Payload::Text(text) => serializer.serialize_str(text),
            Payload::Bytes(bytes) => serializer.serialize_str(&BASE64.encode(bytes)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestBody {
    pub kind: BodyType,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseBody {
    pub kind: ResponseBodyType,
    pub payload: Payload,
}
