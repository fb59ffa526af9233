//! Model layer of a declarative HTTP integration-test runner.
//!
//! A suite arrives as structured data (usually deserialized from YAML or
//! JSON into a `serde_json::Value`) and is parsed into a [`Test`] holding
//! validated [`Testcase`] values. Each testcase describes a request to issue
//! and the response to expect. Executing requests is left to the caller;
//! [`build_request`] turns a testcase into a `reqwest` request without
//! sending it.
//!
//! ```
//! use serde_json::json;
//!
//! let test = catnap::Test::parse(&json!({
//!     "name": "smoke",
//!     "testcases": [{"name": "home", "url": "http://localhost:8080/", "code": "200"}],
//! }))
//! .unwrap();
//! assert_eq!(test.testcases()[0].method(), "GET");
//! assert_eq!(test.testcases()[0].code(), Some(200));
//! ```
//!
//! Parsing fails fast: the first violation found is returned as a
//! [`ParseError`] and no partial value is produced.

pub mod core;
pub mod models;

pub use crate::core::build_request::build_request;
pub use crate::core::file_reader::{FileReader, FsReader};
pub use crate::models::auth::{Auth, AuthScheme};
pub use crate::models::body::{BodyType, Payload, ResponseBodyType};
pub use crate::models::hook::{Hook, HookContext, HookError, HookOutput};
pub use crate::models::parse_error::ParseError;
pub use crate::models::test::Test;
pub use crate::models::testcase::Testcase;
