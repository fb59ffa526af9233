//! Hook programs attached to a testcase (`on_request`, `on_response`).
//!
//! Hooks are written in a small statement language rather than a general
//! purpose one. A program can read request/response variables, bind locals,
//! print values and assert on them; it cannot perform I/O or mutate the
//! request. Programs are compiled when the testcase is parsed and run later
//! by the executor with a `HookContext`.
//!
//! ```text
//! # on_response
//! let id = json("$.data.id")
//! print "created " + id
//! assert response.code == 201
//! assert response.headers.content-type != "text/html"
//! ```

use std::collections::{BTreeMap, HashMap};
use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;
use crate::core::hook_compiler;
use crate::models::testcase::Testcase;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("json path `{path}` failed: {reason}")]
    JsonPath { path: String, reason: String },

    #[error("assertion failed: {left:?} {op} {right:?}")]
    AssertionFailed {
        left: String,
        op: &'static str,
        right: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Comparison {
    Eq,
    NotEq,
}

impl Comparison {
    fn holds(&self, left: &str, right: &str) -> bool {
        match self {
            Comparison::Eq => left == right,
            Comparison::NotEq => left != right,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Comparison::Eq => "==",
            Comparison::NotEq => "!=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Term {
    Literal(String),
    /// Dotted context variable such as `response.headers.etag`
    Variable(String),
    Local(String),
    JsonPath(String),
}

/// Terms joined with `+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Expr {
    pub terms: Vec<Term>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Statement {
    Print(Expr),
    Assert {
        left: Expr,
        op: Comparison,
        right: Expr,
    },
    Let {
        name: String,
        value: Expr,
    },
}

/// A compiled hook program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hook {
    source: String,
    statements: Vec<Statement>,
}

impl Hook {
    pub fn compile(source: &str) -> Result<Hook, HookError> {
        let statements = hook_compiler::compile(source)?;
        Ok(Hook {
            source: source.to_string(),
            statements,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Execute the program against `context`. Stops at the first failing
    /// statement.
    pub fn run(&self, context: &HookContext) -> Result<HookOutput, HookError> {
        let mut locals: HashMap<&str, String> = HashMap::new();
        let mut output = HookOutput::default();
        for statement in &self.statements {
            match statement {
                Statement::Print(expr) => {
                    output.lines.push(eval(expr, context, &locals)?);
                }
                Statement::Assert { left, op, right } => {
                    let left = eval(left, context, &locals)?;
                    let right = eval(right, context, &locals)?;
                    if !op.holds(&left, &right) {
                        return Err(HookError::AssertionFailed {
                            left,
                            op: op.symbol(),
                            right,
                        });
                    }
                }
                Statement::Let { name, value } => {
                    let value = eval(value, context, &locals)?;
                    locals.insert(name.as_str(), value);
                }
            }
        }
        Ok(output)
    }
}

impl Serialize for Hook {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

fn eval(expr: &Expr, context: &HookContext, locals: &HashMap<&str, String>) -> Result<String, HookError> {
    let mut value = String::new();
    for term in &expr.terms {
        match term {
            Term::Literal(text) => value.push_str(text),
            Term::Variable(path) => value.push_str(
                context
                    .get(path)
                    .ok_or_else(|| HookError::UnknownVariable(path.clone()))?,
            ),
            Term::Local(name) => value.push_str(
                locals
                    .get(name.as_str())
                    .ok_or_else(|| HookError::UnknownVariable(name.clone()))?,
            ),
            Term::JsonPath(path) => value.push_str(&select_json(path, context)?),
        }
    }
    Ok(value)
}

fn select_json(path: &str, context: &HookContext) -> Result<String, HookError> {
    let failed = |reason: String| HookError::JsonPath {
        path: path.to_string(),
        reason,
    };
    let body = context
        .get(HookContext::RESPONSE_BODY)
        .ok_or_else(|| HookError::UnknownVariable(HookContext::RESPONSE_BODY.to_string()))?;
    let json: Value = serde_json::from_str(body).map_err(|e| failed(format!("response body is not JSON: {}", e)))?;
    let found = jsonpath_lib::select(&json, path).map_err(|e| failed(format!("{:?}", e)))?;
    match found.first() {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(failed("no match".to_string())),
    }
}

/// Variables visible to a running hook, keyed by dotted name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookContext {
    variables: BTreeMap<String, String>,
}

impl HookContext {
    pub const RESPONSE_BODY: &'static str = "response.body";

    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `request.*` variables from a parsed testcase. Byte bodies are
    /// not exposed.
    pub fn from_testcase(testcase: &Testcase) -> Self {
        let mut context = HookContext::new();
        context.insert("request.name", testcase.name());
        context.insert("request.method", testcase.method());
        context.insert("request.url", testcase.url());
        if let Some(text) = testcase.body().and_then(|body| body.as_text()) {
            context.insert("request.body", text);
        }
        for (name, value) in testcase.headers() {
            context.insert(format!("request.headers.{}", name.to_lowercase()), value.as_str());
        }
        for (name, value) in testcase.query_params() {
            context.insert(format!("request.query.{}", name), value.as_str());
        }
        context
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookOutput {
    pub lines: Vec<String>,
}
