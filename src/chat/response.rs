//! Normalization of the query endpoint's reply.
//!
//! The backend answers `/conversations/{id}/query` with several loosely
//! related JSON shapes. [`ResponseShape::classify`] sorts a body into one of
//! them and [`ResponseShape::into_reply`] maps each shape onto what the
//! transcript needs: a payload for the result formatter, or plain text.

use serde_json::{Map, Value};

pub const FALLBACK_REPLY: &str = "I received your query but couldn't generate a response.";

/// Canonical `{success, results}` payload handed to the result formatter.
/// `success` is omitted from the JSON when the backend did not provide one;
/// `error` only appears when the backend explained an empty result.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryPayload {
    pub success: Option<Value>,
    pub error: Option<Value>,
    pub results: Vec<Value>,
}

impl QueryPayload {
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(success) = &self.success {
            map.insert("success".to_string(), success.clone());
        }
        if let Some(error) = &self.error {
            map.insert("error".to_string(), error.clone());
        }
        map.insert("results".to_string(), Value::Array(self.results.clone()));
        Value::Object(map)
    }
}

/// What the transcript should do with a successful reply.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    /// Run through the result formatter.
    Format(Value),
    /// Show verbatim.
    Text(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ResponseShape {
    /// `{results: {success, error?, results: [...]}}`
    Nested { success: Option<Value>, error: Option<Value>, results: Vec<Value> },
    /// `{results: {...}}` without an inner results array; the inner object
    /// becomes a single result.
    Wrapped { success: Option<Value>, inner: Value },
    /// `results` present in any other shape; the whole body is forwarded.
    PassThrough(Value),
    /// `{message: ...}`
    Message(Value),
    Empty,
}

impl ResponseShape {
    pub fn classify(body: Value) -> Self {
        let results = present(&body, "results").cloned();
        match results {
            Some(Value::Object(inner)) => match inner.get("results") {
                Some(Value::Array(items)) => ResponseShape::Nested {
                    success: defined(inner.get("success")),
                    error: inner.get("error").filter(|v| is_truthy(v)).cloned(),
                    results: items.clone(),
                },
                _ => {
                    // `body.success ?? inner.success`
                    let success =
                        defined(body.get("success")).or_else(|| defined(inner.get("success")));
                    ResponseShape::Wrapped { success, inner: Value::Object(inner) }
                }
            },
            Some(_) => ResponseShape::PassThrough(body),
            None => match present(&body, "message") {
                Some(message) => ResponseShape::Message(message.clone()),
                None => ResponseShape::Empty,
            },
        }
    }

    pub fn into_reply(self) -> Reply {
        match self {
            ResponseShape::Nested { success, error, results } => {
                Reply::Format(QueryPayload { success, error, results }.to_value())
            }
            ResponseShape::Wrapped { success, inner } => {
                Reply::Format(QueryPayload { success, error: None, results: vec![inner] }.to_value())
            }
            ResponseShape::PassThrough(body) => Reply::Format(body),
            ResponseShape::Message(Value::String(text)) => Reply::Text(text),
            ResponseShape::Message(other) => Reply::Text(other.to_string()),
            ResponseShape::Empty => Reply::Text(FALLBACK_REPLY.to_string()),
        }
    }
}

/// Classify and normalize a reply body in one step.
pub fn normalize(body: Value) -> Reply {
    let shape = ResponseShape::classify(body);
    tracing::debug!(shape = shape.kind(), "classified query response");
    shape.into_reply()
}

impl ResponseShape {
    fn kind(&self) -> &'static str {
        match self {
            ResponseShape::Nested { .. } => "nested",
            ResponseShape::Wrapped { .. } => "wrapped",
            ResponseShape::PassThrough(_) => "pass-through",
            ResponseShape::Message(_) => "message",
            ResponseShape::Empty => "empty",
        }
    }
}

/// The field, if it holds a truthy value. `null`, `false`, `0` and `""`
/// count as missing.
fn present<'a>(body: &'a Value, key: &str) -> Option<&'a Value> {
    body.get(key).filter(|v| is_truthy(v))
}

/// A field that exists and is not `null`.
fn defined(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
