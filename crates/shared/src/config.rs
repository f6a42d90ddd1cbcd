use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TransportError;

/// Well-known keys of a [`RequestConfig`]. Anything else is carried along untouched.
pub mod keys {
    pub const ENDPOINT: &str = "endpoint";
    pub const BASE_URL: &str = "base_url";
    pub const METHOD: &str = "method";
    pub const HEADERS: &str = "headers";
    pub const BODY: &str = "body";
    pub const PARAMS: &str = "params";
    pub const TIMEOUT_MS: &str = "timeout_ms";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = TransportError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            other => Err(TransportError::InvalidConfig(format!(
                "unsupported http method '{other}'"
            ))),
        }
    }
}

/// Open-ended transport parameters keyed by name.
///
/// Merging works per top-level key, so a partial config only needs the keys it
/// wants to change. Typed accessors read the keys listed in [`keys`]; values of
/// the wrong JSON type read as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestConfig(Map<String, Value>);

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Copies every key of `other` into `self`; `other` wins on conflicts.
    pub fn overlay(&mut self, other: &RequestConfig) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn with_endpoint(self, endpoint: impl Into<String>) -> Self {
        self.set(keys::ENDPOINT, endpoint.into())
    }

    pub fn with_base_url(self, base_url: impl Into<String>) -> Self {
        self.set(keys::BASE_URL, base_url.into())
    }

    pub fn with_method(self, method: Method) -> Self {
        self.set(keys::METHOD, method.as_str())
    }

    pub fn with_body(self, body: impl Into<Value>) -> Self {
        self.set(keys::BODY, body)
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.set(keys::TIMEOUT_MS, millis)
    }

    pub fn with_header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_nested(keys::HEADERS, name.into(), Value::String(value.into()))
    }

    pub fn with_param(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_nested(keys::PARAMS, name.into(), value.into())
    }

    fn with_nested(mut self, key: &str, name: String, value: Value) -> Self {
        let entry = self
            .0
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(map) = entry {
            map.insert(name, value);
        }
        self
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.get(keys::ENDPOINT).and_then(Value::as_str)
    }

    pub fn base_url(&self) -> Option<&str> {
        self.get(keys::BASE_URL).and_then(Value::as_str)
    }

    /// Absent means `GET`; a present but unknown method is a configuration error.
    pub fn method(&self) -> Result<Method, TransportError> {
        match self.get(keys::METHOD) {
            None | Some(Value::Null) => Ok(Method::default()),
            Some(Value::String(raw)) => raw.parse(),
            Some(other) => Err(TransportError::InvalidConfig(format!(
                "method must be a string, got {other}"
            ))),
        }
    }

    /// Header pairs; non-string header values are skipped.
    pub fn headers(&self) -> Vec<(String, String)> {
        self.get(keys::HEADERS)
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(name, value)| {
                        value.as_str().map(|value| (name.clone(), value.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Query pairs; strings are taken as-is, other scalars are rendered as JSON.
    pub fn params(&self) -> Vec<(String, String)> {
        self.get(keys::PARAMS)
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter(|(_, value)| !value.is_null())
                    .map(|(name, value)| {
                        let rendered = match value {
                            Value::String(raw) => raw.clone(),
                            other => other.to_string(),
                        };
                        (name.clone(), rendered)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn body(&self) -> Option<&Value> {
        self.get(keys::BODY).filter(|value| !value.is_null())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.get(keys::TIMEOUT_MS)
            .and_then(Value::as_f64)
            .and_then(duration_from_millis)
    }
}

impl From<Map<String, Value>> for RequestConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for RequestConfig {
    type Error = TransportError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(TransportError::InvalidConfig(format!(
                "request config must be a JSON object, got {other}"
            ))),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RequestConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Converts a millisecond count into a duration. Non-finite or negative input
/// disables the timer and yields `None`; finite values too large for a
/// [`Duration`] saturate to [`Duration::MAX`].
pub fn duration_from_millis(ms: f64) -> Option<Duration> {
    if !ms.is_finite() || ms < 0.0 {
        return None;
    }
    let secs = ms / 1000.0;
    if secs >= Duration::MAX.as_secs_f64() {
        return Some(Duration::MAX);
    }
    Some(Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
