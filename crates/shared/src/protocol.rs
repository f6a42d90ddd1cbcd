use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;

/// A settled transport call. Transports produce `Response<Value>`; controllers
/// decode `data` into their payload type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response<T = Value> {
    pub status: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    pub data: T,
}

impl<T> Response<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            data,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

impl Response<Value> {
    pub fn decode<T: DeserializeOwned>(self) -> Result<Response<T>, TransportError> {
        let data = serde_json::from_value(self.data)?;
        Ok(Response {
            status: self.status,
            headers: self.headers,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::FailureKind;

    #[test]
    fn decodes_payload_and_keeps_envelope() {
        let response = Response::new(json!(["x", "y"]))
            .with_status(201)
            .with_header("etag", "v1");
        let decoded: Response<Vec<String>> = response.decode().expect("decode");
        assert_eq!(decoded.data, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(decoded.status, 201);
        assert_eq!(decoded.headers.get("etag").map(String::as_str), Some("v1"));
    }

    #[test]
    fn mismatched_payload_is_a_decode_failure() {
        let err = Response::new(json!({"not": "a list"}))
            .decode::<Vec<String>>()
            .expect_err("shape mismatch");
        assert_eq!(err.kind(), FailureKind::Decode);
    }
}
