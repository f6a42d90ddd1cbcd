use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::{Method, RequestConfig, Response, TransportError};
use tracing::debug;
use url::Url;

/// Performs the network call for an effective configuration.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, config: RequestConfig) -> Result<Response, TransportError>;
}

/// Rejects every request. Stands in until a real transport is wired.
pub struct MissingTransport;

#[async_trait]
impl Transport for MissingTransport {
    async fn request(&self, config: RequestConfig) -> Result<Response, TransportError> {
        Err(TransportError::Network(format!(
            "no transport client available for endpoint {}",
            config.endpoint().unwrap_or("<none>")
        )))
    }
}

/// HTTP transport over `reqwest`.
///
/// Non-2xx responses are failures carrying the decoded body. Bodies are parsed
/// as JSON; an empty body is `null` and anything unparsable is kept as a string.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(&self, config: RequestConfig) -> Result<Response, TransportError> {
        let url = resolve_url(&config)?;
        let method = config.method()?;
        debug!("transport: {method} {url}");

        let mut builder = self.http.request(http_method(method), url);
        for (name, value) in config.headers() {
            builder = builder.header(name, value);
        }
        let params = config.params();
        if !params.is_empty() {
            builder = builder.query(&params);
        }
        if let Some(body) = config.body() {
            builder = builder.json(body);
        }
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let res = builder.send().await.map_err(map_reqwest_error)?;
        let status = res.status().as_u16();
        let headers: BTreeMap<String, String> = res
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let bytes = res.bytes().await.map_err(map_reqwest_error)?;
        let data = parse_body(&bytes);

        if !(200..300).contains(&status) {
            return Err(TransportError::Status { status, body: data });
        }

        Ok(Response {
            status,
            headers,
            data,
        })
    }
}

/// Absolute endpoints are used as-is; relative ones are appended to `base_url`.
fn resolve_url(config: &RequestConfig) -> Result<Url, TransportError> {
    let endpoint = config
        .endpoint()
        .ok_or_else(|| TransportError::InvalidConfig("missing endpoint".to_string()))?;

    if let Ok(url) = Url::parse(endpoint) {
        return Ok(url);
    }

    let Some(base_url) = config.base_url() else {
        return Err(TransportError::InvalidConfig(format!(
            "endpoint '{endpoint}' is not an absolute url and no base_url is set"
        )));
    };

    let joined = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    );
    Url::parse(&joined)
        .map_err(|err| TransportError::InvalidConfig(format!("invalid url '{joined}': {err}")))
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_builder() {
        TransportError::InvalidConfig(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
