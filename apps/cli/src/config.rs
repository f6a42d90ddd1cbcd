use std::{
    collections::BTreeMap,
    fs,
    path::Path,
    time::Duration,
};

use anyhow::Context;
use request_core::{duration_from_millis, ControllerOptions, Method, RequestConfig};
use serde::Deserialize;

const DEFAULT_SETTINGS_FILE: &str = "ajax.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub endpoint: Option<String>,
    pub base_url: Option<String>,
    pub method: Method,
    pub headers: BTreeMap<String, String>,
    pub timeout_ms: Option<u64>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub success_message_duration: Option<Duration>,
    pub error_message_duration: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: None,
            base_url: None,
            method: Method::Get,
            headers: BTreeMap::new(),
            timeout_ms: Some(30_000),
            success_message: None,
            error_message: None,
            success_message_duration: None,
            error_message_duration: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    endpoint: Option<String>,
    base_url: Option<String>,
    method: Option<String>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    timeout_ms: Option<u64>,
    success_message: Option<String>,
    error_message: Option<String>,
    success_message_duration_ms: Option<f64>,
    error_message_duration_ms: Option<f64>,
}

impl Settings {
    pub fn request_config(&self) -> RequestConfig {
        let mut config = RequestConfig::new().with_method(self.method);
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint.clone());
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        for (name, value) in &self.headers {
            config = config.with_header(name.clone(), value.clone());
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config = config.with_timeout(Duration::from_millis(timeout_ms));
        }
        config
    }

    pub fn controller_options<T>(&self, config: RequestConfig) -> ControllerOptions<T> {
        let mut options = ControllerOptions::new(config)
            .success_message_duration(self.success_message_duration)
            .error_message_duration(self.error_message_duration);
        if let Some(message) = &self.success_message {
            options = options.default_success_message(message.clone());
        }
        if let Some(message) = &self.error_message {
            options = options.default_error_message(message.clone());
        }
        options
    }

    fn apply_file(&mut self, file_cfg: FileSettings) -> anyhow::Result<()> {
        if let Some(v) = file_cfg.endpoint {
            self.endpoint = Some(v);
        }
        if let Some(v) = file_cfg.base_url {
            self.base_url = Some(v);
        }
        if let Some(v) = file_cfg.method {
            self.method = parse_method(&v)?;
        }
        self.headers.extend(file_cfg.headers);
        if let Some(v) = file_cfg.timeout_ms {
            self.timeout_ms = Some(v);
        }
        if let Some(v) = file_cfg.success_message {
            self.success_message = Some(v);
        }
        if let Some(v) = file_cfg.error_message {
            self.error_message = Some(v);
        }
        if let Some(v) = file_cfg.success_message_duration_ms {
            self.success_message_duration = duration_from_millis(v);
        }
        if let Some(v) = file_cfg.error_message_duration_ms {
            self.error_message_duration = duration_from_millis(v);
        }
        Ok(())
    }

    /// Later names win, so `APP__*` overrides the short form.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(v) = lookup("AJAX_ENDPOINT") {
            self.endpoint = Some(v);
        }
        if let Some(v) = lookup("APP__ENDPOINT") {
            self.endpoint = Some(v);
        }
        if let Some(v) = lookup("APP__BASE_URL") {
            self.base_url = Some(v);
        }
        if let Some(v) = lookup("APP__METHOD") {
            self.method = parse_method(&v)?;
        }
        if let Some(v) = lookup("APP__TIMEOUT_MS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.timeout_ms = Some(parsed);
            }
        }
        if let Some(v) = lookup("APP__SUCCESS_MESSAGE") {
            self.success_message = Some(v);
        }
        if let Some(v) = lookup("APP__ERROR_MESSAGE") {
            self.error_message = Some(v);
        }
        if let Some(v) = lookup("APP__SUCCESS_MESSAGE_DURATION_MS") {
            self.success_message_duration = v.parse::<f64>().ok().and_then(duration_from_millis);
        }
        if let Some(v) = lookup("APP__ERROR_MESSAGE_DURATION_MS") {
            self.error_message_duration = v.parse::<f64>().ok().and_then(duration_from_millis);
        }
        Ok(())
    }
}

/// Defaults, then the settings file, then the environment.
///
/// An explicit `path` must exist; the default `ajax.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let raw = match path {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))?,
        ),
        None => fs::read_to_string(DEFAULT_SETTINGS_FILE).ok(),
    };
    if let Some(raw) = raw {
        settings.apply_file(parse_settings_file(&raw)?)?;
    }

    settings.apply_env(|name| std::env::var(name).ok())?;
    Ok(settings)
}

fn parse_settings_file(raw: &str) -> anyhow::Result<FileSettings> {
    toml::from_str(raw).context("invalid settings file")
}

fn parse_method(raw: &str) -> anyhow::Result<Method> {
    raw.parse::<Method>()
        .with_context(|| format!("invalid http method in settings: '{raw}'"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
