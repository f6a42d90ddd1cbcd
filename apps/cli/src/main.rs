use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use request_core::{
    FailureReport, Method, Override, Phase, ReqwestTransport, RequestConfig, RequestController,
    StateSnapshot,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, Settings};

/// Issue requests through a request controller and print its final state.
#[derive(Parser, Debug)]
struct Cli {
    /// Settings file; defaults to ./ajax.toml when present.
    #[arg(long)]
    settings: Option<PathBuf>,
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    method: Option<Method>,
    /// Repeatable `name:value` header.
    #[arg(long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,
    /// JSON request body.
    #[arg(long)]
    body: Option<String>,
    /// JSON object applied to each manual invocation.
    #[arg(long = "override")]
    override_json: Option<String>,
    /// Replace the base configuration with the override instead of merging.
    #[arg(long)]
    replace: bool,
    #[arg(long, default_value_t = 1)]
    repeat: u32,
    /// Let the controller fire its first request at construction.
    #[arg(long)]
    immediate: bool,
    /// Give up waiting for settlement after this many seconds.
    #[arg(long, default_value_t = 60)]
    wait_secs: u64,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(endpoint) = &self.endpoint {
            settings.endpoint = Some(endpoint.clone());
        }
        if let Some(base_url) = &self.base_url {
            settings.base_url = Some(base_url.clone());
        }
        if let Some(method) = self.method {
            settings.method = method;
        }
        for (name, value) in &self.headers {
            settings.headers.insert(name.clone(), value.clone());
        }
    }

    fn override_config(&self) -> Result<Option<RequestConfig>> {
        let Some(raw) = &self.override_json else {
            return Ok(None);
        };
        let value: Value = serde_json::from_str(raw).context("--override must be valid JSON")?;
        Ok(Some(RequestConfig::try_from(value)?))
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("header '{raw}' must look like name:value"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

#[derive(Serialize)]
struct Report<'a> {
    phase: Phase,
    #[serde(flatten)]
    state: &'a StateSnapshot<Value>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(cli.settings.as_deref())?;
    cli.apply(&mut settings);
    if settings.endpoint.is_none() {
        bail!("no endpoint configured; pass --endpoint or set APP__ENDPOINT");
    }

    let mut base = settings.request_config();
    if let Some(body) = &cli.body {
        let body: Value = serde_json::from_str(body).context("--body must be valid JSON")?;
        base = base.with_body(body);
    }
    let over = cli.override_config()?;

    let options = settings
        .controller_options::<Value>(base)
        .invoke_immediately(cli.immediate)
        .on_error(|err| {
            let report = FailureReport::from(err);
            warn!("ajax: request failed kind={:?}: {}", report.kind, report.message);
            None
        });
    let controller = RequestController::new(options, Arc::new(ReqwestTransport::new()))?;

    let manual = if cli.immediate {
        cli.repeat.saturating_sub(1)
    } else {
        cli.repeat
    };
    for _ in 0..manual {
        match &over {
            Some(over) => controller.invoke_with(Override::from(over.clone()), !cli.replace),
            None => controller.invoke(),
        }
    }

    let expected = controller.snapshot().calls;
    info!("ajax: waiting for {expected} request(s) to settle");
    let mut rx = controller.subscribe();
    let state = tokio::time::timeout(
        Duration::from_secs(cli.wait_secs),
        rx.wait_for(|state| state.settled_calls() >= expected && !state.loading),
    )
    .await
    .context("timed out waiting for requests to settle")?
    .context("controller dropped before settling")?
    .clone();

    let report = Report {
        phase: state.phase(),
        state: &state,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if state.error {
        bail!("last request failed");
    }
    Ok(())
}
