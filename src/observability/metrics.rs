//! Prometheus metrics with push-gateway delivery.
//!
//! A prune run is a short-lived batch process, so nothing is scraped. The
//! recorder accumulates counters for the run and the rendered exposition is
//! pushed to a gateway when the observability handle shuts down.

use crate::config::{MetricsPushGatewaySettings, MetricsSettings};
use crate::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::thread;
use std::time::Duration;

const PUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Push gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushGatewayConfig {
    /// Push gateway endpoint URI, including the job grouping path.
    pub endpoint: String,
    /// Optional username for basic auth.
    pub username: Option<String>,
    /// Optional password for basic auth.
    pub password: Option<String>,
    /// Whether to use HTTP POST instead of PUT.
    pub use_http_post: bool,
}

/// Metrics configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether metrics are recorded at all.
    pub enabled: bool,
    /// Optional push gateway configuration.
    pub push_gateway: Option<PushGatewayConfig>,
}

impl MetricsConfig {
    /// Builds metrics configuration from config settings with env overrides.
    #[must_use]
    pub fn from_settings(settings: Option<&MetricsSettings>) -> Self {
        Self::from_sources(settings, |key| std::env::var(key).ok())
    }

    fn from_sources<F>(settings: Option<&MetricsSettings>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            enabled: settings.and_then(|s| s.enabled).unwrap_or(false),
            push_gateway: settings
                .and_then(|s| s.push_gateway.as_ref())
                .and_then(parse_push_gateway_settings),
        };

        if let Some(enabled) = parse_bool(env("STAGEPRUNE_METRICS_ENABLED")) {
            config.enabled = enabled;
        }
        apply_push_gateway_env_overrides(&mut config, &env);

        config
    }
}

/// Metrics handle for flushing on shutdown.
#[derive(Debug)]
pub struct MetricsHandle {
    prometheus: PrometheusHandle,
    push_gateway: Option<PushGatewayConfig>,
}

impl MetricsHandle {
    /// Renders the current exposition text.
    #[must_use]
    pub fn render(&self) -> String {
        self.prometheus.render()
    }
}

/// Installs the Prometheus recorder as the global metrics recorder.
///
/// Returns `Ok(None)` when metrics are disabled, in which case every
/// `metrics::counter!` call in the crate is a no-op.
///
/// # Errors
///
/// Returns an error if a global recorder is already installed.
pub fn install_prometheus(config: &MetricsConfig) -> Result<Option<MetricsHandle>> {
    if !config.enabled {
        return Ok(None);
    }

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::OperationFailed {
            operation: "metrics_recorder_install".to_string(),
            cause: e.to_string(),
        })?;

    Ok(Some(MetricsHandle {
        prometheus,
        push_gateway: config.push_gateway.clone(),
    }))
}

/// Pushes the rendered metrics to the push gateway if one is configured.
///
/// `reqwest::blocking` must not run on a tokio worker, so inside a runtime
/// the push happens on a scoped thread that is joined before returning.
pub fn flush(handle: &MetricsHandle) {
    let Some(push_gateway) = &handle.push_gateway else {
        tracing::debug!("No push gateway configured, skipping flush");
        return;
    };

    let mut payload = handle.render();
    // The gateway rejects bodies without a trailing newline.
    if !payload.ends_with('\n') {
        payload.push('\n');
    }

    tracing::debug!(
        bytes = payload.len(),
        endpoint = %push_gateway.endpoint,
        "Pushing metrics to push gateway"
    );

    if tokio::runtime::Handle::try_current().is_ok() {
        thread::scope(|scope| {
            scope.spawn(|| flush_to_gateway(push_gateway, payload));
        });
    } else {
        flush_to_gateway(push_gateway, payload);
    }
}

fn flush_to_gateway(gateway: &PushGatewayConfig, payload: String) {
    let client = Client::new();

    let request = if gateway.use_http_post {
        client.post(&gateway.endpoint)
    } else {
        client.put(&gateway.endpoint)
    };

    let request = match gateway.username.as_deref() {
        Some(username) => request.basic_auth(username, gateway.password.as_deref()),
        None => request,
    };

    let response = request
        .header(CONTENT_TYPE, "text/plain; version=0.0.4")
        .timeout(PUSH_TIMEOUT)
        .body(payload)
        .send();

    match response {
        Ok(resp) if resp.status().is_success() => {
            tracing::debug!(status = %resp.status(), "Metrics pushed successfully");
        },
        Ok(resp) => {
            tracing::warn!(status = %resp.status(), "Metrics push failed");
        },
        Err(err) => {
            tracing::warn!("Failed to push metrics: {err}");
        },
    }
}

fn parse_bool(value: Option<String>) -> Option<bool> {
    value.map(|value| {
        let value = value.trim().to_lowercase();
        value == "true" || value == "1" || value == "yes"
    })
}

fn trimmed(value: Option<&String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_push_gateway_settings(settings: &MetricsPushGatewaySettings) -> Option<PushGatewayConfig> {
    let endpoint = trimmed(settings.endpoint.as_ref())?;

    Some(PushGatewayConfig {
        endpoint,
        username: trimmed(settings.username.as_ref()),
        password: trimmed(settings.password.as_ref()),
        // One run is one push, so replacing the group is the default.
        use_http_post: settings.use_http_post.unwrap_or(false),
    })
}

fn apply_push_gateway_env_overrides<F>(config: &mut MetricsConfig, env: &F)
where
    F: Fn(&str) -> Option<String>,
{
    let endpoint = trimmed(env("STAGEPRUNE_METRICS_PUSH_GATEWAY_ENDPOINT").as_ref());
    let username = trimmed(env("STAGEPRUNE_METRICS_PUSH_GATEWAY_USERNAME").as_ref());
    let password = trimmed(env("STAGEPRUNE_METRICS_PUSH_GATEWAY_PASSWORD").as_ref());
    let use_http_post = parse_bool(env("STAGEPRUNE_METRICS_PUSH_GATEWAY_USE_POST"));

    if endpoint.is_none() && username.is_none() && password.is_none() && use_http_post.is_none() {
        return;
    }

    let mut current = config.push_gateway.clone().unwrap_or(PushGatewayConfig {
        endpoint: String::new(),
        username: None,
        password: None,
        use_http_post: false,
    });

    if let Some(endpoint) = endpoint {
        current.endpoint = endpoint;
    }
    if username.is_some() {
        current.username = username;
    }
    if password.is_some() {
        current.password = password;
    }
    if let Some(use_http_post) = use_http_post {
        current.use_http_post = use_http_post;
    }

    if current.endpoint.is_empty() {
        return;
    }

    config.push_gateway = Some(current);
}
