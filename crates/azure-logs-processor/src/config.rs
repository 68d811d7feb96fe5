// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use reqwest::header::HeaderValue;
use std::env;
use std::time::Duration;

use crate::constants::{DEFAULT_FUNCTION_TIMEOUT, DEFAULT_MAX_PAYLOAD_SIZE_BYTES, HEC_EVENT_PATH};
use crate::error::ConfigError;

/// Configuration of one processor, read from the function app settings.
///
/// The values every envelope or request depends on are optional here on purpose: a
/// missing value is reported while the batch is being built, so the batch is backed up
/// instead of being lost at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the HEC endpoint, e.g. `https://hec.example.com:8088`
    pub hec_url: Option<String>,
    /// HEC token sent as `Authorization: Splunk <token>`
    pub hec_token: Option<String>,
    /// Sourcetype set on every envelope
    pub source_type: Option<String>,
    /// Azure region of the Event Hub
    pub region: Option<String>,
    /// Event Hub connection string, used to derive the namespace
    pub event_hub_connection: Option<String>,
    /// Event Hub name
    pub event_hub_name: Option<String>,
    /// Maximum size of one HEC request body, in bytes
    pub max_payload_size_bytes: usize,
    /// Attach Event Hub system properties to every record
    pub enable_event_hub_metadata: bool,
    /// Data manager input id added as an indexed field when set
    pub data_manager_input_id: Option<String>,
    /// Gzip request bodies
    pub use_compression: bool,
    /// Host timeout of one invocation, used to bound every request
    pub function_timeout: Duration,
    /// HTTPS proxy URL
    pub https_proxy: Option<String>,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hec_url: None,
            hec_token: None,
            source_type: None,
            region: None,
            event_hub_connection: None,
            event_hub_name: None,
            max_payload_size_bytes: DEFAULT_MAX_PAYLOAD_SIZE_BYTES,
            enable_event_hub_metadata: false,
            data_manager_input_id: None,
            use_compression: false,
            function_timeout: DEFAULT_FUNCTION_TIMEOUT,
            https_proxy: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let max_payload_size_bytes = env::var("SPLUNK_BATCH_MAX_SIZE_BYTES")
            .ok()
            .and_then(|size| size.trim().parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_MAX_PAYLOAD_SIZE_BYTES);
        let function_timeout = env::var("FunctionTimeoutSecs")
            .ok()
            .and_then(|secs| secs.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_FUNCTION_TIMEOUT, Duration::from_secs);
        let https_proxy = env::var("HTTPS_PROXY")
            .or_else(|_| env::var("https_proxy"))
            .ok();
        let log_level = env::var("LogLevel")
            .ok()
            .and_then(|val| normalize_log_level(&val))
            .unwrap_or(DEFAULT_LOG_LEVEL)
            .to_string();

        let config = Self {
            hec_url: env::var("HecUrl").ok(),
            hec_token: env::var("HecToken").ok(),
            source_type: env::var("SourceType").ok(),
            region: env::var("Region").ok(),
            event_hub_connection: env::var("EventHubConnection").ok(),
            event_hub_name: env::var("EventHubName").ok(),
            max_payload_size_bytes,
            enable_event_hub_metadata: env_flag("EnableEventhubMetadata"),
            data_manager_input_id: env::var("DataManagerInputId").ok(),
            use_compression: env_flag("HecUseCompression"),
            function_timeout,
            https_proxy,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the ambient settings.
    ///
    /// Values needed to build or send the batch are checked later, see [`Config::hec_params`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_payload_size_bytes == 0 {
            return Err(ConfigError::Invalid(
                "maximum payload size must be greater than 0".to_string(),
            ));
        }

        if self.function_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "function timeout must be greater than 0".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Resolves the HEC events URL and the authorization header.
    pub fn hec_params(&self) -> Result<HecParams, ConfigError> {
        let hec_url = self
            .hec_url
            .as_deref()
            .ok_or(ConfigError::Missing("HecUrl"))?;
        let hec_token = self
            .hec_token
            .as_deref()
            .ok_or(ConfigError::Missing("HecToken"))?;

        let authorization = HeaderValue::from_str(&format!("Splunk {hec_token}"))
            .map_err(|_| ConfigError::Invalid("HecToken is not a valid header value".to_string()))?;

        Ok(HecParams {
            url: format!("{}/{HEC_EVENT_PATH}", hec_url.trim_end_matches('/')),
            authorization,
        })
    }
}

/// Where and how to post payloads.
#[derive(Debug, Clone)]
pub struct HecParams {
    /// Full URL of the events endpoint
    pub url: String,
    /// `Splunk <token>`
    pub authorization: HeaderValue,
}

const DEFAULT_LOG_LEVEL: &str = "info";

/// Maps a `LogLevel` setting to a tracing level name.
///
/// Besides the tracing names, the Python logging names `WARNING`, `CRITICAL` and `FATAL`
/// are accepted. Returns `None` for anything else.
#[must_use]
pub fn normalize_log_level(raw: &str) -> Option<&'static str> {
    match raw.trim().to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" | "critical" | "fatal" => Some("error"),
        _ => None,
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|val| val.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
