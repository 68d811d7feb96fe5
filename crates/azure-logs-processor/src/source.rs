// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Derives the `source` string attached to every envelope of a batch.

use regex::Regex;
use std::sync::OnceLock;

use crate::config::Config;
use crate::constants::SOURCE_SCHEME;
use crate::error::ConfigError;

static ENDPOINT_PATTERN: OnceLock<Regex> = OnceLock::new();

#[allow(clippy::expect_used)]
fn endpoint_pattern() -> &'static Regex {
    ENDPOINT_PATTERN.get_or_init(|| {
        Regex::new(r"Endpoint=sb://(.+)\.servicebus\.windows\.net")
            .expect("endpoint pattern is a valid regex")
    })
}

/// Extracts the Event Hub namespace from a connection string such as
/// `Endpoint=sb://my-namespace.servicebus.windows.net/;SharedAccessKeyName=...`.
///
/// # Examples
///
/// ```
/// use azure_logs_processor::source::event_hub_namespace;
///
/// let connection = "key1=val;Endpoint=sb://Mock-0-Namespace1.servicebus.windows.net/;key2=v";
/// assert_eq!(event_hub_namespace(connection), Some("Mock-0-Namespace1"));
/// assert_eq!(event_hub_namespace("Endpoint=https://example.com"), None);
/// ```
#[must_use]
pub fn event_hub_namespace(connection: &str) -> Option<&str> {
    endpoint_pattern()
        .captures(connection)
        .and_then(|captures| captures.get(1))
        .map(|namespace| namespace.as_str())
}

/// Builds `azure:{region}:{namespace}:{name}`.
pub fn source_identifier(
    region: Option<&str>,
    connection: Option<&str>,
    event_hub_name: Option<&str>,
) -> Result<String, ConfigError> {
    let region = region.ok_or(ConfigError::Missing("Region"))?;
    let connection = connection.ok_or(ConfigError::Missing("EventHubConnection"))?;
    let event_hub_name = event_hub_name.ok_or(ConfigError::Missing("EventHubName"))?;
    let namespace = event_hub_namespace(connection).ok_or(ConfigError::InvalidConnectionString)?;

    Ok(format!(
        "{SOURCE_SCHEME}:{region}:{namespace}:{event_hub_name}"
    ))
}

impl Config {
    /// The source string for every envelope built with this configuration.
    pub fn source(&self) -> Result<String, ConfigError> {
        source_identifier(
            self.region.as_deref(),
            self.event_hub_connection.as_deref(),
            self.event_hub_name.as_deref(),
        )
    }
}
