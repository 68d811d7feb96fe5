// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP client used to reach the HEC endpoint.
//!
//! The client is built once per processor and reused for every payload. Request timeouts
//! are set per request by the flusher, since they depend on the size of each batch.

use core::time::Duration;
use reqwest::ClientBuilder;
use tracing::{debug, error};

use crate::config::Config;

/// Creates a reqwest client builder using reqwest's rustls TLS implementation.
#[must_use]
pub fn create_reqwest_client_builder() -> ClientBuilder {
    reqwest::Client::builder().use_rustls_tls()
}

/// Creates a configured HTTP client.
///
/// If the proxy configuration is unusable, logs an error and falls back to a direct
/// connection rather than failing the invocation.
#[must_use]
pub fn get_client(config: &Config) -> reqwest::Client {
    match build_client(config, true) {
        Ok(client) => client,
        Err(e) => {
            error!(
                "Unable to parse proxy configuration: {}, falling back to direct connection",
                e
            );
            match build_client(config, false) {
                Ok(client) => client,
                Err(inner) => {
                    error!(
                        "Failed to build HTTP client without proxy: {}, using reqwest defaults",
                        inner
                    );
                    reqwest::Client::new()
                }
            }
        }
    }
}

fn build_client(config: &Config, allow_proxy: bool) -> Result<reqwest::Client, reqwest::Error> {
    let mut client = create_reqwest_client_builder()
        .pool_idle_timeout(Some(Duration::from_secs(270)))
        .tcp_keepalive(Some(Duration::from_secs(120)));

    if allow_proxy {
        if let Some(https_proxy) = &config.https_proxy {
            debug!("Using HTTPS proxy {https_proxy}");
            client = client.proxy(reqwest::Proxy::https(https_proxy)?);
        }
    } else {
        client = client.no_proxy();
    }

    client.build()
}
