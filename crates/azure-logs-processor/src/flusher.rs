// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery of payloads to the HEC events endpoint.
//!
//! Payloads are posted one at a time, in the order the batcher produced them, because
//! downstream searches may rely on arrival order. A payload that fails (non-2xx status or
//! transport error) is kept aside and the next one is attempted; there is no retry within
//! an invocation.

use flate2::{write::GzEncoder, Compression};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_ENCODING};
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace};

use crate::config::{Config, HecParams};
use crate::constants::{
    BUFFER_TIME, DEFAULT_FUNCTION_TIMEOUT, INIT_TIME, MIN_REQUEST_TIMEOUT, WRITE_TIME,
};
use crate::error::DeliveryError;
use crate::util::truncate_for_log;

/// Share of the function timeout available for sending payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryBudget {
    pub function_timeout: Duration,
    pub init_time: Duration,
    pub write_time: Duration,
    pub buffer: Duration,
}

impl Default for DeliveryBudget {
    fn default() -> Self {
        Self::new(DEFAULT_FUNCTION_TIMEOUT)
    }
}

impl DeliveryBudget {
    #[must_use]
    pub fn new(function_timeout: Duration) -> Self {
        Self {
            function_timeout,
            init_time: INIT_TIME,
            write_time: WRITE_TIME,
            buffer: BUFFER_TIME,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.function_timeout)
    }

    /// Timeout of each request when `payload_count` payloads remain to be sent after
    /// `build_time` was spent building them. Never below [`MIN_REQUEST_TIMEOUT`].
    #[must_use]
    pub fn request_timeout(&self, build_time: Duration, payload_count: usize) -> Duration {
        let remaining = self
            .function_timeout
            .saturating_sub(self.init_time)
            .saturating_sub(self.write_time)
            .saturating_sub(self.buffer)
            .saturating_sub(build_time)
            .max(MIN_REQUEST_TIMEOUT);
        let payload_count = u32::try_from(payload_count.max(1)).unwrap_or(u32::MAX);

        (remaining / payload_count).max(MIN_REQUEST_TIMEOUT)
    }
}

/// Posts payloads to one HEC endpoint.
#[derive(Debug, Clone)]
pub struct HecFlusher {
    client: reqwest::Client,
    url: String,
    headers: HeaderMap,
    use_compression: bool,
    timeout: Duration,
}

impl HecFlusher {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        params: HecParams,
        use_compression: bool,
        timeout: Duration,
    ) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, params.authorization);
        if use_compression {
            headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        }

        HecFlusher {
            client,
            url: params.url,
            headers,
            use_compression,
            timeout,
        }
    }

    /// Sends every payload in order and returns the ones that could not be delivered,
    /// in their original order.
    pub async fn flush(&self, payloads: Vec<String>) -> Vec<String> {
        let payload_count = payloads.len();
        info!("Sending {} payload(s) to Splunk", payload_count);

        let mut failed_payloads = Vec::new();
        for payload in payloads {
            if let Err(e) = self.send(&payload).await {
                error!(
                    "Failed to push to HEC. Error: {}",
                    truncate_for_log(&e.to_string())
                );
                failed_payloads.push(payload);
            }
        }

        info!(
            "Finished sending {} payload(s) to Splunk, {} failed",
            payload_count,
            failed_payloads.len()
        );
        failed_payloads
    }

    /// Posts one payload. Any status outside 2xx is an error.
    pub async fn send(&self, payload: &str) -> Result<(), DeliveryError> {
        trace!("Push to HEC with Payload={}", truncate_for_log(payload));
        let body = self.encode(payload)?;

        let time = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await?;
        let status = response.status();
        debug!(
            "Pushed to HEC in {} ms. Response Code = {}",
            time.elapsed().as_millis(),
            status
        );

        if status.is_success() {
            return Ok(());
        }

        // Only read the body when it is going to be reported
        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Status {
            status,
            body: truncate_for_log(&body).to_string(),
        })
    }

    fn encode(&self, payload: &str) -> Result<Vec<u8>, DeliveryError> {
        if !self.use_compression {
            return Ok(payload.as_bytes().to_vec());
        }

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(payload.as_bytes())
            .map_err(DeliveryError::Compression)?;
        encoder.finish().map_err(DeliveryError::Compression)
    }
}
