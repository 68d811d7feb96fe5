// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! One invocation, from raw messages to delivered payloads and backups.
//!
//! ```text
//!   PARSING ──ok──> BUILT ──> DELIVERING ──> DONE
//!      │                          │
//!      └─ err ─> PREPUSH_FAILED   └─ some failed ─> PARTIAL_FAILURE ──> DONE
//! ```
//!
//! Building a batch either fully succeeds or nothing is sent and the raw bodies are backed
//! up. Once delivery starts every payload is attempted and only the rejected ones are
//! backed up.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::backup::{join_lines, BackupSink, BackupTier};
use crate::batcher::{serialize_all, Batcher};
use crate::config::{Config, HecParams};
use crate::envelope::EnvelopeBuilder;
use crate::error::{BackupError, PrepushError};
use crate::flusher::{DeliveryBudget, HecFlusher};
use crate::http::get_client;
use crate::message::{MessageFlattener, RawMessage};

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Every payload was accepted; nothing was backed up.
    Delivered { payloads: usize },
    /// The batch could not be built; its raw bodies were backed up.
    PrepushBackupWritten,
    /// Some payloads were rejected; those were backed up.
    PartialBackupWritten { failed: usize, payloads: usize },
}

/// Payloads ready to be sent, with where to send them.
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    pub payloads: Vec<String>,
    pub hec_params: HecParams,
}

/// Builds the HEC payloads of a batch.
pub fn build_payloads(messages: &[RawMessage], config: &Config) -> Result<Vec<String>, PrepushError> {
    info!(
        "Mapping {} EventHub message(s) into payloads for HEC",
        messages.len()
    );

    let records = MessageFlattener::new(config.enable_event_hub_metadata).flatten(messages)?;
    let builder = EnvelopeBuilder::from_config(config)?;
    let envelopes: Vec<_> = records
        .into_iter()
        .map(|record| builder.build(record))
        .collect();
    info!(
        "Mapped {} EventHub message(s) to {} Splunk event(s)",
        messages.len(),
        envelopes.len()
    );

    let serialized = serialize_all(&envelopes)?;
    let payloads = Batcher::new(config.max_payload_size_bytes).batch(serialized);

    info!(
        "Mapped {} EventHub message(s) into {} payload(s) for HEC",
        messages.len(),
        payloads.len()
    );
    Ok(payloads)
}

/// Everything that must succeed before the first request is sent.
pub fn prepare(messages: &[RawMessage], config: &Config) -> Result<PreparedBatch, PrepushError> {
    let payloads = build_payloads(messages, config)?;
    let hec_params = config.hec_params()?;
    Ok(PreparedBatch {
        payloads,
        hec_params,
    })
}

/// Forwards batches with one configuration, client and backup sink.
#[derive(Clone)]
pub struct LogsProcessor {
    config: Arc<Config>,
    client: reqwest::Client,
    backup_sink: Arc<dyn BackupSink>,
}

impl LogsProcessor {
    #[must_use]
    pub fn new(config: Arc<Config>, backup_sink: Arc<dyn BackupSink>) -> Self {
        let client = get_client(&config);
        Self {
            config,
            client,
            backup_sink,
        }
    }

    /// Runs one invocation.
    ///
    /// Only a failure to write a backup is returned as an error; parse, configuration
    /// and delivery failures end up in the backup sink.
    pub async fn process(&self, messages: &[RawMessage]) -> Result<ProcessOutcome, BackupError> {
        info!("Handling {} event(s)", messages.len());
        let start_time = Instant::now();

        let batch = match prepare(messages, &self.config) {
            Ok(batch) => batch,
            Err(e) => {
                self.handle_prepush_error(&e, messages).await?;
                return Ok(ProcessOutcome::PrepushBackupWritten);
            }
        };

        let payload_count = batch.payloads.len();
        let timeout = DeliveryBudget::from_config(&self.config)
            .request_timeout(start_time.elapsed(), payload_count);
        debug!("Using a {} ms timeout per HEC request", timeout.as_millis());

        let flusher = HecFlusher::new(
            self.client.clone(),
            batch.hec_params,
            self.config.use_compression,
            timeout,
        );
        let failed_payloads = flusher.flush(batch.payloads).await;

        let outcome = if failed_payloads.is_empty() {
            ProcessOutcome::Delivered {
                payloads: payload_count,
            }
        } else {
            let failed = failed_payloads.len();
            self.handle_push_errors(failed_payloads).await?;
            ProcessOutcome::PartialBackupWritten {
                failed,
                payloads: payload_count,
            }
        };

        info!("Finished handling {} event(s)", messages.len());
        Ok(outcome)
    }

    async fn handle_prepush_error(
        &self,
        err: &PrepushError,
        messages: &[RawMessage],
    ) -> Result<(), BackupError> {
        error!("Failed before pushing events. Error={}", err);
        back_up_raw_bodies(self.backup_sink.as_ref(), messages).await
    }

    async fn handle_push_errors(&self, failed_payloads: Vec<String>) -> Result<(), BackupError> {
        let failed = failed_payloads.len();
        let blob = join_lines(failed_payloads);
        self.backup_sink.store(BackupTier::FailedSend, blob).await?;

        info!("Backed up {} failed request(s) to blob storage", failed);
        Ok(())
    }
}

/// Stores the raw bodies of `messages`, newline-joined in order, as a
/// [`BackupTier::FailedParse`] blob.
pub async fn back_up_raw_bodies(
    backup_sink: &dyn BackupSink,
    messages: &[RawMessage],
) -> Result<(), BackupError> {
    let blob = join_lines(messages.iter().map(RawMessage::body));
    backup_sink.store(BackupTier::FailedParse, blob).await?;

    info!(
        "Backed up {} EventHub event(s) to blob storage",
        messages.len()
    );
    Ok(())
}

/// Runs one invocation with a freshly built processor.
pub async fn process(
    messages: &[RawMessage],
    config: Arc<Config>,
    backup_sink: Arc<dyn BackupSink>,
) -> Result<ProcessOutcome, BackupError> {
    LogsProcessor::new(config, backup_sink)
        .process(messages)
        .await
}
