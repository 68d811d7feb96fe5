// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Limits and fixed names shared by the pipeline stages.

use std::time::Duration;

/// Maximum size of a single HEC request body, in bytes, unless overridden by
/// `SPLUNK_BATCH_MAX_SIZE_BYTES`.
///
/// A single envelope larger than this is still sent, alone in its own payload.
pub const DEFAULT_MAX_PAYLOAD_SIZE_BYTES: usize = 1_000_000;

/// Path of the HEC events endpoint, relative to the configured HEC URL.
pub const HEC_EVENT_PATH: &str = "services/collector/event";

/// Scheme prefix of the source string attached to every envelope.
pub const SOURCE_SCHEME: &str = "azure";

/// Record key holding the human-readable timestamp of a log record.
pub const TIME_KEY: &str = "Time";

/// Record key under which Event Hub system properties are attached when enabled.
pub const EVENT_HUB_METADATA_KEY: &str = "__eventhub_metadata";

/// Upper bound on the number of characters of a payload or response body written to logs.
pub const LOG_BODY_LIMIT: usize = 32_000;

/// Mirrors the function host timeout.
pub const DEFAULT_FUNCTION_TIMEOUT: Duration = Duration::from_secs(10 * 60);
/// Time reserved for host start-up before the batch is handed over.
pub const INIT_TIME: Duration = Duration::from_secs(2 * 60);
/// Time reserved for writing backups after delivery.
pub const WRITE_TIME: Duration = Duration::from_secs(30);
/// Safety margin left unused by the delivery budget.
pub const BUFFER_TIME: Duration = Duration::from_secs(30);
/// Floor for the per-request timeout once the budget is exhausted.
pub const MIN_REQUEST_TIMEOUT: Duration = Duration::from_millis(1);
