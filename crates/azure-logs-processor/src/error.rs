// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for each stage of an invocation.
//!
//! [`ConfigError`] and [`ParseError`] stop the invocation before anything is sent and
//! cause the raw batch to be backed up. [`DeliveryError`] only ever concerns one payload.
//! [`BackupError`] is the only error returned to the host.

use std::path::PathBuf;

use crate::backup::BackupTier;

/// A configuration value is missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not defined")]
    Missing(&'static str),

    #[error("EventHubConnection has no `Endpoint=sb://<namespace>.servicebus.windows.net` segment")]
    InvalidConnectionString,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// A raw message body could not be turned into log records.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("message {index} is not valid JSON: {source}")]
    InvalidJson {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("message {index} has no `records` field")]
    MissingRecords { index: usize },

    #[error("message {index} has a `records` field that is not an array")]
    RecordsNotArray { index: usize },

    #[error("record {record} of message {index} is not a JSON object")]
    RecordNotObject { index: usize, record: usize },
}

/// Any failure before the first payload is sent.
#[derive(Debug, thiserror::Error)]
pub enum PrepushError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to serialize envelope: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A single payload could not be delivered.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("HEC push failed. Code={status}, Body={body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("HEC request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to compress payload: {0}")]
    Compression(#[source] std::io::Error),
}

/// A backup blob could not be persisted.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("failed to write {tier} backup to {}: {source}", path.display())]
    Io {
        tier: BackupTier,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("backup sink rejected {tier} blob: {message}")]
    Rejected { tier: BackupTier, message: String },
}
