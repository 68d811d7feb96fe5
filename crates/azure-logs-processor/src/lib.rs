// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Forwards Azure Monitor log batches to a Splunk HTTP Event Collector (HEC).
//!
//! One invocation takes an ordered batch of Event Hub messages, flattens their `records`,
//! wraps every record in a HEC envelope, packs the serialized envelopes into size-bounded
//! payloads and posts them one after another. Nothing is dropped: a batch that cannot be
//! transformed is backed up verbatim, and payloads that cannot be delivered are backed up
//! after every other payload has been attempted.
//!
//! ```text
//!   RawMessage[] ──> flatten ──> envelope ──> batch ──> flush ──> (failed) backup
//!        │                                                        ^
//!        └────────────── parse / config error ────────────────────┘
//! ```

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod backup;
pub mod batcher;
pub mod config;
pub mod constants;
pub mod envelope;
pub mod error;
pub mod flusher;
pub mod http;
pub mod message;
pub mod processor;
pub mod source;
pub mod timestamp;
pub mod util;

pub use backup::{BackupSink, BackupTier, FileBackupSink, MemoryBackupSink};
pub use config::Config;
pub use message::RawMessage;
pub use processor::{back_up_raw_bodies, process, LogsProcessor, ProcessOutcome};
