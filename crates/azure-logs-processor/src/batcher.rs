// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Greedy packing of serialized envelopes into HEC request bodies.
//!
//! Envelopes are appended to the current payload, with no separator, for as long as the
//! payload stays within `max_payload_size_bytes`. The next envelope that does not fit
//! starts a new payload. An envelope is never split: one that is larger than the limit on
//! its own becomes a payload of its own.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::constants::DEFAULT_MAX_PAYLOAD_SIZE_BYTES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batcher {
    max_payload_size_bytes: usize,
}

impl Default for Batcher {
    fn default() -> Self {
        Batcher {
            max_payload_size_bytes: DEFAULT_MAX_PAYLOAD_SIZE_BYTES,
        }
    }
}

impl Batcher {
    #[must_use]
    pub fn new(max_payload_size_bytes: usize) -> Self {
        Batcher {
            max_payload_size_bytes,
        }
    }

    /// Packs `serialized_events` into payloads, preserving their order.
    ///
    /// No events means no payloads.
    #[must_use]
    pub fn batch(&self, serialized_events: Vec<String>) -> Vec<String> {
        info!(
            "Batching {} Splunk event(s) into payloads for HEC",
            serialized_events.len()
        );
        if serialized_events.is_empty() {
            return Vec::new();
        }

        let event_count = serialized_events.len();
        let mut payloads = Vec::new();
        let mut current = String::new();

        for event in serialized_events {
            if event.len() > self.max_payload_size_bytes {
                warn!(
                    "Splunk event of {} bytes exceeds the {} bytes payload limit, sending it alone",
                    event.len(),
                    self.max_payload_size_bytes
                );
            }

            if current.is_empty() || current.len() + event.len() <= self.max_payload_size_bytes {
                current.push_str(&event);
            } else {
                debug!("Closing payload of {} bytes", current.len());
                payloads.push(std::mem::replace(&mut current, event));
            }
        }
        payloads.push(current);

        info!(
            "Batched {} Splunk event(s) into {} payload(s) for HEC",
            event_count,
            payloads.len()
        );
        payloads
    }
}

/// Compact JSON of every envelope, in order.
pub fn serialize_all<T: Serialize>(envelopes: &[T]) -> Result<Vec<String>, serde_json::Error> {
    envelopes.iter().map(serde_json::to_string).collect()
}
