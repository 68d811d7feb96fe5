// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Event Hub messages and the log records they carry.

use serde_json::{Map, Value};
use tracing::debug;

use crate::constants::EVENT_HUB_METADATA_KEY;
use crate::error::ParseError;
use crate::util::truncate_for_log;

/// One log record: an arbitrary JSON object, key order preserved.
pub type LogRecord = Map<String, Value>;

/// A message as handed over by the Event Hub trigger.
///
/// The body is expected to be `{"records": [ ... ]}` but is kept as raw bytes so it can be
/// backed up verbatim when it is not.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    body: Vec<u8>,
    system_properties: Option<Value>,
}

impl RawMessage {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            system_properties: None,
        }
    }

    /// Attaches the Event Hub system properties delivered alongside this message.
    #[must_use]
    pub fn with_system_properties(mut self, system_properties: Value) -> Self {
        self.system_properties = Some(system_properties);
        self
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn system_properties(&self) -> Option<&Value> {
        self.system_properties.as_ref()
    }
}

impl From<&str> for RawMessage {
    fn from(body: &str) -> Self {
        Self::new(body)
    }
}

impl From<String> for RawMessage {
    fn from(body: String) -> Self {
        Self::new(body)
    }
}

impl From<Vec<u8>> for RawMessage {
    fn from(body: Vec<u8>) -> Self {
        Self::new(body)
    }
}

/// Turns a batch of messages into one ordered list of records.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageFlattener {
    attach_event_hub_metadata: bool,
}

impl MessageFlattener {
    #[must_use]
    pub fn new(attach_event_hub_metadata: bool) -> Self {
        Self {
            attach_event_hub_metadata,
        }
    }

    /// Records of every message, in message order then record order.
    ///
    /// Fails on the first message that is not `{"records": [<object>, ...]}`.
    pub fn flatten(&self, messages: &[RawMessage]) -> Result<Vec<LogRecord>, ParseError> {
        let mut records = Vec::new();

        for (index, message) in messages.iter().enumerate() {
            debug!(
                "Mapping to Splunk event: {}",
                truncate_for_log(&String::from_utf8_lossy(message.body()))
            );

            let mut body: Value = serde_json::from_slice(message.body())
                .map_err(|source| ParseError::InvalidJson { index, source })?;
            let message_records = match body.get_mut("records") {
                Some(Value::Array(message_records)) => std::mem::take(message_records),
                Some(_) => return Err(ParseError::RecordsNotArray { index }),
                None => return Err(ParseError::MissingRecords { index }),
            };

            records.reserve(message_records.len());
            for (position, record) in message_records.into_iter().enumerate() {
                let Value::Object(mut record) = record else {
                    return Err(ParseError::RecordNotObject {
                        index,
                        record: position,
                    });
                };
                if self.attach_event_hub_metadata {
                    record.insert(
                        EVENT_HUB_METADATA_KEY.to_string(),
                        message.system_properties().cloned().unwrap_or(Value::Null),
                    );
                }
                records.push(record);
            }
        }

        debug!(
            "Flattened {} message(s) into {} record(s)",
            messages.len(),
            records.len()
        );
        Ok(records)
    }
}
