// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

use crate::config::Config;
use crate::constants::TIME_KEY;
use crate::error::ConfigError;
use crate::message::LogRecord;
use crate::timestamp::extract_timestamp;

/// A record wrapped for the HEC events endpoint.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DeliveryEnvelope<'a> {
    pub event: LogRecord,
    pub source: &'a str,
    pub sourcetype: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<EnvelopeFields<'a>>,
    /// Nanoseconds since the Unix epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
}

/// Indexed fields attached to every envelope.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeFields<'a> {
    pub data_manager_input_id: &'a str,
}

/// Wraps records in envelopes sharing one source and sourcetype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeBuilder {
    source: String,
    source_type: String,
    data_manager_input_id: Option<String>,
}

impl EnvelopeBuilder {
    pub fn new(source: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            source_type: source_type.into(),
            data_manager_input_id: None,
        }
    }

    #[must_use]
    pub fn with_data_manager_input_id(mut self, data_manager_input_id: Option<String>) -> Self {
        self.data_manager_input_id = data_manager_input_id;
        self
    }

    /// Resolves the source string and sourcetype once for the whole batch.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let source = config.source()?;
        let source_type = config
            .source_type
            .clone()
            .ok_or(ConfigError::Missing("SourceType"))?;

        Ok(Self::new(source, source_type)
            .with_data_manager_input_id(config.data_manager_input_id.clone()))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Wraps `record`, setting `time` only when its `Time` value is a readable timestamp.
    pub fn build(&self, record: LogRecord) -> DeliveryEnvelope<'_> {
        let time = extract_timestamp(record.get(TIME_KEY));
        DeliveryEnvelope {
            event: record,
            source: &self.source,
            sourcetype: &self.source_type,
            fields: self
                .data_manager_input_id
                .as_deref()
                .map(|data_manager_input_id| EnvelopeFields {
                    data_manager_input_id,
                }),
            time,
        }
    }
}
