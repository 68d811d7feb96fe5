// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helper functions for integration tests

use azure_logs_processor::{Config, RawMessage};
use serde_json::{json, Value};

pub const MOCK_SOURCE: &str = "azure:mock_region:Mock-0-Namespace1:mock-eh-name";
pub const EVENT_PATH: &str = "/services/collector/event";

/// A complete configuration pointing at `hec_url`.
pub fn mock_config(hec_url: &str) -> Config {
    Config {
        hec_url: Some(hec_url.to_string()),
        hec_token: Some("mock_hec_token".to_string()),
        source_type: Some("mock_sourcetype".to_string()),
        region: Some("mock_region".to_string()),
        event_hub_connection: Some(
            "key1=val1;Endpoint=sb://Mock-0-Namespace1.servicebus.windows.net/;key2=val2"
                .to_string(),
        ),
        event_hub_name: Some("mock-eh-name".to_string()),
        ..Default::default()
    }
}

/// One Event Hub message per entry, each carrying the given records.
pub fn messages_with_records(batches: &[Value]) -> Vec<RawMessage> {
    batches
        .iter()
        .map(|records| RawMessage::new(json!({ "records": records }).to_string()))
        .collect()
}

/// The serialized envelope of `event` with the mock source and sourcetype.
pub fn expected_envelope(event: &str) -> String {
    format!(r#"{{"event":{event},"source":"{MOCK_SOURCE}","sourcetype":"mock_sourcetype"}}"#)
}
