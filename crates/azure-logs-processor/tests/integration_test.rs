// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod common;

use azure_logs_processor::{
    process, BackupSink, BackupTier, Config, FileBackupSink, LogsProcessor, MemoryBackupSink,
    ProcessOutcome, RawMessage,
};
use common::{expected_envelope, messages_with_records, mock_config, EVENT_PATH, MOCK_SOURCE};
use mockito::Server;
use serde_json::json;
use std::sync::Arc;

fn processor(config: Config) -> (LogsProcessor, Arc<MemoryBackupSink>) {
    let sink = Arc::new(MemoryBackupSink::new());
    let processor = LogsProcessor::new(Arc::new(config), sink.clone());
    (processor, sink)
}

#[tokio::test]
async fn single_record_is_sent_as_one_payload() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", EVENT_PATH)
        .match_header("authorization", "Splunk mock_hec_token")
        .match_body(expected_envelope(r#"{"Foo":"bar"}"#).as_str())
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let (processor, sink) = processor(mock_config(&server.url()));
    let outcome = processor
        .process(&messages_with_records(&[json!([{"Foo": "bar"}])]))
        .await
        .unwrap();

    assert_eq!(outcome, ProcessOutcome::Delivered { payloads: 1 });
    assert!(sink.take().is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn envelopes_are_packed_up_to_max_payload_size() {
    let first = expected_envelope(r#"{"Foo":"from_msg1"}"#);
    let second = expected_envelope(r#"{"Foo":"from_msg2"}"#);
    assert_eq!(first.len() + second.len(), 240);

    let mut server = Server::new_async().await;
    let full = server
        .mock("POST", EVENT_PATH)
        .match_body(format!("{first}{second}").as_str())
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let rest = server
        .mock("POST", EVENT_PATH)
        .match_body(second.as_str())
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let config = Config {
        max_payload_size_bytes: 240,
        ..mock_config(&server.url())
    };
    let (processor, sink) = processor(config);
    let outcome = processor
        .process(&messages_with_records(&[
            json!([{"Foo": "from_msg1"}]),
            json!([{"Foo": "from_msg2"}, {"Foo": "from_msg2"}]),
        ]))
        .await
        .unwrap();

    assert_eq!(outcome, ProcessOutcome::Delivered { payloads: 2 });
    assert!(sink.take().is_empty());
    full.assert_async().await;
    rest.assert_async().await;
}

#[tokio::test]
async fn time_is_set_only_for_readable_timestamps() {
    let with_time = format!(
        r#"{{"event":{{"Time":"2021-06-09T20:20:37.6037942Z"}},"source":"{MOCK_SOURCE}","sourcetype":"mock_sourcetype","time":1623270037603794200}}"#
    );
    let without_time = expected_envelope(r#"{"Time":"not a date"}"#);

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", EVENT_PATH)
        .match_body(format!("{with_time}{without_time}").as_str())
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let (processor, _sink) = processor(mock_config(&server.url()));
    let outcome = processor
        .process(&messages_with_records(&[json!([
            {"Time": "2021-06-09T20:20:37.6037942Z"},
            {"Time": "not a date"},
        ])]))
        .await
        .unwrap();

    assert_eq!(outcome, ProcessOutcome::Delivered { payloads: 1 });
    mock.assert_async().await;
}

#[tokio::test]
async fn invalid_connection_string_backs_up_raw_bodies() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", EVENT_PATH)
        .expect(0)
        .create_async()
        .await;

    let config = Config {
        event_hub_connection: Some("SharedAccessKeyName=key;Endpoint=https://nope".to_string()),
        ..mock_config(&server.url())
    };
    let messages = messages_with_records(&[json!([{"a": 1}]), json!([{"b": 2}])]);
    let (processor, sink) = processor(config);

    let outcome = processor.process(&messages).await.unwrap();

    assert_eq!(outcome, ProcessOutcome::PrepushBackupWritten);
    assert_eq!(
        sink.take(),
        vec![(
            BackupTier::FailedParse,
            br#"{"records":[{"a":1}]}
{"records":[{"b":2}]}"#
                .to_vec()
        )]
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn failed_payloads_are_backed_up_and_others_delivered() {
    let first = expected_envelope(r#"{"Foo":"from_msg1"}"#);
    let second = expected_envelope(r#"{"Foo":"from_msg2"}"#);

    let mut server = Server::new_async().await;
    let failing = server
        .mock("POST", EVENT_PATH)
        .match_body(first.as_str())
        .with_status(500)
        .expect(1)
        .create_async()
        .await;
    let succeeding = server
        .mock("POST", EVENT_PATH)
        .match_body(second.as_str())
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let config = Config {
        max_payload_size_bytes: first.len(),
        ..mock_config(&server.url())
    };
    let (processor, sink) = processor(config);
    let outcome = processor
        .process(&messages_with_records(&[
            json!([{"Foo": "from_msg1"}]),
            json!([{"Foo": "from_msg2"}]),
        ]))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ProcessOutcome::PartialBackupWritten {
            failed: 1,
            payloads: 2
        }
    );
    assert_eq!(
        sink.take(),
        vec![(BackupTier::FailedSend, first.into_bytes())]
    );
    failing.assert_async().await;
    succeeding.assert_async().await;
}

#[tokio::test]
async fn unreachable_endpoint_backs_up_every_payload() {
    let (processor, sink) = processor(mock_config("http://127.0.0.1:1"));
    let outcome = processor
        .process(&messages_with_records(&[json!([{"Foo": "bar"}])]))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ProcessOutcome::PartialBackupWritten {
            failed: 1,
            payloads: 1
        }
    );
    assert_eq!(
        sink.take(),
        vec![(
            BackupTier::FailedSend,
            expected_envelope(r#"{"Foo":"bar"}"#).into_bytes()
        )]
    );
}

#[tokio::test]
async fn invalid_json_backs_up_bodies_in_order() {
    let (processor, sink) = processor(mock_config("http://127.0.0.1:1"));
    let messages = vec![
        RawMessage::from(r#"{"records":[{"ok":true}]}"#),
        RawMessage::from("{not json"),
        RawMessage::from(r#"{"records":[]}"#),
    ];

    let outcome = processor.process(&messages).await.unwrap();

    assert_eq!(outcome, ProcessOutcome::PrepushBackupWritten);
    assert_eq!(
        sink.take(),
        vec![(
            BackupTier::FailedParse,
            b"{\"records\":[{\"ok\":true}]}\n{not json\n{\"records\":[]}".to_vec()
        )]
    );
}

#[tokio::test]
async fn missing_token_backs_up_before_sending() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", EVENT_PATH)
        .expect(0)
        .create_async()
        .await;

    let config = Config {
        hec_token: None,
        ..mock_config(&server.url())
    };
    let (processor, sink) = processor(config);
    let outcome = processor
        .process(&messages_with_records(&[json!([{"Foo": "bar"}])]))
        .await
        .unwrap();

    assert_eq!(outcome, ProcessOutcome::PrepushBackupWritten);
    let blobs = sink.take();
    assert_eq!(blobs.len(), 1);
    assert_eq!(blobs[0].0, BackupTier::FailedParse);
    mock.assert_async().await;
}

#[tokio::test]
async fn empty_batch_sends_nothing() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", EVENT_PATH)
        .expect(0)
        .create_async()
        .await;

    let (processor, sink) = processor(mock_config(&server.url()));
    let outcome = processor
        .process(&messages_with_records(&[json!([])]))
        .await
        .unwrap();

    assert_eq!(outcome, ProcessOutcome::Delivered { payloads: 0 });
    assert!(sink.take().is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn event_hub_metadata_and_input_id_are_attached() {
    let expected = format!(
        r#"{{"event":{{"Foo":"bar","__eventhub_metadata":{{"SequenceNumber":7}}}},"source":"{MOCK_SOURCE}","sourcetype":"mock_sourcetype","fields":{{"data_manager_input_id":"input-1"}}}}"#
    );

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", EVENT_PATH)
        .match_body(expected.as_str())
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let config = Config {
        enable_event_hub_metadata: true,
        data_manager_input_id: Some("input-1".to_string()),
        ..mock_config(&server.url())
    };
    let message = RawMessage::from(json!({"records": [{"Foo": "bar"}]}).to_string())
        .with_system_properties(json!({"SequenceNumber": 7}));
    let (processor, _sink) = processor(config);

    let outcome = processor.process(&[message]).await.unwrap();

    assert_eq!(outcome, ProcessOutcome::Delivered { payloads: 1 });
    mock.assert_async().await;
}

#[tokio::test]
async fn compressed_payloads_carry_gzip_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", EVENT_PATH)
        .match_header("content-encoding", "gzip")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let config = Config {
        use_compression: true,
        ..mock_config(&server.url())
    };
    let (processor, _sink) = processor(config);
    let outcome = processor
        .process(&messages_with_records(&[json!([{"Foo": "bar"}])]))
        .await
        .unwrap();

    assert_eq!(outcome, ProcessOutcome::Delivered { payloads: 1 });
    mock.assert_async().await;
}

#[tokio::test]
async fn process_writes_failed_payloads_to_files() {
    let dir = tempfile::tempdir().unwrap();
    let sink: Arc<dyn BackupSink> = Arc::new(FileBackupSink::new(dir.path()));

    let outcome = process(
        &messages_with_records(&[json!([{"Foo": "bar"}])]),
        Arc::new(mock_config("http://127.0.0.1:1")),
        sink,
    )
    .await
    .unwrap();

    assert!(matches!(
        outcome,
        ProcessOutcome::PartialBackupWritten { failed: 1, .. }
    ));
    let files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(files[0]
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("failed-send-"));
    assert_eq!(
        std::fs::read_to_string(&files[0]).unwrap(),
        expected_envelope(r#"{"Foo":"bar"}"#)
    );
}
