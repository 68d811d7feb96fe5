// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, process::ExitCode, sync::Arc};
use tokio::io::{self, AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use azure_logs_processor::{
    back_up_raw_bodies,
    config::normalize_log_level,
    error::{BackupError, ConfigError},
    BackupSink, Config, FileBackupSink, LogsProcessor, ProcessOutcome, RawMessage,
};

const DEFAULT_BACKUP_DIRECTORY: &str = "./failed-events";

#[tokio::main(flavor = "current_thread")]
pub async fn main() -> ExitCode {
    let raw_log_level = env::var("LogLevel").ok();
    let log_level = raw_log_level
        .as_deref()
        .and_then(normalize_log_level)
        .unwrap_or("info");

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", log_level);

    let filter = match EnvFilter::try_new(env_filter) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("could not parse log level in configuration: {e}");
            EnvFilter::new("info")
        }
    };
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
    }

    debug!("Logging subsystem enabled");
    if let Some(raw) = raw_log_level.filter(|raw| normalize_log_level(raw).is_none()) {
        warn!("Unknown LogLevel '{raw}', using info");
    }

    let backup_directory =
        env::var("BackupDirectory").unwrap_or_else(|_| DEFAULT_BACKUP_DIRECTORY.to_string());
    let backup_sink: Arc<dyn BackupSink> = Arc::new(FileBackupSink::new(backup_directory));

    let messages = match read_messages(io::stdin()).await {
        Ok(messages) => messages,
        Err(e) => {
            error!("Failed to read Event Hub messages from stdin: {e}");
            return ExitCode::FAILURE;
        }
    };

    if succeeded(run(&messages, Config::from_env(), backup_sink).await) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// One message body per non-blank line, in order. Bodies are kept as raw bytes so a
/// malformed line still reaches the backup verbatim.
async fn read_messages<R>(reader: R) -> io::Result<Vec<RawMessage>>
where
    R: AsyncRead + Unpin,
{
    let mut segments = BufReader::new(reader).split(b'\n');
    let mut messages = Vec::new();
    while let Some(mut segment) = segments.next_segment().await? {
        if segment.last() == Some(&b'\r') {
            segment.pop();
        }
        if segment.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        messages.push(RawMessage::new(segment));
    }
    debug!("Read {} message(s) from stdin", messages.len());
    Ok(messages)
}

/// Processes the batch, or backs up its raw bodies when the configuration could not be
/// loaded.
async fn run(
    messages: &[RawMessage],
    config: Result<Config, ConfigError>,
    backup_sink: Arc<dyn BackupSink>,
) -> Result<ProcessOutcome, BackupError> {
    match config {
        Ok(config) => {
            LogsProcessor::new(Arc::new(config), backup_sink)
                .process(messages)
                .await
        }
        Err(e) => {
            error!("Error loading config: {e}");
            back_up_raw_bodies(backup_sink.as_ref(), messages).await?;
            Ok(ProcessOutcome::PrepushBackupWritten)
        }
    }
}

/// Only a failed backup write fails the invocation.
fn succeeded(result: Result<ProcessOutcome, BackupError>) -> bool {
    match result {
        Ok(ProcessOutcome::Delivered { payloads }) => {
            info!("Delivered {payloads} payload(s)");
            true
        }
        Ok(ProcessOutcome::PrepushBackupWritten) => {
            info!("Batch could not be transformed and was backed up");
            true
        }
        Ok(ProcessOutcome::PartialBackupWritten { failed, payloads }) => {
            info!("{failed} of {payloads} payload(s) failed and were backed up");
            true
        }
        Err(e) => {
            error!("{e}");
            false
        }
    }
}
