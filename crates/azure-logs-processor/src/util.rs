// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::constants::LOG_BODY_LIMIT;

/// Returns at most [`LOG_BODY_LIMIT`] characters of `body`, cut on a character boundary.
pub fn truncate_for_log(body: &str) -> &str {
    truncate_chars(body, LOG_BODY_LIMIT)
}

pub(crate) fn truncate_chars(body: &str, limit: usize) -> &str {
    match body.char_indices().nth(limit) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}
