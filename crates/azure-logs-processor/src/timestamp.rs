// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Best-effort extraction of a record's event time.
//!
//! Azure resource logs carry an ISO-8601 time, while Azure AD sign-in logs use a
//! US-locale `M/D/YYYY h:mm:ss AM|PM` string. Anything that cannot be read yields
//! `None` and the envelope is sent without a `time` field.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

/// ISO-8601 variants with a numeric offset that RFC 3339 parsing rejects (e.g. `-0500`).
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Formats without a zone designator, read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %I:%M:%S %p",
];

/// Returns the nanoseconds since the Unix epoch of a `Time` value, if it is a readable
/// timestamp string at or after the epoch.
#[must_use]
pub fn extract_timestamp(value: Option<&Value>) -> Option<i64> {
    value?.as_str().and_then(parse_timestamp)
}

/// Parses a timestamp string into nanoseconds since the Unix epoch.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = DateTime::parse_from_rfc3339(raw)
        .ok()
        .or_else(|| {
            OFFSET_FORMATS
                .iter()
                .find_map(|format| DateTime::parse_from_str(raw, format).ok())
        })
        .map(|time| time.with_timezone(&Utc))
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|time| time.and_utc())
        })?;

    parsed.timestamp_nanos_opt().filter(|nanos| *nanos >= 0)
}
