//! Canonical timestamp formatting for fast-store keys
//!
//! The hot-path script compares the stored expiry against "now" as plain
//! strings, so every timestamp written to the fast store must use one
//! fixed-width UTC format. Lexicographic order over this format is time
//! order.

use chrono::{DateTime, Utc};

use crate::errors::Result;

const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format(CANONICAL_FORMAT).to_string()
}

pub fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)?;
    Ok(parsed.with_timezone(&Utc))
}
