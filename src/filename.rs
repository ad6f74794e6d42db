//! Filename policy.
//!
//! Caller-supplied names are reduced to their final path segment, which is
//! the only path-traversal defense the store relies on. Without a caller
//! name, a timestamped default is generated:
//!
//! | Input | Result |
//! |-------|--------|
//! | `Some("notes/today.md")` | `today.md` |
//! | `Some("../../etc/passwd")` | `passwd` |
//! | `Some("..")`, `Some("dir/")`, `Some("")` | `InvalidFilename` |
//! | `None`, prefix `"code"` | `code_20250101_093000.md` |
//! | `None`, no prefix | `20250101_093000.md` |
//!
//! Two generated names within the same second collide; the later write wins.

use chrono::{DateTime, Local, TimeZone};

use crate::error::{SynapsisError, SynapsisResult};

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const EXTENSION: &str = "md";

/// Pick the filename for a save: the sanitized caller name if given,
/// otherwise a generated one.
pub fn resolve_filename(
    caller_supplied: Option<&str>,
    prefix: Option<&str>,
) -> SynapsisResult<String> {
    match caller_supplied {
        Some(raw) => sanitize_filename(raw),
        None => Ok(generate_filename(prefix)),
    }
}

/// Strip every directory component from `raw`.
///
/// Both `/` and `\` are treated as separators regardless of platform, so a
/// Windows-style path cannot smuggle a parent directory through on Unix.
pub fn sanitize_filename(raw: &str) -> SynapsisResult<String> {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or_default();

    if last.is_empty() || last == "." || last == ".." || last.contains('\0') {
        return Err(SynapsisError::InvalidFilename(raw.to_string()));
    }

    Ok(last.to_string())
}

/// Timestamp-based name in local time.
pub fn generate_filename(prefix: Option<&str>) -> String {
    generate_filename_at(prefix, &Local::now())
}

fn generate_filename_at<Tz: TimeZone>(prefix: Option<&str>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let timestamp = now.format(TIMESTAMP_FORMAT);
    match prefix.filter(|p| !p.is_empty()) {
        Some(p) => format!("{}_{}.{}", p, timestamp, EXTENSION),
        None => format!("{}.{}", timestamp, EXTENSION),
    }
}
