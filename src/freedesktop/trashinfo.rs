//! `.trashinfo` metadata: the tiny INI-like text file that sits next to every
//! trashed payload.
//!
//! ```text
//! [Trash Info]
//! Path=<url-encoded absolute or volume-relative path>
//! DeletionDate=<YYYY-MM-DDTHH:MM:SS>
//! ```
//!
//! Readers must tolerate unknown groups and keys, comment lines starting
//! with `#`, and a trailing newline or its absence.

use chrono::{Local, NaiveDateTime};
use urlencoding::{decode, encode};

const GROUP_HEADER: &str = "[Trash Info]";

/// The two keys of a parsed `[Trash Info]` group. `deletion_date` is `None`
/// when present but unparsable — enumeration keeps the item but reports a
/// null timestamp in that case (spec.md §4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashInfo {
    pub path: String,
    pub deletion_date: Option<NaiveDateTime>,
}

/// Renders the body of a `.trashinfo` file for `path` (already encoded or
/// decoded by the caller's choice of absolute vs. volume-relative form) and
/// the given deletion timestamp, truncated to whole seconds.
pub fn render(path: &str, deletion_date: NaiveDateTime) -> String {
    format!(
        "{GROUP_HEADER}\nPath={}\nDeletionDate={}\n",
        encode(path),
        deletion_date.format("%Y-%m-%dT%H:%M:%S"),
    )
}

/// Truncates the local clock to second precision, as placement requires.
pub fn now_truncated_to_seconds() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond_zero()
}

trait TruncateNanos {
    fn with_nanosecond_zero(self) -> Self;
}

impl TruncateNanos for NaiveDateTime {
    fn with_nanosecond_zero(self) -> Self {
        use chrono::Timelike;
        self.with_nanosecond(0).unwrap_or(self)
    }
}

/// Parses the `[Trash Info]` group out of `content` leniently: unknown
/// groups/keys are ignored, parsing stops after the recognised group has
/// been read once a second `[...]` header is seen.
///
/// Returns `None` if the `Path` key is missing or empty, per spec.md §4.2
/// ("If `Path` is missing or empty, drop the entry").
pub fn parse(content: &str) -> Option<TrashInfo> {
    let mut in_group = false;
    let mut saw_group = false;
    let mut raw_path: Option<String> = None;
    let mut raw_date: Option<String> = None;

    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            if saw_group {
                // A second group header ends our interest in this file.
                break;
            }
            in_group = trimmed == GROUP_HEADER;
            saw_group = in_group;
            continue;
        }

        if !in_group {
            continue;
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        match key.trim() {
            "Path" if raw_path.is_none() => raw_path = Some(value.to_string()),
            "DeletionDate" if raw_date.is_none() => raw_date = Some(value.to_string()),
            _ => {}
        }
    }

    let raw_path = raw_path?;
    if raw_path.is_empty() {
        return None;
    }
    let path = decode(&raw_path).ok()?.into_owned();
    if path.is_empty() {
        return None;
    }

    let deletion_date = raw_date
        .as_deref()
        .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok());

    Some(TrashInfo { path, deletion_date })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_then_parse_round_trips() {
        let date = NaiveDateTime::parse_from_str("2024-03-14T09:15:22", "%Y-%m-%dT%H:%M:%S").unwrap();
        let body = render("/home/u/has spaces/100% done.txt", date);
        assert!(body.starts_with(GROUP_HEADER));

        let parsed = parse(&body).unwrap();
        assert_eq!(parsed.path, "/home/u/has spaces/100% done.txt");
        assert_eq!(parsed.deletion_date, Some(date));
    }

    #[test]
    fn tolerates_unknown_groups_keys_and_comments() {
        let body = "\
# a comment
[Unknown Group]
Ignored=yes

[Trash Info]
# another comment
Path=foo.txt
Future=ignored
DeletionDate=2024-03-14T09:15:22
[Another Group]
Path=should-not-be-seen
";
        let parsed = parse(body).unwrap();
        assert_eq!(parsed.path, "foo.txt");
        assert!(parsed.deletion_date.is_some());
    }

    #[test]
    fn missing_path_drops_entry() {
        let body = "[Trash Info]\nDeletionDate=2024-03-14T09:15:22\n";
        assert!(parse(body).is_none());
    }

    #[test]
    fn empty_path_drops_entry() {
        let body = "[Trash Info]\nPath=\nDeletionDate=2024-03-14T09:15:22\n";
        assert!(parse(body).is_none());
    }

    #[test]
    fn unparsable_date_keeps_item_with_null_timestamp() {
        let body = "[Trash Info]\nPath=foo.txt\nDeletionDate=not-a-date\n";
        let parsed = parse(body).unwrap();
        assert_eq!(parsed.path, "foo.txt");
        assert_eq!(parsed.deletion_date, None);
    }

    #[test]
    fn missing_trailing_newline_is_accepted() {
        let body = "[Trash Info]\nPath=foo.txt\nDeletionDate=2024-03-14T09:15:22";
        let parsed = parse(body).unwrap();
        assert_eq!(parsed.path, "foo.txt");
    }

    #[test]
    fn non_ascii_and_percent_round_trip() {
        let date = now_truncated_to_seconds();
        let body = render("/tmp/héllo 100%/ünïcödé\npath", date);
        let parsed = parse(&body).unwrap();
        assert_eq!(parsed.path, "/tmp/héllo 100%/ünïcödé\npath");
    }
}
