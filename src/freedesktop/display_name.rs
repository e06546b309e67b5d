//! Display-name service (spec.md §4.6): the KDE "directory.trash"
//! desktop-entry lookup for a localized trash can name, cached after the
//! first successful resolution.
//!
//! Looked up across every directory in `XDG_DATA_DIRS` (falling back to the
//! standard `/usr/local/share:/usr/share` when unset), at
//! `kio_desktop/directory.trash` then `kde4/apps/kio_desktop/directory.trash`.

use std::path::PathBuf;
use std::sync::OnceLock;

use log::trace;

const RELATIVE_CANDIDATES: [&str; 2] =
    ["kio_desktop/directory.trash", "kde4/apps/kio_desktop/directory.trash"];

static CACHE: OnceLock<String> = OnceLock::new();

/// Returns the localized trash-can display name, or an empty string if no
/// `directory.trash` file could be found or parsed. Cached after the first
/// call for the lifetime of the process.
pub fn display_name() -> String {
    CACHE.get_or_init(resolve).clone()
}

fn resolve() -> String {
    let locale = current_locale();
    for data_dir in xdg_data_dirs() {
        for rel in RELATIVE_CANDIDATES {
            let candidate = data_dir.join(rel);
            let Ok(content) = std::fs::read_to_string(&candidate) else { continue };
            if let Some(name) = parse_desktop_entry(&content, &locale) {
                trace!("trash display name resolved from {}", candidate.display());
                return name;
            }
        }
    }
    String::new()
}

fn xdg_data_dirs() -> Vec<PathBuf> {
    let raw = std::env::var("XDG_DATA_DIRS").unwrap_or_else(|_| "/usr/local/share:/usr/share".to_string());
    raw.split(':').filter(|s| !s.is_empty()).map(PathBuf::from).collect()
}

fn current_locale() -> String {
    for var in ["LC_ALL", "LC_MESSAGES", "LANG"] {
        if let Ok(v) = std::env::var(var) {
            if !v.is_empty() && v != "C" && v != "POSIX" {
                return v;
            }
        }
    }
    String::new()
}

/// Parses the `[Desktop Entry]` group out of `content`, selecting the
/// best-matching `Name[locale]` key via the standard freedesktop
/// locale-fallback chain: `language_COUNTRY@MODIFIER` →
/// `language_COUNTRY` → `language@MODIFIER` → `language` → `Name`.
fn parse_desktop_entry(content: &str, locale: &str) -> Option<String> {
    let mut in_group = false;
    let mut entries: Vec<(String, String)> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            in_group = trimmed == "[Desktop Entry]";
            continue;
        }
        if !in_group {
            continue;
        }
        if let Some((key, value)) = trimmed.split_once('=') {
            entries.push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    if entries.is_empty() {
        return None;
    }

    for candidate_key in locale_fallback_keys(locale) {
        if let Some((_, value)) = entries.iter().find(|(k, _)| *k == candidate_key) {
            return Some(value.clone());
        }
    }

    None
}

/// Builds the ordered list of `Name[...]` keys to try, most specific first,
/// ending with the bare `Name` default.
fn locale_fallback_keys(locale: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if locale.is_empty() {
        keys.push("Name".to_string());
        return keys;
    }

    let (base, modifier) = match locale.split_once('@') {
        Some((b, m)) => (b, Some(m)),
        None => (locale, None),
    };
    let (language, country) = match base.split_once('_') {
        Some((l, c)) => (l, Some(c)),
        None => (base, None),
    };

    if let (Some(country), Some(modifier)) = (country, modifier) {
        keys.push(format!("Name[{language}_{country}@{modifier}]"));
    }
    if let Some(country) = country {
        keys.push(format!("Name[{language}_{country}]"));
    }
    if let Some(modifier) = modifier {
        keys.push(format!("Name[{language}@{modifier}]"));
    }
    keys.push(format!("Name[{language}]"));
    keys.push("Name".to_string());
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
[Desktop Entry]
Name=Trash
Name[de]=Papierkorb
Name[de_AT]=Mistkübel
Name[fr]=Corbeille
";

    #[test]
    fn exact_language_country_match_wins() {
        assert_eq!(parse_desktop_entry(SAMPLE, "de_AT").as_deref(), Some("Mistkübel"));
    }

    #[test]
    fn falls_back_to_bare_language() {
        assert_eq!(parse_desktop_entry(SAMPLE, "de_CH").as_deref(), Some("Papierkorb"));
    }

    #[test]
    fn falls_back_to_default_name_when_no_locale_matches() {
        assert_eq!(parse_desktop_entry(SAMPLE, "ja_JP").as_deref(), Some("Trash"));
    }

    #[test]
    fn empty_locale_uses_default_name() {
        assert_eq!(parse_desktop_entry(SAMPLE, "").as_deref(), Some("Trash"));
    }

    #[test]
    fn missing_group_yields_none() {
        assert_eq!(parse_desktop_entry("[Other Group]\nName=x\n", "en"), None);
    }

    #[test]
    fn modifier_specific_key_is_tried() {
        let body = "[Desktop Entry]\nName=Trash\nName[ca@valencia]=Paperera\n";
        assert_eq!(parse_desktop_entry(body, "ca@valencia").as_deref(), Some("Paperera"));
    }
}
