//! Name normalization utilities for the validation rules.
//!
//! Filter strings are literal words; users evade them with separators,
//! casing tricks, and look-alike Unicode. Everything here exists to make
//! those evasions visible to the rejectors: permissive pattern
//! construction, camel-case/word-boundary tokenization, whitespace/case
//! normalization, and confusable folding.

use chrono::Duration;
use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;

/// Compile a literal filter string into a permissive pattern.
///
/// Case-insensitive, and tolerant of any run of separator characters
/// (`[\W_]*`) between the filter's alphanumeric characters, so `b-a.d`
/// and `B_A_D` both match a `bad` filter. With `full_match`, the whole
/// value must consist of the filter (plus optional separator padding);
/// otherwise a substring match suffices.
pub fn permissive_pattern(filter: &str, full_match: bool) -> Option<Regex> {
    let mut body = String::new();
    for c in filter.chars().filter(|c| c.is_alphanumeric()) {
        if !body.is_empty() {
            body.push_str(r"[\W_]*");
        }
        let mut buf = [0u8; 4];
        body.push_str(&regex::escape(c.encode_utf8(&mut buf)));
    }
    if body.is_empty() {
        // Filter had no alphanumeric characters; match it literally.
        body = regex::escape(filter);
    }
    let pattern = if full_match {
        format!(r"^[\W_]*{body}[\W_]*$")
    } else {
        body
    };
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!(filter = %filter, error = %e, "Unusable filter string; skipping");
            None
        }
    }
}

/// Split a display name into tokens on camel-case boundaries, runs of
/// digits, and non-alphanumeric separators.
///
/// `XxDark_Lord42` yields `["Xx", "Dark", "Lord", "42"]`.
pub fn name_tokens(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some(prev) = current.chars().last() {
            let camel = c.is_uppercase() && prev.is_lowercase();
            // "HTTPServer" -> "HTTP" | "Server"
            let acronym_end = c.is_uppercase()
                && prev.is_uppercase()
                && chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let digit_edge = c.is_ascii_digit() != prev.is_ascii_digit();
            if camel || acronym_end || digit_edge {
                tokens.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Normalize a name for exact-match comparison: lowercase and collapse
/// every run of whitespace to a single space.
pub fn normalize_name(value: &str) -> String {
    value
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replace confusable look-alike characters with their canonical forms,
/// so a Cyrillic `е` reads as the Latin `e` it imitates.
pub fn fold_lookalikes(value: &str) -> String {
    use confusables::Confusable;
    value.detect_replace_confusable().into()
}

fn deletion_exact() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^deleted[ _]?user[ _]?[0-9a-f]{4,12}$").expect("valid pattern")
    })
}

fn deletion_loose() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i).*deleted.*user.*").expect("valid pattern"))
}

/// True when a username matches the platform's generated
/// deleted-account naming exactly.
pub fn is_deletion_pattern(name: &str) -> bool {
    deletion_exact().is_match(name)
}

/// True when a username merely resembles a deleted account's name.
/// Resembling without matching exactly is a fake-deletion signal.
pub fn resembles_deletion(name: &str) -> bool {
    deletion_loose().is_match(name)
}

/// Render a duration in the largest round unit that fits.
pub fn humanize_duration(duration: Duration) -> String {
    fn unit(n: i64, word: &str) -> String {
        if n == 1 {
            format!("1 {word}")
        } else {
            format!("{n} {word}s")
        }
    }

    if duration.num_days() >= 1 {
        unit(duration.num_days(), "day")
    } else if duration.num_hours() >= 1 {
        unit(duration.num_hours(), "hour")
    } else if duration.num_minutes() >= 1 {
        unit(duration.num_minutes(), "minute")
    } else {
        unit(duration.num_seconds(), "second")
    }
}
