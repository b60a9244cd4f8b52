//! Normalizes rewriter output into the markdown subset the chat endpoint renders:
//!
//! - the first line is the headline, wrapped in exactly one pair of `*`
//! - every following line is its own paragraph, separated by one blank line
//! - quotations are lines prefixed with `> `
//! - no `**`, `__` or `<...>` anywhere
//!
//! [`sanitize`] is idempotent.

use crate::types::{FormattedPost, RawDraft};
use regex::Regex;
use std::sync::LazyLock;

static TAG_LIKE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^<>]*>").unwrap());
static EMPHASIS_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*{2,}|_{2,}").unwrap());

const QUOTE_MARKS: [char; 3] = ['"', '“', '”'];

pub fn sanitize_draft(draft: &RawDraft) -> FormattedPost {
    sanitize(draft.as_str())
}

pub fn sanitize(draft: &str) -> FormattedPost {
    let mut lines: Vec<String> = draft
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(strip_markup)
        .filter(|line| !line.is_empty())
        .collect();

    // a headline needs something besides asterisks to wrap
    let headline_at = lines.iter().position(|line| !headline_core(line).is_empty());
    let Some(headline_at) = headline_at else {
        return FormattedPost(draft.to_string());
    };
    lines.drain(..headline_at);

    let mut paragraphs = Vec::with_capacity(lines.len());
    paragraphs.push(format!("*{}*", headline_core(&lines[0])));
    paragraphs.extend(lines[1..].iter().filter_map(|line| format_body_line(line)));

    FormattedPost(paragraphs.join("\n\n"))
}

/// Removes tag-like substrings and runs of two or more `*` or `_`, until
/// neither removal can uncover a new match.
fn strip_markup(line: &str) -> String {
    let mut current = line.to_string();
    loop {
        let without_tags = TAG_LIKE.replace_all(&current, "");
        let stripped = EMPHASIS_RUN.replace_all(&without_tags, "").into_owned();
        if stripped == current {
            return stripped.trim().to_string();
        }
        current = stripped;
    }
}

fn headline_core(line: &str) -> &str {
    line.trim_matches(|c: char| c == '*' || c.is_whitespace())
}

fn format_body_line(line: &str) -> Option<String> {
    let mut line = line.to_string();

    if line.starts_with(['"', '“']) {
        let quoted = line.trim_matches(&QUOTE_MARKS[..]).trim();
        if quoted.is_empty() {
            return None;
        }
        line = format!("> {}", quoted);
    }

    if line.starts_with('>') && !line.starts_with("> ") {
        line.insert(1, ' ');
    }

    Some(line)
}
