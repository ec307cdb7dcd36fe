//! Markdown to plain text.
//!
//! Inline formatting (emphasis, links, images, inline code, HTML) is removed,
//! while headings keep their `#` markers, list items keep their bullets or
//! numbers, and fenced code keeps its contents without the fences. Runs of
//! three or more newlines collapse to one blank line and the result is
//! trimmed.

use gatekeeper_core::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::TextExtractor;

pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let source = std::str::from_utf8(bytes)
            .map_err(|e| Error::Extraction(format!("Markdown is not valid UTF-8: {}", e)))?;
        Ok(strip_markdown(source))
    }
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static markdown pattern")
}

static FENCE: Lazy<Regex> = Lazy::new(|| re(r"^\s{0,3}(`{3,}|~{3,})"));
static HEADING: Lazy<Regex> = Lazy::new(|| re(r"^\s{0,3}(#{1,6})(?:\s+(.*?))?(?:\s+#+)?\s*$"));
static SETEXT_H1: Lazy<Regex> = Lazy::new(|| re(r"^\s{0,3}=+\s*$"));
static SETEXT_H2: Lazy<Regex> = Lazy::new(|| re(r"^\s{0,3}-+\s*$"));
static RULE: Lazy<Regex> = Lazy::new(|| re(r"^\s{0,3}(?:(?:\*\s*){3,}|(?:-\s*){3,}|(?:_\s*){3,})$"));
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| re(r"^(\s*)([-*+]|\d{1,9}[.)])\s+(.*)$"));
static BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| re(r"^\s{0,3}(?:>\s?)+"));
static REFERENCE_DEF: Lazy<Regex> = Lazy::new(|| re(r"^\s{0,3}\[[^\]]+\]:\s+\S"));
static TABLE_DIVIDER: Lazy<Regex> = Lazy::new(|| re(r"^\s*\|?\s*:?-{3,}:?\s*(?:\|\s*:?-{3,}:?\s*)*\|?\s*$"));

static INLINE_CODE: Lazy<Regex> = Lazy::new(|| re(r"(`+)([^`]+?)(`+)"));
static IMAGE: Lazy<Regex> = Lazy::new(|| re(r"!\[([^\]]*)\]\([^)]*\)"));
static LINK: Lazy<Regex> = Lazy::new(|| re(r"\[([^\]]+)\]\([^)]*\)"));
static REFERENCE_LINK: Lazy<Regex> = Lazy::new(|| re(r"\[([^\]]+)\]\[[^\]]*\]"));
static AUTOLINK: Lazy<Regex> = Lazy::new(|| re(r"<((?:https?|mailto|ftp):[^>\s]+)>"));
static HTML_TAG: Lazy<Regex> = Lazy::new(|| re(r"</?[A-Za-z][A-Za-z0-9-]*(?:\s[^<>]*)?/?>|<!--.*?-->"));
static STRONG_STAR: Lazy<Regex> = Lazy::new(|| re(r"\*\*([^*]+)\*\*"));
static STRONG_UNDERSCORE: Lazy<Regex> = Lazy::new(|| re(r"__([^_]+)__"));
static EM_STAR: Lazy<Regex> = Lazy::new(|| re(r"\*([^*\s](?:[^*]*[^*\s])?)\*"));
static EM_UNDERSCORE: Lazy<Regex> = Lazy::new(|| re(r"(^|[^\w])_([^_\s](?:[^_]*[^_\s])?)_([^\w]|$)"));
static STRIKE: Lazy<Regex> = Lazy::new(|| re(r"~~([^~]+)~~"));
static ESCAPE: Lazy<Regex> = Lazy::new(|| re(r"\\([\\`*_{}\[\]()#+\-.!>~|])"));
static EXTRA_BLANK_LINES: Lazy<Regex> = Lazy::new(|| re(r"\n{3,}"));

pub fn strip_markdown(source: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut fence: Option<String> = None;

    for raw in source.lines() {
        if let Some(marker) = &fence {
            if closes_fence(raw, marker) {
                fence = None;
            } else {
                out.push(raw.trim_end().to_string());
            }
            continue;
        }
        if let Some(caps) = FENCE.captures(raw) {
            fence = Some(caps[1].to_string());
            continue;
        }
        if REFERENCE_DEF.is_match(raw) || (raw.contains('|') && TABLE_DIVIDER.is_match(raw)) {
            continue;
        }
        let previous_is_text = out.last().is_some_and(|l| !l.trim().is_empty() && !LIST_ITEM.is_match(l));
        if previous_is_text && SETEXT_H1.is_match(raw) {
            promote_last(&mut out, "#");
            continue;
        }
        if previous_is_text && SETEXT_H2.is_match(raw) {
            promote_last(&mut out, "##");
            continue;
        }
        if RULE.is_match(raw) {
            out.push(String::new());
            continue;
        }
        let line = BLOCKQUOTE.replace(raw, "");
        out.push(strip_block(&line).trim_end().to_string());
    }

    let joined = out.join("\n");
    EXTRA_BLANK_LINES.replace_all(&joined, "\n\n").trim().to_string()
}

fn closes_fence(line: &str, marker: &str) -> bool {
    let trimmed = line.trim();
    let fence_char = marker.chars().next().unwrap_or('`');
    trimmed.len() >= marker.len() && trimmed.chars().all(|c| c == fence_char)
}

fn promote_last(out: &mut [String], hashes: &str) {
    if let Some(last) = out.last_mut() {
        *last = format!("{} {}", hashes, last.trim());
    }
}

fn strip_block(line: &str) -> String {
    if let Some(caps) = HEADING.captures(line) {
        let text = caps.get(2).map_or("", |m| m.as_str());
        return format!("{} {}", &caps[1], strip_inline(text)).trim_end().to_string();
    }
    if let Some(caps) = LIST_ITEM.captures(line) {
        return format!("{}{} {}", &caps[1], &caps[2], strip_inline(&caps[3]));
    }
    let trimmed = line.trim();
    if trimmed.starts_with('|') && trimmed.ends_with('|') && trimmed.len() > 1 {
        let cells: Vec<String> = trimmed[1..trimmed.len() - 1]
            .split('|')
            .map(|cell| strip_inline(cell.trim()))
            .collect();
        return cells.join(" ");
    }
    strip_inline(line)
}

/// Strip inline formatting; inline code spans keep their contents verbatim.
fn strip_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in INLINE_CODE.captures_iter(text) {
        let (Some(whole), Some(open), Some(body), Some(close)) = (caps.get(0), caps.get(1), caps.get(2), caps.get(3)) else {
            continue;
        };
        if open.as_str() != close.as_str() {
            continue;
        }
        out.push_str(&strip_formatting(&text[last..whole.start()]));
        out.push_str(body.as_str().trim());
        last = whole.end();
    }
    out.push_str(&strip_formatting(&text[last..]));
    out
}

fn strip_formatting(text: &str) -> String {
    let s = IMAGE.replace_all(text, "${1}");
    let s = LINK.replace_all(&s, "${1}");
    let s = REFERENCE_LINK.replace_all(&s, "${1}");
    let s = AUTOLINK.replace_all(&s, "${1}");
    let s = HTML_TAG.replace_all(&s, "");
    let s = STRONG_STAR.replace_all(&s, "${1}");
    let s = STRONG_UNDERSCORE.replace_all(&s, "${1}");
    let s = EM_STAR.replace_all(&s, "${1}");
    let s = EM_UNDERSCORE.replace_all(&s, "${1}${2}${3}");
    let s = STRIKE.replace_all(&s, "${1}");
    ESCAPE.replace_all(&s, "${1}").into_owned()
}
