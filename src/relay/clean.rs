//! Markdown stripping for plain-text front ends
//!
//! [`clean_reply`] works on a complete reply. [`clean_fragment`] applies the
//! same character rules to one streamed fragment and does not trim, because
//! trimming every fragment would glue neighbouring words together. Markup
//! split across a fragment boundary (a bullet dash at the end of one fragment
//! and its space at the start of the next, or a newline run split in two) is
//! not seen by the fragment filter, so a fragment-filtered stream can differ
//! from the whole-reply result.

use regex::Regex;
use std::sync::LazyLock;

static MARKUP_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*_#>`]").expect("hardcoded markup regex"));

static BULLET_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)-[ \t]+").expect("hardcoded bullet regex"));

/// Two or more blank lines in a row, including lines holding only spaces/tabs
static BLANK_LINE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").expect("hardcoded blank line regex"));

fn strip_markup(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let text = MARKUP_CHARS.replace_all(&text, "");
    let text = BULLET_DASH.replace_all(&text, "$1");
    BLANK_LINE_RUN.replace_all(&text, "\n\n").into_owned()
}

/// Clean a complete reply
pub fn clean_reply(text: &str) -> String {
    strip_markup(text).trim().to_string()
}

/// Clean one streamed fragment
pub fn clean_fragment(text: &str) -> String {
    strip_markup(text)
}
