//! Table-of-contents generation. Heading lines (`#` through `######`) are
//! scanned from the raw Markdown body and rendered as a nested HTML list;
//! anchors are the lowercased heading text with whitespace runs replaced by
//! hyphens, percent-encoded so non-ASCII headings survive in `href`s.

use once_cell::sync::Lazy;
use regex::Regex;

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(#{1,6})\s+(.+)$").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// A heading found in a Markdown body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading {
    /// Nesting depth, 1 through 6.
    pub level: usize,
    pub text: String,
    pub anchor: String,
}

/// Scans `markdown` for heading lines, in document order.
pub fn headings(markdown: &str) -> Vec<Heading> {
    HEADING
        .captures_iter(markdown)
        .map(|caps| {
            let text = caps[2].trim().to_owned();
            let anchor = anchor_id(&text);
            Heading {
                level: caps[1].len(),
                text,
                anchor,
            }
        })
        .collect()
}

/// Computes the anchor id for a heading text.
pub fn anchor_id(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let hyphenated = WHITESPACE.replace_all(&lowered, "-");
    urlencoding::encode(&hyphenated).into_owned()
}

/// Renders the nested TOC list for `markdown`, or an empty string when the
/// body has no headings. Increasing depth opens nested lists, decreasing
/// depth closes them down to the new depth, and every open list is closed at
/// the end.
pub fn render(markdown: &str) -> String {
    let headings = headings(markdown);
    if headings.is_empty() {
        return String::new();
    }

    let mut html = String::from("<nav class=\"table-of-contents\">\n<ul>\n");
    let mut current_level = 0usize;
    for heading in &headings {
        while heading.level > current_level {
            html.push_str("<li><ul>\n");
            current_level += 1;
        }
        while heading.level < current_level {
            html.push_str("</ul></li>\n");
            current_level -= 1;
        }
        html.push_str(&format!(
            "<li><a href=\"#{}\">{}</a></li>\n",
            heading.anchor, heading.text
        ));
    }
    while current_level > 0 {
        html.push_str("</ul></li>\n");
        current_level -= 1;
    }
    html.push_str("</ul>\n</nav>\n");
    html
}
