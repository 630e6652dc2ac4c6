//! Markdown-to-HTML conversion behind a single [`to_html`] entry point.
//! Extensions are toggled from [`MarkdownOptions`]; heading anchor ids are
//! injected by intercepting heading events and computing the same anchor the
//! TOC builder uses, so in-page TOC links resolve.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

use crate::config::MarkdownConfig;
use crate::toc;

/// Converts `markdown` to HTML.
pub fn to_html(markdown: &str, config: &MarkdownConfig) -> String {
    let options = parser_options(config);
    let mut output = String::new();
    if config.options.heading_anchors {
        let events = anchored_events(Parser::new_ext(markdown, options));
        html::push_html(&mut output, events.into_iter());
    } else {
        html::push_html(&mut output, Parser::new_ext(markdown, options));
    }
    output
}

fn parser_options(config: &MarkdownConfig) -> Options {
    let mut options = Options::empty();
    let toggles = &config.options;
    if toggles.tables {
        options.insert(Options::ENABLE_TABLES);
    }
    if toggles.footnotes {
        options.insert(Options::ENABLE_FOOTNOTES);
    }
    if toggles.strikethrough {
        options.insert(Options::ENABLE_STRIKETHROUGH);
    }
    if toggles.tasklists {
        options.insert(Options::ENABLE_TASKLISTS);
    }
    if toggles.smart_punctuation {
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
    }
    options
}

/// Replaces heading start/end tags with raw HTML carrying an `id` attribute.
/// Heading inner events are buffered so the anchor can be computed from the
/// heading's text before the opening tag is emitted.
fn anchored_events<'a>(parser: Parser<'a>) -> Vec<Event<'a>> {
    let mut events: Vec<Event> = Vec::new();
    let mut heading: Option<Vec<Event>> = None;

    for event in parser {
        match event {
            Event::Start(Tag::Heading(_)) => heading = Some(Vec::new()),
            Event::End(Tag::Heading(level)) => {
                let inner = heading.take().unwrap_or_default();
                let text: String = inner
                    .iter()
                    .filter_map(|event| match event {
                        Event::Text(text) | Event::Code(text) => Some(text.as_ref()),
                        _ => None,
                    })
                    .collect();
                events.push(Event::Html(CowStr::from(format!(
                    "<h{} id=\"{}\">",
                    level,
                    toc::anchor_id(&text)
                ))));
                events.extend(inner);
                events.push(Event::Html(CowStr::from(format!("</h{}>\n", level))));
            }
            other => match heading.as_mut() {
                Some(inner) => inner.push(other),
                None => events.push(other),
            },
        }
    }
    events
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_headings_carry_anchor_ids() {
        let html = to_html("# Hello World\n\ntext\n", &MarkdownConfig::default());
        assert!(html.contains("<h1 id=\"hello-world\">Hello World</h1>"));
        assert!(html.contains("<p>text</p>"));
    }

    #[test]
    fn test_heading_anchor_matches_toc_anchor() {
        let body = "## Mixed Case Heading\n";
        let html = to_html(body, &MarkdownConfig::default());
        let headings = toc::headings(body);
        assert!(html.contains(&format!("id=\"{}\"", headings[0].anchor)));
    }

    #[test]
    fn test_anchors_can_be_disabled() {
        let mut config = MarkdownConfig::default();
        config.options.heading_anchors = false;
        let html = to_html("# Hello World\n", &config);
        assert!(html.contains("<h1>Hello World</h1>"));
        assert!(!html.contains("id="));
    }

    #[test]
    fn test_tables_render_when_enabled() {
        let md = "| a | b |\n| - | - |\n| 1 | 2 |\n";
        let html = to_html(md, &MarkdownConfig::default());
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_code_blocks_render_with_language_class() {
        let md = "```rust\nfn main() {}\n```\n";
        let html = to_html(md, &MarkdownConfig::default());
        assert!(html.contains("<code class=\"language-rust\">"));
    }
}
