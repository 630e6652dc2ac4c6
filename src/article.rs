//! Derivations shared by the metadata and post generators: slugs from file
//! names, the title resolution chain, plain-text excerpts, word counts, and
//! read-time estimates.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::Path;

use crate::frontmatter::FrontMatter;

/// Words per minute assumed by [`read_time`].
const WORDS_PER_MINUTE: usize = 200;

/// Maximum number of characters in a derived excerpt.
const EXCERPT_LENGTH: usize = 200;

static DATE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})-(.+)$").unwrap());
static FIRST_H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#\s+(.+)$").unwrap());
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-_]").unwrap());
static CAMEL_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());
static WORD_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static HEADING_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#+\s+.+$").unwrap());
static CODE_BLOCKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`]*`").unwrap());
static IMAGES: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[.*?\]\(.*?\)").unwrap());
static LINKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]\(.*?\)").unwrap());
static NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").unwrap());

/// Derives a slug from a source file name: the file stem, with a leading
/// `YYYY-MM-DD-` date prefix stripped when present. Stable across
/// regenerations as long as the file name is stable.
pub fn slug_from_filename(file_name: &str) -> String {
    let stem = file_stem(file_name);
    match DATE_PREFIX.captures(stem) {
        Some(caps) => caps[2].to_owned(),
        None => stem.to_owned(),
    }
}

/// Resolves a post title: front-matter `title`, else the first level-1
/// heading in the body, else a title-cased form of the slug.
pub fn extract_title(front_matter: &FrontMatter, body: &str, file_name: &str) -> String {
    if let Some(title) = &front_matter.title {
        return title.clone();
    }
    if let Some(heading) = first_heading(body) {
        return heading;
    }
    titleize(&slug_from_filename(file_name))
}

/// The first level-1 heading in `body`, if any.
pub fn first_heading(body: &str) -> Option<String> {
    FIRST_H1.captures(body).map(|caps| caps[1].trim().to_owned())
}

/// Derives a title from the file name alone. Unlike the slug-based fallback
/// in [`extract_title`], a date prefix is parsed out and appended
/// parenthetically, e.g. `2024-01-01-my-post.md` becomes
/// `My Post (2024-01-01)`.
pub fn title_from_filename(file_name: &str) -> String {
    let stem = file_stem(file_name);
    let title = match DATE_PREFIX.captures(stem) {
        Some(caps) => format!("{} ({})", titleize(&caps[2]), &caps[1]),
        None => titleize(stem),
    };
    if title.is_empty() {
        "未命名文档".to_owned()
    } else {
        title
    }
}

/// Converts a kebab/snake/camel-case name into title case:
/// `my-first_postTitle` becomes `My First Post Title`.
pub fn titleize(name: &str) -> String {
    let spaced = SEPARATORS.replace_all(name, " ");
    let spaced = CAMEL_BOUNDARY.replace_all(&spaced, "$1 $2");
    let cased = WORD_START.replace_all(&spaced, |caps: &Captures| caps[0].to_uppercase());
    WHITESPACE.replace_all(&cased, " ").trim().to_owned()
}

/// Counts whitespace-separated words.
pub fn word_count(body: &str) -> usize {
    body.split_whitespace().count()
}

/// Estimates reading time at 200 words per minute, ceiling-rounded, formatted
/// as `N分钟`.
pub fn read_time(body: &str) -> String {
    let minutes = word_count(body).div_ceil(WORDS_PER_MINUTE);
    if minutes > 0 {
        format!("{}分钟", minutes)
    } else {
        "少于1分钟".to_owned()
    }
}

/// Resolves an excerpt: front-matter `excerpt`, else front-matter
/// `description`, else the first 200 characters of the body with Markdown
/// structure (headings, code, images, links) stripped.
pub fn extract_excerpt(body: &str, front_matter: &FrontMatter) -> String {
    if let Some(excerpt) = &front_matter.excerpt {
        return excerpt.clone();
    }
    if let Some(description) = &front_matter.description {
        return description.clone();
    }

    let text = HEADING_LINES.replace_all(body, "");
    let text = CODE_BLOCKS.replace_all(&text, "");
    let text = INLINE_CODE.replace_all(&text, "");
    let text = IMAGES.replace_all(&text, "");
    let text = LINKS.replace_all(&text, "");
    let text = NEWLINES.replace_all(&text, " ");
    let text = text.trim();

    let mut excerpt: String = text.chars().take(EXCERPT_LENGTH).collect();
    if text.chars().count() > EXCERPT_LENGTH {
        excerpt.push_str("...");
    }
    excerpt
}

fn file_stem(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name)
}

#[cfg(test)]
mod test {
    use super::*;

    fn front_matter(title: Option<&str>) -> FrontMatter {
        FrontMatter {
            title: title.map(str::to_owned),
            ..FrontMatter::default()
        }
    }

    #[test]
    fn test_slug_strips_date_prefix() {
        assert_eq!(slug_from_filename("2024-01-01-my-post.md"), "my-post");
        assert_eq!(slug_from_filename("plain-post.md"), "plain-post");
    }

    #[test]
    fn test_title_prefers_front_matter() {
        let fm = front_matter(Some("Explicit"));
        assert_eq!(extract_title(&fm, "# Heading\n", "other.md"), "Explicit");
    }

    #[test]
    fn test_title_falls_back_to_first_heading() {
        let fm = front_matter(None);
        assert_eq!(
            extract_title(&fm, "intro\n\n# The Heading \n\nmore", "other.md"),
            "The Heading"
        );
    }

    #[test]
    fn test_title_falls_back_to_filename() {
        let fm = front_matter(None);
        assert_eq!(
            extract_title(&fm, "no headings here", "my-first-post.md"),
            "My First Post"
        );
        assert_eq!(
            extract_title(&fm, "", "2024-03-05-rust_tips.md"),
            "Rust Tips"
        );
    }

    #[test]
    fn test_titleize_splits_camel_case() {
        assert_eq!(titleize("myPostTitle"), "My Post Title");
        assert_eq!(titleize("snake_case-mix"), "Snake Case Mix");
    }

    #[test]
    fn test_title_from_filename_appends_date() {
        assert_eq!(
            title_from_filename("2024-01-01-my-post.md"),
            "My Post (2024-01-01)"
        );
        assert_eq!(title_from_filename("hello-world.md"), "Hello World");
    }

    #[test]
    fn test_read_time_rounds_up() {
        let four_hundred = vec!["word"; 400].join(" ");
        assert_eq!(read_time(&four_hundred), "2分钟");
        assert_eq!(read_time("word"), "1分钟");
        let two_hundred_one = vec!["word"; 201].join(" ");
        assert_eq!(read_time(&two_hundred_one), "2分钟");
        assert_eq!(read_time(""), "少于1分钟");
    }

    #[test]
    fn test_excerpt_prefers_front_matter_fields() {
        let fm = FrontMatter {
            excerpt: Some("from excerpt".to_owned()),
            description: Some("from description".to_owned()),
            ..FrontMatter::default()
        };
        assert_eq!(extract_excerpt("body", &fm), "from excerpt");

        let fm = FrontMatter {
            description: Some("from description".to_owned()),
            ..FrontMatter::default()
        };
        assert_eq!(extract_excerpt("body", &fm), "from description");
    }

    #[test]
    fn test_excerpt_strips_markdown_structure() {
        let body = "# Title\n\nSome text with `code` and a [link](https://example.com).\n\n```rust\nfn main() {}\n```\n\n![alt](img.png)\n\nMore text.";
        let excerpt = extract_excerpt(body, &FrontMatter::default());
        assert_eq!(excerpt, "Some text with  and a . More text.");
    }

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let body = "word ".repeat(100);
        let excerpt = extract_excerpt(&body, &FrontMatter::default());
        assert_eq!(excerpt.chars().count(), 203);
        assert!(excerpt.ends_with("..."));
    }
}
