//! Markdown-to-HTML rendering for post bodies.

use pulldown_cmark::{html, Event, Options, Parser, Tag};

/// Renders `markdown` as HTML and appends the result to `output`.
/// Footnotes, smart punctuation, strikethrough, tables, and tasklists are
/// enabled.
pub fn to_html(output: &mut String, markdown: &str) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let events = Parser::new_ext(markdown, options).map(demote_heading);
    html::push_html(output, events);
}

// The headings in the post itself need to be demoted twice to be
// subordinate to both the site title (h1) and the post title (h2), so `#`
// becomes h3 instead of h1.
fn demote_heading(event: Event) -> Event {
    match event {
        Event::Start(Tag::Heading(level)) => Event::Start(Tag::Heading(level + 2)),
        Event::End(Tag::Heading(level)) => Event::End(Tag::Heading(level + 2)),
        _ => event,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn render(markdown: &str) -> String {
        let mut output = String::new();
        to_html(&mut output, markdown);
        output
    }

    #[test]
    fn test_paragraph() {
        assert_eq!("<p>hello world</p>\n", render("hello world"));
    }

    #[test]
    fn test_headings_demoted() {
        assert_eq!("<h3>Title</h3>\n", render("# Title"));
        assert_eq!("<h4>Subtitle</h4>\n", render("## Subtitle"));
    }

    #[test]
    fn test_strikethrough_enabled() {
        assert_eq!("<p><del>gone</del></p>\n", render("~~gone~~"));
    }

    #[test]
    fn test_html_comments_pass_through() {
        let rendered = render("above\n\n<!-- more -->\n\nbelow");
        assert!(rendered.contains("<!-- more -->"), "rendered: {}", rendered);
    }
}
