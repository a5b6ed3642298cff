//! Markdown answers to HTML that is safe to insert into the page.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};

const BLOCKED_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:"];

pub trait MarkupRenderer {
    fn to_html(&self, markup: &str) -> String;
}

/// CommonMark (with tables and strikethrough) via pulldown-cmark.
///
/// Raw HTML in the source is escaped rather than passed through, and links or
/// images pointing at script-capable schemes are rewritten to `#`. An answer
/// that is a single paragraph renders without its `<p>` wrapper, since it is
/// inserted into a paragraph of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMark;

impl MarkupRenderer for CommonMark {
    fn to_html(&self, markup: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);

        let mut events: Vec<Event> = Parser::new_ext(markup, options).map(sanitize).collect();
        if is_single_paragraph(&events) {
            events.pop();
            events.remove(0);
        }

        let mut out = String::with_capacity(markup.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }
}

fn sanitize(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    }
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let normalized: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect::<String>()
        .to_ascii_lowercase();
    if BLOCKED_SCHEMES.iter().any(|s| normalized.starts_with(s)) {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

/// True when the whole document is one top-level paragraph.
fn is_single_paragraph(events: &[Event<'_>]) -> bool {
    if !matches!(events.first(), Some(Event::Start(Tag::Paragraph))) {
        return false;
    }
    let mut depth = 0usize;
    let mut top_level = 0usize;
    for event in events {
        match event {
            Event::Start(_) => {
                if depth == 0 {
                    top_level += 1;
                }
                depth += 1;
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            _ if depth == 0 => top_level += 1,
            _ => {}
        }
    }
    top_level == 1 && matches!(events.last(), Some(Event::End(TagEnd::Paragraph)))
}
