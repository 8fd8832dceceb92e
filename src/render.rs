use pulldown_cmark::{html, Event, Options, Parser};

/// Rendering boundary consumed by the engine. Implementations must be pure:
/// the same source always yields the same markup, with no state carried
/// between calls. The engine re-renders full accumulated source on every
/// stream token, so a stateful renderer would compound artifacts.
pub trait MarkupRenderer: Send + Sync {
    fn render(&self, source: &str) -> String;
}

/// Markdown-to-HTML renderer. Raw HTML in the source is demoted to text so
/// the output stays escaped regardless of what the backend sends.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    fn options() -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options
    }
}

impl MarkupRenderer for MarkdownRenderer {
    fn render(&self, source: &str) -> String {
        let parser = Parser::new_ext(source, Self::options()).map(|event| match event {
            Event::Html(raw) => Event::Text(raw),
            Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        });

        let mut markup = String::new();
        html::push_html(&mut markup, parser);
        markup
    }
}

/// Pass-through renderer for surfaces that draw plain text themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainRenderer;

impl MarkupRenderer for PlainRenderer {
    fn render(&self, source: &str) -> String {
        source.to_string()
    }
}
