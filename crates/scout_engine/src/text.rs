use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Selector};

/// Renders the visible text of an element the way a browser's `innerText`
/// would: block-level elements start new lines, runs of whitespace collapse,
/// script and style content is skipped.
pub fn inner_text(element: ElementRef) -> String {
    let mut ctx = TextContext::default();
    visit_children(element, &mut ctx);
    ctx.finish()
}

/// Trims and collapses every whitespace run to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// The element itself or its nearest ancestor matching `selector`.
pub fn closest<'a>(element: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    if selector.matches(&element) {
        return Some(element);
    }
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| selector.matches(ancestor))
}

/// Short single-line excerpt used in diagnostics.
pub fn excerpt(element: ElementRef, max: usize) -> String {
    truncate_chars(&collapse_whitespace(&inner_text(element)), max)
}

fn visit_node(node: NodeRef<'_, Node>, ctx: &mut TextContext) {
    match node.value() {
        Node::Text(text) => ctx.append_text(text),
        Node::Element(_) => {
            if let Some(element) = ElementRef::wrap(node) {
                visit_element(element, ctx);
            }
        }
        _ => {
            for child in node.children() {
                visit_node(child, ctx);
            }
        }
    }
}

fn visit_element(element: ElementRef, ctx: &mut TextContext) {
    let tag = element.value().name().to_ascii_lowercase();
    match tag.as_str() {
        "br" => ctx.ensure_newline(),
        "p" | "div" | "section" | "article" | "header" | "footer" | "nav" | "figure"
        | "figcaption" | "table" | "tr" | "blockquote" | "address" | "li" | "ul" | "ol"
        | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "dl" | "dt" | "dd" => {
            ctx.ensure_newline();
            visit_children(element, ctx);
            ctx.ensure_newline();
        }
        "script" | "style" | "noscript" | "template" | "iframe" => {}
        _ => visit_children(element, ctx),
    }
}

fn visit_children(element: ElementRef, ctx: &mut TextContext) {
    for child in element.children() {
        visit_node(child, ctx);
    }
}

#[derive(Default)]
struct TextContext {
    builder: String,
    last_char: Option<char>,
}

impl TextContext {
    fn finish(self) -> String {
        self.builder
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn append_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch.is_whitespace() {
                if matches!(self.last_char, None | Some(' ') | Some('\n')) {
                    continue;
                }
                self.push_char(' ');
            } else {
                self.push_char(ch);
            }
        }
    }

    fn ensure_newline(&mut self) {
        if self.last_char == Some('\n') || self.builder.is_empty() {
            return;
        }
        self.push_char('\n');
    }

    fn push_char(&mut self, ch: char) {
        self.builder.push(ch);
        self.last_char = Some(ch);
    }
}
