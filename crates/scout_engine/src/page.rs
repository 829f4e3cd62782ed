use std::fmt;

use scraper::{ElementRef, Html};

/// How a control without a usable href is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickMethod {
    /// Call the element's own click handler.
    Handler,
    /// Dispatch a synthetic bubbling click event.
    Dispatch,
    /// The element's native `click()`.
    Native,
}

impl ClickMethod {
    pub const CASCADE: [ClickMethod; 3] =
        [ClickMethod::Handler, ClickMethod::Dispatch, ClickMethod::Native];
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },
    #[error("no document loaded")]
    NoDocument,
    #[error("page is gone: {0}")]
    Closed(String),
}

/// Child-index path from the document root to one node. Lets a control found
/// in a parsed snapshot be addressed again in the live document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ElementPath(Vec<usize>);

impl ElementPath {
    pub fn of(element: ElementRef) -> Self {
        let mut indices = Vec::new();
        let mut node = *element;
        while let Some(parent) = node.parent() {
            let index = parent
                .children()
                .position(|child| child.id() == node.id())
                .unwrap_or_default();
            indices.push(index);
            node = parent;
        }
        indices.reverse();
        Self(indices)
    }

    pub fn resolve<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        let mut node = document.tree.root();
        for &index in &self.0 {
            node = node.children().nth(index)?;
        }
        ElementRef::wrap(node)
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(usize::to_string).collect();
        write!(f, "/{}", parts.join("/"))
    }
}

/// One loaded document the scout drives. Implementations decide what
/// scrolling and clicking mean; a static document may treat both as no-ops.
#[async_trait::async_trait(?Send)]
pub trait Page {
    /// Serialized markup of the document as it stands now.
    async fn html(&self) -> Result<String, PageError>;

    fn url(&self) -> String;

    async fn scroll_height(&self) -> Result<u64, PageError>;

    async fn scroll_to(&mut self, y: u64) -> Result<(), PageError>;

    async fn navigate(&mut self, url: &str) -> Result<(), PageError>;

    /// Returns `Ok(false)` when the method is not supported for the target.
    async fn click(&mut self, target: &ElementPath, method: ClickMethod)
        -> Result<bool, PageError>;
}

#[cfg(test)]
mod tests {
    use scraper::Selector;

    use super::*;

    #[test]
    fn path_resolves_to_the_same_element_in_a_reparse() {
        let markup = r#"<html><body><div class="pager"><a>1</a><a class="next">下一页</a></div></body></html>"#;
        let first = Html::parse_document(markup);
        let selector = Selector::parse("a.next").unwrap();
        let next = first.select(&selector).next().unwrap();
        let path = ElementPath::of(next);

        let second = Html::parse_document(markup);
        let resolved = path.resolve(&second).unwrap();
        assert_eq!(resolved.value().attr("class"), Some("next"));
        assert_eq!(resolved.text().collect::<String>(), "下一页");
    }
}
