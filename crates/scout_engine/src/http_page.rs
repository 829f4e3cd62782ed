use std::sync::Arc;

use scout_logging::scout_info;

use crate::decode::decode_html;
use crate::fetch::Fetcher;
use crate::page::{ClickMethod, ElementPath, Page, PageError};

/// A [`Page`] over server-rendered documents fetched one at a time. It has no
/// layout and runs no scripts, so the scroll height is zero and clicks are
/// unsupported; pagination proceeds by href navigation only.
pub struct HttpPage {
    fetcher: Arc<dyn Fetcher>,
    url: String,
    html: Option<String>,
}

impl HttpPage {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            url: String::new(),
            html: None,
        }
    }

    /// Fetches and decodes `url` as the initial document.
    pub async fn open(fetcher: Arc<dyn Fetcher>, url: &str) -> Result<Self, PageError> {
        let mut page = Self::new(fetcher);
        page.navigate(url).await?;
        Ok(page)
    }
}

#[async_trait::async_trait(?Send)]
impl Page for HttpPage {
    async fn html(&self) -> Result<String, PageError> {
        self.html.clone().ok_or(PageError::NoDocument)
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    async fn scroll_height(&self) -> Result<u64, PageError> {
        Ok(0)
    }

    async fn scroll_to(&mut self, _y: u64) -> Result<(), PageError> {
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<(), PageError> {
        let navigation = |message: String| PageError::Navigation {
            url: url.to_string(),
            message,
        };
        let output = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|err| navigation(err.to_string()))?;
        let decoded = decode_html(&output.bytes, output.content_type.as_deref())
            .map_err(|err| navigation(err.to_string()))?;
        scout_info!(
            "Loaded {} ({} encoding, {} chars)",
            output.final_url,
            decoded.encoding_label,
            decoded.html.len()
        );
        self.url = output.final_url;
        self.html = Some(decoded.html);
        Ok(())
    }

    async fn click(&mut self, _target: &ElementPath, _method: ClickMethod) -> Result<bool, PageError> {
        Ok(false)
    }
}
