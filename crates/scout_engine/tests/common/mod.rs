#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Once;

use scout_engine::{ClickMethod, ElementPath, Page, PageError};

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(scout_logging::initialize_for_tests);
}

/// In-memory page: documents keyed by URL, a scripted scroll height, and an
/// optional URL that a supported click navigates to.
#[derive(Default)]
pub struct FakePage {
    pub documents: HashMap<String, String>,
    pub url: String,
    /// Successive `scroll_height` answers; the last one repeats.
    pub heights: VecDeque<u64>,
    pub last_height: u64,
    /// Click methods that trigger navigation to `click_target`.
    pub clickable: Vec<ClickMethod>,
    pub click_target: Option<String>,
    pub clicks: Vec<(ElementPath, ClickMethod)>,
    pub navigations: Vec<String>,
    pub scrolls: Vec<u64>,
}

impl FakePage {
    pub fn at(url: &str) -> Self {
        Self {
            url: url.to_string(),
            last_height: 1000,
            ..Self::default()
        }
    }

    pub fn with_document(mut self, url: &str, html: impl Into<String>) -> Self {
        self.documents.insert(url.to_string(), html.into());
        self
    }

    pub fn with_heights(mut self, heights: &[u64]) -> Self {
        self.heights = heights.iter().copied().collect();
        self
    }

    pub fn clicking_to(mut self, methods: &[ClickMethod], target: &str) -> Self {
        self.clickable = methods.to_vec();
        self.click_target = Some(target.to_string());
        self
    }
}

#[async_trait::async_trait(?Send)]
impl Page for FakePage {
    async fn html(&self) -> Result<String, PageError> {
        self.documents
            .get(&self.url)
            .cloned()
            .ok_or(PageError::NoDocument)
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    async fn scroll_height(&self) -> Result<u64, PageError> {
        Ok(self.heights.front().copied().unwrap_or(self.last_height))
    }

    async fn scroll_to(&mut self, y: u64) -> Result<(), PageError> {
        self.scrolls.push(y);
        if self.heights.len() > 1 {
            self.heights.pop_front();
        } else if let Some(last) = self.heights.pop_front() {
            self.last_height = last;
        }
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<(), PageError> {
        self.navigations.push(url.to_string());
        if !self.documents.contains_key(url) {
            return Err(PageError::Navigation {
                url: url.to_string(),
                message: "no such document".to_string(),
            });
        }
        self.url = url.to_string();
        Ok(())
    }

    async fn click(&mut self, target: &ElementPath, method: ClickMethod) -> Result<bool, PageError> {
        self.clicks.push((target.clone(), method));
        if !self.clickable.contains(&method) {
            return Ok(false);
        }
        match self.click_target.clone() {
            Some(url) => {
                self.url = url;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

pub const JD_SEARCH: &str = "https://search.jd.com/Search?keyword=mouse";

/// A JD result card in the classic list markup.
pub fn jd_card(sku: u64, title: &str, price: &str) -> String {
    format!(
        r#"<li class="gl-item" data-sku="{sku}">
  <div class="p-img"><a href="//item.jd.com/{sku}.html?spm=list"><img src="{sku}.jpg"></a></div>
  <div class="p-price"><strong><em>¥</em><i>{price}</i></strong></div>
  <div class="p-name"><a><em>{title}</em></a></div>
  <div class="p-shop"><span><a>{title} 旗舰店</a></span></div>
</li>"#
    )
}

pub fn jd_results(cards: &[String], pager: &str) -> String {
    format!(
        r#"<html><head><meta charset="utf-8"></head><body>
<div id="J_goodsList"><ul class="gl-warp">{}</ul></div>
{pager}
</body></html>"#,
        cards.join("\n")
    )
}
