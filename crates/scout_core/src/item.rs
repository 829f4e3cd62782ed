use serde::{Deserialize, Serialize};

use crate::Platform;

/// Sentinel for a field whose extraction strategies all missed.
pub const UNKNOWN: &str = "unknown";

/// Title given to an included card whose title could not be recovered.
pub const PLACEHOLDER_TITLE: &str = "商品";

/// One normalized product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub title: String,
    pub price: String,
    pub shop: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    pub link: String,
}

impl Item {
    pub fn new(title: impl Into<String>, price: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            price: price.into(),
            shop: UNKNOWN.to_string(),
            sales: None,
            rating: None,
            link: link.into(),
        }
    }

    pub fn with_shop(mut self, shop: impl Into<String>) -> Self {
        self.shop = shop.into();
        self
    }

    pub fn with_engagement(mut self, sales: impl Into<String>, rating: impl Into<String>) -> Self {
        self.sales = Some(sales.into());
        self.rating = Some(rating.into());
        self
    }

    pub fn item_id(&self, platform: Platform) -> Option<String> {
        platform.item_id(&self.link)
    }

    pub fn has_placeholder_title(&self) -> bool {
        self.title == PLACEHOLDER_TITLE
    }
}
