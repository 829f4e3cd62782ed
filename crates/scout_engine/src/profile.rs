//! Per-site selector data. Every list is ordered most specific first.

use scout_core::Platform;
use scraper::Selector;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteProfile {
    pub card_selectors: Vec<String>,
    /// How many leading card selectors the post-scroll rescan may switch to.
    pub rescan_depth: usize,
    pub price_indicators: Vec<String>,
    pub primary_containers: Vec<String>,
    pub secondary_containers: Vec<String>,
    /// Attribute carrying the numeric product id on genuine cards.
    pub anchor_attr: Option<String>,
    pub price_evidence: Vec<String>,
    pub title_evidence: Vec<String>,
    pub lazy_media: Vec<String>,

    pub title_selectors: Vec<String>,
    pub price_int_selectors: Vec<String>,
    pub price_fraction_selectors: Vec<String>,
    pub price_selectors: Vec<String>,
    pub shop_selectors: Vec<String>,
    pub sales_selectors: Vec<String>,
    pub rating_selectors: Vec<String>,
    pub link_selectors: Vec<String>,
    /// Substrings identifying product-detail hrefs.
    pub product_markers: Vec<String>,
    /// Substrings identifying search or navigation hrefs.
    pub excluded_markers: Vec<String>,
    pub id_attrs: Vec<String>,
    /// Detail URL with an `{id}` placeholder.
    pub detail_url: String,
    pub search_url: String,
    pub search_param: String,
    /// Hosts whose detail links are canonical without a query string.
    pub canonical_detail_hosts: Vec<String>,

    pub next_selectors: Vec<String>,
    pub pagination_containers: Vec<String>,
    /// Host on which a missing page parameter may be appended.
    pub search_host: Option<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl SiteProfile {
    pub fn builtin(platform: Platform) -> Self {
        match platform {
            Platform::Taobao => Self::taobao(),
            Platform::Jd => Self::jd(),
        }
    }

    pub fn taobao() -> Self {
        Self {
            card_selectors: strings(&[
                r#"div[class*="doubleCard--"]"#,
                r#"a[class*="doubleCardWrapperAdapt--"]"#,
            ]),
            rescan_depth: 2,
            price_indicators: strings(&[r#"[class*="priceInt--"]"#, r#"[class*="PriceInt--"]"#]),
            primary_containers: strings(&[
                r#"[class*="doubleCardWrapperAdapt--"], [class*="doubleCard--"]"#,
            ]),
            secondary_containers: strings(&[r#"li, div[class*="item"]"#]),
            anchor_attr: None,
            price_evidence: strings(&[r#"[class*="priceInt--"]"#]),
            title_evidence: strings(&[r#"[class*="title--"]"#]),
            lazy_media: strings(&["img[data-src], img[data-lazy]"]),
            title_selectors: strings(&[r#"[class*="title--"]"#, r#"[class*="Title--"]"#]),
            price_int_selectors: strings(&[r#"[class*="priceInt--"]"#, r#"[class*="PriceInt--"]"#]),
            price_fraction_selectors: strings(&[
                r#"[class*="priceFloat--"]"#,
                r#"[class*="PriceFloat--"]"#,
            ]),
            price_selectors: strings(&[r#"[class*="price--"]"#, r#"[class*="Price--"]"#]),
            shop_selectors: strings(&[
                r#"[class*="shopName--"]"#,
                r#"[class*="ShopName--"]"#,
                r#"[class*="shopInfo--"]"#,
            ]),
            sales_selectors: Vec::new(),
            rating_selectors: Vec::new(),
            link_selectors: strings(&[
                r#"a[href*="item.taobao.com"]"#,
                r#"a[href*="detail.tmall.com"]"#,
            ]),
            product_markers: strings(&["item.taobao.com", "detail.tmall.com"]),
            excluded_markers: strings(&["s.taobao.com/search"]),
            id_attrs: strings(&["data-id", "data-nid"]),
            detail_url: "https://item.taobao.com/item.htm?id={id}".to_string(),
            search_url: "https://s.taobao.com/search".to_string(),
            search_param: "q".to_string(),
            canonical_detail_hosts: Vec::new(),
            next_selectors: strings(&[
                r#"button[class*="next-next"]"#,
                r#"[class*="pagination-next"]"#,
            ]),
            pagination_containers: strings(&[
                ".pagination",
                r#"[class*="pagination"]"#,
                r#"[class*="pager"]"#,
            ]),
            search_host: Some("s.taobao.com".to_string()),
        }
    }

    pub fn jd() -> Self {
        Self {
            card_selectors: strings(&[
                ".plugin_goodsCardWrapper",
                "[data-sku]",
                ".gl-item",
                ".item",
            ]),
            rescan_depth: 2,
            price_indicators: strings(&[
                "span._price_d0rf6_14",
                r#"[class*="_price_d0rf6"]"#,
                ".p-price",
                ".J_price",
                r#"[class*="p-price"]"#,
            ]),
            primary_containers: strings(&[
                r#"[data-sku], .plugin_goodsCardWrapper, [class*="goodsCardWrapper"]"#,
            ]),
            secondary_containers: strings(&[r#"li, div[class*="gl-item"], div[class*="item"]"#]),
            anchor_attr: Some("data-sku".to_string()),
            price_evidence: strings(&[r#"span._price_d0rf6_14, [class*="_price"], .p-price"#]),
            title_evidence: strings(&[r#"span._text_1g56m_31, [class*="name"], .p-name"#]),
            lazy_media: strings(&["img[data-src], img[data-lazy]"]),
            title_selectors: strings(&[
                "span._text_1g56m_31",
                ".goods_title_container span",
                r#"[class*="goods_title"] span"#,
                r#"[class*="_text_1g56m"]"#,
                ".p-name em",
                ".p-name",
                ".p-name-type-2",
                r#"[class*="p-name"] em"#,
                r#"[class*="p-name"]"#,
                r#"em[class*="name"]"#,
                r#"a[class*="name"]"#,
                r#"[class*="name"]"#,
                r#"[class*="Name"]"#,
                r#"[class*="title"]"#,
                r#"[class*="Title"]"#,
                "h3",
                "h4",
                ".title",
                ".name",
            ]),
            price_int_selectors: Vec::new(),
            price_fraction_selectors: Vec::new(),
            price_selectors: strings(&[
                "span._price_d0rf6_14",
                r#"[class*="_price_d0rf6"]"#,
                ".p-price i",
                ".p-price",
                ".J_price",
                r#"[class*="p-price"] i"#,
                r#"[class*="p-price"]"#,
                r#"[class*="price"] i"#,
                r#"[class*="price"]"#,
                r#"[class*="Price"]"#,
                r#"i[class*="price"]"#,
                r#"strong[class*="price"]"#,
                ".price",
                "[data-price]",
            ]),
            shop_selectors: strings(&[
                "span._name_d19t5_35",
                r#"[class*="_name_d19t5"]"#,
                ".shopFloor span",
                r#"[class*="shopFloor"] span"#,
                ".p-shop",
                ".shop-name",
                r#"[class*="p-shop"]"#,
                r#"[class*="shop"]"#,
                r#"[class*="Shop"]"#,
                r#"[class*="store"]"#,
                r#"[class*="Store"]"#,
            ]),
            sales_selectors: strings(&[
                r#"span._goods_volume_1xkku_1 span[title*="已售"]"#,
                r#"[class*="_goods_volume"] span[title*="已售"]"#,
                r#"[class*="goods_volume"] span"#,
                ".p-commit",
                r#"[class*="commit"]"#,
                r#"[class*="sales"]"#,
                r#"[class*="Sales"]"#,
            ]),
            rating_selectors: strings(&[
                r#"span._tml_1xkku_12[title*="好评"]"#,
                r#"[class*="_tml_1xkku"] [title*="好评"]"#,
                r#"[class*="goods_volume"] span[title*="好评"]"#,
                ".p-commit strong",
                r#"[class*="rate"]"#,
                r#"[class*="Rate"]"#,
                r#"[class*="rating"]"#,
            ]),
            link_selectors: strings(&[
                r#"a[href*="item.jd.com"]"#,
                r#"a[href*="item.m.jd.com"]"#,
                r#"a[href*="/product/"]"#,
                r#"a[href*="ware.action"]"#,
                r#"a[href^="//item"]"#,
                r#"a[href^="/item"]"#,
            ]),
            product_markers: strings(&["item.jd.com", "item.m.jd.com", "/product/", "ware.action"]),
            excluded_markers: strings(&["Search?", "search.jd.com"]),
            id_attrs: strings(&["data-sku", "data-id", "data-pid"]),
            detail_url: "https://item.jd.com/{id}.html".to_string(),
            search_url: "https://search.jd.com/Search".to_string(),
            search_param: "keyword".to_string(),
            canonical_detail_hosts: strings(&["item.jd.com"]),
            next_selectors: strings(&[
                "div._pagination_next_1jczn_8",
                r#"[class*="_pagination_next"]"#,
                r#"[class*="pagination_next"]"#,
                r#"[class*="pager-next"]"#,
                ".pager-next",
                ".pagination-next",
            ]),
            pagination_containers: strings(&[
                ".pager",
                ".pagination",
                r#"[class*="pager"]"#,
                r#"[class*="pagination"]"#,
                r#"[class*="page"]"#,
            ]),
            search_host: Some("search.jd.com".to_string()),
        }
    }

    pub fn compile(&self) -> Result<CompiledProfile, ProfileError> {
        if !self.detail_url.contains("{id}") {
            return Err(ProfileError::MissingIdPlaceholder(self.detail_url.clone()));
        }
        let anchor = match &self.anchor_attr {
            Some(attr) => Some(attr_selector(attr)?),
            None => None,
        };
        Ok(CompiledProfile {
            card_candidates: compile_named(&self.card_selectors)?,
            rescan_depth: self.rescan_depth.min(self.card_selectors.len()),
            price_indicators: compile_all(&self.price_indicators)?,
            primary_containers: compile_all(&self.primary_containers)?,
            secondary_containers: compile_all(&self.secondary_containers)?,
            anchor,
            id_holders: self
                .id_attrs
                .iter()
                .map(|attr| attr_selector(attr))
                .collect::<Result<_, _>>()?,
            price_evidence: compile_all(&self.price_evidence)?,
            title_evidence: compile_all(&self.title_evidence)?,
            lazy_media: compile_all(&self.lazy_media)?,
            titles: compile_all(&self.title_selectors)?,
            price_ints: compile_all(&self.price_int_selectors)?,
            price_fractions: compile_all(&self.price_fraction_selectors)?,
            prices: compile_all(&self.price_selectors)?,
            shops: compile_all(&self.shop_selectors)?,
            sales: compile_all(&self.sales_selectors)?,
            ratings: compile_all(&self.rating_selectors)?,
            links: compile_all(&self.link_selectors)?,
            next_controls: compile_named(&self.next_selectors)?,
            pagination_containers: compile_all(&self.pagination_containers)?,
            data: self.clone(),
        })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("invalid selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },
    #[error("detail url template {0:?} has no {{id}} placeholder")]
    MissingIdPlaceholder(String),
}

fn compile_one(css: &str) -> Result<Selector, ProfileError> {
    Selector::parse(css).map_err(|err| ProfileError::InvalidSelector {
        selector: css.to_string(),
        message: err.to_string(),
    })
}

fn attr_selector(name: &str) -> Result<AttrSelector, ProfileError> {
    Ok(AttrSelector {
        name: name.to_string(),
        selector: compile_one(&format!("[{name}]"))?,
    })
}

fn compile_all(list: &[String]) -> Result<Vec<Selector>, ProfileError> {
    list.iter().map(|css| compile_one(css)).collect()
}

fn compile_named(list: &[String]) -> Result<Vec<NamedSelector>, ProfileError> {
    list.iter()
        .map(|css| {
            Ok(NamedSelector {
                css: css.clone(),
                selector: compile_one(css)?,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct NamedSelector {
    pub css: String,
    pub selector: Selector,
}

/// An attribute name with the selector matching elements that carry it.
#[derive(Debug, Clone)]
pub struct AttrSelector {
    pub name: String,
    pub selector: Selector,
}

/// A site profile with every selector parsed once.
#[derive(Debug, Clone)]
pub struct CompiledProfile {
    pub card_candidates: Vec<NamedSelector>,
    pub rescan_depth: usize,
    pub price_indicators: Vec<Selector>,
    pub primary_containers: Vec<Selector>,
    pub secondary_containers: Vec<Selector>,
    pub anchor: Option<AttrSelector>,
    pub id_holders: Vec<AttrSelector>,
    pub price_evidence: Vec<Selector>,
    pub title_evidence: Vec<Selector>,
    pub lazy_media: Vec<Selector>,
    pub titles: Vec<Selector>,
    pub price_ints: Vec<Selector>,
    pub price_fractions: Vec<Selector>,
    pub prices: Vec<Selector>,
    pub shops: Vec<Selector>,
    pub sales: Vec<Selector>,
    pub ratings: Vec<Selector>,
    pub links: Vec<Selector>,
    pub next_controls: Vec<NamedSelector>,
    pub pagination_containers: Vec<Selector>,
    pub data: SiteProfile,
}

impl CompiledProfile {
    pub fn detail_url(&self, id: &str) -> String {
        self.data.detail_url.replace("{id}", id)
    }

    pub fn is_product_href(&self, href: &str) -> bool {
        self.data
            .product_markers
            .iter()
            .any(|marker| href.contains(marker.as_str()))
    }

    pub fn is_excluded_href(&self, href: &str) -> bool {
        self.data
            .excluded_markers
            .iter()
            .any(|marker| href.contains(marker.as_str()))
    }
}
