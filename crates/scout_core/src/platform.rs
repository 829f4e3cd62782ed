use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

/// The storefront a job scrapes. Selects extraction, id and export rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Taobao,
    Jd,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Taobao, Platform::Jd];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Taobao => "taobao",
            Platform::Jd => "jd",
        }
    }

    /// Host used to absolutize root-relative links.
    pub fn canonical_host(self) -> &'static str {
        match self {
            Platform::Taobao => "https://www.taobao.com",
            Platform::Jd => "https://www.jd.com",
        }
    }

    /// Store key holding this platform's accumulated items.
    pub fn items_key(self) -> String {
        format!("accumulatedItems.{}", self.as_str())
    }

    /// Whether items carry the sales and rating columns.
    pub fn has_engagement_fields(self) -> bool {
        matches!(self, Platform::Jd)
    }

    /// Canonical identifier parsed out of a product link.
    ///
    /// Taobao keeps the id in the `id` query parameter. JD encodes it in the
    /// path: `/123.html`, `/product/123`, or a trailing numeric segment.
    pub fn item_id(self, link: &str) -> Option<String> {
        match self {
            Platform::Taobao => taobao_item_id(link),
            Platform::Jd => jd_item_id(link),
        }
    }
}

fn taobao_item_id(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn jd_item_id(link: &str) -> Option<String> {
    let path = link
        .split(['?', '#'])
        .next()
        .unwrap_or(link)
        .trim_end_matches('/');
    let segments: Vec<&str> = path.split('/').collect();

    let html_segment = segments.iter().skip(1).find_map(|segment| {
        segment
            .strip_suffix(".html")
            .filter(|stem| is_numeric(stem))
    });
    if let Some(id) = html_segment {
        return Some(id.to_string());
    }

    let after_product = segments
        .windows(2)
        .find(|pair| pair[0] == "product" && leading_digits(pair[1]).is_some())
        .and_then(|pair| leading_digits(pair[1]));
    if let Some(id) = after_product {
        return Some(id.to_string());
    }

    // Skip the scheme and host segments of absolute links.
    let first_path_segment = if path.contains("://") { 3 } else { 1 };
    segments
        .get(first_path_segment..)
        .and_then(|rest| rest.last())
        .filter(|last| is_numeric(last))
        .map(|last| last.to_string())
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

fn leading_digits(value: &str) -> Option<&str> {
    let end = value
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(value.len());
    (end > 0).then(|| &value[..end])
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform {0:?} (expected taobao or jd)")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "taobao" | "tmall" => Ok(Platform::Taobao),
            "jd" | "jingdong" => Ok(Platform::Jd),
            other => Err(UnknownPlatform(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Platform;

    #[test]
    fn jd_ids_come_from_the_path() {
        let jd = Platform::Jd;
        assert_eq!(jd.item_id("https://item.jd.com/100012.html").as_deref(), Some("100012"));
        assert_eq!(
            jd.item_id("https://item.m.jd.com/product/42.html?x=1").as_deref(),
            Some("42")
        );
        assert_eq!(jd.item_id("https://item.m.jd.com/product/77").as_deref(), Some("77"));
        assert_eq!(jd.item_id("https://x/1?spm=foo").as_deref(), Some("1"));
        assert_eq!(jd.item_id("https://search.jd.com/Search?keyword=a"), None);
        assert_eq!(jd.item_id("https://www.jd.com"), None);
    }

    #[test]
    fn taobao_ids_come_from_the_query() {
        let tb = Platform::Taobao;
        assert_eq!(
            tb.item_id("https://item.taobao.com/item.htm?spm=a&id=6543").as_deref(),
            Some("6543")
        );
        assert_eq!(tb.item_id("https://item.taobao.com/item.htm"), None);
        assert_eq!(tb.item_id("not a url"), None);
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("JD".parse::<Platform>().unwrap(), Platform::Jd);
        assert_eq!(" taobao ".parse::<Platform>().unwrap(), Platform::Taobao);
        assert!("amazon".parse::<Platform>().is_err());
    }
}
