use once_cell::sync::Lazy;
use regex::Regex;
use scout_core::{Item, Platform, PLACEHOLDER_TITLE, UNKNOWN};
use scout_logging::{scout_debug, scout_warn};
use scraper::{ElementRef, Selector};
use url::Url;

use crate::config::Thresholds;
use crate::links::{is_usable_link, normalize_link, search_link};
use crate::profile::CompiledProfile;
use crate::strategy::{first_success, Resolved, Strategy};
use crate::text::{char_len, closest, collapse_whitespace, excerpt, inner_text, truncate_chars};

static PRICE_LIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[¥￥\d]").expect("valid regex"));
static CURRENCY_NUMERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[¥￥]\s*(\d+(?:\.\d+)?)").expect("valid regex"));
static BARE_NUMERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)").expect("valid regex"));
static LINE_START_PRICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*[¥￥][ \t]*(\d+(?:\.\d+)?)").expect("valid regex"));
static NOISE_CURRENCY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[¥￥]\s*\d").expect("valid regex"));
static NOISE_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("valid regex"));
static NOISE_PROMO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"已售|好评|券|包邮|关注|对比|搜同款").expect("valid regex"));
static SALES_UNIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+[万千百]").expect("valid regex"));
static SALES_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"已售([\d万千百]+[+\-]?)").expect("valid regex"));
static PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+%)").expect("valid regex"));
static RATING_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+%)好评").expect("valid regex"));
static NUMERIC_DETAIL_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\d+\.html").expect("valid regex"));

static TITLED: Lazy<Selector> = Lazy::new(|| Selector::parse("[title]").expect("valid selector"));
static LABELLED_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img[alt], img[title]").expect("valid selector"));
static ANY_HREF: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

const SOLD_MARKER: &str = "已售";
const RATING_MARKER: &str = "好评";

/// Everything a field strategy may look at for one card.
struct CardContext<'a> {
    card: ElementRef<'a>,
    /// The card's rendered text, computed once.
    text: String,
    profile: &'a CompiledProfile,
    limits: &'a Thresholds,
    platform: Platform,
    base: Option<&'a Url>,
}

type FieldFn = fn(&CardContext<'_>) -> Option<String>;

const TITLE: &[Strategy<FieldFn>] = &[
    Strategy {
        name: "title selectors",
        run: title_from_selectors,
    },
    Strategy {
        name: "title attributes",
        run: title_from_attributes,
    },
    Strategy {
        name: "card text lines",
        run: title_from_text_lines,
    },
];

const PRICE: &[Strategy<FieldFn>] = &[
    Strategy {
        name: "split price",
        run: price_from_split_parts,
    },
    Strategy {
        name: "price selectors",
        run: price_from_selectors,
    },
    Strategy {
        name: "line-leading currency",
        run: price_from_card_lines,
    },
];

const SHOP: &[Strategy<FieldFn>] = &[Strategy {
    name: "shop selectors",
    run: shop_from_selectors,
}];

const SALES: &[Strategy<FieldFn>] = &[
    Strategy {
        name: "sales selectors",
        run: sales_from_selectors,
    },
    Strategy {
        name: "sold marker in text",
        run: sales_from_text,
    },
];

const RATING: &[Strategy<FieldFn>] = &[
    Strategy {
        name: "rating selectors",
        run: rating_from_selectors,
    },
    Strategy {
        name: "rating marker in text",
        run: rating_from_text,
    },
];

const LINK: &[Strategy<FieldFn>] = &[
    Strategy {
        name: "product link selectors",
        run: link_from_selectors,
    },
    Strategy {
        name: "card anchor",
        run: link_from_card_anchor,
    },
    Strategy {
        name: "product-looking href",
        run: link_from_any_href,
    },
    Strategy {
        name: "id attribute",
        run: link_from_id_attribute,
    },
];

fn resolve(chain: &[Strategy<FieldFn>], cx: &CardContext<'_>) -> Option<Resolved<String>> {
    first_success(chain, |run| run(cx))
}

fn first_text(card: ElementRef, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        let element = card.select(selector).next()?;
        let text = collapse_whitespace(&inner_text(element));
        (!text.is_empty()).then_some(text)
    })
}

fn title_from_selectors(cx: &CardContext<'_>) -> Option<String> {
    cx.profile.titles.iter().find_map(|selector| {
        let element = cx.card.select(selector).next()?;
        let text = collapse_whitespace(&inner_text(element));
        (char_len(&text) > cx.limits.min_title_chars).then_some(text)
    })
}

fn title_from_attributes(cx: &CardContext<'_>) -> Option<String> {
    let long_enough = |value: &str| {
        let value = collapse_whitespace(value);
        (char_len(&value) > cx.limits.min_title_chars).then_some(value)
    };
    let titled = cx
        .card
        .select(&TITLED)
        .next()
        .and_then(|element| element.value().attr("title"))
        .and_then(long_enough);
    titled.or_else(|| {
        let image = cx.card.select(&LABELLED_IMAGE).next()?;
        let label = image
            .value()
            .attr("alt")
            .filter(|alt| !alt.trim().is_empty())
            .or_else(|| image.value().attr("title"))?;
        long_enough(label)
    })
}

fn title_from_text_lines(cx: &CardContext<'_>) -> Option<String> {
    cx.text
        .lines()
        .map(str::trim)
        .filter(|line| char_len(line) > cx.limits.min_title_chars)
        .find(|line| !is_noise_line(line))
        .map(|line| truncate_chars(line, cx.limits.max_title_chars))
}

fn is_noise_line(line: &str) -> bool {
    NOISE_CURRENCY.is_match(line) || NOISE_INTEGER.is_match(line) || NOISE_PROMO.is_match(line)
}

fn price_from_split_parts(cx: &CardContext<'_>) -> Option<String> {
    let integer = first_text(cx.card, &cx.profile.price_ints)?;
    let fraction = first_text(cx.card, &cx.profile.price_fractions).unwrap_or_default();
    Some(format!("{integer}{fraction}"))
}

fn price_from_selectors(cx: &CardContext<'_>) -> Option<String> {
    cx.profile.prices.iter().find_map(|selector| {
        let element = cx.card.select(selector).next()?;
        let text = inner_text(element);
        if !PRICE_LIKE.is_match(&text) {
            return None;
        }
        numeral_in(&text)
    })
}

fn numeral_in(text: &str) -> Option<String> {
    CURRENCY_NUMERAL
        .captures(text)
        .or_else(|| BARE_NUMERAL.captures(text))
        .map(|captures| captures[1].to_string())
}

/// Only a currency glyph opening a line counts, so coupon text such as
/// "满300减¥20" is never read as the price.
fn price_from_card_lines(cx: &CardContext<'_>) -> Option<String> {
    LINE_START_PRICE
        .captures(&cx.text)
        .map(|captures| captures[1].to_string())
}

/// Keeps digits and dots and collapses extra dots into the first one.
pub fn clean_price(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect();
    let mut parts = kept.split('.');
    let head = parts.next().unwrap_or_default();
    let tail: String = parts.collect();
    let cleaned = if kept.contains('.') {
        format!("{head}.{tail}")
    } else {
        head.to_string()
    };
    if cleaned.chars().any(|ch| ch.is_ascii_digit()) {
        cleaned
    } else {
        UNKNOWN.to_string()
    }
}

fn shop_from_selectors(cx: &CardContext<'_>) -> Option<String> {
    first_text(cx.card, &cx.profile.shops)
}

fn sales_from_selectors(cx: &CardContext<'_>) -> Option<String> {
    cx.profile.sales.iter().find_map(|selector| {
        let element = cx.card.select(selector).next()?;
        let value = match element.value().attr("title") {
            Some(title) if title.contains(SOLD_MARKER) => title.replace(SOLD_MARKER, ""),
            _ => {
                let text = collapse_whitespace(&inner_text(element));
                if !(text.contains('售') || SALES_UNIT.is_match(&text)) {
                    return None;
                }
                text.replace(SOLD_MARKER, "")
            }
        };
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn sales_from_text(cx: &CardContext<'_>) -> Option<String> {
    SALES_IN_TEXT
        .captures(&cx.text)
        .map(|captures| captures[1].to_string())
}

fn rating_from_selectors(cx: &CardContext<'_>) -> Option<String> {
    cx.profile.ratings.iter().find_map(|selector| {
        let element = cx.card.select(selector).next()?;
        let source = match element.value().attr("title") {
            Some(title) if title.contains(RATING_MARKER) => title.to_string(),
            _ => {
                let text = collapse_whitespace(&inner_text(element));
                if !(text.contains('%') || text.contains(RATING_MARKER)) {
                    return None;
                }
                text
            }
        };
        let value = match PERCENT.captures(&source) {
            Some(captures) => captures[1].to_string(),
            None => source.replace(RATING_MARKER, "").trim().to_string(),
        };
        (!value.is_empty()).then_some(value)
    })
}

fn rating_from_text(cx: &CardContext<'_>) -> Option<String> {
    RATING_IN_TEXT
        .captures(&cx.text)
        .map(|captures| captures[1].to_string())
}

fn normalized(cx: &CardContext<'_>, href: &str) -> Option<String> {
    normalize_link(href, cx.platform, cx.profile, cx.base)
}

fn link_from_selectors(cx: &CardContext<'_>) -> Option<String> {
    cx.profile.links.iter().find_map(|selector| {
        cx.card
            .select(selector)
            .filter_map(|anchor| anchor.value().attr("href"))
            .filter(|href| !href.trim().is_empty() && !cx.profile.is_excluded_href(href))
            .find_map(|href| normalized(cx, href))
    })
}

fn link_from_card_anchor(cx: &CardContext<'_>) -> Option<String> {
    if cx.card.value().name() != "a" {
        return None;
    }
    let href = cx.card.value().attr("href")?;
    if !cx.profile.is_product_href(href) || cx.profile.is_excluded_href(href) {
        return None;
    }
    normalized(cx, href)
}

fn link_from_any_href(cx: &CardContext<'_>) -> Option<String> {
    cx.card
        .select(&ANY_HREF)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| {
            !cx.profile.is_excluded_href(href)
                && !href.trim_start().to_ascii_lowercase().starts_with("javascript:")
                && (cx.profile.is_product_href(href) || NUMERIC_DETAIL_PATH.is_match(href))
        })
        .find_map(|href| normalized(cx, href))
}

fn link_from_id_attribute(cx: &CardContext<'_>) -> Option<String> {
    recoverable_id(cx).map(|id| cx.profile.detail_url(&id))
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Numeric product id carried by the card, an anchored ancestor, or a
/// descendant.
fn recoverable_id(cx: &CardContext<'_>) -> Option<String> {
    let holders = &cx.profile.id_holders;
    let numeric = |value: Option<&str>| {
        value
            .map(str::trim)
            .filter(|value| is_numeric(value))
            .map(str::to_string)
    };

    let on_card = holders
        .iter()
        .find_map(|holder| numeric(cx.card.value().attr(&holder.name)));
    let on_ancestor = || {
        let anchor = cx.profile.anchor.as_ref()?;
        let ancestor = closest(cx.card, &anchor.selector)?;
        numeric(ancestor.value().attr(&anchor.name))
    };
    let on_descendant = || {
        holders.iter().find_map(|holder| {
            cx.card
                .select(&holder.selector)
                .find_map(|element| numeric(element.value().attr(&holder.name)))
        })
    };
    on_card.or_else(on_ancestor).or_else(on_descendant)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CardError {
    #[error("card {index} produced an invalid link {link:?}: {message}")]
    InvalidLink {
        index: usize,
        link: String,
        message: String,
    },
}

/// Items extracted from one page of cards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageExtraction {
    pub items: Vec<Item>,
    /// Item-id of the first card, whether or not it produced an item.
    pub signature: Option<String>,
    pub rejected: usize,
    pub failed: usize,
}

pub struct FieldExtractor<'a> {
    profile: &'a CompiledProfile,
    limits: &'a Thresholds,
    platform: Platform,
    base: Option<Url>,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(
        profile: &'a CompiledProfile,
        limits: &'a Thresholds,
        platform: Platform,
        page_url: &str,
    ) -> Self {
        Self {
            profile,
            limits,
            platform,
            base: Url::parse(page_url).ok(),
        }
    }

    /// Extracts every card; rejected and failing cards are logged and skipped.
    pub fn extract_page(&self, cards: &[ElementRef]) -> PageExtraction {
        let mut page = PageExtraction::default();
        for (index, card) in cards.iter().enumerate() {
            match self.extract_card(*card, index) {
                Ok(Some(item)) => page.items.push(item),
                Ok(None) => page.rejected += 1,
                Err(err) => {
                    scout_warn!("Skipping card: {}", err);
                    page.failed += 1;
                }
            }
        }
        page.signature = cards.first().and_then(|card| self.card_id(*card));
        scout_debug!(
            "Extracted {} items from {} cards ({} rejected, {} failed)",
            page.items.len(),
            cards.len(),
            page.rejected,
            page.failed
        );
        page
    }

    /// Product id carried by the card's link, else by its id attributes.
    pub fn card_id(&self, card: ElementRef) -> Option<String> {
        let cx = self.context(card);
        resolve(LINK, &cx)
            .and_then(|link| self.platform.item_id(&link.value))
            .or_else(|| recoverable_id(&cx))
    }

    fn context<'c>(&'c self, card: ElementRef<'c>) -> CardContext<'c> {
        CardContext {
            card,
            text: inner_text(card),
            profile: self.profile,
            limits: self.limits,
            platform: self.platform,
            base: self.base.as_ref(),
        }
    }

    /// `Ok(None)` when the card has neither a title, a usable link, nor a
    /// product id.
    pub fn extract_card(&self, card: ElementRef, index: usize) -> Result<Option<Item>, CardError> {
        let cx = self.context(card);

        let title = resolve(TITLE, &cx);
        let price = resolve(PRICE, &cx);
        let shop = resolve(SHOP, &cx);
        let link = resolve(LINK, &cx);
        let id = recoverable_id(&cx);
        let (sales, rating) = if self.platform.has_engagement_fields() {
            (resolve(SALES, &cx), resolve(RATING, &cx))
        } else {
            (None, None)
        };

        if index < self.limits.debug_card_samples {
            scout_debug!(
                "Card {}: title={:?} price={:?} shop={:?} sales={:?} rating={:?} link={:?}",
                index + 1,
                title,
                price,
                shop,
                sales,
                rating,
                link
            );
        }

        let usable_link = link
            .as_ref()
            .is_some_and(|link| is_usable_link(&link.value, self.limits.min_link_chars));
        if title.is_none() && !usable_link && id.is_none() {
            scout_debug!(
                "Rejected card {} <{} class={:?}>: {:?}",
                index + 1,
                card.value().name(),
                card.value().attr("class").unwrap_or_default(),
                excerpt(card, 200)
            );
            return Ok(None);
        }

        let title = title.map_or_else(|| PLACEHOLDER_TITLE.to_string(), |t| t.value);
        let link = link
            .map(|resolved| resolved.value)
            .or_else(|| {
                (title != PLACEHOLDER_TITLE)
                    .then(|| search_link(self.profile, &title, self.limits.search_title_chars))
                    .flatten()
            })
            .unwrap_or_else(|| self.platform.canonical_host().to_string());
        if let Err(err) = Url::parse(&link) {
            return Err(CardError::InvalidLink {
                index,
                link,
                message: err.to_string(),
            });
        }

        let mut item = Item::new(
            title,
            price.map_or_else(|| UNKNOWN.to_string(), |p| clean_price(&p.value)),
            link,
        );
        if let Some(shop) = shop {
            item = item.with_shop(shop.value);
        }
        if self.platform.has_engagement_fields() {
            item = item.with_engagement(
                sales.map_or_else(|| UNKNOWN.to_string(), |s| s.value),
                rating.map_or_else(|| UNKNOWN.to_string(), |r| r.value),
            );
        }
        Ok(Some(item))
    }
}
