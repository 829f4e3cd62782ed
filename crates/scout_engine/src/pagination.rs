//! Locating the control that leads to the next result page.

use once_cell::sync::Lazy;
use scout_core::Platform;
use scout_logging::{scout_debug, scout_info};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::links::resolve_href;
use crate::page::ElementPath;
use crate::profile::CompiledProfile;
use crate::strategy::{first_success, Strategy};
use crate::text::{collapse_whitespace, inner_text};

const NEXT_PHRASES: [&str; 4] = ["下一页", "Next >", ">", "›"];
const NEXT_LABEL: &str = "下一页";
const PAGE_PARAMS: [&str; 3] = ["page", "Page", "p"];

static CONTROL_CANDIDATES: Lazy<Selector> =
    Lazy::new(|| Selector::parse("button, a, span, div, li").expect("valid selector"));
static PAGE_LINKS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a[href*="page="], a[href*="Page="], a[href*="p="]"#).expect("valid selector")
});
static PAGER_BUTTONS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a, button, span, li").expect("valid selector"));
static ANCESTOR_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("valid selector"));

/// What activating the next control means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextTarget {
    /// An element of the current document.
    Element {
        path: ElementPath,
        tag: String,
        /// Absolute href when the element itself is a link.
        href: Option<String>,
        has_onclick: bool,
        /// Href of the nearest enclosing link.
        ancestor_href: Option<String>,
    },
    /// No control found; go straight to a rewritten URL.
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextControl {
    pub strategy: &'static str,
    pub target: NextTarget,
}

struct PageContext<'d> {
    doc: &'d Html,
    profile: &'d CompiledProfile,
    platform: Platform,
    page_url: Option<Url>,
    next_page: u32,
}

impl<'d> PageContext<'d> {
    /// Navigation hrefs are relative to the results page, not the
    /// canonical product host.
    fn resolve(&self, href: &str) -> Option<String> {
        let trimmed = href.trim();
        let lower = trimmed.to_ascii_lowercase();
        if trimmed.is_empty() || lower.starts_with('#') || lower.starts_with("javascript:") {
            return None;
        }
        match &self.page_url {
            Some(base) => base.join(trimmed).ok().map(String::from),
            None => resolve_href(trimmed, self.platform, None),
        }
    }

    fn target(&self, element: ElementRef<'d>) -> NextTarget {
        let href = if element.value().name().eq_ignore_ascii_case("a") {
            element.value().attr("href").and_then(|href| self.resolve(href))
        } else {
            None
        };
        let ancestor_href = element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|ancestor| ANCESTOR_LINK.matches(ancestor))
            .and_then(|link| link.value().attr("href"))
            .and_then(|href| self.resolve(href));
        NextTarget::Element {
            path: ElementPath::of(element),
            tag: element.value().name().to_ascii_lowercase(),
            href,
            has_onclick: element.value().attr("onclick").is_some(),
            ancestor_href,
        }
    }

    fn page_number(&self) -> String {
        self.next_page.to_string()
    }
}

type ControlFn = fn(&PageContext<'_>) -> Option<NextTarget>;

const CASCADE: &[Strategy<ControlFn>] = &[
    Strategy {
        name: "structural selector",
        run: by_structure,
    },
    Strategy {
        name: "next phrasing",
        run: by_phrasing,
    },
    Strategy {
        name: "page-number link",
        run: by_page_number_link,
    },
    Strategy {
        name: "pagination container",
        run: by_pagination_container,
    },
    Strategy {
        name: "url rewrite",
        run: by_url_rewrite,
    },
];

/// Runs the next-control cascade against a snapshot of the page.
pub fn find_next_control(
    doc: &Html,
    page_url: &str,
    next_page: u32,
    profile: &CompiledProfile,
    platform: Platform,
) -> Option<NextControl> {
    let cx = PageContext {
        doc,
        profile,
        platform,
        page_url: Url::parse(page_url).ok(),
        next_page,
    };
    let resolved = first_success(CASCADE, |run| run(&cx))?;
    scout_info!(
        "Next control for page {} found by {}: {:?}",
        next_page,
        resolved.strategy,
        resolved.value
    );
    Some(NextControl {
        strategy: resolved.strategy,
        target: resolved.value,
    })
}

fn visible_text(element: ElementRef) -> String {
    collapse_whitespace(&inner_text(element))
}

fn by_structure(cx: &PageContext<'_>) -> Option<NextTarget> {
    cx.profile.next_controls.iter().find_map(|candidate| {
        let element = cx.doc.select(&candidate.selector).next()?;
        scout_debug!("Next control matched {:?}", candidate.css);
        Some(cx.target(element))
    })
}

fn is_next_phrase(text: &str) -> bool {
    NEXT_PHRASES.contains(&text)
}

fn looks_like_next(element: ElementRef) -> bool {
    let value = element.value();
    let labelled = value
        .attr("aria-label")
        .is_some_and(|label| label == NEXT_LABEL || label.to_ascii_lowercase().contains("next"));
    let classed = value
        .attr("class")
        .is_some_and(|class| class.to_ascii_lowercase().contains("next"));
    labelled || classed || is_next_phrase(&visible_text(element))
}

/// The deepest descendant rendering the same text, so the click lands on the
/// element that owns the handler rather than a wrapper.
fn innermost(element: ElementRef) -> ElementRef {
    let text = visible_text(element);
    let mut current = element;
    while let Some(child) = current
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| visible_text(*child) == text)
    {
        current = child;
    }
    current
}

fn by_phrasing(cx: &PageContext<'_>) -> Option<NextTarget> {
    cx.doc
        .select(&CONTROL_CANDIDATES)
        .find(|element| looks_like_next(*element))
        .map(|element| {
            let target = if is_next_phrase(&visible_text(element)) {
                innermost(element)
            } else {
                element
            };
            cx.target(target)
        })
}

fn query_page(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| PAGE_PARAMS.contains(&&**key))
        .map(|(_, value)| value.into_owned())
}

fn by_page_number_link(cx: &PageContext<'_>) -> Option<NextTarget> {
    let wanted = cx.page_number();
    cx.doc
        .select(&PAGE_LINKS)
        .find(|link| {
            let text = visible_text(*link);
            let points_to_next = link
                .value()
                .attr("href")
                .and_then(|href| cx.resolve(href))
                .and_then(|href| Url::parse(&href).ok())
                .and_then(|url| query_page(&url))
                .is_some_and(|page| page == wanted);
            points_to_next || text == wanted || text == NEXT_LABEL
        })
        .map(|link| cx.target(link))
}

fn by_pagination_container(cx: &PageContext<'_>) -> Option<NextTarget> {
    let wanted = cx.page_number();
    cx.profile.pagination_containers.iter().find_map(|selector| {
        cx.doc.select(selector).find_map(|container| {
            container
                .select(&PAGER_BUTTONS)
                .find(|button| {
                    let text = visible_text(*button);
                    text == NEXT_LABEL || text == wanted || text == ">" || text == "›"
                })
                .map(|button| cx.target(button))
        })
    })
}

/// Rewrites the page query parameter of the current URL, or appends one on
/// the platform's search host.
pub fn rewrite_page_url(current: &Url, next_page: u32, search_host: Option<&str>) -> Option<String> {
    let existing = PAGE_PARAMS.into_iter().find(|param| {
        current
            .query_pairs()
            .any(|(key, _)| key == *param)
    });
    let mut next = current.clone();
    match existing {
        Some(param) => {
            let pairs: Vec<(String, String)> = current
                .query_pairs()
                .map(|(key, value)| {
                    if key == *param {
                        (key.into_owned(), next_page.to_string())
                    } else {
                        (key.into_owned(), value.into_owned())
                    }
                })
                .collect();
            next.query_pairs_mut().clear().extend_pairs(pairs);
        }
        None => {
            let on_search_host = search_host
                .zip(current.host_str())
                .is_some_and(|(wanted, host)| wanted.eq_ignore_ascii_case(host));
            if !on_search_host {
                return None;
            }
            next.query_pairs_mut()
                .append_pair("page", &next_page.to_string());
        }
    }
    (next != *current).then(|| next.to_string())
}

fn by_url_rewrite(cx: &PageContext<'_>) -> Option<NextTarget> {
    let current = cx.page_url.as_ref()?;
    rewrite_page_url(current, cx.next_page, cx.profile.data.search_host.as_deref())
        .map(NextTarget::Url)
}
