use scout_core::Platform;
use url::Url;

use crate::profile::CompiledProfile;

/// Resolves a raw href into an absolute link.
///
/// Protocol-relative links get `https:`, root-relative links the platform's
/// canonical host, anything else relative is joined onto `base` when known.
/// Fragment-only, query-only and `javascript:` references are dropped.
pub fn resolve_href(raw: &str, platform: Platform, base: Option<&Url>) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with('?') || lower.starts_with("javascript:") {
        return None;
    }
    if let Some(rest) = trimmed.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    if trimmed.starts_with('/') {
        return Some(format!("{}{}", platform.canonical_host(), trimmed));
    }
    if Url::parse(trimmed).is_ok() {
        return Some(trimmed.to_string());
    }
    base.and_then(|base| base.join(trimmed).ok())
        .map(String::from)
}

/// Strips query and fragment from detail links on canonical hosts, where the
/// product id lives in the path.
pub fn canonicalize(link: String, profile: &CompiledProfile) -> String {
    let Ok(url) = Url::parse(&link) else {
        return link;
    };
    let canonical = url.host_str().is_some_and(|host| {
        profile
            .data
            .canonical_detail_hosts
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(host))
    });
    if !canonical {
        return link;
    }
    match link.find(['?', '#']) {
        Some(cut) => link[..cut].to_string(),
        None => link,
    }
}

/// Full normalization applied to every extracted link.
pub fn normalize_link(
    raw: &str,
    platform: Platform,
    profile: &CompiledProfile,
    base: Option<&Url>,
) -> Option<String> {
    resolve_href(raw, platform, base).map(|link| canonicalize(link, profile))
}

/// A link good enough to keep a card without a recovered title.
pub fn is_usable_link(link: &str, min_chars: usize) -> bool {
    !link.trim_start().to_ascii_lowercase().starts_with("javascript:")
        && link.chars().count() > min_chars
}

/// Search URL for the first `max_chars` characters of a title.
pub fn search_link(profile: &CompiledProfile, title: &str, max_chars: usize) -> Option<String> {
    let keyword: String = title.chars().take(max_chars).collect();
    Url::parse_with_params(
        &profile.data.search_url,
        &[(profile.data.search_param.as_str(), keyword.as_str())],
    )
    .ok()
    .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::SiteProfile;

    #[test]
    fn protocol_and_root_relative_links_become_absolute() {
        assert_eq!(
            resolve_href("//item.jd.com/1.html", Platform::Jd, None).as_deref(),
            Some("https://item.jd.com/1.html")
        );
        assert_eq!(
            resolve_href("/product/9.html", Platform::Jd, None).as_deref(),
            Some("https://www.jd.com/product/9.html")
        );
        assert_eq!(resolve_href("javascript:void(0)", Platform::Jd, None), None);
        assert_eq!(resolve_href("#top", Platform::Jd, None), None);
    }

    #[test]
    fn relative_links_join_the_page_url() {
        let base = Url::parse("https://search.jd.com/Search?keyword=a").unwrap();
        assert_eq!(
            resolve_href("list?page=2", Platform::Jd, Some(&base)).as_deref(),
            Some("https://search.jd.com/list?page=2")
        );
    }

    #[test]
    fn canonical_detail_links_lose_their_query() {
        let jd = SiteProfile::jd().compile().unwrap();
        assert_eq!(
            normalize_link("//item.jd.com/100.html?spm=x#c", Platform::Jd, &jd, None).as_deref(),
            Some("https://item.jd.com/100.html")
        );
        let taobao = SiteProfile::taobao().compile().unwrap();
        assert_eq!(
            normalize_link("//item.taobao.com/item.htm?id=7", Platform::Taobao, &taobao, None)
                .as_deref(),
            Some("https://item.taobao.com/item.htm?id=7")
        );
    }

    #[test]
    fn search_link_encodes_truncated_title() {
        let jd = SiteProfile::jd().compile().unwrap();
        let link = search_link(&jd, "无线蓝牙耳机 降噪 长续航 运动 跑步 专用 高清通话", 5).unwrap();
        let url = Url::parse(&link).unwrap();
        assert_eq!(url.host_str(), Some("search.jd.com"));
        let keyword = url.query_pairs().find(|(k, _)| k == "keyword").unwrap().1;
        assert_eq!(keyword, "无线蓝牙耳");
    }
}
