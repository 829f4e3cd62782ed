use pretty_assertions::assert_eq;
use scout_core::{dedupe_for_export, is_same_item, merge_unique, Item, Platform};

fn jd(title: &str, link: &str) -> Item {
    Item::new(title, "19.90", link).with_engagement("unknown", "unknown")
}

#[test]
fn merging_an_already_merged_page_adds_nothing() {
    let page = vec![
        jd("耳机", "https://item.jd.com/100.html"),
        jd("键盘", "https://item.jd.com/200.html"),
    ];
    let first = merge_unique(Vec::new(), page.clone(), Platform::Jd);
    assert_eq!(first.added, 2);

    let second = merge_unique(first.items.clone(), page, Platform::Jd);
    assert_eq!(second.added, 0);
    assert_eq!(second.skipped, 2);
    assert_eq!(second.items, first.items);
}

#[test]
fn same_id_with_different_links_is_one_product() {
    let existing = vec![jd("耳机", "https://item.jd.com/100.html")];
    let fresh = vec![jd("耳机 新款", "https://item.m.jd.com/product/100.html?from=search")];

    let outcome = merge_unique(existing.clone(), fresh, Platform::Jd);
    assert_eq!(outcome.added, 0);
    assert_eq!(outcome.items, existing);
}

#[test]
fn existing_entries_keep_their_order() {
    let existing = vec![
        jd("a", "https://item.jd.com/3.html"),
        jd("b", "https://item.jd.com/1.html"),
    ];
    let fresh = vec![
        jd("c", "https://item.jd.com/2.html"),
        jd("b again", "https://item.jd.com/1.html"),
    ];

    let outcome = merge_unique(existing, fresh, Platform::Jd);
    let titles: Vec<&str> = outcome.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["a", "b", "c"]);
    assert_eq!(outcome.added, 1);
    assert_eq!(outcome.skipped, 1);
}

#[test]
fn duplicates_within_one_page_are_collapsed() {
    let fresh = vec![
        jd("x", "https://item.jd.com/5.html"),
        jd("x", "https://item.jd.com/5.html"),
    ];
    let outcome = merge_unique(Vec::new(), fresh, Platform::Jd);
    assert_eq!(outcome.items.len(), 1);
}

#[test]
fn links_without_ids_compare_by_exact_link() {
    let a = Item::new("a", "1", "https://s.taobao.com/search?q=a");
    let b = Item::new("b", "1", "https://s.taobao.com/search?q=a");
    let c = Item::new("c", "1", "https://s.taobao.com/search?q=c");

    assert!(is_same_item(&a, &b, Platform::Taobao));
    assert!(!is_same_item(&a, &c, Platform::Taobao));
}

#[test]
fn taobao_ids_ignore_tracking_parameters() {
    let a = Item::new("a", "1", "https://item.taobao.com/item.htm?id=42&spm=1");
    let b = Item::new("b", "1", "https://detail.tmall.com/item.htm?spm=2&id=42");
    assert!(is_same_item(&a, &b, Platform::Taobao));
}

#[test]
fn export_dedup_keeps_first_occurrence() {
    let items = vec![
        jd("first", "https://x/1"),
        jd("second", "https://x/1?spm=foo"),
        jd("third", "https://x/2"),
    ];

    let unique = dedupe_for_export(&items, Platform::Jd);
    let titles: Vec<&str> = unique.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "third"]);
    assert_eq!(dedupe_for_export(&unique, Platform::Jd), unique);
}
