use std::fs;

use pretty_assertions::assert_eq;
use scout_core::{Item, JobSettings, Platform};
use scout_engine::{keys, FileStore, JobStore, KeyValueStore, MemoryStore, StoreError, STORE_FILE};
use serde_json::json;
use tempfile::TempDir;

fn jd_item(sku: u64, query: &str) -> Item {
    Item::new(
        format!("商品标题 {sku} 号款"),
        "99.00",
        format!("https://item.jd.com/{sku}.html{query}"),
    )
    .with_engagement("100+", "97%")
}

#[test]
fn empty_store_has_no_job() {
    let store = JobStore::new(MemoryStore::new());
    assert_eq!(store.load_job().unwrap(), None);
    assert!(store.load_items(Platform::Taobao).unwrap().is_empty());
}

#[test]
fn reset_positions_a_fresh_job() {
    let mut store = JobStore::new(MemoryStore::new());
    store
        .commit_page(Platform::Jd, vec![jd_item(1, "")], Some("1".into()))
        .unwrap();

    let job = store
        .reset(JobSettings::new(Platform::Jd, 4).with_delays(1, 2))
        .unwrap();
    assert_eq!(job.current_page, 1);
    assert_eq!(store.load_job().unwrap(), Some(job));
    assert!(store.load_items(Platform::Jd).unwrap().is_empty());
    assert_eq!(store.inner().get(keys::LAST_PAGE_SIGNATURE).unwrap(), Some(json!(null)));
    assert_eq!(store.inner().get(keys::PAGE_LIMIT).unwrap(), Some(json!(4)));
}

#[test]
fn commit_page_merges_and_records_the_signature() {
    let mut store = JobStore::new(MemoryStore::new());
    store.reset(JobSettings::new(Platform::Jd, 3)).unwrap();

    let first = store
        .commit_page(Platform::Jd, vec![jd_item(1, ""), jd_item(2, "")], Some("1".into()))
        .unwrap();
    assert_eq!(first.added, 2);

    let second = store
        .commit_page(
            Platform::Jd,
            vec![jd_item(2, "?spm=x"), jd_item(3, "")],
            Some("2".into()),
        )
        .unwrap();
    assert_eq!((second.added, second.skipped), (1, 1));

    let job = store.load_job().unwrap().unwrap();
    assert_eq!(job.accumulated_items.len(), 3);
    assert_eq!(job.last_page_signature_id.as_deref(), Some("2"));

    // Committing the same page again changes nothing.
    let again = store
        .commit_page(Platform::Jd, vec![jd_item(3, "")], Some("2".into()))
        .unwrap();
    assert_eq!(again.added, 0);
    assert_eq!(store.load_items(Platform::Jd).unwrap().len(), 3);
}

#[test]
fn items_are_kept_per_platform() {
    let mut store = JobStore::new(MemoryStore::new());
    store
        .commit_page(Platform::Jd, vec![jd_item(1, "")], None)
        .unwrap();
    assert!(store.load_items(Platform::Taobao).unwrap().is_empty());
    assert_eq!(store.load_items(Platform::Jd).unwrap().len(), 1);
}

#[test]
fn file_store_survives_a_new_instance() {
    let temp = TempDir::new().unwrap();
    let mut store = JobStore::new(FileStore::in_dir(temp.path()));
    store.reset(JobSettings::new(Platform::Taobao, 2)).unwrap();
    store.set_current_page(2).unwrap();

    let reopened = JobStore::new(FileStore::in_dir(temp.path()));
    let job = reopened.load_job().unwrap().unwrap();
    assert_eq!(job.platform, Platform::Taobao);
    assert_eq!(job.current_page, 2);
    assert!(job.is_mid_job());

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join(STORE_FILE)).unwrap()).unwrap();
    assert_eq!(raw["platform"], "taobao");
    assert_eq!(raw["accumulatedItems.taobao"], json!([]));
}

#[test]
fn file_store_creates_its_directory() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("state").join("scout");
    let mut store = FileStore::in_dir(&dir);
    store
        .set_many(vec![("currentPage".to_string(), json!(3))])
        .unwrap();
    assert_eq!(store.get("currentPage").unwrap(), Some(json!(3)));
    assert!(store.path().starts_with(&dir));
}

#[test]
fn corrupt_store_file_is_reported() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(STORE_FILE), "{not json").unwrap();
    let store = FileStore::in_dir(temp.path());
    assert!(matches!(store.get("platform"), Err(StoreError::Parse { .. })));
}

#[test]
fn wrongly_shaped_value_names_its_key() {
    let mut inner = MemoryStore::new();
    inner
        .set_many(vec![
            ("platform".to_string(), json!("jd")),
            ("currentPage".to_string(), json!("three")),
        ])
        .unwrap();
    let err = JobStore::new(inner).load_job().unwrap_err();
    assert!(matches!(err, StoreError::Shape { ref key, .. } if key == keys::CURRENT_PAGE));
}
