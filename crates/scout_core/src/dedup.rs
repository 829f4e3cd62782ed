use crate::{Item, Platform};

/// Result of merging one page of items into the accumulated list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub items: Vec<Item>,
    pub added: usize,
    pub skipped: usize,
}

/// Two items are the same product when both carry an item-id and the ids are
/// equal, or, when either id is missing, when their links are identical.
pub fn is_same_item(a: &Item, b: &Item, platform: Platform) -> bool {
    same_key(&key_of(a, platform), &key_of(b, platform))
}

/// Appends the items of `fresh` that are not already present in `existing`
/// (or earlier in `fresh`). Existing entries are never removed or reordered.
pub fn merge_unique(
    existing: Vec<Item>,
    fresh: impl IntoIterator<Item = Item>,
    platform: Platform,
) -> MergeOutcome {
    let mut keys: Vec<DedupKey> = existing.iter().map(|item| key_of(item, platform)).collect();
    let mut items = existing;
    let mut added = 0;
    let mut skipped = 0;

    for item in fresh {
        let key = key_of(&item, platform);
        if keys.iter().any(|seen| same_key(seen, &key)) {
            skipped += 1;
            continue;
        }
        keys.push(key);
        items.push(item);
        added += 1;
    }

    MergeOutcome {
        items,
        added,
        skipped,
    }
}

/// Rebuilds uniqueness from scratch, keeping the first occurrence of each
/// product. Running it on its own output is a no-op.
pub fn dedupe_for_export(items: &[Item], platform: Platform) -> Vec<Item> {
    merge_unique(Vec::new(), items.iter().cloned(), platform).items
}

struct DedupKey {
    id: Option<String>,
    link: String,
}

fn key_of(item: &Item, platform: Platform) -> DedupKey {
    DedupKey {
        id: item.item_id(platform),
        link: item.link.clone(),
    }
}

fn same_key(a: &DedupKey, b: &DedupKey) -> bool {
    match (&a.id, &b.id) {
        (Some(left), Some(right)) => left == right,
        _ => a.link == b.link,
    }
}
