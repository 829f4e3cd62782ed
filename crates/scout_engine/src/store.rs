//! Persisted job state: a flat key-value store of JSON values and the typed
//! job layer on top of it.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use scout_core::{merge_unique, Item, JobSettings, JobState, MergeOutcome, Platform};
use scout_logging::{scout_debug, scout_info};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::persist::{AtomicFileWriter, PersistError};

pub const STORE_FILE: &str = "scout_store.json";

pub mod keys {
    pub const PLATFORM: &str = "platform";
    pub const PAGE_LIMIT: &str = "pageLimit";
    pub const CURRENT_PAGE: &str = "currentPage";
    pub const MIN_DELAY: &str = "minDelay";
    pub const MAX_DELAY: &str = "maxDelay";
    pub const LAST_PAGE_SIGNATURE: &str = "lastPageSignatureId";
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("store file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("value under {key:?} has the wrong shape: {source}")]
    Shape {
        key: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Write(#[from] PersistError),
}

/// String keys, JSON values. `set_many` applies all entries in one write.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn set_many(&mut self, entries: Vec<(String, Value)>) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set_many(&mut self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        self.values.extend(entries);
        Ok(())
    }
}

/// One JSON object on disk, re-read on every access and replaced atomically.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    writer: AtomicFileWriter,
}

impl FileStore {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            path: dir.join(STORE_FILE),
            writer: AtomicFileWriter::new(dir),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_many(&mut self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        let mut values = self.read_all()?;
        values.extend(entries);
        let body = serde_json::to_vec_pretty(&values).map_err(|source| StoreError::Shape {
            key: STORE_FILE.to_string(),
            source,
        })?;
        self.writer.write(STORE_FILE, &body)?;
        Ok(())
    }
}

/// Typed access to the job record.
pub struct JobStore<S> {
    store: S,
}

impl<S: KeyValueStore> JobStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn typed<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.store.get(key)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StoreError::Shape {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    /// `None` when no job was ever started.
    pub fn load_job(&self) -> Result<Option<JobState>, StoreError> {
        let Some(platform) = self.typed::<Platform>(keys::PLATFORM)? else {
            return Ok(None);
        };
        let mut settings = JobSettings::new(platform, 1);
        if let Some(limit) = self.typed(keys::PAGE_LIMIT)? {
            settings.page_limit = limit;
        }
        if let Some(min) = self.typed(keys::MIN_DELAY)? {
            settings.min_delay = min;
        }
        if let Some(max) = self.typed(keys::MAX_DELAY)? {
            settings.max_delay = max;
        }
        let mut job = JobState::start(settings);
        job.current_page = self.typed(keys::CURRENT_PAGE)?.unwrap_or(1);
        job.accumulated_items = self.load_items(platform)?;
        job.last_page_signature_id = self.typed(keys::LAST_PAGE_SIGNATURE)?;
        Ok(Some(job))
    }

    /// Starts a new search: page 1, no items for the platform, no signature.
    pub fn reset(&mut self, settings: JobSettings) -> Result<JobState, StoreError> {
        let job = JobState::start(settings);
        self.store.set_many(vec![
            (keys::PLATFORM.to_string(), json!(job.platform)),
            (keys::PAGE_LIMIT.to_string(), json!(job.page_limit)),
            (keys::CURRENT_PAGE.to_string(), json!(job.current_page)),
            (keys::MIN_DELAY.to_string(), json!(job.min_delay)),
            (keys::MAX_DELAY.to_string(), json!(job.max_delay)),
            (job.platform.items_key(), json!([])),
            (keys::LAST_PAGE_SIGNATURE.to_string(), Value::Null),
        ])?;
        scout_info!(
            "New {} job: {} pages, delay {}-{}s",
            job.platform,
            job.page_limit,
            job.min_delay,
            job.max_delay
        );
        Ok(job)
    }

    pub fn load_items(&self, platform: Platform) -> Result<Vec<Item>, StoreError> {
        Ok(self.typed(&platform.items_key())?.unwrap_or_default())
    }

    /// Merges one page into the accumulated items and records its signature
    /// in a single write.
    pub fn commit_page(
        &mut self,
        platform: Platform,
        fresh: Vec<Item>,
        signature: Option<String>,
    ) -> Result<MergeOutcome, StoreError> {
        let existing = self.load_items(platform)?;
        let outcome = merge_unique(existing, fresh, platform);
        self.store.set_many(vec![
            (platform.items_key(), json!(outcome.items)),
            (keys::LAST_PAGE_SIGNATURE.to_string(), json!(signature)),
        ])?;
        scout_info!(
            "New unique items added: {} ({} duplicates, {} total)",
            outcome.added,
            outcome.skipped,
            outcome.items.len()
        );
        Ok(outcome)
    }

    pub fn set_current_page(&mut self, page: u32) -> Result<(), StoreError> {
        scout_debug!("Persisting current page {}", page);
        self.store
            .set_many(vec![(keys::CURRENT_PAGE.to_string(), json!(page))])
    }
}
