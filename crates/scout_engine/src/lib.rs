//! Scout engine: DOM heuristics, page driving, persistence and export.
mod config;
mod decode;
mod export;
mod fetch;
mod fields;
mod http_page;
mod links;
mod loader;
mod locator;
mod notify;
mod page;
mod pagination;
mod persist;
mod profile;
mod runner;
mod store;
mod strategy;
mod text;
mod wait;

pub use config::{ScoutConfig, Thresholds, Timings};
pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use export::{export_filename, render_csv, write_csv, ExportError, ExportSummary};
pub use fetch::{FailureKind, FetchError, FetchOutput, FetchSettings, Fetcher, ReqwestFetcher};
pub use fields::{clean_price, CardError, FieldExtractor, PageExtraction};
pub use http_page::HttpPage;
pub use links::{canonicalize, is_usable_link, normalize_link, resolve_href, search_link};
pub use loader::{LoadReport, ScrollDriver};
pub use locator::{CardLocator, CardSelection, CardSource};
pub use notify::{ChannelNotifier, Notifier, ScoutMessage};
pub use page::{ClickMethod, ElementPath, Page, PageError};
pub use pagination::{find_next_control, rewrite_page_url, NextControl, NextTarget};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use profile::{AttrSelector, CompiledProfile, NamedSelector, ProfileError, SiteProfile};
pub use runner::{PassOutcome, Scout, ScoutError};
pub use store::{keys, FileStore, JobStore, KeyValueStore, MemoryStore, StoreError, STORE_FILE};
pub use strategy::{first_success, Resolved, Strategy};
pub use text::{closest, collapse_whitespace, inner_text};
pub use wait::{document_has, settle, wait_for_selector, wait_until};
