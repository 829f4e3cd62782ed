//! Scout core: domain types, dedup rules and the pure scrape-pass state machine.
mod dedup;
mod delay;
mod effect;
mod item;
mod msg;
mod platform;
mod state;
mod update;
mod view_model;

pub use dedup::{dedupe_for_export, is_same_item, merge_unique, MergeOutcome};
pub use delay::DelayWindow;
pub use effect::{Effect, FinishReason, HaltReason};
pub use item::{Item, PLACEHOLDER_TITLE, UNKNOWN};
pub use msg::Msg;
pub use platform::{Platform, UnknownPlatform};
pub use state::{JobSettings, JobState, PassState, Phase, SettingsError};
pub use update::update;
pub use view_model::PassViewModel;
