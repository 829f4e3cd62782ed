use crate::{DelayWindow, Item, Platform};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Progress text for the controlling UI.
    Status(String),
    /// Blocking notice the user must acknowledge.
    Notice(String),
    /// Stabilize the page and locate product cards.
    LocateCards,
    /// Extract items from the located cards.
    ExtractItems,
    /// Merge the page's items into the persisted list together with the
    /// page signature, before any navigation.
    PersistPage {
        items: Vec<Item>,
        signature: Option<String>,
    },
    /// The first card matches the previous page's first card.
    StaleSignature { signature: String },
    /// Search the page for a control leading to `next_page`.
    LocateNextControl { next_page: u32 },
    PersistCurrentPage { page: u32 },
    /// Sleep for a duration sampled from the window.
    WaitJitter(DelayWindow),
    ActivateNextControl,
    /// Wait for the next page to settle; the next pass begins there.
    AwaitNavigation { page: u32 },
    /// Report the accumulated items; the job is complete.
    Finish {
        items: Vec<Item>,
        platform: Platform,
        reason: FinishReason,
    },
    Halt(HaltReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    PageLimitReached,
    NoNextControl,
    EmptyPage,
    ActivationFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    NoCardsOnFirstPage,
}
