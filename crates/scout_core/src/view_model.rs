use crate::{Phase, Platform};

/// Snapshot of pass progress for status lines and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassViewModel {
    pub platform: Platform,
    pub current_page: u32,
    pub page_limit: u32,
    pub phase: Phase,
    pub cards_on_page: usize,
    pub added_on_page: usize,
    pub collected: usize,
}

impl PassViewModel {
    pub fn summary(&self) -> String {
        format!(
            "{} page {}/{} {:?}: {} cards, {} new, {} collected",
            self.platform,
            self.current_page,
            self.page_limit,
            self.phase,
            self.cards_on_page,
            self.added_on_page,
            self.collected
        )
    }
}
