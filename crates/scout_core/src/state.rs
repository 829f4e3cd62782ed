use serde::{Deserialize, Serialize};

use crate::view_model::PassViewModel;
use crate::{DelayWindow, Item, Platform};

/// Parameters chosen by the user when starting a new search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSettings {
    pub platform: Platform,
    pub page_limit: u32,
    pub min_delay: u32,
    pub max_delay: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("page limit must be at least 1")]
    PageLimitZero,
    #[error("minimum delay {min}s exceeds maximum delay {max}s")]
    DelayInverted { min: u32, max: u32 },
}

impl JobSettings {
    pub fn new(platform: Platform, page_limit: u32) -> Self {
        let window = DelayWindow::default();
        Self {
            platform,
            page_limit,
            min_delay: window.min_secs,
            max_delay: window.max_secs,
        }
    }

    pub fn with_delays(mut self, min_delay: u32, max_delay: u32) -> Self {
        self.min_delay = min_delay;
        self.max_delay = max_delay;
        self
    }

    pub fn validate(self) -> Result<Self, SettingsError> {
        if self.page_limit == 0 {
            return Err(SettingsError::PageLimitZero);
        }
        if self.min_delay > self.max_delay {
            return Err(SettingsError::DelayInverted {
                min: self.min_delay,
                max: self.max_delay,
            });
        }
        Ok(self)
    }
}

/// The persisted job record, as read at the start of a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobState {
    pub platform: Platform,
    pub page_limit: u32,
    pub current_page: u32,
    pub min_delay: u32,
    pub max_delay: u32,
    pub accumulated_items: Vec<Item>,
    pub last_page_signature_id: Option<String>,
}

impl JobState {
    /// Fresh job positioned on the first result page.
    pub fn start(settings: JobSettings) -> Self {
        Self {
            platform: settings.platform,
            page_limit: settings.page_limit,
            current_page: 1,
            min_delay: settings.min_delay,
            max_delay: settings.max_delay,
            accumulated_items: Vec::new(),
            last_page_signature_id: None,
        }
    }

    pub fn settings(&self) -> JobSettings {
        JobSettings {
            platform: self.platform,
            page_limit: self.page_limit,
            min_delay: self.min_delay,
            max_delay: self.max_delay,
        }
    }

    pub fn delay_window(&self) -> DelayWindow {
        DelayWindow::new(self.min_delay, self.max_delay)
    }

    /// True when a page load should continue a crawl on its own: the job
    /// spans several pages and has already advanced past the first.
    pub fn is_mid_job(&self) -> bool {
        self.page_limit > 1 && self.current_page > 1 && self.current_page <= self.page_limit
    }

    pub fn is_past_limit(&self) -> bool {
        self.current_page > self.page_limit
    }
}

/// Where a scrape pass currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    CheckLimit,
    Locate,
    Extract,
    Persist,
    AdvanceOrFinish,
    Advancing,
    /// Navigation was triggered; the next pass runs on the new page.
    HandedOff,
    Finished,
    Halted,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::HandedOff | Phase::Finished | Phase::Halted)
    }
}

/// State of one scrape pass over the currently loaded page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassState {
    job: JobState,
    phase: Phase,
    page_signature: Option<String>,
    cards_on_page: usize,
    added_on_page: usize,
}

impl PassState {
    pub fn new(job: JobState) -> Self {
        Self {
            job,
            phase: Phase::CheckLimit,
            page_signature: None,
            cards_on_page: 0,
            added_on_page: 0,
        }
    }

    pub fn job(&self) -> &JobState {
        &self.job
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn page_signature(&self) -> Option<&str> {
        self.page_signature.as_deref()
    }

    pub fn view(&self) -> PassViewModel {
        PassViewModel {
            platform: self.job.platform,
            current_page: self.job.current_page,
            page_limit: self.job.page_limit,
            phase: self.phase,
            cards_on_page: self.cards_on_page,
            added_on_page: self.added_on_page,
            collected: self.job.accumulated_items.len(),
        }
    }

    pub(crate) fn job_mut(&mut self) -> &mut JobState {
        &mut self.job
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn set_page_signature(&mut self, signature: Option<String>) {
        self.page_signature = signature;
    }

    pub(crate) fn take_page_signature(&mut self) -> Option<String> {
        self.page_signature.take()
    }

    pub(crate) fn record_cards(&mut self, count: usize) {
        self.cards_on_page = count;
    }

    pub(crate) fn record_added(&mut self, added: usize) {
        self.added_on_page = added;
    }
}
