use std::collections::BTreeMap;
use std::time::Duration;

use scout_core::Platform;
use serde::{Deserialize, Serialize};

use crate::profile::{CompiledProfile, ProfileError, SiteProfile};

/// Heuristic limits shared by both sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Inclusive band of card counts that look like a real result page.
    pub plausible_min: usize,
    pub plausible_max: usize,
    /// A title candidate must be longer than this.
    pub min_title_chars: usize,
    pub max_title_chars: usize,
    /// A link must be longer than this to keep a card on its own.
    pub min_link_chars: usize,
    pub search_title_chars: usize,
    /// Cards whose extracted fields are logged at debug level.
    pub debug_card_samples: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            plausible_min: 20,
            plausible_max: 200,
            min_title_chars: 5,
            max_title_chars: 100,
            min_link_chars: 10,
            search_title_chars: 20,
            debug_card_samples: 3,
        }
    }
}

impl Thresholds {
    pub fn in_band(&self, count: usize) -> bool {
        (self.plausible_min..=self.plausible_max).contains(&count)
    }
}

/// Waits and scroll pacing for one site, in milliseconds. A site table in a
/// config file replaces the built-in one as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    pub card_wait_ms: u64,
    pub poll_interval_ms: u64,
    pub scroll_settle_ms: u64,
    pub scroll_cap: u32,
    pub sweep: bool,
    pub sweep_step_px: u64,
    pub sweep_step_delay_ms: u64,
    pub sweep_step_cap: u32,
    pub final_settle_ms: u64,
    pub late_growth_settle_ms: u64,
    pub post_scroll_wait_ms: u64,
    pub lazy_media_wait_ms: u64,
    pub navigation_settle_ms: u64,
    pub resume_delay_ms: u64,
}

impl Timings {
    pub fn for_taobao() -> Self {
        Self {
            card_wait_ms: 10_000,
            sweep_step_px: 100,
            sweep_step_delay_ms: 100,
            post_scroll_wait_ms: 1_000,
            navigation_settle_ms: 5_000,
            ..Self::for_jd()
        }
    }

    pub fn for_jd() -> Self {
        Self {
            card_wait_ms: 3_000,
            poll_interval_ms: 100,
            scroll_settle_ms: 500,
            scroll_cap: 50,
            sweep: true,
            sweep_step_px: 300,
            sweep_step_delay_ms: 200,
            sweep_step_cap: 200,
            final_settle_ms: 2_000,
            late_growth_settle_ms: 1_500,
            post_scroll_wait_ms: 1_500,
            lazy_media_wait_ms: 2_000,
            navigation_settle_ms: 8_000,
            resume_delay_ms: 3_000,
        }
    }

    /// No waiting at all; caps are kept so loops still terminate.
    pub fn immediate() -> Self {
        Self {
            card_wait_ms: 0,
            poll_interval_ms: 0,
            scroll_settle_ms: 0,
            sweep_step_delay_ms: 0,
            final_settle_ms: 0,
            late_growth_settle_ms: 0,
            post_scroll_wait_ms: 0,
            lazy_media_wait_ms: 0,
            navigation_settle_ms: 0,
            resume_delay_ms: 0,
            ..Self::for_jd()
        }
    }

    pub fn card_wait(&self) -> Duration {
        Duration::from_millis(self.card_wait_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn sweep_step_delay(&self) -> Duration {
        Duration::from_millis(self.sweep_step_delay_ms)
    }

    pub fn final_settle(&self) -> Duration {
        Duration::from_millis(self.final_settle_ms)
    }

    pub fn late_growth_settle(&self) -> Duration {
        Duration::from_millis(self.late_growth_settle_ms)
    }

    pub fn post_scroll_wait(&self) -> Duration {
        Duration::from_millis(self.post_scroll_wait_ms)
    }

    pub fn lazy_media_wait(&self) -> Duration {
        Duration::from_millis(self.lazy_media_wait_ms)
    }

    pub fn navigation_settle(&self) -> Duration {
        Duration::from_millis(self.navigation_settle_ms)
    }

    pub fn resume_delay(&self) -> Duration {
        Duration::from_millis(self.resume_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub thresholds: Thresholds,
    pub taobao: Timings,
    pub jd: Timings,
    /// Full replacements for the built-in site profiles.
    pub profiles: BTreeMap<Platform, SiteProfile>,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            taobao: Timings::for_taobao(),
            jd: Timings::for_jd(),
            profiles: BTreeMap::new(),
        }
    }
}

impl ScoutConfig {
    /// Same thresholds and profiles, no waiting.
    pub fn immediate() -> Self {
        Self {
            taobao: Timings::immediate(),
            jd: Timings::immediate(),
            ..Self::default()
        }
    }

    pub fn timings(&self, platform: Platform) -> &Timings {
        match platform {
            Platform::Taobao => &self.taobao,
            Platform::Jd => &self.jd,
        }
    }

    pub fn profile(&self, platform: Platform) -> SiteProfile {
        self.profiles
            .get(&platform)
            .cloned()
            .unwrap_or_else(|| SiteProfile::builtin(platform))
    }

    pub fn compile_profiles(&self) -> Result<BTreeMap<Platform, CompiledProfile>, ProfileError> {
        Platform::ALL
            .into_iter()
            .map(|platform| Ok((platform, self.profile(platform).compile()?)))
            .collect()
    }
}
