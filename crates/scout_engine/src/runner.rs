//! Carries out the effects of the pass state machine against a live page.

use std::collections::{BTreeMap, VecDeque};

use rand::rngs::StdRng;
use rand::SeedableRng;
use scout_core::{
    update, Effect, FinishReason, HaltReason, Item, JobSettings, JobState, Msg, PassState, Phase,
    Platform, SettingsError,
};
use scout_logging::{scout_debug, scout_info, scout_warn};
use scraper::Html;

use crate::config::{ScoutConfig, Timings};
use crate::fields::FieldExtractor;
use crate::loader::ScrollDriver;
use crate::locator::{CardLocator, CardSelection};
use crate::notify::{Notifier, ScoutMessage};
use crate::page::{ClickMethod, Page, PageError};
use crate::pagination::{find_next_control, NextControl, NextTarget};
use crate::profile::{CompiledProfile, ProfileError};
use crate::store::{JobStore, KeyValueStore, StoreError};
use crate::wait::{settle, wait_for_selector};

#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error("no job has been started")]
    NoJob,
    #[error("no site profile for {0}")]
    MissingProfile(Platform),
    #[error("pass stopped in phase {0:?} without an outcome")]
    Stalled(Phase),
}

/// How one pass over the loaded page ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Navigation to `page` was triggered; run another pass there.
    HandedOff { page: u32 },
    Finished {
        reason: FinishReason,
        items: Vec<Item>,
    },
    Halted(HaltReason),
}

/// Data carried between effects of one pass.
#[derive(Default)]
struct PassContext {
    snapshot: Option<Html>,
    cards: Option<CardSelection>,
    next: Option<NextControl>,
    outcome: Option<PassOutcome>,
}

pub struct Scout<P, S, N> {
    page: P,
    store: JobStore<S>,
    notifier: N,
    config: ScoutConfig,
    profiles: BTreeMap<Platform, CompiledProfile>,
    rng: StdRng,
}

impl<P, S, N> Scout<P, S, N>
where
    P: Page,
    S: KeyValueStore,
    N: Notifier,
{
    pub fn new(page: P, store: S, notifier: N, config: ScoutConfig) -> Result<Self, ScoutError> {
        let profiles = config.compile_profiles()?;
        Ok(Self {
            page,
            store: JobStore::new(store),
            notifier,
            config,
            profiles,
            rng: StdRng::from_os_rng(),
        })
    }

    /// Replaces the jitter source, for reproducible runs.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn store(&self) -> &JobStore<S> {
        &self.store
    }

    pub fn into_parts(self) -> (P, S, N) {
        (self.page, self.store.into_inner(), self.notifier)
    }

    /// Discards any previous job and positions a new one on page 1.
    pub fn start(&mut self, settings: JobSettings) -> Result<JobState, ScoutError> {
        let settings = settings.validate()?;
        Ok(self.store.reset(settings)?)
    }

    /// Once per page load: if the persisted job is mid-crawl, wait the resume
    /// delay and report that a pass should run.
    pub async fn resume_if_mid_job(&mut self) -> Result<bool, ScoutError> {
        let Some(job) = self.store.load_job()? else {
            return Ok(false);
        };
        if !job.is_mid_job() {
            return Ok(false);
        }
        scout_info!(
            "Resuming {} job on page {}/{}",
            job.platform,
            job.current_page,
            job.page_limit
        );
        settle(self.config.timings(job.platform).resume_delay()).await;
        Ok(true)
    }

    /// Runs passes until the job finishes or halts.
    pub async fn crawl(&mut self) -> Result<PassOutcome, ScoutError> {
        loop {
            match self.run_pass().await? {
                PassOutcome::HandedOff { page } => {
                    if !self.resume_if_mid_job().await? {
                        scout_warn!("Handed off to page {} but the job is not mid-crawl", page);
                        return Ok(PassOutcome::HandedOff { page });
                    }
                }
                outcome => return Ok(outcome),
            }
        }
    }

    /// One pass over the currently loaded page, starting from the persisted
    /// job state.
    pub async fn run_pass(&mut self) -> Result<PassOutcome, ScoutError> {
        let job = self.store.load_job()?.ok_or(ScoutError::NoJob)?;
        scout_logging::set_page(job.current_page);
        let platform = job.platform;

        let mut state = PassState::new(job);
        let mut cx = PassContext::default();
        let mut queue = VecDeque::from([Msg::PassStarted]);
        while let Some(msg) = queue.pop_front() {
            let (next, effects) = update(state, msg);
            state = next;
            for effect in effects {
                if let Some(reply) = self.execute(platform, effect, &mut cx).await? {
                    queue.push_back(reply);
                }
            }
        }

        scout_info!("{}", state.view().summary());
        cx.outcome.ok_or(ScoutError::Stalled(state.phase()))
    }

    fn profile(&self, platform: Platform) -> Result<&CompiledProfile, ScoutError> {
        self.profiles
            .get(&platform)
            .ok_or(ScoutError::MissingProfile(platform))
    }

    fn timings(&self, platform: Platform) -> Timings {
        self.config.timings(platform).clone()
    }

    async fn snapshot(&self) -> Result<Html, ScoutError> {
        let html = self.page.html().await?;
        Ok(Html::parse_document(&html))
    }

    async fn execute(
        &mut self,
        platform: Platform,
        effect: Effect,
        cx: &mut PassContext,
    ) -> Result<Option<Msg>, ScoutError> {
        match effect {
            Effect::Status(text) => {
                scout_info!("{}", text);
                self.notifier.notify(ScoutMessage::StatusUpdate { text });
            }
            Effect::Notice(text) => {
                scout_warn!("{}", text);
                self.notifier.notify(ScoutMessage::Notice { text });
            }
            Effect::LocateCards => {
                let count = self.locate_cards(platform, cx).await?;
                return Ok(Some(Msg::CardsLocated { count }));
            }
            Effect::ExtractItems => {
                let (items, signature) = self.extract_items(platform, cx)?;
                return Ok(Some(Msg::ItemsExtracted { items, signature }));
            }
            Effect::PersistPage { items, signature } => {
                let outcome = self.store.commit_page(platform, items, signature)?;
                return Ok(Some(Msg::PagePersisted {
                    accumulated: outcome.items,
                    added: outcome.added,
                }));
            }
            Effect::StaleSignature { signature } => {
                scout_warn!(
                    "First item {} matches the previous page; the page may not have refreshed",
                    signature
                );
            }
            Effect::LocateNextControl { next_page } => {
                let doc = self.snapshot().await?;
                let url = self.page.url();
                let control =
                    find_next_control(&doc, &url, next_page, self.profile(platform)?, platform);
                if control.is_none() {
                    scout_info!("No control leads to page {}", next_page);
                }
                let found = control.is_some();
                cx.next = control;
                return Ok(Some(Msg::NextControlResolved { found }));
            }
            Effect::PersistCurrentPage { page } => {
                self.store.set_current_page(page)?;
            }
            Effect::WaitJitter(window) => {
                let delay = window.sample(&mut self.rng);
                scout_info!("Waiting {} ms before the next page", delay.as_millis());
                self.notifier.notify(ScoutMessage::StatusUpdate {
                    text: format!("本页完成。正在随机等待 {} 秒...", delay.as_secs()),
                });
                settle(delay).await;
            }
            Effect::ActivateNextControl => {
                let ok = match cx.next.take() {
                    Some(control) => self.activate(control).await,
                    None => false,
                };
                return Ok(Some(Msg::NextControlActivated { ok }));
            }
            Effect::AwaitNavigation { page } => {
                settle(self.timings(platform).navigation_settle()).await;
                cx.outcome = Some(PassOutcome::HandedOff { page });
            }
            Effect::Finish {
                items,
                platform,
                reason,
            } => {
                scout_info!("Finished with {} items ({:?})", items.len(), reason);
                self.notifier.notify(ScoutMessage::ScrapeFinished {
                    items: items.clone(),
                    platform,
                });
                cx.outcome = Some(PassOutcome::Finished { reason, items });
            }
            Effect::Halt(reason) => {
                scout_warn!("Halted: {:?}", reason);
                cx.outcome = Some(PassOutcome::Halted(reason));
            }
        }
        Ok(None)
    }

    /// Waits for cards, stabilizes the page, then settles on a card source
    /// and keeps the snapshot it was chosen from.
    async fn locate_cards(
        &mut self,
        platform: Platform,
        cx: &mut PassContext,
    ) -> Result<usize, ScoutError> {
        let timings = self.timings(platform);
        let profile = self.profile(platform)?;
        let limits = &self.config.thresholds;
        let locator = CardLocator::new(profile, limits);

        if let Some(any_card) = locator.any_card_selector() {
            let appeared = wait_for_selector(
                &self.page,
                &any_card,
                timings.card_wait(),
                timings.poll_interval(),
            )
            .await?;
            if !appeared {
                scout_warn!("No card selector matched within {:?}", timings.card_wait());
            }
        }

        let initial = locator.locate(&self.snapshot().await?);

        ScrollDriver::new(&timings).stabilize(&mut self.page).await?;
        settle(timings.post_scroll_wait()).await;

        // The scroll needed `&mut self.page`; borrow the profile again.
        let profile = self.profile(platform)?;
        let locator = CardLocator::new(profile, &self.config.thresholds);
        let mut doc = self.snapshot().await?;
        let rescanned = locator.rescan(&doc, initial);
        let mut selection = locator.refine(&doc, locator.confirm(&doc, rescanned));

        if !selection.is_empty() && locator.has_lazy_media(&doc) {
            scout_debug!("Lazy media present, waiting {:?}", timings.lazy_media_wait());
            settle(timings.lazy_media_wait()).await;
            doc = self.snapshot().await?;
            selection = locator.confirm(&doc, locator.rescan_all(&doc, selection));
        }

        let count = locator.materialize(&doc, &selection.source).len();
        scout_info!("Total cards found: {} ({:?})", count, selection.source);
        cx.cards = Some(selection);
        cx.snapshot = Some(doc);
        Ok(count)
    }

    fn extract_items(
        &self,
        platform: Platform,
        cx: &PassContext,
    ) -> Result<(Vec<Item>, Option<String>), ScoutError> {
        let (Some(doc), Some(selection)) = (&cx.snapshot, &cx.cards) else {
            return Ok((Vec::new(), None));
        };
        let profile = self.profile(platform)?;
        let limits = &self.config.thresholds;
        let cards = CardLocator::new(profile, limits).materialize(doc, &selection.source);
        let url = self.page.url();
        let extraction = FieldExtractor::new(profile, limits, platform, &url).extract_page(&cards);
        Ok((extraction.items, extraction.signature))
    }

    /// Follows the control: its href, then each click method, then the
    /// nearest enclosing link. Returns whether anything triggered navigation.
    async fn activate(&mut self, control: NextControl) -> bool {
        let (path, href, has_onclick, ancestor_href) = match control.target {
            NextTarget::Url(url) => return self.follow(&url, "rewritten url").await,
            NextTarget::Element {
                path,
                href,
                has_onclick,
                ancestor_href,
                ..
            } => (path, href, has_onclick, ancestor_href),
        };

        if let Some(href) = href {
            if self.follow(&href, "href").await {
                return true;
            }
        }
        for method in ClickMethod::CASCADE {
            if method == ClickMethod::Handler && !has_onclick {
                continue;
            }
            match self.page.click(&path, method).await {
                Ok(true) => {
                    scout_info!("Activated next control at {} via {:?}", path, method);
                    return true;
                }
                Ok(false) => scout_debug!("Click method {:?} unsupported", method),
                Err(err) => scout_warn!("Click method {:?} failed: {}", method, err),
            }
        }
        match ancestor_href {
            Some(href) => self.follow(&href, "enclosing link").await,
            None => false,
        }
    }

    async fn follow(&mut self, url: &str, via: &str) -> bool {
        match self.page.navigate(url).await {
            Ok(()) => {
                scout_info!("Navigated via {} to {}", via, url);
                true
            }
            Err(err) => {
                scout_warn!("Navigation via {} failed: {}", via, err);
                false
            }
        }
    }
}
