use std::collections::HashSet;

use ego_tree::NodeId;
use scout_logging::{scout_debug, scout_info, scout_warn};
use scraper::{ElementRef, Html, Selector};

use crate::config::Thresholds;
use crate::profile::CompiledProfile;
use crate::text::closest;

/// Where the current set of cards comes from. Re-evaluated against whatever
/// snapshot is being extracted, so it must be a pure function of the markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardSource {
    Empty,
    /// All matches of one card candidate selector.
    Candidate(usize),
    /// Containers reached by climbing from price indicators.
    PriceClimb,
    /// Like `PriceClimb`, restricted to containers carrying the anchor attribute.
    AnchoredClimb,
    /// Anchor-attribute elements showing price or title evidence.
    Anchored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSelection {
    pub source: CardSource,
    pub count: usize,
}

impl CardSelection {
    pub fn empty() -> Self {
        Self {
            source: CardSource::Empty,
            count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Chooses the elements that represent product cards.
pub struct CardLocator<'a> {
    profile: &'a CompiledProfile,
    limits: &'a Thresholds,
}

impl<'a> CardLocator<'a> {
    pub fn new(profile: &'a CompiledProfile, limits: &'a Thresholds) -> Self {
        Self { profile, limits }
    }

    /// Selector that signals cards have started rendering.
    pub fn any_card_selector(&self) -> Option<Selector> {
        let css: Vec<&str> = self
            .profile
            .card_candidates
            .iter()
            .map(|candidate| candidate.css.as_str())
            .collect();
        Selector::parse(&css.join(", ")).ok()
    }

    /// Initial choice: first candidate inside the plausible band, else the
    /// first with a small nonzero count, else a climb from price indicators.
    pub fn locate(&self, doc: &Html) -> CardSelection {
        let mut fallback: Option<CardSelection> = None;
        for (index, candidate) in self.profile.card_candidates.iter().enumerate() {
            let count = doc.select(&candidate.selector).count();
            scout_debug!("Selector {:?} found {} cards", candidate.css, count);
            if count == 0 {
                continue;
            }
            if self.limits.in_band(count) {
                scout_info!("Using card selector {:?} ({} cards)", candidate.css, count);
                return CardSelection {
                    source: CardSource::Candidate(index),
                    count,
                };
            }
            if count > self.limits.plausible_max {
                scout_warn!(
                    "Selector {:?} found {} cards, likely false positives",
                    candidate.css,
                    count
                );
            } else if fallback.is_none() {
                fallback = Some(CardSelection {
                    source: CardSource::Candidate(index),
                    count,
                });
            }
        }
        if let Some(selection) = fallback {
            scout_info!("Using small card set ({} cards)", selection.count);
            return selection;
        }
        self.climb(doc)
    }

    /// Post-scroll rescan over the most specific candidates. Only switches
    /// when the count strictly grows and stays within the band's upper bound.
    pub fn rescan(&self, doc: &Html, current: CardSelection) -> CardSelection {
        self.rescan_within(doc, current, self.profile.rescan_depth)
    }

    /// Same as [`rescan`](Self::rescan) over every candidate, used once lazy
    /// media had time to load.
    pub fn rescan_all(&self, doc: &Html, current: CardSelection) -> CardSelection {
        self.rescan_within(doc, current, self.profile.card_candidates.len())
    }

    fn rescan_within(&self, doc: &Html, current: CardSelection, depth: usize) -> CardSelection {
        for (index, candidate) in self.profile.card_candidates.iter().enumerate().take(depth) {
            let count = doc.select(&candidate.selector).count();
            if count > current.count && count <= self.limits.plausible_max {
                scout_info!(
                    "Rescan switched to {:?} ({} cards, was {})",
                    candidate.css,
                    count,
                    current.count
                );
                return CardSelection {
                    source: CardSource::Candidate(index),
                    count,
                };
            }
        }
        current
    }

    /// Re-checks a selection carried over from an earlier snapshot. A source
    /// that now matches nothing, or more than the band allows, is replaced by
    /// a fresh [`locate`](Self::locate) on `doc`.
    pub fn confirm(&self, doc: &Html, current: CardSelection) -> CardSelection {
        if current.source == CardSource::Empty {
            return current;
        }
        let count = self.materialize(doc, &current.source).len();
        if count > 0 && count <= self.limits.plausible_max {
            return CardSelection { count, ..current };
        }
        scout_warn!(
            "{:?} now yields {} cards, locating again",
            current.source,
            count
        );
        self.locate(doc)
    }

    /// Narrows to anchor-attribute elements with price or title evidence when
    /// the profile defines an anchor and such elements exist.
    pub fn refine(&self, doc: &Html, current: CardSelection) -> CardSelection {
        let count = self.anchored(doc).len();
        if count == 0 {
            return current;
        }
        scout_info!("Narrowed to {} anchored cards with evidence", count);
        CardSelection {
            source: CardSource::Anchored,
            count,
        }
    }

    pub fn has_lazy_media(&self, doc: &Html) -> bool {
        self.profile
            .lazy_media
            .iter()
            .any(|selector| doc.select(selector).next().is_some())
    }

    /// The cards `source` designates in `doc`, in document order.
    pub fn materialize<'d>(&self, doc: &'d Html, source: &CardSource) -> Vec<ElementRef<'d>> {
        match source {
            CardSource::Empty => Vec::new(),
            CardSource::Candidate(index) => self
                .profile
                .card_candidates
                .get(*index)
                .map(|candidate| doc.select(&candidate.selector).collect())
                .unwrap_or_default(),
            CardSource::PriceClimb => self.climbed(doc),
            CardSource::AnchoredClimb => self
                .climbed(doc)
                .into_iter()
                .filter(|card| self.carries_anchor(*card))
                .collect(),
            CardSource::Anchored => self.anchored(doc),
        }
    }

    fn climb(&self, doc: &Html) -> CardSelection {
        let containers = self.climbed(doc);
        let count = containers.len();
        if count == 0 {
            scout_warn!("Price climb found no card containers");
            return CardSelection::empty();
        }
        if count <= self.limits.plausible_max {
            scout_info!("Found {} cards by climbing from prices", count);
            return CardSelection {
                source: CardSource::PriceClimb,
                count,
            };
        }
        scout_warn!("Price climb found {} containers, keeping anchored ones", count);
        let anchored = containers
            .into_iter()
            .filter(|card| self.carries_anchor(*card))
            .count();
        if anchored == 0 {
            return CardSelection::empty();
        }
        CardSelection {
            source: CardSource::AnchoredClimb,
            count: anchored,
        }
    }

    /// Containers accumulated across price indicators until the set is in a
    /// plausible size.
    fn climbed<'d>(&self, doc: &'d Html) -> Vec<ElementRef<'d>> {
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut containers = Vec::new();
        for indicator in &self.profile.price_indicators {
            let mut matched = false;
            for price in doc.select(indicator) {
                matched = true;
                let Some(container) = self.container_of(price) else {
                    continue;
                };
                if seen.insert((*container).id()) {
                    containers.push(container);
                }
            }
            if matched && !containers.is_empty() && containers.len() <= self.limits.plausible_max {
                break;
            }
        }
        containers
    }

    fn container_of<'d>(&self, price: ElementRef<'d>) -> Option<ElementRef<'d>> {
        self.profile
            .primary_containers
            .iter()
            .find_map(|pattern| closest(price, pattern))
            .or_else(|| {
                self.profile
                    .secondary_containers
                    .iter()
                    .find_map(|pattern| closest(price, pattern))
            })
    }

    fn carries_anchor(&self, card: ElementRef) -> bool {
        let Some(anchor) = &self.profile.anchor else {
            return false;
        };
        card.value().attr(&anchor.name).is_some() || card.select(&anchor.selector).next().is_some()
    }

    fn anchored<'d>(&self, doc: &'d Html) -> Vec<ElementRef<'d>> {
        let Some(anchor) = &self.profile.anchor else {
            return Vec::new();
        };
        let candidates: Vec<ElementRef<'d>> = doc.select(&anchor.selector).collect();
        if candidates.is_empty() || candidates.len() > self.limits.plausible_max {
            return Vec::new();
        }
        candidates
            .into_iter()
            .filter(|card| self.shows_evidence(*card))
            .collect()
    }

    fn shows_evidence(&self, card: ElementRef) -> bool {
        self.profile
            .price_evidence
            .iter()
            .chain(&self.profile.title_evidence)
            .any(|selector| card.select(selector).next().is_some())
    }
}
