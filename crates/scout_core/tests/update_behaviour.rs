use std::sync::Once;

use pretty_assertions::assert_eq;
use scout_core::{
    update, DelayWindow, Effect, FinishReason, HaltReason, Item, JobSettings, JobState, Msg,
    PassState, Phase, Platform,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(scout_logging::initialize_for_tests);
}

fn job(page_limit: u32, current_page: u32) -> JobState {
    let mut job = JobState::start(JobSettings::new(Platform::Jd, page_limit).with_delays(3, 5));
    job.current_page = current_page;
    job
}

fn item(id: u32) -> Item {
    Item::new(format!("商品标题 {id}"), "9.90", format!("https://item.jd.com/{id}.html"))
}

/// Drives a pass from `PassStarted` through persistence with the given page items.
fn run_to_persisted(job: JobState, items: Vec<Item>) -> (PassState, Vec<Effect>) {
    let signature = items.first().and_then(|i| i.item_id(Platform::Jd));
    let mut accumulated = job.accumulated_items.clone();
    accumulated.extend(items.iter().cloned());
    let added = items.len();

    let (state, _) = update(PassState::new(job), Msg::PassStarted);
    let (state, _) = update(state, Msg::CardsLocated { count: items.len() });
    let (state, _) = update(state, Msg::ItemsExtracted { items, signature });
    update(state, Msg::PagePersisted { accumulated, added })
}

fn has_effect(effects: &[Effect], pred: impl Fn(&Effect) -> bool) -> bool {
    effects.iter().any(pred)
}

#[test]
fn pass_past_limit_finishes_immediately() {
    init_logging();
    let (state, effects) = update(PassState::new(job(3, 4)), Msg::PassStarted);

    assert_eq!(state.phase(), Phase::Finished);
    assert!(has_effect(&effects, |e| matches!(
        e,
        Effect::Finish {
            reason: FinishReason::PageLimitReached,
            ..
        }
    )));
    assert!(!has_effect(&effects, |e| matches!(e, Effect::LocateCards)));
}

#[test]
fn pass_within_limit_locates_cards() {
    init_logging();
    let (state, effects) = update(PassState::new(job(3, 2)), Msg::PassStarted);

    assert_eq!(state.phase(), Phase::Locate);
    assert_eq!(effects.last(), Some(&Effect::LocateCards));
}

#[test]
fn last_page_finishes_without_searching_for_next_control() {
    init_logging();
    let (state, effects) = run_to_persisted(job(3, 3), vec![item(1), item(2)]);

    assert_eq!(state.phase(), Phase::Finished);
    assert!(!has_effect(&effects, |e| matches!(e, Effect::LocateNextControl { .. })));
    match effects.last() {
        Some(Effect::Finish {
            items,
            platform,
            reason,
        }) => {
            assert_eq!(items.len(), 2);
            assert_eq!(*platform, Platform::Jd);
            assert_eq!(*reason, FinishReason::PageLimitReached);
        }
        other => panic!("expected finish, got {other:?}"),
    }
}

#[test]
fn middle_page_searches_for_next_control() {
    init_logging();
    let (state, effects) = run_to_persisted(job(3, 1), vec![item(1)]);

    assert_eq!(state.phase(), Phase::AdvanceOrFinish);
    assert_eq!(
        effects.last(),
        Some(&Effect::LocateNextControl { next_page: 2 })
    );
    assert_eq!(state.job().last_page_signature_id.as_deref(), Some("1"));
}

#[test]
fn found_control_persists_page_then_waits_then_activates() {
    init_logging();
    let (state, _) = run_to_persisted(job(3, 1), vec![item(1)]);
    let (state, effects) = update(state, Msg::NextControlResolved { found: true });

    assert_eq!(state.phase(), Phase::Advancing);
    assert_eq!(state.job().current_page, 2);
    assert_eq!(
        effects,
        vec![
            Effect::PersistCurrentPage { page: 2 },
            Effect::WaitJitter(DelayWindow::new(3, 5)),
            Effect::ActivateNextControl,
        ]
    );

    let (state, effects) = update(state, Msg::NextControlActivated { ok: true });
    assert_eq!(state.phase(), Phase::HandedOff);
    assert_eq!(effects.last(), Some(&Effect::AwaitNavigation { page: 2 }));
}

#[test]
fn missing_control_finishes_normally() {
    init_logging();
    let (state, _) = run_to_persisted(job(5, 2), vec![item(7)]);
    let (state, effects) = update(state, Msg::NextControlResolved { found: false });

    assert_eq!(state.phase(), Phase::Finished);
    assert!(has_effect(&effects, |e| matches!(
        e,
        Effect::Finish {
            reason: FinishReason::NoNextControl,
            ..
        }
    )));
}

#[test]
fn failed_activation_finishes() {
    init_logging();
    let (state, _) = run_to_persisted(job(5, 1), vec![item(7)]);
    let (state, _) = update(state, Msg::NextControlResolved { found: true });
    let (state, effects) = update(state, Msg::NextControlActivated { ok: false });

    assert_eq!(state.phase(), Phase::Finished);
    assert!(has_effect(&effects, |e| matches!(
        e,
        Effect::Finish {
            reason: FinishReason::ActivationFailed,
            ..
        }
    )));
}

#[test]
fn zero_cards_on_first_page_halts_with_notice() {
    init_logging();
    let (state, _) = update(PassState::new(job(3, 1)), Msg::PassStarted);
    let (state, effects) = update(state, Msg::CardsLocated { count: 0 });

    assert_eq!(state.phase(), Phase::Halted);
    assert!(has_effect(&effects, |e| matches!(e, Effect::Notice(_))));
    assert_eq!(
        effects.last(),
        Some(&Effect::Halt(HaltReason::NoCardsOnFirstPage))
    );
}

#[test]
fn zero_cards_on_later_page_finishes_with_accumulated_items() {
    init_logging();
    let mut later = job(3, 2);
    later.accumulated_items = vec![item(1), item(2)];
    let (state, _) = update(PassState::new(later), Msg::PassStarted);
    let (state, effects) = update(state, Msg::CardsLocated { count: 0 });

    assert_eq!(state.phase(), Phase::Finished);
    match effects.last() {
        Some(Effect::Finish { items, reason, .. }) => {
            assert_eq!(items.len(), 2);
            assert_eq!(*reason, FinishReason::EmptyPage);
        }
        other => panic!("expected finish, got {other:?}"),
    }
}

#[test]
fn repeated_signature_warns_but_continues() {
    init_logging();
    let mut stale = job(3, 2);
    stale.last_page_signature_id = Some("1".to_string());
    let (state, effects) = run_to_persisted(stale, vec![item(1), item(5)]);

    assert!(has_effect(&effects, |e| matches!(
        e,
        Effect::StaleSignature { signature } if signature == "1"
    )));
    assert_eq!(state.phase(), Phase::AdvanceOrFinish);
    assert_eq!(
        effects.last(),
        Some(&Effect::LocateNextControl { next_page: 3 })
    );
}

#[test]
fn extracted_items_are_persisted_with_signature() {
    init_logging();
    let (state, _) = update(PassState::new(job(2, 1)), Msg::PassStarted);
    let (state, _) = update(state, Msg::CardsLocated { count: 1 });
    let (state, effects) = update(
        state,
        Msg::ItemsExtracted {
            items: vec![item(9)],
            signature: Some("9".to_string()),
        },
    );

    assert_eq!(state.phase(), Phase::Persist);
    assert_eq!(
        effects,
        vec![Effect::PersistPage {
            items: vec![item(9)],
            signature: Some("9".to_string()),
        }]
    );
}

#[test]
fn view_reports_progress() {
    init_logging();
    let (state, _) = run_to_persisted(job(3, 1), vec![item(1), item(2), item(3)]);
    let view = state.view();

    assert_eq!(view.current_page, 1);
    assert_eq!(view.page_limit, 3);
    assert_eq!(view.cards_on_page, 3);
    assert_eq!(view.added_on_page, 3);
    assert_eq!(view.collected, 3);
    assert!(view.summary().contains("page 1/3"));
}
