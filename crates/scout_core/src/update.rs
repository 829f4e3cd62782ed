use crate::{Effect, FinishReason, HaltReason, Msg, PassState, Phase};

/// Pure update function: applies a message to the pass state and returns the
/// effects the runner must carry out. Messages that do not belong to the
/// current phase are ignored.
pub fn update(mut state: PassState, msg: Msg) -> (PassState, Vec<Effect>) {
    let effects = match (state.phase(), msg) {
        (Phase::CheckLimit, Msg::PassStarted) => {
            if state.job().is_past_limit() {
                finish(&mut state, FinishReason::PageLimitReached)
            } else {
                state.set_phase(Phase::Locate);
                vec![
                    Effect::Status(format!("正在检查第 {} 页状态...", state.job().current_page)),
                    Effect::LocateCards,
                ]
            }
        }
        (Phase::Locate, Msg::CardsLocated { count }) => {
            state.record_cards(count);
            if count > 0 {
                state.set_phase(Phase::Extract);
                vec![Effect::ExtractItems]
            } else if state.job().current_page == 1 {
                state.set_phase(Phase::Halted);
                vec![
                    Effect::Notice("未找到商品卡片，请检查页面或稍后重试。".to_string()),
                    Effect::Halt(HaltReason::NoCardsOnFirstPage),
                ]
            } else {
                // The previous page had a next control, but its destination is empty.
                finish(&mut state, FinishReason::EmptyPage)
            }
        }
        (Phase::Extract, Msg::ItemsExtracted { items, signature }) => {
            state.set_phase(Phase::Persist);
            state.set_page_signature(signature.clone());
            vec![Effect::PersistPage { items, signature }]
        }
        (Phase::Persist, Msg::PagePersisted { accumulated, added }) => {
            state.record_added(added);
            let signature = state.take_page_signature();
            let mut effects = Vec::new();

            let job = state.job_mut();
            job.accumulated_items = accumulated;
            if let (Some(previous), Some(current)) = (&job.last_page_signature_id, &signature) {
                if previous == current {
                    effects.push(Effect::StaleSignature {
                        signature: current.clone(),
                    });
                    effects.push(Effect::Status(format!(
                        "注意：页面可能未刷新 (第 {} 页)...",
                        job.current_page
                    )));
                }
            }
            job.last_page_signature_id = signature;
            effects.push(Effect::Status(format!(
                "第 {} 页完成。已获取 {} 条。",
                job.current_page,
                job.accumulated_items.len()
            )));

            if job.current_page >= job.page_limit {
                effects.extend(finish(&mut state, FinishReason::PageLimitReached));
            } else {
                let next_page = job.current_page + 1;
                state.set_phase(Phase::AdvanceOrFinish);
                effects.push(Effect::LocateNextControl { next_page });
            }
            effects
        }
        (Phase::AdvanceOrFinish, Msg::NextControlResolved { found }) => {
            if found {
                let window = state.job().delay_window();
                let job = state.job_mut();
                job.current_page += 1;
                let page = job.current_page;
                state.set_phase(Phase::Advancing);
                vec![
                    Effect::PersistCurrentPage { page },
                    Effect::WaitJitter(window),
                    Effect::ActivateNextControl,
                ]
            } else {
                finish(&mut state, FinishReason::NoNextControl)
            }
        }
        (Phase::Advancing, Msg::NextControlActivated { ok }) => {
            if ok {
                let page = state.job().current_page;
                state.set_phase(Phase::HandedOff);
                vec![
                    Effect::Status(format!("正在跳转到第 {page} 页...")),
                    Effect::AwaitNavigation { page },
                ]
            } else {
                finish(&mut state, FinishReason::ActivationFailed)
            }
        }
        _ => Vec::new(),
    };

    (state, effects)
}

fn finish(state: &mut PassState, reason: FinishReason) -> Vec<Effect> {
    state.set_phase(Phase::Finished);
    let job = state.job();
    vec![
        Effect::Status(format!(
            "爬取完成！共爬取 {} 个商品。",
            job.accumulated_items.len()
        )),
        Effect::Finish {
            items: job.accumulated_items.clone(),
            platform: job.platform,
            reason,
        },
    ]
}
