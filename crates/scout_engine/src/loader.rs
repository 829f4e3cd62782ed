use scout_logging::{scout_debug, scout_info};

use crate::config::Timings;
use crate::page::{Page, PageError};
use crate::wait::settle;

/// What stabilizing a page did, for diagnostics and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub scrolls: u32,
    pub sweep_steps: u32,
    pub final_height: u64,
    /// The height grew during the final settle and an extra settle ran.
    pub grew_late: bool,
}

/// Scrolls a page until lazily rendered content stops appearing.
pub struct ScrollDriver<'a> {
    timings: &'a Timings,
}

impl<'a> ScrollDriver<'a> {
    pub fn new(timings: &'a Timings) -> Self {
        Self { timings }
    }

    pub async fn stabilize<P: Page + ?Sized>(&self, page: &mut P) -> Result<LoadReport, PageError> {
        let mut report = LoadReport::default();
        let mut height = page.scroll_height().await?;

        while report.scrolls < self.timings.scroll_cap {
            page.scroll_to(height).await?;
            report.scrolls += 1;
            settle(self.timings.scroll_settle()).await;
            let grown = page.scroll_height().await?;
            if grown == height {
                break;
            }
            height = grown;
        }
        scout_debug!("Scrolled {} times, height {}", report.scrolls, height);

        if self.timings.sweep {
            report.sweep_steps = self.sweep(page).await?;
            height = page.scroll_height().await?;
        }

        page.scroll_to(height).await?;
        settle(self.timings.final_settle()).await;
        let final_height = page.scroll_height().await?;
        if final_height > height {
            scout_debug!("Height grew to {} after the final settle", final_height);
            report.grew_late = true;
            settle(self.timings.late_growth_settle()).await;
        }
        report.final_height = final_height;
        scout_info!(
            "Page stabilized after {} scrolls and {} sweep steps",
            report.scrolls,
            report.sweep_steps
        );
        Ok(report)
    }

    /// Top-to-bottom pass in fixed steps to trigger remaining lazy loads.
    async fn sweep<P: Page + ?Sized>(&self, page: &mut P) -> Result<u32, PageError> {
        page.scroll_to(0).await?;
        settle(self.timings.scroll_settle()).await;

        let bottom = page.scroll_height().await?;
        let step = self.timings.sweep_step_px.max(1);
        let mut position = 0;
        let mut steps = 0;
        while position < bottom && steps < self.timings.sweep_step_cap {
            page.scroll_to(position).await?;
            settle(self.timings.sweep_step_delay()).await;
            position += step;
            steps += 1;
        }
        Ok(steps)
    }
}
