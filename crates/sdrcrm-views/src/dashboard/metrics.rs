//! Derived dashboard figures; pure and guarded against zero denominators

use sdrcrm_core::types::{
    BreakdownItem, DealStage, LeadStage, MonthlyStat, StageStats, TaskStats, UserTarget,
};
use sdrcrm_core::utils::{pct_change, percent_of};

/// Won deals as a percentage of closed deals
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn win_rate(stats: &StageStats<DealStage>) -> i64 {
    let won = stats.get(DealStage::ClosedWon).count;
    let lost = stats.get(DealStage::ClosedLost).count;
    percent_of(won as f64, (won + lost) as f64)
}

/// Converted leads as a percentage of all leads
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn conversion_rate(stats: &StageStats<LeadStage>) -> i64 {
    percent_of(
        stats.get(LeadStage::Converted).count as f64,
        stats.total_count() as f64,
    )
}

/// Completed tasks as a percentage of all tasks
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn completion_pct(stats: &TaskStats) -> i64 {
    percent_of(stats.completed as f64, stats.total as f64)
}

/// Achieved amount as a percentage of target
#[must_use]
pub fn achievement_pct(target: &UserTarget) -> i64 {
    percent_of(target.achieved, target.target)
}

/// Revenue change of the last month against the one before, in percent
#[must_use]
pub fn month_over_month(monthly: &[MonthlyStat]) -> i64 {
    match monthly {
        [.., prev, curr] => pct_change(curr.revenue, prev.revenue),
        _ => 0,
    }
}

/// Breakdown rows by amount, largest first
#[must_use]
pub fn sorted_by_amount(items: &[BreakdownItem]) -> Vec<BreakdownItem> {
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| b.total_amount.total_cmp(&a.total_amount));
    sorted
}
