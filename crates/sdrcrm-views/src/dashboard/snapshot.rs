//! The dashboard's write-once data snapshot

use sdrcrm_core::types::{
    BreakdownData, DashboardData, DealStage, GrowthData, LeadStage, MonthlyStat, MySummary,
    StageStats, TaskStats,
};
use sdrcrm_core::Result;

/// One independently fetched part of the dashboard
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Slice<T> {
    /// Fetched and decoded
    Loaded(T),
    /// Failed or absent; widgets render their empty state
    #[default]
    Unavailable,
}

impl<T> Slice<T> {
    /// Keep the value, or log the failure and degrade
    pub fn from_result(name: &'static str, result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Loaded(value),
            Err(e) => {
                tracing::warn!(slice = name, error = %e, "dashboard slice unavailable");
                Self::Unavailable
            }
        }
    }

    /// A field the server may omit from an otherwise good payload
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Self::Unavailable, Self::Loaded)
    }

    /// Borrow the value
    pub const fn get(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            Self::Unavailable => None,
        }
    }

    /// Whether the slice loaded
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Everything the dashboard widgets read, fetched in one fan-out
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    /// Headline numbers
    pub stats: Slice<DashboardData>,
    /// Monthly revenue series, oldest first
    pub monthly: Slice<Vec<MonthlyStat>>,
    /// Sales breakdowns
    pub breakdown: Slice<BreakdownData>,
    /// Period-over-period growth
    pub growth: Slice<GrowthData>,
    /// Deal counts and values per stage
    pub deal_stats: Slice<StageStats<DealStage>>,
    /// Lead counts per stage
    pub lead_stats: Slice<StageStats<LeadStage>>,
    /// Task counts
    pub task_stats: Slice<TaskStats>,
    /// The signed-in user's summary
    pub my_summary: Slice<MySummary>,
}

impl DashboardSnapshot {
    /// Number of slices that loaded
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        [
            self.stats.is_loaded(),
            self.monthly.is_loaded(),
            self.breakdown.is_loaded(),
            self.growth.is_loaded(),
            self.deal_stats.is_loaded(),
            self.lead_stats.is_loaded(),
            self.task_stats.is_loaded(),
            self.my_summary.is_loaded(),
        ]
        .into_iter()
        .filter(|loaded| *loaded)
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdrcrm_core::Error;

    #[test]
    fn test_failed_result_degrades() {
        let slice: Slice<u32> = Slice::from_result("test", Err(Error::Network("down".into())));
        assert_eq!(slice, Slice::Unavailable);
        assert!(slice.get().is_none());
    }

    #[test]
    fn test_missing_field_degrades() {
        assert_eq!(Slice::<u32>::from_option(None), Slice::Unavailable);
        assert_eq!(Slice::from_option(Some(3)).get(), Some(&3));
    }

    #[test]
    fn test_default_snapshot_is_empty() {
        assert_eq!(DashboardSnapshot::default().loaded_count(), 0);
    }
}
