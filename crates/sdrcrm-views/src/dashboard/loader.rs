//! Concurrent fetch of every dashboard slice

use super::snapshot::{DashboardSnapshot, Slice};
use async_trait::async_trait;
use sdrcrm_client::ApiClient;
use sdrcrm_core::types::{AggregateResponse, DealStage, LeadStage, MySummary, StageStats, TaskStats};
use sdrcrm_core::Result;

/// Where dashboard data comes from
///
/// Implemented by [`ApiClient`]; tests substitute canned data.
#[async_trait]
pub trait DashboardSource: Send + Sync {
    /// Stats, monthly series, breakdown and growth in one call
    async fn aggregate(&self) -> Result<AggregateResponse>;

    /// Deal counts and values per stage
    async fn deal_stats(&self) -> Result<StageStats<DealStage>>;

    /// Lead counts per stage
    async fn lead_stats(&self) -> Result<StageStats<LeadStage>>;

    /// Task counts
    async fn task_stats(&self) -> Result<TaskStats>;

    /// The signed-in user's summary
    async fn my_summary(&self) -> Result<MySummary>;
}

#[async_trait]
impl DashboardSource for ApiClient {
    async fn aggregate(&self) -> Result<AggregateResponse> {
        self.dashboard().all().await
    }

    async fn deal_stats(&self) -> Result<StageStats<DealStage>> {
        self.deals().stats().await
    }

    async fn lead_stats(&self) -> Result<StageStats<LeadStage>> {
        self.leads().stats().await
    }

    async fn task_stats(&self) -> Result<TaskStats> {
        self.tasks().stats().await
    }

    async fn my_summary(&self) -> Result<MySummary> {
        self.dashboard().my_summary().await
    }
}

/// Builds a [`DashboardSnapshot`] from a [`DashboardSource`]
#[derive(Debug, Clone)]
pub struct DashboardLoader<S> {
    source: S,
}

impl<S: DashboardSource> DashboardLoader<S> {
    /// Loader over `source`
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetch every slice concurrently.
    ///
    /// Never fails: a slice whose request fails is logged and left
    /// [`Slice::Unavailable`] while the others load.
    pub async fn load(&self) -> DashboardSnapshot {
        let (aggregate, deal_stats, lead_stats, task_stats, my_summary) = tokio::join!(
            self.source.aggregate(),
            self.source.deal_stats(),
            self.source.lead_stats(),
            self.source.task_stats(),
            self.source.my_summary(),
        );

        let (stats, monthly, breakdown, growth) = match aggregate {
            Ok(all) => (
                Slice::from_option(all.stats),
                Slice::from_option(all.monthly_stats),
                Slice::from_option(all.breakdown),
                Slice::from_option(all.growth),
            ),
            Err(e) => {
                tracing::warn!(slice = "aggregate", error = %e, "dashboard slice unavailable");
                (
                    Slice::Unavailable,
                    Slice::Unavailable,
                    Slice::Unavailable,
                    Slice::Unavailable,
                )
            }
        };

        let snapshot = DashboardSnapshot {
            stats,
            monthly,
            breakdown,
            growth,
            deal_stats: Slice::from_result("deal_stats", deal_stats),
            lead_stats: Slice::from_result("lead_stats", lead_stats),
            task_stats: Slice::from_result("task_stats", task_stats),
            my_summary: Slice::from_result("my_summary", my_summary),
        };

        tracing::debug!(loaded = snapshot.loaded_count(), "dashboard snapshot built");
        snapshot
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sdrcrm_core::Error;
    use sdrcrm_core::types::{DashboardData, MonthlyStat};

    struct CannedSource {
        fail_aggregate: bool,
        fail_leads: bool,
    }

    #[async_trait]
    impl DashboardSource for CannedSource {
        async fn aggregate(&self) -> Result<AggregateResponse> {
            if self.fail_aggregate {
                return Err(Error::from_status(500, None));
            }
            Ok(AggregateResponse {
                stats: Some(DashboardData {
                    total_sales: 1000.0,
                    ..DashboardData::default()
                }),
                monthly_stats: Some(vec![MonthlyStat {
                    month: "Jan".into(),
                    revenue: 100.0,
                    count: 1,
                }]),
                breakdown: None,
                growth: None,
            })
        }

        async fn deal_stats(&self) -> Result<StageStats<DealStage>> {
            Ok(StageStats::default())
        }

        async fn lead_stats(&self) -> Result<StageStats<LeadStage>> {
            if self.fail_leads {
                Err(Error::Network("connection reset".into()))
            } else {
                Ok(StageStats::default())
            }
        }

        async fn task_stats(&self) -> Result<TaskStats> {
            Ok(TaskStats {
                total: 4,
                completed: 1,
                ..TaskStats::default()
            })
        }

        async fn my_summary(&self) -> Result<MySummary> {
            Ok(MySummary::default())
        }
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_others() {
        let loader = DashboardLoader::new(CannedSource {
            fail_aggregate: false,
            fail_leads: true,
        });
        let snapshot = loader.load().await;

        assert_eq!(snapshot.lead_stats, Slice::Unavailable);
        assert_eq!(snapshot.stats.get().unwrap().total_sales, 1000.0);
        assert_eq!(snapshot.task_stats.get().unwrap().total, 4);
        assert!(snapshot.deal_stats.is_loaded());
    }

    #[tokio::test]
    async fn test_aggregate_failure_blanks_its_parts_only() {
        let loader = DashboardLoader::new(CannedSource {
            fail_aggregate: true,
            fail_leads: false,
        });
        let snapshot = loader.load().await;

        assert!(!snapshot.stats.is_loaded());
        assert!(!snapshot.monthly.is_loaded());
        assert!(!snapshot.growth.is_loaded());
        assert_eq!(snapshot.loaded_count(), 4);
    }

    #[tokio::test]
    async fn test_omitted_aggregate_fields_are_unavailable() {
        let loader = DashboardLoader::new(CannedSource {
            fail_aggregate: false,
            fail_leads: false,
        });
        let snapshot = loader.load().await;

        assert!(snapshot.monthly.is_loaded());
        assert!(!snapshot.breakdown.is_loaded());
        assert!(!snapshot.growth.is_loaded());
    }
}
