//! Widget view models built from a [`DashboardSnapshot`]
//!
//! Each builder reads the slices it needs and returns
//! [`WidgetState::NoData`] when they are unavailable or empty.

use super::metrics;
use super::snapshot::DashboardSnapshot;
use crate::pagination::MiniPagination;
use sdrcrm_core::types::stage::Stage;
use sdrcrm_core::types::{
    BreakdownData, BreakdownItem, DealStage, GrowthData, GrowthPair, StageStats,
};
use sdrcrm_core::utils::{format_inr, pct_change, percent_of};
use serde::Serialize;

/// What a widget renders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "view", rename_all = "snake_case")]
pub enum WidgetState<T> {
    /// Data to draw
    Ready(T),
    /// Nothing to show
    NoData,
}

impl<T> WidgetState<T> {
    /// Borrow the view, if any
    pub const fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(view) => Some(view),
            Self::NoData => None,
        }
    }

    /// Whether there is something to draw
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    fn from_option(view: Option<T>) -> Self {
        view.map_or(Self::NoData, Self::Ready)
    }
}

/// One headline card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiCard {
    /// Card title
    pub label: &'static str,
    /// Formatted figure
    pub value: String,
    /// Percent change against the previous period, when known
    pub change: Option<i64>,
}

/// Headline cards: sales, deals, leads, partners
pub fn kpi_cards(snapshot: &DashboardSnapshot) -> WidgetState<Vec<KpiCard>> {
    let Some(stats) = snapshot.stats.get() else {
        return WidgetState::NoData;
    };
    let growth = snapshot.growth.get();
    let change = |pair: fn(&GrowthData) -> GrowthPair| {
        growth.map(|g| {
            let p = pair(g);
            pct_change(p.current, p.previous)
        })
    };

    WidgetState::Ready(vec![
        KpiCard {
            label: "Total Sales",
            value: format_inr(stats.total_sales),
            change: change(|g| g.revenue),
        },
        KpiCard {
            label: "Deals",
            value: stats.total_deals.to_string(),
            change: change(|g| g.deals),
        },
        KpiCard {
            label: "Leads",
            value: stats.total_leads.to_string(),
            change: change(|g| g.leads),
        },
        KpiCard {
            label: "Partners",
            value: stats.total_partners.to_string(),
            change: None,
        },
    ])
}

/// A point of the revenue chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// Month label
    pub month: String,
    /// Revenue
    pub revenue: f64,
    /// Deals closed
    pub count: u64,
}

/// Monthly revenue chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueTrend {
    /// Points in server order
    pub points: Vec<TrendPoint>,
    /// Last month against the one before
    pub month_over_month: i64,
    /// Sum over the series
    pub total_revenue: f64,
}

/// Monthly revenue chart with month-over-month change
pub fn revenue_trend(snapshot: &DashboardSnapshot) -> WidgetState<RevenueTrend> {
    WidgetState::from_option(
        snapshot
            .monthly
            .get()
            .filter(|monthly| !monthly.is_empty())
            .map(|monthly| RevenueTrend {
                points: monthly
                    .iter()
                    .map(|m| TrendPoint {
                        month: m.month.clone(),
                        revenue: m.revenue,
                        count: m.count,
                    })
                    .collect(),
                month_over_month: metrics::month_over_month(monthly),
                total_revenue: monthly.iter().map(|m| m.revenue).sum(),
            }),
    )
}

/// One bar of a funnel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelRow {
    /// Stage label
    pub stage: &'static str,
    /// Records in the stage
    pub count: u64,
    /// Value of the stage
    pub value: f64,
    /// Share of all records, percent
    pub share: i64,
}

/// Stage-ordered funnel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Funnel {
    /// One row per known stage, in funnel order
    pub rows: Vec<FunnelRow>,
    /// Records across stages
    pub total_count: u64,
    /// Value across stages
    pub total_value: f64,
}

#[allow(clippy::cast_precision_loss)]
fn funnel<S: Stage>(stats: &StageStats<S>) -> Option<Funnel> {
    let total_count = stats.total_count();
    if total_count == 0 {
        return None;
    }

    Some(Funnel {
        rows: stats
            .iter()
            .map(|(stage, metric)| FunnelRow {
                stage: stage.label(),
                count: metric.count,
                value: metric.value,
                share: percent_of(metric.count as f64, total_count as f64),
            })
            .collect(),
        total_count,
        total_value: stats.total_value(),
    })
}

/// Deals per stage
pub fn deal_funnel(snapshot: &DashboardSnapshot) -> WidgetState<Funnel> {
    WidgetState::from_option(snapshot.deal_stats.get().and_then(funnel))
}

/// Leads per stage, with the conversion rate
pub fn lead_funnel(snapshot: &DashboardSnapshot) -> WidgetState<(Funnel, i64)> {
    WidgetState::from_option(
        snapshot
            .lead_stats
            .get()
            .and_then(|stats| funnel(stats).map(|f| (f, metrics::conversion_rate(stats)))),
    )
}

/// Won against lost deals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WinRate {
    /// Deals won
    pub won: u64,
    /// Deals lost
    pub lost: u64,
    /// `won / (won + lost)`, percent
    pub rate: i64,
}

/// Win rate gauge; no data until a deal has closed
pub fn win_rate(snapshot: &DashboardSnapshot) -> WidgetState<WinRate> {
    WidgetState::from_option(snapshot.deal_stats.get().and_then(|stats| {
        let won = stats.get(DealStage::ClosedWon).count;
        let lost = stats.get(DealStage::ClosedLost).count;
        (won + lost > 0).then(|| WinRate {
            won,
            lost,
            rate: metrics::win_rate(stats),
        })
    }))
}

/// A row of a ranked table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    /// 1-based position over the whole list
    pub rank: usize,
    /// Product, partner or salesperson
    pub name: String,
    /// Number of sales
    pub count: u64,
    /// Amount sold
    pub amount: f64,
    /// Share of the total amount, percent
    pub share: i64,
}

/// One page of a ranked breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTable {
    /// Rows of the requested page
    pub rows: Vec<RankedRow>,
    /// Page cursor after clamping
    pub pagination: MiniPagination,
}

/// Which breakdown a ranked table shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ranking {
    /// By product
    Products,
    /// By partner
    Partners,
    /// By salesperson
    Salespeople,
}

impl Ranking {
    fn items(self, breakdown: &BreakdownData) -> &[BreakdownItem] {
        match self {
            Self::Products => &breakdown.by_product,
            Self::Partners => &breakdown.by_partner,
            Self::Salespeople => &breakdown.by_salesperson,
        }
    }
}

/// Top products, partners or salespeople by amount, one page at a time
pub fn ranked(
    snapshot: &DashboardSnapshot,
    ranking: Ranking,
    page: usize,
    page_size: usize,
) -> WidgetState<RankedTable> {
    let Some(breakdown) = snapshot.breakdown.get() else {
        return WidgetState::NoData;
    };
    let sorted = metrics::sorted_by_amount(ranking.items(breakdown));
    if sorted.is_empty() {
        return WidgetState::NoData;
    }

    let total: f64 = sorted.iter().map(|i| i.total_amount).sum();
    let mut pagination = MiniPagination::new(sorted.len(), page_size);
    pagination.set_page(page);
    let offset = pagination.range().start;

    let rows = pagination
        .page_items(&sorted)
        .iter()
        .enumerate()
        .map(|(i, item)| RankedRow {
            rank: offset + i + 1,
            name: item.name.clone(),
            count: item.count,
            amount: item.total_amount,
            share: percent_of(item.total_amount, total),
        })
        .collect();

    WidgetState::Ready(RankedTable { rows, pagination })
}

/// A salesperson's progress
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetRow {
    /// Display name
    pub name: String,
    /// Target amount
    pub target: f64,
    /// Achieved amount
    pub achieved: f64,
    /// Achieved as percent of target
    pub pct: i64,
}

/// One page of the targets table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetsTable {
    /// Rows of the requested page
    pub rows: Vec<TargetRow>,
    /// Page cursor after clamping
    pub pagination: MiniPagination,
}

/// Targets against achievement, in server order
pub fn targets(snapshot: &DashboardSnapshot, page: usize, page_size: usize) -> WidgetState<TargetsTable> {
    let Some(summary) = snapshot.my_summary.get().filter(|s| !s.targets.is_empty()) else {
        return WidgetState::NoData;
    };

    let mut pagination = MiniPagination::new(summary.targets.len(), page_size);
    pagination.set_page(page);

    let rows = pagination
        .page_items(&summary.targets)
        .iter()
        .map(|t| TargetRow {
            name: t.name.clone(),
            target: t.target,
            achieved: t.achieved,
            pct: metrics::achievement_pct(t),
        })
        .collect();

    WidgetState::Ready(TargetsTable { rows, pagination })
}

/// Personal counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MySummaryView {
    /// Tasks not completed
    pub open_tasks: u64,
    /// Meetings today
    pub meetings_today: u64,
    /// Leads created today
    pub todays_leads: u64,
    /// Deals closing this month
    pub deals_closing_this_month: u64,
    /// Their value, formatted
    pub closing_value: String,
}

/// The signed-in user's counters
pub fn my_summary(snapshot: &DashboardSnapshot) -> WidgetState<MySummaryView> {
    WidgetState::from_option(snapshot.my_summary.get().map(|s| MySummaryView {
        open_tasks: s.open_tasks,
        meetings_today: s.meetings_today,
        todays_leads: s.todays_leads,
        deals_closing_this_month: s.deals_closing_this_month,
        closing_value: format_inr(s.closing_value),
    }))
}

/// One growth line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthRow {
    /// Metric name
    pub metric: &'static str,
    /// Current period
    pub current: f64,
    /// Previous period
    pub previous: f64,
    /// Percent change
    pub change: i64,
}

/// Revenue, deals and leads against the previous period
pub fn growth(snapshot: &DashboardSnapshot) -> WidgetState<Vec<GrowthRow>> {
    WidgetState::from_option(snapshot.growth.get().map(|g| {
        [("Revenue", g.revenue), ("Deals", g.deals), ("Leads", g.leads)]
            .into_iter()
            .map(|(metric, pair)| GrowthRow {
                metric,
                current: pair.current,
                previous: pair.previous,
                change: pct_change(pair.current, pair.previous),
            })
            .collect()
    }))
}

/// Task progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskCompletion {
    /// Done
    pub completed: u64,
    /// All tasks
    pub total: u64,
    /// Past due
    pub overdue: u64,
    /// Done as percent of all
    pub pct: i64,
}

/// Completed against total tasks
pub fn task_completion(snapshot: &DashboardSnapshot) -> WidgetState<TaskCompletion> {
    WidgetState::from_option(
        snapshot
            .task_stats
            .get()
            .filter(|t| t.total > 0)
            .map(|t| TaskCompletion {
                completed: t.completed,
                total: t.total,
                overdue: t.overdue,
                pct: metrics::completion_pct(t),
            }),
    )
}

/// Collected against outstanding payments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSummary {
    /// Collected, formatted
    pub received: String,
    /// Outstanding, formatted
    pub pending: String,
    /// Collected as percent of the sum
    pub received_pct: i64,
}

/// Payment split
pub fn payment_summary(snapshot: &DashboardSnapshot) -> WidgetState<PaymentSummary> {
    WidgetState::from_option(snapshot.stats.get().and_then(|s| {
        let total = s.payment_received + s.payment_pending;
        (total > 0.0).then(|| PaymentSummary {
            received: format_inr(s.payment_received),
            pending: format_inr(s.payment_pending),
            received_pct: percent_of(s.payment_received, total),
        })
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::dashboard::Slice;
    use pretty_assertions::assert_eq;
    use sdrcrm_core::types::{DashboardData, MonthlyStat, MySummary, TaskStats, UserTarget};

    fn item(name: &str, amount: f64) -> BreakdownItem {
        BreakdownItem {
            name: name.to_string(),
            count: 1,
            total_amount: amount,
        }
    }

    fn snapshot_with_breakdown(by_product: Vec<BreakdownItem>) -> DashboardSnapshot {
        DashboardSnapshot {
            breakdown: Slice::Loaded(BreakdownData {
                by_product,
                ..BreakdownData::default()
            }),
            ..DashboardSnapshot::default()
        }
    }

    #[test]
    fn test_every_widget_is_empty_on_empty_snapshot() {
        let snapshot = DashboardSnapshot::default();

        assert!(!kpi_cards(&snapshot).is_ready());
        assert!(!revenue_trend(&snapshot).is_ready());
        assert!(!deal_funnel(&snapshot).is_ready());
        assert!(!lead_funnel(&snapshot).is_ready());
        assert!(!win_rate(&snapshot).is_ready());
        assert!(!ranked(&snapshot, Ranking::Products, 1, 5).is_ready());
        assert!(!targets(&snapshot, 1, 5).is_ready());
        assert!(!my_summary(&snapshot).is_ready());
        assert!(!growth(&snapshot).is_ready());
        assert!(!task_completion(&snapshot).is_ready());
        assert!(!payment_summary(&snapshot).is_ready());
    }

    #[test]
    fn test_kpi_cards_with_growth() {
        let snapshot = DashboardSnapshot {
            stats: Slice::Loaded(DashboardData {
                total_sales: 123_456.0,
                total_deals: 12,
                ..DashboardData::default()
            }),
            growth: Slice::Loaded(GrowthData {
                revenue: GrowthPair {
                    current: 150.0,
                    previous: 100.0,
                },
                ..GrowthData::default()
            }),
            ..DashboardSnapshot::default()
        };

        let cards = kpi_cards(&snapshot);
        let cards = cards.ready().unwrap();
        assert_eq!(cards[0].value, "₹1,23,456");
        assert_eq!(cards[0].change, Some(50));
        assert_eq!(cards[1].change, Some(0));
        assert_eq!(cards[3].change, None);
    }

    #[test]
    fn test_revenue_trend_mom() {
        let snapshot = DashboardSnapshot {
            monthly: Slice::Loaded(vec![
                MonthlyStat {
                    month: "Jan".into(),
                    revenue: 100.0,
                    count: 2,
                },
                MonthlyStat {
                    month: "Feb".into(),
                    revenue: 150.0,
                    count: 3,
                },
            ]),
            ..DashboardSnapshot::default()
        };

        let trend = revenue_trend(&snapshot);
        let trend = trend.ready().unwrap();
        assert_eq!(trend.month_over_month, 50);
        assert_eq!(trend.total_revenue, 250.0);
    }

    #[test]
    fn test_win_rate_widget() {
        let stats: StageStats<DealStage> = serde_json::from_str(
            r#"{"New": {"count": 3, "value": 9000},
                "Closed Won": {"count": 2, "value": 5000},
                "Closed Lost": {"count": 1, "value": 0}}"#,
        )
        .unwrap();
        let snapshot = DashboardSnapshot {
            deal_stats: Slice::Loaded(stats),
            ..DashboardSnapshot::default()
        };

        assert_eq!(
            win_rate(&snapshot),
            WidgetState::Ready(WinRate {
                won: 2,
                lost: 1,
                rate: 67
            })
        );

        let funnel = deal_funnel(&snapshot);
        let funnel = funnel.ready().unwrap();
        assert_eq!(funnel.rows.len(), 6);
        assert_eq!(funnel.rows[0].stage, "New");
        assert_eq!(funnel.rows[0].share, 50);
        assert_eq!(funnel.total_value, 14_000.0);
    }

    #[test]
    fn test_ranked_sorts_and_paginates() {
        let snapshot = snapshot_with_breakdown(vec![
            item("Switch", 10.0),
            item("Router", 40.0),
            item("Firewall", 30.0),
            item("Cable", 20.0),
        ]);

        let table = ranked(&snapshot, Ranking::Products, 2, 3);
        let table = table.ready().unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].name, "Switch");
        assert_eq!(table.rows[0].rank, 4);
        assert_eq!(table.rows[0].share, 10);

        let clamped = ranked(&snapshot, Ranking::Products, 99, 3);
        assert_eq!(clamped.ready().unwrap().pagination.page(), 2);

        assert!(!ranked(&snapshot, Ranking::Partners, 1, 3).is_ready());
    }

    #[test]
    fn test_targets_guard_zero_target() {
        let snapshot = DashboardSnapshot {
            my_summary: Slice::Loaded(MySummary {
                targets: vec![
                    UserTarget {
                        name: "Asha".into(),
                        target: 1000.0,
                        achieved: 250.0,
                        ..UserTarget::default()
                    },
                    UserTarget {
                        name: "Ravi".into(),
                        target: 0.0,
                        achieved: 90.0,
                        ..UserTarget::default()
                    },
                ],
                ..MySummary::default()
            }),
            ..DashboardSnapshot::default()
        };

        let table = targets(&snapshot, 1, 10);
        let rows = &table.ready().unwrap().rows;
        assert_eq!(rows[0].pct, 25);
        assert_eq!(rows[1].pct, 0);
    }

    #[test]
    fn test_task_completion_and_payments() {
        let snapshot = DashboardSnapshot {
            task_stats: Slice::Loaded(TaskStats {
                total: 4,
                completed: 3,
                overdue: 1,
                ..TaskStats::default()
            }),
            stats: Slice::Loaded(DashboardData {
                payment_received: 75_000.0,
                payment_pending: 25_000.0,
                ..DashboardData::default()
            }),
            ..DashboardSnapshot::default()
        };

        assert_eq!(task_completion(&snapshot).ready().unwrap().pct, 75);
        let payments = payment_summary(&snapshot);
        let payments = payments.ready().unwrap();
        assert_eq!(payments.received, "₹75,000");
        assert_eq!(payments.received_pct, 75);
    }
}
