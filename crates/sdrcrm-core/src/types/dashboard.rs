//! Aggregate payloads behind the analytics dashboard

use super::EntityId;
use crate::utils::lenient;
use serde::{Deserialize, Serialize};

/// Headline numbers of the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardData {
    /// Revenue booked in the current period
    #[serde(deserialize_with = "lenient::f64")]
    pub total_sales: f64,
    /// Number of deals
    #[serde(deserialize_with = "lenient::u64")]
    pub total_deals: u64,
    /// Number of leads
    #[serde(deserialize_with = "lenient::u64")]
    pub total_leads: u64,
    /// Number of channel partners
    #[serde(deserialize_with = "lenient::u64")]
    pub total_partners: u64,
    /// Payments collected
    #[serde(deserialize_with = "lenient::f64")]
    pub payment_received: f64,
    /// Payments still outstanding
    #[serde(deserialize_with = "lenient::f64")]
    pub payment_pending: f64,
}

/// Revenue and deal count of one month
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthlyStat {
    /// Month label as sent by the server, e.g. `2024-03` or `Mar`
    #[serde(deserialize_with = "lenient::string")]
    pub month: String,
    /// Revenue in the month
    #[serde(deserialize_with = "lenient::f64")]
    pub revenue: f64,
    /// Deals closed in the month
    #[serde(deserialize_with = "lenient::u64")]
    pub count: u64,
}

/// One row of a sales breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BreakdownItem {
    /// Product, partner or salesperson name
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    /// Number of sales
    #[serde(deserialize_with = "lenient::u64")]
    pub count: u64,
    /// Sum of sale amounts
    #[serde(deserialize_with = "lenient::f64")]
    pub total_amount: f64,
}

/// Sales broken down three ways
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BreakdownData {
    /// Sales by product
    #[serde(deserialize_with = "lenient::vec")]
    pub by_product: Vec<BreakdownItem>,
    /// Sales by partner
    #[serde(deserialize_with = "lenient::vec")]
    pub by_partner: Vec<BreakdownItem>,
    /// Sales by salesperson
    #[serde(deserialize_with = "lenient::vec")]
    pub by_salesperson: Vec<BreakdownItem>,
}

/// A metric in the current and the previous period
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthPair {
    /// Current period
    #[serde(deserialize_with = "lenient::f64")]
    pub current: f64,
    /// Previous period
    #[serde(deserialize_with = "lenient::f64")]
    pub previous: f64,
}

/// Period-over-period growth figures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthData {
    /// Revenue
    pub revenue: GrowthPair,
    /// Deals created
    pub deals: GrowthPair,
    /// Leads created
    pub leads: GrowthPair,
}

/// Response of `GET /data/dashboard/all`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregateResponse {
    /// Headline numbers
    pub stats: Option<DashboardData>,
    /// Monthly revenue series
    pub monthly_stats: Option<Vec<MonthlyStat>>,
    /// Sales breakdowns
    pub breakdown: Option<BreakdownData>,
    /// Growth figures
    pub growth: Option<GrowthData>,
}

/// Target and achievement of one salesperson
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserTarget {
    /// User id
    pub user_id: EntityId,
    /// Display name
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    /// Target amount for the period
    #[serde(deserialize_with = "lenient::f64")]
    pub target: f64,
    /// Amount achieved so far
    #[serde(deserialize_with = "lenient::f64")]
    pub achieved: f64,
}

/// Personal summary of the signed-in user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MySummary {
    /// Tasks not completed
    #[serde(deserialize_with = "lenient::u64")]
    pub open_tasks: u64,
    /// Meetings scheduled today
    #[serde(deserialize_with = "lenient::u64")]
    pub meetings_today: u64,
    /// Leads created today
    #[serde(deserialize_with = "lenient::u64")]
    pub todays_leads: u64,
    /// Deals whose expected close date is in this month
    #[serde(deserialize_with = "lenient::u64")]
    pub deals_closing_this_month: u64,
    /// Value of those deals
    #[serde(deserialize_with = "lenient::f64")]
    pub closing_value: f64,
    /// Per-user targets
    #[serde(deserialize_with = "lenient::vec")]
    pub targets: Vec<UserTarget>,
}

/// Response of `GET /tasks/stats`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskStats {
    /// All tasks
    #[serde(deserialize_with = "lenient::u64")]
    pub total: u64,
    /// Not started
    #[serde(deserialize_with = "lenient::u64")]
    pub pending: u64,
    /// Started
    #[serde(deserialize_with = "lenient::u64")]
    pub in_progress: u64,
    /// Done
    #[serde(deserialize_with = "lenient::u64")]
    pub completed: u64,
    /// Past due and not done
    #[serde(deserialize_with = "lenient::u64")]
    pub overdue: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_aggregate_partial_payload() {
        let json = r#"{
            "stats": {"totalSales": "250000", "totalDeals": 12, "paymentPending": null},
            "monthlyStats": [{"month": "Jan", "revenue": 100}, {"month": "Feb", "revenue": 150, "count": 3}],
            "breakdown": {"byProduct": [{"name": "Router", "totalAmount": 900}], "byPartner": null}
        }"#;
        let response: AggregateResponse = serde_json::from_str(json).unwrap();

        let stats = response.stats.unwrap();
        assert_eq!(stats.total_sales, 250_000.0);
        assert_eq!(stats.total_deals, 12);
        assert_eq!(stats.payment_pending, 0.0);
        assert_eq!(stats.total_leads, 0);

        let monthly = response.monthly_stats.unwrap();
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].count, 0);

        let breakdown = response.breakdown.unwrap();
        assert_eq!(breakdown.by_product[0].count, 0);
        assert!(breakdown.by_partner.is_empty());
        assert!(response.growth.is_none());
    }

    #[test]
    fn test_my_summary_defaults() {
        let summary: MySummary =
            serde_json::from_str(r#"{"openTasks": 4, "targets": [{"userId": 3, "name": "Asha", "target": 1000}]}"#)
                .unwrap();

        assert_eq!(summary.open_tasks, 4);
        assert_eq!(summary.meetings_today, 0);
        assert_eq!(summary.targets[0].user_id.as_str(), "3");
        assert_eq!(summary.targets[0].achieved, 0.0);
    }
}
