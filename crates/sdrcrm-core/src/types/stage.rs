//! Funnel stages for deals and leads, and per-stage aggregates

use crate::utils::normalize_label;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A closed, ordered set of funnel stages
pub trait Stage: Copy + Eq + fmt::Debug + 'static {
    /// Every stage in display order
    const ORDER: &'static [Self];

    /// Display label, also the canonical wire value
    fn label(self) -> &'static str;

    /// Parse any of the spellings the backend and older pages use
    fn parse(raw: &str) -> Option<Self>;
}

/// Position of a deal in the sales funnel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DealStage {
    /// Freshly created opportunity
    New,
    /// Proposal sent to the customer
    Proposal,
    /// Stalled, customer unresponsive
    Cold,
    /// Terms under negotiation
    Negotiation,
    /// Terminal: won, backed by a sales order
    ClosedWon,
    /// Terminal: lost
    ClosedLost,
}

/// Display order of deal stages on the dashboard and pipeline board
pub const DEAL_STAGE_ORDER: [DealStage; 6] = [
    DealStage::New,
    DealStage::Proposal,
    DealStage::Cold,
    DealStage::Negotiation,
    DealStage::ClosedWon,
    DealStage::ClosedLost,
];

impl DealStage {
    /// Whether no further transition is expected
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::ClosedWon | Self::ClosedLost)
    }

    /// Whether moving into this stage needs the sales order workflow
    #[must_use]
    pub const fn requires_sales_order(self) -> bool {
        matches!(self, Self::ClosedWon)
    }
}

impl Stage for DealStage {
    const ORDER: &'static [Self] = &DEAL_STAGE_ORDER;

    fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Proposal => "Proposal",
            Self::Cold => "Cold",
            Self::Negotiation => "Negotiation",
            Self::ClosedWon => "Closed Won",
            Self::ClosedLost => "Closed Lost",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match normalize_label(raw).as_str() {
            "new" => Some(Self::New),
            "proposal" | "proposal sent" => Some(Self::Proposal),
            "cold" => Some(Self::Cold),
            "negotiation" | "negotiating" => Some(Self::Negotiation),
            "closed won" | "won" => Some(Self::ClosedWon),
            "closed lost" | "lost" => Some(Self::ClosedLost),
            _ => None,
        }
    }
}

/// Position of a lead in the qualification funnel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LeadStage {
    /// Not yet contacted
    New,
    /// First contact made
    Contacted,
    /// Need and budget confirmed
    Qualified,
    /// Proposal shared
    Proposal,
    /// Turned into a deal
    Converted,
    /// Dropped
    Lost,
}

/// Display order of lead stages
pub const LEAD_STAGES: [LeadStage; 6] = [
    LeadStage::New,
    LeadStage::Contacted,
    LeadStage::Qualified,
    LeadStage::Proposal,
    LeadStage::Converted,
    LeadStage::Lost,
];

impl Stage for LeadStage {
    const ORDER: &'static [Self] = &LEAD_STAGES;

    fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Contacted => "Contacted",
            Self::Qualified => "Qualified",
            Self::Proposal => "Proposal",
            Self::Converted => "Converted",
            Self::Lost => "Lost",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match normalize_label(raw).as_str() {
            "new" => Some(Self::New),
            "contacted" => Some(Self::Contacted),
            "qualified" => Some(Self::Qualified),
            "proposal" | "proposal sent" => Some(Self::Proposal),
            "converted" | "won" => Some(Self::Converted),
            "lost" | "disqualified" => Some(Self::Lost),
            _ => None,
        }
    }
}

macro_rules! stage_serde {
    ($stage:ty, $what:literal) => {
        impl fmt::Display for $stage {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl std::str::FromStr for $stage {
            type Err = crate::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as Stage>::parse(s)
                    .ok_or_else(|| crate::Error::validation("stage", format!("unknown {} '{s}'", $what)))
            }
        }

        impl Serialize for $stage {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }

        impl<'de> Deserialize<'de> for $stage {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                <Self as Stage>::parse(&raw)
                    .ok_or_else(|| serde::de::Error::custom(format!("unknown {} '{raw}'", $what)))
            }
        }
    };
}

stage_serde!(DealStage, "deal stage");
stage_serde!(LeadStage, "lead stage");

/// Count and total value of the records in one stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageMetric {
    /// Number of records
    #[serde(default, deserialize_with = "crate::utils::lenient::u64")]
    pub count: u64,
    /// Sum of record values
    #[serde(default, deserialize_with = "crate::utils::lenient::f64")]
    pub value: f64,
}

/// Per-stage aggregates in canonical stage order.
///
/// Built from the server's `{stage name: {count, value}}` map. Every known
/// stage is present (zero when the server omitted it); unknown keys are
/// dropped, and spellings of the same stage are summed.
#[derive(Debug, Clone, PartialEq)]
pub struct StageStats<S: Stage> {
    entries: Vec<(S, StageMetric)>,
}

impl<S: Stage> StageStats<S> {
    /// Fold a raw stage map into canonical order
    #[must_use]
    pub fn from_raw(raw: &IndexMap<String, StageMetric>) -> Self {
        let mut entries: Vec<(S, StageMetric)> = S::ORDER
            .iter()
            .map(|stage| (*stage, StageMetric::default()))
            .collect();

        for (key, metric) in raw {
            let Some(stage) = S::parse(key) else {
                tracing::debug!(stage = %key, "dropping unknown stage key");
                continue;
            };
            if let Some((_, slot)) = entries.iter_mut().find(|(s, _)| *s == stage) {
                slot.count = slot.count.saturating_add(metric.count);
                slot.value += metric.value;
            }
        }

        Self { entries }
    }

    /// Metric for one stage
    #[must_use]
    pub fn get(&self, stage: S) -> StageMetric {
        self.entries
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, m)| *m)
            .unwrap_or_default()
    }

    /// Stages with their metrics, in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (S, StageMetric)> + '_ {
        self.entries.iter().copied()
    }

    /// Sum of counts over all stages
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.entries
            .iter()
            .fold(0, |total, (_, m)| total.saturating_add(m.count))
    }

    /// Sum of values over all stages
    #[must_use]
    pub fn total_value(&self) -> f64 {
        self.entries.iter().map(|(_, m)| m.value).sum()
    }
}

impl<S: Stage> Default for StageStats<S> {
    fn default() -> Self {
        Self::from_raw(&IndexMap::new())
    }
}

impl<'de, S: Stage> Deserialize<'de> for StageStats<S> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<IndexMap<String, StageMetric>>::deserialize(deserializer)?;
        Ok(raw.map_or_else(Self::default, |raw| Self::from_raw(&raw)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_huge_counts_saturate() {
        let mut raw = IndexMap::new();
        let metric = |count| StageMetric { count, value: 1.0 };
        raw.insert("Closed Won".to_string(), metric(u64::MAX));
        raw.insert("closed_won".to_string(), metric(5));
        raw.insert("New".to_string(), metric(u64::MAX));

        let stats = StageStats::<DealStage>::from_raw(&raw);

        assert_eq!(stats.get(DealStage::ClosedWon).count, u64::MAX);
        assert_eq!(stats.total_count(), u64::MAX);
    }

    #[rstest]
    #[case("Closed Won", DealStage::ClosedWon)]
    #[case("closed_won", DealStage::ClosedWon)]
    #[case("won", DealStage::ClosedWon)]
    #[case("CLOSED-LOST", DealStage::ClosedLost)]
    #[case(" negotiation ", DealStage::Negotiation)]
    #[case("Proposal Sent", DealStage::Proposal)]
    fn test_deal_stage_spellings(#[case] raw: &str, #[case] expected: DealStage) {
        assert_eq!(DealStage::parse(raw), Some(expected));
    }

    #[test]
    fn test_deal_stage_unknown() {
        assert_eq!(DealStage::parse("Qualified"), None);
        assert!("Qualified".parse::<DealStage>().is_err());
        assert!(serde_json::from_str::<DealStage>("\"Archived\"").is_err());
    }

    #[test]
    fn test_deal_stage_serializes_label() {
        assert_eq!(
            serde_json::to_string(&DealStage::ClosedWon).unwrap(),
            "\"Closed Won\""
        );
        assert_eq!(DealStage::ClosedLost.to_string(), "Closed Lost");
    }

    #[test]
    fn test_terminal_stages() {
        let terminal: Vec<_> = DEAL_STAGE_ORDER
            .iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(terminal, vec![&DealStage::ClosedWon, &DealStage::ClosedLost]);
        assert!(DealStage::ClosedWon.requires_sales_order());
        assert!(!DealStage::Negotiation.requires_sales_order());
    }

    #[test]
    fn test_stage_stats_orders_and_drops_unknown() {
        let json = r#"{
            "Closed Won": {"count": 2, "value": 5000},
            "Archived": {"count": 9, "value": 1},
            "New": {"count": 3, "value": 9000}
        }"#;
        let stats: StageStats<DealStage> = serde_json::from_str(json).unwrap();

        let stages: Vec<_> = stats.iter().map(|(s, _)| s).collect();
        assert_eq!(stages, DEAL_STAGE_ORDER.to_vec());
        assert_eq!(stats.get(DealStage::New).count, 3);
        assert_eq!(stats.get(DealStage::ClosedWon).value, 5000.0);
        assert_eq!(stats.get(DealStage::Cold), StageMetric::default());
        assert_eq!(stats.total_count(), 5);
        assert_eq!(stats.total_value(), 14000.0);
    }

    #[test]
    fn test_stage_stats_sums_spellings() {
        let json = r#"{"won": {"count": 1, "value": 100}, "Closed Won": {"count": 2}}"#;
        let stats: StageStats<DealStage> = serde_json::from_str(json).unwrap();

        assert_eq!(stats.get(DealStage::ClosedWon).count, 3);
        assert_eq!(stats.get(DealStage::ClosedWon).value, 100.0);
    }

    #[test]
    fn test_stage_stats_null_is_empty() {
        let stats: StageStats<LeadStage> = serde_json::from_str("null").unwrap();
        assert_eq!(stats.total_count(), 0);
        assert_eq!(stats.iter().count(), LEAD_STAGES.len());
    }
}
