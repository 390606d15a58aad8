//! Wire types exchanged with the CRM REST API
//!
//! Every struct here is forgiving on input: the backend omits
//! fields, sends `null` for numbers, and mixes numeric and string ids. Missing
//! numbers read as zero and missing lists read as empty.

pub mod dashboard;
pub mod entities;
pub mod inputs;
pub mod list;
pub mod stage;

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub use dashboard::{
    AggregateResponse, BreakdownData, BreakdownItem, DashboardData, GrowthData, GrowthPair,
    MonthlyStat, MySummary, TaskStats, UserTarget,
};
pub use entities::{
    Deal, Lead, LoginResponse, MasterEntity, MasterRecord, PipelineStage, Quote, SalesEntry,
    Settings, Task, TaskStatus, Ticket, User,
};
pub use inputs::{
    DealInput, LoginForm, MasterRecordInput, SalesOrderForm, TaskInput, TicketInput, UserForm,
};
pub use list::{ListQuery, ListResponse, Page, PageInfo, Rows};
pub use stage::{DEAL_STAGE_ORDER, DealStage, LEAD_STAGES, LeadStage, StageMetric, StageStats};

/// Identifier of any server entity.
///
/// The backend uses numeric ids on some tables and string ids on others, so
/// both are accepted and kept in their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create an id from its textual form
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Textual form, suitable for a URL path segment
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the server left the id blank
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        crate::utils::lenient::string(deserializer).map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_entity_id_accepts_numbers_and_strings() {
        let numeric: EntityId = serde_json::from_str("42").unwrap();
        let text: EntityId = serde_json::from_str("\"64f0c2\"").unwrap();
        let null: EntityId = serde_json::from_str("null").unwrap();

        assert_eq!(numeric.as_str(), "42");
        assert_eq!(text.to_string(), "64f0c2");
        assert!(null.is_empty());
    }

    #[test]
    fn test_entity_id_serializes_as_string() {
        let id = EntityId::from(7_i64);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"7\"");
    }
}
