//! Records managed by the CRUD pages

use super::{DealStage, EntityId};
use crate::utils::{lenient, matches_search, normalize_label};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A sales opportunity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    /// Server id
    #[serde(alias = "_id")]
    pub id: EntityId,
    /// Deal title
    #[serde(default, alias = "name", deserialize_with = "lenient::string")]
    pub title: String,
    /// Customer company
    #[serde(default, alias = "companyName", deserialize_with = "lenient::string")]
    pub company: String,
    /// Channel partner, if any
    #[serde(default)]
    pub partner: Option<String>,
    /// Product being sold
    #[serde(default)]
    pub product: Option<String>,
    /// Owning salesperson
    #[serde(default)]
    pub owner: Option<String>,
    /// Expected deal value
    #[serde(default, alias = "amount", deserialize_with = "lenient::f64")]
    pub value: f64,
    /// Funnel stage
    pub stage: DealStage,
    /// Expected close date
    #[serde(default)]
    pub expected_close_date: Option<NaiveDate>,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
}

impl Deal {
    /// Whether `term` matches title, company, partner or owner
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        matches_search(&self.title, term)
            || matches_search(&self.company, term)
            || self.partner.as_deref().is_some_and(|p| matches_search(p, term))
            || self.owner.as_deref().is_some_and(|o| matches_search(o, term))
    }
}

/// A pipeline board column returned by `GET /deals/pipeline`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStage {
    /// Stage name as the server spells it
    #[serde(deserialize_with = "lenient::string")]
    pub stage: String,
    /// Deals in the column
    #[serde(default, deserialize_with = "lenient::vec")]
    pub deals: Vec<Deal>,
    /// Value of the column
    #[serde(default, alias = "value", deserialize_with = "lenient::f64")]
    pub total_value: f64,
}

/// A prospect not yet turned into a deal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    /// Server id
    #[serde(alias = "_id")]
    pub id: EntityId,
    /// Contact name
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    /// Company
    #[serde(default, deserialize_with = "lenient::string")]
    pub company: String,
    /// Contact email
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Where the lead came from
    #[serde(default)]
    pub source: Option<String>,
    /// Funnel stage; kept raw since older records carry free-form values
    #[serde(default, alias = "status", deserialize_with = "lenient::string")]
    pub stage: String,
    /// Assigned salesperson
    #[serde(default)]
    pub owner: Option<String>,
}

impl Lead {
    /// Whether `term` matches name, company or email
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        matches_search(&self.name, term)
            || matches_search(&self.company, term)
            || self.email.as_deref().is_some_and(|e| matches_search(e, term))
    }
}

/// Task progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    #[default]
    #[serde(alias = "Pending", alias = "open")]
    Pending,
    /// Started
    #[serde(alias = "In Progress", alias = "in-progress")]
    InProgress,
    /// Done
    #[serde(alias = "Completed", alias = "done")]
    Completed,
}

impl TaskStatus {
    /// Parse a filter value or any wire spelling
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_label(raw).as_str() {
            "pending" | "open" => Some(Self::Pending),
            "in progress" => Some(Self::InProgress),
            "completed" | "done" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// A to-do item, optionally tied to a deal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Server id
    #[serde(alias = "_id")]
    pub id: EntityId,
    /// Title
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    /// Details
    #[serde(default)]
    pub description: Option<String>,
    /// Due date
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Priority label (`low`, `medium`, `high`)
    #[serde(default)]
    pub priority: Option<String>,
    /// Progress
    #[serde(default)]
    pub status: TaskStatus,
    /// Assignee display name
    #[serde(default)]
    pub assigned_to: Option<String>,
    /// Related deal
    #[serde(default)]
    pub deal_id: Option<EntityId>,
}

impl Task {
    /// Whether the task is past due on `today` and not done
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Completed && self.due_date.is_some_and(|d| d < today)
    }

    /// Whether `term` matches title or assignee
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        matches_search(&self.title, term)
            || self.assigned_to.as_deref().is_some_and(|a| matches_search(a, term))
    }
}

/// A support ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Server id
    #[serde(alias = "_id")]
    pub id: EntityId,
    /// Subject line
    #[serde(default, deserialize_with = "lenient::string")]
    pub subject: String,
    /// Customer name
    #[serde(default)]
    pub customer: Option<String>,
    /// Status label
    #[serde(default, deserialize_with = "lenient::string")]
    pub status: String,
    /// Priority label
    #[serde(default)]
    pub priority: Option<String>,
}

impl Ticket {
    /// Whether `term` matches subject or customer
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        matches_search(&self.subject, term)
            || self.customer.as_deref().is_some_and(|c| matches_search(c, term))
    }
}

/// A CRM user as seen by the admin page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Server id
    #[serde(alias = "_id")]
    pub id: EntityId,
    /// Display name
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    /// Login email
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    /// Role (`admin`, `manager`, `sales`)
    #[serde(default, deserialize_with = "lenient::string")]
    pub role: String,
    /// Whether the account can sign in
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl User {
    /// Whether `term` matches name, email or role
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        matches_search(&self.name, term)
            || matches_search(&self.email, term)
            || matches_search(&self.role, term)
    }
}

/// Response of `POST /auth/login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Bearer token
    #[serde(alias = "access_token", alias = "accessToken")]
    pub token: String,
    /// Signed-in user
    #[serde(default)]
    pub user: Option<User>,
}

/// Reference entities managed through the generic master-data tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MasterEntity {
    /// Original equipment manufacturers
    Oems,
    /// Product categories
    Categories,
    /// Office and delivery locations
    Locations,
    /// Products
    Products,
    /// Channel partners
    Partners,
}

impl MasterEntity {
    /// Every master entity, in tab order
    pub const ALL: [Self; 5] = [
        Self::Oems,
        Self::Categories,
        Self::Locations,
        Self::Products,
        Self::Partners,
    ];

    /// Path segment under `/data/master/`
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Oems => "oems",
            Self::Categories => "categories",
            Self::Locations => "locations",
            Self::Products => "products",
            Self::Partners => "partners",
        }
    }
}

impl fmt::Display for MasterEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl std::str::FromStr for MasterEntity {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|e| e.path_segment() == wanted || e.path_segment().trim_end_matches('s') == wanted)
            .ok_or_else(|| crate::Error::validation("entity", format!("unknown master entity '{s}'")))
    }
}

/// A row of any master-data table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterRecord {
    /// Server id
    #[serde(alias = "_id")]
    pub id: EntityId,
    /// Display name
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    /// Short code
    #[serde(default)]
    pub code: Option<String>,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the record is selectable in forms
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Entity-specific columns
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MasterRecord {
    /// Whether `term` matches name, code or description
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        matches_search(&self.name, term)
            || self.code.as_deref().is_some_and(|c| matches_search(c, term))
            || self.description.as_deref().is_some_and(|d| matches_search(d, term))
    }
}

/// Fulfilment record tied to a won deal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesEntry {
    /// Server id
    #[serde(alias = "_id")]
    pub id: EntityId,
    /// Deal this entry fulfils
    #[serde(default)]
    pub deal_id: Option<EntityId>,
    /// Customer name
    #[serde(default, deserialize_with = "lenient::string")]
    pub customer: String,
    /// Product sold
    #[serde(default, deserialize_with = "lenient::string")]
    pub product: String,
    /// Units sold
    #[serde(default, deserialize_with = "lenient::u64")]
    pub quantity: u64,
    /// Order amount
    #[serde(default, deserialize_with = "lenient::f64")]
    pub amount: f64,
    /// Purchase order number
    #[serde(default)]
    pub po_number: Option<String>,
    /// Order date
    #[serde(default)]
    pub order_date: Option<NaiveDate>,
    /// Promised delivery date
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    /// Payment terms
    #[serde(default)]
    pub payment_terms: Option<String>,
}

/// A commercial quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Server id
    #[serde(alias = "_id")]
    pub id: EntityId,
    /// Human quote number
    #[serde(default, deserialize_with = "lenient::string")]
    pub quote_number: String,
    /// Deal quoted
    #[serde(default)]
    pub deal_id: Option<EntityId>,
    /// Quoted amount
    #[serde(default, deserialize_with = "lenient::f64")]
    pub amount: f64,
    /// Status label
    #[serde(default, deserialize_with = "lenient::string")]
    pub status: String,
    /// Validity end
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
}

/// Organisation-wide settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Company name on quotes
    #[serde(default)]
    pub company_name: Option<String>,
    /// Currency code
    #[serde(default)]
    pub currency: Option<String>,
    /// Month (1-12) the fiscal year starts in
    #[serde(default)]
    pub fiscal_year_start: Option<u8>,
    /// Any other keys, preserved on update
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_task_status_parses_filter_spellings() {
        assert_eq!(TaskStatus::parse("in_progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("In Progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("done"), Some(TaskStatus::Completed));
        assert_eq!(TaskStatus::parse("OPEN"), Some(TaskStatus::Pending));
        assert_eq!(TaskStatus::parse("blocked"), None);
    }

    #[test]
    fn test_deal_aliases_and_defaults() {
        let deal: Deal = serde_json::from_str(
            r#"{"_id": 11, "name": "Firewall refresh", "amount": "45000", "stage": "negotiation"}"#,
        )
        .unwrap();

        assert_eq!(deal.id.as_str(), "11");
        assert_eq!(deal.title, "Firewall refresh");
        assert_eq!(deal.value, 45000.0);
        assert_eq!(deal.stage, DealStage::Negotiation);
        assert!(deal.company.is_empty());
        assert!(deal.expected_close_date.is_none());
    }

    #[test]
    fn test_deal_matches() {
        let deal: Deal = serde_json::from_str(
            r#"{"id": "d1", "title": "Switches", "company": "Acme", "owner": "Ravi", "stage": "New"}"#,
        )
        .unwrap();

        assert!(deal.matches("acme"));
        assert!(deal.matches("RAVI"));
        assert!(!deal.matches("globex"));
    }

    #[test]
    fn test_task_status_aliases() {
        let task: Task =
            serde_json::from_str(r#"{"id": 1, "title": "Call back", "status": "In Progress"}"#).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);

        let done: Task = serde_json::from_str(r#"{"id": 2, "status": "done"}"#).unwrap();
        assert_eq!(done.status, TaskStatus::Completed);

        let missing: Task = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        assert_eq!(missing.status, TaskStatus::Pending);
    }

    #[test]
    fn test_task_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let mut task: Task =
            serde_json::from_str(r#"{"id": 1, "dueDate": "2024-06-01"}"#).unwrap();

        assert!(task.is_overdue(today));
        task.status = TaskStatus::Completed;
        assert!(!task.is_overdue(today));
    }

    #[test]
    fn test_master_entity_parsing() {
        assert_eq!("categories".parse::<MasterEntity>().unwrap(), MasterEntity::Categories);
        assert_eq!("Location".parse::<MasterEntity>().unwrap(), MasterEntity::Locations);
        assert!("widgets".parse::<MasterEntity>().is_err());
        assert_eq!(MasterEntity::Oems.to_string(), "oems");
    }

    #[test]
    fn test_master_record_keeps_extra_columns() {
        let record: MasterRecord =
            serde_json::from_str(r#"{"id": 5, "name": "Pune", "state": "MH"}"#).unwrap();

        assert!(record.is_active);
        assert_eq!(record.extra.get("state").unwrap(), "MH");
        assert!(record.matches("pun"));
    }

    #[test]
    fn test_login_response_token_aliases() {
        let login: LoginResponse =
            serde_json::from_str(r#"{"access_token": "abc", "user": null}"#).unwrap();
        assert_eq!(login.token, "abc");
        assert!(login.user.is_none());
    }
}
