//! View-model layer of the SDR sales CRM client
//!
//! Everything here is presentation logic without a screen: paging, dashboard
//! aggregation into widget view models, list page state, and the deal stage
//! workflow. Front-ends render what these types produce.

#![forbid(unsafe_code)]

pub mod dashboard;
pub mod deal_flow;
pub mod list_page;
pub mod pagination;

pub use dashboard::{DashboardLoader, DashboardSnapshot, DashboardSource, Slice, WidgetState};
pub use deal_flow::{DealGateway, DealStageFlow, PendingClosure, StageChange, StageFailure};
pub use list_page::{EntityListPage, ListView, Listable};
pub use pagination::MiniPagination;
