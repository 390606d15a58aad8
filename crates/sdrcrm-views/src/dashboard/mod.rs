//! Dashboard aggregation: one concurrent fetch, many derived widgets

pub mod loader;
pub mod metrics;
pub mod snapshot;
pub mod widgets;

pub use loader::{DashboardLoader, DashboardSource};
pub use snapshot::{DashboardSnapshot, Slice};
pub use widgets::{Ranking, WidgetState};
