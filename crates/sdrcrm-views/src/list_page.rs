//! State of a CRUD list page: search, status filter and pagination

use crate::pagination::MiniPagination;
use sdrcrm_core::Result;
use sdrcrm_core::types::stage::Stage;
use sdrcrm_core::types::{Deal, DealStage, Lead, LeadStage, MasterRecord, Task, TaskStatus, Ticket, User};
use sdrcrm_core::utils::normalize_label;

/// A record a list page can search and filter
pub trait Listable {
    /// Whether the free-text `term` matches any searchable field
    fn matches(&self, term: &str) -> bool;

    /// Value compared against the status filter
    fn status(&self) -> Option<String> {
        None
    }

    /// Whether the record passes the status filter `wanted`.
    ///
    /// Labels compare after [`normalize_label`], so a wire spelling such as
    /// `in_progress` matches the display label `in progress`.
    fn has_status(&self, wanted: &str) -> bool {
        self.status()
            .is_some_and(|status| normalize_label(&status) == normalize_label(wanted))
    }
}

impl Listable for Deal {
    fn matches(&self, term: &str) -> bool {
        Self::matches(self, term)
    }

    fn status(&self) -> Option<String> {
        Some(self.stage.label().to_string())
    }

    fn has_status(&self, wanted: &str) -> bool {
        DealStage::parse(wanted) == Some(self.stage)
    }
}

impl Listable for Lead {
    fn matches(&self, term: &str) -> bool {
        Self::matches(self, term)
    }

    fn status(&self) -> Option<String> {
        Some(self.stage.clone())
    }

    fn has_status(&self, wanted: &str) -> bool {
        match (LeadStage::parse(&self.stage), LeadStage::parse(wanted)) {
            (Some(stage), Some(wanted)) => stage == wanted,
            _ => normalize_label(&self.stage) == normalize_label(wanted),
        }
    }
}

impl Listable for Task {
    fn matches(&self, term: &str) -> bool {
        Self::matches(self, term)
    }

    fn status(&self) -> Option<String> {
        Some(self.status.to_string())
    }

    fn has_status(&self, wanted: &str) -> bool {
        TaskStatus::parse(wanted) == Some(self.status)
    }
}

impl Listable for Ticket {
    fn matches(&self, term: &str) -> bool {
        Self::matches(self, term)
    }

    fn status(&self) -> Option<String> {
        Some(self.status.clone())
    }
}

impl Listable for User {
    fn matches(&self, term: &str) -> bool {
        Self::matches(self, term)
    }

    fn status(&self) -> Option<String> {
        Some(if self.is_active { "active" } else { "inactive" }.to_string())
    }
}

impl Listable for MasterRecord {
    fn matches(&self, term: &str) -> bool {
        Self::matches(self, term)
    }

    fn status(&self) -> Option<String> {
        Some(if self.is_active { "active" } else { "inactive" }.to_string())
    }
}

#[derive(Debug, Clone)]
enum Load<T> {
    Loading,
    Failed(String),
    Loaded(Vec<T>),
}

/// What the page shows
#[derive(Debug, PartialEq)]
pub enum ListView<'a, T> {
    /// Request in flight
    Loading,
    /// Request failed with this message
    Error(&'a str),
    /// The server returned no rows
    Empty,
    /// Rows exist but none match the filters
    NoResults,
    /// Rows of the current page
    Rows {
        /// Matching rows on this page
        rows: Vec<&'a T>,
        /// Rows matching the filters across pages
        matching: usize,
        /// Page cursor
        pagination: MiniPagination,
    },
}

/// Client-side list page over records fetched once
#[derive(Debug, Clone)]
pub struct EntityListPage<T> {
    load: Load<T>,
    search: String,
    status: Option<String>,
    pagination: MiniPagination,
}

impl<T: Listable> EntityListPage<T> {
    /// Page in the loading state
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            load: Load::Loading,
            search: String::new(),
            status: None,
            pagination: MiniPagination::new(0, page_size),
        }
    }

    /// A fetch started again
    pub fn reload(&mut self) {
        self.load = Load::Loading;
        self.refresh();
    }

    /// A fetch finished
    pub fn finish(&mut self, result: Result<Vec<T>>) {
        self.load = match result {
            Ok(items) => Load::Loaded(items),
            Err(e) => Load::Failed(e.to_string()),
        };
        self.refresh();
    }

    /// Change the search term; returns to page 1
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.pagination.set_page(1);
        self.refresh();
    }

    /// Filter on a status value in any spelling; `None` shows all
    pub fn set_status(&mut self, status: Option<String>) {
        self.status = status.filter(|s| !s.trim().is_empty());
        self.pagination.set_page(1);
        self.refresh();
    }

    /// Jump to a page, clamped
    pub fn set_page(&mut self, page: usize) {
        self.pagination.set_page(page);
    }

    /// Current cursor
    #[must_use]
    pub const fn pagination(&self) -> &MiniPagination {
        &self.pagination
    }

    fn keep(&self, item: &T) -> bool {
        let status_ok = self
            .status
            .as_deref()
            .is_none_or(|wanted| item.has_status(wanted));
        status_ok && item.matches(&self.search)
    }

    fn matching(&self) -> Vec<&T> {
        match &self.load {
            Load::Loaded(items) => items.iter().filter(|item| self.keep(item)).collect(),
            Load::Loading | Load::Failed(_) => Vec::new(),
        }
    }

    fn refresh(&mut self) {
        let len = self.matching().len();
        self.pagination.sync_len(len);
    }

    /// What to render now
    #[must_use]
    pub fn view(&self) -> ListView<'_, T> {
        match &self.load {
            Load::Loading => ListView::Loading,
            Load::Failed(message) => ListView::Error(message),
            Load::Loaded(items) if items.is_empty() => ListView::Empty,
            Load::Loaded(_) => {
                let matching = self.matching();
                if matching.is_empty() {
                    return ListView::NoResults;
                }
                ListView::Rows {
                    rows: self.pagination.page_items(&matching).to_vec(),
                    matching: matching.len(),
                    pagination: self.pagination,
                }
            }
        }
    }
}
