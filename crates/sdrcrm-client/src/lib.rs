//! HTTP client for the SDR sales CRM REST API
//!
//! [`ApiClient`] owns the transport, bearer token and 401 handling; the
//! resource handles returned by [`ApiClient::deals`], [`ApiClient::tasks`] and
//! friends give each endpoint a typed surface.

#![forbid(unsafe_code)]

pub mod client;
pub mod resources;
pub mod session;
pub mod token;

pub use client::{ApiClient, RequestOptions};
pub use resources::{AuthHandle, DashboardHandle, Resource, SettingsHandle};
pub use session::{LOGIN_ROUTE, LogSessionListener, SessionListener};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};

// Re-export for callers building raw requests
pub use reqwest::Method;
