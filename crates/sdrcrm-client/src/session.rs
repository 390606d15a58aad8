//! Notification of an expired session

use std::fmt;

/// Route the user is sent to when the session expires
pub const LOGIN_ROUTE: &str = "/";

/// Receives the redirect issued after the API answers 401.
///
/// The token has already been cleared when this is called.
pub trait SessionListener: Send + Sync + fmt::Debug {
    /// The session ended; the front-end should navigate to `redirect_to`
    fn session_expired(&self, redirect_to: &str);
}

/// Listener that only logs the redirect
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSessionListener;

impl SessionListener for LogSessionListener {
    fn session_expired(&self, redirect_to: &str) {
        tracing::warn!(redirect_to, "session expired");
    }
}
