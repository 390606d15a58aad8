//! HTTP client for communicating with the CRM REST API

use crate::session::{LOGIN_ROUTE, LogSessionListener, SessionListener};
use crate::token::{MemoryTokenStore, TokenStore};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, StatusCode};
use sdrcrm_core::config::ApiConfig;
use sdrcrm_core::types::ListQuery;
use sdrcrm_core::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Query string and body of one request
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl RequestOptions {
    /// No query, no body
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the filters of a list query
    #[must_use]
    pub fn query(mut self, query: &ListQuery) -> Self {
        self.query.extend(query.to_pairs());
        self
    }

    /// Append one query parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Send `body` as JSON
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` and send it as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be serialized.
    pub fn body<B: Serialize + ?Sized>(self, body: &B) -> Result<Self> {
        Ok(self.json(serde_json::to_value(body)?))
    }
}

/// API client for the CRM backend.
///
/// Attaches the bearer token from its [`TokenStore`] to every call and turns
/// a 401 into a cleared token plus a redirect to the login route.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    root: String,
    tokens: Arc<dyn TokenStore>,
    session: Arc<dyn SessionListener>,
}

impl ApiClient {
    /// Create a client for the configured backend with an in-memory token
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!("sdrcrm/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.request_timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let http = builder.build().map_err(|e| Error::Configuration {
            message: format!("failed to build HTTP client: {e}"),
        })?;

        Ok(Self {
            http,
            root: config.root(),
            tokens: Arc::new(MemoryTokenStore::new()),
            session: Arc::new(LogSessionListener),
        })
    }

    /// Use `store` for the bearer token
    #[must_use]
    pub fn with_token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.tokens = store;
        self
    }

    /// Notify `listener` when the session expires
    #[must_use]
    pub fn with_session_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.session = listener;
        self
    }

    /// Token store in use
    #[must_use]
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Whether a token is held
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.tokens.get().is_some()
    }

    /// Base URL including the API prefix
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.root, path.trim_start_matches('/'))
    }

    /// Perform a request and return the JSON body.
    ///
    /// A 204 or empty body resolves to `{}`.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthorized`] on 401, after clearing the token
    /// - [`Error::Api`] on any other non-2xx status
    /// - [`Error::Network`] if no response was received
    /// - [`Error::Serialization`] if a 2xx body is not JSON
    pub async fn request(&self, method: Method, path: &str, options: RequestOptions) -> Result<Value> {
        let mut request = self
            .http
            .request(method.clone(), self.url(path))
            .header(ACCEPT, "application/json");

        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }
        if let Some(token) = self.tokens.get() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        tracing::debug!(%method, path, status = status.as_u16(), "api request");

        if status == StatusCode::UNAUTHORIZED {
            self.expire_session();
            return Err(Error::Unauthorized);
        }

        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let body = serde_json::from_str::<Value>(&text).ok();
            return Err(Error::from_status(status.as_u16(), body.as_ref()));
        }

        if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// Perform a request and decode the body as `T`
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::request`], plus a decode failure.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let value = self.request(method, path, options).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// `GET path` decoded as `T`
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::request_as`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request_as(Method::GET, path, RequestOptions::new()).await
    }

    fn expire_session(&self) {
        if let Err(e) = self.tokens.clear() {
            tracing::warn!(error = %e, "failed to clear token after 401");
        }
        self.session.session_expired(LOGIN_ROUTE);
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Network("request timed out".to_string())
    } else {
        Error::Network(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_url_joins_under_prefix() {
        let client = ApiClient::new(&ApiConfig {
            base_url: "http://crm.local:8000/".to_string(),
            ..ApiConfig::default()
        })
        .unwrap();

        assert_eq!(client.root(), "http://crm.local:8000/api");
        assert_eq!(client.url("/deals/stats"), "http://crm.local:8000/api/deals/stats");
        assert_eq!(client.url("deals"), "http://crm.local:8000/api/deals");
    }

    #[test]
    fn test_options_collect_query_pairs() {
        let options = RequestOptions::new()
            .query(&ListQuery::new().stage("New"))
            .param("dealId", "9");

        assert_eq!(
            options.query,
            vec![
                ("stage".to_string(), "New".to_string()),
                ("dealId".to_string(), "9".to_string()),
            ]
        );
    }
}
