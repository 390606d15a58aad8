//! Typed handles for each REST resource

use crate::client::{ApiClient, RequestOptions};
use reqwest::Method;
use sdrcrm_core::types::{
    AggregateResponse, Deal, DealStage, EntityId, Lead, LeadStage, ListQuery, ListResponse,
    LoginForm, LoginResponse, MasterEntity, MasterRecord, MySummary, Page, PipelineStage, Quote,
    SalesEntry, Settings, StageStats, Task, TaskStats, Ticket, User,
};
use sdrcrm_core::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use validator::Validate;

/// Keys a bare write acknowledgement carries instead of a record
const ACK_KEYS: [&str; 4] = ["message", "detail", "success", "status"];

/// Single-record bodies arrive bare or as `{data: ...}`
fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or_default()
        }
        other => other,
    }
}

/// Whether a write answered with no record: 204, `{}` or `{"message": ...}`
fn is_ack(body: &Value) -> bool {
    match body {
        Value::Object(map) => map.keys().all(|key| ACK_KEYS.contains(&key.as_str())),
        _ => true,
    }
}

/// What a create or update answered with
enum Written<T> {
    /// The stored record
    Record(T),
    /// An acknowledgement, with the record id when the body named one
    Ack(Option<EntityId>),
}

impl<T: DeserializeOwned> Written<T> {
    fn from_body(body: Value) -> Self {
        let body = unwrap_data(body);
        let id = body
            .get("id")
            .or_else(|| body.get("_id"))
            .and_then(|id| serde_json::from_value::<EntityId>(id.clone()).ok())
            .filter(|id| !id.is_empty());
        let has_fields = body.as_object().is_some_and(|map| {
            map.keys()
                .any(|key| key != "id" && key != "_id" && !ACK_KEYS.contains(&key.as_str()))
        });
        if id.is_none() || !has_fields {
            return Self::Ack(id);
        }

        match serde_json::from_value(body) {
            Ok(record) => Self::Record(record),
            Err(e) => {
                tracing::debug!(error = %e, "write answered with a partial record");
                Self::Ack(id)
            }
        }
    }
}

/// CRUD handle for one collection endpoint
#[derive(Debug)]
pub struct Resource<'c, T> {
    client: &'c ApiClient,
    path: String,
    _record: PhantomData<fn() -> T>,
}

impl<'c, T: DeserializeOwned> Resource<'c, T> {
    fn new(client: &'c ApiClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
            _record: PhantomData,
        }
    }

    /// Collection path below the API root
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    fn item_path(&self, id: &EntityId) -> String {
        format!("{}/{id}", self.path)
    }

    /// `GET /{resource}` with filters, normalized to a [`Page`]
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a list.
    pub async fn list(&self, query: &ListQuery) -> Result<Page<T>> {
        let response: ListResponse<T> = self
            .client
            .request_as(Method::GET, &self.path, RequestOptions::new().query(query))
            .await?;
        Ok(response.into())
    }

    /// `GET /{resource}/{id}`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the record cannot be decoded.
    pub async fn get(&self, id: &EntityId) -> Result<T> {
        let body = self
            .client
            .request(Method::GET, &self.item_path(id), RequestOptions::new())
            .await?;
        Ok(serde_json::from_value(unwrap_data(body))?)
    }

    /// `POST /{resource}`, returning the created record.
    ///
    /// When the server only acknowledges the write, the record is read back
    /// by the id the acknowledgement names.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, or if the server acknowledged
    /// the write without naming the new record.
    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<T> {
        let response = self.post(body).await?;

        match Written::from_body(response) {
            Written::Record(record) => Ok(record),
            Written::Ack(Some(id)) => self.get(&id).await,
            Written::Ack(None) => Err(Error::Other(format!(
                "POST {} succeeded but did not return the created record",
                self.path
            ))),
        }
    }

    /// `PUT /{resource}/{id}`, returning the stored record.
    ///
    /// A 204 or bare acknowledgement is followed by a `GET` of the record.
    ///
    /// # Errors
    ///
    /// Returns an error if the write or the follow-up read fails.
    pub async fn update<B: Serialize + ?Sized>(&self, id: &EntityId, body: &B) -> Result<T> {
        let response = self.put(id, body).await?;

        match Written::from_body(response) {
            Written::Record(record) => Ok(record),
            Written::Ack(_) => self.get(id).await,
        }
    }

    /// `POST /{resource}` when the created record is not needed
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn post<B: Serialize + ?Sized>(&self, body: &B) -> Result<Value> {
        self.client
            .request(Method::POST, &self.path, RequestOptions::new().body(body)?)
            .await
    }

    /// `PUT /{resource}/{id}` when the stored record is not needed
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn put<B: Serialize + ?Sized>(&self, id: &EntityId, body: &B) -> Result<Value> {
        self.client
            .request(Method::PUT, &self.item_path(id), RequestOptions::new().body(body)?)
            .await
    }

    /// `DELETE /{resource}/{id}`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete(&self, id: &EntityId) -> Result<()> {
        self.client
            .request(Method::DELETE, &self.item_path(id), RequestOptions::new())
            .await?;
        Ok(())
    }
}

impl Resource<'_, Deal> {
    /// `GET /deals/stats`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn stats(&self) -> Result<StageStats<DealStage>> {
        self.client.get("/deals/stats").await
    }

    /// `GET /deals/pipeline`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn pipeline(&self) -> Result<Vec<PipelineStage>> {
        let columns: ListResponse<PipelineStage> = self.client.get("/deals/pipeline").await?;
        Ok(Page::from(columns).items)
    }

    /// Single-field stage update
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn update_stage(&self, id: &EntityId, stage: DealStage) -> Result<Deal> {
        tracing::info!(deal = %id, %stage, "updating deal stage");
        self.update(id, &serde_json::json!({ "stage": stage })).await
    }
}

impl Resource<'_, Lead> {
    /// `GET /leads/stats`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn stats(&self) -> Result<StageStats<LeadStage>> {
        self.client.get("/leads/stats").await
    }
}

impl Resource<'_, Task> {
    /// `GET /tasks/stats`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn stats(&self) -> Result<TaskStats> {
        self.client.get("/tasks/stats").await
    }

    /// `PUT /tasks/{id}/complete`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn complete(&self, id: &EntityId) -> Result<()> {
        let path = format!("{}/complete", self.item_path(id));
        self.client
            .request(Method::PUT, &path, RequestOptions::new())
            .await?;
        Ok(())
    }
}

impl Resource<'_, SalesEntry> {
    /// The sales entry tied to `deal_id`, if one exists.
    ///
    /// The server filter is advisory; rows for other deals are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn find_for_deal(&self, deal_id: &EntityId) -> Result<Option<SalesEntry>> {
        let page = self
            .list(&ListQuery::new().filter("dealId", deal_id.as_str()))
            .await?;
        Ok(page
            .items
            .into_iter()
            .find(|entry| entry.deal_id.as_ref() == Some(deal_id)))
    }
}

/// `GET`/`PUT /settings`
#[derive(Debug, Clone, Copy)]
pub struct SettingsHandle<'c> {
    client: &'c ApiClient,
}

impl SettingsHandle<'_> {
    /// Current settings
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get(&self) -> Result<Settings> {
        let body = self.client.get::<Value>("/settings").await?;
        Ok(serde_json::from_value(unwrap_data(body))?)
    }

    /// Replace settings; unknown keys read earlier are sent back untouched.
    ///
    /// An acknowledgement-only reply is followed by a fresh read.
    ///
    /// # Errors
    ///
    /// Returns an error if the write or the follow-up read fails.
    pub async fn update(&self, settings: &Settings) -> Result<Settings> {
        let body = unwrap_data(
            self.client
                .request(Method::PUT, "/settings", RequestOptions::new().body(settings)?)
                .await?,
        );
        if is_ack(&body) {
            return self.get().await;
        }
        Ok(serde_json::from_value(body)?)
    }
}

/// Dashboard aggregate endpoints
#[derive(Debug, Clone, Copy)]
pub struct DashboardHandle<'c> {
    client: &'c ApiClient,
}

impl DashboardHandle<'_> {
    /// `GET /data/dashboard/all`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn all(&self) -> Result<AggregateResponse> {
        self.client.get("/data/dashboard/all").await
    }

    /// `GET /data/dashboard/my-summary`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn my_summary(&self) -> Result<MySummary> {
        self.client.get("/data/dashboard/my-summary").await
    }
}

/// Sign-in and sign-out
#[derive(Debug, Clone, Copy)]
pub struct AuthHandle<'c> {
    client: &'c ApiClient,
}

impl AuthHandle<'_> {
    /// Validate the form, `POST /auth/login` and keep the returned token
    ///
    /// # Errors
    ///
    /// Returns a validation error before any request, or an error if the
    /// request fails or the token cannot be stored.
    pub async fn login(&self, form: &LoginForm) -> Result<LoginResponse> {
        form.validate()?;

        let response: LoginResponse = self
            .client
            .request_as(Method::POST, "/auth/login", RequestOptions::new().body(form)?)
            .await?;
        self.client.tokens().set(&response.token)?;

        tracing::info!(email = %form.email, "signed in");
        Ok(response)
    }

    /// Forget the token
    ///
    /// # Errors
    ///
    /// Returns an error if the stored token cannot be removed.
    pub fn logout(&self) -> Result<()> {
        self.client.tokens().clear()?;
        tracing::info!("signed out");
        Ok(())
    }
}

impl ApiClient {
    /// `/deals`
    #[must_use]
    pub fn deals(&self) -> Resource<'_, Deal> {
        Resource::new(self, "/deals")
    }

    /// `/leads`
    #[must_use]
    pub fn leads(&self) -> Resource<'_, Lead> {
        Resource::new(self, "/leads")
    }

    /// `/tasks`
    #[must_use]
    pub fn tasks(&self) -> Resource<'_, Task> {
        Resource::new(self, "/tasks")
    }

    /// `/tickets`
    #[must_use]
    pub fn tickets(&self) -> Resource<'_, Ticket> {
        Resource::new(self, "/tickets")
    }

    /// `/admin/users`
    #[must_use]
    pub fn users(&self) -> Resource<'_, User> {
        Resource::new(self, "/admin/users")
    }

    /// `/data/master/{entity}`
    #[must_use]
    pub fn master(&self, entity: MasterEntity) -> Resource<'_, MasterRecord> {
        Resource::new(self, format!("/data/master/{}", entity.path_segment()))
    }

    /// `/data/sales-entries`
    #[must_use]
    pub fn sales_entries(&self) -> Resource<'_, SalesEntry> {
        Resource::new(self, "/data/sales-entries")
    }

    /// `/quotes`
    #[must_use]
    pub fn quotes(&self) -> Resource<'_, Quote> {
        Resource::new(self, "/quotes")
    }

    /// `/settings`
    #[must_use]
    pub const fn settings(&self) -> SettingsHandle<'_> {
        SettingsHandle { client: self }
    }

    /// Dashboard aggregates
    #[must_use]
    pub const fn dashboard(&self) -> DashboardHandle<'_> {
        DashboardHandle { client: self }
    }

    /// Sign-in and sign-out
    #[must_use]
    pub const fn auth(&self) -> AuthHandle<'_> {
        AuthHandle { client: self }
    }
}
