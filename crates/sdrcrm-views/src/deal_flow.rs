//! Deal stage changes, including the sales-order gate on Closed Won
//!
//! Moving a deal to any stage but Closed Won is a single update. Closed Won
//! first collects a [`SalesOrderForm`]; nothing is written until that form is
//! submitted, and cancelling it sends nothing at all.
//!
//! Submission writes the sales entry and then the stage. The two calls are
//! not atomic. When either fails the deal is re-read from the server and
//! handed back with the error, so the caller shows what the server holds.

use async_trait::async_trait;
use sdrcrm_client::ApiClient;
use sdrcrm_core::types::{Deal, DealStage, EntityId, SalesEntry, SalesOrderForm};
use sdrcrm_core::{Error, Result};
use std::fmt;
use validator::Validate;

/// Calls the workflow makes
///
/// Implemented by [`ApiClient`]; tests substitute a recording fake.
#[async_trait]
pub trait DealGateway: Send + Sync {
    /// `GET /deals/{id}`
    async fn fetch_deal(&self, id: &EntityId) -> Result<Deal>;

    /// Stage-only update
    async fn update_stage(&self, id: &EntityId, stage: DealStage) -> Result<Deal>;

    /// Sales entry already tied to the deal
    async fn find_sales_entry(&self, deal_id: &EntityId) -> Result<Option<SalesEntry>>;

    /// New sales entry; any 2xx reply counts as written
    async fn create_sales_entry(&self, form: &SalesOrderForm) -> Result<()>;

    /// Replace an existing sales entry; any 2xx reply counts as written
    async fn update_sales_entry(&self, id: &EntityId, form: &SalesOrderForm) -> Result<()>;
}

#[async_trait]
impl DealGateway for ApiClient {
    async fn fetch_deal(&self, id: &EntityId) -> Result<Deal> {
        self.deals().get(id).await
    }

    async fn update_stage(&self, id: &EntityId, stage: DealStage) -> Result<Deal> {
        self.deals().update_stage(id, stage).await
    }

    async fn find_sales_entry(&self, deal_id: &EntityId) -> Result<Option<SalesEntry>> {
        self.sales_entries().find_for_deal(deal_id).await
    }

    async fn create_sales_entry(&self, form: &SalesOrderForm) -> Result<()> {
        self.sales_entries().post(form).await.map(drop)
    }

    async fn update_sales_entry(&self, id: &EntityId, form: &SalesOrderForm) -> Result<()> {
        self.sales_entries().put(id, form).await.map(drop)
    }
}

/// A Closed Won move waiting for its sales order
#[derive(Debug, Clone, PartialEq)]
pub struct PendingClosure {
    deal: Deal,
    form: SalesOrderForm,
    existing_entry: Option<EntityId>,
}

impl PendingClosure {
    /// The deal as last read from the server
    #[must_use]
    pub const fn deal(&self) -> &Deal {
        &self.deal
    }

    /// The form as filled so far
    #[must_use]
    pub const fn form(&self) -> &SalesOrderForm {
        &self.form
    }

    /// Edit the form before submitting
    pub fn form_mut(&mut self) -> &mut SalesOrderForm {
        &mut self.form
    }

    /// Id of the sales entry the form was pre-filled from, if any
    #[must_use]
    pub const fn existing_entry(&self) -> Option<&EntityId> {
        self.existing_entry.as_ref()
    }
}

/// Outcome of asking for a stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageChange {
    /// The stage was written; the server's copy of the deal
    Applied(Deal),
    /// The deal is already in that stage; nothing was sent
    Unchanged(Deal),
    /// Closed Won needs a sales order first; nothing was sent
    AwaitingSalesOrder(PendingClosure),
}

/// A stage change that did not go through
#[derive(Debug)]
pub struct StageFailure {
    /// What went wrong
    pub error: Error,
    /// The deal to display: re-read from the server when `refreshed`,
    /// otherwise the last known copy
    pub deal: Deal,
    /// Whether `deal` came from a fresh read
    pub refreshed: bool,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for StageFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Drives stage changes against a [`DealGateway`]
#[derive(Debug, Clone)]
pub struct DealStageFlow<G> {
    gateway: G,
}

impl<G: DealGateway> DealStageFlow<G> {
    /// Flow over `gateway`
    pub const fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Ask to move `deal` to `target`.
    ///
    /// # Errors
    ///
    /// Returns the failure with the re-read deal if the stage update fails.
    pub async fn request_stage(
        &self,
        deal: Deal,
        target: DealStage,
    ) -> std::result::Result<StageChange, StageFailure> {
        if deal.stage == target {
            return Ok(StageChange::Unchanged(deal));
        }

        if target.requires_sales_order() {
            return Ok(StageChange::AwaitingSalesOrder(self.open_closure(deal).await));
        }

        tracing::info!(deal = %deal.id, from = %deal.stage, to = %target, "changing deal stage");
        match self.gateway.update_stage(&deal.id, target).await {
            Ok(updated) => Ok(StageChange::Applied(updated)),
            Err(error) => Err(self.fail(deal, error).await),
        }
    }

    // Pre-fill from an existing entry when there is one; a failed lookup only
    // costs the pre-fill.
    async fn open_closure(&self, deal: Deal) -> PendingClosure {
        let existing = match self.gateway.find_sales_entry(&deal.id).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(deal = %deal.id, error = %e, "could not look up sales entry");
                None
            }
        };

        let form = existing.as_ref().map_or_else(
            || blank_form(&deal),
            |entry| SalesOrderForm::from_entry(deal.id.clone(), entry),
        );

        tracing::info!(deal = %deal.id, prefilled = existing.is_some(), "awaiting sales order");
        PendingClosure {
            existing_entry: existing.map(|e| e.id),
            form,
            deal,
        }
    }

    /// Validate the sales order, write it, then mark the deal Closed Won.
    ///
    /// The entry is looked up again at submit time, so submitting after a
    /// partial failure updates the entry instead of duplicating it. On a
    /// validation error nothing is sent and `pending` can be corrected and
    /// resubmitted.
    ///
    /// # Errors
    ///
    /// Returns the failure with the re-read deal if any call fails, or with
    /// the last known deal if the form is invalid.
    pub async fn submit_sales_order(
        &self,
        pending: &PendingClosure,
    ) -> std::result::Result<Deal, StageFailure> {
        let deal = &pending.deal;
        let mut form = pending.form.clone();
        form.deal_id = deal.id.clone();

        if let Err(errors) = form.validate() {
            return Err(StageFailure {
                error: errors.into(),
                deal: deal.clone(),
                refreshed: false,
            });
        }

        match self.write_closure(&deal.id, &form).await {
            Ok(updated) => {
                tracing::info!(deal = %updated.id, "deal closed won");
                Ok(updated)
            }
            Err(error) => Err(self.fail(deal.clone(), error).await),
        }
    }

    async fn write_closure(&self, deal_id: &EntityId, form: &SalesOrderForm) -> Result<Deal> {
        match self.gateway.find_sales_entry(deal_id).await? {
            Some(entry) => {
                self.gateway.update_sales_entry(&entry.id, form).await?;
            }
            None => {
                self.gateway.create_sales_entry(form).await?;
            }
        }
        self.gateway.update_stage(deal_id, DealStage::ClosedWon).await
    }

    /// Drop the sales order; the deal keeps its last known stage
    #[must_use]
    pub fn cancel(&self, pending: PendingClosure) -> Deal {
        tracing::debug!(deal = %pending.deal.id, "sales order cancelled");
        pending.deal
    }

    async fn fail(&self, deal: Deal, error: Error) -> StageFailure {
        tracing::warn!(deal = %deal.id, error = %error, "stage change failed, re-reading deal");
        match self.gateway.fetch_deal(&deal.id).await {
            Ok(fresh) => StageFailure {
                error,
                deal: fresh,
                refreshed: true,
            },
            Err(e) => {
                tracing::warn!(deal = %deal.id, error = %e, "could not re-read deal");
                StageFailure {
                    error,
                    deal,
                    refreshed: false,
                }
            }
        }
    }
}

fn blank_form(deal: &Deal) -> SalesOrderForm {
    SalesOrderForm {
        deal_id: deal.id.clone(),
        customer: deal.company.clone(),
        product: deal.product.clone().unwrap_or_default(),
        quantity: 1,
        amount: deal.value,
        po_number: String::new(),
        order_date: None,
        delivery_date: None,
        payment_terms: None,
    }
}
