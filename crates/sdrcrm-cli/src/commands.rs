//! Command handlers

use crate::render::{self, Row};
use crate::{OutputFormat, SalesOrderArgs};
use sdrcrm_client::{ApiClient, FileTokenStore, SessionListener};
use sdrcrm_core::types::stage::Stage;
use sdrcrm_core::types::{DealStage, EntityId, LoginForm, SalesOrderForm};
use sdrcrm_core::{Config, Error, Page, Result};
use sdrcrm_views::dashboard::widgets::{self, Ranking};
use sdrcrm_views::{
    DashboardLoader, DealStageFlow, EntityListPage, ListView, Listable, StageChange, StageFailure,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Tells the user to sign in again once the server rejects the token
#[derive(Debug)]
struct TerminalSessionListener;

impl SessionListener for TerminalSessionListener {
    fn session_expired(&self, _redirect_to: &str) {
        eprintln!("Session expired. Run `sdrcrm login` to sign in again.");
    }
}

/// Everything a command needs
#[derive(Debug)]
pub(crate) struct Context {
    pub(crate) config: Config,
    pub(crate) client: ApiClient,
    pub(crate) output: OutputFormat,
}

impl Context {
    /// Client over the configured API, with the token kept on disk
    pub(crate) fn new(config: Config, output: OutputFormat) -> Result<Self> {
        let tokens = FileTokenStore::open(config.auth.token_path())?;
        let client = ApiClient::new(&config.api)?
            .with_token_store(Arc::new(tokens))
            .with_session_listener(Arc::new(TerminalSessionListener));

        Ok(Self {
            config,
            client,
            output,
        })
    }

    fn page_size(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.config.display.page_size)
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) async fn login(ctx: &Context, email: String, password: String) -> Result<()> {
    let response = ctx
        .client
        .auth()
        .login(&LoginForm { email, password })
        .await?;

    match response.user {
        Some(user) => println!("Signed in as {} ({})", user.name, user.email),
        None => println!("Signed in"),
    }
    Ok(())
}

pub(crate) fn logout(ctx: &Context) -> Result<()> {
    ctx.client.auth().logout()?;
    println!("Signed out");
    Ok(())
}

pub(crate) async fn dashboard(ctx: &Context, page_size: Option<usize>) -> Result<()> {
    let page_size = ctx.page_size(page_size);
    let snapshot = DashboardLoader::new(ctx.client.clone()).load().await;
    tracing::debug!(loaded = snapshot.loaded_count(), "dashboard loaded");

    match ctx.output {
        OutputFormat::Table => println!("{}", render::dashboard(&snapshot, page_size)),
        OutputFormat::Json => print_json(&json!({
            "kpis": widgets::kpi_cards(&snapshot),
            "revenueTrend": widgets::revenue_trend(&snapshot),
            "dealFunnel": widgets::deal_funnel(&snapshot),
            "winRate": widgets::win_rate(&snapshot),
            "leadFunnel": widgets::lead_funnel(&snapshot),
            "topProducts": widgets::ranked(&snapshot, Ranking::Products, 1, page_size),
            "topPartners": widgets::ranked(&snapshot, Ranking::Partners, 1, page_size),
            "topSalespeople": widgets::ranked(&snapshot, Ranking::Salespeople, 1, page_size),
            "targets": widgets::targets(&snapshot, 1, page_size),
            "mySummary": widgets::my_summary(&snapshot),
            "growth": widgets::growth(&snapshot),
            "taskCompletion": widgets::task_completion(&snapshot),
            "payments": widgets::payment_summary(&snapshot),
        }))?,
    }
    Ok(())
}

/// Run fetched records through a list page and print the requested page
pub(crate) fn show_list<T>(
    ctx: &Context,
    fetched: Result<Page<T>>,
    args: &crate::ListArgs,
    noun: &str,
) -> Result<()>
where
    T: Listable + Row + Serialize,
{
    if let Ok(fetched) = &fetched
        && fetched.skipped > 0
    {
        eprintln!("note: {} {noun} could not be read and are not shown", fetched.skipped);
    }

    let mut page = EntityListPage::new(ctx.page_size(args.page_size));
    page.finish(fetched.map(|p| p.items));
    if let Some(term) = &args.search {
        page.set_search(term.clone());
    }
    page.set_status(args.status.clone());
    page.set_page(args.page);

    let view = page.view();
    if let ListView::Error(message) = &view {
        return Err(Error::Other(format!("failed to load {noun}: {message}")));
    }

    match ctx.output {
        OutputFormat::Table => println!("{}", render::list(&view, noun)),
        OutputFormat::Json => match &view {
            ListView::Rows {
                rows,
                matching,
                pagination,
            } => print_json(&json!({
                "rows": rows,
                "matching": matching,
                "pagination": pagination,
            }))?,
            _ => print_json(&json!({ "rows": [], "matching": 0 }))?,
        },
    }
    Ok(())
}

fn print_form(form: &SalesOrderForm) {
    let date = |d: Option<chrono::NaiveDate>| d.map_or_else(|| "-".to_string(), |d| d.to_string());
    let rows = vec![
        vec!["customer".to_string(), form.customer.clone()],
        vec!["product".to_string(), form.product.clone()],
        vec!["quantity".to_string(), form.quantity.to_string()],
        vec!["amount".to_string(), form.amount.to_string()],
        vec!["po number".to_string(), form.po_number.clone()],
        vec!["order date".to_string(), date(form.order_date)],
        vec!["delivery date".to_string(), date(form.delivery_date)],
        vec![
            "payment terms".to_string(),
            form.payment_terms.clone().unwrap_or_default(),
        ],
    ];
    println!("{}", render::table(&["FIELD", "VALUE"], &rows));
}

fn report_failure(failure: StageFailure) -> Error {
    let StageFailure {
        error,
        deal,
        refreshed,
    } = failure;
    let source = if refreshed { "server" } else { "last known" };
    eprintln!("Deal {} is in {} ({source})", deal.id, deal.stage.label());
    error
}

pub(crate) async fn deal_stage(
    ctx: &Context,
    id: EntityId,
    target: DealStage,
    order: SalesOrderArgs,
    submit: bool,
) -> Result<()> {
    let deal = ctx.client.deals().get(&id).await?;
    let from = deal.stage;
    let flow = DealStageFlow::new(ctx.client.clone());

    match flow.request_stage(deal, target).await {
        Ok(StageChange::Applied(deal)) => {
            println!("Deal {}: {} -> {}", deal.id, from.label(), deal.stage.label());
            Ok(())
        }
        Ok(StageChange::Unchanged(deal)) => {
            println!("Deal {} is already in {}", deal.id, deal.stage.label());
            Ok(())
        }
        Ok(StageChange::AwaitingSalesOrder(mut pending)) => {
            order.apply(pending.form_mut());

            if !submit {
                print_form(pending.form());
                let deal = flow.cancel(pending);
                println!(
                    "Sales order not submitted; deal {} stays in {}. Re-run with --submit to close it.",
                    deal.id,
                    deal.stage.label()
                );
                return Ok(());
            }

            let deal = flow
                .submit_sales_order(&pending)
                .await
                .map_err(report_failure)?;
            println!("Deal {}: {} -> {}", deal.id, from.label(), deal.stage.label());
            Ok(())
        }
        Err(failure) => Err(report_failure(failure)),
    }
}

pub(crate) async fn complete_task(ctx: &Context, id: EntityId) -> Result<()> {
    ctx.client.tasks().complete(&id).await?;
    println!("Task {id} completed");
    Ok(())
}

pub(crate) fn show_config(ctx: &Context) -> Result<()> {
    match ctx.output {
        OutputFormat::Table => {
            let text = toml::to_string_pretty(&ctx.config).map_err(|e| Error::Configuration {
                message: e.to_string(),
            })?;
            println!("{text}");
        }
        OutputFormat::Json => print_json(&ctx.config)?,
    }
    Ok(())
}
