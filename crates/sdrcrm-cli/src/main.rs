//! `sdrcrm`: terminal front-end for the SDR sales CRM
//!
//! Renders the analytics dashboard and the CRUD list pages, and drives the
//! deal stage workflow including the Closed Won sales order.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

mod commands;
mod render;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use sdrcrm_core::types::{DealStage, MasterEntity, SalesOrderForm};
use sdrcrm_core::{Config, Result};
use std::path::PathBuf;
use std::process::ExitCode;

/// Command line interface for the CRM client
#[derive(Debug, Parser)]
#[command(
    name = "sdrcrm",
    version = env!("CARGO_PKG_VERSION"),
    about = "Terminal front-end for the SDR sales CRM",
    long_about = "Shows the sales dashboard and list pages of the SDR sales CRM and moves deals through the pipeline, collecting the sales order a Closed Won deal requires."
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "SDRCRM_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable structured JSON logging
    #[arg(long)]
    json: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    output: OutputFormat,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Aligned text tables
    Table,
    /// Pretty-printed JSON
    Json,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
enum Commands {
    /// Sign in and store the token
    Login {
        /// Login email
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long, env = "SDRCRM_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored token
    Logout,

    /// Show the analytics dashboard
    Dashboard {
        /// Rows per ranked table (overrides config)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Deals pipeline
    Deals {
        /// Deal subcommand
        #[command(subcommand)]
        action: DealCommands,
    },

    /// Leads
    Leads {
        /// Lead subcommand
        #[command(subcommand)]
        action: ListCommand,
    },

    /// Tasks
    Tasks {
        /// Task subcommand
        #[command(subcommand)]
        action: TaskCommands,
    },

    /// Support tickets
    Tickets {
        /// Ticket subcommand
        #[command(subcommand)]
        action: ListCommand,
    },

    /// Master data (oems, categories, locations, products, partners)
    Master {
        /// Master data subcommand
        #[command(subcommand)]
        action: MasterCommands,
    },

    /// Users (admin)
    Users {
        /// User subcommand
        #[command(subcommand)]
        action: ListCommand,
    },

    /// Configuration
    Config {
        /// Configuration subcommand
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Search, filter and page flags shared by list pages
#[derive(Debug, Clone, Args)]
struct ListArgs {
    /// Free-text search
    #[arg(short, long)]
    search: Option<String>,

    /// Status (or stage) filter
    #[arg(long)]
    status: Option<String>,

    /// Page to show
    #[arg(short, long, default_value = "1")]
    page: usize,

    /// Rows per page (overrides config)
    #[arg(long)]
    page_size: Option<usize>,
}

/// A list-only resource
#[derive(Debug, Subcommand)]
enum ListCommand {
    /// List records
    List(ListArgs),
}

/// Deal commands
#[derive(Debug, Subcommand)]
enum DealCommands {
    /// List deals
    List(ListArgs),

    /// Move a deal to another stage
    Stage {
        /// Deal id
        #[arg(value_name = "DEAL_ID")]
        id: String,

        /// Target stage, e.g. "negotiation" or "closed won"
        #[arg(value_name = "STAGE")]
        stage: DealStage,

        /// Sales order fields, used when the target is Closed Won
        #[command(flatten)]
        order: SalesOrderArgs,

        /// Submit the sales order; without this the pre-filled form is shown and nothing is sent
        #[arg(long)]
        submit: bool,
    },
}

/// Sales order fields; unset fields keep their pre-filled value
#[derive(Debug, Clone, Default, Args)]
struct SalesOrderArgs {
    /// Customer name
    #[arg(long)]
    customer: Option<String>,

    /// Product sold
    #[arg(long)]
    product: Option<String>,

    /// Units
    #[arg(long)]
    quantity: Option<u64>,

    /// Order amount
    #[arg(long)]
    amount: Option<f64>,

    /// Purchase order number
    #[arg(long)]
    po_number: Option<String>,

    /// Order date (YYYY-MM-DD)
    #[arg(long)]
    order_date: Option<NaiveDate>,

    /// Delivery date (YYYY-MM-DD)
    #[arg(long)]
    delivery_date: Option<NaiveDate>,

    /// Payment terms
    #[arg(long)]
    payment_terms: Option<String>,
}

impl SalesOrderArgs {
    fn apply(self, form: &mut SalesOrderForm) {
        if let Some(customer) = self.customer {
            form.customer = customer;
        }
        if let Some(product) = self.product {
            form.product = product;
        }
        if let Some(quantity) = self.quantity {
            form.quantity = quantity;
        }
        if let Some(amount) = self.amount {
            form.amount = amount;
        }
        if let Some(po_number) = self.po_number {
            form.po_number = po_number;
        }
        if self.order_date.is_some() {
            form.order_date = self.order_date;
        }
        if self.delivery_date.is_some() {
            form.delivery_date = self.delivery_date;
        }
        if self.payment_terms.is_some() {
            form.payment_terms = self.payment_terms;
        }
    }
}

/// Task commands
#[derive(Debug, Subcommand)]
enum TaskCommands {
    /// List tasks
    List(ListArgs),

    /// Mark a task completed
    Complete {
        /// Task id
        #[arg(value_name = "TASK_ID")]
        id: String,
    },
}

/// Master data commands
#[derive(Debug, Subcommand)]
enum MasterCommands {
    /// List one master entity
    List {
        /// Entity: oems, categories, locations, products or partners
        #[arg(value_name = "ENTITY")]
        entity: MasterEntity,

        /// List flags
        #[command(flatten)]
        list: ListArgs,
    },
}

/// Configuration commands
#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Show the resolved configuration
    Show,
}

/// Main entry point
#[tokio::main]
async fn main() -> ExitCode {
    if let Some(warning) = dotenv_warning(dotenvy::dotenv()) {
        eprintln!("{warning}");
    }

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// A missing `.env` is normal; anything else is worth a warning
fn dotenv_warning<T>(result: dotenvy::Result<T>) -> Option<String> {
    match result {
        Err(e) if !e.not_found() => Some(format!("warning: .env file not loaded: {e}")),
        _ => None,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load_from(cli.config.as_deref())?;
    init_logging(&cli, &config);

    let ctx = commands::Context::new(config, cli.output)?;

    match cli.command {
        Commands::Login { email, password } => commands::login(&ctx, email, password).await,
        Commands::Logout => commands::logout(&ctx),
        Commands::Dashboard { page_size } => commands::dashboard(&ctx, page_size).await,
        Commands::Deals { action } => match action {
            DealCommands::List(args) => {
                let fetched = ctx.client.deals().list(&args.query("stage")).await;
                commands::show_list(&ctx, fetched, &args, "deals")
            }
            DealCommands::Stage {
                id,
                stage,
                order,
                submit,
            } => commands::deal_stage(&ctx, id.into(), stage, order, submit).await,
        },
        Commands::Leads {
            action: ListCommand::List(args),
        } => {
            let fetched = ctx.client.leads().list(&args.query("stage")).await;
            commands::show_list(&ctx, fetched, &args, "leads")
        }
        Commands::Tasks { action } => match action {
            TaskCommands::List(args) => {
                let fetched = ctx.client.tasks().list(&args.query("status")).await;
                commands::show_list(&ctx, fetched, &args, "tasks")
            }
            TaskCommands::Complete { id } => commands::complete_task(&ctx, id.into()).await,
        },
        Commands::Tickets {
            action: ListCommand::List(args),
        } => {
            let fetched = ctx.client.tickets().list(&args.query("status")).await;
            commands::show_list(&ctx, fetched, &args, "tickets")
        }
        Commands::Master {
            action: MasterCommands::List { entity, list },
        } => {
            let fetched = ctx.client.master(entity).list(&list.query("status")).await;
            commands::show_list(&ctx, fetched, &list, entity.path_segment())
        }
        Commands::Users {
            action: ListCommand::List(args),
        } => {
            let fetched = ctx.client.users().list(&args.query("status")).await;
            commands::show_list(&ctx, fetched, &args, "users")
        }
        Commands::Config {
            action: ConfigCommands::Show,
        } => commands::show_config(&ctx),
    }
}

impl ListArgs {
    /// Server-side filters; `status_key` names the endpoint's status parameter
    fn query(&self, status_key: &str) -> sdrcrm_core::types::ListQuery {
        let mut query = sdrcrm_core::types::ListQuery::new();
        if let Some(term) = &self.search {
            query = query.search(term.clone());
        }
        if let Some(status) = &self.status {
            query = query.filter(status_key, status.clone());
        }
        query
    }
}

/// Initialize logging from config, letting flags override it
fn init_logging(cli: &Cli, config: &Config) {
    let mut logging = config.logging.clone();
    if let Some(level) = &cli.log_level {
        logging.level.clone_from(level);
    }
    if cli.json {
        logging.format = "json".to_string();
    }

    sdrcrm_core::init_logging(&logging);

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        api = %config.api.root(),
        "sdrcrm starting"
    );
}
