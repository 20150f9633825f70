//! Tracker entry-point: wires the PostgreSQL adapters into the pantry service
//! and exposes its operations as subcommands.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use food_tracker::TrackerSettings;
use food_tracker::domain::{
    NewProductRequest, PantryChange, PantryService, PantryServicePorts, Product, ProductEdit,
    ProductId, ProductQuery, ReminderDispatcher, ReminderExecutor, ReminderKey,
};
use food_tracker::outbound::food_facts::FoodFactsHttpSource;
use food_tracker::outbound::notifications::TracingNotificationSink;
use food_tracker::outbound::persistence::{
    DbPool, DieselProductRepository, DieselReminderQueue, PoolConfig, run_migrations,
};

/// `food-tracker` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "food-tracker",
    about = "Track groceries at home and in the cart, with expiry reminders",
    version
)]
struct Cli {
    /// Database connection URL. Overrides `FOOD_TRACKER_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url", global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add a product to the home inventory and schedule its reminders.
    Add {
        name: String,
        #[arg(long, default_value_t = 1)]
        quantity: i64,
        /// Expiry date as `YYYY-MM-DD`.
        #[arg(long, value_name = "date")]
        expires: Option<String>,
        /// Shelf-life shortcut: expire this many weeks after `--expires`, or
        /// after today when no valid date is given.
        #[arg(long, value_name = "weeks")]
        expires_in_weeks: Option<u32>,
        /// Pin an explicit id (restore and import).
        #[arg(long)]
        id: Option<i64>,
    },
    /// Print a listing.
    List {
        #[arg(value_enum, default_value_t = ListArg::All)]
        list: ListArg,
    },
    /// Print one product.
    Show { id: i64 },
    /// Edit a product; reminders follow the new values.
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        quantity: Option<i64>,
        /// New expiry date; pass an empty string to clear it.
        #[arg(long, value_name = "date")]
        expires: Option<String>,
    },
    /// Move a product onto the shopping list.
    ToCart { id: i64 },
    /// Move a bought product back home.
    ToHome { id: i64 },
    /// Delete a product and its reminders.
    Remove { id: i64 },
    /// Look up a barcode and print the prefilled insert form.
    Lookup { code: String },
    /// Fire due reminders until interrupted.
    Dispatch {
        /// Poll once and exit.
        #[arg(long)]
        once: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ListArg {
    All,
    Home,
    Cart,
}

impl From<ListArg> for ProductQuery {
    fn from(value: ListArg) -> Self {
        match value {
            ListArg::All => Self::All,
            ListArg::Home => Self::AtHome,
            ListArg::Cart => Self::InCart,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangeReport<'a> {
    product: &'a Product,
    scheduled: &'a [ReminderKey],
    cancelled: &'a [ReminderKey],
    failures: Vec<String>,
}

impl<'a> From<&'a PantryChange> for ChangeReport<'a> {
    fn from(change: &'a PantryChange) -> Self {
        Self {
            product: &change.product,
            scheduled: &change.reminders.scheduled,
            cancelled: &change.reminders.cancelled,
            failures: change
                .reminders
                .failures
                .iter()
                .map(|failure| format!("{}: {}", failure.lead_time, failure.error))
                .collect(),
        }
    }
}

/// Application bootstrap.
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let settings = TrackerSettings::load_from_iter([OsString::from("food-tracker")])
        .map_err(|error| eyre!("load configuration: {error}"))?;
    let database_url = resolve_database_url(cli.database_url.as_deref(), &settings)?;

    let applied = run_migrations(&database_url)
        .await
        .wrap_err("apply database migrations")?;
    if applied > 0 {
        info!(applied, "database migrations applied");
    }
    let pool = DbPool::new(PoolConfig::new(&database_url))
        .await
        .wrap_err("create database pool")?;

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let reminders = Arc::new(DieselReminderQueue::new(pool.clone(), Arc::clone(&clock)));

    if let Command::Dispatch { once } = cli.command {
        let executor = ReminderExecutor::new(Arc::new(TracingNotificationSink));
        let dispatcher =
            ReminderDispatcher::new(reminders, executor, clock, settings.dispatcher_config());
        let fired = if once {
            dispatcher.run_once().await.wrap_err("poll reminder queue")?
        } else {
            dispatcher
                .run_until(async {
                    if let Err(error) = tokio::signal::ctrl_c().await {
                        warn!(%error, "ctrl-c listener failed; stopping dispatcher");
                    }
                })
                .await
        };
        info!(fired, "reminder dispatch finished");
        return Ok(());
    }

    let food_facts = FoodFactsHttpSource::new(
        settings
            .food_facts_base_url()
            .wrap_err("parse food facts base URL")?,
        settings.request_timeout(),
    )
    .wrap_err("build food facts client")?;
    let service = PantryService::new(
        PantryServicePorts {
            products: Arc::new(DieselProductRepository::new(pool)),
            reminders,
            food_facts: Arc::new(food_facts),
        },
        clock,
        settings.pantry_config(),
    );

    run_command(&service, cli.command).await
}

async fn run_command(service: &PantryService, command: Command) -> Result<()> {
    match command {
        Command::Add {
            name,
            quantity,
            expires,
            expires_in_weeks,
            id,
        } => {
            let expiry_date = match expires_in_weeks {
                Some(weeks) => Some(
                    service
                        .expiry_in_weeks(expires.as_deref(), weeks)?
                        .to_string(),
                ),
                None => expires,
            };
            let request = NewProductRequest {
                id,
                name,
                quantity,
                expiry_date,
            };
            match service.insert_product_at_home(request).await? {
                Some(change) => print_change(&change),
                None => {
                    warn!(?id, "a product with this id already exists; insert ignored");
                    Ok(())
                }
            }
        }
        Command::List { list } => print_json(&service.store().list(list.into()).await?),
        Command::Show { id } => {
            let id = product_id(id)?;
            let product = service
                .get_product(id)
                .await?
                .ok_or_else(|| eyre!("product {id} not found"))?;
            print_json(&product)
        }
        Command::Edit {
            id,
            name,
            quantity,
            expires,
        } => {
            let edit = ProductEdit {
                name,
                quantity,
                expiry_date: expires,
            };
            print_change(&service.update_product(product_id(id)?, edit).await?)
        }
        Command::ToCart { id } => print_change(&service.move_product_to_cart(product_id(id)?).await?),
        Command::ToHome { id } => print_change(&service.move_product_to_home(product_id(id)?).await?),
        Command::Remove { id } => print_change(&service.remove_product(product_id(id)?).await?),
        Command::Lookup { code } => print_json(&service.lookup_barcode(&code).await?),
        Command::Dispatch { .. } => Err(eyre!("dispatch is handled before the service is built")),
    }
}

fn product_id(raw: i64) -> Result<ProductId> {
    ProductId::new(raw).map_err(|error| eyre!("invalid product id {raw}: {error}"))
}

fn print_change(change: &PantryChange) -> Result<()> {
    if !change.reminders.is_complete() {
        warn!(
            product_id = %change.product.id(),
            failures = change.reminders.failures.len(),
            "product saved but some reminders could not be updated"
        );
    }
    print_json(&ChangeReport::from(change))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).wrap_err("render output")?;
    println!("{rendered}");
    Ok(())
}

fn resolve_database_url(explicit: Option<&str>, settings: &TrackerSettings) -> Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(eyre!("--database-url must not be empty when provided"));
        }
        return Ok(value.to_owned());
    }
    settings
        .database_url()
        .map(str::to_owned)
        .ok_or_else(|| eyre!("database URL missing: set --database-url or FOOD_TRACKER_DATABASE_URL"))
}
