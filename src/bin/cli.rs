//! shelfwatch CLI
//!
//! Runs the watcher as a long-lived server, or drives one-off sync cycles
//! for local testing.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use shelfwatch::{
    error::Result,
    models::{Category, Config},
    scheduler,
    server::{self, AppState},
    services::{self, GatewayProber, SearchPageExtractor, WebhookNotifier},
    storage::CatalogStore,
    sync::SyncEngine,
};

/// shelfwatch - Library Catalog Watcher
#[derive(Parser, Debug)]
#[command(
    name = "shelfwatch",
    version,
    about = "Watches a library catalog for wishlist titles"
)]
struct Cli {
    /// Path to the data directory containing config.toml and db.json
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server and the scheduled sync cycles
    Serve,

    /// Run a single sync cycle for one category
    Sync {
        #[arg(value_enum)]
        category: CategoryArg,
    },

    /// Validate the configuration file
    Validate,

    /// Show a summary of the current store contents
    Info,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CategoryArg {
    AvailableNow,
    OnOrder,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::AvailableNow => Category::AvailableNow,
            CategoryArg::OnOrder => Category::OnOrder,
        }
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Wire the engine to its live collaborators.
fn build_engine(config: &Arc<Config>, store: Arc<CatalogStore>) -> Result<Arc<SyncEngine>> {
    let client = services::create_client(&config.sync)?;
    Ok(Arc::new(SyncEngine::new(
        store,
        Arc::new(SearchPageExtractor::new(
            client.clone(),
            config.upstream.clone(),
        )),
        Arc::new(GatewayProber::new(
            client.clone(),
            config.upstream.availability_url_template.clone(),
        )),
        Arc::new(WebhookNotifier::new(
            client,
            config.notifier.webhook_url.clone(),
        )),
        Arc::clone(config),
    )))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.data_dir.join("config.toml");
    let mut config = Config::load_or_default(&config_path);
    config.apply_env();
    config.validate()?;
    let config = Arc::new(config);

    let db_path = cli.data_dir.join("db.json");

    match cli.command {
        Command::Serve => {
            let store = Arc::new(CatalogStore::open(&db_path).await?);
            let engine = build_engine(&config, Arc::clone(&store))?;

            if config.notifier.webhook_url.is_none() {
                log::warn!("No webhook URL configured; alerts will be logged but not delivered");
            }

            let _scheduler = scheduler::start(Arc::clone(&engine), &config.schedule).await?;
            server::serve(Arc::new(AppState { store, engine }), config.server.port).await?;
        }

        Command::Sync { category } => {
            let category = Category::from(category);
            let store = Arc::new(CatalogStore::open(&db_path).await?);
            let engine = build_engine(&config, store)?;

            let alerts = engine.run_cycle(category).await?;
            log::info!("{} {} alerts fired", alerts.len(), category);
            for alert in &alerts {
                log::info!("  {}", alert.message_block().replace('\n', " | "));
            }
        }

        Command::Validate => {
            // validate() already ran above; reaching this arm means it passed.
            log::info!("✓ Config OK ({} locations)", config.locations.len());
        }

        Command::Info => {
            let store = CatalogStore::open(&db_path).await?;
            let available = store.items_by_category(Category::AvailableNow).await;
            let on_order = store.items_by_category(Category::OnOrder).await;
            let wishlist = store.wishlist().await;

            log::info!("Store: {}", db_path.display());
            log::info!("{} available now items", available.len());
            log::info!("{} on order items", on_order.len());
            log::info!(
                "{} wish list entries: {}",
                wishlist.len(),
                wishlist.join(", ")
            );
        }
    }

    Ok(())
}
