use dotenv::dotenv;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use invoicer_core::api::{create_router, AppState};
use invoicer_core::config::Config;
use invoicer_core::db::{create_pool, ensure_schema};
use invoicer_core::ledger::{policy_for, InvoiceLedger};
use invoicer_core::store::{InMemoryInvoiceStore, InvoiceStore, PgInvoiceStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(LevelFilter::INFO.into());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    info!("Starting invoicer...");

    let config = Config::from_env()?;

    let store: Arc<dyn InvoiceStore> = match config.database_url.as_deref() {
        Some(url) => {
            let pool = create_pool(url, config.database_max_connections)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
            ensure_schema(&pool)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to prepare schema: {}", e))?;
            Arc::new(PgInvoiceStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, invoices are kept in memory only");
            Arc::new(InMemoryInvoiceStore::new())
        }
    };

    let ledger = InvoiceLedger::new(policy_for(config.strict_status_transitions));
    info!("Status transition policy: {}", ledger.policy().name());

    let app = create_router(AppState {
        store,
        ledger,
        sender: Arc::new(config.sender.clone()),
        default_page_limit: config.default_page_limit,
    });

    let (host, port) = (config.host.as_str(), config.port);
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}:{}: {}", host, port, e))?;

    info!("Server listening on {}:{}", host, port);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
