//! One-time provisioning: creates the `autor` and `livro` tables if they are missing.

use bookstore_catalog::infra::logging;
use bookstore_catalog::{storage, AppConfig};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin init_db\n\
         \n\
         Reads env vars (or .env):\n\
           DATABASE_URL (default sqlite://database.db)\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }

    let config = AppConfig::from_env()?;
    logging::init();

    let pool = storage::connect(&config.database_url, 1)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", config.database_url, e))?;
    storage::apply_schema(&pool).await?;
    pool.close().await;

    tracing::info!(database_url = %config.database_url, "database and tables created");
    Ok(())
}
