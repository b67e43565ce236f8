use anyhow::Result;

use twstock_statement::{backfill, logging};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    if rustls::crypto::ring::default_provider().install_default().is_err() {
        eprintln!("rustls crypto provider already installed");
    }

    logging::init()?;

    if let Err(why) = backfill::revenue::execute().await {
        tracing::error!("Failed to backfill::revenue::execute because {:?}", why);
    }

    if let Err(why) = backfill::financial_statement::execute().await {
        tracing::error!(
            "Failed to backfill::financial_statement::execute because {:?}",
            why
        );
    }

    Ok(())
}
