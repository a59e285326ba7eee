use std::sync::Arc;

use anyhow::Context;
use pickup::config::Config;
use pickup::db::{Database, MemoryDatabase, PgDatabase};
use pickup::email::{LogMailer, MailgunMailer, Mailer};
use pickup::routes::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pickup=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;

    let db: Arc<dyn Database> = match &config.database_url {
        Some(url) => Arc::new(PgDatabase::connect(url).await?),
        None => {
            tracing::warn!("`DATABASE_URL` not set, using the in-memory store");
            Arc::new(MemoryDatabase::seeded())
        }
    };
    let mailer: Arc<dyn Mailer> = match &config.mail.mailgun_token {
        Some(token) => Arc::new(MailgunMailer::new(token, &config.mail)),
        None => {
            tracing::warn!("`MAILGUN_TOKEN` not set, emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let address = config.address;
    let app = app(AppState::new(db, mailer, config));

    tracing::info!(%address, "Campus Pickup API listening");
    axum::Server::bind(&address)
        .serve(app.into_make_service())
        .await
        .context("Server failed")
}
