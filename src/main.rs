mod collectors;
mod config;
mod error;
mod models;
mod notify;
mod store;
mod text;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::collectors::linkedin::LinkedIn;
use crate::collectors::runner;
use crate::config::{Command, Config};
use crate::notify::Notifier;
use crate::notify::metrics::MetricsReporter;
use crate::notify::telegram::TelegramTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jobfeed=info")),
        )
        .init();

    let config = Config::parse();
    let command = config.resolved_command().unwrap_or_else(|e| e.exit());

    let transport = Arc::new(TelegramTransport::new(&config.bot_token, &config.api_url)?);

    match command {
        Command::Run(args) => {
            let source = LinkedIn::new(args.scraper_options())?;
            let report = runner::run(
                Box::new(source),
                &args.query_spec(),
                args.run_timeout(),
                transport,
                &config.channel_id,
                config.max_chunk,
                &config.store_path,
            )
            .await?;
            if report.failed > 0 {
                tracing::warn!("{} postings could not be delivered", report.failed);
            }
        }
        Command::Scrape(args) => {
            let source = LinkedIn::new(args.scraper_options())?;
            let query = args.query_spec();
            let reporter = MetricsReporter::new(transport, &config.channel_id, &query.query);
            runner::scrape_and_persist(
                Box::new(source),
                &query,
                args.run_timeout(),
                reporter,
                &config.store_path,
            )
            .await?;
        }
        Command::Notify => {
            let notifier =
                Notifier::new(transport, &config.channel_id).with_max_chunk(config.max_chunk);
            runner::notify_from_store(&notifier, &config.store_path).await?;
        }
    }

    Ok(())
}
