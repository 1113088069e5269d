use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap::builder::NonEmptyStringValueParser;

use crate::collectors::linkedin::ScraperOptions;
use crate::models::query::{
    QueryFilters, QuerySpec, RelevanceFilter, SalaryFilter, TimeFilter, WorkplaceFilter,
};
use crate::notify::telegram::{DEFAULT_API_URL, MAX_MESSAGE_LEN};

#[derive(Parser, Debug, Clone)]
#[command(name = "jobfeed", about = "Scrape job postings and republish them to a channel")]
pub struct Config {
    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true, value_parser = NonEmptyStringValueParser::new())]
    pub bot_token: String,

    /// Target channel (numeric id or @username)
    #[arg(long, env = "TELEGRAM_CHANNEL_ID", value_parser = NonEmptyStringValueParser::new())]
    pub channel_id: String,

    /// Bot API base URL
    #[arg(long, env = "TELEGRAM_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// CSV file the postings are appended to
    #[arg(long, env = "STORE_PATH", default_value = "linkedin_jobs.csv")]
    pub store_path: PathBuf,

    /// Page size used when a posting has to be split
    #[arg(long, env = "MAX_CHUNK", default_value_t = MAX_MESSAGE_LEN)]
    pub max_chunk: usize,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ScrapeArgs {
    /// Search keywords
    #[arg(long, env = "QUERY", value_parser = NonEmptyStringValueParser::new())]
    pub query: String,

    /// Search location
    #[arg(long, env = "LOCATION", value_parser = NonEmptyStringValueParser::new())]
    pub location: String,

    /// Maximum number of postings per run
    #[arg(long, env = "LIMIT", default_value = "10")]
    pub limit: usize,

    /// Recency window
    #[arg(long, value_enum, default_value = "month")]
    pub time: TimeFilter,

    /// Workplace types, repeatable
    #[arg(long, value_enum, default_values = ["remote"])]
    pub workplace: Vec<WorkplaceFilter>,

    /// Minimum yearly base salary
    #[arg(long, value_enum, default_value = "180k")]
    pub base_salary: Option<SalaryFilter>,

    /// Result ordering
    #[arg(long, value_enum, default_value = "recent")]
    pub relevance: RelevanceFilter,

    /// Link to the listing instead of the external apply page
    #[arg(long)]
    pub listing_link: bool,

    /// Per-page load timeout in seconds
    #[arg(long, env = "PAGE_LOAD_TIMEOUT", default_value = "40")]
    pub page_load_timeout: u64,

    /// Delay between listing requests in milliseconds
    #[arg(long, env = "SLOW_MO_MS", default_value = "500")]
    pub slow_mo_ms: u64,

    /// Budget for a whole run in seconds
    #[arg(long, env = "RUN_TIMEOUT", default_value = "600")]
    pub run_timeout: u64,
}

impl ScrapeArgs {
    pub fn query_spec(&self) -> QuerySpec {
        QuerySpec {
            query: self.query.clone(),
            locations: vec![self.location.clone()],
            limit: self.limit,
            apply_link: !self.listing_link,
            filters: QueryFilters {
                time: self.time,
                workplace: self.workplace.clone(),
                base_salary: self.base_salary,
                relevance: self.relevance,
            },
        }
    }

    pub fn scraper_options(&self) -> ScraperOptions {
        ScraperOptions {
            page_load_timeout: Duration::from_secs(self.page_load_timeout),
            slow_mo: Duration::from_millis(self.slow_mo_ms),
        }
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout)
    }
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Scrape, save, then post the new postings (default)
    Run(ScrapeArgs),
    /// Scrape and save only
    Scrape(ScrapeArgs),
    /// Post every posting already in the store
    Notify,
}

#[derive(Parser)]
struct DefaultRun {
    #[command(flatten)]
    args: ScrapeArgs,
}

impl Config {
    /// Resolve the command, defaulting to `run` configured from the environment.
    pub fn resolved_command(&self) -> Result<Command, clap::Error> {
        match &self.command {
            Some(command) => Ok(command.clone()),
            None => DefaultRun::try_parse_from(["jobfeed"]).map(|d| Command::Run(d.args)),
        }
    }
}
