use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use scraper::{ElementRef, Html, Selector};

use crate::collectors::{EventSink, JobSource};
use crate::error::{ListingError, ScrapeError};
use crate::models::event::RunMetrics;
use crate::models::job::PostingRecord;
use crate::models::query::{QuerySpec, RelevanceFilter, SalaryFilter, TimeFilter, WorkplaceFilter};

const BASE_URL: &str = "https://www.linkedin.com";
const SEARCH_PATH: &str = "/jobs-guest/jobs/api/seeMoreJobPostings/search";
const POSTING_PATH: &str = "/jobs-guest/jobs/api/jobPosting";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Upper bound on search pages per location, whatever the limit.
const MAX_PAGES: usize = 40;

const BLOCK_TAGS: [&str; 12] = [
    "p", "div", "ul", "ol", "li", "h1", "h2", "h3", "h4", "h5", "h6", "section",
];

#[derive(Debug, Clone)]
pub struct ScraperOptions {
    /// Per-request budget. Listings exceeding it are reported as errors.
    pub page_load_timeout: Duration,
    /// Pause before each listing request.
    pub slow_mo: Duration,
}

impl Default for ScraperOptions {
    fn default() -> Self {
        Self {
            page_load_timeout: Duration::from_secs(40),
            slow_mo: Duration::from_millis(500),
        }
    }
}

/// LinkedIn public job search, scraped through the guest endpoints with a
/// single worker: one request in flight at a time.
pub struct LinkedIn {
    client: reqwest::Client,
    base_url: String,
    options: ScraperOptions,
}

/// A result card from a search page.
#[derive(Debug, Clone, PartialEq, Eq)]
struct JobCard {
    job_id: String,
    title: String,
    company: String,
    date: String,
    link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct JobDetail {
    description: String,
    apply_url: Option<String>,
}

#[async_trait]
impl JobSource for LinkedIn {
    fn name(&self) -> &str {
        "linkedin"
    }

    async fn scrape(&self, query: &QuerySpec, sink: &mut EventSink<'_>) -> Result<(), ScrapeError> {
        let mut seen = HashSet::new();
        let mut metrics = RunMetrics::default();
        let mut emitted = 0usize;

        for location in &query.locations {
            let mut start = 0usize;

            for _ in 0..MAX_PAGES {
                if emitted >= query.limit {
                    return Ok(());
                }

                let Some(html) = self.fetch_search_page(query, location, start).await? else {
                    break;
                };
                let cards = parse_search_page(&html);
                if cards.is_empty() {
                    tracing::debug!(location = %location, start, "No more results");
                    break;
                }
                start += cards.len();

                for card in cards {
                    if emitted >= query.limit {
                        break;
                    }
                    metrics.processed += 1;
                    if !seen.insert(card.job_id.clone()) {
                        metrics.skipped += 1;
                        continue;
                    }

                    tokio::time::sleep(self.options.slow_mo).await;
                    match self.fetch_posting(&card, query.apply_link).await {
                        Ok(record) => {
                            emitted += 1;
                            sink.data(record).await;
                        }
                        Err(message) => {
                            metrics.failed += 1;
                            sink.error(ListingError::new(&card.job_id, message)).await;
                        }
                    }
                }

                sink.metrics(metrics).await;
            }
        }

        Ok(())
    }
}

impl LinkedIn {
    pub fn new(options: ScraperOptions) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(options.page_load_timeout)
            .build()
            .map_err(|e| ScrapeError::Fetch(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            options,
        })
    }

    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// `None` once the endpoint stops returning result pages.
    /// The guest API answers past-the-end offsets with 400 or 404.
    async fn fetch_search_page(
        &self,
        query: &QuerySpec,
        location: &str,
        start: usize,
    ) -> Result<Option<String>, ScrapeError> {
        let url = format!("{}{SEARCH_PATH}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&search_params(query, location, start))
            .header("Accept", "text/html,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| ScrapeError::Fetch(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            if start > 0 && matches!(status, StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND) {
                tracing::debug!(%status, start, "Search pagination ended");
                return Ok(None);
            }
            return Err(ScrapeError::Status {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(|e| ScrapeError::Fetch(e.to_string()))?;
        Ok(Some(body))
    }

    async fn fetch_posting(&self, card: &JobCard, apply_link: bool) -> Result<PostingRecord, String> {
        let url = format!("{}{POSTING_PATH}/{}", self.base_url, card.job_id);
        let resp = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                format!("page load timed out after {:?}", self.options.page_load_timeout)
            } else {
                format!("request failed: {e}")
            }
        })?;

        if !resp.status().is_success() {
            return Err(format!("posting page returned {}", resp.status()));
        }
        let html = resp
            .text()
            .await
            .map_err(|e| format!("failed to read posting page: {e}"))?;

        let detail = parse_job_detail(&html).ok_or("posting page has no description")?;
        let link = match detail.apply_url {
            Some(apply_url) if apply_link => apply_url,
            _ => card.link.clone(),
        };

        Ok(PostingRecord {
            title: card.title.clone(),
            company: card.company.clone(),
            description: detail.description,
            date: card.date.clone(),
            link,
        })
    }
}

/// Query parameters of the guest search endpoint.
fn search_params(query: &QuerySpec, location: &str, start: usize) -> Vec<(&'static str, String)> {
    let filters = &query.filters;
    let mut params = vec![
        ("keywords", query.query.clone()),
        ("location", location.to_string()),
    ];

    let posted_within = match filters.time {
        TimeFilter::Any => None,
        TimeFilter::Day => Some("r86400"),
        TimeFilter::Week => Some("r604800"),
        TimeFilter::Month => Some("r2592000"),
    };
    if let Some(tpr) = posted_within {
        params.push(("f_TPR", tpr.to_string()));
    }

    if !filters.workplace.is_empty() {
        let codes: Vec<&str> = filters
            .workplace
            .iter()
            .map(|w| match w {
                WorkplaceFilter::OnSite => "1",
                WorkplaceFilter::Remote => "2",
                WorkplaceFilter::Hybrid => "3",
            })
            .collect();
        params.push(("f_WT", codes.join(",")));
    }

    if let Some(salary) = filters.base_salary {
        let code = match salary {
            SalaryFilter::Salary40k => 1,
            SalaryFilter::Salary60k => 2,
            SalaryFilter::Salary80k => 3,
            SalaryFilter::Salary100k => 4,
            SalaryFilter::Salary120k => 5,
            SalaryFilter::Salary140k => 6,
            SalaryFilter::Salary160k => 7,
            SalaryFilter::Salary180k => 8,
            SalaryFilter::Salary200k => 9,
        };
        params.push(("f_SB2", code.to_string()));
    }

    let sort = match filters.relevance {
        RelevanceFilter::Relevant => "R",
        RelevanceFilter::Recent => "DD",
    };
    params.push(("sortBy", sort.to_string()));
    params.push(("start", start.to_string()));
    params
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

fn first_text(card: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn parse_search_page(html: &str) -> Vec<JobCard> {
    let document = Html::parse_fragment(html);
    let card_sel = selector("[data-entity-urn]");
    let title_sel = selector(".base-search-card__title");
    let company_sel = selector(".base-search-card__subtitle");
    let link_sel = selector("a.base-card__full-link");
    let time_sel = selector("time");

    let mut cards = Vec::new();
    for card in document.select(&card_sel) {
        let Some(job_id) = card
            .value()
            .attr("data-entity-urn")
            .and_then(|urn| urn.strip_prefix("urn:li:jobPosting:"))
            .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
        else {
            continue;
        };

        let link = card
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .or_else(|| card.value().attr("href"))
            .map(strip_query)
            .unwrap_or_else(|| format!("{BASE_URL}/jobs/view/{job_id}"));

        let date = card
            .select(&time_sel)
            .next()
            .and_then(|t| {
                t.value()
                    .attr("datetime")
                    .map(str::to_string)
                    .or_else(|| Some(t.text().collect::<String>().trim().to_string()))
            })
            .unwrap_or_default();

        cards.push(JobCard {
            job_id: job_id.to_string(),
            title: first_text(&card, &title_sel).unwrap_or_default(),
            company: first_text(&card, &company_sel).unwrap_or_default(),
            date,
            link,
        });
    }
    cards
}

fn parse_job_detail(html: &str) -> Option<JobDetail> {
    let document = Html::parse_document(html);
    let markup = document
        .select(&selector(".show-more-less-html__markup"))
        .next()
        .or_else(|| document.select(&selector(".description__text")).next())?;

    let mut raw = String::new();
    collect_text(markup, &mut raw);
    let description = tidy_lines(&raw);
    if description.is_empty() {
        return None;
    }

    let apply_url = document
        .select(&selector("code#applyUrl"))
        .next()
        .and_then(|code| {
            code.children()
                .find_map(|child| child.value().as_comment().map(|c| String::from(&**c)))
        })
        .and_then(|comment| external_apply_url(comment.trim().trim_matches('"')));

    Some(JobDetail {
        description,
        apply_url,
    })
}

/// Text of an element with line breaks where blocks start and end.
fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            match child_el.value().name() {
                "br" => out.push('\n'),
                name if BLOCK_TAGS.contains(&name) => {
                    out.push_str("\n\n");
                    collect_text(child_el, out);
                    out.push_str("\n\n");
                }
                _ => collect_text(child_el, out),
            }
        }
    }
}

/// Trim every line and squeeze repeated blank lines into one.
fn tidy_lines(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in raw.lines().map(str::trim) {
        if line.is_empty() && lines.last().is_none_or(|last| last.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

/// Unwrap LinkedIn's redirect (`externalApply/...?url=<target>`) when present.
fn external_apply_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let target = url
        .query_pairs()
        .find(|(k, _)| k == "url")
        .map(|(_, v)| v.into_owned());
    Some(target.unwrap_or_else(|| url.to_string()))
}

fn strip_query(href: &str) -> String {
    href.split('?').next().unwrap_or(href).to_string()
}
