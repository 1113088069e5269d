use clap::ValueEnum;

/// How far back postings may have been published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimeFilter {
    Any,
    Day,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WorkplaceFilter {
    OnSite,
    Remote,
    Hybrid,
}

/// Minimum yearly base salary in USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SalaryFilter {
    #[value(name = "40k")]
    Salary40k,
    #[value(name = "60k")]
    Salary60k,
    #[value(name = "80k")]
    Salary80k,
    #[value(name = "100k")]
    Salary100k,
    #[value(name = "120k")]
    Salary120k,
    #[value(name = "140k")]
    Salary140k,
    #[value(name = "160k")]
    Salary160k,
    #[value(name = "180k")]
    Salary180k,
    #[value(name = "200k")]
    Salary200k,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RelevanceFilter {
    Relevant,
    Recent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilters {
    pub time: TimeFilter,
    pub workplace: Vec<WorkplaceFilter>,
    pub base_salary: Option<SalaryFilter>,
    pub relevance: RelevanceFilter,
}

impl Default for QueryFilters {
    fn default() -> Self {
        Self {
            time: TimeFilter::Any,
            workplace: Vec::new(),
            base_salary: None,
            relevance: RelevanceFilter::Relevant,
        }
    }
}

/// What to search for. Passed through to the source untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub query: String,
    pub locations: Vec<String>,
    pub limit: usize,
    /// Prefer the external apply URL over the listing URL when one exists.
    pub apply_link: bool,
    pub filters: QueryFilters,
}

impl QuerySpec {
    #[allow(dead_code)]
    pub fn new(query: &str, location: &str) -> Self {
        Self {
            query: query.to_string(),
            locations: vec![location.to_string()],
            limit: 25,
            apply_link: false,
            filters: QueryFilters::default(),
        }
    }
}
