use serde::Deserialize;

/// Main configuration structure for Site-Research
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Completion service used for page enrichment; enrichment is skipped when absent
    #[serde(default)]
    pub completion: Option<CompletionConfig>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Default page budget for a crawl (hard cap 200)
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Default depth budget for a crawl (hard cap 3)
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Whether research output includes the flat sitemap
    #[serde(default = "default_true")]
    pub include_sitemap: bool,

    /// Politeness delay between successive queue items (milliseconds)
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Hard timeout for a page fetch (seconds)
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Hard timeout for a robots.txt fetch (seconds)
    #[serde(default = "default_robots_timeout_secs")]
    pub robots_timeout_secs: u64,

    /// How long a cached robots.txt policy stays valid (hours)
    #[serde(default = "default_robots_ttl_hours")]
    pub robots_ttl_hours: i64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            max_depth: default_max_depth(),
            include_sitemap: true,
            request_delay_ms: default_request_delay_ms(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            robots_timeout_secs: default_robots_timeout_secs(),
            robots_ttl_hours: default_robots_ttl_hours(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the user agent header: `Name/Version (+ContactURL)`
    pub fn user_agent_string(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "WebsiteResearchBot".to_string(),
            crawler_version: "0.1".to_string(),
            contact_url: "https://example.com/bot".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the SQLite database file
    pub database_path: String,

    /// Path to the JSON research report
    pub report_path: String,

    /// Path to the markdown summary file
    pub summary_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./research.db".to_string(),
            report_path: "./research.json".to_string(),
            summary_path: "./research.md".to_string(),
        }
    }
}

/// OpenAI-compatible chat completion endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CompletionConfig {
    /// Full chat-completions URL
    pub endpoint: String,

    /// Model identifier sent with each request
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout (seconds)
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_pages() -> u32 {
    30
}

fn default_max_depth() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

fn default_request_delay_ms() -> u64 {
    2000
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

fn default_robots_timeout_secs() -> u64 {
    5
}

fn default_robots_ttl_hours() -> i64 {
    6
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_completion_timeout_secs() -> u64 {
    60
}
