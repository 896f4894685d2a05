use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for medharvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// The catalog being harvested and how its pages are addressed
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// URL of the default index view (the page shown before any category
    /// is selected)
    #[serde(rename = "index-url")]
    pub index_url: String,

    /// Template for a specific category page; must contain `{page}` and
    /// `{category}` placeholders
    #[serde(rename = "page-url-template")]
    pub page_url_template: String,

    /// Category keys partitioning the catalog, in enumeration order.
    /// Defaults to the letters A through Z.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

impl CatalogConfig {
    /// Builds the URL for a specific (category, page) unit.
    ///
    /// Category keys are lowercased in the URL, matching the target site's
    /// query convention.
    pub fn page_url(&self, category_key: &str, page: u32) -> String {
        self.page_url_template
            .replace("{page}", &page.to_string())
            .replace("{category}", &category_key.to_lowercase())
    }
}

fn default_categories() -> Vec<String> {
    ('A'..='Z').map(|c| c.to_string()).collect()
}

/// CSS selectors for the listing pages and the detail pages
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// Product detail-page links on a listing page
    #[serde(rename = "product-link")]
    pub product_link: String,

    /// The next-page control on a listing page
    #[serde(rename = "next-page")]
    pub next_page: String,

    pub detail: DetailSelectors,
}

/// Selectors for the fields extracted from a detail page
///
/// Each selector yields text content; absence yields the empty value for
/// that field rather than an error.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailSelectors {
    pub name: String,
    pub uses: String,
    #[serde(rename = "benefit-titles")]
    pub benefit_titles: String,
    #[serde(rename = "benefit-descriptions")]
    pub benefit_descriptions: String,
    #[serde(rename = "side-effects-general")]
    pub side_effects_general: String,
    #[serde(rename = "side-effects-common")]
    pub side_effects_common: String,
    pub mechanism: String,
    pub administration: String,
}

/// Fetch timing and retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Whole-request timeout for one HTTP fetch
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// How long a backend may wait for an element to appear
    #[serde(rename = "element-timeout-ms", default = "default_element_timeout_ms")]
    pub element_timeout_ms: u64,

    /// Attempt budget per unit of work
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Jittered backoff bounds between detail-fetch retries
    #[serde(rename = "retry-backoff-min-ms", default = "default_retry_backoff_min_ms")]
    pub retry_backoff_min_ms: u64,
    #[serde(rename = "retry-backoff-max-ms", default = "default_retry_backoff_max_ms")]
    pub retry_backoff_max_ms: u64,

    /// Jittered rate-limit sleep between detail requests, applied even on
    /// success
    #[serde(rename = "page-delay-min-ms", default = "default_page_delay_min_ms")]
    pub page_delay_min_ms: u64,
    #[serde(rename = "page-delay-max-ms", default = "default_page_delay_max_ms")]
    pub page_delay_max_ms: u64,

    /// Pause after advancing to the next listing page
    #[serde(rename = "settle-delay-ms", default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Linear backoff step between listing-page retries (`attempt * step`)
    #[serde(rename = "link-retry-step-ms", default = "default_link_retry_step_ms")]
    pub link_retry_step_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            element_timeout_ms: default_element_timeout_ms(),
            max_attempts: default_max_attempts(),
            retry_backoff_min_ms: default_retry_backoff_min_ms(),
            retry_backoff_max_ms: default_retry_backoff_max_ms(),
            page_delay_min_ms: default_page_delay_min_ms(),
            page_delay_max_ms: default_page_delay_max_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            link_retry_step_ms: default_link_retry_step_ms(),
        }
    }
}

impl FetchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn retry_backoff_min(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_min_ms)
    }

    pub fn retry_backoff_max(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_max_ms)
    }

    pub fn page_delay_min(&self) -> Duration {
        Duration::from_millis(self.page_delay_min_ms)
    }

    pub fn page_delay_max(&self) -> Duration {
        Duration::from_millis(self.page_delay_max_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn link_retry_step(&self) -> Duration {
        Duration::from_millis(self.link_retry_step_ms)
    }
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_element_timeout_ms() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_min_ms() -> u64 {
    5_000
}

fn default_retry_backoff_max_ms() -> u64 {
    10_000
}

fn default_page_delay_min_ms() -> u64 {
    1_000
}

fn default_page_delay_max_ms() -> u64 {
    3_000
}

fn default_settle_delay_ms() -> u64 {
    2_000
}

fn default_link_retry_step_ms() -> u64 {
    10_000
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Paths of the durable output files
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Line-oriented URL list produced by the discovery phase
    #[serde(rename = "links-path")]
    pub links_path: String,

    /// JSON result document produced by the detail phase
    #[serde(rename = "results-path")]
    pub results_path: String,

    /// Enumeration checkpoint record
    #[serde(rename = "checkpoint-path")]
    pub checkpoint_path: String,

    /// Append-only audit log
    #[serde(rename = "audit-log-path")]
    pub audit_log_path: String,
}
