use crate::config::types::{
    CatalogConfig, Config, FetchConfig, OutputConfig, SelectorConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_catalog(&config.catalog)?;
    validate_selectors(&config.selectors)?;
    validate_fetch(&config.fetch)?;
    validate_user_agent(&config.user_agent)?;
    validate_output(&config.output)?;
    Ok(())
}

/// Validates the catalog section
fn validate_catalog(config: &CatalogConfig) -> Result<(), ConfigError> {
    Url::parse(&config.index_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid index-url: {}", e)))?;

    for placeholder in ["{page}", "{category}"] {
        if !config.page_url_template.contains(placeholder) {
            return Err(ConfigError::Validation(format!(
                "page-url-template must contain the {} placeholder",
                placeholder
            )));
        }
    }

    if config.categories.is_empty() {
        return Err(ConfigError::Validation(
            "categories cannot be empty".to_string(),
        ));
    }

    if config.categories.iter().any(|key| key.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "category keys cannot be blank".to_string(),
        ));
    }

    Ok(())
}

/// Validates every selector parses as CSS, so bad selectors fail at startup
/// instead of mid-crawl
fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    let selectors = [
        ("product-link", &config.product_link),
        ("next-page", &config.next_page),
        ("detail.name", &config.detail.name),
        ("detail.uses", &config.detail.uses),
        ("detail.benefit-titles", &config.detail.benefit_titles),
        (
            "detail.benefit-descriptions",
            &config.detail.benefit_descriptions,
        ),
        (
            "detail.side-effects-general",
            &config.detail.side_effects_general,
        ),
        (
            "detail.side-effects-common",
            &config.detail.side_effects_common,
        ),
        ("detail.mechanism", &config.detail.mechanism),
        ("detail.administration", &config.detail.administration),
    ];

    for (name, selector) in selectors {
        if selector.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "selector '{}' cannot be empty",
                name
            )));
        }
        scraper::Selector::parse(selector).map_err(|e| {
            ConfigError::Validation(format!("selector '{}' is not valid CSS: {}", name, e))
        })?;
    }

    Ok(())
}

/// Validates fetch timing configuration
fn validate_fetch(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.retry_backoff_min_ms > config.retry_backoff_max_ms {
        return Err(ConfigError::Validation(format!(
            "retry-backoff-min-ms ({}) exceeds retry-backoff-max-ms ({})",
            config.retry_backoff_min_ms, config.retry_backoff_max_ms
        )));
    }

    if config.page_delay_min_ms > config.page_delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "page-delay-min-ms ({}) exceeds page-delay-max-ms ({})",
            config.page_delay_min_ms, config.page_delay_max_ms
        )));
    }

    if config.request_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-ms must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    // Basic shape check only; deliverability is not our problem.
    let email = &config.contact_email;
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(ConfigError::Validation(format!(
            "contact-email does not look like an email address: '{}'",
            email
        )));
    }

    Ok(())
}

/// Validates output paths
fn validate_output(config: &OutputConfig) -> Result<(), ConfigError> {
    let paths = [
        ("links-path", &config.links_path),
        ("results-path", &config.results_path),
        ("checkpoint-path", &config.checkpoint_path),
        ("audit-log-path", &config.audit_log_path),
    ];

    for (name, path) in paths {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{} cannot be empty",
                name
            )));
        }
    }

    Ok(())
}
