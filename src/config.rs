use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const QUERY_PLACEHOLDER: &str = "{query}";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub scraper: ScraperConfig,
    pub cache: CacheSettings,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub base_url: String,
    // `{query}` is replaced by the URL-encoded keyword
    pub search_path: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub max_concurrent_requests: usize,
    // 0 disables the limiter
    pub requests_per_second: u32,
    pub enrichment_deadline_secs: u64,
    pub rules_path: Option<String>,
}

impl ScraperConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn enrichment_deadline(&self) -> Duration {
        Duration::from_secs(self.enrichment_deadline_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub max_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub max_batch_queries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                workers: num_cpus::get(),
            },
            scraper: ScraperConfig::default(),
            cache: CacheSettings {
                enabled: true,
                ttl_seconds: 300,
                max_entries: 256,
            },
            security: SecurityConfig {
                allowed_origins: vec!["*".to_string()],
                max_batch_queries: 10,
            },
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.daraz.com.np".to_string(),
            search_path: "/catalog/?q={query}".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            request_timeout_secs: 15,
            max_concurrent_requests: 5,
            requests_per_second: 4,
            enrichment_deadline_secs: 45,
            rules_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let mut config = Config::default();

        // Server configuration
        if let Ok(host) = env::var("HOST") {
            config.server.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            config.server.port = port.parse().context("PORT")?;
        }
        if let Ok(workers) = env::var("WORKERS") {
            config.server.workers = workers.parse().context("WORKERS")?;
        }

        // Scraper configuration
        if let Ok(base_url) = env::var("MARKETPLACE_BASE_URL") {
            config.scraper.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Ok(search_path) = env::var("MARKETPLACE_SEARCH_PATH") {
            config.scraper.search_path = search_path;
        }
        if let Ok(user_agent) = env::var("USER_AGENT") {
            config.scraper.user_agent = user_agent;
        }
        if let Ok(timeout) = env::var("REQUEST_TIMEOUT") {
            config.scraper.request_timeout_secs = timeout.parse().context("REQUEST_TIMEOUT")?;
        }
        if let Ok(max_concurrent) = env::var("MAX_CONCURRENT_REQUESTS") {
            config.scraper.max_concurrent_requests =
                max_concurrent.parse().context("MAX_CONCURRENT_REQUESTS")?;
        }
        if let Ok(rps) = env::var("REQUESTS_PER_SECOND") {
            config.scraper.requests_per_second = rps.parse().context("REQUESTS_PER_SECOND")?;
        }
        if let Ok(deadline) = env::var("ENRICHMENT_DEADLINE") {
            config.scraper.enrichment_deadline_secs =
                deadline.parse().context("ENRICHMENT_DEADLINE")?;
        }
        if let Ok(rules_path) = env::var("EXTRACTION_RULES_PATH") {
            config.scraper.rules_path = Some(rules_path);
        }

        // Cache configuration
        if let Ok(enabled) = env::var("CACHE_ENABLED") {
            config.cache.enabled = enabled.to_lowercase().parse().context("CACHE_ENABLED")?;
        }
        if let Ok(ttl) = env::var("CACHE_TTL") {
            config.cache.ttl_seconds = ttl.parse().context("CACHE_TTL")?;
        }
        if let Ok(max_entries) = env::var("CACHE_MAX_ENTRIES") {
            config.cache.max_entries = max_entries.parse().context("CACHE_MAX_ENTRIES")?;
        }

        // Security configuration
        if let Ok(allowed_origins) = env::var("ALLOWED_ORIGINS") {
            config.security.allowed_origins = allowed_origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(max_batch) = env::var("MAX_BATCH_QUERIES") {
            config.security.max_batch_queries = max_batch.parse().context("MAX_BATCH_QUERIES")?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.scraper.search_path.contains(QUERY_PLACEHOLDER) {
            bail!(
                "MARKETPLACE_SEARCH_PATH must contain the {} placeholder",
                QUERY_PLACEHOLDER
            );
        }
        if self.scraper.max_concurrent_requests == 0 {
            bail!("MAX_CONCURRENT_REQUESTS must be at least 1");
        }
        if self.scraper.request_timeout_secs == 0 {
            bail!("REQUEST_TIMEOUT must be at least 1 second");
        }
        url::Url::parse(&self.scraper.base_url)
            .with_context(|| format!("invalid MARKETPLACE_BASE_URL: {}", self.scraper.base_url))?;
        Ok(())
    }
}
