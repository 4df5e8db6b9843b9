mod config;
mod errors;
mod handlers;
mod models;
mod parsers;
mod repositories;
mod routes;
mod services;
mod utils;

#[cfg(test)]
mod testing;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Config, SecurityConfig};
use handlers::health::not_found;
use parsers::{CompiledRules, ExtractionRules};
use repositories::{HttpPageFetcher, RateLimitedFetcher};
use routes::api;
use services::{CacheService, ExtractionService};

#[derive(Clone)]
pub struct AppState {
    pub extraction: Arc<ExtractionService>,
    pub cache_service: CacheService,
    pub config: Config,
    pub start_time: Instant,
}

fn load_rules(config: &Config) -> anyhow::Result<CompiledRules> {
    let rules = match &config.scraper.rules_path {
        Some(path) => {
            info!("Loading extraction rules from {}", path);
            ExtractionRules::load(path)?
        }
        None => ExtractionRules::default(),
    };
    Ok(rules.compile()?)
}

fn build_extraction(config: &Config) -> anyhow::Result<ExtractionService> {
    let rules = load_rules(config).context("extraction rules")?;
    let http = HttpPageFetcher::new(&config.scraper.user_agent).context("HTTP client")?;
    let fetcher = RateLimitedFetcher::new(
        http,
        config.scraper.max_concurrent_requests,
        config.scraper.requests_per_second,
    );

    ExtractionService::new(Arc::new(fetcher), Arc::new(rules), &config.scraper)
        .context("MARKETPLACE_BASE_URL")
}

fn build_cors(security: &SecurityConfig) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);

    if security.allowed_origins.iter().any(|origin| origin == "*") {
        cors.allow_any_origin()
    } else {
        security
            .allowed_origins
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => {
            info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Starting Marketplace Seller API on port {} (marketplace: {})",
        config.server.port, config.scraper.base_url
    );

    let extraction = match build_extraction(&config) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!("Failed to initialize extraction pipeline: {:#}", e);
            std::process::exit(1);
        }
    };

    let state = AppState {
        extraction,
        cache_service: CacheService::new(config.cache.clone()),
        config: config.clone(),
        start_time: Instant::now(),
    };

    // Create HTTP server
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(build_cors(&state.config.security))
            .wrap(Logger::default())
            .configure(api::root)
            .service(api::config())
            .default_service(web::route().to(not_found))
    })
    .bind(format!("{}:{}", config.server.host, config.server.port))?;

    info!(
        "Server started successfully at http://{}:{}",
        config.server.host, config.server.port
    );

    server.workers(config.server.workers).run().await
}
