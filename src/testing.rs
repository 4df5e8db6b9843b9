use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::errors::FetchError;
use crate::parsers::ExtractionRules;
use crate::repositories::PageFetcher;
use crate::services::{CacheService, ExtractionService};
use crate::AppState;

#[derive(Debug, Clone)]
enum Fixture {
    Page { html: String, delay: Duration },
    Fail(FetchError),
}

#[derive(Debug, Default)]
pub struct FixtureFetcher {
    pages: HashMap<String, Fixture>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, html: impl Into<String>) -> Self {
        self.with_slow_page(url, html, Duration::ZERO)
    }

    pub fn with_slow_page(mut self, url: &str, html: impl Into<String>, delay: Duration) -> Self {
        self.pages.insert(
            url.to_string(),
            Fixture::Page {
                html: html.into(),
                delay,
            },
        );
        self
    }

    pub fn with_timeout(mut self, url: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            Fixture::Fail(FetchError::Timeout {
                url: url.to_string(),
            }),
        );
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(
            url.to_string(),
            Fixture::Fail(FetchError::HttpStatus {
                url: url.to_string(),
                status,
            }),
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);

        let outcome = match self.pages.get(url) {
            Some(Fixture::Page { html, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                Ok(html.clone())
            }
            Some(Fixture::Fail(error)) => Err(error.clone()),
            None => Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: 404,
            }),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

pub const BASE_URL: &str = "https://www.daraz.com.np";

pub fn search_url(encoded_keyword: &str) -> String {
    format!("{}/catalog/?q={}", BASE_URL, encoded_keyword)
}

pub fn product_url(slug: &str) -> String {
    format!("{}/products/{}.html", BASE_URL, slug)
}

pub fn listing_card(name: &str, price: &str, href: &str) -> String {
    format!(
        r#"<div data-qa-locator="product-item">
  <div class="Bm3ON">
    <a href="{href}" title="{name}"><img src="/img/thumb.jpg" alt="{name}"></a>
    <div class="RfADt"><a href="{href}">{name}</a></div>
    <div class="aBrP0"><span class="ooOxS">{price}</span></div>
  </div>
</div>"#
    )
}

pub fn search_page(cards: &[String]) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head><title>Search results</title></head>
<body><div data-qa-locator="general-products">{}</div></body></html>"#,
        cards.join("\n")
    )
}

pub fn product_page(seller: Option<&str>, location: Option<&str>) -> String {
    let seller_block = seller
        .map(|name| {
            format!(
                r#"<div class="seller-name__detail"><a class="seller-name__detail-name" href="/shop/x">{}</a></div>"#,
                name
            )
        })
        .unwrap_or_default();
    let location_block = location
        .map(|place| format!(r#"<div class="seller-location">{}</div>"#, place))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html><head><title>Product</title></head>
<body><h1 class="pdp-mod-product-badge-title">Item</h1>{}{}</body></html>"#,
        seller_block, location_block
    )
}

pub fn soap_marketplace() -> FixtureFetcher {
    FixtureFetcher::new()
        .with_page(
            &search_url("soap"),
            search_page(&[
                listing_card("Dettol Original Soap", "Rs. 95", "/products/soap-a.html"),
                listing_card("Lifebuoy Total Soap", "Rs. 80", "/products/soap-b.html"),
                listing_card("Lux Soft Touch Soap", "Rs. 60", "/products/soap-c.html"),
            ]),
        )
        .with_page(
            &product_url("soap-a"),
            product_page(Some("Alpha Store"), Some("Kathmandu")),
        )
        .with_page(
            &product_url("soap-b"),
            product_page(Some("Bravo Traders"), Some("Pokhara")),
        )
        .with_page(
            &product_url("soap-c"),
            product_page(Some("Charlie Mart"), Some("Biratnagar")),
        )
}

pub fn extraction_service(fetcher: Arc<dyn PageFetcher>) -> ExtractionService {
    let rules = ExtractionRules::default().compile().unwrap();
    ExtractionService::new(fetcher, Arc::new(rules), &Config::default().scraper).unwrap()
}

pub fn app_state(fetcher: Arc<dyn PageFetcher>) -> AppState {
    let config = Config::default();
    AppState {
        extraction: Arc::new(extraction_service(fetcher)),
        cache_service: CacheService::new(config.cache.clone()),
        config,
        start_time: Instant::now(),
    }
}
