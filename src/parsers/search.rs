use scraper::Html;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use super::rules::CompiledRules;
use crate::models::ProductStub;
use crate::utils::absolutize;

#[derive(Debug, Clone)]
pub struct SearchResultParser {
    rules: Arc<CompiledRules>,
    base_url: Url,
}

impl SearchResultParser {
    pub fn new(rules: Arc<CompiledRules>, base_url: Url) -> Self {
        Self { rules, base_url }
    }

    // Cards without a link or a name are skipped.
    pub fn parse(&self, html: &str) -> Vec<ProductStub> {
        let document = Html::parse_document(html);
        let mut stubs = Vec::new();

        for (index, card) in document.select(&self.rules.card).enumerate() {
            let Some(url) = self
                .rules
                .link
                .extract(card)
                .and_then(|href| absolutize(&self.base_url, &href))
            else {
                debug!(card = index, "skipping listing card without a product link");
                continue;
            };

            let Some(name) = self.rules.product_name.extract(card) else {
                debug!(card = index, url = %url, "skipping listing card without a name");
                continue;
            };

            let price = self.rules.price.extract(card).unwrap_or_default();
            stubs.push(ProductStub { name, price, url });
        }

        stubs
    }
}
