use scraper::Html;
use std::sync::Arc;

use super::rules::CompiledRules;
use crate::models::SellerInfo;

#[derive(Debug, Clone)]
pub struct SellerDetailParser {
    rules: Arc<CompiledRules>,
}

impl SellerDetailParser {
    pub fn new(rules: Arc<CompiledRules>) -> Self {
        Self { rules }
    }

    pub fn parse(&self, html: &str) -> SellerInfo {
        let document = Html::parse_document(html);
        let root = document.root_element();

        SellerInfo {
            name: self.rules.seller_name.extract(root),
            location: self.rules.seller_location.extract(root),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::ExtractionRules;
    use crate::testing::product_page;

    fn parser() -> SellerDetailParser {
        SellerDetailParser::new(Arc::new(ExtractionRules::default().compile().unwrap()))
    }

    #[test]
    fn extracts_name_and_location() {
        let html = product_page(Some("Himalayan Traders"), Some("Kathmandu Metropolitan City"));
        assert_eq!(
            parser().parse(&html),
            SellerInfo {
                name: Some("Himalayan Traders".into()),
                location: Some("Kathmandu Metropolitan City".into()),
            }
        );
    }

    #[test]
    fn fields_are_independent() {
        let only_name = parser().parse(&product_page(Some("Everest Mart"), None));
        assert_eq!(only_name.name.as_deref(), Some("Everest Mart"));
        assert_eq!(only_name.location, None);

        let only_location = parser().parse(&product_page(None, Some("Lalitpur")));
        assert_eq!(only_location.name, None);
        assert_eq!(only_location.location.as_deref(), Some("Lalitpur"));
    }

    #[test]
    fn page_without_seller_block_is_empty() {
        let info = parser().parse("<html><body><h1>Product</h1></body></html>");
        assert!(info.is_empty());
    }

    #[test]
    fn location_falls_back_to_region_pattern() {
        let html = r#"
            <html><body>
              <div class="seller-name__detail"><a class="seller-name__detail-name">Gandaki Goods</a></div>
              <div class="delivery"><span>Delivers from</span><span>Gandaki Province</span></div>
            </body></html>"#;

        let info = parser().parse(html);

        assert_eq!(info.name.as_deref(), Some("Gandaki Goods"));
        assert_eq!(info.location.as_deref(), Some("Gandaki Province"));
    }
}
