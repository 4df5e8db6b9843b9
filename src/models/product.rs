use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;

use crate::errors::PipelineError;

pub const DEFAULT_LIMIT: usize = 10;
pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    keyword: String,
    limit: usize,
}

impl SearchQuery {
    pub fn new(keyword: &str, limit: Option<i64>) -> Result<Self, PipelineError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(PipelineError::invalid("query must not be empty"));
        }

        let limit = match limit {
            None => DEFAULT_LIMIT,
            Some(n) if n < MIN_LIMIT => {
                return Err(PipelineError::invalid(format!(
                    "limit must be at least {}, got {}",
                    MIN_LIMIT, n
                )))
            }
            Some(n) => n.min(MAX_LIMIT) as usize,
        };

        Ok(Self {
            keyword: keyword.to_string(),
            limit,
        })
    }

    pub fn from_params(keyword: Option<&str>, limit: Option<&str>) -> Result<Self, PipelineError> {
        let keyword = keyword.ok_or_else(|| PipelineError::invalid("missing required parameter: query"))?;
        let limit = match limit.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) => Some(n),
                Err(e) if *e.kind() == IntErrorKind::PosOverflow => Some(MAX_LIMIT),
                Err(_) => {
                    return Err(PipelineError::invalid(format!(
                        "limit must be an integer, got `{}`",
                        raw
                    )))
                }
            },
            None => None,
        };
        Self::new(keyword, limit)
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductStub {
    pub name: String,
    pub price: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerInfo {
    pub name: Option<String>,
    pub location: Option<String>,
}

impl SellerInfo {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.location.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub product_name: String,
    pub price: String,
    pub seller_name: Option<String>,
    pub seller_location: Option<String>,
    pub product_url: String,
}

impl ResultRecord {
    pub fn merge(stub: ProductStub, seller: SellerInfo) -> Self {
        Self {
            product_name: stub.name,
            price: stub.price,
            seller_name: seller.name,
            seller_location: seller.location,
            product_url: stub.url,
        }
    }

    pub fn unenriched(stub: ProductStub) -> Self {
        Self::merge(stub, SellerInfo::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, 10)]
    #[case(Some(1), 1)]
    #[case(Some(25), 25)]
    #[case(Some(50), 50)]
    #[case(Some(51), 50)]
    #[case(Some(10_000), 50)]
    fn limit_is_defaulted_and_clamped(#[case] limit: Option<i64>, #[case] expected: usize) {
        let query = SearchQuery::new("toothpaste", limit).unwrap();
        assert_eq!(query.limit(), expected);
    }

    #[rstest]
    #[case(Some(0))]
    #[case(Some(-3))]
    fn non_positive_limit_is_rejected(#[case] limit: Option<i64>) {
        let err = SearchQuery::new("toothpaste", limit).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    fn blank_keyword_is_rejected(#[case] keyword: &str) {
        assert!(matches!(
            SearchQuery::new(keyword, None),
            Err(PipelineError::InvalidRequest(_))
        ));
    }

    #[test]
    fn keyword_is_trimmed() {
        let query = SearchQuery::new("  red tshirt ", Some(3)).unwrap();
        assert_eq!(query.keyword(), "red tshirt");
    }

    #[test]
    fn from_params_rejects_missing_query_and_non_numeric_limit() {
        assert!(matches!(
            SearchQuery::from_params(None, Some("5")),
            Err(PipelineError::InvalidRequest(_))
        ));
        assert!(matches!(
            SearchQuery::from_params(Some("soap"), Some("ten")),
            Err(PipelineError::InvalidRequest(_))
        ));
        let query = SearchQuery::from_params(Some("soap"), Some(" 7 ")).unwrap();
        assert_eq!(query.limit(), 7);
        let query = SearchQuery::from_params(Some("soap"), Some("")).unwrap();
        assert_eq!(query.limit(), DEFAULT_LIMIT);
    }

    #[rstest]
    #[case("99999999999999999999", 50)]
    #[case("+99999999999999999999", 50)]
    #[case("+8", 8)]
    #[case("51", 50)]
    fn oversized_textual_limit_is_clamped(#[case] raw: &str, #[case] expected: usize) {
        let query = SearchQuery::from_params(Some("soap"), Some(raw)).unwrap();
        assert_eq!(query.limit(), expected);
    }

    #[rstest]
    #[case("-99999999999999999999")]
    #[case("1e3")]
    #[case("12abc")]
    fn unusable_textual_limit_is_rejected(#[case] raw: &str) {
        assert!(matches!(
            SearchQuery::from_params(Some("soap"), Some(raw)),
            Err(PipelineError::InvalidRequest(_))
        ));
    }

    #[test]
    fn record_serializes_null_seller_fields() {
        let stub = ProductStub {
            name: "Colgate 200g".to_string(),
            price: "Rs. 250".to_string(),
            url: "https://www.daraz.com.np/products/colgate-i1.html".to_string(),
        };
        let value = serde_json::to_value(ResultRecord::unenriched(stub)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "product_name": "Colgate 200g",
                "price": "Rs. 250",
                "seller_name": null,
                "seller_location": null,
                "product_url": "https://www.daraz.com.np/products/colgate-i1.html"
            })
        );
    }
}
