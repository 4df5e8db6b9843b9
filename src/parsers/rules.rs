use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::RulesError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldRule {
    Text { selector: String },
    Attr { selector: String, attr: String },
    // Capture group 1 if present, else the whole match.
    Pattern { pattern: String },
}

impl FieldRule {
    pub fn text(selector: &str) -> Self {
        FieldRule::Text {
            selector: selector.to_string(),
        }
    }

    pub fn attr(selector: &str, attr: &str) -> Self {
        FieldRule::Attr {
            selector: selector.to_string(),
            attr: attr.to_string(),
        }
    }

    pub fn pattern(pattern: &str) -> Self {
        FieldRule::Pattern {
            pattern: pattern.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChain {
    pub rules: Vec<FieldRule>,
    #[serde(default)]
    pub min_chars: usize,
    #[serde(default)]
    pub reject_prefixes: Vec<String>,
}

impl FieldChain {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self {
            rules,
            ..Default::default()
        }
    }

    pub fn longer_than(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    pub fn rejecting(mut self, prefix: &str) -> Self {
        self.reject_prefixes.push(prefix.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRules {
    pub card: String,
    pub link: FieldChain,
    pub name: FieldChain,
    pub price: FieldChain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerRules {
    pub name: FieldChain,
    pub location: FieldChain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRules {
    pub search: SearchRules,
    pub seller: SellerRules,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            search: SearchRules {
                card: "div[data-qa-locator='product-item']".to_string(),
                link: FieldChain::new(vec![FieldRule::attr("a[href*='/products/']", "href")]),
                name: FieldChain::new(vec![
                    FieldRule::text("div.RfADt"),
                    FieldRule::attr("a[href*='/products/'][title]", "title"),
                    FieldRule::attr("img[alt]", "alt"),
                    FieldRule::text("a[href*='/products/']"),
                ])
                .longer_than(3)
                .rejecting("Rs."),
                price: FieldChain::new(vec![
                    FieldRule::text("span.ooOxS"),
                    FieldRule::text("span[class*='price']"),
                    FieldRule::pattern(r"Rs\.\s*[\d,]+"),
                ]),
            },
            seller: SellerRules {
                name: FieldChain::new(vec![
                    FieldRule::text("div.seller-name__detail a.seller-name__detail-name"),
                    FieldRule::text("a[class*='seller-name']"),
                ]),
                location: FieldChain::new(vec![
                    FieldRule::text("div.seller-location"),
                    FieldRule::pattern(r"([A-Za-z ]+Province)"),
                    FieldRule::pattern(r"([A-Za-z ]+District)"),
                    FieldRule::pattern(r"([A-Za-z ]+City)"),
                    FieldRule::pattern(r"([A-Za-z ]+Nepal)"),
                ])
                .longer_than(3),
            },
        }
    }
}

impl ExtractionRules {
    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RulesError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| RulesError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn compile(&self) -> Result<CompiledRules, RulesError> {
        Ok(CompiledRules {
            card: compile_selector(&self.search.card)?,
            link: CompiledChain::compile(&self.search.link)?,
            product_name: CompiledChain::compile(&self.search.name)?,
            price: CompiledChain::compile(&self.search.price)?,
            seller_name: CompiledChain::compile(&self.seller.name)?,
            seller_location: CompiledChain::compile(&self.seller.location)?,
        })
    }
}

fn compile_selector(selector: &str) -> Result<Selector, RulesError> {
    Selector::parse(selector).map_err(|e| RulesError::Selector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}

#[derive(Debug)]
enum Step {
    Text(Selector),
    Attr(Selector, String),
    Pattern(Regex),
}

impl Step {
    fn compile(rule: &FieldRule) -> Result<Self, RulesError> {
        Ok(match rule {
            FieldRule::Text { selector } => Step::Text(compile_selector(selector)?),
            FieldRule::Attr { selector, attr } => {
                Step::Attr(compile_selector(selector)?, attr.clone())
            }
            FieldRule::Pattern { pattern } => {
                Step::Pattern(Regex::new(pattern).map_err(|source| RulesError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })?)
            }
        })
    }

    fn candidate(&self, scope: ElementRef<'_>) -> Option<String> {
        match self {
            Step::Text(selector) => scope.select(selector).next().map(|el| element_text(el)),
            Step::Attr(selector, attr) => scope
                .select(selector)
                .next()
                .and_then(|el| el.value().attr(attr))
                .map(normalize_whitespace),
            Step::Pattern(regex) => {
                let text = scope.text().collect::<Vec<_>>().join("\n");
                let captures = regex.captures(&text)?;
                captures
                    .get(1)
                    .or_else(|| captures.get(0))
                    .map(|m| normalize_whitespace(m.as_str()))
            }
        }
    }
}

#[derive(Debug)]
pub struct CompiledChain {
    steps: Vec<Step>,
    min_chars: usize,
    reject_prefixes: Vec<String>,
}

impl CompiledChain {
    fn compile(chain: &FieldChain) -> Result<Self, RulesError> {
        Ok(Self {
            steps: chain
                .rules
                .iter()
                .map(Step::compile)
                .collect::<Result<_, _>>()?,
            min_chars: chain.min_chars,
            reject_prefixes: chain.reject_prefixes.clone(),
        })
    }

    pub fn extract(&self, scope: ElementRef<'_>) -> Option<String> {
        self.steps
            .iter()
            .filter_map(|step| step.candidate(scope))
            .find(|candidate| self.accepts(candidate))
    }

    fn accepts(&self, candidate: &str) -> bool {
        !candidate.is_empty()
            && candidate.chars().count() > self.min_chars
            && !self
                .reject_prefixes
                .iter()
                .any(|prefix| candidate.starts_with(prefix.as_str()))
    }
}

#[derive(Debug)]
pub struct CompiledRules {
    pub(crate) card: Selector,
    pub(crate) link: CompiledChain,
    pub(crate) product_name: CompiledChain,
    pub(crate) price: CompiledChain,
    pub(crate) seller_name: CompiledChain,
    pub(crate) seller_location: CompiledChain,
}

fn element_text(el: ElementRef<'_>) -> String {
    normalize_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
