pub mod rules;
pub mod search;
pub mod seller;

pub use rules::{CompiledRules, ExtractionRules};
pub use search::SearchResultParser;
pub use seller::SellerDetailParser;
