pub mod cache_service;
pub mod extraction_service;

pub use cache_service::*;
pub use extraction_service::*;
