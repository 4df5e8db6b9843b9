pub mod api;
pub mod product;

pub use api::*;
pub use product::*;
