pub mod hashing;
pub mod links;

pub use hashing::*;
pub use links::*;
