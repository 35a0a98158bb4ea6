pub mod config;
pub mod error;
pub mod ids;
pub mod types;
mod vocabulary;

pub use error::{ReelscopeError, Result};
pub use ids::*;
