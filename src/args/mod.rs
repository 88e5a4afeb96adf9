//! CLI argument types and parsing helpers.
mod cli;
pub(crate) mod parsers;
mod types;


pub use cli::LoadArgs;
pub use types::{PositiveU64, PositiveUsize};
