//! Configuration loading and application.
mod apply;
mod loader;
mod parse;
pub mod types;


pub use apply::{RunPlan, StatsdSettings, apply_config};
pub use loader::{DEFAULT_CONFIG_FILES, load_config, load_config_file};
pub(crate) use parse::parse_duration_value;
