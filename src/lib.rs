//! Core library for the `loadgen` CLI.
//!
//! The crate is split into the load-generation core (`driver`, `protocol`,
//! `metrics`) and the outer surfaces the binary needs to start a run (CLI
//! arguments, config files, logging). The core only ever sees a parsed
//! [`domain::RunConfig`] and an injected [`metrics::MetricsSink`].
pub mod args;
pub mod config;
pub mod domain;
pub mod driver;
pub mod entry;
pub mod error;
pub mod logger;
pub mod metrics;
pub mod protocol;
pub mod shutdown;
pub mod shutdown_handlers;
