//! Binary entry: parses flags, merges the config file, wires the sinks and
//! hands the run to the driver.
mod plan;
mod summary;


use std::ffi::OsString;
use std::path::Path;

use clap::{CommandFactory, FromArgMatches};

use crate::args::LoadArgs;
use crate::config::DEFAULT_CONFIG_FILES;
use crate::error::{AppError, AppResult, ConfigError};
use plan::{build_plan, execute_plan};

pub use summary::format_summary;

/// Runs the CLI to completion.
///
/// # Errors
///
/// Returns an error when arguments or configuration are invalid, the
/// protocol is unknown, or the runtime cannot start.
pub fn run() -> AppResult<()> {
    let args = parse_args()?;

    crate::logger::init_logging(args.verbose);

    let plan = build_plan(&args)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(execute_plan(&plan))
}

fn parse_args() -> AppResult<LoadArgs> {
    let mut cmd = LoadArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if is_bare_invocation(&raw_args) && !has_config_source() {
        eprintln!("{}", cmd.render_help());
        return Err(AppError::config(ConfigError::NoConfigFound {
            tried: DEFAULT_CONFIG_FILES.join(", "),
        }));
    }

    let matches = cmd.get_matches_from(raw_args);
    let args = LoadArgs::from_arg_matches(&matches)?;

    Ok(args)
}

fn is_bare_invocation(raw_args: &[OsString]) -> bool {
    matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--")
}

fn has_config_source() -> bool {
    std::env::var_os("LOADGEN_CONFIG").is_some()
        || DEFAULT_CONFIG_FILES
            .iter()
            .any(|path| Path::new(path).exists())
}
