//! OpenAPI route map demo - dispatch one request against the sample API.
//!
//! The binary compiles the demo routes, builds a request envelope from the command
//! line, dispatches it and prints the response body. With no arguments it fetches the
//! generated OpenAPI document.
//!
//! # Usage
//!
//! ```bash
//! openapi-route-map [OPTIONS]
//! ```
//!
//! # Examples
//!
//! Print the YAML document:
//! ```bash
//! openapi-route-map
//! ```
//!
//! Call a route with a payload:
//! ```bash
//! openapi-route-map --route "GET /my-route" --payload '{"who":"World"}'
//! ```
//!
//! Call a route with a path parameter and write the body to a file:
//! ```bash
//! openapi-route-map --route "GET /my-route/{who}" --path-param who=World -o hello.json
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_route_map::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse once up front so the verbose flag can configure the logger
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("OpenAPI route map demo starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;
    cli::run(args).await?;

    Ok(())
}
