use std::path::PathBuf;

use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use graphql_tool_server::server::Server;
use runtime::Config;
use tracing::{Level, info};

mod runtime;

/// Clap styling
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Arguments to the GraphQL tool server
#[derive(Debug, clap::Parser)]
#[command(
    version,
    styles = STYLES,
    about = "GraphQL Tool Server - serve the configuration of a GraphQL client tool",
)]
struct Args {
    /// Path to the config file
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long = "log", short = 'l')]
    log_level: Option<Level>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config: Config = match &args.config {
        Some(config_path) => runtime::read_config(config_path)?,
        None => runtime::read_config_from_env()?,
    };
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    let _guard = runtime::setup_logging(&config)?;

    info!(
        "GraphQL Tool Server v{} // Licensed under MIT",
        std::env!("CARGO_PKG_VERSION")
    );

    Ok(Server::builder()
        .address(config.address)
        .port(config.port)
        .mount_path(config.path)
        .maybe_endpoint_options(config.endpoint)
        .maybe_tool_options(config.tool)
        .build()
        .start()
        .await?)
}
