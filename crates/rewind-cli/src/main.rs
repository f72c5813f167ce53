use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::eyre;
use commands::{health, identity, serve};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;
mod server;

#[derive(Parser)]
#[command(name = "rewind")]
#[command(about = "Rewind - Relay Plex playback to Trakt scrobbles")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file (defaults to config.toml in the config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server
    #[command(long_about = "Serve the authorization pages and the Plex webhook endpoint. Plex posts playback events to /api?id=<identity>, which are resolved and scrobbled to Trakt.")]
    Serve {
        /// Address to listen on (overrides server.listen and LISTEN)
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,
    },
    /// Check that the credential store is reachable
    Health,
    /// Show a stored identity (tokens are masked)
    Show {
        /// Identity id, as in the webhook URL
        id: String,
    },
    /// Delete a stored identity
    Revoke {
        /// Identity id, as in the webhook URL
        id: String,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let (config, paths) = commands::load_config(cli.config.as_deref())?;
    logging::init_logging(cli.verbose, cli.quiet, &config.logging).map_err(|e| eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Serve { listen } => serve::run_serve(config, &paths, listen, &output).await,
        Commands::Health => health::run_health(&config, &paths, &output).await,
        Commands::Show { id } => identity::run_show(&config, &paths, &id, &output).await,
        Commands::Revoke { id } => identity::run_revoke(&config, &paths, &id, &output).await,
    }
}
