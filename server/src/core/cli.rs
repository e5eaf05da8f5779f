use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_ANALYTICS_MAX_ATTEMPTS, ENV_ANALYTICS_TIMEOUT_SECS, ENV_ANALYTICS_URL, ENV_CONFIG,
    ENV_DEBUG, ENV_DISPATCH_COALESCE, ENV_HOST, ENV_PORT,
};

#[derive(Parser)]
#[command(name = "insight")]
#[command(version, about = "Analytics query gateway", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Enable debug mode
    #[arg(long, global = true, env = ENV_DEBUG)]
    pub debug: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Analytics query service base URL
    #[arg(long, global = true, env = ENV_ANALYTICS_URL)]
    pub analytics_url: Option<String>,

    /// Analytics request timeout in seconds
    #[arg(long, global = true, env = ENV_ANALYTICS_TIMEOUT_SECS)]
    pub analytics_timeout_secs: Option<u64>,

    /// Attempts per analytics request (transient failures only)
    #[arg(long, global = true, env = ENV_ANALYTICS_MAX_ATTEMPTS)]
    pub analytics_max_attempts: Option<u32>,

    /// Share one upstream call between identical concurrent queries
    #[arg(long, global = true, env = ENV_DISPATCH_COALESCE)]
    pub coalesce: Option<bool>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// Compile a filter set against a dataset and print the clause and params
    Compile {
        /// Dataset id (see `insight datasets`)
        #[arg(long, short = 'd')]
        dataset: String,
        /// Filters as a JSON array of {field, operator, value}
        #[arg(long, short = 'f', default_value = "[]")]
        filters: String,
    },
    /// List datasets and their filterable fields
    Datasets,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub debug: bool,
    pub config: Option<PathBuf>,
    pub analytics_url: Option<String>,
    pub analytics_timeout_secs: Option<u64>,
    pub analytics_max_attempts: Option<u32>,
    pub coalesce: Option<bool>,
}

impl From<Cli> for CliConfig {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            debug: cli.debug,
            config: cli.config,
            analytics_url: cli.analytics_url,
            analytics_timeout_secs: cli.analytics_timeout_secs,
            analytics_max_attempts: cli.analytics_max_attempts,
            coalesce: cli.coalesce,
        }
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let mut cli = Cli::parse();
    let command = cli.command.take();
    (cli.into(), command)
}
