//! CLI argument definitions.

use clap::Parser;

use crate::commands::Commands;

/// Magic Stream movie client.
#[derive(Parser, Debug)]
#[command(name = "magicstream")]
#[command(author, version = env!("MAGICSTREAM_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Magic Stream API base URL
    #[arg(
        long,
        env = "MAGICSTREAM_API_URL",
        default_value = "http://localhost:8080",
        global = true
    )]
    pub api_url: String,

    /// Neither send nor save session cookies
    #[arg(long, global = true)]
    pub no_credentials: bool,

    #[command(subcommand)]
    pub command: Commands,
}
