// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The CLI is a small program that embeds the site_spider library: it turns
// flags into a SpiderConfig, attaches a listener that prints each crawled
// page, and reports a summary at the end.
// =============================================================================

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "site-spider",
    version,
    about = "Crawl every page of a single website, breadth-first",
    long_about = "site-spider starts at a root URL and follows every same-site link it finds, \
                  fetching each page exactly once. Links to other sites are never followed."
)]
pub struct Cli {
    /// More log output (-v = debug, -vv = trace). RUST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website starting from a root URL
    ///
    /// Example: site-spider crawl http://localhost:8000 --json
    Crawl {
        /// Root URL to start from (e.g., https://example.com)
        root_url: String,

        /// Output the summary as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// User-Agent header sent with every request
        #[arg(long)]
        user_agent: Option<String>,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = site_spider::config::DEFAULT_TIMEOUT_SECS)]
        timeout: u64,

        /// Redirects a single request may follow
        #[arg(long, default_value_t = site_spider::config::DEFAULT_MAX_REDIRECTS)]
        max_redirects: usize,

        /// Treat http and https (and any port) of the root's host as the same site
        #[arg(long)]
        same_host: bool,
    },
}
