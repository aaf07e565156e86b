// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing) based on -v / -q / RUST_LOG
// 3. Build a Spider, attach a listener that prints each crawled page
// 4. Crawl, then print a table or JSON summary
// 5. Exit with proper code (0 = pages crawled, 1 = nothing crawled, 2 = error)
// =============================================================================

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use site_spider::{CrawlSummary, Event, ScopePolicy, Spider, SpiderConfig, Stage};
use tracing::debug;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // If an unexpected error occurred, print it and exit with code 2
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
fn init_tracing(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr so --json output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    debug!(?cli, "CLI arguments parsed");

    match cli.command {
        Commands::Crawl {
            root_url,
            json,
            user_agent,
            timeout,
            max_redirects,
            same_host,
        } => {
            let mut config = SpiderConfig::default()
                .with_timeout_secs(timeout)
                .with_max_redirects(max_redirects);
            if let Some(user_agent) = user_agent {
                config = config.with_user_agent(user_agent);
            }
            if same_host {
                config = config.with_scope(ScopePolicy::SameHost);
            }
            handle_crawl(&root_url, config, json).await
        }
    }
}

async fn handle_crawl(root_url: &str, config: SpiderConfig, json: bool) -> Result<i32> {
    let mut spider = Spider::new(config)?;

    if !json {
        println!("🔍 Crawling website: {}", root_url);

        // Observer only: returns nothing, so the default link extraction
        // still runs after it
        spider.attach_fn(
            Stage::PostFetch,
            |event: &mut Event<'_>| {
                if let Some(uri) = &event.params().uri {
                    println!("  Crawled: {}", uri);
                }
            },
            10,
        );
    }

    let summary = spider.crawl(Some(root_url)).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_table(&summary);
    }

    if summary.visited.is_empty() {
        Ok(1)
    } else {
        Ok(0)
    }
}

// Prints the summary as a human-readable table in the terminal
fn print_table(summary: &CrawlSummary) {
    println!();

    if summary.root.is_none() {
        println!("⚠️  The root URL is not a valid http(s) URL, nothing was crawled");
        return;
    }

    if !summary.failed.is_empty() {
        println!("{:<70} {:<30}", "URL", "ERROR");
        println!("{}", "=".repeat(100));
        for failed in &summary.failed {
            println!("{:<70} {:<30}", truncate(failed.url.as_str(), 67), failed.message);
        }
        println!();
    }

    println!("📊 Summary:");
    println!("   ✅ Crawled: {}", summary.visited.len());
    println!("   ❌ Failed: {}", summary.failed.len());
    println!("   📋 Discovered: {}", summary.discovered);
}

fn truncate(url: &str, max: usize) -> String {
    if url.chars().count() > max {
        let cut: String = url.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        url.to_string()
    }
}
