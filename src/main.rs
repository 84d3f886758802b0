// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Gather CLI - Browser-Emulating Fetch Client
//!
//! Example usage and demonstration of the gather library.

use std::env;
use std::process::ExitCode;

use gather::{ClientPool, FetchClient, FetchConfig};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gather=info".parse().unwrap()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    match args[1].as_str() {
        "fetch" => {
            if args.len() < 3 {
                eprintln!("Usage: gather fetch <url> [agent]");
                return ExitCode::from(1);
            }
            let agent = args.get(3).map(String::as_str).unwrap_or("chrome");
            fetch_url(&args[2], agent).await
        }
        "batch" => {
            if args.len() < 4 {
                eprintln!("Usage: gather batch <size> <url>...");
                return ExitCode::from(1);
            }
            let size = match args[2].parse::<usize>() {
                Ok(n) => n,
                Err(_) => {
                    eprintln!("Invalid pool size: {}", args[2]);
                    return ExitCode::from(1);
                }
            };
            fetch_batch(size, &args[3..]).await
        }
        "--help" | "-h" | "help" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "--version" | "-v" | "version" => {
            println!("gather {}", gather::VERSION);
            ExitCode::SUCCESS
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"Gather - Browser-Emulating Fetch Client

USAGE:
    gather <COMMAND> [OPTIONS]

COMMANDS:
    fetch <url> [agent]        Fetch a URL and print the body
    batch <size> <url>...      Fetch URLs in parallel through a client pool
    help                       Show this help message
    version                    Show version information

AGENTS:
    chrome (default), baidu, google, bing, 360, ie, or a literal User-Agent

EXAMPLES:
    gather fetch https://example.com
    gather fetch https://example.com google
    gather batch 3 https://example.com/a https://example.com/b

Set RUST_LOG=gather=debug to trace requests and cookie changes.
"#
    );
}

async fn fetch_url(url: &str, agent: &str) -> ExitCode {
    let client = match FetchClient::new(FetchConfig::for_agent(agent).cookie_logging(true)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return ExitCode::from(1);
        }
    };

    match client.get(url, "").await {
        Ok(response) => {
            eprintln!("Final URL: {}", response.url);
            eprintln!("Status: {}", response.status);
            eprintln!("Cookies held: {}", client.cookie_jar().len());
            println!("{}", response.text());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Fetch failed: {}", e);
            ExitCode::from(1)
        }
    }
}

async fn fetch_batch(size: usize, urls: &[String]) -> ExitCode {
    let pool = match ClientPool::new(FetchConfig::for_agent("chrome").timeout_secs(60), size) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to create pool: {}", e);
            return ExitCode::from(1);
        }
    };

    let mut failed = false;
    for (url, result) in urls.iter().zip(pool.fetch_all(urls, "").await) {
        match result {
            Ok(response) => println!("{} -> {} ({} bytes)", url, response.url, response.body.len()),
            Err(e) => {
                failed = true;
                println!("{} -> ERROR: {}", url, e);
            }
        }
    }

    let stats = pool.stats();
    eprintln!(
        "Pool: {} clients, peak {} busy, waited {}ms total",
        pool.size(),
        stats.peak_in_use,
        stats.total_wait_ms
    );

    if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
