//! Polling client for the status service.
//!
//! Issues a `GET /status` every poll interval and a `POST /flaky`
//! every flaky interval, reporting duration and outcome per request.
//! Exits on Ctrl+C without persisting state.

use std::time::{Duration, Instant};

use clap::Parser;

#[derive(Parser)]
#[command(name = "status-cli")]
#[command(about = "Polling client for the status service", long_about = None)]
struct Cli {
    /// Target host; defaults to $HOST, then "localhost".
    #[arg(long)]
    host: Option<String>,

    /// Target port; defaults to $PORT, then 8080.
    #[arg(long)]
    port: Option<u16>,

    /// Seconds between status polls.
    #[arg(long, default_value_t = 3)]
    poll_interval: u64,

    /// Seconds between flaky toggles.
    #[arg(long, default_value_t = 10)]
    flaky_interval: u64,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 5)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let host = cli
        .host
        .or_else(|| std::env::var("HOST").ok().filter(|h| !h.is_empty()))
        .unwrap_or_else(|| "localhost".to_string());
    let port = cli
        .port
        .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
        .unwrap_or(8080);

    let status_url = format!("http://{host}:{port}/status");
    let flaky_url = format!("http://{host}:{port}/flaky");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .build()?;

    println!(
        "Monitoring {status_url} every {}s, toggling {flaky_url} every {}s ({}s timeout)",
        cli.poll_interval, cli.flaky_interval, cli.timeout
    );
    println!("Press Ctrl+C to exit");

    let mut poll = tokio::time::interval(Duration::from_secs(cli.poll_interval));
    let mut flaky = tokio::time::interval(Duration::from_secs(cli.flaky_interval));

    loop {
        tokio::select! {
            _ = poll.tick() => check_status(&client, &status_url).await,
            _ = flaky.tick() => toggle_flaky(&client, &flaky_url).await,
            _ = tokio::signal::ctrl_c() => {
                println!("\nReceived interrupt, shutting down");
                break;
            }
        }
    }

    Ok(())
}

async fn check_status(client: &reqwest::Client, url: &str) {
    println!("\nChecking {url}");
    let start = Instant::now();
    let response = client.get(url).send().await;
    println!("  Duration: {:?}", start.elapsed());

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            println!("  Success: false");
            println!("  Error: {e}");
            return;
        }
    };

    let status = response.status();
    println!("  Success: {}", status.is_success());
    println!("  Status Code: {}", status.as_u16());
    match response.text().await {
        Ok(body) => println!("  Response: {}", body.trim_end()),
        Err(e) => println!("  Error reading body: {e}"),
    }
}

async fn toggle_flaky(client: &reqwest::Client, url: &str) {
    match client.post(url).send().await {
        Ok(response) => println!("\nToggled flaky mode: {}", response.status().as_u16()),
        Err(e) => println!("\nFailed to toggle flaky mode: {e}"),
    }
}
