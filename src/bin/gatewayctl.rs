use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::path::PathBuf;

use edge_gateway::config::GatewayConfig;
use edge_gateway::fetch::{tasks, FetchMode, OutboundFetcher, ProfileKind};
use edge_gateway::lifecycle::startup::resolve_config;
use edge_gateway::security::{classify, JwtIssuer, Role, SsrfDetector};

#[derive(Parser)]
#[command(name = "gatewayctl")]
#[command(about = "Operator CLI for the edge gateway", long_about = None)]
struct Cli {
    /// Operations API base URL
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Operations API key
    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    /// Gateway config used by local commands (defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Status,
    /// Show the policy the gateway is enforcing
    Policy,
    /// Show request counters
    Stats,
    /// Classify an IP address (internal, gateway, external, invalid)
    Classify { ip: String },
    /// Run the SSRF detector on a path and raw query
    Scan { path: String, query: Option<String> },
    /// Mint a bearer token with the configured secret
    Token {
        #[arg(long)]
        sub: String,
        #[arg(long, default_value = "USER")]
        role: String,
    },
    /// Fetch a URL with an outbound fetch profile
    Fetch {
        url: String,
        #[arg(long, default_value = "avatar_validation")]
        profile: ProfileKind,
        /// POST this JSON document instead of GET
        #[arg(long)]
        post_json: Option<String>,
    },
    /// Import an avatar from a URL
    Import { url: String },
    /// Run the registration-time email domain check
    EmailCheck {
        email: String,
        #[arg(long, default_value = "new-user")]
        username: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Status => admin_get(&cli.url, &cli.key, "/admin/status").await?,
        Commands::Policy => admin_get(&cli.url, &cli.key, "/admin/policy").await?,
        Commands::Stats => admin_get(&cli.url, &cli.key, "/admin/stats").await?,
        Commands::Classify { ip } => {
            println!("{}", classify(&ip));
        }
        Commands::Scan { path, query } => {
            let config = local_config(cli.config)?;
            let verdict = SsrfDetector::new(&config.ssrf).scan(&path, query.as_deref());
            println!("{}", verdict);
        }
        Commands::Token { sub, role } => {
            let config = local_config(cli.config)?;
            let role: Role = role.parse()?;
            println!("{}", JwtIssuer::new(&config.auth).issue(&sub, role)?);
        }
        Commands::Fetch { url, profile, post_json } => {
            let config = local_config(cli.config)?;
            let mode = match post_json {
                Some(raw) => FetchMode::Post(serde_json::from_str(&raw)?),
                None => FetchMode::Get,
            };
            let result = OutboundFetcher::new(&config.fetch)?.fetch(profile, &url, mode).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Import { url } => {
            let config = local_config(cli.config)?;
            let import = tasks::import_avatar(&OutboundFetcher::new(&config.fetch)?, &url).await;
            println!("{}", serde_json::to_string_pretty(&import)?);
        }
        Commands::EmailCheck { email, username } => {
            let config = local_config(cli.config)?;
            let fetcher = OutboundFetcher::new(&config.fetch)?;
            let check = tasks::validate_email_domain(&fetcher, &email, &username).await;
            println!("{}", serde_json::to_string_pretty(&check)?);
        }
    }

    Ok(())
}

fn local_config(path: Option<PathBuf>) -> Result<GatewayConfig, Box<dyn std::error::Error>> {
    Ok(resolve_config(path.as_deref())?)
}

async fn admin_get(base: &str, key: &str, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);

    let res = reqwest::Client::new()
        .get(format!("{}{}", base.trim_end_matches('/'), path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
