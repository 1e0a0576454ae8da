use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "failover-cli")]
#[command(about = "Management CLI for the backend failover service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "FAILOVER_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show connection mode and monitor state
    Status,
    /// Check the current backend handle
    Health,
    /// Connect in the given mode (primary or fallback)
    Switch { mode: String },
    /// Control the health monitor
    Monitor {
        #[command(subcommand)]
        action: MonitorAction,
    },
}

#[derive(Subcommand)]
enum MonitorAction {
    Start,
    Stop,
    /// Show monitor statistics
    Stats,
    /// Run one health check now
    Check,
    /// Enable or disable the manual override
    Override {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Change the check interval and/or the critical temperature
    Config {
        #[arg(long)]
        interval_secs: Option<u64>,
        #[arg(long)]
        critical_temperature: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let base = cli.url.trim_end_matches('/');
    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", base)),
        Commands::Health => client.get(format!("{}/admin/health", base)),
        Commands::Switch { mode } => client
            .post(format!("{}/admin/switch", base))
            .json(&json!({ "mode": mode })),
        Commands::Monitor { action } => match action {
            MonitorAction::Start => client.post(format!("{}/admin/monitor/start", base)),
            MonitorAction::Stop => client.post(format!("{}/admin/monitor/stop", base)),
            MonitorAction::Stats => client.get(format!("{}/admin/monitor/stats", base)),
            MonitorAction::Check => client.post(format!("{}/admin/monitor/check", base)),
            MonitorAction::Override { enabled } => client
                .post(format!("{}/admin/monitor/override", base))
                .json(&json!({ "enabled": enabled })),
            MonitorAction::Config {
                interval_secs,
                critical_temperature,
            } => client
                .put(format!("{}/admin/monitor/config", base))
                .json(&json!({
                    "interval_secs": interval_secs,
                    "critical_temperature_celsius": critical_temperature,
                })),
        },
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) if !text.is_empty() => println!("{}", text),
        Err(_) => {}
    }

    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        std::process::exit(1);
    }
    Ok(())
}
