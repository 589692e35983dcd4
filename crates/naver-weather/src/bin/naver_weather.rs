//! naver-weather CLI
//!
//! Usage:
//!   naver-weather serve [-p port] [-s selectors.yaml]   # MCP over HTTP at /mcp
//!   naver-weather stdio [-s selectors.yaml]             # MCP over stdin/stdout
//!   naver-weather query <region> [-f text|json]         # One-shot lookup
//!   naver-weather fields                                # Supported fields as JSON
//!
//! Environment: CACHE_TTL_SECONDS, RATE_LIMIT_INTERVAL, PORT,
//! NAVER_WEATHER_SELECTORS, RUST_LOG.

use anyhow::Context;
use argh::FromArgs;
use naver_weather::fetch::ReqwestTransport;
use naver_weather::mcp::{run_mcp_server, run_mcp_stdio};
use naver_weather::{Config, WeatherService};
use std::path::PathBuf;
use std::sync::Arc;

/// Naver weather lookup for Korean regions, served over MCP
#[derive(FromArgs)]
struct Args {
    /// show version information
    #[argh(switch, short = 'V')]
    version: bool,

    #[argh(subcommand)]
    command: Option<Command>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Serve(ServeArgs),
    Stdio(StdioArgs),
    Query(QueryArgs),
    Fields(FieldsArgs),
}

/// Run the MCP server over HTTP
#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
struct ServeArgs {
    /// HTTP port (default: PORT or 8000)
    #[argh(option, short = 'p')]
    port: Option<u16>,

    /// YAML selector table replacing the built-in one
    #[argh(option, short = 's')]
    selectors: Option<PathBuf>,
}

/// Run the MCP server over stdin/stdout
#[derive(FromArgs)]
#[argh(subcommand, name = "stdio")]
struct StdioArgs {
    /// YAML selector table replacing the built-in one
    #[argh(option, short = 's')]
    selectors: Option<PathBuf>,
}

/// Look up the weather for one region and print it
#[derive(FromArgs)]
#[argh(subcommand, name = "query")]
struct QueryArgs {
    /// korean place name, e.g. 서울
    #[argh(positional)]
    region: String,

    /// output format: text, json (default: text)
    #[argh(option, short = 'f', default = "String::from(\"text\")")]
    format: String,

    /// YAML selector table replacing the built-in one
    #[argh(option, short = 's')]
    selectors: Option<PathBuf>,
}

/// Print the supported fields and current settings as JSON
#[derive(FromArgs)]
#[argh(subcommand, name = "fields")]
struct FieldsArgs {}

fn init_logging(default_filter: &str) {
    // Always stderr: in stdio mode stdout carries JSON-RPC.
    drop(
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
            .target(env_logger::Target::Stderr)
            .try_init(),
    );
}

fn load_config(selectors: Option<PathBuf>) -> anyhow::Result<Config> {
    let mut config = Config::from_env().context("invalid environment configuration")?;
    if selectors.is_some() {
        config.selectors_path = selectors;
    }
    Ok(config)
}

fn build_service(config: &Config) -> anyhow::Result<Arc<WeatherService<ReqwestTransport>>> {
    let service = WeatherService::from_config(config).context("failed to build weather service")?;
    log::info!(
        "Weather service ready (cache ttl {}s, rate limit {:.2}s)",
        config.cache_ttl.as_secs(),
        config.rate_limit_interval.as_secs_f64()
    );
    Ok(Arc::new(service))
}

async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    init_logging("info");
    let mut config = load_config(args.selectors)?;
    if let Some(port) = args.port {
        config.port = port;
    }
    let service = build_service(&config)?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());
    ctrlc::set_handler(move || {
        log::info!("Received Ctrl+C, shutting down gracefully...");
        shutdown_tx.send(()).ok();
    })?;

    log::info!("Starting MCP server on HTTP port {}...", config.port);
    run_mcp_server(service, config.port, shutdown_rx)
        .await
        .map_err(|e| anyhow::anyhow!(e))
}

async fn run_stdio(args: StdioArgs) -> anyhow::Result<()> {
    init_logging("info");
    let config = load_config(args.selectors)?;
    let service = build_service(&config)?;

    log::info!("Starting MCP server in stdio mode...");
    run_mcp_stdio(service).await.map_err(|e| anyhow::anyhow!(e))
}

async fn run_query(args: QueryArgs) -> anyhow::Result<()> {
    init_logging("warn");
    let config = load_config(args.selectors)?;
    let service = build_service(&config)?;
    println!("{}", service.query(&args.region, &args.format).await);
    Ok(())
}

fn run_fields() -> anyhow::Result<()> {
    init_logging("warn");
    let config = load_config(None)?;
    let service = build_service(&config)?;
    println!("{}", serde_json::to_string_pretty(&service.supported_fields())?);
    Ok(())
}

fn print_usage() {
    eprintln!("naver-weather - Naver weather lookup over MCP\n");
    eprintln!("Usage: naver-weather <command>\n");
    eprintln!("Commands:");
    eprintln!("  serve     Run the MCP server over HTTP (/mcp):");
    eprintln!("              -p, --port <port>: HTTP port (default: PORT or 8000)");
    eprintln!("              -s, --selectors <file>: YAML selector table");
    eprintln!("  stdio     Run the MCP server over stdin/stdout");
    eprintln!("              -s, --selectors <file>: YAML selector table");
    eprintln!("  query     Look up one region: query <region>");
    eprintln!("              -f, --format <fmt>: text or json (default: text)");
    eprintln!("  fields    Print supported fields and settings as JSON");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CACHE_TTL_SECONDS        cache entry lifetime (default: 600)");
    eprintln!("  RATE_LIMIT_INTERVAL      seconds between upstream requests (default: 1.0)");
    eprintln!("  PORT                     HTTP port for serve (default: 8000)");
    eprintln!("  NAVER_WEATHER_SELECTORS  YAML selector table");
    eprintln!();
    eprintln!("Run 'naver-weather <command> --help' for more information.");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();

    if args.version {
        println!("naver-weather {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    match args.command {
        None => {
            print_usage();
            Ok(())
        }
        Some(Command::Serve(args)) => run_serve(args).await,
        Some(Command::Stdio(args)) => run_stdio(args).await,
        Some(Command::Query(args)) => run_query(args).await,
        Some(Command::Fields(_)) => run_fields(),
    }
}
