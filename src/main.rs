use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use svcscope_logs::{
    FileOpener, LogLevel, LogQuery, LogQueryService, RecordParser, ServiceRegistry, SourceReader,
};

mod config;
mod output;

use config::Config;

/// svcscope - Show the most recent log entries of a managed service
#[derive(Parser, Debug)]
#[command(name = "svcscope")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Service name (lists known services if not provided)
    #[arg(value_name = "SERVICE")]
    service: Option<String>,

    /// Number of most recent entries to return
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Only show entries at or above this level
    #[arg(short, long, value_parser = parse_level)]
    level: Option<LogLevel>,

    /// Only show entries from this component
    #[arg(short, long)]
    component: Option<String>,

    /// Directory holding <service>.log files (overrides the config file)
    #[arg(long, value_name = "DIR")]
    logs_dir: Option<PathBuf>,

    /// Config file
    #[arg(long, default_value = "svcscope.toml")]
    config: PathBuf,

    /// Print entries as JSON
    #[arg(long)]
    json: bool,
}

fn parse_level(s: &str) -> Result<LogLevel, svcscope_types::UnknownLevel> {
    s.to_uppercase().parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing for debugging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Run the application
    let result = run_app(args).await;

    // Handle any errors
    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run_app(args: Args) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    if let Some(logs_dir) = args.logs_dir {
        config.logs_dir = Some(logs_dir);
    }

    let registry = config.registry()?;

    let Some(service) = args.service else {
        let mut out = std::io::stdout().lock();
        for name in registry.services() {
            writeln!(out, "{}", name)?;
        }
        return Ok(());
    };

    let parser = RecordParser::new(&config.source_tag)
        .with_context(|| format!("Invalid source tag '{}'", config.source_tag))?;
    let reader = SourceReader::new(parser, FileOpener::new(config.chunk_size));
    let logs = LogQueryService::new(registry, reader);

    let mut query = LogQuery::new(service, args.count.unwrap_or(config.default_count));
    query.level = args.level;
    query.component = args.component;

    // Abort the scan on Ctrl-C
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let entries = logs.get_log_entries_with_cancel(&query, &cancel).await?;

    let mut out = std::io::stdout().lock();
    if args.json {
        output::write_json(&mut out, &entries)?;
    } else {
        output::write_text(&mut out, &config.source_tag, &entries)?;
    }

    Ok(())
}
