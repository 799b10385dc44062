//! Run one trigger outside Lambda. Exits 0 when the envelope reports success.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use xposter::core::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "xposter", about = "Generate and publish a post for one trigger event")]
struct Args {
    /// Trigger JSON file (SQS event or scheduled event). Reads stdin when omitted.
    #[arg(short, long)]
    event: Option<PathBuf>,

    /// Pretty-print the result envelope
    #[arg(long)]
    pretty: bool,
}

fn read_trigger(path: Option<&PathBuf>) -> Result<Value> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading trigger from stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("trigger is not valid JSON")
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    xposter::setup_logging();
    let args = Args::parse();

    let config = AppConfig::from_env()?;
    let trigger = read_trigger(args.event.as_ref())?;
    let envelope = xposter::worker::handle_trigger(&config, &trigger).await;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&envelope)?
    } else {
        serde_json::to_string(&envelope)?
    };
    println!("{rendered}");

    Ok(ExitCode::from(envelope.exit_code()))
}
