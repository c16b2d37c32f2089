//! Semrank command-line entrypoint.
//!
//! ```text
//! semrank rank <request.json | ->
//! semrank suggest <text> <query>
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr (`RUST_LOG`).

use std::io::Read;

use anyhow::{Context, bail};
use mimalloc::MiMalloc;

use semrank::config::Config;
use semrank::pipeline::{SearchRequest, search};
use semrank::suggest::generate_token_suggestions;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const USAGE: &str = "usage:
  semrank rank <request.json | ->
  semrank suggest <text> <query>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("{USAGE}");
        return Ok(());
    }

    let config = Config::from_env()?;
    config.validate()?;
    tracing::debug!(?config, "Loaded configuration");

    match args.first().map(String::as_str) {
        Some("rank") => {
            let source = args.get(1).map(String::as_str).unwrap_or("-");
            let raw = read_request(source)?;
            let mut request: SearchRequest =
                serde_json::from_str(&raw).context("request is not a valid search request")?;
            request.top_k.get_or_insert(config.top_k);

            let response = search(
                &request,
                &config.provider_config(),
                &config.rerank_config(),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Some("suggest") => {
            let (Some(text), Some(query)) = (args.get(1), args.get(2)) else {
                bail!("suggest needs <text> and <query>\n{USAGE}");
            };
            let suggestions = generate_token_suggestions(text, query);
            println!("{}", serde_json::to_string_pretty(&suggestions)?);
        }
        Some(other) => bail!("unknown command '{other}'\n{USAGE}"),
        None => bail!("{USAGE}"),
    }

    Ok(())
}

fn read_request(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read request from stdin")?;
        Ok(raw)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("failed to read {source}"))
    }
}
