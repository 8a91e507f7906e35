// ABOUTME: CLI for extracting listing records with immo-extract.
// ABOUTME: Fetches listing pages by URL or reads a saved page and prints JSON or Markdown.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, ValueEnum};
use immo_extract::{
    decode_html, load_builtin_registry, load_registry_json, Extractor, FailurePolicy,
    OutboundListing, Record,
};
use serde_json::{json, Value};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("immo-cli/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Markdown,
}

/// Extract real-estate listings from immoscout24.ch and homegate.ch pages.
#[derive(Parser, Debug)]
#[command(name = "immo-cli")]
#[command(about = "Extract listing records and print JSON or Markdown", long_about = None)]
struct Args {
    /// Listing URLs to fetch
    #[arg()]
    urls: Vec<String>,

    /// Saved listing page to read instead of fetching ("-" for stdin, requires --url)
    #[arg(long)]
    html: Option<PathBuf>,

    /// URL the saved page was read from (required with --html)
    #[arg(long)]
    url: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Output compact JSON instead of pretty
    #[arg(long, default_value_t = false)]
    compact: bool,

    /// Wrap each record as an outbound listing for this project
    #[arg(long)]
    project_id: Option<String>,

    /// JSON file with profile overrides
    #[arg(long)]
    profiles: Option<PathBuf>,

    /// Fail the whole listing when any single field fails
    #[arg(long, default_value_t = false)]
    fail_closed: bool,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if args.html.is_some() && args.url.is_none() {
        eprintln!("error: --url is required when using --html");
        return ExitCode::from(1);
    }
    if args.html.is_none() && args.urls.is_empty() {
        eprintln!("error: at least one URL is required, or use --html with --url");
        return ExitCode::from(1);
    }
    if args.html.is_some() && !args.urls.is_empty() {
        eprintln!("error: cannot use both --html and positional URLs");
        return ExitCode::from(1);
    }

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(1)
        }
    }
}

/// Runs every target. Returns false if any target failed.
fn run(args: &Args) -> Result<bool> {
    let extractor = build_extractor(args)?;

    let mut outcomes = Vec::new();
    if let (Some(path), Some(url)) = (&args.html, &args.url) {
        let outcome = load_file(path).and_then(|html| {
            extractor
                .extract(&html, url)
                .map_err(anyhow::Error::new)
        });
        outcomes.push((url.clone(), outcome));
    } else {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .context("failed to build HTTP client")?;
        for target in &args.urls {
            let outcome = fetch(&client, target).and_then(|(final_url, html)| {
                extractor
                    .extract(&html, &final_url)
                    .map_err(anyhow::Error::new)
            });
            outcomes.push((target.clone(), outcome));
        }
    }

    let all_ok = outcomes.iter().all(|(_, outcome)| outcome.is_ok());
    for (url, outcome) in &outcomes {
        if let Err(err) = outcome {
            warn!(url = url.as_str(), error = %err, "listing extraction failed");
        }
    }

    let rendered = match args.format {
        Format::Json => render_json(&outcomes, args.project_id.as_deref(), args.compact)?,
        Format::Markdown => render_markdown(&outcomes),
    };

    match args.output {
        Some(ref path) => fs::write(path, &rendered)
            .with_context(|| format!("error writing to {}", path.display()))?,
        None => println!("{}", rendered),
    }

    Ok(all_ok)
}

fn build_extractor(args: &Args) -> Result<Extractor> {
    let mut builder = Extractor::builder();
    if args.fail_closed {
        builder = builder.failure_policy(FailurePolicy::Abort);
    }
    if let Some(ref path) = args.profiles {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read profiles {}", path.display()))?;
        let registry = load_registry_json(load_builtin_registry(), &json)
            .with_context(|| format!("invalid profiles in {}", path.display()))?;
        builder = builder.registry(registry);
    }
    Ok(builder.build())
}

/// Reads a saved page, or stdin for "-".
fn load_file(path: &Path) -> Result<String> {
    let bytes = if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        buf
    } else {
        if !path.exists() {
            return Err(anyhow!("file not found: {}", path.display()));
        }
        fs::read(path)?
    };
    Ok(decode_html(&bytes, None))
}

/// Fetches a listing page and returns the final URL (after redirects) with the decoded body.
fn fetch(client: &reqwest::blocking::Client, target: &str) -> Result<(String, String)> {
    let url = Url::parse(target).with_context(|| format!("invalid URL: {}", target))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        bail!("unsupported URL scheme: {}", url.scheme());
    }

    let resp = client.get(url).send()?.error_for_status()?;
    let final_url = resp.url().to_string();
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = resp.bytes()?;
    debug!(url = final_url.as_str(), bytes = bytes.len(), "fetched listing page");

    Ok((final_url, decode_html(&bytes, content_type.as_deref())))
}

fn record_value(record: &Record, project_id: Option<&str>) -> Result<Value> {
    let value = match project_id {
        Some(id) => serde_json::to_value(OutboundListing::new(id, record))?,
        None => serde_json::to_value(record)?,
    };
    Ok(value)
}

/// One envelope per target. A single target prints its envelope alone;
/// several are wrapped with counts.
fn render_json(
    outcomes: &[(String, Result<Record>)],
    project_id: Option<&str>,
    compact: bool,
) -> Result<String> {
    let mut envelopes = Vec::new();
    for (url, outcome) in outcomes {
        envelopes.push(match outcome {
            Ok(record) => json!({
                "url": url,
                "ok": true,
                "record": record_value(record, project_id)?,
                "error": null
            }),
            Err(err) => json!({
                "url": url,
                "ok": false,
                "record": null,
                "error": format!("{:#}", err)
            }),
        });
    }

    let output = if envelopes.len() == 1 {
        envelopes.remove(0)
    } else {
        let extracted = outcomes.iter().filter(|(_, o)| o.is_ok()).count();
        json!({
            "listings": envelopes,
            "total": outcomes.len(),
            "extracted": extracted,
            "failed": outcomes.len() - extracted
        })
    };

    let rendered = if compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    Ok(rendered)
}

fn render_markdown(outcomes: &[(String, Result<Record>)]) -> String {
    outcomes
        .iter()
        .map(|(url, outcome)| match outcome {
            Ok(record) => record.format_markdown(),
            Err(err) => format!("# {}\n\nExtraction failed: {:#}", url, err),
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}
