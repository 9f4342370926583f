use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use anyhow::{Context, bail};
use clap::Parser;
use harvest_core::{
    FetchConfig, HarvestConfig, Harvester, JsonConfig, TextConfig, convert_to_json, convert_to_text, entities_to_json,
    fetch_file, fetch_stdin, fetch_url,
};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use url::Url;

mod echo;

use echo::{format_size, print_banner, print_info, print_pattern_details, print_step, print_success, print_timing};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for inferred patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Text,
    Entities,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            "entities" => Ok(Self::Entities),
            _ => Err(format!("Invalid format: {}. Valid options: json, text, entities", s)),
        }
    }
}

/// Infer post, permalink, date and author selectors of forum pages
#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(author = "Harvest Contributors")]
#[command(version)]
#[command(about = "Infer forum post patterns from web pages", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Page URL for file and stdin input (resolves permalinks and profile links)
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (json, text, entities)
    #[arg(short, long, default_value = "json", value_name = "FORMAT")]
    format: OutputFormat,

    /// Also extract one record per post
    #[arg(long)]
    posts: bool,

    /// Render post dates as timestamps instead of page text
    #[arg(long)]
    datetime: bool,

    /// Pretty print JSON output
    #[arg(long)]
    pretty: bool,

    /// JSON file overriding the default tuning parameters
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
}

fn is_remote(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Page URL for local input: `--url` when given, else the file's own URL.
fn local_page_url(explicit: Option<&str>, path: Option<&Path>) -> anyhow::Result<String> {
    if let Some(url) = explicit {
        return Ok(url.to_string());
    }
    let Some(path) = path else {
        bail!("Reading from stdin requires --url to resolve links on the page");
    };
    let absolute = fs::canonicalize(path).with_context(|| format!("Failed to resolve path: {}", path.display()))?;
    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|_| anyhow::anyhow!("Cannot build a page URL for {}", absolute.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    let config = match &args.config {
        Some(path) => HarvestConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => HarvestConfig::default(),
    };

    let started = Instant::now();
    let (html, page_url) = if args.input == "-" {
        if args.verbose {
            print_step(1, 3, "Reading from stdin");
        }
        let buffer = fetch_stdin().context("Failed to read from stdin")?;
        let page_url = local_page_url(args.url.as_deref(), None)?;
        (buffer, page_url)
    } else if is_remote(&args.input) {
        if args.verbose {
            print_step(1, 3, &format!("Fetching from {}", args.input.bright_white().underline()));
        }
        let fetch_config = FetchConfig {
            timeout: args.timeout,
            user_agent: args.user_agent.clone().unwrap_or_else(|| FetchConfig::default().user_agent),
        };
        let page = fetch_url(&args.input, &fetch_config).await.context("Failed to fetch URL")?;
        (page.html, args.url.clone().unwrap_or(page.url))
    } else {
        if args.verbose {
            print_step(1, 3, &format!("Reading from file {}", args.input.bright_white()));
        }
        let content = fetch_file(&args.input).with_context(|| format!("Failed to read file: {}", args.input))?;
        let page_url = local_page_url(args.url.as_deref(), Some(Path::new(&args.input)))?;
        (content, page_url)
    };

    if args.verbose {
        eprintln!("  {} {}", "Size:".dimmed(), format_size(html.len()).bright_white());
        eprintln!("  {} {}", "Page URL:".dimmed(), page_url.bright_white());
        print_timing("Read", started.elapsed());
        eprintln!();
        print_step(2, 3, "Inferring post patterns");
    }

    let harvester = Harvester::with_config(config);
    let located = Instant::now();
    let result = harvester.locate(&html, &page_url).context("Failed to infer post patterns")?;

    if args.verbose {
        print_timing("Locate", located.elapsed());
        print_pattern_details(&result);
    }
    if !result.is_extractable() {
        echo::print_warning("No repeating post pattern found on this page");
    }

    let wants_records = args.posts || args.format == OutputFormat::Entities;
    let records = if wants_records {
        Some(
            harvester
                .extract(&html, &page_url, &result, args.datetime)
                .context("Failed to extract posts")?,
        )
    } else {
        None
    };

    if args.verbose {
        print_step(3, 3, "Writing output");
        eprintln!("  {} {}", "Format:".dimmed(), format!("{:?}", args.format).bright_white());
        eprintln!();
    }

    let output = match args.format {
        OutputFormat::Json => convert_to_json(&result, records.as_deref(), &JsonConfig { pretty: args.pretty })
            .context("Failed to render JSON")?,
        OutputFormat::Text => {
            let config = TextConfig { include_header: true, ..Default::default() };
            convert_to_text(&result, records.as_deref(), &config)
        }
        OutputFormat::Entities => entities_to_json(&page_url, records.as_deref().unwrap_or_default(), args.pretty)
            .context("Failed to render entities")?,
    };

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            println!("{}", output);
        }
    }

    Ok(())
}
