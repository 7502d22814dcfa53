//! Search command handler
//!
//! Runs one trail search and prints it, or writes it as a KML/GPX file.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::export::{available_exporters, get_exporter, TrailExporter};
use crate::fetch::{SearchOutcome, TrailFetcher};
use crate::format::{available_formats, get_formatter, OutputFormatter};
use crate::tool::{SearchTrailsArgs, ToolResponse};
use crate::transport::ReqwestTransport;
use clap::Args;
use std::path::PathBuf;
use tracing::warn;

/// Search command arguments
#[derive(Args)]
pub struct SearchArgs {
    /// Free-text search term
    #[arg(long, short = 't')]
    pub text: Option<String>,

    /// Latitude of the search center
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude of the search center
    #[arg(long, allow_negative_numbers = true)]
    pub lng: Option<f64>,

    /// Only keep trails this close to the center
    #[arg(long, short = 'r')]
    pub radius_km: Option<f64>,

    /// Number of trails to return
    #[arg(long, short = 'n')]
    pub max_results: Option<usize>,

    /// First results page to request
    #[arg(long)]
    pub page: Option<u32>,

    /// Output format: json, text, kml or gpx
    #[arg(long, short = 'f', default_value = "text")]
    pub format: String,

    /// Include trail geometry in json output
    #[arg(long)]
    pub geometry: bool,

    /// Also read each trail's detail page
    #[arg(long)]
    pub details: bool,

    /// Write output to file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// List available formats
    #[arg(short = 'F', long = "list-formats")]
    pub list_formats: bool,
}

/// Markup document or terminal rendering
enum Renderer {
    Export(Box<dyn TrailExporter>),
    Format(Box<dyn OutputFormatter>),
}

impl Renderer {
    fn by_name(name: &str) -> Result<Self> {
        if let Some(exporter) = get_exporter(name) {
            return Ok(Self::Export(exporter));
        }
        get_formatter(name)
            .map(Self::Format)
            .ok_or_else(|| Error::Config(format!("Unknown format: {}", name)))
    }
}

impl SearchArgs {
    fn tool_args(&self) -> SearchTrailsArgs {
        SearchTrailsArgs {
            text: self.text.clone(),
            latitude: self.lat,
            longitude: self.lng,
            radius_km: self.radius_km,
            max_results: self.max_results,
            page: self.page,
            include_geometry: self.geometry,
        }
    }
}

/// Run the search command
pub async fn run(args: SearchArgs) -> Result<()> {
    if args.list_formats {
        list_formats();
        return Ok(());
    }

    let mut config = Config::load()?;
    if args.details {
        config.search.fetch_details = true;
    }

    let renderer = Renderer::by_name(&args.format)?;

    let transport = ReqwestTransport::from_config(&config)?;
    let fetcher = TrailFetcher::new(transport, &config);
    let tool_args = args.tool_args();
    let result = search(&fetcher, &config, &tool_args).await;

    let output = match renderer {
        Renderer::Export(exporter) => {
            let outcome = result?;
            for warning in &outcome.warnings {
                warn!(stage = %warning.stage, "{}", warning.message);
            }
            exporter.export(&outcome.result.trails)?
        }
        Renderer::Format(formatter) => {
            let response = match result {
                Ok(outcome) => ToolResponse::from_outcome(&outcome, tool_args.include_geometry),
                Err(err) => ToolResponse::from_error(&err),
            };
            let text = formatter.format(&response)?;
            if !response.is_ok() {
                eprintln!("{}", text);
                std::process::exit(1);
            }
            text.into_bytes()
        }
    };

    // Write output
    if let Some(path) = args.output {
        std::fs::write(&path, &output)?;
        eprintln!("Output written to {}", path.display());
    } else {
        println!("{}", String::from_utf8_lossy(&output).trim_end());
    }

    Ok(())
}

/// Search, giving up cleanly on Ctrl-C
async fn search(
    fetcher: &TrailFetcher<ReqwestTransport>,
    config: &Config,
    args: &SearchTrailsArgs,
) -> Result<SearchOutcome> {
    let query = args.to_query(config.search.default_max_results)?;
    fetcher.search_cancellable(&query, interrupted()).await
}

async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Print available output formats
fn list_formats() {
    println!("Available output formats:");
    for format in available_formats() {
        println!("  {:6} - {}", format.name, format.description);
    }
    for export in available_exporters() {
        println!("  {:6} - {}", export.name, export.description);
    }
}
