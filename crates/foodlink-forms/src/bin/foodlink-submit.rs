//! Submit a FoodLink form from the command line, or search the directory.
//!
//! Usage:
//!   foodlink-submit submit --kind donation --field name="Mary Jane" --field email=mary@example.org --field donationType=produce
//!   foodlink-submit nearby --lat 40.71 --lon -74.00 --radius-km 10

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use foodlink_forms::form::{Form, FormKind};
use foodlink_forms::locator::{Directory, GeoPoint};
use foodlink_forms::{FormsConfig, SubmissionPipeline};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "foodlink-submit", about = "FoodLink form submission tool")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate and submit a form
    Submit {
        /// donation, request or volunteer
        #[arg(short, long)]
        kind: FormKind,

        /// Field as name=value, repeatable
        #[arg(short, long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Override the configured endpoint
        #[arg(short, long)]
        endpoint: Option<String>,
    },
    /// List food banks near a point
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        #[arg(long, default_value_t = 25.0)]
        radius_km: f64,

        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

fn parse_field(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected name=value, got `{}`", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => FormsConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => FormsConfig::default(),
    };

    match args.command {
        Command::Submit {
            kind,
            fields,
            endpoint,
        } => {
            let form = Form::from_pairs(kind, fields).context("building form")?;

            let mut builder = SubmissionPipeline::builder().with_config(config);
            if let Some(endpoint) = endpoint {
                builder = builder.with_endpoint(endpoint);
            }
            let pipeline = builder.build().context("building pipeline")?;

            let report = pipeline.submit(&form).await;
            info!(
                submission_id = %report.submission_id,
                states = ?report.states,
                "Submission finished"
            );

            for field in report.invalid_fields() {
                if let Some(ref error) = field.result.error {
                    eprintln!("  {}: {}", field.field, error);
                }
            }
            println!("{}", report.message());

            if !report.is_success() {
                bail!("submission failed");
            }
        }
        Command::Nearby {
            lat,
            lon,
            radius_km,
            limit,
        } => {
            let origin = GeoPoint::new(lat, lon);
            if !origin.is_valid() {
                bail!("invalid coordinates: {}, {}", lat, lon);
            }

            let results = Directory::builtin().nearby(origin, radius_km, limit);
            if results.is_empty() {
                println!("No food banks within {:.1} km", radius_km);
            }
            for r in results {
                println!(
                    "{:>6.1} km  {}  ({}; {})",
                    r.distance_km, r.bank.name, r.bank.address, r.bank.hours
                );
            }
        }
    }

    Ok(())
}
