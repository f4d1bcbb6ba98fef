use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use railcast::analysis::{BinRule, Distribution, find_outliers, render_distribution};
use railcast::collection::{CsvDownloader, FileNaming, UrlTemplate, collect_range};
use railcast::dates::parse_date;
use railcast::{Dataset, RailcastConfig, RailcastError, RealtimeClient, ResponseCache, logging};

#[derive(Parser)]
#[command(name = "railcast", version)]
#[command(about = "Train running data collection and delay analysis CLI", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily CSVs for a date range and merge them into one file
    Collect {
        /// Start date (inclusive) YYYY-MM-DD or YYYYMMDD
        #[arg(value_parser = date_arg)]
        start_date: NaiveDate,
        /// End date (inclusive) YYYY-MM-DD or YYYYMMDD
        #[arg(value_parser = date_arg)]
        end_date: NaiveDate,
        /// URL template, e.g. https://example.org/data_{date}.csv or .../{yyyy}/{mm}/{dd}.csv
        url_template: String,
        /// Path for the merged CSV
        output: PathBuf,
        /// Directory to save downloaded daily CSVs
        #[arg(long)]
        dest_dir: Option<PathBuf>,
        /// Days downloaded at the same time
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Download a single day's CSV and print where it was saved
    FetchOne {
        #[arg(long)]
        url_template: String,
        #[arg(long, value_parser = date_arg)]
        date: NaiveDate,
        #[arg(long)]
        dest_dir: PathBuf,
        #[arg(long, requires = "password")]
        username: Option<String>,
        #[arg(long, requires = "username")]
        password: Option<String>,
    },

    /// Fetch station services from the Realtime Trains API for a date range
    Realtime {
        /// Station CRS code, e.g. RDG
        station: String,
        #[arg(value_parser = date_arg)]
        start_date: NaiveDate,
        #[arg(value_parser = date_arg)]
        end_date: NaiveDate,
        /// Path for the merged CSV
        output: PathBuf,
        #[arg(long)]
        dest_dir: Option<PathBuf>,
        /// Skip the response cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Combine CSV files (or directories of them) sorted by run date and booked times
    Merge {
        /// Input files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Describe the distribution of numeric columns
    Skew {
        #[arg(short, long)]
        input: PathBuf,
        /// Comma-separated columns (default: every numeric column)
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,
        /// Histogram bins (default: automatic)
        #[arg(short, long)]
        bins: Option<usize>,
    },

    /// List services whose value in a column is outside the box-plot fences
    Outliers {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        column: String,
        /// IQR multiplier for the fences
        #[arg(short = 'k', long)]
        multiplier: Option<f64>,
        /// Write flagged rows here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn date_arg(value: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = match e.downcast_ref::<RailcastError>() {
                Some(err) => err.user_message(),
                None => format!("{e:#}"),
            };
            eprintln!("Error: {message}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = RailcastConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging, cli.verbose);

    match cli.command {
        Commands::Collect {
            start_date,
            end_date,
            url_template,
            output,
            dest_dir,
            concurrency,
        } => {
            let template = UrlTemplate::parse(&url_template)?;
            let dest_dir = dest_dir.unwrap_or_else(|| PathBuf::from(&config.download.dest_dir));
            let downloader = CsvDownloader::new(template, dest_dir, &config.download)?;
            let concurrency = concurrency.unwrap_or(config.download.concurrency);

            let summary = collect_range(&downloader, start_date, end_date, &output, concurrency).await?;
            println!(
                "Merged {} files into {} ({} days skipped)",
                summary.downloaded.len(),
                summary.output.display(),
                summary.skipped.len()
            );
        }

        Commands::FetchOne {
            url_template,
            date,
            dest_dir,
            username,
            password,
        } => {
            let template = UrlTemplate::parse(&url_template)?;
            let mut downloader =
                CsvDownloader::new(template, dest_dir, &config.download)?.with_naming(FileNaming::Dated);
            if let (Some(username), Some(password)) = (username, password) {
                downloader = downloader.with_credentials(username, password);
            }

            let path = downloader.download(date).await?;
            println!("{}", path.display());
        }

        Commands::Realtime {
            station,
            start_date,
            end_date,
            output,
            dest_dir,
            no_cache,
        } => {
            let dest_dir = dest_dir.unwrap_or_else(|| PathBuf::from(&config.download.dest_dir));
            let mut client = RealtimeClient::new(&station, dest_dir, &config.realtime, &config.download)?;

            if config.cache.enabled && !no_cache {
                match ResponseCache::open(&config.cache.location) {
                    Ok(cache) => {
                        let ttl = Duration::from_secs(u64::from(config.cache.ttl_hours) * 3600);
                        client = client.with_cache(cache, ttl);
                    }
                    Err(e) => warn!("Continuing without cache: {}", e),
                }
            }

            let summary = collect_range(
                &client,
                start_date,
                end_date,
                &output,
                config.download.concurrency,
            )
            .await?;
            println!(
                "Merged {} days of {} services into {}",
                summary.downloaded.len(),
                client.station(),
                summary.output.display()
            );
        }

        Commands::Merge { inputs, output } => {
            let mut dataset = Dataset::load_many(&inputs)?;
            dataset.sort_by_schedule()?;
            dataset
                .write(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Wrote {} rows to {}", dataset.len(), output.display());
        }

        Commands::Skew { input, columns, bins } => {
            let dataset = Dataset::load(&input)?;
            let columns = if columns.is_empty() {
                dataset.numeric_columns()
            } else {
                columns
            };
            if columns.is_empty() {
                return Err(RailcastError::validation("No numeric columns to describe").into());
            }

            let bins = BinRule::from_count(bins.unwrap_or(config.analysis.histogram_bins));
            for column in &columns {
                let dist = Distribution::of_column(&dataset, column, bins, config.analysis.whisker_multiplier)?;
                println!("{}", render_distribution(&dist));
            }
        }

        Commands::Outliers {
            input,
            column,
            multiplier,
            output,
        } => {
            let dataset = Dataset::load(&input)?;
            let multiplier = multiplier.unwrap_or(config.analysis.whisker_multiplier);
            let report = find_outliers(&dataset, &column, multiplier)?;

            info!(
                "{:.1}% of services are unusual for {}",
                report.share() * 100.0,
                report.column
            );
            match output {
                Some(path) => {
                    report.rows.write(&path)?;
                    println!("Wrote {} unusual services to {}", report.rows.len(), path.display());
                }
                None => {
                    let mut writer = csv::Writer::from_writer(std::io::stdout());
                    report.rows.write_to(&mut writer)?;
                }
            }
        }
    }

    Ok(())
}
