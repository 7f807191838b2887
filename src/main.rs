//! Sitelens command-line entry point
//!
//! Three subcommands cover the system's external surface: `enqueue` submits
//! a crawl request, `worker` runs the crawl worker loop, and `status`
//! reports where a job stands.

use clap::{Parser, Subcommand};
use serde_json::json;
use sitelens::config::load_settings;
use sitelens::queue::{SqliteJobStore, Worker};
use sitelens::CrawlRequest;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Sitelens: crawl a website into screenshots and a site manifest
#[derive(Parser, Debug)]
#[command(name = "sitelens")]
#[command(version)]
#[command(about = "Site crawl & capture engine", long_about = None)]
struct Cli {
    /// Path to the worker settings TOML file
    #[arg(short, long, value_name = "SETTINGS", default_value = "sitelens.toml")]
    settings: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a crawl request and print the new job id
    Enqueue {
        /// Start URL of the crawl
        #[arg(long)]
        url: String,

        /// Public base URL under which artifacts will be served
        #[arg(long = "output-base-url")]
        output_base_url: String,

        /// Maximum pages to capture (0 = unlimited)
        #[arg(long = "max-pages", default_value_t = 0)]
        max_pages: u32,

        /// Maximum path depth from the origin (0 = unlimited)
        #[arg(long = "max-depth", default_value_t = 0)]
        max_depth: u32,

        /// Per-section sample cap (0 = unlimited)
        #[arg(long = "sample-size", default_value_t = 0)]
        sample_size: u32,

        /// Restrict the crawl to the start URL's language
        #[arg(long = "default-language-only")]
        default_language_only: bool,

        /// Base delay between navigations, in milliseconds
        #[arg(long = "request-delay", default_value_t = 1000)]
        request_delay: u64,

        /// Extra settle time after page load, in milliseconds
        #[arg(long, default_value_t = 0)]
        delay: u64,

        /// Browser device scale factor
        #[arg(long = "device-scale-factor", default_value_t = 1.0)]
        device_scale_factor: f64,

        /// Path to a JSON file holding the auth session
        #[arg(long = "auth-file")]
        auth_file: Option<PathBuf>,
    },

    /// Run the crawl worker loop
    Worker,

    /// Print a job's status as JSON
    Status {
        /// The job id returned by enqueue
        job_id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let settings = load_settings(&cli.settings)?;
    let store = SqliteJobStore::new(Path::new(&settings.queue.database_path))?;
    let store = Arc::new(Mutex::new(store));

    match cli.command {
        Command::Enqueue {
            url,
            output_base_url,
            max_pages,
            max_depth,
            sample_size,
            default_language_only,
            request_delay,
            delay,
            device_scale_factor,
            auth_file,
        } => {
            let auth = match auth_file {
                Some(path) => Some(serde_json::from_str(&std::fs::read_to_string(path)?)?),
                None => None,
            };

            let request = CrawlRequest {
                url,
                output_base_url,
                max_requests_per_crawl: max_pages,
                max_depth,
                sample_size,
                default_language_only,
                delay,
                request_delay,
                device_scale_factor,
                auth,
            };

            let job_id = store
                .lock()
                .expect("job store lock poisoned")
                .enqueue(&request)?;
            println!("{}", json!({ "jobId": job_id }));
        }

        Command::Worker => {
            let worker = Worker::new(store, settings);
            worker.run().await?;
        }

        Command::Status { job_id } => {
            let job = store
                .lock()
                .expect("job store lock poisoned")
                .get_job(job_id)?;

            let result = job
                .manifest_url
                .as_ref()
                .map(|url| json!({ "manifestUrl": url }));

            let status = json!({
                "status": job.status.as_api_str(),
                "progress": job.progress.as_ref().map(|p| p.percent),
                "detailedProgress": job.progress,
                "result": result,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitelens=info,warn"),
            1 => EnvFilter::new("sitelens=debug,info"),
            2 => EnvFilter::new("sitelens=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
