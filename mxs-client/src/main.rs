//! Matrix Benchmark Client (mxs-client) - Main entry point
//!
//! Sends one benchmark request, draws live progress and prints the timing
//! summary, then writes the HTML/CSV report.

use anyhow::{Context, Result};
use clap::Parser;
use mxs_client::render::{self, CYAN, GRAY, GREEN, RESET, YELLOW};
use mxs_client::report::write_reports;
use mxs_client::run_session;
use mxs_common::{JobLimits, Request};
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use tokio::net::TcpStream;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for mxs-client
#[derive(Parser, Debug)]
#[command(name = "mxs-client")]
#[command(about = "Run a matrix multiplication benchmark on an mxs-server")]
#[command(version)]
struct Args {
    /// Matrix size (NxN)
    #[arg(short = 'n', long = "size", default_value_t = 1000)]
    size: i64,

    /// Number of workers
    #[arg(short, long, default_value_t = 8)]
    workers: i64,

    /// Rows per job
    #[arg(short, long, default_value_t = 100)]
    chunk: i64,

    /// Server address
    #[arg(long, default_value = "localhost:8080", env = "MXS_SERVER")]
    host: String,

    /// Seed for operand generation
    #[arg(long, default_value_t = 42)]
    seed: i64,

    /// Directory for report.html and report.csv
    #[arg(long, default_value = ".")]
    report_dir: PathBuf,

    /// Skip writing reports
    #[arg(long)]
    no_report: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mxs_client=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let request = Request {
        matrix_size: args.size,
        workers: args.workers,
        chunk_size: args.chunk,
        seed: args.seed,
    };
    // Size and worker ceilings are the server's call
    let unbounded = JobLimits {
        max_matrix_size: usize::MAX,
        max_workers: usize::MAX,
    };
    request
        .validate_within(&unbounded)
        .context("Invalid job parameters")?;

    print!("{}", render::banner());
    println!("{}[+] Connecting to server at {}...{}", GRAY, args.host, RESET);
    let stream = TcpStream::connect(&args.host)
        .await
        .with_context(|| format!("Connection to {} failed", args.host))?;
    println!("{}[+] Connected!{}", GREEN, RESET);

    println!(
        "{}[+] Job Config:{} {}x{} Matrix | {} Workers | chunk {}",
        CYAN, RESET, args.size, args.size, args.workers, args.chunk
    );
    println!(
        "{}[.] Waiting for server (Data Gen + Sequential Benchmark)...{}",
        YELLOW, RESET
    );

    let start = Instant::now();
    let mut stdout = std::io::stdout();
    let result = run_session(stream, &request, |update| {
        print!("{}", render::progress_line(&update, start.elapsed()));
        // Redraw failures only affect the display
        let _ = stdout.flush();
    })
    .await
    .context("Benchmark session failed")?;

    print!("{}", render::result_panel(&result));
    println!();

    if !args.no_report {
        let paths = write_reports(&args.report_dir, &result).context("Failed to write reports")?;
        println!(
            "{}[REPORT] Generated {} and {}{}",
            CYAN,
            paths.html.display(),
            paths.csv.display(),
            RESET
        );
    }

    Ok(())
}
