//! Renderer process: loads one URL in headless Chromium and prints the
//! document once the page has settled.
//!
//! Usage: snapcrawl-render [--quiescence-ms N] [--deadline-ms M] [--] <url>
//!
//! Stdout carries only the document (or the load-failure sentinel); all
//! logging goes to stderr.

use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use snapcrawl::detector::DetectorConfig;
use snapcrawl::logging;
use snapcrawl::render::chromium::{self, Viewport};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "snapcrawl-render", about = "Render a page and print its HTML")]
struct Args {
    /// Page to render
    url: String,
    /// Silence required after the last response before capturing
    #[arg(long, default_value_t = 300)]
    quiescence_ms: u64,
    /// Capture no later than this long after navigation starts
    #[arg(long, default_value_t = 10_000)]
    deadline_ms: u64,
    #[arg(long, default_value_t = 1280)]
    width: u32,
    #[arg(long, default_value_t = 1024)]
    height: u32,
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init("warn");
    let args = Args::parse();
    let config = DetectorConfig::default()
        .with_quiescence(Duration::from_millis(args.quiescence_ms))
        .with_deadline(Duration::from_millis(args.deadline_ms));
    let viewport = Viewport {
        width: args.width,
        height: args.height,
    };

    match chromium::capture(&args.url, viewport, config).await {
        Ok(capture) => {
            info!(url = %args.url, completion = ?capture.completion, "page captured");
            let mut stdout = std::io::stdout().lock();
            if writeln!(stdout, "{}", capture.output)
                .and_then(|_| stdout.flush())
                .is_err()
            {
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(url = %args.url, error = %e, "browser failure");
            ExitCode::FAILURE
        }
    }
}
