//! Download-and-extract demo
//!
//! Downloads the configured archive, prints progress to the terminal, extracts the archive
//! once the download reaches 100% and prints the result.
//!
//! Usage: `cargo run --example download_and_unzip [config.json]`
//! Set `RUST_LOG=downunzip=debug` for worker logs.

use downunzip::{Config, DisplaySink, DownUnzip, Observer};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Renders the display on a single terminal line
#[derive(Default)]
struct TerminalSink {
    file_name: String,
    destination: PathBuf,
}

impl DisplaySink for TerminalSink {
    fn set_progress(&mut self, percentage: Option<u8>) {
        match percentage {
            Some(pct) => {
                let filled = pct as usize / 5;
                print!(
                    "\r[{}{}] {:>3}% {}",
                    "#".repeat(filled),
                    " ".repeat(20 - filled),
                    pct,
                    self.file_name
                );
            }
            None => print!("\r[{:^20}] {}", "...", self.file_name),
        }
        std::io::stdout().flush().ok();
    }

    fn set_file_name(&mut self, file_name: &str) {
        self.file_name = file_name.to_string();
    }

    fn set_destination_path(&mut self, path: &Path) {
        self.destination = path.to_path_buf();
    }

    fn set_extract_enabled(&mut self, enabled: bool) {
        if enabled {
            println!("\nSaved to {}, extracting", self.destination.display());
        }
    }

    fn set_result_text(&mut self, text: &str) {
        println!("{}", text);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let mut config = match std::env::args().nth(1) {
        Some(path) => Config::from_json_file(Path::new(&path))?,
        None => Config::default(),
    };
    // Show failures instead of stalling at the last percentage
    config.download.report_failures = true;

    println!("Downloading {}", config.download.source_url);
    let (pipeline, mut notifications) = DownUnzip::new(config).await?;
    let download = pipeline.start_download();

    let observer = Observer::new(TerminalSink::default());
    tokio::select! {
        (_sink, result) = observer.run_until_extracted(&mut notifications, &pipeline) => {
            if let Some(result) = result {
                println!("Output in {}", result.target_dir.display());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nInterrupted, stopping download");
            download.cancel();
        }
    }

    Ok(())
}
