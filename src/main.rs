use clap::Parser;
use std::path::PathBuf;
use std::process;
use subscout::{Config, ProgressEvent, SubSourceClient, SubscoutError, download_subtitles};

#[derive(Parser)]
#[command(name = "subscout")]
#[command(about = "Find and download matching subtitles for local video files")]
struct Cli {
    /// Video file or directory to find subtitles for
    path: PathBuf,

    /// Directory to place subtitles in instead of next to each video
    output: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Subtitle language to download (overrides the configured one)
    #[arg(long)]
    language: Option<String>,
}

/// Handles progress events and prints formatted output to stdout
fn handle_progress_event(event: ProgressEvent) {
    match event {
        ProgressEvent::Started { path } => {
            println!("Looking for videos without subtitles in {}...", path.display());
        }
        ProgressEvent::VideosFound { count } => {
            if count == 0 {
                println!("Nothing to do, every video already has a subtitle.");
            } else {
                println!("Found {} video file(s) needing subtitles\n", count);
            }
        }
        ProgressEvent::ProcessingTitle {
            title,
            index,
            total,
            file_count,
        } => {
            println!(
                "[{}/{}] {}: {} file(s) pending",
                index + 1,
                total,
                title,
                file_count
            );
        }
        ProgressEvent::CandidatesFound { count, .. } => {
            println!("  {} candidate listing(s)", count);
        }
        ProgressEvent::TryingPack { name } => {
            println!("  Trying season pack: {}", name);
        }
        ProgressEvent::PackSkipped { name } => {
            println!("  Skipping pack without needed episodes: {}", name);
        }
        ProgressEvent::Downloaded { destination } => {
            println!("File downloaded: {}", destination.display());
        }
        ProgressEvent::TitleComplete { title, written } => {
            println!("  {} done, {} subtitle(s) written\n", title, written);
        }
        ProgressEvent::Complete { written } => {
            println!("Finished, {} subtitle(s) written in total.", written);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), SubscoutError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(language) = cli.language {
        config.wanted_language = language;
    }

    let client = SubSourceClient::new();
    download_subtitles(
        &cli.path,
        cli.output.as_deref(),
        &client,
        &config,
        handle_progress_event,
    )?;

    Ok(())
}
