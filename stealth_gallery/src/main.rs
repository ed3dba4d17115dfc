//! Stealth Gallery - CLI
//!
//! Host harness around a SQLite-backed gallery. Commands that touch the
//! private partition replay a triple shake first, as a phone would.

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{bail, Context};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};

use stealth_gallery::gesture::MotionSample;
use stealth_gallery::haptics::LogHaptics;
use stealth_gallery::onboarding::{CandidateData, FolderSource, MediaCandidate};
use stealth_gallery::{AccessMode, GalleryConfig, MediaRecord, OnboardingOutcome, StealthGallery};

#[derive(Parser)]
#[command(name = "stealth-gallery")]
#[command(version = stealth_gallery::VERSION)]
#[command(about = "Stealth Gallery - decoy gallery with a hidden vault")]
struct Cli {
    /// Config file
    #[arg(short, long, default_value = "./gallery/config.json")]
    config: PathBuf,

    /// Database path (overrides config)
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show mode, onboarding state and public count
    Status,

    /// First-run import of a media folder
    Onboard {
        /// Camera folder
        folder: PathBuf,
    },

    /// List what the decoy gallery shows
    List,

    /// List the hidden vault
    Vault,

    /// Add a photo to the hidden vault
    Stash {
        /// Photo path
        path: PathBuf,
    },

    /// Delete a photo from the hidden vault
    Delete {
        /// Record ID
        id: String,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = GalleryConfig::load(&cli.config)?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let gallery = StealthGallery::open(config, Arc::new(LogHaptics))
        .context("opening gallery store")?;

    match cli.command {
        Commands::Status => {
            let status = gallery.status();
            println!("{}", serde_json::to_string_pretty(&status)?);
        }

        Commands::Onboard { folder } => {
            let source = FolderSource::new(&folder);
            let runtime = tokio::runtime::Builder::new_current_thread().build()?;

            let outcome = runtime.block_on(gallery.run_onboarding(
                &|| true,
                &source,
                &mut |percent: u8| println!("Indexing media... {}%", percent),
            ))?;

            match outcome {
                OnboardingOutcome::AlreadyDone => println!("Already onboarded"),
                OnboardingOutcome::Declined => println!("Access declined"),
                OnboardingOutcome::NothingSelected => println!("No images in {}", folder.display()),
                OnboardingOutcome::InProgress => println!("Import already running"),
                OnboardingOutcome::Imported { report, skipped } => {
                    println!("Imported {} items", report.stored.len());
                    for failure in &report.failed {
                        println!("   failed {}: {}", failure.id, failure.reason);
                    }
                    for skip in &skipped {
                        println!("   skipped {}: {}", skip.name, skip.reason);
                    }
                }
            }
        }

        Commands::List => print_records(&gallery.visible_media()),

        Commands::Vault => {
            unlock(&gallery)?;
            print_records(&gallery.visible_media());
            gallery.lock();
        }

        Commands::Stash { path } => {
            unlock(&gallery)?;

            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();
            let candidate = MediaCandidate {
                name,
                mime_type: "image/*".into(),
                last_modified: None,
                data: CandidateData::File(path.clone()),
            };

            let record = gallery.add_private(&candidate)?;
            println!("Stored {} as {}", path.display(), record.id);
            gallery.lock();
        }

        Commands::Delete { id } => {
            unlock(&gallery)?;
            gallery.delete(&id)?;
            println!("Deleted {}", id);
            gallery.lock();
        }
    }

    Ok(())
}

/// Replay three strong jolts through the accelerometer path
fn unlock(gallery: &StealthGallery) -> anyhow::Result<()> {
    let t0 = Utc::now();
    for ms in [0, 400, 800] {
        gallery.on_motion(MotionSample::new(t0 + Duration::milliseconds(ms), 30.0, 10.0, 9.8));
    }

    if gallery.mode() != AccessMode::Real {
        bail!("gesture was not recognised");
    }
    Ok(())
}

fn print_records(records: &[MediaRecord]) {
    if records.is_empty() {
        println!("No items");
        return;
    }

    println!("{:-<60}", "");
    for record in records {
        println!(
            "{}  {}  {} bytes",
            record.id,
            record.captured_at.format("%Y-%m-%d %H:%M"),
            record.content.len()
        );
    }
}
