//! sonicshare - Archive command-line tool
//!
//! Submits audio sample records to the shared archive and reads, searches,
//! repairs, exports or erases it. Genre suggestions come from an external
//! zero-shot classification service.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

use sonicshare_archive::classifier::{
    candidate_genres, classify_description, HuggingFaceClassifier, DEFAULT_GENRES,
};
use sonicshare_archive::lifecycle::{CleanOutcome, ResetOutcome};
use sonicshare_archive::prompt::VIBE_TAGS;
use sonicshare_archive::query::{self, SearchResult};
use sonicshare_archive::reader::{LoadOutcome, LoadReport, SkipReason};
use sonicshare_archive::render::{render_table, render_tag_counts};
use sonicshare_archive::{ArchiveStore, License, Submission};
use sonicshare_common::config::{load_toml_config, RootFolderResolver, TomlConfig};
use sonicshare_common::logging::init_logging;

/// Command-line arguments for sonicshare
#[derive(Parser, Debug)]
#[command(name = "sonicshare")]
#[command(about = "Vocal sample archive for SonicShare")]
#[command(version)]
struct Args {
    /// Root folder holding the archive
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Path to config.toml
    #[arg(short, long, global = true, env = "SONICSHARE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Save a vocal sample's details to the archive
    Submit {
        /// Uploaded file name (wav, mp3 or aiff)
        filename: String,
        /// Vibe tag (repeatable, order kept)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Free-form notes
        #[arg(short, long, default_value = "")]
        notes: String,
        /// License label or id (contact, credit, cc-nc, commercial)
        #[arg(short, long, default_value = "contact")]
        license: String,
    },
    /// Show the archive
    List {
        /// Show every on-disk column even when the current ones are present
        #[arg(long)]
        all_columns: bool,
    },
    /// Case-insensitive search across every field
    Search {
        /// Search term; empty shows everything
        #[arg(default_value = "")]
        term: String,
    },
    /// Tag frequency, most used first
    Tags,
    /// Delete the archive
    Reset,
    /// Rewrite the archive keeping only the configured columns
    Clean,
    /// Copy the archive file byte-for-byte
    Export {
        /// Destination file, or `-` for stdout (configured export name in the
        /// current directory if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Suggest genres for a description of the track
    Classify {
        /// Sound, mood or instrumentation of the track
        description: String,
        /// Genre to compare (repeatable); defaults to the first five built-ins
        #[arg(short, long = "genre")]
        genres: Vec<String>,
    },
    /// List vibe tags, licenses and genres
    Vocab,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;
    let config = loaded.config;
    init_logging(&config.logging).context("Failed to initialize logging")?;

    debug!("Starting sonicshare v{}", env!("CARGO_PKG_VERSION"));
    match &loaded.source {
        Some(path) => debug!("Loaded config from {}", path.display()),
        None => warn!("No config file found, using built-in defaults"),
    }

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(args.root.clone())
        .with_toml(&config)
        .resolve();
    let store = ArchiveStore::from_config(&root_folder, &config.archive);
    debug!("Archive path: {}", store.path().display());

    match args.command {
        Command::Submit {
            filename,
            tags,
            notes,
            license,
        } => submit(&store, filename, tags, notes, &license),
        Command::List { all_columns } => list(&store, all_columns),
        Command::Search { term } => search(&store, &term),
        Command::Tags => tags(&store),
        Command::Reset => reset(&store),
        Command::Clean => clean(&store),
        Command::Export { output } => export(&store, output),
        Command::Classify {
            description,
            genres,
        } => classify(&config, &description, &genres).await,
        Command::Vocab => {
            vocab();
            Ok(())
        }
    }
}

fn submit(
    store: &ArchiveStore,
    filename: String,
    tags: Vec<String>,
    notes: String,
    license: &str,
) -> Result<()> {
    let license: License = license.parse()?;
    let submission = tags
        .into_iter()
        .fold(Submission::new(filename), |s, t| s.tag(t))
        .notes(notes)
        .license(license);

    let record = store.submit(submission).context("Failed to save to archive")?;
    println!("Info saved to archive!");
    if !record.prompt.is_empty() {
        println!("AI-ready prompt: {}", record.prompt);
    }
    Ok(())
}

/// Load, reporting skipped rows and drift; `None` when there is no archive
fn load_with_notices(store: &ArchiveStore) -> Result<Option<LoadReport>> {
    let outcome = store.load().context("Error reading archive")?;
    let report = match outcome {
        LoadOutcome::Empty => return Ok(None),
        LoadOutcome::Loaded(report) => report,
    };

    if report.has_skipped_rows() {
        let lines: Vec<String> = report
            .skipped
            .iter()
            .map(|s| match &s.reason {
                SkipReason::FieldCount { found, expected } => {
                    format!("line {} ({} fields, expected {})", s.line, found, expected)
                }
                SkipReason::InvalidUtf8 => format!("line {} (not UTF-8)", s.line),
            })
            .collect();
        eprintln!(
            "Warning: archive loaded with {} malformed row(s) skipped: {}",
            report.skipped.len(),
            lines.join(", ")
        );
    }
    if report.schema_mismatch() {
        eprintln!("Notice: archive columns differ from the current schema: {}", report.schema);
    }
    Ok(Some(report))
}

fn list(store: &ArchiveStore, all_columns: bool) -> Result<()> {
    let Some(report) = load_with_notices(store)? else {
        println!("No archive found yet. Submit a vocal sample to create one.");
        return Ok(());
    };

    if report.archive.is_empty() {
        println!("No uploads yet. Submit something soulful to get started!");
        return Ok(());
    }

    let table = if all_columns {
        report.archive.clone()
    } else {
        report.view()
    };
    print!("{}", render_table(&table));
    println!("{} record(s)", table.len());
    Ok(())
}

fn search(store: &ArchiveStore, term: &str) -> Result<()> {
    let archive = load_with_notices(store)?
        .map(|report| report.archive)
        .unwrap_or_default();

    match query::search(&archive, term) {
        SearchResult::EmptyArchive => println!("The archive is empty."),
        SearchResult::NoMatches => println!("No records match '{}'.", term),
        SearchResult::Matches(hits) => {
            print!("{}", render_table(&hits.current_view()));
            println!("{} match(es)", hits.len());
        }
    }
    Ok(())
}

fn tags(store: &ArchiveStore) -> Result<()> {
    let archive = load_with_notices(store)?
        .map(|report| report.archive)
        .unwrap_or_default();

    let counts = query::tag_frequency(&archive);
    if counts.is_empty() {
        println!("No tags recorded yet.");
    } else {
        print!("{}", render_tag_counts(&counts));
    }
    Ok(())
}

fn reset(store: &ArchiveStore) -> Result<()> {
    match store.reset().context("Failed to delete archive")? {
        ResetOutcome::Deleted => {
            println!("Archive deleted! Start fresh by submitting new vocals.")
        }
        ResetOutcome::AlreadyAbsent => println!("Archive file was already missing."),
    }
    Ok(())
}

fn clean(store: &ArchiveStore) -> Result<()> {
    match store.clean().context("Failed to clean archive")? {
        CleanOutcome::NotFound => println!("No archive found; nothing to clean."),
        CleanOutcome::Repaired(report) => {
            info!("Clean kept columns {:?}", report.kept_columns);
            println!(
                "Archive cleaned: {} row(s) kept, {} malformed row(s) dropped.",
                report.rows_written, report.rows_dropped
            );
            if !report.dropped_columns.is_empty() {
                println!("Removed columns: {}", report.dropped_columns.join(", "));
            }
        }
    }
    Ok(())
}

fn export(store: &ArchiveStore, output: Option<PathBuf>) -> Result<()> {
    if output.as_deref() == Some(Path::new("-")) {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        store.export(&mut handle).context("Failed to export archive")?;
        handle.flush()?;
        return Ok(());
    }

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let (target, bytes) = store
        .export_to(output.as_deref(), &cwd)
        .context("Failed to export archive")?;
    println!("Exported {} bytes to {}", bytes, target.display());
    Ok(())
}

async fn classify(config: &TomlConfig, description: &str, genres: &[String]) -> Result<()> {
    let classifier = HuggingFaceClassifier::new(&config.classifier)?;
    let candidates = candidate_genres(genres);

    let result = classify_description(&classifier, description, &candidates)
        .await
        .context("Genre classification failed")?;

    print!("{}", result.render_chart(30));
    println!("{}", result.top_match_line());
    Ok(())
}

fn vocab() {
    println!("Vibe tags:");
    for tag in VIBE_TAGS {
        println!("  {}", tag);
    }
    println!("Licenses:");
    for license in License::ALL {
        println!("  {:<10} {}", license.id(), license.label());
    }
    println!("Genres:");
    for genre in DEFAULT_GENRES {
        println!("  {}", genre);
    }
}
