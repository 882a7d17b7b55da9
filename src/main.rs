//! grip: trigram-indexed code search over archived source trees.
//!
//! Usage:
//!   grip build <archive.zip> <dst-dir> --slug <slug>
//!   grip search <index-dir> <pattern>
//!   grip stats <index-dir>
//!   grip destroy <index-dir>

use clap::{Parser, Subcommand};
use grip::ingest::IndexOptions;
use grip::search::SearchOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "grip")]
#[command(about = "Trigram-indexed code search over archived source trees")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index from a zip archive
    Build {
        /// Path to the zip archive
        archive: PathBuf,

        /// Directory to write the index into
        dst: PathBuf,

        /// Caller-assigned identifier for this index
        #[arg(long)]
        slug: String,

        /// Exclude dot files (e.g. .env, .github/)
        #[arg(long)]
        exclude_dot_files: bool,
    },

    /// Search an already-built index
    Search {
        /// Index directory
        dir: PathBuf,

        /// Regex pattern
        pattern: String,

        /// Case-insensitive matching
        #[arg(short = 'i', long)]
        ignore_case: bool,

        /// Lines of context around each match
        #[arg(short = 'C', long, default_value = "0")]
        context: usize,

        /// Only search files whose path matches this regex
        #[arg(long)]
        file_regexp: Option<String>,

        /// Skip this many files-with-match before returning results
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Return at most this many files-with-match
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print an index's manifest and file count
    Stats {
        /// Index directory
        dir: PathBuf,
    },

    /// Permanently delete an index
    Destroy {
        /// Index directory
        dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("grip=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build {
            archive,
            dst,
            slug,
            exclude_dot_files,
        } => cmd_build(archive, dst, slug, exclude_dot_files),
        Commands::Search {
            dir,
            pattern,
            ignore_case,
            context,
            file_regexp,
            offset,
            limit,
        } => cmd_search(dir, pattern, ignore_case, context, file_regexp, offset, limit),
        Commands::Stats { dir } => cmd_stats(dir),
        Commands::Destroy { dir } => cmd_destroy(dir),
    }
}

fn cmd_build(archive: PathBuf, dst: PathBuf, slug: String, exclude_dot_files: bool) -> anyhow::Result<()> {
    let bytes = std::fs::read(&archive)?;
    let opts = IndexOptions {
        exclude_dot_files,
        special_files: Default::default(),
    };
    let (index_ref, stats) = grip::build_from_zip(&opts, &bytes, &dst, slug)?;
    tracing::info!(
        slug = %index_ref.slug,
        files_indexed = stats.files_indexed,
        files_excluded = stats.files_excluded,
        "index built"
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_search(
    dir: PathBuf,
    pattern: String,
    ignore_case: bool,
    context: usize,
    file_regexp: Option<String>,
    offset: usize,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let index = grip::open(&dir)?;
    let opts = SearchOptions {
        ignore_case,
        lines_of_context: context,
        file_regexp,
        ignore_comments: false,
        offset,
        limit: limit.unwrap_or(0),
    };
    let response = grip::run_search(&index, &pattern, &opts)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn cmd_stats(dir: PathBuf) -> anyhow::Result<()> {
    let (index_ref, result) = grip::read(&dir);
    result?;
    let index = grip::open(&dir)?;
    let file_count = index.with_reader(|r| Ok(r.len()))?;
    println!(
        "{}",
        serde_json::json!({
            "slug": index_ref.slug.to_string(),
            "built_at": index_ref.time,
            "file_count": file_count,
        })
    );
    Ok(())
}

fn cmd_destroy(dir: PathBuf) -> anyhow::Result<()> {
    match grip::open(&dir) {
        Ok(index) => index.destroy()?,
        Err(_) => {
            let (index_ref, _) = grip::read(&dir);
            index_ref.remove()?;
        }
    }
    tracing::info!(dir = %dir.display(), "index destroyed");
    Ok(())
}
