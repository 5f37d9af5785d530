//! # Verse Projector CLI (`vp`)
//!
//! The `vp` binary drives the verse projector: it prepares the SQLite
//! store, imports the scripture library, searches it, and runs an
//! interactive projection session in the terminal.
//!
//! ## Usage
//!
//! ```bash
//! vp --config ./config/vp.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `vp init` | Create the SQLite database and schema |
//! | `vp import` | Import both testaments (and songs) into the database |
//! | `vp search "<query>"` | Full-text search over verses or songs |
//! | `vp books` | List the books found in the library |
//! | `vp paginate "<text>"` | Show the slides a verse would be split into |
//! | `vp project <book>` | Start an interactive projection session |
//!
//! ## Examples
//!
//! ```bash
//! vp init
//! vp import --force
//! vp search "nitiavan'Andriamanitra"
//! vp project Jaona --chapter 3 --verses 16,17 --version "MG 1865"
//! ```
//!
//! Diagnostics go to stderr; set `RUST_LOG=debug` for more detail.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use verse_projector::config::{self, ProjectionConfig};
use verse_projector::layout::GridLayout;
use verse_projector::library::{BookStore, FsLibrary};
use verse_projector::paginate::{paginate, PaginationSettings};
use verse_projector::session::{self, ProjectOptions};
use verse_projector::{import, migrate, search};

/// Verse Projector: paginated scripture projection with an SQLite-backed
/// library index.
#[derive(Parser)]
#[command(
    name = "vp",
    about = "Verse Projector: paginated scripture projection for worship services",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/vp.toml`.
    #[arg(long, global = true, default_value = "./config/vp.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file with the meta, songs, books,
    /// chapters, and verses tables and their FTS5 indexes. Safe to run
    /// more than once.
    Init,

    /// Import the scripture library into the database.
    ///
    /// Reads every book file from the old and new testament directories
    /// (and the songs directory, when configured). Skipped when the
    /// database is already initialized.
    Import {
        /// Import even if the database is already initialized.
        #[arg(long)]
        force: bool,

        /// Drop and recreate all tables before importing.
        #[arg(long)]
        reset: bool,
    },

    /// Search imported verses (or songs) by keyword.
    Search {
        /// Search terms. All terms must match.
        query: String,

        /// Search songs instead of verses.
        #[arg(long)]
        songs: bool,

        /// Maximum number of results.
        #[arg(long, default_value = "20")]
        limit: i64,
    },

    /// List the books available in the library directory.
    Books,

    /// Print the slides a text would be split into on the projection.
    Paginate {
        /// Verse text to paginate.
        text: String,

        /// Display width in characters (defaults to `projection.cols`).
        #[arg(long)]
        cols: Option<usize>,

        /// Display height in lines (defaults to `projection.rows`).
        #[arg(long)]
        rows: Option<usize>,
    },

    /// Project a book interactively.
    ///
    /// Shows the first verse of the selection and then reads commands
    /// from stdin: `n` next, `p` previous, `s` show, `r COLSxROWS` resize,
    /// `v LABEL` version, `c` close, `q` quit.
    Project {
        /// Book label (e.g. `Jaona`) or id (`Testameta vaovao/jaona.json`).
        book: String,

        /// Chapter to start in (defaults to the first chapter).
        #[arg(long)]
        chapter: Option<String>,

        /// Verses to project, comma-separated (defaults to the whole chapter).
        #[arg(long, value_delimiter = ',')]
        verses: Vec<String>,

        /// Version label shown on the projection.
        #[arg(long)]
        version: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Paginate works without a config file
    if let Commands::Paginate { text, cols, rows } = &cli.command {
        let projection = match config::load_config(&cli.config) {
            Ok(cfg) => cfg.projection,
            Err(_) => ProjectionConfig::default(),
        };
        let layout = GridLayout::new(
            cols.unwrap_or(projection.cols),
            rows.unwrap_or(projection.rows),
        );
        let slides = paginate(text, &layout, PaginationSettings::from(&projection));
        for (i, slide) in slides.iter().enumerate() {
            println!("[{}/{}] {}", i + 1, slides.len(), slide);
        }
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { force, reset } => {
            import::run_import(&cfg, force, reset).await?;
        }
        Commands::Search {
            query,
            songs,
            limit,
        } => {
            search::run_search(&cfg, &query, songs, limit).await?;
        }
        Commands::Books => {
            let library = FsLibrary::new(&cfg.library)?;
            let books = library.list_books().await?;
            if books.is_empty() {
                println!("No books found under {}", library.root().display());
            }
            for book in &books {
                println!("{:<8} {:<24} {}", book.testament, book.label, book.id);
            }
        }
        Commands::Project {
            book,
            chapter,
            verses,
            version,
        } => {
            session::run_project(
                &cfg,
                ProjectOptions {
                    book,
                    chapter,
                    verses,
                    version,
                },
            )
            .await?;
        }
        // Handled before the config is loaded
        Commands::Paginate { .. } => {}
    }

    Ok(())
}
