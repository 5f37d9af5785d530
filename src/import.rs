//! Library importer (`vp import`).
//!
//! Loads every book file from the two testament directories, plus songs
//! when a songs directory is configured, into the SQLite store and its FTS5
//! indexes. The whole import runs in a single transaction.
//!
//! Reimporting is idempotent: rows are inserted with `INSERT OR IGNORE` and
//! the FTS tables are only fed rows that were actually inserted. Once an
//! import completes, `meta.initialized` is set and later runs are skipped
//! unless forced.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use globset::GlobSet;
use serde::Deserialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::db;
use crate::library::{book_files, build_globset, parse_book};
use crate::migrate;
use crate::models::{sorted_numeric, Testament};

/// Row counts written by one import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub books: u64,
    pub chapters: u64,
    pub verses: u64,
    pub songs: u64,
}

/// Where an import reads from.
#[derive(Debug, Clone)]
pub struct ImportSources {
    pub old_testament: PathBuf,
    pub new_testament: PathBuf,
    pub songs: Option<PathBuf>,
    pub lang: String,
}

impl ImportSources {
    pub fn from_config(config: &Config) -> Self {
        Self {
            old_testament: config.import.old_testament_dir(&config.library),
            new_testament: config.import.new_testament_dir(&config.library),
            songs: config.import.songs.clone(),
            lang: config.import.lang.clone(),
        }
    }
}

/// A song file: `{"id": "...", "title": "...", "lyrics": "...", "lang": "..."}`.
/// `id` defaults to the file stem and `lang` to the import language.
#[derive(Debug, Deserialize)]
struct SongFile {
    id: Option<String>,
    title: String,
    lyrics: String,
    lang: Option<String>,
}

pub async fn run_import(config: &Config, force: bool, reset: bool) -> Result<()> {
    let pool = db::connect(config).await?;
    if reset {
        migrate::drop_schema(&pool).await?;
    }
    migrate::create_schema(&pool).await?;

    if !force && is_initialized(&pool).await? {
        println!("Database already initialized. Skipping import (use --force to reimport).");
        pool.close().await;
        return Ok(());
    }

    let sources = ImportSources::from_config(config);
    let include = build_globset(&config.library.include_globs)?;
    let stats = import_all(&pool, &sources, &include).await?;

    println!("import");
    println!("  old testament: {}", sources.old_testament.display());
    println!("  new testament: {}", sources.new_testament.display());
    if let Some(songs) = &sources.songs {
        println!("  songs: {}", songs.display());
    }
    println!("  books inserted: {}", stats.books);
    println!("  chapters inserted: {}", stats.chapters);
    println!("  verses inserted: {}", stats.verses);
    println!("  songs inserted: {}", stats.songs);
    println!("ok");

    pool.close().await;
    Ok(())
}

pub async fn is_initialized(pool: &SqlitePool) -> Result<bool> {
    let value: Option<String> =
        sqlx::query_scalar("SELECT value FROM meta WHERE key = 'initialized'")
            .fetch_optional(pool)
            .await?;
    Ok(value.as_deref() == Some("true"))
}

/// Imports everything in `sources` and sets the `initialized` flag.
///
/// Fails without writing anything if a testament directory is missing or
/// any book or song file is malformed.
pub async fn import_all(
    pool: &SqlitePool,
    sources: &ImportSources,
    include: &GlobSet,
) -> Result<ImportStats> {
    for dir in [&sources.old_testament, &sources.new_testament] {
        if !dir.is_dir() {
            bail!("Testament directory not found: {}", dir.display());
        }
    }
    if let Some(songs) = &sources.songs {
        if !songs.is_dir() {
            bail!("Songs directory not found: {}", songs.display());
        }
    }

    let mut stats = ImportStats::default();
    let mut tx = pool.begin().await?;

    let mut order = 0i64;
    for (dir, testament) in [
        (&sources.old_testament, Testament::Taloha),
        (&sources.new_testament, Testament::Vaovao),
    ] {
        tracing::info!(dir = %dir.display(), %testament, "importing testament");
        for path in book_files(dir, include)? {
            order += 1;
            import_book(&mut tx, &path, testament, order, &sources.lang, &mut stats).await?;
        }
    }

    if let Some(songs) = &sources.songs {
        tracing::info!(dir = %songs.display(), "importing songs");
        for path in book_files(songs, include)? {
            import_song(&mut tx, &path, &sources.lang, &mut stats).await?;
        }
    }

    set_meta(&mut tx, "initialized", "true").await?;
    set_meta(&mut tx, "imported_at", &Utc::now().to_rfc3339()).await?;

    tx.commit().await?;
    Ok(stats)
}

async fn import_book(
    tx: &mut Transaction<'_, Sqlite>,
    path: &Path,
    testament: Testament,
    default_order: i64,
    lang: &str,
    stats: &mut ImportStats,
) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read book file: {}", path.display()))?;
    let parsed =
        parse_book(&raw).with_context(|| format!("Malformed book file: {}", path.display()))?;

    let stem = file_stem(path);
    let (name, order, declared_chapters) = match &parsed.meta {
        Some(meta) => (meta.name.clone(), meta.order, meta.chapter_number),
        None => (stem.clone(), None, None),
    };
    let book_id = book_id_for(&name, &stem);
    let chapters_count = declared_chapters.unwrap_or(parsed.chapters.len() as i64);

    let result = sqlx::query(
        "INSERT OR IGNORE INTO books (id, name, testament, lang, book_order, chapters_count)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&book_id)
    .bind(&name)
    .bind(testament.db_label())
    .bind(lang)
    .bind(order.unwrap_or(default_order))
    .bind(chapters_count)
    .execute(&mut **tx)
    .await?;
    stats.books += result.rows_affected();

    for chapter in sorted_numeric(parsed.chapters.keys()) {
        let verses = &parsed.chapters[&chapter];
        let chapter_number = parse_number(&chapter)
            .with_context(|| format!("{}: chapter '{}' is not a number", path.display(), chapter))?;
        let chapter_id = format!("{}_{}", book_id, chapter);

        let result = sqlx::query(
            "INSERT OR IGNORE INTO chapters (id, book_id, chapter_number, verses_count)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&chapter_id)
        .bind(&book_id)
        .bind(chapter_number)
        .bind(verses.len() as i64)
        .execute(&mut **tx)
        .await?;
        stats.chapters += result.rows_affected();

        for verse in sorted_numeric(verses.keys()) {
            let text = &verses[&verse];
            let verse_number = parse_number(&verse).with_context(|| {
                format!("{}: verse '{}:{}' is not a number", path.display(), chapter, verse)
            })?;
            let verse_id = format!("{}_{}", chapter_id, verse);

            let result = sqlx::query(
                "INSERT OR IGNORE INTO verses (id, chapter_id, book_id, verse, text, lang)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&verse_id)
            .bind(&chapter_id)
            .bind(&book_id)
            .bind(verse_number)
            .bind(text)
            .bind(lang)
            .execute(&mut **tx)
            .await?;

            if result.rows_affected() > 0 {
                sqlx::query(
                    "INSERT INTO verses_fts (text, verse_id, chapter_id, book_id) VALUES (?, ?, ?, ?)",
                )
                .bind(text)
                .bind(&verse_id)
                .bind(&chapter_id)
                .bind(&book_id)
                .execute(&mut **tx)
                .await?;
                stats.verses += 1;
            }
        }
    }

    tracing::debug!(book = %book_id, chapters = parsed.chapters.len(), "book imported");
    Ok(())
}

async fn import_song(
    tx: &mut Transaction<'_, Sqlite>,
    path: &Path,
    default_lang: &str,
    stats: &mut ImportStats,
) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read song file: {}", path.display()))?;
    let song: SongFile = serde_json::from_str(&raw)
        .with_context(|| format!("Malformed song file: {}", path.display()))?;

    let id = song.id.unwrap_or_else(|| file_stem(path));
    let lang = song.lang.as_deref().unwrap_or(default_lang);

    let result =
        sqlx::query("INSERT OR IGNORE INTO songs (id, title, lyrics, lang) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(&song.title)
            .bind(&song.lyrics)
            .bind(lang)
            .execute(&mut **tx)
            .await?;

    if result.rows_affected() > 0 {
        sqlx::query("INSERT INTO songs_fts (title, lyrics, song_id) VALUES (?, ?, ?)")
            .bind(&song.title)
            .bind(&song.lyrics)
            .bind(&id)
            .execute(&mut **tx)
            .await?;
        stats.songs += 1;
    }
    Ok(())
}

async fn set_meta(tx: &mut Transaction<'_, Sqlite>, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO meta (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Lowercased book name, or the lowercased file stem when the name is blank.
fn book_id_for(name: &str, stem: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        stem.to_lowercase()
    } else {
        name.to_lowercase()
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn parse_number(id: &str) -> Result<i64> {
    Ok(id.trim().parse::<i64>()?)
}
