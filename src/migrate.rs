//! Database schema.
//!
//! ```text
//! meta(key, value)                       -- `initialized` flag, import stamp
//! songs(id, title, lyrics, lang)
//! books(id, name, testament, lang, book_order, chapters_count)
//! chapters(id, book_id, chapter_number, verses_count)
//! verses(id, chapter_id, book_id, verse, text, lang)
//! verses_fts(text, verse_id, chapter_id, book_id)   -- FTS5
//! songs_fts(title, lyrics, song_id)                 -- FTS5
//! ```
//!
//! Identifiers are synthetic: book `genesisy`, chapter `genesisy_1`,
//! verse `genesisy_1_1`.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS songs (
        id TEXT PRIMARY KEY,
        title TEXT,
        lyrics TEXT,
        lang TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS books (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        testament TEXT NOT NULL,
        lang TEXT,
        book_order INTEGER,
        chapters_count INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS chapters (
        id TEXT PRIMARY KEY,
        book_id TEXT NOT NULL,
        chapter_number INTEGER NOT NULL,
        verses_count INTEGER NOT NULL,
        FOREIGN KEY (book_id) REFERENCES books(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS verses (
        id TEXT PRIMARY KEY,
        chapter_id TEXT NOT NULL,
        book_id TEXT NOT NULL,
        verse INTEGER NOT NULL,
        text TEXT NOT NULL,
        lang TEXT,
        FOREIGN KEY (chapter_id) REFERENCES chapters(id)
    )
    "#,
];

/// Drop order respects foreign keys.
const DROP_ORDER: &[&str] = &[
    "verses_fts",
    "songs_fts",
    "verses",
    "chapters",
    "books",
    "songs",
    "meta",
];

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    create_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Creates every table and index. Safe to run repeatedly.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    for ddl in TABLES {
        sqlx::query(ddl).execute(pool).await?;
    }

    create_fts_if_missing(
        pool,
        "verses_fts",
        r#"
        CREATE VIRTUAL TABLE verses_fts USING fts5(
            text,
            verse_id UNINDEXED,
            chapter_id UNINDEXED,
            book_id UNINDEXED
        )
        "#,
    )
    .await?;

    create_fts_if_missing(
        pool,
        "songs_fts",
        r#"
        CREATE VIRTUAL TABLE songs_fts USING fts5(
            title,
            lyrics,
            song_id UNINDEXED
        )
        "#,
    )
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_chapters_book_id ON chapters(book_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_verses_chapter_id ON verses(chapter_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Drops every table created by [`create_schema`].
pub async fn drop_schema(pool: &SqlitePool) -> Result<()> {
    for table in DROP_ORDER {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await?;
    }
    tracing::info!("dropped existing schema");
    Ok(())
}

// FTS5 CREATE is not idempotent natively, so we check first
async fn create_fts_if_missing(pool: &SqlitePool, name: &str, ddl: &str) -> Result<()> {
    let exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name = ?",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;

    if !exists {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn table_names(pool: &SqlitePool) -> Vec<String> {
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_schema_idempotent() {
        let tmp = TempDir::new().unwrap();
        let pool = db::connect_path(&tmp.path().join("vp.sqlite")).await.unwrap();
        create_schema(&pool).await.unwrap();
        create_schema(&pool).await.unwrap();

        let names = table_names(&pool).await;
        for expected in ["books", "chapters", "meta", "songs", "songs_fts", "verses", "verses_fts"] {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }
    }

    #[tokio::test]
    async fn test_drop_then_create() {
        let tmp = TempDir::new().unwrap();
        let pool = db::connect_path(&tmp.path().join("vp.sqlite")).await.unwrap();
        create_schema(&pool).await.unwrap();
        sqlx::query("INSERT INTO meta (key, value) VALUES ('initialized', 'true')")
            .execute(&pool)
            .await
            .unwrap();

        drop_schema(&pool).await.unwrap();
        assert!(!table_names(&pool).await.iter().any(|n| n == "meta"));

        create_schema(&pool).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM meta")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
