//! Full-text search over the imported library (`vp search`).
//!
//! Queries the FTS5 indexes built by the importer. Results are ordered by
//! FTS5 `rank` (BM25, lower is better), negated so higher scores are better.

use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;

/// A verse matching a search query.
#[derive(Debug, Clone, PartialEq)]
pub struct VerseHit {
    pub verse_id: String,
    pub book_id: String,
    /// `"<book name> <chapter>:<verse>"`.
    pub reference: String,
    pub text: String,
    pub snippet: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SongHit {
    pub song_id: String,
    pub title: String,
    pub snippet: String,
    pub score: f64,
}

pub async fn run_search(config: &Config, query: &str, songs: bool, limit: i64) -> Result<()> {
    if query.trim().is_empty() {
        bail!("Search query must not be empty");
    }
    if limit <= 0 {
        bail!("--limit must be > 0");
    }

    let pool = db::connect(config).await?;

    if songs {
        let hits = search_songs(&pool, query, limit).await?;
        if hits.is_empty() {
            println!("No results.");
        }
        for (i, hit) in hits.iter().enumerate() {
            println!("{}. [{:.2}] {}", i + 1, hit.score, hit.title);
            println!("    excerpt: \"{}\"", hit.snippet.replace('\n', " ").trim());
            println!("    id: {}", hit.song_id);
            println!();
        }
    } else {
        let hits = search_verses(&pool, query, limit).await?;
        if hits.is_empty() {
            println!("No results.");
        }
        for (i, hit) in hits.iter().enumerate() {
            println!("{}. [{:.2}] {}", i + 1, hit.score, hit.reference);
            println!("    excerpt: \"{}\"", hit.snippet.replace('\n', " ").trim());
            println!("    id: {}", hit.verse_id);
            println!();
        }
    }

    pool.close().await;
    Ok(())
}

pub async fn search_verses(pool: &SqlitePool, query: &str, limit: i64) -> Result<Vec<VerseHit>> {
    let rows = sqlx::query(
        r#"
        SELECT verses_fts.verse_id, verses_fts.book_id, verses_fts.rank,
               v.text, v.verse, c.chapter_number, b.name,
               snippet(verses_fts, 0, '>>>', '<<<', '...', 24) AS snippet
        FROM verses_fts
        JOIN verses v ON v.id = verses_fts.verse_id
        JOIN chapters c ON c.id = v.chapter_id
        JOIN books b ON b.id = v.book_id
        WHERE verses_fts MATCH ?
        ORDER BY verses_fts.rank
        LIMIT ?
        "#,
    )
    .bind(fts_query(query))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let rank: f64 = row.get("rank");
            let name: String = row.get("name");
            let chapter: i64 = row.get("chapter_number");
            let verse: i64 = row.get("verse");
            VerseHit {
                verse_id: row.get("verse_id"),
                book_id: row.get("book_id"),
                reference: format!("{} {}:{}", name, chapter, verse),
                text: row.get("text"),
                snippet: row.get("snippet"),
                score: -rank,
            }
        })
        .collect())
}

pub async fn search_songs(pool: &SqlitePool, query: &str, limit: i64) -> Result<Vec<SongHit>> {
    let rows = sqlx::query(
        r#"
        SELECT song_id, title, rank,
               snippet(songs_fts, 1, '>>>', '<<<', '...', 24) AS snippet
        FROM songs_fts
        WHERE songs_fts MATCH ?
        ORDER BY rank
        LIMIT ?
        "#,
    )
    .bind(fts_query(query))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let rank: f64 = row.get("rank");
            SongHit {
                song_id: row.get("song_id"),
                title: row.get("title"),
                snippet: row.get("snippet"),
                score: -rank,
            }
        })
        .collect())
}

/// Quotes each whitespace-separated term so punctuation such as the
/// apostrophes in `nitiavan'Andriamanitra` is not parsed as FTS5 syntax.
/// Terms are implicitly AND-ed.
fn fts_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate;
    use tempfile::TempDir;

    async fn seeded() -> (TempDir, SqlitePool) {
        let tmp = TempDir::new().unwrap();
        let pool = db::connect_path(&tmp.path().join("vp.sqlite")).await.unwrap();
        migrate::create_schema(&pool).await.unwrap();

        sqlx::query(
            "INSERT INTO books (id, name, testament, lang, book_order, chapters_count)
             VALUES ('jaona', 'Jaona', 'new', 'mg', 43, 21)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO chapters (id, book_id, chapter_number, verses_count)
             VALUES ('jaona_11', 'jaona', 11, 1), ('jaona_3', 'jaona', 3, 1)",
        )
        .execute(&pool)
        .await
        .unwrap();
        for (id, chapter_id, verse, text) in [
            ("jaona_11_35", "jaona_11", 35, "Nitomany Jesosy."),
            (
                "jaona_3_16",
                "jaona_3",
                16,
                "Fa toy izao no nitiavan'Andriamanitra izao tontolo izao.",
            ),
        ] {
            sqlx::query(
                "INSERT INTO verses (id, chapter_id, book_id, verse, text, lang)
                 VALUES (?, ?, 'jaona', ?, ?, 'mg')",
            )
            .bind(id)
            .bind(chapter_id)
            .bind(verse)
            .bind(text)
            .execute(&pool)
            .await
            .unwrap();
            sqlx::query(
                "INSERT INTO verses_fts (text, verse_id, chapter_id, book_id) VALUES (?, ?, ?, 'jaona')",
            )
            .bind(text)
            .bind(id)
            .bind(chapter_id)
            .execute(&pool)
            .await
            .unwrap();
        }

        sqlx::query("INSERT INTO songs_fts (title, lyrics, song_id) VALUES (?, ?, ?)")
            .bind("Jeso Tompo")
            .bind("Jeso Tompo tia ahy")
            .bind("ff-1")
            .execute(&pool)
            .await
            .unwrap();

        (tmp, pool)
    }

    #[tokio::test]
    async fn test_search_verses_reference() {
        let (_tmp, pool) = seeded().await;
        let hits = search_verses(&pool, "Nitomany", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].reference, "Jaona 11:35");
        assert_eq!(hits[0].verse_id, "jaona_11_35");
        assert!(hits[0].snippet.contains(">>>Nitomany<<<"));
    }

    #[tokio::test]
    async fn test_search_verses_with_apostrophe() {
        let (_tmp, pool) = seeded().await;
        let hits = search_verses(&pool, "nitiavan'Andriamanitra", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].reference, "Jaona 3:16");
    }

    #[tokio::test]
    async fn test_search_no_match() {
        let (_tmp, pool) = seeded().await;
        assert!(search_verses(&pool, "Mosesy", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_songs() {
        let (_tmp, pool) = seeded().await;
        let hits = search_songs(&pool, "tia", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].song_id, "ff-1");
        assert_eq!(hits[0].title, "Jeso Tompo");
    }

    #[test]
    fn test_fts_query_quotes_terms() {
        assert_eq!(fts_query("izao  tontolo"), "\"izao\" \"tontolo\"");
        assert_eq!(fts_query("a\"b"), "\"a\"\"b\"");
    }
}
