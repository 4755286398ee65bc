// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Example translation pairs with FTS5 / BM25 similarity search.

use glossa_core::{ExamplePair, GlossaError, Language};
use rusqlite::params;

use crate::database::{map_tr_err, Database};

/// Longest FTS query we build, in terms.
const MAX_QUERY_TERMS: usize = 32;

/// Store one example pair.
pub async fn insert_example(
    db: &Database,
    source_lang: Language,
    target_lang: Language,
    pair: &ExamplePair,
) -> Result<i64, GlossaError> {
    let source_lang = source_lang.to_string();
    let target_lang = target_lang.to_string();
    let source = pair.source.clone();
    let target = pair.target.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO example_pairs (source_lang, target_lang, source_text, target_text)
                 VALUES (?1, ?2, ?3, ?4)",
                params![source_lang, target_lang, source, target],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Turns free text into an FTS5 query: every word becomes a quoted term and
/// terms are OR-ed together. Returns `None` when no searchable word remains.
pub fn build_match_query(text: &str) -> Option<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        let term = format!("\"{}\"", word.to_lowercase());
        if !terms.contains(&term) {
            terms.push(term);
        }
        if terms.len() == MAX_QUERY_TERMS {
            break;
        }
    }
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

/// Pairs for the language direction whose source side best matches `query`,
/// most relevant first.
pub async fn search_examples(
    db: &Database,
    query: &str,
    source_lang: Language,
    target_lang: Language,
    limit: usize,
) -> Result<Vec<ExamplePair>, GlossaError> {
    let Some(match_query) = build_match_query(query) else {
        return Ok(Vec::new());
    };
    let source_lang = source_lang.to_string();
    let target_lang = target_lang.to_string();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT e.source_text, e.target_text
                 FROM example_pairs_fts
                 JOIN example_pairs e ON e.id = example_pairs_fts.rowid
                 WHERE example_pairs_fts MATCH ?1
                   AND e.source_lang = ?2 AND e.target_lang = ?3
                 ORDER BY bm25(example_pairs_fts)
                 LIMIT ?4",
            )?;
            let pairs = stmt
                .query_map(params![match_query, source_lang, target_lang, limit], |row| {
                    Ok(ExamplePair {
                        source: row.get(0)?,
                        target: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(pairs)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_query_quotes_and_dedups_terms() {
        assert_eq!(
            build_match_query("Đá phiến, đá phiến sét!").as_deref(),
            Some("\"đá\" OR \"phiến\" OR \"sét\"")
        );
    }

    #[test]
    fn match_query_neutralises_fts_syntax() {
        let q = build_match_query("NEAR(\"a\" b) OR c*").unwrap();
        assert!(!q.contains('('));
        assert!(!q.contains('*'));
    }

    #[test]
    fn match_query_empty_for_punctuation() {
        assert_eq!(build_match_query(" ... -- !! "), None);
    }

    #[tokio::test]
    async fn search_ranks_and_filters_by_direction() {
        let db = Database::open_in_memory().await.unwrap();
        insert_example(
            &db,
            Language::Vn,
            Language::Ru,
            &ExamplePair::new("đá phiến sét chứa dầu", "нефтеносный сланец"),
        )
        .await
        .unwrap();
        insert_example(
            &db,
            Language::Vn,
            Language::Ru,
            &ExamplePair::new("giếng khoan thăm dò", "разведочная скважина"),
        )
        .await
        .unwrap();
        insert_example(
            &db,
            Language::Vn,
            Language::En,
            &ExamplePair::new("đá phiến sét", "shale"),
        )
        .await
        .unwrap();

        let results = search_examples(&db, "đá phiến sét", Language::Vn, Language::Ru, 10)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].target, "нефтеносный сланец");
    }

    #[tokio::test]
    async fn search_with_no_terms_returns_nothing() {
        let db = Database::open_in_memory().await.unwrap();
        let results = search_examples(&db, "!!!", Language::Vn, Language::Ru, 10)
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
