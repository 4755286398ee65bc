// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document load/save. Block arrays and history are stored as JSON text.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use glossa_core::{Document, GlossaError, Language};
use rusqlite::params;

use crate::database::{map_tr_err, Database};

/// Raw column values, decoded outside the writer thread.
struct DocumentRow {
    slug: String,
    owner: String,
    title: String,
    lang: String,
    translation_lang: String,
    content: String,
    translation_content: String,
    messages_history: String,
    tokens_used: i64,
    created_at: String,
    updated_at: String,
}

fn storage_err(e: impl std::error::Error + Send + Sync + 'static) -> GlossaError {
    GlossaError::Storage {
        source: Box::new(e),
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, GlossaError> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(storage_err)
}

fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl DocumentRow {
    fn decode(self) -> Result<Document, GlossaError> {
        Ok(Document {
            slug: self.slug,
            owner: self.owner,
            title: self.title,
            lang: Language::from_str(&self.lang).map_err(storage_err)?,
            translation_lang: Language::from_str(&self.translation_lang).map_err(storage_err)?,
            content: serde_json::from_str(&self.content).map_err(storage_err)?,
            translation_content: serde_json::from_str(&self.translation_content)
                .map_err(storage_err)?,
            messages_history: serde_json::from_str(&self.messages_history)
                .map_err(storage_err)?,
            tokens_used: u64::try_from(self.tokens_used).unwrap_or(0),
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

/// Get a document by slug, scoped to its owner.
pub async fn get_document(
    db: &Database,
    slug: &str,
    owner: &str,
) -> Result<Option<Document>, GlossaError> {
    let slug = slug.to_string();
    let owner = owner.to_string();
    let row = db
        .connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT slug, owner, title, lang, translation_lang, content, translation_content,
                        messages_history, tokens_used, created_at, updated_at
                 FROM documents WHERE slug = ?1 AND owner = ?2",
                params![slug, owner],
                |row| {
                    Ok(DocumentRow {
                        slug: row.get(0)?,
                        owner: row.get(1)?,
                        title: row.get(2)?,
                        lang: row.get(3)?,
                        translation_lang: row.get(4)?,
                        content: row.get(5)?,
                        translation_content: row.get(6)?,
                        messages_history: row.get(7)?,
                        tokens_used: row.get(8)?,
                        created_at: row.get(9)?,
                        updated_at: row.get(10)?,
                    })
                },
            );
            match result {
                Ok(row) => Ok(Some(row)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    row.map(DocumentRow::decode).transpose()
}

/// Insert a document or replace the stored one with the same slug.
pub async fn upsert_document(db: &Database, document: &Document) -> Result<(), GlossaError> {
    let content = serde_json::to_string(&document.content).map_err(storage_err)?;
    let translation_content =
        serde_json::to_string(&document.translation_content).map_err(storage_err)?;
    let messages_history =
        serde_json::to_string(&document.messages_history).map_err(storage_err)?;
    let slug = document.slug.clone();
    let owner = document.owner.clone();
    let title = document.title.clone();
    let lang = document.lang.to_string();
    let translation_lang = document.translation_lang.to_string();
    let tokens_used = i64::try_from(document.tokens_used).unwrap_or(i64::MAX);
    let created_at = format_timestamp(&document.created_at);
    let updated_at = format_timestamp(&document.updated_at);

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO documents (slug, owner, title, lang, translation_lang, content,
                                        translation_content, messages_history, tokens_used,
                                        created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(slug) DO UPDATE SET
                    title = excluded.title,
                    lang = excluded.lang,
                    translation_lang = excluded.translation_lang,
                    content = excluded.content,
                    translation_content = excluded.translation_content,
                    messages_history = excluded.messages_history,
                    tokens_used = excluded.tokens_used,
                    updated_at = excluded.updated_at
                 WHERE documents.owner = excluded.owner",
                params![
                    slug,
                    owner,
                    title,
                    lang,
                    translation_lang,
                    content,
                    translation_content,
                    messages_history,
                    tokens_used,
                    created_at,
                    updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
