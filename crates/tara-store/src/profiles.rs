//! SQLite profile store with an append-only interaction log
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use tara_core::{InteractionRecord, NewInteraction, Profile, ProfileStore, ProfileUpdate, TaraError};
use tracing::debug;

use crate::sqlite::with_connection;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS user_profiles (
    user_id TEXT PRIMARY KEY,
    email TEXT,
    display_name TEXT,
    citizenship TEXT,
    citizenship_code TEXT,
    date_of_birth TEXT,
    passport_number TEXT,
    existing_visas TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS interaction_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    request_type TEXT NOT NULL,
    origin TEXT NOT NULL,
    destination TEXT NOT NULL,
    purpose TEXT NOT NULL,
    status TEXT NOT NULL,
    advisory_payload TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_history_user_created
    ON interaction_history(user_id, created_at);
"#;

// Absent fields keep the stored value; only updated_at always moves.
const UPSERT: &str = r#"
INSERT INTO user_profiles (
    user_id, email, display_name, citizenship, citizenship_code,
    date_of_birth, passport_number, existing_visas, created_at, updated_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
ON CONFLICT(user_id) DO UPDATE SET
    email = COALESCE(excluded.email, user_profiles.email),
    display_name = COALESCE(excluded.display_name, user_profiles.display_name),
    citizenship = COALESCE(excluded.citizenship, user_profiles.citizenship),
    citizenship_code = COALESCE(excluded.citizenship_code, user_profiles.citizenship_code),
    date_of_birth = COALESCE(excluded.date_of_birth, user_profiles.date_of_birth),
    passport_number = COALESCE(excluded.passport_number, user_profiles.passport_number),
    existing_visas = COALESCE(excluded.existing_visas, user_profiles.existing_visas),
    updated_at = excluded.updated_at
"#;

#[derive(Debug, Clone)]
pub struct SqliteProfileStore {
    db_path: PathBuf,
}

impl SqliteProfileStore {
    /// Opens (or creates) the database and ensures both tables exist.
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, TaraError> {
        let db_path = db_path.as_ref().to_path_buf();
        with_connection(&db_path, |conn| conn.execute_batch(SCHEMA)).await?;
        debug!(path = %db_path.display(), "profile tables initialized");
        Ok(Self { db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        user_id: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        citizenship: row.get(3)?,
        citizenship_code: row.get(4)?,
        date_of_birth: row.get(5)?,
        passport_number: row.get(6)?,
        existing_visas: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn interaction_from_row(row: &Row<'_>) -> rusqlite::Result<InteractionRecord> {
    Ok(InteractionRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        request_type: row.get(2)?,
        origin: row.get(3)?,
        destination: row.get(4)?,
        purpose: row.get(5)?,
        status: row.get(6)?,
        advisory_payload: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn require_key(identity_key: &str) -> Result<String, TaraError> {
    let key = identity_key.trim();
    if key.is_empty() {
        return Err(TaraError::InputError("identity key must not be blank".to_string()));
    }
    Ok(key.to_string())
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn get(&self, identity_key: &str) -> Result<Option<Profile>, TaraError> {
        let key = identity_key.trim().to_string();
        if key.is_empty() {
            return Ok(None);
        }

        with_connection(&self.db_path, move |conn| {
            conn.query_row(
                "SELECT user_id, email, display_name, citizenship, citizenship_code, \
                 date_of_birth, passport_number, existing_visas, created_at, updated_at \
                 FROM user_profiles WHERE user_id = ?1",
                params![key],
                profile_from_row,
            )
            .optional()
        })
        .await
    }

    async fn upsert(&self, identity_key: &str, update: ProfileUpdate) -> Result<(), TaraError> {
        let key = require_key(identity_key)?;
        let now: DateTime<Utc> = Utc::now();

        with_connection(&self.db_path, move |conn| {
            conn.execute(
                UPSERT,
                params![
                    key,
                    update.email,
                    update.display_name,
                    update.citizenship,
                    update.citizenship_code,
                    update.date_of_birth,
                    update.passport_number,
                    update.existing_visas,
                    now,
                ],
            )
            .map(|_| ())
        })
        .await
    }

    async fn append_interaction(
        &self,
        identity_key: &str,
        interaction: NewInteraction,
    ) -> Result<(), TaraError> {
        let key = require_key(identity_key)?;
        let now: DateTime<Utc> = Utc::now();

        with_connection(&self.db_path, move |conn| {
            conn.execute(
                "INSERT INTO interaction_history \
                 (user_id, request_type, origin, destination, purpose, status, advisory_payload, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    key,
                    interaction.request_type,
                    interaction.origin,
                    interaction.destination,
                    interaction.purpose,
                    interaction.status.as_str(),
                    interaction.advisory_payload,
                    now,
                ],
            )
            .map(|_| ())
        })
        .await
    }

    async fn recent_interactions(
        &self,
        identity_key: &str,
        limit: usize,
    ) -> Result<Vec<InteractionRecord>, TaraError> {
        let key = identity_key.trim().to_string();
        if key.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        with_connection(&self.db_path, move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, request_type, origin, destination, purpose, status, \
                 advisory_payload, created_at \
                 FROM interaction_history WHERE user_id = ?1 \
                 ORDER BY created_at DESC, id DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![key, limit], interaction_from_row)?;
            rows.collect()
        })
        .await
    }
}
