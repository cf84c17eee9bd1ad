//! SQLite visa rule table
//!
//! The `mobility_logic` table is populated out of band from the passport index
//! dataset (one row per passport/destination pair). At request time it is only
//! read; a missing file, table or row all resolve to `"unknown"`.
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tara_core::data_model::UNKNOWN_REQUIREMENT;
use tara_core::{RuleStore, TaraError};
use tracing::{debug, warn};

use crate::sqlite::{with_connection, with_read_only};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS mobility_logic (
    origin TEXT NOT NULL,
    dest TEXT NOT NULL,
    rule TEXT
);
CREATE INDEX IF NOT EXISTS idx_mobility_pair ON mobility_logic(origin, dest);
"#;

#[derive(Debug, Clone)]
pub struct SqliteRuleStore {
    db_path: PathBuf,
}

impl SqliteRuleStore {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self { db_path: db_path.as_ref().to_path_buf() }
    }

    /// Loads rows into the table, creating it if needed. Returns rows written.
    pub async fn insert_rules(&self, rules: Vec<(String, String, String)>) -> Result<usize, TaraError> {
        with_connection(&self.db_path, move |conn| {
            conn.execute_batch(SCHEMA)?;
            let tx = conn.transaction()?;
            let mut written = 0;
            {
                let mut stmt =
                    tx.prepare("INSERT INTO mobility_logic (origin, dest, rule) VALUES (?1, ?2, ?3)")?;
                for (origin, dest, rule) in &rules {
                    written += stmt.execute(params![origin, dest, rule])?;
                }
            }
            tx.commit()?;
            Ok(written)
        })
        .await
    }
}

/// Outcome of one read against the rule table
#[derive(Debug, PartialEq)]
enum RuleRow {
    NoTable,
    Missing,
    Found(String),
}

fn fetch_rule(conn: &Connection, origin: &str, dest: &str) -> rusqlite::Result<RuleRow> {
    let has_table = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'mobility_logic'",
            [],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !has_table {
        return Ok(RuleRow::NoTable);
    }

    let rule = conn
        .query_row(
            "SELECT rule FROM mobility_logic WHERE origin = ?1 AND dest = ?2",
            params![origin, dest],
            // Dataset rules mix text labels with integer day counts.
            |row| {
                Ok(match row.get_ref(0)? {
                    ValueRef::Text(text) => Some(String::from_utf8_lossy(text).into_owned()),
                    ValueRef::Integer(n) => Some(n.to_string()),
                    ValueRef::Real(f) => Some(f.to_string()),
                    ValueRef::Null | ValueRef::Blob(_) => None,
                })
            },
        )
        .optional()?;

    Ok(match rule.flatten() {
        Some(rule) => RuleRow::Found(rule),
        None => RuleRow::Missing,
    })
}

#[async_trait]
impl RuleStore for SqliteRuleStore {
    async fn lookup(&self, origin_code: &str, destination_code: &str) -> String {
        if !self.db_path.exists() {
            debug!(path = %self.db_path.display(), "rule database missing");
            return UNKNOWN_REQUIREMENT.to_string();
        }

        let origin = origin_code.to_string();
        let dest = destination_code.to_string();
        let result =
            with_read_only(&self.db_path, move |conn| fetch_rule(conn, &origin, &dest)).await;

        match result {
            Ok(RuleRow::Found(rule)) => rule,
            Ok(RuleRow::Missing) => UNKNOWN_REQUIREMENT.to_string(),
            Ok(RuleRow::NoTable) => {
                debug!(path = %self.db_path.display(), "no mobility_logic table");
                UNKNOWN_REQUIREMENT.to_string()
            }
            Err(err) => {
                warn!(error = %err, origin = origin_code, dest = destination_code, "rule lookup failed");
                UNKNOWN_REQUIREMENT.to_string()
            }
        }
    }
}
