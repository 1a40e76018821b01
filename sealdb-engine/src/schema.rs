//! On-disk layout.
//!
//! Paths and timestamps are stored in the clear so that SQLite's binary
//! collation orders rows by path. Payloads and fields are sealed.

use crate::codec::{db_err, timestamp};
use rusqlite::{Connection, OptionalExtension, params};
use sealdb_crypto::{SecretKey, open, seal};
use sealdb_store::{StoreError, StoreResult};
use sealdb_types::HybridTimestamp;
use tracing::warn;

/// Current layout version.
pub(crate) const FORMAT_VERSION: i64 = 1;

const CHECK_PLAINTEXT: &[u8] = b"sealdb verification token";
const CHECK_AAD: &[u8] = b"sealdb-meta-check";

pub(crate) fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS meta (
            name TEXT PRIMARY KEY,
            value BLOB NOT NULL
        );

        CREATE TABLE IF NOT EXISTS documents (
            path TEXT PRIMARY KEY,
            data BLOB NOT NULL,
            fields BLOB NOT NULL,
            created_wall INTEGER NOT NULL,
            created_logical INTEGER NOT NULL,
            updated_wall INTEGER NOT NULL,
            updated_logical INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS counters (
            name TEXT PRIMARY KEY,
            value INTEGER NOT NULL
        );
        ",
    )
    .map_err(db_err)
}

/// Writes the verification token on a fresh store, or checks it on an
/// existing one.
pub(crate) fn verify_key(conn: &Connection, key: &SecretKey) -> StoreResult<()> {
    let check: Option<Vec<u8>> = conn
        .query_row("SELECT value FROM meta WHERE name = 'check'", [], |row| {
            row.get(0)
        })
        .optional()
        .map_err(db_err)?;

    match check {
        Some(sealed) => {
            let plaintext = open(key, &sealed, CHECK_AAD).map_err(|_| {
                warn!("secret key does not open store");
                StoreError::InvalidKey
            })?;
            if plaintext != CHECK_PLAINTEXT {
                return Err(StoreError::InvalidKey);
            }
            let version: i64 = conn
                .query_row("SELECT value FROM meta WHERE name = 'version'", [], |row| {
                    row.get(0)
                })
                .map_err(db_err)?;
            if version != FORMAT_VERSION {
                return Err(StoreError::Database(format!(
                    "unsupported format version {version}"
                )));
            }
        }
        None => {
            let sealed = seal(key, CHECK_PLAINTEXT, CHECK_AAD)
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            conn.execute(
                "INSERT INTO meta (name, value) VALUES ('check', ?1), ('version', ?2)",
                params![sealed, FORMAT_VERSION],
            )
            .map_err(db_err)?;
        }
    }
    Ok(())
}

/// Latest creation or update stamp in the store, or zero when it is empty.
pub(crate) fn last_stamp(conn: &Connection) -> StoreResult<HybridTimestamp> {
    let latest = |wall: &str, logical: &str| -> StoreResult<HybridTimestamp> {
        let sql = format!(
            "SELECT {wall}, {logical} FROM documents ORDER BY {wall} DESC, {logical} DESC LIMIT 1"
        );
        conn.query_row(&sql, [], |row| Ok(timestamp(row.get(0)?, row.get(1)?)))
            .optional()
            .map(Option::unwrap_or_default)
            .map_err(db_err)
    };
    let created = latest("created_wall", "created_logical")?;
    let updated = latest("updated_wall", "updated_logical")?;
    Ok(created.max(updated))
}
