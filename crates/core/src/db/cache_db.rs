use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::db::{RebuildRunRecord, RebuildStatus};
use crate::error::{TagfixError, TagfixResult};
use crate::model::{Address, AddressTable, NameTable, RefCounts};
use crate::store::{CacheStore, GlobalKey, Partition, StoredEntry};

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Error type for cache database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

impl From<rusqlite::Error> for TagfixError {
    fn from(err: rusqlite::Error) -> Self {
        TagfixError::Db(DbError::Sql(err))
    }
}

/// SQLite-backed tag cache.
///
/// Contents entries are stored as one JSON document per function; the
/// globals index is two keyed tables so single keys can be enumerated and
/// removed individually.
#[derive(Debug)]
pub struct SqliteCacheStore {
    conn: Connection,
}

impl SqliteCacheStore {
    /// Open (or create) a cache database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Open a throwaway in-memory cache.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Expose a reference to the underlying connection for advanced callers.
    /// For most code, prefer higher-level helpers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert a rebuild run record and return its row id.
    pub fn insert_rebuild_run(&self, record: &RebuildRunRecord) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO rebuild_runs (operation, snapshot_hash, status, detail, started_at, finished_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.operation,
                record.snapshot_hash,
                record.status.as_str(),
                record.detail,
                record.started_at,
                record.finished_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List rebuild runs (ordered by id).
    pub fn list_rebuild_runs(&self) -> DbResult<Vec<RebuildRunRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT operation, snapshot_hash, status, detail, started_at, finished_at
            FROM rebuild_runs
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let status: String = row.get(2)?;
            Ok(RebuildRunRecord {
                operation: row.get(0)?,
                snapshot_hash: row.get(1)?,
                status: status.parse::<RebuildStatus>().map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        2,
                        "status".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?,
                detail: row.get(3)?,
                started_at: row.get(4)?,
                finished_at: row.get(5)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn read_contents(&self, function: Address) -> TagfixResult<Option<StoredEntry>> {
        let blob: Option<String> = self
            .conn
            .query_row(
                "SELECT blob FROM contents_cache WHERE function = ?1",
                params![function as i64],
                |row| row.get(0),
            )
            .optional()?;
        blob.map(|body| StoredEntry::from_json_str(Partition::Contents(function), &body))
            .transpose()
    }

    fn write_contents(&self, entry: &StoredEntry) -> TagfixResult<()> {
        let Partition::Contents(function) = entry.partition() else {
            return Ok(());
        };
        self.conn.execute(
            r#"
            INSERT INTO contents_cache (function, blob) VALUES (?1, ?2)
            ON CONFLICT(function) DO UPDATE SET blob = excluded.blob
            "#,
            params![function as i64, entry.to_json_string()?],
        )?;
        Ok(())
    }

    /// Apply `update` to a function's entry, creating it when absent.
    fn update_contents<F>(&self, function: Address, update: F) -> TagfixResult<()>
    where
        F: FnOnce(&mut StoredEntry) -> TagfixResult<()>,
    {
        let mut entry = self
            .read_contents(function)?
            .unwrap_or_else(|| StoredEntry::empty(Partition::Contents(function)));
        update(&mut entry)?;
        self.write_contents(&entry)
    }

    fn read_globals(&self) -> TagfixResult<Option<StoredEntry>> {
        let mut counts = RefCounts::new();
        {
            let mut stmt = self.conn.prepare("SELECT name, count FROM globals_names")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?;
            for r in rows {
                let (name, count) = r?;
                counts.names.insert(name, count);
            }
        }
        {
            let mut stmt = self.conn.prepare("SELECT address, count FROM globals_addresses")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, i64>(0)? as u64, row.get::<_, i64>(1)? as u64))
            })?;
            for r in rows {
                let (address, count) = r?;
                counts.addresses.insert(address, count);
            }
        }

        if counts.is_empty() {
            return Ok(None);
        }
        Ok(Some(StoredEntry::from_counts(Partition::Globals, &counts)))
    }
}

impl CacheStore for SqliteCacheStore {
    fn read(&self, partition: Partition) -> TagfixResult<Option<StoredEntry>> {
        match partition {
            Partition::Contents(function) => self.read_contents(function),
            Partition::Globals => self.read_globals(),
        }
    }

    fn set_names(&mut self, partition: Partition, names: &NameTable) -> TagfixResult<()> {
        match partition {
            Partition::Contents(function) => self.update_contents(function, |entry| {
                entry.set_names(names);
                Ok(())
            }),
            Partition::Globals => {
                let tx = self.conn.unchecked_transaction()?;
                {
                    let mut stmt = tx.prepare(
                        r#"
                        INSERT INTO globals_names (name, count) VALUES (?1, ?2)
                        ON CONFLICT(name) DO UPDATE SET count = excluded.count
                        "#,
                    )?;
                    for (name, count) in names {
                        stmt.execute(params![name, *count as i64])?;
                    }
                }
                tx.commit()?;
                Ok(())
            }
        }
    }

    fn set_addresses(
        &mut self,
        partition: Partition,
        addresses: &AddressTable,
    ) -> TagfixResult<()> {
        match partition {
            Partition::Contents(function) => self.update_contents(function, |entry| {
                entry.set_addresses(addresses);
                Ok(())
            }),
            Partition::Globals => {
                let tx = self.conn.unchecked_transaction()?;
                {
                    let mut stmt = tx.prepare(
                        r#"
                        INSERT INTO globals_addresses (address, count) VALUES (?1, ?2)
                        ON CONFLICT(address) DO UPDATE SET count = excluded.count
                        "#,
                    )?;
                    for (address, count) in addresses {
                        stmt.execute(params![*address as i64, *count as i64])?;
                    }
                }
                tx.commit()?;
                Ok(())
            }
        }
    }

    fn increment(&mut self, partition: Partition, address: Address, name: &str) -> TagfixResult<()> {
        match partition {
            Partition::Contents(function) => {
                self.update_contents(function, |entry| entry.increment(address, name))
            }
            Partition::Globals => {
                let tx = self.conn.unchecked_transaction()?;
                tx.execute(
                    r#"
                    INSERT INTO globals_names (name, count) VALUES (?1, 1)
                    ON CONFLICT(name) DO UPDATE SET count = count + 1
                    "#,
                    params![name],
                )?;
                tx.execute(
                    r#"
                    INSERT INTO globals_addresses (address, count) VALUES (?1, 1)
                    ON CONFLICT(address) DO UPDATE SET count = count + 1
                    "#,
                    params![address as i64],
                )?;
                tx.commit()?;
                Ok(())
            }
        }
    }

    fn contents_keys(&self) -> TagfixResult<Vec<Address>> {
        let mut stmt = self.conn.prepare("SELECT function FROM contents_cache")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row? as u64);
        }
        // Addresses are stored as signed integers; order them unsigned.
        out.sort_unstable();
        Ok(out)
    }

    fn global_keys(&self) -> TagfixResult<Vec<GlobalKey>> {
        let mut out = Vec::new();
        {
            let mut stmt = self.conn.prepare("SELECT name FROM globals_names ORDER BY name")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            for row in rows {
                out.push(GlobalKey::Name(row?));
            }
        }
        {
            let mut stmt = self.conn.prepare("SELECT address FROM globals_addresses")?;
            let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
            let mut addresses = Vec::new();
            for row in rows {
                addresses.push(row? as u64);
            }
            addresses.sort_unstable();
            out.extend(addresses.into_iter().map(GlobalKey::Address));
        }
        Ok(out)
    }

    fn remove_contents(&mut self, function: Address) -> TagfixResult<()> {
        let affected = self
            .conn
            .execute("DELETE FROM contents_cache WHERE function = ?1", params![function as i64])?;
        if affected == 0 {
            return Err(TagfixError::StoreEntryMissing {
                key: Partition::Contents(function).to_string(),
            });
        }
        Ok(())
    }

    fn remove_global(&mut self, key: &GlobalKey) -> TagfixResult<()> {
        let affected = match key {
            GlobalKey::Name(name) => {
                self.conn.execute("DELETE FROM globals_names WHERE name = ?1", params![name])?
            }
            GlobalKey::Address(address) => self.conn.execute(
                "DELETE FROM globals_addresses WHERE address = ?1",
                params![*address as i64],
            )?,
        };
        if affected == 0 {
            return Err(TagfixError::StoreEntryMissing { key: key.to_string() });
        }
        Ok(())
    }
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: contents_cache, globals_names, globals_addresses
/// - 2: add rebuild_runs table
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let mut current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS contents_cache (
                function INTEGER PRIMARY KEY,
                blob     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS globals_names (
                name  TEXT PRIMARY KEY,
                count INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS globals_addresses (
                address INTEGER PRIMARY KEY,
                count   INTEGER NOT NULL
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
        current_version = 1;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS rebuild_runs (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                operation     TEXT NOT NULL,
                snapshot_hash TEXT,
                status        TEXT NOT NULL,
                detail        TEXT,
                started_at    TEXT NOT NULL,
                finished_at   TEXT NOT NULL
            );

            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
