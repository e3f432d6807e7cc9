use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{PipelineError, Result};
use crate::store::IndexStore;

fn store_err(e: rusqlite::Error) -> PipelineError {
    PipelineError::Store(e.to_string())
}

/// `rusqlite`-backed [`IndexStore`]. Holds one connection behind a mutex,
/// consistent with SQLite's single-writer model; callers lock, execute,
/// and release per call rather than holding the lock across suspension
/// points.
pub struct SqliteIndexStore {
    conn: Mutex<Connection>,
}

impl SqliteIndexStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).map_err(store_err)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

impl IndexStore for SqliteIndexStore {
    fn create_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tone (
                tone_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS address_couple (
                address INTEGER NOT NULL,
                couple INTEGER NOT NULL,
                UNIQUE(address, couple)
            );
            CREATE INDEX IF NOT EXISTS address_couple_address_idx ON address_couple(address);",
        )
        .map_err(store_err)
    }

    fn reset_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "DROP TABLE IF EXISTS address_couple;
            DROP TABLE IF EXISTS tone;
            CREATE TABLE tone (
                tone_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );
            CREATE TABLE address_couple (
                address INTEGER NOT NULL,
                couple INTEGER NOT NULL,
                UNIQUE(address, couple)
            );
            CREATE INDEX address_couple_address_idx ON address_couple(address);",
        )
        .map_err(store_err)
    }

    fn tone_exists(&self, tone_id: u32) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let exists = conn
            .query_row(
                "SELECT 1 FROM tone WHERE tone_id = ?1",
                params![tone_id],
                |_| Ok(()),
            )
            .optional()
            .map_err(store_err)?
            .is_some();
        Ok(exists)
    }

    fn store_tone(&self, tone_id: u32, name: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO tone (tone_id, name) VALUES (?1, ?2)",
            params![tone_id, name],
        )
        .map_err(store_err)?;
        Ok(())
    }

    fn store_address_couples(&self, entries: &[(u32, u64)]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(store_err)?;
        {
            let mut stmt = tx
                .prepare("INSERT OR IGNORE INTO address_couple (address, couple) VALUES (?1, ?2)")
                .map_err(store_err)?;
            for &(address, couple) in entries {
                stmt.execute(params![address, couple]).map_err(store_err)?;
            }
        }
        tx.commit().map_err(store_err)
    }

    fn lookup_couples_by_address(&self, address: u32) -> Result<Vec<(u32, u64)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT address, couple FROM address_couple WHERE address = ?1")
            .map_err(store_err)?;
        let rows = stmt
            .query_map(params![address], |row| {
                let addr: u32 = row.get(0)?;
                let couple: i64 = row.get(1)?;
                Ok((addr, couple as u64))
            })
            .map_err(store_err)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(store_err)?);
        }
        Ok(out)
    }

    fn get_tone(&self, tone_id: u32) -> Result<Option<(u32, String)>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT tone_id, name FROM tone WHERE tone_id = ?1",
            params![tone_id],
            |row| Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()
        .map_err(store_err)
    }
}
