//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The engine calls store methods; it never executes SQL directly.
//!
//! The store is a key-value table plus an append-only event log.
//! Writes are last-writer-wins per key; there is no transaction
//! spanning the in-memory state and the stored snapshot.

use crate::{
    config::GameConfig,
    error::GameResult,
    event::EventLogEntry,
    progress::PlayerProgress,
    snapshot::{self, PROGRESS_KEY},
    types::{Tick, TimestampMs},
};
use rusqlite::{params, Connection, OptionalExtension};

pub struct GameStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl GameStore {
    /// Open (or create) the game database at `path`.
    pub fn open(path: &str) -> GameResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // Shared-memory and :memory: databases keep their own journal mode.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> GameResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new in-memory database (isolated).
    pub fn reopen(&self) -> GameResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> GameResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Session ────────────────────────────────────────────────

    pub fn insert_session(
        &self,
        session_id: &str,
        seed: u64,
        version: &str,
        started_at: TimestampMs,
    ) -> GameResult<()> {
        self.conn.execute(
            "INSERT INTO session (session_id, seed, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![session_id, seed as i64, version, started_at],
        )?;
        Ok(())
    }

    // ── Key-value ──────────────────────────────────────────────

    pub fn get(&self, key: &str) -> GameResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str, now_ms: TimestampMs) -> GameResult<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now_ms],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> GameResult<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Drop every stored record. The only deletion path for progress.
    pub fn clear(&self) -> GameResult<()> {
        self.conn.execute_batch("DELETE FROM kv; DELETE FROM event_log;")?;
        Ok(())
    }

    // ── Progress snapshot ──────────────────────────────────────

    pub fn save_progress(&self, progress: &PlayerProgress, now_ms: TimestampMs) -> GameResult<()> {
        let json = snapshot::encode(progress)?;
        self.set(PROGRESS_KEY, &json, now_ms)
    }

    /// Load the stored progress. An unparsable record is logged and
    /// treated as absent, so the caller starts from fresh defaults.
    pub fn load_progress(
        &self,
        config: &GameConfig,
        now_ms: TimestampMs,
    ) -> GameResult<Option<PlayerProgress>> {
        let Some(json) = self.get(PROGRESS_KEY)? else {
            return Ok(None);
        };
        match snapshot::decode(&json, config, now_ms) {
            Ok(progress) => Ok(Some(progress)),
            Err(e) => {
                log::warn!("Failed to load game state, starting fresh: {e}");
                Ok(None)
            }
        }
    }

    // ── Claim timestamps ───────────────────────────────────────

    /// Read an epoch-millisecond stamp stored as a decimal string.
    pub fn timestamp(&self, key: &str) -> GameResult<Option<TimestampMs>> {
        Ok(self.get(key)?.and_then(|raw| {
            raw.trim()
                .parse::<TimestampMs>()
                .map_err(|e| log::warn!("Ignoring unparsable timestamp under '{key}': {raw:?} ({e})"))
                .ok()
        }))
    }

    pub fn set_timestamp(&self, key: &str, at: TimestampMs) -> GameResult<()> {
        self.set(key, &at.to_string(), at)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> GameResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (session_id, tick, event_type, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.session_id,
                entry.tick as i64,
                entry.event_type,
                entry.payload,
                entry.tick as i64,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_session(&self, session_id: &str) -> GameResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, tick, event_type, payload
             FROM event_log WHERE session_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![session_id], |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    session_id: row.get(1)?,
                    tick:       row.get::<_, i64>(2)? as Tick,
                    event_type: row.get(3)?,
                    payload:    row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, session_id: &str, event_type: &str) -> GameResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE session_id = ?1 AND event_type = ?2",
            params![session_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
