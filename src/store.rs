use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params};
use tracing::{debug, info};

use crate::error::{CacheError, PersistContext};
use crate::model::{LegendStat, LegendTotals, UpsertOutcome};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_COLUMNS: &str =
    "id, player_name, legend_name, kills, wins, damage, recorded_at";

pub struct CacheStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl CacheStore {
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path).persist_ctx("open sqlite db")?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .persist_ctx("enable wal journal")?;
        let store = Self::from_connection(conn, Some(path.to_path_buf()))?;
        info!(path = %path.display(), "legend cache opened");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory().persist_ctx("open in-memory sqlite db")?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self, CacheError> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .persist_ctx("set sqlite busy timeout")?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // Writes are transactional, so a panic mid-call cannot leave half a batch behind.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn upsert(
        &self,
        player: &str,
        legend: &str,
        totals: LegendTotals,
    ) -> Result<UpsertOutcome, CacheError> {
        self.write_batch(|batch| batch.upsert(player, legend, totals))
    }

    /// Everything queued on the batch commits together when `f` returns `Ok`; any error
    /// rolls the whole batch back.
    pub fn write_batch<T, F>(&self, f: F) -> Result<T, CacheError>
    where
        F: FnOnce(&mut UpsertBatch<'_>) -> Result<T, CacheError>,
    {
        let mut conn = self.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .persist_ctx("begin ingest transaction")?;
        let mut batch = UpsertBatch {
            tx,
            recorded_at: Utc::now(),
            inserted: 0,
            updated: 0,
        };
        let out = f(&mut batch)?;
        debug!(
            inserted = batch.inserted,
            updated = batch.updated,
            "committing legend batch"
        );
        batch.tx.commit().persist_ctx("commit ingest transaction")?;
        Ok(out)
    }

    pub fn lookup(&self, player: &str, legend: &str) -> Result<LegendStat, CacheError> {
        let (player, legend) = (normalize_name(player), normalize_name(legend));
        let conn = self.lock();
        conn.query_row(
            &format!(
                "SELECT {SELECT_COLUMNS} FROM legend_stats
                 WHERE player_name = ?1 AND legend_name = ?2"
            ),
            params![player, legend],
            row_to_stat,
        )
        .optional()
        .persist_ctx("query legend row")?
        .ok_or_else(|| CacheError::not_found(player, legend))
    }

    pub fn list_player(&self, player: &str) -> Result<Vec<LegendStat>, CacheError> {
        let player = normalize_name(player);
        let conn = self.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM legend_stats
                 WHERE player_name = ?1
                 ORDER BY legend_name ASC"
            ))
            .persist_ctx("prepare list legends query")?;
        let rows = stmt
            .query_map(params![player], row_to_stat)
            .persist_ctx("query player legends")?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.persist_ctx("decode legend row")?);
        }
        Ok(out)
    }

    pub fn delete(&self, player: &str, legend: &str) -> Result<(), CacheError> {
        let (player, legend) = (normalize_name(player), normalize_name(legend));
        let conn = self.lock();
        let removed = conn
            .execute(
                "DELETE FROM legend_stats WHERE player_name = ?1 AND legend_name = ?2",
                params![player, legend],
            )
            .persist_ctx("delete legend row")?;
        if removed == 0 {
            return Err(CacheError::not_found(player, legend));
        }
        info!(player, legend, "legend row deleted");
        Ok(())
    }
}

pub struct UpsertBatch<'conn> {
    tx: Transaction<'conn>,
    recorded_at: DateTime<Utc>,
    inserted: usize,
    updated: usize,
}

impl UpsertBatch<'_> {
    pub fn upsert(
        &mut self,
        player: &str,
        legend: &str,
        totals: LegendTotals,
    ) -> Result<UpsertOutcome, CacheError> {
        let (player, legend) = (normalize_name(player), normalize_name(legend));
        let existing = self
            .tx
            .query_row(
                "SELECT id FROM legend_stats WHERE player_name = ?1 AND legend_name = ?2",
                params![player, legend],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .persist_ctx("look up legend row")?;

        // ON CONFLICT keeps a racing writer on another connection from ever adding a
        // second row for the key; it simply takes the update path.
        self.tx
            .execute(
                r#"
                INSERT INTO legend_stats (
                    player_name, legend_name, kills, wins, damage, recorded_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(player_name, legend_name) DO UPDATE SET
                    kills = excluded.kills,
                    wins = excluded.wins,
                    damage = excluded.damage,
                    recorded_at = MAX(legend_stats.recorded_at, excluded.recorded_at)
                "#,
                params![
                    player,
                    legend,
                    to_sql_count(totals.kills),
                    to_sql_count(totals.wins),
                    to_sql_count(totals.damage),
                    format_timestamp(self.recorded_at),
                ],
            )
            .persist_ctx("upsert legend row")?;

        if existing.is_some() {
            self.updated += 1;
            Ok(UpsertOutcome::Updated)
        } else {
            self.inserted += 1;
            Ok(UpsertOutcome::Inserted)
        }
    }

    pub fn inserted(&self) -> usize {
        self.inserted
    }

    pub fn updated(&self) -> usize {
        self.updated
    }
}

// Every key that reaches SQL goes through here, so rows written by ingestion are the
// same rows that lookups and deletes address.
fn normalize_name(name: &str) -> &str {
    name.trim()
}

fn init_schema(conn: &Connection) -> Result<(), CacheError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS legend_stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_name TEXT NOT NULL,
            legend_name TEXT NOT NULL,
            kills INTEGER NOT NULL DEFAULT 0,
            wins INTEGER NOT NULL DEFAULT 0,
            damage INTEGER NOT NULL DEFAULT 0,
            recorded_at TEXT NOT NULL,
            UNIQUE(player_name, legend_name)
        );
        CREATE INDEX IF NOT EXISTS idx_legend_stats_player ON legend_stats(player_name);
        "#,
    )
    .persist_ctx("create sqlite schema")
}

fn row_to_stat(row: &Row<'_>) -> rusqlite::Result<LegendStat> {
    let raw_recorded: String = row.get(6)?;
    let recorded_at = DateTime::parse_from_rfc3339(&raw_recorded)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(err)))?;
    Ok(LegendStat {
        id: row.get(0)?,
        player_name: row.get(1)?,
        legend_name: row.get(2)?,
        kills: from_sql_count(row.get(3)?),
        wins: from_sql_count(row.get(4)?),
        damage: from_sql_count(row.get(5)?),
        recorded_at,
    })
}

/// Fixed-width UTC text so that SQLite's string `MAX` orders timestamps correctly.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_sql_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_sql_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}
