//! Storage for finished hands.
//!
//! Records are flat text keyed by hand id, so a single table (or a vector)
//! is all either backend needs.
use std::path::Path;
use std::sync::{Mutex, MutexGuard, RwLock};

use holdem_engine::logger::HandHistory;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

pub trait HistoryRepository: Send + Sync {
    /// Stores a finished hand. Ids are unique.
    fn save(&self, history: &HandHistory) -> Result<(), HistoryError>;

    fn get(&self, id: &str) -> Result<Option<HandHistory>, HistoryError>;

    /// All stored hands, oldest first.
    fn list(&self) -> Result<Vec<HandHistory>, HistoryError>;
}

#[derive(Debug, Default)]
pub struct MemoryHistory {
    hands: RwLock<Vec<HandHistory>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryRepository for MemoryHistory {
    fn save(&self, history: &HandHistory) -> Result<(), HistoryError> {
        let mut hands = self
            .hands
            .write()
            .map_err(|_| HistoryError::StoragePoisoned)?;
        if hands.iter().any(|h| h.id == history.id) {
            return Err(HistoryError::Duplicate(history.id.clone()));
        }
        hands.push(history.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<HandHistory>, HistoryError> {
        let hands = self
            .hands
            .read()
            .map_err(|_| HistoryError::StoragePoisoned)?;
        Ok(hands.iter().find(|h| h.id == id).cloned())
    }

    fn list(&self) -> Result<Vec<HandHistory>, HistoryError> {
        self.hands
            .read()
            .map(|hands| hands.clone())
            .map_err(|_| HistoryError::StoragePoisoned)
    }
}

/// SQLite-backed history. One connection, serialized behind a mutex.
#[derive(Debug)]
pub struct SqliteHistory {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS hands (
    id TEXT NOT NULL PRIMARY KEY,
    stack TEXT NOT NULL,
    hands TEXT NOT NULL,
    actions TEXT NOT NULL,
    result TEXT NOT NULL,
    ts TEXT
)";

impl SqliteHistory {
    /// Opens (or creates) the database at `path`, creating parent
    /// directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    HistoryError::Storage(format!(
                        "failed to create directory for {}: {}",
                        path.display(),
                        e
                    ))
                })?;
            }
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self, HistoryError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, HistoryError> {
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, HistoryError> {
        self.conn.lock().map_err(|_| HistoryError::StoragePoisoned)
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HandHistory> {
        Ok(HandHistory {
            id: row.get(0)?,
            main_info: row.get(1)?,
            dealt: row.get(2)?,
            actions: row.get(3)?,
            result: row.get(4)?,
            ts: row.get(5)?,
        })
    }
}

impl HistoryRepository for SqliteHistory {
    fn save(&self, history: &HandHistory) -> Result<(), HistoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO hands (id, stack, hands, actions, result, ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &history.id,
                &history.main_info,
                &history.dealt,
                &history.actions,
                &history.result,
                &history.ts
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                HistoryError::Duplicate(history.id.clone())
            } else {
                HistoryError::from(e)
            }
        })?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<HandHistory>, HistoryError> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                "SELECT id, stack, hands, actions, result, ts FROM hands WHERE id = ?1",
                params![id],
                Self::from_row,
            )
            .optional()?;
        Ok(found)
    }

    fn list(&self) -> Result<Vec<HandHistory>, HistoryError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, stack, hands, actions, result, ts FROM hands ORDER BY rowid")?;
        let rows = stmt.query_map([], Self::from_row)?;
        let mut hands = Vec::new();
        for row in rows {
            hands.push(row?);
        }
        Ok(hands)
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(info, _)
            if info.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History storage failure: {0}")]
    Storage(String),
    #[error("Hand {0} is already recorded")]
    Duplicate(String),
    #[error("History storage poisoned")]
    StoragePoisoned,
}

impl From<rusqlite::Error> for HistoryError {
    fn from(e: rusqlite::Error) -> Self {
        HistoryError::Storage(e.to_string())
    }
}

impl crate::errors::IntoErrorResponse for HistoryError {
    fn status_code(&self) -> warp::http::StatusCode {
        use warp::http::StatusCode;
        match self {
            HistoryError::Duplicate(_) => StatusCode::CONFLICT,
            HistoryError::Storage(_) | HistoryError::StoragePoisoned => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            HistoryError::Duplicate(_) => "duplicate_hand",
            HistoryError::Storage(_) | HistoryError::StoragePoisoned => "persistence_failure",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn severity(&self) -> crate::errors::ErrorSeverity {
        use crate::errors::ErrorSeverity;
        match self {
            HistoryError::StoragePoisoned => ErrorSeverity::Critical,
            HistoryError::Storage(_) => ErrorSeverity::Server,
            HistoryError::Duplicate(_) => ErrorSeverity::Client,
        }
    }
}
