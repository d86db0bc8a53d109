//! SQLite persistence layer for the session and the candidate archive.
//!
//! This module provides durable storage for the single live session and the
//! append-only archive of finished candidates, enabling restart safety. The
//! session is stored in a fixed single-row table (the namespace key) with
//! explicit columns per state variant; the variable-length question and
//! answer lists are JSON text columns.
//!
//! # Schema Versioning
//!
//! The database uses SQLite's `user_version` pragma to track schema
//! versions. When the schema changes, increment `SCHEMA_VERSION` and add a
//! migration function in `run_migrations`.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use vetter_core::types::{CandidateInfo, Question};

use crate::archive::{CandidateId, CandidateRecord};
use crate::state_machine::state::{FinalizeStatus, SessionState};

/// Current schema version. Increment when making schema changes.
const SCHEMA_VERSION: i32 = 1;

/// Row id of the single session record (the fixed namespace key).
const SESSION_ROW_ID: i64 = 1;

/// SQLite database for persisting the session and the candidate archive.
///
/// Uses a `Mutex<Connection>` because `rusqlite::Connection` is not `Sync`.
/// Callers should wrap operations in `tokio::task::spawn_blocking` for async
/// compatibility.
pub struct SqliteDb {
    conn: Mutex<Connection>,
}

impl SqliteDb {
    /// Open or create the database file at the given path.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite database at {:?}", path))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;

        Ok(db)
    }

    /// Create an in-memory database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;

        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().expect("mutex poisoned");

        let current_version: i32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        if current_version > SCHEMA_VERSION {
            anyhow::bail!(
                "Database schema version {} is newer than supported version {}. \
                 Please upgrade the application.",
                current_version,
                SCHEMA_VERSION
            );
        }

        if current_version < SCHEMA_VERSION {
            Self::run_migrations(&conn, current_version)?;
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }

        Ok(())
    }

    fn run_migrations(conn: &Connection, from_version: i32) -> Result<()> {
        if from_version < 1 {
            Self::migrate_v0_to_v1(conn)?;
        }

        Ok(())
    }

    fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS session (
                -- Single fixed row: the session namespace key.
                id INTEGER PRIMARY KEY CHECK (id = 1),

                state_type TEXT NOT NULL CHECK(state_type IN (
                    'idle', 'parsing', 'awaiting_info', 'ready',
                    'generating', 'in_progress', 'completed'
                )),
                error TEXT,
                updated_at TEXT NOT NULL,

                -- Candidate contact fields
                name TEXT,
                email TEXT,
                phone TEXT,

                -- Interview content (JSON lists)
                questions TEXT,
                answers TEXT,
                current_idx INTEGER,

                -- Completed state: finalize tracking
                finalize_type TEXT CHECK(finalize_type IS NULL OR finalize_type IN (
                    'pending', 'scored', 'failed'
                )),
                finalize_score INTEGER,
                finalize_error TEXT
            );

            CREATE TABLE IF NOT EXISTS candidates (
                -- Candidate email; the primary key is the archive guard.
                email TEXT PRIMARY KEY,
                name TEXT,
                phone TEXT,
                questions TEXT NOT NULL,
                answers TEXT NOT NULL,
                score INTEGER NOT NULL,
                summary TEXT NOT NULL,
                completed_at TEXT NOT NULL
            );
            "#,
        )
        .context("Failed to create initial schema (v0 -> v1)")?;

        Ok(())
    }

    /// Insert or update the session row.
    pub fn save_session(&self, state: &SessionState) -> Result<()> {
        let conn = self.conn.lock().expect("mutex poisoned");

        let state_type = state.status_name();
        let error = match state {
            SessionState::Idle { error } | SessionState::AwaitingInfo { error, .. } => {
                error.as_deref()
            }
            _ => None,
        };

        let (name, email, phone) = match state.candidate() {
            Some(candidate) => (
                candidate.name.as_deref(),
                candidate.email.as_deref(),
                candidate.phone.as_deref(),
            ),
            None => (None, None, None),
        };

        let questions = match state {
            SessionState::InProgress { questions, .. }
            | SessionState::Completed { questions, .. } => Some(
                serde_json::to_string(questions).context("Failed to serialize questions")?,
            ),
            _ => None,
        };

        let answers = match state {
            SessionState::InProgress { answers, .. } | SessionState::Completed { answers, .. } => {
                Some(serde_json::to_string(answers).context("Failed to serialize answers")?)
            }
            _ => None,
        };

        let current_idx = state.current_index().map(|i| i as i64);

        let (finalize_type, finalize_score, finalize_error) = match state {
            SessionState::Completed { finalize, .. } => match finalize {
                FinalizeStatus::Pending => (Some("pending"), None, None),
                FinalizeStatus::Scored { score } => (Some("scored"), Some(*score as i64), None),
                FinalizeStatus::Failed { error } => (Some("failed"), None, Some(error.as_str())),
            },
            _ => (None, None, None),
        };

        conn.execute(
            r#"
            INSERT INTO session (
                id, state_type, error, updated_at,
                name, email, phone,
                questions, answers, current_idx,
                finalize_type, finalize_score, finalize_error
            )
            VALUES (?1, ?2, ?3, datetime('now'), ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT (id)
            DO UPDATE SET
                state_type = excluded.state_type,
                error = excluded.error,
                updated_at = excluded.updated_at,
                name = excluded.name,
                email = excluded.email,
                phone = excluded.phone,
                questions = excluded.questions,
                answers = excluded.answers,
                current_idx = excluded.current_idx,
                finalize_type = excluded.finalize_type,
                finalize_score = excluded.finalize_score,
                finalize_error = excluded.finalize_error
            "#,
            rusqlite::params![
                SESSION_ROW_ID,
                state_type,
                error,
                name,
                email,
                phone,
                questions,
                answers,
                current_idx,
                finalize_type,
                finalize_score,
                finalize_error,
            ],
        )
        .context("Failed to upsert session state")?;

        Ok(())
    }

    /// Load the persisted session, if one exists.
    pub fn load_session(&self) -> Result<Option<SessionState>> {
        let conn = self.conn.lock().expect("mutex poisoned");

        let row = conn
            .query_row(
                r#"
                SELECT
                    state_type, error,
                    name, email, phone,
                    questions, answers, current_idx,
                    finalize_type, finalize_score, finalize_error
                FROM session
                WHERE id = ?1
                "#,
                rusqlite::params![SESSION_ROW_ID],
                |row| {
                    Ok(SessionRow {
                        state_type: row.get(0)?,
                        error: row.get(1)?,
                        name: row.get(2)?,
                        email: row.get(3)?,
                        phone: row.get(4)?,
                        questions: row.get(5)?,
                        answers: row.get(6)?,
                        current_idx: row.get(7)?,
                        finalize_type: row.get(8)?,
                        finalize_score: row.get(9)?,
                        finalize_error: row.get(10)?,
                    })
                },
            )
            .optional()
            .context("Failed to load session state")?;

        row.map(row_to_state).transpose()
    }

    /// Append a candidate record. Returns false when a record with the same
    /// id already exists (the archive guard).
    pub fn insert_candidate(&self, record: &CandidateRecord) -> Result<bool> {
        let conn = self.conn.lock().expect("mutex poisoned");

        let questions =
            serde_json::to_string(&record.questions).context("Failed to serialize questions")?;
        let answers =
            serde_json::to_string(&record.answers).context("Failed to serialize answers")?;

        let rows_affected = conn
            .execute(
                r#"
                INSERT OR IGNORE INTO candidates (
                    email, name, phone, questions, answers, score, summary, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                rusqlite::params![
                    record.id.0,
                    record.candidate.name.as_deref(),
                    record.candidate.phone.as_deref(),
                    questions,
                    answers,
                    record.score as i64,
                    record.summary,
                    record.completed_at.to_rfc3339(),
                ],
            )
            .context("Failed to insert candidate record")?;

        Ok(rows_affected > 0)
    }

    /// Load all candidate records, newest first.
    pub fn load_candidates(&self) -> Result<Vec<CandidateRecord>> {
        let conn = self.conn.lock().expect("mutex poisoned");

        let mut stmt = conn
            .prepare(
                r#"
                SELECT email, name, phone, questions, answers, score, summary, completed_at
                FROM candidates
                ORDER BY rowid DESC
                "#,
            )
            .context("Failed to prepare candidate load statement")?;

        let rows = stmt
            .query_map([], |row| {
                Ok(CandidateRow {
                    email: row.get(0)?,
                    name: row.get(1)?,
                    phone: row.get(2)?,
                    questions: row.get(3)?,
                    answers: row.get(4)?,
                    score: row.get(5)?,
                    summary: row.get(6)?,
                    completed_at: row.get(7)?,
                })
            })
            .context("Failed to query candidate records")?;

        let mut records = Vec::new();
        for row_result in rows {
            let row = row_result.context("Failed to read candidate row")?;
            records.push(row_to_candidate(row)?);
        }

        Ok(records)
    }
}

/// Intermediate struct for reading the session row.
struct SessionRow {
    state_type: String,
    error: Option<String>,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    questions: Option<String>,
    answers: Option<String>,
    current_idx: Option<i64>,
    finalize_type: Option<String>,
    finalize_score: Option<i64>,
    finalize_error: Option<String>,
}

impl SessionRow {
    fn candidate(&self) -> CandidateInfo {
        CandidateInfo {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }

    fn questions(&self) -> Result<Vec<Question>> {
        let raw = self
            .questions
            .as_deref()
            .ok_or_else(|| anyhow!("{} state missing questions", self.state_type))?;
        serde_json::from_str(raw).context("Failed to parse stored questions")
    }

    fn answers(&self) -> Result<Vec<String>> {
        let raw = self
            .answers
            .as_deref()
            .ok_or_else(|| anyhow!("{} state missing answers", self.state_type))?;
        serde_json::from_str(raw).context("Failed to parse stored answers")
    }
}

/// Convert a database row to a SessionState.
fn row_to_state(row: SessionRow) -> Result<SessionState> {
    match row.state_type.as_str() {
        "idle" => Ok(SessionState::Idle {
            error: row.error.clone(),
        }),

        "parsing" => Ok(SessionState::Parsing),

        "awaiting_info" => Ok(SessionState::AwaitingInfo {
            candidate: row.candidate(),
            error: row.error.clone(),
        }),

        "ready" => Ok(SessionState::Ready {
            candidate: row.candidate(),
        }),

        "generating" => Ok(SessionState::Generating {
            candidate: row.candidate(),
        }),

        "in_progress" => {
            let current_index = row
                .current_idx
                .ok_or_else(|| anyhow!("in_progress state missing current_idx"))?
                as usize;
            Ok(SessionState::InProgress {
                candidate: row.candidate(),
                questions: row.questions()?,
                answers: row.answers()?,
                current_index,
            })
        }

        "completed" => {
            let finalize_type = row
                .finalize_type
                .as_deref()
                .ok_or_else(|| anyhow!("completed state missing finalize_type"))?;
            let finalize = match finalize_type {
                "pending" => FinalizeStatus::Pending,
                "scored" => FinalizeStatus::Scored {
                    score: row
                        .finalize_score
                        .ok_or_else(|| anyhow!("scored finalize missing score"))?
                        as u8,
                },
                "failed" => FinalizeStatus::Failed {
                    error: row
                        .finalize_error
                        .clone()
                        .ok_or_else(|| anyhow!("failed finalize missing error"))?,
                },
                other => return Err(anyhow!("Unknown finalize_type: {}", other)),
            };

            Ok(SessionState::Completed {
                candidate: row.candidate(),
                questions: row.questions()?,
                answers: row.answers()?,
                finalize,
            })
        }

        other => Err(anyhow!("Unknown state_type: {}", other)),
    }
}

/// Intermediate struct for reading a candidate row.
struct CandidateRow {
    email: String,
    name: Option<String>,
    phone: Option<String>,
    questions: String,
    answers: String,
    score: i64,
    summary: String,
    completed_at: String,
}

fn row_to_candidate(row: CandidateRow) -> Result<CandidateRecord> {
    let questions: Vec<Question> =
        serde_json::from_str(&row.questions).context("Failed to parse stored questions")?;
    let answers: Vec<String> =
        serde_json::from_str(&row.answers).context("Failed to parse stored answers")?;
    let completed_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&row.completed_at)
        .with_context(|| format!("Invalid completed_at timestamp: {}", row.completed_at))?
        .with_timezone(&Utc);

    Ok(CandidateRecord {
        id: CandidateId(row.email.clone()),
        candidate: CandidateInfo {
            name: row.name,
            email: Some(row.email),
            phone: row.phone,
        },
        questions,
        answers,
        score: row.score as u8,
        summary: row.summary,
        completed_at,
    })
}
