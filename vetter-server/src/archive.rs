//! Completed-session archive.
//!
//! One immutable record per finished candidate, keyed by email, newest
//! first. The archive is append-only: records are created once, when a
//! session finalizes, and there is no edit or delete operation. Inserting an
//! id that is already present is a no-op, which is what makes repeated
//! finalize attempts for the same session safe.
//!
//! The dashboard never reads the backing list directly; it goes through
//! `query`, a derived view recomputed on demand with a case-insensitive name
//! filter and a stable sort.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info};
use vetter_core::types::{CandidateInfo, Question};

use crate::db::SqliteDb;

/// Newtype for the archive key (candidate email).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CandidateId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CandidateId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CandidateId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One finished candidate session. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateRecord {
    pub id: CandidateId,
    pub candidate: CandidateInfo,
    pub questions: Vec<Question>,
    pub answers: Vec<String>,
    pub score: u8,
    pub summary: String,
    pub completed_at: DateTime<Utc>,
}

/// Sort key for the dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Score,
    Date,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(Self::Name),
            "score" => Some(Self::Score),
            "date" => Some(Self::Date),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(Self::Ascending),
            "desc" => Some(Self::Descending),
            _ => None,
        }
    }

    fn apply(&self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// Filter and sort configuration for the dashboard view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveQuery {
    /// Case-insensitive substring match against the candidate name.
    pub search: Option<String>,
    pub sort: SortKey,
    pub direction: SortDirection,
}

impl Default for ArchiveQuery {
    // The dashboard opens on score, best first.
    fn default() -> Self {
        Self {
            search: None,
            sort: SortKey::Score,
            direction: SortDirection::Descending,
        }
    }
}

/// Derived dashboard view: summary stats over the whole archive plus the
/// filtered, sorted records.
#[derive(Debug, Clone)]
pub struct ArchiveView {
    pub total: usize,
    pub average_score: Option<u32>,
    pub records: Vec<CandidateRecord>,
}

/// The completed-session archive, newest first, write-through persisted.
pub struct CandidateDirectory {
    records: RwLock<Vec<CandidateRecord>>,
    db: Arc<SqliteDb>,
}

impl CandidateDirectory {
    /// Load the archive from the database.
    pub async fn load(db: Arc<SqliteDb>) -> Result<Self> {
        let db_clone = db.clone();
        let records = tokio::task::spawn_blocking(move || db_clone.load_candidates())
            .await
            .context("spawn_blocking panicked")?
            .context("Failed to load candidate archive")?;

        info!("Loaded {} archived candidates", records.len());

        Ok(Self {
            records: RwLock::new(records),
            db,
        })
    }

    /// Append a record to the front of the archive.
    ///
    /// Returns false without touching anything when a record with the same
    /// id already exists.
    pub async fn insert(&self, record: CandidateRecord) -> bool {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == record.id) {
            info!("Candidate {} already archived, skipping", record.id);
            return false;
        }
        records.insert(0, record.clone());
        drop(records);

        let db = self.db.clone();
        let result = tokio::task::spawn_blocking(move || db.insert_candidate(&record)).await;
        match result {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => error!("Failed to persist candidate record: {}", e),
            Err(e) => error!("spawn_blocking panicked while persisting candidate: {}", e),
        }

        true
    }

    /// Look up a single record by id.
    pub async fn get(&self, id: &str) -> Option<CandidateRecord> {
        let records = self.records.read().await;
        records.iter().find(|r| r.id.0 == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Recompute the dashboard view.
    ///
    /// The sort is stable over the newest-first backing list, so equal keys
    /// fall back to insertion order. Sorting by score additionally breaks
    /// ties by completion date, oldest first.
    pub async fn query(&self, query: &ArchiveQuery) -> ArchiveView {
        let records = self.records.read().await;

        let total = records.len();
        let average_score = if total > 0 {
            let sum: u32 = records.iter().map(|r| r.score as u32).sum();
            Some((sum as f64 / total as f64).round() as u32)
        } else {
            None
        };

        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut filtered: Vec<CandidateRecord> = records
            .iter()
            .filter(|record| match &needle {
                None => true,
                Some(needle) => record
                    .candidate
                    .name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(needle)),
            })
            .cloned()
            .collect();
        drop(records);

        filtered.sort_by(|a, b| {
            let primary = match query.sort {
                SortKey::Name => {
                    let a_name = a.candidate.name.as_deref().unwrap_or("");
                    let b_name = b.candidate.name.as_deref().unwrap_or("");
                    a_name.cmp(b_name)
                }
                SortKey::Score => a.score.cmp(&b.score),
                SortKey::Date => a.completed_at.cmp(&b.completed_at),
            };
            let primary = query.direction.apply(primary);

            match query.sort {
                SortKey::Score => primary.then(a.completed_at.cmp(&b.completed_at)),
                _ => primary,
            }
        });

        ArchiveView {
            total,
            average_score,
            records: filtered,
        }
    }
}
