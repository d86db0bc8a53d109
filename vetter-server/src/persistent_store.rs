//! Persistent session store backed by SQLite.
//!
//! This module wraps the in-memory `SessionStore` with SQLite persistence,
//! providing restart safety for the interview session.
//!
//! # Concurrency
//!
//! All transitions are applied atomically with respect to each other: a
//! single async mutex serializes the whole transition-effect-result loop
//! together with its DB write, so concurrent HTTP requests and timer
//! expiries can never interleave transitions or land DB writes out of order.
//!
//! # Startup contract
//!
//! On rehydration, a session that was `in_progress` puts the store into a
//! resume-pending state: every event except a restart is rejected until the
//! resume-or-restart decision arrives. States whose outstanding collaborator
//! call died with the process are recovered to an actionable state first.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::db::SqliteDb;
use crate::state_machine::effect::Effect;
use crate::state_machine::event::Event;
use crate::state_machine::interpreter::{execute_effects, InterpreterContext};
use crate::state_machine::state::{FinalizeStatus, SessionState};
use crate::state_machine::store::SessionStore;

pub struct PersistentSessionStore {
    memory_store: SessionStore,
    db: Arc<SqliteDb>,
    /// Serializes the memory mutation and its DB write.
    gate: Mutex<()>,
    /// Set when a rehydrated in-progress session awaits the candidate's
    /// resume-or-restart decision.
    resume_pending: RwLock<bool>,
}

impl PersistentSessionStore {
    /// Open the store over an already-opened database, rehydrating the
    /// persisted session (if any) before returning.
    pub async fn open(db: Arc<SqliteDb>) -> Result<Self> {
        let db_clone = db.clone();
        let persisted = tokio::task::spawn_blocking(move || db_clone.load_session())
            .await
            .context("spawn_blocking panicked")?
            .context("Failed to load session from database")?;

        let (state, resume_pending) = match persisted {
            Some(state) => {
                info!("Rehydrated session in state {}", state.status_name());
                let recovered = recover(state);
                let resume_pending = recovered.is_in_progress();
                (recovered, resume_pending)
            }
            None => (SessionState::idle(), false),
        };

        let store = Self {
            memory_store: SessionStore::with_state(state.clone()),
            db,
            gate: Mutex::new(()),
            resume_pending: RwLock::new(resume_pending),
        };

        // Recovery may have rewritten the state; make the DB match before
        // anything else happens.
        store.persist(&state).await;

        Ok(store)
    }

    /// In-memory database variant (for testing).
    pub async fn open_in_memory() -> Result<Self> {
        Self::open(Arc::new(SqliteDb::new_in_memory()?)).await
    }

    /// Read-only snapshot of the current session.
    pub async fn snapshot(&self) -> SessionState {
        self.memory_store.snapshot().await
    }

    /// True while the rehydrated session awaits a resume-or-restart
    /// decision.
    pub async fn resume_pending(&self) -> bool {
        *self.resume_pending.read().await
    }

    /// Process an event: transition, execute effects, persist.
    ///
    /// While a resume decision is pending, every event except a restart is
    /// rejected unchanged.
    pub async fn process_event(&self, event: Event, ctx: &InterpreterContext) -> SessionState {
        let _guard = self.gate.lock().await;

        let is_restart = matches!(event, Event::SessionRestarted);
        if *self.resume_pending.read().await && !is_restart {
            warn!(
                "Rejecting {} while a resume decision is pending",
                event.log_summary()
            );
            return self.memory_store.snapshot().await;
        }

        let final_state = self.memory_store.process_event(event, ctx).await;

        if is_restart {
            *self.resume_pending.write().await = false;
        }

        self.persist(&final_state).await;
        final_state
    }

    /// The candidate chose to resume the rehydrated session: the session is
    /// left untouched and the countdown for the current question restarts.
    pub async fn resolve_resume(&self, ctx: &InterpreterContext) -> SessionState {
        let _guard = self.gate.lock().await;

        *self.resume_pending.write().await = false;

        let state = self.memory_store.snapshot().await;
        if let SessionState::InProgress {
            questions,
            current_index,
            ..
        } = &state
        {
            info!("Resuming interview at question {}", current_index);
            execute_effects(
                ctx,
                vec![Effect::StartAnswerTimer {
                    question_index: *current_index,
                    difficulty: questions[*current_index].difficulty,
                }],
            )
            .await;
        }

        state
    }

    async fn persist(&self, state: &SessionState) {
        let db = self.db.clone();
        let state = state.clone();

        let result = tokio::task::spawn_blocking(move || db.save_session(&state)).await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Failed to persist session state: {}", e),
            Err(e) => error!("spawn_blocking panicked while persisting session: {}", e),
        }
    }
}

/// Repair a rehydrated state whose outstanding collaborator call died with
/// the process. Each suspension state maps to the state its failure handler
/// would have produced, so the UI always lands somewhere actionable.
fn recover(state: SessionState) -> SessionState {
    match state {
        SessionState::Parsing => SessionState::Idle {
            error: Some(
                "Resume analysis was interrupted by a restart. Please upload the resume again."
                    .to_string(),
            ),
        },
        SessionState::Generating { .. } => SessionState::Idle {
            error: Some(
                "Question generation was interrupted by a restart. Please try again.".to_string(),
            ),
        },
        SessionState::Completed {
            candidate,
            questions,
            answers,
            finalize: FinalizeStatus::Pending,
        } => SessionState::Completed {
            candidate,
            questions,
            answers,
            finalize: FinalizeStatus::Failed {
                error: "Scoring was interrupted by a restart.".to_string(),
            },
        },
        other => other,
    }
}
