//! In-memory store for the live session.
//!
//! This module owns the single live `SessionState` and integrates the
//! transition function with the effect interpreter: an incoming event is
//! transitioned, its effects executed, and any result events fed back
//! through the transition until the queue drains.
//!
//! The store itself does not serialize callers; `PersistentSessionStore`
//! wraps it with the single-writer gate and write-through persistence.

use tokio::sync::RwLock;
use tracing::info;

use super::event::Event;
use super::interpreter::{execute_effects, InterpreterContext};
use super::state::SessionState;
use super::transition::{transition, TransitionResult};

/// In-memory holder of the live session.
pub struct SessionStore {
    state: RwLock<SessionState>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_state(SessionState::idle())
    }

    pub fn with_state(state: SessionState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Read-only snapshot of the current session.
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Replace the session state.
    pub async fn set(&self, state: SessionState) {
        *self.state.write().await = state;
    }

    /// Process an event: transition the state and execute effects.
    ///
    /// This is the main entry point for handling events. It:
    /// 1. Reads the current state
    /// 2. Runs the transition function
    /// 3. Executes effects via the interpreter
    /// 4. Handles result events recursively
    /// 5. Stores the final state
    ///
    /// Returns the final state after all transitions.
    pub async fn process_event(&self, event: Event, ctx: &InterpreterContext) -> SessionState {
        let mut current_state = self.snapshot().await;

        // Event loop: process the initial event and any result events from
        // effects.
        let mut events_to_process = vec![event];

        while let Some(event) = events_to_process.pop() {
            info!(
                "Processing event {} in state {}",
                event.log_summary(),
                current_state.status_name()
            );

            let TransitionResult { state, effects } = transition(current_state, event);
            current_state = state;

            if !effects.is_empty() {
                let result_events = execute_effects(ctx, effects).await;

                // Push in reverse so they are processed in order.
                for result_event in result_events.into_iter().rev() {
                    events_to_process.push(result_event);
                }
            }
        }

        self.set(current_state.clone()).await;

        info!("Final session state: {}", current_state.status_name());

        current_state
    }
}

#[cfg(test)]
mod tests {
    use super::super::interpreter::test_support::{
        complete_candidate, test_context, StubAssistant,
    };
    use super::super::state::FinalizeStatus;
    use super::*;
    use anyhow::anyhow;
    use vetter_core::types::ResumeFile;

    fn upload() -> Event {
        Event::ResumeUploaded {
            resume: ResumeFile::new("resume.pdf", b"%PDF-1.4".to_vec()),
        }
    }

    #[tokio::test]
    async fn test_upload_runs_extraction_to_ready() {
        let (ctx, _rx) = test_context(StubAssistant::happy()).await;
        let store = SessionStore::new();

        let state = store.process_event(upload(), &ctx).await;

        // The extraction result event is processed in the same loop.
        assert_eq!(
            state,
            SessionState::Ready {
                candidate: complete_candidate(),
            }
        );
        assert_eq!(store.snapshot().await, state);
    }

    #[tokio::test]
    async fn test_extraction_failure_lands_idle_with_error() {
        let mut assistant = StubAssistant::happy();
        assistant.extraction = Err(anyhow!("unreadable"));
        let (ctx, _rx) = test_context(assistant).await;
        let store = SessionStore::new();

        let state = store.process_event(upload(), &ctx).await;

        assert_eq!(state.status_name(), "idle");
        assert!(state.error().unwrap().contains("unreadable"));
    }

    #[tokio::test]
    async fn test_full_interview_reaches_archive() {
        let (ctx, _rx) = test_context(StubAssistant::happy()).await;
        let store = SessionStore::new();

        store.process_event(upload(), &ctx).await;
        let state = store.process_event(Event::InterviewStarted, &ctx).await;
        assert_eq!(state.status_name(), "in_progress");
        assert_eq!(
            ctx.timers.active_question(),
            Some(0),
            "first question countdown must be armed"
        );

        let mut state = state;
        for i in 0..6 {
            state = store
                .process_event(
                    Event::AnswerSubmitted {
                        question_index: i,
                        text: format!("answer {}", i),
                    },
                    &ctx,
                )
                .await;
        }

        // Completion runs scoring and archiving inside the same event loop.
        assert!(matches!(
            state,
            SessionState::Completed {
                finalize: FinalizeStatus::Scored { score: 82 },
                ..
            }
        ));
        assert_eq!(ctx.timers.active_question(), None, "countdown must be stopped");
        assert_eq!(ctx.directory.len().await, 1);
        assert!(ctx.directory.get("alice.j@example.com").await.is_some());
    }

    #[tokio::test]
    async fn test_scoring_failure_is_retryable() {
        let mut assistant = StubAssistant::happy();
        assistant.score = Err(anyhow!("timeout"));
        let (ctx, _rx) = test_context(assistant).await;
        let store = SessionStore::new();

        store.process_event(upload(), &ctx).await;
        store.process_event(Event::InterviewStarted, &ctx).await;
        let mut state = store.snapshot().await;
        for i in 0..6 {
            state = store
                .process_event(
                    Event::AnswerSubmitted {
                        question_index: i,
                        text: format!("answer {}", i),
                    },
                    &ctx,
                )
                .await;
        }

        assert!(matches!(
            state,
            SessionState::Completed {
                finalize: FinalizeStatus::Failed { .. },
                ..
            }
        ));
        assert_eq!(ctx.directory.len().await, 0, "nothing archived on failure");

        // Retry against a healthy assistant.
        let (healthy_ctx, _rx) = test_context(StubAssistant::happy()).await;
        let state = store
            .process_event(Event::ScoringRetryRequested, &healthy_ctx)
            .await;

        assert!(matches!(
            state,
            SessionState::Completed {
                finalize: FinalizeStatus::Scored { score: 82 },
                ..
            }
        ));
        assert_eq!(healthy_ctx.directory.len().await, 1);
    }

    #[tokio::test]
    async fn test_restart_resets_everything() {
        let (ctx, _rx) = test_context(StubAssistant::happy()).await;
        let store = SessionStore::new();

        store.process_event(upload(), &ctx).await;
        store.process_event(Event::InterviewStarted, &ctx).await;
        assert_eq!(ctx.timers.active_question(), Some(0));

        let state = store.process_event(Event::SessionRestarted, &ctx).await;

        assert_eq!(state, SessionState::idle());
        assert_eq!(ctx.timers.active_question(), None);
    }
}
