//! Per-question answer countdown.
//!
//! The session store only ever sees `AnswerSubmitted` events; this module
//! owns the countdown that produces them when the candidate runs out of
//! time. At most one countdown is active at a time, and starting the next
//! question (or resetting the session) aborts the previous task, so a stale
//! timer can never tick into the next question's slot. The event also
//! carries the question index it was armed for, so even a task that loses
//! the abort race is discarded by the reducer.

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::state_machine::event::{Event, NO_ANSWER_TEXT};

struct ActiveTimer {
    question_index: usize,
    handle: JoinHandle<()>,
}

/// Registry for the active answer countdown.
#[derive(Default)]
pub struct AnswerTimers {
    active: Mutex<Option<ActiveTimer>>,
}

impl AnswerTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the countdown for a question, replacing any countdown already
    /// running. When the window elapses, a sentinel answer for exactly this
    /// question index is sent into the event channel.
    pub fn start(&self, question_index: usize, window: Duration, events_tx: mpsc::Sender<Event>) {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            debug!(question_index, "answer window elapsed");
            let _ = events_tx
                .send(Event::AnswerSubmitted {
                    question_index,
                    text: NO_ANSWER_TEXT.to_string(),
                })
                .await;
        });

        let mut slot = self.active.lock().expect("mutex poisoned");
        if let Some(previous) = slot.replace(ActiveTimer {
            question_index,
            handle,
        }) {
            previous.handle.abort();
        }
    }

    /// Stop the countdown, if one is running.
    pub fn cancel(&self) {
        let mut slot = self.active.lock().expect("mutex poisoned");
        if let Some(previous) = slot.take() {
            debug!(question_index = previous.question_index, "answer timer cancelled");
            previous.handle.abort();
        }
    }

    /// Index of the question currently being timed, if any.
    pub fn active_question(&self) -> Option<usize> {
        let slot = self.active.lock().expect("mutex poisoned");
        slot.as_ref().map(|t| t.question_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test(start_paused = true)]
    async fn test_expiry_submits_sentinel_answer() {
        let timers = AnswerTimers::new();
        let (tx, mut rx) = mpsc::channel(8);

        timers.start(2, Duration::from_secs(20), tx);

        let event = timeout(Duration::from_secs(30), rx.recv())
            .await
            .expect("timer should fire within the window")
            .expect("channel open");

        assert_eq!(
            event,
            Event::AnswerSubmitted {
                question_index: 2,
                text: NO_ANSWER_TEXT.to_string(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_expiry() {
        let timers = AnswerTimers::new();
        let (tx, mut rx) = mpsc::channel(8);

        timers.start(0, Duration::from_secs(20), tx);
        timers.cancel();
        assert_eq!(timers.active_question(), None);

        let outcome = timeout(Duration::from_secs(60), rx.recv()).await;
        assert!(outcome.is_err(), "cancelled timer must not deliver a tick");
    }

    #[tokio::test(start_paused = true)]
    async fn test_starting_next_question_replaces_previous_timer() {
        let timers = AnswerTimers::new();
        let (tx, mut rx) = mpsc::channel(8);

        timers.start(0, Duration::from_secs(20), tx.clone());
        timers.start(1, Duration::from_secs(60), tx);
        assert_eq!(timers.active_question(), Some(1));

        let event = timeout(Duration::from_secs(120), rx.recv())
            .await
            .expect("replacement timer should fire")
            .expect("channel open");

        assert_eq!(
            event,
            Event::AnswerSubmitted {
                question_index: 1,
                text: NO_ANSWER_TEXT.to_string(),
            },
            "only the replacement timer may tick"
        );

        let extra = timeout(Duration::from_secs(120), rx.recv()).await;
        assert!(extra.is_err(), "the replaced timer must stay silent");
    }
}
