//! AwaitingInfo state transitions.

use super::{ignore_stale, unhandled, TransitionResult};
use crate::state_machine::effect::{Effect, LogLevel};
use crate::state_machine::event::Event;
use crate::state_machine::state::{SessionState, MISSING_FIELDS_ERROR};

/// Handle transitions from the AwaitingInfo state.
///
/// Extraction left gaps; the candidate fills them in and confirms. Only
/// fields the extraction left empty are editable - values that came out of
/// the résumé are not overridable from the form.
pub fn handle(state: SessionState, event: Event) -> TransitionResult {
    match (&state, event) {
        (SessionState::AwaitingInfo { candidate, error }, Event::FieldEdited { field, value }) => {
            if candidate.get(field).is_some() {
                return TransitionResult::new(
                    state.clone(),
                    vec![Effect::Log {
                        level: LogLevel::Info,
                        message: format!("Ignoring edit to already-extracted field {}", field),
                    }],
                );
            }

            let value = value.trim().to_string();
            if value.is_empty() {
                return TransitionResult::new(
                    state.clone(),
                    vec![Effect::Log {
                        level: LogLevel::Info,
                        message: format!("Ignoring empty value for field {}", field),
                    }],
                );
            }

            let mut candidate = candidate.clone();
            candidate.set(field, value);
            TransitionResult::no_change(SessionState::AwaitingInfo {
                candidate,
                error: error.clone(),
            })
        }

        (SessionState::AwaitingInfo { candidate, .. }, Event::DetailsConfirmed) => {
            if candidate.is_complete() {
                TransitionResult::no_change(SessionState::Ready {
                    candidate: candidate.clone(),
                })
            } else {
                TransitionResult::no_change(SessionState::AwaitingInfo {
                    candidate: candidate.clone(),
                    error: Some(MISSING_FIELDS_ERROR.to_string()),
                })
            }
        }

        (
            SessionState::AwaitingInfo { .. },
            event @ (Event::ExtractionSucceeded { .. }
            | Event::ExtractionFailed { .. }
            | Event::QuestionsReady { .. }
            | Event::GenerationFailed { .. }
            | Event::AnswerSubmitted { .. }),
        ) => ignore_stale(&state, &event),

        (_, event) => unhandled(&state, &event),
    }
}
