//! Parsing state transitions.

use super::{ignore_stale, unhandled, TransitionResult};
use crate::state_machine::effect::{Effect, LogLevel};
use crate::state_machine::event::Event;
use crate::state_machine::state::SessionState;

/// Handle transitions from the Parsing state.
///
/// A résumé has been uploaded and the extraction call is outstanding. The
/// session routes on the result: fully extracted details go straight to
/// Ready, gaps drop into AwaitingInfo, failure falls back to Idle with the
/// message.
pub fn handle(state: SessionState, event: Event) -> TransitionResult {
    match (&state, event) {
        (SessionState::Parsing, Event::ExtractionSucceeded { candidate }) => {
            let next = if candidate.is_complete() {
                SessionState::Ready { candidate }
            } else {
                SessionState::AwaitingInfo {
                    candidate,
                    error: None,
                }
            };
            TransitionResult::no_change(next)
        }

        (SessionState::Parsing, Event::ExtractionFailed { error }) => {
            TransitionResult::no_change(SessionState::Idle { error: Some(error) })
        }

        // A second upload while one is already being analysed.
        (SessionState::Parsing, Event::ResumeUploaded { .. }) => TransitionResult::new(
            state.clone(),
            vec![Effect::Log {
                level: LogLevel::Info,
                message: "Ignoring duplicate upload while parsing".to_string(),
            }],
        ),

        (
            SessionState::Parsing,
            event @ (Event::QuestionsReady { .. }
            | Event::GenerationFailed { .. }
            | Event::ScoringSucceeded { .. }
            | Event::ScoringFailed { .. }
            | Event::AnswerSubmitted { .. }),
        ) => ignore_stale(&state, &event),

        (_, event) => unhandled(&state, &event),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_complete_extraction_goes_ready() {
        let result = handle(
            SessionState::Parsing,
            Event::ExtractionSucceeded {
                candidate: complete_candidate(),
            },
        );

        assert_eq!(
            result.state,
            SessionState::Ready {
                candidate: complete_candidate(),
            }
        );
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_partial_extraction_awaits_info() {
        let result = handle(
            SessionState::Parsing,
            Event::ExtractionSucceeded {
                candidate: partial_candidate(),
            },
        );

        assert_eq!(
            result.state,
            SessionState::AwaitingInfo {
                candidate: partial_candidate(),
                error: None,
            }
        );
    }

    #[test]
    fn test_extraction_failure_returns_to_idle_with_message() {
        let result = handle(
            SessionState::Parsing,
            Event::ExtractionFailed {
                error: "not a readable document".to_string(),
            },
        );

        assert_eq!(
            result.state,
            SessionState::Idle {
                error: Some("not a readable document".to_string()),
            }
        );
    }

    #[test]
    fn test_duplicate_upload_while_parsing_ignored() {
        let result = handle(
            SessionState::Parsing,
            Event::ResumeUploaded {
                resume: sample_resume(),
            },
        );

        assert_eq!(result.state, SessionState::Parsing);
        assert!(
            !result
                .effects
                .iter()
                .any(|e| matches!(e, Effect::ExtractCandidateInfo { .. })),
            "must not start a second extraction call"
        );
    }
}
