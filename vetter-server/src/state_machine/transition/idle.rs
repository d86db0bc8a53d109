//! Idle state transitions.

use super::{ignore_stale, unhandled, TransitionResult};
use crate::state_machine::effect::Effect;
use crate::state_machine::event::Event;
use crate::state_machine::state::SessionState;

/// Handle transitions from the Idle state.
///
/// Idle is the rest state: either a fresh session or one knocked back here
/// by a failed extraction/generation attempt. The only way forward is a
/// résumé upload, which also clears any previous error.
pub fn handle(state: SessionState, event: Event) -> TransitionResult {
    match (&state, event) {
        (SessionState::Idle { .. }, Event::ResumeUploaded { resume }) => TransitionResult::new(
            SessionState::Parsing,
            vec![Effect::ExtractCandidateInfo { resume }],
        ),

        // Results from calls issued by an earlier, since-reset session.
        (
            SessionState::Idle { .. },
            event @ (Event::ExtractionSucceeded { .. }
            | Event::ExtractionFailed { .. }
            | Event::QuestionsReady { .. }
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
    fn test_upload_starts_parsing_and_clears_error() {
        let state = SessionState::Idle {
            error: Some("previous failure".to_string()),
        };

        let result = handle(
            state,
            Event::ResumeUploaded {
                resume: sample_resume(),
            },
        );

        assert_eq!(result.state, SessionState::Parsing);
        assert_eq!(result.effects.len(), 1);
        assert!(matches!(
            result.effects[0],
            Effect::ExtractCandidateInfo { .. }
        ));
    }

    #[test]
    fn test_stale_extraction_result_ignored() {
        let state = SessionState::idle();

        let result = handle(
            state.clone(),
            Event::ExtractionSucceeded {
                candidate: complete_candidate(),
            },
        );

        assert_eq!(result.state, state);
        assert!(matches!(result.effects[0], Effect::Log { .. }));
    }

    #[test]
    fn test_stale_answer_after_restart_ignored() {
        let state = SessionState::idle();

        let result = handle(
            state.clone(),
            Event::AnswerSubmitted {
                question_index: 3,
                text: "No answer provided.".to_string(),
            },
        );

        assert_eq!(result.state, state);
    }

    #[test]
    fn test_confirm_unavailable_from_idle() {
        let result = handle(SessionState::idle(), Event::DetailsConfirmed);
        assert_eq!(result.state, SessionState::idle());
        assert!(matches!(result.effects[0], Effect::Log { .. }));
    }
}
