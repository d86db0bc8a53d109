//! Ready state transitions.

use super::{ignore_stale, unhandled, TransitionResult};
use crate::state_machine::effect::Effect;
use crate::state_machine::event::Event;
use crate::state_machine::state::SessionState;

/// Handle transitions from the Ready state.
///
/// Contact details are confirmed. The candidate either starts the interview
/// (kicking off question generation) or cancels back to an empty session.
pub fn handle(state: SessionState, event: Event) -> TransitionResult {
    match (&state, event) {
        (SessionState::Ready { candidate }, Event::InterviewStarted) => TransitionResult::new(
            SessionState::Generating {
                candidate: candidate.clone(),
            },
            vec![Effect::GenerateQuestions],
        ),

        (SessionState::Ready { .. }, Event::InterviewCancelled) => {
            TransitionResult::no_change(SessionState::idle())
        }

        (
            SessionState::Ready { .. },
            event @ (Event::ExtractionSucceeded { .. }
            | Event::ExtractionFailed { .. }
            | Event::QuestionsReady { .. }
            | Event::GenerationFailed { .. }
            | Event::AnswerSubmitted { .. }),
        ) => ignore_stale(&state, &event),

        (_, event) => unhandled(&state, &event),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn ready() -> SessionState {
        SessionState::Ready {
            candidate: complete_candidate(),
        }
    }

    #[test]
    fn test_start_begins_generation() {
        let result = handle(ready(), Event::InterviewStarted);

        assert_eq!(
            result.state,
            SessionState::Generating {
                candidate: complete_candidate(),
            }
        );
        assert_eq!(result.effects, vec![Effect::GenerateQuestions]);
    }

    #[test]
    fn test_cancel_discards_candidate() {
        let result = handle(ready(), Event::InterviewCancelled);

        assert_eq!(result.state, SessionState::idle());
        assert!(result.state.candidate().is_none());
    }

    #[test]
    fn test_stale_generation_result_ignored() {
        let result = handle(
            ready(),
            Event::QuestionsReady {
                questions: sample_questions(),
            },
        );

        assert_eq!(result.state, ready());
        assert!(matches!(result.effects[0], Effect::Log { .. }));
    }
}
