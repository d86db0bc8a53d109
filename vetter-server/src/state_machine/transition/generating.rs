//! Generating state transitions.

use super::{ignore_stale, unhandled, TransitionResult};
use crate::state_machine::effect::{Effect, LogLevel};
use crate::state_machine::event::Event;
use crate::state_machine::state::SessionState;

/// Handle transitions from the Generating state.
///
/// The question-generation call is outstanding. Being in this state is
/// itself the lock against a second concurrent generation: the start trigger
/// is simply not available here.
pub fn handle(state: SessionState, event: Event) -> TransitionResult {
    match (&state, event) {
        (SessionState::Generating { candidate }, Event::QuestionsReady { questions }) => {
            let Some(first) = questions.first() else {
                return TransitionResult::no_change(SessionState::Idle {
                    error: Some("The assistant returned an empty question list.".to_string()),
                });
            };

            let first_difficulty = first.difficulty;
            TransitionResult::new(
                SessionState::InProgress {
                    candidate: candidate.clone(),
                    questions,
                    answers: vec![],
                    current_index: 0,
                },
                vec![Effect::StartAnswerTimer {
                    question_index: 0,
                    difficulty: first_difficulty,
                }],
            )
        }

        (SessionState::Generating { .. }, Event::GenerationFailed { error }) => {
            TransitionResult::no_change(SessionState::Idle { error: Some(error) })
        }

        // A second start request while generation is already underway.
        (SessionState::Generating { .. }, Event::InterviewStarted) => TransitionResult::new(
            state.clone(),
            vec![Effect::Log {
                level: LogLevel::Info,
                message: "Ignoring duplicate start request while generating".to_string(),
            }],
        ),

        (
            SessionState::Generating { .. },
            event @ (Event::ExtractionSucceeded { .. }
            | Event::ExtractionFailed { .. }
            | Event::ScoringSucceeded { .. }
            | Event::ScoringFailed { .. }
            | Event::AnswerSubmitted { .. }),
        ) => ignore_stale(&state, &event),

        (_, event) => unhandled(&state, &event),
    }
}
