//! InProgress state transitions.

use super::{ignore_stale, unhandled, TransitionResult};
use crate::state_machine::effect::{Effect, LogLevel};
use crate::state_machine::event::Event;
use crate::state_machine::state::{FinalizeStatus, SessionState};

/// Handle transitions from the InProgress state.
///
/// Answers arrive either from the candidate or from the expiring countdown;
/// both carry the index of the question they answer. An index that does not
/// match the pointer is a late duplicate (timer-after-manual-submit race)
/// and is discarded, which keeps the `answers.len() == current_index`
/// invariant intact no matter how events interleave.
pub fn handle(state: SessionState, event: Event) -> TransitionResult {
    match (&state, event) {
        (
            SessionState::InProgress {
                candidate,
                questions,
                answers,
                current_index,
            },
            Event::AnswerSubmitted {
                question_index,
                text,
            },
        ) => {
            if question_index != *current_index {
                return TransitionResult::new(
                    state.clone(),
                    vec![Effect::Log {
                        level: LogLevel::Info,
                        message: format!(
                            "Ignoring answer for question {} while on question {}",
                            question_index, current_index
                        ),
                    }],
                );
            }

            let mut answers = answers.clone();
            answers.push(text);

            let next_index = current_index + 1;
            if next_index < questions.len() {
                let next_difficulty = questions[next_index].difficulty;
                TransitionResult::new(
                    SessionState::InProgress {
                        candidate: candidate.clone(),
                        questions: questions.clone(),
                        answers,
                        current_index: next_index,
                    },
                    vec![
                        Effect::CancelAnswerTimer,
                        Effect::StartAnswerTimer {
                            question_index: next_index,
                            difficulty: next_difficulty,
                        },
                    ],
                )
            } else {
                TransitionResult::new(
                    SessionState::Completed {
                        candidate: candidate.clone(),
                        questions: questions.clone(),
                        answers: answers.clone(),
                        finalize: FinalizeStatus::Pending,
                    },
                    vec![
                        Effect::CancelAnswerTimer,
                        Effect::ScoreTranscript {
                            questions: questions.clone(),
                            answers,
                        },
                    ],
                )
            }
        }

        (
            SessionState::InProgress { .. },
            event @ (Event::ExtractionSucceeded { .. }
            | Event::ExtractionFailed { .. }
            | Event::QuestionsReady { .. }
            | Event::GenerationFailed { .. }
            | Event::ScoringSucceeded { .. }
            | Event::ScoringFailed { .. }),
        ) => ignore_stale(&state, &event),

        (_, event) => unhandled(&state, &event),
    }
}
