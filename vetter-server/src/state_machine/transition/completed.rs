//! Completed state transitions.
//!
//! Completed is terminal for the transcript itself; what still moves is the
//! finalize step. Scoring results flow in here, and a scoring failure leaves
//! the session completed but retryable - the transcript is never rolled
//! back.

use super::{ignore_stale, unhandled, TransitionResult};
use crate::state_machine::effect::{Effect, LogLevel};
use crate::state_machine::event::Event;
use crate::state_machine::state::{FinalizeStatus, SessionState};

pub fn handle(state: SessionState, event: Event) -> TransitionResult {
    match (&state, event) {
        (
            SessionState::Completed {
                candidate,
                questions,
                answers,
                finalize: FinalizeStatus::Pending,
            },
            Event::ScoringSucceeded { score, summary },
        ) => TransitionResult::new(
            SessionState::Completed {
                candidate: candidate.clone(),
                questions: questions.clone(),
                answers: answers.clone(),
                finalize: FinalizeStatus::Scored { score },
            },
            vec![Effect::ArchiveCandidate {
                candidate: candidate.clone(),
                questions: questions.clone(),
                answers: answers.clone(),
                score,
                summary,
            }],
        ),

        (
            SessionState::Completed {
                candidate,
                questions,
                answers,
                finalize: FinalizeStatus::Pending,
            },
            Event::ScoringFailed { error },
        ) => TransitionResult::no_change(SessionState::Completed {
            candidate: candidate.clone(),
            questions: questions.clone(),
            answers: answers.clone(),
            finalize: FinalizeStatus::Failed { error },
        }),

        (
            SessionState::Completed {
                candidate,
                questions,
                answers,
                finalize: FinalizeStatus::Failed { .. },
            },
            Event::ScoringRetryRequested,
        ) => TransitionResult::new(
            SessionState::Completed {
                candidate: candidate.clone(),
                questions: questions.clone(),
                answers: answers.clone(),
                finalize: FinalizeStatus::Pending,
            },
            vec![Effect::ScoreTranscript {
                questions: questions.clone(),
                answers: answers.clone(),
            }],
        ),

        // Retry while a scoring call is already in flight, or after success.
        (SessionState::Completed { finalize, .. }, Event::ScoringRetryRequested) => {
            TransitionResult::new(
                state.clone(),
                vec![Effect::Log {
                    level: LogLevel::Info,
                    message: format!("Ignoring scoring retry: {}", finalize),
                }],
            )
        }

        // A scoring result when none is outstanding (e.g. a duplicate).
        (
            SessionState::Completed { .. },
            event @ (Event::ScoringSucceeded { .. } | Event::ScoringFailed { .. }),
        ) => ignore_stale(&state, &event),

        (
            SessionState::Completed { .. },
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

    fn completed(finalize: FinalizeStatus) -> SessionState {
        SessionState::Completed {
            candidate: complete_candidate(),
            questions: sample_questions(),
            answers: (0..6).map(|i| format!("answer {}", i)).collect(),
            finalize,
        }
    }

    #[test]
    fn test_scoring_success_archives_candidate() {
        let result = handle(
            completed(FinalizeStatus::Pending),
            Event::ScoringSucceeded {
                score: 82,
                summary: "Solid fundamentals.".to_string(),
            },
        );

        assert!(matches!(
            result.state,
            SessionState::Completed {
                finalize: FinalizeStatus::Scored { score: 82 },
                ..
            }
        ));
        assert!(matches!(
            &result.effects[0],
            Effect::ArchiveCandidate { score: 82, .. }
        ));
    }

    #[test]
    fn test_scoring_failure_keeps_session_completed() {
        let result = handle(
            completed(FinalizeStatus::Pending),
            Event::ScoringFailed {
                error: "scoring call timed out".to_string(),
            },
        );

        assert_eq!(result.state.status_name(), "completed");
        assert_eq!(result.state.answers().len(), 6, "transcript is never rolled back");
        assert_eq!(result.state.error(), Some("scoring call timed out"));
    }

    #[test]
    fn test_retry_after_failure_rescores() {
        let result = handle(
            completed(FinalizeStatus::Failed {
                error: "timeout".to_string(),
            }),
            Event::ScoringRetryRequested,
        );

        assert!(matches!(
            result.state,
            SessionState::Completed {
                finalize: FinalizeStatus::Pending,
                ..
            }
        ));
        assert!(matches!(result.effects[0], Effect::ScoreTranscript { .. }));
    }

    #[test]
    fn test_retry_after_success_is_noop() {
        let before = completed(FinalizeStatus::Scored { score: 90 });
        let result = handle(before.clone(), Event::ScoringRetryRequested);

        assert_eq!(result.state, before);
        assert!(
            !result
                .effects
                .iter()
                .any(|e| matches!(e, Effect::ScoreTranscript { .. })),
            "an already-scored session must not be rescored"
        );
    }

    #[test]
    fn test_duplicate_scoring_result_ignored() {
        let before = completed(FinalizeStatus::Scored { score: 90 });
        let result = handle(
            before.clone(),
            Event::ScoringSucceeded {
                score: 10,
                summary: "late duplicate".to_string(),
            },
        );

        assert_eq!(result.state, before, "a late duplicate must not overwrite the score");
        assert!(
            !result
                .effects
                .iter()
                .any(|e| matches!(e, Effect::ArchiveCandidate { .. })),
            "a late duplicate must not archive again"
        );
    }

    #[test]
    fn test_late_timer_answer_ignored_after_completion() {
        let before = completed(FinalizeStatus::Pending);
        let result = handle(
            before.clone(),
            Event::AnswerSubmitted {
                question_index: 5,
                text: "No answer provided.".to_string(),
            },
        );

        assert_eq!(result.state, before);
        assert_eq!(result.state.answers().len(), 6);
    }
}
