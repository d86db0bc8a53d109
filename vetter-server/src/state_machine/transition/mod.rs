//! Pure state transition function.
//!
//! The transition function is the core of the state machine. It takes the
//! current state and an event, and returns the new state and a list of
//! effects. This function has NO side effects - it is pure and deterministic.
//!
//! Each state has its own handler module with co-located tests:
//! - `idle`: rest state, upload entry point
//! - `parsing`: résumé extraction outstanding
//! - `awaiting_info`: missing contact fields being filled in
//! - `ready`: confirmed, waiting to start
//! - `generating`: question generation outstanding
//! - `in_progress`: timed question/answer loop
//! - `completed`: terminal transcript state and finalize tracking

mod awaiting_info;
mod completed;
mod generating;
mod idle;
mod in_progress;
mod parsing;
mod ready;

use super::effect::{Effect, LogLevel};
use super::event::Event;
use super::state::SessionState;

/// Result of a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// The new state after the transition.
    pub state: SessionState,
    /// Effects to execute.
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }

    pub fn no_change(state: SessionState) -> Self {
        Self {
            state,
            effects: vec![],
        }
    }
}

/// Pure state transition function.
///
/// Given the current state and an event, returns the new state and effects
/// to execute. Unlisted (state, event) pairs are no-ops that emit a log
/// effect, which is what makes duplicate and late events harmless.
pub fn transition(state: SessionState, event: Event) -> TransitionResult {
    // Restart is a full reset from every state; it is the recovery path
    // out of every error state and must be idempotent.
    if matches!(event, Event::SessionRestarted) {
        return reset_session();
    }

    match &state {
        SessionState::Idle { .. } => idle::handle(state, event),
        SessionState::Parsing => parsing::handle(state, event),
        SessionState::AwaitingInfo { .. } => awaiting_info::handle(state, event),
        SessionState::Ready { .. } => ready::handle(state, event),
        SessionState::Generating { .. } => generating::handle(state, event),
        SessionState::InProgress { .. } => in_progress::handle(state, event),
        SessionState::Completed { .. } => completed::handle(state, event),
    }
}

/// Full reset back to the empty session, stopping any running timer.
pub(crate) fn reset_session() -> TransitionResult {
    TransitionResult::new(
        SessionState::idle(),
        vec![
            Effect::CancelAnswerTimer,
            Effect::Log {
                level: LogLevel::Info,
                message: "Session reset".to_string(),
            },
        ],
    )
}

/// A result event arrived for a call the session is no longer waiting on.
pub(crate) fn ignore_stale(state: &SessionState, event: &Event) -> TransitionResult {
    let message = format!(
        "Ignoring stale {} in {} state",
        event.log_summary(),
        state.status_name()
    );
    TransitionResult::new(
        state.clone(),
        vec![Effect::Log {
            level: LogLevel::Info,
            message,
        }],
    )
}

/// Catch-all for triggers that are not available from the current state.
pub(crate) fn unhandled(state: &SessionState, event: &Event) -> TransitionResult {
    let message = format!(
        "Unavailable trigger {} in {} state",
        event.log_summary(),
        state.status_name()
    );
    TransitionResult::new(
        state.clone(),
        vec![Effect::Log {
            level: LogLevel::Warn,
            message,
        }],
    )
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::state_machine::state::FinalizeStatus;
    use vetter_core::types::CandidateField;

    /// Drive a fresh session to the start of the interview.
    fn in_progress_session() -> SessionState {
        let state = SessionState::InProgress {
            candidate: complete_candidate(),
            questions: sample_questions(),
            answers: vec![],
            current_index: 0,
        };
        assert!(state.is_in_progress());
        state
    }

    #[test]
    fn test_scenario_a_complete_extraction_goes_ready() {
        let result = transition(
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
    }

    #[test]
    fn test_scenario_b_partial_extraction_then_confirm() {
        let result = transition(
            SessionState::Parsing,
            Event::ExtractionSucceeded {
                candidate: partial_candidate(),
            },
        );
        assert_eq!(result.state.status_name(), "awaiting_info");

        let result = transition(
            result.state,
            Event::FieldEdited {
                field: CandidateField::Email,
                value: "a@x.com".to_string(),
            },
        );
        assert_eq!(result.state.status_name(), "awaiting_info");

        let result = transition(result.state, Event::DetailsConfirmed);
        assert_eq!(result.state.status_name(), "ready");
        assert_eq!(
            result.state.candidate().and_then(|c| c.email.as_deref()),
            Some("a@x.com")
        );
    }

    #[test]
    fn test_scenario_c_last_answer_completes() {
        let questions = sample_questions();
        let state = SessionState::InProgress {
            candidate: complete_candidate(),
            questions: questions.clone(),
            answers: (0..5).map(|i| format!("answer {}", i)).collect(),
            current_index: 5,
        };

        let result = transition(
            state,
            Event::AnswerSubmitted {
                question_index: 5,
                text: "x".to_string(),
            },
        );

        assert_eq!(result.state.status_name(), "completed");
        assert_eq!(result.state.answers().len(), 6);
        assert!(result
            .effects
            .iter()
            .any(|e| matches!(e, Effect::ScoreTranscript { .. })));
    }

    #[test]
    fn test_scenario_d_duplicate_answer_is_noop() {
        let state = in_progress_session();

        // Manual submit for question 0.
        let result = transition(
            state,
            Event::AnswerSubmitted {
                question_index: 0,
                text: "first".to_string(),
            },
        );
        assert_eq!(result.state.current_index(), Some(1));
        assert_eq!(result.state.answers().len(), 1);

        // The timer for question 0 fires late: same index, already advanced.
        let result = transition(
            result.state,
            Event::AnswerSubmitted {
                question_index: 0,
                text: "No answer provided.".to_string(),
            },
        );
        assert_eq!(result.state.current_index(), Some(1));
        assert_eq!(
            result.state.answers(),
            &["first".to_string()],
            "late duplicate must not append a second answer for one question"
        );
    }

    #[test]
    fn test_restart_is_idempotent_from_every_state() {
        let states = vec![
            SessionState::Idle {
                error: Some("boom".to_string()),
            },
            SessionState::Parsing,
            SessionState::AwaitingInfo {
                candidate: partial_candidate(),
                error: Some(crate::state_machine::state::MISSING_FIELDS_ERROR.to_string()),
            },
            SessionState::Ready {
                candidate: complete_candidate(),
            },
            SessionState::Generating {
                candidate: complete_candidate(),
            },
            in_progress_session(),
            SessionState::Completed {
                candidate: complete_candidate(),
                questions: sample_questions(),
                answers: (0..6).map(|i| format!("a{}", i)).collect(),
                finalize: FinalizeStatus::Pending,
            },
        ];

        for state in states {
            let once = transition(state.clone(), Event::SessionRestarted);
            assert_eq!(once.state, SessionState::idle(), "from {:?}", state);

            let twice = transition(once.state, Event::SessionRestarted);
            assert_eq!(twice.state, SessionState::idle());
        }
    }

    #[test]
    fn test_full_happy_path_invariants() {
        let mut state = SessionState::idle();
        let script = vec![
            Event::ResumeUploaded {
                resume: sample_resume(),
            },
            Event::ExtractionSucceeded {
                candidate: complete_candidate(),
            },
            Event::InterviewStarted,
            Event::QuestionsReady {
                questions: sample_questions(),
            },
        ];
        for event in script {
            state = transition(state, event).state;
            assert_invariants(&state);
        }

        for i in 0..6 {
            state = transition(
                state,
                Event::AnswerSubmitted {
                    question_index: i,
                    text: format!("answer {}", i),
                },
            )
            .state;
            assert_invariants(&state);
        }

        assert_eq!(state.status_name(), "completed");
        assert_eq!(state.answers().len(), 6);
    }

    fn assert_invariants(state: &SessionState) {
        match state {
            SessionState::InProgress {
                questions,
                answers,
                current_index,
                ..
            } => {
                assert_eq!(
                    answers.len(),
                    *current_index,
                    "answers must track the pointer while in progress"
                );
                assert!(*current_index < questions.len());
            }
            SessionState::Completed {
                questions, answers, ..
            } => {
                assert_eq!(answers.len(), questions.len());
            }
            _ => {
                assert!(state.answers().is_empty());
            }
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arbitrary_event() -> impl Strategy<Value = Event> {
            let fixed = proptest::sample::select(vec![
                Event::ResumeUploaded {
                    resume: sample_resume(),
                },
                Event::ExtractionSucceeded {
                    candidate: complete_candidate(),
                },
                Event::ExtractionSucceeded {
                    candidate: partial_candidate(),
                },
                Event::ExtractionFailed {
                    error: "parse error".to_string(),
                },
                Event::FieldEdited {
                    field: CandidateField::Email,
                    value: "a@x.com".to_string(),
                },
                Event::DetailsConfirmed,
                Event::InterviewCancelled,
                Event::InterviewStarted,
                Event::QuestionsReady {
                    questions: sample_questions(),
                },
                Event::GenerationFailed {
                    error: "model unavailable".to_string(),
                },
                Event::ScoringSucceeded {
                    score: 80,
                    summary: "Solid".to_string(),
                },
                Event::ScoringFailed {
                    error: "timeout".to_string(),
                },
                Event::ScoringRetryRequested,
                Event::SessionRestarted,
            ]);

            let answers = (0usize..8, "[a-z ]{0,8}").prop_map(|(question_index, text)| {
                Event::AnswerSubmitted {
                    question_index,
                    text,
                }
            });

            prop_oneof![3 => fixed, 2 => answers]
        }

        proptest! {
            /// For all sequences of triggers, the
            /// answers/pointer invariant holds while in progress, and the
            /// transcript is exactly full when completed.
            #[test]
            fn invariants_hold_for_all_trigger_sequences(
                events in proptest::collection::vec(arbitrary_event(), 0..60)
            ) {
                let mut state = SessionState::idle();
                for event in events {
                    state = transition(state, event).state;
                    assert_invariants(&state);
                }
            }
        }
    }
}
