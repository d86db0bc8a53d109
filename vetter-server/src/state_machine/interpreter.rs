//! Effect interpreter that executes effects against the real collaborators.
//!
//! The interpreter is the boundary between the pure state machine and the
//! impure world: the assistant API, the answer countdown, and the candidate
//! archive. It takes effects (descriptions of what to do) and executes them,
//! returning result events. Collaborator failures become failure events, not
//! errors - the transition function decides what a failure means.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use vetter_core::assistant::AssistantApi;

use super::effect::{Effect, LogLevel};
use super::event::Event;
use crate::archive::{CandidateDirectory, CandidateId, CandidateRecord};
use crate::timer::AnswerTimers;

/// Context needed by the interpreter to execute effects.
pub struct InterpreterContext {
    pub assistant: Arc<dyn AssistantApi>,
    pub timers: Arc<AnswerTimers>,
    pub directory: Arc<CandidateDirectory>,
    /// Channel the answer timer delivers expiry events into.
    pub events_tx: mpsc::Sender<Event>,
}

/// Result of executing an effect.
#[derive(Debug)]
pub enum EffectResult {
    /// Effect completed, produced result events.
    Ok(Vec<Event>),
    /// Effect failed with an error.
    Err(String),
}

impl EffectResult {
    pub fn single(event: Event) -> Self {
        Self::Ok(vec![event])
    }

    pub fn none() -> Self {
        Self::Ok(vec![])
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self::Err(msg.into())
    }
}

/// Execute a list of effects and collect result events.
///
/// Effects are executed sequentially. If an effect fails, execution
/// continues with remaining effects, and the error is logged.
pub async fn execute_effects(ctx: &InterpreterContext, effects: Vec<Effect>) -> Vec<Event> {
    let mut result_events = Vec::new();

    for effect in effects {
        match execute_effect(ctx, effect).await {
            EffectResult::Ok(events) => result_events.extend(events),
            EffectResult::Err(err) => {
                error!("Effect execution failed: {}", err);
            }
        }
    }

    result_events
}

/// Execute a single effect.
async fn execute_effect(ctx: &InterpreterContext, effect: Effect) -> EffectResult {
    match effect {
        Effect::ExtractCandidateInfo { resume } => {
            info!("Extracting contact fields from {}", resume.file_name);
            match ctx.assistant.extract_candidate_info(&resume).await {
                Ok(candidate) => EffectResult::single(Event::ExtractionSucceeded { candidate }),
                Err(e) => EffectResult::single(Event::ExtractionFailed {
                    error: format!("Failed to analyze the resume: {}", e),
                }),
            }
        }

        Effect::GenerateQuestions => {
            info!("Generating interview questions");
            match ctx.assistant.generate_questions().await {
                Ok(questions) => EffectResult::single(Event::QuestionsReady { questions }),
                Err(e) => EffectResult::single(Event::GenerationFailed {
                    error: format!("Failed to generate interview questions: {}", e),
                }),
            }
        }

        Effect::ScoreTranscript { questions, answers } => {
            info!("Scoring transcript of {} answers", answers.len());
            match ctx.assistant.score_transcript(&questions, &answers).await {
                Ok(card) => EffectResult::single(Event::ScoringSucceeded {
                    score: card.score,
                    summary: card.summary,
                }),
                Err(e) => EffectResult::single(Event::ScoringFailed {
                    error: format!("Failed to score the interview: {}", e),
                }),
            }
        }

        Effect::ArchiveCandidate {
            candidate,
            questions,
            answers,
            score,
            summary,
        } => {
            let Some(email) = candidate
                .email
                .clone()
                .filter(|email| !email.trim().is_empty())
            else {
                return EffectResult::err("Cannot archive a candidate without an email");
            };

            let record = CandidateRecord {
                id: CandidateId(email),
                candidate,
                questions,
                answers,
                score,
                summary,
                completed_at: Utc::now(),
            };

            let id = record.id.clone();
            if ctx.directory.insert(record).await {
                info!("Archived candidate {}", id);
            }
            EffectResult::none()
        }

        Effect::StartAnswerTimer {
            question_index,
            difficulty,
        } => {
            ctx.timers.start(
                question_index,
                difficulty.answer_window(),
                ctx.events_tx.clone(),
            );
            EffectResult::none()
        }

        Effect::CancelAnswerTimer => {
            ctx.timers.cancel();
            EffectResult::none()
        }

        Effect::Log { level, message } => {
            match level {
                LogLevel::Debug => tracing::debug!("{}", message),
                LogLevel::Info => info!("{}", message),
                LogLevel::Warn => warn!("{}", message),
                LogLevel::Error => error!("{}", message),
            }
            EffectResult::none()
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use vetter_core::types::{
        CandidateInfo, Difficulty, Question, ResumeFile, ScoreCard,
    };

    use crate::db::SqliteDb;

    /// Scripted assistant for tests: each call returns a preset outcome.
    pub struct StubAssistant {
        pub extraction: Result<CandidateInfo>,
        pub questions: Result<Vec<Question>>,
        pub score: Result<ScoreCard>,
    }

    impl StubAssistant {
        pub fn happy() -> Self {
            Self {
                extraction: Ok(complete_candidate()),
                questions: Ok(six_questions()),
                score: Ok(ScoreCard {
                    score: 82,
                    summary: "Solid fundamentals.".to_string(),
                }),
            }
        }
    }

    fn clone_result<T: Clone>(result: &Result<T>) -> Result<T> {
        match result {
            Ok(value) => Ok(value.clone()),
            Err(e) => Err(anyhow!("{}", e)),
        }
    }

    #[async_trait]
    impl AssistantApi for StubAssistant {
        async fn extract_candidate_info(&self, _resume: &ResumeFile) -> Result<CandidateInfo> {
            clone_result(&self.extraction)
        }

        async fn generate_questions(&self) -> Result<Vec<Question>> {
            clone_result(&self.questions)
        }

        async fn score_transcript(
            &self,
            _questions: &[Question],
            _answers: &[String],
        ) -> Result<ScoreCard> {
            clone_result(&self.score)
        }
    }

    pub fn complete_candidate() -> CandidateInfo {
        CandidateInfo {
            name: Some("Alice Johnson".to_string()),
            email: Some("alice.j@example.com".to_string()),
            phone: Some("123-456-7890".to_string()),
        }
    }

    pub fn six_questions() -> Vec<Question> {
        let tiers = [
            Difficulty::Easy,
            Difficulty::Easy,
            Difficulty::Medium,
            Difficulty::Medium,
            Difficulty::Hard,
            Difficulty::Hard,
        ];
        tiers
            .iter()
            .enumerate()
            .map(|(i, difficulty)| Question {
                id: i as u32 + 1,
                text: format!("Question {}", i + 1),
                difficulty: *difficulty,
            })
            .collect()
    }

    pub async fn test_context(assistant: StubAssistant) -> (InterpreterContext, mpsc::Receiver<Event>) {
        let db = Arc::new(SqliteDb::new_in_memory().expect("in-memory db"));
        let directory = Arc::new(
            CandidateDirectory::load(db)
                .await
                .expect("empty archive"),
        );
        let (events_tx, events_rx) = mpsc::channel(16);

        let ctx = InterpreterContext {
            assistant: Arc::new(assistant),
            timers: Arc::new(AnswerTimers::new()),
            directory,
            events_tx,
        };
        (ctx, events_rx)
    }
}
