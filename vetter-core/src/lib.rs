pub mod assistant;
pub mod types;

pub use assistant::{AssistantApi, GeminiClient};
pub use types::{CandidateField, CandidateInfo, Difficulty, Question, ResumeFile, ScoreCard};
