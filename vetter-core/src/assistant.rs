//! Generative-assistant client.
//!
//! The single point of entry for all generative-API calls: résumé field
//! extraction, question generation, and transcript scoring. The engine
//! contributes no intelligence of its own: this module builds the prompts,
//! ships them to the hosted model, and parses the structured replies.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{CandidateInfo, Difficulty, Question, ResumeFile, ScoreCard};

/// Default hosted-model endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model for all three calls.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Number of questions in a full interview.
pub const QUESTION_COUNT: usize = 6;

/// Questions per difficulty tier (two each of Easy/Medium/Hard).
pub const QUESTIONS_PER_TIER: usize = 2;

/// The three asynchronous collaborator calls the session engine consumes.
///
/// The engine only ever talks to this trait, so tests can substitute a
/// scripted stub for the hosted model.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Best-effort contact-field extraction from a résumé document.
    /// Any of the returned fields may be absent.
    async fn extract_candidate_info(&self, resume: &ResumeFile) -> Result<CandidateInfo>;

    /// Generate a full interview: exactly six questions, two per difficulty
    /// tier, with unique ids 1..=6.
    async fn generate_questions(&self) -> Result<Vec<Question>>;

    /// Score a finished transcript and write a short assessment.
    async fn score_transcript(
        &self,
        questions: &[Question],
        answers: &[String],
    ) -> Result<ScoreCard>;
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn inline_data(mime_type: &str, data: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: BASE64.encode(data),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            response_mime_type: "application/json".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Extracts the text of the first text part, if any.
    fn text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .parts
            .iter()
            .find_map(|p| p.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// =============================================================================
// Client
// =============================================================================

/// Client for the hosted generative model.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(api_key, DEFAULT_BASE_URL.to_string(), DEFAULT_MODEL.to_string())
    }

    pub fn with_endpoint(api_key: String, base_url: String, model: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("vetter/0.1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            base_url,
            model,
        }
    }

    async fn generate_content(&self, parts: Vec<Part>) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig::default(),
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .context("Failed to reach the assistant endpoint")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read assistant response body")?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            bail!("Assistant API error (status {}): {}", status, message);
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).context("Failed to parse assistant response")?;

        debug!(model = %self.model, "assistant call completed");

        parsed
            .text()
            .map(|t| t.to_string())
            .ok_or_else(|| anyhow!("Assistant returned no text content"))
    }
}

#[async_trait]
impl AssistantApi for GeminiClient {
    async fn extract_candidate_info(&self, resume: &ResumeFile) -> Result<CandidateInfo> {
        let parts = vec![
            Part::text(extraction_prompt()),
            Part::inline_data(mime_type_for(&resume.file_name), &resume.data),
        ];
        let text = self.generate_content(parts).await?;
        parse_candidate_info(&text)
    }

    async fn generate_questions(&self) -> Result<Vec<Question>> {
        let text = self
            .generate_content(vec![Part::text(questions_prompt())])
            .await?;
        parse_questions(&text)
    }

    async fn score_transcript(
        &self,
        questions: &[Question],
        answers: &[String],
    ) -> Result<ScoreCard> {
        let text = self
            .generate_content(vec![Part::text(scoring_prompt(questions, answers))])
            .await?;
        parse_score_card(&text)
    }
}

/// Map an uploaded file name to the document MIME type the model expects.
fn mime_type_for(file_name: &str) -> &'static str {
    let lower = file_name.to_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".docx") {
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    } else {
        "application/octet-stream"
    }
}

// =============================================================================
// Prompts
// =============================================================================

fn extraction_prompt() -> String {
    "You are screening a résumé for a full-stack engineering interview. \
     Extract the candidate's contact details from the attached document. \
     Respond with a JSON object with exactly these keys: \
     \"name\", \"email\", \"phone\". \
     Use null for any field the document does not contain. \
     Do not guess or fabricate values."
        .to_string()
}

fn questions_prompt() -> String {
    format!(
        "Generate {count} interview questions for a full-stack (React/Node) \
         engineering role: {per_tier} Easy, {per_tier} Medium, and {per_tier} \
         Hard, in that order. Respond with a JSON array of {count} objects, \
         each with keys \"id\" (integers 1 through {count}, in order), \
         \"text\", and \"difficulty\" (one of \"Easy\", \"Medium\", \"Hard\").",
        count = QUESTION_COUNT,
        per_tier = QUESTIONS_PER_TIER,
    )
}

fn scoring_prompt(questions: &[Question], answers: &[String]) -> String {
    let mut prompt = String::from(
        "You are assessing a completed technical interview for a full-stack \
         engineering role. Judge the transcript below and respond with a JSON \
         object with exactly these keys: \"score\" (an integer from 0 to 100) \
         and \"summary\" (two or three sentences on the candidate's strengths \
         and weaknesses).\n\nTranscript:\n",
    );
    for (question, answer) in questions.iter().zip(answers.iter()) {
        prompt.push_str(&format!(
            "\nQ{} ({}): {}\nAnswer: {}\n",
            question.id, question.difficulty, question.text, answer
        ));
    }
    prompt
}

// =============================================================================
// Response parsing
// =============================================================================

/// Strip a Markdown code fence if the model wrapped its JSON in one.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_candidate_info(text: &str) -> Result<CandidateInfo> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fence(text))
        .context("Extraction reply was not valid JSON")?;

    let field = |key: &str| {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Ok(CandidateInfo {
        name: field("name"),
        email: field("email"),
        phone: field("phone"),
    })
}

fn parse_questions(text: &str) -> Result<Vec<Question>> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fence(text))
        .context("Question reply was not valid JSON")?;

    let items = value
        .as_array()
        .ok_or_else(|| anyhow!("Question reply was not a JSON array"))?;

    if items.len() != QUESTION_COUNT {
        bail!(
            "Expected {} questions, got {}",
            QUESTION_COUNT,
            items.len()
        );
    }

    let mut questions = Vec::with_capacity(QUESTION_COUNT);
    for item in items {
        let id = item
            .get("id")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| anyhow!("Question missing numeric id"))? as u32;
        let text = item
            .get("text")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow!("Question {} missing text", id))?
            .to_string();
        let difficulty_str = item
            .get("difficulty")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("Question {} missing difficulty", id))?;
        let difficulty = Difficulty::parse(difficulty_str)
            .ok_or_else(|| anyhow!("Question {} has unknown difficulty {:?}", id, difficulty_str))?;

        questions.push(Question {
            id,
            text,
            difficulty,
        });
    }

    // Unique ids covering 1..=QUESTION_COUNT.
    let mut ids: Vec<u32> = questions.iter().map(|q| q.id).collect();
    ids.sort_unstable();
    let expected: Vec<u32> = (1..=QUESTION_COUNT as u32).collect();
    if ids != expected {
        bail!("Question ids must be exactly 1..={}, got {:?}", QUESTION_COUNT, ids);
    }

    // Two questions per tier.
    for tier in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
        let count = questions.iter().filter(|q| q.difficulty == tier).count();
        if count != QUESTIONS_PER_TIER {
            bail!(
                "Expected {} {} questions, got {}",
                QUESTIONS_PER_TIER,
                tier,
                count
            );
        }
    }

    Ok(questions)
}

fn parse_score_card(text: &str) -> Result<ScoreCard> {
    let value: serde_json::Value =
        serde_json::from_str(strip_code_fence(text)).context("Score reply was not valid JSON")?;

    let score = value
        .get("score")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| anyhow!("Score reply missing numeric score"))?
        .clamp(0, 100) as u8;

    let summary = value
        .get("summary")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| anyhow!("Score reply missing summary"))?
        .to_string();

    Ok(ScoreCard { score, summary })
}
