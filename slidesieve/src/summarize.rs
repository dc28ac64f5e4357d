use std::{env, time::Duration};

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

/// Environment variable holding the Gemini API key.
pub const CREDENTIAL_VAR: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("the {CREDENTIAL_VAR} environment variable is not set")]
    MissingCredential,
    #[error("the summary request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("the model answered {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("the answer did not parse: {0}")]
    Json(#[from] serde_json::Error),
    #[error("the model gave an empty answer")]
    EmptyAnswer,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    // Blocked answers come back without any content
    #[serde(default)]
    content: AnswerContent,
}

#[derive(Debug, Default, Deserialize)]
struct AnswerContent {
    #[serde(default)]
    parts: Vec<AnswerPart>,
}

#[derive(Debug, Deserialize)]
struct AnswerPart {
    text: String,
}

/// Turns a lecture transcript into a structured Markdown summary by asking
/// the Gemini API.
pub struct Summarizer {
    client: Client,
    api_key: String,
    model: String,
}

impl Summarizer {
    /// Reads the API key from [CREDENTIAL_VAR].
    pub fn from_env() -> Result<Self, SummarizeError> {
        let api_key = env::var(CREDENTIAL_VAR).map_err(|_| SummarizeError::MissingCredential)?;
        Self::with_key(api_key)
    }

    pub fn with_key(api_key: impl Into<String>) -> Result<Self, SummarizeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn summarize(&self, lecture_text: &str) -> Result<String, SummarizeError> {
        let prompt = build_prompt(lecture_text);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };
        let body = serde_json::to_string(&request)?;

        log::info!("Asking {} for a summary", self.model);
        let response = self
            .client
            .post(format!("{ENDPOINT}/{}:generateContent", self.model))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header("x-goog-api-key", &self.api_key)
            .body(body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(SummarizeError::Api {
                status,
                body: response.text().unwrap_or_default(),
            });
        }

        let answer: GenerateResponse = serde_json::from_str(&response.text()?)?;
        let summary = collect_answer(answer);
        if summary.trim().is_empty() {
            return Err(SummarizeError::EmptyAnswer);
        }
        Ok(summary)
    }
}

fn collect_answer(answer: GenerateResponse) -> String {
    answer
        .candidates
        .into_iter()
        .flat_map(|candidate| candidate.content.parts)
        .map(|part| part.text)
        .collect()
}

fn build_prompt(lecture_text: &str) -> String {
    format!(
        "You are an expert academic assistant specializing in summarizing technical \
         university lectures. Based on the following text extracted from lecture \
         slides, provide a concise and structured summary.\n\
         \n\
         The summary should:\n\
         1. Identify the main topic of the lecture.\n\
         2. List the key concepts, definitions, and main points as bullet points.\n\
         3. Conclude with the overall takeaway or conclusion of the lecture.\n\
         4. The output should be in Markdown format.\n\
         \n\
         Here is the lecture text:\n\
         ---\n\
         {lecture_text}\n\
         ---\n"
    )
}
