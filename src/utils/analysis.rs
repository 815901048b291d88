use crate::utils::streak::AttendanceSummary;
use anyhow::Result;
use chrono::FixedOffset;
use serde::Deserialize;
use std::time::Duration;

pub const FALLBACK_ANALYSIS: &str = "🌟 Keep shining! You're doing great!";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
// Discord rejects embed field values longer than this.
const MAX_ANALYSIS_CHARS: usize = 1024;

pub fn build_prompt(display_name: &str, summary: &AttendanceSummary, offset: FixedOffset) -> String {
    let latest = summary.latest.with_timezone(&offset).format("%Y-%m-%d %H:%M");

    format!(
        "I want you to act as a motivational coach.\n\
         I will provide you with some information about someone's goals and challenges, \
         and it will be your job to come up with strategies that can help this person achieve their goals.\n\
         This could involve providing positive affirmations, giving helpful advice or suggesting \
         activities they can do to reach their end goal.\n\n\
         Here is the attendance data for a user named \"{display_name}\".\n\
         The user has the following data:\n\
         - Total attendance records: {total}\n\
         - Current streak: {current} days\n\
         - Maximum streak: {highest} days\n\
         - Maximum streak before 7:00 AM: {early} days\n\
         - Latest attendance: {latest}\n\n\
         Provide an insightful analysis of the user's performance and suggest personalized \
         motivational advice to encourage further progress.\n\
         Make it supportive and engaging.\n\
         Make it less than 100 words.",
        total = summary.total_records,
        current = summary.current_streak,
        highest = summary.highest_streak,
        early = summary.highest_before_seven,
    )
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

fn extract_text(response: GenerateResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .find_map(|part| part.text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn truncate(text: String) -> String {
    if text.chars().count() <= MAX_ANALYSIS_CHARS {
        return text;
    }
    let mut cut: String = text.chars().take(MAX_ANALYSIS_CHARS - 1).collect();
    cut.push('…');
    cut
}

/// HTTP client for [`GeminiClient`]. Every request is abandoned after
/// `timeout`, so a silent peer still ends in the fallback.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Text generation through the Gemini REST API. Never fails: any problem
/// yields [`FALLBACK_ANALYSIS`].
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            http,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate(&self, prompt: &str) -> String {
        match self.request(prompt).await {
            Ok(Some(text)) => truncate(text),
            Ok(None) => {
                tracing::warn!("Gemini returned no text, using fallback analysis");
                FALLBACK_ANALYSIS.to_string()
            }
            Err(e) => {
                tracing::warn!("Gemini request failed, using fallback analysis: {:?}", e);
                FALLBACK_ANALYSIS.to_string()
            }
        }
    }

    async fn request(&self, prompt: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response: GenerateResponse = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(extract_text(response))
    }
}
