// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Advisory text generation (motivation and habit suggestions).
//!
//! The generator is optional and untrusted: every failure is logged and
//! replaced by a fixed fallback, so callers always get a usable value.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Habit, HabitSuggestion, UserStats};

/// Reply used when the generator fails outright.
pub const FALLBACK_MOTIVATION: &str = "Consistency is the key to victory!";
/// Reply used when the generator answers with nothing.
pub const EMPTY_MOTIVATION: &str = "Keep going, you're doing great!";

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Source of motivational text and habit ideas.
#[async_trait]
pub trait AdvisoryGenerator: Send + Sync {
    /// One short sentence reacting to the current progress.
    async fn motivate(&self, stats: &UserStats, habits: &[Habit]) -> Result<String>;

    /// A new habit that is not already in `existing_titles`.
    async fn suggest_habit(&self, existing_titles: &[String]) -> Result<HabitSuggestion>;
}

/// Ask for motivation, falling back to a fixed line on any failure.
pub async fn motivate_or_fallback(
    generator: Option<&dyn AdvisoryGenerator>,
    stats: &UserStats,
    habits: &[Habit],
) -> String {
    let Some(generator) = generator else {
        return FALLBACK_MOTIVATION.to_string();
    };

    match generator.motivate(stats, habits).await {
        Ok(text) if text.trim().is_empty() => EMPTY_MOTIVATION.to_string(),
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Motivation request failed, using fallback");
            FALLBACK_MOTIVATION.to_string()
        }
    }
}

/// Ask for a habit idea, falling back to the default suggestion on any failure.
pub async fn suggest_or_fallback(
    generator: Option<&dyn AdvisoryGenerator>,
    habits: &[Habit],
) -> HabitSuggestion {
    let Some(generator) = generator else {
        return HabitSuggestion::default();
    };

    let titles: Vec<String> = habits.iter().map(|h| h.title.clone()).collect();
    match generator.suggest_habit(&titles).await {
        Ok(suggestion) if !suggestion.title.trim().is_empty() => suggestion,
        Ok(_) => {
            tracing::warn!("Suggestion had an empty title, using fallback");
            HabitSuggestion::default()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Suggestion request failed, using fallback");
            HabitSuggestion::default()
        }
    }
}

/// Prompt for the motivate request.
pub fn motivation_prompt(stats: &UserStats, habits: &[Habit]) -> String {
    let completed = habits.iter().filter(|h| h.completed).count();
    format!(
        "The user is using a gamified habit tracker.\n\
         Current Stats:\n\
         - Streak: {} days\n\
         - Level: {}\n\
         - Today's Progress: {}/{} habits done.\n\n\
         Provide a short, punchy, and witty one-sentence motivation or congratulation.\n\
         If the streak is high (>3), be super excited.\n\
         If they just started, be encouraging.\n\
         Keep it under 20 words.\n\
         Do not use quotes.",
        stats.total_streak,
        stats.level,
        completed,
        habits.len()
    )
}

/// Prompt for the suggest request.
pub fn suggestion_prompt(existing_titles: &[String]) -> String {
    format!(
        "Suggest ONE fun, healthy, small habit for a user.\n\
         Current habits: {}.\n\
         Return JSON with fields: \"title\" (short name), \"color\" (hex code, vibrant), \
         \"icon\" (a classic emoji).",
        existing_titles.join(", ")
    )
}

// ─── Gemini ──────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Google Gemini `generateContent` client.
#[derive(Debug, Clone)]
pub struct GeminiAdvisor {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiAdvisor {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Advisory(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            model,
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn generate(&self, prompt: String, json: bool) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: json.then(|| GenerationConfig {
                response_mime_type: "application/json".to_string(),
            }),
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Advisory(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Advisory(format!("HTTP {}: {}", status, body)));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::Advisory(format!("malformed response: {}", e)))?;

        Ok(body
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join(""))
    }
}

#[async_trait]
impl AdvisoryGenerator for GeminiAdvisor {
    async fn motivate(&self, stats: &UserStats, habits: &[Habit]) -> Result<String> {
        let text = self.generate(motivation_prompt(stats, habits), false).await?;
        Ok(text.trim().trim_matches('"').to_string())
    }

    async fn suggest_habit(&self, existing_titles: &[String]) -> Result<HabitSuggestion> {
        let text = self.generate(suggestion_prompt(existing_titles), true).await?;
        parse_suggestion(&text)
    }
}

/// Parse a JSON suggestion, tolerating a markdown code fence around it.
fn parse_suggestion(text: &str) -> Result<HabitSuggestion> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);

    if body.trim().is_empty() {
        return Err(AppError::Advisory("no response".to_string()));
    }

    serde_json::from_str(body.trim())
        .map_err(|e| AppError::Advisory(format!("suggestion is not valid JSON: {}", e)))
}
