//! AI content generation
//!
//! Stateless wrapper around a generative text API: one HTTPS POST per
//! request, API key as a query parameter. The provider is asked for a
//! JSON object but is not trusted to return one; parsing takes the first
//! brace-delimited block found anywhere in the reply and falls back to
//! treating the whole reply as the description.

use crate::config::{AI_ENDPOINT, AI_REQUEST_TIMEOUT_SECS, DEFAULT_LANGUAGE};
use crate::error::{AppError, Result};
use serde::Deserialize;
use serde_json::json;

/// What the provider produced for one syntax term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedEntry {
    pub description: String,
    pub example: String,
    pub language: String,
}

/// Inputs for one generation request
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub syntax: String,
    pub category: String,
    pub language: Option<String>,
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: Option<String>,
}

/// Loosely-shaped block the provider is asked to emit
#[derive(Debug, Deserialize)]
struct GeneratedBlock {
    #[serde(default)]
    description: String,
    #[serde(default)]
    example: String,
    #[serde(default)]
    language: Option<String>,
}

/// Client for the generative text provider
#[derive(Clone)]
pub struct AiGenerator {
    http: reqwest::Client,
}

impl AiGenerator {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(AI_REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { http })
    }

    /// Generate a description/example/language triple for a syntax term.
    ///
    /// Returns `Ok(None)` without making any call when no API key is
    /// configured. A failed call yields an error and nothing else; there
    /// is no automatic retry.
    pub async fn generate(
        &self,
        api_key: Option<&str>,
        request: &GenerationRequest,
    ) -> Result<Option<GeneratedEntry>> {
        let Some(api_key) = api_key.filter(|k| !k.is_empty()) else {
            tracing::debug!("AI generation skipped: no API key configured");
            return Ok(None);
        };

        let prompt = build_prompt(request);

        tracing::info!("Requesting AI generation for syntax: {}", request.syntax);

        let response = self
            .http
            .post(AI_ENDPOINT)
            .query(&[("key", api_key)])
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt }] }]
            }))
            .send()
            .await?;

        let status = response.status();

        if status.as_u16() == 429 {
            return Err(AppError::RateLimited);
        }

        if !status.is_success() {
            let message = response
                .json::<ProviderErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("provider returned status {}", status));
            return Err(AppError::AiProvider(message));
        }

        let body: GenerateResponse = response.json().await?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| AppError::AiProvider("empty response from provider".to_string()))?;

        Ok(Some(parse_generated(
            &text,
            request.language.as_deref(),
        )))
    }
}

/// Build the single combined instruction for the provider
fn build_prompt(request: &GenerationRequest) -> String {
    let mut prompt = format!(
        "Explain the syntax \"{}\" from the category \"{}\" for a programming cheatsheet.",
        request.syntax, request.category
    );

    if let Some(language) = &request.language {
        prompt.push_str(&format!(" The example must be written in {}.", language));
    }

    if let Some(custom) = &request.custom_prompt {
        prompt.push(' ');
        prompt.push_str(custom);
    }

    prompt.push_str(
        " Respond with a single JSON object with exactly these string fields: \
         \"description\" (one or two concise sentences), \"example\" (a short, \
         runnable code snippet), and \"language\" (the language of the example). \
         Do not wrap the JSON in markdown.",
    );

    prompt
}

/// Extract the first brace-delimited block from the text, if any
fn first_brace_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;

    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Lenient parse of the provider's reply.
///
/// No parseable block means the whole text becomes the description with
/// an empty example and the input (or default) language.
fn parse_generated(text: &str, language_hint: Option<&str>) -> GeneratedEntry {
    let fallback_language = language_hint.unwrap_or(DEFAULT_LANGUAGE);

    if let Some(block) = first_brace_block(text) {
        if let Ok(parsed) = serde_json::from_str::<GeneratedBlock>(block) {
            return GeneratedEntry {
                description: parsed.description,
                example: parsed.example,
                language: parsed
                    .language
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| fallback_language.to_string()),
            };
        }
    }

    GeneratedEntry {
        description: text.trim().to_string(),
        example: String::new(),
        language: fallback_language.to_string(),
    }
}
