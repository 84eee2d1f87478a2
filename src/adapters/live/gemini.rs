//! Live adapter for the Gemini `generateContent` API.

use std::time::Duration;

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use crate::error::ImageError;
use crate::ports::image_generator::{
    GenerateFuture, GeneratedImage, ImageGenerator, ImageRequest, ImageResponse,
};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Upper bound on one `generateContent` round trip; a stalled call becomes a
/// network error for that ordinal.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Live Gemini image generator that calls the Google AI API.
pub struct GeminiGenerator {
    client: Client,
    api_key: String,
}

impl GeminiGenerator {
    /// Create a new Gemini generator with the given API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: String) -> Result<Self, ImageError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, api_key })
    }
}

impl ImageGenerator for GeminiGenerator {
    fn generate(&self, request: &ImageRequest) -> GenerateFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let url = format!("{GEMINI_API_BASE}/{}:generateContent", request.model);
            let body = request_body(&request);

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            let response_text = response.text().await?;

            if !status.is_success() {
                return Err(ImageError::Api { status: status.as_u16(), message: response_text });
            }

            parse_response(&response_text)
        })
    }
}

fn request_body(request: &ImageRequest) -> serde_json::Value {
    serde_json::json!({
        "contents": [{
            "parts": [{"text": request.prompt}]
        }],
        "generationConfig": {
            "candidateCount": request.candidate_count,
            "responseModalities": ["TEXT", "IMAGE"],
        },
        "safetySettings": request.safety_settings,
    })
}

/// Collect every inline image from a successful response body.
///
/// A body with no image parts is not an error here; the caller decides
/// what an empty response means.
fn parse_response(body: &str) -> Result<ImageResponse, ImageError> {
    let parsed: GeminiResponse = serde_json::from_str(body).map_err(|e| ImageError::Api {
        status: 200,
        message: format!("Failed to parse response: {e}"),
    })?;

    let mut images = Vec::new();
    let mut finish_reason = None;
    for candidate in parsed.candidates {
        if finish_reason.is_none() {
            finish_reason = candidate.finish_reason;
        }
        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
        for part in parts {
            if let Some(inline) = part.inline_data {
                let data = base64::engine::general_purpose::STANDARD
                    .decode(&inline.data)
                    .map_err(|e| ImageError::Api {
                        status: 200,
                        message: format!("Failed to decode base64: {e}"),
                    })?;
                images.push(GeneratedImage { data, mime_type: inline.mime_type });
            }
        }
    }

    let block_reason = if images.is_empty() {
        parsed.prompt_feedback.and_then(|f| f.block_reason).or(finish_reason)
    } else {
        None
    };

    Ok(ImageResponse { images, block_reason })
}

// --- Gemini API response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    inline_data: Option<GeminiInlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}
