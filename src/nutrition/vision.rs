//! Meal photo analysis through an OpenAI-compatible chat completions API.
//!
//! The model is asked for a JSON object with exactly four numbers
//! (`calories`, `protein`, `carbs`, `fat`). Anything else in the reply is
//! treated as a failed analysis.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::facts::NutritionEstimate;
use crate::config::VisionConfig;

const SYSTEM_PROMPT: &str = "You are a nutrition expert. Analyze the food in the image and \
provide nutritional information. Respond with JSON in this format: \
{ \"calories\": number, \"protein\": number, \"carbs\": number, \"fat\": number }";

const USER_PROMPT: &str = "Analyze this meal and provide nutritional information.";

/// Errors from the vision analysis layer.
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    /// Transport failure, including client-side timeouts.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("vision API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("vision response contained no message content")]
    EmptyContent,

    #[error("vision response is not a nutrition object: {0}")]
    Malformed(String),
}

/// Turns a meal photo into a raw nutrition estimate.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        image: &[u8],
        content_type: &str,
    ) -> Result<NutritionEstimate, VisionError>;
}

pub struct OpenAiVision {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiVision {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String, model: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    pub fn from_config(cfg: &VisionConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self::new(
            client,
            cfg.base_url.clone(),
            cfg.api_key.clone(),
            cfg.model.clone(),
        ))
    }

    fn request_body(&self, image: &[u8], content_type: &str) -> serde_json::Value {
        let data_url = format!(
            "data:{};base64,{}",
            content_type,
            base64::engine::general_purpose::STANDARD.encode(image)
        );
        serde_json::json!({
            "model": self.model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": USER_PROMPT },
                        { "type": "image_url", "image_url": { "url": data_url } }
                    ]
                }
            ]
        })
    }
}

#[async_trait]
impl VisionAnalyzer for OpenAiVision {
    #[instrument(skip(self, image), fields(bytes = image.len(), model = %self.model))]
    async fn analyze(
        &self,
        image: &[u8],
        content_type: &str,
    ) -> Result<NutritionEstimate, VisionError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(image, content_type))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(VisionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(VisionError::EmptyContent)?;
        debug!(content = %content, "vision reply");
        parse_nutrition_content(&content)
    }
}

/// All four fields must be present and numeric; extra keys are ignored.
pub fn parse_nutrition_content(content: &str) -> Result<NutritionEstimate, VisionError> {
    serde_json::from_str::<NutritionEstimate>(content)
        .map_err(|e| VisionError::Malformed(e.to_string()))
}
