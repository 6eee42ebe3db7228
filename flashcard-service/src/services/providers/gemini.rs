//! Google Gemini provider over the `generateContent` REST API.

use super::{
    Attachment, FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

pub struct GeminiTextProvider {
    config: GeminiConfig,
    client: Client,
    base_url: String,
}

impl GeminiTextProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    /// The key travels in a header so it never shows up in URLs or in
    /// transport errors.
    fn api_url(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.config.model, method)
    }

    fn build_request(
        prompt: &str,
        attachments: &[Attachment],
        params: &GenerationParams,
    ) -> GenerateContentRequest {
        let mut parts: Vec<ContentPart> = attachments
            .iter()
            .map(|a| ContentPart::InlineData {
                inline_data: InlineData {
                    mime_type: a.mime_type.clone(),
                    data: STANDARD.encode(&a.data),
                },
            })
            .collect();
        parts.push(ContentPart::Text {
            text: prompt.to_string(),
        });

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            system_instruction: params.system_instruction.as_ref().map(|s| Content {
                role: None,
                parts: vec![ContentPart::Text { text: s.clone() }],
            }),
            generation_config: Some(GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
                response_mime_type: params
                    .json_output
                    .then(|| "application/json".to_string()),
            }),
        }
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        attachments: &[Attachment],
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        let request = Self::build_request(prompt, attachments, params);

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            attachment_count = attachments.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(self.api_url("generateContent"))
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }
            if status.as_u16() == 400 {
                return Err(ProviderError::InvalidRequest(error_text));
            }

            return Err(ProviderError::ApiError(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        parse_response(api_response)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        let url = format!("{}/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(network_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError(format!(
                "Health check failed: {}",
                response.status()
            )))
        }
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

fn network_error(e: reqwest::Error) -> ProviderError {
    ProviderError::NetworkError(e.without_url().to_string())
}

fn parse_response(api_response: GenerateContentResponse) -> Result<ProviderResponse, ProviderError> {
    let candidate = api_response.candidates.first();

    let finish_reason = candidate
        .map(|c| match c.finish_reason.as_deref() {
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("RECITATION") | Some("BLOCKLIST") => FinishReason::ContentFilter,
            _ => FinishReason::Complete,
        })
        .unwrap_or(FinishReason::Error);

    if finish_reason == FinishReason::ContentFilter {
        return Err(ProviderError::ContentFiltered);
    }

    // Multi-part answers are joined; non-text parts are skipped.
    let text = candidate.and_then(|c| {
        let joined: String = c
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        (!joined.is_empty()).then_some(joined)
    });

    let usage = api_response.usage_metadata.unwrap_or_default();

    Ok(ProviderResponse {
        text,
        input_tokens: usage.prompt_token_count.unwrap_or(0),
        output_tokens: usage.candidates_token_count.unwrap_or(0),
        finish_reason,
    })
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, response::IntoResponse};
    use serde_json::json;
    use service_core::error::AppError;

    const SECRET: &str = "SUPERSECRETKEY";

    /// Provider aimed at a local port nothing listens on.
    async fn unreachable_provider() -> GeminiTextProvider {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut provider = GeminiTextProvider::new(GeminiConfig {
            api_key: SECRET.into(),
            model: "m".into(),
        })
        .unwrap();
        provider.base_url = format!("http://{}/v1beta", addr);
        provider
    }

    #[test]
    fn api_url_has_no_key() {
        let provider = GeminiTextProvider::new(GeminiConfig {
            api_key: SECRET.into(),
            model: "gemini-1.5-flash".into(),
        })
        .unwrap();

        let url = provider.api_url("generateContent");
        assert!(url.ends_with("/models/gemini-1.5-flash:generateContent"));
        assert!(!url.contains(SECRET));
    }

    #[tokio::test]
    async fn network_failure_does_not_leak_api_key() {
        let provider = unreachable_provider().await;

        let err = match provider
            .generate("hi", &[], &GenerationParams::default())
            .await
        {
            Err(e) => e,
            Ok(_) => panic!("request to a closed port succeeded"),
        };
        assert!(matches!(err, ProviderError::NetworkError(_)));
        assert!(!err.to_string().contains(SECRET));

        let res = AppError::from(err).into_response();
        assert_eq!(res.status().as_u16(), 502);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8_lossy(&body);
        assert!(!body.contains(SECRET), "key leaked: {}", body);
        assert!(!body.contains("127.0.0.1"), "upstream detail leaked: {}", body);
    }

    #[tokio::test]
    async fn health_check_failure_does_not_leak_api_key() {
        let provider = unreachable_provider().await;
        let err = provider.health_check().await.unwrap_err();
        assert!(!err.to_string().contains(SECRET));
    }

    #[test]
    fn request_carries_system_instruction_and_inline_data() {
        let params = GenerationParams {
            system_instruction: Some("be brief".into()),
            json_output: true,
            ..Default::default()
        };
        let attachments = [Attachment {
            mime_type: "image/png".into(),
            data: vec![1, 2, 3],
        }];

        let body = serde_json::to_value(GeminiTextProvider::build_request(
            "read this",
            &attachments,
            &params,
        ))
        .unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(
            body["contents"][0]["parts"][0]["inlineData"]["mimeType"],
            "image/png"
        );
        assert_eq!(body["contents"][0]["parts"][0]["inlineData"]["data"], "AQID");
        assert_eq!(body["contents"][0]["parts"][1]["text"], "read this");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn plain_request_omits_optional_fields() {
        let body = serde_json::to_value(GeminiTextProvider::build_request(
            "hi",
            &[],
            &GenerationParams::default(),
        ))
        .unwrap();

        assert!(body.get("systemInstruction").is_none());
        assert!(body["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn response_text_parts_are_joined() {
        let raw: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "[{\"q\":" }, { "text": "1}]" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 4 }
        }))
        .unwrap();

        let res = parse_response(raw).unwrap();
        assert_eq!(res.text.as_deref(), Some("[{\"q\":1}]"));
        assert_eq!(res.input_tokens, 12);
        assert_eq!(res.output_tokens, 4);
        assert_eq!(res.finish_reason, FinishReason::Complete);
    }

    #[test]
    fn safety_block_is_an_error() {
        let raw: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        }))
        .unwrap();

        assert!(matches!(
            parse_response(raw),
            Err(ProviderError::ContentFiltered)
        ));
    }

    #[test]
    fn empty_candidates_yield_no_text() {
        let raw: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [] })).unwrap();
        let res = parse_response(raw).unwrap();
        assert!(res.text.is_none());
        assert_eq!(res.finish_reason, FinishReason::Error);
    }
}
