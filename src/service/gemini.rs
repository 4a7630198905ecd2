//! Google Gemini REST client.

use std::path::Path;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};

use super::config::normalize_model;
use super::{
    CaptionOutcome, Captioner, Embedder, RetryPolicy, ServiceConfig, ServiceError, Summarizer,
    SummaryRequest,
};

/// Texts per `batchEmbedContents` request.
const EMBED_BATCH: usize = 100;

const CAPTION_PROMPT: &str = "Analyze the image (chart, graph, table) and summarize its key \
insights in under 100 words, including important numbers.";

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Embedding>,
}

#[derive(Debug, Deserialize)]
struct Embedding {
    values: Vec<f32>,
}

/// A Gemini client with its models resolved.
pub struct GeminiClient {
    config: ServiceConfig,
    client: reqwest::Client,
    retry: RetryPolicy,
    text_model: String,
    vision_model: Option<String>,
    embedding_model: Option<String>,
}

impl GeminiClient {
    /// Resolve the configured models against the account's model list.
    ///
    /// The first available text model is required; vision and embedding
    /// models are optional and their absence only disables those features.
    pub async fn connect(config: ServiceConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let url = format!("{}/models?pageSize=1000", config.base_url);
        let resp = client
            .get(&url)
            .header("x-goog-api-key", &config.api_key)
            .send()
            .await?;
        let list: ModelList = serde_json::from_value(check_response(resp).await?)?;

        let supports = |model: &str, method: &str| {
            list.models.iter().any(|m| {
                normalize_model(&m.name) == model
                    && m.supported_generation_methods.iter().any(|s| s == method)
            })
        };

        let text_model = config
            .text_models
            .iter()
            .find(|m| supports(m, "generateContent"))
            .cloned()
            .ok_or_else(|| {
                ServiceError::Unavailable(format!(
                    "none of the text models {:?} is available",
                    config.text_models
                ))
            })?;
        let vision_model = config
            .vision_models
            .iter()
            .find(|m| supports(m, "generateContent"))
            .cloned();
        let embedding_model = (supports(&config.embedding_model, "embedContent")
            || supports(&config.embedding_model, "batchEmbedContents"))
        .then(|| config.embedding_model.clone());

        log::info!(
            "Gemini models: text={}, vision={}, embedding={}",
            text_model,
            vision_model.as_deref().unwrap_or("none"),
            embedding_model.as_deref().unwrap_or("none")
        );
        if vision_model.is_none() {
            log::warn!("no vision model available; images will not be captioned");
        }

        Ok(Self::with_models(config, client, text_model, vision_model, embedding_model))
    }

    fn with_models(
        config: ServiceConfig,
        client: reqwest::Client,
        text_model: String,
        vision_model: Option<String>,
        embedding_model: Option<String>,
    ) -> Self {
        let retry = RetryPolicy::new(config.max_retries, config.backoff_base);
        Self {
            config,
            client,
            retry,
            text_model,
            vision_model,
            embedding_model,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    pub fn vision_model(&self) -> Option<&str> {
        self.vision_model.as_deref()
    }

    pub fn embedding_model(&self) -> Option<&str> {
        self.embedding_model.as_deref()
    }

    async fn post(&self, model: &str, method: &str, body: &Value) -> Result<Value, ServiceError> {
        let url = format!("{}/models/{}:{}", self.config.base_url, model, method);
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await?;
        check_response(resp).await
    }

    async fn generate(&self, model: &str, parts: Vec<Value>) -> Result<String, ServiceError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": parts }],
        });
        let response = self
            .retry
            .run(|| self.post(model, "generateContent", &body))
            .await?;
        response_text(&response)
    }
}

async fn check_response(resp: reqwest::Response) -> Result<Value, ServiceError> {
    let status = resp.status().as_u16();
    if status == 429 {
        return Err(ServiceError::RateLimited);
    }
    let body: Value = resp.json().await?;
    if status >= 400 {
        let message = body["error"]["message"]
            .as_str()
            .unwrap_or("unknown API error")
            .to_string();
        return Err(ServiceError::Api { status, message });
    }
    Ok(body)
}

/// Concatenated text parts of the first candidate.
fn response_text(body: &Value) -> Result<String, ServiceError> {
    let text: String = body["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        let reason = body["promptFeedback"]["blockReason"]
            .as_str()
            .unwrap_or("no candidates");
        return Err(ServiceError::InvalidResponse(format!("empty response ({reason})")));
    }
    Ok(text)
}

fn summary_prompt(request: &SummaryRequest) -> String {
    let mut prompt = format!(
        "Provide a detailed and comprehensive summary of the following text. \
         Cover every page and section without skipping content, including the key points, \
         important details, supporting evidence and conclusions. \
         Write at least {} paragraphs separated by blank lines.",
        request.min_paragraphs.max(1)
    );
    if let Some(references) = &request.references {
        prompt.push_str(
            " Keep bracketed citation numbers such as [3] next to statements taken from the \
             references below.\n\nReferences:\n",
        );
        prompt.push_str(references);
    }
    prompt.push_str("\n\nText:\n");
    prompt.push_str(&request.text);
    prompt
}

fn mime_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "image/png",
    }
}

#[async_trait]
impl Summarizer for GeminiClient {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, ServiceError> {
        let parts = vec![json!({ "text": summary_prompt(request) })];
        self.generate(&self.text_model, parts).await
    }
}

#[async_trait]
impl Captioner for GeminiClient {
    async fn caption(&self, image: &Path, page_context: Option<&str>) -> CaptionOutcome {
        let name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| image.display().to_string());

        let Some(model) = self.vision_model.as_deref() else {
            return CaptionOutcome::Unavailable;
        };

        let data = match tokio::fs::read(image).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return CaptionOutcome::NotFound(name)
            }
            Err(e) => {
                log::warn!("cannot read image {}: {}", name, e);
                return CaptionOutcome::Failed(name);
            }
        };

        let mut prompt = CAPTION_PROMPT.to_string();
        if let Some(context) = page_context.filter(|c| !c.trim().is_empty()) {
            prompt.push_str("\n\nText of the page the image appears on:\n");
            prompt.push_str(context);
        }
        let parts = vec![
            json!({ "text": prompt }),
            json!({ "inlineData": { "mimeType": mime_type(image), "data": STANDARD.encode(&data) } }),
        ];

        match self.generate(model, parts).await {
            Ok(text) => CaptionOutcome::Caption(text.trim().to_string()),
            Err(e) if e.is_rate_limited() => CaptionOutcome::RateLimited,
            Err(e) => {
                log::warn!("captioning {} failed: {}", name, e);
                CaptionOutcome::Failed(name)
            }
        }
    }
}

#[async_trait]
impl Embedder for GeminiClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        let model = self
            .embedding_model
            .as_deref()
            .ok_or_else(|| ServiceError::Unavailable("no embedding model".to_string()))?;

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH) {
            let requests: Vec<Value> = batch
                .iter()
                .map(|text| {
                    json!({
                        "model": format!("models/{model}"),
                        "content": { "parts": [{ "text": text }] },
                    })
                })
                .collect();
            let body = json!({ "requests": requests });
            let response = self
                .retry
                .run(|| self.post(model, "batchEmbedContents", &body))
                .await?;
            let parsed: EmbedResponse = serde_json::from_value(response)?;
            if parsed.embeddings.len() != batch.len() {
                return Err(ServiceError::InvalidResponse(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    parsed.embeddings.len()
                )));
            }
            vectors.extend(parsed.embeddings.into_iter().map(|e| e.values));
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "One." }, { "text": " Two." }] } }]
        });
        assert_eq!(response_text(&body).unwrap(), "One. Two.");

        let blocked = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = response_text(&blocked).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_summary_prompt() {
        let request = SummaryRequest::new("Body text.")
            .with_references("1. Smith")
            .with_min_paragraphs(4);
        let prompt = summary_prompt(&request);
        assert!(prompt.contains("at least 4 paragraphs"));
        assert!(prompt.contains("References:\n1. Smith"));
        assert!(prompt.ends_with("Text:\nBody text."));
    }

    #[test]
    fn test_mime_type() {
        assert_eq!(mime_type(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_type(Path::new("a.png")), "image/png");
    }
}
