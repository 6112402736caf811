//! REST client for the Gemini `generateContent` and Imagen `predict`
//! endpoints.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use storyboard_core::collaborator::CollaboratorError;

use crate::config::GeminiConfig;
use crate::messages::{
    GenerateContentRequest, GenerateContentResponse, PredictRequest, PredictResponse,
};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// HTTP client bound to one API key and endpoint.
#[derive(Clone)]
pub struct GeminiApi {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

/// Errors from the Gemini REST layer.
#[derive(Debug, thiserror::Error)]
pub enum GeminiApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Gemini returned a non-2xx status code.
    #[error("Gemini API error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

impl From<GeminiApiError> for CollaboratorError {
    fn from(err: GeminiApiError) -> Self {
        match err {
            GeminiApiError::Request(e) if e.is_decode() => {
                CollaboratorError::InvalidResponse(e.to_string())
            }
            GeminiApiError::Request(e) => CollaboratorError::Transport(e.to_string()),
            GeminiApiError::ApiError { status, body } => CollaboratorError::Api { status, body },
        }
    }
}

impl GeminiApi {
    /// Build a client with the configured request timeout.
    pub fn new(config: &GeminiConfig) -> Result<Self, GeminiApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &GeminiConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// `POST {endpoint}/models/{model}:generateContent`
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiApiError> {
        self.post_model(model, "generateContent", request).await
    }

    /// `POST {endpoint}/models/{model}:predict`
    pub async fn predict(
        &self,
        model: &str,
        request: &PredictRequest,
    ) -> Result<PredictResponse, GeminiApiError> {
        self.post_model(model, "predict", request).await
    }

    // ---- private helpers ----

    async fn post_model<B: Serialize, T: DeserializeOwned>(
        &self,
        model: &str,
        method: &str,
        body: &B,
    ) -> Result<T, GeminiApiError> {
        let url = format!("{}/models/{}:{}", self.endpoint, model, method);
        tracing::debug!(%model, %method, "Calling Gemini");

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Return the response unchanged on success, or an
    /// [`GeminiApiError::ApiError`] carrying status and body.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GeminiApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GeminiApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GeminiApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
