//! Request and response bodies of the Gemini REST API.
//!
//! Only the fields the storyboard uses are modelled; unknown response
//! fields are ignored.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// generateContent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_role("user", text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::with_role("model", text)
    }

    /// Role-less content, as used for `systemInstruction`.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }

    fn with_role(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part::text(text)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
}

impl GenerationConfig {
    /// JSON mode constrained to an array of `{ "description": string }`.
    pub fn scene_list() -> Self {
        Self {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(serde_json::json!({
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "description": {
                            "type": "STRING",
                            "description": "A concise visual description of the scene for an image generator."
                        }
                    },
                    "required": ["description"]
                }
            })),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it has any.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }

    /// Human-readable reason why no text came back.
    pub fn empty_reason(&self) -> String {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return format!("prompt blocked: {reason}");
        }
        match self
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
        {
            Some(reason) => format!("no text in response (finish reason {reason})"),
            None => "no text in response".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// predict (Imagen)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PredictRequest {
    pub instances: Vec<ImagenInstance>,
    pub parameters: ImagenParameters,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImagenInstance {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagenParameters {
    pub sample_count: u32,
    pub aspect_ratio: String,
    pub output_options: ImagenOutputOptions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagenOutputOptions {
    pub mime_type: String,
}

impl PredictRequest {
    /// One 16:9 JPEG for `prompt`.
    pub fn storyboard_panel(prompt: impl Into<String>) -> Self {
        Self {
            instances: vec![ImagenInstance {
                prompt: prompt.into(),
            }],
            parameters: ImagenParameters {
                sample_count: 1,
                aspect_ratio: "16:9".to_string(),
                output_options: ImagenOutputOptions {
                    mime_type: storyboard_core::scene::STORYBOARD_IMAGE_MIME.to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    #[serde(default)]
    pub bytes_base64_encoded: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl PredictResponse {
    /// Base64 bytes of the first generated image.
    pub fn first_image(&self) -> Option<&str> {
        self.predictions
            .first()?
            .bytes_base64_encoded
            .as_deref()
            .filter(|bytes| !bytes.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_list_request_uses_json_mode() {
        let request = GenerateContentRequest {
            contents: vec![Content::user("script")],
            system_instruction: None,
            generation_config: Some(GenerationConfig::scene_list()),
        };

        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "script");
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["generationConfig"]["responseSchema"]["type"], "ARRAY");
        assert_eq!(
            json["generationConfig"]["responseSchema"]["items"]["required"][0],
            "description"
        );
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn system_instruction_has_no_role() {
        let request = GenerateContentRequest {
            contents: vec![Content::user("hi")],
            system_instruction: Some(Content::text("be helpful")),
            generation_config: None,
        };

        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be helpful");
        assert!(json["systemInstruction"].get("role").is_none());
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "[{\"description\":"}, {"text": "\"x\"}]"}]}},
                {"content": {"role": "model", "parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();

        assert_eq!(response.text().as_deref(), Some("[{\"description\":\"x\"}]"));
    }

    #[test]
    fn blocked_prompt_reports_reason() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();

        assert!(response.text().is_none());
        assert_eq!(response.empty_reason(), "prompt blocked: SAFETY");
    }

    #[test]
    fn candidate_without_parts_reports_finish_reason() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"finishReason": "MAX_TOKENS"}]
        }))
        .unwrap();

        assert!(response.text().is_none());
        assert!(response.empty_reason().contains("MAX_TOKENS"));
    }

    #[test]
    fn panel_request_asks_for_one_wide_jpeg() {
        let json = serde_json::to_value(PredictRequest::storyboard_panel("a ship")).unwrap();

        assert_eq!(json["instances"][0]["prompt"], "a ship");
        assert_eq!(json["parameters"]["sampleCount"], 1);
        assert_eq!(json["parameters"]["aspectRatio"], "16:9");
        assert_eq!(json["parameters"]["outputOptions"]["mimeType"], "image/jpeg");
    }

    #[test]
    fn predict_response_without_bytes_has_no_image() {
        let empty: PredictResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(empty.first_image().is_none());

        let filtered: PredictResponse = serde_json::from_value(serde_json::json!({
            "predictions": [{"raiFilteredReason": "blocked", "bytesBase64Encoded": ""}]
        }))
        .unwrap();
        assert!(filtered.first_image().is_none());

        let ok: PredictResponse = serde_json::from_value(serde_json::json!({
            "predictions": [{"bytesBase64Encoded": "/9j/", "mimeType": "image/jpeg"}]
        }))
        .unwrap();
        assert_eq!(ok.first_image(), Some("/9j/"));
    }
}
