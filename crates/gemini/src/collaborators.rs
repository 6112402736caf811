//! Gemini-backed implementations of the storyboard collaborator traits.

use async_trait::async_trait;
use storyboard_core::collaborator::{
    ChatCollaborator, CollaboratorError, ImageSynthesizer, SceneDescription, ScriptSegmenter,
};
use storyboard_core::conversation::{ChatHandle, ChatRole};
use storyboard_core::prompts::{image_prompt, segmentation_prompt};
use storyboard_core::scene::ImageData;

use crate::api::GeminiApi;
use crate::config::GeminiConfig;
use crate::messages::{Content, GenerateContentRequest, GenerationConfig, PredictRequest};

// ---------------------------------------------------------------------------
// GeminiSegmenter
// ---------------------------------------------------------------------------

/// Splits a script into scenes with a JSON-mode `generateContent` call.
pub struct GeminiSegmenter {
    api: GeminiApi,
    model: String,
}

impl GeminiSegmenter {
    pub fn new(api: GeminiApi, config: &GeminiConfig) -> Self {
        Self {
            api,
            model: config.parser_model.clone(),
        }
    }
}

#[async_trait]
impl ScriptSegmenter for GeminiSegmenter {
    async fn segment(&self, script: &str) -> Result<Vec<SceneDescription>, CollaboratorError> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(segmentation_prompt(script))],
            system_instruction: None,
            generation_config: Some(GenerationConfig::scene_list()),
        };

        let response = self.api.generate_content(&self.model, &request).await?;
        let raw = response
            .text()
            .ok_or_else(|| CollaboratorError::InvalidResponse(response.empty_reason()))?;

        let scenes = SceneDescription::parse_list(&raw)?;
        tracing::debug!(model = %self.model, scenes = scenes.len(), "Script segmented");
        Ok(scenes)
    }
}

// ---------------------------------------------------------------------------
// ImagenSynthesizer
// ---------------------------------------------------------------------------

/// Renders one 16:9 JPEG panel per description with Imagen.
pub struct ImagenSynthesizer {
    api: GeminiApi,
    model: String,
}

impl ImagenSynthesizer {
    pub fn new(api: GeminiApi, config: &GeminiConfig) -> Self {
        Self {
            api,
            model: config.image_model.clone(),
        }
    }
}

#[async_trait]
impl ImageSynthesizer for ImagenSynthesizer {
    async fn synthesize(&self, description: &str) -> Result<ImageData, CollaboratorError> {
        let request = PredictRequest::storyboard_panel(image_prompt(description));
        let response = self.api.predict(&self.model, &request).await?;

        response
            .first_image()
            .map(ImageData::jpeg_base64)
            .ok_or_else(|| {
                CollaboratorError::InvalidResponse("model did not return image data".to_string())
            })
    }
}

// ---------------------------------------------------------------------------
// GeminiChat
// ---------------------------------------------------------------------------

/// Multi-turn assistant. The whole handle is replayed on every call.
pub struct GeminiChat {
    api: GeminiApi,
    model: String,
}

impl GeminiChat {
    pub fn new(api: GeminiApi, config: &GeminiConfig) -> Self {
        Self {
            api,
            model: config.chat_model.clone(),
        }
    }
}

fn chat_request(handle: &ChatHandle, message: &str) -> GenerateContentRequest {
    let mut contents: Vec<Content> = handle
        .turns()
        .iter()
        .map(|turn| match turn.role {
            ChatRole::User => Content::user(turn.text.as_str()),
            ChatRole::Model => Content::model(turn.text.as_str()),
        })
        .collect();
    contents.push(Content::user(message));

    GenerateContentRequest {
        contents,
        system_instruction: Some(Content::text(handle.system_instruction())),
        generation_config: None,
    }
}

#[async_trait]
impl ChatCollaborator for GeminiChat {
    async fn reply(&self, handle: &ChatHandle, message: &str) -> Result<String, CollaboratorError> {
        let request = chat_request(handle, message);
        let response = self.api.generate_content(&self.model, &request).await?;
        response
            .text()
            .ok_or_else(|| CollaboratorError::InvalidResponse(response.empty_reason()))
    }
}
