/// Default Gemini REST endpoint (v1beta surface).
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model for script segmentation.
pub const DEFAULT_PARSER_MODEL: &str = "gemini-2.5-flash";

/// Default model for storyboard panels.
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";

/// Default model for the assistant.
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Errors raised while reading Gemini configuration.
#[derive(Debug, thiserror::Error)]
pub enum GeminiConfigError {
    #[error("GEMINI_API_KEY (or API_KEY) environment variable not set")]
    MissingApiKey,

    #[error("{var} must be a valid {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Credentials and model selection for the Gemini collaborators.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub endpoint: String,
    pub parser_model: String,
    pub image_model: String,
    pub chat_model: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("parser_model", &self.parser_model)
            .field("image_model", &self.image_model)
            .field("chat_model", &self.chat_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GeminiConfig {
    /// Configuration with default endpoint and models for `api_key`.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            parser_model: DEFAULT_PARSER_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var               | Default                                              |
    /// |-----------------------|------------------------------------------------------|
    /// | `GEMINI_API_KEY`      | falls back to `API_KEY`; required                    |
    /// | `GEMINI_ENDPOINT`     | `https://generativelanguage.googleapis.com/v1beta`   |
    /// | `GEMINI_PARSER_MODEL` | `gemini-2.5-flash`                                   |
    /// | `GEMINI_IMAGE_MODEL`  | `imagen-4.0-generate-001`                            |
    /// | `GEMINI_CHAT_MODEL`   | `gemini-2.5-flash`                                   |
    /// | `GEMINI_TIMEOUT_SECS` | `120`                                                |
    pub fn from_env() -> Result<Self, GeminiConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GeminiConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty("GEMINI_API_KEY")
            .or_else(|| non_empty("API_KEY"))
            .ok_or(GeminiConfigError::MissingApiKey)?;

        let mut config = Self::new(api_key.trim());

        if let Some(endpoint) = non_empty("GEMINI_ENDPOINT") {
            config.endpoint = endpoint.trim().trim_end_matches('/').to_string();
        }
        if let Some(model) = non_empty("GEMINI_PARSER_MODEL") {
            config.parser_model = model.trim().to_string();
        }
        if let Some(model) = non_empty("GEMINI_IMAGE_MODEL") {
            config.image_model = model.trim().to_string();
        }
        if let Some(model) = non_empty("GEMINI_CHAT_MODEL") {
            config.chat_model = model.trim().to_string();
        }
        if let Some(raw) = non_empty("GEMINI_TIMEOUT_SECS") {
            config.timeout_secs = raw
                .trim()
                .parse()
                .map_err(|_| GeminiConfigError::Invalid {
                    var: "GEMINI_TIMEOUT_SECS",
                    expected: "u64",
                    value: raw.clone(),
                })?;
        }

        Ok(config)
    }
}
