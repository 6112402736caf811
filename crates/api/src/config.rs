/// Errors raised while reading server configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a valid {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error(
        "REQUEST_TIMEOUT_SECS ({request}) must exceed the model call timeout ({collaborator})"
    )]
    TimeoutTooShort { request: u64, collaborator: u64 },
}

/// Default `REQUEST_TIMEOUT_SECS`.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 150;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `150`). Segmentation and
    /// chat turns run inside their requests and must time out first; see
    /// [`ServerConfig::ensure_outlasts`].
    pub request_timeout_secs: u64,
    /// How long shutdown waits for an in-flight generation (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Cap on concurrent image requests. Unset or `0` means unbounded.
    pub max_concurrent_images: Option<usize>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `150`                   |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    /// | `MAX_CONCURRENT_IMAGES` | unbounded               |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());

        let port = parse_var::<u16>(&lookup, "PORT", "u16")?.unwrap_or(3000);

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs =
            parse_var::<u64>(&lookup, "REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let shutdown_timeout_secs =
            parse_var::<u64>(&lookup, "SHUTDOWN_TIMEOUT_SECS", "u64")?.unwrap_or(30);

        let max_concurrent_images = parse_var::<usize>(&lookup, "MAX_CONCURRENT_IMAGES", "usize")?
            .filter(|&limit| limit > 0);

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            max_concurrent_images,
        })
    }

    /// Reject a request timeout that does not exceed the timeout of the
    /// model calls awaited inside requests.
    pub fn ensure_outlasts(&self, collaborator_timeout_secs: u64) -> Result<(), ConfigError> {
        if self.request_timeout_secs > collaborator_timeout_secs {
            return Ok(());
        }
        Err(ConfigError::TimeoutTooShort {
            request: self.request_timeout_secs,
            collaborator: collaborator_timeout_secs,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var,
                expected,
                value: raw,
            }),
    }
}
