use std::{fmt, fs, path::Path};

use serde::Deserialize;

/// Model queried when `HF_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "deepset/roberta-base-squad2";

/// Hosted inference API prefix; the model identifier is appended to it.
pub const DEFAULT_API_BASE: &str = "https://api-inference.huggingface.co/models";

const ENV_MODEL: &str = "HF_MODEL";
const ENV_TOKEN: &str = "HF_TOKEN";
const ENV_API_BASE: &str = "HF_API_BASE";

/// Formats an API base and a model identifier into the model endpoint URL.
///
/// Example: `("https://api-inference.huggingface.co/models", "deepset/roberta-base-squad2")`
/// → `"https://api-inference.huggingface.co/models/deepset/roberta-base-squad2"`
pub fn model_url(api_base: &str, model: &str) -> String {
    format!("{}/{}", api_base.trim().trim_end_matches('/'), model.trim())
}

/// Configuration problems that prevent any request from being made.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No bearer credential was configured.
    #[error("Hugging Face token missing. Set the HF_TOKEN environment variable or add it to secrets.json.")]
    MissingCredential,
    /// The secrets file could not be read or parsed.
    #[error("secrets file {path} could not be loaded: {reason}")]
    SecretsFile { path: String, reason: String },
}

#[derive(Debug, Default, Deserialize)]
struct SecretsFile {
    #[serde(rename = "HF_TOKEN", default)]
    token: Option<String>,
    #[serde(rename = "HF_MODEL", default)]
    model: Option<String>,
    #[serde(rename = "HF_API_BASE", default)]
    api_base: Option<String>,
}

#[derive(Clone, PartialEq, Eq)]
/// Remote endpoint settings, resolved once and read-only afterwards.
pub struct EndpointConfig {
    api_base: String,
    model: String,
    token: Option<String>,
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl EndpointConfig {
    /// Creates a configuration for `model` on the default API host, without a credential.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            model: model.into(),
            token: None,
        }
    }

    /// Sets the bearer credential. Blank tokens are treated as absent.
    pub fn with_token(mut self, token: impl AsRef<str>) -> Self {
        self.token = non_blank(token.as_ref());
        self
    }

    /// Overrides the API prefix the model identifier is appended to.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Resolves configuration from environment variables.
    ///
    /// Reads:
    /// - `HF_MODEL` — model identifier, defaults to [`DEFAULT_MODEL`]
    /// - `HF_TOKEN` — bearer credential (`Bearer ` prefix optional)
    /// - `HF_API_BASE` — API prefix, defaults to [`DEFAULT_API_BASE`]
    ///
    /// A missing token is not an error here; it is reported as
    /// [`ConfigError::MissingCredential`] when a question is asked, so a UI
    /// can still render and warn.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration from an arbitrary key/value source using the
    /// same keys and defaults as [`EndpointConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).as_deref().and_then(non_blank);
        let mut config = Self::new(get(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_owned()));
        if let Some(api_base) = get(ENV_API_BASE) {
            config.api_base = api_base;
        }
        config.token = get(ENV_TOKEN);
        config
    }

    /// Resolves configuration from a JSON secrets file, with environment
    /// variables taking precedence over the file's values.
    ///
    /// The file is an object with optional `HF_TOKEN`, `HF_MODEL` and
    /// `HF_API_BASE` string keys.
    pub fn from_secrets_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_secrets_with_lookup(path, |key| std::env::var(key).ok())
    }

    /// Like [`EndpointConfig::from_secrets_file`], with `lookup` standing in
    /// for the environment. Blank lookup values fall through to the file.
    pub fn from_secrets_with_lookup<F>(path: impl AsRef<Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secrets = load_secrets(path.as_ref())?;
        Ok(Self::from_lookup(|key| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .or_else(|| secrets.get(key))
        }))
    }

    /// Full endpoint URL for the configured model.
    pub fn url(&self) -> String {
        model_url(&self.api_base, &self.model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn has_credential(&self) -> bool {
        self.token.is_some()
    }

    /// Builds the `Authorization` header value.
    ///
    /// If the token is missing the `Bearer ` prefix, it is added automatically.
    pub fn authorization(&self) -> Result<String, ConfigError> {
        self.token
            .as_deref()
            .map(normalize_bearer_authorization)
            .ok_or(ConfigError::MissingCredential)
    }
}

impl SecretsFile {
    fn get(&self, key: &str) -> Option<String> {
        match key {
            ENV_TOKEN => self.token.clone(),
            ENV_MODEL => self.model.clone(),
            ENV_API_BASE => self.api_base.clone(),
            _ => None,
        }
    }
}

fn load_secrets(path: &Path) -> Result<SecretsFile, ConfigError> {
    let secrets_error = |reason: String| ConfigError::SecretsFile {
        path: path.display().to_string(),
        reason,
    };
    let content = fs::read_to_string(path).map_err(|err| secrets_error(err.to_string()))?;
    serde_json::from_str(&content).map_err(|err| secrets_error(err.to_string()))
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}
