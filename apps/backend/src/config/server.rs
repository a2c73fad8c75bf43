use crate::config::{env_lookup, parse_var};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Raw comma-separated list; validated by the CORS middleware.
    pub cors_allowed_origins: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            host: lookup("BACKEND_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_var(&lookup, "BACKEND_PORT", 3001)?,
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS").unwrap_or_default(),
        })
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

/// API keys for the hosted model providers. A missing key disables that
/// provider; its participants fall back to the default order.
#[derive(Clone, Default)]
pub struct ProviderKeys {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub gemini: Option<String>,
}

impl std::fmt::Debug for ProviderKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderKeys")
            .field("openai", &self.openai.is_some())
            .field("anthropic", &self.anthropic.is_some())
            .field("gemini", &self.gemini.is_some())
            .finish()
    }
}

impl ProviderKeys {
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            openai: key("OPENAI_API_KEY"),
            anthropic: key("ANTHROPIC_API_KEY"),
            gemini: key("GEMINI_API_KEY"),
        }
    }
}
