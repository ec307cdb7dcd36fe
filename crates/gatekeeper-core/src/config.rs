//! Layered configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, so `APP_CHUNKING__OVERLAP=50` sets
//! `chunking.overlap`). Every section has serde defaults, so running without
//! any config file yields the stock pipeline constants.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::chunker::ChunkingConfig;
use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::Config(format!("Failed to get '{}': {}", key, e)))
    }

    /// Typed view of the whole configuration, validated.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        settings.chunking.validate()?;
        if settings.retrieval.k == 0 {
            return Err(Error::Config("retrieval.k must be at least 1".into()));
        }
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalSettings,
    pub prompt: PromptSettings,
    pub embedding: EmbeddingSettings,
    pub store: StoreSettings,
    pub llm: LlmSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { k: 3 }
    }
}

/// How the prompt treats retrieved context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptPolicy {
    /// Answer only from context; say the answer is unknown otherwise.
    Strict,
    /// Use context when relevant, fall back to general knowledge.
    #[default]
    Blended,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    pub policy: PromptPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    Gemini,
    Local,
    Hash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dim: usize,
    pub batch_size: usize,
    /// Token budget per text for the local model.
    pub max_len: usize,
    pub model_dir: Option<String>,
    pub api_key: Option<String>,
    pub endpoint: String,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            model: "gemini-embedding-001".to_string(),
            dim: 768,
            batch_size: 32,
            max_len: 256,
            model_dir: None,
            api_key: None,
            endpoint: GEMINI_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    LanceDb,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub uri: String,
    pub table: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            uri: "~/.gatekeeper/lancedb".to_string(),
            table: "thoughts".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub api_key: Option<String>,
    pub endpoint: String,
    /// Client-side request timeout; `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            endpoint: GEMINI_ENDPOINT.to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: 6969 }
    }
}

pub const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// A configured key wins; otherwise `GEMINI_API_KEY`, then `GOOGLE_API_KEY`.
pub fn resolve_api_key(configured: Option<&str>) -> Option<String> {
    configured
        .filter(|k| !k.trim().is_empty())
        .map(str::to_string)
        .or_else(|| {
            ["GEMINI_API_KEY", "GOOGLE_API_KEY"]
                .iter()
                .find_map(|name| env::var(name).ok().filter(|v| !v.trim().is_empty()))
        })
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_any_source() {
        let config = Config::from_figment(Figment::new());
        let settings = config.settings().expect("settings");
        assert_eq!(settings.chunking.min_length, 1000);
        assert_eq!(settings.chunking.max_length, 2000);
        assert_eq!(settings.chunking.overlap, 100);
        assert_eq!(settings.retrieval.k, 3);
        assert_eq!(settings.prompt.policy, PromptPolicy::Blended);
        assert_eq!(settings.server.port, 6969);
    }

    #[test]
    fn toml_and_env_layers_override_defaults() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "config.toml",
                r#"
                [chunking]
                min_length = 200
                [prompt]
                policy = "strict"
                [store]
                backend = "memory"
                "#,
            )?;
            jail.set_env("APP_CHUNKING__OVERLAP", "25");
            jail.set_env("APP_RETRIEVAL__K", "5");

            let config = Config::load().map_err(|e| e.to_string())?;
            let settings = config.settings().map_err(|e| e.to_string())?;
            assert_eq!(settings.chunking.min_length, 200);
            assert_eq!(settings.chunking.max_length, 2000);
            assert_eq!(settings.chunking.overlap, 25);
            assert_eq!(settings.retrieval.k, 5);
            assert_eq!(settings.prompt.policy, PromptPolicy::Strict);
            assert_eq!(settings.store.backend, StoreBackend::Memory);
            assert_eq!(config.get::<usize>("chunking.overlap").map_err(|e| e.to_string())?, 25);
            Ok(())
        });
    }

    #[test]
    fn inverted_chunk_bounds_are_a_config_error() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("APP_CHUNKING__MIN_LENGTH", "3000");
            match Config::load() {
                Err(Error::Config(msg)) => assert!(msg.contains("min_length")),
                Err(other) => panic!("unexpected error: {other}"),
                Ok(_) => panic!("expected a config error"),
            }
            Ok(())
        });
    }

    #[test]
    fn negative_overlap_is_rejected() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("APP_CHUNKING__OVERLAP", "-5");
            assert!(matches!(Config::load(), Err(Error::Config(_))));
            Ok(())
        });
    }


    #[test]
    fn configured_api_key_wins() {
        assert_eq!(resolve_api_key(Some("abc")).as_deref(), Some("abc"));
    }
}
