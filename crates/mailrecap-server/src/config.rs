use config::{Config as ConfigLoader, ConfigError, Environment, File};
use mailrecap_llm::{ProviderSettings, DEFAULT_GEMINI_MODEL, DEFAULT_OPENAI_MODEL};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub mongodb: MongoDbConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub mongodb_uri: String,
    #[serde(default)]
    pub google_client_id: String,
    #[serde(default)]
    pub google_client_secret: String,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoDbConfig {
    pub database: String,
}

impl Default for MongoDbConfig {
    fn default() -> Self {
        Self {
            database: "mailrecap".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Providers to build at startup; each needs its API key in the env.
    pub providers: Vec<String>,
    pub gemini_model: String,
    pub openai_model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            providers: vec!["gemini".to_string()],
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Bound on the in-memory duplicate tracker.
    pub tracker_capacity: usize,
    /// Custom prompt template with `{context}` and `{email_content}`
    /// placeholders. Unset means the built-in default.
    #[serde(default)]
    pub template: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tracker_capacity: mailrecap_pipeline::DEFAULT_TRACKER_CAPACITY,
            template: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables.
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables (SERVER_, MONGODB_, AI_, LOG_ prefixes)
    /// 4. Secrets, read from the environment only, never from TOML
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::default()
                    .prefix("SERVER")
                    .separator("_")
                    .try_parsing(true),
            )
            .add_source(
                Environment::default()
                    .prefix("MONGODB")
                    .separator("_")
                    .try_parsing(true),
            )
            .add_source(
                Environment::default()
                    .prefix("AI")
                    .separator("_")
                    .try_parsing(true),
            )
            .add_source(
                Environment::default()
                    .prefix("LOG")
                    .separator("_")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        cfg.mongodb_uri = require_env("MONGODB_URI")?;
        cfg.google_client_id = require_env("GOOGLE_CLIENT_ID")?;
        cfg.google_client_secret = require_env("GOOGLE_CLIENT_SECRET")?;
        cfg.gemini_api_key = std::env::var("GEMINI_API_KEY").ok();
        cfg.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        if let Ok(template) = std::env::var("PROMPT_TEMPLATE") {
            cfg.pipeline.template = Some(template);
        }

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            gemini_api_key: self.gemini_api_key.clone(),
            gemini_model: self.ai.gemini_model.clone(),
            openai_api_key: self.openai_api_key.clone(),
            openai_model: self.ai.openai_model.clone(),
        }
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .map_err(|_| ConfigError::Message(format!("{name} environment variable is required")))
}
