use serde::Deserialize;

pub const DEFAULT_PORT: u16 = 5600;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub upload_dir: String,
    /// Per-file upload limit in bytes.
    pub max_file_size: usize,
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenAiConfig {
    pub api_base: String,
    pub api_key: String,
    pub default_model: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub provider: String,
    pub openai: OpenAiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnswerConfig {
    pub max_chars: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    pub answer: AnswerConfig,
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();

        let settings = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", DEFAULT_PORT as i64)?
            .set_default("storage.upload_dir", "uploads")?
            .set_default("storage.max_file_size", 1024_i64 * 1024 * 1024)?
            .set_default("storage.allowed_extensions", vec!["txt"])?
            .set_default("llm.provider", "openai")?
            .set_default("llm.openai.api_base", "https://api.openai.com/v1")?
            .set_default("llm.openai.api_key", "${OPENAI_API_KEY}")?
            .set_default("llm.openai.default_model", "gpt-4.1-nano-2025-04-14")?
            .set_default("answer.max_chars", 10_000_i64)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("ASKDOCS").separator("__"))
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;

        // Expand environment variables if present like ${OPENAI_API_KEY}
        app_config.server.host = expand_env(&app_config.server.host);
        app_config.storage.upload_dir = expand_env(&app_config.storage.upload_dir);
        app_config.llm.openai.api_key = expand_env(&app_config.llm.openai.api_key);

        if let Ok(port) = std::env::var("PORT") {
            app_config.server.port = port.trim().parse().map_err(|_| {
                config::ConfigError::Message(format!("PORT is not a valid port number: {}", port))
            })?;
        }

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                app_config.llm.openai.api_key = key;
            }
        }

        app_config.validate()?;
        Ok(app_config)
    }

    /// Startup is refused when the provider has no credentials.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.llm.provider == "openai" && self.llm.openai.api_key.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "Please set the OPENAI_API_KEY environment variable.".to_string(),
            ));
        }
        if self.answer.max_chars == 0 {
            return Err(config::ConfigError::Message(
                "answer.max_chars must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn expand_env(val: &str) -> String {
    if val.starts_with("${") && val.ends_with('}') {
        let var_name = &val[2..val.len() - 1];
        std::env::var(var_name).unwrap_or_default()
    } else {
        val.to_string()
    }
}
