//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{conversation, llm, server, whatsapp};
use crate::{ConfigError, ProjectCatalog, ScoringConfig, TemplatesConfig};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - missing credentials tolerated
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    /// WhatsApp Cloud API credentials and delivery limits
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Generative backend
    #[serde(default)]
    pub llm: LlmSettings,

    /// Per-conversation limits and policies
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Intent weights, penalties and rank thresholds
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Reply template pools
    #[serde(default)]
    pub templates: TemplatesConfig,

    #[serde(default)]
    pub handoff: HandoffConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Path to the project catalog (YAML)
    #[serde(default = "default_project_path")]
    pub project_path: String,
}

fn default_project_path() -> String {
    "config/project.yaml".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins; empty means permissive in development
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    server::HOST.to_string()
}
fn default_port() -> u16 {
    server::PORT
}
fn default_request_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_request_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// Token Meta echoes back during webhook verification
    #[serde(default = "default_verify_token")]
    pub verify_token: String,

    /// Graph API bearer token
    #[serde(default = "default_access_token")]
    pub access_token: String,

    #[serde(default = "default_phone_number_id")]
    pub phone_number_id: String,

    #[serde(default = "default_graph_api_base")]
    pub api_base: String,

    #[serde(default = "default_send_timeout")]
    pub send_timeout_ms: u64,

    #[serde(default = "default_send_attempts")]
    pub send_max_attempts: u32,

    /// Log replies instead of calling the Graph API
    #[serde(default)]
    pub dry_run: bool,
}

fn default_verify_token() -> String {
    std::env::var("WHATSAPP_VERIFY_TOKEN").unwrap_or_default()
}
fn default_access_token() -> String {
    std::env::var("WHATSAPP_TOKEN").unwrap_or_default()
}
fn default_phone_number_id() -> String {
    std::env::var("PHONE_NUMBER_ID").unwrap_or_default()
}
fn default_graph_api_base() -> String {
    whatsapp::GRAPH_API_BASE.to_string()
}
fn default_send_timeout() -> u64 {
    whatsapp::SEND_TIMEOUT_MS
}
fn default_send_attempts() -> u32 {
    whatsapp::SEND_MAX_ATTEMPTS
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            verify_token: default_verify_token(),
            access_token: default_access_token(),
            phone_number_id: default_phone_number_id(),
            api_base: default_graph_api_base(),
            send_timeout_ms: default_send_timeout(),
            send_max_attempts: default_send_attempts(),
            dry_run: false,
        }
    }
}

impl WhatsAppConfig {
    /// Messages endpoint for the configured phone number
    pub fn messages_url(&self) -> String {
        format!(
            "{}/{}/messages",
            self.api_base.trim_end_matches('/'),
            self.phone_number_id
        )
    }

    pub fn has_credentials(&self) -> bool {
        !self.access_token.is_empty() && !self.phone_number_id.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Disable to run on templates and fixed replies only
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// OpenAI-compatible base URL
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_llm_api_key")]
    pub api_key: Option<String>,

    /// Per-attempt timeout
    #[serde(default = "default_llm_timeout")]
    pub timeout_ms: u64,

    #[serde(default = "default_llm_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_llm_backoff")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Used once a conversation stops asking questions
    #[serde(default = "default_support_temperature")]
    pub support_temperature: f32,

    #[serde(default = "default_support_max_tokens")]
    pub support_max_tokens: u32,
}

fn default_llm_endpoint() -> String {
    llm::DEFAULT_ENDPOINT.to_string()
}
fn default_llm_model() -> String {
    llm::DEFAULT_MODEL.to_string()
}
fn default_llm_api_key() -> Option<String> {
    std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())
}
fn default_llm_timeout() -> u64 {
    llm::TIMEOUT_MS
}
fn default_llm_attempts() -> u32 {
    llm::MAX_ATTEMPTS
}
fn default_llm_backoff() -> u64 {
    llm::RETRY_BACKOFF_MS
}
fn default_temperature() -> f32 {
    llm::TEMPERATURE
}
fn default_max_tokens() -> u32 {
    llm::MAX_TOKENS
}
fn default_support_temperature() -> f32 {
    llm::SUPPORT_TEMPERATURE
}
fn default_support_max_tokens() -> u32 {
    llm::SUPPORT_MAX_TOKENS
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: default_llm_api_key(),
            timeout_ms: default_llm_timeout(),
            max_attempts: default_llm_attempts(),
            retry_backoff_ms: default_llm_backoff(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            support_temperature: default_support_temperature(),
            support_max_tokens: default_support_max_tokens(),
        }
    }
}

/// What happens to messages arriving after a handoff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PostHandoffPolicy {
    /// Never reply again
    #[default]
    Silent,
    /// Send one fixed "advisor will connect" reply, then stay silent
    AcknowledgeOnce,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Entries passed to the generative responder
    #[serde(default = "default_context_turns")]
    pub context_turns: usize,

    #[serde(default = "default_dedup_window")]
    pub dedup_window: usize,

    /// Evict records idle for this long; 0 disables eviction
    #[serde(default = "default_idle_ttl")]
    pub idle_ttl_secs: u64,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    #[serde(default)]
    pub post_handoff: PostHandoffPolicy,

    #[serde(default = "default_min_words_for_switch")]
    pub min_words_for_language_switch: usize,

    /// Phrases that make the agent stop asking questions
    #[serde(default = "default_irritation_phrases")]
    pub irritation_phrases: Vec<String>,
}

fn default_history_limit() -> usize {
    conversation::HISTORY_LIMIT
}
fn default_context_turns() -> usize {
    conversation::CONTEXT_TURNS
}
fn default_dedup_window() -> usize {
    conversation::DEDUP_WINDOW
}
fn default_idle_ttl() -> u64 {
    conversation::IDLE_TTL_SECS
}
fn default_sweep_interval() -> u64 {
    conversation::SWEEP_INTERVAL_SECS
}
fn default_min_words_for_switch() -> usize {
    conversation::MIN_WORDS_FOR_LANGUAGE_SWITCH
}
fn default_irritation_phrases() -> Vec<String> {
    [
        "stop asking",
        "too many questions",
        "don't ask",
        "dont ask",
        "bas karo",
        "sawal mat",
        "just answer",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            context_turns: default_context_turns(),
            dedup_window: default_dedup_window(),
            idle_ttl_secs: default_idle_ttl(),
            sweep_interval_secs: default_sweep_interval(),
            post_handoff: PostHandoffPolicy::default(),
            min_words_for_language_switch: default_min_words_for_switch(),
            irritation_phrases: default_irritation_phrases(),
        }
    }
}

/// Where handoff events go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HandoffSinkKind {
    /// Structured log line only
    #[default]
    Log,
    /// Append JSON lines to `jsonl_path`
    Jsonl,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffConfig {
    /// Phrases that escalate regardless of intent or rank
    #[serde(default = "default_handoff_phrases")]
    pub phrases: Vec<String>,

    #[serde(default)]
    pub sink: HandoffSinkKind,

    #[serde(default = "default_jsonl_path")]
    pub jsonl_path: String,
}

fn default_handoff_phrases() -> Vec<String> {
    [
        "call me",
        "talk to agent",
        "talk to someone",
        "speak to agent",
        "site visit",
        "visit karna",
        "call karo",
        "call back",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_jsonl_path() -> String {
    "data/leads.jsonl".to_string()
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            phrases: default_handoff_phrases(),
            sink: HandoffSinkKind::default(),
            jsonl_path: default_jsonl_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,

    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_conversation()?;
        self.validate_llm()?;
        self.validate_whatsapp()?;
        self.scoring.validate()?;
        self.templates.validate()?;
        Ok(())
    }

    /// Load the project catalog named by `project_path`.
    ///
    /// A missing file yields an empty catalog; the agent then asks users
    /// which project they mean.
    pub fn load_projects(&self) -> Result<ProjectCatalog, ConfigError> {
        if !std::path::Path::new(&self.project_path).exists() {
            tracing::warn!(path = %self.project_path, "Project catalog not found, starting empty");
            return Ok(ProjectCatalog::default());
        }
        ProjectCatalog::load(&self.project_path)
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        Ok(())
    }

    fn validate_conversation(&self) -> Result<(), ConfigError> {
        let conv = &self.conversation;

        if !(1..=conversation::HISTORY_LIMIT).contains(&conv.history_limit) {
            return Err(ConfigError::InvalidValue {
                field: "conversation.history_limit".to_string(),
                message: format!(
                    "Must be between 1 and {}, got {}",
                    conversation::HISTORY_LIMIT,
                    conv.history_limit
                ),
            });
        }

        if conv.context_turns == 0 || conv.context_turns > conv.history_limit {
            return Err(ConfigError::InvalidValue {
                field: "conversation.context_turns".to_string(),
                message: format!(
                    "Must be between 1 and history_limit ({}), got {}",
                    conv.history_limit, conv.context_turns
                ),
            });
        }

        if conv.dedup_window == 0 {
            return Err(ConfigError::InvalidValue {
                field: "conversation.dedup_window".to_string(),
                message: "Must keep at least one message id".to_string(),
            });
        }

        if conv.idle_ttl_secs > 0 && conv.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "conversation.sweep_interval_secs".to_string(),
                message: "Sweep interval must be positive when idle TTL is enabled".to_string(),
            });
        }

        Ok(())
    }

    fn validate_llm(&self) -> Result<(), ConfigError> {
        let llm = &self.llm;

        if !(1..=2).contains(&llm.max_attempts) {
            return Err(ConfigError::InvalidValue {
                field: "llm.max_attempts".to_string(),
                message: format!("Must be 1 or 2, got {}", llm.max_attempts),
            });
        }

        if llm.timeout_ms == 0 || llm.timeout_ms > 30_000 {
            return Err(ConfigError::InvalidValue {
                field: "llm.timeout_ms".to_string(),
                message: format!("Must be between 1 and 30000, got {}", llm.timeout_ms),
            });
        }

        for (field, value) in [
            ("llm.temperature", llm.temperature),
            ("llm.support_temperature", llm.support_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("Must be between 0.0 and 2.0, got {}", value),
                });
            }
        }

        if llm.enabled && self.environment.is_strict() && llm.api_key.is_none() {
            return Err(ConfigError::MissingField("llm.api_key".to_string()));
        }

        Ok(())
    }

    fn validate_whatsapp(&self) -> Result<(), ConfigError> {
        let wa = &self.whatsapp;

        if !(1..=3).contains(&wa.send_max_attempts) {
            return Err(ConfigError::InvalidValue {
                field: "whatsapp.send_max_attempts".to_string(),
                message: format!("Must be between 1 and 3, got {}", wa.send_max_attempts),
            });
        }

        if self.environment.is_strict() && !wa.dry_run {
            if wa.access_token.is_empty() {
                return Err(ConfigError::MissingField("whatsapp.access_token".to_string()));
            }
            if wa.phone_number_id.is_empty() {
                return Err(ConfigError::MissingField("whatsapp.phone_number_id".to_string()));
            }
            if wa.verify_token.is_empty() {
                return Err(ConfigError::MissingField("whatsapp.verify_token".to_string()));
            }
        }

        Ok(())
    }
}

/// Load settings from files and environment
///
/// Priority (highest first): `LEAD_AGENT__*` environment variables,
/// `config/{env}.yaml`, `config/default.yaml`, built-in defaults.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::with_name("config/default").required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("LEAD_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.conversation.history_limit, 15);
        assert_eq!(settings.conversation.context_turns, 6);
        assert_eq!(settings.conversation.post_handoff, PostHandoffPolicy::Silent);
        assert_eq!(settings.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn test_default_settings_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_history_limit_validation() {
        let mut settings = Settings::default();
        settings.conversation.history_limit = 0;
        assert!(settings.validate_conversation().is_err());

        settings.conversation.history_limit = 16;
        assert!(settings.validate_conversation().is_err());

        settings.conversation.history_limit = 10;
        assert!(settings.validate_conversation().is_ok());
    }

    #[test]
    fn test_context_turns_cannot_exceed_history() {
        let mut settings = Settings::default();
        settings.conversation.history_limit = 4;
        settings.conversation.context_turns = 6;
        assert!(settings.validate_conversation().is_err());
    }

    #[test]
    fn test_llm_attempts_are_bounded() {
        let mut settings = Settings::default();
        settings.llm.max_attempts = 0;
        assert!(settings.validate_llm().is_err());
        settings.llm.max_attempts = 3;
        assert!(settings.validate_llm().is_err());
        settings.llm.max_attempts = 2;
        assert!(settings.validate_llm().is_ok());
    }

    #[test]
    fn test_production_requires_credentials() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        settings.whatsapp.access_token.clear();
        settings.whatsapp.dry_run = false;
        assert!(matches!(
            settings.validate_whatsapp(),
            Err(ConfigError::MissingField(_))
        ));

        settings.whatsapp.dry_run = true;
        assert!(settings.validate_whatsapp().is_ok());
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_messages_url() {
        let wa = WhatsAppConfig {
            phone_number_id: "12345".to_string(),
            api_base: "https://graph.facebook.com/v18.0/".to_string(),
            ..WhatsAppConfig::default()
        };
        assert_eq!(
            wa.messages_url(),
            "https://graph.facebook.com/v18.0/12345/messages"
        );
    }

    #[test]
    fn test_settings_from_yaml() {
        let yaml = r#"
environment: development
conversation:
  post_handoff: acknowledge_once
  context_turns: 4
scoring:
  thresholds:
    hot: 50
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            settings.conversation.post_handoff,
            PostHandoffPolicy::AcknowledgeOnce
        );
        assert_eq!(settings.conversation.context_turns, 4);
        assert_eq!(settings.conversation.history_limit, 15);
        assert_eq!(settings.scoring.thresholds.hot, 50);
        assert_eq!(settings.scoring.thresholds.warm, 15);
    }
}
