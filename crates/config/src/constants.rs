//! Centralized default values
//!
//! Defaults shared between `Settings` and the crates that read them, so a
//! value never has to be repeated in two places.

/// Conversation bookkeeping limits
pub mod conversation {
    /// Chat entries kept per conversation
    pub const HISTORY_LIMIT: usize = 15;

    /// Entries handed to the generative responder
    pub const CONTEXT_TURNS: usize = 6;

    /// Recently processed message ids kept for dedup
    pub const DEDUP_WINDOW: usize = 64;

    /// Idle records are evicted after this long (7 days)
    pub const IDLE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

    /// How often the server sweeps idle records
    pub const SWEEP_INTERVAL_SECS: u64 = 15 * 60;

    /// Minimum words before an English detection can switch the language
    pub const MIN_WORDS_FOR_LANGUAGE_SWITCH: usize = 3;
}

/// Generative backend defaults
pub mod llm {
    pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
    pub const TIMEOUT_MS: u64 = 12_000;
    pub const MAX_ATTEMPTS: u32 = 2;
    pub const RETRY_BACKOFF_MS: u64 = 250;
    pub const TEMPERATURE: f32 = 0.55;
    pub const MAX_TOKENS: u32 = 140;
    /// Lower creativity and length once questions are stopped
    pub const SUPPORT_TEMPERATURE: f32 = 0.4;
    pub const SUPPORT_MAX_TOKENS: u32 = 100;
}

/// WhatsApp Cloud API defaults
pub mod whatsapp {
    pub const GRAPH_API_BASE: &str = "https://graph.facebook.com/v18.0";
    pub const SEND_TIMEOUT_MS: u64 = 10_000;
    pub const SEND_MAX_ATTEMPTS: u32 = 2;
}

/// Server defaults
pub mod server {
    pub const HOST: &str = "0.0.0.0";
    pub const PORT: u16 = 8080;
    pub const WEBHOOK_PATH: &str = "/whatsapp/webhook";
}
