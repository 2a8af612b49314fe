use std::net::SocketAddr;

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    pub health_bind_addr: SocketAddr,

    pub scrape_interval_minutes: u64,
    pub pending_poll_interval_secs: u64,
    pub per_source_estimate_secs: u64,

    pub ai_enabled: bool,
    pub openai_api_key: Option<String>,
    pub openai_api_base: Option<String>,
    pub openai_model: String,

    pub bright_data_api_token: Option<String>,

    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub source_delay_ms: u64,
    pub poll_max_attempts: u32,
    pub poll_interval_secs: u64,

    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("health_bind_addr", &self.health_bind_addr)
            .field("scrape_interval_minutes", &self.scrape_interval_minutes)
            .field(
                "pending_poll_interval_secs",
                &self.pending_poll_interval_secs,
            )
            .field("per_source_estimate_secs", &self.per_source_estimate_secs)
            .field("ai_enabled", &self.ai_enabled)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("openai_api_base", &self.openai_api_base)
            .field("openai_model", &self.openai_model)
            .field(
                "bright_data_api_token",
                &self.bright_data_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("source_delay_ms", &self.source_delay_ms)
            .field("poll_max_attempts", &self.poll_max_attempts)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// True when both the AI feature flag is on and a provider credential is
    /// configured. Both stages of enrichment check this before any call.
    #[must_use]
    pub fn ai_available(&self) -> bool {
        self.ai_enabled && self.openai_api_key.is_some()
    }
}
