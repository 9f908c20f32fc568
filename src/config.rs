use std::path::PathBuf;

use tracing::{debug, info};

/// Runtime configuration, built once at startup and passed explicitly into
/// the operations that need it. There is no process-wide mutable state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential for the external summarisation service. Optional: without
    /// it everything except summaries keeps working.
    pub api_key: Option<String>,
    /// Override for the summarisation endpoint base URL.
    pub api_base: Option<String>,
    /// Directory for the rotating diagnostic log.
    pub log_dir: PathBuf,
}

const API_KEY_VAR: &str = "OPENAI_API_KEY";
const API_BASE_VAR: &str = "OPENAI_API_BASE";
const LOG_DIR_VAR: &str = "FILECONV_LOG_DIR";

impl Config {
    /// Build configuration from the environment (after `.env` loading, which
    /// the binary entrypoint handles).
    pub fn from_env() -> Config {
        let api_key = std::env::var(API_KEY_VAR).ok().filter(|k| !k.is_empty());
        let api_base = std::env::var(API_BASE_VAR).ok().filter(|b| !b.is_empty());
        let log_dir = std::env::var(LOG_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        Config {
            api_key,
            api_base,
            log_dir,
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            api_key_present = self.api_key.is_some(),
            api_base_overridden = self.api_base.is_some(),
            log_dir = %self.log_dir.display(),
            "Loaded Config"
        );
        debug!(
            api_base = self.api_base.as_deref().unwrap_or("default"),
            "Config detail"
        );
    }
}
