use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// AppConfig
///
/// Holds the client's entire configuration state. Immutable once loaded; it is cloned
/// into the `PortalContext` and read by the request client and the CLI.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Versioned base URL of the portal API, e.g. `https://portal.example.org/api/v1`.
    pub api_url: String,
    // Directory holding the durable client storage file.
    pub state_dir: PathBuf,
    // Upper bound for a single HTTP exchange.
    pub http_timeout: Duration,
    // Runtime environment marker. Selects the log format and config strictness.
    pub env: Env,
}

/// Env
///
/// Defines the runtime context: `Local` tolerates missing settings and logs for humans,
/// `Production` requires every setting and logs JSON.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

pub const DEFAULT_API_URL: &str = "http://localhost:5001/api/v1";
pub const DEFAULT_STATE_DIR: &str = ".sip-portal";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

impl Default for AppConfig {
    /// default
    ///
    /// Safe, non-panicking values for test setup. Lets tests build a context without
    /// touching environment variables.
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables (call `dotenv` first).
    ///
    /// # Panics
    /// Panics in `Production` when `SIP_API_URL` is not set, so a misconfigured
    /// deployment never silently talks to the local default.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let api_url = match env {
            Env::Production => {
                env::var("SIP_API_URL").expect("FATAL: SIP_API_URL must be set in production.")
            }
            Env::Local => env::var("SIP_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        };

        let state_dir = env::var("SIP_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_DIR));

        // A malformed timeout falls back to the default instead of aborting startup.
        let http_timeout = env::var("SIP_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));

        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            state_dir,
            http_timeout,
            env,
        }
    }
}
