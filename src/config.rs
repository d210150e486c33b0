use std::{env, path::PathBuf, time::Duration};

/// AppConfig
///
/// Holds the console's configuration. Immutable once loaded and shared with the
/// handlers through the application state.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Base URL of the gym REST backend, e.g. https://api.example-gym.com/api.
    pub api_base_url: String,
    // Address the console's HTTP server binds to.
    pub bind_addr: String,
    // JSON file the session (token + role) is persisted to between runs.
    pub session_file: PathBuf,
    // Optional JSON menu table replacing the built-in one.
    pub menu_file: Option<PathBuf>,
    // Upper bound for a single backend call.
    pub request_timeout: Duration,
    pub env: Env,
}

/// Env
///
/// Runtime context. Production insists on an explicit backend URL and logs as JSON.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_SESSION_FILE: &str = ".gym-console/session.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

impl Default for AppConfig {
    /// Safe values for tests; nothing here touches the environment.
    fn default() -> Self {
        Self {
            api_base_url: LOCAL_API_URL.to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            menu_file: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from the environment at startup.
    ///
    /// # Panics
    /// Panics when `GYM_API_URL` is missing in production, or when `API_TIMEOUT_SECS` is
    /// not a number. A console pointed at the wrong backend must not start.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let api_base_url = match env {
            Env::Production => {
                env::var("GYM_API_URL").expect("FATAL: GYM_API_URL must be set in production.")
            }
            Env::Local => env::var("GYM_API_URL").unwrap_or_else(|_| LOCAL_API_URL.to_string()),
        };

        let request_timeout = env::var("API_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>()
                    .expect("FATAL: API_TIMEOUT_SECS must be a whole number of seconds.")
            })
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            api_base_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            session_file: env::var("SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE)),
            menu_file: env::var("MENU_CONFIG").ok().map(PathBuf::from),
            request_timeout: Duration::from_secs(request_timeout),
            env,
        }
    }
}
