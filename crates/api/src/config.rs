/// HTTP listener settings. Defaults target a local frontend on Vite's port.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS, from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// Per-request timeout. Story generation can legitimately take minutes.
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background tasks after the listener closes.
    pub shutdown_timeout_secs: u64,
}

/// Request timeout used when `REQUEST_TIMEOUT_SECS` is unset or `0`.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173";

impl ServerConfig {
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3001`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `300`, also for `0`     |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    ///
    /// Panics on values that do not parse; this runs once at startup.
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_else(|_| parse_origins(DEFAULT_CORS_ORIGINS));

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parsed_env("PORT", DEFAULT_PORT),
            cors_origins,
            request_timeout_secs: effective_timeout(parsed_env(
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            shutdown_timeout_secs: parsed_env(
                "SHUTDOWN_TIMEOUT_SECS",
                DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            ),
        }
    }
}

fn parsed_env<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} has invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn effective_timeout(secs: u64) -> u64 {
    if secs == 0 {
        DEFAULT_REQUEST_TIMEOUT_SECS
    } else {
        secs
    }
}
