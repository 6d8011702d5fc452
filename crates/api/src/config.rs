/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// PostgreSQL URL. `None` runs against the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub notification_queue_capacity: usize,
    /// Delivery attempts per channel; `1` disables retries.
    pub notification_max_attempts: u32,
    pub pact_sweep_interval_secs: u64,
    pub pact_invitation_expiry_days: i64,
    /// Grace days granted to newly created streaks.
    pub streak_grace_period_days: i32,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `HOST`                        | `0.0.0.0`               |
    /// | `PORT`                        | `3000`                  |
    /// | `CORS_ORIGINS`                | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                    |
    /// | `DATABASE_URL`                | unset (in-memory)       |
    /// | `DB_MAX_CONNECTIONS`          | `20`                    |
    /// | `NOTIFICATION_QUEUE_CAPACITY` | `256`                   |
    /// | `NOTIFICATION_MAX_ATTEMPTS`   | `1`                     |
    /// | `PACT_SWEEP_INTERVAL_SECS`    | `3600`                  |
    /// | `PACT_INVITATION_EXPIRY_DAYS` | `7`                     |
    /// | `STREAK_GRACE_PERIOD_DAYS`    | `0`                     |
    ///
    /// Panics on unparseable values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        Self {
            host,
            port: parse_env("PORT", 3000),
            cors_origins,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 30),
            database_url,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 20),
            notification_queue_capacity: parse_env(
                "NOTIFICATION_QUEUE_CAPACITY",
                habits_events::dispatcher::DEFAULT_QUEUE_CAPACITY,
            ),
            notification_max_attempts: parse_env("NOTIFICATION_MAX_ATTEMPTS", 1),
            pact_sweep_interval_secs: parse_env("PACT_SWEEP_INTERVAL_SECS", 3600),
            pact_invitation_expiry_days: parse_env(
                "PACT_INVITATION_EXPIRY_DAYS",
                habits_core::pacts::DEFAULT_INVITATION_EXPIRY_DAYS,
            ),
            streak_grace_period_days: parse_env("STREAK_GRACE_PERIOD_DAYS", 0),
        }
    }
}

fn parse_env<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} must be a valid {}: {e}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
