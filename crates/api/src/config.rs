use enercast_core::prediction::{CompletionSignal, PredictCommand};

/// Upper bound for `JOB_STATUS_TTL_SECS` (one year).
pub const MAX_JOB_STATUS_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Which [`RecordStore`](enercast_db::RecordStore) implementation to run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgreSQL via `DATABASE_URL`.
    Postgres,
    /// Process memory. Data is lost on restart.
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

/// How prediction jobs are launched and when they count as complete.
#[derive(Debug, Clone, Default)]
pub struct PredictConfig {
    /// External program plus leading arguments.
    pub command: PredictCommand,
    /// Stdout condition that flips the completion flag.
    pub completion: CompletionSignal,
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Record store implementation (default: postgres).
    pub store_backend: StoreBackend,
    /// Prediction job settings.
    pub predict: PredictConfig,
    /// Age after which job status entries are evicted (default: one day).
    /// Always in `1..=MAX_JOB_STATUS_TTL_SECS`.
    pub job_status_ttl_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `STORE_BACKEND`         | `postgres`                 |
    /// | `PREDICT_PROGRAM`       | `python3`                  |
    /// | `PREDICT_ARGS`          | `./models/model.py`        |
    /// | `PREDICT_DONE_SENTINEL` | unset (any output)         |
    /// | `JOB_STATUS_TTL_SECS`   | `86400` (1s to one year)   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let store_backend: StoreBackend = std::env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".into())
            .parse()
            .expect("STORE_BACKEND must be 'postgres' or 'memory'");

        let defaults = PredictCommand::default();
        let program = std::env::var("PREDICT_PROGRAM").unwrap_or(defaults.program);
        let args = std::env::var("PREDICT_ARGS")
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or(defaults.args);

        let completion = match std::env::var("PREDICT_DONE_SENTINEL") {
            Ok(sentinel) if !sentinel.trim().is_empty() => {
                CompletionSignal::Sentinel(sentinel.trim().to_string())
            }
            _ => CompletionSignal::AnyOutput,
        };

        let job_status_ttl_secs = parse_job_status_ttl(
            &std::env::var("JOB_STATUS_TTL_SECS").unwrap_or_else(|_| "86400".into()),
        )
        .expect("Invalid JOB_STATUS_TTL_SECS");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            store_backend,
            predict: PredictConfig {
                command: PredictCommand { program, args },
                completion,
            },
            job_status_ttl_secs,
        }
    }
}

/// Parse a job status TTL in seconds, rejecting zero and values above
/// [`MAX_JOB_STATUS_TTL_SECS`].
pub fn parse_job_status_ttl(raw: &str) -> Result<u64, String> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("JOB_STATUS_TTL_SECS must be a positive integer: {e}"))?;
    if secs == 0 || secs > MAX_JOB_STATUS_TTL_SECS {
        return Err(format!(
            "JOB_STATUS_TTL_SECS must be between 1 and {MAX_JOB_STATUS_TTL_SECS}, got {secs}"
        ));
    }
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_accepts_values_in_range() {
        assert_eq!(parse_job_status_ttl("86400"), Ok(86400));
        assert_eq!(parse_job_status_ttl(" 1 "), Ok(1));
        assert_eq!(
            parse_job_status_ttl(&MAX_JOB_STATUS_TTL_SECS.to_string()),
            Ok(MAX_JOB_STATUS_TTL_SECS)
        );
    }

    #[test]
    fn ttl_rejects_zero_negative_and_huge_values() {
        assert!(parse_job_status_ttl("0").is_err());
        assert!(parse_job_status_ttl("-60").is_err());
        assert!(parse_job_status_ttl("9223372036854775807").is_err());
        assert!(parse_job_status_ttl("soon").is_err());
    }

    #[test]
    fn store_backend_parses_known_names() {
        assert_eq!("Postgres".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("redis".parse::<StoreBackend>().is_err());
    }
}
