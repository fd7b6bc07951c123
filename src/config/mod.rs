use std::env;
use std::time::Duration;

pub struct Config {
    pub backend: BackendConfig,
    pub timing: TimingConfig,
}

pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

/// Client-owned timing constants. These are tunable without altering the
/// protocol semantics: polling stays level-triggered and the clock guards
/// stay one-shot regardless of the intervals chosen here.
#[derive(Debug, Clone, Copy)]
pub struct TimingConfig {
    /// Interval for both the student status poll and the faculty queue poll
    pub poll_interval: Duration,
    /// Session clock tick granularity
    pub clock_tick: Duration,
    /// How far before the exam end the time warning fires
    pub warning_threshold: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            clock_tick: Duration::from_secs(1),
            warning_threshold: Duration::from_secs(5 * 60),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            backend: BackendConfig {
                base_url: env::var("BACKEND_URL")
                    .unwrap_or_else(|_| "http://127.0.0.1:8080/api".to_string()),
                request_timeout: duration_from_env_secs("REQUEST_TIMEOUT_SECS", 10),
            },
            timing: TimingConfig {
                poll_interval: duration_from_env_secs("POLL_INTERVAL_SECS", 3),
                clock_tick: duration_from_env_millis("CLOCK_TICK_MS", 1000),
                warning_threshold: duration_from_env_secs("WARNING_THRESHOLD_SECS", 300),
            },
        }
    }
}

fn duration_from_env_secs(key: &str, default_secs: u64) -> Duration {
    Duration::from_secs(parse_env_u64(key, default_secs))
}

fn duration_from_env_millis(key: &str, default_millis: u64) -> Duration {
    Duration::from_millis(parse_env_u64(key, default_millis))
}

fn parse_env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key = %key, value = %raw, "Unable to parse env var, using default");
                default
            }
        },
        Err(_) => default,
    }
}
