use std::env;
use std::time::Duration;

pub const DEFAULT_MIN_CALL_INTERVAL_MS: u64 = 2500;

/// Environment-driven configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub upstream_url: String,
    pub upstream_model: String,
    /// Absent credential is a misconfiguration: the server still starts (so
    /// the liveness probe answers) but every chat request is refused.
    pub api_key: Option<String>,
    pub min_call_interval: Duration,
    pub host: String,
    pub port: u16,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self {
            upstream_url: env::var("UPSTREAM_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            upstream_model: env::var("UPSTREAM_MODEL")
                .unwrap_or_else(|_| "local-model".to_string()),
            api_key: env::var("UPSTREAM_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            min_call_interval: parse_interval(env::var("MIN_CALL_INTERVAL_MS").ok()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8080),
        }
    }
}

fn parse_interval(raw: Option<String>) -> Duration {
    let millis = raw
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_MIN_CALL_INTERVAL_MS);
    Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_defaults_when_unset_or_unparsable() {
        let expected = Duration::from_millis(DEFAULT_MIN_CALL_INTERVAL_MS);
        assert_eq!(parse_interval(None), expected);
        assert_eq!(parse_interval(Some("soon".to_string())), expected);
    }

    #[test]
    fn interval_honors_an_explicit_value() {
        assert_eq!(
            parse_interval(Some("100".to_string())),
            Duration::from_millis(100)
        );
    }
}
