use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0} is required")]
pub struct MissingConfig(&'static str);

/// Service configuration, read once from the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,

    /// Base URL of the public retrofit map, used in developer-facing links.
    pub retrofit_map_url: String,

    /// Base URL of the manager preferences page; the unsubscribe token is
    /// appended as a query parameter.
    pub preferences_url: String,

    /// Present only when outgoing mail is configured.
    pub brevo: Option<BrevoConfig>,
}

#[derive(Debug, Clone)]
pub struct BrevoConfig {
    pub api_key: String,
    pub sender_email: String,
    pub sender_name: Option<String>,
}

pub fn normalize_env_value(raw: String) -> String {
    let trimmed = raw.trim();

    if let Some(inner) = trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return inner.trim().to_string();
    }
    if let Some(inner) = trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        return inner.trim().to_string();
    }

    trimmed.to_string()
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(normalize_env_value)
        .filter(|s| !s.is_empty())
}

fn require_env(key: &'static str) -> Result<String, MissingConfig> {
    env_string(key).ok_or(MissingConfig(key))
}

impl Config {
    pub fn from_env() -> Result<Self, MissingConfig> {
        let brevo = match env_string("BREVO_API_KEY") {
            Some(api_key) => Some(BrevoConfig {
                api_key,
                sender_email: require_env("BREVO_SENDER_EMAIL")?,
                sender_name: env_string("BREVO_SENDER_NAME"),
            }),
            None => None,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            retrofit_map_url: require_env("RETROFIT_MAP_URL")?,
            preferences_url: require_env("PREFERENCES_URL")?,
            brevo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_quotes_and_whitespace() {
        assert_eq!(normalize_env_value("  plain  ".into()), "plain");
        assert_eq!(normalize_env_value("\"quoted\"".into()), "quoted");
        assert_eq!(normalize_env_value("' single '".into()), "single");
    }
}
