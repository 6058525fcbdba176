//! Connection settings.

use serde::Deserialize;

/// Environment variable holding the database URL.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Environment variable holding the pool size.
pub const MAX_CONNECTIONS_VAR: &str = "DATABASE_MAX_CONNECTIONS";

/// SQLite pool settings.
///
/// Deserializes from any serde format; missing fields take their defaults.
///
/// ```rust
/// use quarry_sqlite::SqliteConfig;
///
/// let config: SqliteConfig = serde_json::from_str(r#"{ "url": "sqlite://app.db" }"#).unwrap();
/// assert_eq!(config.url, "sqlite://app.db");
/// assert_eq!(config.max_connections, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Database URL, e.g. `sqlite://app.db` or `sqlite::memory:`.
    pub url: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            url: String::from("sqlite::memory:"),
            max_connections: 5,
        }
    }
}

impl SqliteConfig {
    /// Creates settings for `url` with the default pool size.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Sets the maximum number of pooled connections.
    #[must_use]
    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Reads settings from `DATABASE_URL` and `DATABASE_MAX_CONNECTIONS`,
    /// falling back to the defaults for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            url: lookup(DATABASE_URL_VAR).unwrap_or(defaults.url),
            max_connections: lookup(MAX_CONNECTIONS_VAR)
                .and_then(|n| n.trim().parse().ok())
                .unwrap_or(defaults.max_connections),
        }
    }
}
