//! Configuration management for the client.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default mock endpoint.
pub const DEFAULT_REMOTE_URL: &str = "https://jsonplaceholder.typicode.com/posts";

/// How remote objects are read as quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoteMapping {
    /// `title` becomes the text, category is always "Server"
    #[default]
    Title,
    /// `body` becomes the text, the first word of `title` the category
    Body,
}

impl FromStr for RemoteMapping {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(RemoteMapping::Title),
            "body" => Ok(RemoteMapping::Body),
            _ => Err(ConfigError::Invalid {
                key: "QUOTEBOOK_REMOTE_MAPPING",
                value: s.to_string(),
            }),
        }
    }
}

/// How records sharing an id but not a text are settled during sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Ids are ignored, only the text rule applies
    #[default]
    ServerWins,
    /// Keep the local record on an id conflict
    KeepLocal,
    /// Keep the remote record on an id conflict
    KeepServer,
}

impl FromStr for ConflictPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server-wins" => Ok(ConflictPolicy::ServerWins),
            "keep-local" => Ok(ConflictPolicy::KeepLocal),
            "keep-server" => Ok(ConflictPolicy::KeepServer),
            _ => Err(ConfigError::Invalid {
                key: "QUOTEBOOK_CONFLICT_POLICY",
                value: s.to_string(),
            }),
        }
    }
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding persistent storage
    pub data_dir: PathBuf,
    /// Remote endpoint for fetch and publish
    pub remote_url: String,
    /// Remote entries considered per sync cycle
    pub remote_limit: usize,
    /// Remote object mapping
    pub remote_mapping: RemoteMapping,
    /// Period between automatic sync cycles
    pub sync_interval: Duration,
    /// Upper bound on a single remote fetch
    pub fetch_timeout: Duration,
    /// Id conflict handling
    pub conflict_policy: ConflictPolicy,
    /// File to import at startup
    pub import_file: Option<PathBuf>,
    /// File to export to at startup
    pub export_file: Option<PathBuf>,
    /// Category to select at startup
    pub category: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            remote_url: DEFAULT_REMOTE_URL.to_string(),
            remote_limit: 5,
            remote_mapping: RemoteMapping::default(),
            sync_interval: Duration::from_secs(15),
            fetch_timeout: Duration::from_secs(10),
            conflict_policy: ConflictPolicy::default(),
            import_file: None,
            export_file: None,
            category: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data_dir = lookup("QUOTEBOOK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let remote_url = lookup("QUOTEBOOK_REMOTE_URL").unwrap_or(defaults.remote_url);

        let remote_limit = match lookup("QUOTEBOOK_REMOTE_LIMIT") {
            Some(value) => parse_positive("QUOTEBOOK_REMOTE_LIMIT", &value)? as usize,
            None => defaults.remote_limit,
        };

        let remote_mapping = match lookup("QUOTEBOOK_REMOTE_MAPPING") {
            Some(value) => value.parse()?,
            None => defaults.remote_mapping,
        };

        let sync_interval = match lookup("QUOTEBOOK_SYNC_INTERVAL_SECS") {
            Some(value) => Duration::from_secs(parse_positive("QUOTEBOOK_SYNC_INTERVAL_SECS", &value)?),
            None => defaults.sync_interval,
        };

        let fetch_timeout = match lookup("QUOTEBOOK_FETCH_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(parse_positive("QUOTEBOOK_FETCH_TIMEOUT_SECS", &value)?),
            None => defaults.fetch_timeout,
        };

        let conflict_policy = match lookup("QUOTEBOOK_CONFLICT_POLICY") {
            Some(value) => value.parse()?,
            None => defaults.conflict_policy,
        };

        let import_file = lookup("QUOTEBOOK_IMPORT_FILE").map(PathBuf::from);
        let export_file = lookup("QUOTEBOOK_EXPORT_FILE").map(PathBuf::from);
        let category = lookup("QUOTEBOOK_CATEGORY").filter(|c| !c.trim().is_empty());

        Ok(Self {
            data_dir,
            remote_url,
            remote_limit,
            remote_mapping,
            sync_interval,
            fetch_timeout,
            conflict_policy,
            import_file,
            export_file,
            category,
        })
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.remote_url, DEFAULT_REMOTE_URL);
        assert_eq!(config.remote_limit, 5);
        assert_eq!(config.sync_interval, Duration::from_secs(15));
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.remote_mapping, RemoteMapping::Title);
        assert_eq!(config.conflict_policy, ConflictPolicy::ServerWins);
        assert!(config.import_file.is_none());
        assert!(config.category.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("QUOTEBOOK_DATA_DIR", "/tmp/quotes"),
            ("QUOTEBOOK_REMOTE_LIMIT", "10"),
            ("QUOTEBOOK_REMOTE_MAPPING", "Body"),
            ("QUOTEBOOK_SYNC_INTERVAL_SECS", "60"),
            ("QUOTEBOOK_CONFLICT_POLICY", "keep-local"),
            ("QUOTEBOOK_EXPORT_FILE", "quotes.json"),
            ("QUOTEBOOK_CATEGORY", "Life"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/quotes"));
        assert_eq!(config.remote_limit, 10);
        assert_eq!(config.remote_mapping, RemoteMapping::Body);
        assert_eq!(config.sync_interval, Duration::from_secs(60));
        assert_eq!(config.conflict_policy, ConflictPolicy::KeepLocal);
        assert_eq!(config.export_file, Some(PathBuf::from("quotes.json")));
        assert_eq!(config.category.as_deref(), Some("Life"));
    }

    #[test]
    fn invalid_values_are_errors() {
        for (key, value) in [
            ("QUOTEBOOK_REMOTE_LIMIT", "0"),
            ("QUOTEBOOK_SYNC_INTERVAL_SECS", "soon"),
            ("QUOTEBOOK_FETCH_TIMEOUT_SECS", "-1"),
            ("QUOTEBOOK_REMOTE_MAPPING", "author"),
            ("QUOTEBOOK_CONFLICT_POLICY", "coin-flip"),
        ] {
            let err = Config::from_lookup(lookup(&[(key, value)])).unwrap_err();
            assert!(err.to_string().contains(key), "{}", err);
        }
    }
}
