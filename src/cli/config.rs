//! Custody configuration file handling
//!
//! Provides default configuration generation and loading for the custody CLI.
//! Configuration files are TOML.
//!
//! ## Committee vs Runtime Settings
//!
//! The `[committee]` table is write-once in effect: once a ledger state file
//! exists, its committee is authoritative and a config that disagrees is
//! rejected. Execution and logging settings can change freely.

use custody::committee::Committee;
use custody::identity::AccountId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustodyConfig {
    pub committee: CommitteeConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Committee definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitteeConfig {
    /// Member identities: labels or 64-character hex
    pub members: Vec<String>,

    /// Confirmations required before a proposal may execute
    pub quorum: u32,
}

/// Execution engine settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Upper bound on a single custodian dispatch (humantime, e.g. "30s")
    pub dispatch_timeout: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl CustodyConfig {
    /// Create a configuration for the given committee
    pub fn new(members: Vec<String>, quorum: u32) -> Self {
        Self {
            committee: CommitteeConfig { members, quorum },
            execution: ExecutionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: CustodyConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(path, contents)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        Ok(())
    }

    /// Parse member entries into identities, in order
    pub fn member_ids(&self) -> Result<Vec<AccountId>, Box<dyn std::error::Error>> {
        self.committee
            .members
            .iter()
            .map(|m| {
                m.parse::<AccountId>()
                    .map_err(|e| -> Box<dyn std::error::Error> {
                        format!("Invalid committee member '{}': {}", m, e).into()
                    })
            })
            .collect()
    }

    /// Build and validate the committee
    pub fn committee(&self) -> Result<Committee, Box<dyn std::error::Error>> {
        Ok(Committee::new(self.member_ids()?, self.committee.quorum)?)
    }

    /// Parsed dispatch timeout, if configured
    pub fn dispatch_timeout(&self) -> Result<Option<Duration>, Box<dyn std::error::Error>> {
        match &self.execution.dispatch_timeout {
            Some(raw) => {
                let timeout = humantime::parse_duration(raw)
                    .map_err(|e| format!("Invalid dispatch_timeout '{}': {}", raw, e))?;
                Ok(Some(timeout))
            }
            None => Ok(None),
        }
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml() -> String {
        r#"# Custody Configuration
#
# The committee is fixed for the lifetime of a ledger. Once a state file
# exists, its committee is authoritative and must match this table.

[committee]
# Member identities: short labels (hashed into identities) or 64-char hex
members = ["alice", "bob", "carol"]

# Distinct member confirmations required before a proposal may execute
# Must be between 1 and the number of members
quorum = 2

[execution]
# Upper bound on a single custodian dispatch. A timed-out dispatch fails the
# execution and the proposal stays closed.
dispatch_timeout = "30s"

[logging]
# Log level: trace, debug, info, warn, error (RUST_LOG overrides)
level = "info"
"#
        .to_string()
    }

    /// Create and save a default configuration file
    pub fn create_default(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = Self::generate_default_toml();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(config_path, contents).map_err(|e| {
            format!(
                "Failed to write config file '{}': {}",
                config_path.display(),
                e
            )
        })?;

        Ok(())
    }
}

/// Get the default config file path
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("custody")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_toml_parses() {
        let config: CustodyConfig =
            toml::from_str(&CustodyConfig::generate_default_toml()).unwrap();
        assert_eq!(config.committee.members.len(), 3);
        assert_eq!(config.committee.quorum, 2);
        assert_eq!(config.logging.level, "info");
        assert_eq!(
            config.dispatch_timeout().unwrap(),
            Some(Duration::from_secs(30))
        );
        assert!(config.committee().is_ok());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let config = CustodyConfig::new(vec!["a".to_string(), "b".to_string()], 2);
        config.save(&config_path).unwrap();

        let loaded = CustodyConfig::load(&config_path).unwrap();
        assert_eq!(loaded.committee.members, vec!["a", "b"]);
        assert_eq!(loaded.committee.quorum, 2);
        assert_eq!(loaded.dispatch_timeout().unwrap(), None);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: CustodyConfig = toml::from_str(
            r#"
            [committee]
            members = ["a"]
            quorum = 1
            "#,
        )
        .unwrap();
        assert_eq!(config.logging.level, "info");
        assert!(config.execution.dispatch_timeout.is_none());
    }

    #[test]
    fn test_invalid_committee_rejected() {
        let config = CustodyConfig::new(vec!["a".to_string(), "a".to_string()], 1);
        assert!(config.committee().is_err());

        let config = CustodyConfig::new(vec!["a".to_string()], 2);
        assert!(config.committee().is_err());
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let mut config = CustodyConfig::new(vec!["a".to_string()], 1);
        config.execution.dispatch_timeout = Some("soon".to_string());
        assert!(config.dispatch_timeout().is_err());
    }

    #[test]
    fn test_create_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        CustodyConfig::create_default(&config_path).unwrap();
        assert!(config_path.exists());
        assert!(CustodyConfig::load(&config_path).is_ok());
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.ends_with("custody/config.toml"));
    }
}
