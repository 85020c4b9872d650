//! Server configuration.

use crate::error::Result;
use otter_history::CompactionPolicy;
use serde::{Deserialize, Serialize};

/// Configuration shared by every document actor a hub spawns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Pending requests a document actor queues before senders wait.
    pub mailbox_capacity: usize,
    /// Committed operations buffered per subscriber before it lags.
    pub broadcast_capacity: usize,
    /// History compaction policy.
    pub compaction: CompactionPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 64,
            broadcast_capacity: 256,
            compaction: CompactionPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Builder for server configuration.
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.config.mailbox_capacity = capacity;
        self
    }

    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.config.broadcast_capacity = capacity;
        self
    }

    pub fn compaction(mut self, policy: CompactionPolicy) -> Self {
        self.config.compaction = policy;
        self
    }

    pub fn auto_compact(mut self, enabled: bool) -> Self {
        self.config.compaction.auto_compact = enabled;
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_builder() {
        let config = ServerConfigBuilder::new()
            .mailbox_capacity(8)
            .broadcast_capacity(32)
            .auto_compact(false)
            .build();

        assert_eq!(config.mailbox_capacity, 8);
        assert_eq!(config.broadcast_capacity, 32);
        assert!(!config.compaction.auto_compact);
    }

    #[test]
    fn test_config_from_json() {
        let config =
            ServerConfig::from_json(r#"{"mailbox_capacity": 4, "compaction": {"keep_recent": 10}}"#)
                .unwrap();

        assert_eq!(config.mailbox_capacity, 4);
        assert_eq!(config.broadcast_capacity, 256);
        assert_eq!(config.compaction.keep_recent, 10);
        assert!(config.compaction.auto_compact);
    }

    #[test]
    fn test_config_from_bad_json() {
        let err = ServerConfig::from_json("{not json").unwrap_err();
        assert_eq!(err.code(), "SerializationError");
    }
}
