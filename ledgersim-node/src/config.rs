use std::{fs, io, path::PathBuf};

use serde::{Deserialize, Serialize};

use ledgersim_consensus::QuorumPolicy;
use ledgersim_ledger::service::LedgerServiceConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub node_name: String,
    pub listen_addr: String,
    pub data_dir: String,
    pub snapshot_file: String,
    pub quorum: QuorumPolicy,
    pub auto_register_peers: bool,
    pub broadcast_capacity: usize,
    pub log_dir: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_name: "ledgersim".to_string(),
            listen_addr: "0.0.0.0:3000".to_string(),
            data_dir: "data".to_string(),
            snapshot_file: "blockchain.json".to_string(),
            quorum: QuorumPolicy::default(),
            auto_register_peers: false,
            broadcast_capacity: 64,
            log_dir: "logs".to_string(),
        }
    }
}

impl NodeConfig {
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        fs::write(path, json)
    }

    pub fn load_from_file(path: &str) -> io::Result<Self> {
        let data = fs::read_to_string(path)?;
        let parsed = serde_json::from_str::<NodeConfig>(&data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> io::Result<()> {
        if self.quorum.threshold_percent > 100 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("quorum threshold must be 0..=100, got {}", self.quorum.threshold_percent),
            ));
        }
        if self.snapshot_file.trim().is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "snapshot_file is empty"));
        }
        Ok(())
    }

    pub fn snapshot_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.snapshot_file)
    }

    pub fn service_config(&self) -> LedgerServiceConfig {
        LedgerServiceConfig {
            quorum: self.quorum,
            broadcast_capacity: self.broadcast_capacity,
            auto_register_peers: self.auto_register_peers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = NodeConfig { node_name: "node-a".to_string(), ..Default::default() };

        config.save_to_file(&path).unwrap();
        let loaded = NodeConfig::load_from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"node_name":"partial","quorum":{"threshold_percent":50}}"#).unwrap();

        let loaded = NodeConfig::load_from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.node_name, "partial");
        assert_eq!(loaded.quorum.threshold_percent, 50);
        assert_eq!(loaded.listen_addr, "0.0.0.0:3000");
        assert_eq!(loaded.snapshot_path(), PathBuf::from("data").join("blockchain.json"));
    }

    #[test]
    fn test_threshold_above_hundred_is_refused() {
        let config = NodeConfig { quorum: QuorumPolicy::new(101), ..Default::default() };
        assert_eq!(config.validate().unwrap_err().kind(), io::ErrorKind::InvalidData);
    }
}
