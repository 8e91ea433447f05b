use clap::Parser;

use crate::config::NodeConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "ledgersim-node")]
#[command(about = "LedgerSim node: peers, hash chains and quorum voting over REST + WebSocket")]
pub struct Args {
    /// Path to the JSON config. Created with defaults when missing.
    #[arg(long = "config", value_name = "FILE", default_value = "config.json")]
    pub config_path: String,

    /// Address the HTTP server binds to, e.g. 127.0.0.1:3000
    #[arg(long = "listen", value_name = "ADDR")]
    pub listen_addr: Option<String>,

    #[arg(long = "data-dir", value_name = "DIR")]
    pub data_dir: Option<String>,

    /// Quorum threshold in percent (strictly greater than)
    #[arg(long = "threshold", value_name = "PERCENT")]
    pub threshold: Option<u32>,

    /// Directory of the audit log
    #[arg(long = "log-dir", value_name = "DIR")]
    pub log_dir: Option<String>,
}

impl Args {
    /// Applies command line overrides on top of the file config.
    pub fn apply(&self, config: &mut NodeConfig) {
        if let Some(addr) = &self.listen_addr {
            config.listen_addr = addr.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(threshold) = self.threshold {
            config.quorum.threshold_percent = threshold;
        }
        if let Some(dir) = &self.log_dir {
            config.log_dir = dir.clone();
        }
    }

    /// Config used before logging is up: the file when it is already
    /// readable, defaults otherwise, with overrides applied.
    pub fn bootstrap_config(&self) -> NodeConfig {
        let mut config = NodeConfig::load_from_file(&self.config_path).unwrap_or_default();
        self.apply(&mut config);
        config
    }

    /// Name used for the audit log file: the config's parent directory,
    /// falling back to `node_name`.
    pub fn node_label(&self, config: &NodeConfig) -> String {
        std::path::Path::new(&self.config_path)
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| config.node_name.clone())
    }
}
