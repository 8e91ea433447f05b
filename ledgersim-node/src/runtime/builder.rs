use std::sync::Arc;

use ledgersim_common::Result;
use ledgersim_ledger::{LedgerService, SnapshotStore};

use crate::{api::rest::AppState, config::NodeConfig};

pub struct LedgerRuntime {
    pub config: NodeConfig,
    pub service: Arc<LedgerService>,
}

impl LedgerRuntime {
    pub fn app_state(&self) -> AppState {
        AppState::new(Arc::clone(&self.service))
    }

    /// Final snapshot write before the process exits.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("🛑 Encerrando nó [{}]...", self.config.node_name);
        self.service.shutdown().await
    }
}

/// Opens the snapshot store and restores the registry from it.
pub fn build_runtime(config: &NodeConfig) -> Result<LedgerRuntime> {
    let store = SnapshotStore::new(&config.data_dir, &config.snapshot_file)?;
    tracing::info!("📁 Snapshot em {:?}", store.path());

    let service = LedgerService::open(Arc::new(store), config.service_config())?;
    tracing::info!(
        "✅ Serviço de ledger pronto (limiar {}%, auto-registro {})",
        config.quorum.threshold_percent,
        config.auto_register_peers
    );

    Ok(LedgerRuntime {
        config: config.clone(),
        service: Arc::new(service),
    })
}
