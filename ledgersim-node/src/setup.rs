use std::path::Path;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

use crate::config::NodeConfig;

/// Target of the per-mutation audit lines emitted by the ledger service.
pub const AUDIT_TARGET: &str = "ledger";

/// Writes a default config at `path` when none exists yet.
pub fn ensure_config(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        info!("⚠️ Config não encontrada. Gerando padrão em {}...", path);

        let uuid = uuid::Uuid::new_v4().to_string();
        let suffix = uuid.split('-').next().unwrap_or_default();
        let config = NodeConfig {
            node_name: format!("node-{}", suffix),
            ..Default::default()
        };

        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        config.save_to_file(path)?;
        info!("✅ Config gerada com sucesso! ({})", config.node_name);
    }
    Ok(())
}

/// Stdout gets everything the env filter lets through; the audit file only
/// gets the ledger target. Keep the guard alive for the process lifetime.
pub fn init_logging(log_dir: &str, node_label: &str) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, format!("audit-{}.log", node_label));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let audit_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            metadata.target() == AUDIT_TARGET
        }));

    let stdout_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,ledgersim_node=debug".into()),
    );

    tracing_subscriber::registry()
        .with(audit_layer)
        .with(stdout_layer)
        .try_init()?;

    Ok(guard)
}

pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let msg = match info.payload().downcast_ref::<&'static str>() {
            Some(s) => *s,
            None => match info.payload().downcast_ref::<String>() {
                Some(s) => &s[..],
                None => "Box<Any>",
            },
        };
        let location = match info.location() {
            Some(l) => format!("at {}:{}:{}", l.file(), l.line(), l.column()),
            None => "unknown location".to_string(),
        };
        let err_msg = format!("CRASH: {} {}\n", msg, location);
        eprintln!("{}", err_msg);
        let _ = std::fs::write("panic.log", err_msg);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_config_creates_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node-a").join("config.json");
        let path = path.to_str().unwrap();

        ensure_config(path).unwrap();
        let first = NodeConfig::load_from_file(path).unwrap();
        assert!(first.node_name.starts_with("node-"));

        ensure_config(path).unwrap();
        assert_eq!(NodeConfig::load_from_file(path).unwrap(), first);
    }
}
