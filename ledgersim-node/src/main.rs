use clap::Parser;
use tracing::{error, info, warn};

use ledgersim_node::{
    api::rest::start_rest_api,
    build_runtime,
    cli::Args,
    config::NodeConfig,
    setup::{ensure_config, init_logging, install_panic_hook},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Parse Arguments
    let args = Args::parse();

    // 2. Initialize Logging before anything can log (guard must outlive the server)
    install_panic_hook();
    let bootstrap = args.bootstrap_config();
    let _guard = init_logging(&bootstrap.log_dir, &args.node_label(&bootstrap))?;

    // 3. Setup Config
    ensure_config(&args.config_path)?;
    let mut config = NodeConfig::load_from_file(&args.config_path)?;
    args.apply(&mut config);
    config.validate()?;
    if config.log_dir != bootstrap.log_dir {
        warn!("⚠️ log_dir mudou para {} após gerar a config; auditoria segue em {}", config.log_dir, bootstrap.log_dir);
    }

    info!("--- INICIANDO NÓ LEDGERSIM ---");
    info!("Config: {}", args.config_path);
    info!("Endereço HTTP: {}", config.listen_addr);

    // 4. Start Runtime
    let runtime = match build_runtime(&config) {
        Ok(rt) => {
            info!("Nó iniciado com sucesso. Pressione Ctrl+C para parar.");
            rt
        }
        Err(e) => {
            error!("Falha ao iniciar o nó: {}.", e);
            return Err(e.into());
        }
    };

    // 5. Serve until Ctrl+C
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("⚠️ Falha ao escutar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    start_rest_api(&config.listen_addr, runtime.app_state(), shutdown).await?;

    // 6. Final persist
    runtime.shutdown().await?;
    info!("Nó encerrado.");
    Ok(())
}
