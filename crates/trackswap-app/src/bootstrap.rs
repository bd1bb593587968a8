use std::future::Future;
use std::sync::Arc;

use tracing::{error, info};
use trackswap_api::{ApiServer, ApiState};
use trackswap_config::RelayConfig;
use trackswap_qbit::QbClient;
use trackswap_telemetry::{GlobalContextGuard, LoggingConfig, Metrics, log_format_from_str};

use crate::error::{AppError, AppResult};

/// Dependencies required to bootstrap the relay.
pub(crate) struct BootstrapDependencies {
    config: RelayConfig,
    telemetry: Metrics,
    qbittorrent: QbClient,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the process environment.
    pub(crate) fn from_env() -> AppResult<Self> {
        let config =
            RelayConfig::from_env().map_err(|err| AppError::config("config.from_env", err))?;
        Self::from_config(config)
    }

    pub(crate) fn from_config(config: RelayConfig) -> AppResult<Self> {
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        let credentials = &config.qbittorrent;
        let qbittorrent = QbClient::new(
            credentials.base_url.clone(),
            credentials.username.clone(),
            credentials.password.clone(),
            credentials.timeout,
        )
        .map_err(|err| AppError::qb_client("qbittorrent.client", err))?;
        Ok(Self {
            config,
            telemetry,
            qbittorrent,
        })
    }
}

/// Entry point for the relay boot sequence.
///
/// # Errors
///
/// Returns an error if configuration is incomplete, logging cannot be
/// installed, or the listener fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    run_app_with(dependencies, shutdown_signal()).await
}

/// Boot sequence over injected dependencies; returns once `shutdown` resolves
/// and in-flight requests have drained.
pub(crate) async fn run_app_with<F>(
    dependencies: BootstrapDependencies,
    shutdown: F,
) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let BootstrapDependencies {
        config,
        telemetry,
        qbittorrent,
    } = dependencies;

    let logging = LoggingConfig {
        level: &config.logging.level,
        format: log_format_from_str(config.logging.format.as_deref()),
        ..LoggingConfig::default()
    };
    trackswap_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new("trackswap");

    let addr = config.listener.socket_addr();
    info!(
        qbittorrent = %config.qbittorrent.base_url,
        indexer = %config.indexer_name,
        placeholder = %config.rewrite.placeholder,
        "trackswap relay starting"
    );

    let state = ApiState::new(Arc::new(config), qbittorrent, telemetry);
    ApiServer::new(state)
        .serve(addr, shutdown)
        .await
        .map_err(|err| AppError::api_server("api_server.serve", err))?;

    info!("trackswap relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        // Without a signal handler the server runs until the process is killed.
        error!(error = %err, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;
    use trackswap_config::{ListenerSettings, LogSettings, QbCredentials, TrackerRewrite};

    fn config(http_port: u16) -> Result<RelayConfig> {
        Ok(RelayConfig {
            qbittorrent: QbCredentials {
                base_url: "http://127.0.0.1:8080".parse()?,
                username: "admin".to_string(),
                password: "adminadmin".to_string(),
                timeout: Duration::from_secs(5),
            },
            rewrite: TrackerRewrite::new("dummy.example", "real.example"),
            indexer_name: "MyTracker".to_string(),
            listener: ListenerSettings {
                bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
                http_port,
            },
            logging: LogSettings {
                level: "warn".to_string(),
                format: Some("pretty".to_string()),
            },
        })
    }

    #[test]
    fn dependencies_build_from_config() -> Result<()> {
        let dependencies = BootstrapDependencies::from_config(config(8000)?)?;
        assert_eq!(dependencies.config.indexer_name, "MyTracker");
        assert_eq!(
            dependencies.qbittorrent.base_url().as_str(),
            "http://127.0.0.1:8080/"
        );
        Ok(())
    }

    #[tokio::test]
    async fn run_app_with_stops_on_shutdown() -> Result<()> {
        // Port 0 lets the OS pick a free port.
        let dependencies = BootstrapDependencies::from_config(config(0)?)?;
        run_app_with(dependencies, async {}).await?;
        Ok(())
    }
}
