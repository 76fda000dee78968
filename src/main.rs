use anyhow::{Context, Result};
use std::path::PathBuf;
use tou_rates::config::Config;
use tou_rates::openei::OpenEiClient;
use tou_rates::refresh::RateCoordinator;
use tou_rates::service::RateService;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);

    let config = Config::load(config_path.as_deref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    tou_rates::logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))?;

    info!(
        version = tou_rates::VERSION,
        plan = %config.plan.rate_plan_id,
        "tou-rates starting up"
    );

    let client = OpenEiClient::new(&config.openei)?;
    if config.validate_on_startup {
        match client.validate_credential().await {
            Ok(()) => info!("OpenEI API key validated"),
            Err(e) if e.is_auth() => {
                error!("OpenEI API key rejected: {}", e);
                return Err(anyhow::anyhow!("Startup aborted: {}", e));
            }
            Err(e) => warn!("Could not validate OpenEI API key, continuing: {}", e),
        }
    }

    let coordinator = RateCoordinator::new(Box::new(client), &config);
    let mut service = RateService::new(coordinator, &config)?;

    #[cfg(feature = "web")]
    let web_task = if config.web.enabled {
        let status_rx = service.subscribe();
        let host = config.web.host.clone();
        let port = config.web.port;
        Some(tokio::spawn(async move {
            if let Err(e) = tou_rates::web::serve(status_rx, tou_rates::VERSION, &host, port).await
            {
                error!("Web server error: {}", e);
            }
        }))
    } else {
        None
    };

    let shutdown = service.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.send(()).ok();
        }
    });

    let result = service.run().await;

    #[cfg(feature = "web")]
    if let Some(task) = web_task {
        task.abort();
    }

    match result {
        Ok(()) => {
            info!("tou-rates shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Rate service failed: {}", e);
            Err(anyhow::anyhow!("Rate service error: {}", e))
        }
    }
}
