//! AirMouse host entry point.
//!
//! Wires the infrastructure services to the session coordinator and runs
//! until Ctrl-C:
//!
//! ```text
//! main()
//!  └─ load_config()            -- TOML config, defaults on first run
//!  └─ start services
//!       ├─ ConnectionManager   -- TCP accept/session thread
//!       ├─ DiscoveryResponder  -- UDP background thread
//!       └─ SessionCoordinator  -- Tokio task pumping session events
//! ```

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use airmouse_host::application::coordinator::{SessionCoordinator, StatusListener};
use airmouse_host::application::motion::{MotionController, PointerActuator};
use airmouse_host::infrastructure::actuator::headless::HeadlessPointerActuator;
use airmouse_host::infrastructure::network::connection_manager::ConnectionManager;
use airmouse_host::infrastructure::network::discovery::start_discovery_responder;
use airmouse_host::infrastructure::status::TracingStatusListener;
use airmouse_host::infrastructure::storage::config::{load_config, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config first: the log level default comes from it.
    let (config, config_err) = match load_config() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // Structured logging; `RUST_LOG` overrides the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.host.log_level.clone())),
        )
        .init();

    if let Some(e) = config_err {
        warn!("failed to load config, using defaults: {e}");
    }

    info!("AirMouse host starting");

    let bind_address: IpAddr = config
        .network
        .bind_address
        .parse()
        .context("invalid network.bind_address in config")?;

    // Shutdown flag shared across all background services.
    let running = Arc::new(AtomicBool::new(true));

    // ── Pointer and coordinator ───────────────────────────────────────────────
    let actuator: Arc<dyn PointerActuator> = Arc::new(HeadlessPointerActuator::new((
        config.screen.width,
        config.screen.height,
    )));
    let motion = MotionController::new(actuator);
    let status: Arc<dyn StatusListener> = Arc::new(TracingStatusListener);
    let coordinator = SessionCoordinator::new(motion, status);

    // ── TCP sessions ──────────────────────────────────────────────────────────
    let (mut server, events) = ConnectionManager::new(bind_address);
    let tcp_port = server.start().context("failed to start the session listener")?;

    // ── UDP discovery ─────────────────────────────────────────────────────────
    let advertised_port = Arc::new(AtomicU16::new(tcp_port));
    let mut responder = start_discovery_responder(
        config.network.discovery_port,
        bind_address,
        Arc::clone(&advertised_port),
        Arc::clone(&running),
    )
    .context("failed to start the discovery responder")?;

    // ── Event pump ────────────────────────────────────────────────────────────
    let pump = tokio::spawn(coordinator.run(events));

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    info!(
        "ready: devices discover this host on UDP {} and connect on TCP {}",
        responder.port(),
        tcp_port
    );

    loop {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if !running.load(Ordering::Relaxed) {
            break;
        }
    }

    // Orderly teardown: stop the listener, close the event channel so the
    // coordinator drains and stops the motion loop, then join discovery.
    server.stop();
    drop(server);
    let _ = pump.await;
    responder.join();

    info!("AirMouse host stopped");
    Ok(())
}
