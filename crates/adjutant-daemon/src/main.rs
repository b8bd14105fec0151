//! Adjutant daemon — owns the shared stores and serves the REST/MCP/WS API
//! that the dashboard and connected agents talk to.

use anyhow::{Context, Result};
use adjutant_core::config::Config;
use adjutant_core::lockfile::DaemonLockfile;
use tracing::info;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    adjutant_telemetry::logging::init_logging("adjutant-daemon", "info");

    info!(version = env!("CARGO_PKG_VERSION"), pid = std::process::id(), "adjutant daemon starting");

    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    std::fs::create_dir_all(std::path::Path::new(&home).join(".adjutant")).ok();

    let mut config = load_config(&home).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        Config::default()
    });
    config.expand_home(&home);

    // --- Startup guard: check if a daemon is already running ---
    let replace_mode = std::env::args().any(|a| a == "--replace" || a == "-r");
    if let Some(existing) = DaemonLockfile::read_valid() {
        if replace_mode {
            info!(pid = existing.pid, "replacing existing daemon (--replace)");
            #[cfg(unix)]
            unsafe {
                libc::kill(existing.pid as i32, libc::SIGTERM);
            }
            tokio::time::sleep(std::time::Duration::from_secs(2)).await;
            DaemonLockfile::remove();
        } else {
            eprintln!(
                "adjutant daemon already running (pid={}, api={})\n\nHint: use --replace to restart it.",
                existing.pid,
                existing.api_url(),
            );
            std::process::exit(1);
        }
    }

    // If the config port is the default sentinel, bind an OS-assigned port
    // instead. Otherwise honor the explicit config value.
    let api_bind_addr = if config.daemon.port == 9876 {
        format!("{}:0", config.daemon.host)
    } else {
        format!("{}:{}", config.daemon.host, config.daemon.port)
    };
    let api_listener = tokio::net::TcpListener::bind(&api_bind_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {api_bind_addr}"))?;
    let api_port = api_listener.local_addr()?.port();
    info!(api_port, "API listener bound");

    let lockfile = DaemonLockfile {
        pid: std::process::id(),
        api_port,
        host: config.daemon.host.clone(),
        started_at: chrono::Utc::now().to_rfc3339(),
        workspace_root: Some(config.daemon.workspace_root.clone()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    if let Err(msg) = lockfile.acquire_or_fail() {
        eprintln!("failed to acquire lockfile: {msg}");
        std::process::exit(1);
    }
    info!(path = %DaemonLockfile::path().display(), "lockfile written");

    let daemon = adjutant_daemon::daemon::Daemon::new(config).await?;
    let shutdown = daemon.shutdown_handle();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            return;
        }
        info!("ctrl-c received, initiating shutdown");
        DaemonLockfile::remove();
        shutdown.trigger();
    });

    info!(api_port, "API server ready");

    let result = daemon.run_with_listener(api_listener).await;
    DaemonLockfile::remove();

    if let Err(e) = &result {
        tracing::error!(error = %e, "daemon execution failed");
    }
    result
}

fn load_config(home: &str) -> Result<Config> {
    let path = std::path::Path::new(home).join(".adjutant").join("config.toml");
    if path.exists() {
        let content = std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content).context("failed to parse config.toml")?;
        Ok(config)
    } else {
        info!(path = %path.display(), "no config file found, using defaults");
        Ok(Config::default())
    }
}
