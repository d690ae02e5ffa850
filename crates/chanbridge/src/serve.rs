// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chanbridge serve` command implementation.
//!
//! Resolves the replica identity, opens the layered SQLite store, connects
//! the Telegram backend, and runs the reconciler, the forwarder, and the
//! control plane until a shutdown signal arrives or a task fails. The store,
//! the writer, and the backend are closed on every exit path.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use chanbridge_bus::HttpEventWriter;
use chanbridge_config::model::ConnectorConfig;
use chanbridge_config::ReplicaIdentity;
use chanbridge_connector::shutdown;
use chanbridge_connector::{Forwarder, ReconcileTrigger, Reconciler, Registry, Shard};
use chanbridge_core::{
    ChanbridgeError, ChannelStore, ChatBackend, EventWriter, HealthStatus, PluginAdapter,
};
use chanbridge_gateway::{AuthConfig, ControlPlaneState, HealthState, ServerConfig};
use chanbridge_resilience::ExponentialBackoff;
use chanbridge_storage::StoreGuard;
use chanbridge_telegram::TelegramBackend;

/// How long each task gets to observe cancellation before it is aborted.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

type RenderFn = Arc<dyn Fn() -> String + Send + Sync>;

/// Collaborators and settings for one connector run.
pub struct Connector {
    pub config: ConnectorConfig,
    pub shard: Shard,
    pub store: Arc<dyn ChannelStore>,
    /// Must already be connected.
    pub backend: Arc<dyn ChatBackend>,
    pub writer: Arc<dyn EventWriter>,
    pub prometheus_render: Option<RenderFn>,
}

/// Runs the connector with the production collaborators.
pub async fn run_serve(config: ConnectorConfig) -> Result<(), ChanbridgeError> {
    init_tracing(&config.log.level, config.log.json);

    info!(replica = %config.replica.name, "starting chanbridge serve");

    let identity = ReplicaIdentity::resolve(&config.replica)?;
    let token = identity.bot_token(&config.telegram)?.to_string();
    let shard = Shard::from(identity);
    info!(shard = %shard, "replica identity resolved");

    let prometheus_render = if config.metrics.enabled {
        let handle = chanbridge_gateway::prometheus::install_recorder()?;
        Some(chanbridge_gateway::prometheus::render_fn(handle))
    } else {
        None
    };

    let store: Arc<dyn ChannelStore> =
        chanbridge_storage::open_layered(&config.storage, &config.cache).await?;

    let (backend, writer) = match connect_collaborators(&config, &token).await {
        Ok(collaborators) => collaborators,
        Err(e) => {
            if let Err(close_err) = store.close().await {
                warn!(error = %close_err, "closing channel store failed");
            }
            return Err(e);
        }
    };

    let cancel = shutdown::install_signal_handler();
    let trigger = ReconcileTrigger::new();
    shutdown::install_reconcile_signal(trigger.clone(), cancel.clone());

    let result = run_connector(
        Connector {
            config,
            shard,
            store,
            backend,
            writer,
            prometheus_render,
        },
        cancel,
        trigger,
    )
    .await;

    info!("chanbridge serve shutdown complete");
    result
}

/// Connects the Telegram backend and builds the event-bus writer.
async fn connect_collaborators(
    config: &ConnectorConfig,
    token: &str,
) -> Result<(Arc<dyn ChatBackend>, Arc<dyn EventWriter>), ChanbridgeError> {
    let mut backend = TelegramBackend::new(token)?;
    backend.connect().await?;

    let me = match backend.current_user().await {
        Ok(me) => me,
        Err(e) => {
            if let Err(shutdown_err) = backend.shutdown().await {
                warn!(error = %shutdown_err, "telegram backend shutdown failed");
            }
            return Err(e);
        }
    };
    info!(
        user_id = me.id,
        username = me.username.as_deref().unwrap_or_default(),
        name = %me.display_name,
        "connected to telegram"
    );

    let default_user = format!("tg://user?id={}", me.id);
    let writer = match HttpEventWriter::from_config(&config.writer, &default_user) {
        Ok(writer) => writer,
        Err(e) => {
            if let Err(shutdown_err) = backend.shutdown().await {
                warn!(error = %shutdown_err, "telegram backend shutdown failed");
            }
            return Err(e);
        }
    };
    info!(uri = %writer.uri(), user_id = %writer.user_id(), "event writer ready");

    Ok((Arc::new(backend), Arc::new(writer)))
}

/// Runs the reconciler, forwarder, and control plane until `cancel` fires or
/// the forwarder or control plane stops on its own.
///
/// Returns the first task error. The store, writer, and backend are closed
/// before returning.
pub async fn run_connector(
    connector: Connector,
    cancel: CancellationToken,
    trigger: ReconcileTrigger,
) -> Result<(), ChanbridgeError> {
    let Connector {
        config,
        shard,
        store,
        backend,
        writer,
        prometheus_render,
    } = connector;
    let guard = StoreGuard::new(store.clone());
    let registry = Arc::new(Registry::new());
    check_backend_health(backend.as_ref()).await;

    let reconciler = Arc::new(Reconciler::new(
        store.clone(),
        backend.clone(),
        registry.clone(),
        shard,
        &config.reconcile,
    ));
    let reconcile_task: JoinHandle<Result<(), ChanbridgeError>> = {
        let cancel = cancel.clone();
        let backoff = config.backoff.clone();
        tokio::spawn(async move {
            let mut policy = ExponentialBackoff::from_config(&backoff);
            reconciler
                .run_supervised(&mut policy, &cancel, &trigger)
                .await;
            Ok(())
        })
    };

    let forwarder = Forwarder::new(
        backend.clone(),
        registry.clone(),
        writer.clone(),
        config.writer.send_timeout(),
    );
    let forward_task: JoinHandle<Result<(), ChanbridgeError>> = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let result = forwarder.run(&cancel).await;
            match &result {
                Ok(stats) => info!(
                    forwarded = stats.forwarded,
                    dropped = stats.dropped,
                    "forwarding pipeline stopped"
                ),
                Err(e) => error!(error = %e, "forwarding pipeline failed"),
            }
            cancel.cancel();
            result.map(|_| ())
        })
    };

    let state = ControlPlaneState {
        registry,
        store,
        shard,
        replica: config.replica.name.clone(),
        auth: AuthConfig {
            bearer_token: config.api.bearer_token.clone(),
        },
        health: HealthState {
            start_time: std::time::Instant::now(),
            prometheus_render,
        },
    };
    let server_config = ServerConfig {
        host: config.api.host.clone(),
        port: config.api.port,
    };
    let gateway_task: JoinHandle<Result<(), ChanbridgeError>> = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let result =
                chanbridge_gateway::start_server(&server_config, state, cancel.clone()).await;
            if let Err(e) = &result {
                error!(error = %e, "control plane failed");
            }
            cancel.cancel();
            result
        })
    };

    cancel.cancelled().await;
    info!("shutting down connector tasks");

    let mut outcome = Ok(());
    for (name, task) in [
        ("forwarder", forward_task),
        ("control plane", gateway_task),
        ("reconciler", reconcile_task),
    ] {
        if let Err(e) = join_task(name, task).await
            && outcome.is_ok()
        {
            outcome = Err(e);
        }
    }

    if let Err(e) = backend.shutdown().await {
        warn!(error = %e, "chat backend shutdown failed");
    }
    if let Err(e) = writer.close().await {
        warn!(error = %e, "event writer close failed");
    }
    if let Err(e) = guard.close().await {
        warn!(error = %e, "channel store close failed");
        if outcome.is_ok() {
            outcome = Err(e);
        }
    }

    outcome
}

/// Logs the backend's health. An unhealthy backend is reported but not fatal:
/// the forwarder fails on its own once the update stream is gone.
async fn check_backend_health(backend: &dyn ChatBackend) -> bool {
    match backend.health_check().await {
        Ok(HealthStatus::Healthy) => {
            info!(backend = backend.name(), version = %backend.version(), "chat backend healthy");
            true
        }
        Ok(HealthStatus::Unhealthy(reason)) => {
            warn!(backend = backend.name(), %reason, "chat backend unhealthy");
            false
        }
        Err(e) => {
            warn!(backend = backend.name(), error = %e, "chat backend health check failed");
            false
        }
    }
}

async fn join_task(
    name: &str,
    mut task: JoinHandle<Result<(), ChanbridgeError>>,
) -> Result<(), ChanbridgeError> {
    match tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(ChanbridgeError::Internal(format!("{name} task failed: {e}"))),
        Err(_) => {
            warn!(task = name, "task did not stop within the grace period, aborting");
            task.abort();
            Ok(())
        }
    }
}

/// Builds the default filter directive for a configured log level.
fn filter_directive(log_level: &str) -> String {
    format!("chanbridge={log_level},warn")
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str, json: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(log_level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if installed.is_err() {
        eprintln!("chanbridge: tracing subscriber already installed");
    }
}
