use {
    paylink::{
        AppState,
        adapters::{acleda_client::AcledaGateway, http},
        config::Config,
        domain::{
            clock::SystemClock,
            event::EventPublisher,
            store::{ApiCallStore, PaymentLinkStore},
        },
        infra::{
            amqp::{AmqpPublisher, LogPublisher},
            memory::{InMemoryApiCallStore, InMemoryLinkStore},
            postgres::{self, audit_repo::PgApiCallStore, link_repo::PgPaymentLinkStore},
        },
        services::{
            audit_sink::{AuditSink, run_audit_writer},
            link_service::LinkService,
            worker::{JobQueue, run_worker},
        },
    },
    std::{error::Error, sync::Arc},
    tokio::{signal, sync::watch},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let (links, api_calls): (Arc<dyn PaymentLinkStore>, Arc<dyn ApiCallStore>) =
        match &config.database_url {
            Some(url) => {
                let pool = postgres::connect(url).await?;
                tracing::info!("using postgres storage");
                (
                    Arc::new(PgPaymentLinkStore::new(pool.clone())),
                    Arc::new(PgApiCallStore::new(pool)),
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory storage");
                (
                    Arc::new(InMemoryLinkStore::new()),
                    Arc::new(InMemoryApiCallStore::new()),
                )
            }
        };

    let publisher: Arc<dyn EventPublisher> = match &config.amqp_url {
        Some(url) => Arc::new(AmqpPublisher::connect(url).await?),
        None => {
            tracing::warn!("AMQP_URL not set, events go to the log only");
            Arc::new(LogPublisher)
        }
    };

    let gateway = AcledaGateway::new(
        config.acleda.open_session_url.clone(),
        config.acleda.timeout,
    )?;

    // The worker stops first so its last job can still be audited.
    let (worker_stop_tx, worker_stop_rx) = watch::channel(false);
    let (audit_stop_tx, audit_stop_rx) = watch::channel(false);

    let (audit, audit_rx) = AuditSink::new(config.audit_buffer);
    let audit_writer = tokio::spawn(run_audit_writer(audit_rx, api_calls, audit_stop_rx));

    let service = Arc::new(LinkService::new(
        Arc::new(gateway),
        links,
        audit,
        publisher,
        Arc::new(SystemClock),
        config.link_settings(),
    ));

    let (jobs, job_rx) = JobQueue::new(config.job_queue_capacity, config.job_retention);
    let worker = tokio::spawn(run_worker(
        job_rx,
        jobs.board(),
        service.clone(),
        worker_stop_rx,
    ));

    let state = AppState {
        links: service,
        jobs,
    };
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind(&config.app_addr).await?;
    tracing::info!(addr = %config.app_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = worker_stop_tx.send(true);
    if let Err(e) = worker.await {
        tracing::error!(error = %e, "job worker task failed");
    }
    let _ = audit_stop_tx.send(true);
    if let Err(e) = audit_writer.await {
        tracing::error!(error = %e, "audit writer task failed");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
