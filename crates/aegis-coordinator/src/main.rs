//! Binary entry point: wires the NATS consumer loop and the
//! `/health`+`/metrics` axum surface around one shared [`Coordinator`]
//! (§4.6, §5, §6.7).

use std::sync::atomic::Ordering;
use std::sync::Arc;

use aegis_bus::{
    DeadLetterPayload, Delivery, Publisher, RawAlertPayload, TOPIC_ALERT_DEAD_LETTER, TOPIC_ALERT_RAW,
    TOPIC_TRIAGE_RESULT,
};
use aegis_common::envelope::MessageType;
use aegis_coordinator::health::{self, AppState, Metrics};
use aegis_coordinator::{fallback_result, Config, Coordinator, Outcome};
use aegis_dedup::DedupEngine;
use aegis_intel::IntelAggregator;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::parse();
    info!(nats_url = %config.nats_url, "starting aegis-coordinator");

    let (client, jetstream) = aegis_bus::connect(&config.nats_url).await?;
    let publisher = Publisher::new(client);
    let consumer = aegis_bus::Consumer::new(
        &jetstream,
        "AEGIS_ALERTS",
        "aegis-coordinator",
        TOPIC_ALERT_RAW,
        config.mq_prefetch,
    )
    .await?;

    let dedup = DedupEngine::new(
        config.dedup_capacity,
        config.dedup_lookback(),
        config.aggregation_window(),
        config.aggregation_max_size,
    );
    let providers = aegis_intel::default_providers(config.virustotal_api_key.clone(), config.otx_api_key.clone());
    let intel = IntelAggregator::new(providers, config.intel_request_timeout());
    let coordinator = Arc::new(Coordinator::new(dedup, intel, None, config.max_iocs_per_alert));
    let metrics = Arc::new(Metrics::default());

    let health_router = health::router(AppState {
        coordinator: coordinator.clone(),
        metrics: metrics.clone(),
    });
    let health_port = config.health_port;
    let health_task = tokio::spawn(async move {
        let listener = TcpListener::bind(("0.0.0.0", health_port)).await?;
        info!(port = health_port, "health/metrics surface listening");
        axum::serve(listener, health_router).await
    });

    let triage_budget = config.triage_budget();
    let shutdown_grace = config.shutdown_grace();
    let mut inflight = tokio::task::JoinSet::new();

    loop {
        tokio::select! {
            biased;
            _ = shutdown_signal() => {
                info!(grace_secs = shutdown_grace.as_secs(), "shutdown signal received, draining in-flight work");
                break;
            }
            batch = consumer.pull_batch::<RawAlertPayload>() => {
                let deliveries = match batch {
                    Ok(deliveries) => deliveries,
                    Err(e) => {
                        error!(error = %e, "failed to pull alert batch, backing off");
                        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                        continue;
                    }
                };
                for delivery in deliveries {
                    metrics.alerts_consumed.fetch_add(1, Ordering::Relaxed);
                    let coordinator = coordinator.clone();
                    let publisher = publisher.clone();
                    let metrics = metrics.clone();
                    inflight.spawn(process_one(coordinator, publisher, metrics, delivery, triage_budget));
                }
            }
        }
    }

    let drained = tokio::time::timeout(shutdown_grace, async {
        while inflight.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!("shutdown grace window elapsed with tasks still in flight, aborting remainder");
        inflight.shutdown().await;
    }
    health_task.abort();

    Ok(())
}

/// Resolves on either Ctrl+C or a container orchestrator's SIGTERM —
/// whichever arrives first — so the drain/grace-window logic below
/// fires under a real `docker stop`/`kubectl delete pod`, not just an
/// interactive Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// One spawned task per delivered alert: runs the pipeline under the
/// per-alert budget (§6.3 `TRIAGE_BUDGET`), publishes the outcome, and
/// only then acks the source message (§5 publish-before-ack ordering).
/// A budget timeout or a panic inside `process` degrades to a fallback
/// record (§8 scenario 6) rather than losing the alert (§8 P6).
async fn process_one(
    coordinator: Arc<Coordinator>,
    publisher: Publisher,
    metrics: Arc<Metrics>,
    delivery: Delivery<RawAlertPayload>,
    budget: std::time::Duration,
) {
    let correlation_id = delivery.envelope.correlation_id.clone();
    let payload = delivery.envelope.payload.clone();
    let alert_id_hint = payload
        .body
        .get("alert_id")
        .and_then(|v| v.as_str())
        .unwrap_or(&correlation_id)
        .to_string();

    let outcome = tokio::time::timeout(budget, coordinator.process(&payload.source, &payload.body)).await;

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!(alert_id = %alert_id_hint, "triage budget exceeded, emitting fallback result");
            metrics.alerts_fallback.fetch_add(1, Ordering::Relaxed);
            Outcome::Triage(fallback_result(&alert_id_hint, "triage budget exceeded"))
        }
    };

    let publish_result = match outcome {
        Outcome::Duplicate => {
            metrics.alerts_duplicate.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
        Outcome::DeadLetter { reason } => {
            metrics.alerts_dead_lettered.fetch_add(1, Ordering::Relaxed);
            let dead_letter = DeadLetterPayload {
                original: payload.body.clone(),
                error_kind: "normalization_error".to_string(),
                error_message: reason,
            };
            publisher
                .publish(TOPIC_ALERT_DEAD_LETTER, MessageType::AlertDeadLetter, correlation_id.clone(), dead_letter)
                .await
        }
        Outcome::Triage(result) => {
            metrics.alerts_triaged.fetch_add(1, Ordering::Relaxed);
            publisher
                .publish(TOPIC_TRIAGE_RESULT, MessageType::TriageResult, correlation_id.clone(), result)
                .await
        }
    };

    if let Err(e) = publish_result {
        error!(alert_id = %alert_id_hint, error = %e, "failed to publish outcome, message will be redelivered");
        return;
    }

    if let Err(e) = delivery.ack().await {
        error!(alert_id = %alert_id_hint, error = %e, "failed to ack delivered message");
    }
}
