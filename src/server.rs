//! Admin HTTP surface.
//!
//! [`router`] mounts the flag and guard endpoints over a shared [`Governor`];
//! [`serve`] builds the governor from config and runs the server until ctrl-c.
//!
//! Routes:
//! - `GET /healthz`
//! - `GET /features?tenant=` / `POST /features` / `PATCH /features`
//! - `GET /guard?tenant=` / `POST /guard/reset`
//! - `POST /latency`

use anyhow::{Context, Result};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

use crate::config::SloguardConfig;
use crate::error::{require_tenant, ApiError};
use crate::flags::{FlagName, FlagSet};
use crate::governor::Governor;
use crate::guard::{saturating_millis, Evaluation, GuardState};

pub fn router(governor: Governor) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/features",
            get(get_features).post(replace_features).patch(update_feature),
        )
        .route("/guard", get(guard_status))
        .route("/guard/reset", post(reset_guard))
        .route("/latency", post(report_latency))
        .with_state(governor)
}

/// Start the admin server on the configured address.
pub async fn serve(config: SloguardConfig) -> Result<()> {
    let settings = config
        .guard
        .settings()
        .context("invalid guard configuration")?;
    tracing::info!(
        threshold_ms = saturating_millis(settings.slo_threshold),
        cooldown_secs = settings.cooldown.as_secs(),
        capacity = settings.capacity,
        min_samples = settings.min_samples,
        governed_flag = %settings.governed_flag,
        recovery = %settings.recovery,
        "SLO guard ready"
    );
    let governor = Governor::new(settings);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "admin server listening at http://{bind_addr}");

    axum::serve(listener, router(governor))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down admin server");
        })
        .await?;

    Ok(())
}

// ── Request / response types ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TenantQuery {
    tenant: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplaceFeaturesRequest {
    tenant: Option<String>,
    /// Absent → rejected; `null` → clear the record; object → replace.
    #[serde(default, deserialize_with = "present")]
    flags: Option<Option<FlagSet>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<FlagSet>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<FlagSet>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
struct UpdateFlagRequest {
    tenant: Option<String>,
    flag: String,
    value: bool,
}

#[derive(Debug, Deserialize)]
struct TenantRequest {
    tenant: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatencyReport {
    tenant: Option<String>,
    latency_ms: f64,
}

#[derive(Debug, Serialize)]
struct FeaturesResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'static str>,
    tenant: String,
    flags: FlagSet,
}

#[derive(Debug, Serialize)]
struct GuardStatusResponse {
    tenant: String,
    state: GuardState,
    samples: usize,
    capacity: usize,
    tail_estimate_ms: Option<f64>,
    threshold_ms: f64,
    cooldown_until: Option<DateTime<Utc>>,
    feature_enabled: bool,
}

#[derive(Debug, Serialize)]
struct LatencyResponse {
    tenant: String,
    recorded: bool,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tail_estimate_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cooldown_until: Option<DateTime<Utc>>,
    feature_enabled: bool,
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /features?tenant=
async fn get_features(
    State(governor): State<Governor>,
    query: Result<Query<TenantQuery>, QueryRejection>,
) -> Result<Json<FeaturesResponse>, ApiError> {
    let Query(query) = query?;
    let tenant = require_tenant(query.tenant)?;
    let flags = governor.flags().get(&tenant);

    Ok(Json(FeaturesResponse {
        status: None,
        tenant,
        flags,
    }))
}

/// POST /features
async fn replace_features(
    State(governor): State<Governor>,
    body: Result<Json<ReplaceFeaturesRequest>, JsonRejection>,
) -> Result<Json<FeaturesResponse>, ApiError> {
    let Json(body) = body?;
    let tenant = require_tenant(body.tenant)?;
    let flags = body.flags.ok_or(ApiError::MissingField("flags"))?;

    tracing::info!(tenant = %tenant, flags = ?flags, "replacing feature flags");
    governor.flags().replace(&tenant, flags);

    Ok(Json(FeaturesResponse {
        status: Some("success"),
        flags: governor.flags().get(&tenant),
        tenant,
    }))
}

/// PATCH /features
async fn update_feature(
    State(governor): State<Governor>,
    body: Result<Json<UpdateFlagRequest>, JsonRejection>,
) -> Result<Json<FeaturesResponse>, ApiError> {
    let Json(body) = body?;
    let tenant = require_tenant(body.tenant)?;
    // The store ignores unknown names; the admin surface tells the operator instead.
    let flag: FlagName = body.flag.parse().map_err(ApiError::UnknownFlag)?;

    tracing::info!(tenant = %tenant, flag = %flag, value = body.value, "updating feature flag");
    governor.flags().set(&tenant, flag, body.value);

    Ok(Json(FeaturesResponse {
        status: Some("success"),
        flags: governor.flags().get(&tenant),
        tenant,
    }))
}

/// GET /guard?tenant=
async fn guard_status(
    State(governor): State<Governor>,
    query: Result<Query<TenantQuery>, QueryRejection>,
) -> Result<Json<GuardStatusResponse>, ApiError> {
    let Query(query) = query?;
    let tenant = require_tenant(query.tenant)?;
    let status = governor.guard().status(&tenant);

    Ok(Json(GuardStatusResponse {
        state: status.state,
        samples: status.samples,
        capacity: status.capacity,
        tail_estimate_ms: status.tail_estimate.map(millis),
        threshold_ms: millis(governor.guard().settings().slo_threshold),
        cooldown_until: status.cooldown_until,
        feature_enabled: governor.is_feature_enabled(&tenant),
        tenant,
    }))
}

/// POST /guard/reset
async fn reset_guard(
    State(governor): State<Governor>,
    body: Result<Json<TenantRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(body) = body?;
    let tenant = require_tenant(body.tenant)?;
    let cleared = governor.guard().reset(&tenant);

    tracing::info!(tenant = %tenant, cleared, "guard state reset");
    Ok(Json(serde_json::json!({
        "status": "success",
        "tenant": tenant,
        "cleared": cleared,
    })))
}

/// POST /latency
async fn report_latency(
    State(governor): State<Governor>,
    body: Result<Json<LatencyReport>, JsonRejection>,
) -> Result<Json<LatencyResponse>, ApiError> {
    let Json(body) = body?;
    let tenant = require_tenant(body.tenant)?;
    let latency = Duration::try_from_secs_f64(body.latency_ms / 1000.0).map_err(|_| {
        ApiError::InvalidBody("latency_ms must be a finite, non-negative number".into())
    })?;

    let evaluation = governor.record_latency(&tenant, latency);
    let (outcome, tail_estimate, cooldown_until) = match evaluation {
        None => ("not_monitored", None, None),
        Some(Evaluation::CoolingDown { until }) => ("cooling_down", None, Some(until)),
        Some(Evaluation::InsufficientSamples { .. }) => ("insufficient_samples", None, None),
        Some(Evaluation::WithinSlo { estimate }) => ("within_slo", Some(estimate), None),
        Some(Evaluation::Tripped { estimate, until }) => ("tripped", Some(estimate), Some(until)),
    };

    Ok(Json(LatencyResponse {
        recorded: evaluation.is_some(),
        outcome,
        tail_estimate_ms: tail_estimate.map(millis),
        cooldown_until,
        feature_enabled: governor.is_feature_enabled(&tenant),
        tenant,
    }))
}
