//! ---
//! ug_section: "05-networking-external-interfaces"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "HTTP server exposing fleet queries and city selection."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use prometheus::{Registry, TextEncoder};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use ug_advisor::{advise_or_fallback, AdvisoryContext, AdvisoryReply, AdvisoryService};
use ug_core::query::{LEADERBOARD_LIMIT, RECENT_ANOMALY_LIMIT};
use ug_core::service::parse_city;
use ug_core::{AssetQuery, SimulationService, SortOrder};
use ug_report::{ComplianceReport, ExportedReport, ReportExporter};
use ug_sim::{Anomaly, Asset, AssetType, City, HealthStatus};

use crate::views::{
    AdvisorRequest, CitySelection, CitySummary, ErrorResponse, HealthResponse, LeaderboardRow,
    ListParams, SelectedCity, StatusResponse,
};

const ALL_CITIES: &str = "all";

struct ApiState {
    service: Arc<SimulationService>,
    advisor: Arc<dyn AdvisoryService>,
    exporter: ReportExporter,
    metrics: Option<Arc<Registry>>,
}

/// Builder used to configure and spawn the HTTP server.
#[derive(Clone)]
pub struct ApiServerBuilder {
    listen: SocketAddr,
    service: Arc<SimulationService>,
    advisor: Arc<dyn AdvisoryService>,
    exporter: ReportExporter,
    metrics: Option<Arc<Registry>>,
}

impl ApiServerBuilder {
    pub fn new(
        listen: SocketAddr,
        service: Arc<SimulationService>,
        advisor: Arc<dyn AdvisoryService>,
        exporter: ReportExporter,
    ) -> Self {
        Self {
            listen,
            service,
            advisor,
            exporter,
            metrics: None,
        }
    }

    /// Attach a Prometheus registry exposed at `/metrics`.
    pub fn with_metrics_registry(mut self, registry: Arc<Registry>) -> Self {
        self.metrics = Some(registry);
        self
    }

    /// Bind the listener and serve until [`ApiHandle::shutdown`] is called.
    pub async fn spawn(self) -> anyhow::Result<ApiHandle> {
        let listener = TcpListener::bind(self.listen).await?;
        let local_addr = listener.local_addr()?;
        info!(address = %local_addr, advisor = self.advisor.name(), "http api listening");

        let state = ApiState {
            service: self.service,
            advisor: self.advisor,
            exporter: self.exporter,
            metrics: self.metrics,
        };
        let router = Router::new()
            .route("/status", get(get_status))
            .route("/health", get(get_health))
            .route("/assets", get(list_assets))
            .route("/assets/:id", get(get_asset))
            .route("/assets/:id/report", post(post_report))
            .route("/notifications", get(get_notifications))
            .route("/city", get(get_city).put(put_city))
            .route("/cities/:city/summary", get(get_city_summary))
            .route("/advisor", post(post_advisor))
            .route("/metrics", get(get_metrics))
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::new(state));

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let server = axum::serve(listener, router).with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        });
        let task = tokio::spawn(async move {
            if let Err(err) = server.await {
                warn!(error = %err, "http api server exited with error");
            }
        });

        Ok(ApiHandle {
            address: local_addr,
            task,
            shutdown: shutdown_tx,
        })
    }
}

/// Handle returned from [`ApiServerBuilder::spawn`].
pub struct ApiHandle {
    address: SocketAddr,
    task: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl ApiHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.address
    }

    /// Request graceful shutdown and wait for the server task to finish.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(()) => Ok(()),
            Err(join) => Err(anyhow::anyhow!(join)),
        }
    }
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse {
                message: message.into(),
                id: None,
            },
        }
    }

    fn unknown_asset(id: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorResponse {
                message: "unknown asset".into(),
                id: Some(id.to_owned()),
            },
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorResponse {
                message: message.into(),
                id: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn parse_param<T: FromStr>(field: &str, raw: Option<&str>) -> Result<Option<T>, ApiError> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|_| ApiError::bad_request(format!("invalid {field}: {value}")))
        })
        .transpose()
}

fn city_param(raw: &str) -> Result<City, ApiError> {
    parse_city(raw).map_err(|err| ApiError::bad_request(err.to_string()))
}

/// City scope of an asset listing. Absent means the selected city; `all`
/// lifts the filter.
fn listing_city(raw: Option<&str>, selected: City) -> Result<Option<City>, ApiError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(Some(selected)),
        Some(value) if value.eq_ignore_ascii_case(ALL_CITIES) => Ok(None),
        Some(value) => city_param(value).map(Some),
    }
}

async fn get_status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    let snapshot = state.service.snapshot();
    Json(StatusResponse::from_snapshot(
        &snapshot,
        state.service.selected_city(),
    ))
}

async fn get_health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    let snapshot = state.service.snapshot();
    let selected_city = state.service.selected_city();
    Json(HealthResponse {
        overall_health: snapshot.overall_health(),
        selected_city,
        city_health: snapshot.city_health(selected_city),
    })
}

async fn list_assets(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Asset>>, ApiError> {
    let query = AssetQuery {
        city: listing_city(params.city.as_deref(), state.service.selected_city())?,
        status: parse_param::<HealthStatus>("status", params.status.as_deref())?,
        asset_type: parse_param::<AssetType>("type", params.asset_type.as_deref())?,
        sort: parse_param::<SortOrder>("sort", params.sort.as_deref())?.unwrap_or_default(),
    };
    let assets = state
        .service
        .list_assets(&query)
        .into_iter()
        .map(|asset| Asset::clone(&asset))
        .collect();
    Ok(Json(assets))
}

async fn get_asset(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<Asset>, ApiError> {
    state
        .service
        .get_asset_by_id(&id)
        .map(|asset| Json(Asset::clone(&asset)))
        .ok_or_else(|| ApiError::unknown_asset(&id))
}

async fn get_notifications(State(state): State<Arc<ApiState>>) -> Json<Vec<Anomaly>> {
    Json(state.service.current_notifications())
}

async fn get_city(State(state): State<Arc<ApiState>>) -> Json<SelectedCity> {
    Json(SelectedCity {
        selected_city: state.service.selected_city(),
    })
}

async fn put_city(
    State(state): State<Arc<ApiState>>,
    Json(selection): Json<CitySelection>,
) -> Result<Json<SelectedCity>, ApiError> {
    let city = city_param(&selection.city)?;
    state.service.set_selected_city(city);
    Ok(Json(SelectedCity {
        selected_city: city,
    }))
}

async fn get_city_summary(
    State(state): State<Arc<ApiState>>,
    Path(city): Path<String>,
) -> Result<Json<CitySummary>, ApiError> {
    let city = city_param(&city)?;
    let snapshot = state.service.snapshot();
    Ok(Json(CitySummary {
        city,
        health: snapshot.city_health(city),
        census: snapshot.status_census(city),
        recent_anomalies: snapshot.city_recent_anomalies(city, RECENT_ANOMALY_LIMIT),
        leaderboard: snapshot
            .risk_leaderboard(city, LEADERBOARD_LIMIT)
            .iter()
            .map(|asset| LeaderboardRow::from(asset.as_ref()))
            .collect(),
    }))
}

async fn post_report(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ExportedReport>), ApiError> {
    let asset = state
        .service
        .get_asset_by_id(&id)
        .ok_or_else(|| ApiError::unknown_asset(&id))?;
    let report = ComplianceReport::from_asset(&asset, Utc::now());
    let exporter = state.exporter.clone();

    let exported = tokio::task::spawn_blocking(move || exporter.export(&report))
        .await
        .map_err(|err| ApiError::internal(format!("report export task failed: {err}")))?
        .map_err(|err| {
            warn!(asset_id = %id, error = %err, "compliance report export failed");
            ApiError::internal(format!("report export failed: {err}"))
        })?;
    Ok((StatusCode::CREATED, Json(exported)))
}

async fn post_advisor(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<AdvisorRequest>,
) -> Result<Json<AdvisoryReply>, ApiError> {
    let city = match request.city.as_deref() {
        Some(raw) => city_param(raw)?,
        None => state.service.selected_city(),
    };
    let context = AdvisoryContext::for_city(&state.service.snapshot(), city);
    let reply = advise_or_fallback(
        state.advisor.as_ref(),
        &context,
        &request.query,
        &request.history,
    )
    .await;
    Ok(Json(reply))
}

async fn get_metrics(State(state): State<Arc<ApiState>>) -> Response {
    let Some(registry) = &state.metrics else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics registry unavailable",
        )
            .into_response();
    };

    let encoder = TextEncoder::new();
    let families = registry.gather();
    match encoder.encode_to_string(&families) {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(err) => {
            warn!(error = %err, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
