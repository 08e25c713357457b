//! Hazard Monitor API Server
//!
//! HTTP/JSON surface over the risk scorer, alert engine, estimator and stores,
//! plus the process wiring: configuration, logging, metrics, and the monitor loop.

use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub mod config;
pub mod error;
mod extract;
pub mod rate_limit;
mod routes;
mod state;

pub use crate::config::{AppConfig, ConfigError, LoggingConfig};
pub use error::{ApiError, ApiResult};
pub use rate_limit::{create_governor_config, RateLimitConfig};
pub use state::AppState;

/// Create the application router.
///
/// Operator commands are rate limited per peer IP; reads are not.
pub fn create_router(
    state: Arc<AppState>,
    rate_limit: &RateLimitConfig,
) -> Result<Router, ConfigError> {
    let governor = create_governor_config(rate_limit)?;

    let commands = Router::new()
        .route("/sensors/readings", post(routes::sensors::post_readings))
        .route("/alerts", post(routes::alerts::post_alert))
        .route("/alerts/:id/acknowledge", post(routes::alerts::acknowledge))
        .route("/alerts/:id/resolve", post(routes::alerts::resolve))
        .route("/predictions/estimate", post(routes::predictions::estimate))
        .route("/scenarios", post(routes::predictions::save_scenario))
        .layer(GovernorLayer { config: governor });

    let queries = Router::new()
        .route("/health", get(routes::health::get_health))
        .route("/metrics", get(routes::health::get_metrics))
        .route("/sensors/live", get(routes::sensors::get_live))
        .route("/sensors/export.csv", get(routes::sensors::export_csv))
        .route("/zones/risk", get(routes::sensors::get_zone_risk))
        .route("/alerts", get(routes::alerts::get_alerts))
        .route("/alerts/:id", get(routes::alerts::get_alert))
        .route("/alerts/:id/incidents", get(routes::alerts::get_alert_incidents))
        .route("/incidents", get(routes::alerts::get_incidents))
        .route("/notifications", get(routes::alerts::get_notifications))
        .route("/scenarios", get(routes::predictions::get_scenarios))
        .route("/scenarios/:id", get(routes::predictions::get_scenario));

    Ok(Router::new()
        .nest("/api/v1", queries.merge(commands))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state))
}

/// Initialize logging. `RUST_LOG` overrides the configured level.
pub fn init_logging(
    config: &LoggingConfig,
) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    }
}

/// Run the server (and the monitor loop, when enabled) until Ctrl-C
pub async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = PrometheusBuilder::new().install_recorder()?;
    let state = Arc::new(AppState::from_config(&config).await?.with_metrics(metrics));
    let app = create_router(state.clone(), &config.rate_limit)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor_task = if config.monitor.enabled {
        let monitor = state.monitor.clone();
        let mut source = config.monitor.simulated_source();
        Some(tokio::spawn(async move {
            monitor.run(&mut source, shutdown_rx).await
        }))
    } else {
        info!("Monitor loop disabled; readings arrive via the API only");
        None
    };

    info!("Starting API server on {}", config.server.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    let _ = shutdown_tx.send(true);
    if let Some(task) = monitor_task {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Monitor loop ended with error: {}", e),
            Err(e) => warn!("Monitor task failed: {}", e),
        }
    }

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::{header, Method, Request, StatusCode};
    use estimator::{FixedConfidence, PredictiveEstimator};
    use serde_json::{json, Value};
    use storage::MemoryIncidentSink;
    use tower::ServiceExt;

    fn app_with(config: AppConfig) -> (Router, Arc<AppState>, Arc<MemoryIncidentSink>) {
        let sink = Arc::new(MemoryIncidentSink::new());
        let estimator =
            PredictiveEstimator::with_confidence_source(Arc::new(FixedConfidence::new(80.0)));
        let state = Arc::new(AppState::with_sink(&config, sink.clone()).with_estimator(estimator));
        let router = create_router(state.clone(), &config.rate_limit).unwrap();
        (router, state, sink)
    }

    fn app() -> (Router, Arc<AppState>, Arc<MemoryIncidentSink>) {
        app_with(AppConfig::default())
    }

    fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        let mut request = match body {
            Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
        request
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn push_critical(app: &Router) -> String {
        let (status, body) = send(
            app,
            request(
                Method::POST,
                "/api/v1/sensors/readings",
                Some(json!({
                    "readings": [
                        {"zone": "Zone B", "rainfall": 90, "vibration": 10, "pressure": 20},
                        {"zone": "Zone A", "rainfall": 10, "vibration": 10, "pressure": 20}
                    ]
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["stored"], 2);
        assert_eq!(body["raised"].as_array().unwrap().len(), 1);
        body["raised"][0]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _, _) = app();
        let (status, body) = send(&app, request(Method::GET, "/api/v1/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["alerts"]["total"], 0);
    }

    #[tokio::test]
    async fn test_readings_raise_critical_alert() {
        let (app, _, _) = app();
        let id = push_critical(&app).await;

        let (_, alerts) = send(&app, request(Method::GET, "/api/v1/alerts", None)).await;
        assert_eq!(alerts["count"], 1);
        assert_eq!(alerts["data"][0]["id"], id.as_str());
        assert_eq!(alerts["data"][0]["type"], "critical");
        assert_eq!(alerts["data"][0]["zone"], "Zone B");
        assert_eq!(alerts["summary"]["critical"], 1);

        let (_, zones) = send(&app, request(Method::GET, "/api/v1/zones/risk", None)).await;
        let zones = zones["zones"].as_array().unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0]["zone"], "Zone A");
        assert_eq!(zones[0]["indicator"], "SAFE");
        assert_eq!(zones[1]["indicator"], "DANGER");

        let (_, notes) = send(&app, request(Method::GET, "/api/v1/notifications", None)).await;
        assert_eq!(notes["count"], 1);
        assert_eq!(notes["data"][0]["severity"], "critical");
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let (app, _, _) = app();
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/api/v1/sensors/readings",
                Some(json!({"readings": []})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_readings_accept_seismic_activity_key() {
        let (app, _, _) = app();
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/api/v1/sensors/readings",
                Some(json!({"readings": [{"zone": "B", "rainfall": 90, "seismic-activity": 10}]})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["stored"], 1);
        assert_eq!(body["raised"].as_array().unwrap().len(), 1);

        let (_, live) = send(&app, request(Method::GET, "/api/v1/sensors/live?zone=B", None)).await;
        assert_eq!(live["data"][0]["values"]["seismic"], 10.0);
        assert_eq!(live["data"][0]["values"]["rainfall"], 90.0);
    }

    #[tokio::test]
    async fn test_unknown_metric_is_skipped() {
        let (app, _, _) = app();
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/api/v1/sensors/readings",
                Some(json!({"readings": [{"zone": "Zone C", "rainfall": 90, "wind": 5}]})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["stored"], 1);
        assert_eq!(body["raised"].as_array().unwrap().len(), 1);
        assert_eq!(body["raised"][0]["zone"], "Zone C");
        assert_eq!(body["ignored"], json!(["wind"]));
    }

    #[tokio::test]
    async fn test_malformed_requests_render_json_errors() {
        let (app, _, _) = app();

        let mut broken = request(Method::POST, "/api/v1/sensors/readings", None);
        *broken.body_mut() = Body::from("{\"readings\": [");
        let (status, body) = send(&app, broken).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body["error"].is_string());

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/api/v1/sensors/readings",
                Some(json!({"readings": "Zone A"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) = send(
            &app,
            request(Method::GET, "/api/v1/sensors/live?limit=many", None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");

        let (status, body) = send(
            &app,
            request(Method::GET, "/api/v1/scenarios/not-a-uuid", None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_acknowledge_resolve_lifecycle() {
        let (app, _, _) = app();
        let id = push_critical(&app).await;

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                &format!("/api/v1/alerts/{}/acknowledge", id),
                Some(json!({"actor": "eng1"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["changed"], true);
        assert_eq!(body["alert"]["acknowledgedBy"], "eng1");

        let resolve_uri = format!("/api/v1/alerts/{}/resolve", id);
        let (status, _) = send(
            &app,
            request(
                Method::POST,
                &resolve_uri,
                Some(json!({"actor": "eng1", "note": ""})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                &resolve_uri,
                Some(json!({"actor": "eng1", "note": "Drainage cleared"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["alert"]["resolved"], true);
        assert_eq!(body["alert"]["actionTaken"], "Drainage cleared");

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                &resolve_uri,
                Some(json!({"actor": "eng2", "note": "Again"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INVALID_STATE");

        let (_, trail) = send(
            &app,
            request(Method::GET, &format!("/api/v1/alerts/{}/incidents", id), None),
        )
        .await;
        assert_eq!(trail["count"], 3);
        assert_eq!(trail["data"][2]["action"], "Alert Resolved");

        let (_, recent) = send(&app, request(Method::GET, "/api/v1/incidents?limit=1", None)).await;
        assert_eq!(recent["count"], 1);
        assert_eq!(recent["data"][0]["action"], "Alert Resolved");

        let (_, resolved) = send(
            &app,
            request(Method::GET, "/api/v1/alerts?status=resolved&type=critical", None),
        )
        .await;
        assert_eq!(resolved["count"], 1);
    }

    #[tokio::test]
    async fn test_unknown_alert_is_not_found() {
        let (app, _, _) = app();
        let (status, _) = send(&app, request(Method::GET, "/api/v1/alerts/missing", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            request(
                Method::POST,
                "/api/v1/alerts/missing/acknowledge",
                Some(json!({"actor": "eng1"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_manual_alert_dedup() {
        let (app, _, _) = app();
        let alert = json!({
            "type": "info",
            "zone": "Zone A",
            "title": "Scheduled Maintenance",
            "message": "Routine sensor maintenance scheduled for 14:00 today.",
            "category": "maintenance"
        });

        let (status, body) =
            send(&app, request(Method::POST, "/api/v1/alerts", Some(alert.clone()))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["alert"]["priority"], "low");

        let (status, body) = send(&app, request(Method::POST, "/api/v1/alerts", Some(alert))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["created"], false);
    }

    #[tokio::test]
    async fn test_sink_outage_keeps_transition() {
        let (app, _, sink) = app();
        let id = push_critical(&app).await;
        sink.set_available(false);

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                &format!("/api/v1/alerts/{}/acknowledge", id),
                Some(json!({"actor": "eng1"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["audit"]["status"], "failed");

        let (status, _) = send(&app, request(Method::GET, "/api/v1/incidents", None)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_estimate_worst_case() {
        let (app, _, _) = app();
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/api/v1/predictions/estimate",
                Some(json!({
                    "rainfall": 100,
                    "vibration": 100,
                    "slopeAngle": 60,
                    "soilMoisture": 100,
                    "temperature": 50,
                    "blastingActivity": 100
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["riskProbability"], 95.0);
        assert_eq!(body["confidence"], 80.0);
        let recommendations = body["recommendations"].as_array().unwrap();
        assert!(recommendations.contains(&json!("evacuate")));
    }

    #[tokio::test]
    async fn test_scenarios_save_list_get() {
        let (app, _, _) = app();
        for _ in 0..2 {
            let (status, _) = send(
                &app,
                request(
                    Method::POST,
                    "/api/v1/scenarios",
                    Some(json!({"parameters": {"rainfall": 80}})),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, list) = send(&app, request(Method::GET, "/api/v1/scenarios", None)).await;
        assert_eq!(list["count"], 2);
        assert_eq!(list["data"][0]["name"], "Scenario 2");
        assert_eq!(list["data"][0]["parameters"]["rainfall"], 80.0);

        let id = list["data"][1]["id"].as_str().unwrap();
        let (status, one) = send(
            &app,
            request(Method::GET, &format!("/api/v1/scenarios/{}", id), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one["name"], "Scenario 1");

        let (status, _) = send(
            &app,
            request(
                Method::GET,
                "/api/v1/scenarios/00000000-0000-0000-0000-000000000000",
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_csv_export() {
        let (app, _, _) = app();
        push_critical(&app).await;

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/api/v1/sensors/export.csv?zone=Zone%20B", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let csv = String::from_utf8(bytes.to_vec()).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], storage::CSV_HEADER);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains(",Zone B,90,10,20,,,"));
    }

    #[tokio::test]
    async fn test_live_readings_filter() {
        let (app, _, _) = app();
        push_critical(&app).await;

        let (_, body) = send(
            &app,
            request(Method::GET, "/api/v1/sensors/live?zone=Zone%20A&limit=5", None),
        )
        .await;
        assert_eq!(body["meta"]["count"], 1);
        assert_eq!(body["data"][0]["zone"], "Zone A");
    }

    #[tokio::test]
    async fn test_commands_are_rate_limited() {
        let config = AppConfig {
            rate_limit: RateLimitConfig {
                per_second: 60,
                burst_size: 2,
            },
            ..Default::default()
        };
        let (app, _, _) = app_with(config);
        let estimate = || {
            request(
                Method::POST,
                "/api/v1/predictions/estimate",
                Some(json!({})),
            )
        };

        assert_eq!(send(&app, estimate()).await.0, StatusCode::OK);
        assert_eq!(send(&app, estimate()).await.0, StatusCode::OK);
        assert_eq!(send(&app, estimate()).await.0, StatusCode::TOO_MANY_REQUESTS);

        // Reads stay available
        let (status, _) = send(&app, request(Method::GET, "/api/v1/health", None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let (app, _, _) = app();
        let (status, _) = send(&app, request(Method::GET, "/api/v1/metrics", None)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
