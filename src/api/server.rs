//! Axum server setup and configuration

use crate::api::auth::require_basic_auth;
use crate::api::routes;
use crate::jobs::JobContext;
use crate::scheduler;
use crate::services::Metrics;
use crate::{Config, Database};
use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
    pub metrics: Metrics,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let db = Database::new(&config.database_path).await?;
        Ok(Self::from_parts(Arc::new(db), Arc::new(config), Metrics::new()))
    }

    /// State over an existing database, shared with the scheduler
    pub fn from_parts(db: Arc<Database>, config: Arc<Config>, metrics: Metrics) -> Self {
        Self { db, config, metrics }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // credentials cannot be combined with a wildcard origin
    if origins.iter().any(|o| o.trim() == "*") {
        warn!("CORS open to any origin, credentials disabled");
        return base.allow_origin(AllowOrigin::any());
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(allowed)).allow_credentials(true)
}

/// Create the Axum application with all routes
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    // API routes
    let api_routes = Router::new()
        .route("/health", get(routes::health::api_health))
        .route("/stats", get(routes::alerts::get_stats))
        .route("/alerts", get(routes::alerts::list_alerts))
        .route("/sports", get(routes::alerts::list_sports))
        .route("/metrics", get(routes::metrics::get_metrics));

    // HTML pages behind basic auth
    let pages = Router::new()
        .route("/", get(routes::pages::alerts_page))
        .route("/alerts", get(routes::pages::alerts_page))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_basic_auth));

    Router::new()
        .nest("/api", api_routes)
        .merge(pages)
        .route("/health", get(routes::health::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build state, start the scheduler when enabled and serve until shutdown
pub async fn serve(config: Config) -> Result<()> {
    info!("Initializing application state...");
    let state = AppState::new(config).await?;

    let _jobs = if state.config.scheduler.enabled {
        let ctx = JobContext::new(state.db.clone(), state.config.clone(), state.metrics.clone())?;
        scheduler::start(Arc::new(ctx))
    } else {
        info!("Scheduler disabled (SCHEDULER_ENABLED=false)");
        Vec::new()
    };

    let addr = format!("{}:{}", state.config.api_host, state.config.api_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server listening on http://{}", addr);
    println!();
    println!("  API:       http://{}/api", addr);
    println!("  Alerts:    http://{}/alerts", addr);
    println!("  Health:    http://{}/health", addr);
    println!();

    axum::serve(listener, create_app(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DiscoveredEvent, OddsQuote, Sport};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use base64::Engine;
    use chrono::{Duration, Utc};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn state() -> AppState {
        let db = Database::in_memory().await.unwrap();
        AppState::from_parts(Arc::new(db), Arc::new(Config::default()), Metrics::new())
    }

    async fn seed(state: &AppState) {
        let event = DiscoveredEvent {
            sport: Sport::Basketball,
            league: "NBA".to_string(),
            start_time_utc: Some(Utc::now() + Duration::hours(2)),
            home: "Lakers".to_string(),
            away: "Celtics".to_string(),
            url: "https://x/match/api1/".to_string(),
        };
        let id = state.db.upsert_event(&event).await.unwrap();
        let quotes: Vec<OddsQuote> = ["Bet365", "Pinnacle"]
            .iter()
            .map(|b| OddsQuote {
                market: "TOTAL".to_string(),
                line: Some(220.5),
                bookmaker: b.to_string(),
                selection: "OVER".to_string(),
                odds: 1.95,
            })
            .collect();
        state.db.insert_odds(id, &quotes, Utc::now()).await.unwrap();

        let rows = state.db.fetch_latest_odds_snapshot(60, None).await.unwrap();
        let ev_id = state.db.create_alert_ev(&rows[0], 0.05).await.unwrap();
        state.db.mark_sent(ev_id).await.unwrap();
        state.db.create_alert_from_anomaly(&rows[1], 2.2).await.unwrap();
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = create_app(state().await);
        let (status, body) = get(app.clone(), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

        let (status, body) = get(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_stats_and_sports() {
        let state = state().await;
        seed(&state).await;
        let app = create_app(state);

        let (_, stats) = get(app.clone(), "/api/stats").await;
        assert_eq!(stats["totalAlertas"], 2);
        assert_eq!(stats["alertasEV"], 1);
        assert_eq!(stats["anomalias"], 1);
        assert_eq!(stats["enviadas"], 1);

        let (_, sports) = get(app, "/api/sports").await;
        assert_eq!(sports["sports"][0]["name"], "basketball");
        assert_eq!(sports["sports"][0]["count"], 2);
    }

    #[tokio::test]
    async fn test_alert_filters() {
        let state = state().await;
        seed(&state).await;
        let app = create_app(state);

        let (status, body) = get(app.clone(), "/api/alerts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["filters"]["limit"], 50);

        let (_, body) = get(app.clone(), "/api/alerts?alert_type=ev%2B").await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["alerts"][0]["type"], "ev+");
        assert!((body["alerts"][0]["ev"].as_f64().unwrap() - 5.0).abs() < 1e-9);

        let (_, body) = get(app.clone(), "/api/alerts?alert_type=anomalia&sent=false").await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["alerts"][0]["type"], "anomalia");

        let (_, body) = get(app.clone(), "/api/alerts?sport=TENNIS").await;
        assert_eq!(body["total"], 0);

        let (status, body) = get(app, "/api/alerts?alert_type=bogus").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().to_lowercase().contains("bogus"));
    }

    #[tokio::test]
    async fn test_wildcard_origin_allows_any() {
        let db = Database::in_memory().await.unwrap();
        let mut config = Config::default();
        config.allowed_origins = vec!["*".to_string()];
        let app = create_app(AppState::from_parts(Arc::new(db), Arc::new(config), Metrics::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .header("origin", "https://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert!(response.headers().get("access-control-allow-credentials").is_none());
    }

    #[tokio::test]
    async fn test_listed_origin_echoed() {
        let app = create_app(state().await);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .header("origin", "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "http://localhost:3000"
        );
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let state = state().await;
        state.metrics.inc_job_runs();
        let (status, body) = get(create_app(state), "/api/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["job_runs"], 1);
    }

    #[tokio::test]
    async fn test_pages_require_basic_auth() {
        let app = create_app(state().await);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/alerts").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["www-authenticate"], "Basic");

        let token = base64::engine::general_purpose::STANDARD.encode("admin:admin");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("authorization", format!("Basic {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("BetDesk"));
    }
}
