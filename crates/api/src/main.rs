use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stamble_core::advisor::InvestmentAdvisor;
use stamble_core::config::{Settings, SettingsSummary};
use stamble_core::domain::recommendation::Recommendation;
use stamble_core::domain::stock::{trending_stocks, TrendingStock};
use stamble_core::error::AppError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.default_log_directive())),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    if let Err(e) = settings.validate() {
        let err = anyhow::Error::new(e);
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "invalid configuration; refusing to start");
        return Err(err);
    }

    let advisor = InvestmentAdvisor::from_settings(&settings)?;
    let state = AppState {
        advisor: Arc::new(advisor),
        config: settings.summary(),
    };

    let app = router(state).layer(cors_layer(&settings.cors_origins));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!(%addr, env = %settings.env, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Clone)]
struct AppState {
    advisor: Arc<InvestmentAdvisor>,
    config: SettingsSummary,
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/stocks/trending", get(get_trending_stocks))
        .route(
            "/api/stocks/:symbol/recommendation",
            get(get_stock_recommendation),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!(origin = %o, error = %e, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[derive(Debug, Serialize)]
struct RootResponse {
    message: &'static str,
    version: &'static str,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Welcome to Stamble API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: f64,
    config: SettingsSummary,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
        config: state.config.clone(),
    })
}

async fn get_trending_stocks() -> Json<Vec<TrendingStock>> {
    Json(trending_stocks())
}

async fn get_stock_recommendation(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Recommendation>, ApiError> {
    let symbol = symbol.trim().to_uppercase();
    tracing::info!(%symbol, "received recommendation request");

    let recommendation = state
        .advisor
        .build_recommendation(&symbol)
        .await
        .map_err(|e| {
            tracing::error!(%symbol, error = %e, "error processing recommendation");
            ApiError(e)
        })?;

    Ok(Json(recommendation))
}

#[derive(Debug)]
struct ApiError(AppError);

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = format!("Error generating recommendation: {}", self.0);
        sentry_anyhow::capture_anyhow(&anyhow::Error::new(self.0));
        (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { detail })).into_response()
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(settings.env.clone().into()),
            ..Default::default()
        },
    )))
}
