// EquiEat - Web Server
// REST API over one shared relief session

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use equieat::{
    inventory::parse_target,
    parse_households,
    reports::{render_claim_stubs, render_packing_list},
    AppConfig, AuditAction, DemographicSummary, Household, ReliefSession, ReserveLine,
    Supply, SupplyCategory, SupplyOutcome, VERSION,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
struct AppState {
    session: Arc<Mutex<ReliefSession>>,
    config: Arc<AppConfig>,
}

impl AppState {
    fn session(&self) -> Result<MutexGuard<'_, ReliefSession>, Response> {
        self.session.lock().map_err(|_| {
            error!("session mutex poisoned");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "session state unavailable".to_string())
        })
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

fn success<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
}

fn failure(status: StatusCode, message: String) -> Response {
    (status, Json(ApiResponse::<()>::err(message))).into_response()
}

/// POST /api/supplies body
#[derive(Deserialize)]
struct SupplyRequest {
    category: String,
    name: String,
    quantity: u32,
    #[serde(default)]
    target: Option<String>,
}

impl SupplyRequest {
    fn into_supply(self) -> Result<Supply, equieat::ModelError> {
        let category: SupplyCategory = self.category.parse()?;
        let target = parse_target(self.target.as_deref().unwrap_or(""))?;
        Supply::new(self.name, category, self.quantity, target)
    }
}

#[derive(Serialize)]
struct ImportResponse {
    households: usize,
    skipped_rows: usize,
    summary: String,
}

#[derive(Serialize)]
struct DistributionResponse {
    total_distributed: u64,
    total_leftover: u64,
    completed_at: String,
    summary: DemographicSummary,
    supplies: Vec<SupplyOutcome>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/households - Loaded households with what they received
async fn get_households(State(state): State<AppState>) -> Response {
    let session = match state.session() {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    success::<&[Household]>(session.households())
}

/// POST /api/households - Replace the household set from delimited text
async fn import_households(State(state): State<AppState>, body: String) -> Response {
    let outcome = match parse_households(&body) {
        Ok(outcome) => outcome,
        Err(e) => return failure(StatusCode::BAD_REQUEST, format!("Error reading file: {}", e)),
    };

    let mut session = match state.session() {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let response = ImportResponse {
        households: outcome.households.len(),
        skipped_rows: outcome.skipped_rows,
        summary: outcome.summary(),
    };
    session.load_households(outcome, "api upload");
    success(response)
}

/// GET /api/supplies - Current inventory
async fn get_supplies(State(state): State<AppState>) -> Response {
    let session = match state.session() {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    success::<&[Supply]>(session.supplies())
}

/// POST /api/supplies - Add one supply line
async fn add_supply(State(state): State<AppState>, Json(request): Json<SupplyRequest>) -> Response {
    let supply = match request.into_supply() {
        Ok(supply) => supply,
        Err(e) => return failure(StatusCode::BAD_REQUEST, format!("Invalid Input: {}", e)),
    };

    let mut session = match state.session() {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    session.add_supply(supply);
    success(session.supplies().len())
}

/// DELETE /api/supplies/:name - Remove every line with that name
async fn remove_supply(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    // Decode URL-encoded item name
    let decoded = urlencoding::decode(&name)
        .unwrap_or_else(|_| name.clone().into())
        .into_owned();

    let mut session = match state.session() {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    match session.remove_supply(&decoded) {
        Ok(removed) => success(removed),
        Err(e) => failure(StatusCode::NOT_FOUND, e.to_string()),
    }
}

/// POST /api/distribution - Run the allocation over the current data
async fn run_distribution(State(state): State<AppState>) -> Response {
    let mut session = match state.session() {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match session.run_distribution() {
        Ok(run) => success(DistributionResponse {
            total_distributed: run.allocation.total_distributed(),
            total_leftover: run.allocation.total_leftover(),
            completed_at: run.completed_at.to_rfc3339(),
            summary: run.summary.clone(),
            supplies: run.allocation.supplies.clone(),
        }),
        Err(e) => failure(StatusCode::CONFLICT, e.to_string()),
    }
}

/// POST /api/export - Write the three report files
async fn export_reports(State(state): State<AppState>) -> Response {
    let session = match state.session() {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match session.export(&state.config) {
        Ok(paths) => success(paths),
        Err(e) => {
            error!("export failed: {:#}", e);
            failure(StatusCode::CONFLICT, format!("{:#}", e))
        }
    }
}

/// GET /api/summary - Demographic summary
async fn get_summary(State(state): State<AppState>) -> Response {
    let session = match state.session() {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    success(session.summary())
}

/// GET /api/reserve - Reserve and rounding-excess lines
async fn get_reserve(State(state): State<AppState>) -> Response {
    let session = match state.session() {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    success::<Vec<ReserveLine>>(session.reserve_lines())
}

/// GET / - Packing list as HTML
async fn serve_packing_list(State(state): State<AppState>) -> Response {
    match state.session() {
        Ok(session) => Html(render_packing_list(session.households())).into_response(),
        Err(resp) => resp,
    }
}

/// GET /stubs - Printable claim stubs
async fn serve_claim_stubs(State(state): State<AppState>) -> Response {
    match state.session() {
        Ok(session) => Html(render_claim_stubs(session.households())).into_response(),
        Err(resp) => resp,
    }
}

fn router(state: AppState) -> Router {
    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/households", get(get_households).post(import_households))
        .route("/supplies", get(get_supplies).post(add_supply))
        .route("/supplies/:name", delete(remove_supply))
        .route("/distribution", post(run_distribution))
        .route("/export", post(export_reports))
        .route("/summary", get(get_summary))
        .route("/reserve", get(get_reserve))
        .with_state(state.clone());

    // Build main router
    Router::new()
        .route("/", get(serve_packing_list))
        .route("/stubs", get(serve_claim_stubs))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .skip_while(|a| a != "--config")
        .nth(1)
        .map(std::path::PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;
    equieat::logging::init(&config.log_filter);

    println!("🌐 EquiEat - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let session = ReliefSession::from_config(&config);
    session.record(AuditAction::SystemStartup, &format!("EquiEat {} server started", VERSION));

    let addr = config.server.listen.clone();
    let state = AppState {
        session: Arc::new(Mutex::new(session)),
        config: Arc::new(config),
    };
    let app = router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(%addr, "listening");
    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/households", addr);
    println!("   Packing list: http://{}/", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
