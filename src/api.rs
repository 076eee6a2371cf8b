//! REST API for the load planning service.
//!
//! Thin pass-through over the sales integration layer: payloads are parsed
//! and validated here, planning happens in the core, and the report is
//! returned verbatim. Uses Axum as the web framework and supports CORS.

use std::sync::{Arc, OnceLock};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::aircraft::AircraftMap;
use crate::config::ApiConfig;
use crate::model::{
    ActionRequiredEntry, BoxDims, CargoRequest, ForcedGroup, RejectedCargo, Report, ReportSummary,
    VisualizationRow,
};
use crate::planner::{CorePlanningEngine, PlannerConfig};
use crate::sales::{FlightRepository, simulate_loading_needs};
use crate::uld::UldType;

#[derive(Clone)]
struct ApiState {
    flights: Arc<FlightRepository>,
    planner: PlannerConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>loadmaster API Docs</title>
        <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css" />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Booking confirmation for one flight.
#[derive(Deserialize, ToSchema)]
pub struct PlanRequest {
    pub flight_id: String,
    #[serde(default)]
    pub route: Vec<String>,
    pub cargos: Vec<CargoRequest>,
    #[serde(default)]
    pub forced_groups: Vec<ForcedGroup>,
    /// Position ids inoperative on this flight (e.g. ["42R", "11P"]).
    #[serde(default)]
    #[schema(nullable = true)]
    pub restrictions: Option<Vec<String>>,
}

/// Stateless planning inquiry.
#[derive(Deserialize, ToSchema)]
pub struct SimulateRequest {
    pub cargos: Vec<CargoRequest>,
}

/// Stateless planning run streamed as Server-Sent Events.
#[derive(Deserialize, ToSchema)]
pub struct StreamRequest {
    pub cargos: Vec<CargoRequest>,
    #[serde(default)]
    pub forced_groups: Vec<ForcedGroup>,
    #[serde(default)]
    pub restrictions: Vec<String>,
}

#[derive(serde::Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn planning_failure(err: impl std::fmt::Display) -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Planning failed",
        err.to_string(),
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_plan, handle_simulate, handle_plan_stream, handle_close_flight),
    components(
        schemas(
            PlanRequest,
            SimulateRequest,
            StreamRequest,
            ErrorResponse,
            Report,
            ReportSummary,
            RejectedCargo,
            ActionRequiredEntry,
            VisualizationRow,
            CargoRequest,
            BoxDims,
            ForcedGroup,
            UldType
        )
    ),
    tags((name = "planning", description = "Endpoints for cargo load planning"))
)]
struct ApiDoc;

/// Starts the API server.
///
/// Configures CORS for cross-origin requests. Blocks until the server is
/// terminated.
pub async fn start_api_server(config: ApiConfig, planner: PlannerConfig) {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState {
        flights: Arc::new(FlightRepository::new()),
        planner,
    };

    let app = Router::new()
        .route("/plan", post(handle_plan))
        .route("/simulate", post(handle_simulate))
        .route("/plan_stream", post(handle_plan_stream))
        .route("/flights/{flight_id}", delete(handle_close_flight))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            panic!("❌ Could not bind API server to {}: {}", addr, err);
        }
    };

    println!(
        "🚀 Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        println!("💡 Local access: http://localhost:{}", config.port());
    }
    println!("✈️ API Endpoints:");
    println!("   - POST /plan");
    println!("   - POST /simulate");
    println!("   - POST /plan_stream");
    println!("   - DELETE /flights/{{flight_id}}");
    println!("📑 Documentation:");
    println!("   - GET /docs");
    println!("   - GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        eprintln!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for POST /plan.
///
/// Confirms a booking for a flight and returns the load plan over all
/// cargo confirmed so far. Per-cargo problems (door fit, capacity) are part
/// of the report, not HTTP errors.
#[utoipa::path(
    post,
    path = "/plan",
    request_body = PlanRequest,
    responses(
        (status = 200, description = "Load plan for the flight", body = Report),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Planning failed", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_plan(
    State(state): State<ApiState>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    println!(
        "📥 [{}] Booking: {} cargos, {} forced groups",
        request.flight_id,
        request.cargos.len(),
        request.forced_groups.len()
    );

    let result = state.flights.confirm_booking(
        &request.flight_id,
        &request.route,
        request.cargos,
        request.forced_groups,
        request.restrictions,
        &state.planner,
    );
    match result {
        Ok(report) => {
            println!(
                "📦 [{}] Plan: {} ULDs, {} rejections",
                request.flight_id,
                report.summary.total_ulds,
                report.rejected.len()
            );
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(err) => planning_failure(err),
    }
}

/// Handler for POST /simulate.
///
/// Stateless planning for sales inquiries; nothing is persisted.
#[utoipa::path(
    post,
    path = "/simulate",
    request_body = SimulateRequest,
    responses(
        (status = 200, description = "Simulated load plan", body = Report),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Planning failed", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_simulate(
    State(state): State<ApiState>,
    payload: Result<Json<SimulateRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    match simulate_loading_needs(request.cargos, &state.planner) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => planning_failure(err),
    }
}

/// Handler for POST /plan_stream (SSE).
///
/// Runs a stateless planning pass and streams each step as a Server-Sent
/// Event so a frontend can visualize the plan building up live.
#[utoipa::path(
    post,
    path = "/plan_stream",
    request_body = StreamRequest,
    responses(
        (
            status = 200,
            description = "Streams planning events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_plan_stream(
    State(state): State<ApiState>,
    payload: Result<Json<StreamRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    let (tx, rx) = mpsc::channel::<String>(64);
    let planner_config = state.planner;

    tokio::task::spawn_blocking(move || {
        let restrictions = request.restrictions.iter().cloned().collect();
        let map = match AircraftMap::base().snapshot(&restrictions) {
            Ok(map) => map,
            Err(err) => {
                let _ = tx.blocking_send(
                    serde_json::json!({ "type": "Error", "message": err.to_string() }).to_string(),
                );
                return;
            }
        };
        let mut engine = CorePlanningEngine::new(map, planner_config);
        let result =
            engine.plan_flight_with_progress(request.cargos, &request.forced_groups, |event| {
                if let Ok(json) = serde_json::to_string(event) {
                    // a closed receiver means nobody is watching anymore;
                    // remaining events are discarded
                    let _ = tx.blocking_send(json);
                }
            });
        if let Err(err) = result {
            let _ = tx.blocking_send(
                serde_json::json!({ "type": "Error", "message": err.to_string() }).to_string(),
            );
        }
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for DELETE /flights/{flight_id}.
///
/// Evicts a completed flight from the repository.
#[utoipa::path(
    delete,
    path = "/flights/{flight_id}",
    params(("flight_id" = String, Path, description = "Flight identifier")),
    responses(
        (status = 204, description = "Flight evicted"),
        (status = NOT_FOUND, description = "Unknown flight", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_close_flight(
    State(state): State<ApiState>,
    Path(flight_id): Path<String>,
) -> Response {
    if state.flights.close_flight(&flight_id) {
        println!("🗑️ [{}] Flight evicted", flight_id);
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_response(
            StatusCode::NOT_FOUND,
            "Unknown flight",
            format!("no flight '{}' in the repository", flight_id),
        )
    }
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
