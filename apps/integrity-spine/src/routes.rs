// [apps/integrity-spine/src/routes.rs]
/*!
 * =================================================================
 * APARATO: INTEGRITY SPINE ROUTING MATRIX (V1.0 - SPINE GENESIS)
 * CLASIFICACION: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: TOPOLOGIA DE RUTAS DE CUBO, POLITICA, ORQUESTADOR,
 *                   AUDITORIA/GOBERNANZA Y CICLO DE VIDA
 * =================================================================
 */

use std::time::Duration;

use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{audit, cube, governance, lifecycle, orchestrator, policy};
use crate::middleware::{health_guard, request_id_guard};
use crate::state::AppState;

pub fn create_spine_router(application_shared_state: AppState, cors_origins: &[String]) -> Router {
    let cors_layer = build_cors_layer(cors_origins);

    let facet_service = Router::new()
        .route("/cubes/:cube_id", get(cube::get_cube))
        .route("/cubes/:cube_id/faces/:facet", get(cube::get_face))
        .route("/cubes/:cube_id/transferOwnership", post(cube::transfer_ownership));

    let policy_engine = Router::new().route("/policy/check", post(policy::check)).route("/policy/canViewFace", post(policy::can_view_face));

    let orchestrator_service = Router::new()
        .route("/intent/resolve", post(orchestrator::resolve_intent))
        .route("/execute/transfer_ownership", post(orchestrator::execute_transfer_ownership));

    let audit_governance = Router::new()
        .route("/audit/log", post(audit::log))
        .route("/audit/anchorChain", post(audit::anchor_chain))
        .route("/audit/:scan_id/explain", get(audit::explain))
        .route("/audit/escalate", post(audit::escalate))
        .route("/governance/escalations", get(governance::list_escalations))
        .route("/governance/escalations/:scan_id/decision", post(governance::decide_escalation));

    let lifecycle_service = Router::new()
        .route("/cubes/:cube_id/lifecycle/transition", post(lifecycle::transition))
        .route("/cubes/:cube_id/lifecycle/authorize_dissolve", post(lifecycle::authorize_dissolve));

    Router::new()
        .route("/health", get(health_check))
        .nest(
            "/api/v1",
            Router::new()
                .merge(facet_service)
                .merge(policy_engine)
                .merge(orchestrator_service)
                .merge(audit_governance)
                .merge(lifecycle_service)
                .layer(middleware::from_fn_with_state(application_shared_state.clone(), health_guard)),
        )
        .layer(middleware::from_fn(request_id_guard))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(application_shared_state)
}

async fn health_check() -> &'static str {
    "STATUS_OK"
}

fn build_cors_layer(cors_origins: &[String]) -> CorsLayer {
    let request_id_header: header::HeaderName = spine_shared_telemetry::REQUEST_ID_HEADER.parse().expect("static header name");
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, request_id_header.clone()])
        .expose_headers([request_id_header])
        .max_age(Duration::from_secs(3600));

    if cors_origins.iter().any(|origin| origin == "*") {
        layer.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<header::HeaderValue> = cors_origins.iter().filter_map(|origin| origin.parse().ok()).collect();
        layer.allow_origin(origins)
    }
}
