// SPDX-License-Identifier: AGPL-3.0-or-later

use axum::{
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

pub mod challenge;
pub mod health;
pub mod token;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/", get(challenge::challenge).post(token::token))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    routes
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        challenge::challenge,
        token::token,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            challenge::ChallengeResponse,
            token::TokenRequest,
            token::TokenResponse,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "Auth", description = "Challenge issuance and token exchange"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
