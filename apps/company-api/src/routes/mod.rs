//! API routes

pub mod company;

use axum::{middleware, Router};
use company_domain::company::CompanyLifecycle;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::require_bearer,
    dto::company::{CompanyResponse, CreateCompanyRequest, ErrorResponse, UpdateCompanyRequest},
    handlers, AppState,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::company::create_company,
        handlers::company::get_company,
        handlers::company::update_company,
        handlers::company::delete_company,
        health_handler
    ),
    components(
        schemas(CreateCompanyRequest, UpdateCompanyRequest, CompanyResponse, ErrorResponse)
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "companies", description = "Company lifecycle endpoints"),
        (name = "health", description = "Health check endpoints")
    ),
    info(
        title = "Company API",
        version = "0.1.0",
        description = "Creates, updates, deletes and reads companies; every change is announced on the event stream"
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the main application router
///
/// Company routes require a bearer token; health and docs do not.
pub fn create_router<S>(state: AppState<S>) -> Router
where
    S: CompanyLifecycle + 'static,
{
    let protected = company::routes::<S>().route_layer(middleware::from_fn_with_state(
        state.verifier.clone(),
        require_bearer,
    ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(protected)
        .route("/health", axum::routing::get(health_handler))
        .with_state(state)
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    ),
    tag = "health"
)]
async fn health_handler() -> &'static str {
    "OK"
}
