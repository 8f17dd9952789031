//! Company handlers
//!
//! Each request runs under a child of the server's shutdown token, so
//! stopping the server cancels in-flight store and stream calls.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use company_domain::company::{CompanyId, CompanyLifecycle, CompanyPatch, NewCompany};
use serde_json::{Map, Value};
use tracing::info;

use crate::{
    auth::Claims,
    dto::company::{CompanyResponse, CreateCompanyRequest, ErrorResponse, UpdateCompanyRequest},
    handlers::ApiError,
    AppState,
};

/// Create a company
#[utoipa::path(
    post,
    path = "/companies",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created", body = CompanyResponse),
        (status = 400, description = "Invalid body", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 409, description = "Name already taken", body = ErrorResponse),
        (status = 500, description = "Store write or event publish failed", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "companies"
)]
pub async fn create_company<S>(
    State(state): State<AppState<S>>,
    Extension(claims): Extension<Claims>,
    body: Result<Json<CreateCompanyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CompanyResponse>), ApiError>
where
    S: CompanyLifecycle + 'static,
{
    let Json(request) = body?;
    let ctx = state.shutdown.child_token();

    let company = state
        .service
        .create(&ctx, NewCompany::from(request))
        .await?;

    info!(company_id = %company.id(), username = %claims.username, "Company created via API");
    Ok((StatusCode::CREATED, Json(CompanyResponse::from(&company))))
}

/// Fetch a company by id
#[utoipa::path(
    get,
    path = "/companies/{id}",
    params(("id" = String, Path, description = "Company id (UUID)")),
    responses(
        (status = 200, description = "Company found", body = CompanyResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "No such company", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "companies"
)]
pub async fn get_company<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<CompanyResponse>, ApiError>
where
    S: CompanyLifecycle + 'static,
{
    let id = CompanyId::parse(&id)?;
    let ctx = state.shutdown.child_token();

    match state.service.get(&ctx, id).await? {
        Some(company) => Ok(Json(CompanyResponse::from(&company))),
        None => Err(ApiError::not_found(format!("Company {id} not found"))),
    }
}

/// Apply a partial update
#[utoipa::path(
    patch,
    path = "/companies/{id}",
    params(("id" = String, Path, description = "Company id (UUID)")),
    request_body = UpdateCompanyRequest,
    responses(
        (status = 200, description = "Company updated"),
        (status = 400, description = "Invalid body or id", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "No such company", body = ErrorResponse),
        (status = 409, description = "New name already taken", body = ErrorResponse),
        (status = 500, description = "Store write or event publish failed", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "companies"
)]
pub async fn update_company<S>(
    State(state): State<AppState<S>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<StatusCode, ApiError>
where
    S: CompanyLifecycle + 'static,
{
    let id = CompanyId::parse(&id)?;
    let Json(fields) = body?;
    let patch = CompanyPatch::try_from(fields)?;
    let ctx = state.shutdown.child_token();

    state.service.update(&ctx, id, patch).await?;

    info!(company_id = %id, username = %claims.username, "Company updated via API");
    Ok(StatusCode::OK)
}

/// Delete a company
#[utoipa::path(
    delete,
    path = "/companies/{id}",
    params(("id" = String, Path, description = "Company id (UUID)")),
    responses(
        (status = 204, description = "Company deleted"),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "No such company", body = ErrorResponse),
        (status = 500, description = "Store write or event publish failed", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "companies"
)]
pub async fn delete_company<S>(
    State(state): State<AppState<S>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    S: CompanyLifecycle + 'static,
{
    let id = CompanyId::parse(&id)?;
    let ctx = state.shutdown.child_token();

    state.service.delete(&ctx, id).await?;

    info!(company_id = %id, username = %claims.username, "Company deleted via API");
    Ok(StatusCode::NO_CONTENT)
}
