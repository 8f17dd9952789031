//! Company routes

use axum::{
    routing::{get, post},
    Router,
};
use company_domain::company::CompanyLifecycle;

use crate::{
    handlers::company::{create_company, delete_company, get_company, update_company},
    AppState,
};

/// Create company routes
pub fn routes<S>() -> Router<AppState<S>>
where
    S: CompanyLifecycle + 'static,
{
    Router::new()
        .route("/companies", post(create_company::<S>))
        .route(
            "/companies/:id",
            get(get_company::<S>)
                .patch(update_company::<S>)
                .delete(delete_company::<S>),
        )
}
