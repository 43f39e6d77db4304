//! DataTables endpoints.
//!
//! `/datatable` resolves the resource from `sResource` or `sModel`;
//! `/datatable/:namespace/:entity` fixes it in the path. Both accept the
//! parameters as a query string (GET) or a urlencoded form body (POST).

use axum::{
    extract::{Path, State},
    routing::get,
    Form, Json, Router,
};
use gridwire_core::{proto::DataTableEnvelope, GridHandler};

use crate::error::GatewayError;
use crate::routes::request_params;
use crate::AppState;

/// DataTables routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/datatable", get(datatable).post(datatable))
        .route(
            "/datatable/:namespace/:entity",
            get(bound_datatable).post(bound_datatable),
        )
}

async fn datatable(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Json<DataTableEnvelope>, GatewayError> {
    serve(state, None, pairs).await
}

async fn bound_datatable(
    State(state): State<AppState>,
    Path((namespace, entity)): Path<(String, String)>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Json<DataTableEnvelope>, GatewayError> {
    serve(state, Some(format!("{namespace}.{entity}")), pairs).await
}

async fn serve(
    state: AppState,
    resource: Option<String>,
    pairs: Vec<(String, String)>,
) -> Result<Json<DataTableEnvelope>, GatewayError> {
    let envelope = tokio::task::spawn_blocking(move || {
        let params = request_params(pairs);
        GridHandler::new(&state.config.grid, &state.registry)
            .datatable(resource.as_deref(), &params)
    })
    .await?;

    Ok(Json(envelope))
}
