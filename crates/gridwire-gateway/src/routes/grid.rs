//! ExtJS grid endpoint.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use gridwire_core::GridHandler;

use crate::error::GatewayError;
use crate::routes::request_params;
use crate::AppState;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const DEBUG_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// ExtJS grid routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/grid/:namespace/:entity", get(ext_grid))
}

/// Serve a grid store page, wrapped in `callback` when one is given.
///
/// In debug mode the body is sent as plain text so browsers display it.
async fn ext_grid(
    State(state): State<AppState>,
    Path((namespace, entity)): Path<(String, String)>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, GatewayError> {
    let debug = state.config.grid.debug;
    let body = tokio::task::spawn_blocking(move || {
        let params = request_params(pairs);
        let resource = format!("{namespace}.{entity}");
        GridHandler::new(&state.config.grid, &state.registry)
            .ext_grid(&resource, &params)
            .render()
    })
    .await??;

    let content_type = if debug {
        DEBUG_CONTENT_TYPE
    } else {
        JSON_CONTENT_TYPE
    };
    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}
