//! Request handlers.
//!
//! A handler decodes a request, runs it and always produces an envelope.
//! Every error, including a panic inside a resource, becomes a failure
//! envelope here and nowhere else.

use std::any::Any;
use std::error::Error as StdError;
use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use gridwire_proto::{ColumnPath, DataTableEnvelope, ExtGridEnvelope, GridQuery};

use crate::codec::{self, RequestParams};
use crate::config::GridConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::projector::{RowClass, RowProjector, RowShape};
use crate::query::QueryExecutor;
use crate::registry::ResourceRegistry;
use crate::resource::Queryable;

/// Message shown for execution errors outside debug mode.
pub const EXECUTION_ERROR_MESSAGE: &str = "error while querying resource";

/// ExtJS success message.
pub const OK_MESSAGE: &str = "OK";

/// Serves grid requests against registered resources.
pub struct GridHandler<'a, Q> {
    config: &'a GridConfig,
    registry: &'a ResourceRegistry<Q>,
    row_class: Option<RowClass>,
}

impl<'a, Q: Queryable + Clone> GridHandler<'a, Q> {
    pub fn new(config: &'a GridConfig, registry: &'a ResourceRegistry<Q>) -> Self {
        Self {
            config,
            registry,
            row_class: None,
        }
    }

    /// Attach `DT_RowClass` to DataTables rows.
    pub fn with_row_class(mut self, row_class: RowClass) -> Self {
        self.row_class = Some(row_class);
        self
    }

    /// Serve a DataTables request. `bound` names the resource when the
    /// route fixes it; otherwise `sResource`/`sModel` is used.
    pub fn datatable(&self, bound: Option<&str>, params: &RequestParams) -> DataTableEnvelope {
        datatable_envelope(self.config, params, self.row_class.as_ref(), |query| {
            let name = bound
                .or(query.resource.as_deref())
                .ok_or_else(|| Error::MissingParameter("sResource".to_string()))?;
            Ok(self.registry.resolve(name)?.resource().clone())
        })
    }

    /// Serve an ExtJS grid request for `resource`.
    pub fn ext_grid(&self, resource: &str, params: &RequestParams) -> ExtGridResponse {
        ext_grid_envelope(self.config, params, || {
            let registration = self.registry.resolve(resource)?;
            Ok((registration.resource().clone(), registration.columns()))
        })
    }
}

/// Serve a DataTables request against a caller-supplied resource.
pub fn serve_datatable<Q: Queryable>(
    config: &GridConfig,
    resource: Q,
    params: &RequestParams,
    row_class: Option<&RowClass>,
) -> DataTableEnvelope {
    datatable_envelope(config, params, row_class, |_| Ok(resource))
}

/// Serve an ExtJS grid request against a caller-supplied resource.
pub fn serve_ext_grid<Q: Queryable>(
    config: &GridConfig,
    resource: Q,
    fields: &[ColumnPath],
    params: &RequestParams,
) -> ExtGridResponse {
    ext_grid_envelope(config, params, || Ok((resource, fields.to_vec())))
}

fn datatable_envelope<Q, F>(
    config: &GridConfig,
    params: &RequestParams,
    row_class: Option<&RowClass>,
    source: F,
) -> DataTableEnvelope
where
    Q: Queryable,
    F: FnOnce(&GridQuery) -> Result<Q>,
{
    let mut echo = None;
    let outcome = guard(|| {
        echo = Some(params.string("sEcho")?);
        let query = codec::datatable_query(params, config)?;
        let resource = source(&query)?;
        let page = QueryExecutor::new(config).execute(resource, &query)?;
        let rows = RowProjector::new(&query.columns, &config.date_format)
            .with_row_ids(config.row_ids)
            .with_row_class(row_class.cloned())
            .project_all(&page.records)?;
        Ok(DataTableEnvelope::success(
            query.echo.unwrap_or_default(),
            page.total_records,
            page.total_display_records,
            rows,
        ))
    });

    outcome.unwrap_or_else(|err| {
        let (message, trace) = failure_detail(config, &err);
        DataTableEnvelope::failure(echo, message, trace)
    })
}

/// An ExtJS envelope and the JSONP callback it should be wrapped in.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtGridResponse {
    pub envelope: ExtGridEnvelope,
    pub callback: Option<String>,
}

impl ExtGridResponse {
    /// Serialize, wrapping in the callback when it is a valid identifier.
    pub fn render(&self) -> std::result::Result<String, serde_json::Error> {
        self.envelope.render(self.callback.as_deref())
    }
}

fn ext_grid_envelope<Q, F>(
    config: &GridConfig,
    params: &RequestParams,
    source: F,
) -> ExtGridResponse
where
    Q: Queryable,
    F: FnOnce() -> Result<(Q, Vec<ColumnPath>)>,
{
    let callback = params.raw("callback").map(str::to_string);
    let outcome = guard(|| {
        let request = codec::ext_grid_query(params, config)?;
        let (resource, fields) = source()?;
        let mut query = request.query;
        query.columns = fields;

        let page = QueryExecutor::new(config).execute(resource, &query)?;
        let rows = RowProjector::new(&query.columns, &config.date_format)
            .with_shape(RowShape::Named)
            .project_all(&page.records)?;
        let message = if request.window_fallback {
            format!("Index error, first {} entries", config.default_page_size)
        } else {
            OK_MESSAGE.to_string()
        };
        Ok(ExtGridEnvelope::success(rows, page.total_display_records, message))
    });

    let envelope = outcome.unwrap_or_else(|err| {
        let (message, trace) = failure_detail(config, &err);
        ExtGridEnvelope::failure(message, trace)
    });
    ExtGridResponse { envelope, callback }
}

/// Run `f`, turning a panic into an execution error.
fn guard<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(Error::execution(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("resource panicked: {detail}")
}

/// Message and optional trace for a failure envelope.
fn failure_detail(config: &GridConfig, err: &Error) -> (String, Option<String>) {
    warn!(error = %err, kind = ?err.kind(), "grid request failed");
    let message = if err.kind() == ErrorKind::Execution && !config.debug {
        EXECUTION_ERROR_MESSAGE.to_string()
    } else {
        err.to_string()
    };
    let trace = config.debug.then(|| error_trace(err));
    (message, trace)
}

/// Render an error and its sources, one per line.
pub fn error_trace(err: &(dyn StdError + 'static)) -> String {
    std::iter::successors(Some(err), |&e| e.source())
        .enumerate()
        .map(|(depth, e)| format!("{depth}: {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}
