//! gridwire core - server-side grid query engine.
//!
//! This crate turns DataTables and ExtJS grid requests into filtered,
//! ordered and windowed queries against [`Queryable`] resources and
//! projects the results into response rows.
//!
//! ```text
//! RequestParams -> codec -> GridQuery -> QueryExecutor -> ResultPage
//!     -> RowProjector -> DataTableEnvelope / ExtGridEnvelope
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod projector;
pub mod query;
pub mod registry;
pub mod resource;

pub use codec::{datatable_query, ext_grid_query, ExtGridRequest, Param, RequestParams};
pub use config::{GridConfig, DEFAULT_DATE_FORMAT};
pub use error::{Error, ErrorKind, Result};
pub use handler::{
    error_trace, serve_datatable, serve_ext_grid, ExtGridResponse, GridHandler,
    EXECUTION_ERROR_MESSAGE,
};
pub use projector::{RowClass, RowProjector, RowShape, MISSING_FIELD};
pub use query::{FilterBuilder, QueryExecutor, ResultPage, SortResolver};
pub use registry::{Registration, ResourceName, ResourceRegistry};
pub use resource::{
    Attr, FieldAccessor, MemoryRecord, MemoryTable, NotFound, Queryable, Record, RecordRef,
    Resolved,
};

/// Re-export protocol types.
pub use gridwire_proto as proto;
