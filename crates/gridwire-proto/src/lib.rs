//! gridwire protocol types.
//!
//! This crate defines the wire-facing types of the gridwire grid protocol:
//! the typed request IR produced from DataTables / ExtJS query strings, the
//! predicate and ordering IR handed to resources, and the JSON response
//! envelopes the client grids expect.
//!
//! # Modules
//!
//! - [`value`] - Runtime value types for records, predicates and rows
//! - [`query`] - Grid request IR, predicates and order fields
//! - [`envelope`] - DataTables and ExtJS response envelopes
//! - [`error`] - Protocol error types

pub mod envelope;
pub mod error;
pub mod query;
pub mod value;

pub use error::Error;

// Re-export commonly used types at crate root
pub use envelope::{
    is_valid_callback, DataTableEnvelope, ExtGridEnvelope, Row, ROW_CLASS_KEY, ROW_ID_KEY,
};
pub use query::{
    ColumnPath, ColumnRef, Comparison, FilterDirective, FilterKind, GridQuery, Lookup,
    OrderField, PageLength, Predicate, SortDirection, SortDirective, DEFAULT_PAGE_SIZE,
    MAX_FILTER_SLOTS, PATH_SEPARATOR,
};
pub use value::{Value, ISO_DATETIME_FORMAT, ISO_DATE_FORMAT};
