//! Queryable resources and their records.
//!
//! A [`Queryable`] is a lazily filtered, ordered collection of records.
//! It receives the abstract [`Predicate`] and [`OrderField`] IR and must be
//! cheap to count and slice. A [`Record`] exposes attributes by name;
//! attributes may be plain values, related records or computed thunks.

use std::fmt;
use std::sync::Arc;

use gridwire_proto::{ColumnPath, OrderField, Predicate, Value};

use crate::error::Result;

pub mod accessor;
pub mod evaluator;
pub mod memory;

pub use accessor::{FieldAccessor, NotFound, Resolved};
pub use memory::{MemoryRecord, MemoryTable};

/// Separator between hops of a nested lookup path.
pub const DEFAULT_LOOKUP_SEPARATOR: &str = "__";

/// A computed attribute.
pub type Thunk = Arc<dyn Fn() -> Attr + Send + Sync>;

/// A shared, type-erased record.
pub type RecordRef = Arc<dyn Record>;

/// One attribute of a record.
#[derive(Clone)]
pub enum Attr {
    /// A scalar value.
    Value(Value),
    /// A related record, followed by nested paths.
    Related(RecordRef),
    /// A zero-argument computation, invoked on access.
    Computed(Thunk),
}

impl Attr {
    /// Wrap a scalar.
    pub fn value(value: impl Into<Value>) -> Self {
        Attr::Value(value.into())
    }

    /// Wrap a related record.
    pub fn related(record: impl Record + 'static) -> Self {
        Attr::Related(Arc::new(record))
    }

    /// Wrap a computation.
    pub fn computed(f: impl Fn() -> Attr + Send + Sync + 'static) -> Self {
        Attr::Computed(Arc::new(f))
    }

    /// Invoke computed attributes until a value or record remains.
    pub fn force(self) -> Attr {
        let mut attr = self;
        while let Attr::Computed(thunk) = attr {
            attr = thunk();
        }
        attr
    }
}

impl fmt::Debug for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attr::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Attr::Related(r) => f.debug_tuple("Related").field(&r.display()).finish(),
            Attr::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<Value> for Attr {
    fn from(value: Value) -> Self {
        Attr::Value(value)
    }
}

/// A record with named attributes.
pub trait Record: Send + Sync {
    /// Primary key.
    fn pk(&self) -> Value;

    /// Attribute by name, `None` if the record has no such attribute.
    fn attr(&self, name: &str) -> Option<Attr>;

    /// Display string, used when a column resolves to a related record.
    fn display(&self) -> String;
}

impl<R: Record + ?Sized> Record for Arc<R> {
    fn pk(&self) -> Value {
        (**self).pk()
    }

    fn attr(&self, name: &str) -> Option<Attr> {
        (**self).attr(name)
    }

    fn display(&self) -> String {
        (**self).display()
    }
}

/// A lazily filtered and ordered collection of records.
///
/// `filter` combines predicates with AND. `order_by` applies fields in
/// order, earlier fields taking precedence. `slice` past the end returns
/// an empty vector.
pub trait Queryable: Sized {
    /// Record type produced by [`Queryable::slice`].
    type Record: Record;

    /// Separator the resource expects between nested lookup hops.
    fn lookup_separator(&self) -> &str {
        DEFAULT_LOOKUP_SEPARATOR
    }

    /// Fields exposed when a registration declares none.
    fn default_fields(&self) -> Vec<ColumnPath> {
        Vec::new()
    }

    /// Narrow the collection to records matching every predicate.
    fn filter(self, predicates: &[Predicate]) -> Result<Self>;

    /// Order the collection.
    fn order_by(self, fields: &[OrderField]) -> Result<Self>;

    /// Number of records in the collection.
    fn count(&self) -> Result<u64>;

    /// Materialize `length` records starting at `start`.
    fn slice(&self, start: u64, length: u64) -> Result<Vec<Self::Record>>;
}
