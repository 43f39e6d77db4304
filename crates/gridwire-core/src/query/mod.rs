//! Query engine for grid requests.
//!
//! Sort and filter directives are validated against the request's declared
//! columns and lowered to [`Predicate`](gridwire_proto::Predicate) and
//! [`OrderField`](gridwire_proto::OrderField) IR, which the executor hands
//! to a [`Queryable`](crate::resource::Queryable) resource.

mod executor;
mod filter;
mod sort;

pub use executor::{QueryExecutor, ResultPage};
pub use filter::FilterBuilder;
pub use sort::SortResolver;
