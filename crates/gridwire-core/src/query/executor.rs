//! Query executor for grid requests.
//!
//! The executor validates a [`GridQuery`] against its declared columns,
//! then runs filter, count, order and slice against a [`Queryable`]
//! resource, materializing only the requested window.

use tracing::debug;

use gridwire_proto::{GridQuery, PageLength};

use super::filter::FilterBuilder;
use super::sort::SortResolver;
use crate::config::GridConfig;
use crate::error::Result;
use crate::resource::Queryable;

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage<R> {
    /// Records before windowing. Equal to the filtered count unless the
    /// caller supplied a separate total.
    pub total_records: u64,
    /// Records matching the filters.
    pub total_display_records: u64,
    /// The requested window.
    pub records: Vec<R>,
}

/// Executes grid queries against resources.
pub struct QueryExecutor<'a> {
    config: &'a GridConfig,
}

impl<'a> QueryExecutor<'a> {
    /// Create an executor with the given configuration.
    pub fn new(config: &'a GridConfig) -> Self {
        Self { config }
    }

    /// Execute `query` against `resource`.
    pub fn execute<Q: Queryable>(
        &self,
        resource: Q,
        query: &GridQuery,
    ) -> Result<ResultPage<Q::Record>> {
        self.execute_with_total(resource, query, None)
    }

    /// Execute `query`, reporting `total_records` as the unfiltered total
    /// when given.
    pub fn execute_with_total<Q: Queryable>(
        &self,
        resource: Q,
        query: &GridQuery,
        total_records: Option<u64>,
    ) -> Result<ResultPage<Q::Record>> {
        let separator = resource.lookup_separator().to_string();

        // Validate before touching the resource
        let predicates = FilterBuilder::new(&query.columns, &separator, &self.config.date_format)
            .build(&query.filters)?;
        let ordering = SortResolver::new(&query.columns, &separator).resolve(&query.sorting)?;

        let resource = if predicates.is_empty() {
            resource
        } else {
            debug!(
                predicates = %predicates
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                "applying filters"
            );
            resource.filter(&predicates)?
        };

        let filtered = resource.count()?;

        let resource = if ordering.is_empty() {
            resource
        } else {
            debug!(
                ordering = %ordering
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                "applying ordering"
            );
            resource.order_by(&ordering)?
        };

        let (start, length) = self.window(query, filtered);
        let records = if start >= filtered || length == 0 {
            Vec::new()
        } else {
            resource.slice(start, length)?
        };

        debug!(
            filtered,
            start,
            length,
            returned = records.len(),
            "executed grid query"
        );

        Ok(ResultPage {
            total_records: total_records.unwrap_or(filtered),
            total_display_records: filtered,
            records,
        })
    }

    /// Resolve the requested window to a concrete start and length.
    fn window(&self, query: &GridQuery, filtered: u64) -> (u64, u64) {
        let start = query.display_start;
        let length = match query.display_length {
            PageLength::Default => self.config.default_page_size,
            PageLength::Limit(n) => n,
            PageLength::Unbounded => filtered.saturating_sub(start),
        };
        (start, length)
    }
}
