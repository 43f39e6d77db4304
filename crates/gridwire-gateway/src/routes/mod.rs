//! HTTP route handlers.

pub mod datatable;
pub mod grid;
pub mod health;

use gridwire_core::RequestParams;

/// Collect decoded form or query pairs; later duplicates win.
pub(crate) fn request_params(pairs: Vec<(String, String)>) -> RequestParams {
    pairs.into_iter().collect()
}
