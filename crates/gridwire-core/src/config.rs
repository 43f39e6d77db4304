//! Grid engine configuration.

use chrono::format::{Item, StrftimeItems};
use gridwire_proto::{DEFAULT_PAGE_SIZE, MAX_FILTER_SLOTS};

use crate::error::{Error, Result};

/// Date format applied to date and datetime cells, and accepted first when
/// parsing date filter values.
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Settings shared by every grid request.
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// strftime pattern for date and datetime cells.
    pub date_format: String,
    /// Page size used when the client sends none.
    pub default_page_size: u64,
    /// Maximum number of ExtJS filter slots read per request.
    pub max_filter_slots: usize,
    /// Reveal backend messages and error traces in failure envelopes.
    pub debug: bool,
    /// Attach `DT_RowId = "PK_<pk>"` to DataTables rows.
    pub row_ids: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_filter_slots: MAX_FILTER_SLOTS,
            debug: false,
            row_ids: true,
        }
    }
}

impl GridConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the date format, rejecting patterns chrono cannot render.
    pub fn with_date_format(mut self, format: impl Into<String>) -> Result<Self> {
        let format = format.into();
        validate_date_format(&format)?;
        self.date_format = format;
        Ok(self)
    }

    /// Set the default page size. Zero falls back to the protocol default.
    pub fn with_default_page_size(mut self, size: u64) -> Self {
        self.default_page_size = if size == 0 { DEFAULT_PAGE_SIZE } else { size };
        self
    }

    /// Set the maximum number of filter slots.
    pub fn with_max_filter_slots(mut self, slots: usize) -> Self {
        self.max_filter_slots = slots;
        self
    }

    /// Enable or disable debug mode.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Enable or disable `DT_RowId` on DataTables rows.
    pub fn with_row_ids(mut self, row_ids: bool) -> Self {
        self.row_ids = row_ids;
        self
    }
}

/// Check that `format` is a strftime pattern chrono can render.
pub fn validate_date_format(format: &str) -> Result<()> {
    if format.is_empty() || StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(Error::InvalidDateFormat(format.to_string()));
    }
    Ok(())
}
