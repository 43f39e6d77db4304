//! Row projection.
//!
//! Turns records into the JSON rows grid clients render. Each declared
//! column is resolved through the record's attributes; temporal values are
//! formatted with the configured date format and related records collapse
//! to their display string.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use chrono::NaiveTime;
use gridwire_proto::{ColumnPath, Row, Value, ROW_CLASS_KEY, ROW_ID_KEY};

use crate::error::{Error, Result};
use crate::resource::{FieldAccessor, Record, Resolved};

/// Cell value for a column the record cannot resolve.
pub const MISSING_FIELD: &str = "Not in model";

/// Prefix of `DT_RowId` values.
pub const ROW_ID_PREFIX: &str = "PK_";

/// Row key layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowShape {
    /// Keys are column positions (`"0"`, `"1"`, ...).
    #[default]
    Positional,
    /// Keys are the declared column paths.
    Named,
}

/// Row CSS class attached as `DT_RowClass`.
#[derive(Clone)]
pub enum RowClass {
    /// Same class for every row.
    Fixed(String),
    /// Class computed from the record.
    Computed(Arc<dyn Fn(&dyn Record) -> String + Send + Sync>),
}

impl RowClass {
    /// Class computed by `f`.
    pub fn computed(f: impl Fn(&dyn Record) -> String + Send + Sync + 'static) -> Self {
        RowClass::Computed(Arc::new(f))
    }

    fn class_for(&self, record: &dyn Record) -> String {
        match self {
            RowClass::Fixed(class) => class.clone(),
            RowClass::Computed(f) => f(record),
        }
    }
}

impl fmt::Debug for RowClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowClass::Fixed(class) => f.debug_tuple("Fixed").field(class).finish(),
            RowClass::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Projects records onto the declared columns.
pub struct RowProjector<'a> {
    columns: Vec<(String, FieldAccessor)>,
    date_format: &'a str,
    shape: RowShape,
    row_ids: bool,
    row_class: Option<RowClass>,
}

impl<'a> RowProjector<'a> {
    /// Create a positional projector without row ids.
    pub fn new(columns: &[ColumnPath], date_format: &'a str) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|c| (c.as_str().to_string(), FieldAccessor::from_column(c)))
                .collect(),
            date_format,
            shape: RowShape::Positional,
            row_ids: false,
            row_class: None,
        }
    }

    pub fn with_shape(mut self, shape: RowShape) -> Self {
        self.shape = shape;
        self
    }

    /// Attach `DT_RowId = "PK_<pk>"`.
    pub fn with_row_ids(mut self, row_ids: bool) -> Self {
        self.row_ids = row_ids;
        self
    }

    /// Attach `DT_RowClass`.
    pub fn with_row_class(mut self, row_class: Option<RowClass>) -> Self {
        self.row_class = row_class;
        self
    }

    /// Project every record.
    pub fn project_all<R: Record>(&self, records: &[R]) -> Result<Vec<Row>> {
        records.iter().map(|r| self.project(r)).collect()
    }

    /// Project one record.
    pub fn project(&self, record: &dyn Record) -> Result<Row> {
        let mut row = Row::new();
        for (index, (name, accessor)) in self.columns.iter().enumerate() {
            let key = match self.shape {
                RowShape::Positional => index.to_string(),
                RowShape::Named => name.clone(),
            };
            row.insert(key, self.cell(record, accessor)?);
        }
        if self.row_ids {
            row.insert(
                ROW_ID_KEY.to_string(),
                serde_json::Value::String(format!("{ROW_ID_PREFIX}{}", record.pk())),
            );
        }
        if let Some(row_class) = &self.row_class {
            row.insert(
                ROW_CLASS_KEY.to_string(),
                serde_json::Value::String(row_class.class_for(record)),
            );
        }
        Ok(row)
    }

    fn cell(&self, record: &dyn Record, accessor: &FieldAccessor) -> Result<serde_json::Value> {
        match accessor.resolve(record) {
            Err(_) => Ok(serde_json::Value::String(MISSING_FIELD.to_string())),
            Ok(Resolved::Record(related)) => Ok(serde_json::Value::String(related.display())),
            Ok(Resolved::Value(value)) => match value {
                Value::Date(_) | Value::DateTime(_) => {
                    Ok(serde_json::Value::String(self.format_temporal(&value)?))
                }
                other => Ok(other.to_json()),
            },
        }
    }

    fn format_temporal(&self, value: &Value) -> Result<String> {
        let mut out = String::new();
        let written = match value {
            // Dates render as midnight.
            Value::Date(d) => {
                let midnight = d.and_time(NaiveTime::MIN);
                write!(out, "{}", midnight.format(self.date_format))
            }
            Value::DateTime(dt) => write!(out, "{}", dt.format(self.date_format)),
            _ => return Ok(value.to_string()),
        };
        written.map_err(|_| Error::InvalidDateFormat(self.date_format.to_string()))?;
        Ok(out)
    }
}
