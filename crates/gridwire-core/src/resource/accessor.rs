//! Attribute path resolution.

use thiserror::Error;

use gridwire_proto::{ColumnPath, Value, PATH_SEPARATOR};

use super::{Attr, Record, RecordRef};

/// A path has a hop that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("attribute {attr} not found")]
pub struct NotFound {
    /// The first missing hop.
    pub attr: String,
}

/// Outcome of resolving a path against a record.
#[derive(Clone)]
pub enum Resolved {
    /// The path ends at a scalar.
    Value(Value),
    /// The path ends at a related record.
    Record(RecordRef),
}

impl Resolved {
    /// Value used for comparisons. Records compare by primary key.
    pub fn comparable(&self) -> Value {
        match self {
            Resolved::Value(v) => v.clone(),
            Resolved::Record(r) => r.pk(),
        }
    }
}

/// How to read a column from a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldAccessor {
    /// A single attribute.
    Direct(String),
    /// A chain of attributes through related records.
    Nested(Vec<String>),
}

impl FieldAccessor {
    /// Split `path` on `separator`.
    pub fn parse(path: &str, separator: &str) -> Self {
        let segments: Vec<String> = path.split(separator).map(str::to_string).collect();
        if segments.len() == 1 {
            FieldAccessor::Direct(path.to_string())
        } else {
            FieldAccessor::Nested(segments)
        }
    }

    /// Accessor for a dotted column path.
    pub fn from_column(column: &ColumnPath) -> Self {
        let mut buf = [0u8; 4];
        Self::parse(column.as_str(), PATH_SEPARATOR.encode_utf8(&mut buf))
    }

    /// Attribute names along the path.
    pub fn segments(&self) -> &[String] {
        match self {
            FieldAccessor::Direct(name) => std::slice::from_ref(name),
            FieldAccessor::Nested(names) => names,
        }
    }

    /// Walk the path from `record`, forcing computed attributes.
    pub fn resolve(&self, record: &dyn Record) -> Result<Resolved, NotFound> {
        let segments = self.segments();
        let mut current = lookup(record, &segments[0])?;
        for segment in &segments[1..] {
            current = match current {
                Attr::Related(related) => lookup(related.as_ref(), segment)?,
                _ => {
                    return Err(NotFound {
                        attr: segment.clone(),
                    })
                }
            };
        }
        match current {
            Attr::Related(related) => Ok(Resolved::Record(related)),
            Attr::Value(value) => Ok(Resolved::Value(value)),
            Attr::Computed(_) => unreachable!("forced by lookup"),
        }
    }
}

fn lookup(record: &dyn Record, name: &str) -> Result<Attr, NotFound> {
    record
        .attr(name)
        .map(Attr::force)
        .ok_or_else(|| NotFound {
            attr: name.to_string(),
        })
}
