//! In-memory resource.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use gridwire_proto::{
    ColumnPath, OrderField, Predicate, Value, ISO_DATETIME_FORMAT, ISO_DATE_FORMAT,
};

use super::evaluator::{CompiledPredicate, RecordOrdering};
use super::{Attr, Queryable, Record, DEFAULT_LOOKUP_SEPARATOR};
use crate::error::{Error, Result};

/// Name that always resolves to the primary key.
pub const PK_ALIAS: &str = "pk";

/// Key holding the display label of a related object in JSON input.
pub const LABEL_KEY: &str = "__str__";

/// A record held in memory.
#[derive(Clone)]
pub struct MemoryRecord {
    pk: Value,
    label: Option<String>,
    fields: Vec<(String, Attr)>,
}

impl MemoryRecord {
    /// Create a record with the given primary key.
    pub fn new(pk: impl Into<Value>) -> Self {
        Self {
            pk: pk.into(),
            label: None,
            fields: Vec::new(),
        }
    }

    /// Set the display label. Without one the record displays as its pk.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add or replace an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, attr: Attr) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = attr,
            None => self.fields.push((name, attr)),
        }
        self
    }

    /// Add a scalar attribute.
    pub fn with_value(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_attr(name, Attr::value(value))
    }

    /// Add a related record.
    pub fn with_related(self, name: impl Into<String>, related: MemoryRecord) -> Self {
        self.with_attr(name, Attr::related(related))
    }

    /// Add a computed attribute.
    pub fn with_computed(
        self,
        name: impl Into<String>,
        f: impl Fn() -> Attr + Send + Sync + 'static,
    ) -> Self {
        self.with_attr(name, Attr::computed(f))
    }

    /// Attribute names in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Build a record from a JSON object.
    ///
    /// `pk_field` names the primary key. Nested objects become related
    /// records (their own `id`, or `pk_field`, is the key and `__str__` the
    /// label). ISO date and datetime strings become temporal values.
    pub fn from_json(
        object: &serde_json::Map<String, serde_json::Value>,
        pk_field: &str,
    ) -> Self {
        let pk = object
            .get(pk_field)
            .map(value_from_json)
            .unwrap_or(Value::Null);
        let mut record = MemoryRecord::new(pk);
        if let Some(label) = object.get(LABEL_KEY).and_then(|v| v.as_str()) {
            record = record.with_label(label);
        }
        for (name, value) in object {
            if name == LABEL_KEY {
                continue;
            }
            let attr = match value {
                serde_json::Value::Object(nested) => {
                    Attr::related(MemoryRecord::from_json(nested, pk_field))
                }
                other => Attr::Value(value_from_json(other)),
            };
            record = record.with_attr(name.clone(), attr);
        }
        record
    }
}

/// Convert a JSON scalar. Arrays are kept as their JSON text.
pub fn value_from_json(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        serde_json::Value::String(s) => {
            if let Ok(d) = NaiveDate::parse_from_str(s, ISO_DATE_FORMAT) {
                Value::Date(d)
            } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, ISO_DATETIME_FORMAT) {
                Value::DateTime(dt)
            } else {
                Value::String(s.clone())
            }
        }
        other => Value::String(other.to_string()),
    }
}

impl Record for MemoryRecord {
    fn pk(&self) -> Value {
        self.pk.clone()
    }

    fn attr(&self, name: &str) -> Option<Attr> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, attr)| attr.clone())
            .or_else(|| (name == PK_ALIAS).then(|| Attr::Value(self.pk.clone())))
    }

    fn display(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => self.pk.to_string(),
        }
    }
}

/// A resource backed by a vector of shared records.
///
/// Filtering and ordering produce a new table over the same records.
#[derive(Clone, Default)]
pub struct MemoryTable {
    records: Vec<Arc<MemoryRecord>>,
}

impl MemoryTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    pub fn push(&mut self, record: MemoryRecord) {
        self.records.push(Arc::new(record));
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Attribute names known to the table.
    pub fn field_names(&self) -> BTreeSet<&str> {
        let mut names: BTreeSet<&str> =
            self.records.iter().flat_map(|r| r.field_names()).collect();
        names.insert(PK_ALIAS);
        names
    }

    fn check_field(&self, known: &BTreeSet<&str>, root: &str) -> Result<()> {
        if self.records.is_empty() || known.contains(root) {
            return Ok(());
        }
        Err(Error::execution(format!(
            "cannot resolve keyword {root:?} into field, choices are: {}",
            known.iter().copied().collect::<Vec<_>>().join(", ")
        )))
    }
}

impl FromIterator<MemoryRecord> for MemoryTable {
    fn from_iter<T: IntoIterator<Item = MemoryRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().map(Arc::new).collect(),
        }
    }
}

impl Queryable for MemoryTable {
    type Record = Arc<MemoryRecord>;

    fn default_fields(&self) -> Vec<ColumnPath> {
        let names: BTreeSet<&str> = self.records.iter().flat_map(|r| r.field_names()).collect();
        names.into_iter().map(ColumnPath::new).collect()
    }

    fn filter(self, predicates: &[Predicate]) -> Result<Self> {
        let compiled = predicates
            .iter()
            .map(|p| CompiledPredicate::compile(p, DEFAULT_LOOKUP_SEPARATOR))
            .collect::<Result<Vec<_>>>()?;
        {
            let known = self.field_names();
            for predicate in &compiled {
                self.check_field(&known, predicate.root())?;
            }
        }
        let before = self.records.len();
        let records: Vec<_> = self
            .records
            .into_iter()
            .filter(|r| compiled.iter().all(|p| p.matches(&**r)))
            .collect();
        debug!(before, after = records.len(), "filtered memory table");
        Ok(Self { records })
    }

    fn order_by(mut self, fields: &[OrderField]) -> Result<Self> {
        let ordering = RecordOrdering::new(fields, DEFAULT_LOOKUP_SEPARATOR);
        {
            let known = self.field_names();
            for root in ordering.roots() {
                self.check_field(&known, root)?;
            }
        }
        ordering.sort(&mut self.records);
        Ok(self)
    }

    fn count(&self) -> Result<u64> {
        Ok(self.records.len() as u64)
    }

    fn slice(&self, start: u64, length: u64) -> Result<Vec<Self::Record>> {
        let start = usize::try_from(start).unwrap_or(usize::MAX);
        let length = usize::try_from(length).unwrap_or(usize::MAX);
        Ok(self
            .records
            .iter()
            .skip(start)
            .take(length)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridwire_proto::Lookup;
    use serde_json::json;

    fn table() -> MemoryTable {
        ["Cy", "Ann", "Bob"]
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                MemoryRecord::new(i as i64 + 1)
                    .with_value("name", name)
                    .with_value("age", 20 + i as i64)
            })
            .collect()
    }

    fn pks(records: &[Arc<MemoryRecord>]) -> Vec<i64> {
        records.iter().filter_map(|r| r.pk().as_i64()).collect()
    }

    #[test]
    fn test_filter_count_slice() {
        let table = table()
            .filter(&[Predicate::new("name", Lookup::IContains, "b")])
            .unwrap();
        assert_eq!(table.count().unwrap(), 1);
        assert_eq!(pks(&table.slice(0, 10).unwrap()), vec![3]);
    }

    #[test]
    fn test_order_by_and_slice_window() {
        let table = table().order_by(&[OrderField::asc("name")]).unwrap();
        assert_eq!(pks(&table.slice(0, 10).unwrap()), vec![2, 3, 1]);
        assert_eq!(pks(&table.slice(1, 1).unwrap()), vec![3]);
        assert!(table.slice(5, 10).unwrap().is_empty());
    }

    #[test]
    fn test_pk_alias() {
        let table = table().order_by(&[OrderField::desc("pk")]).unwrap();
        assert_eq!(pks(&table.slice(0, 3).unwrap()), vec![3, 2, 1]);
    }

    #[test]
    fn test_unknown_field_is_execution_error() {
        let err = table()
            .filter(&[Predicate::new("salary", Lookup::Gt, 1i64)])
            .err()
            .map(|e| e.kind());
        assert_eq!(err, Some(crate::error::ErrorKind::Execution));

        assert!(table().order_by(&[OrderField::asc("salary")]).is_err());
    }

    #[test]
    fn test_from_json() {
        let object = json!({
            "id": 7,
            "title": "Dune",
            "published": "1965-08-01",
            "rating": 4.5,
            "author": {"id": 1, "__str__": "Frank Herbert", "name": "Frank"}
        });
        let record = MemoryRecord::from_json(object.as_object().unwrap(), "id");
        assert_eq!(record.pk(), Value::Int(7));
        assert!(matches!(record.attr("published"), Some(Attr::Value(Value::Date(_)))));
        assert!(matches!(record.attr("rating"), Some(Attr::Value(Value::Float(_)))));
        match record.attr("author") {
            Some(Attr::Related(author)) => {
                assert_eq!(author.display(), "Frank Herbert");
                assert_eq!(author.pk(), Value::Int(1));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_display_falls_back_to_pk() {
        assert_eq!(MemoryRecord::new(9i64).display(), "9");
        assert_eq!(MemoryRecord::new(Value::Null).display(), "null");
    }
}
