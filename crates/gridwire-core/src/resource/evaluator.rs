//! Predicate evaluation and ordering for in-memory records.

use std::cmp::Ordering;

use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};

use gridwire_proto::{Lookup, OrderField, Predicate, SortDirection, Value};

use super::accessor::{FieldAccessor, Resolved};
use super::Record;
use crate::error::{Error, Result};

/// A predicate prepared for repeated evaluation.
pub struct CompiledPredicate {
    accessor: FieldAccessor,
    lookup: Lookup,
    operand: Value,
    pattern: Option<Regex>,
    needle: Option<String>,
}

impl CompiledPredicate {
    /// Prepare `predicate`, compiling regular expressions once.
    pub fn compile(predicate: &Predicate, separator: &str) -> Result<Self> {
        let pattern = match predicate.lookup {
            Lookup::IRegex => {
                let source = predicate.value.to_string();
                let regex = RegexBuilder::new(&source)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| Error::execution(format!("{}: {e}", predicate.field)))?;
                Some(regex)
            }
            _ => None,
        };
        let needle = match predicate.lookup {
            Lookup::IContains => Some(predicate.value.to_string().to_lowercase()),
            _ => None,
        };
        Ok(Self {
            accessor: FieldAccessor::parse(&predicate.field, separator),
            lookup: predicate.lookup,
            operand: predicate.value.clone(),
            pattern,
            needle,
        })
    }

    /// Attribute name at the root of the predicate's path.
    pub fn root(&self) -> &str {
        &self.accessor.segments()[0]
    }

    /// Evaluate against `record`. A missing attribute never matches.
    pub fn matches(&self, record: &dyn Record) -> bool {
        let Ok(resolved) = self.accessor.resolve(record) else {
            return false;
        };
        let value = resolved.comparable();
        match self.lookup {
            Lookup::Exact => values_equal(&value, &self.operand),
            Lookup::Ne => !values_equal(&value, &self.operand),
            Lookup::IContains => match (&self.needle, &value) {
                (_, Value::Null) => false,
                (Some(needle), _) => searchable_text(&resolved).to_lowercase().contains(needle),
                (None, _) => false,
            },
            Lookup::IRegex => match (&self.pattern, &value) {
                (_, Value::Null) => false,
                (Some(pattern), _) => pattern.is_match(&searchable_text(&resolved)),
                (None, _) => false,
            },
            Lookup::Lt => compare_values(&value, &self.operand).is_some_and(Ordering::is_lt),
            Lookup::Lte => compare_values(&value, &self.operand).is_some_and(Ordering::is_le),
            Lookup::Gt => compare_values(&value, &self.operand).is_some_and(Ordering::is_gt),
            Lookup::Gte => compare_values(&value, &self.operand).is_some_and(Ordering::is_ge),
        }
    }
}

/// Text matched by substring and regex lookups. Related records match on
/// their display string.
fn searchable_text(resolved: &Resolved) -> String {
    match resolved {
        Resolved::Value(v) => v.to_string(),
        Resolved::Record(r) => r.display(),
    }
}

/// Equality with integer/float and date/datetime coercion.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Int(a), Value::Float(b)) => (*a as f64) == *b,
        (Value::Float(a), Value::Int(b)) => *a == (*b as f64),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Date(_), Value::Date(_))
        | (Value::Date(_), Value::DateTime(_))
        | (Value::DateTime(_), Value::Date(_)) => a.as_date() == b.as_date(),
        (Value::DateTime(a), Value::DateTime(b)) => a == b,
        _ => false,
    }
}

/// Ordering between compatible values, `None` for incompatible types.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
        (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
        (Value::Date(_), _) | (_, Value::Date(_)) => {
            let (a, b): (NaiveDate, NaiveDate) = (a.as_date()?, b.as_date()?);
            Some(a.cmp(&b))
        }
        _ => None,
    }
}

/// Total order used for sorting: nulls and missing attributes first, then
/// compatible values, then incomparable values treated as equal.
fn sort_key_cmp(a: &Option<Value>, b: &Option<Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(a), Some(b)) => compare_values(a, b).unwrap_or(Ordering::Equal),
    }
}

/// Multi-key ordering. Earlier keys take precedence; ties keep their
/// existing relative order.
pub struct RecordOrdering {
    keys: Vec<(FieldAccessor, SortDirection)>,
}

impl RecordOrdering {
    /// Prepare order fields.
    pub fn new(fields: &[OrderField], separator: &str) -> Self {
        Self {
            keys: fields
                .iter()
                .map(|f| (FieldAccessor::parse(&f.field, separator), f.direction))
                .collect(),
        }
    }

    /// Root attribute names referenced by the ordering.
    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|(a, _)| a.segments()[0].as_str())
    }

    /// Sort `records` in place (stable).
    pub fn sort<R: Record>(&self, records: &mut [R]) {
        if self.keys.is_empty() {
            return;
        }
        let mut keyed: Vec<(Vec<Option<Value>>, usize)> = records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let key = self
                    .keys
                    .iter()
                    .map(|(accessor, _)| accessor.resolve(r).ok().map(|v| v.comparable()))
                    .collect();
                (key, i)
            })
            .collect();

        keyed.sort_by(|(a, _), (b, _)| {
            for ((a, b), (_, direction)) in a.iter().zip(b.iter()).zip(&self.keys) {
                let ord = sort_key_cmp(a, b);
                let ord = match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        let order: Vec<usize> = keyed.into_iter().map(|(_, i)| i).collect();
        apply_permutation(records, order);
    }
}

/// Reorder `items` so that position `n` holds the element previously at
/// `order[n]`.
fn apply_permutation<T>(items: &mut [T], mut order: Vec<usize>) {
    for start in 0..order.len() {
        let mut current = start;
        while order[current] != start {
            let next = order[current];
            items.swap(current, next);
            order[current] = current;
            current = next;
        }
        order[current] = current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Attr, MemoryRecord};

    fn person(pk: i64, name: &str, age: Option<i64>) -> MemoryRecord {
        MemoryRecord::new(pk)
            .with_value("name", name)
            .with_value("age", age)
    }

    fn matches(predicate: Predicate, record: &MemoryRecord) -> bool {
        CompiledPredicate::compile(&predicate, "__")
            .unwrap()
            .matches(record)
    }

    #[test]
    fn test_exact_and_ne() {
        let ann = person(1, "Ann", Some(30));
        assert!(matches(Predicate::new("age", Lookup::Exact, 30i64), &ann));
        assert!(matches(Predicate::new("age", Lookup::Exact, 30.0), &ann));
        assert!(!matches(Predicate::new("age", Lookup::Exact, 31i64), &ann));
        assert!(matches(Predicate::new("age", Lookup::Ne, 31i64), &ann));
    }

    #[test]
    fn test_icontains() {
        let ann = person(1, "Ann", Some(30));
        assert!(matches(Predicate::new("name", Lookup::IContains, "AN"), &ann));
        assert!(matches(Predicate::new("age", Lookup::IContains, "3"), &ann));
        assert!(!matches(Predicate::new("name", Lookup::IContains, "bob"), &ann));

        let nobody = person(2, "Bob", None);
        assert!(!matches(Predicate::new("age", Lookup::IContains, ""), &nobody));
    }

    #[test]
    fn test_iregex() {
        let ann = person(1, "Ann", Some(30));
        assert!(matches(Predicate::new("name", Lookup::IRegex, "^a.n$"), &ann));
        assert!(!matches(Predicate::new("name", Lookup::IRegex, "^n"), &ann));
    }

    #[test]
    fn test_comparisons() {
        let ann = person(1, "Ann", Some(30));
        assert!(matches(Predicate::new("age", Lookup::Gt, 20i64), &ann));
        assert!(matches(Predicate::new("age", Lookup::Gte, 30i64), &ann));
        assert!(matches(Predicate::new("age", Lookup::Lt, 30.5), &ann));
        assert!(!matches(Predicate::new("age", Lookup::Lte, 29i64), &ann));
        // Incompatible types never match.
        assert!(!matches(Predicate::new("name", Lookup::Gt, 1i64), &ann));
    }

    #[test]
    fn test_missing_attribute_never_matches() {
        let ann = person(1, "Ann", Some(30));
        assert!(!matches(Predicate::new("email", Lookup::Exact, "x"), &ann));
        assert!(!matches(Predicate::new("email", Lookup::Ne, "x"), &ann));
    }

    #[test]
    fn test_date_comparisons() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        let record = MemoryRecord::new(1i64)
            .with_value("published", d(2020, 5, 1))
            .with_value("updated", d(2021, 1, 2).and_hms_opt(10, 0, 0).unwrap());
        assert!(matches(Predicate::new("published", Lookup::Gt, d(2020, 1, 1)), &record));
        assert!(matches(Predicate::new("updated", Lookup::Exact, d(2021, 1, 2)), &record));
        assert!(matches(Predicate::new("updated", Lookup::Lt, d(2021, 1, 3)), &record));
    }

    #[test]
    fn test_nested_predicate() {
        let author = MemoryRecord::new(5i64).with_value("name", "Ann");
        let book = MemoryRecord::new(1i64).with_related("author", author);
        assert!(matches(
            Predicate::new("author__name", Lookup::IContains, "an"),
            &book
        ));
        assert!(matches(Predicate::new("author", Lookup::Exact, 5i64), &book));
    }

    #[test]
    fn test_compare_values_numeric_coercion() {
        assert_eq!(
            compare_values(&Value::Int(1), &Value::Float(1.5)),
            Some(Ordering::Less)
        );
        assert_eq!(compare_values(&Value::from("a"), &Value::Int(1)), None);
    }

    #[test]
    fn test_ordering_multi_key_and_stable() {
        let mut records = vec![
            person(1, "Cy", Some(30)),
            person(2, "Ann", Some(25)),
            person(3, "Bob", Some(30)),
            person(4, "Dee", None),
            person(5, "Eve", Some(25)),
        ];
        let ordering = RecordOrdering::new(&[OrderField::desc("age")], "__");
        ordering.sort(&mut records);
        let pks: Vec<Value> = records.iter().map(|r| r.pk()).collect();
        assert_eq!(
            pks,
            vec![1i64, 3, 2, 5, 4].into_iter().map(Value::Int).collect::<Vec<_>>()
        );

        let ordering =
            RecordOrdering::new(&[OrderField::asc("age"), OrderField::desc("name")], "__");
        ordering.sort(&mut records);
        let names: Vec<String> = records.iter().map(name_of).collect();
        assert_eq!(names, vec!["Dee", "Eve", "Ann", "Cy", "Bob"]);
    }

    fn name_of(record: &MemoryRecord) -> String {
        match record.attr("name") {
            Some(Attr::Value(Value::String(name))) => name,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_apply_permutation() {
        let mut items = vec!['a', 'b', 'c', 'd'];
        apply_permutation(&mut items, vec![2, 0, 3, 1]);
        assert_eq!(items, vec!['c', 'a', 'd', 'b']);
    }
}
