//! Filter directive validation.
//!
//! [`FilterBuilder`] turns client filter directives into the abstract
//! [`Predicate`] IR, resolving column references and parsing typed values.

use regex::RegexBuilder;

use gridwire_proto::{
    ColumnPath, ColumnRef, Comparison, FilterDirective, FilterKind, Lookup, Predicate, Value,
};

use crate::error::{Error, Result};

/// Builds predicates from filter directives.
pub struct FilterBuilder<'a> {
    columns: &'a [ColumnPath],
    separator: &'a str,
    date_format: &'a str,
}

impl<'a> FilterBuilder<'a> {
    /// Create a builder over the request's declared columns.
    pub fn new(columns: &'a [ColumnPath], separator: &'a str, date_format: &'a str) -> Self {
        Self {
            columns,
            separator,
            date_format,
        }
    }

    /// Build one predicate per directive, failing on the first invalid one.
    pub fn build(&self, directives: &[FilterDirective]) -> Result<Vec<Predicate>> {
        directives.iter().map(|d| self.build_one(d)).collect()
    }

    fn build_one(&self, directive: &FilterDirective) -> Result<Predicate> {
        let field = self.field(&directive.target)?;
        let invalid = |source| Error::InvalidFilter {
            field: field.clone(),
            source,
        };

        match directive.kind {
            FilterKind::String if directive.regex => {
                RegexBuilder::new(&directive.value)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| Error::InvalidPattern {
                        field: field.clone(),
                        source,
                    })?;
                Ok(Predicate::new(field.clone(), Lookup::IRegex, directive.value.as_str()))
            }
            FilterKind::String => Ok(Predicate::new(
                field.clone(),
                Lookup::IContains,
                directive.value.as_str(),
            )),
            FilterKind::Numeric => {
                let lookup = self.comparison(directive).map_err(invalid)?;
                let value = Value::parse_number(&directive.value).map_err(invalid)?;
                Ok(Predicate::new(field.clone(), lookup, value))
            }
            FilterKind::Date => {
                let lookup = self.comparison(directive).map_err(invalid)?;
                let value =
                    Value::parse_date(&directive.value, self.date_format).map_err(invalid)?;
                Ok(Predicate::new(field.clone(), lookup, value))
            }
            FilterKind::Boolean => {
                let value = Value::parse_bool(&directive.value).map_err(invalid)?;
                Ok(Predicate::new(field.clone(), Lookup::Exact, value))
            }
        }
    }

    fn comparison(
        &self,
        directive: &FilterDirective,
    ) -> std::result::Result<Lookup, gridwire_proto::Error> {
        let raw = directive
            .comparison
            .as_deref()
            .ok_or(gridwire_proto::Error::MissingComparison)?;
        Comparison::parse(raw).map(Lookup::from)
    }

    fn field(&self, target: &ColumnRef) -> Result<String> {
        match target {
            ColumnRef::Index(index) => self
                .columns
                .get(*index)
                .map(|c| c.to_lookup(self.separator))
                .ok_or(Error::InvalidFilterColumn {
                    index: *index,
                    columns: self.columns.len(),
                }),
            ColumnRef::Name(name) => Ok(ColumnPath::new(name.as_str()).to_lookup(self.separator)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn columns() -> Vec<ColumnPath> {
        vec![ColumnPath::new("name"), ColumnPath::new("author.name")]
    }

    fn build(directive: FilterDirective) -> Result<Predicate> {
        let columns = columns();
        let builder = FilterBuilder::new(&columns, "__", "%d/%m/%Y");
        builder.build(&[directive]).map(|mut p| p.remove(0))
    }

    #[test]
    fn test_contains_on_indexed_column() {
        let p = build(FilterDirective::contains(ColumnRef::Index(1), "ann")).unwrap();
        assert_eq!(p, Predicate::new("author__name", Lookup::IContains, "ann"));
        assert_eq!(p.to_string(), "author__name__icontains=ann");
    }

    #[test]
    fn test_regex_validated() {
        let mut directive = FilterDirective::contains(ColumnRef::Index(0), "^A");
        directive.regex = true;
        assert_eq!(
            build(directive.clone()).unwrap(),
            Predicate::new("name", Lookup::IRegex, "^A")
        );

        directive.value = "(".to_string();
        assert!(matches!(build(directive), Err(Error::InvalidPattern { .. })));
    }

    #[test]
    fn test_filter_column_out_of_range() {
        assert!(matches!(
            build(FilterDirective::contains(ColumnRef::Index(2), "x")),
            Err(Error::InvalidFilterColumn { index: 2, columns: 2 })
        ));
    }

    #[test]
    fn test_numeric_filter() {
        let d = FilterDirective::compare(
            ColumnRef::Name("age".into()),
            FilterKind::Numeric,
            "gte",
            "21",
        );
        assert_eq!(build(d).unwrap(), Predicate::new("age", Lookup::Gte, 21i64));

        let d = FilterDirective::compare(
            ColumnRef::Name("price".into()),
            FilterKind::Numeric,
            "ne",
            "9.5",
        );
        assert_eq!(build(d).unwrap(), Predicate::new("price", Lookup::Ne, 9.5));
    }

    #[test]
    fn test_numeric_filter_errors() {
        let bad_value = FilterDirective::compare(
            ColumnRef::Name("age".into()),
            FilterKind::Numeric,
            "gt",
            "old",
        );
        assert!(matches!(
            build(bad_value),
            Err(Error::InvalidFilter {
                source: gridwire_proto::Error::InvalidNumber(_),
                ..
            })
        ));

        let bad_cmp = FilterDirective::compare(
            ColumnRef::Name("age".into()),
            FilterKind::Numeric,
            "between",
            "1",
        );
        assert!(matches!(
            build(bad_cmp),
            Err(Error::InvalidFilter {
                source: gridwire_proto::Error::UnsupportedComparison(_),
                ..
            })
        ));

        let mut missing = FilterDirective::contains(ColumnRef::Name("age".into()), "1");
        missing.kind = FilterKind::Numeric;
        assert!(matches!(
            build(missing),
            Err(Error::InvalidFilter {
                source: gridwire_proto::Error::MissingComparison,
                ..
            })
        ));
    }

    #[test]
    fn test_date_filter_uses_configured_format() {
        let d = FilterDirective::compare(
            ColumnRef::Name("author.born".into()),
            FilterKind::Date,
            "lt",
            "31/12/1950",
        );
        assert_eq!(
            build(d).unwrap(),
            Predicate::new(
                "author__born",
                Lookup::Lt,
                NaiveDate::from_ymd_opt(1950, 12, 31).unwrap()
            )
        );
    }

    #[test]
    fn test_boolean_filter() {
        let mut d = FilterDirective::contains(ColumnRef::Name("active".into()), "true");
        d.kind = FilterKind::Boolean;
        assert_eq!(build(d).unwrap(), Predicate::new("active", Lookup::Exact, true));
    }
}
