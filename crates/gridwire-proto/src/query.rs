//! Query IR for grid requests.
//!
//! A [`GridQuery`] is the typed form of one DataTables or ExtJS grid request.
//! Column paths are kept exactly as the client declared them (dot-separated);
//! rewriting to a backend's nested-lookup separator happens when predicates
//! and order fields are built.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::value::Value;

/// Page size used when the client sends no length, or a non-positive one.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Maximum number of ExtJS filter slots read from a request.
pub const MAX_FILTER_SLOTS: usize = 10;

/// Separator between segments of a declared column path.
pub const PATH_SEPARATOR: char = '.';

/// A dot-separated column path, e.g. `author.name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnPath(String);

impl ColumnPath {
    /// Create a column path as declared by the client.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The path as declared.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate the attribute names along the path.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(PATH_SEPARATOR)
    }

    /// Check if this is a plain attribute (no dots in path).
    pub fn is_direct(&self) -> bool {
        !self.0.contains(PATH_SEPARATOR)
    }

    /// Rewrite the path with a backend's nested-lookup separator.
    pub fn to_lookup(&self, separator: &str) -> String {
        self.segments().collect::<Vec<_>>().join(separator)
    }
}

impl fmt::Display for ColumnPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColumnPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for ColumnPath {
    fn from(path: String) -> Self {
        Self(path)
    }
}

/// Reference to a column, either by position in the declared column list
/// (DataTables) or by field name (ExtJS).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRef {
    /// Index into [`GridQuery::columns`].
    Index(usize),
    /// Field name used as declared.
    Name(String),
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Parse a DataTables `sSortDir_<n>` value. Anything other than
    /// `asc`/`desc` yields `None`.
    pub fn from_datatables(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    /// Parse an ExtJS `dir` value: `DESC` is descending, anything else
    /// ascending.
    pub fn from_ext(raw: &str) -> Self {
        if raw == "DESC" {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

/// A sort directive as sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    /// Column to sort by.
    pub column: ColumnRef,
    /// Sort direction.
    pub direction: SortDirection,
}

impl SortDirective {
    /// Ascending sort on a column index.
    pub fn asc(index: usize) -> Self {
        Self {
            column: ColumnRef::Index(index),
            direction: SortDirection::Asc,
        }
    }

    /// Descending sort on a column index.
    pub fn desc(index: usize) -> Self {
        Self {
            column: ColumnRef::Index(index),
            direction: SortDirection::Desc,
        }
    }

    /// Sort on a field name.
    pub fn field(name: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: ColumnRef::Name(name.into()),
            direction,
        }
    }
}

/// Kind of a filter slot (`filter[<n>][data][type]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterKind {
    /// Case-insensitive substring match.
    String,
    /// Numeric comparison.
    Numeric,
    /// Date comparison.
    Date,
    /// Boolean equality.
    Boolean,
}

impl FilterKind {
    /// Parse a wire filter type. Unknown types yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "string" => Some(FilterKind::String),
            "numeric" => Some(FilterKind::Numeric),
            "date" => Some(FilterKind::Date),
            "boolean" => Some(FilterKind::Boolean),
            _ => None,
        }
    }
}

/// Comparison operator of a numeric or date filter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparison {
    /// Parse a wire comparison (`eq`, `ne`, `lt`, `lte`, `gt`, `gte`).
    pub fn parse(raw: &str) -> Result<Self, Error> {
        match raw {
            "eq" => Ok(Comparison::Eq),
            "ne" => Ok(Comparison::Ne),
            "lt" => Ok(Comparison::Lt),
            "lte" => Ok(Comparison::Lte),
            "gt" => Ok(Comparison::Gt),
            "gte" => Ok(Comparison::Gte),
            other => Err(Error::UnsupportedComparison(other.to_string())),
        }
    }
}

/// A filter directive as sent by the client, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDirective {
    /// Column to filter on.
    pub target: ColumnRef,
    /// Filter kind.
    pub kind: FilterKind,
    /// Raw comparison string, only meaningful for numeric/date kinds.
    pub comparison: Option<String>,
    /// Raw filter value.
    pub value: String,
    /// Treat a string value as a case-insensitive regular expression.
    pub regex: bool,
}

impl FilterDirective {
    /// A case-insensitive contains filter.
    pub fn contains(target: ColumnRef, value: impl Into<String>) -> Self {
        Self {
            target,
            kind: FilterKind::String,
            comparison: None,
            value: value.into(),
            regex: false,
        }
    }

    /// A comparison filter of the given kind.
    pub fn compare(
        target: ColumnRef,
        kind: FilterKind,
        comparison: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            target,
            kind,
            comparison: Some(comparison.into()),
            value: value.into(),
            regex: false,
        }
    }
}

/// Requested page length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageLength {
    /// Server default page size.
    #[default]
    Default,
    /// At most this many rows.
    Limit(u64),
    /// Every row from the display start on.
    Unbounded,
}

impl PageLength {
    /// DataTables semantics: absent or non-positive means default.
    pub fn from_datatables(raw: Option<i64>) -> Self {
        match raw {
            Some(n) if n > 0 => PageLength::Limit(n as u64),
            _ => PageLength::Default,
        }
    }

    /// ExtJS semantics: absent means default, non-positive means unbounded.
    pub fn from_ext(raw: Option<i64>) -> Self {
        match raw {
            None => PageLength::Default,
            Some(n) if n <= 0 => PageLength::Unbounded,
            Some(n) => PageLength::Limit(n as u64),
        }
    }
}

/// Typed representation of one grid request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GridQuery {
    /// Opaque token echoed back verbatim (DataTables only).
    pub echo: Option<String>,
    /// Declared columns, in display order.
    pub columns: Vec<ColumnPath>,
    /// Zero-based row offset.
    pub display_start: u64,
    /// Requested page length.
    pub display_length: PageLength,
    /// Sort directives in priority order.
    pub sorting: Vec<SortDirective>,
    /// Filter directives, combined with AND.
    pub filters: Vec<FilterDirective>,
    /// `<namespace>.<entity>` of the backing resource, when not bound.
    pub resource: Option<String>,
}

impl GridQuery {
    /// Create a query over the given columns.
    pub fn new<I, C>(columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnPath>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Set the echo token.
    pub fn with_echo(mut self, echo: impl Into<String>) -> Self {
        self.echo = Some(echo.into());
        self
    }

    /// Set the display window.
    pub fn with_window(mut self, start: u64, length: PageLength) -> Self {
        self.display_start = start;
        self.display_length = length;
        self
    }

    /// Add a sort directive.
    pub fn with_sort(mut self, directive: SortDirective) -> Self {
        self.sorting.push(directive);
        self
    }

    /// Add a filter directive.
    pub fn with_filter(mut self, directive: FilterDirective) -> Self {
        self.filters.push(directive);
        self
    }

    /// Set the backing resource name.
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Look up a column by index.
    pub fn column(&self, index: usize) -> Option<&ColumnPath> {
        self.columns.get(index)
    }
}

/// Lookup applied by a [`Predicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lookup {
    /// Exact match.
    Exact,
    /// Not equal.
    Ne,
    /// Case-insensitive substring.
    IContains,
    /// Case-insensitive regular expression.
    IRegex,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Lookup {
    /// Lookup suffix as an ORM would spell it (`field__<suffix>`).
    /// Exact matches have no suffix.
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            Lookup::Exact => None,
            Lookup::Ne => Some("ne"),
            Lookup::IContains => Some("icontains"),
            Lookup::IRegex => Some("iregex"),
            Lookup::Lt => Some("lt"),
            Lookup::Lte => Some("lte"),
            Lookup::Gt => Some("gt"),
            Lookup::Gte => Some("gte"),
        }
    }
}

impl From<Comparison> for Lookup {
    fn from(comparison: Comparison) -> Self {
        match comparison {
            Comparison::Eq => Lookup::Exact,
            Comparison::Ne => Lookup::Ne,
            Comparison::Lt => Lookup::Lt,
            Comparison::Lte => Lookup::Lte,
            Comparison::Gt => Lookup::Gt,
            Comparison::Gte => Lookup::Gte,
        }
    }
}

/// One abstract filter predicate: `field <lookup> value`.
///
/// `field` is already expressed with the target resource's nested-lookup
/// separator.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Field lookup path.
    pub field: String,
    /// Lookup to apply.
    pub lookup: Lookup,
    /// Operand.
    pub value: Value,
}

impl Predicate {
    /// Create a predicate.
    pub fn new(field: impl Into<String>, lookup: Lookup, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            lookup,
            value: value.into(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lookup.suffix() {
            Some(suffix) => write!(f, "{}__{}={}", self.field, suffix, self.value),
            None => write!(f, "{}={}", self.field, self.value),
        }
    }
}

/// An ordering field handed to a resource: a lookup path plus direction.
///
/// Renders as `field` for ascending and `-field` for descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderField {
    /// Field lookup path.
    pub field: String,
    /// Sort direction.
    pub direction: SortDirection,
}

impl OrderField {
    /// Create an ascending order field.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Create a descending order field.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parse the `-field` / `field` notation.
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('-') {
            Some(field) => Self::desc(field),
            None => Self::asc(raw),
        }
    }
}

impl fmt::Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Asc => f.write_str(&self.field),
            SortDirection::Desc => write!(f, "-{}", self.field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_path_lookup() {
        let path = ColumnPath::new("author.country.name");
        assert_eq!(path.to_lookup("__"), "author__country__name");
        assert_eq!(path.segments().count(), 3);
        assert!(!path.is_direct());
        assert!(ColumnPath::new("name").is_direct());
    }

    #[test]
    fn test_sort_direction_parsing() {
        assert_eq!(SortDirection::from_datatables("asc"), Some(SortDirection::Asc));
        assert_eq!(SortDirection::from_datatables("desc"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::from_datatables("DESC"), None);
        assert_eq!(SortDirection::from_ext("DESC"), SortDirection::Desc);
        assert_eq!(SortDirection::from_ext("ASC"), SortDirection::Asc);
        assert_eq!(SortDirection::from_ext(""), SortDirection::Asc);
    }

    #[test]
    fn test_page_length_semantics() {
        assert_eq!(PageLength::from_datatables(None), PageLength::Default);
        assert_eq!(PageLength::from_datatables(Some(-1)), PageLength::Default);
        assert_eq!(PageLength::from_datatables(Some(25)), PageLength::Limit(25));
        assert_eq!(PageLength::from_ext(None), PageLength::Default);
        assert_eq!(PageLength::from_ext(Some(0)), PageLength::Unbounded);
        assert_eq!(PageLength::from_ext(Some(50)), PageLength::Limit(50));
    }

    #[test]
    fn test_comparison_parsing() {
        assert_eq!(Comparison::parse("gte"), Ok(Comparison::Gte));
        assert_eq!(
            Comparison::parse("between"),
            Err(Error::UnsupportedComparison("between".into()))
        );
        assert_eq!(Lookup::from(Comparison::Eq), Lookup::Exact);
    }

    #[test]
    fn test_order_field_notation() {
        assert_eq!(OrderField::desc("age").to_string(), "-age");
        assert_eq!(OrderField::asc("author__name").to_string(), "author__name");
        assert_eq!(OrderField::parse("-age"), OrderField::desc("age"));
        assert_eq!(OrderField::parse("age"), OrderField::asc("age"));
    }

    #[test]
    fn test_predicate_display() {
        let p = Predicate::new("name", Lookup::IContains, "a");
        assert_eq!(p.to_string(), "name__icontains=a");
        let p = Predicate::new("age", Lookup::Exact, 30);
        assert_eq!(p.to_string(), "age=30");
    }

    #[test]
    fn test_grid_query_builder() {
        let query = GridQuery::new(["name", "age"])
            .with_echo("3")
            .with_window(10, PageLength::Limit(5))
            .with_sort(SortDirective::desc(1))
            .with_resource("library.book");

        assert_eq!(query.echo.as_deref(), Some("3"));
        assert_eq!(query.column(1).map(ColumnPath::as_str), Some("age"));
        assert!(query.column(2).is_none());
        assert_eq!(query.sorting.len(), 1);
        assert_eq!(query.resource.as_deref(), Some("library.book"));
    }
}
