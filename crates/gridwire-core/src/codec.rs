//! Request parameter codec.
//!
//! Grid clients send flat string maps whose keys carry their type in a
//! one-character prefix (`iDisplayStart`, `bRegex_0`, `sEcho`). A
//! [`RequestParams`] decodes each key on first access and memoizes the
//! result; [`datatable_query`] and [`ext_grid_query`] read the keys each
//! protocol defines and build a [`GridQuery`].

use std::cell::RefCell;
use std::collections::HashMap;

use gridwire_proto::{
    ColumnPath, ColumnRef, FilterDirective, FilterKind, GridQuery, PageLength, SortDirection,
    SortDirective,
};
use tracing::debug;

use crate::config::GridConfig;
use crate::error::{Error, Result};

/// Delimiter between declared columns in `sColumns`.
pub const COLUMN_DELIMITER: char = ',';

/// A decoded request parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// `i`-prefixed key.
    Int(i64),
    /// `b`-prefixed key.
    Bool(bool),
    /// Any other key.
    Str(String),
}

impl Param {
    /// Decode `raw` according to the prefix of `key`.
    pub fn decode(key: &str, raw: &str) -> Result<Self> {
        match key.as_bytes().first() {
            Some(b'i') => raw
                .trim()
                .parse::<i64>()
                .map(Param::Int)
                .map_err(|_| Error::MalformedParameter {
                    key: key.to_string(),
                    value: raw.to_string(),
                }),
            Some(b'b') => Ok(Param::Bool(!raw.eq_ignore_ascii_case("false"))),
            _ => Ok(Param::Str(raw.to_string())),
        }
    }
}

/// Raw request parameters with lazy, memoized typed decoding.
#[derive(Debug, Default)]
pub struct RequestParams {
    raw: HashMap<String, String>,
    decoded: RefCell<HashMap<String, Param>>,
}

impl RequestParams {
    /// Wrap a raw parameter map.
    pub fn new(raw: HashMap<String, String>) -> Self {
        Self {
            raw,
            decoded: RefCell::new(HashMap::new()),
        }
    }

    /// Raw value of a key.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.raw.get(key).map(String::as_str)
    }

    /// Check if a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.raw.contains_key(key)
    }

    /// Iterate raw key/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.raw.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of keys that have been decoded so far.
    pub fn decoded_len(&self) -> usize {
        self.decoded.borrow().len()
    }

    /// Decode a key, failing when it is absent.
    pub fn get(&self, key: &str) -> Result<Param> {
        self.get_opt(key)?
            .ok_or_else(|| Error::MissingParameter(key.to_string()))
    }

    /// Decode a key if present.
    pub fn get_opt(&self, key: &str) -> Result<Option<Param>> {
        if let Some(param) = self.decoded.borrow().get(key) {
            return Ok(Some(param.clone()));
        }
        let Some(raw) = self.raw.get(key) else {
            return Ok(None);
        };
        let param = Param::decode(key, raw)?;
        self.decoded
            .borrow_mut()
            .insert(key.to_string(), param.clone());
        Ok(Some(param))
    }

    /// Required integer parameter.
    pub fn int(&self, key: &str) -> Result<i64> {
        self.opt_int(key)?
            .ok_or_else(|| Error::MissingParameter(key.to_string()))
    }

    /// Optional integer parameter.
    pub fn opt_int(&self, key: &str) -> Result<Option<i64>> {
        match self.get_opt(key)? {
            None => Ok(None),
            Some(Param::Int(i)) => Ok(Some(i)),
            Some(_) => Err(self.malformed(key)),
        }
    }

    /// Optional boolean parameter.
    pub fn opt_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get_opt(key)? {
            None => Ok(None),
            Some(Param::Bool(b)) => Ok(Some(b)),
            Some(_) => Err(self.malformed(key)),
        }
    }

    /// Required string parameter.
    pub fn string(&self, key: &str) -> Result<String> {
        self.opt_string(key)?
            .ok_or_else(|| Error::MissingParameter(key.to_string()))
    }

    /// Optional string parameter. Typed keys yield their raw text.
    pub fn opt_string(&self, key: &str) -> Result<Option<String>> {
        match self.get_opt(key)? {
            None => Ok(None),
            Some(Param::Str(s)) => Ok(Some(s)),
            Some(_) => Ok(self.raw(key).map(str::to_string)),
        }
    }

    fn malformed(&self, key: &str) -> Error {
        Error::MalformedParameter {
            key: key.to_string(),
            value: self.raw(key).unwrap_or_default().to_string(),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for RequestParams
where
    K: Into<String>,
    V: Into<String>,
{
    /// Later duplicates win.
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Decode a DataTables server-side request.
pub fn datatable_query(params: &RequestParams, config: &GridConfig) -> Result<GridQuery> {
    let echo = params.string("sEcho")?;
    let columns: Vec<ColumnPath> = params
        .string("sColumns")?
        .split(COLUMN_DELIMITER)
        .map(ColumnPath::new)
        .collect();

    let display_start = non_negative(params, "iDisplayStart")?.unwrap_or(0);
    let display_length = PageLength::from_datatables(params.opt_int("iDisplayLength")?);

    let mut query = GridQuery::new(columns)
        .with_echo(echo)
        .with_window(display_start, display_length);
    query.sorting = sort_directives(params)?;
    query.filters = column_searches(params, query.columns.len())?;
    query
        .filters
        .extend(scan_filter_slots(params, config.max_filter_slots));
    query.resource = match params.opt_string("sResource")? {
        Some(name) => Some(name),
        None => params.opt_string("sModel")?,
    };

    debug!(
        columns = query.columns.len(),
        start = query.display_start,
        length = ?query.display_length,
        sorting = query.sorting.len(),
        filters = query.filters.len(),
        "decoded datatable request"
    );
    Ok(query)
}

/// An ExtJS grid request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtGridRequest {
    /// Decoded query. Columns are left empty for the caller to fill from
    /// the resource's registered fields.
    pub query: GridQuery,
    /// JSONP callback name.
    pub callback: Option<String>,
    /// `start`/`limit` could not be parsed and the default window was used.
    pub window_fallback: bool,
}

/// Decode an ExtJS grid store request (`start`, `limit`, `sort`, `dir`,
/// `callback` and filter slots).
pub fn ext_grid_query(params: &RequestParams, config: &GridConfig) -> Result<ExtGridRequest> {
    let callback = params.opt_string("callback")?;

    let window = (|| -> Option<(u64, PageLength)> {
        let start = match params.raw("start") {
            Some(raw) => u64::try_from(raw.trim().parse::<i64>().ok()?).ok()?,
            None => 0,
        };
        let limit = match params.raw("limit") {
            Some(raw) => Some(raw.trim().parse::<i64>().ok()?),
            None => None,
        };
        Some((start, PageLength::from_ext(limit)))
    })();
    // An unparseable window serves the first default-sized page rather than
    // every row, and the envelope message reports it.
    let window_fallback = window.is_none();
    let (start, length) = window.unwrap_or((0, PageLength::Default));

    let mut query = GridQuery::default().with_window(start, length);
    if let Some(field) = params.opt_string("sort")?.filter(|s| !s.is_empty()) {
        let direction = params
            .opt_string("dir")?
            .map(|d| SortDirection::from_ext(&d))
            .unwrap_or_default();
        query.sorting.push(SortDirective::field(field, direction));
    }
    query.filters = scan_filter_slots(params, config.max_filter_slots);

    debug!(
        start,
        length = ?length,
        window_fallback,
        filters = query.filters.len(),
        "decoded ext grid request"
    );
    Ok(ExtGridRequest {
        query,
        callback,
        window_fallback,
    })
}

fn non_negative(params: &RequestParams, key: &str) -> Result<Option<u64>> {
    params
        .opt_int(key)?
        .map(|n| {
            u64::try_from(n).map_err(|_| Error::MalformedParameter {
                key: key.to_string(),
                value: n.to_string(),
            })
        })
        .transpose()
}

/// Read `iSortingCols` pairs. Unknown directions are skipped.
fn sort_directives(params: &RequestParams) -> Result<Vec<SortDirective>> {
    let count = non_negative(params, "iSortingCols")?.unwrap_or(0);
    let mut directives = Vec::new();
    for n in 0..count {
        let index_key = format!("iSortCol_{n}");
        let index = non_negative(params, &index_key)?
            .ok_or_else(|| Error::MissingParameter(index_key.clone()))?;
        let direction = params.string(&format!("sSortDir_{n}"))?;
        let Some(direction) = SortDirection::from_datatables(&direction) else {
            debug!(n, direction, "skipping sort directive with unknown direction");
            continue;
        };
        directives.push(SortDirective {
            column: ColumnRef::Index(usize::try_from(index).unwrap_or(usize::MAX)),
            direction,
        });
    }
    Ok(directives)
}

/// Read per-column `sSearch_<n>` searches.
fn column_searches(params: &RequestParams, columns: usize) -> Result<Vec<FilterDirective>> {
    let mut directives = Vec::new();
    for n in 0..columns {
        let Some(term) = params.opt_string(&format!("sSearch_{n}"))? else {
            continue;
        };
        if term.is_empty() || params.opt_bool(&format!("bSearchable_{n}"))? == Some(false) {
            continue;
        }
        let mut directive = FilterDirective::contains(ColumnRef::Index(n), term);
        directive.regex = params.opt_bool(&format!("bRegex_{n}"))?.unwrap_or(false);
        directives.push(directive);
    }
    Ok(directives)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotPart {
    Field,
    Kind,
    Value,
    Comparison,
}

#[derive(Debug, Default)]
struct Slot {
    field: Option<String>,
    kind: Option<String>,
    value: Option<String>,
    comparison: Option<String>,
}

/// Split `filter[<n>][...]` into the slot index and part.
fn parse_slot_key(key: &str) -> Option<(usize, SlotPart)> {
    let rest = key.strip_prefix("filter[")?;
    let (index, part) = rest.split_once(']')?;
    let index = index.parse::<usize>().ok()?;
    let part = match part {
        "[field]" => SlotPart::Field,
        "[data][type]" => SlotPart::Kind,
        "[data][value]" => SlotPart::Value,
        "[data][comparison]" => SlotPart::Comparison,
        _ => return None,
    };
    Some((index, part))
}

/// Collect ExtJS filter slots in one pass over the request keys.
///
/// Slots are contiguous from 0: the first slot without a `field` ends the
/// scan. Slots with an unknown type are skipped.
pub fn scan_filter_slots(params: &RequestParams, max_slots: usize) -> Vec<FilterDirective> {
    let mut slots: Vec<Slot> = (0..max_slots).map(|_| Slot::default()).collect();
    for (key, raw) in params.iter() {
        let Some((index, part)) = parse_slot_key(key) else {
            continue;
        };
        let Some(slot) = slots.get_mut(index) else {
            continue;
        };
        let raw = Some(raw.to_string());
        match part {
            SlotPart::Field => slot.field = raw,
            SlotPart::Kind => slot.kind = raw,
            SlotPart::Value => slot.value = raw,
            SlotPart::Comparison => slot.comparison = raw,
        }
    }

    let mut directives = Vec::new();
    for (index, slot) in slots.into_iter().enumerate() {
        let Some(field) = slot.field.filter(|f| !f.is_empty()) else {
            break;
        };
        let Some(kind) = slot.kind.as_deref().and_then(FilterKind::parse) else {
            debug!(index, field, kind = ?slot.kind, "skipping filter slot with unknown type");
            continue;
        };
        directives.push(FilterDirective {
            target: ColumnRef::Name(field),
            kind,
            comparison: slot.comparison,
            value: slot.value.unwrap_or_default(),
            regex: false,
        });
    }
    directives
}
