//! JSON fixture loading.
//!
//! A fixture file maps resource names to in-memory tables:
//!
//! ```json
//! {
//!   "resources": {
//!     "people.person": {
//!       "pk": "id",
//!       "fields": ["name", "age"],
//!       "records": [{"id": 1, "name": "Ana", "age": 30}]
//!     }
//!   }
//! }
//! ```
//!
//! `pk` defaults to `id`. When `fields` is empty the keys of the first
//! record are used.

use std::collections::BTreeMap;
use std::path::Path;

use gridwire_core::resource::memory::LABEL_KEY;
use gridwire_core::{MemoryRecord, MemoryTable, Registration, ResourceRegistry};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::GatewayError;

/// Top-level fixture document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureFile {
    #[serde(default)]
    pub resources: BTreeMap<String, FixtureResource>,
}

/// One resource in a fixture file.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureResource {
    #[serde(default = "default_pk")]
    pub pk: String,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub records: Vec<Map<String, Value>>,
}

fn default_pk() -> String {
    "id".to_string()
}

impl FixtureResource {
    /// Declared fields, or the first record's keys.
    pub fn field_list(&self) -> Vec<String> {
        if !self.fields.is_empty() {
            return self.fields.clone();
        }
        self.records
            .first()
            .map(|record| {
                record
                    .keys()
                    .filter(|key| key.as_str() != LABEL_KEY)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn table(&self) -> MemoryTable {
        self.records
            .iter()
            .map(|object| MemoryRecord::from_json(object, &self.pk))
            .collect()
    }
}

/// Parse a fixture document.
pub fn parse_fixtures(text: &str) -> Result<FixtureFile, GatewayError> {
    Ok(serde_json::from_str(text)?)
}

/// Read and parse a fixture file.
pub fn load_fixtures(path: &Path) -> Result<FixtureFile, GatewayError> {
    let text = std::fs::read_to_string(path).map_err(|source| GatewayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_fixtures(&text)
}

/// Build a registry from parsed fixtures.
pub fn build_registry(
    fixtures: &FixtureFile,
) -> Result<ResourceRegistry<MemoryTable>, GatewayError> {
    let mut registry = ResourceRegistry::new();
    for (name, resource) in &fixtures.resources {
        let fields = resource.field_list();
        if fields.is_empty() {
            return Err(GatewayError::Fixture(format!(
                "{name} declares no fields and has no records"
            )));
        }
        let registration = Registration::new(resource.table())
            .with_fields(fields)
            .with_pk_field(resource.pk.clone());
        registry.insert(name, registration)?;
        debug!(resource = %name, records = resource.records.len(), "registered fixture");
    }
    Ok(registry)
}
