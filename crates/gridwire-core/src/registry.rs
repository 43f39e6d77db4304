//! Resource registry.
//!
//! Resources are registered under `<namespace>.<entity>` names and looked
//! up per request. The registry is built once at startup and is read-only
//! afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use gridwire_proto::ColumnPath;

use crate::error::{Error, Result};
use crate::resource::Queryable;

/// A validated `<namespace>.<entity>` name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceName {
    namespace: String,
    entity: String,
}

impl ResourceName {
    /// Build a name from its parts.
    pub fn new(namespace: &str, entity: &str) -> Result<Self> {
        format!("{namespace}.{entity}").parse()
    }

    /// Part before the dot.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Part after the dot.
    pub fn entity(&self) -> &str {
        &self.entity
    }
}

impl FromStr for ResourceName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(namespace), Some(entity), None)
                if !namespace.is_empty() && !entity.is_empty() =>
            {
                Ok(Self {
                    namespace: namespace.to_string(),
                    entity: entity.to_string(),
                })
            }
            _ => Err(Error::InvalidResource(s.to_string())),
        }
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.entity)
    }
}

/// A registered resource and the fields it exposes to ExtJS grids.
#[derive(Debug, Clone)]
pub struct Registration<Q> {
    resource: Q,
    fields: Vec<ColumnPath>,
    pk_field: Option<String>,
}

impl<Q> Registration<Q> {
    /// Register `resource` without declared fields.
    pub fn new(resource: Q) -> Self {
        Self {
            resource,
            fields: Vec::new(),
            pk_field: None,
        }
    }

    /// Declare the exposed fields.
    pub fn with_fields<I, C>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnPath>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Name of the primary key field, appended to declared fields when
    /// missing.
    pub fn with_pk_field(mut self, pk_field: impl Into<String>) -> Self {
        self.pk_field = Some(pk_field.into());
        self
    }

    /// The backing resource.
    pub fn resource(&self) -> &Q {
        &self.resource
    }

    /// Exposed fields, including the primary key when fields are declared.
    pub fn fields(&self) -> Vec<ColumnPath> {
        self.with_pk(self.fields.clone())
    }

    fn with_pk(&self, mut fields: Vec<ColumnPath>) -> Vec<ColumnPath> {
        if let Some(pk) = &self.pk_field {
            if !fields.is_empty() && !fields.iter().any(|f| f.as_str() == pk) {
                fields.push(ColumnPath::new(pk.as_str()));
            }
        }
        fields
    }
}

impl<Q: Queryable> Registration<Q> {
    /// Columns served to ExtJS grids: the declared fields, or every field
    /// the resource reports when none are declared.
    pub fn columns(&self) -> Vec<ColumnPath> {
        if self.fields.is_empty() {
            self.with_pk(self.resource.default_fields())
        } else {
            self.fields()
        }
    }
}

/// Named resources.
#[derive(Debug, Clone)]
pub struct ResourceRegistry<Q> {
    entries: BTreeMap<ResourceName, Registration<Q>>,
}

impl<Q> Default for ResourceRegistry<Q> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<Q> ResourceRegistry<Q> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource, replacing any previous one under `name`.
    pub fn register(&mut self, name: &str, resource: Q) -> Result<()> {
        self.insert(name, Registration::new(resource))
    }

    /// Register a resource with the fields it exposes.
    pub fn register_with_fields<I, C>(&mut self, name: &str, resource: Q, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnPath>,
    {
        self.insert(name, Registration::new(resource).with_fields(fields))
    }

    /// Register a prepared registration.
    pub fn insert(&mut self, name: &str, registration: Registration<Q>) -> Result<()> {
        let name: ResourceName = name.parse()?;
        self.entries.insert(name, registration);
        Ok(())
    }

    /// Look up `<namespace>.<entity>`.
    pub fn resolve(&self, name: &str) -> Result<&Registration<Q>> {
        let parsed: ResourceName = name.parse()?;
        self.entries
            .get(&parsed)
            .ok_or_else(|| Error::ResourceNotFound(name.to_string()))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &ResourceName> {
        self.entries.keys()
    }

    /// Number of registered resources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
