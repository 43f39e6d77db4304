//! Sort directive resolution.

use gridwire_proto::{ColumnPath, ColumnRef, OrderField, SortDirective};

use crate::error::{Error, Result};

/// Resolves sort directives to order fields.
pub struct SortResolver<'a> {
    columns: &'a [ColumnPath],
    separator: &'a str,
}

impl<'a> SortResolver<'a> {
    /// Resolver over the declared columns, rewriting paths with `separator`.
    pub fn new(columns: &'a [ColumnPath], separator: &'a str) -> Self {
        Self { columns, separator }
    }

    /// Resolve directives in order. Column paths are rewritten to the
    /// resource's lookup separator.
    pub fn resolve(&self, directives: &[SortDirective]) -> Result<Vec<OrderField>> {
        directives
            .iter()
            .map(|directive| {
                let field = match &directive.column {
                    ColumnRef::Index(index) => self
                        .columns
                        .get(*index)
                        .ok_or(Error::InvalidSortColumn {
                            index: *index,
                            columns: self.columns.len(),
                        })?
                        .to_lookup(self.separator),
                    ColumnRef::Name(name) => {
                        ColumnPath::new(name.as_str()).to_lookup(self.separator)
                    }
                };
                Ok(OrderField {
                    field,
                    direction: directive.direction,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridwire_proto::SortDirection;

    #[test]
    fn test_resolve_index_and_nested() {
        let columns = vec![ColumnPath::new("name"), ColumnPath::new("author.name")];
        let resolver = SortResolver::new(&columns, "__");
        let fields = resolver
            .resolve(&[SortDirective::desc(1), SortDirective::asc(0)])
            .unwrap();
        assert_eq!(
            fields,
            vec![OrderField::desc("author__name"), OrderField::asc("name")]
        );
        let rendered: Vec<String> = fields.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["-author__name", "name"]);
    }

    #[test]
    fn test_resolve_named_field() {
        let resolver = SortResolver::new(&[], "__");
        let fields = resolver
            .resolve(&[SortDirective::field("publisher.city", SortDirection::Desc)])
            .unwrap();
        assert_eq!(fields, vec![OrderField::desc("publisher__city")]);
    }

    #[test]
    fn test_out_of_range() {
        let columns = vec![ColumnPath::new("name")];
        let resolver = SortResolver::new(&columns, "__");
        assert!(matches!(
            resolver.resolve(&[SortDirective::asc(5)]),
            Err(Error::InvalidSortColumn { index: 5, columns: 1 })
        ));
    }
}
