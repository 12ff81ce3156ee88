//! Recursive schema comparison with cycle protection.

use crate::contract::SchemaId;
use crate::diff::engine::{DiffState, partition};
use crate::diff::model::{
    SchemaDiff, SchemasDiff, SubschemasDiff, enum_diff, strings_diff, value_diff,
};
use indexmap::IndexMap;
use tracing::trace;

impl DiffState<'_> {
    /// Compares optional schema slots, such as a media type's schema.
    pub(super) fn schema_refs_diff(
        &mut self,
        base: Option<SchemaId>,
        revision: Option<SchemaId>,
    ) -> Option<SchemaDiff> {
        match (base, revision) {
            (None, None) => None,
            (None, Some(revision)) => Some(SchemaDiff {
                revision: Some(revision),
                schema_added: true,
                ..Default::default()
            }),
            (Some(base), None) => Some(SchemaDiff {
                base: Some(base),
                schema_deleted: true,
                ..Default::default()
            }),
            (Some(base), Some(revision)) => self.schema_diff(base, revision),
        }
    }

    /// Compares two schemas. A pair already open on the current descent path
    /// compares as equal: a recursive schema repeats its own shape, so the
    /// first encounter has already reported every difference. Finished pairs
    /// are memoized, so each pair is compared at most once per run.
    pub(super) fn schema_diff(&mut self, base: SchemaId, revision: SchemaId) -> Option<SchemaDiff> {
        let pair = (base, revision);
        if let Some(done) = self.finished.get(&pair) {
            return done.clone();
        }
        if !self.visited.insert(pair) {
            trace!(base = base.0, revision = revision.0, "schema cycle cut");
            return None;
        }
        let diff = self.compare_schemas(base, revision);
        self.visited.remove(&pair);
        self.finished.insert(pair, diff.clone());
        diff
    }

    fn compare_schemas(&mut self, base_id: SchemaId, revision_id: SchemaId) -> Option<SchemaDiff> {
        let (base_doc, revision_doc) = (self.base, self.revision);
        let base = base_doc.schema(base_id);
        let revision = revision_doc.schema(revision_id);

        let mut diff = SchemaDiff {
            base: Some(base_id),
            revision: Some(revision_id),
            type_diff: value_diff(&base.type_name, &revision.type_name),
            format_diff: value_diff(&base.format, &revision.format),
            nullable_diff: value_diff(&base.nullable, &revision.nullable),
            deprecated_diff: value_diff(&base.deprecated, &revision.deprecated),
            read_only_diff: value_diff(&base.read_only, &revision.read_only),
            write_only_diff: value_diff(&base.write_only, &revision.write_only),
            enum_diff: enum_diff(&base.enum_values, &revision.enum_values),
            required_diff: strings_diff(&base.required, &revision.required),
            extensions_diff: self.extensions_diff(&base.extensions, &revision.extensions),
            ..Default::default()
        };
        if !self.config.exclude_description {
            diff.description_diff = value_diff(&base.description, &revision.description);
        }
        diff.properties_diff = self.properties_diff(&base.properties, &revision.properties);
        diff.items_diff = self.schema_refs_diff(base.items, revision.items).map(Box::new);
        diff.all_of_diff = self.subschemas_diff(&base.all_of, &revision.all_of);
        diff.one_of_diff = self.subschemas_diff(&base.one_of, &revision.one_of);
        diff.any_of_diff = self.subschemas_diff(&base.any_of, &revision.any_of);

        (!diff.is_empty()).then_some(diff)
    }

    fn properties_diff(
        &mut self,
        base: &IndexMap<String, SchemaId>,
        revision: &IndexMap<String, SchemaId>,
    ) -> Option<SchemasDiff> {
        let (added, deleted, common) = partition(base, revision);
        let mut diff = SchemasDiff {
            added,
            deleted,
            ..Default::default()
        };
        for name in common {
            if let Some(property_diff) = self.schema_diff(base[name], revision[name]) {
                diff.modified.insert(name.to_string(), property_diff);
            }
        }
        (!diff.is_empty()).then_some(diff)
    }

    /// Composition branches are matched by position.
    fn subschemas_diff(
        &mut self,
        base: &[SchemaId],
        revision: &[SchemaId],
    ) -> Option<SubschemasDiff> {
        let shared = base.len().min(revision.len());
        let mut diff = SubschemasDiff {
            added: (shared..revision.len()).collect(),
            deleted: (shared..base.len()).collect(),
            ..Default::default()
        };
        for (index, (base, revision)) in base.iter().zip(revision).enumerate() {
            if let Some(branch_diff) = self.schema_diff(*base, *revision) {
                diff.modified.insert(index, branch_diff);
            }
        }
        (!diff.is_empty()).then_some(diff)
    }
}

#[cfg(test)]
mod tests {
    use crate::diff::{DiffConfig, get};
    use crate::load;
    use std::sync::Arc;

    const NODE: &str = r#"
paths:
  /tree:
    post:
      requestBody:
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Node'
components:
  schemas:
    Node:
      type: object
      properties:
        name:
          type: string
        children:
          type: array
          items:
            $ref: '#/components/schemas/Node'
"#;

    #[test]
    fn test_recursive_schema_diffs_to_empty() {
        let base = Arc::new(load::from_str(NODE).unwrap());
        let revision = Arc::new(load::from_str(NODE).unwrap());
        let diff = get(&DiffConfig::new(), base, revision);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_recursive_schema_reports_change_once() {
        let base = Arc::new(load::from_str(NODE).unwrap());
        let changed = NODE.replace(
            "        name:\n          type: string\n",
            "        name:\n          type: string\n          enum: [a, b]\n",
        );
        let revision = Arc::new(load::from_str(&changed).unwrap());

        let diff = get(&DiffConfig::new(), base, revision);

        let (_, _, method_diff) = diff.modified_operations().next().unwrap();
        let (_, media_type) = method_diff.request_media_types().next().unwrap();
        let schema_diff = media_type.schema_diff.as_ref().unwrap();
        let properties = schema_diff.properties_diff.as_ref().unwrap();
        assert!(properties.modified["name"].enum_added());
        // `children` recurses into the pair already being compared.
        assert!(!properties.modified.contains_key("children"));
    }

    #[test]
    fn test_shared_schema_reported_at_every_use() {
        let base = r#"
paths:
  /a:
    post:
      requestBody:
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Pet'
  /b:
    put:
      requestBody:
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Pet'
components:
  schemas:
    Pet:
      type: object
      properties:
        kind:
          type: string
"#;
        let revision = base.replace("          type: string\n", "          type: integer\n");
        let diff = get(
            &DiffConfig::new(),
            Arc::new(load::from_str(base).unwrap()),
            Arc::new(load::from_str(&revision).unwrap()),
        );

        let mut sites = 0;
        for (_, _, method_diff) in diff.modified_operations() {
            let (_, media_type) = method_diff.request_media_types().next().unwrap();
            let properties = media_type.schema_diff.as_ref().unwrap().properties_diff.as_ref();
            assert!(properties.unwrap().modified["kind"].type_diff.is_some());
            sites += 1;
        }
        assert_eq!(sites, 2);
    }

    #[test]
    fn test_composition_branches_by_position() {
        let base = r#"
components:
  schemas:
    Pet:
      oneOf:
        - type: string
        - type: integer
paths:
  /pets:
    post:
      requestBody:
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Pet'
"#;
        let revision = base.replace("- type: integer", "- type: number\n        - type: boolean");
        let diff = get(
            &DiffConfig::new(),
            Arc::new(load::from_str(base).unwrap()),
            Arc::new(load::from_str(&revision).unwrap()),
        );

        let (_, _, method_diff) = diff.modified_operations().next().unwrap();
        let (_, media_type) = method_diff.request_media_types().next().unwrap();
        let one_of = media_type
            .schema_diff
            .as_ref()
            .unwrap()
            .one_of_diff
            .as_ref()
            .unwrap();
        assert_eq!(one_of.added, vec![2]);
        assert!(one_of.deleted.is_empty());
        assert_eq!(one_of.modified.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_schema_added_to_media_type() {
        let base = r#"
paths:
  /a:
    post:
      requestBody:
        content:
          text/plain: {}
"#;
        let revision = base.replace(
            "text/plain: {}",
            "text/plain:\n            schema:\n              type: string",
        );
        let diff = get(
            &DiffConfig::new(),
            Arc::new(load::from_str(base).unwrap()),
            Arc::new(load::from_str(&revision).unwrap()),
        );
        let (_, _, method_diff) = diff.modified_operations().next().unwrap();
        let (_, media_type) = method_diff.request_media_types().next().unwrap();
        assert!(media_type.schema_diff.as_ref().unwrap().schema_added);
    }
}
