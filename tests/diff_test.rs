use oas_compat::diff::{self, Diff, DiffConfig};
use oas_compat::load;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn diff_of(base: &str, revision: &str) -> Diff {
    diff::get(
        &DiffConfig::new(),
        Arc::new(load::from_str(base).expect("Failed to load base")),
        Arc::new(load::from_str(revision).expect("Failed to load revision")),
    )
}

const PETSTORE: &str = r#"
paths:
  /pets:
    get:
      operationId: listPets
      responses:
        "200":
          description: pets
          content:
            application/json:
              schema:
                type: array
                items:
                  $ref: '#/components/schemas/Pet'
    post:
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Pet'
  /pets/{id}:
    delete:
      deprecated: true
components:
  schemas:
    Pet:
      type: object
      required: [name]
      properties:
        name:
          type: string
        kind:
          type: string
          enum: [cat, dog]
        owner:
          $ref: '#/components/schemas/Person'
    Person:
      type: object
      properties:
        pets:
          type: array
          items:
            $ref: '#/components/schemas/Pet'
"#;

#[test]
fn test_identical_documents_diff_to_empty() {
    let diff = diff_of(PETSTORE, PETSTORE);
    assert!(diff.is_empty());
    assert!(!diff.summary().diff);
}

#[test]
fn test_mutually_recursive_schemas_terminate() {
    let revision = PETSTORE.replace("enum: [cat, dog]", "enum: [cat, dog, bird]");
    let diff = diff_of(PETSTORE, &revision);

    let (_, _, method_diff) = diff
        .modified_operations()
        .find(|(_, method, _)| *method == "POST")
        .expect("POST /pets modified");
    let (_, media_type) = method_diff.request_media_types().next().unwrap();
    let properties = media_type
        .schema_diff
        .as_ref()
        .unwrap()
        .properties_diff
        .as_ref()
        .unwrap();
    let kind = properties.modified["kind"].enum_diff.as_ref().unwrap();
    assert!(!kind.enum_added);
    assert_eq!(kind.added, vec![serde_json::json!("bird")]);
    // Pet -> owner -> pets[] -> Pet is cut at the repeated pair.
    assert!(!properties.modified.contains_key("owner"));
}

#[test]
fn test_enum_added_asymmetry() {
    let unconstrained = PETSTORE.replace("          enum: [cat, dog]\n", "");
    let diff = diff_of(&unconstrained, PETSTORE);
    let (_, _, method_diff) = diff
        .modified_operations()
        .find(|(_, method, _)| *method == "POST")
        .unwrap();
    let (_, media_type) = method_diff.request_media_types().next().unwrap();
    let schema_diff = media_type.schema_diff.as_ref().unwrap();
    let kind = &schema_diff.properties_diff.as_ref().unwrap().modified["kind"];
    assert!(kind.enum_added());

    let extended_enum = PETSTORE.replace("enum: [cat, dog]", "enum: [cat, dog, fox]");
    let extended = diff_of(PETSTORE, &extended_enum);
    let (_, _, method_diff) = extended
        .modified_operations()
        .find(|(_, method, _)| *method == "POST")
        .unwrap();
    let (_, media_type) = method_diff.request_media_types().next().unwrap();
    let schema_diff = media_type.schema_diff.as_ref().unwrap();
    let kind = &schema_diff.properties_diff.as_ref().unwrap().modified["kind"];
    assert!(!kind.enum_added());
}

#[test]
fn test_summary_counts() {
    let revision = PETSTORE
        .replace(
            "  /pets/{id}:\n    delete:\n      deprecated: true\n",
            "  /owners:\n    get: {}\n",
        )
        .replace("operationId: listPets", "operationId: listAllPets");
    let summary = diff_of(PETSTORE, &revision).summary();
    assert!(summary.diff);
    let paths = summary.details["paths"];
    assert_eq!((paths.added, paths.deleted, paths.modified), (1, 1, 1));
    let endpoints = summary.details["endpoints"];
    assert_eq!((endpoints.added, endpoints.deleted, endpoints.modified), (1, 1, 1));
}

#[test]
fn test_diff_serializes_without_documents() {
    let revision = PETSTORE.replace("required: true", "required: false");
    let diff = diff_of(PETSTORE, &revision);
    let json = serde_json::to_value(&diff).unwrap();
    let required = &json["paths_diff"]["modified"]["/pets"]["operations_diff"]["modified"]["POST"]
        ["request_body_diff"]["required_diff"];
    assert_eq!(required["from"], true);
    assert_eq!(required["to"], false);
    assert!(json.get("base").is_none());
}

/// Every component references every component, itself included.
fn dense_graph(components: usize) -> String {
    let mut yaml = String::from(
        "paths:\n  /graph:\n    post:\n      requestBody:\n        content:\n          \
         application/json:\n            schema:\n              $ref: '#/components/schemas/C0'\n\
         components:\n  schemas:\n",
    );
    for i in 0..components {
        yaml.push_str(&format!("    C{i}:\n      type: object\n      description: c{i}\n"));
        yaml.push_str("      properties:\n");
        for j in 0..components {
            yaml.push_str(&format!("        p{j}:\n          $ref: '#/components/schemas/C{j}'\n"));
        }
    }
    yaml
}

#[test]
fn test_dense_reference_graph_completes_quickly() {
    let base = dense_graph(12);
    let revision = base.replace("description: c11\n", "description: changed\n");

    let started = Instant::now();
    assert!(diff_of(&base, &base).is_empty());
    let diff = diff_of(&base, &revision);
    let elapsed = started.elapsed();

    assert!(!diff.is_empty());
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
}

type Paths = BTreeMap<String, BTreeMap<&'static str, u8>>;

fn document(paths: &Paths) -> String {
    if paths.is_empty() {
        return "paths: {}\n".to_string();
    }
    let mut yaml = String::from("paths:\n");
    for (path, methods) in paths {
        if methods.is_empty() {
            yaml.push_str(&format!("  {path}: {{}}\n"));
            continue;
        }
        yaml.push_str(&format!("  {path}:\n"));
        for (method, summary) in methods {
            yaml.push_str(&format!("    {method}:\n      summary: v{summary}\n"));
        }
    }
    yaml
}

fn paths_strategy() -> impl Strategy<Value = Paths> {
    prop::collection::btree_map(
        "/[a-d]",
        prop::collection::btree_map(prop::sample::select(vec!["get", "put", "post"]), 0..2u8, 0..3),
        0..4,
    )
}

proptest! {
    #[test]
    fn prop_partitions_are_exclusive(base in paths_strategy(), revision in paths_strategy()) {
        let diff = diff_of(&document(&base), &document(&revision));
        let Some(paths_diff) = &diff.paths_diff else {
            prop_assert_eq!(&base, &revision);
            return Ok(());
        };

        for path in base.keys().chain(revision.keys()) {
            let in_added = paths_diff.added.contains(path);
            let in_deleted = paths_diff.deleted.contains(path);
            let in_modified = paths_diff.modified.contains_key(path);
            prop_assert!(u8::from(in_added) + u8::from(in_deleted) + u8::from(in_modified) <= 1);
            match (base.get(path), revision.get(path)) {
                (None, Some(_)) => prop_assert!(in_added),
                (Some(_), None) => prop_assert!(in_deleted),
                (Some(b), Some(r)) => prop_assert_eq!(in_modified, b != r),
                (None, None) => unreachable!(),
            }
        }

        for (path, path_diff) in &paths_diff.modified {
            let ops = path_diff.operations_diff.as_ref().unwrap();
            let (base_ops, revision_ops) = (&base[path], &revision[path]);
            for method in ["get", "put", "post"] {
                let upper = method.to_uppercase();
                let in_added = ops.added.contains(&upper);
                let in_deleted = ops.deleted.contains(&upper);
                let in_modified = ops.modified.contains_key(&upper);
                let hits = u8::from(in_added) + u8::from(in_deleted) + u8::from(in_modified);
                prop_assert!(hits <= 1);
                match (base_ops.get(method), revision_ops.get(method)) {
                    (None, None) => prop_assert!(!in_added && !in_deleted && !in_modified),
                    (None, Some(_)) => prop_assert!(in_added),
                    (Some(_), None) => prop_assert!(in_deleted),
                    (Some(b), Some(r)) => prop_assert_eq!(in_modified, b != r),
                }
            }
        }
    }

    #[test]
    fn prop_self_diff_is_empty(paths in paths_strategy()) {
        let yaml = document(&paths);
        prop_assert!(diff_of(&yaml, &yaml).is_empty());
    }
}
