use oas_compat::generate_fingerprint;
use oas_compat::spec::Spec;

#[test]
fn test_fingerprint_stability() {
    let content = r#"
openapi: 3.0.3
paths:
  /users:
    get:
      summary: List users
"#;
    let first = generate_fingerprint(content).unwrap();
    let second = generate_fingerprint(content).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 64);
}

#[test]
fn test_fingerprint_insensitive_to_key_order_and_comments() {
    let a = r#"
openapi: 3.0.3
info: {title: users, version: "1"}
paths:
  /users:
    get:
      summary: List users
      operationId: listUsers
"#;
    let b = r#"
# reordered
paths:
  /users:
    get:
      operationId: listUsers   # same id
      summary: List users
info:
  version: "1"
  title: users
openapi: 3.0.3
"#;
    assert_eq!(generate_fingerprint(a).unwrap(), generate_fingerprint(b).unwrap());
}

#[test]
fn test_spec_fingerprint_matches_function() {
    let content = "paths:\n  /a:\n    get: {}\n";
    let spec = Spec::try_from(content).unwrap();
    assert_eq!(spec.fingerprint, generate_fingerprint(content).unwrap());
}

#[test]
fn test_invalid_yaml_rejected() {
    assert!(generate_fingerprint("paths: [unclosed").is_err());
}
