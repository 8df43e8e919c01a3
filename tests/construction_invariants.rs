//! Construction Invariant Tests
//!
//! Tests for the construction pipeline per PROTOCOL.md §3:
//! - Exactly three legal input forms: mapping, instance, null
//! - Every required attribute has a value after construction
//! - Unlisted policies: ignore, drop, reject
//! - Typed attributes always hold coerced values (§4)
//! - Construction is deterministic

use metaobject::{AttrType, ObjectError, Schema, UnlistedPolicy, Value};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn point_kind() -> Schema {
    Schema::builder("point")
        .required("x")
        .required("y")
        .typed("x", AttrType::Int)
        .typed("y", AttrType::Int)
        .build()
}

fn account_kind() -> Schema {
    Schema::builder("account")
        .required("id")
        .optional("owner", "nobody")
        .optional("balance", 0.0)
        .typed("id", AttrType::Int)
        .typed("balance", AttrType::Float)
        .typed("tags", AttrType::list(AttrType::Text))
        .build()
}

// =============================================================================
// Input Form Tests
// =============================================================================

/// A mapping constructs an instance with its values.
#[test]
fn test_construct_from_mapping() {
    let account = account_kind()
        .construct(json!({"id": 7, "owner": "ada"}))
        .unwrap();
    assert_eq!(account.get("id"), &Value::Int(7));
    assert_eq!(account.get("owner"), &Value::Text("ada".into()));
}

/// An existing instance copy-constructs, picking up post-construction edits.
#[test]
fn test_construct_from_instance_copies_current_state() {
    let kind = account_kind();
    let mut original = kind.construct(json!({"id": 7})).unwrap();
    original.set("owner", "ada");

    let copy = kind.construct(&original).unwrap();
    assert_eq!(copy.get("owner"), &Value::Text("ada".into()));
    assert_eq!(copy, original);
}

/// Null input constructs from optional defaults alone.
#[test]
fn test_construct_from_nothing_uses_defaults() {
    let kind = Schema::builder("settings")
        .optional("retries", 3i64)
        .optional("verbose", false)
        .build();
    let settings = kind.construct_default().unwrap();
    assert_eq!(settings.get("retries"), &Value::Int(3));
    assert_eq!(settings.get("verbose"), &Value::Bool(false));
}

/// A required name with a declared default is satisfied in default
/// construction; without one it fails.
#[test]
fn test_default_construction_respects_required() {
    let defaulted = Schema::builder("job")
        .required("queue")
        .optional("queue", "main")
        .build();
    assert_eq!(
        defaulted.construct_default().unwrap().get("queue"),
        &Value::Text("main".into())
    );

    let strict = Schema::builder("job").required("queue").build();
    let result = strict.construct_default();
    assert!(matches!(result, Err(ObjectError::MissingAttribute { .. })));
}

/// Scalar input is not a legal construction form.
#[test]
fn test_construct_rejects_scalar_input() {
    let err = point_kind().construct(Value::Int(3)).unwrap_err();
    match err {
        ObjectError::InvalidConstruction { got } => assert_eq!(got, "int"),
        other => panic!("unexpected error: {other}"),
    }
}

// =============================================================================
// Required Attribute Tests
// =============================================================================

/// The failure names the first missing required attribute.
#[test]
fn test_missing_required_is_named() {
    let err = point_kind().construct(json!({"x": 1})).unwrap_err();
    match err {
        ObjectError::MissingAttribute { attribute, .. } => assert_eq!(attribute, "y"),
        other => panic!("unexpected error: {other}"),
    }
}

/// Empty input fails for any kind with required attributes.
#[test]
fn test_empty_mapping_fails_required() {
    let result = point_kind().construct(json!({}));
    assert!(result.is_err());
}

/// Input values override optional defaults for the same name.
#[test]
fn test_input_overrides_default() {
    let account = account_kind()
        .construct(json!({"id": 1, "balance": "12.5"}))
        .unwrap();
    assert_eq!(account.get("balance"), &Value::Float(12.5));
}

// =============================================================================
// Unlisted Policy Tests
// =============================================================================

/// Ignore lets undeclared attributes through unchanged.
#[test]
fn test_ignore_policy_keeps_extras() {
    let account = account_kind()
        .construct(json!({"id": 1, "nickname": "primary"}))
        .unwrap();
    assert_eq!(account.get("nickname"), &Value::Text("primary".into()));
}

/// Drop silently removes undeclared attributes.
#[test]
fn test_drop_policy_removes_extras() {
    let kind = Schema::builder("account")
        .required("id")
        .unlisted(UnlistedPolicy::Drop)
        .build();
    let account = kind
        .construct(json!({"id": 1, "nickname": "primary"}))
        .unwrap();
    assert!(account.get("nickname").is_null());
    assert_eq!(account.attrs().len(), 1);
}

/// Reject fails construction, naming the undeclared attribute.
#[test]
fn test_reject_policy_fails_on_extras() {
    let kind = Schema::builder("account")
        .required("id")
        .unlisted(UnlistedPolicy::Reject)
        .build();
    let err = kind
        .construct(json!({"id": 1, "nickname": "primary"}))
        .unwrap_err();
    match err {
        ObjectError::UnlistedAttribute { attribute } => assert_eq!(attribute, "nickname"),
        other => panic!("unexpected error: {other}"),
    }
}

// =============================================================================
// Coercion Tests
// =============================================================================

/// Text digits coerce to native integers during construction.
#[test]
fn test_text_coerces_to_int() {
    let p = point_kind().construct(json!({"x": "3", "y": "4"})).unwrap();
    assert_eq!(p.get("x"), &Value::Int(3));
    assert_eq!(p.get("y"), &Value::Int(4));
}

/// Undigestible text fails construction with a coercion error.
#[test]
fn test_bad_text_fails_coercion() {
    let err = point_kind()
        .construct(json!({"x": "three", "y": 4}))
        .unwrap_err();
    assert!(matches!(err, ObjectError::Coercion { .. }));
    assert!(err.to_string().contains("'x'"));
}

/// List-typed attributes coerce every element individually.
#[test]
fn test_list_typed_coerces_elements() {
    let account = account_kind()
        .construct(json!({"id": 1, "tags": ["a", 2, 3.0]}))
        .unwrap();
    assert_eq!(
        account.get("tags"),
        &Value::List(vec![
            Value::Text("a".into()),
            Value::Text("2".into()),
            Value::Text("3".into()),
        ])
    );
}

/// An absent list-typed attribute materializes as an empty list.
#[test]
fn test_absent_list_typed_is_empty() {
    let account = account_kind().construct(json!({"id": 1})).unwrap();
    assert_eq!(account.get("tags"), &Value::List(vec![]));
}

/// Timestamp attributes accept RFC 3339 text.
#[test]
fn test_timestamp_from_text() {
    let kind = Schema::builder("event")
        .required("at")
        .typed("at", AttrType::Timestamp)
        .build();
    let event = kind
        .construct(json!({"at": "2024-05-01T12:30:00Z"}))
        .unwrap();
    assert!(event.get("at").as_timestamp().is_some());
}

// =============================================================================
// Nested Kind Tests
// =============================================================================

/// A nested entity type validates its subtree from one top-level call.
#[test]
fn test_nested_kind_validates_deeply() {
    let segment = Schema::builder("segment")
        .required("start")
        .required("end")
        .typed("start", AttrType::entity(point_kind()))
        .typed("end", AttrType::entity(point_kind()))
        .build();

    let ok = segment
        .construct(json!({
            "start": {"x": "0", "y": "0"},
            "end": {"x": "3", "y": "4"}
        }))
        .unwrap();
    let end = ok.get("end").as_instance().unwrap();
    assert_eq!(end.get("x"), &Value::Int(3));

    // a failure inside the nested kind surfaces as a coercion error
    let err = segment
        .construct(json!({
            "start": {"x": 0, "y": 0},
            "end": {"x": "three", "y": 4}
        }))
        .unwrap_err();
    assert!(matches!(err, ObjectError::Coercion { .. }));
}

/// Lists of nested kinds coerce each element through the nested pipeline.
#[test]
fn test_list_of_nested_kinds() {
    let path = Schema::builder("path")
        .required("points")
        .typed("points", AttrType::list(AttrType::entity(point_kind())))
        .build();
    let route = path
        .construct(json!({"points": [{"x": 1, "y": 2}, {"x": "3", "y": "4"}]}))
        .unwrap();
    let points = route.get("points").as_list().unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[1].as_instance().unwrap().get("x"), &Value::Int(3));
}

// =============================================================================
// Determinism Tests
// =============================================================================

/// The same input constructs the same instance every time.
#[test]
fn test_construction_is_deterministic() {
    let kind = account_kind();
    let input = json!({"id": 7, "tags": ["a", "b"], "note": "spare"});
    let first = kind.construct(input.clone()).unwrap();
    for _ in 0..100 {
        let next = kind.construct(input.clone()).unwrap();
        assert_eq!(first, next);
        assert!(first.equivalent(&next));
        let first_names: Vec<&str> = first.attrs().keys().map(String::as_str).collect();
        let next_names: Vec<&str> = next.attrs().keys().map(String::as_str).collect();
        assert_eq!(first_names, next_names);
    }
}

/// The same invalid input fails the same way every time.
#[test]
fn test_invalid_input_fails_consistently() {
    let kind = point_kind();
    for _ in 0..100 {
        let result = kind.construct(json!({"x": 1}));
        assert!(result.is_err());
    }
}
