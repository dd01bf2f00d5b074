use polistore::adapter::SqliteAdapter;
use polistore::context::{CancelToken, OpContext};
use polistore::error::AdapterError;
use polistore::model::{MemoryModel, PolicyModel};
use polistore::rule::PolicyLine;

fn setup() -> SqliteAdapter {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    SqliteAdapter::open_in_memory("policy_rule").expect("adapter")
}

fn rule(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn load(adapter: &SqliteAdapter) -> MemoryModel {
    let mut model = MemoryModel::new();
    adapter.load_policy(&mut model).expect("load");
    model
}

#[test]
fn add_then_load_reproduces_the_rule() {
    let adapter = setup();
    adapter.add_policy("p", &rule(&["alice", "data1", "read"])).unwrap();
    let model = load(&adapter);
    assert_eq!(model.len(), 1);
    assert!(model.contains("p", &["alice", "data1", "read"]));
}

#[test]
fn add_duplicate_reports_already_exists() {
    let adapter = setup();
    let r = rule(&["alice", "data1", "read"]);
    adapter.add_policy("p", &r).unwrap();
    let err = adapter.add_policy("p", &r).unwrap_err();
    assert!(matches!(err, AdapterError::AlreadyExists(_)));
    assert_eq!(load(&adapter).len(), 1);
}

#[test]
fn empty_string_fields_collapse_into_absence() {
    let adapter = setup();
    adapter.add_policy("p", &rule(&["alice", "data1", ""])).unwrap();
    let model = load(&adapter);
    // The empty third field does not survive the round trip.
    assert!(model.contains("p", &["alice", "data1"]));
    assert!(!model.contains("p", &["alice", "data1", ""]));
}

#[test]
fn duplicate_under_null_suffix_is_rejected() {
    let adapter = setup();
    adapter.add_policy("p", &rule(&["alice", "data1"])).unwrap();
    // Same tuple once the empty field collapses to NULL.
    let err = adapter
        .add_policy("p", &rule(&["alice", "data1", ""]))
        .unwrap_err();
    assert!(matches!(err, AdapterError::AlreadyExists(_)));
}

#[test]
fn remove_deletes_exactly_one_rule() {
    let adapter = setup();
    adapter.add_policy("p", &rule(&["alice", "data1", "read"])).unwrap();
    adapter.add_policy("p", &rule(&["bob", "data2", "write"])).unwrap();
    adapter.remove_policy("p", &rule(&["alice", "data1", "read"])).unwrap();
    let model = load(&adapter);
    assert_eq!(model.len(), 1);
    assert!(model.contains("p", &["bob", "data2", "write"]));
}

#[test]
fn remove_missing_rule_reports_not_found() {
    let adapter = setup();
    adapter.add_policy("p", &rule(&["alice", "data1", "read"])).unwrap();
    let err = adapter
        .remove_policy("p", &rule(&["bob", "data2", "write"]))
        .unwrap_err();
    assert!(matches!(err, AdapterError::NotFound(_)));
    assert_eq!(load(&adapter).len(), 1);
}

#[test]
fn remove_matches_absent_fields_positionally() {
    let adapter = setup();
    adapter.add_policy("p", &rule(&["alice", "data1"])).unwrap();
    adapter.add_policy("p", &rule(&["alice", "data1", "read"])).unwrap();
    // Only the two-field rule has v2 NULL, so only it may match.
    adapter.remove_policy("p", &rule(&["alice", "data1"])).unwrap();
    let model = load(&adapter);
    assert_eq!(model.len(), 1);
    assert!(model.contains("p", &["alice", "data1", "read"]));
}

#[test]
fn remove_filtered_by_subject() {
    let adapter = setup();
    adapter.add_policy("p", &rule(&["alice", "data1", "read"])).unwrap();
    adapter.add_policy("p", &rule(&["bob", "data2", "write"])).unwrap();
    adapter
        .remove_filtered_policy("p", 0, &rule(&["alice"]))
        .unwrap();
    let model = load(&adapter);
    assert_eq!(model.len(), 1);
    assert!(model.contains("p", &["bob", "data2", "write"]));
}

#[test]
fn remove_filtered_rejects_invalid_field_index() {
    let adapter = setup();
    let err = adapter
        .remove_filtered_policy("p", 6, &rule(&["alice"]))
        .unwrap_err();
    assert!(matches!(err, AdapterError::InvalidArgument(_)));
}

#[test]
fn remove_filtered_without_matches_reports_not_found() {
    let adapter = setup();
    adapter.add_policy("p", &rule(&["alice", "data1", "read"])).unwrap();
    let err = adapter
        .remove_filtered_policy("p", 0, &rule(&["charlie"]))
        .unwrap_err();
    assert!(matches!(err, AdapterError::NotFound(_)));
}

#[test]
fn save_replaces_the_whole_policy_set() {
    let adapter = setup();
    adapter.add_policy("p", &rule(&["alice", "data1", "read"])).unwrap();
    adapter.add_policy("p", &rule(&["bob", "data2", "write"])).unwrap();

    let mut model = MemoryModel::new();
    model.add_line(PolicyLine::new("p", rule(&["carol", "data3", "read"])));
    model.add_line(PolicyLine::new("g", rule(&["carol", "admin"])));
    adapter.save_policy(&model).unwrap();

    let stored = load(&adapter);
    assert_eq!(stored.len(), 2);
    assert!(stored.contains("p", &["carol", "data3", "read"]));
    assert!(stored.contains("g", &["carol", "admin"]));
}

#[test]
fn save_with_empty_model_clears_the_table() {
    let adapter = setup();
    adapter.add_policy("p", &rule(&["alice", "data1", "read"])).unwrap();
    adapter.save_policy(&MemoryModel::new()).unwrap();
    assert!(load(&adapter).is_empty());
}

#[test]
fn failed_save_rolls_back_the_clear() {
    let adapter = setup();
    adapter.add_policy("p", &rule(&["alice", "data1", "read"])).unwrap();

    // Two identical lines violate uniqueness, failing the bulk insert.
    let mut model = MemoryModel::new();
    model.add_line(PolicyLine::new("p", rule(&["dup", "data", "read"])));
    model.add_line(PolicyLine::new("p", rule(&["dup", "data", "read"])));
    let err = adapter.save_policy(&model).unwrap_err();
    assert!(matches!(err, AdapterError::AlreadyExists(_)));

    // The original rows survived the aborted replace.
    let stored = load(&adapter);
    assert_eq!(stored.len(), 1);
    assert!(stored.contains("p", &["alice", "data1", "read"]));
}

#[test]
fn load_preserves_insertion_order() {
    let adapter = setup();
    adapter.add_policy("p", &rule(&["carol", "data3", "read"])).unwrap();
    adapter.add_policy("p", &rule(&["alice", "data1", "read"])).unwrap();
    adapter.add_policy("p", &rule(&["bob", "data2", "write"])).unwrap();
    let model = load(&adapter);
    let subjects: Vec<String> = model
        .policies("p")
        .into_iter()
        .map(|values| values[0].clone())
        .collect();
    assert_eq!(subjects, vec!["carol", "alice", "bob"]);
}

#[test]
fn empty_ptype_is_rejected() {
    let adapter = setup();
    let err = adapter.add_policy("", &rule(&["alice"])).unwrap_err();
    assert!(matches!(err, AdapterError::InvalidArgument(_)));
}

#[test]
fn cancelled_context_stops_the_operation() {
    let adapter = setup();
    let token = CancelToken::new();
    token.cancel();
    let ctx = OpContext::with_cancel(token);
    let err = adapter
        .add_policy_ctx(&ctx, "p", &rule(&["alice", "data1", "read"]))
        .unwrap_err();
    assert!(matches!(err, AdapterError::Cancelled(_)));
    assert!(load(&adapter).is_empty());
}
