//! Crash-between-steps behaviour, simulated with the in-memory backend
use regstore_core::{Error, Value, REGISTRY_STORAGE_ID};
use regstore_store::{MemoryBackend, PhysicalBackend, RegisteredStore, StoreConfig, UpdateStrategy};

fn store(strategy: UpdateStrategy) -> (RegisteredStore<MemoryBackend>, MemoryBackend) {
    let backend = MemoryBackend::new();
    let config = StoreConfig::builder()
        .with_root("/unused")
        .with_update_strategy(strategy)
        .build()
        .unwrap();
    (
        RegisteredStore::with_backend(backend.clone(), config).unwrap(),
        backend,
    )
}

#[test]
fn test_delete_then_create_loses_record_when_create_fails() {
    let (mut store, backend) = store(UpdateStrategy::DeleteThenCreate);
    assert!(store.create("doc", &Value::from("old")));

    // The delete step succeeds, the create step does not
    backend.fail_saves_for("doc");
    assert!(!store.update("doc", &Value::from("new")));

    // Neither the old nor the new value survives
    assert!(store.read("doc").is_false());
    assert!(store.get_registry_data("doc", "*").is_false());
    assert!(store.verify().unwrap().is_consistent());
}

#[test]
fn test_replace_keeps_old_value_when_save_fails() {
    let (mut store, backend) = store(UpdateStrategy::Replace);
    assert!(store.create("doc", &Value::from("old")));
    let entry = store.get_registry_data("doc", "*");

    backend.fail_saves_for("doc");
    assert!(!store.update("doc", &Value::from("new")));

    assert_eq!(store.read("doc"), Value::from("old"));
    assert_eq!(store.get_registry_data("doc", "*"), entry);
}

#[test]
fn test_failed_registry_persist_leaves_dangling_record_detectable() {
    let (mut store, backend) = store(UpdateStrategy::Replace);
    assert!(store.create("seed", &Value::Integer(0)));

    backend.fail_saves_for(REGISTRY_STORAGE_ID);
    assert!(!store.create("doc", &Value::Integer(1)));
    backend.clear_failures();

    // The record was written but never made it into the persisted registry
    assert_eq!(store.read("doc"), Value::Integer(1));
    assert!(store.get_registry_data("doc", "*").is_false());

    let report = store.verify().unwrap();
    assert_eq!(report.orphaned, [backend.safe_id("doc")]);

    // Re-running create repairs it
    assert!(store.create("doc", &Value::Integer(1)));
    assert!(store.verify().unwrap().is_consistent());
}

#[test]
fn test_failed_delete_keeps_entry() {
    let (mut store, backend) = store(UpdateStrategy::Replace);
    assert!(store.create("doc", &Value::Integer(1)));

    backend.fail_deletes_for("doc");
    let err = store.try_delete("doc").unwrap_err();
    assert!(matches!(err, Error::BackendIo { .. }));

    assert_eq!(store.read("doc"), Value::Integer(1));
    assert!(!store.get_registry_data("doc", "*").is_false());
}

#[test]
fn test_delete_then_create_needs_existing_record() {
    let (mut store, _backend) = store(UpdateStrategy::DeleteThenCreate);
    assert!(!store.update("missing", &Value::Integer(1)));
    assert!(store.read("missing").is_false());
}

#[test]
fn test_corrupt_record_reads_as_false() {
    let (mut store, backend) = store(UpdateStrategy::Replace);
    assert!(store.create("doc", &Value::Integer(1)));
    backend.put_raw("doc", b"{not a payload".to_vec());

    assert!(store.read("doc").is_false());
    assert!(matches!(
        store.try_read("doc").unwrap_err(),
        Error::Decode { .. }
    ));
}
