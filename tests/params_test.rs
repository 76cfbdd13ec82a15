use playdocs_rs::params::{
    History, NavigationCommand, NavigationError, Navigator, ParamStore, ParamValue, QueryParams,
    STORAGE_KEY, UpdateOptions,
};
use playdocs_rs::storage::{KeyValueStore, MemoryStorage};

fn stored_params(storage: &MemoryStorage) -> Option<QueryParams> {
    storage
        .read(STORAGE_KEY)
        .unwrap()
        .map(|json| serde_json::from_str(&json).unwrap())
}

fn mounted(location: &str) -> (ParamStore<MemoryStorage>, MemoryStorage) {
    let storage = MemoryStorage::new();
    let mut store = ParamStore::new(storage.clone());
    store.mount(location);
    (store, storage)
}

#[test]
fn test_operations_before_mount_are_noops() {
    let storage = MemoryStorage::new();
    let mut store = ParamStore::new(storage.clone());

    assert!(!store.is_synchronized());
    assert_eq!(store.get("a"), None);

    store.update([("a", "1")], UpdateOptions::default());
    store.remove(&["a"]);
    store.clear();
    store.before_unload();

    assert_eq!(store.pending().count(), 0);
    assert_eq!(storage.read(STORAGE_KEY).unwrap(), None);
}

#[test]
fn test_mount_reads_repeated_keys() {
    let (store, _) = mounted("/docs/page?tag=a&tag=b&gameengine=unity");

    assert!(store.is_synchronized());
    assert_eq!(store.pathname(), Some("/docs/page"));
    assert_eq!(
        store.get("tag"),
        Some(&ParamValue::Multi(vec!["a".to_string(), "b".to_string()]))
    );
    assert_eq!(store.get("gameengine").and_then(ParamValue::as_single), Some("unity"));
}

#[test]
fn test_mount_prefers_url_over_snapshot() {
    let mut storage = MemoryStorage::new();
    storage
        .write(STORAGE_KEY, r#"{"gameengine":"unity","theme":"dark"}"#)
        .unwrap();

    let mut store = ParamStore::new(storage.clone());
    store.mount("/docs/page?gameengine=phaser");

    assert_eq!(store.get("gameengine"), Some(&ParamValue::from("phaser")));
    assert_eq!(store.get("theme"), Some(&ParamValue::from("dark")));

    // The merged state is what gets stored
    let stored = stored_params(&storage).unwrap();
    assert_eq!(stored.get("gameengine"), Some(&ParamValue::from("phaser")));
    assert_eq!(stored.get("theme"), Some(&ParamValue::from("dark")));
}

#[test]
fn test_mount_with_corrupt_snapshot() {
    let mut storage = MemoryStorage::new();
    storage.write(STORAGE_KEY, "{not json").unwrap();

    let mut store = ParamStore::new(storage.clone());
    store.mount("/docs/page?a=1");

    assert_eq!(store.params().map(QueryParams::len), Some(1));
    assert_eq!(store.pending().count(), 0);
}

#[test]
fn test_successive_updates_merge() {
    let (mut store, storage) = mounted("/docs/page");

    store.update([("a", "1")], UpdateOptions::default());
    store.update([("b", "2")], UpdateOptions::default());

    let expected: QueryParams = [("a", "1"), ("b", "2")].into_iter().collect();
    assert_eq!(store.params(), Some(&expected));
    assert_eq!(stored_params(&storage), Some(expected));

    let commands = store.take_pending();
    assert_eq!(
        commands,
        vec![
            NavigationCommand::push("/docs/page?a=1"),
            NavigationCommand::push("/docs/page?a=1&b=2"),
        ]
    );
}

#[test]
fn test_update_without_preserving_others() {
    let (mut store, _) = mounted("/docs/page?a=1&b=2");

    store.update([("c", "3")], UpdateOptions::replace().exclusive());

    let expected: QueryParams = [("c", "3")].into_iter().collect();
    assert_eq!(store.params(), Some(&expected));
    assert_eq!(
        store.take_pending(),
        vec![NavigationCommand::replace("/docs/page?c=3")]
    );
}

#[test]
fn test_update_with_empty_value_deletes_key() {
    let (mut store, _) = mounted("/docs/page?gameengine=unity&a=1");

    store.update([("gameengine", ParamValue::Absent)], UpdateOptions::replace());
    assert_eq!(store.get("gameengine"), None);

    store.update([("a", "")], UpdateOptions::replace());
    assert_eq!(store.get("a"), None);

    let commands = store.take_pending();
    assert_eq!(commands.last(), Some(&NavigationCommand::replace("/docs/page")));
}

#[test]
fn test_update_serializes_sequences() {
    let (mut store, _) = mounted("/docs/page");

    store.update(
        [("tag", ParamValue::Multi(vec!["x".to_string(), "y z".to_string()]))],
        UpdateOptions::default(),
    );

    assert_eq!(
        store.take_pending(),
        vec![NavigationCommand::push("/docs/page?tag=x&tag=y+z")]
    );
}

#[test]
fn test_remove_uses_replace() {
    let (mut store, _) = mounted("/docs/page?a=1&b=2");

    store.remove(&["a"]);

    assert_eq!(store.get("a"), None);
    assert_eq!(store.get("b"), Some(&ParamValue::from("2")));
    assert_eq!(
        store.take_pending(),
        vec![NavigationCommand::replace("/docs/page?b=2")]
    );
}

#[test]
fn test_clear_empties_state_and_snapshot() {
    let (mut store, storage) = mounted("/docs/page?a=1");
    store.update([("b", "2")], UpdateOptions::default());
    store.take_pending();

    store.clear();

    assert_eq!(store.params(), Some(&QueryParams::new()));
    assert_eq!(storage.read(STORAGE_KEY).unwrap(), None);
    assert_eq!(
        store.take_pending(),
        vec![NavigationCommand::replace("/docs/page")]
    );
}

#[test]
fn test_get_does_not_navigate_or_persist() {
    let (store, storage) = mounted("/docs/page?a=1");
    let before = storage.read(STORAGE_KEY).unwrap();

    assert_eq!(store.get("a"), Some(&ParamValue::from("1")));
    assert_eq!(store.get("missing"), None);

    assert_eq!(store.pending().count(), 0);
    assert_eq!(storage.read(STORAGE_KEY).unwrap(), before);
}

#[test]
fn test_stored_selection_is_restored_with_replace() {
    let mut storage = MemoryStorage::new();
    storage.write(STORAGE_KEY, r#"{"gameengine":"unity"}"#).unwrap();

    let mut history = History::new("/docs/quick-start");
    let mut store = ParamStore::new(storage);
    store.mount(history.current());
    store.flush(&mut history);

    assert_eq!(history.current(), "/docs/quick-start?gameengine=unity");
    assert_eq!(history.len(), 1);
    assert_eq!(
        history.applied(),
        &[NavigationCommand::replace("/docs/quick-start?gameengine=unity")]
    );
}

#[test]
fn test_navigation_keeps_explicit_url_values() {
    let (mut store, _) = mounted("/docs/a");
    store.update([("gameengine", "unity")], UpdateOptions::replace());
    store.take_pending();

    // Following a link that names another engine keeps it
    store.on_navigate("/docs/b?gameengine=phaser");
    assert_eq!(store.pending().count(), 0);
    assert_eq!(store.get("gameengine"), Some(&ParamValue::from("phaser")));
    assert_eq!(store.pathname(), Some("/docs/b"));
}

#[test]
fn test_navigation_restores_only_missing_keys() {
    let (mut store, _) = mounted("/docs/a");
    store.update([("gameengine", "unity"), ("theme", "dark")], UpdateOptions::default());
    store.take_pending();

    store.on_navigate("/docs/b?theme=light&x=1");

    assert_eq!(
        store.take_pending(),
        vec![NavigationCommand::replace("/docs/b?theme=light&x=1&gameengine=unity")]
    );
    assert_eq!(store.get("theme"), Some(&ParamValue::from("light")));
    assert_eq!(store.get("gameengine"), Some(&ParamValue::from("unity")));
}

#[test]
fn test_back_navigation_is_reconciled() {
    let storage = MemoryStorage::new();
    let mut history = History::new("/docs/a");
    let mut store = ParamStore::new(storage);
    store.mount(history.current());

    store.update([("gameengine", "unity")], UpdateOptions::default());
    store.flush(&mut history);
    assert_eq!(history.current(), "/docs/a?gameengine=unity");

    let previous = history.back().unwrap().to_string();
    assert_eq!(previous, "/docs/a");
    store.on_navigate(&previous);
    store.flush(&mut history);

    // The stored selection comes back without adding a history entry
    assert_eq!(history.current(), "/docs/a?gameengine=unity");
    assert_eq!(history.len(), 2);
    assert_eq!(history.applied().last().map(|c| c.replace), Some(true));
}

#[test]
fn test_first_navigation_mounts() {
    let storage = MemoryStorage::new();
    let mut store = ParamStore::new(storage);

    store.on_navigate("/docs/a?x=1");
    assert!(store.is_synchronized());
    assert_eq!(store.get("x"), Some(&ParamValue::from("1")));
}

#[test]
fn test_storage_failures_stay_in_memory() {
    let mut store = ParamStore::new(MemoryStorage::failing());
    store.mount("/docs/page?a=1");

    store.update([("b", "2")], UpdateOptions::default());
    store.clear();
    store.update([("c", "3")], UpdateOptions::default());
    store.before_unload();

    let expected: QueryParams = [("c", "3")].into_iter().collect();
    assert_eq!(store.params(), Some(&expected));
}

/// Rejects every navigation
struct Offline;

impl Navigator for Offline {
    fn navigate(&mut self, command: &NavigationCommand) -> Result<(), NavigationError> {
        Err(NavigationError::Rejected {
            url: command.url.clone(),
            reason: "offline".to_string(),
        })
    }
}

#[test]
fn test_navigation_failures_are_dropped() {
    let (mut store, _) = mounted("/docs/page");
    store.update([("a", "1")], UpdateOptions::default());

    assert_eq!(store.flush(&mut Offline), 0);
    assert_eq!(store.pending().count(), 0);
    assert_eq!(store.get("a"), Some(&ParamValue::from("1")));
}

#[test]
fn test_before_unload_writes_current_state() {
    let (mut store, mut storage) = mounted("/docs/page?a=1");
    // Something else wiped the snapshot after the last update
    storage.erase(STORAGE_KEY).unwrap();

    store.before_unload();

    let expected: QueryParams = [("a", "1")].into_iter().collect();
    assert_eq!(stored_params(&storage), Some(expected));
}

#[test]
fn test_history_push_truncates_forward_entries() {
    let mut history = History::new("/a");
    history.navigate(&NavigationCommand::push("/b")).unwrap();
    history.navigate(&NavigationCommand::push("/c")).unwrap();
    history.back();
    history.navigate(&NavigationCommand::push("/d")).unwrap();

    assert_eq!(history.current(), "/d");
    assert_eq!(history.len(), 3);
    assert_eq!(history.forward(), None);
    assert!(history.navigate(&NavigationCommand::push("https://elsewhere")).is_err());
}

#[test]
fn test_empty_url_value_shadows_snapshot() {
    let mut storage = MemoryStorage::new();
    storage
        .write(STORAGE_KEY, r#"{"gameengine":"unity","theme":"dark"}"#)
        .unwrap();

    let mut store = ParamStore::new(storage.clone());
    store.mount("/docs/page?gameengine=&theme=dark");

    assert_eq!(store.get("gameengine"), None);
    assert_eq!(store.pending().count(), 0);

    let stored = stored_params(&storage).unwrap();
    assert!(!stored.contains_key("gameengine"));
    assert!(stored.contains_key("theme"));
}

#[test]
fn test_navigating_to_empty_value_clears_snapshot_key() {
    let (mut store, storage) = mounted("/docs/page?gameengine=unity");

    store.on_navigate("/docs/other?gameengine=");

    assert_eq!(store.get("gameengine"), None);
    assert_eq!(store.pending().count(), 0);
    assert!(!stored_params(&storage).unwrap().contains_key("gameengine"));
}
