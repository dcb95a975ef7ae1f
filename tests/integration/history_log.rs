use cm::{ChangeAction, ProfileUpdate, StoredAction, history::MAX_HISTORY_ENTRIES};

use super::common::{add_simple, temp_registry};

#[test]
fn history_is_capped_at_one_hundred_newest_first() {
    let (_dir, registry) = temp_registry();
    add_simple(&registry, "m");
    for i in 0..100 {
        registry
            .update_model(
                "m",
                ProfileUpdate {
                    description: Some(format!("rev {i}")),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    let log = registry.history().get_history().unwrap();
    assert_eq!(log.len(), MAX_HISTORY_ENTRIES);
    assert!(log.changes.iter().all(|c| c.action == ChangeAction::Update));
    assert!(log.changes.windows(2).all(|w| w[0].id > w[1].id));
}

#[test]
fn new_log_is_empty() {
    let (_dir, registry) = temp_registry();
    let log = registry.history().get_history().unwrap();
    assert!(log.is_empty());
}

#[test]
fn actions_written_by_other_versions_survive_new_records() {
    let (dir, registry) = temp_registry();
    std::fs::write(
        dir.path().join("history.json"),
        r#"{"changes":[{"id":1,"timestamp":"2024-01-01T00:00:00.000Z","action":"import","modelName":"m","details":"Imported m"}]}"#,
    )
    .unwrap();

    add_simple(&registry, "work");

    let log = registry.history().get_history().unwrap();
    assert_eq!(log.changes[0].action, ChangeAction::Add);
    assert_eq!(log.changes[1].action, StoredAction::Unknown("import".to_string()));
    let raw = std::fs::read_to_string(dir.path().join("history.json")).unwrap();
    assert!(raw.contains(r#""action": "import""#), "{raw}");
}

#[test]
fn new_changes_land_ahead_of_an_existing_log() {
    let (dir, registry) = temp_registry();
    std::fs::write(
        dir.path().join("history.json"),
        r#"{"changes":[{"id":4102444800000,"timestamp":"2100-01-01T00:00:00.000Z","action":"add","modelName":"old","details":"Added new model: old"}]}"#,
    )
    .unwrap();

    add_simple(&registry, "new");
    let log = registry.history().get_history().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log.changes[0].model_name, "new");
    assert!(log.changes[0].id > log.changes[1].id);
    assert_eq!(log.changes[1].action, ChangeAction::Add);
}
