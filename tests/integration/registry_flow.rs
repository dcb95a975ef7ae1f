use cm::{ChangeAction, CmError, ModelOverrides, ProfileRegistry, ProfileUpdate, Store};

use super::common::{add_simple, temp_registry};

#[test]
fn added_model_can_be_looked_up_and_listed() {
    let (_dir, registry) = temp_registry();
    let added = registry
        .add_model(
            "work",
            "tok-123",
            "https://api.example.com",
            Some("desc"),
            ModelOverrides::default(),
        )
        .unwrap();

    let found = registry.get_model("work").unwrap().unwrap();
    assert_eq!(found.name, "work");
    assert_eq!(found.token, "tok-123");
    assert_eq!(found.base_url, "https://api.example.com");
    assert_eq!(found.description.as_deref(), Some("desc"));
    assert!(!found.id.is_empty());
    assert_eq!(found.id, added.id);
    assert_eq!(found.last_used, None);

    let listed = registry.list_models().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], found);
}

#[test]
fn listing_keeps_insertion_order() {
    let (_dir, registry) = temp_registry();
    for name in ["zeta", "alpha", "mid"] {
        add_simple(&registry, name);
    }
    let names: Vec<_> = registry
        .list_models()
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(names, ["zeta", "alpha", "mid"]);
}

#[test]
fn duplicate_add_is_a_conflict_and_changes_nothing() {
    let (_dir, registry) = temp_registry();
    let first = add_simple(&registry, "work");

    let err = registry
        .add_model(
            "work",
            "other-token",
            "https://other.example.com",
            None,
            ModelOverrides::default(),
        )
        .unwrap_err();
    assert!(matches!(err, CmError::Conflict { ref name } if name == "work"));

    let models = registry.list_models().unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0], first);
}

#[test]
fn removing_a_missing_model_leaves_the_store_alone() {
    let (_dir, registry) = temp_registry();
    add_simple(&registry, "work");
    registry.switch_model("work").unwrap();
    let before = registry.store().read_store().unwrap();

    let err = registry.remove_model("ghost").unwrap_err();
    assert!(matches!(err, CmError::NotFound { ref name } if name == "ghost"));
    assert_eq!(registry.store().read_store().unwrap(), before);
}

#[test]
fn removing_the_current_model_clears_the_selection() {
    let (_dir, registry) = temp_registry();
    add_simple(&registry, "work");
    registry.switch_model("work").unwrap();

    let removed = registry.remove_model("work").unwrap();
    assert_eq!(removed.name, "work");
    assert_eq!(registry.get_current_model().unwrap(), None);
    assert_eq!(registry.store().read_store().unwrap().current_model, None);
}

#[test]
fn switching_selects_and_stamps_last_used() {
    let (_dir, registry) = temp_registry();
    add_simple(&registry, "work");

    let switched = registry.switch_model("work").unwrap();
    assert!(switched.last_used.is_some());

    let data = registry.store().read_store().unwrap();
    assert_eq!(data.current_model.as_deref(), Some("work"));
    let current = registry.get_current_model().unwrap().unwrap();
    assert_eq!(current.name, "work");
    assert_eq!(current.last_used, switched.last_used);
}

#[test]
fn partial_update_only_touches_given_fields() {
    let (_dir, registry) = temp_registry();
    let original = registry
        .add_model(
            "work",
            "tok-123",
            "https://api.example.com",
            Some("desc"),
            ModelOverrides {
                opus: Some("opus-x".to_string()),
                sonnet: Some("sonnet-x".to_string()),
                haiku: None,
            },
        )
        .unwrap();

    let updated = registry
        .update_model(
            "work",
            ProfileUpdate {
                base_url: Some("https://proxy.example.com".to_string()),
                opus_model: Some(None),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.base_url, "https://proxy.example.com");
    assert_eq!(updated.opus_model, None);
    assert_eq!(updated.sonnet_model.as_deref(), Some("sonnet-x"));
    assert_eq!(updated.token, original.token);
    assert_eq!(updated.description, original.description);
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.created_at, original.created_at);
    assert!(updated.updated_at.is_some());
    assert_eq!(registry.get_model("work").unwrap().unwrap(), updated);
}

#[test]
fn renaming_the_current_model_moves_the_selection() {
    let (_dir, registry) = temp_registry();
    registry
        .add_model(
            "work",
            "tok-123",
            "https://api.example.com",
            Some("desc"),
            ModelOverrides::default(),
        )
        .unwrap();
    registry.switch_model("work").unwrap();

    registry
        .update_model(
            "work",
            ProfileUpdate {
                name: Some("work2".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(registry.get_current_model().unwrap().unwrap().name, "work2");
    assert_eq!(registry.get_model("work").unwrap(), None);
    assert!(registry.get_model("work2").unwrap().is_some());
}

#[test]
fn renaming_another_model_keeps_the_selection() {
    let (_dir, registry) = temp_registry();
    add_simple(&registry, "a");
    add_simple(&registry, "b");
    registry.switch_model("a").unwrap();

    registry
        .update_model(
            "b",
            ProfileUpdate {
                name: Some("c".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(registry.get_current_model().unwrap().unwrap().name, "a");
}

#[test]
fn add_switch_and_resolve_end_to_end() {
    let (_dir, registry) = temp_registry();
    registry
        .add_model(
            "work",
            "tok-123",
            "https://api.example.com",
            Some("desc"),
            ModelOverrides::default(),
        )
        .unwrap();
    registry.switch_model("work").unwrap();

    let current = registry.get_current_model().unwrap().unwrap();
    assert_eq!(current.name, "work");
    assert_eq!(current.token, "tok-123");
    assert!(current.last_used.is_some());
}

#[test]
fn every_mutation_records_one_change() {
    let (_dir, registry) = temp_registry();
    add_simple(&registry, "work");
    registry.switch_model("work").unwrap();
    registry
        .update_model(
            "work",
            ProfileUpdate {
                name: Some("work2".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    registry.remove_model("work2").unwrap();

    let log = registry.history().get_history().unwrap();
    let actions: Vec<_> = log.changes.iter().map(|c| c.action.clone()).collect();
    assert_eq!(
        actions,
        [
            ChangeAction::Remove,
            ChangeAction::Update,
            ChangeAction::Switch,
            ChangeAction::Add,
        ]
    );
    let details: Vec<_> = log.changes.iter().map(|c| c.details.as_str()).collect();
    assert_eq!(
        details,
        [
            "Removed model: work2",
            "Updated model: work",
            "Switched to model: work",
            "Added new model: work",
        ]
    );
    assert_eq!(log.changes[1].model_name, "work");
}

#[test]
fn failed_operations_record_nothing() {
    let (_dir, registry) = temp_registry();
    add_simple(&registry, "work");
    let _ = registry.add_model("work", "t", "u", None, ModelOverrides::default());
    let _ = registry.remove_model("ghost");
    let _ = registry.switch_model("ghost");
    let _ = registry.update_model("ghost", ProfileUpdate::default());

    assert_eq!(registry.history().get_history().unwrap().len(), 1);
}

#[test]
fn state_survives_a_new_registry_on_the_same_directory() {
    let (dir, registry) = temp_registry();
    add_simple(&registry, "work");
    registry.switch_model("work").unwrap();
    drop(registry);

    let reopened = ProfileRegistry::new(Store::at(dir.path()));
    assert_eq!(reopened.get_current_model().unwrap().unwrap().name, "work");
    assert_eq!(reopened.history().get_history().unwrap().len(), 2);
}

#[test]
fn reads_a_store_written_by_the_node_version() {
    let (dir, registry) = temp_registry();
    std::fs::write(
        dir.path().join("config.json"),
        r#"{
  "models": [
    {
      "id": "1735689600000",
      "name": "legacy",
      "token": "tok-legacy",
      "baseUrl": "https://api.anthropic.com",
      "description": "",
      "createdAt": "2025-01-01T00:00:00.000Z",
      "lastUsed": "2025-01-02T00:00:00.000Z",
      "defaultOpusModel": "claude-opus-4-5-20251101"
    }
  ],
  "currentModel": "legacy",
  "createdAt": "2025-01-01T00:00:00.000Z"
}"#,
    )
    .unwrap();

    let current = registry.get_current_model().unwrap().unwrap();
    assert_eq!(current.id, "1735689600000");
    assert_eq!(current.description, None);
    assert_eq!(current.opus_model.as_deref(), Some("claude-opus-4-5-20251101"));
    assert!(current.last_used.is_some());
}
