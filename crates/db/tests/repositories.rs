//! Repository integration tests against a real PostgreSQL database.
//!
//! Require `DATABASE_URL`; run with `cargo test -p tagdeck-db -- --ignored`.

use sqlx::PgPool;
use tagdeck_db::models::data_source::{CreateDataSource, UpdateDataSource};
use tagdeck_db::models::group::{CreateGroup, UpdateGroup};
use tagdeck_db::models::tag::{CreateTag, UpdateTag};
use tagdeck_db::repositories::{DataSourceRepo, GroupRepo, TagRepo};
use tagdeck_db::StoreError;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_tag(name: &str, group: Option<&str>) -> CreateTag {
    CreateTag {
        name: name.to_string(),
        data_type: "Bool".to_string(),
        group_name: group.map(str::to_string),
        ..Default::default()
    }
}

fn new_group(name: &str) -> CreateGroup {
    CreateGroup {
        name: name.to_string(),
        expanded: None,
        parent_id: None,
        description: None,
    }
}

fn new_data_source(name: &str) -> CreateDataSource {
    CreateDataSource {
        name: name.to_string(),
        source_type: "Modbus".to_string(),
        endpoint: "192.168.1.100:502".to_string(),
        config: None,
    }
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn tag_create_applies_column_defaults(pool: PgPool) {
    let tag = TagRepo::create(&pool, &new_tag("Pump1", None)).await.unwrap();

    assert_eq!(tag.name, "Pump1");
    assert!(tag.active);
    assert!(!tag.retain);
    assert_eq!(tag.data_source, "Internal");
    assert_eq!(tag.update_interval, "1s");
    assert_eq!(tag.connection_status, "Disconnected");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn tag_list_is_byte_ordered(pool: PgPool) {
    for name in ["beta", "Alpha", "alpha2"] {
        TagRepo::create(&pool, &new_tag(name, None)).await.unwrap();
    }
    let names: Vec<String> = TagRepo::list(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["Alpha", "alpha2", "beta"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn tag_update_only_touches_present_fields(pool: PgPool) {
    let tag = TagRepo::create(&pool, &new_tag("Temp1", Some("Sensors")))
        .await
        .unwrap();

    let patch = UpdateTag {
        value: Some("21.5".to_string()),
        ..Default::default()
    };
    let updated = TagRepo::update(&pool, tag.id, &patch).await.unwrap().unwrap();

    assert_eq!(updated.value.as_deref(), Some("21.5"));
    assert_eq!(updated.group_name.as_deref(), Some("Sensors"));
    assert!(updated.updated_at >= tag.updated_at);

    assert!(TagRepo::update(&pool, 999_999, &patch).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn delete_many_is_all_or_nothing(pool: PgPool) {
    let a = TagRepo::create(&pool, &new_tag("A", None)).await.unwrap();
    let b = TagRepo::create(&pool, &new_tag("B", None)).await.unwrap();

    let deleted = TagRepo::delete_many(&pool, &[a.id, b.id, 999_999]).await.unwrap();
    assert!(!deleted);
    assert_eq!(TagRepo::list(&pool).await.unwrap().len(), 2);

    let deleted = TagRepo::delete_many(&pool, &[a.id, b.id, a.id]).await.unwrap();
    assert!(deleted);
    assert!(TagRepo::list(&pool).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn group_rename_does_not_cascade_until_reassigned(pool: PgPool) {
    let group = GroupRepo::create(&pool, &new_group("Motors")).await.unwrap();
    let tag = TagRepo::create(&pool, &new_tag("M1", Some("Motors")))
        .await
        .unwrap();

    let rename = UpdateGroup {
        name: Some("Drives".to_string()),
        ..Default::default()
    };
    GroupRepo::update(&pool, group.id, &rename).await.unwrap().unwrap();

    let stale = TagRepo::find_by_id(&pool, tag.id).await.unwrap().unwrap();
    assert_eq!(stale.group_name.as_deref(), Some("Motors"));

    let touched = TagRepo::reassign_group(&pool, "Motors", "Drives").await.unwrap();
    assert_eq!(touched, 1);
    let synced = TagRepo::find_by_id(&pool, tag.id).await.unwrap().unwrap();
    assert_eq!(synced.group_name.as_deref(), Some("Drives"));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn synced_rename_moves_tags_with_the_group(pool: PgPool) {
    let group = GroupRepo::create(&pool, &new_group("Motors")).await.unwrap();
    let tag = TagRepo::create(&pool, &new_tag("M1", Some("Motors")))
        .await
        .unwrap();

    let rename = UpdateGroup {
        name: Some("Drives".to_string()),
        ..Default::default()
    };
    let (renamed, moved) = GroupRepo::update_syncing_tags(&pool, group.id, &rename)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renamed.name, "Drives");
    assert_eq!(moved, 1);
    let synced = TagRepo::find_by_id(&pool, tag.id).await.unwrap().unwrap();
    assert_eq!(synced.group_name.as_deref(), Some("Drives"));

    assert!(GroupRepo::update_syncing_tags(&pool, 999_999, &rename)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn failed_synced_rename_leaves_tags_in_place(pool: PgPool) {
    let group = GroupRepo::create(&pool, &new_group("Motors")).await.unwrap();
    GroupRepo::create(&pool, &new_group("Drives")).await.unwrap();
    let tag = TagRepo::create(&pool, &new_tag("M1", Some("Motors")))
        .await
        .unwrap();

    let rename = UpdateGroup {
        name: Some("Drives".to_string()),
        ..Default::default()
    };
    let err = GroupRepo::update_syncing_tags(&pool, group.id, &rename)
        .await
        .unwrap_err();
    assert!(matches!(
        StoreError::from(err),
        StoreError::UniqueViolation { .. }
    ));

    let kept = TagRepo::find_by_id(&pool, tag.id).await.unwrap().unwrap();
    assert_eq!(kept.group_name.as_deref(), Some("Motors"));
    let group = GroupRepo::find_by_id(&pool, group.id).await.unwrap().unwrap();
    assert_eq!(group.name, "Motors");
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn deleting_parent_group_detaches_children(pool: PgPool) {
    let parent = GroupRepo::create(&pool, &new_group("Plant")).await.unwrap();
    let child = GroupRepo::create(
        &pool,
        &CreateGroup {
            parent_id: Some(parent.id),
            ..new_group("Line 1")
        },
    )
    .await
    .unwrap();

    assert!(GroupRepo::delete(&pool, parent.id).await.unwrap());
    let child = GroupRepo::find_by_id(&pool, child.id).await.unwrap().unwrap();
    assert_eq!(child.parent_id, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_group_name_is_unique_violation(pool: PgPool) {
    GroupRepo::create(&pool, &new_group("Motors")).await.unwrap();
    let err = GroupRepo::create(&pool, &new_group("Motors")).await.unwrap_err();

    match StoreError::from(err) {
        StoreError::UniqueViolation { constraint } => assert_eq!(constraint, "uq_groups_name"),
        other => panic!("expected unique violation, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Data sources
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn data_source_names_are_unique_case_insensitively(pool: PgPool) {
    DataSourceRepo::create(&pool, &new_data_source("sensor1"), "Disconnected")
        .await
        .unwrap();
    let err = DataSourceRepo::create(&pool, &new_data_source("Sensor1"), "Disconnected")
        .await
        .unwrap_err();

    match StoreError::from(err) {
        StoreError::UniqueViolation { constraint } => {
            assert_eq!(constraint, "uq_data_sources_name_lower")
        }
        other => panic!("expected unique violation, got {other:?}"),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn data_source_status_update_stamps_last_update(pool: PgPool) {
    let source = DataSourceRepo::create(&pool, &new_data_source("PLC"), "Disconnected")
        .await
        .unwrap();
    assert!(source.last_update.is_none());
    assert_eq!(source.config, serde_json::json!({}));

    let at = chrono::Utc::now();
    let updated = DataSourceRepo::update_status(&pool, source.id, "Connecting", at)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, "Connecting");
    assert!(updated.last_update.is_some());

    let patch = UpdateDataSource {
        endpoint: Some("192.168.1.101:502".to_string()),
        ..Default::default()
    };
    let patched = DataSourceRepo::update(&pool, source.id, &patch)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(patched.endpoint, "192.168.1.101:502");
    assert_eq!(patched.status, "Connecting");
}
