//! Integration tests for the SQLite stores against a temporary database file.

use tara_core::{NewInteraction, ProfileStore, ProfileUpdate, ResolutionStatus, RuleStore};
use tara_store::{SqliteProfileStore, SqliteRuleStore};
use tempfile::TempDir;

fn interaction(destination: &str, status: ResolutionStatus) -> NewInteraction {
    NewInteraction {
        request_type: "travel_check".into(),
        origin: "IN".into(),
        destination: destination.into(),
        purpose: "Work".into(),
        status,
        advisory_payload: r#"{"forms":[]}"#.into(),
    }
}

async fn profile_store(dir: &TempDir) -> SqliteProfileStore {
    SqliteProfileStore::new(dir.path().join("tara.db")).await.unwrap()
}

// =============================================================================
// Profiles
// =============================================================================

#[tokio::test]
async fn test_get_missing_profile_is_none() {
    let dir = TempDir::new().unwrap();
    let store = profile_store(&dir).await;

    assert!(store.get("nobody").await.unwrap().is_none());
    assert!(store.get("   ").await.unwrap().is_none());
}

#[tokio::test]
async fn test_upsert_creates_then_updates_partially() {
    let dir = TempDir::new().unwrap();
    let store = profile_store(&dir).await;

    store
        .upsert(
            "u1",
            ProfileUpdate {
                email: Some("u1@example.com".into()),
                display_name: Some("Asha".into()),
                passport_number: Some("Z1234567".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let created = store.get("u1").await.unwrap().unwrap();
    assert_eq!(created.email.as_deref(), Some("u1@example.com"));
    assert!(created.citizenship_code.is_none());

    store
        .upsert(
            "u1",
            ProfileUpdate {
                citizenship: Some("India".into()),
                citizenship_code: Some("IN".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let updated = store.get("u1").await.unwrap().unwrap();
    assert_eq!(updated.citizenship_code(), Some("IN"));
    assert_eq!(updated.email.as_deref(), Some("u1@example.com"));
    assert_eq!(updated.display_name.as_deref(), Some("Asha"));
    assert_eq!(updated.passport_number.as_deref(), Some("Z1234567"));
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
async fn test_explicit_update_overwrites_citizenship() {
    let dir = TempDir::new().unwrap();
    let store = profile_store(&dir).await;

    store
        .upsert("u2", ProfileUpdate { citizenship_code: Some("FR".into()), ..Default::default() })
        .await
        .unwrap();
    store
        .upsert("u2", ProfileUpdate { citizenship_code: Some("DE".into()), ..Default::default() })
        .await
        .unwrap();

    let profile = store.get("u2").await.unwrap().unwrap();
    assert_eq!(profile.citizenship_code(), Some("DE"));
}

#[tokio::test]
async fn test_blank_key_rejected() {
    let dir = TempDir::new().unwrap();
    let store = profile_store(&dir).await;

    let err = store.upsert(" ", ProfileUpdate::default()).await.unwrap_err();
    assert!(err.to_string().starts_with("INPUT/"));
}

#[tokio::test]
async fn test_store_reopens_existing_database() {
    let dir = TempDir::new().unwrap();
    {
        let store = profile_store(&dir).await;
        store
            .upsert("u3", ProfileUpdate { citizenship_code: Some("KE".into()), ..Default::default() })
            .await
            .unwrap();
    }

    let reopened = profile_store(&dir).await;
    let profile = reopened.get("u3").await.unwrap().unwrap();
    assert_eq!(profile.citizenship_code(), Some("KE"));
}

// =============================================================================
// Interaction history
// =============================================================================

#[tokio::test]
async fn test_recent_interactions_newest_first_and_limited() {
    let dir = TempDir::new().unwrap();
    let store = profile_store(&dir).await;

    store.append_interaction("u1", interaction("FR", ResolutionStatus::Complete)).await.unwrap();
    store.append_interaction("u1", interaction("DE", ResolutionStatus::Incomplete)).await.unwrap();
    store.append_interaction("u1", interaction("JP", ResolutionStatus::Error)).await.unwrap();
    store.append_interaction("u9", interaction("US", ResolutionStatus::Complete)).await.unwrap();

    let recent = store.recent_interactions("u1", 2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].destination, "JP");
    assert_eq!(recent[0].status, "ERROR");
    assert_eq!(recent[1].destination, "DE");
    assert!(recent.iter().all(|r| r.user_id == "u1"));

    assert!(store.recent_interactions("u1", 0).await.unwrap().is_empty());
}

// =============================================================================
// Rules
// =============================================================================

#[tokio::test]
async fn test_rule_lookup_hits_and_misses() {
    let dir = TempDir::new().unwrap();
    let rules = SqliteRuleStore::new(dir.path().join("rules.db"));

    let written = rules
        .insert_rules(vec![
            ("IN".into(), "FR".into(), "visa required".into()),
            ("FR".into(), "DE".into(), "visa free".into()),
        ])
        .await
        .unwrap();
    assert_eq!(written, 2);

    assert_eq!(rules.lookup("IN", "FR").await, "visa required");
    assert_eq!(rules.lookup("FR", "DE").await, "visa free");
    assert_eq!(rules.lookup("XX", "YY").await, "unknown");
}

#[tokio::test]
async fn test_rule_lookup_without_database_is_unknown() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.db");
    let rules = SqliteRuleStore::new(&path);

    assert_eq!(rules.lookup("IN", "FR").await, "unknown");
    assert!(!path.exists(), "lookup must not create the database");
}

#[tokio::test]
async fn test_rule_lookup_without_table_is_unknown() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("profiles-only.db");
    SqliteProfileStore::new(&path).await.unwrap();

    let rules = SqliteRuleStore::new(&path);
    assert_eq!(rules.lookup("IN", "FR").await, "unknown");
}
