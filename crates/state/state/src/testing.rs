use std::time::Duration;

use fedgate_core::{AuthType, AuthValue, EntityStatus, Gateway, GatewayId, GatewayPatch, ToolDescriptor};

use crate::error::StateError;
use crate::lock::DistributedLock;
use crate::repository::GatewayRepository;

fn test_gateway(name: &str) -> Gateway {
    let now = chrono::Utc::now();
    Gateway {
        id: GatewayId::new(),
        name: name.to_string(),
        url: format!("https://{name}.example.test"),
        description: String::new(),
        capabilities: serde_json::Map::new(),
        auth_type: AuthType::None,
        auth_value: AuthValue::empty(),
        status: EntityStatus::active(),
        last_seen: None,
        created_at: now,
        updated_at: now,
    }
}

/// Run the full gateway repository conformance test suite.
///
/// Call this from your backend's test module with a fresh repository
/// instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_repository_conformance_tests(repo: &dyn GatewayRepository) -> Result<(), StateError> {
    test_insert_and_get(repo).await?;
    test_insert_rejects_duplicate_name(repo).await?;
    test_update_patches_fields(repo).await?;
    test_toggle_enabled(repo).await?;
    test_delete_cascades_tools(repo).await?;
    Ok(())
}

async fn test_insert_and_get(repo: &dyn GatewayRepository) -> Result<(), StateError> {
    let gw = test_gateway("repo-insert-get");
    let tools = vec![ToolDescriptor {
        name: "echo".into(),
        description: String::new(),
        integration_type: fedgate_core::IntegrationType::Mcp,
        request_type: "POST".into(),
        headers: Default::default(),
        input_schema: serde_json::json!({}),
        jsonpath_filter: None,
    }];
    let stored = repo.insert_gateway(gw.clone(), tools).await?;
    assert_eq!(stored.name, gw.name);

    let fetched = repo.get_gateway(stored.id).await?;
    assert!(fetched.is_some(), "inserted gateway should be retrievable");

    let tools = repo.list_tools(stored.id).await?;
    assert_eq!(tools.len(), 1, "inserted tool should be attached");
    Ok(())
}

async fn test_insert_rejects_duplicate_name(repo: &dyn GatewayRepository) -> Result<(), StateError> {
    let gw = test_gateway("repo-dup-name");
    repo.insert_gateway(gw.clone(), vec![]).await?;

    let dup = test_gateway("repo-dup-name");
    let result = repo.insert_gateway(dup, vec![]).await;
    assert!(
        matches!(result, Err(StateError::NameConflict(_))),
        "duplicate name should be rejected"
    );
    Ok(())
}

async fn test_update_patches_fields(repo: &dyn GatewayRepository) -> Result<(), StateError> {
    let gw = test_gateway("repo-update");
    let stored = repo.insert_gateway(gw, vec![]).await?;

    let patch = GatewayPatch {
        description: Some("patched".into()),
        ..GatewayPatch::default()
    };
    let updated = repo.update_gateway(stored.id, patch).await?;
    assert_eq!(updated.description, "patched");
    assert_eq!(updated.name, stored.name, "unset fields stay unchanged");
    Ok(())
}

async fn test_toggle_enabled(repo: &dyn GatewayRepository) -> Result<(), StateError> {
    let gw = test_gateway("repo-toggle");
    let stored = repo.insert_gateway(gw, vec![]).await?;
    assert!(stored.status.enabled);

    let disabled = repo.set_gateway_enabled(stored.id, false).await?;
    assert!(!disabled.status.enabled);
    Ok(())
}

async fn test_delete_cascades_tools(repo: &dyn GatewayRepository) -> Result<(), StateError> {
    let gw = test_gateway("repo-delete");
    let tools = vec![ToolDescriptor {
        name: "only-tool".into(),
        description: String::new(),
        integration_type: fedgate_core::IntegrationType::Mcp,
        request_type: "POST".into(),
        headers: Default::default(),
        input_schema: serde_json::json!({}),
        jsonpath_filter: None,
    }];
    let stored = repo.insert_gateway(gw, tools).await?;

    repo.delete_gateway(stored.id).await?;
    assert!(repo.get_gateway(stored.id).await?.is_none());
    assert!(
        repo.list_tools(stored.id).await?.is_empty(),
        "tools should be cascade-deleted with their gateway"
    );
    Ok(())
}

/// Run the full distributed lock conformance test suite.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_lock_conformance_tests(lock: &dyn DistributedLock) -> Result<(), StateError> {
    test_try_acquire_and_release(lock).await?;
    test_try_acquire_contention(lock).await?;
    test_lock_extend(lock).await?;
    test_lock_is_held(lock).await?;
    Ok(())
}

async fn test_try_acquire_and_release(lock: &dyn DistributedLock) -> Result<(), StateError> {
    let guard = lock
        .try_acquire("test-lock-1", Duration::from_secs(10))
        .await?;
    assert!(guard.is_some(), "should acquire uncontested lock");
    let guard = guard.unwrap();
    guard.release().await?;
    Ok(())
}

async fn test_try_acquire_contention(lock: &dyn DistributedLock) -> Result<(), StateError> {
    let guard = lock
        .try_acquire("test-lock-2", Duration::from_secs(10))
        .await?;
    assert!(guard.is_some());
    let held = guard.unwrap();

    let second = lock
        .try_acquire("test-lock-2", Duration::from_secs(10))
        .await?;
    assert!(
        second.is_none(),
        "second acquire should fail while lock is held"
    );

    held.release().await?;
    Ok(())
}

async fn test_lock_extend(lock: &dyn DistributedLock) -> Result<(), StateError> {
    let guard = lock
        .try_acquire("test-lock-3", Duration::from_secs(5))
        .await?
        .expect("should acquire lock");

    guard.extend(Duration::from_secs(10)).await?;

    let held = guard.is_held().await?;
    assert!(held, "lock should still be held after extend");

    guard.release().await?;
    Ok(())
}

async fn test_lock_is_held(lock: &dyn DistributedLock) -> Result<(), StateError> {
    let guard = lock
        .try_acquire("test-lock-4", Duration::from_secs(10))
        .await?
        .expect("should acquire lock");

    assert!(guard.is_held().await?, "lock should be held");
    guard.release().await?;
    Ok(())
}
