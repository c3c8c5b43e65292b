//! Integration tests for the virtual machine extension handler.
//!
//! This test suite covers the full reconciliation lifecycle against an
//! in-memory fake of the management API:
//! - Create followed by Read round-trips every non-write-only attribute
//! - Write-only protected settings are never read back
//! - Conflict detection against pre-existing remote objects
//! - Validation failures happen before any remote call
//! - Read of an independently removed object clears local state
//! - Delete followed by Read leaves the resource absent
//! - Cancellation aborts long-running waits

mod common;

use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use armature::client::models::{VirtualMachineExtension, VirtualMachineExtensionProperties};
use armature::error::Error;
use armature::resources::{ProviderContext, ResourceRegistry};
use armature::state::{AttributeMap, ResourceState};

use common::FakeArm;

const TYPE_NAME: &str = "azure_virtual_machine_extension";

// ============================================================================
// Helper Functions
// ============================================================================

fn vm_id(resource_group: &str, vm_name: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Compute/virtualMachines/{}",
        common::SUBSCRIPTION_ID,
        resource_group,
        vm_name
    )
}

fn extension_attrs() -> AttributeMap {
    let pairs = [
        ("name", json!("ext1")),
        ("virtual_machine_id", json!(vm_id("my-rg", "vm1"))),
        ("location", json!("West US 2")),
        ("publisher", json!("Microsoft.Azure.Extensions")),
        ("type", json!("CustomScript")),
        ("type_handler_version", json!("2.0")),
        ("auto_upgrade_minor_version", json!(true)),
        ("settings", json!(r#"{"commandToExecute": "echo hello"}"#)),
        ("protected_settings", json!(r#"{"secret": "hunter2"}"#)),
        ("tags", json!({"environment": "production"})),
    ];
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn context(arm: &Arc<FakeArm>) -> ProviderContext {
    ProviderContext::new(arm.client())
}

// ============================================================================
// Create / Read round-trip
// ============================================================================

#[tokio::test]
async fn test_create_then_read_round_trips_attributes() {
    common::init_tracing();
    let arm = FakeArm::new();
    let registry = ResourceRegistry::with_builtins();
    let ctx = context(&arm);

    let mut state = ResourceState::from_attributes(extension_attrs());
    registry.create(TYPE_NAME, &mut state, &ctx).await.unwrap();

    assert_eq!(
        state.id(),
        Some(FakeArm::extension_id("my-rg", "vm1", "ext1").as_str())
    );
    assert_eq!(state.get_string("name").unwrap().as_deref(), Some("ext1"));
    assert_eq!(
        state.get_string("location").unwrap().as_deref(),
        Some("westus2"),
        "region names are normalized on read-back"
    );
    assert_eq!(
        state.get_string("virtual_machine_id").unwrap().as_deref(),
        Some(vm_id("my-rg", "vm1").as_str())
    );
    assert_eq!(
        state.get("virtual_machine_name"),
        None,
        "the deprecated name-based reference stays unset for id-based configs"
    );
    assert_eq!(
        state.get_string("resource_group_name").unwrap().as_deref(),
        Some("my-rg")
    );
    assert_eq!(
        state.get_string("publisher").unwrap().as_deref(),
        Some("Microsoft.Azure.Extensions")
    );
    assert_eq!(state.get_string("type").unwrap().as_deref(), Some("CustomScript"));
    assert_eq!(
        state.get_string("type_handler_version").unwrap().as_deref(),
        Some("2.0")
    );
    assert_eq!(state.get_bool("auto_upgrade_minor_version").unwrap(), Some(true));

    let settings: serde_json::Value =
        serde_json::from_str(&state.get_string("settings").unwrap().unwrap()).unwrap();
    assert_eq!(settings, json!({"commandToExecute": "echo hello"}));

    assert_eq!(
        state.get("tags").unwrap(),
        &json!({"environment": "production"})
    );
}

#[tokio::test]
async fn test_legacy_name_reference_round_trips() {
    let arm = FakeArm::new();
    let registry = ResourceRegistry::with_builtins();
    let ctx = context(&arm);

    let mut attrs = extension_attrs();
    attrs.remove("virtual_machine_id");
    attrs.insert("virtual_machine_name".to_string(), json!("vm1"));
    attrs.insert("resource_group_name".to_string(), json!("my-rg"));

    let mut state = ResourceState::from_attributes(attrs);
    registry.create(TYPE_NAME, &mut state, &ctx).await.unwrap();

    assert_eq!(
        state.get_string("virtual_machine_name").unwrap().as_deref(),
        Some("vm1")
    );
    assert_eq!(
        state.get_string("resource_group_name").unwrap().as_deref(),
        Some("my-rg")
    );
    assert_eq!(
        state.get("virtual_machine_id"),
        None,
        "the id-based reference stays unset for name-based configs"
    );
}

#[tokio::test]
async fn test_protected_settings_are_write_only() {
    let arm = FakeArm::new();
    let registry = ResourceRegistry::with_builtins();
    let ctx = context(&arm);

    let mut state = ResourceState::from_attributes(extension_attrs());
    registry.create(TYPE_NAME, &mut state, &ctx).await.unwrap();

    // read-back leaves the configured value untouched instead of diffing
    // against a value the service never returns
    assert_eq!(
        state.get_string("protected_settings").unwrap().as_deref(),
        Some(r#"{"secret": "hunter2"}"#)
    );
}

#[tokio::test]
async fn test_update_replaces_settings() {
    let arm = FakeArm::new();
    let registry = ResourceRegistry::with_builtins();
    let ctx = context(&arm);

    let mut state = ResourceState::from_attributes(extension_attrs());
    registry.create(TYPE_NAME, &mut state, &ctx).await.unwrap();

    state.set("settings", r#"{"commandToExecute": "echo updated"}"#);
    registry.update(TYPE_NAME, &mut state, &ctx).await.unwrap();

    let settings: serde_json::Value =
        serde_json::from_str(&state.get_string("settings").unwrap().unwrap()).unwrap();
    assert_eq!(settings, json!({"commandToExecute": "echo updated"}));
}

// ============================================================================
// Conflict handling
// ============================================================================

#[tokio::test]
async fn test_create_with_import_required_fails_on_existing_object() {
    let arm = FakeArm::new();
    arm.seed_extension(
        "my-rg",
        "vm1",
        "ext1",
        VirtualMachineExtension {
            location: Some("westus2".into()),
            properties: Some(VirtualMachineExtensionProperties {
                publisher: Some("Microsoft.Azure.Extensions".into()),
                type_: Some("CustomScript".into()),
                type_handler_version: Some("2.0".into()),
                ..Default::default()
            }),
            ..Default::default()
        },
    );

    let registry = ResourceRegistry::with_builtins();
    let ctx = context(&arm).with_require_import(true);

    let mut state = ResourceState::from_attributes(extension_attrs());
    let err = registry
        .create(TYPE_NAME, &mut state, &ctx)
        .await
        .unwrap_err();

    match err {
        Error::AlreadyExists { id, .. } => {
            assert_eq!(id, FakeArm::extension_id("my-rg", "vm1", "ext1"));
        }
        other => panic!("expected AlreadyExists, got: {other}"),
    }
    assert!(state.is_new(), "no identifier may be persisted on conflict");
}

#[tokio::test]
async fn test_create_with_adoption_allowed_succeeds_over_existing_object() {
    let arm = FakeArm::new();
    arm.seed_extension("my-rg", "vm1", "ext1", VirtualMachineExtension::default());

    let registry = ResourceRegistry::with_builtins();
    let ctx = context(&arm);

    let mut state = ResourceState::from_attributes(extension_attrs());
    registry.create(TYPE_NAME, &mut state, &ctx).await.unwrap();
    assert!(!state.is_new());
}

// ============================================================================
// Validation before remote calls
// ============================================================================

#[tokio::test]
async fn test_conflicting_parent_references_fail_before_any_remote_call() {
    let arm = FakeArm::new();
    let registry = ResourceRegistry::with_builtins();
    let ctx = context(&arm);

    let mut attrs = extension_attrs();
    attrs.insert("virtual_machine_name".to_string(), json!("vm1"));
    let mut state = ResourceState::from_attributes(attrs);

    let err = registry
        .create(TYPE_NAME, &mut state, &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ConflictingAttributes { .. }));
    assert_eq!(arm.calls(), 0, "validation must precede remote calls");
}

#[tokio::test]
async fn test_missing_required_attribute_fails_before_any_remote_call() {
    let arm = FakeArm::new();
    let registry = ResourceRegistry::with_builtins();
    let ctx = context(&arm);

    let mut attrs = extension_attrs();
    attrs.remove("publisher");
    let mut state = ResourceState::from_attributes(attrs);

    let err = registry
        .create(TYPE_NAME, &mut state, &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingAttribute(name) if name == "publisher"));
    assert_eq!(arm.calls(), 0);
}

#[tokio::test]
async fn test_malformed_settings_fail_before_submission() {
    let arm = FakeArm::new();
    let registry = ResourceRegistry::with_builtins();
    let ctx = context(&arm);

    let mut attrs = extension_attrs();
    attrs.insert("settings".to_string(), json!("{not json"));
    let mut state = ResourceState::from_attributes(attrs);

    let err = registry
        .create(TYPE_NAME, &mut state, &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::JsonAttribute { attribute, .. } if attribute == "settings"));
    assert_eq!(arm.calls(), 0);
}

// ============================================================================
// Reconciliation of vanished objects
// ============================================================================

#[tokio::test]
async fn test_read_of_vanished_extension_clears_state_without_error() {
    let arm = FakeArm::new();
    let registry = ResourceRegistry::with_builtins();
    let ctx = context(&arm);

    let mut state = ResourceState::from_attributes(extension_attrs());
    registry.create(TYPE_NAME, &mut state, &ctx).await.unwrap();

    arm.remove_extension("my-rg", "vm1", "ext1");
    registry.read(TYPE_NAME, &mut state, &ctx).await.unwrap();

    assert!(state.is_new(), "vanished remote object clears the identifier");
}

#[tokio::test]
async fn test_delete_then_read_leaves_resource_absent() {
    let arm = FakeArm::new();
    let registry = ResourceRegistry::with_builtins();
    let ctx = context(&arm);

    let mut state = ResourceState::from_attributes(extension_attrs());
    registry.create(TYPE_NAME, &mut state, &ctx).await.unwrap();

    registry.delete(TYPE_NAME, &mut state, &ctx).await.unwrap();
    registry.read(TYPE_NAME, &mut state, &ctx).await.unwrap();
    assert!(state.is_new());
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancelled_context_aborts_create() {
    let arm = FakeArm::new();
    let registry = ResourceRegistry::with_builtins();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let ctx = context(&arm).with_cancellation(cancel);

    let mut state = ResourceState::from_attributes(extension_attrs());
    let err = registry
        .create(TYPE_NAME, &mut state, &ctx)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("cancelled"));
    assert!(state.is_new());
}
