//! Shared test fixtures: an in-memory fake of the management API.
//!
//! The fake stores resources in hash maps keyed by their composite
//! addressing tuples, assigns canonical ARM identifiers on create, strips
//! write-only fields the way the real service does, and counts every
//! remote call so tests can assert that validation failures happen before
//! anything goes over the wire.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use armature::client::models::{
    IntegrationRuntime, IntegrationRuntimeAuthKeys, IntegrationRuntimeResource, PolicyDefinition,
    VirtualMachineExtension,
};
use armature::client::{
    ApiError, ArmClient, IntegrationRuntimesApi, Operation, OperationStatus, PendingOperation,
    PolicyDefinitionsApi, VirtualMachineExtensionsApi,
};

pub const SUBSCRIPTION_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Installs the test tracing subscriber. Safe to call from every test;
/// only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A long-running operation that needs a couple of polls to finish.
struct SlowSuccess {
    polls_left: u32,
}

#[async_trait]
impl PendingOperation for SlowSuccess {
    async fn poll(&mut self) -> Result<OperationStatus, ApiError> {
        if self.polls_left == 0 {
            Ok(OperationStatus::Succeeded)
        } else {
            self.polls_left -= 1;
            Ok(OperationStatus::InProgress)
        }
    }
}

fn slow_operation() -> Operation {
    Operation::pending(
        Box::new(SlowSuccess { polls_left: 2 }),
        Duration::from_millis(1),
    )
}

type ExtensionKey = (String, String, String);
type RuntimeKey = (String, String, String);

/// In-memory fake of the management API backing all three client traits.
#[derive(Default)]
pub struct FakeArm {
    extensions: Mutex<HashMap<ExtensionKey, VirtualMachineExtension>>,
    runtimes: Mutex<HashMap<RuntimeKey, IntegrationRuntimeResource>>,
    policies: Mutex<HashMap<String, PolicyDefinition>>,
    remote_calls: AtomicUsize,
}

impl FakeArm {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Builds the client handle the handlers consume.
    pub fn client(self: &Arc<Self>) -> Arc<ArmClient> {
        Arc::new(ArmClient {
            virtual_machine_extensions: self.clone(),
            integration_runtimes: self.clone(),
            policy_definitions: self.clone(),
        })
    }

    /// Number of remote calls made so far.
    pub fn calls(&self) -> usize {
        self.remote_calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.remote_calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn extension_id(resource_group: &str, vm_name: &str, name: &str) -> String {
        format!(
            "/subscriptions/{SUBSCRIPTION_ID}/resourceGroups/{resource_group}/providers/Microsoft.Compute/virtualMachines/{vm_name}/extensions/{name}"
        )
    }

    pub fn runtime_id(resource_group: &str, factory_name: &str, name: &str) -> String {
        format!(
            "/subscriptions/{SUBSCRIPTION_ID}/resourceGroups/{resource_group}/providers/Microsoft.DataFactory/factories/{factory_name}/integrationruntimes/{name}"
        )
    }

    /// Seeds a pre-existing extension, as if created outside the host.
    pub fn seed_extension(
        &self,
        resource_group: &str,
        vm_name: &str,
        name: &str,
        mut extension: VirtualMachineExtension,
    ) {
        extension.id = Some(Self::extension_id(resource_group, vm_name, name));
        extension.name = Some(name.to_string());
        self.extensions.lock().unwrap().insert(
            (
                resource_group.to_string(),
                vm_name.to_string(),
                name.to_string(),
            ),
            extension,
        );
    }

    /// Seeds a pre-existing integration runtime.
    pub fn seed_runtime(
        &self,
        resource_group: &str,
        factory_name: &str,
        name: &str,
        properties: IntegrationRuntime,
    ) {
        let runtime = IntegrationRuntimeResource {
            id: Some(Self::runtime_id(resource_group, factory_name, name)),
            name: Some(name.to_string()),
            properties,
        };
        self.runtimes.lock().unwrap().insert(
            (
                resource_group.to_string(),
                factory_name.to_string(),
                name.to_string(),
            ),
            runtime,
        );
    }

    /// Seeds a policy definition.
    pub fn seed_policy(&self, name: &str, mut definition: PolicyDefinition) {
        definition.id = Some(format!(
            "/providers/Microsoft.Authorization/policyDefinitions/{name}"
        ));
        definition.name = Some(name.to_string());
        self.policies
            .lock()
            .unwrap()
            .insert(name.to_string(), definition);
    }

    /// Removes an extension out from under the handler, simulating
    /// independent deletion.
    pub fn remove_extension(&self, resource_group: &str, vm_name: &str, name: &str) {
        self.extensions.lock().unwrap().remove(&(
            resource_group.to_string(),
            vm_name.to_string(),
            name.to_string(),
        ));
    }

    /// Removes an integration runtime out from under the handler.
    pub fn remove_runtime(&self, resource_group: &str, factory_name: &str, name: &str) {
        self.runtimes.lock().unwrap().remove(&(
            resource_group.to_string(),
            factory_name.to_string(),
            name.to_string(),
        ));
    }
}

#[async_trait]
impl VirtualMachineExtensionsApi for FakeArm {
    async fn get(
        &self,
        resource_group: &str,
        vm_name: &str,
        name: &str,
    ) -> Result<VirtualMachineExtension, ApiError> {
        self.record_call();
        let extensions = self.extensions.lock().unwrap();
        let mut extension = extensions
            .get(&(
                resource_group.to_string(),
                vm_name.to_string(),
                name.to_string(),
            ))
            .cloned()
            .ok_or(ApiError::NotFound)?;
        // the service never returns protected settings
        if let Some(props) = extension.properties.as_mut() {
            props.protected_settings = None;
        }
        Ok(extension)
    }

    async fn create_or_update(
        &self,
        resource_group: &str,
        vm_name: &str,
        name: &str,
        mut extension: VirtualMachineExtension,
    ) -> Result<Operation, ApiError> {
        self.record_call();
        extension.id = Some(Self::extension_id(resource_group, vm_name, name));
        extension.name = Some(name.to_string());
        self.extensions.lock().unwrap().insert(
            (
                resource_group.to_string(),
                vm_name.to_string(),
                name.to_string(),
            ),
            extension,
        );
        Ok(slow_operation())
    }

    async fn delete(
        &self,
        resource_group: &str,
        vm_name: &str,
        name: &str,
    ) -> Result<Operation, ApiError> {
        self.record_call();
        // deleting an absent extension is a no-op success
        self.extensions.lock().unwrap().remove(&(
            resource_group.to_string(),
            vm_name.to_string(),
            name.to_string(),
        ));
        Ok(slow_operation())
    }
}

#[async_trait]
impl IntegrationRuntimesApi for FakeArm {
    async fn get(
        &self,
        resource_group: &str,
        factory_name: &str,
        name: &str,
    ) -> Result<IntegrationRuntimeResource, ApiError> {
        self.record_call();
        self.runtimes
            .lock()
            .unwrap()
            .get(&(
                resource_group.to_string(),
                factory_name.to_string(),
                name.to_string(),
            ))
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn create_or_update(
        &self,
        resource_group: &str,
        factory_name: &str,
        name: &str,
        mut runtime: IntegrationRuntimeResource,
    ) -> Result<IntegrationRuntimeResource, ApiError> {
        self.record_call();
        runtime.id = Some(Self::runtime_id(resource_group, factory_name, name));
        runtime.name = Some(name.to_string());
        self.runtimes.lock().unwrap().insert(
            (
                resource_group.to_string(),
                factory_name.to_string(),
                name.to_string(),
            ),
            runtime.clone(),
        );
        Ok(runtime)
    }

    async fn delete(
        &self,
        resource_group: &str,
        factory_name: &str,
        name: &str,
    ) -> Result<(), ApiError> {
        self.record_call();
        self.runtimes.lock().unwrap().remove(&(
            resource_group.to_string(),
            factory_name.to_string(),
            name.to_string(),
        ));
        Ok(())
    }

    async fn list_auth_keys(
        &self,
        _resource_group: &str,
        _factory_name: &str,
        name: &str,
    ) -> Result<IntegrationRuntimeAuthKeys, ApiError> {
        self.record_call();
        Ok(IntegrationRuntimeAuthKeys {
            auth_key_1: Some(format!("IR@primary@{name}")),
            auth_key_2: Some(format!("IR@secondary@{name}")),
        })
    }
}

#[async_trait]
impl PolicyDefinitionsApi for FakeArm {
    async fn get(&self, name: &str) -> Result<PolicyDefinition, ApiError> {
        self.record_call();
        self.policies
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or(ApiError::NotFound)
    }
}
