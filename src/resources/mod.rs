//! Resource and data-source handlers.
//!
//! Each handler maps one declarative configuration block onto
//! create/read/update/delete calls against the management API and
//! reconciles remote state back into local state. Handlers are independent
//! leaf components: nothing is shared between them beyond the client
//! handle and context passed into every call.

pub mod integration_runtime;
pub mod policy_definition;
pub mod vm_extension;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::client::ArmClient;
use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::state::ResourceState;

/// Context supplied by the host to every handler invocation.
///
/// Carries the stateless client handle, the cancellation signal honored by
/// long-running waits, and the adoption policy for pre-existing remote
/// objects - an explicit parameter rather than a process-wide switch.
#[derive(Clone)]
pub struct ProviderContext {
    /// Typed management API client.
    pub client: Arc<ArmClient>,
    /// Cancellation signal propagated into long-running waits.
    pub cancel: CancellationToken,
    /// When true, creating a logical resource that already exists remotely
    /// fails with an actionable "already exists, use import" error instead
    /// of silently adopting the remote object.
    pub require_import: bool,
}

impl ProviderContext {
    /// Creates a context with adoption allowed and no cancellation armed.
    pub fn new(client: Arc<ArmClient>) -> Self {
        Self {
            client,
            cancel: CancellationToken::new(),
            require_import: false,
        }
    }

    /// Sets the adoption policy.
    pub fn with_require_import(mut self, require_import: bool) -> Self {
        self.require_import = require_import;
        self
    }

    /// Sets the cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl std::fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderContext")
            .field("require_import", &self.require_import)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// A managed resource: four entry points plus its schema.
///
/// Every operation runs to completion, including blocking on long-running
/// operation polling, before returning. State transitions follow
/// Absent -> (Create) -> Present -> (Update)* -> Present -> (Delete) -> Absent,
/// with Read valid in any state and clearing local state when the remote
/// object is independently gone.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Configuration type name of the resource.
    fn type_name(&self) -> &'static str;

    /// Attribute schema of the resource.
    fn schema(&self) -> Schema;

    /// Creates the remote object and persists its identifier.
    async fn create(&self, state: &mut ResourceState, ctx: &ProviderContext) -> Result<()>;

    /// Fetches remote state by the persisted identifier and populates all
    /// declared attributes, clearing the identifier when the object is gone.
    async fn read(&self, state: &mut ResourceState, ctx: &ProviderContext) -> Result<()>;

    /// Applies configuration changes to the existing remote object.
    async fn update(&self, state: &mut ResourceState, ctx: &ProviderContext) -> Result<()>;

    /// Deletes the remote object and blocks until completion.
    async fn delete(&self, state: &mut ResourceState, ctx: &ProviderContext) -> Result<()>;
}

/// A read-only data source: one entry point plus its schema.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Configuration type name of the data source.
    fn type_name(&self) -> &'static str;

    /// Attribute schema of the data source.
    fn schema(&self) -> Schema;

    /// Looks up the remote object and populates all computed attributes.
    /// Unlike a resource read, a missing remote object is an error here.
    async fn read(&self, state: &mut ResourceState, ctx: &ProviderContext) -> Result<()>;
}

/// Registry for looking up handlers by configuration type name.
///
/// Dispatch through the registry validates configuration against the
/// declared schema before Create and Update, so malformed attribute
/// combinations are rejected before any remote call.
pub struct ResourceRegistry {
    resources: HashMap<&'static str, Arc<dyn Resource>>,
    data_sources: HashMap<&'static str, Arc<dyn DataSource>>,
}

impl ResourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            resources: HashMap::new(),
            data_sources: HashMap::new(),
        }
    }

    /// Creates a registry with all built-in handlers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_resource(Arc::new(vm_extension::VirtualMachineExtensionResource));
        registry.register_resource(Arc::new(
            integration_runtime::DataFactoryIntegrationRuntimeResource,
        ));
        registry.register_data_source(Arc::new(policy_definition::PolicyDefinitionDataSource));
        registry
    }

    /// Registers a resource handler.
    pub fn register_resource(&mut self, resource: Arc<dyn Resource>) {
        self.resources.insert(resource.type_name(), resource);
    }

    /// Registers a data-source handler.
    pub fn register_data_source(&mut self, data_source: Arc<dyn DataSource>) {
        self.data_sources.insert(data_source.type_name(), data_source);
    }

    /// Looks up a resource handler.
    pub fn resource(&self, type_name: &str) -> Result<Arc<dyn Resource>> {
        self.resources
            .get(type_name)
            .cloned()
            .ok_or_else(|| Error::UnknownResourceType(type_name.to_string()))
    }

    /// Looks up a data-source handler.
    pub fn data_source(&self, type_name: &str) -> Result<Arc<dyn DataSource>> {
        self.data_sources
            .get(type_name)
            .cloned()
            .ok_or_else(|| Error::UnknownResourceType(type_name.to_string()))
    }

    /// Registered resource type names.
    pub fn resource_names(&self) -> Vec<&'static str> {
        self.resources.keys().copied().collect()
    }

    /// Validates configuration and creates the resource.
    pub async fn create(
        &self,
        type_name: &str,
        state: &mut ResourceState,
        ctx: &ProviderContext,
    ) -> Result<()> {
        let resource = self.resource(type_name)?;
        resource.schema().validate(state.attributes())?;
        resource.create(state, ctx).await
    }

    /// Reads the resource. Persisted state is not re-validated.
    pub async fn read(
        &self,
        type_name: &str,
        state: &mut ResourceState,
        ctx: &ProviderContext,
    ) -> Result<()> {
        self.resource(type_name)?.read(state, ctx).await
    }

    /// Validates configuration and updates the resource.
    pub async fn update(
        &self,
        type_name: &str,
        state: &mut ResourceState,
        ctx: &ProviderContext,
    ) -> Result<()> {
        let resource = self.resource(type_name)?;
        resource.schema().validate(state.attributes())?;
        resource.update(state, ctx).await
    }

    /// Deletes the resource.
    pub async fn delete(
        &self,
        type_name: &str,
        state: &mut ResourceState,
        ctx: &ProviderContext,
    ) -> Result<()> {
        self.resource(type_name)?.delete(state, ctx).await
    }

    /// Validates configuration and reads the data source.
    pub async fn read_data_source(
        &self,
        type_name: &str,
        state: &mut ResourceState,
        ctx: &ProviderContext,
    ) -> Result<()> {
        let data_source = self.data_source(type_name)?;
        data_source.schema().validate(state.attributes())?;
        data_source.read(state, ctx).await
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Decodes a JSON-string attribute into its structured form. The error
/// cites the offending attribute.
pub fn expand_json_string(attribute: &str, raw: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(raw).map_err(|source| Error::JsonAttribute {
        attribute: attribute.to_string(),
        source,
    })?;
    if !value.is_object() {
        return Err(Error::invalid_attribute(
            attribute,
            "expected a JSON object",
        ));
    }
    Ok(value)
}

/// Encodes a structured JSON value to the string form stored locally.
/// Round-trip through [`expand_json_string`] is semantically lossless; key
/// order is irrelevant.
pub fn flatten_json(attribute: &str, value: &Value) -> Result<String> {
    serde_json::to_string(value).map_err(|source| Error::JsonAttribute {
        attribute: attribute.to_string(),
        source,
    })
}
