//! Data factory integration runtime resource handler.
//!
//! Manages an integration runtime inside an Azure data factory. The
//! runtime is variant-typed: a `SelfHosted` runtime runs on customer
//! infrastructure and exposes two generated authentication keys, while a
//! `Managed` runtime provisions dedicated compute described by a
//! `compute_properties` block, optionally attached to a virtual network.
//!
//! ### Attributes
//!
//! | Attribute | Required | Description |
//! |-----------|----------|-------------|
//! | `name` | Yes | Runtime name (replaces on change) |
//! | `data_factory_name` | Yes | Parent data factory (replaces on change) |
//! | `resource_group_name` | Yes | Resource group (replaces on change) |
//! | `type` | Yes | `SelfHosted` or `Managed` (replaces on change) |
//! | `description` | No | Free-form description |
//! | `compute_properties` | No* | Compute block (*required for `Managed`) |
//! | `auth_key_1` / `auth_key_2` | Computed | Keys of a self-hosted runtime |
//!
//! The `compute_properties` block carries `location`, `node_size`,
//! `node_count`, `max_node_executions`, and the optional `vnet_id`/`subnet`
//! pair, which must be supplied together or not at all.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::arm::id::ResourceId;
use crate::arm::location;
use crate::client::models::{
    IntegrationRuntime, IntegrationRuntimeComputeProperties, IntegrationRuntimeResource,
    IntegrationRuntimeVnetProperties,
};
use crate::error::{Error, Result};
use crate::resources::{ProviderContext, Resource};
use crate::schema::{validators, Attribute, DiffSuppress, Schema};
use crate::state::ResourceState;

const TYPE_NAME: &str = "azure_data_factory_integration_runtime";

/// Handler for the `azure_data_factory_integration_runtime` resource.
pub struct DataFactoryIntegrationRuntimeResource;

/// The two runtime shapes configuration can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuntimeType {
    SelfHosted,
    Managed,
}

impl RuntimeType {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "SelfHosted" => Ok(Self::SelfHosted),
            "Managed" => Ok(Self::Managed),
            other => Err(Error::invalid_attribute(
                "type",
                format!("invalid type '{other}', expected one of: SelfHosted, Managed"),
            )),
        }
    }
}

/// Runtime configuration parsed from resource state.
#[derive(Debug, Clone)]
struct RuntimeConfig {
    name: String,
    data_factory_name: String,
    resource_group_name: String,
    runtime_type: RuntimeType,
    description: Option<String>,
    compute: Option<IntegrationRuntimeComputeProperties>,
}

impl RuntimeConfig {
    fn from_state(state: &ResourceState) -> Result<Self> {
        let compute = match state.get_object("compute_properties")? {
            Some(block) => Some(expand_compute_properties(block)?),
            None => None,
        };

        Ok(Self {
            name: state.get_string_required("name")?,
            data_factory_name: state.get_string_required("data_factory_name")?,
            resource_group_name: state.get_string_required("resource_group_name")?,
            runtime_type: RuntimeType::parse(&state.get_string_required("type")?)?,
            description: state.get_string("description")?,
            compute,
        })
    }

    /// Builds the variant-typed payload, enforcing the attributes the
    /// selected variant requires.
    fn build_properties(&self) -> Result<IntegrationRuntime> {
        match self.runtime_type {
            RuntimeType::SelfHosted => Ok(IntegrationRuntime::SelfHosted {
                description: self.description.clone(),
            }),
            RuntimeType::Managed => {
                let compute = self.compute.clone().ok_or_else(|| {
                    Error::MissingAttribute("compute_properties".to_string())
                })?;
                Ok(IntegrationRuntime::Managed {
                    description: self.description.clone(),
                    compute: Some(compute),
                })
            }
        }
    }
}

fn expand_compute_properties(
    block: &Map<String, Value>,
) -> Result<IntegrationRuntimeComputeProperties> {
    let block = ResourceState::from_attributes(
        block.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
    );

    let vnet_id = block.get_string("vnet_id")?.filter(|s| !s.is_empty());
    let subnet = block.get_string("subnet")?.filter(|s| !s.is_empty());
    let vnet = match (vnet_id, subnet) {
        (Some(vnet_id), Some(subnet)) => Some(IntegrationRuntimeVnetProperties { vnet_id, subnet }),
        (None, None) => None,
        _ => {
            return Err(Error::invalid_attribute(
                "compute_properties",
                "both 'vnet_id' and 'subnet' must be provided if setting the vnet properties",
            ));
        }
    };

    Ok(IntegrationRuntimeComputeProperties {
        location: Some(location::normalize(
            &block.get_string_required("location")?,
        )),
        node_size: Some(block.get_string_required("node_size")?),
        number_of_nodes: Some(block.get_i64_required("node_count")? as i32),
        max_parallel_executions_per_node: Some(
            block.get_i64_required("max_node_executions")? as i32,
        ),
        vnet,
    })
}

fn flatten_compute_properties(compute: &IntegrationRuntimeComputeProperties) -> Value {
    let mut block = Map::new();
    if let Some(location) = &compute.location {
        block.insert("location".to_string(), Value::from(location.clone()));
    }
    if let Some(node_size) = &compute.node_size {
        block.insert("node_size".to_string(), Value::from(node_size.clone()));
    }
    if let Some(nodes) = compute.number_of_nodes {
        block.insert("node_count".to_string(), Value::from(nodes));
    }
    if let Some(max) = compute.max_parallel_executions_per_node {
        block.insert("max_node_executions".to_string(), Value::from(max));
    }
    if let Some(vnet) = &compute.vnet {
        block.insert("vnet_id".to_string(), Value::from(vnet.vnet_id.clone()));
        block.insert("subnet".to_string(), Value::from(vnet.subnet.clone()));
    }
    Value::Object(block)
}

fn compute_properties_schema() -> Schema {
    Schema::new()
        .attribute(
            "location",
            Attribute::string()
                .required()
                .diff_suppress(DiffSuppress::Location),
        )
        .attribute(
            "node_size",
            Attribute::string()
                .required()
                .diff_suppress(DiffSuppress::CaseInsensitive),
        )
        .attribute(
            "node_count",
            Attribute::int()
                .required()
                .validator(validators::int_between(2, 8)),
        )
        .attribute(
            "max_node_executions",
            Attribute::int()
                .required()
                .validator(validators::int_between(2, 8)),
        )
        .attribute(
            "vnet_id",
            Attribute::string()
                .validator(validators::resource_id())
                .diff_suppress(DiffSuppress::CaseInsensitive),
        )
        .attribute("subnet", Attribute::string())
}

impl DataFactoryIntegrationRuntimeResource {
    async fn create_or_update(
        &self,
        state: &mut ResourceState,
        ctx: &ProviderContext,
    ) -> Result<()> {
        let config = RuntimeConfig::from_state(state)?;
        let client = &ctx.client.integration_runtimes;

        if state.is_new() && ctx.require_import {
            match client
                .get(
                    &config.resource_group_name,
                    &config.data_factory_name,
                    &config.name,
                )
                .await
            {
                Ok(existing) => {
                    if let Some(id) = existing.id.filter(|id| !id.is_empty()) {
                        return Err(Error::already_exists(TYPE_NAME, id));
                    }
                }
                Err(err) if err.is_not_found() => {}
                Err(err) => {
                    return Err(Error::api(
                        format!(
                            "checking for presence of existing Data Factory Integration Runtime '{}' (Resource Group '{}' / Data Factory '{}')",
                            config.name, config.resource_group_name, config.data_factory_name
                        ),
                        err,
                    ));
                }
            }
        }

        let runtime = IntegrationRuntimeResource {
            id: None,
            name: Some(config.name.clone()),
            properties: config.build_properties()?,
        };

        tracing::debug!(
            runtime = %config.name,
            data_factory = %config.data_factory_name,
            resource_group = %config.resource_group_name,
            "submitting integration runtime create/update"
        );

        client
            .create_or_update(
                &config.resource_group_name,
                &config.data_factory_name,
                &config.name,
                runtime,
            )
            .await
            .map_err(|err| {
                Error::api(
                    format!(
                        "creating Data Factory Integration Runtime '{}' (Resource Group '{}' / Data Factory '{}')",
                        config.name, config.resource_group_name, config.data_factory_name
                    ),
                    err,
                )
            })?;

        let read = client
            .get(
                &config.resource_group_name,
                &config.data_factory_name,
                &config.name,
            )
            .await
            .map_err(|err| {
                Error::api(
                    format!(
                        "retrieving Data Factory Integration Runtime '{}' (Resource Group '{}' / Data Factory '{}')",
                        config.name, config.resource_group_name, config.data_factory_name
                    ),
                    err,
                )
            })?;

        let id = read.id.filter(|id| !id.is_empty()).ok_or_else(|| {
            Error::missing_remote_id(format!(
                "Data Factory Integration Runtime '{}' (Resource Group '{}' / Data Factory '{}')",
                config.name, config.resource_group_name, config.data_factory_name
            ))
        })?;
        state.set_id(id);

        self.read(state, ctx).await
    }
}

#[async_trait]
impl Resource for DataFactoryIntegrationRuntimeResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attribute(
                "name",
                Attribute::string()
                    .required()
                    .force_new()
                    .validator(validators::integration_runtime_name()),
            )
            .attribute(
                "data_factory_name",
                Attribute::string()
                    .required()
                    .force_new()
                    .validator(validators::data_factory_name()),
            )
            // the API returns this in lower-case
            .attribute(
                "resource_group_name",
                Attribute::string()
                    .required()
                    .force_new()
                    .validator(validators::resource_group_name())
                    .diff_suppress(DiffSuppress::CaseInsensitive),
            )
            .attribute(
                "type",
                Attribute::string()
                    .required()
                    .force_new()
                    .validator(validators::one_of(&["SelfHosted", "Managed"])),
            )
            .attribute("description", Attribute::string())
            .attribute(
                "compute_properties",
                Attribute::block(compute_properties_schema()),
            )
            .attribute("auth_key_1", Attribute::string().computed().sensitive())
            .attribute("auth_key_2", Attribute::string().computed().sensitive())
    }

    async fn create(&self, state: &mut ResourceState, ctx: &ProviderContext) -> Result<()> {
        self.create_or_update(state, ctx).await
    }

    async fn update(&self, state: &mut ResourceState, ctx: &ProviderContext) -> Result<()> {
        self.create_or_update(state, ctx).await
    }

    async fn read(&self, state: &mut ResourceState, ctx: &ProviderContext) -> Result<()> {
        let Some(raw_id) = state.id().map(str::to_string) else {
            return Ok(());
        };
        let id = ResourceId::parse(&raw_id)?;
        let resource_group = id.resource_group.clone();
        let factory_name = id.require_segment("factories")?.to_string();
        let name = id.require_segment("integrationruntimes")?.to_string();

        let client = &ctx.client.integration_runtimes;
        let runtime = match client.get(&resource_group, &factory_name, &name).await {
            Ok(runtime) => runtime,
            Err(err) if err.is_not_found() => {
                tracing::debug!(
                    runtime = %name,
                    resource_group = %resource_group,
                    "integration runtime was not found - removing from state"
                );
                state.clear();
                return Ok(());
            }
            Err(err) => {
                return Err(Error::api(
                    format!("reading the state of Data Factory Integration Runtime '{name}'"),
                    err,
                ));
            }
        };

        state.set_opt("name", runtime.name);
        state.set("resource_group_name", resource_group.clone());
        state.set("data_factory_name", factory_name.clone());
        state.set(
            "type",
            runtime.properties.type_name(),
        );
        state.set_opt(
            "description",
            runtime.properties.description().map(str::to_string),
        );

        match &runtime.properties {
            IntegrationRuntime::SelfHosted { .. } => {
                let keys = client
                    .list_auth_keys(&resource_group, &factory_name, &name)
                    .await
                    .map_err(|err| {
                        Error::api(
                            format!(
                                "listing authentication keys for Data Factory Integration Runtime '{name}'"
                            ),
                            err,
                        )
                    })?;
                state.set_opt("auth_key_1", keys.auth_key_1);
                state.set_opt("auth_key_2", keys.auth_key_2);
            }
            IntegrationRuntime::Managed { compute, .. } => match compute {
                Some(compute) => {
                    state.set("compute_properties", flatten_compute_properties(compute));
                }
                None => state.remove("compute_properties"),
            },
        }

        Ok(())
    }

    async fn delete(&self, state: &mut ResourceState, ctx: &ProviderContext) -> Result<()> {
        let Some(raw_id) = state.id().map(str::to_string) else {
            return Ok(());
        };
        let id = ResourceId::parse(&raw_id)?;
        let resource_group = id.resource_group.clone();
        let factory_name = id.require_segment("factories")?.to_string();
        let name = id.require_segment("integrationruntimes")?.to_string();

        ctx.client
            .integration_runtimes
            .delete(&resource_group, &factory_name, &name)
            .await
            .map_err(|err| {
                Error::api(
                    format!(
                        "deleting Data Factory Integration Runtime '{name}' (Resource Group '{resource_group}' / Data Factory '{factory_name}')"
                    ),
                    err,
                )
            })?;

        Ok(())
    }
}
