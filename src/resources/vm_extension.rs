//! Virtual machine extension resource handler.
//!
//! Manages extensions attached to an Azure virtual machine: publisher,
//! type, handler version, auto-upgrade flag, JSON settings and write-only
//! protected settings.
//!
//! ### Attributes
//!
//! | Attribute | Required | Description |
//! |-----------|----------|-------------|
//! | `name` | Yes | Extension name (replaces on change) |
//! | `virtual_machine_id` | No* | Id of the parent virtual machine (*or `virtual_machine_name`) |
//! | `virtual_machine_name` | No | Deprecated name-based parent reference |
//! | `resource_group_name` | No | Deprecated; derived from `virtual_machine_id` |
//! | `location` | Yes | Azure region |
//! | `publisher` | Yes | Extension publisher |
//! | `type` | Yes | Extension type |
//! | `type_handler_version` | Yes | Handler version |
//! | `auto_upgrade_minor_version` | No | Apply minor upgrades automatically |
//! | `settings` | No | Public settings, JSON string |
//! | `protected_settings` | No | Sensitive settings, JSON string, never read back |
//! | `tags` | No | Resource tags |
//!
//! Exactly one of `virtual_machine_id` and `virtual_machine_name` must be
//! supplied; the name-based pair is kept for a deprecation window only.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::arm::id::ResourceId;
use crate::arm::{location, tags};
use crate::client::models::{VirtualMachineExtension, VirtualMachineExtensionProperties};
use crate::error::{Error, Result};
use crate::resources::{expand_json_string, flatten_json, ProviderContext, Resource};
use crate::schema::{validators, Attribute, DiffSuppress, Schema};
use crate::state::ResourceState;

const TYPE_NAME: &str = "azure_virtual_machine_extension";

/// Handler for the `azure_virtual_machine_extension` resource.
pub struct VirtualMachineExtensionResource;

/// Extension configuration parsed from resource state.
#[derive(Debug, Clone)]
struct ExtensionConfig {
    name: String,
    virtual_machine_id: Option<String>,
    virtual_machine_name: Option<String>,
    resource_group_name: Option<String>,
    location: String,
    publisher: String,
    type_: String,
    type_handler_version: String,
    auto_upgrade_minor_version: bool,
    settings: Option<String>,
    protected_settings: Option<String>,
    tags: HashMap<String, String>,
}

impl ExtensionConfig {
    fn from_state(state: &ResourceState) -> Result<Self> {
        let tags = match state.get("tags") {
            Some(value) => tags::expand(value)?,
            None => HashMap::new(),
        };

        Ok(Self {
            name: state.get_string_required("name")?,
            virtual_machine_id: state.get_string("virtual_machine_id")?,
            virtual_machine_name: state.get_string("virtual_machine_name")?,
            resource_group_name: state.get_string("resource_group_name")?,
            location: state.get_string_required("location")?,
            publisher: state.get_string_required("publisher")?,
            type_: state.get_string_required("type")?,
            type_handler_version: state.get_string_required("type_handler_version")?,
            auto_upgrade_minor_version: state.get_bool_or("auto_upgrade_minor_version", false),
            settings: state.get_string("settings")?,
            protected_settings: state.get_string("protected_settings")?,
            tags,
        })
    }

    /// Resolves the resource group and virtual machine name that address
    /// the parent. Exactly one resolution path must succeed: the parent id
    /// yields both values; the legacy name requires an explicit resource
    /// group.
    fn resolve_parent(&self) -> Result<(String, String)> {
        match &self.virtual_machine_name {
            None => {
                let vm_id = self.virtual_machine_id.as_deref().ok_or_else(|| {
                    Error::invalid_attribute(
                        "virtual_machine_id",
                        "one of 'virtual_machine_id' or 'virtual_machine_name' must be set",
                    )
                })?;
                let id = ResourceId::parse(vm_id)?;
                let vm_name = id.segment("virtualMachines").ok_or_else(|| {
                    Error::invalid_attribute(
                        "virtual_machine_id",
                        format!("id does not contain 'virtualMachines': '{vm_id}'"),
                    )
                })?;
                Ok((id.resource_group.clone(), vm_name.to_string()))
            }
            Some(vm_name) => {
                let resource_group = self.resource_group_name.as_deref().ok_or_else(|| {
                    Error::invalid_attribute(
                        "resource_group_name",
                        "'resource_group_name' must be set when 'virtual_machine_name' is used",
                    )
                })?;
                Ok((resource_group.to_string(), vm_name.clone()))
            }
        }
    }

    fn build_payload(&self) -> Result<VirtualMachineExtension> {
        let mut properties = VirtualMachineExtensionProperties {
            publisher: Some(self.publisher.clone()),
            type_: Some(self.type_.clone()),
            type_handler_version: Some(self.type_handler_version.clone()),
            auto_upgrade_minor_version: Some(self.auto_upgrade_minor_version),
            settings: None,
            protected_settings: None,
        };

        if let Some(settings) = self.settings.as_deref().filter(|s| !s.is_empty()) {
            properties.settings = Some(expand_json_string("settings", settings)?);
        }
        if let Some(protected) = self
            .protected_settings
            .as_deref()
            .filter(|s| !s.is_empty())
        {
            properties.protected_settings =
                Some(expand_json_string("protected_settings", protected)?);
        }

        Ok(VirtualMachineExtension {
            id: None,
            name: None,
            location: Some(location::normalize(&self.location)),
            tags: Some(self.tags.clone()),
            properties: Some(properties),
        })
    }
}

fn virtual_machine_id(subscription_id: &str, resource_group: &str, vm_name: &str) -> String {
    format!(
        "/subscriptions/{subscription_id}/resourceGroups/{resource_group}/providers/Microsoft.Compute/virtualMachines/{vm_name}"
    )
}

impl VirtualMachineExtensionResource {
    async fn create_or_update(
        &self,
        state: &mut ResourceState,
        ctx: &ProviderContext,
    ) -> Result<()> {
        let config = ExtensionConfig::from_state(state)?;
        let (resource_group, vm_name) = config.resolve_parent()?;
        let client = &ctx.client.virtual_machine_extensions;

        if state.is_new() && ctx.require_import {
            match client.get(&resource_group, &vm_name, &config.name).await {
                Ok(existing) => {
                    if let Some(id) = existing.id.filter(|id| !id.is_empty()) {
                        return Err(Error::already_exists(TYPE_NAME, id));
                    }
                }
                Err(err) if err.is_not_found() => {}
                Err(err) => {
                    return Err(Error::api(
                        format!(
                            "checking for presence of existing Virtual Machine Extension '{}' (Virtual Machine '{}' / Resource Group '{}')",
                            config.name, vm_name, resource_group
                        ),
                        err,
                    ));
                }
            }
        }

        let payload = config.build_payload()?;

        tracing::debug!(
            extension = %config.name,
            virtual_machine = %vm_name,
            resource_group = %resource_group,
            "submitting virtual machine extension create/update"
        );

        let context = || {
            format!(
                "creating Virtual Machine Extension '{}' (Virtual Machine '{}' / Resource Group '{}')",
                config.name, vm_name, resource_group
            )
        };

        let operation = client
            .create_or_update(&resource_group, &vm_name, &config.name, payload)
            .await
            .map_err(|err| Error::api(context(), err))?;
        operation
            .wait(&ctx.cancel)
            .await
            .map_err(|err| Error::api(context(), err))?;

        let read = client
            .get(&resource_group, &vm_name, &config.name)
            .await
            .map_err(|err| {
                Error::api(
                    format!(
                        "retrieving Virtual Machine Extension '{}' (Virtual Machine '{}' / Resource Group '{}')",
                        config.name, vm_name, resource_group
                    ),
                    err,
                )
            })?;

        let id = read.id.filter(|id| !id.is_empty()).ok_or_else(|| {
            Error::missing_remote_id(format!(
                "Virtual Machine Extension '{}' (Resource Group '{}')",
                config.name, resource_group
            ))
        })?;
        state.set_id(id);

        self.read(state, ctx).await
    }
}

#[async_trait]
impl Resource for VirtualMachineExtensionResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attribute("name", Attribute::string().required().force_new())
            .attribute(
                "virtual_machine_id",
                Attribute::string()
                    .force_new()
                    .validator(validators::resource_id())
                    .conflicts_with(&["virtual_machine_name"]),
            )
            .attribute(
                "location",
                Attribute::string()
                    .required()
                    .force_new()
                    .diff_suppress(DiffSuppress::Location),
            )
            .attribute(
                "resource_group_name",
                Attribute::string()
                    .computed()
                    .force_new()
                    .deprecated(
                        "the resource group is now pulled from the virtual machine id",
                    )
                    .validator(validators::resource_group_name()),
            )
            .attribute(
                "virtual_machine_name",
                Attribute::string()
                    .force_new()
                    .deprecated("use the virtual_machine_id attribute instead")
                    .validator(validators::non_empty())
                    .conflicts_with(&["virtual_machine_id"]),
            )
            .attribute("publisher", Attribute::string().required())
            .attribute("type", Attribute::string().required())
            .attribute("type_handler_version", Attribute::string().required())
            .attribute("auto_upgrade_minor_version", Attribute::bool())
            .attribute(
                "settings",
                Attribute::string()
                    .validator(validators::json_string())
                    .diff_suppress(DiffSuppress::JsonEquivalent),
            )
            // never returned by the API
            .attribute(
                "protected_settings",
                Attribute::string()
                    .sensitive()
                    .validator(validators::json_string())
                    .diff_suppress(DiffSuppress::JsonEquivalent),
            )
            .attribute("tags", Attribute::map().validator(validators::tags()))
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
        let vm_name = id.require_segment("virtualMachines")?.to_string();
        let name = id.require_segment("extensions")?.to_string();

        let client = &ctx.client.virtual_machine_extensions;
        let extension = match client.get(&resource_group, &vm_name, &name).await {
            Ok(extension) => extension,
            Err(err) if err.is_not_found() => {
                tracing::debug!(
                    extension = %name,
                    resource_group = %resource_group,
                    "virtual machine extension was not found - removing from state"
                );
                state.clear();
                return Ok(());
            }
            Err(err) => {
                return Err(Error::api(
                    format!("reading Virtual Machine Extension '{name}'"),
                    err,
                ));
            }
        };

        state.set_opt("name", extension.name);
        state.set_opt(
            "location",
            extension.location.as_deref().map(location::normalize),
        );
        // refresh whichever parent reference style the configuration uses;
        // the id-based and name-based references are mutually exclusive
        if state.get("virtual_machine_name").is_some() {
            state.set("virtual_machine_name", vm_name);
        } else {
            state.set(
                "virtual_machine_id",
                virtual_machine_id(&id.subscription_id, &resource_group, &vm_name),
            );
        }
        state.set("resource_group_name", resource_group);

        if let Some(props) = extension.properties {
            state.set_opt("publisher", props.publisher);
            state.set_opt("type", props.type_);
            state.set_opt("type_handler_version", props.type_handler_version);
            state.set_opt("auto_upgrade_minor_version", props.auto_upgrade_minor_version);

            if let Some(settings) = props.settings {
                state.set("settings", flatten_json("settings", &settings)?);
            }
        }

        if let Some(remote_tags) = extension.tags {
            state.set("tags", tags::flatten(&remote_tags));
        }

        Ok(())
    }

    async fn delete(&self, state: &mut ResourceState, ctx: &ProviderContext) -> Result<()> {
        let Some(raw_id) = state.id().map(str::to_string) else {
            return Ok(());
        };
        let id = ResourceId::parse(&raw_id)?;
        let resource_group = id.resource_group.clone();
        let vm_name = id.require_segment("virtualMachines")?.to_string();
        let name = id.require_segment("extensions")?.to_string();

        let context = || {
            format!(
                "deleting Virtual Machine Extension '{name}' (Virtual Machine '{vm_name}' / Resource Group '{resource_group}')"
            )
        };

        let operation = ctx
            .client
            .virtual_machine_extensions
            .delete(&resource_group, &vm_name, &name)
            .await
            .map_err(|err| Error::api(context(), err))?;
        operation
            .wait(&ctx.cancel)
            .await
            .map_err(|err| Error::api(context(), err))?;

        Ok(())
    }
}
