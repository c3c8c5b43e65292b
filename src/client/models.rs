//! Typed request/response payloads for the management API.
//!
//! Wire shapes follow the service's camelCase JSON. JSON-blob fields
//! (`settings`, `policyRule`, ...) stay `serde_json::Value` here; the
//! handlers flatten them to strings at the configuration boundary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Virtual Machine Extensions
// ============================================================================

/// A virtual machine extension resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineExtension {
    /// Composite identifier, assigned by the service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Extension name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Region the extension lives in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Resource tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    /// Extension properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<VirtualMachineExtensionProperties>,
}

/// Properties of a virtual machine extension.
///
/// `protected_settings` is write-only: it is accepted on create/update and
/// never returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineExtensionProperties {
    /// Extension publisher, e.g. `Microsoft.Azure.Extensions`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// Extension type, e.g. `CustomScript`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    /// Version of the type handler.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_handler_version: Option<String>,
    /// Whether minor version upgrades are applied automatically.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_upgrade_minor_version: Option<bool>,
    /// Public settings blob.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
    /// Protected settings blob; never returned by the service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protected_settings: Option<Value>,
}

// ============================================================================
// Data Factory Integration Runtimes
// ============================================================================

/// An integration runtime resource envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationRuntimeResource {
    /// Composite identifier, assigned by the service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Runtime name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Variant-typed runtime properties.
    pub properties: IntegrationRuntime,
}

/// The two integration runtime shapes, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IntegrationRuntime {
    /// A runtime hosted on customer infrastructure. Exposes two generated
    /// authentication keys, fetched through a separate call.
    SelfHosted {
        /// Free-form description.
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// An Azure-managed runtime with dedicated compute.
    Managed {
        /// Free-form description.
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        /// Compute shape of the managed nodes.
        #[serde(
            rename = "computeProperties",
            skip_serializing_if = "Option::is_none"
        )]
        compute: Option<IntegrationRuntimeComputeProperties>,
    },
}

impl IntegrationRuntime {
    /// The discriminator value as configuration spells it.
    pub fn type_name(&self) -> &'static str {
        match self {
            IntegrationRuntime::SelfHosted { .. } => "SelfHosted",
            IntegrationRuntime::Managed { .. } => "Managed",
        }
    }

    /// The description regardless of variant.
    pub fn description(&self) -> Option<&str> {
        match self {
            IntegrationRuntime::SelfHosted { description }
            | IntegrationRuntime::Managed { description, .. } => description.as_deref(),
        }
    }
}

/// Compute shape of a managed integration runtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationRuntimeComputeProperties {
    /// Region the compute runs in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Node SKU, e.g. `Standard_D8_v3`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_size: Option<String>,
    /// Number of nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_nodes: Option<i32>,
    /// Maximum parallel executions per node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_parallel_executions_per_node: Option<i32>,
    /// Optional virtual network attachment.
    #[serde(rename = "vNetProperties", skip_serializing_if = "Option::is_none")]
    pub vnet: Option<IntegrationRuntimeVnetProperties>,
}

/// Virtual network attachment of a managed integration runtime. Both
/// fields are present together or the attachment is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationRuntimeVnetProperties {
    /// Identifier of the virtual network.
    #[serde(rename = "vNetId")]
    pub vnet_id: String,
    /// Name of the subnet inside the virtual network.
    pub subnet: String,
}

/// The generated authentication keys of a self-hosted runtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationRuntimeAuthKeys {
    /// Primary key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_key_1: Option<String>,
    /// Secondary key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_key_2: Option<String>,
}

// ============================================================================
// Policy Definitions
// ============================================================================

/// A policy definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDefinition {
    /// Composite identifier, assigned by the service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Definition name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Definition properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<PolicyDefinitionProperties>,
}

/// Properties of a policy definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDefinitionProperties {
    /// How the definition was authored: `BuiltIn`, `Custom`, ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_type: Option<String>,
    /// Evaluation mode, e.g. `Indexed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Human-readable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Management group the definition is scoped to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub management_group_id: Option<String>,
    /// The policy rule blob.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_rule: Option<Value>,
    /// Metadata blob.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Parameters blob.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}
