//! Policy definition data source.
//!
//! Looks up an existing policy definition by name and exposes its
//! properties, including the policy rule, metadata and parameters blobs as
//! JSON strings. Read-only: unlike a resource read, a missing definition
//! is an error here, because configuration referenced something that must
//! exist.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::resources::{flatten_json, DataSource, ProviderContext};
use crate::schema::{validators, Attribute, Schema};
use crate::state::ResourceState;

const TYPE_NAME: &str = "azure_policy_definition";

/// Handler for the `azure_policy_definition` data source.
pub struct PolicyDefinitionDataSource;

#[async_trait]
impl DataSource for PolicyDefinitionDataSource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attribute(
                "name",
                Attribute::string().required().validator(validators::non_empty()),
            )
            .attribute("policy_type", Attribute::string().computed())
            .attribute("mode", Attribute::string().computed())
            .attribute("management_group_id", Attribute::string().computed())
            .attribute("display_name", Attribute::string().computed())
            .attribute("description", Attribute::string().computed())
            .attribute("policy_rule", Attribute::string().computed())
            .attribute("metadata", Attribute::string().computed())
            .attribute("parameters", Attribute::string().computed())
    }

    async fn read(&self, state: &mut ResourceState, ctx: &ProviderContext) -> Result<()> {
        let name = state.get_string_required("name")?;

        let definition = match ctx.client.policy_definitions.get(&name).await {
            Ok(definition) => definition,
            Err(err) if err.is_not_found() => {
                return Err(Error::NotFound {
                    resource_type: "Policy Definition".to_string(),
                    name,
                });
            }
            Err(err) => {
                return Err(Error::api(
                    format!("reading Policy Definition '{name}'"),
                    err,
                ));
            }
        };

        let id = definition.id.filter(|id| !id.is_empty()).ok_or_else(|| {
            Error::missing_remote_id(format!("Policy Definition '{name}'"))
        })?;
        state.set_id(id);

        if let Some(props) = definition.properties {
            state.set_opt("policy_type", props.policy_type);
            state.set_opt("mode", props.mode);
            state.set_opt("display_name", props.display_name);
            state.set_opt("description", props.description);
            state.set_opt("management_group_id", props.management_group_id);

            if let Some(policy_rule) = props.policy_rule {
                state.set("policy_rule", flatten_json("policy_rule", &policy_rule)?);
            }
            if let Some(metadata) = props.metadata {
                state.set("metadata", flatten_json("metadata", &metadata)?);
            }
            if let Some(parameters) = props.parameters {
                state.set("parameters", flatten_json("parameters", &parameters)?);
            }
        }

        Ok(())
    }
}
