//! Composite resource identifier parsing and construction.
//!
//! ARM addresses every object with a hierarchical path of the form
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}/...`
//! where parent/child resources append further `{type}/{name}` pairs. The
//! codec consumes and produces this form verbatim; it never invents its own
//! scheme. Parsing yields an ordered segment map so nested parent/child
//! pairs keep their positions.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// A parsed composite resource identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    /// Subscription the resource lives in.
    pub subscription_id: String,
    /// Resource group the resource lives in.
    pub resource_group: String,
    /// Provider namespace, e.g. `Microsoft.Compute`.
    pub provider: Option<String>,
    path: IndexMap<String, String>,
}

impl ResourceId {
    /// Parses a composite identifier string.
    ///
    /// Fails with a structured error naming the missing component when the
    /// identifier is not well formed.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim_start_matches('/').trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(Error::parse_id(raw, "id is empty"));
        }

        let components: Vec<&str> = trimmed.split('/').collect();
        if components.len() % 2 != 0 {
            return Err(Error::parse_id(
                raw,
                "the number of path segments is not divisible by two",
            ));
        }

        let mut subscription_id = None;
        let mut resource_group = None;
        let mut provider = None;
        let mut path = IndexMap::new();

        for pair in components.chunks(2) {
            let (key, value) = (pair[0], pair[1]);
            if key.is_empty() || value.is_empty() {
                return Err(Error::parse_id(
                    raw,
                    format!("found an empty segment in '{key}/{value}'"),
                ));
            }
            match key {
                "subscriptions" => subscription_id = Some(value.to_string()),
                "resourceGroups" => resource_group = Some(value.to_string()),
                "providers" => provider = Some(value.to_string()),
                _ => {
                    path.insert(key.to_string(), value.to_string());
                }
            }
        }

        let subscription_id = subscription_id
            .ok_or_else(|| Error::parse_id(raw, "no 'subscriptions' segment was found"))?;
        let resource_group = resource_group
            .ok_or_else(|| Error::parse_id(raw, "no 'resourceGroups' segment was found"))?;

        Ok(Self {
            subscription_id,
            resource_group,
            provider,
            path,
        })
    }

    /// The value of a path segment, if present.
    pub fn segment(&self, name: &str) -> Option<&str> {
        self.path.get(name).map(String::as_str)
    }

    /// The value of a path segment, or a structured parse error naming it.
    pub fn require_segment(&self, name: &str) -> Result<&str> {
        self.segment(name)
            .ok_or_else(|| Error::parse_id(self.to_string(), format!("id does not contain '{name}'")))
    }

    /// Path segment pairs in their original order, excluding the
    /// subscription, resource group and provider components.
    pub fn segments(&self) -> impl Iterator<Item = (&str, &str)> {
        self.path.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, self.resource_group
        )?;
        if let Some(provider) = &self.provider {
            write!(f, "/providers/{provider}")?;
        }
        for (key, value) in &self.path {
            write!(f, "/{key}/{value}")?;
        }
        Ok(())
    }
}

impl FromStr for ResourceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTENSION_ID: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/my-rg/providers/Microsoft.Compute/virtualMachines/vm1/extensions/ext1";

    #[test]
    fn test_parse_nested_child_id() {
        let id = ResourceId::parse(EXTENSION_ID).unwrap();
        assert_eq!(id.subscription_id, "00000000-0000-0000-0000-000000000000");
        assert_eq!(id.resource_group, "my-rg");
        assert_eq!(id.provider.as_deref(), Some("Microsoft.Compute"));
        assert_eq!(id.segment("virtualMachines"), Some("vm1"));
        assert_eq!(id.segment("extensions"), Some("ext1"));
    }

    #[test]
    fn test_display_round_trips_verbatim() {
        let id = ResourceId::parse(EXTENSION_ID).unwrap();
        assert_eq!(id.to_string(), EXTENSION_ID);
    }

    #[test]
    fn test_segment_order_is_preserved() {
        let id = ResourceId::parse(EXTENSION_ID).unwrap();
        let pairs: Vec<_> = id.segments().collect();
        assert_eq!(
            pairs,
            vec![("virtualMachines", "vm1"), ("extensions", "ext1")]
        );
    }

    #[test]
    fn test_missing_subscriptions_segment() {
        let err = ResourceId::parse("/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm")
            .unwrap_err();
        assert!(err.to_string().contains("subscriptions"));
    }

    #[test]
    fn test_missing_resource_group_segment() {
        let err = ResourceId::parse("/subscriptions/0000").unwrap_err();
        assert!(err.to_string().contains("resourceGroups"));
    }

    #[test]
    fn test_odd_segment_count_rejected() {
        let err = ResourceId::parse("/subscriptions/0000/resourceGroups/rg/providers").unwrap_err();
        assert!(err.to_string().contains("not divisible"));
    }

    #[test]
    fn test_empty_segment_value_rejected() {
        let err = ResourceId::parse("/subscriptions//resourceGroups/rg").unwrap_err();
        assert!(matches!(err, Error::ParseId { .. }));
    }

    #[test]
    fn test_require_segment_names_the_missing_pair() {
        let id = ResourceId::parse("/subscriptions/0/resourceGroups/rg/providers/Microsoft.DataFactory/factories/df")
            .unwrap();
        let err = id.require_segment("integrationruntimes").unwrap_err();
        assert!(err.to_string().contains("integrationruntimes"));
    }
}
