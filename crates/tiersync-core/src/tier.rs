//! Namespace template sets and tier hashing.
//!
//! Namespace template references follow the `<tier>-<type>-<hash>` format,
//! e.g. `base-dev-4a8b1c2`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CoreError, Result};

/// Domain prefix of the per-tier hash labels.
pub const TIER_LABEL_DOMAIN: &str = "tiersync.dev";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NSTemplateSetNamespace {
    pub template_ref: String,
}

impl NSTemplateSetNamespace {
    pub fn new(template_ref: impl Into<String>) -> Self {
        Self {
            template_ref: template_ref.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NSTemplateSetClusterResources {
    pub template_ref: String,
}

impl NSTemplateSetClusterResources {
    pub fn new(template_ref: impl Into<String>) -> Self {
        Self {
            template_ref: template_ref.into(),
        }
    }
}

/// The templates an account is provisioned with on one target cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NSTemplateSetSpec {
    pub tier_name: String,
    #[serde(default)]
    pub namespaces: Vec<NSTemplateSetNamespace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_resources: Option<NSTemplateSetClusterResources>,
}

impl NSTemplateSetSpec {
    pub fn new(tier_name: impl Into<String>) -> Self {
        Self {
            tier_name: tier_name.into(),
            ..Self::default()
        }
    }

    pub fn with_namespaces<I, S>(mut self, refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces = refs.into_iter().map(NSTemplateSetNamespace::new).collect();
        self
    }

    pub fn with_cluster_resources(mut self, template_ref: impl Into<String>) -> Self {
        self.cluster_resources = Some(NSTemplateSetClusterResources::new(template_ref));
        self
    }
}

/// Extracts the namespace type (second `-`-separated field) from a template ref.
pub fn namespace_type(template_ref: &str) -> Result<&str> {
    match template_ref.split('-').nth(1) {
        Some(t) if !t.is_empty() => Ok(t),
        _ => Err(CoreError::invalid_template_ref(template_ref)),
    }
}

/// Label under which the template hash of `tier_name` is stored.
pub fn tier_hash_label_key(tier_name: &str) -> String {
    format!("{TIER_LABEL_DOMAIN}/{tier_name}-tier-hash")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateRefs<'a> {
    namespaces: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cluster_resources: Option<&'a str>,
}

/// Computes the hex-encoded SHA-256 of a template set's references.
///
/// Namespace refs are sorted first, so the hash does not depend on their order.
pub fn compute_template_hash(spec: &NSTemplateSetSpec) -> Result<String> {
    let mut namespaces: Vec<&str> = spec
        .namespaces
        .iter()
        .map(|ns| ns.template_ref.as_str())
        .collect();
    namespaces.sort_unstable();

    let refs = TemplateRefs {
        namespaces,
        cluster_resources: spec
            .cluster_resources
            .as_ref()
            .map(|cr| cr.template_ref.as_str()),
    };
    let bytes = serde_json::to_vec(&refs)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_type() {
        assert_eq!(namespace_type("base-dev-123abc").unwrap(), "dev");
        assert_eq!(namespace_type("base-stage-123abc").unwrap(), "stage");
        assert_eq!(namespace_type("advanced-code").unwrap(), "code");
    }

    #[test]
    fn test_namespace_type_malformed() {
        assert!(matches!(
            namespace_type("nodashes"),
            Err(CoreError::InvalidTemplateRef { .. })
        ));
        assert!(namespace_type("base--123").is_err());
        assert!(namespace_type("").is_err());
    }

    #[test]
    fn test_tier_hash_label_key() {
        assert_eq!(tier_hash_label_key("base"), "tiersync.dev/base-tier-hash");
    }

    #[test]
    fn test_hash_ignores_namespace_order() {
        let a = NSTemplateSetSpec::new("base")
            .with_namespaces(["base-dev-1", "base-stage-2"])
            .with_cluster_resources("base-clusterresources-3");
        let b = NSTemplateSetSpec::new("base")
            .with_namespaces(["base-stage-2", "base-dev-1"])
            .with_cluster_resources("base-clusterresources-3");
        assert_eq!(compute_template_hash(&a).unwrap(), compute_template_hash(&b).unwrap());
    }

    #[test]
    fn test_hash_changes_with_refs() {
        let a = NSTemplateSetSpec::new("base").with_namespaces(["base-dev-1"]);
        let b = NSTemplateSetSpec::new("base").with_namespaces(["base-dev-2"]);
        let c = a.clone().with_cluster_resources("base-clusterresources-1");

        let ha = compute_template_hash(&a).unwrap();
        assert_eq!(ha.len(), 64);
        assert_ne!(ha, compute_template_hash(&b).unwrap());
        assert_ne!(ha, compute_template_hash(&c).unwrap());
    }
}
