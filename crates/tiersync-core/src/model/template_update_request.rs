use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::condition::{self, Condition, ConditionType};
use crate::meta::{ObjectMeta, Resource};
use crate::tier::{NSTemplateSetClusterResources, NSTemplateSetNamespace};

/// Request to roll a new tier template out to one identity.
///
/// The request has the same name as the `MasterUserRecord` or `Space` it drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateUpdateRequest {
    pub metadata: ObjectMeta,
    pub spec: TemplateUpdateRequestSpec,
    #[serde(default)]
    pub status: TemplateUpdateRequestStatus,
}

/// Which kind of entity a request drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum UpdateTarget {
    /// A `MasterUserRecord`: templates are rewritten by the controller and
    /// convergence is tracked through per-cluster sync indexes.
    Account,
    /// A `Space`: the rollout is complete once its tier hash label moves away
    /// from `current_tier_hash`.
    Workspace {
        #[serde(rename = "currentTierHash")]
        current_tier_hash: String,
    },
}

impl UpdateTarget {
    /// Maps the legacy optional `currentTierHash` field: a non-empty hash
    /// selects a workspace, anything else an account.
    pub fn from_current_tier_hash(current_tier_hash: Option<String>) -> Self {
        match current_tier_hash {
            Some(hash) if !hash.is_empty() => UpdateTarget::Workspace {
                current_tier_hash: hash,
            },
            _ => UpdateTarget::Account,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            UpdateTarget::Account => "MasterUserRecord",
            UpdateTarget::Workspace { .. } => "Space",
        }
    }
}

/// Requests written without `target` carry the legacy `currentTierHash`
/// field instead; it is mapped to an [`UpdateTarget`] when decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredSpec")]
pub struct TemplateUpdateRequestSpec {
    pub tier_name: String,
    pub target: UpdateTarget,
    #[serde(default)]
    pub namespaces: Vec<NSTemplateSetNamespace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_resources: Option<NSTemplateSetClusterResources>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSpec {
    tier_name: String,
    #[serde(default)]
    target: Option<UpdateTarget>,
    #[serde(default)]
    current_tier_hash: Option<String>,
    #[serde(default)]
    namespaces: Vec<NSTemplateSetNamespace>,
    #[serde(default)]
    cluster_resources: Option<NSTemplateSetClusterResources>,
}

impl From<StoredSpec> for TemplateUpdateRequestSpec {
    fn from(stored: StoredSpec) -> Self {
        let target = stored
            .target
            .unwrap_or_else(|| UpdateTarget::from_current_tier_hash(stored.current_tier_hash));
        Self {
            tier_name: stored.tier_name,
            target,
            namespaces: stored.namespaces,
            cluster_resources: stored.cluster_resources,
        }
    }
}

impl TemplateUpdateRequestSpec {
    pub fn new(tier_name: impl Into<String>, target: UpdateTarget) -> Self {
        Self {
            tier_name: tier_name.into(),
            target,
            namespaces: Vec::new(),
            cluster_resources: None,
        }
    }

    pub fn for_account(tier_name: impl Into<String>) -> Self {
        Self::new(tier_name, UpdateTarget::Account)
    }

    pub fn for_workspace(tier_name: impl Into<String>, current_tier_hash: impl Into<String>) -> Self {
        Self::new(
            tier_name,
            UpdateTarget::Workspace {
                current_tier_hash: current_tier_hash.into(),
            },
        )
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

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateUpdateRequestStatus {
    /// Sync index per target cluster captured before the target was mutated.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sync_indexes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// Number of failures recorded so far. Never reset.
    #[serde(default)]
    pub failure_count: u32,
}

impl TemplateUpdateRequest {
    pub fn new(name: impl Into<String>, spec: TemplateUpdateRequestSpec) -> Self {
        Self {
            metadata: ObjectMeta::named(name),
            spec,
            status: TemplateUpdateRequestStatus::default(),
        }
    }

    /// The current `Complete` condition, if any.
    pub fn complete_condition(&self) -> Option<&Condition> {
        condition::find(&self.status.conditions, ConditionType::Complete)
    }

    pub fn is_complete(&self) -> bool {
        condition::is_true(&self.status.conditions, ConditionType::Complete)
    }
}

impl Resource for TemplateUpdateRequest {
    const KIND: &'static str = "TemplateUpdateRequest";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}
