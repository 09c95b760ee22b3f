use serde::{Deserialize, Serialize};

use crate::condition::{self, Condition, ConditionType};
use crate::meta::{ObjectMeta, Resource};
use crate::tier::tier_hash_label_key;

/// Workspace-style target. The currently applied template hash of its tier
/// is published in the tier hash label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: SpaceSpec,
    #[serde(default)]
    pub status: SpaceStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceSpec {
    pub tier_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_cluster: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl Space {
    pub fn new(name: impl Into<String>, tier_name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::named(name),
            spec: SpaceSpec {
                tier_name: tier_name.into(),
                target_cluster: String::new(),
            },
            status: SpaceStatus::default(),
        }
    }

    /// Sets the tier hash label for the space's own tier.
    pub fn with_tier_hash(mut self, hash: impl Into<String>) -> Self {
        let key = tier_hash_label_key(&self.spec.tier_name);
        self.metadata.labels.insert(key, hash.into());
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.status.conditions = condition::add_or_update(&self.status.conditions, condition);
        self
    }

    /// Template hash currently applied for the space's tier.
    pub fn tier_hash(&self) -> Option<&str> {
        self.metadata
            .label(&tier_hash_label_key(&self.spec.tier_name))
    }

    pub fn is_ready(&self) -> bool {
        condition::is_true(&self.status.conditions, ConditionType::Ready)
    }
}

impl Resource for Space {
    const KIND: &'static str = "Space";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}
