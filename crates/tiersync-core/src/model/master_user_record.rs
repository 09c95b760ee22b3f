use serde::{Deserialize, Serialize};

use crate::condition::{self, Condition, ConditionType};
use crate::meta::{ObjectMeta, Resource};
use crate::tier::NSTemplateSetSpec;

/// Account-style target: one user's accounts across target clusters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterUserRecord {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: MasterUserRecordSpec,
    #[serde(default)]
    pub status: MasterUserRecordStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterUserRecordSpec {
    #[serde(default)]
    pub user_accounts: Vec<UserAccountEmbedded>,
}

/// The account of a user on one target cluster.
///
/// `sync_index` is advanced downstream whenever the account's templates are
/// re-applied on that cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccountEmbedded {
    pub target_cluster: String,
    #[serde(default)]
    pub sync_index: String,
    #[serde(default)]
    pub spec: UserAccountSpecEmbedded,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccountSpecEmbedded {
    #[serde(default, rename = "nsTemplateSet", skip_serializing_if = "Option::is_none")]
    pub nstemplate_set: Option<NSTemplateSetSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterUserRecordStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl MasterUserRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::named(name),
            spec: MasterUserRecordSpec::default(),
            status: MasterUserRecordStatus::default(),
        }
    }

    pub fn with_account(mut self, account: UserAccountEmbedded) -> Self {
        self.spec.user_accounts.push(account);
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.status.conditions = condition::add_or_update(&self.status.conditions, condition);
        self
    }

    pub fn is_ready(&self) -> bool {
        condition::is_true(&self.status.conditions, ConditionType::Ready)
    }
}

impl UserAccountEmbedded {
    pub fn new(
        target_cluster: impl Into<String>,
        sync_index: impl Into<String>,
        nstemplate_set: NSTemplateSetSpec,
    ) -> Self {
        Self {
            target_cluster: target_cluster.into(),
            sync_index: sync_index.into(),
            spec: UserAccountSpecEmbedded {
                nstemplate_set: Some(nstemplate_set),
            },
        }
    }

    /// Tier the account is provisioned with, if it has a template set.
    pub fn tier_name(&self) -> Option<&str> {
        self.spec
            .nstemplate_set
            .as_ref()
            .map(|set| set.tier_name.as_str())
    }
}

impl Resource for MasterUserRecord {
    const KIND: &'static str = "MasterUserRecord";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}
