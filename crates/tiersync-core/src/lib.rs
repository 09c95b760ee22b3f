//! Core types shared by the tiersync crates.
//!
//! - [`model`]: the persisted objects (`TemplateUpdateRequest`, `MasterUserRecord`, `Space`)
//! - [`condition`]: status condition helpers (merge by type, count, predicates)
//! - [`tier`]: namespace template sets, tier hash labels and template hashing
//! - [`events`]: object change notifications

pub mod condition;
pub mod error;
pub mod events;
pub mod meta;
pub mod model;
pub mod tier;

pub use condition::{Condition, ConditionStatus, ConditionType};
pub use error::{CoreError, Result};
pub use meta::{ObjectMeta, Resource};
pub use model::{
    MasterUserRecord, Space, TemplateUpdateRequest, TemplateUpdateRequestSpec,
    TemplateUpdateRequestStatus, UpdateTarget, UserAccountEmbedded,
};
pub use tier::{
    NSTemplateSetClusterResources, NSTemplateSetNamespace, NSTemplateSetSpec,
    compute_template_hash, namespace_type, tier_hash_label_key,
};
