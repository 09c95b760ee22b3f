//! Status conditions written on a `TemplateUpdateRequest`.
//!
//! A request carries a single `Complete` condition. Its shape is one of
//! [`RequestCondition`]; failures are additionally counted in
//! `status.failure_count`, which is never reset.

use std::collections::BTreeMap;

use tiersync_core::condition;
use tiersync_core::{Condition, ConditionStatus, ConditionType, TemplateUpdateRequestStatus};

/// `Complete=False`: the rollout is in progress.
pub const REASON_UPDATING: &str = "Updating";
/// `Complete=False`: the rollout failed, message holds the error.
pub const REASON_UNABLE_TO_UPDATE: &str = "UnableToUpdate";
/// `Complete=True`: the rollout is done.
pub const REASON_UPDATED: &str = "Updated";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestCondition {
    Updating,
    Failed(String),
    Complete,
}

impl RequestCondition {
    pub fn to_condition(&self) -> Condition {
        match self {
            Self::Updating => Condition::new(ConditionType::Complete, ConditionStatus::False)
                .with_reason(REASON_UPDATING),
            Self::Failed(message) => Condition::new(ConditionType::Complete, ConditionStatus::False)
                .with_reason(REASON_UNABLE_TO_UPDATE)
                .with_message(message.clone()),
            Self::Complete => Condition::new(ConditionType::Complete, ConditionStatus::True)
                .with_reason(REASON_UPDATED),
        }
    }

    /// Reads the shape back from a stored condition.
    pub fn from_condition(condition: &Condition) -> Option<Self> {
        if condition.condition_type != ConditionType::Complete {
            return None;
        }
        match (condition.status, condition.reason.as_str()) {
            (ConditionStatus::True, _) => Some(Self::Complete),
            (ConditionStatus::False, REASON_UNABLE_TO_UPDATE) => Some(Self::Failed(
                condition.message.clone().unwrap_or_default(),
            )),
            (ConditionStatus::False, _) => Some(Self::Updating),
            (ConditionStatus::Unknown, _) => None,
        }
    }
}

fn set(status: &mut TemplateUpdateRequestStatus, condition: RequestCondition) {
    status.conditions = condition::add_or_update(&status.conditions, condition.to_condition());
}

/// Sets `Updating` and replaces the sync index baseline.
pub fn mark_updating(status: &mut TemplateUpdateRequestStatus, sync_indexes: BTreeMap<String, String>) {
    status.sync_indexes = sync_indexes;
    set(status, RequestCondition::Updating);
}

/// Sets `Failed` and counts the failure.
pub fn mark_failed(status: &mut TemplateUpdateRequestStatus, message: impl Into<String>) {
    status.failure_count = status.failure_count.saturating_add(1);
    set(status, RequestCondition::Failed(message.into()));
}

pub fn mark_complete(status: &mut TemplateUpdateRequestStatus) {
    set(status, RequestCondition::Complete);
}

/// Whether enough failures were recorded to abandon the request.
pub fn failure_threshold_reached(status: &TemplateUpdateRequestStatus, threshold: u32) -> bool {
    status.failure_count >= threshold
}

/// The request's current condition shape, if any.
pub fn current(status: &TemplateUpdateRequestStatus) -> Option<RequestCondition> {
    condition::find(&status.conditions, ConditionType::Complete)
        .and_then(RequestCondition::from_condition)
}
