//! Status conditions.
//!
//! Conditions are kept as a list that holds at most one entry per
//! [`ConditionType`]. Helpers in this module never mutate in place; they
//! return the updated list.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Kind of condition carried in an object's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionType {
    /// Downstream readiness of a `MasterUserRecord` or `Space`.
    Ready,
    /// Progress of a `TemplateUpdateRequest`.
    Complete,
}

impl ConditionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionType::Ready => "Ready",
            ConditionType::Complete => "Complete",
        }
    }
}

impl std::fmt::Display for ConditionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// A single status condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub status: ConditionStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_transition_time: OffsetDateTime,
}

impl Condition {
    pub fn new(condition_type: ConditionType, status: ConditionStatus) -> Self {
        Self {
            condition_type,
            status,
            reason: String::new(),
            message: None,
            last_transition_time: OffsetDateTime::now_utc(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }

    /// Same status, reason and message, ignoring the transition time.
    pub fn same_state(&self, other: &Condition) -> bool {
        self.condition_type == other.condition_type
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// Returns `conditions` with `new` merged in by type.
///
/// An existing condition of the same type is replaced in place. When its
/// status, reason and message are unchanged the previous transition time is
/// kept, so re-applying the same condition yields an identical list.
pub fn add_or_update(conditions: &[Condition], new: Condition) -> Vec<Condition> {
    let mut result = conditions.to_vec();
    match result
        .iter_mut()
        .find(|c| c.condition_type == new.condition_type)
    {
        Some(existing) => {
            if !existing.same_state(&new) {
                *existing = new;
            }
        }
        None => result.push(new),
    }
    result
}

pub fn find(conditions: &[Condition], condition_type: ConditionType) -> Option<&Condition> {
    conditions
        .iter()
        .find(|c| c.condition_type == condition_type)
}

/// Whether a condition of the given type exists with status `True`.
pub fn is_true(conditions: &[Condition], condition_type: ConditionType) -> bool {
    find(conditions, condition_type).is_some_and(Condition::is_true)
}

/// Number of conditions matching type, status and reason.
pub fn count(
    conditions: &[Condition],
    condition_type: ConditionType,
    status: ConditionStatus,
    reason: &str,
) -> usize {
    conditions
        .iter()
        .filter(|c| c.condition_type == condition_type && c.status == status && c.reason == reason)
        .count()
}
