use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Type of object change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectEventType {
    Created,
    Updated,
    Deleted,
}

impl ObjectEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectEventType::Created => "created",
            ObjectEventType::Updated => "updated",
            ObjectEventType::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ObjectEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event describing a change to a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEvent {
    pub event_type: ObjectEventType,
    /// Object kind (e.g. "TemplateUpdateRequest", "MasterUserRecord")
    pub kind: String,
    pub name: String,
    /// Generation after the change
    pub generation: i64,
    /// Generation before the change, for updates
    pub previous_generation: Option<i64>,
    pub resource_version: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl ObjectEvent {
    pub fn new(
        event_type: ObjectEventType,
        kind: impl Into<String>,
        name: impl Into<String>,
        generation: i64,
    ) -> Self {
        Self {
            event_type,
            kind: kind.into(),
            name: name.into(),
            generation,
            previous_generation: None,
            resource_version: None,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    pub fn created(kind: impl Into<String>, name: impl Into<String>, generation: i64) -> Self {
        Self::new(ObjectEventType::Created, kind, name, generation)
    }

    pub fn updated(
        kind: impl Into<String>,
        name: impl Into<String>,
        previous_generation: i64,
        generation: i64,
    ) -> Self {
        let mut event = Self::new(ObjectEventType::Updated, kind, name, generation);
        event.previous_generation = Some(previous_generation);
        event
    }

    pub fn deleted(kind: impl Into<String>, name: impl Into<String>, generation: i64) -> Self {
        Self::new(ObjectEventType::Deleted, kind, name, generation)
    }

    pub fn with_resource_version(mut self, resource_version: impl Into<String>) -> Self {
        self.resource_version = Some(resource_version.into());
        self
    }

    /// Whether the event carries a spec change.
    ///
    /// Creations and deletions always count; updates only when the generation moved.
    pub fn generation_changed(&self) -> bool {
        match self.event_type {
            ObjectEventType::Created | ObjectEventType::Deleted => true,
            ObjectEventType::Updated => self.previous_generation != Some(self.generation),
        }
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind == kind
    }
}
