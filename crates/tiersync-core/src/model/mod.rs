//! Persisted objects driven or observed by the controller.

mod master_user_record;
mod space;
mod template_update_request;

pub use master_user_record::{
    MasterUserRecord, MasterUserRecordSpec, MasterUserRecordStatus, UserAccountEmbedded,
    UserAccountSpecEmbedded,
};
pub use space::{Space, SpaceSpec, SpaceStatus};
pub use template_update_request::{
    TemplateUpdateRequest, TemplateUpdateRequestSpec, TemplateUpdateRequestStatus, UpdateTarget,
};
