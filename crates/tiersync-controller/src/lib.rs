//! Controller propagating tier template updates.
//!
//! A `TemplateUpdateRequest` is created for every identity affected by a tier
//! template change. The [`reconcile::Reconciler`] drives the identity's
//! `MasterUserRecord` or `Space` to the new templates and records the outcome
//! in the request's `Complete` condition. The [`controller::Controller`] feeds
//! it from store change events through a per-identity [`queue::WorkQueue`].

pub mod config;
pub mod controller;
pub mod observability;
pub mod queue;
pub mod reconcile;

pub use config::{AppConfig, ControllerSettings, LoggingConfig};
pub use controller::{Controller, event_key};
pub use queue::WorkQueue;
pub use reconcile::{Action, MutationError, ReconcileError, Reconciler, RequestCondition};
