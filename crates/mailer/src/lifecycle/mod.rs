//! # Lifecycle
//!
//! Wires the mail service's subsystems into the lifecycle framework:
//!
//! - [`MailerSystem::boot`] is the dependency chain (store → transport → renderer →
//!   processor → campaign coordinator).
//! - [`MailerSystem::run`] races termination signals against the command surface, then
//!   executes [`teardown_plan`] in reverse dependency order.

pub mod mailer_system;

pub use mailer_system::{teardown_plan, MailerSystem, APP_VERSION, TEARDOWN_STEPS};
