//! # Mailer
//!
//! A mail service built from independently owned subsystems, started in dependency
//! order and torn down in reverse under one shutdown deadline.
//!
//! ## Modules
//!
//! - [`config`] - immutable configuration snapshot loaded from TOML
//! - [`store`] - message store, run as an actor
//! - [`transport`] - pooled outbound SMTP delivery
//! - [`render`] - named `{{placeholder}}` templates
//! - [`templates`] - best-effort template directory loader
//! - [`processor`] - delivery queue and worker
//! - [`campaign`] - recipient fan-out on top of the processor
//! - [`cli`] - interactive command surface, the primary workload
//! - [`lifecycle`] - dependency chain and teardown plan
//!
//! ## Startup and shutdown
//!
//! ```text
//! boot:     store → transport → renderer → processor (start) → campaign coordinator
//! run:      signal ⟷ command surface (first one wins)
//! shutdown: stop processor → close campaign coordinator → close transport → close store
//! ```

pub mod campaign;
pub mod cli;
pub mod config;
pub mod lifecycle;
pub mod processor;
pub mod render;
pub mod store;
pub mod templates;
pub mod transport;

pub use lifecycle::{teardown_plan, MailerSystem, APP_VERSION};
