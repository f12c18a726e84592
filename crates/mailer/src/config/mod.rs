//! Configuration snapshot.
//!
//! # Data Flow
//! ```text
//! config.toml
//!     → loader.rs (locate, read, parse)
//!     → validation.rs (semantic checks)
//!     → MailerConfig (immutable)
//!     → shared via Arc by every subsystem
//! ```
//!
//! # Design Decisions
//! - Loaded once, before logging or any subsystem exists; never mutated afterwards
//! - Every field has a default, so a minimal file only names what differs
//! - Validation covers values no subsystem could work with; reachability-style checks
//!   (unsupported store URL, empty SMTP host) belong to the subsystem constructors

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_standard_locations, parse_config, ConfigError};
pub use schema::*;
pub use validation::ValidationError;
