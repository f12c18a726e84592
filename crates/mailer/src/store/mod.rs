//! # Store
//!
//! The persistent message store, run as an actor: [`Database`] is the cloneable client,
//! [`StoreActor`](actor::StoreActor) owns the records.
//!
//! Only the `memory://` backend exists; anything else is rejected at construction.
//!
//! ```rust
//! use mailer::config::DatabaseConfig;
//! use mailer::store::{Database, MessageCreate};
//!
//! #[tokio::main]
//! async fn main() {
//!     let db = Database::connect(&DatabaseConfig::default()).unwrap();
//!     let id = db
//!         .insert(MessageCreate {
//!             recipient: "alice@example.com".into(),
//!             template: "welcome".into(),
//!             variables: Default::default(),
//!             campaign: None,
//!         })
//!         .await
//!         .unwrap();
//!     assert_eq!(db.stats().await.unwrap().queued, 1);
//!     assert!(db.get(id).await.unwrap().is_some());
//! }
//! ```

pub mod actor;
pub mod error;
pub mod message;
pub mod model;

pub use error::StoreError;
pub use model::*;

use crate::config::DatabaseConfig;
use actor::StoreActor;
use async_trait::async_trait;
use lifecycle_framework::{BoxError, ShutdownContext, Subsystem};
use message::StoreRequest;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, instrument};

/// Client handle to the store actor.
#[derive(Debug, Clone)]
pub struct Database {
    sender: mpsc::Sender<StoreRequest>,
    name: String,
}

impl Database {
    /// Validate the connection parameters and spawn the store actor.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let name = config
            .url
            .strip_prefix("memory://")
            .filter(|name| !name.is_empty())
            .ok_or_else(|| StoreError::UnsupportedUrl(config.url.clone()))?
            .to_string();
        if config.max_connections == 0 {
            return Err(StoreError::NoConnections);
        }

        let (sender, receiver) = mpsc::channel(config.queue_depth.max(1));
        tokio::spawn(StoreActor::new(name.clone(), receiver).run());
        info!(store = %name, max_connections = config.max_connections, "Store connected");

        Ok(Self { sender, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(message::Response<T>) -> StoreRequest,
    ) -> Result<T, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| StoreError::Closed)?;
        response.await.map_err(|_| StoreError::Closed)?
    }

    #[instrument(skip(self, params), fields(recipient = %params.recipient))]
    pub async fn insert(&self, params: MessageCreate) -> Result<MessageId, StoreError> {
        self.request(|respond_to| StoreRequest::Insert { params, respond_to })
            .await
    }

    pub async fn get(&self, id: MessageId) -> Result<Option<MessageRecord>, StoreError> {
        self.request(|respond_to| StoreRequest::Get { id, respond_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn set_status(&self, id: MessageId, status: MessageStatus) -> Result<(), StoreError> {
        self.request(|respond_to| StoreRequest::SetStatus {
            id,
            status,
            respond_to,
        })
        .await
    }

    pub async fn stats(&self) -> Result<StoreStats, StoreError> {
        self.request(|respond_to| StoreRequest::Stats { respond_to })
            .await
    }

    /// Stop the actor. A second call returns [`StoreError::Closed`].
    pub async fn close(&self) -> Result<(), StoreError> {
        self.request(|respond_to| StoreRequest::Close { respond_to })
            .await
    }
}

#[async_trait]
impl Subsystem for Database {
    fn name(&self) -> &'static str {
        "store"
    }

    async fn stop(&self, _ctx: &ShutdownContext) -> Result<(), BoxError> {
        Ok(self.close().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            ..DatabaseConfig::default()
        }
    }

    fn message(recipient: &str) -> MessageCreate {
        MessageCreate {
            recipient: recipient.to_string(),
            template: "welcome".to_string(),
            variables: Default::default(),
            campaign: None,
        }
    }

    #[tokio::test]
    async fn rejects_unsupported_urls() {
        assert_eq!(
            Database::connect(&config("postgres://db")).unwrap_err(),
            StoreError::UnsupportedUrl("postgres://db".to_string())
        );
        assert!(Database::connect(&config("memory://")).is_err());

        let no_pool = DatabaseConfig {
            max_connections: 0,
            ..DatabaseConfig::default()
        };
        assert_eq!(Database::connect(&no_pool).unwrap_err(), StoreError::NoConnections);
    }

    #[tokio::test]
    async fn tracks_status_counts() {
        let db = Database::connect(&config("memory://test")).unwrap();
        assert_eq!(db.name(), "test");

        let a = db.insert(message("a@example.com")).await.unwrap();
        let b = db.insert(message("b@example.com")).await.unwrap();
        let _c = db.insert(message("c@example.com")).await.unwrap();
        assert_eq!(a.to_string(), "msg_1");

        db.set_status(a, MessageStatus::Sent).await.unwrap();
        db.set_status(b, MessageStatus::Failed("bounced".into()))
            .await
            .unwrap();

        let stats = db.stats().await.unwrap();
        assert_eq!(
            stats,
            StoreStats {
                total: 3,
                queued: 1,
                sent: 1,
                failed: 1
            }
        );
        assert_eq!(
            db.set_status(MessageId(99), MessageStatus::Sent).await,
            Err(StoreError::NotFound(MessageId(99)))
        );
    }

    #[tokio::test]
    async fn second_close_reports_closed() {
        let db = Database::connect(&DatabaseConfig::default()).unwrap();
        db.close().await.unwrap();

        assert_eq!(db.close().await, Err(StoreError::Closed));
        assert_eq!(db.stats().await, Err(StoreError::Closed));
    }
}
