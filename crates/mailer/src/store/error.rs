use super::model::MessageId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("unsupported store url '{0}' (expected memory://<name>)")]
    UnsupportedUrl(String),
    #[error("max_connections must be greater than 0")]
    NoConnections,
    #[error("message {0} not found")]
    NotFound(MessageId),
    #[error("store is closed")]
    Closed,
}
