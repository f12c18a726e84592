#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("smtp host is empty")]
    EmptyHost,
    #[error("smtp port must be non-zero")]
    InvalidPort,
    #[error("smtp username and password must be set together")]
    IncompleteCredentials,
    #[error("smtp pool_size must be greater than 0")]
    EmptyPool,
    #[error("invalid recipient address '{0}'")]
    InvalidRecipient(String),
    #[error("transport is closed")]
    Closed,
    #[error("transport already closed")]
    AlreadyClosed,
}
