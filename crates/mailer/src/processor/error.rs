use crate::render::RenderError;
use crate::store::StoreError;
use crate::transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("queue_capacity must be greater than 0")]
    InvalidCapacity,
    #[error("processor already started")]
    AlreadyStarted,
    #[error("processor already stopped")]
    AlreadyStopped,
    #[error("processor is not accepting jobs")]
    Stopped,
    #[error("template '{0}' is not registered")]
    UnknownTemplate(String),
    #[error("queue full, job not accepted within {0:?}")]
    QueueFull(std::time::Duration),
    #[error("drain interrupted by shutdown deadline ({pending} job(s) abandoned)")]
    DrainTimeout { pending: usize },
    #[error("worker task failed: {0}")]
    Worker(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
