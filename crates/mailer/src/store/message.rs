//! Requests accepted by the store actor.

use super::error::StoreError;
use super::model::{MessageCreate, MessageId, MessageRecord, MessageStatus, StoreStats};
use tokio::sync::oneshot;

pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

#[derive(Debug)]
pub enum StoreRequest {
    Insert {
        params: MessageCreate,
        respond_to: Response<MessageId>,
    },
    Get {
        id: MessageId,
        respond_to: Response<Option<MessageRecord>>,
    },
    SetStatus {
        id: MessageId,
        status: MessageStatus,
        respond_to: Response<()>,
    },
    Stats {
        respond_to: Response<StoreStats>,
    },
    /// Flush and stop the actor loop. Requests queued behind it are answered with
    /// [`StoreError::Closed`].
    Close { respond_to: Response<()> },
}
