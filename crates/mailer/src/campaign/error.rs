use crate::processor::ProcessorError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CampaignError {
    #[error("campaign {0} not found")]
    NotFound(u64),
    #[error("campaign needs at least one recipient")]
    NoRecipients,
    #[error("template '{0}' is not registered")]
    UnknownTemplate(String),
    #[error("campaign {0} already launched")]
    AlreadyLaunched(u64),
    #[error("campaign coordinator is closed")]
    Closed,
    #[error("campaign coordinator already closed")]
    AlreadyClosed,
    #[error(transparent)]
    Processor(#[from] ProcessorError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
