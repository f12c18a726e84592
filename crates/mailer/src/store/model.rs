//! Records kept by the store.

use std::collections::HashMap;
use std::fmt;

/// Store-assigned message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg_{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageStatus {
    Queued,
    Sent,
    Failed(String),
}

/// Payload for recording a new outbound message.
#[derive(Debug, Clone)]
pub struct MessageCreate {
    pub recipient: String,
    pub template: String,
    pub variables: HashMap<String, String>,
    pub campaign: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub id: MessageId,
    pub recipient: String,
    pub template: String,
    pub variables: HashMap<String, String>,
    pub campaign: Option<u64>,
    pub status: MessageStatus,
}

/// Counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub total: usize,
    pub queued: usize,
    pub sent: usize,
    pub failed: usize,
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={} queued={} sent={} failed={}",
            self.total, self.queued, self.sent, self.failed
        )
    }
}
