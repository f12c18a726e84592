use crate::store::MessageId;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct CampaignCreate {
    pub name: String,
    pub template: String,
    pub recipients: Vec<String>,
    /// Variables shared by every message; `recipient` is added per message.
    pub variables: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignState {
    Draft,
    Launched,
}

#[derive(Debug, Clone)]
pub struct Campaign {
    pub id: u64,
    pub name: String,
    pub template: String,
    pub recipients: Vec<String>,
    pub variables: HashMap<String, String>,
    pub state: CampaignState,
    pub messages: Vec<MessageId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CampaignProgress {
    pub total: usize,
    pub queued: usize,
    pub sent: usize,
    pub failed: usize,
}

impl CampaignProgress {
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.queued == 0
    }
}
