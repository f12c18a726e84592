//! # Campaign Coordinator
//!
//! Groups recipients under one template and fans a launch out into individual processor
//! jobs. Progress is read back from the store, so it reflects what the worker has
//! actually delivered.

pub mod error;
pub mod model;

pub use error::CampaignError;
pub use model::*;

use crate::processor::{EmailJob, EmailProcessor};
use crate::render::TemplateEngine;
use crate::store::{Database, MessageStatus};
use async_trait::async_trait;
use lifecycle_framework::{BoxError, ShutdownContext, Subsystem};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, instrument, warn};

pub struct CampaignManager {
    store: Database,
    processor: Arc<EmailProcessor>,
    renderer: Arc<TemplateEngine>,
    campaigns: Mutex<HashMap<u64, Campaign>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl CampaignManager {
    pub fn new(
        store: Database,
        processor: Arc<EmailProcessor>,
        renderer: Arc<TemplateEngine>,
    ) -> Self {
        Self {
            store,
            processor,
            renderer,
            campaigns: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<(), CampaignError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(CampaignError::Closed)
        } else {
            Ok(())
        }
    }

    pub fn create(&self, params: CampaignCreate) -> Result<u64, CampaignError> {
        self.ensure_open()?;
        if params.recipients.is_empty() {
            return Err(CampaignError::NoRecipients);
        }
        if !self.renderer.contains(&params.template) {
            return Err(CampaignError::UnknownTemplate(params.template));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let campaign = Campaign {
            id,
            name: params.name,
            template: params.template,
            recipients: params.recipients,
            variables: params.variables,
            state: CampaignState::Draft,
            messages: Vec::new(),
        };
        info!(
            id,
            name = %campaign.name,
            recipients = campaign.recipients.len(),
            "Campaign created"
        );
        self.campaigns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, campaign);
        Ok(id)
    }

    pub fn get(&self, id: u64) -> Option<Campaign> {
        self.campaigns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Submit one job per recipient. Returns how many were accepted.
    ///
    /// A recipient the processor refuses is logged and skipped; the launch carries on.
    #[instrument(skip(self))]
    pub async fn launch(&self, id: u64) -> Result<usize, CampaignError> {
        self.ensure_open()?;
        let campaign = {
            let mut campaigns = self.campaigns.lock().unwrap_or_else(PoisonError::into_inner);
            let campaign = campaigns.get_mut(&id).ok_or(CampaignError::NotFound(id))?;
            if campaign.state == CampaignState::Launched {
                return Err(CampaignError::AlreadyLaunched(id));
            }
            campaign.state = CampaignState::Launched;
            campaign.clone()
        };

        let mut messages = Vec::with_capacity(campaign.recipients.len());
        for recipient in &campaign.recipients {
            let mut variables = campaign.variables.clone();
            variables.insert("recipient".to_string(), recipient.clone());
            let job = EmailJob {
                recipient: recipient.clone(),
                template: campaign.template.clone(),
                variables,
                campaign: Some(id),
            };
            match self.processor.submit(job).await {
                Ok(message) => messages.push(message),
                Err(e) => warn!(campaign = id, %recipient, error = %e, "Recipient not queued"),
            }
        }

        let accepted = messages.len();
        if let Some(stored) = self
            .campaigns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&id)
        {
            stored.messages = messages;
        }
        info!(campaign = id, accepted, "Campaign launched");
        Ok(accepted)
    }

    pub async fn progress(&self, id: u64) -> Result<CampaignProgress, CampaignError> {
        let campaign = self.get(id).ok_or(CampaignError::NotFound(id))?;
        let mut progress = CampaignProgress {
            total: campaign.messages.len(),
            ..CampaignProgress::default()
        };
        for message in campaign.messages {
            match self.store.get(message).await?.map(|record| record.status) {
                Some(MessageStatus::Sent) => progress.sent += 1,
                Some(MessageStatus::Failed(_)) => progress.failed += 1,
                Some(MessageStatus::Queued) | None => progress.queued += 1,
            }
        }
        Ok(progress)
    }

    pub fn len(&self) -> usize {
        self.campaigns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Refuse further work. A second call returns [`CampaignError::AlreadyClosed`].
    pub fn close(&self) -> Result<(), CampaignError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(CampaignError::AlreadyClosed);
        }
        info!(campaigns = self.len(), "Campaign coordinator closed");
        Ok(())
    }
}

#[async_trait]
impl Subsystem for CampaignManager {
    fn name(&self) -> &'static str {
        "campaign coordinator"
    }

    async fn stop(&self, _ctx: &ShutdownContext) -> Result<(), BoxError> {
        Ok(self.close()?)
    }
}
