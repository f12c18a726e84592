//! The delivery loop: render, send, record.

use super::{ProcessorError, QueuedJob};
use crate::render::TemplateEngine;
use crate::store::{Database, MessageId, MessageStatus};
use crate::transport::{Envelope, SmtpManager};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Counters shared between the worker and the processor handle.
#[derive(Debug, Default)]
pub struct Counters {
    pub submitted: AtomicU64,
    pub delivered: AtomicU64,
    pub failed: AtomicU64,
}

pub struct Worker {
    pub receiver: mpsc::Receiver<QueuedJob>,
    pub store: Database,
    pub transport: Arc<SmtpManager>,
    pub renderer: Arc<TemplateEngine>,
    pub counters: Arc<Counters>,
}

impl Worker {
    /// Runs until every sender is gone and the queue is empty.
    pub async fn run(mut self) {
        info!("Email worker started");
        while let Some(job) = self.receiver.recv().await {
            let id = job.id;
            let (status, counter) = match self.deliver(job) {
                Ok(sequence) => {
                    debug!(%id, sequence, "Delivered");
                    (MessageStatus::Sent, &self.counters.delivered)
                }
                Err(e) => {
                    warn!(%id, error = %e, "Delivery failed");
                    (MessageStatus::Failed(e.to_string()), &self.counters.failed)
                }
            };
            // Counted only once the store reflects the outcome.
            self.record(id, status).await;
            counter.fetch_add(1, Ordering::Relaxed);
        }
        info!(
            delivered = self.counters.delivered.load(Ordering::Relaxed),
            failed = self.counters.failed.load(Ordering::Relaxed),
            "Email worker drained"
        );
    }

    fn deliver(&self, job: QueuedJob) -> Result<u64, ProcessorError> {
        let body = self.renderer.render(&job.job.template, &job.job.variables)?;
        let receipt = self.transport.send(Envelope {
            to: job.job.recipient,
            subject: job.job.template,
            body,
        })?;
        Ok(receipt.sequence)
    }

    async fn record(&self, id: MessageId, status: MessageStatus) {
        if let Err(e) = self.store.set_status(id, status).await {
            warn!(%id, error = %e, "Failed to record delivery status");
        }
    }
}
