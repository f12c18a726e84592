//! # Processor
//!
//! Accepts [`EmailJob`]s, records them in the store as queued, and delivers them on a
//! single background worker.
//!
//! Construction only wires dependencies and allocates the queue; [`EmailProcessor::start`]
//! spawns the worker. Jobs submitted before `start` wait in the queue.
//!
//! `stop` closes the queue and waits for the worker to drain it, giving up at the
//! shutdown deadline.

pub mod error;
mod worker;

pub use error::ProcessorError;

use crate::config::ProcessorConfig;
use crate::render::TemplateEngine;
use crate::store::{Database, MessageCreate, MessageId};
use crate::transport::SmtpManager;
use async_trait::async_trait;
use lifecycle_framework::{BoxError, ShutdownContext, Subsystem};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use worker::{Counters, Worker};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailJob {
    pub recipient: String,
    pub template: String,
    pub variables: HashMap<String, String>,
    pub campaign: Option<u64>,
}

#[derive(Debug)]
pub struct QueuedJob {
    pub id: MessageId,
    pub job: EmailJob,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorStats {
    pub submitted: u64,
    pub delivered: u64,
    pub failed: u64,
}

impl ProcessorStats {
    pub fn in_flight(&self) -> u64 {
        self.submitted.saturating_sub(self.delivered + self.failed)
    }
}

pub struct EmailProcessor {
    store: Database,
    transport: Arc<SmtpManager>,
    renderer: Arc<TemplateEngine>,
    enqueue_timeout: Duration,
    sender: Mutex<Option<mpsc::Sender<QueuedJob>>>,
    receiver: Mutex<Option<mpsc::Receiver<QueuedJob>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl EmailProcessor {
    pub fn new(
        config: &ProcessorConfig,
        store: Database,
        transport: Arc<SmtpManager>,
        renderer: Arc<TemplateEngine>,
    ) -> Result<Self, ProcessorError> {
        if config.queue_capacity == 0 {
            return Err(ProcessorError::InvalidCapacity);
        }
        let (sender, receiver) = mpsc::channel(config.queue_capacity);

        Ok(Self {
            store,
            transport,
            renderer,
            enqueue_timeout: config.enqueue_timeout(),
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
            worker: Mutex::new(None),
            counters: Arc::new(Counters::default()),
        })
    }

    /// Spawn the worker. Fails if called twice.
    pub fn start(&self) -> Result<(), ProcessorError> {
        let receiver = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(ProcessorError::AlreadyStarted)?;

        let worker = Worker {
            receiver,
            store: self.store.clone(),
            transport: Arc::clone(&self.transport),
            renderer: Arc::clone(&self.renderer),
            counters: Arc::clone(&self.counters),
        };
        let handle = tokio::spawn(worker.run());
        *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        info!("Email processor started");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Queue `job` for delivery and return its store id.
    #[instrument(skip(self, job), fields(recipient = %job.recipient, template = %job.template))]
    pub async fn submit(&self, job: EmailJob) -> Result<MessageId, ProcessorError> {
        if !self.renderer.contains(&job.template) {
            return Err(ProcessorError::UnknownTemplate(job.template));
        }
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ProcessorError::Stopped)?;

        let id = self
            .store
            .insert(MessageCreate {
                recipient: job.recipient.clone(),
                template: job.template.clone(),
                variables: job.variables.clone(),
                campaign: job.campaign,
            })
            .await?;

        match sender
            .send_timeout(QueuedJob { id, job }, self.enqueue_timeout)
            .await
        {
            Ok(()) => {
                self.counters.submitted.fetch_add(1, Ordering::Relaxed);
                Ok(id)
            }
            Err(SendTimeoutError::Timeout(_)) => {
                Err(ProcessorError::QueueFull(self.enqueue_timeout))
            }
            Err(SendTimeoutError::Closed(_)) => Err(ProcessorError::Stopped),
        }
    }

    pub fn stats(&self) -> ProcessorStats {
        ProcessorStats {
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Close the queue and wait for the worker to drain it, at most until the deadline.
    pub async fn drain(&self, ctx: &ShutdownContext) -> Result<(), ProcessorError> {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(ProcessorError::AlreadyStopped)?;

        let handle = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(mut handle) = handle else {
            // Never started: queued jobs stay queued in the store.
            self.receiver.lock().unwrap_or_else(PoisonError::into_inner).take();
            info!("Email processor stopped before it was started");
            return Ok(());
        };

        tokio::select! {
            joined = &mut handle => {
                joined.map_err(|e| ProcessorError::Worker(e.to_string()))?;
                info!("Email processor stopped");
                Ok(())
            }
            _ = ctx.expired() => {
                handle.abort();
                let pending = self.stats().in_flight() as usize;
                warn!(pending, "Email processor drain interrupted by deadline");
                Err(ProcessorError::DrainTimeout { pending })
            }
        }
    }
}

#[async_trait]
impl Subsystem for EmailProcessor {
    fn name(&self) -> &'static str {
        "processor"
    }

    async fn start(&self) -> Result<(), BoxError> {
        Ok(EmailProcessor::start(self)?)
    }

    async fn stop(&self, ctx: &ShutdownContext) -> Result<(), BoxError> {
        Ok(self.drain(ctx).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, SmtpConfig};

    fn processor() -> EmailProcessor {
        let store = Database::connect(&DatabaseConfig::default()).unwrap();
        let transport = Arc::new(SmtpManager::new(&SmtpConfig::default()).unwrap());
        let renderer = Arc::new(TemplateEngine::new());
        renderer.load_template("welcome", "Hi").unwrap();
        EmailProcessor::new(&ProcessorConfig::default(), store, transport, renderer).unwrap()
    }

    fn job(template: &str) -> EmailJob {
        EmailJob {
            recipient: "ada@example.com".into(),
            template: template.into(),
            variables: HashMap::new(),
            campaign: None,
        }
    }

    #[tokio::test]
    async fn start_and_stop_are_not_repeatable() {
        let processor = processor();
        processor.start().unwrap();
        assert!(matches!(processor.start(), Err(ProcessorError::AlreadyStarted)));

        let ctx = ShutdownContext::new(Duration::from_secs(5));
        processor.drain(&ctx).await.unwrap();
        assert!(matches!(
            processor.drain(&ctx).await,
            Err(ProcessorError::AlreadyStopped)
        ));
        assert!(matches!(
            processor.submit(job("welcome")).await,
            Err(ProcessorError::Stopped)
        ));
    }

    #[tokio::test]
    async fn unknown_templates_are_refused_up_front() {
        let processor = processor();
        assert!(matches!(
            processor.submit(job("missing")).await,
            Err(ProcessorError::UnknownTemplate(_))
        ));
        assert_eq!(processor.stats(), ProcessorStats::default());
    }

    #[tokio::test]
    async fn stopping_an_unstarted_processor_leaves_jobs_queued() {
        let processor = processor();
        processor.submit(job("welcome")).await.unwrap();
        assert_eq!(processor.stats().in_flight(), 1);

        processor
            .drain(&ShutdownContext::new(Duration::from_secs(1)))
            .await
            .unwrap();
        assert_eq!(processor.stats().delivered, 0);
        assert!(matches!(processor.start(), Err(ProcessorError::AlreadyStarted)));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let _guard = runtime.enter();

        let store = Database::connect(&DatabaseConfig::default()).unwrap();
        let config = ProcessorConfig {
            queue_capacity: 0,
            ..ProcessorConfig::default()
        };
        let result = EmailProcessor::new(
            &config,
            store,
            Arc::new(SmtpManager::new(&SmtpConfig::default()).unwrap()),
            Arc::new(TemplateEngine::new()),
        );
        assert!(matches!(result, Err(ProcessorError::InvalidCapacity)));
    }
}
