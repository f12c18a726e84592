use crate::campaign::CampaignManager;
use crate::cli::Interface;
use crate::config::MailerConfig;
use crate::processor::EmailProcessor;
use crate::render::TemplateEngine;
use crate::store::Database;
use crate::templates::load_templates;
use crate::transport::SmtpManager;
use lifecycle_framework::{
    InitializationError, Lifecycle, LifecycleError, LifecycleState, RunRace, ShutdownCoordinator,
    ShutdownOutcome, ShutdownReason, TeardownPlan, TerminationSignal, WorkloadResult,
};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

pub const APP_VERSION: &str = "2.0.0";

/// Teardown order, reverse of construction.
pub const TEARDOWN_STEPS: [&str; 4] = [
    "stop processor",
    "close campaign coordinator",
    "close transport",
    "close store",
];

/// The fixed teardown sequence. `None` marks a subsystem that was never constructed.
pub fn teardown_plan(
    processor: Option<Arc<EmailProcessor>>,
    campaigns: Option<Arc<CampaignManager>>,
    transport: Option<Arc<SmtpManager>>,
    store: Option<Arc<Database>>,
) -> TeardownPlan {
    TeardownPlan::new()
        .step(TEARDOWN_STEPS[0], processor)
        .step(TEARDOWN_STEPS[1], campaigns)
        .step(TEARDOWN_STEPS[2], transport)
        .step(TEARDOWN_STEPS[3], store)
}

/// Every subsystem of a running mail service.
pub struct MailerSystem {
    config: Arc<MailerConfig>,
    store: Arc<Database>,
    transport: Arc<SmtpManager>,
    renderer: Arc<TemplateEngine>,
    processor: Arc<EmailProcessor>,
    campaigns: Arc<CampaignManager>,
    lifecycle: Lifecycle,
}

impl MailerSystem {
    /// Construct every subsystem in dependency order and enter `Running`.
    ///
    /// The first failure aborts startup. Nothing already constructed is started or torn
    /// down; the error lists what had been constructed.
    pub async fn boot(config: Arc<MailerConfig>) -> Result<Self, InitializationError> {
        info!(
            app = %config.app.name,
            version = APP_VERSION,
            environment = %config.app.environment,
            "Starting Mailer"
        );
        let store = Database::connect(&config.database)
            .map_err(|e| InitializationError::new("store", Vec::new(), e))?;
        Self::boot_with_store(config, store).await
    }

    /// The rest of the dependency chain, on top of an already connected store.
    pub async fn boot_with_store(
        config: Arc<MailerConfig>,
        store: Database,
    ) -> Result<Self, InitializationError> {
        let mut constructed = vec!["store"];

        let transport = SmtpManager::new(&config.smtp)
            .map_err(|e| InitializationError::new("transport", constructed.clone(), e))?;
        constructed.push("transport");

        let renderer = Arc::new(TemplateEngine::new());
        match load_templates(&config.templates.dir, &config.templates.suffix, &renderer) {
            Ok(loads) => {
                let registered = loads.iter().filter(|load| load.is_registered()).count();
                info!(registered, rejected = loads.len() - registered, "Templates loaded");
            }
            Err(e) => warn!(error = %e, "Failed to load some templates"),
        }
        constructed.push("renderer");

        let transport = Arc::new(transport);
        let processor = EmailProcessor::new(
            &config.processor,
            store.clone(),
            Arc::clone(&transport),
            Arc::clone(&renderer),
        )
        .map_err(|e| InitializationError::new("processor", constructed.clone(), e))?;
        constructed.push("processor");

        let processor = Arc::new(processor);
        processor
            .start()
            .map_err(|e| InitializationError::new("processor", constructed.clone(), e))?;

        let campaigns = Arc::new(CampaignManager::new(
            store.clone(),
            Arc::clone(&processor),
            Arc::clone(&renderer),
        ));

        let lifecycle = Lifecycle::new();
        lifecycle
            .advance(LifecycleState::Running)
            .map_err(|e| InitializationError::new("lifecycle", constructed, e))?;
        info!("Mailer ready");

        Ok(Self {
            config,
            store: Arc::new(store),
            transport,
            renderer,
            processor,
            campaigns,
            lifecycle,
        })
    }

    pub fn config(&self) -> &MailerConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn store(&self) -> &Database {
        &self.store
    }

    pub fn transport(&self) -> &Arc<SmtpManager> {
        &self.transport
    }

    pub fn renderer(&self) -> &Arc<TemplateEngine> {
        &self.renderer
    }

    pub fn processor(&self) -> &Arc<EmailProcessor> {
        &self.processor
    }

    pub fn campaigns(&self) -> &Arc<CampaignManager> {
        &self.campaigns
    }

    /// The command surface, bound to this system's subsystems.
    pub fn interface(&self, runtime: Handle) -> Interface {
        Interface::new(
            (*self.store).clone(),
            Arc::clone(&self.transport),
            Arc::clone(&self.renderer),
            Arc::clone(&self.processor),
            Arc::clone(&self.campaigns),
            self.lifecycle.subscribe(),
            runtime,
        )
    }

    pub fn teardown_plan(&self) -> TeardownPlan {
        teardown_plan(
            Some(Arc::clone(&self.processor)),
            Some(Arc::clone(&self.campaigns)),
            Some(Arc::clone(&self.transport)),
            Some(Arc::clone(&self.store)),
        )
    }

    /// Wait for a termination signal or the primary workload, then shut down.
    ///
    /// Returns what triggered the shutdown when teardown was clean.
    pub async fn run(
        self,
        signals: mpsc::Receiver<TerminationSignal>,
        completion: oneshot::Receiver<WorkloadResult>,
    ) -> Result<ShutdownReason, LifecycleError> {
        let reason = RunRace::new(signals, completion).wait(&self.lifecycle).await;
        if let ShutdownReason::WorkloadFailed(e) = &reason {
            error!(error = %e, "CLI interface error");
        }

        let outcome = self.shutdown().await;
        outcome.into_result()?;
        Ok(reason)
    }

    /// Run the teardown plan under the configured deadline.
    ///
    /// Enters `ShuttingDown` if nothing has yet, and `Stopped` unless the deadline was
    /// missed.
    pub async fn shutdown(&self) -> ShutdownOutcome {
        self.lifecycle.begin_shutdown();

        let coordinator = ShutdownCoordinator::new(self.config.shutdown.timeout());
        let outcome = coordinator.run(self.teardown_plan()).await;

        if !outcome.deadline_exceeded {
            if let Err(e) = self.lifecycle.advance(LifecycleState::Stopped) {
                warn!(error = %e, "Lifecycle not advanced to stopped");
            }
        }
        outcome
    }
}
