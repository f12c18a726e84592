//! # Command Surface
//!
//! Line-oriented interactive interface and the service's primary workload. It runs on
//! its own OS thread and reaches the async subsystems through a runtime [`Handle`].
//!
//! The workload ends normally on `quit`/`exit` or at end of input.

pub mod command;
pub mod error;

pub use command::{Command, ParseError};
pub use error::CliError;

use crate::campaign::{CampaignCreate, CampaignManager};
use crate::processor::{EmailJob, EmailProcessor};
use crate::render::TemplateEngine;
use crate::store::Database;
use crate::transport::SmtpManager;
use lifecycle_framework::LifecycleState;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::debug;

const HELP: &str = "\
commands:
  help                                      show this text
  status                                    lifecycle and transport state
  stats                                     message counts
  templates                                 registered templates
  send <to> <template> [key=value ...]      queue one message
  campaign <name> <template> <to> [to ...]  create and launch a campaign
  progress <campaign id>                    delivery progress of a campaign
  quit | exit                               stop the service";

pub struct Interface {
    store: Database,
    transport: Arc<SmtpManager>,
    renderer: Arc<TemplateEngine>,
    processor: Arc<EmailProcessor>,
    campaigns: Arc<CampaignManager>,
    state: watch::Receiver<LifecycleState>,
    runtime: Handle,
}

impl Interface {
    pub fn new(
        store: Database,
        transport: Arc<SmtpManager>,
        renderer: Arc<TemplateEngine>,
        processor: Arc<EmailProcessor>,
        campaigns: Arc<CampaignManager>,
        state: watch::Receiver<LifecycleState>,
        runtime: Handle,
    ) -> Self {
        Self {
            store,
            transport,
            renderer,
            processor,
            campaigns,
            state,
            runtime,
        }
    }

    /// Serve stdin/stdout until quit or end of input.
    pub fn run(&self) -> Result<(), CliError> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_with(stdin.lock(), stdout.lock())
    }

    /// Serve `input` until quit or end of input.
    ///
    /// Lines that are not valid UTF-8 are decoded lossily and handled like any other
    /// input, so a stray byte is reported instead of ending the workload.
    pub fn run_with<R: BufRead, W: Write>(
        &self,
        mut input: R,
        mut output: W,
    ) -> Result<(), CliError> {
        writeln!(output, "Type 'help' for commands.")?;
        let mut raw = Vec::new();
        loop {
            raw.clear();
            if input.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&raw);
            match Command::parse(&line) {
                Ok(Command::Quit) => {
                    debug!("Quit requested");
                    return Ok(());
                }
                Ok(Command::Empty) => {}
                Ok(command) => self.execute(command, &mut output)?,
                Err(ParseError::Unknown(word)) => {
                    writeln!(output, "unknown command '{word}', type 'help'")?
                }
                Err(ParseError::Usage(usage)) => writeln!(output, "usage: {usage}")?,
            }
            output.flush()?;
        }
        debug!("End of input");
        Ok(())
    }

    fn execute<W: Write>(&self, command: Command, out: &mut W) -> Result<(), CliError> {
        match command {
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Status => {
                let state = *self.state.borrow();
                writeln!(
                    out,
                    "state={state} processor={} transport={} ({})",
                    if self.processor.is_running() { "running" } else { "idle" },
                    self.transport.endpoint(),
                    if self.transport.is_closed() { "closed" } else { "open" },
                )?;
            }
            Command::Stats => {
                let processor = self.processor.stats();
                match self.runtime.block_on(self.store.stats()) {
                    Ok(store) => writeln!(
                        out,
                        "{store} in_flight={} delivered_total={}",
                        processor.in_flight(),
                        self.transport.delivered()
                    )?,
                    Err(e) => writeln!(out, "error: {e}")?,
                }
            }
            Command::Templates => {
                let names = self.renderer.names();
                if names.is_empty() {
                    writeln!(out, "no templates loaded")?;
                } else {
                    writeln!(out, "{}", names.join("\n"))?;
                }
            }
            Command::Send {
                to,
                template,
                variables,
            } => {
                let job = EmailJob {
                    recipient: to,
                    template,
                    variables,
                    campaign: None,
                };
                match self.runtime.block_on(self.processor.submit(job)) {
                    Ok(id) => writeln!(out, "queued {id}")?,
                    Err(e) => writeln!(out, "error: {e}")?,
                }
            }
            Command::Campaign {
                name,
                template,
                recipients,
            } => {
                let params = CampaignCreate {
                    name,
                    template,
                    recipients,
                    variables: Default::default(),
                };
                let launched = self
                    .campaigns
                    .create(params)
                    .and_then(|id| {
                        self.runtime
                            .block_on(self.campaigns.launch(id))
                            .map(|accepted| (id, accepted))
                    });
                match launched {
                    Ok((id, accepted)) => {
                        writeln!(out, "campaign {id} launched, {accepted} queued")?
                    }
                    Err(e) => writeln!(out, "error: {e}")?,
                }
            }
            Command::Progress(id) => match self.runtime.block_on(self.campaigns.progress(id)) {
                Ok(p) => writeln!(
                    out,
                    "campaign {id}: total={} queued={} sent={} failed={}",
                    p.total, p.queued, p.sent, p.failed
                )?,
                Err(e) => writeln!(out, "error: {e}")?,
            },
            Command::Quit | Command::Empty => {}
        }
        Ok(())
    }
}
