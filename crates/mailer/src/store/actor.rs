//! # Store Actor
//!
//! Owns every [`MessageRecord`] and processes [`StoreRequest`]s one at a time, so the
//! table needs no lock.

use super::error::StoreError;
use super::message::StoreRequest;
use super::model::{MessageId, MessageRecord, MessageStatus, StoreStats};
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{debug, info};

pub struct StoreActor {
    receiver: mpsc::Receiver<StoreRequest>,
    name: String,
    records: BTreeMap<MessageId, MessageRecord>,
    next_id: u64,
}

impl StoreActor {
    pub fn new(name: String, receiver: mpsc::Receiver<StoreRequest>) -> Self {
        Self {
            receiver,
            name,
            records: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Process requests until a `Close` arrives or every client is dropped.
    pub async fn run(mut self) {
        info!(store = %self.name, "Store actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Insert { params, respond_to } => {
                    let id = MessageId(self.next_id);
                    self.next_id += 1;
                    self.records.insert(
                        id,
                        MessageRecord {
                            id,
                            recipient: params.recipient,
                            template: params.template,
                            variables: params.variables,
                            campaign: params.campaign,
                            status: MessageStatus::Queued,
                        },
                    );
                    debug!(%id, size = self.records.len(), "Inserted");
                    let _ = respond_to.send(Ok(id));
                }
                StoreRequest::Get { id, respond_to } => {
                    let _ = respond_to.send(Ok(self.records.get(&id).cloned()));
                }
                StoreRequest::SetStatus {
                    id,
                    status,
                    respond_to,
                } => {
                    let result = match self.records.get_mut(&id) {
                        Some(record) => {
                            debug!(%id, ?status, "Status updated");
                            record.status = status;
                            Ok(())
                        }
                        None => Err(StoreError::NotFound(id)),
                    };
                    let _ = respond_to.send(result);
                }
                StoreRequest::Stats { respond_to } => {
                    let _ = respond_to.send(Ok(self.stats()));
                }
                StoreRequest::Close { respond_to } => {
                    info!(store = %self.name, records = self.records.len(), "Store closing");
                    self.receiver.close();
                    let _ = respond_to.send(Ok(()));
                    break;
                }
            }
        }

        // Anything that raced in behind the close gets a definite answer.
        while let Ok(msg) = self.receiver.try_recv() {
            reject(msg);
        }
        info!(store = %self.name, "Store actor stopped");
    }

    fn stats(&self) -> StoreStats {
        self.records
            .values()
            .fold(StoreStats::default(), |mut stats, record| {
                stats.total += 1;
                match record.status {
                    MessageStatus::Queued => stats.queued += 1,
                    MessageStatus::Sent => stats.sent += 1,
                    MessageStatus::Failed(_) => stats.failed += 1,
                }
                stats
            })
    }
}

fn reject(msg: StoreRequest) {
    match msg {
        StoreRequest::Insert { respond_to, .. } => {
            let _ = respond_to.send(Err(StoreError::Closed));
        }
        StoreRequest::Get { respond_to, .. } => {
            let _ = respond_to.send(Err(StoreError::Closed));
        }
        StoreRequest::SetStatus { respond_to, .. } => {
            let _ = respond_to.send(Err(StoreError::Closed));
        }
        StoreRequest::Stats { respond_to } => {
            let _ = respond_to.send(Err(StoreError::Closed));
        }
        StoreRequest::Close { respond_to } => {
            let _ = respond_to.send(Err(StoreError::Closed));
        }
    }
}
