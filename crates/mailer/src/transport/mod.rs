//! # Transport
//!
//! Outbound delivery through a fixed pool of SMTP connections, handed out round robin.
//!
//! Delivery is simulated: every accepted envelope is appended to an in-memory outbox
//! that tests and the command surface can inspect. The connection parameters are still
//! validated up front so a bad `[smtp]` section fails startup the way a real dial would.

pub mod error;

pub use error::TransportError;

use crate::config::SmtpConfig;
use async_trait::async_trait;
use lifecycle_framework::{BoxError, ShutdownContext, Subsystem};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// A rendered message ready to go out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Proof of acceptance by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub sequence: u64,
    pub connection: usize,
}

#[derive(Debug)]
struct Connection {
    id: usize,
    sent: AtomicU64,
}

pub struct SmtpManager {
    host: String,
    port: u16,
    from: String,
    use_tls: bool,
    pool: Vec<Connection>,
    cursor: AtomicUsize,
    sequence: AtomicU64,
    outbox: Mutex<Vec<Envelope>>,
    closed: AtomicBool,
}

impl SmtpManager {
    pub fn new(config: &SmtpConfig) -> Result<Self, TransportError> {
        if config.host.trim().is_empty() {
            return Err(TransportError::EmptyHost);
        }
        if config.port == 0 {
            return Err(TransportError::InvalidPort);
        }
        if config.username.is_some() != config.password.is_some() {
            return Err(TransportError::IncompleteCredentials);
        }
        if config.pool_size == 0 {
            return Err(TransportError::EmptyPool);
        }

        let pool = (0..config.pool_size)
            .map(|id| Connection {
                id,
                sent: AtomicU64::new(0),
            })
            .collect();
        info!(
            host = %config.host,
            port = config.port,
            tls = config.use_tls,
            pool_size = config.pool_size,
            "SMTP connection pool ready"
        );

        Ok(Self {
            host: config.host.clone(),
            port: config.port,
            from: config.from_address.clone(),
            use_tls: config.use_tls,
            pool,
            cursor: AtomicUsize::new(0),
            sequence: AtomicU64::new(0),
            outbox: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn endpoint(&self) -> String {
        let scheme = if self.use_tls { "smtps" } else { "smtp" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    pub fn from_address(&self) -> &str {
        &self.from
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Hand `envelope` to the next pooled connection.
    pub fn send(&self, envelope: Envelope) -> Result<DeliveryReceipt, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        if !is_plausible_address(&envelope.to) {
            return Err(TransportError::InvalidRecipient(envelope.to));
        }

        let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % self.pool.len();
        let connection = &self.pool[slot];
        connection.sent.fetch_add(1, Ordering::Relaxed);
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;

        debug!(to = %envelope.to, connection = connection.id, sequence, "Envelope accepted");
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(envelope);

        Ok(DeliveryReceipt {
            sequence,
            connection: connection.id,
        })
    }

    /// Everything accepted so far, oldest first.
    pub fn outbox(&self) -> Vec<Envelope> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn delivered(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Drop every pooled connection. A second call returns [`TransportError::AlreadyClosed`].
    pub fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(TransportError::AlreadyClosed);
        }
        for connection in &self.pool {
            debug!(
                connection = connection.id,
                sent = connection.sent.load(Ordering::Relaxed),
                "SMTP connection closed"
            );
        }
        info!(endpoint = %self.endpoint(), delivered = self.delivered(), "Transport closed");
        Ok(())
    }
}

fn is_plausible_address(address: &str) -> bool {
    match address.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[async_trait]
impl Subsystem for SmtpManager {
    fn name(&self) -> &'static str {
        "transport"
    }

    async fn stop(&self, _ctx: &ShutdownContext) -> Result<(), BoxError> {
        Ok(self.close()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(to: &str) -> Envelope {
        Envelope {
            to: to.to_string(),
            subject: "hi".to_string(),
            body: "hello".to_string(),
        }
    }

    #[test]
    fn validates_connection_parameters() {
        let empty_host = SmtpConfig {
            host: " ".into(),
            ..SmtpConfig::default()
        };
        assert_eq!(SmtpManager::new(&empty_host).err(), Some(TransportError::EmptyHost));

        let half_credentials = SmtpConfig {
            username: Some("mailer".into()),
            ..SmtpConfig::default()
        };
        assert_eq!(
            SmtpManager::new(&half_credentials).err(),
            Some(TransportError::IncompleteCredentials)
        );

        let no_port = SmtpConfig {
            port: 0,
            ..SmtpConfig::default()
        };
        assert_eq!(SmtpManager::new(&no_port).err(), Some(TransportError::InvalidPort));
    }

    #[test]
    fn rotates_through_the_pool() {
        let smtp = SmtpManager::new(&SmtpConfig {
            pool_size: 2,
            ..SmtpConfig::default()
        })
        .unwrap();

        let connections: Vec<_> = (0..4)
            .map(|_| smtp.send(envelope("bob@example.com")).unwrap().connection)
            .collect();
        assert_eq!(connections, vec![0, 1, 0, 1]);
        assert_eq!(smtp.delivered(), 4);
        assert_eq!(smtp.outbox().len(), 4);
        assert_eq!(smtp.endpoint(), "smtps://localhost:587");
    }

    #[test]
    fn rejects_bad_recipients() {
        let smtp = SmtpManager::new(&SmtpConfig::default()).unwrap();
        assert_eq!(
            smtp.send(envelope("not-an-address")),
            Err(TransportError::InvalidRecipient("not-an-address".into()))
        );
        assert!(smtp.outbox().is_empty());
    }

    #[test]
    fn close_is_not_repeatable() {
        let smtp = SmtpManager::new(&SmtpConfig::default()).unwrap();
        smtp.close().unwrap();

        assert_eq!(smtp.close(), Err(TransportError::AlreadyClosed));
        assert_eq!(smtp.send(envelope("bob@example.com")), Err(TransportError::Closed));
    }
}
