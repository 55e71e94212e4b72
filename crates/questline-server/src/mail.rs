//! Outgoing mail.
//!
//! Delivery is best-effort: messages are handed to a background task and a
//! failure is logged, never returned to the request that queued it.

use std::sync::{Arc, Mutex};

use tracing::{info, warn};

/// One outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

/// A mail transport.
pub trait Mailer: Send + Sync {
    fn send(&self, mail: &Mail) -> Result<(), MailError>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

impl Mailer for LogMailer {
    fn send(&self, mail: &Mail) -> Result<(), MailError> {
        info!(
            from = %self.from,
            to = %mail.to,
            subject = %mail.subject,
            body = %mail.body,
            "mail"
        );
        Ok(())
    }
}

/// Keeps sent messages in memory.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<Mail>>,
    fail: bool,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose every delivery fails.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Mail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

impl Mailer for MemoryMailer {
    fn send(&self, mail: &Mail) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Delivery("transport unavailable".into()));
        }
        let mut sent = self
            .sent
            .lock()
            .map_err(|e| MailError::Delivery(e.to_string()))?;
        sent.push(mail.clone());
        Ok(())
    }
}

/// Queue `mail` on a background task.
pub fn send_best_effort(mailer: Arc<dyn Mailer>, mail: Mail) {
    tokio::spawn(async move {
        if let Err(e) = mailer.send(&mail) {
            warn!(to = %mail.to, subject = %mail.subject, error = %e, "mail not sent");
        }
    });
}

/// Build a link to `path` under the configured frontend base URL.
pub fn link(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail() -> Mail {
        Mail {
            to: "ada@example.com".into(),
            subject: "Verify your email".into(),
            body: "Click: /verify".into(),
        }
    }

    #[test]
    fn test_memory_mailer_records() {
        let mailer = MemoryMailer::new();
        mailer.send(&mail()).expect("send");
        assert_eq!(mailer.sent(), vec![mail()]);
    }

    #[test]
    fn test_failing_mailer() {
        let mailer = MemoryMailer::failing();
        assert!(mailer.send(&mail()).is_err());
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_best_effort_swallows_failure() {
        let mailer: Arc<dyn Mailer> = Arc::new(MemoryMailer::failing());
        send_best_effort(mailer, mail());
        tokio::task::yield_now().await;
    }

    #[test]
    fn test_link() {
        assert_eq!(link("", "/a?b=1"), "/a?b=1");
        assert_eq!(link("https://q.example/", "/a"), "https://q.example/a");
    }
}
