//! Outbound email delivery.
//!
//! Delivery is fire-and-forget: OTP issuance spawns a background task that
//! hands the message to an [`EmailSender`] and logs failures. The request that
//! triggered the mail never waits for or observes the outcome.
//!
//! The default sender for local dev is `LogEmailSender`, which logs and
//! returns `Ok(())`.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// Email delivery abstraction.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error for the caller to log.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            body = %message.body,
            "email send stub"
        );
        Ok(())
    }
}

/// Dispatch the OTP mail on a background task, best-effort.
pub fn send_otp_email(sender: Arc<dyn EmailSender>, to_email: String, code: u32) {
    tokio::spawn(async move {
        let message = EmailMessage {
            to_email,
            subject: "Your verification code".to_string(),
            body: format!("OTP: {code}"),
        };
        if let Err(err) = sender.send(&message) {
            error!("Failed to send OTP email: {err}");
        }
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingSender {
        sent: Mutex<Vec<EmailMessage>>,
    }

    impl EmailSender for RecordingSender {
        fn send(&self, message: &EmailMessage) -> Result<()> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn otp_email_carries_the_code() {
        let sender = Arc::new(RecordingSender {
            sent: Mutex::new(Vec::new()),
        });

        send_otp_email(sender.clone(), "a@example.com".to_string(), 123_456);

        // Give the spawned task a chance to run.
        for _ in 0..10 {
            tokio::task::yield_now().await;
            if !sender.sent.lock().unwrap().is_empty() {
                break;
            }
        }

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to_email, "a@example.com");
        assert_eq!(sent[0].body, "OTP: 123456");
    }

    #[test]
    fn log_sender_accepts_messages() {
        let message = EmailMessage {
            to_email: "a@example.com".to_string(),
            subject: "Your verification code".to_string(),
            body: "OTP: 654321".to_string(),
        };
        assert!(LogEmailSender.send(&message).is_ok());
    }
}
