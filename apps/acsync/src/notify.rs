//! SMTP notification delivery.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use acsync_core::{Notifier, NotifyError};

use crate::config::SmtpSettings;

/// Notifier delivering run reports over SMTP.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpNotifier {
    /// Build a notifier from SMTP settings.
    pub fn new(settings: &SmtpSettings) -> Result<Self, NotifyError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
                .port(settings.port);

        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: settings.from.clone(),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
        html: bool,
    ) -> Result<(), NotifyError> {
        if recipients.is_empty() {
            debug!("no notification recipients configured, skipping send");
            return Ok(());
        }

        let mut builder = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| NotifyError::send(format!("invalid from address: {e}")))?,
            )
            .subject(subject);

        for recipient in recipients {
            builder = builder.to(recipient
                .parse()
                .map_err(|e| NotifyError::send(format!("invalid recipient '{recipient}': {e}")))?);
        }

        let content_type = if html {
            ContentType::TEXT_HTML
        } else {
            ContentType::TEXT_PLAIN
        };

        let message = builder
            .header(content_type)
            .body(body.to_string())
            .map_err(|e| NotifyError::send(format!("failed to build message: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::send(e.to_string()))?;

        debug!(recipients = recipients.len(), subject, "notification sent");
        Ok(())
    }
}
