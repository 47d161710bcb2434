// Outbound Email - SMTP mailer behind the send_email automation action

use std::time::Duration;

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{authentication::Credentials, PoolConfig},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info};

use crate::config::SmtpConfig;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Invalid mailbox address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// What happened to an email handed to the mailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailDisposition {
    Sent,
    /// SMTP is not configured; the send was a logged no-op.
    Skipped,
}

/// SMTP mailer. Without credentials it stays in no-op mode: sends succeed
/// with [`EmailDisposition::Skipped`] and an info log, so automation rules
/// that email keep working in environments without a mail provider.
#[derive(Debug, Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_email: String,
    from_name: String,
}

impl Mailer {
    pub fn new(smtp_config: &SmtpConfig) -> Result<Self, EmailError> {
        if !smtp_config.is_configured() {
            info!("SMTP not configured, emails will be skipped");
            return Ok(Self {
                transport: None,
                from_email: smtp_config.from_email.clone(),
                from_name: smtp_config.from_name.clone(),
            });
        }

        let creds = Credentials::new(
            smtp_config.username.clone(),
            smtp_config.password.clone(),
        );

        let builder = if smtp_config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp_config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp_config.host)
        };

        let transport = builder
            .port(smtp_config.port)
            .credentials(creds)
            .pool_config(PoolConfig::new().max_size(10))
            .timeout(Some(Duration::from_secs(10)))
            .build();

        Ok(Self {
            transport: Some(transport),
            from_email: smtp_config.from_email.clone(),
            from_name: smtp_config.from_name.clone(),
        })
    }

    /// Mailer permanently in no-op mode.
    pub fn disabled() -> Self {
        Self {
            transport: None,
            from_email: "noreply@propel.local".to_string(),
            from_name: "Propel".to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    pub async fn send(
        &self,
        to_email: &str,
        subject: &str,
        text_body: &str,
    ) -> Result<EmailDisposition, EmailError> {
        let transport = match &self.transport {
            Some(transport) => transport,
            None => {
                info!("SMTP not configured, skipping email to {}", to_email);
                return Ok(EmailDisposition::Skipped);
            }
        };

        let from = format!("{} <{}>", self.from_name, self.from_email).parse::<Mailbox>()?;
        let to = to_email.parse::<Mailbox>()?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(text_body.to_string())?;

        match transport.send(message).await {
            Ok(_) => {
                info!("Email sent successfully to {}", to_email);
                Ok(EmailDisposition::Sent)
            }
            Err(e) => {
                error!("Failed to send email to {}: {}", to_email, e);
                Err(EmailError::Transport(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_mailer_skips() {
        let mailer = Mailer::disabled();

        let disposition = mailer
            .send("owner@example.com", "Lead update", "qualified")
            .await
            .unwrap();

        assert_eq!(disposition, EmailDisposition::Skipped);
        assert!(!mailer.is_enabled());
    }

    #[test]
    fn test_unconfigured_smtp_builds_disabled_mailer() {
        let config = SmtpConfig {
            host: String::new(),
            port: 2525,
            username: String::new(),
            password: String::new(),
            from_email: "noreply@propel.local".to_string(),
            from_name: "Propel".to_string(),
            use_tls: true,
        };

        let mailer = Mailer::new(&config).unwrap();
        assert!(!mailer.is_enabled());
    }
}
