// ============================
// crates/backend-lib/src/mail.rs
// ============================
//! Outbound mail for password reset codes.
//!
//! [`SmtpMailer`] sends through a STARTTLS relay with `lettre`. When no SMTP
//! relay is configured the server falls back to [`LogMailer`], which only
//! writes the code to the log so a developer can complete the flow locally.
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

use crate::config::SmtpSettings;

/// Mail delivery failures
#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),
}

/// Delivers reset codes
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_otp_email(&self, to: &str, code: &str) -> Result<(), MailError>;
}

const OTP_SUBJECT: &str = "Your Password Reset OTP";

fn otp_body(code: &str) -> String {
    format!(
        "<h2>Password Reset</h2><p>Your 6-digit OTP code is: <b>{code}</b></p>\
         <p>This code will expire in 5 minutes.</p>"
    )
}

/// SMTP mailer
pub struct SmtpMailer {
    from: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            .port(settings.port);

        if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            from: settings.sender(),
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_otp_email(&self, to: &str, code: &str) -> Result<(), MailError> {
        let email = Message::builder()
            .from(self.from.parse()?)
            .to(to.parse()?)
            .subject(OTP_SUBJECT)
            .header(ContentType::TEXT_HTML)
            .body(otp_body(code))
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport.send(email).await?;
        tracing::info!(to, "reset code email sent");
        Ok(())
    }
}

/// Mailer used when SMTP is not configured
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_otp_email(&self, to: &str, code: &str) -> Result<(), MailError> {
        tracing::warn!(to, code, "SMTP not configured, reset code email not sent");
        Ok(())
    }
}
