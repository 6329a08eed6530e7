//! Password-reset emails over SMTP.
//!
//! [`VerificationMailer`] wraps the `lettre` async SMTP transport. If
//! `SMTP_HOST` is not set, [`MailConfig::from_env`] returns `None` and the
//! handlers log the code instead of sending it.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

const DEFAULT_SMTP_PORT: u16 = 587;

const DEFAULT_FROM_ADDRESS: &str = "noreply@writetalent.local";

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl MailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable        | Required | Default                     |
    /// |-----------------|----------|-----------------------------|
    /// | `SMTP_HOST`     | yes      |                             |
    /// | `SMTP_PORT`     | no       | `587`                       |
    /// | `SMTP_FROM`     | no       | `noreply@writetalent.local` |
    /// | `SMTP_USER`     | no       |                             |
    /// | `SMTP_PASSWORD` | no       |                             |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST")
            .ok()
            .filter(|h| !h.trim().is_empty())?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

/// Sends verification codes by email.
pub struct VerificationMailer {
    config: MailConfig,
}

impl VerificationMailer {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    /// Email `code` to `to_email`, greeting the user by `username`.
    pub async fn send_code(
        &self,
        to_email: &str,
        username: &str,
        code: &str,
    ) -> Result<(), MailError> {
        let email = build_message(&self.config.from_address, to_email, username, code)?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        transport_builder.build().send(email).await?;

        tracing::info!(to = to_email, "Verification code email sent");
        Ok(())
    }
}

fn build_message(
    from: &str,
    to: &str,
    username: &str,
    code: &str,
) -> Result<Message, MailError> {
    let body = format!(
        "Hello {username},\n\n\
         You requested a password reset for your WriteTalent account.\n\n\
         Your verification code is: {code}\n\n\
         This code will expire in 5 minutes.\n\
         If you didn't request this password reset, please ignore this email.\n\n\
         WriteTalent Team"
    );

    Message::builder()
        .from(from.parse()?)
        .to(to.parse()?)
        .subject("WriteTalent - Password Reset Verification Code")
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .map_err(|e| MailError::Build(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_carries_the_code() {
        let message = build_message("noreply@writetalent.local", "kid@example.com", "Mia", "12345")
            .expect("message should build");
        let raw = String::from_utf8(message.formatted()).expect("utf-8 message");
        assert!(raw.contains("12345"));
        assert!(raw.contains("Hello Mia"));
    }

    #[test]
    fn invalid_recipient_is_an_address_error() {
        let err = build_message("noreply@writetalent.local", "not-an-email", "Mia", "12345")
            .unwrap_err();
        assert!(matches!(err, MailError::Address(_)));
    }
}
