//! SMTP delivery for confirmation and ad hoc emails.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, warn};
use vipride_core::notification::{EmailBody, EmailMessage, Mailer, NotificationError};
use vipride_shared::Masked;

use crate::app_config::EmailConfig;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, NotificationError> {
        if !config.use_tls {
            warn!("SMTP TLS is disabled - this is not recommended for production");
        }

        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| NotificationError::Transport(format!("create SMTP transport: {e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(config.username.clone(), config.password.clone()))
            .build();

        Ok(Self {
            transport,
            from: from_mailbox(config)?,
        })
    }
}

fn from_mailbox(config: &EmailConfig) -> Result<Mailbox, NotificationError> {
    format!("{} <{}>", config.from_name, config.from_email)
        .parse::<Mailbox>()
        .map_err(|e| NotificationError::InvalidAddress(format!("from address: {e}")))
}

pub fn build_message(from: Mailbox, message: &EmailMessage) -> Result<Message, NotificationError> {
    let to = match &message.to_name {
        Some(name) => format!("{name} <{}>", message.to),
        None => message.to.clone(),
    }
    .parse::<Mailbox>()
    .map_err(|e| NotificationError::InvalidAddress(format!("to address: {e}")))?;

    let (content_type, body) = match &message.body {
        EmailBody::Html(html) => (ContentType::TEXT_HTML, html.clone()),
        EmailBody::Text(text) => (ContentType::TEXT_PLAIN, text.clone()),
    };

    Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject.as_str())
        .header(content_type)
        .body(body)
        .map_err(|e| NotificationError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        let email = build_message(self.from.clone(), message)?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        info!(to = ?Masked(&message.to), subject = %message.subject, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from() -> Mailbox {
        "VIP Ride <booking@example.com>".parse().unwrap()
    }

    fn message(to: &str, body: EmailBody) -> EmailMessage {
        EmailMessage {
            to: to.into(),
            to_name: Some("Ayse Yilmaz".into()),
            subject: "Booking Confirmation - TRF-1".into(),
            body,
        }
    }

    #[test]
    fn test_build_html_message() {
        let email = build_message(from(), &message("guest@example.com", EmailBody::Html("<p>Hi</p>".into())))
            .expect("message should build");
        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("To: \"Ayse Yilmaz\" <guest@example.com>") || raw.contains("To: Ayse Yilmaz <guest@example.com>"));
        assert!(raw.contains("Content-Type: text/html"));
        assert!(raw.contains("Subject: Booking Confirmation - TRF-1"));
    }

    #[test]
    fn test_build_text_message() {
        let email = build_message(from(), &message("guest@example.com", EmailBody::Text("Hi".into()))).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("Content-Type: text/plain"));
    }

    #[test]
    fn test_invalid_recipient() {
        let result = build_message(from(), &message("not-an-address", EmailBody::Text("Hi".into())));
        assert!(matches!(result, Err(NotificationError::InvalidAddress(_))));
    }

    #[test]
    fn test_from_mailbox() {
        let config = EmailConfig {
            host: "smtp.example.com".into(),
            port: 587,
            username: "u".into(),
            password: "p".into(),
            from_email: "booking@example.com".into(),
            from_name: "VIP Ride".into(),
            use_tls: true,
        };
        let mailbox = from_mailbox(&config).unwrap();
        assert_eq!(mailbox.email.to_string(), "booking@example.com");
    }
}
