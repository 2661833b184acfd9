use crate::error::NotifyError;
use async_trait::async_trait;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_by_email(&self, to: &str, subject: &str, body: &str)
        -> Result<(), NotifyError>;
}

/// Writes notifications to the log instead of mailing them.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_by_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        log::info!("Notification for {}: {}\n{}", to, subject, body);
        Ok(())
    }
}

#[cfg(feature = "email")]
pub use smtp::SmtpNotifier;

#[cfg(feature = "email")]
mod smtp {
    use super::Notifier;
    use crate::error::NotifyError;
    use crate::settings::NotifySettings;
    use async_trait::async_trait;
    use lettre::message::{header::ContentType, Mailbox, Message};
    use lettre::transport::smtp::authentication::Credentials;
    use lettre::{SmtpTransport, Transport};

    /// Plain-text mail through an SMTP relay. The blocking transport runs on
    /// the blocking thread pool.
    pub struct SmtpNotifier {
        from: Mailbox,
        transport: SmtpTransport,
    }

    fn mailbox(address: &str) -> Result<Mailbox, NotifyError> {
        address.parse().map_err(|e: lettre::address::AddressError| NotifyError::Address {
            address: address.to_string(),
            message: e.to_string(),
        })
    }

    impl SmtpNotifier {
        pub fn new(settings: &NotifySettings) -> Result<Self, NotifyError> {
            let transport = SmtpTransport::relay(&settings.smtp_host)
                .map_err(|e| NotifyError::Send(e.to_string()))?
                .credentials(Credentials::new(
                    settings.smtp_username.clone(),
                    settings.smtp_password.clone(),
                ))
                .build();
            Ok(Self {
                from: mailbox(&settings.from_address)?,
                transport,
            })
        }
    }

    #[async_trait]
    impl Notifier for SmtpNotifier {
        async fn notify_by_email(
            &self,
            to: &str,
            subject: &str,
            body: &str,
        ) -> Result<(), NotifyError> {
            let message = Message::builder()
                .from(self.from.clone())
                .to(mailbox(to)?)
                .subject(subject)
                .header(ContentType::TEXT_PLAIN)
                .body(body.to_string())
                .map_err(|e| NotifyError::Send(e.to_string()))?;

            let transport = self.transport.clone();
            tokio::task::spawn_blocking(move || transport.send(&message))
                .await
                .map_err(|e| NotifyError::Send(e.to_string()))?
                .map_err(|e| NotifyError::Send(e.to_string()))?;
            Ok(())
        }
    }
}
