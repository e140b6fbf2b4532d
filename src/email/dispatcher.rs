//! EmailDispatcher: renders the confirmation and delivers it to the student
//! and, when needed, the parent.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::templates;
use super::transport::{EmailConfig, MailTransport, OutgoingEmail};
use crate::error::EmailError;
use crate::i18n::Language;
use crate::registration::model::RegistrationRecord;

/// Simulated latency of a development-mode send.
pub const DEV_MODE_DELAY: Duration = Duration::from_millis(500);

/// What a development-mode send would have done.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevEmailDetails {
    pub student_email: String,
    pub parent_email: String,
    pub registration_id: Option<String>,
    pub language: Language,
}

/// Outcome of a confirmation dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// No provider configured; nothing left the process.
    Development(DevEmailDetails),
    Sent {
        student_email_id: Option<String>,
        parent_email_id: Option<String>,
    },
}

pub struct EmailDispatcher {
    transport: Option<Arc<dyn MailTransport>>,
    from_email: String,
    dev_delay: Duration,
}

impl EmailDispatcher {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            transport: config.transport(),
            from_email: config.from_email.clone(),
            dev_delay: DEV_MODE_DELAY,
        }
    }

    /// Deliver through an explicit transport.
    pub fn with_transport(transport: Arc<dyn MailTransport>, from_email: impl Into<String>) -> Self {
        Self {
            transport: Some(transport),
            from_email: from_email.into(),
            dev_delay: DEV_MODE_DELAY,
        }
    }

    /// Development-mode dispatcher.
    pub fn development() -> Self {
        Self::new(&EmailConfig::default())
    }

    pub fn with_dev_delay(mut self, delay: Duration) -> Self {
        self.dev_delay = delay;
        self
    }

    pub fn is_development(&self) -> bool {
        self.transport.is_none()
    }

    fn sender(&self) -> String {
        format!("JANAPADA <{}>", self.from_email)
    }

    /// Send the confirmation for `record` in `language`.
    ///
    /// The parent gets a copy only when their address is set and differs
    /// from the student's. A failure on either send fails the dispatch.
    pub async fn send_confirmation(
        &self,
        record: &RegistrationRecord,
        language: Language,
    ) -> Result<DispatchOutcome, EmailError> {
        let registration_id = record.registration_id.as_ref().map(|id| id.to_string());

        let Some(transport) = &self.transport else {
            tracing::info!(
                student_email = %record.email,
                parent_email = %record.parent_email,
                registration_id = ?registration_id,
                language = %language,
                "[DEV MODE] Confirmation email would be sent"
            );
            tokio::time::sleep(self.dev_delay).await;
            return Ok(DispatchOutcome::Development(DevEmailDetails {
                student_email: record.email.clone(),
                parent_email: record.parent_email.clone(),
                registration_id,
                language,
            }));
        };

        let rendered = templates::render(record, language);
        let mut email = OutgoingEmail {
            from: self.sender(),
            to: record.email.clone(),
            subject: rendered.subject,
            html: rendered.html,
            text: rendered.text,
        };

        let student_email_id = transport.send(&email).await?;

        let parent_email_id = if record.parent_needs_copy() {
            email.to = record.parent_email.clone();
            transport.send(&email).await?
        } else {
            None
        };

        tracing::info!(
            registration_id = ?registration_id,
            transport = transport.name(),
            parent_copy = record.parent_needs_copy(),
            "Confirmation email dispatched"
        );
        Ok(DispatchOutcome::Sent {
            student_email_id,
            parent_email_id,
        })
    }
}
