//! Outbound mail transports: the Resend HTTP API and an SMTP relay via lettre.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::parse_or;
use crate::error::{ConfigError, EmailError};

/// Placeholder shipped in sample env files; treated as "no key".
pub const PLACEHOLDER_API_KEY: &str = "your_resend_api_key_here";
pub const DEFAULT_FROM_EMAIL: &str = "hello@janapada.com";
const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";
const DEFAULT_SMTP_PORT: u16 = 587;

// ── Configuration ───────────────────────────────────────────────────

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

/// Email delivery configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub resend_api_key: Option<SecretString>,
    pub from_email: String,
    pub smtp: Option<SmtpConfig>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: None,
            from_email: DEFAULT_FROM_EMAIL.to_string(),
            smtp: None,
        }
    }
}

impl EmailConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let resend_api_key = get("RESEND_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && k != PLACEHOLDER_API_KEY)
            .map(SecretString::from);

        let from_email = get("FROM_EMAIL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FROM_EMAIL.to_string());

        let smtp = match get("EMAIL_SMTP_HOST").filter(|h| !h.trim().is_empty()) {
            Some(host) => Some(SmtpConfig {
                host,
                port: parse_or(&get, "EMAIL_SMTP_PORT", DEFAULT_SMTP_PORT)?,
                username: get("EMAIL_USERNAME").unwrap_or_default(),
                password: SecretString::from(get("EMAIL_PASSWORD").unwrap_or_default()),
            }),
            None => None,
        };

        Ok(Self {
            resend_api_key,
            from_email,
            smtp,
        })
    }

    /// No provider configured: mail is logged, not sent.
    pub fn is_development(&self) -> bool {
        self.resend_api_key.is_none() && self.smtp.is_none()
    }

    /// The transport to deliver through. Resend wins over SMTP when both are
    /// configured; `None` means development mode.
    pub fn transport(&self) -> Option<Arc<dyn MailTransport>> {
        if let Some(key) = &self.resend_api_key {
            return Some(Arc::new(ResendTransport::new(key.clone())));
        }
        self.smtp
            .as_ref()
            .map(|smtp| Arc::new(SmtpMailer::new(smtp.clone())) as Arc<dyn MailTransport>)
    }
}

// ── Transport trait ─────────────────────────────────────────────────

/// A fully rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    /// Display form, e.g. `JANAPADA <hello@janapada.com>`.
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Delivers one message. Returns the provider's message id when it has one.
#[async_trait]
pub trait MailTransport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, EmailError>;
}

// ── Resend ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: Option<String>,
}

/// Resend HTTP API transport.
pub struct ResendTransport {
    api_key: SecretString,
    endpoint: String,
    client: reqwest::Client,
}

impl ResendTransport {
    pub fn new(api_key: SecretString) -> Self {
        Self::with_endpoint(api_key, RESEND_ENDPOINT)
    }

    /// Point at a different API base (used against local fakes).
    pub fn with_endpoint(api_key: SecretString, endpoint: impl Into<String>) -> Self {
        Self {
            api_key,
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MailTransport for ResendTransport {
    fn name(&self) -> &'static str {
        "resend"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, EmailError> {
        let body = serde_json::json!({
            "from": email.from,
            "to": [email.to],
            "subject": email.subject,
            "html": email.html,
            "text": email.text,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::Transport {
                transport: self.name().into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ResendResponse = resp.json().await.map_err(|e| EmailError::Transport {
            transport: self.name().into(),
            reason: format!("Unreadable response: {e}"),
        })?;
        tracing::info!(to = %email.to, id = ?parsed.id, "Email sent via Resend");
        Ok(parsed.id)
    }
}

// ── SMTP ────────────────────────────────────────────────────────────

/// SMTP relay transport (lettre, blocking, run on the blocking pool).
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address.parse().map_err(|e: lettre::address::AddressError| EmailError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Build the MIME message with plain-text and HTML alternatives.
pub fn build_message(email: &OutgoingEmail) -> Result<Message, EmailError> {
    Message::builder()
        .from(parse_mailbox(&email.from)?)
        .to(parse_mailbox(&email.to)?)
        .subject(email.subject.clone())
        .multipart(MultiPart::alternative_plain_html(
            email.text.clone(),
            email.html.clone(),
        ))
        .map_err(|e| EmailError::Build(e.to_string()))
}

#[async_trait]
impl MailTransport for SmtpMailer {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, EmailError> {
        let message = build_message(email)?;
        let config = self.config.clone();

        let result = tokio::task::spawn_blocking(move || {
            let creds = Credentials::new(
                config.username.clone(),
                config.password.expose_secret().to_string(),
            );
            let transport = SmtpTransport::relay(&config.host)
                .map_err(|e| format!("SMTP relay error: {e}"))?
                .port(config.port)
                .credentials(creds)
                .build();
            transport
                .send(&message)
                .map(|_| ())
                .map_err(|e| format!("SMTP send failed: {e}"))
        })
        .await
        .map_err(|e| EmailError::Transport {
            transport: "smtp".into(),
            reason: format!("SMTP task panicked: {e}"),
        })?;

        result.map_err(|reason| EmailError::Transport {
            transport: "smtp".into(),
            reason,
        })?;
        tracing::info!(to = %email.to, "Email sent via SMTP");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn no_key_is_development() {
        let config = EmailConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.is_development());
        assert!(config.transport().is_none());
        assert_eq!(config.from_email, "hello@janapada.com");
    }

    #[test]
    fn placeholder_key_is_development() {
        let config = EmailConfig::from_lookup(lookup(&[("RESEND_API_KEY", PLACEHOLDER_API_KEY)])).unwrap();
        assert!(config.is_development());
    }

    #[test]
    fn real_key_selects_resend() {
        let config = EmailConfig::from_lookup(lookup(&[
            ("RESEND_API_KEY", "re_123"),
            ("FROM_EMAIL", "contest@janapada.org"),
            ("EMAIL_SMTP_HOST", "smtp.example.com"),
        ]))
        .unwrap();
        assert!(!config.is_development());
        assert_eq!(config.from_email, "contest@janapada.org");
        assert_eq!(config.transport().unwrap().name(), "resend");
    }

    #[test]
    fn smtp_only_selects_smtp() {
        let config = EmailConfig::from_lookup(lookup(&[
            ("EMAIL_SMTP_HOST", "smtp.example.com"),
            ("EMAIL_SMTP_PORT", "2525"),
        ]))
        .unwrap();
        assert!(!config.is_development());
        let smtp = config.smtp.as_ref().unwrap();
        assert_eq!(smtp.port, 2525);
        assert_eq!(config.transport().unwrap().name(), "smtp");
    }

    #[test]
    fn smtp_port_defaults_to_587() {
        let config = EmailConfig::from_lookup(lookup(&[("EMAIL_SMTP_HOST", "smtp.example.com")])).unwrap();
        assert_eq!(config.smtp.unwrap().port, 587);
    }

    #[test]
    fn bad_smtp_port_is_rejected() {
        let err = EmailConfig::from_lookup(lookup(&[
            ("EMAIL_SMTP_HOST", "smtp.example.com"),
            ("EMAIL_SMTP_PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "EMAIL_SMTP_PORT"));
    }

    /// What the fake Resend endpoint saw: Authorization header and JSON body.
    type Captured = Arc<tokio::sync::Mutex<Option<(String, serde_json::Value)>>>;

    /// Local stand-in for the Resend API. `/emails` accepts, `/reject` fails.
    async fn fake_resend() -> (String, Captured) {
        use axum::extract::State;
        use axum::http::{HeaderMap, StatusCode, header};
        use axum::routing::post;
        use axum::{Json, Router};

        async fn accept(
            State(captured): State<Captured>,
            headers: HeaderMap,
            Json(body): Json<serde_json::Value>,
        ) -> Json<serde_json::Value> {
            let auth = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            *captured.lock().await = Some((auth, body));
            Json(serde_json::json!({"id": "re_abc"}))
        }

        async fn reject() -> (StatusCode, &'static str) {
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid from address")
        }

        let captured: Captured = Arc::default();
        let app = Router::new()
            .route("/emails", post(accept))
            .route("/reject", post(reject))
            .with_state(Arc::clone(&captured));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), captured)
    }

    fn confirmation() -> OutgoingEmail {
        OutgoingEmail {
            from: "JANAPADA <hello@janapada.com>".into(),
            to: "ananya@example.com".into(),
            subject: "Registration Confirmed - JAN2026-0042".into(),
            html: "<p>hi</p>".into(),
            text: "hi".into(),
        }
    }

    #[tokio::test]
    async fn resend_posts_bearer_json_and_returns_id() {
        let (base, captured) = fake_resend().await;
        let transport = ResendTransport::with_endpoint(
            SecretString::from("re_test".to_string()),
            format!("{base}/emails"),
        );

        let id = transport.send(&confirmation()).await.unwrap();
        assert_eq!(id.as_deref(), Some("re_abc"));

        let (auth, body) = captured.lock().await.take().unwrap();
        assert_eq!(auth, "Bearer re_test");
        assert_eq!(body["from"], "JANAPADA <hello@janapada.com>");
        assert_eq!(body["to"], serde_json::json!(["ananya@example.com"]));
        assert_eq!(body["subject"], "Registration Confirmed - JAN2026-0042");
        assert_eq!(body["html"], "<p>hi</p>");
        assert_eq!(body["text"], "hi");
    }

    #[tokio::test]
    async fn resend_error_status_is_rejected() {
        let (base, captured) = fake_resend().await;
        let transport = ResendTransport::with_endpoint(
            SecretString::from("re_test".to_string()),
            format!("{base}/reject"),
        );

        let err = transport.send(&confirmation()).await.unwrap_err();
        match err {
            EmailError::Rejected { status, body } => {
                assert_eq!(status, 422);
                assert_eq!(body, "invalid from address");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(captured.lock().await.is_none());
    }

    #[test]
    fn message_builds_with_display_name() {
        let email = OutgoingEmail {
            from: "JANAPADA <hello@janapada.com>".into(),
            to: "ananya@example.com".into(),
            subject: "Registration Confirmed".into(),
            html: "<p>hi</p>".into(),
            text: "hi".into(),
        };
        assert!(build_message(&email).is_ok());
    }

    #[test]
    fn invalid_recipient_is_rejected() {
        let email = OutgoingEmail {
            from: "JANAPADA <hello@janapada.com>".into(),
            to: "not an address".into(),
            subject: "x".into(),
            html: String::new(),
            text: String::new(),
        };
        assert!(matches!(
            build_message(&email),
            Err(EmailError::InvalidAddress { .. })
        ));
    }
}
