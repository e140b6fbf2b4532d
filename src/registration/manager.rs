//! RegistrationManager: owns wizard sessions and runs their simulated calls.
//!
//! Wizard transitions happen synchronously under the session write lock.
//! OTP verification and payment run in spawned tasks that sleep outside the
//! lock, apply their result through the wizard's ticket check, then report
//! back over a oneshot. Going back or discarding a session aborts the task;
//! a caller waiting on it gets [`WizardError::Cancelled`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{RwLock, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::model::{RegistrationRecord, Role};
use super::otp::{CellOutcome, OtpVerifier};
use super::payment::{ENTRY_FEE, PaymentGateway};
use super::validation::{FormField, RegistrationForm};
use super::wizard::{OtpOutcome, RegistrationWizard, WizardView};
use crate::config::WizardConfig;
use crate::email::{DispatchOutcome, EmailDispatcher};
use crate::error::WizardError;
use crate::i18n::{Language, messages};

/// Upper bound between two idle-session sweeps.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Confirmation email progress, shown as a banner on the success step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    Sending,
    Sent,
    Error,
}

impl EmailStatus {
    fn message(&self, language: Language) -> &'static str {
        match self {
            Self::Sending => messages::EMAIL_SENDING.get(language),
            Self::Sent => messages::EMAIL_SENT.get(language),
            Self::Error => messages::EMAIL_FAILED.get(language),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailBanner {
    pub status: EmailStatus,
    pub message: &'static str,
}

/// A session as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub wizard: WizardView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailBanner>,
}

struct Session {
    wizard: RegistrationWizard,
    /// Running simulated call, if any.
    pending: Option<JoinHandle<()>>,
    /// Set once the confirmation email has been dispatched.
    email: Option<EmailStatus>,
    /// Last client request that touched this session.
    last_activity: DateTime<Utc>,
}

impl Session {
    fn touch(&mut self) {
        self.last_activity = Utc::now();
    }


    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    fn view(&self, id: Uuid) -> SessionView {
        let language = self.wizard.display_language();
        SessionView {
            session_id: id,
            wizard: self.wizard.view(Utc::now()),
            email: self.email.map(|status| EmailBanner {
                status,
                message: status.message(language),
            }),
        }
    }
}

type Sessions = Arc<RwLock<HashMap<Uuid, Session>>>;

/// Coordinates wizard sessions, the OTP verifier, the payment gateway and
/// the confirmation email.
pub struct RegistrationManager {
    config: WizardConfig,
    verifier: Arc<dyn OtpVerifier>,
    gateway: Arc<dyn PaymentGateway>,
    email: Arc<EmailDispatcher>,
    sessions: Sessions,
}

impl RegistrationManager {
    pub fn new(
        config: WizardConfig,
        verifier: Arc<dyn OtpVerifier>,
        gateway: Arc<dyn PaymentGateway>,
        email: Arc<EmailDispatcher>,
    ) -> Self {
        Self {
            config,
            verifier,
            gateway,
            email,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start a new wizard on the phone step.
    pub async fn create_session(&self, display_language: Language) -> SessionView {
        let id = Uuid::new_v4();
        let session = Session {
            wizard: RegistrationWizard::new(display_language, self.config.resend_window, Utc::now()),
            pending: None,
            email: None,
            last_activity: Utc::now(),
        };
        let view = session.view(id);
        self.sessions.write().await.insert(id, session);
        tracing::info!(session_id = %id, language = %display_language, "Registration session created");
        view
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn view(&self, id: Uuid) -> Result<SessionView, WizardError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(WizardError::SessionNotFound(id))?;
        session.touch();
        Ok(session.view(id))
    }

    /// The accumulated record so far.
    #[cfg(test)]
    pub async fn record(&self, id: Uuid) -> Result<RegistrationRecord, WizardError> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(&id).ok_or(WizardError::SessionNotFound(id))?;
        Ok(session.wizard.record().clone())
    }

    /// Drop a session, cancelling anything in flight.
    pub async fn discard(&self, id: Uuid) -> Result<(), WizardError> {
        let mut session = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(WizardError::SessionNotFound(id))?;
        session.abort_pending();
        tracing::info!(session_id = %id, "Registration session discarded");
        Ok(())
    }

    /// Run `f` against a session's wizard under the write lock.
    async fn with_wizard<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut RegistrationWizard) -> Result<T, WizardError>,
    ) -> Result<(T, SessionView), WizardError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(WizardError::SessionNotFound(id))?;
        session.touch();
        let value = f(&mut session.wizard)?;
        Ok((value, session.view(id)))
    }

    /// Read a session's wizard without a state change.
    async fn inspect<T>(&self, id: Uuid, f: impl FnOnce(&RegistrationWizard) -> T) -> Result<T, WizardError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(WizardError::SessionNotFound(id))?;
        session.touch();
        Ok(f(&session.wizard))
    }

    // ── Idle sessions ───────────────────────────────────────────────

    /// Evict sessions untouched for at least `idle`, aborting any simulated
    /// call they still have running. Returns how many were evicted.
    pub async fn prune_idle_sessions(&self, idle: Duration) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| {
            let idle_for = (now - session.last_activity).to_std().unwrap_or_default();
            if idle_for < idle {
                return true;
            }
            session.abort_pending();
            tracing::debug!(session_id = %id, "Evicting idle registration session");
            false
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::info!(pruned, remaining = sessions.len(), "Pruned idle registration sessions");
        }
        pruned
    }

    /// Sweep idle sessions in the background until the handle is aborted.
    pub fn spawn_pruner(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let idle = self.config.session_idle_timeout;
        let every = (idle / 4).clamp(Duration::from_millis(10), PRUNE_INTERVAL);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await; // Skip immediate first tick
            loop {
                interval.tick().await;
                manager.prune_idle_sessions(idle).await;
            }
        })
    }

    // ── Phone ───────────────────────────────────────────────────────

    pub async fn submit_phone(
        &self,
        id: Uuid,
        phone: &str,
        role: Role,
        accepted_terms: bool,
    ) -> Result<SessionView, WizardError> {
        let (_, view) = self
            .with_wizard(id, |w| w.submit_phone(phone, role, accepted_terms, Utc::now()))
            .await?;
        tracing::info!(session_id = %id, role = %role, "Phone step submitted");
        Ok(view)
    }

    // ── OTP ─────────────────────────────────────────────────────────

    pub async fn enter_otp_digit(
        &self,
        id: Uuid,
        index: usize,
        value: &str,
    ) -> Result<(CellOutcome, SessionView), WizardError> {
        self.with_wizard(id, |w| w.otp_input(index, value)).await
    }

    pub async fn otp_backspace(&self, id: Uuid, index: usize) -> Result<SessionView, WizardError> {
        let (_, view) = self.with_wizard(id, |w| w.otp_backspace(index)).await?;
        Ok(view)
    }

    pub async fn paste_otp(&self, id: Uuid, text: &str) -> Result<(CellOutcome, SessionView), WizardError> {
        self.with_wizard(id, |w| w.otp_paste(text)).await
    }

    pub async fn resend_otp(&self, id: Uuid) -> Result<SessionView, WizardError> {
        let (_, view) = self.with_wizard(id, |w| w.resend_otp(Utc::now())).await?;
        tracing::info!(session_id = %id, "OTP resend requested");
        Ok(view)
    }

    /// Verify the entered code. Waits for the simulated delay; a wrong code
    /// leaves the session on the OTP step with cleared cells.
    pub async fn verify_otp(&self, id: Uuid) -> Result<(OtpOutcome, SessionView), WizardError> {
        let rx = {
            let mut sessions = self.sessions.write().await;
            let session = sessions.get_mut(&id).ok_or(WizardError::SessionNotFound(id))?;
            session.touch();
            let check = session.wizard.begin_otp_check()?;

            let (tx, rx) = oneshot::channel();
            let sessions = Arc::clone(&self.sessions);
            let verifier = Arc::clone(&self.verifier);
            let delay = self.config.otp_delay;

            session.pending = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let accepted = verifier.verify(&check.phone, &check.code).await;

                let result = {
                    let mut sessions = sessions.write().await;
                    match sessions.get_mut(&id) {
                        Some(session) => {
                            let result = session.wizard.finish_otp_check(check.ticket, accepted, Utc::now());
                            if result.is_ok() {
                                session.pending = None;
                            }
                            result
                        }
                        None => Err(WizardError::SessionNotFound(id)),
                    }
                };
                match &result {
                    Ok(outcome) => tracing::info!(session_id = %id, outcome = ?outcome, "OTP check finished"),
                    Err(e) => tracing::debug!(session_id = %id, error = %e, "OTP check result dropped"),
                }
                let _ = tx.send(result);
            }));
            rx
        };

        let outcome = rx.await.map_err(|_| WizardError::Cancelled)??;
        Ok((outcome, self.view(id).await?))
    }

    // ── Form ────────────────────────────────────────────────────────

    /// Current form values (prefilled from the record on entry).
    pub async fn form_defaults(&self, id: Uuid) -> Result<RegistrationForm, WizardError> {
        self.inspect(id, |w| w.form().clone()).await
    }

    pub async fn update_form_field(
        &self,
        id: Uuid,
        field: FormField,
        value: &str,
    ) -> Result<SessionView, WizardError> {
        let (_, view) = self.with_wizard(id, |w| w.update_form_field(field, value)).await?;
        Ok(view)
    }

    pub async fn submit_form(
        &self,
        id: Uuid,
        form: Option<RegistrationForm>,
    ) -> Result<SessionView, WizardError> {
        let (_, view) = self.with_wizard(id, |w| w.submit_form(form, Utc::now())).await?;
        tracing::info!(session_id = %id, "Details form accepted");
        Ok(view)
    }

    // ── Payment ─────────────────────────────────────────────────────

    /// Run the simulated payment. On completion the session reaches
    /// `success`, receives its registration id, and the confirmation email
    /// is dispatched in the background.
    pub async fn pay(&self, id: Uuid) -> Result<SessionView, WizardError> {
        let rx = {
            let mut sessions = self.sessions.write().await;
            let session = sessions.get_mut(&id).ok_or(WizardError::SessionNotFound(id))?;
            session.touch();
            let ticket = session.wizard.begin_payment()?;
            let record = session.wizard.record().clone();

            let (tx, rx) = oneshot::channel();
            let sessions = Arc::clone(&self.sessions);
            let gateway = Arc::clone(&self.gateway);
            let email = Arc::clone(&self.email);
            let delay = self.config.payment_delay;

            session.pending = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let receipt = gateway.charge(&record, ENTRY_FEE).await;

                let result = {
                    let mut guard = sessions.write().await;
                    match guard.get_mut(&id) {
                        Some(session) => {
                            let result = session.wizard.finish_payment(
                                ticket,
                                receipt,
                                &mut rand::thread_rng(),
                                Utc::now(),
                            );
                            if result.is_ok() {
                                session.pending = None;
                                if session.email.is_none() {
                                    session.email = Some(EmailStatus::Sending);
                                    let record = session.wizard.record().clone();
                                    // The email follows the competition language, the banner the site.
                                    let language =
                                        record.language.unwrap_or(session.wizard.display_language());
                                    spawn_confirmation(Arc::clone(&sessions), Arc::clone(&email), id, record, language);
                                }
                            }
                            result
                        }
                        None => Err(WizardError::SessionNotFound(id)),
                    }
                };
                match &result {
                    Ok(registration_id) => {
                        tracing::info!(session_id = %id, registration_id = %registration_id, "Registration complete")
                    }
                    Err(e) => tracing::debug!(session_id = %id, error = %e, "Payment result dropped"),
                }
                let _ = tx.send(result);
            }));
            rx
        };

        rx.await.map_err(|_| WizardError::Cancelled)??;
        self.view(id).await
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Step back once, cancelling any in-flight simulated call.
    pub async fn back(&self, id: Uuid) -> Result<SessionView, WizardError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(WizardError::SessionNotFound(id))?;
        session.touch();
        let step = session.wizard.back(Utc::now())?;
        session.abort_pending();
        tracing::info!(session_id = %id, step = %step, "Went back");
        Ok(session.view(id))
    }

    pub async fn set_language(&self, id: Uuid, language: Language) -> Result<SessionView, WizardError> {
        let (_, view) = self
            .with_wizard(id, |w| {
                w.set_display_language(language);
                Ok(())
            })
            .await?;
        Ok(view)
    }
}

/// Send the confirmation in the background. Only the session's email banner
/// reflects the outcome; the record is never touched.
fn spawn_confirmation(
    sessions: Sessions,
    email: Arc<EmailDispatcher>,
    id: Uuid,
    record: RegistrationRecord,
    language: Language,
) {
    tokio::spawn(async move {
        let status = match email.send_confirmation(&record, language).await {
            Ok(DispatchOutcome::Development(_)) => {
                tracing::info!(session_id = %id, "Confirmation email simulated (development mode)");
                EmailStatus::Sent
            }
            Ok(DispatchOutcome::Sent { .. }) => EmailStatus::Sent,
            Err(e) => {
                tracing::warn!(session_id = %id, error = %e, "Failed to send confirmation email");
                EmailStatus::Error
            }
        };
        if let Some(session) = sessions.write().await.get_mut(&id) {
            session.email = Some(status);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::dispatcher::tests::RecordingTransport;
    use crate::registration::model::RegistrationId;
    use crate::registration::otp::FixedCodeVerifier;
    use crate::registration::payment::SimulatedGateway;
    use crate::registration::state::WizardStep;
    use crate::registration::validation::tests::valid_form;

    fn config(delay_ms: u64) -> WizardConfig {
        WizardConfig {
            otp_delay: Duration::from_millis(delay_ms),
            payment_delay: Duration::from_millis(delay_ms),
            ..WizardConfig::default()
        }
    }

    fn manager_with(delay_ms: u64, email: EmailDispatcher) -> Arc<RegistrationManager> {
        Arc::new(RegistrationManager::new(
            config(delay_ms),
            Arc::new(FixedCodeVerifier::default()),
            Arc::new(SimulatedGateway),
            Arc::new(email),
        ))
    }

    fn manager(delay_ms: u64) -> Arc<RegistrationManager> {
        manager_with(delay_ms, EmailDispatcher::development().with_dev_delay(Duration::ZERO))
    }

    async fn at_otp(m: &RegistrationManager) -> Uuid {
        let id = m.create_session(Language::En).await.session_id;
        m.submit_phone(id, "9876543210", Role::Student, true).await.unwrap();
        id
    }

    async fn at_payment(m: &RegistrationManager) -> Uuid {
        let id = at_otp(m).await;
        m.paste_otp(id, "123456").await.unwrap();
        m.verify_otp(id).await.unwrap();
        m.submit_form(id, Some(valid_form())).await.unwrap();
        id
    }

    async fn wait_for_email(m: &RegistrationManager, id: Uuid) -> EmailStatus {
        for _ in 0..100 {
            let view = m.view(id).await.unwrap();
            if let Some(banner) = view.email {
                if banner.status != EmailStatus::Sending {
                    return banner.status;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("email never finished");
    }

    #[tokio::test]
    async fn full_flow_reaches_success() {
        let m = manager(5);
        let id = at_otp(&m).await;

        m.paste_otp(id, "111111").await.unwrap();
        let (outcome, view) = m.verify_otp(id).await.unwrap();
        assert_eq!(outcome, OtpOutcome::Rejected);
        assert_eq!(view.wizard.step, WizardStep::Otp);
        assert!(view.wizard.error.unwrap().contains("123456"));

        m.paste_otp(id, "123456").await.unwrap();
        let (outcome, view) = m.verify_otp(id).await.unwrap();
        assert_eq!(outcome, OtpOutcome::Verified);
        assert_eq!(view.wizard.step, WizardStep::Form);

        let view = m.submit_form(id, Some(valid_form())).await.unwrap();
        assert_eq!(view.wizard.step, WizardStep::Payment);

        let view = m.pay(id).await.unwrap();
        assert_eq!(view.wizard.step, WizardStep::Success);
        let reg_id = view.wizard.registration_id.unwrap();
        assert!(RegistrationId::is_well_formed(reg_id.as_str()));

        assert_eq!(wait_for_email(&m, id).await, EmailStatus::Sent);
        // Email outcome never changes the record
        assert_eq!(m.record(id).await.unwrap().registration_id, Some(reg_id));
    }

    #[tokio::test]
    async fn email_failure_only_sets_banner() {
        let transport = Arc::new(RecordingTransport {
            fail: true,
            ..Default::default()
        });
        let m = manager_with(1, EmailDispatcher::with_transport(transport, "hello@janapada.com"));
        let id = at_payment(&m).await;
        let view = m.pay(id).await.unwrap();
        assert_eq!(view.wizard.step, WizardStep::Success);

        assert_eq!(wait_for_email(&m, id).await, EmailStatus::Error);
        let view = m.view(id).await.unwrap();
        assert_eq!(view.wizard.step, WizardStep::Success);
        assert!(view.wizard.registration_id.is_some());
        assert_eq!(
            view.email.unwrap().message,
            "Failed to send confirmation email. Please contact support."
        );
    }

    #[tokio::test]
    async fn confirmation_goes_to_student_and_parent_once() {
        let transport = Arc::new(RecordingTransport::default());
        let m = manager_with(1, EmailDispatcher::with_transport(transport.clone(), "hello@janapada.com"));
        let id = at_payment(&m).await;
        m.pay(id).await.unwrap();
        assert_eq!(wait_for_email(&m, id).await, EmailStatus::Sent);

        let sent = transport.sent.lock().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "ananya@example.com");
        assert!(sent[0].subject.starts_with("Registration Confirmed - JAN2026-"));
    }

    #[tokio::test]
    async fn email_uses_competition_language() {
        let transport = Arc::new(RecordingTransport::default());
        let m = manager_with(1, EmailDispatcher::with_transport(transport.clone(), "hello@janapada.com"));
        let id = at_otp(&m).await;
        m.paste_otp(id, "123456").await.unwrap();
        m.verify_otp(id).await.unwrap();
        let mut form = valid_form();
        form.language = "kn".into();
        m.submit_form(id, Some(form)).await.unwrap();
        m.pay(id).await.unwrap();
        assert_eq!(wait_for_email(&m, id).await, EmailStatus::Sent);

        let sent = transport.sent.lock().await;
        assert!(sent[0].subject.starts_with("ನೋಂದಣಿ ದೃಢೀಕರಿಸಲಾಗಿದೆ - JAN2026-"));
        // The banner stays in the display language
        let view = m.view(id).await.unwrap();
        assert_eq!(view.email.unwrap().message, messages::EMAIL_SENT.en);
    }

    #[tokio::test]
    async fn back_during_verify_cancels_it() {
        let m = manager(300);
        let id = at_otp(&m).await;
        m.paste_otp(id, "123456").await.unwrap();

        let waiter = {
            let m = Arc::clone(&m);
            tokio::spawn(async move { m.verify_otp(id).await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        let view = m.back(id).await.unwrap();
        assert_eq!(view.wizard.step, WizardStep::Phone);

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(WizardError::Cancelled)));
        assert_eq!(m.view(id).await.unwrap().wizard.step, WizardStep::Phone);
    }

    #[tokio::test]
    async fn back_during_payment_assigns_no_id() {
        let m = manager(200);
        let id = at_payment(&m).await;

        let waiter = {
            let m = Arc::clone(&m);
            tokio::spawn(async move { m.pay(id).await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        m.back(id).await.unwrap();

        assert!(matches!(waiter.await.unwrap(), Err(WizardError::Cancelled)));
        let view = m.view(id).await.unwrap();
        assert_eq!(view.wizard.step, WizardStep::Form);
        assert!(view.wizard.registration_id.is_none());
        assert!(view.email.is_none());
    }

    #[tokio::test]
    async fn concurrent_verify_is_busy() {
        let m = manager(200);
        let id = at_otp(&m).await;
        m.paste_otp(id, "123456").await.unwrap();

        let first = {
            let m = Arc::clone(&m);
            tokio::spawn(async move { m.verify_otp(id).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(matches!(m.verify_otp(id).await, Err(WizardError::Busy(WizardStep::Otp))));

        let (outcome, _) = first.await.unwrap().unwrap();
        assert_eq!(outcome, OtpOutcome::Verified);
    }

    #[tokio::test]
    async fn discard_removes_session() {
        let m = manager(1);
        let id = at_otp(&m).await;
        assert_eq!(m.session_count().await, 1);
        m.discard(id).await.unwrap();
        assert_eq!(m.session_count().await, 0);
        assert!(matches!(m.view(id).await, Err(WizardError::SessionNotFound(_))));
        assert!(matches!(m.discard(id).await, Err(WizardError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn idle_sessions_are_pruned() {
        let m = manager(1);
        let stale = m.create_session(Language::En).await.session_id;
        let active = m.create_session(Language::En).await.session_id;
        tokio::time::sleep(Duration::from_millis(120)).await;
        m.view(active).await.unwrap();

        assert_eq!(m.prune_idle_sessions(Duration::from_millis(100)).await, 1);
        assert_eq!(m.session_count().await, 1);
        assert!(matches!(m.view(stale).await, Err(WizardError::SessionNotFound(_))));
        assert!(m.view(active).await.is_ok());
    }

    #[tokio::test]
    async fn pruning_cancels_in_flight_call() {
        let m = manager(300);
        let id = at_otp(&m).await;
        m.paste_otp(id, "123456").await.unwrap();
        let waiter = {
            let m = Arc::clone(&m);
            tokio::spawn(async move { m.verify_otp(id).await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(m.prune_idle_sessions(Duration::ZERO).await, 1);
        assert!(matches!(waiter.await.unwrap(), Err(WizardError::Cancelled)));
    }

    #[tokio::test]
    async fn background_pruner_evicts_abandoned_sessions() {
        let m = Arc::new(RegistrationManager::new(
            WizardConfig {
                session_idle_timeout: Duration::from_millis(40),
                ..config(1)
            },
            Arc::new(FixedCodeVerifier::default()),
            Arc::new(SimulatedGateway),
            Arc::new(EmailDispatcher::development().with_dev_delay(Duration::ZERO)),
        ));
        for _ in 0..50 {
            m.create_session(Language::Kn).await;
        }
        let pruner = m.spawn_pruner();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(m.session_count().await, 0);
        pruner.abort();
    }

    #[tokio::test]
    async fn discard_during_verify_cancels_it() {
        let m = manager(300);
        let id = at_otp(&m).await;
        m.paste_otp(id, "123456").await.unwrap();
        let waiter = {
            let m = Arc::clone(&m);
            tokio::spawn(async move { m.verify_otp(id).await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        m.discard(id).await.unwrap();
        assert!(matches!(waiter.await.unwrap(), Err(WizardError::Cancelled)));
    }

    #[tokio::test]
    async fn form_defaults_prefill_parent_phone() {
        let m = manager(1);
        let id = m.create_session(Language::Kn).await.session_id;
        m.submit_phone(id, "9988776655", Role::Parent, true).await.unwrap();
        m.paste_otp(id, "123456").await.unwrap();
        m.verify_otp(id).await.unwrap();

        let form = m.form_defaults(id).await.unwrap();
        assert_eq!(form.parent_phone, "9988776655");
        assert_eq!(form.language, "kn");
    }

    #[tokio::test]
    async fn language_switch_relocalizes_errors() {
        let m = manager(1);
        let id = m.create_session(Language::En).await.session_id;
        let _ = m.submit_phone(id, "12", Role::Student, true).await;
        let view = m.set_language(id, Language::Kn).await.unwrap();
        assert_eq!(view.wizard.display_language, Language::Kn);
        assert_eq!(view.wizard.error, Some(messages::PHONE_INVALID.kn));
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let m = manager(1);
        let id = Uuid::new_v4();
        assert!(matches!(m.pay(id).await, Err(WizardError::SessionNotFound(_))));
        assert!(matches!(m.back(id).await, Err(WizardError::SessionNotFound(_))));
    }
}
