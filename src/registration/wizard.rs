//! RegistrationWizard: the synchronous five-step state machine.
//!
//! The wizard never sleeps or performs I/O. Simulated calls (OTP check,
//! payment) are split into `begin_*` / `finish_*` pairs: `begin_*` hands out
//! a [`Ticket`] bound to the current step epoch, and `finish_*` only applies
//! a result whose ticket is still current. Whoever drives the wizard runs the
//! delay in between.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

use super::model::{RegistrationId, RegistrationRecord, Role};
use super::otp::{CellOutcome, OtpInput, ResendTimer};
use super::payment::{PaymentReceipt, PaymentSummary};
use super::state::{StepState, WizardStep};
use super::validation::{
    FormErrors, FormField, RegistrationForm, sanitize_phone, validate_form, validate_phone,
};
use crate::error::WizardError;
use crate::i18n::{Language, Text, messages};

/// Proof that a simulated call was started on a given step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    step: WizardStep,
    epoch: u64,
}

/// A started OTP check: what to verify and the ticket to finish it with.
#[derive(Debug, Clone)]
pub struct OtpCheck {
    pub ticket: Ticket,
    pub phone: String,
    pub code: String,
}

/// Result of a finished OTP check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpOutcome {
    Verified,
    Rejected,
}

/// Holds the accumulator record and the current step.
#[derive(Debug, Clone)]
pub struct RegistrationWizard {
    state: StepState,
    record: RegistrationRecord,
    display_language: Language,
    otp: OtpInput,
    resend: ResendTimer,
    form: RegistrationForm,
    form_errors: FormErrors,
    /// Inline error for the phone / OTP steps.
    notice: Option<Text>,
    /// Step whose simulated call is still running.
    in_flight: Option<WizardStep>,
    receipt: Option<PaymentReceipt>,
}

impl RegistrationWizard {
    pub fn new(display_language: Language, resend_window: Duration, now: DateTime<Utc>) -> Self {
        Self {
            state: StepState::default(),
            record: RegistrationRecord::default(),
            display_language,
            otp: OtpInput::default(),
            resend: ResendTimer::start(now, resend_window),
            form: RegistrationForm::default(),
            form_errors: FormErrors::default(),
            notice: None,
            in_flight: None,
            receipt: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.state.step()
    }

    pub fn record(&self) -> &RegistrationRecord {
        &self.record
    }

    pub fn display_language(&self) -> Language {
        self.display_language
    }

    pub fn set_display_language(&mut self, language: Language) {
        self.display_language = language;
    }

    pub fn form(&self) -> &RegistrationForm {
        &self.form
    }

    pub fn form_errors(&self) -> &FormErrors {
        &self.form_errors
    }

    pub fn otp(&self) -> &OtpInput {
        &self.otp
    }

    /// Whether a simulated call is running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Localized inline error, if any.
    pub fn notice(&self) -> Option<&'static str> {
        self.notice.map(|t| t.get(self.display_language))
    }

    /// Whether `ticket` still refers to the current step visit.
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.step == self.state.step() && ticket.epoch == self.state.epoch()
    }

    fn require(&self, step: WizardStep, action: &'static str) -> Result<(), WizardError> {
        if self.state.step() != step {
            return Err(WizardError::WrongStep {
                step: self.state.step(),
                action,
            });
        }
        Ok(())
    }

    /// OTP cells are locked while their check is running.
    fn require_idle_otp(&self, action: &'static str) -> Result<(), WizardError> {
        self.require(WizardStep::Otp, action)?;
        if self.in_flight.is_some() {
            return Err(WizardError::Busy(WizardStep::Otp));
        }
        Ok(())
    }

    fn ticket(&self) -> Ticket {
        Ticket {
            step: self.state.step(),
            epoch: self.state.epoch(),
        }
    }

    /// Reset per-screen state when a step is (re-)entered.
    fn enter_current(&mut self, now: DateTime<Utc>) {
        self.notice = None;
        self.in_flight = None;
        match self.state.step() {
            WizardStep::Otp => {
                self.otp.clear();
                self.resend.restart(now);
            }
            WizardStep::Form => {
                self.form = RegistrationForm::prefilled(&self.record, self.display_language);
                self.form_errors = FormErrors::default();
            }
            WizardStep::Phone | WizardStep::Payment | WizardStep::Success => {}
        }
    }

    fn advance(&mut self, now: DateTime<Utc>) -> Result<WizardStep, WizardError> {
        let from = self.state.step();
        let next = self.state.advance().map_err(|_| WizardError::WrongStep {
            step: from,
            action: "advance",
        })?;
        self.enter_current(now);
        tracing::debug!(from = %from, to = %next, "Wizard advanced");
        Ok(next)
    }

    // ── Phone ───────────────────────────────────────────────────────

    /// Submit the phone step.
    pub fn submit_phone(
        &mut self,
        raw_phone: &str,
        role: Role,
        accepted_terms: bool,
        now: DateTime<Utc>,
    ) -> Result<WizardStep, WizardError> {
        self.require(WizardStep::Phone, "submit_phone")?;
        let phone = match validate_phone(raw_phone, accepted_terms) {
            Ok(phone) => phone,
            Err(rejection) => {
                self.notice = Some(rejection.message());
                return Err(WizardError::Phone(rejection));
            }
        };
        self.record.merge_contact(&phone, role);
        self.advance(now)
    }

    // ── OTP ─────────────────────────────────────────────────────────

    pub fn otp_input(&mut self, index: usize, value: &str) -> Result<CellOutcome, WizardError> {
        self.require_idle_otp("otp_input")?;
        let outcome = self
            .otp
            .input(index, value)
            .ok_or(WizardError::CellOutOfRange(index))?;
        self.notice = None;
        Ok(outcome)
    }

    pub fn otp_backspace(&mut self, index: usize) -> Result<usize, WizardError> {
        self.require_idle_otp("otp_backspace")?;
        self.otp.backspace(index).ok_or(WizardError::CellOutOfRange(index))
    }

    pub fn otp_paste(&mut self, text: &str) -> Result<CellOutcome, WizardError> {
        self.require_idle_otp("otp_paste")?;
        Ok(self.otp.paste(text))
    }

    /// Start verifying the entered code.
    pub fn begin_otp_check(&mut self) -> Result<OtpCheck, WizardError> {
        self.require(WizardStep::Otp, "verify_otp")?;
        if self.in_flight.is_some() {
            return Err(WizardError::Busy(WizardStep::Otp));
        }
        if !self.otp.is_complete() {
            self.notice = Some(messages::OTP_INCOMPLETE);
            return Err(WizardError::IncompleteOtp);
        }
        self.notice = None;
        self.in_flight = Some(WizardStep::Otp);
        Ok(OtpCheck {
            ticket: self.ticket(),
            phone: self.record.phone.clone(),
            code: self.otp.code(),
        })
    }

    /// Apply the verifier's answer. A wrong code clears every cell, shows
    /// the hint and refocuses the first cell.
    pub fn finish_otp_check(
        &mut self,
        ticket: Ticket,
        accepted: bool,
        now: DateTime<Utc>,
    ) -> Result<OtpOutcome, WizardError> {
        if !self.is_current(&ticket) {
            return Err(WizardError::Stale(ticket.step));
        }
        self.in_flight = None;
        if accepted {
            self.advance(now)?;
            Ok(OtpOutcome::Verified)
        } else {
            self.otp.clear();
            self.notice = Some(messages::OTP_INVALID);
            Ok(OtpOutcome::Rejected)
        }
    }

    /// Seconds until "resend" unlocks.
    pub fn resend_remaining(&self, now: DateTime<Utc>) -> u64 {
        self.resend.remaining_secs(now)
    }

    /// Restart the countdown and clear the input. No code is regenerated.
    pub fn resend_otp(&mut self, now: DateTime<Utc>) -> Result<(), WizardError> {
        self.require_idle_otp("resend_otp")?;
        if !self.resend.can_resend(now) {
            return Err(WizardError::ResendLocked {
                remaining_secs: self.resend.remaining_secs(now),
            });
        }
        self.resend.restart(now);
        self.otp.clear();
        self.notice = None;
        Ok(())
    }

    // ── Form ────────────────────────────────────────────────────────

    /// Edit one form field; its error (if any) goes away.
    pub fn update_form_field(&mut self, field: FormField, value: &str) -> Result<(), WizardError> {
        self.require(WizardStep::Form, "update_form")?;
        self.form.set(field, value);
        self.form_errors.clear(field);
        Ok(())
    }

    /// Validate and submit the details form. `form` replaces the current
    /// values when given.
    pub fn submit_form(
        &mut self,
        form: Option<RegistrationForm>,
        now: DateTime<Utc>,
    ) -> Result<WizardStep, WizardError> {
        self.require(WizardStep::Form, "submit_form")?;
        if let Some(mut form) = form {
            form.parent_phone = sanitize_phone(&form.parent_phone);
            self.form = form;
        }
        match validate_form(&self.form, self.display_language) {
            Ok(details) => {
                self.record.merge_details(&details);
                self.advance(now)
            }
            Err(errors) => {
                self.form_errors = errors.clone();
                Err(WizardError::InvalidForm(errors))
            }
        }
    }

    // ── Payment ─────────────────────────────────────────────────────

    pub fn payment_summary(&self) -> PaymentSummary {
        PaymentSummary::from_record(&self.record, self.display_language)
    }

    /// Start the simulated payment.
    pub fn begin_payment(&mut self) -> Result<Ticket, WizardError> {
        self.require(WizardStep::Payment, "pay")?;
        if self.in_flight.is_some() {
            return Err(WizardError::Busy(WizardStep::Payment));
        }
        self.in_flight = Some(WizardStep::Payment);
        Ok(self.ticket())
    }

    /// Apply a completed payment: move to `success` and assign the
    /// registration id.
    pub fn finish_payment<R: Rng + ?Sized>(
        &mut self,
        ticket: Ticket,
        receipt: PaymentReceipt,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<RegistrationId, WizardError> {
        if !self.is_current(&ticket) {
            return Err(WizardError::Stale(ticket.step));
        }
        self.in_flight = None;
        self.receipt = Some(receipt);
        self.advance(now)?;
        self.record.assign_registration_id(RegistrationId::generate(rng));
        self.record
            .registration_id
            .clone()
            .ok_or(WizardError::Stale(WizardStep::Payment))
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Move exactly one step left. Not available on the first and terminal
    /// steps. Any in-flight simulated call becomes stale.
    pub fn back(&mut self, now: DateTime<Utc>) -> Result<WizardStep, WizardError> {
        let from = self.state.step();
        let previous = self
            .state
            .retreat()
            .map_err(|_| WizardError::CannotGoBack(from))?;
        self.enter_current(now);
        tracing::debug!(from = %from, to = %previous, "Wizard went back");
        Ok(previous)
    }

    // ── View ────────────────────────────────────────────────────────

    /// Snapshot for rendering the current step.
    pub fn view(&self, now: DateTime<Utc>) -> WizardView {
        let step = self.state.step();
        let lang = self.display_language;
        WizardView {
            step,
            step_index: step.index(),
            display_language: lang,
            record: self.record.clone(),
            error: self.notice(),
            busy: self.is_busy(),
            otp: (step == WizardStep::Otp).then(|| OtpView {
                phone: self.record.phone.clone(),
                cells: self.otp.cells(),
                focus: self.otp.focus(),
                resend_in_secs: self.resend.remaining_secs(now),
                can_resend: self.resend.can_resend(now),
            }),
            form: (step == WizardStep::Form).then(|| FormView {
                values: self.form.clone(),
                errors: self.form_errors.localized(lang),
                focus_field: self.form_errors.first(),
            }),
            payment: (step == WizardStep::Payment).then(|| self.payment_summary()),
            registration_id: self.record.registration_id.clone(),
            receipt: self.receipt.clone(),
        }
    }
}

/// OTP screen state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpView {
    pub phone: String,
    pub cells: Vec<String>,
    pub focus: usize,
    pub resend_in_secs: u64,
    pub can_resend: bool,
}

/// Details form screen state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub values: RegistrationForm,
    pub errors: BTreeMap<FormField, &'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_field: Option<FormField>,
}

/// Render-ready snapshot of a wizard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub step: WizardStep,
    pub step_index: usize,
    pub display_language: Language,
    pub record: RegistrationRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    pub busy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<OtpView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<FormView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<RegistrationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<PaymentReceipt>,
}
