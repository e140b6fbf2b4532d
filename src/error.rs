//! Error types for the JANAPADA registration service.

use uuid::Uuid;

use crate::registration::state::WizardStep;
use crate::registration::validation::{FormErrors, PhoneRejection};

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Key/value store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to open store: {0}")]
    Open(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Store used before init() or after teardown()")]
    NotInitialized,
}

/// Registration wizard errors.
///
/// Every variant except `SessionNotFound` leaves the session in place; the
/// user stays on the current step and may retry.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Action '{action}' is not available on step {step}")]
    WrongStep {
        step: WizardStep,
        action: &'static str,
    },

    #[error("Cannot go back from step {0}")]
    CannotGoBack(WizardStep),

    #[error("Phone step rejected: {0}")]
    Phone(PhoneRejection),

    #[error("OTP must have 6 digits")]
    IncompleteOtp,

    #[error("OTP cell index {0} is out of range")]
    CellOutOfRange(usize),

    #[error("A simulated call is already in flight on step {0}")]
    Busy(WizardStep),

    #[error("Form has {} invalid field(s)", .0.len())]
    InvalidForm(FormErrors),

    #[error("Completion for step {0} arrived after the wizard moved on")]
    Stale(WizardStep),

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Resend available in {remaining_secs}s")]
    ResendLocked { remaining_secs: u64 },

    #[error("Session {0} not found")]
    SessionNotFound(Uuid),
}

/// Email dispatch errors.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("Transport {transport} failed: {reason}")]
    Transport { transport: String, reason: String },

    #[error("Provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
