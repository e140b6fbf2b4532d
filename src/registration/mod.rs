//! Registration wizard: a five-step flow from phone number to a paid entry.
//!
//! `wizard` holds the synchronous state machine, `manager` owns the live
//! sessions and runs the simulated OTP and payment calls, and `routes`
//! exposes both over REST.

pub mod manager;
pub mod model;
pub mod otp;
pub mod payment;
pub mod routes;
pub mod state;
pub mod validation;
pub mod wizard;

pub use manager::{EmailStatus, RegistrationManager, SessionView};
pub use model::{Category, RegistrationId, RegistrationRecord, Role};
pub use otp::{FixedCodeVerifier, OtpVerifier};
pub use payment::{PaymentGateway, SimulatedGateway};
pub use routes::{RegistrationRouteState, registration_routes};
pub use state::WizardStep;
pub use wizard::{OtpOutcome, RegistrationWizard, WizardView};
