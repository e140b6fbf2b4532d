//! Confirmation email: templates, transports, dispatch and the HTTP endpoint.

pub mod dispatcher;
pub mod routes;
pub mod templates;
pub mod transport;

pub use dispatcher::{DispatchOutcome, EmailDispatcher};
pub use routes::{EmailRouteState, email_routes};
pub use transport::{EmailConfig, MailTransport};
