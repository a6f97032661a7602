//! Client side of the contact form: a submit state machine plus the HTTP
//! transport it uses to reach the service.

pub mod form;
pub mod transport;

pub use form::{
    ContactFormController, DEFAULT_REVERT_AFTER, FormError, FormFields, FormStatus, SubmitOutcome,
};
pub use transport::{HttpTransport, SubmitTransport, TransportOutcome};
