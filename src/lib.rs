//! Portfolio contact service — validate, persist and fan out contact form
//! submissions.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod server;
pub mod store;
pub mod submission;
pub mod validation;
