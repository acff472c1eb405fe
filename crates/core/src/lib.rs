//! Domain layer for the portfolio content manager.
//!
//! Holds everything that does not touch the network or the database:
//! content type metadata, the closed record types and their validation,
//! the JSON envelopes exchanged with the REST collaborator, the upload
//! policy, and the synchronous edit-session state machine driven by the
//! admin editors.

pub mod content;
pub mod error;
pub mod records;
pub mod session;
pub mod subscriber;
pub mod types;
pub mod upload;
pub mod wire;
