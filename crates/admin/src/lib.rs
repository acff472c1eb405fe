//! Admin-side edit reconciliation for portfolio content.
//!
//! An [`reconciler::EditReconciler`] owns the working copy of one content
//! collection, tracks local edits, and turns them into bulk calls against
//! the content API through a [`transport::ResourceTransport`].

pub mod client;
pub mod error;
pub mod notice;
pub mod reconciler;
pub mod transport;
