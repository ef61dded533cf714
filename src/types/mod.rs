//! Core domain types for webhook processing.
//!
//! These types encode the invariants the material updater relies on: a branch
//! is always a short name, and a candidate URL set is never empty.

pub mod ids;
pub mod push;

pub use ids::{Branch, DeliveryId};
pub use push::{CandidateUrls, PushEvent, ScmKind};
