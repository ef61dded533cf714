//! Material Hooks - receives SCM push webhooks and reports which git materials changed.
//!
//! This library provides webhook authentication, push payload parsing, repository
//! URL expansion, and the HTTP endpoints that tie them to a material updater.

pub mod config;
pub mod materials;
pub mod secret;
pub mod server;
pub mod types;
pub mod webhooks;

#[cfg(test)]
pub(crate) mod test_utils;
