//! What the karma module needs from the bot runtime that hosts it.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// Capabilities the host supplies to the karma module.
///
/// Handlers are invoked serially by the host's event loop, so implementations
/// only need interior mutability for their own bookkeeping (e.g. a pending
/// save flag), never for cross-thread access.
pub trait HostContext {
    /// Ask the host to persist the module's state soon.
    fn request_save(&self);

    /// Deliver a text line to a chat channel.
    fn send_message(&self, channel: &str, text: &str);

    /// Location of the module's data file.
    fn data_file(&self) -> PathBuf;

    /// Bot-wide administrator.
    fn is_admin(&self, name: &str) -> bool;

    /// Trusted caller allowed to inspect other people's karma.
    fn is_allowlisted(&self, name: &str) -> bool;

    /// Wall clock used for vote cooldowns.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
