//! Unified error type for the Vestibule framework.

use vestibule_gateway::GatewayError;
use vestibule_room::RoomError;

use crate::config::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `vestibule` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum VestibuleError {
    /// A configuration error (malformed document, bad ids, missing
    /// gateway capability).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A gateway-level error (platform calls failing).
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A room-level error (no room for a member, wrong channel kind).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The service task has stopped and its handle can no longer
    /// reach it.
    #[error("room service is no longer running")]
    ServiceClosed,
}
