//! # Vestibule
//!
//! Ephemeral voice room lifecycle manager.
//!
//! Vestibule watches designated "entry" voice channels through a
//! platform [`Gateway`]. When a member joins an entry channel it creates
//! a personal voice room next to it and moves them in; when the room
//! later empties out it deletes the room again. Naming and reclamation
//! policy hangs off per-entry configuration.
//!
//! # Key types
//!
//! - [`Gateway`] / [`EventSource`] — the platform seam you implement
//! - [`EntryChannelConfig`] — one entry channel's policy bundle
//! - [`ResolvedConfig`] — the JSON startup document
//! - [`RoomService`] — the reconciler, running as a Tokio task
//! - [`RoomServiceHandle`] — send commands to the running service
//!
//! # Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vestibule::{ResolvedConfig, RoomService};
//!
//! let doc = std::fs::read_to_string("rooms.json")?;
//! let service = RoomService::builder()
//!     .with_config(ResolvedConfig::from_json(&doc)?)?
//!     .build(Arc::new(my_gateway))?;
//!
//! // `events` is your platform's event stream (an `EventSource`).
//! let handle = service.run(events);
//! ```

mod config;
mod error;
mod service;

pub use config::{
    ConfigError, DeletionChoice, DeletionMode, EntrySeed, NamingChoice,
    PredicateChoice, ResolvedConfig,
};
pub use error::VestibuleError;
pub use service::{RoomService, RoomServiceBuilder, RoomServiceHandle};

pub use vestibule_gateway::{
    is_snowflake, ChannelId, ChannelKind, ChannelSnapshot, EventSource, Gateway,
    GatewayCapabilities, GatewayError, GatewayEvent, GuildId, MemberId,
    MemberProfile, Occupant, PresenceChange, PresenceShape, CHANNEL_NAME_LIMIT,
};
pub use vestibule_registry::{
    DeletionContext, DeletionPolicy, DeletionPredicate, EntryChannelConfig,
    EntryRegistry, NamePolicy, NameRequest,
};
pub use vestibule_room::{Room, RoomError, RoomManager, RoomPhase, RoomTracker};

/// Installs a process-wide `tracing` subscriber that reads `RUST_LOG`.
///
/// Convenience for binaries; libraries should leave the subscriber
/// choice to their host. Panics if a subscriber is already installed.
pub fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
