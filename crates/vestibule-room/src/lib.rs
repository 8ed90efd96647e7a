//! Room tracking and reconciliation for Vestibule.
//!
//! This crate is the engine's core: the [`RoomTracker`] holds every
//! room currently under management, and the [`RoomManager`] applies
//! platform events against it. State here is authoritative for
//! ownership and lifecycle phase; occupancy is always re-read from the
//! platform at decision time.

mod error;
mod manager;
mod room;
mod tracker;

pub use error::RoomError;
pub use manager::RoomManager;
pub use room::{Room, RoomPhase};
pub use tracker::RoomTracker;
