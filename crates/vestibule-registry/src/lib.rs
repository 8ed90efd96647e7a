//! Entry channel registry for Vestibule.
//!
//! An entry channel is a voice channel that acts as a door: any member
//! who connects to it gets a room of their own. This crate holds the
//! registry of those doors and the policies hanging off each one:
//!
//! - [`EntryChannelConfig`]: one entry channel's category, naming, and
//!   deletion behavior
//! - [`NamePolicy`]: how new rooms are named
//! - [`DeletionPolicy`] and [`DeletionPredicate`]: when idle rooms get
//!   reclaimed
//! - [`EntryRegistry`]: the lookup table the lifecycle engine consults
//!   on every event

mod config;
mod naming;
mod policy;
mod registry;

pub use config::EntryChannelConfig;
pub use naming::{NamePolicy, NameRequest};
pub use policy::{DeletionContext, DeletionPolicy, DeletionPredicate};
pub use registry::EntryRegistry;
