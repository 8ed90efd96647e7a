//! `RoomService`: the reconciler running as an isolated Tokio task.
//!
//! The service owns a [`RoomManager`] and runs in its own task,
//! communicating with the outside world through channels. Nothing shares
//! the mutable state; everything reaches it as a message, and that is
//! also what keeps event processing strictly one-at-a-time.
//!
//! Two channels feed the task: the gateway's event stream (an
//! [`EventSource`]) and a command channel serviced through
//! [`RoomServiceHandle`]. The task interleaves them but never overlaps
//! two pieces of work.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use vestibule_gateway::{
    ChannelId, ChannelSnapshot, EventSource, Gateway, MemberId,
};
use vestibule_registry::{DeletionPredicate, EntryChannelConfig};
use vestibule_room::{Room, RoomError, RoomManager};

use crate::config::{ConfigError, ResolvedConfig};
use crate::VestibuleError;

/// Capacity of the handle's command channel. Callers awaiting a reply
/// back-pressure naturally, so this only needs to absorb short bursts.
const COMMAND_CHANNEL_SIZE: usize = 64;

/// Commands sent to the service task through its channel.
///
/// Each variant represents an operation the outside world can request.
/// The `oneshot::Sender` carried by a variant is its reply channel: the
/// caller sends the command and waits for the response there.
pub(crate) enum ServiceCommand {
    RegisterEntry {
        config: EntryChannelConfig,
        reply: oneshot::Sender<()>,
    },
    DeregisterEntry {
        entry: ChannelId,
        reply: oneshot::Sender<bool>,
    },
    AddGlobalPredicate {
        predicate: DeletionPredicate,
        reply: oneshot::Sender<()>,
    },
    ListRooms {
        entry: ChannelId,
        reply: oneshot::Sender<Vec<Room>>,
    },
    FindRoom {
        member: MemberId,
        reply: oneshot::Sender<Option<Room>>,
    },
    TotalRooms {
        reply: oneshot::Sender<usize>,
    },
    MemberRoomChannel {
        member: MemberId,
        reply: oneshot::Sender<Result<ChannelSnapshot, RoomError>>,
    },
    Shutdown,
}

// =========================================================================
// Builder
// =========================================================================

/// Builder for configuring and starting a room service.
///
/// # Example
///
/// ```rust,ignore
/// use vestibule::{ResolvedConfig, RoomService};
///
/// let config = ResolvedConfig::from_json(&doc)?;
/// let service = RoomService::builder()
///     .with_config(config)?
///     .build(Arc::new(gateway))?;
/// let handle = service.run(events);
/// ```
pub struct RoomServiceBuilder {
    entries: Vec<EntryChannelConfig>,
    global_predicates: Vec<DeletionPredicate>,
}

impl RoomServiceBuilder {
    /// Creates a new builder with no entries registered.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            global_predicates: Vec::new(),
        }
    }

    /// Adds one entry channel. Useful for program-built configurations
    /// with custom naming or deletion closures.
    pub fn entry(mut self, config: EntryChannelConfig) -> Self {
        self.entries.push(config);
        self
    }

    /// Adds a deletion predicate that applies to every room.
    pub fn global_predicate(mut self, predicate: DeletionPredicate) -> Self {
        self.global_predicates.push(predicate);
        self
    }

    /// Adds every entry from a parsed configuration document.
    ///
    /// The document is validated again here, so `ResolvedConfig` values
    /// assembled by hand get the same checks as parsed ones.
    pub fn with_config(mut self, config: ResolvedConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let ResolvedConfig { guild_id, entries } = config;
        for seed in entries {
            self.entries.push(seed.into_config(&guild_id));
        }
        Ok(self)
    }

    /// Builds the service around a gateway.
    ///
    /// Fails if the gateway cannot deliver the event kinds the
    /// reconciler depends on.
    pub fn build<G: Gateway>(
        self,
        gateway: Arc<G>,
    ) -> Result<RoomService<G>, ConfigError> {
        let capabilities = gateway.capabilities();
        if !capabilities.voice_presence_events {
            return Err(ConfigError::MissingCapability("voice presence events"));
        }
        if !capabilities.channel_delete_events {
            return Err(ConfigError::MissingCapability("channel delete events"));
        }

        let mut manager = RoomManager::new(gateway);
        for config in self.entries {
            manager.register_entry(config);
        }
        for predicate in self.global_predicates {
            manager.add_global_predicate(predicate);
        }

        Ok(RoomService { manager })
    }
}

impl Default for RoomServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Service task
// =========================================================================

/// A configured room service, ready to run.
///
/// Call [`run()`](Self::run) with an event source to start the task and
/// get a [`RoomServiceHandle`] back.
pub struct RoomService<G: Gateway> {
    manager: RoomManager<G>,
}

impl<G: Gateway> RoomService<G> {
    /// Creates a new builder.
    pub fn builder() -> RoomServiceBuilder {
        RoomServiceBuilder::new()
    }

    /// Spawns the service task and returns a handle to it.
    ///
    /// The task runs until the event stream ends, a
    /// [`shutdown`](RoomServiceHandle::shutdown) command arrives, or the
    /// runtime is dropped. Rooms that exist on the platform at that
    /// point stay there; a later run picks them up through their own
    /// presence events.
    pub fn run<E: EventSource>(self, mut events: E) -> RoomServiceHandle {
        let (tx, mut rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let mut manager = self.manager;

        tokio::spawn(async move {
            tracing::info!("room service started");
            let mut commands_open = true;

            loop {
                tokio::select! {
                    event = events.next_event() => match event {
                        Some(event) => manager.handle_event(event).await,
                        None => {
                            tracing::info!("event stream closed, room service stopping");
                            break;
                        }
                    },
                    command = rx.recv(), if commands_open => match command {
                        Some(ServiceCommand::Shutdown) => {
                            tracing::info!("room service shutting down");
                            break;
                        }
                        Some(command) => apply(&mut manager, command).await,
                        // All handles dropped; keep serving events.
                        None => commands_open = false,
                    },
                }
            }

            tracing::info!("room service stopped");
        });

        RoomServiceHandle { sender: tx }
    }
}

async fn apply<G: Gateway>(manager: &mut RoomManager<G>, command: ServiceCommand) {
    match command {
        ServiceCommand::RegisterEntry { config, reply } => {
            manager.register_entry(config);
            let _ = reply.send(());
        }
        ServiceCommand::DeregisterEntry { entry, reply } => {
            let _ = reply.send(manager.deregister_entry(&entry));
        }
        ServiceCommand::AddGlobalPredicate { predicate, reply } => {
            manager.add_global_predicate(predicate);
            let _ = reply.send(());
        }
        ServiceCommand::ListRooms { entry, reply } => {
            let _ = reply.send(manager.rooms_for(&entry));
        }
        ServiceCommand::FindRoom { member, reply } => {
            let _ = reply.send(manager.room_for_member(&member));
        }
        ServiceCommand::TotalRooms { reply } => {
            let _ = reply.send(manager.total_rooms());
        }
        ServiceCommand::MemberRoomChannel { member, reply } => {
            let _ = reply.send(manager.member_room_channel(&member).await);
        }
        // Intercepted by the run loop.
        ServiceCommand::Shutdown => {}
    }
}

// =========================================================================
// Handle
// =========================================================================

/// Handle to a running room service. Used to send commands to it.
///
/// Cloning is cheap; this wraps a single `mpsc::Sender`. Every method
/// returns [`VestibuleError::ServiceClosed`] once the service task has
/// stopped.
#[derive(Clone)]
pub struct RoomServiceHandle {
    sender: mpsc::Sender<ServiceCommand>,
}

impl RoomServiceHandle {
    /// Registers an entry channel (or replaces its configuration).
    pub async fn register_entry(
        &self,
        config: EntryChannelConfig,
    ) -> Result<(), VestibuleError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(ServiceCommand::RegisterEntry {
                config,
                reply: reply_tx,
            })
            .await
            .map_err(|_| VestibuleError::ServiceClosed)?;
        reply_rx.await.map_err(|_| VestibuleError::ServiceClosed)
    }

    /// Removes an entry channel. Returns whether it was registered.
    /// Existing rooms under it are unaffected.
    pub async fn deregister_entry(
        &self,
        entry: ChannelId,
    ) -> Result<bool, VestibuleError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(ServiceCommand::DeregisterEntry {
                entry,
                reply: reply_tx,
            })
            .await
            .map_err(|_| VestibuleError::ServiceClosed)?;
        reply_rx.await.map_err(|_| VestibuleError::ServiceClosed)
    }

    /// Adds a deletion predicate that applies to every room.
    pub async fn add_global_predicate(
        &self,
        predicate: DeletionPredicate,
    ) -> Result<(), VestibuleError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(ServiceCommand::AddGlobalPredicate {
                predicate,
                reply: reply_tx,
            })
            .await
            .map_err(|_| VestibuleError::ServiceClosed)?;
        reply_rx.await.map_err(|_| VestibuleError::ServiceClosed)
    }

    /// Lists the rooms spawned from one entry channel, oldest first.
    pub async fn list_rooms(
        &self,
        entry: ChannelId,
    ) -> Result<Vec<Room>, VestibuleError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(ServiceCommand::ListRooms {
                entry,
                reply: reply_tx,
            })
            .await
            .map_err(|_| VestibuleError::ServiceClosed)?;
        reply_rx.await.map_err(|_| VestibuleError::ServiceClosed)
    }

    /// Finds the room a member owns, if any.
    pub async fn find_room_for_member(
        &self,
        member: MemberId,
    ) -> Result<Option<Room>, VestibuleError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(ServiceCommand::FindRoom {
                member,
                reply: reply_tx,
            })
            .await
            .map_err(|_| VestibuleError::ServiceClosed)?;
        reply_rx.await.map_err(|_| VestibuleError::ServiceClosed)
    }

    /// Counts tracked rooms across all entries.
    pub async fn total_rooms(&self) -> Result<usize, VestibuleError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(ServiceCommand::TotalRooms { reply: reply_tx })
            .await
            .map_err(|_| VestibuleError::ServiceClosed)?;
        reply_rx.await.map_err(|_| VestibuleError::ServiceClosed)
    }

    /// Fetches a live snapshot of the room a member owns.
    pub async fn member_room_channel(
        &self,
        member: MemberId,
    ) -> Result<ChannelSnapshot, VestibuleError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(ServiceCommand::MemberRoomChannel {
                member,
                reply: reply_tx,
            })
            .await
            .map_err(|_| VestibuleError::ServiceClosed)?;
        let result = reply_rx
            .await
            .map_err(|_| VestibuleError::ServiceClosed)?;
        Ok(result?)
    }

    /// Asks the service task to stop. Idempotent from the caller's side:
    /// once the task is gone this returns `ServiceClosed`.
    pub async fn shutdown(&self) -> Result<(), VestibuleError> {
        self.sender
            .send(ServiceCommand::Shutdown)
            .await
            .map_err(|_| VestibuleError::ServiceClosed)
    }
}
