//! The command side of the platform boundary.

use std::future::Future;

use crate::{ChannelId, ChannelSnapshot, GatewayError, GuildId, MemberId};

/// Which event feeds a gateway implementation delivers.
///
/// The lifecycle engine is driven entirely by presence and deletion
/// events. A gateway connected without the right subscriptions would
/// leave it deaf, silently doing nothing, so the service checks these
/// flags once at construction and refuses to start on a mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayCapabilities {
    /// The gateway emits [`GatewayEvent::Presence`](crate::GatewayEvent::Presence)
    /// for voice-state changes.
    pub voice_presence_events: bool,
    /// The gateway emits [`GatewayEvent::ChannelDeleted`](crate::GatewayEvent::ChannelDeleted)
    /// when channels go away.
    pub channel_delete_events: bool,
}

impl GatewayCapabilities {
    /// Everything the lifecycle engine needs.
    pub fn all() -> Self {
        Self {
            voice_presence_events: true,
            channel_delete_events: true,
        }
    }
}

impl Default for GatewayCapabilities {
    fn default() -> Self {
        Self::all()
    }
}

/// Commands the lifecycle engine issues against the chat platform.
///
/// This trait is the only way the engine touches the outside world,
/// which is what makes the whole system testable: production wires in
/// a real platform client, tests wire in a recording fake.
///
/// # Trait bounds
///
/// - `Send + Sync` so one gateway can be shared by the event loop and
///   any introspection callers.
/// - `'static` because the gateway lives as long as the service task.
///
/// Every async method returns a `Send` future so the service loop can
/// run inside `tokio::spawn` regardless of the implementation.
///
/// # Example
///
/// ```rust
/// use vestibule_gateway::{
///     ChannelId, ChannelKind, ChannelSnapshot, Gateway, GatewayError,
///     GuildId, MemberId,
/// };
///
/// /// A gateway that pretends every call succeeded. Only for tests.
/// struct NullGateway;
///
/// impl Gateway for NullGateway {
///     async fn create_voice_channel(
///         &self,
///         _guild: &GuildId,
///         _name: &str,
///         _category: Option<&ChannelId>,
///         _reason: &str,
///     ) -> Result<ChannelId, GatewayError> {
///         Ok(ChannelId::new("118933165129315634"))
///     }
///
///     async fn move_member(
///         &self,
///         _guild: &GuildId,
///         _member: &MemberId,
///         _channel: &ChannelId,
///         _reason: &str,
///     ) -> Result<(), GatewayError> {
///         Ok(())
///     }
///
///     async fn delete_channel(
///         &self,
///         _channel: &ChannelId,
///         _reason: &str,
///     ) -> Result<(), GatewayError> {
///         Ok(())
///     }
///
///     async fn fetch_channel(
///         &self,
///         channel: &ChannelId,
///     ) -> Result<ChannelSnapshot, GatewayError> {
///         Ok(ChannelSnapshot {
///             id: channel.clone(),
///             kind: ChannelKind::Voice,
///             occupants: vec![],
///         })
///     }
/// }
/// ```
pub trait Gateway: Send + Sync + 'static {
    /// Creates a voice channel and returns the platform-assigned id.
    ///
    /// `category` places the new channel under a grouping header when
    /// given. `reason` lands in the platform's audit log.
    fn create_voice_channel(
        &self,
        guild: &GuildId,
        name: &str,
        category: Option<&ChannelId>,
        reason: &str,
    ) -> impl Future<Output = Result<ChannelId, GatewayError>> + Send;

    /// Moves a connected member into `channel`.
    ///
    /// Fails with [`GatewayError::MemberGone`] if the member
    /// disconnected between the triggering event and this call.
    fn move_member(
        &self,
        guild: &GuildId,
        member: &MemberId,
        channel: &ChannelId,
        reason: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Deletes a channel.
    ///
    /// [`GatewayError::AlreadyDeleted`] means someone beat the engine to
    /// it; callers treat that as success.
    fn delete_channel(
        &self,
        channel: &ChannelId,
        reason: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Fetches a point-in-time snapshot of a channel.
    fn fetch_channel(
        &self,
        channel: &ChannelId,
    ) -> impl Future<Output = Result<ChannelSnapshot, GatewayError>> + Send;

    /// Reports which event feeds this gateway provides.
    ///
    /// Defaults to everything. Implementations backed by a partial
    /// subscription must override this so misconfiguration surfaces at
    /// startup instead of as silence.
    fn capabilities(&self) -> GatewayCapabilities {
        GatewayCapabilities::all()
    }
}
