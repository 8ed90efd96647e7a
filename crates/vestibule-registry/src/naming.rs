//! Naming policies for freshly created rooms.

use std::fmt;
use std::sync::Arc;

use vestibule_gateway::CHANNEL_NAME_LIMIT;

/// Inputs a naming policy gets to work with.
#[derive(Debug, Clone, Copy)]
pub struct NameRequest<'a> {
    /// Display name of the member the room is being created for.
    pub owner_name: &'a str,
    /// How many rooms already hang off the same entry channel.
    pub existing_rooms: usize,
}

/// Produces the name for a room at creation time.
///
/// A policy is a function from [`NameRequest`] to a string. Two stock
/// policies cover the common cases; [`NamePolicy::custom`] accepts
/// anything else. Output longer than [`CHANNEL_NAME_LIMIT`] characters
/// is truncated before it reaches the platform, so a policy never has
/// to worry about the limit itself.
#[derive(Clone)]
pub struct NamePolicy(Arc<dyn Fn(&NameRequest<'_>) -> String + Send + Sync>);

impl NamePolicy {
    /// Numbered rooms: `#3 maria` for the third room under an entry.
    pub fn numbered() -> Self {
        Self::custom(|req| format!("#{} {}", req.existing_rooms + 1, req.owner_name))
    }

    /// Possessive rooms: `maria's call`.
    pub fn owner_call() -> Self {
        Self::custom(|req| format!("{}'s call", req.owner_name))
    }

    /// Wraps an arbitrary naming function.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&NameRequest<'_>) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Renders the name for a new room, truncated to the platform limit.
    pub fn render(&self, owner_name: &str, existing_rooms: usize) -> String {
        let request = NameRequest {
            owner_name,
            existing_rooms,
        };
        truncate_name((self.0)(&request))
    }
}

/// Numbered names unless configured otherwise.
impl Default for NamePolicy {
    fn default() -> Self {
        Self::numbered()
    }
}

impl fmt::Debug for NamePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NamePolicy(..)")
    }
}

/// Cuts a name down to [`CHANNEL_NAME_LIMIT`] characters.
///
/// Counts characters, not bytes, so multi-byte names are cut at a
/// valid boundary.
fn truncate_name(name: String) -> String {
    if name.chars().count() <= CHANNEL_NAME_LIMIT {
        return name;
    }
    name.chars().take(CHANNEL_NAME_LIMIT).collect()
}
