//! Startup configuration for the room service.
//!
//! Deployments usually describe their entry channels in a JSON document
//! (checked into ops repos, rendered by provisioning tools, and so on).
//! This module is the boundary where that document becomes typed
//! registry configuration:
//!
//! ```json
//! {
//!   "guild_id": "414159265358979323",
//!   "entries": [
//!     {
//!       "entry_channel_id": "561803398874989484",
//!       "category_id": "271828182845904523",
//!       "naming": "owner-call",
//!       "deletion": ["when-empty"]
//!     },
//!     { "entry_channel_id": "577215664901532860", "deletion": "keep-forever" }
//!   ]
//! }
//! ```
//!
//! Everything here is declarative. Custom naming closures and custom
//! deletion predicates cannot be written in JSON; register those through
//! the builder API instead.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use vestibule_gateway::{is_snowflake, ChannelId, GuildId};
use vestibule_registry::{
    DeletionPolicy, DeletionPredicate, EntryChannelConfig, NamePolicy,
};

/// Errors produced while parsing or validating a configuration document,
/// or while checking the gateway it will run against.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The document is not valid JSON, or its shape does not match.
    #[error("configuration is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// An id field does not look like a platform snowflake.
    #[error("{field} is not a platform id: {value:?}")]
    MalformedId {
        field: &'static str,
        value: String,
    },

    /// The same entry channel appears twice in the document.
    #[error("entry channel {0} is configured twice")]
    DuplicateEntry(ChannelId),

    /// An entry lists zero deletion predicates. Rooms with no predicates
    /// are never reclaimed, and `"keep-forever"` says that explicitly;
    /// an empty list is more likely a templating bug.
    #[error("entry channel {0} has an empty deletion list; use \"keep-forever\" to opt out")]
    AmbiguousDeletion(ChannelId),

    /// The gateway cannot deliver an event stream the service needs.
    #[error("gateway does not provide {0}")]
    MissingCapability(&'static str),
}

/// How rooms under an entry channel are named.
///
/// Kebab-case in JSON: `"numbered"`, `"owner-call"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingChoice {
    /// Position among the entry's live rooms: `#1 Maria`, `#2 Bob`.
    #[default]
    Numbered,
    /// `Maria's call`.
    OwnerCall,
}

/// A non-predicate deletion mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeletionMode {
    /// Rooms under this entry are never reclaimed automatically.
    KeepForever,
}

/// A deletion predicate that can be named in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PredicateChoice {
    /// The room is empty (or orphaned with only bots left).
    WhenEmpty,
    /// Every remaining occupant is a bot.
    AllBots,
}

impl PredicateChoice {
    fn into_predicate(self) -> DeletionPredicate {
        match self {
            Self::WhenEmpty => DeletionPredicate::WhenEmpty,
            Self::AllBots => DeletionPredicate::AllBots,
        }
    }
}

/// The `deletion` field: either the string `"keep-forever"` or a list of
/// predicate names that must all hold.
///
/// `#[serde(untagged)]` tries each variant shape in order, so both JSON
/// forms deserialize without a discriminator field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeletionChoice {
    Mode(DeletionMode),
    Predicates(Vec<PredicateChoice>),
}

impl Default for DeletionChoice {
    fn default() -> Self {
        Self::Predicates(vec![PredicateChoice::WhenEmpty])
    }
}

impl DeletionChoice {
    fn into_policy(self) -> DeletionPolicy {
        match self {
            Self::Mode(DeletionMode::KeepForever) => DeletionPolicy::keep_forever(),
            Self::Predicates(choices) => DeletionPolicy::from_predicates(
                choices
                    .into_iter()
                    .map(PredicateChoice::into_predicate)
                    .collect(),
            ),
        }
    }
}

/// One entry channel in the document.
///
/// Only `entry_channel_id` is required; the other fields default to the
/// stock behavior (no category, numbered names, delete when empty).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrySeed {
    pub entry_channel_id: ChannelId,
    #[serde(default)]
    pub category_id: Option<ChannelId>,
    #[serde(default)]
    pub naming: NamingChoice,
    #[serde(default)]
    pub deletion: DeletionChoice,
}

impl EntrySeed {
    /// Converts this seed into a registry configuration for `guild`.
    pub fn into_config(self, guild: &GuildId) -> EntryChannelConfig {
        let naming = match self.naming {
            NamingChoice::Numbered => NamePolicy::numbered(),
            NamingChoice::OwnerCall => NamePolicy::owner_call(),
        };
        let mut config = EntryChannelConfig::new(self.entry_channel_id, guild.clone())
            .named_by(naming)
            .reclaimed_by(self.deletion.into_policy());
        if let Some(category) = self.category_id {
            config = config.in_category(category);
        }
        config
    }
}

/// A fully parsed and validated configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedConfig {
    /// The guild all entries belong to.
    pub guild_id: GuildId,
    /// The entry channels to register at startup.
    pub entries: Vec<EntrySeed>,
}

impl ResolvedConfig {
    /// Parses a JSON document and validates it.
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(doc)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`from_json`](Self::from_json), reading from an open file or
    /// any other reader.
    pub fn from_reader(reader: impl std::io::Read) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks ids and cross-entry rules.
    ///
    /// Shape errors are caught by serde during parsing; this catches the
    /// mistakes that are still valid JSON, like a channel name pasted
    /// where an id belongs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_id("guild_id", self.guild_id.as_str())?;

        let mut seen = HashSet::new();
        for seed in &self.entries {
            check_id("entry_channel_id", seed.entry_channel_id.as_str())?;
            if let Some(category) = &seed.category_id {
                check_id("category_id", category.as_str())?;
            }
            if !seen.insert(&seed.entry_channel_id) {
                return Err(ConfigError::DuplicateEntry(
                    seed.entry_channel_id.clone(),
                ));
            }
            if let DeletionChoice::Predicates(predicates) = &seed.deletion {
                if predicates.is_empty() {
                    return Err(ConfigError::AmbiguousDeletion(
                        seed.entry_channel_id.clone(),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn check_id(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if is_snowflake(value) {
        Ok(())
    } else {
        Err(ConfigError::MalformedId {
            field,
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_DOC: &str = r#"{
        "guild_id": "414159265358979323",
        "entries": [
            {
                "entry_channel_id": "561803398874989484",
                "category_id": "271828182845904523",
                "naming": "owner-call",
                "deletion": ["when-empty", "all-bots"]
            },
            {
                "entry_channel_id": "577215664901532860",
                "deletion": "keep-forever"
            }
        ]
    }"#;

    #[test]
    fn test_parse_full_document() {
        let config = ResolvedConfig::from_json(FULL_DOC).unwrap();
        assert_eq!(config.guild_id.as_str(), "414159265358979323");
        assert_eq!(config.entries.len(), 2);

        let first = &config.entries[0];
        assert_eq!(first.naming, NamingChoice::OwnerCall);
        assert_eq!(
            first.deletion,
            DeletionChoice::Predicates(vec![
                PredicateChoice::WhenEmpty,
                PredicateChoice::AllBots,
            ])
        );

        let second = &config.entries[1];
        assert_eq!(second.category_id, None);
        assert_eq!(
            second.deletion,
            DeletionChoice::Mode(DeletionMode::KeepForever)
        );
    }

    #[test]
    fn test_from_reader_matches_from_json() {
        let from_reader = ResolvedConfig::from_reader(FULL_DOC.as_bytes()).unwrap();
        let from_json = ResolvedConfig::from_json(FULL_DOC).unwrap();
        assert_eq!(from_reader.guild_id, from_json.guild_id);
        assert_eq!(from_reader.entries.len(), from_json.entries.len());
    }

    #[test]
    fn test_minimal_entry_gets_stock_defaults() {
        let config = ResolvedConfig::from_json(
            r#"{
                "guild_id": "414159265358979323",
                "entries": [{ "entry_channel_id": "561803398874989484" }]
            }"#,
        )
        .unwrap();

        let seed = &config.entries[0];
        assert_eq!(seed.naming, NamingChoice::Numbered);
        assert_eq!(seed.deletion, DeletionChoice::default());
        assert_eq!(seed.category_id, None);
    }

    #[test]
    fn test_malformed_guild_id_is_rejected() {
        let result = ResolvedConfig::from_json(
            r#"{ "guild_id": "general-voice", "entries": [] }"#,
        );
        assert!(matches!(
            result,
            Err(ConfigError::MalformedId {
                field: "guild_id",
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_category_id_is_rejected() {
        let result = ResolvedConfig::from_json(
            r#"{
                "guild_id": "414159265358979323",
                "entries": [{
                    "entry_channel_id": "561803398874989484",
                    "category_id": "not-an-id"
                }]
            }"#,
        );
        assert!(matches!(
            result,
            Err(ConfigError::MalformedId {
                field: "category_id",
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_entries_are_rejected() {
        let result = ResolvedConfig::from_json(
            r#"{
                "guild_id": "414159265358979323",
                "entries": [
                    { "entry_channel_id": "561803398874989484" },
                    { "entry_channel_id": "561803398874989484" }
                ]
            }"#,
        );
        assert!(matches!(result, Err(ConfigError::DuplicateEntry(_))));
    }

    #[test]
    fn test_empty_deletion_list_is_rejected() {
        let result = ResolvedConfig::from_json(
            r#"{
                "guild_id": "414159265358979323",
                "entries": [{
                    "entry_channel_id": "561803398874989484",
                    "deletion": []
                }]
            }"#,
        );
        assert!(matches!(result, Err(ConfigError::AmbiguousDeletion(_))));
    }

    #[test]
    fn test_broken_json_reports_parse_error() {
        let result = ResolvedConfig::from_json("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_seed_conversion_carries_everything_over() {
        let config = ResolvedConfig::from_json(FULL_DOC).unwrap();
        let guild = config.guild_id.clone();

        let first = config.entries[0].clone().into_config(&guild);
        assert_eq!(first.guild_id, guild);
        assert_eq!(
            first.category_id.as_ref().map(|c| c.as_str()),
            Some("271828182845904523")
        );
        assert_eq!(first.naming.render("Maria", 0), "Maria's call");
        assert_eq!(first.deletion.predicates().len(), 2);

        let second = config.entries[1].clone().into_config(&guild);
        assert!(second.deletion.is_keep_forever());
        assert_eq!(second.naming.render("Maria", 0), "#1 Maria");
    }
}
