use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use twilight_model::id::marker::GuildMarker;
use twilight_model::id::Id;

use crate::models::EventType;

pub use crate::models::{decode, Event};

pub mod models;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Payload is not valid JSON: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Why a node payload could not be turned into an [`Event`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The `type` discriminant is missing or not one of the known event types.
    #[error("Unknown event type {0}")]
    UnknownEventType(Value),
    #[error("Missing field `{field}` in {variant} event")]
    MissingField {
        field: &'static str,
        variant: EventType,
    },
    #[error("Field `{field}` in {variant} event should be {expected}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        variant: EventType,
    },
    #[error("Unknown {enumeration} code {code:?}")]
    UnknownEnumCode {
        enumeration: &'static str,
        code: String,
    },
    #[error("No player for guild {0}")]
    UnknownPlayer(u64),
}

/// Parses `payload` as JSON and decodes it with [`decode`].
pub fn decode_str<P, F>(payload: &str, resolve_player: F) -> Result<Event<P>, Error>
where
    F: FnOnce(u64) -> Option<P>,
{
    let raw = serde_json::from_str::<Value>(payload)?;
    Ok(decode(&raw, resolve_player)?)
}

/// Players by guild, shared between the code driving playback and the code
/// decoding node events.
///
/// Decoding only ever reads from the cache, through [`BasaltCache::player`].
pub struct BasaltCache<P> {
    players: DashMap<Id<GuildMarker>, Arc<P>>,
}

impl<P> BasaltCache<P> {
    /// Caches `player` for the guild, returning the one it replaced.
    pub fn insert(&self, guild_id: Id<GuildMarker>, player: P) -> Option<Arc<P>> {
        tracing::debug!(%guild_id, "Caching player");
        self.players.insert(guild_id, Arc::new(player))
    }

    pub fn remove(&self, guild_id: Id<GuildMarker>) -> Option<Arc<P>> {
        let removed = self.players.remove(&guild_id).map(|(_, player)| player);
        if removed.is_some() {
            tracing::debug!(%guild_id, "Removed player");
        }

        removed
    }

    pub fn get(&self, guild_id: Id<GuildMarker>) -> Option<Arc<P>> {
        self.players.get(&guild_id).map(|p| Arc::clone(p.value()))
    }

    /// Looks up a player by the raw guild id carried in node payloads.
    ///
    /// Guild ids are never zero, so zero is never found.
    pub fn player(&self, guild_id: u64) -> Option<Arc<P>> {
        Id::new_checked(guild_id).and_then(|id| self.get(id))
    }

    pub fn contains(&self, guild_id: Id<GuildMarker>) -> bool {
        self.players.contains_key(&guild_id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl<P> Default for BasaltCache<P> {
    fn default() -> Self {
        let players = DashMap::new();

        BasaltCache { players }
    }
}
