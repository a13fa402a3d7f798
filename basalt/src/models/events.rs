use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::enums::{EndReason, EventType, ExceptionSeverity};
use crate::DecodeError;

/// An event emitted by the node, decoded from its JSON payload.
///
/// Playback events carry the player `P` resolved for their guild. The
/// websocket events are connection scoped and never carry one.
#[derive(Serialize, Clone, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", bound(serialize = ""))]
pub enum Event<P> {
    TrackStart(TrackStart<P>),
    TrackEnd(TrackEnd<P>),
    TrackStuck(TrackStuck<P>),
    TrackException(TrackException<P>),
    WebsocketOpen(WebsocketOpen),
    WebsocketClosed(WebsocketClosed),
}

impl<P> Event<P> {
    pub fn event_type(&self) -> EventType {
        match self {
            Event::TrackStart(_) => EventType::TrackStart,
            Event::TrackEnd(_) => EventType::TrackEnd,
            Event::TrackStuck(_) => EventType::TrackStuck,
            Event::TrackException(_) => EventType::TrackException,
            Event::WebsocketOpen(_) => EventType::WebsocketOpen,
            Event::WebsocketClosed(_) => EventType::WebsocketClosed,
        }
    }

    pub fn guild_id(&self) -> u64 {
        match self {
            Event::TrackStart(e) => e.guild_id,
            Event::TrackEnd(e) => e.guild_id,
            Event::TrackStuck(e) => e.guild_id,
            Event::TrackException(e) => e.guild_id,
            Event::WebsocketOpen(e) => e.guild_id,
            Event::WebsocketClosed(e) => e.guild_id,
        }
    }

    /// The player this event belongs to, `None` for websocket events.
    pub fn player(&self) -> Option<&P> {
        match self {
            Event::TrackStart(e) => Some(&e.player),
            Event::TrackEnd(e) => Some(&e.player),
            Event::TrackStuck(e) => Some(&e.player),
            Event::TrackException(e) => Some(&e.player),
            Event::WebsocketOpen(_) | Event::WebsocketClosed(_) => None,
        }
    }

    pub fn track_id(&self) -> Option<&str> {
        match self {
            Event::TrackStart(e) => Some(&e.track_id),
            Event::TrackEnd(e) => Some(&e.track_id),
            Event::TrackStuck(e) => Some(&e.track_id),
            Event::TrackException(e) => Some(&e.track_id),
            Event::WebsocketOpen(_) | Event::WebsocketClosed(_) => None,
        }
    }

    pub fn is_playback(&self) -> bool {
        self.event_type().is_playback()
    }
}

impl<P> fmt::Display for Event<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::TrackStart(e) => fmt::Display::fmt(e, f),
            Event::TrackEnd(e) => fmt::Display::fmt(e, f),
            Event::TrackStuck(e) => fmt::Display::fmt(e, f),
            Event::TrackException(e) => fmt::Display::fmt(e, f),
            Event::WebsocketOpen(e) => fmt::Display::fmt(e, f),
            Event::WebsocketClosed(e) => fmt::Display::fmt(e, f),
        }
    }
}

/// Decodes a node event payload.
///
/// The discriminant and `guild_id` are read first. Playback events then
/// resolve their player through `resolve_player`, which is never called for
/// websocket events. Variant fields are read last, in wire order, and the
/// first missing or mistyped field aborts the decode.
pub fn decode<P, F>(raw: &Value, resolve_player: F) -> Result<Event<P>, DecodeError>
where
    F: FnOnce(u64) -> Option<P>,
{
    let Some(map) = raw.as_object() else {
        return Err(DecodeError::UnknownEventType(Value::Null));
    };

    let event_type = match map.get("type") {
        Some(Value::String(code)) => EventType::from_code(code)
            .map_err(|_| DecodeError::UnknownEventType(Value::String(code.clone())))?,
        Some(other) => return Err(DecodeError::UnknownEventType(other.clone())),
        None => return Err(DecodeError::UnknownEventType(Value::Null)),
    };

    let fields = Fields {
        map,
        variant: event_type,
    };
    let guild_id = fields.guild_id()?;

    let event = match event_type {
        EventType::TrackStart => {
            let player = resolve(guild_id, resolve_player)?;
            Event::TrackStart(TrackStart::extract(&fields, guild_id, player)?)
        }
        EventType::TrackEnd => {
            let player = resolve(guild_id, resolve_player)?;
            Event::TrackEnd(TrackEnd::extract(&fields, guild_id, player)?)
        }
        EventType::TrackStuck => {
            let player = resolve(guild_id, resolve_player)?;
            Event::TrackStuck(TrackStuck::extract(&fields, guild_id, player)?)
        }
        EventType::TrackException => {
            let player = resolve(guild_id, resolve_player)?;
            Event::TrackException(TrackException::extract(&fields, guild_id, player)?)
        }
        EventType::WebsocketOpen => {
            Event::WebsocketOpen(WebsocketOpen::extract(&fields, guild_id)?)
        }
        EventType::WebsocketClosed => {
            Event::WebsocketClosed(WebsocketClosed::extract(&fields, guild_id)?)
        }
    };

    Ok(event)
}

fn resolve<P>(
    guild_id: u64,
    resolve_player: impl FnOnce(u64) -> Option<P>,
) -> Result<P, DecodeError> {
    resolve_player(guild_id).ok_or(DecodeError::UnknownPlayer(guild_id))
}

/// Typed, field-named access to one JSON object of a payload.
struct Fields<'a> {
    map: &'a Map<String, Value>,
    variant: EventType,
}

impl<'a> Fields<'a> {
    // null is treated the same as an absent field
    fn get(&self, field: &'static str) -> Result<&'a Value, DecodeError> {
        match self.map.get(field) {
            None | Some(Value::Null) => Err(self.missing(field)),
            Some(value) => Ok(value),
        }
    }

    /// `guild_id` is sent either as a JSON integer or as a decimal string.
    /// Anything that is not a non-negative 64 bit integer counts as missing.
    fn guild_id(&self) -> Result<u64, DecodeError> {
        match self.map.get("guild_id") {
            Some(Value::Number(n)) => n.as_u64().ok_or_else(|| self.missing("guild_id")),
            Some(Value::String(s)) => s.parse().map_err(|_| self.missing("guild_id")),
            _ => Err(self.missing("guild_id")),
        }
    }

    fn string(&self, field: &'static str) -> Result<String, DecodeError> {
        self.get(field)?
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| self.mismatch(field, "string"))
    }

    fn u64(&self, field: &'static str) -> Result<u64, DecodeError> {
        self.get(field)?
            .as_u64()
            .ok_or_else(|| self.mismatch(field, "unsigned integer"))
    }

    fn i64(&self, field: &'static str) -> Result<i64, DecodeError> {
        self.get(field)?
            .as_i64()
            .ok_or_else(|| self.mismatch(field, "integer"))
    }

    fn u32(&self, field: &'static str) -> Result<u32, DecodeError> {
        self.get(field)?
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| self.mismatch(field, "32 bit unsigned integer"))
    }

    fn bool(&self, field: &'static str) -> Result<bool, DecodeError> {
        self.get(field)?
            .as_bool()
            .ok_or_else(|| self.mismatch(field, "boolean"))
    }

    fn object(&self, field: &'static str) -> Result<Fields<'a>, DecodeError> {
        let map = self
            .get(field)?
            .as_object()
            .ok_or_else(|| self.mismatch(field, "object"))?;

        Ok(Fields {
            map,
            variant: self.variant,
        })
    }

    fn missing(&self, field: &'static str) -> DecodeError {
        DecodeError::MissingField {
            field,
            variant: self.variant,
        }
    }

    fn mismatch(&self, field: &'static str, expected: &'static str) -> DecodeError {
        DecodeError::TypeMismatch {
            field,
            expected,
            variant: self.variant,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(bound(serialize = ""))]
pub struct TrackStart<P> {
    guild_id: u64,
    #[serde(skip)]
    player: P,
    #[serde(rename = "track")]
    track_id: String,
}

impl<P> TrackStart<P> {
    fn extract(fields: &Fields<'_>, guild_id: u64, player: P) -> Result<Self, DecodeError> {
        Ok(TrackStart {
            guild_id,
            player,
            track_id: fields.string("track")?,
        })
    }

    pub fn guild_id(&self) -> u64 {
        self.guild_id
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }
}

impl<P> fmt::Display for TrackStart<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrackStart(guild_id={}, track_id={})",
            self.guild_id, self.track_id
        )
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(bound(serialize = ""))]
pub struct TrackEnd<P> {
    guild_id: u64,
    #[serde(skip)]
    player: P,
    #[serde(rename = "track")]
    track_id: String,
    reason: EndReason,
}

impl<P> TrackEnd<P> {
    fn extract(fields: &Fields<'_>, guild_id: u64, player: P) -> Result<Self, DecodeError> {
        let track_id = fields.string("track")?;
        let reason = EndReason::from_code(&fields.string("reason")?)?;

        Ok(TrackEnd {
            guild_id,
            player,
            track_id,
            reason,
        })
    }

    pub fn guild_id(&self) -> u64 {
        self.guild_id
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    pub fn reason(&self) -> EndReason {
        self.reason
    }
}

impl<P> fmt::Display for TrackEnd<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrackEnd(guild_id={}, track_id={}, reason={})",
            self.guild_id, self.track_id, self.reason
        )
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(bound(serialize = ""))]
pub struct TrackStuck<P> {
    guild_id: u64,
    #[serde(skip)]
    player: P,
    #[serde(rename = "track")]
    track_id: String,
    threshold_ms: u64,
}

impl<P> TrackStuck<P> {
    fn extract(fields: &Fields<'_>, guild_id: u64, player: P) -> Result<Self, DecodeError> {
        let track_id = fields.string("track")?;
        let threshold_ms = fields.u64("threshold_ms")?;

        Ok(TrackStuck {
            guild_id,
            player,
            track_id,
            threshold_ms,
        })
    }

    pub fn guild_id(&self) -> u64 {
        self.guild_id
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    /// How long playback stalled before the node gave up on the track.
    pub fn threshold_ms(&self) -> u64 {
        self.threshold_ms
    }
}

impl<P> fmt::Display for TrackStuck<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrackStuck(guild_id={}, track_id={}, threshold_ms={})",
            self.guild_id, self.track_id, self.threshold_ms
        )
    }
}

/// The `exception` object nested in a `TRACK_EXCEPTION` payload.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ExceptionInfo {
    message: String,
    cause: String,
}

impl ExceptionInfo {
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> &str {
        &self.cause
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(bound(serialize = ""))]
pub struct TrackException<P> {
    guild_id: u64,
    #[serde(skip)]
    player: P,
    #[serde(rename = "track")]
    track_id: String,
    exception: ExceptionInfo,
    severity: ExceptionSeverity,
}

impl<P> TrackException<P> {
    fn extract(fields: &Fields<'_>, guild_id: u64, player: P) -> Result<Self, DecodeError> {
        let track_id = fields.string("track")?;

        let exception = fields.object("exception")?;
        let message = exception.string("message")?;
        let cause = exception.string("cause")?;

        let severity = ExceptionSeverity::from_code(&fields.string("severity")?)?;

        Ok(TrackException {
            guild_id,
            player,
            track_id,
            exception: ExceptionInfo { message, cause },
            severity,
        })
    }

    pub fn guild_id(&self) -> u64 {
        self.guild_id
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    pub fn exception(&self) -> &ExceptionInfo {
        &self.exception
    }

    pub fn message(&self) -> &str {
        &self.exception.message
    }

    pub fn cause(&self) -> &str {
        &self.exception.cause
    }

    pub fn severity(&self) -> ExceptionSeverity {
        self.severity
    }
}

impl<P> fmt::Display for TrackException<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrackException(guild_id={}, track_id={}, severity={}, cause={:?}, message={:?})",
            self.guild_id,
            self.track_id,
            self.severity,
            self.exception.cause,
            self.exception.message
        )
    }
}

/// The node connected to the voice server for a guild.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct WebsocketOpen {
    guild_id: u64,
    target: String,
    ssrc: u32,
}

impl WebsocketOpen {
    fn extract(fields: &Fields<'_>, guild_id: u64) -> Result<Self, DecodeError> {
        let target = fields.string("target")?;
        let ssrc = fields.u32("ssrc")?;

        Ok(WebsocketOpen {
            guild_id,
            target,
            ssrc,
        })
    }

    pub fn guild_id(&self) -> u64 {
        self.guild_id
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }
}

impl fmt::Display for WebsocketOpen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WebsocketOpen(guild_id={}, target={}, ssrc={})",
            self.guild_id, self.target, self.ssrc
        )
    }
}

/// The voice websocket for a guild was closed, by either side.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct WebsocketClosed {
    guild_id: u64,
    code: i64,
    reason: String,
    by_remote: bool,
}

impl WebsocketClosed {
    fn extract(fields: &Fields<'_>, guild_id: u64) -> Result<Self, DecodeError> {
        let code = fields.i64("code")?;
        let reason = fields.string("reason")?;
        let by_remote = fields.bool("by_remote")?;

        Ok(WebsocketClosed {
            guild_id,
            code,
            reason,
            by_remote,
        })
    }

    pub fn guild_id(&self) -> u64 {
        self.guild_id
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn by_remote(&self) -> bool {
        self.by_remote
    }
}

impl fmt::Display for WebsocketClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WebsocketClosed(guild_id={}, code={}, reason={:?}, by_remote={})",
            self.guild_id, self.code, self.reason, self.by_remote
        )
    }
}
