use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DecodeError;

/// Declares a closed enumeration whose wire representation is a string code.
///
/// Every enumerator gets one code; `from_code` rejects anything else.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $code:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $code)]
                $variant,
            )+
        }

        impl $name {
            /// Every enumerator, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn from_code(code: &str) -> Result<Self, DecodeError> {
                match code {
                    $($code => Ok($name::$variant),)+
                    _ => Err(DecodeError::UnknownEnumCode {
                        enumeration: stringify!($name),
                        code: code.to_string(),
                    }),
                }
            }

            pub fn wire_code(self) -> &'static str {
                match self {
                    $($name::$variant => $code,)+
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant),)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

wire_enum! {
    /// Discriminant carried in the `type` field of every node event.
    pub enum EventType {
        TrackStart => "TRACK_START",
        TrackEnd => "TRACK_END",
        TrackStuck => "TRACK_STUCK",
        TrackException => "TRACK_EXCEPTION",
        WebsocketOpen => "WEBSOCKET_OPEN",
        WebsocketClosed => "WEBSOCKET_CLOSED",
    }
}

impl EventType {
    /// Playback events are scoped to a player; the websocket ones are scoped to
    /// the voice connection and are emitted before a player exists.
    pub fn is_playback(self) -> bool {
        !matches!(self, EventType::WebsocketOpen | EventType::WebsocketClosed)
    }
}

wire_enum! {
    pub enum EndReason {
        Finished => "FINISHED",
        LoadFailed => "LOAD_FAILED",
        Stopped => "STOPPED",
        Replaced => "REPLACED",
        Cleanup => "CLEANUP",
    }
}

impl EndReason {
    /// Whether the queue may advance to the next track after this reason.
    ///
    /// A replaced track has already been superseded and a cleanup means the
    /// player is being torn down, so neither may start another track.
    pub fn may_start_next(self) -> bool {
        match self {
            EndReason::Finished | EndReason::LoadFailed | EndReason::Stopped => true,
            EndReason::Replaced | EndReason::Cleanup => false,
        }
    }
}

wire_enum! {
    /// Severity attached to a `TRACK_EXCEPTION` event.
    pub enum ExceptionSeverity {
        /// Expected failure, e.g. the track is unavailable.
        Common => "COMMON",
        Suspicious => "SUSPICIOUS",
        /// Failure inside the node itself.
        Fault => "FAULT",
    }
}

/// How a queue repeats once it runs out of tracks.
///
/// Encoded on the wire as a small integer. `NONE` is accepted as a second
/// name for [`QueueLoopMode::Off`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub enum QueueLoopMode {
    #[default]
    Off,
    Current,
    Queue,
}

impl QueueLoopMode {
    pub const ALL: &'static [QueueLoopMode] = &[
        QueueLoopMode::Off,
        QueueLoopMode::Current,
        QueueLoopMode::Queue,
    ];

    pub fn from_code(code: u8) -> Result<Self, DecodeError> {
        match code {
            0 => Ok(QueueLoopMode::Off),
            1 => Ok(QueueLoopMode::Current),
            2 => Ok(QueueLoopMode::Queue),
            _ => Err(DecodeError::UnknownEnumCode {
                enumeration: "QueueLoopMode",
                code: code.to_string(),
            }),
        }
    }

    pub fn from_name(name: &str) -> Result<Self, DecodeError> {
        match name {
            "OFF" | "NONE" => Ok(QueueLoopMode::Off),
            "CURRENT" => Ok(QueueLoopMode::Current),
            "QUEUE" => Ok(QueueLoopMode::Queue),
            _ => Err(DecodeError::UnknownEnumCode {
                enumeration: "QueueLoopMode",
                code: name.to_string(),
            }),
        }
    }

    pub fn wire_code(self) -> u8 {
        match self {
            QueueLoopMode::Off => 0,
            QueueLoopMode::Current => 1,
            QueueLoopMode::Queue => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            QueueLoopMode::Off => "Off",
            QueueLoopMode::Current => "Current",
            QueueLoopMode::Queue => "Queue",
        }
    }
}

impl TryFrom<u8> for QueueLoopMode {
    type Error = DecodeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        QueueLoopMode::from_code(code)
    }
}

impl From<QueueLoopMode> for u8 {
    fn from(mode: QueueLoopMode) -> Self {
        mode.wire_code()
    }
}

impl fmt::Display for QueueLoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
