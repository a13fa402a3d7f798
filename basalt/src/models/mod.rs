pub mod enums;
pub mod events;

pub use enums::{EndReason, EventType, ExceptionSeverity, QueueLoopMode};
pub use events::{
    decode, Event, ExceptionInfo, TrackEnd, TrackException, TrackStart, TrackStuck,
    WebsocketClosed, WebsocketOpen,
};
