//! Outbound notifications: the in-process realtime hub and the push seam

pub mod push;
pub mod realtime;

pub use push::{
    DisabledPushNotifier, HttpPushNotifier, MulticastResult, PushError, PushMessage, PushNotifier,
};
pub use realtime::{Audience, RealtimeEvent, RealtimeHub, RoomSet};
