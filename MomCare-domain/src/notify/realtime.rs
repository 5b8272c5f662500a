//! Room-scoped realtime broadcast
//!
//! Every event goes through a single broadcast channel. Each socket keeps its
//! own [`RoomSet`] and drops events addressed elsewhere. A receiver that falls
//! behind skips the events it missed.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 256;

pub const NEW_ALERT: &str = "new-alert";
pub const NEW_MESSAGE: &str = "new-message";
pub const DASHBOARD_UPDATE: &str = "dashboard-update";

/// Who an event is addressed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// The `user-{id}` room
    User(String),
    /// Every connected provider
    Clinic,
}

/// Event published to connected sockets
#[derive(Debug, Clone)]
pub struct RealtimeEvent {
    pub audience: Audience,
    pub event: String,
    pub data: Value,
}

/// Frame written to the socket
#[derive(Debug, Serialize)]
pub struct EventFrame<'a> {
    pub event: &'a str,
    pub data: &'a Value,
}

impl RealtimeEvent {
    pub fn frame(&self) -> EventFrame<'_> {
        EventFrame {
            event: &self.event,
            data: &self.data,
        }
    }
}

/// Room name for a single user
pub fn user_room(user_id: &str) -> String {
    format!("user-{}", user_id)
}

/// Rooms joined by one socket
#[derive(Debug, Clone, Default)]
pub struct RoomSet {
    users: Vec<String>,
    clinic: bool,
}

impl RoomSet {
    pub fn join_user(&mut self, user_id: &str) {
        if !self.users.iter().any(|u| u == user_id) {
            self.users.push(user_id.to_string());
        }
    }

    pub fn join_clinic(&mut self) {
        self.clinic = true;
    }

    pub fn accepts(&self, audience: &Audience) -> bool {
        match audience {
            Audience::User(id) => self.users.iter().any(|u| u == id),
            Audience::Clinic => self.clinic,
        }
    }
}

/// Publisher side of the realtime channel; clones share the channel
#[derive(Debug, Clone)]
pub struct RealtimeHub {
    sender: broadcast::Sender<RealtimeEvent>,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.sender.subscribe()
    }

    /// Publish an event; returns how many sockets were listening
    pub fn publish(&self, audience: Audience, event: &str, data: Value) -> usize {
        let delivered = self
            .sender
            .send(RealtimeEvent {
                audience: audience.clone(),
                event: event.to_string(),
                data,
            })
            .unwrap_or(0);
        debug!("Realtime event {} to {:?} reached {} receivers", event, audience, delivered);
        delivered
    }

    pub fn to_user(&self, user_id: &str, event: &str, data: Value) -> usize {
        self.publish(Audience::User(user_id.to_string()), event, data)
    }

    pub fn to_clinic(&self, event: &str, data: Value) -> usize {
        self.publish(Audience::Clinic, event, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_room_set_filters() {
        let mut rooms = RoomSet::default();
        rooms.join_user("u1");
        rooms.join_user("u1");

        assert!(rooms.accepts(&Audience::User("u1".to_string())));
        assert!(!rooms.accepts(&Audience::User("u2".to_string())));
        assert!(!rooms.accepts(&Audience::Clinic));

        rooms.join_clinic();
        assert!(rooms.accepts(&Audience::Clinic));
    }

    #[test]
    fn test_user_room_name() {
        assert_eq!(user_room("abc"), "user-abc");
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let hub = RealtimeHub::default();
        assert_eq!(hub.to_clinic(DASHBOARD_UPDATE, json!({})), 0);

        let mut rx = hub.subscribe();
        assert_eq!(hub.to_user("p1", NEW_ALERT, json!({"x": 1})), 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.audience, Audience::User("p1".to_string()));
        assert_eq!(event.event, NEW_ALERT);

        let frame = serde_json::to_value(event.frame()).unwrap();
        assert_eq!(frame, json!({"event": "new-alert", "data": {"x": 1}}));
    }

    #[tokio::test]
    async fn test_slow_receiver_lags_instead_of_blocking() {
        let hub = RealtimeHub::new(2);
        let mut rx = hub.subscribe();
        for i in 0..5 {
            hub.to_clinic(DASHBOARD_UPDATE, json!(i));
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
        assert_eq!(rx.recv().await.unwrap().data, json!(3));
    }
}
