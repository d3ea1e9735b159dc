//! Chat transport abstraction — inbound events and the outbound send seam.

pub mod twilio;
pub mod webhook;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

pub use twilio::TwilioTransport;

/// Unified inbound event from the chat webhook.
///
/// The webhook layer converts the transport's native form fields into this
/// struct; the router never sees transport-specific names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Stable sender key (phone-like string, e.g. "whatsapp:+91…").
    pub identity: String,
    /// Message body. May be empty (media-only or location-only events).
    pub body: String,
    /// Attached media, in webhook order.
    pub media: Vec<MediaItem>,
    /// Location share, if the event carries one.
    pub location: Option<Location>,
}

/// One attached media item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub url: String,
    pub content_type: String,
}

/// A shared location payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Display form stored on profiles, e.g. "Lat: 12.97, Lon: 77.59".
    pub fn display(&self) -> String {
        format!("Lat: {}, Lon: {}", self.latitude, self.longitude)
    }
}

/// What kind of event this is, for routing. First media item wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Carries an audio attachment (voice note).
    Audio { url: String },
    /// Carries a non-audio attachment.
    OtherMedia { content_type: String },
    /// Plain text body, no media.
    Text,
    /// No body and no media (e.g. a bare location share).
    Empty,
}

impl InboundEvent {
    pub fn new(identity: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            body: body.into(),
            media: Vec::new(),
            location: None,
        }
    }

    pub fn with_media(mut self, url: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.media.push(MediaItem {
            url: url.into(),
            content_type: content_type.into(),
        });
        self
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Some(Location {
            latitude,
            longitude,
        });
        self
    }

    /// Classify this event for routing.
    pub fn kind(&self) -> EventKind {
        if let Some(first) = self.media.first() {
            if first.content_type.starts_with("audio/") {
                return EventKind::Audio {
                    url: first.url.clone(),
                };
            }
            return EventKind::OtherMedia {
                content_type: first.content_type.clone(),
            };
        }
        if self.body.trim().is_empty() {
            EventKind::Empty
        } else {
            EventKind::Text
        }
    }
}

/// Outbound transport seam — pure I/O, no business logic.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a text message to one recipient identity.
    async fn send_message(&self, to: &str, body: &str) -> Result<(), TransportError>;

    /// Download a media attachment (voice note) by URL.
    async fn fetch_media(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_media_classifies_as_audio() {
        let event = InboundEvent::new("whatsapp:+1", "")
            .with_media("https://example.com/m0", "audio/ogg");
        assert_eq!(
            event.kind(),
            EventKind::Audio {
                url: "https://example.com/m0".into()
            }
        );
    }

    #[test]
    fn image_media_classifies_as_other() {
        let event = InboundEvent::new("whatsapp:+1", "look at this")
            .with_media("https://example.com/m0", "image/jpeg");
        assert!(matches!(event.kind(), EventKind::OtherMedia { .. }));
    }

    #[test]
    fn first_media_item_wins() {
        let event = InboundEvent::new("whatsapp:+1", "")
            .with_media("https://example.com/a", "image/png")
            .with_media("https://example.com/b", "audio/ogg");
        assert!(matches!(event.kind(), EventKind::OtherMedia { .. }));
    }

    #[test]
    fn text_body_classifies_as_text() {
        assert_eq!(InboundEvent::new("x", "2kg rice").kind(), EventKind::Text);
    }

    #[test]
    fn whitespace_body_classifies_as_empty() {
        assert_eq!(InboundEvent::new("x", "   ").kind(), EventKind::Empty);
    }

    #[test]
    fn bare_location_classifies_as_empty() {
        let event = InboundEvent::new("x", "").with_location(12.97, 77.59);
        assert_eq!(event.kind(), EventKind::Empty);
        assert_eq!(
            event.location.unwrap().display(),
            "Lat: 12.97, Lon: 77.59"
        );
    }
}
