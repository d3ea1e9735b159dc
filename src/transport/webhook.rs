//! Inbound webhook — decodes the Twilio form post and renders the reply
//! as TwiML.
//!
//! The transport must always receive a well-formed reply; nothing from
//! the pipeline propagates as an HTTP error here.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Form, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::post;
use tracing::info;

use crate::router::MessageRouter;
use crate::transport::InboundEvent;

/// Shared state for the webhook route.
#[derive(Clone)]
pub struct WebhookState {
    pub router: Arc<MessageRouter>,
}

/// Build the webhook routes.
pub fn webhook_routes(state: WebhookState) -> Router {
    Router::new()
        .route("/whatsapp", post(handle_whatsapp))
        .with_state(state)
}

/// POST /whatsapp — Twilio webhook for incoming messages.
async fn handle_whatsapp(
    State(state): State<WebhookState>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    let event = parse_event(&form);
    info!(
        identity = %event.identity,
        sid = form.get("MessageSid").map(String::as_str).unwrap_or(""),
        "Webhook event received"
    );

    let reply = state.router.handle(&event).await;
    (
        [(header::CONTENT_TYPE, "text/xml; charset=utf-8")],
        twiml(&reply),
    )
}

/// Decode the Twilio form fields into an [`InboundEvent`].
fn parse_event(form: &HashMap<String, String>) -> InboundEvent {
    let identity = form
        .get("From")
        .filter(|s| !s.is_empty())
        .cloned()
        .unwrap_or_else(|| "unknown".to_string());
    let body = form.get("Body").cloned().unwrap_or_default();

    let mut event = InboundEvent::new(identity, body);

    let num_media: usize = form
        .get("NumMedia")
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    for i in 0..num_media {
        let url = form.get(&format!("MediaUrl{i}"));
        let content_type = form.get(&format!("MediaContentType{i}"));
        if let (Some(url), Some(content_type)) = (url, content_type) {
            event = event.with_media(url, content_type);
        }
    }

    let latitude = form.get("Latitude").and_then(|s| s.parse::<f64>().ok());
    let longitude = form.get("Longitude").and_then(|s| s.parse::<f64>().ok());
    if let (Some(latitude), Some(longitude)) = (latitude, longitude) {
        event = event.with_location(latitude, longitude);
    }

    event
}

/// Render a reply body as a TwiML messaging response.
fn twiml(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        xml_escape(body)
    )
}

fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_text_event() {
        let event = parse_event(&form(&[
            ("From", "whatsapp:+911234"),
            ("Body", "2kg rice"),
            ("NumMedia", "0"),
        ]));
        assert_eq!(event.identity, "whatsapp:+911234");
        assert_eq!(event.body, "2kg rice");
        assert!(event.media.is_empty());
        assert!(event.location.is_none());
    }

    #[test]
    fn parses_media_items_in_order() {
        let event = parse_event(&form(&[
            ("From", "whatsapp:+911234"),
            ("Body", ""),
            ("NumMedia", "2"),
            ("MediaUrl0", "https://api.twilio.com/m0"),
            ("MediaContentType0", "audio/ogg"),
            ("MediaUrl1", "https://api.twilio.com/m1"),
            ("MediaContentType1", "image/jpeg"),
        ]));
        assert_eq!(event.media.len(), 2);
        assert_eq!(event.media[0].content_type, "audio/ogg");
        assert_eq!(event.media[1].url, "https://api.twilio.com/m1");
    }

    #[test]
    fn parses_location_share() {
        let event = parse_event(&form(&[
            ("From", "whatsapp:+911234"),
            ("Latitude", "12.9716"),
            ("Longitude", "77.5946"),
        ]));
        let location = event.location.unwrap();
        assert!((location.latitude - 12.9716).abs() < 1e-9);
        assert!((location.longitude - 77.5946).abs() < 1e-9);
    }

    #[test]
    fn half_a_location_is_no_location() {
        let event = parse_event(&form(&[("From", "x"), ("Latitude", "12.9716")]));
        assert!(event.location.is_none());
    }

    #[test]
    fn unparseable_coordinates_are_ignored() {
        let event = parse_event(&form(&[
            ("From", "x"),
            ("Latitude", "north-ish"),
            ("Longitude", "77.5"),
        ]));
        assert!(event.location.is_none());
    }

    #[test]
    fn missing_sender_defaults_to_unknown() {
        let event = parse_event(&form(&[("Body", "hi")]));
        assert_eq!(event.identity, "unknown");
    }

    #[test]
    fn garbage_num_media_is_zero() {
        let event = parse_event(&form(&[("From", "x"), ("NumMedia", "lots")]));
        assert!(event.media.is_empty());
    }

    #[test]
    fn twiml_wraps_and_escapes() {
        let xml = twiml("Rice & dal <2kg>");
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>"));
        assert!(xml.contains("Rice &amp; dal &lt;2kg&gt;"));
        assert!(xml.ends_with("</Message></Response>"));
    }

    #[test]
    fn twiml_passes_emoji_through() {
        let xml = twiml("✅ Got it!\n\n📝 You said:");
        assert!(xml.contains("✅ Got it!"));
    }
}
