//! Message router — the entry point for every inbound chat event.
//!
//! Stateless over one event. Decision order: open session → onboarding;
//! audio media → transcribe/build/notify; other media → format rejection;
//! plain text → order (customer) or info reply (shopkeeper); empty →
//! fallback. Every collaborator failure is converted into a reply string
//! here — nothing propagates to the transport layer.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::dispatch::Dispatcher;
use crate::onboarding::OnboardingFlow;
use crate::order::{OrderBuilder, TEXT_INPUT_REF, format};
use crate::session::SessionStore;
use crate::store::{Role, Store};
use crate::transcribe::Transcriber;
use crate::transport::{EventKind, InboundEvent, Transport};

/// Reply when media other than audio arrives.
const MEDIA_REJECTION: &str = "📁 Please send an audio/voice note!";

/// Reply to registered shopkeepers sending plain text.
const SHOPKEEPER_INFO: &str = "👋 You're registered as a shopkeeper. Awaiting customer orders! 🛍️";

/// Reply when an event carries neither text nor media.
const FALLBACK: &str = "👋 Hi! Send me a voice note or text to extract groceries!";

/// Reply when the voice-note download fails.
const DOWNLOAD_FAILED: &str = "❌ Error: Failed to download audio";

/// Routes one inbound event to onboarding or the order pipeline and
/// produces the outbound reply.
pub struct MessageRouter {
    sessions: Arc<SessionStore>,
    store: Arc<dyn Store>,
    onboarding: OnboardingFlow,
    builder: OrderBuilder,
    dispatcher: Dispatcher,
    transport: Arc<dyn Transport>,
    transcriber: Arc<dyn Transcriber>,
    audio_dir: PathBuf,
    language_hint: String,
}

impl MessageRouter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: Arc<SessionStore>,
        store: Arc<dyn Store>,
        onboarding: OnboardingFlow,
        builder: OrderBuilder,
        dispatcher: Dispatcher,
        transport: Arc<dyn Transport>,
        transcriber: Arc<dyn Transcriber>,
        audio_dir: PathBuf,
        language_hint: String,
    ) -> Self {
        Self {
            sessions,
            store,
            onboarding,
            builder,
            dispatcher,
            transport,
            transcriber,
            audio_dir,
            language_hint,
        }
    }

    /// Handle one inbound event to completion and return the reply.
    ///
    /// Events for the same identity are serialized via the session
    /// store's per-identity guard.
    pub async fn handle(&self, event: &InboundEvent) -> String {
        let _guard = self.sessions.guard(&event.identity).await;

        info!(identity = %event.identity, kind = ?event.kind(), "Inbound event");

        // An open session consumes the event, whatever it carries.
        if self.sessions.contains(&event.identity).await {
            return self.onboarding.handle(&event.identity, event).await;
        }

        match event.kind() {
            EventKind::Audio { url } => self.handle_voice(event, &url).await,
            EventKind::OtherMedia { content_type } => {
                info!(identity = %event.identity, content_type = %content_type, "Rejecting non-audio media");
                MEDIA_REJECTION.to_string()
            }
            EventKind::Text => self.handle_text(event).await,
            EventKind::Empty => FALLBACK.to_string(),
        }
    }

    // ── Voice path ──────────────────────────────────────────────────

    async fn handle_voice(&self, event: &InboundEvent, media_url: &str) -> String {
        let identity = &event.identity;
        let (customer, shopkeeper) = self.lookup_profiles(identity).await;
        if customer.is_none() && shopkeeper.is_none() {
            return self.onboarding.begin(identity, "voice").await;
        }

        let audio = match self.transport.fetch_media(media_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(identity = %identity, error = %e, "Audio download failed");
                return DOWNLOAD_FAILED.to_string();
            }
        };

        let audio_ref = self.cache_audio(identity, &audio).await;

        let text = match self.transcriber.transcribe(&audio, &self.language_hint).await {
            Ok(text) => text,
            Err(e) => {
                error!(identity = %identity, error = %e, "Transcription failed");
                return format!("❌ Error: {e}");
            }
        };
        info!(identity = %identity, text = %text, "Voice note transcribed");

        let customer_name = customer
            .map(|p| p.name)
            .unwrap_or_else(|| "Unknown Customer".to_string());
        self.run_order(identity, &customer_name, &text, &audio_ref)
            .await
    }

    /// Write the voice note to the audio cache and return the reference
    /// recorded on the order. A write failure is not fatal; the reference
    /// falls back to the bare filename.
    async fn cache_audio(&self, identity: &str, audio: &[u8]) -> String {
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let filename = format!("voice_{identity}_{timestamp}.ogg");
        let path = self.audio_dir.join(&filename);

        if let Err(e) = tokio::fs::create_dir_all(&self.audio_dir).await {
            warn!(error = %e, "Could not create audio cache directory");
            return filename;
        }
        match tokio::fs::write(&path, audio).await {
            Ok(()) => path.to_string_lossy().into_owned(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not cache voice note");
                filename
            }
        }
    }

    // ── Text path ───────────────────────────────────────────────────

    async fn handle_text(&self, event: &InboundEvent) -> String {
        let identity = &event.identity;
        let (customer, shopkeeper) = self.lookup_profiles(identity).await;

        match (customer, shopkeeper) {
            (None, None) => self.onboarding.begin(identity, "text").await,
            (Some(customer), _) => {
                let text = event.body.trim();
                self.run_order(identity, &customer.name, text, TEXT_INPUT_REF)
                    .await
            }
            (None, Some(_)) => SHOPKEEPER_INFO.to_string(),
        }
    }

    // ── Shared order path ───────────────────────────────────────────

    /// Build, confirm, and (if stored) fan out one order.
    ///
    /// An unstored order never reaches the dispatcher.
    async fn run_order(
        &self,
        identity: &str,
        customer_name: &str,
        text: &str,
        audio_ref: &str,
    ) -> String {
        match self.builder.build(identity, customer_name, text, audio_ref).await {
            Ok(built) => {
                let mut reply = format::customer_confirmation(&built.order);
                if built.stored {
                    reply.push_str(format::ORDER_SAVED_SUFFIX);
                    self.dispatcher.notify(&built.order).await;
                }
                reply
            }
            Err(e) => {
                error!(identity = %identity, error = %e, "Order build failed");
                format!("❌ Error: {e}")
            }
        }
    }

    /// Profile lookups for both role collections. Store failures are
    /// logged and read as "no profile" — the user gets onboarding, not a
    /// stack trace.
    async fn lookup_profiles(
        &self,
        identity: &str,
    ) -> (
        Option<crate::store::Profile>,
        Option<crate::store::Profile>,
    ) {
        let customer = match self.store.find_profile(Role::Customer, identity).await {
            Ok(profile) => profile,
            Err(e) => {
                error!(identity = %identity, error = %e, "Customer lookup failed");
                None
            }
        };
        let shopkeeper = match self.store.find_profile(Role::Shopkeeper, identity).await {
            Ok(profile) => profile,
            Err(e) => {
                error!(identity = %identity, error = %e, "Shopkeeper lookup failed");
                None
            }
        };
        (customer, shopkeeper)
    }
}
