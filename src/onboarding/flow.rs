//! Onboarding flow — drives one identity through the step sequence.
//!
//! Invalid input at any step re-prompts without advancing; the flow is
//! re-entrant, not error-raising. The terminal transition upserts the
//! profile and destroys the session.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::onboarding::prompts;
use crate::onboarding::state::{OnboardingStep, Session};
use crate::session::SessionStore;
use crate::store::{Profile, Role, Store};
use crate::transport::InboundEvent;

/// Drives onboarding conversations. Stateless itself; all progress lives
/// in the session store.
pub struct OnboardingFlow {
    store: Arc<dyn Store>,
    sessions: Arc<SessionStore>,
}

impl OnboardingFlow {
    pub fn new(store: Arc<dyn Store>, sessions: Arc<SessionStore>) -> Self {
        Self { store, sessions }
    }

    /// Open a session for a brand-new identity and return the greeting.
    ///
    /// `channel` records how the identity first reached us ("text" or
    /// "voice") and picks the greeting variant.
    pub async fn begin(&self, identity: &str, channel: &str) -> String {
        self.sessions
            .put(identity, Session::started_via(channel))
            .await;
        info!(identity = %identity, channel = %channel, "Onboarding started");
        if channel == "voice" {
            prompts::WELCOME_VOICE.to_string()
        } else {
            prompts::WELCOME_TEXT.to_string()
        }
    }

    /// Consume one inbound event for an identity with an open session.
    ///
    /// Returns the reply to send. The session in the store reflects the
    /// post-event step on return.
    pub async fn handle(&self, identity: &str, event: &InboundEvent) -> String {
        let Some(mut session) = self.sessions.get(identity).await else {
            // Caller routed here without a session; restart cleanly.
            return self.begin(identity, "text").await;
        };

        let body = event.body.trim();
        let reply = match session.step {
            OnboardingStep::AwaitingName => {
                if body.is_empty() {
                    prompts::NAME_REPROMPT.to_string()
                } else {
                    session.data.name = Some(body.to_string());
                    session.advance_to(OnboardingStep::AwaitingRole);
                    prompts::ROLE_PROMPT.to_string()
                }
            }
            OnboardingStep::AwaitingRole => match prompts::parse_role(body) {
                Some(Role::Customer) => {
                    session.data.role = Some(Role::Customer);
                    session.advance_to(OnboardingStep::AwaitingLocation);
                    prompts::CUSTOMER_LOCATION_PROMPT.to_string()
                }
                Some(Role::Shopkeeper) => {
                    session.data.role = Some(Role::Shopkeeper);
                    session.advance_to(OnboardingStep::AwaitingShopName);
                    prompts::SHOP_NAME_PROMPT.to_string()
                }
                None => prompts::ROLE_REPROMPT.to_string(),
            },
            OnboardingStep::AwaitingShopName => {
                if body.is_empty() {
                    prompts::SHOP_NAME_REPROMPT.to_string()
                } else {
                    session.data.shop_name = Some(body.to_string());
                    session.advance_to(OnboardingStep::AwaitingShopDescription);
                    prompts::shop_description_prompt(body)
                }
            }
            OnboardingStep::AwaitingShopDescription => {
                if !body.is_empty() && !body.eq_ignore_ascii_case("skip") {
                    session.data.description = Some(body.to_string());
                }
                session.advance_to(OnboardingStep::AwaitingLocation);
                prompts::SHOP_LOCATION_PROMPT.to_string()
            }
            OnboardingStep::AwaitingLocation => match event.location {
                Some(location) => {
                    return self.complete(identity, session, location).await;
                }
                None => prompts::LOCATION_REPROMPT.to_string(),
            },
        };

        self.sessions.put(identity, session).await;
        reply
    }

    /// Terminal transition: persist the profile, destroy the session, and
    /// emit the role-specific welcome. On persistence failure the session
    /// is kept so the user can re-share the location.
    async fn complete(
        &self,
        identity: &str,
        session: Session,
        location: crate::transport::Location,
    ) -> String {
        let profile = match self.build_profile(identity, &session, location).await {
            Some(profile) => profile,
            None => {
                // Session data missing a role — should not happen past
                // AwaitingRole; restart rather than guessing.
                warn!(identity = %identity, "Session reached location step without a role");
                return self.begin(identity, "text").await;
            }
        };

        match self.store.upsert_profile(&profile).await {
            Ok(()) => {
                self.sessions.delete(identity).await;
                info!(
                    identity = %identity,
                    role = %profile.role,
                    "Onboarding complete"
                );
                match profile.role {
                    Role::Shopkeeper => prompts::welcome_shopkeeper(
                        profile.shop_name.as_deref().unwrap_or(&profile.name),
                    ),
                    Role::Customer => prompts::welcome_customer(&profile.name),
                }
            }
            Err(e) => {
                warn!(identity = %identity, error = %e, "Failed to persist profile");
                self.sessions.put(identity, session).await;
                prompts::SAVE_ERROR.to_string()
            }
        }
    }

    async fn build_profile(
        &self,
        identity: &str,
        session: &Session,
        location: crate::transport::Location,
    ) -> Option<Profile> {
        let role = session.data.role?;
        let name = session.data.name.clone().unwrap_or_default();

        let mut profile = Profile::new(identity, role, name);
        profile.location = Some(location.display());
        profile.latitude = Some(location.latitude);
        profile.longitude = Some(location.longitude);
        profile.updated_at = Utc::now();

        match role {
            Role::Shopkeeper => {
                profile.shop_name = session.data.shop_name.clone();
                profile.description = session.data.description.clone();
            }
            Role::Customer => {
                profile.first_interaction = session.data.first_interaction.clone();
                profile.last_interaction = Some(Utc::now());
                // Re-onboarding keeps the running order count.
                if let Ok(Some(existing)) =
                    self.store.find_profile(Role::Customer, identity).await
                {
                    profile.total_orders = existing.total_orders;
                }
            }
        }
        Some(profile)
    }
}
