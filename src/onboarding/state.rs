//! Onboarding state machine — tracks which step a new identity is in.

use serde::{Deserialize, Serialize};

use crate::store::Role;

/// The steps of the onboarding conversation.
///
/// Progresses linearly, with the shop steps only for shopkeepers:
/// AwaitingName → AwaitingRole → (AwaitingShopName → AwaitingShopDescription)
/// → AwaitingLocation → done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    AwaitingName,
    AwaitingRole,
    AwaitingShopName,
    AwaitingShopDescription,
    AwaitingLocation,
}

impl OnboardingStep {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: OnboardingStep) -> bool {
        use OnboardingStep::*;
        matches!(
            (self, target),
            (AwaitingName, AwaitingRole)
                | (AwaitingRole, AwaitingShopName)
                | (AwaitingRole, AwaitingLocation)
                | (AwaitingShopName, AwaitingShopDescription)
                | (AwaitingShopDescription, AwaitingLocation)
        )
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AwaitingName => "awaiting_name",
            Self::AwaitingRole => "awaiting_role",
            Self::AwaitingShopName => "awaiting_shop_name",
            Self::AwaitingShopDescription => "awaiting_shop_description",
            Self::AwaitingLocation => "awaiting_location",
        };
        write!(f, "{s}")
    }
}

/// Accumulated answers from the steps completed so far.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Channel of the first contact: "voice" or "text".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_interaction: Option<String>,
}

/// Transient onboarding progress for one identity.
///
/// Lives only in the session store; destroyed when onboarding completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub step: OnboardingStep,
    pub data: SessionData,
}

impl Session {
    /// Fresh session at the first step.
    pub fn new() -> Self {
        Self {
            step: OnboardingStep::AwaitingName,
            data: SessionData::default(),
        }
    }

    /// Fresh session recording which channel started it.
    pub fn started_via(channel: &str) -> Self {
        let mut session = Self::new();
        session.data.first_interaction = Some(channel.to_string());
        session
    }

    /// Advance to `target`, or leave the step untouched if the transition
    /// is not in the table.
    pub fn advance_to(&mut self, target: OnboardingStep) -> bool {
        if self.step.can_transition_to(target) {
            self.step = target;
            true
        } else {
            false
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use OnboardingStep::*;
        let transitions = [
            (AwaitingName, AwaitingRole),
            (AwaitingRole, AwaitingShopName),
            (AwaitingRole, AwaitingLocation),
            (AwaitingShopName, AwaitingShopDescription),
            (AwaitingShopDescription, AwaitingLocation),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use OnboardingStep::*;
        // Skip steps
        assert!(!AwaitingName.can_transition_to(AwaitingLocation));
        assert!(!AwaitingName.can_transition_to(AwaitingShopName));
        // Go backward
        assert!(!AwaitingLocation.can_transition_to(AwaitingName));
        assert!(!AwaitingShopDescription.can_transition_to(AwaitingShopName));
        // Self-transition
        assert!(!AwaitingRole.can_transition_to(AwaitingRole));
        // Customers never see the shop steps
        assert!(!AwaitingLocation.can_transition_to(AwaitingShopDescription));
    }

    #[test]
    fn new_session_awaits_name() {
        let session = Session::new();
        assert_eq!(session.step, OnboardingStep::AwaitingName);
        assert!(session.data.name.is_none());
        assert!(session.data.role.is_none());
    }

    #[test]
    fn advance_rejects_invalid_target() {
        let mut session = Session::new();
        assert!(!session.advance_to(OnboardingStep::AwaitingLocation));
        assert_eq!(session.step, OnboardingStep::AwaitingName);
        assert!(session.advance_to(OnboardingStep::AwaitingRole));
        assert_eq!(session.step, OnboardingStep::AwaitingRole);
    }

    #[test]
    fn display_matches_serde() {
        use OnboardingStep::*;
        for step in [
            AwaitingName,
            AwaitingRole,
            AwaitingShopName,
            AwaitingShopDescription,
            AwaitingLocation,
        ] {
            let display = format!("{step}");
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{display}\""), json);
        }
    }
}
