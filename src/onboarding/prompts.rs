//! Onboarding prompt and reply strings.

use crate::store::Role;

/// First-contact greeting for a plain text message.
pub const WELCOME_TEXT: &str = "👋 Welcome! What's your name? 👤";

/// First-contact greeting when the first event was a voice note — the
/// order is deferred until onboarding completes.
pub const WELCOME_VOICE: &str = "👋 Welcome! Before I process your order, what's your name? 👤";

pub const NAME_REPROMPT: &str = "Please send your name 👤";

pub const ROLE_PROMPT: &str = "Thanks! 👤\n\nAre you a:\n1️⃣ Customer (buying items)\n2️⃣ Shopkeeper (selling items)\n\nReply with 1 or 2";

pub const ROLE_REPROMPT: &str = "Please reply with 1 (Customer) or 2 (Shopkeeper)";

pub const CUSTOMER_LOCATION_PROMPT: &str =
    "Great! 🛍️\n\nPlease share your location 📍\n(Click the attachment button and select 'Location')";

pub const SHOP_NAME_PROMPT: &str = "Welcome Shopkeeper! 🏪\n\nWhat's your shop name?";

pub const SHOP_NAME_REPROMPT: &str = "Please send your shop name 🏪";

pub const SHOP_LOCATION_PROMPT: &str =
    "Perfect! 📍\n\nNow please share your shop location\n(Click the attachment button and select 'Location')";

pub const LOCATION_REPROMPT: &str =
    "📍 Please share your actual location using WhatsApp's location feature";

pub const SAVE_ERROR: &str = "❌ Error saving location. Please try again.";

pub fn shop_description_prompt(shop_name: &str) -> String {
    format!("Nice! {shop_name} 🏪\n\nBriefly describe what you sell (or reply 'skip')")
}

pub fn welcome_customer(name: &str) -> String {
    format!("✅ Welcome {name}! 🎉\n\nYour profile is set up. You can now send me orders! 📝")
}

pub fn welcome_shopkeeper(shop_name: &str) -> String {
    format!("✅ Welcome {shop_name}! 🎉\n\nYour profile is set up. You're ready to go! 🚀")
}

/// Parse a role reply. Case-insensitive over the accepted token set.
pub fn parse_role(text: &str) -> Option<Role> {
    match text.trim().to_lowercase().as_str() {
        "1" | "customer" | "buying" => Some(Role::Customer),
        "2" | "shopkeeper" | "seller" | "selling" => Some(Role::Shopkeeper),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exactly_the_listed_role_tokens() {
        for token in ["1", "customer", "buying", "CUSTOMER", "Buying"] {
            assert_eq!(parse_role(token), Some(Role::Customer), "{token}");
        }
        for token in ["2", "shopkeeper", "seller", "selling", "SELLER", "Selling"] {
            assert_eq!(parse_role(token), Some(Role::Shopkeeper), "{token}");
        }
        for token in ["", "3", "buyer", "shop", "yes", "customer please"] {
            assert_eq!(parse_role(token), None, "{token}");
        }
    }

    #[test]
    fn role_tokens_tolerate_surrounding_whitespace() {
        assert_eq!(parse_role("  1  "), Some(Role::Customer));
        assert_eq!(parse_role(" selling\n"), Some(Role::Shopkeeper));
    }

    #[test]
    fn welcome_replies_embed_the_name() {
        assert!(welcome_customer("Asha").contains("Welcome Asha!"));
        assert!(welcome_shopkeeper("Ravi Stores").contains("Welcome Ravi Stores!"));
    }
}
