//! Chat message formatting for order confirmations and shopkeeper
//! notifications.

use crate::classify::category_emoji;
use crate::order::Order;

/// Customer-facing confirmation listing the extracted items by category.
pub fn customer_confirmation(order: &Order) -> String {
    let mut msg = format!("✅ Got it!\n\n📝 You said:\n\"{}\"\n\n", order.utterance);
    msg.push_str(&"=".repeat(40));
    msg.push('\n');
    msg.push_str("🛍️  ITEMS BY CATEGORY:\n");
    msg.push_str(&"=".repeat(40));
    msg.push_str("\n\n");

    for group in &order.groups {
        msg.push_str(&format!(
            "{} {}\n",
            category_emoji(&group.category),
            group.category
        ));
        msg.push_str(&"─".repeat(35));
        msg.push('\n');
        for item in &group.items {
            msg.push_str(&format!("  • {} ({})\n", item.name, item.quantity));
        }
        msg.push('\n');
    }

    msg.push_str(&"=".repeat(40));
    msg.push('\n');
    msg.push_str(&format!("📊 Total Items: {}\n", order.total_items()));
    msg.push_str(&format!("📂 Categories: {}", order.total_categories()));
    msg
}

/// Suffix appended to the confirmation once the order is durably stored.
pub const ORDER_SAVED_SUFFIX: &str = "\n\n✅ Order saved!\n📣 Notifying nearby shopkeepers...";

/// Notification body sent to each shopkeeper.
pub fn shopkeeper_notification(order: &Order) -> String {
    let mut msg = String::from("🔔 NEW ORDER RECEIVED!\n\n");
    msg.push_str(&format!("👤 Customer: {}\n", order.customer_name));
    msg.push_str(&format!("📞 Phone: {}\n", order.customer));
    msg.push_str(&format!("🆔 Order ID: {}\n\n", order.id));
    msg.push_str("📋 Items Requested:\n");
    msg.push_str(&"─".repeat(40));
    msg.push('\n');

    for group in &order.groups {
        msg.push_str(&format!(
            "{} {}\n",
            category_emoji(&group.category),
            group.category
        ));
        for item in &group.items {
            msg.push_str(&format!("  • {} ({})\n", item.name, item.quantity));
        }
    }

    msg.push_str(&"─".repeat(40));
    msg.push('\n');
    msg.push_str(&format!("📊 Total Items: {}\n\n", order.total_items()));
    msg.push_str("Reply to confirm or discuss delivery! ✅");
    msg
}
