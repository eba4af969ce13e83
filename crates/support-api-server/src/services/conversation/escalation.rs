use crate::models::chat::{Role, Session};

/// Terms that force a hand-off regardless of conversation shape.
const ESCALATION_KEYWORDS: &[&str] = &[
    "frustrated",
    "angry",
    "complaint",
    "manager",
    "supervisor",
    "urgent",
    "emergency",
    "security",
    "hacked",
    "billing error",
    "refund not received",
    "damaged product",
    "wrong item",
    "escalate",
];

/// Pure decision: should this conversation leave automated handling?
///
/// Two independent triggers, OR-combined:
/// - any escalation keyword appears in the message (case-insensitive);
/// - the customer's 3 most recent messages arrived within
///   `velocity_threshold_seconds`, a proxy for rapid-fire frustration.
///
/// The caller owns the `escalated`/`escalation_reason` transition.
pub fn needs_escalation(
    message_text: &str,
    session: &Session,
    velocity_threshold_seconds: i64,
) -> bool {
    let message_lower = message_text.to_lowercase();
    if ESCALATION_KEYWORDS.iter().any(|k| message_lower.contains(k)) {
        return true;
    }

    let user_messages: Vec<_> = session
        .messages
        .iter()
        .filter(|m| m.role == Role::User)
        .collect();
    if user_messages.len() >= 3 {
        let recent = &user_messages[user_messages.len() - 3..];
        let span = recent[2].timestamp - recent[0].timestamp;
        if span.num_seconds() < velocity_threshold_seconds {
            return true;
        }
    }

    false
}
