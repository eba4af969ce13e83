use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ===== CONVERSATION ENTITIES =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of a conversation. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Full state of one customer's conversation, keyed by `session_id`.
/// Owned exclusively by the session store; mutated only under its
/// per-session lock.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub session_id: String,
    pub customer_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub messages: Vec<Message>,
    pub escalated: bool,
    pub escalation_reason: Option<String>,
}

impl Session {
    pub fn new(session_id: impl Into<String>, customer_name: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            customer_name,
            created_at: now,
            last_activity: now,
            messages: Vec::new(),
            escalated: false,
            escalation_reason: None,
        }
    }

    /// Record activity on the session. Never moves `last_activity` backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_activity {
            self.last_activity = now;
        }
    }

    /// Append a message, clamping its timestamp so the sequence stays
    /// non-decreasing even if the caller's clock stepped back.
    pub fn append(&mut self, role: Role, content: impl Into<String>, now: DateTime<Utc>) {
        let timestamp = match self.messages.last() {
            Some(last) => last.timestamp.max(now),
            None => now,
        };
        self.messages.push(Message {
            role,
            content: content.into(),
            timestamp,
        });
        self.touch(timestamp);
    }

    /// One-way transition out of automated handling. The first reason wins;
    /// later calls are no-ops.
    pub fn escalate(&mut self, reason: impl Into<String>) {
        if !self.escalated {
            self.escalated = true;
            self.escalation_reason = Some(reason.into());
        }
    }

    pub fn is_idle(&self, now: DateTime<Utc>, idle_timeout_seconds: i64) -> bool {
        (now - self.last_activity).num_seconds() > idle_timeout_seconds
    }
}

// ===== BACKEND WIRE MODEL =====

/// Role-tagged message sent to the generative backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

// ===== REQUEST MODELS =====

#[derive(Debug, Deserialize, Default)]
pub struct NewSessionRequest {
    #[serde(default)]
    pub customer_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub session_id: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EscalationRequest {
    pub session_id: String,
    pub reason: String,
}

// ===== RESPONSE MODELS =====

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct NewSessionResponse {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub session_id: String,
    pub response: String,
    pub escalated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct EscalationResponse {
    pub session_id: String,
    pub status: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn append_keeps_timestamps_non_decreasing() {
        let t0 = Utc::now();
        let mut session = Session::new("s1", None, t0);

        session.append(Role::User, "first", t0 + Duration::seconds(10));
        // Clock stepped backwards between appends
        session.append(Role::Assistant, "second", t0 + Duration::seconds(5));

        assert_eq!(session.messages.len(), 2);
        assert!(session.messages[1].timestamp >= session.messages[0].timestamp);
        assert!(session.last_activity >= session.messages[1].timestamp);
    }

    #[test]
    fn escalate_is_one_way_and_keeps_first_reason() {
        let mut session = Session::new("s1", None, Utc::now());
        session.escalate("first reason");
        session.escalate("second reason");

        assert!(session.escalated);
        assert_eq!(session.escalation_reason.as_deref(), Some("first reason"));
    }

    #[test]
    fn idle_check_uses_last_activity() {
        let t0 = Utc::now();
        let mut session = Session::new("s1", None, t0);
        assert!(!session.is_idle(t0 + Duration::seconds(3600), 3600));
        assert!(session.is_idle(t0 + Duration::seconds(3601), 3600));

        session.touch(t0 + Duration::seconds(1800));
        assert!(!session.is_idle(t0 + Duration::seconds(3601), 3600));
    }
}
