// libs/chat-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// CONVERSATION MODELS
// ==============================================================================

/// Which side of a conversation a user sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Client,
    Professional,
}

/// A client/professional thread, opened when a booking is confirmed.
/// Carries denormalized preview fields so the conversation list renders
/// without joining messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub business_name: String,
    pub service_booked: String,
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
    pub unread_count_client: i32,
    pub unread_count_pro: i32,
    #[serde(default)]
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn party_of(&self, user_id: &str) -> Option<Party> {
        if self.client_id.to_string() == user_id {
            Some(Party::Client)
        } else if self.professional_id.to_string() == user_id {
            Some(Party::Professional)
        } else {
            None
        }
    }

    /// Unread messages waiting for the given side of the conversation.
    pub fn unread_count_for(&self, party: Party) -> i32 {
        match party {
            Party::Client => self.unread_count_client,
            Party::Professional => self.unread_count_pro,
        }
    }
}

/// Sum of unread counters across a user's conversations, each counted on the
/// side the user actually sits on.
pub fn total_unread(conversations: &[Conversation], user_id: &str) -> i32 {
    conversations
        .iter()
        .filter_map(|c| c.party_of(user_id).map(|party| c.unread_count_for(party)))
        .sum()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewConversation {
    pub booking_id: Uuid,
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub business_name: String,
    pub service_booked: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub body: String,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum ChatError {
    #[error("Conversation not found")]
    NotFound,

    #[error("Not a participant of this conversation")]
    Unauthorized,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
