// libs/chat-cell/src/services/chat.rs
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{ChatError, Conversation, Message, NewConversation, Party};

pub struct ChatService {
    supabase: SupabaseClient,
}

impl ChatService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Open the thread for a freshly confirmed booking.
    pub async fn create_conversation(
        &self,
        request: NewConversation,
        auth_token: &str,
    ) -> Result<Conversation, ChatError> {
        debug!("Creating conversation for booking: {}", request.booking_id);

        let conversation_data = json!({
            "booking_id": request.booking_id,
            "client_id": request.client_id,
            "professional_id": request.professional_id,
            "business_name": request.business_name,
            "service_booked": request.service_booked,
            "last_message": "Conversation started",
            "last_message_time": Utc::now().to_rfc3339(),
            "unread_count_client": 0,
            "unread_count_pro": 0,
            "is_archived": false,
            "created_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/conversations",
                Some(auth_token),
                Some(conversation_data),
                Some(headers),
            )
            .await
            .map_err(|e| ChatError::DatabaseError(e.to_string()))?;

        let Some(row) = result.into_iter().next() else {
            return Err(ChatError::DatabaseError("Failed to create conversation".to_string()));
        };

        serde_json::from_value(row)
            .map_err(|e| ChatError::DatabaseError(format!("Failed to parse conversation: {}", e)))
    }

    /// Active conversations the user participates in, freshest first.
    pub async fn conversations_for_user(
        &self,
        user: &User,
        auth_token: &str,
    ) -> Result<Vec<Conversation>, ChatError> {
        debug!("Fetching conversations for user: {}", user.id);

        let path = format!(
            "/rest/v1/conversations?or=(client_id.eq.{},professional_id.eq.{})&is_archived=eq.false&order=last_message_time.desc",
            user.id, user.id
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ChatError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Conversation>, _>>()
            .map_err(|e| ChatError::DatabaseError(format!("Failed to parse conversations: {}", e)))
    }

    /// Most recent messages of a conversation, oldest first.
    pub async fn messages(
        &self,
        conversation_id: Uuid,
        user: &User,
        auth_token: &str,
    ) -> Result<Vec<Message>, ChatError> {
        let conversation = self.get_conversation(conversation_id, auth_token).await?;
        self.require_participant(&conversation, user)?;

        let path = format!(
            "/rest/v1/messages?conversation_id=eq.{}&order=created_at.asc&limit=50",
            conversation_id
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ChatError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Message>, _>>()
            .map_err(|e| ChatError::DatabaseError(format!("Failed to parse messages: {}", e)))
    }

    /// Append a message and bump the other party's unread counter.
    pub async fn send_message(
        &self,
        conversation_id: Uuid,
        user: &User,
        body: &str,
        auth_token: &str,
    ) -> Result<Message, ChatError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ChatError::ValidationError("Message body is empty".to_string()));
        }

        let conversation = self.get_conversation(conversation_id, auth_token).await?;
        let party = self.require_participant(&conversation, user)?;

        let message_data = json!({
            "conversation_id": conversation_id,
            "sender_id": user.id,
            "body": body,
            "is_read": false,
            "created_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/messages",
                Some(auth_token),
                Some(message_data),
                Some(headers),
            )
            .await
            .map_err(|e| ChatError::DatabaseError(e.to_string()))?;

        let Some(row) = result.into_iter().next() else {
            return Err(ChatError::DatabaseError("Failed to create message".to_string()));
        };

        let message: Message = serde_json::from_value(row)
            .map_err(|e| ChatError::DatabaseError(format!("Failed to parse message: {}", e)))?;

        // Update the list preview and the receiving side's counter.
        // Read-modify-write; no realtime fanout here.
        let mut update_data = serde_json::Map::new();
        update_data.insert("last_message".to_string(), json!(body));
        update_data.insert("last_message_time".to_string(), json!(Utc::now().to_rfc3339()));
        match party {
            Party::Client => {
                update_data.insert(
                    "unread_count_pro".to_string(),
                    json!(conversation.unread_count_pro + 1),
                );
            }
            Party::Professional => {
                update_data.insert(
                    "unread_count_client".to_string(),
                    json!(conversation.unread_count_client + 1),
                );
            }
        }

        self.patch_conversation(conversation_id, Value::Object(update_data), auth_token)
            .await?;

        Ok(message)
    }

    /// Reset the calling party's unread counter and flag their inbound
    /// messages as read.
    pub async fn mark_read(
        &self,
        conversation_id: Uuid,
        user: &User,
        auth_token: &str,
    ) -> Result<(), ChatError> {
        let conversation = self.get_conversation(conversation_id, auth_token).await?;
        let party = self.require_participant(&conversation, user)?;

        let counter_field = match party {
            Party::Client => "unread_count_client",
            Party::Professional => "unread_count_pro",
        };

        self.patch_conversation(conversation_id, json!({ counter_field: 0 }), auth_token)
            .await?;

        let path = format!(
            "/rest/v1/messages?conversation_id=eq.{}&sender_id=neq.{}&is_read=eq.false",
            conversation_id, user.id
        );
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({ "is_read": true })),
                Some(headers),
            )
            .await
            .map_err(|e| ChatError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    pub async fn archive_conversation(
        &self,
        conversation_id: Uuid,
        user: &User,
        auth_token: &str,
    ) -> Result<(), ChatError> {
        let conversation = self.get_conversation(conversation_id, auth_token).await?;
        self.require_participant(&conversation, user)?;

        self.patch_conversation(conversation_id, json!({ "is_archived": true }), auth_token)
            .await
    }

    // Private helper methods

    async fn get_conversation(
        &self,
        conversation_id: Uuid,
        auth_token: &str,
    ) -> Result<Conversation, ChatError> {
        let path = format!("/rest/v1/conversations?id=eq.{}", conversation_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ChatError::DatabaseError(e.to_string()))?;

        let Some(row) = result.into_iter().next() else {
            return Err(ChatError::NotFound);
        };

        serde_json::from_value(row)
            .map_err(|e| ChatError::DatabaseError(format!("Failed to parse conversation: {}", e)))
    }

    fn require_participant(
        &self,
        conversation: &Conversation,
        user: &User,
    ) -> Result<Party, ChatError> {
        conversation.party_of(&user.id).ok_or(ChatError::Unauthorized)
    }

    async fn patch_conversation(
        &self,
        conversation_id: Uuid,
        update: Value,
        auth_token: &str,
    ) -> Result<(), ChatError> {
        let path = format!("/rest/v1/conversations?id=eq.{}", conversation_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(auth_token), Some(update), Some(headers))
            .await
            .map_err(|e| ChatError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
