//! In-memory conversation state keyed by conversation id
//!
//! Each conversation sits behind its own async mutex so requests on
//! different ids never contend, while appends on the same id stay ordered.

use crate::ai::{Message, MessageRole};
use crate::models::ChatMessage;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const DISCLAIMER: &str = "This highly experimental chatbot is not intended for making important \
decisions, and its responses are generated based on incomplete data and algorithms that may evolve \
rapidly. By using this chatbot, you acknowledge that you use it at your own discretion and assume \
all risks associated with its limitations and potential errors.";

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedDocument {
    pub filename: String,
    pub content: String,
}

#[derive(Debug)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    document: Option<UploadedDocument>,
    tweet_topic: Option<String>,
}

impl Conversation {
    fn seeded() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(DISCLAIMER)],
            document: None,
            tweet_topic: None,
        }
    }

    pub fn has_uploaded_file(&self) -> bool {
        self.document.is_some()
    }

    /// The most recent `limit` messages after the seed
    fn recent(&self, limit: usize) -> &[ChatMessage] {
        let turns = &self.messages[1.min(self.messages.len())..];
        &turns[turns.len().saturating_sub(limit)..]
    }
}

#[derive(Default)]
pub struct ConversationStore {
    conversations: DashMap<String, Arc<Mutex<Conversation>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a conversation, creating it with the seed message on first access
    fn entry(&self, id: &str) -> Arc<Mutex<Conversation>> {
        self.conversations
            .entry(id.to_string())
            .or_insert_with(|| {
                log::debug!("[CONVERSATION] Created {}", id);
                Arc::new(Mutex::new(Conversation::seeded()))
            })
            .clone()
    }

    pub fn create(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.entry(&id);
        id
    }

    pub fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.conversations.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub async fn messages(&self, id: &str) -> Vec<ChatMessage> {
        self.entry(id).lock().await.messages.clone()
    }

    pub async fn append(&self, id: &str, message: ChatMessage) {
        self.entry(id).lock().await.messages.push(message);
    }

    /// Recent turns rendered as `role: content` lines for the ranking prompt
    pub async fn chat_history(&self, id: &str, limit: usize) -> String {
        let conversation = self.entry(id);
        let conversation = conversation.lock().await;
        conversation
            .recent(limit)
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Recent turns as reasoning-capability messages
    pub async fn history_messages(&self, id: &str, limit: usize) -> Vec<Message> {
        let conversation = self.entry(id);
        let conversation = conversation.lock().await;
        conversation
            .recent(limit)
            .iter()
            .map(|m| match m.role {
                MessageRole::User => Message::user(m.content.clone()),
                MessageRole::System => Message::system(m.content.clone()),
                MessageRole::Assistant => Message::assistant(m.content.clone()),
            })
            .collect()
    }

    pub async fn has_uploaded_file(&self, id: &str) -> bool {
        self.entry(id).lock().await.has_uploaded_file()
    }

    pub async fn set_uploaded_document(&self, id: &str, document: UploadedDocument) {
        log::info!(
            "[CONVERSATION] {} received upload {} ({} bytes)",
            id,
            document.filename,
            document.content.len()
        );
        self.entry(id).lock().await.document = Some(document);
    }

    pub async fn uploaded_document(&self, id: &str) -> Option<UploadedDocument> {
        self.entry(id).lock().await.document.clone()
    }

    /// Topic of the last tweet drafted in this conversation
    pub async fn tweet_topic(&self, id: &str) -> Option<String> {
        self.entry(id).lock().await.tweet_topic.clone()
    }

    pub async fn set_tweet_topic(&self, id: &str, topic: String) {
        self.entry(id).lock().await.tweet_topic = Some(topic);
    }

    /// Reset to the seed message, dropping any uploaded document and tweet topic
    pub async fn clear(&self, id: &str) {
        *self.entry(id).lock().await = Conversation::seeded();
    }

    pub fn delete(&self, id: &str) -> bool {
        self.conversations.remove(id).is_some()
    }
}
