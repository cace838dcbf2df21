use crate::agents::{Agent, AgentError, AgentResponse, ChatRequest};
use crate::ai::{Message, ReasoningClient};
use crate::conversation::ConversationStore;
use async_trait::async_trait;
use std::sync::Arc;

pub const MAX_TWEET_CHARS: usize = 280;

const SYSTEM_PROMPT: &str = "You are a witty social media writer. Write one engaging tweet about \
the topic the user gives you. Reply with the tweet text only, no quotes or hashtags unless they \
add value, and never exceed 280 characters.";

/// Drafts tweets. The last topic is kept on the conversation so that a bare
/// "regenerate" asks for a fresh take on the same subject, and is forgotten
/// when the conversation is cleared or deleted.
pub struct TweetSizzlerAgent {
    reasoning: Arc<dyn ReasoningClient>,
    conversations: Arc<ConversationStore>,
}

fn is_regenerate(prompt: &str) -> bool {
    let prompt = prompt.trim().to_lowercase();
    prompt == "regenerate" || prompt.starts_with("regenerate ") || prompt == "try again"
}

/// Trim surrounding quotes and cap at the tweet length on a char boundary
fn clean_tweet(raw: &str) -> String {
    let text = raw.trim().trim_matches('"').trim();
    if text.chars().count() <= MAX_TWEET_CHARS {
        return text.to_string();
    }
    let mut tweet: String = text.chars().take(MAX_TWEET_CHARS - 1).collect();
    tweet.push('…');
    tweet
}

impl TweetSizzlerAgent {
    pub fn new(reasoning: Arc<dyn ReasoningClient>, conversations: Arc<ConversationStore>) -> Self {
        Self {
            reasoning,
            conversations,
        }
    }
}

#[async_trait]
impl Agent for TweetSizzlerAgent {
    fn name(&self) -> &str {
        "tweet_sizzler"
    }

    fn system_prompt(&self) -> String {
        SYSTEM_PROMPT.to_string()
    }

    fn reasoning(&self) -> Option<&dyn ReasoningClient> {
        Some(self.reasoning.as_ref())
    }

    async fn process_request(&self, request: &ChatRequest) -> Result<AgentResponse, AgentError> {
        let prompt = request.prompt_text().trim();
        let (topic, regenerated) = if is_regenerate(prompt) {
            let topic = self
                .conversations
                .tweet_topic(&request.conversation_id)
                .await
                .ok_or_else(|| {
                    AgentError::Validation("What should the tweet be about?".to_string())
                })?;
            (topic, true)
        } else {
            (prompt.to_string(), false)
        };

        let mut user = format!("Write a tweet about: {}", topic);
        if regenerated {
            user.push_str("\nGive a different take than before.");
        }
        let messages = vec![Message::system(self.system_prompt()), Message::user(user)];
        let response = self
            .reasoning
            .complete(messages, Vec::new())
            .await
            .map_err(AgentError::Reasoning)?;

        let tweet = clean_tweet(&response.content);
        if tweet.is_empty() {
            return Err(AgentError::Reasoning("empty tweet".to_string()));
        }

        self.conversations
            .set_tweet_topic(&request.conversation_id, topic)
            .await;
        Ok(AgentResponse::success(tweet.clone()).with_metadata("tweet", tweet))
    }
}
