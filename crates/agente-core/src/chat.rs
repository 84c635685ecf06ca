//! A running conversation with the coach model.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info};

use crate::ai::{Content, GeminiClient};
use crate::config::Config;
use crate::error::Result;
use crate::prompts::{CONNECTION_ERROR_REPLY, EMPTY_REPLY, SYSTEM_INSTRUCTION};

/// Provider-side conversation state.
///
/// Cloning is cheap and clones share the same history, so a clone can be
/// moved into a background task while the UI keeps its own handle.
#[derive(Clone)]
pub struct ChatSession {
    client: GeminiClient,
    model: String,
    temperature: f32,
    system_instruction: Arc<str>,
    history: Arc<Mutex<Vec<Content>>>,
}

impl ChatSession {
    pub fn new(client: GeminiClient, config: &Config) -> Self {
        Self::with_instruction(client, &config.chat_model, config.temperature, SYSTEM_INSTRUCTION)
    }

    pub fn with_instruction(
        client: GeminiClient,
        model: &str,
        temperature: f32,
        system_instruction: &str,
    ) -> Self {
        info!(model, temperature, "starting chat session");
        Self {
            client,
            model: model.to_string(),
            temperature,
            system_instruction: Arc::from(system_instruction),
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Send a user message and return the raw reply text.
    ///
    /// The exchange is added to the history only when the model produced
    /// text, so a failed call can simply be retried by the user.
    pub async fn send_message(&self, text: &str) -> Result<String> {
        let mut history = self.history.lock().await;

        let mut contents = history.clone();
        contents.push(Content::user(text));

        let reply = self
            .client
            .generate_text(&self.model, &self.system_instruction, &contents, self.temperature)
            .await?;

        if !reply.is_empty() {
            contents.push(Content::model(&reply));
            *history = contents;
        }

        Ok(reply)
    }

    /// Like [`send_message`](Self::send_message) but never fails: provider
    /// errors and empty answers become the fixed fallback replies.
    pub async fn reply_to(&self, text: &str) -> String {
        match self.send_message(text).await {
            Ok(reply) if reply.is_empty() => EMPTY_REPLY.to_string(),
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "error sending message");
                CONNECTION_ERROR_REPLY.to_string()
            }
        }
    }
}
