//! The application session: one object that owns the provider client, the
//! live chat, the audio player, the persisted records and the in-memory
//! transcript. Created at startup, reset on logout.

use tracing::{error, info, warn};

use crate::ai::GeminiClient;
use crate::audio::{decode_podcast, AudioBuffer, AudioOutput, AudioPlayer};
use crate::chat::ChatSession;
use crate::config::Config;
use crate::error::{AgentError, Result};
use crate::prompts::{greeting, OFFLINE_REPLY, PODCAST_PROMPT};
use crate::state::{Message, UserState};
use crate::storage::Storage;

pub struct Session {
    config: Config,
    storage: Storage,
    client: Option<GeminiClient>,
    chat: Option<ChatSession>,
    player: AudioPlayer,
    user: UserState,
    transcript: Vec<Message>,
}

/// A chat request that has been recorded locally and is ready to go out.
///
/// `resolve` can run on a background task; it always yields the text of
/// the model message to append, never an error.
pub struct PendingReply {
    chat: Option<ChatSession>,
    text: String,
}

impl PendingReply {
    pub async fn resolve(self) -> String {
        match self.chat {
            Some(chat) => chat.reply_to(&self.text).await,
            None => {
                warn!("no chat client, replying offline");
                OFFLINE_REPLY.to_string()
            }
        }
    }
}

/// Everything needed to fetch the podcast audio away from the session
#[derive(Clone)]
pub struct PodcastRequest {
    client: GeminiClient,
    model: String,
    voice: String,
}

impl PodcastRequest {
    pub async fn fetch(self) -> Result<AudioBuffer> {
        info!(model = %self.model, voice = %self.voice, "requesting podcast audio");
        let payload = self
            .client
            .synthesize_speech(&self.model, PODCAST_PROMPT, &self.voice)
            .await?;
        decode_podcast(&payload)
    }
}

impl Session {
    /// Load the saved user and transcript and build the provider client.
    /// A missing API key is logged and leaves the session without a client.
    pub fn start(config: Config, storage: Storage, output: impl AudioOutput + 'static) -> Self {
        let client = match config.api_key() {
            Some(key) => Some(GeminiClient::with_base_url(key, &config.api_base)),
            None => {
                error!("API key is missing (set GEMINI_API_KEY or API_KEY)");
                None
            }
        };

        let user = storage
            .load_user()
            .filter(|u| u.is_authenticated)
            .unwrap_or_default();
        let transcript = storage.load_chat().unwrap_or_default();

        info!(
            authenticated = user.is_authenticated,
            messages = transcript.len(),
            "session started"
        );

        Self {
            config,
            storage,
            client,
            chat: None,
            player: AudioPlayer::new(output),
            user,
            transcript,
        }
    }

    pub fn user(&self) -> &UserState {
        &self.user
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_authenticated
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    pub fn login(&mut self, name: &str) -> Result<()> {
        let user = UserState::authenticated(name)?;
        info!(name = %user.name, "user logged in");
        self.storage.save_user(&user);
        self.user = user;
        Ok(())
    }

    /// Forget the user and drop the live conversation. The saved transcript
    /// stays on disk.
    pub fn logout(&mut self) {
        self.storage.clear_user();
        self.user = UserState::default();
        self.chat = None;
        self.player.stop();
        info!("user logged out");
    }

    /// Seed an empty transcript with the personalised greeting
    pub fn ensure_transcript(&mut self) {
        if self.transcript.is_empty() {
            self.transcript.push(Message::model(greeting(&self.user.name)));
            self.storage.save_chat(&self.transcript);
        }
    }

    fn chat_session(&mut self) -> Option<ChatSession> {
        if self.chat.is_none() {
            let client = self.client.clone()?;
            self.chat = Some(ChatSession::new(client, &self.config));
        }
        self.chat.clone()
    }

    /// Record the user's message and hand back the request to run.
    /// Blank input is ignored.
    pub fn begin_send(&mut self, text: &str) -> Option<PendingReply> {
        if text.trim().is_empty() {
            return None;
        }

        self.transcript.push(Message::user(text));
        self.storage.save_chat(&self.transcript);

        Some(PendingReply {
            chat: self.chat_session(),
            text: text.to_string(),
        })
    }

    /// Append the model's reply for a request started with `begin_send`
    pub fn finish_send(&mut self, reply: String) -> &Message {
        self.transcript.push(Message::model(reply));
        self.storage.save_chat(&self.transcript);
        &self.transcript[self.transcript.len() - 1]
    }

    /// Send and wait for the reply in one go
    pub async fn send_message(&mut self, text: &str) -> Option<&Message> {
        let pending = self.begin_send(text)?;
        let reply = pending.resolve().await;
        Some(self.finish_send(reply))
    }

    /// Wipe the saved conversation and start over from the greeting
    pub fn clear_history(&mut self) {
        self.storage.clear_chat();
        self.transcript.clear();
        self.chat = None;
        self.ensure_transcript();
        info!("chat history cleared");
    }

    pub fn podcast_request(&self) -> Result<PodcastRequest> {
        let client = self
            .client
            .clone()
            .ok_or_else(|| AgentError::Config("Gemini client not initialized".to_string()))?;
        Ok(PodcastRequest {
            client,
            model: self.config.tts_model.clone(),
            voice: self.config.voice.clone(),
        })
    }

    /// Play a decoded buffer, stopping whatever was playing
    pub fn play(&mut self, buffer: &AudioBuffer) -> Result<()> {
        self.player.play(buffer)
    }

    pub async fn play_podcast(&mut self) -> Result<()> {
        let buffer = self.podcast_request()?.fetch().await?;
        self.play(&buffer)
    }

    pub fn stop_audio(&mut self) {
        self.player.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_playing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentOutput;
    use crate::state::Role;

    fn offline_session() -> Session {
        Session::start(Config::new(), Storage::in_memory(), SilentOutput)
    }

    #[test]
    fn test_login_and_logout() {
        let mut session = offline_session();
        assert!(!session.is_authenticated());

        assert!(session.login("  ").is_err());
        session.login("Diego").unwrap();
        assert_eq!(session.user().name, "Diego");

        session.logout();
        assert!(!session.is_authenticated());
        assert_eq!(session.user().name, "");
    }

    #[test]
    fn test_ensure_transcript_seeds_greeting_once() {
        let mut session = offline_session();
        session.login("Eva").unwrap();
        session.ensure_transcript();
        session.ensure_transcript();
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].role, Role::Model);
        assert!(session.transcript()[0].text.contains("Eva"));
    }

    #[test]
    fn test_blank_message_is_ignored() {
        let mut session = offline_session();
        assert!(session.begin_send(" \n ").is_none());
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_send_without_client_replies_offline() {
        let mut session = offline_session();
        let reply = session.send_message("Oi").await.unwrap().clone();
        assert_eq!(reply.role, Role::Model);
        assert_eq!(reply.text, OFFLINE_REPLY);

        let roles: Vec<Role> = session.transcript().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Model]);
        assert_eq!(session.transcript()[0].text, "Oi");
    }

    #[test]
    fn test_podcast_needs_client() {
        let session = offline_session();
        assert!(matches!(session.podcast_request(), Err(AgentError::Config(_))));
    }

    #[test]
    fn test_clear_history_resets_to_greeting() {
        let mut session = offline_session();
        session.login("Fabi").unwrap();
        session.begin_send("primeira");
        session.finish_send("resposta".to_string());
        session.clear_history();
        assert_eq!(session.transcript().len(), 1);
        assert!(session.transcript()[0].text.starts_with("Olá Fabi"));
    }
}
