use agente_core::audio::AudioBuffer;
use agente_core::ebook;
use agente_core::prompts::CONNECTION_ERROR_REPLY;
use agente_core::Session;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Auth,
    Dashboard,
    Ebook,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// The two entry cards on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardCard {
    #[default]
    Chat,
    Ebook,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub session: Session,

    // Auth state
    pub name_input: String,
    pub name_cursor: usize,
    pub auth_error: Option<String>,

    // Dashboard state
    pub dashboard_card: DashboardCard,

    // E-book state
    pub chapter_state: ListState,
    pub expanded_chapter: Option<usize>,
    pub ebook_scroll: u16,

    // Chat state
    pub chat_input: String,
    pub chat_cursor: usize, // cursor position in chat_input, in chars
    pub chat_loading: bool,
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub reply_task: Option<JoinHandle<String>>,
    pub confirm_clear: bool,

    // Podcast state
    pub podcast_task: Option<JoinHandle<agente_core::Result<AudioBuffer>>>,
    pub status: Option<String>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(session: Session) -> Self {
        let screen = if session.is_authenticated() {
            Screen::Dashboard
        } else {
            Screen::Auth
        };
        let input_mode = if screen == Screen::Auth {
            InputMode::Editing
        } else {
            InputMode::Normal
        };

        let mut chapter_state = ListState::default();
        chapter_state.select(Some(0));

        let status = if session.has_client() {
            None
        } else {
            Some("Sem chave de API: defina GEMINI_API_KEY para conversar com o agente".to_string())
        };

        Self {
            should_quit: false,
            screen,
            input_mode,
            session,

            name_input: String::new(),
            name_cursor: 0,
            auth_error: None,

            dashboard_card: DashboardCard::default(),

            chapter_state,
            expanded_chapter: Some(0),
            ebook_scroll: 0,

            chat_input: String::new(),
            chat_cursor: 0,
            chat_loading: false,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            reply_task: None,
            confirm_clear: false,

            podcast_task: None,
            status,

            animation_frame: 0,
        }
    }

    // Session lifecycle

    pub fn submit_login(&mut self) {
        match self.session.login(&self.name_input) {
            Ok(()) => {
                self.name_input.clear();
                self.name_cursor = 0;
                self.auth_error = None;
                self.input_mode = InputMode::Normal;
                self.screen = Screen::Dashboard;
            }
            Err(e) => {
                self.auth_error = Some(e.to_string());
            }
        }
    }

    pub fn logout(&mut self) {
        self.abandon_background_tasks();
        self.confirm_clear = false;
        self.session.logout();
        self.screen = Screen::Auth;
        self.input_mode = InputMode::Editing;
        self.status = None;
    }

    /// Stop in-flight work. A chat request that never got its reply is
    /// closed with the connection-failure reply so the transcript does not
    /// end on an unanswered user message.
    pub fn abandon_background_tasks(&mut self) {
        if let Some(task) = self.reply_task.take() {
            task.abort();
            warn!("chat request abandoned before the reply arrived");
            self.session.finish_send(CONNECTION_ERROR_REPLY.to_string());
        }
        if let Some(task) = self.podcast_task.take() {
            task.abort();
        }
        self.chat_loading = false;
    }

    /// Called once when the TUI exits
    pub fn shutdown(&mut self) {
        self.abandon_background_tasks();
        self.session.stop_audio();
    }

    // Screen switching

    pub fn open_dashboard(&mut self) {
        self.screen = Screen::Dashboard;
        self.input_mode = InputMode::Normal;
    }

    pub fn open_ebook(&mut self) {
        self.screen = Screen::Ebook;
        self.input_mode = InputMode::Normal;
    }

    pub fn open_chat(&mut self) {
        self.session.ensure_transcript();
        self.screen = Screen::Chat;
        self.input_mode = InputMode::Editing;
        self.scroll_chat_to_bottom();
    }

    pub fn open_selected_card(&mut self) {
        match self.dashboard_card {
            DashboardCard::Chat => self.open_chat(),
            DashboardCard::Ebook => self.open_ebook(),
        }
    }

    pub fn toggle_dashboard_card(&mut self) {
        self.dashboard_card = match self.dashboard_card {
            DashboardCard::Chat => DashboardCard::Ebook,
            DashboardCard::Ebook => DashboardCard::Chat,
        };
    }

    // E-book navigation

    pub fn chapter_down(&mut self) {
        let len = ebook::chapters().len();
        let i = self.chapter_state.selected().unwrap_or(0);
        self.chapter_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn chapter_up(&mut self) {
        let i = self.chapter_state.selected().unwrap_or(0);
        self.chapter_state.select(Some(i.saturating_sub(1)));
    }

    /// Accordion: opening a chapter closes the other one, opening the open one closes it
    pub fn toggle_chapter(&mut self) {
        let selected = self.chapter_state.selected().unwrap_or(0);
        self.expanded_chapter = if self.expanded_chapter == Some(selected) {
            None
        } else {
            Some(selected)
        };
        self.ebook_scroll = 0;
    }

    pub fn ebook_scroll_down(&mut self) {
        self.ebook_scroll = self.ebook_scroll.saturating_add(1);
    }

    pub fn ebook_scroll_up(&mut self) {
        self.ebook_scroll = self.ebook_scroll.saturating_sub(1);
    }

    // Chat

    /// Start a request for the typed message. Ignored while another one is out.
    pub fn send_chat(&mut self) {
        if self.chat_loading || self.reply_task.is_some() {
            return;
        }

        let Some(pending) = self.session.begin_send(&self.chat_input) else {
            return;
        };

        self.chat_input.clear();
        self.chat_cursor = 0;
        self.chat_loading = true;

        // Scroll to bottom so the loading indicator is visible
        self.scroll_chat_to_bottom();

        self.reply_task = Some(tokio::spawn(pending.resolve()));
    }

    pub fn clear_chat_history(&mut self) {
        self.confirm_clear = false;
        if self.chat_loading {
            return;
        }
        self.session.clear_history();
        self.chat_scroll = 0;
    }

    pub fn chat_scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1).min(self.max_chat_scroll());
    }

    pub fn chat_scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    /// Scroll chat so the last message (or the loading line) is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self.max_chat_scroll();
    }

    /// Largest scroll offset that still leaves the last line on screen
    pub fn max_chat_scroll(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.session.transcript() {
            total_lines = total_lines.saturating_add(1); // Role line
            for line in msg.text.lines() {
                // Character count, not byte length, for UTF-8 text
                let char_count = line.chars().count();
                let wrapped = if char_count == 0 {
                    1
                } else {
                    (char_count / wrap_width) + 1
                };
                total_lines = total_lines.saturating_add(wrapped as u16);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.chat_loading {
            total_lines = total_lines.saturating_add(2);
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        total_lines.saturating_sub(visible_height)
    }

    // Podcast

    pub fn podcast_loading(&self) -> bool {
        self.podcast_task.is_some()
    }

    /// Play the audio summary, or stop it if it is playing or on its way
    pub fn toggle_podcast(&mut self) {
        if let Some(task) = self.podcast_task.take() {
            task.abort();
            self.status = Some("Podcast cancelado".to_string());
            return;
        }
        if self.session.is_playing() {
            self.session.stop_audio();
            self.status = Some("Podcast parado".to_string());
            return;
        }

        match self.session.podcast_request() {
            Ok(request) => {
                info!("fetching podcast audio");
                self.status = Some("Gerando podcast...".to_string());
                self.podcast_task = Some(tokio::spawn(request.fetch()));
            }
            Err(e) => {
                self.status = Some(format!("Erro ao gerar podcast: {}", e));
            }
        }
    }

    // Background work

    /// Collect finished background tasks. Called once per event loop turn.
    pub async fn poll_tasks(&mut self) {
        if self.reply_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.reply_task.take() {
                let reply = match task.await {
                    Ok(reply) => reply,
                    Err(e) => {
                        error!(error = %e, "chat task failed");
                        CONNECTION_ERROR_REPLY.to_string()
                    }
                };
                self.session.finish_send(reply);
                self.chat_loading = false;
                self.scroll_chat_to_bottom();
            }
        }

        if self.podcast_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.podcast_task.take() {
                let outcome = match task.await {
                    Ok(result) => result.and_then(|buffer| self.session.play(&buffer)),
                    Err(e) => Err(agente_core::AgentError::Audio(e.to_string())),
                };
                self.status = Some(match outcome {
                    Ok(()) => "Tocando podcast (p para parar)".to_string(),
                    Err(e) => {
                        error!(error = %e, "podcast failed");
                        format!("Erro ao gerar podcast: {}", e)
                    }
                });
            }
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat_loading || self.podcast_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agente_core::{Config, Role, SilentOutput, Storage};

    fn app() -> App {
        App::new(Session::start(Config::new(), Storage::in_memory(), SilentOutput))
    }

    #[test]
    fn test_starts_on_auth_without_saved_user() {
        let app = app();
        assert_eq!(app.screen, Screen::Auth);
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[test]
    fn test_login_moves_to_dashboard() {
        let mut app = app();
        app.submit_login();
        assert_eq!(app.screen, Screen::Auth);
        assert!(app.auth_error.is_some());

        app.name_input = "Helena".to_string();
        app.submit_login();
        assert_eq!(app.screen, Screen::Dashboard);
        assert_eq!(app.session.user().name, "Helena");
    }

    #[test]
    fn test_chapter_accordion() {
        let mut app = app();
        assert_eq!(app.expanded_chapter, Some(0));
        app.toggle_chapter();
        assert_eq!(app.expanded_chapter, None);
        app.chapter_down();
        app.chapter_down();
        app.toggle_chapter();
        assert_eq!(app.expanded_chapter, Some(2));
        for _ in 0..10 {
            app.chapter_down();
        }
        assert_eq!(app.chapter_state.selected(), Some(ebook::chapters().len() - 1));
    }

    #[tokio::test]
    async fn test_offline_send_appends_single_reply() {
        let mut app = app();
        app.name_input = "Igor".to_string();
        app.submit_login();
        app.open_chat();

        app.chat_input = "Oi".to_string();
        app.send_chat();
        assert!(app.chat_loading);

        // A second send while loading is ignored
        app.chat_input = "de novo".to_string();
        app.send_chat();

        if let Some(task) = app.reply_task.as_ref() {
            while !task.is_finished() {
                tokio::task::yield_now().await;
            }
        }
        app.poll_tasks().await;

        assert!(!app.chat_loading);
        assert_eq!(app.session.transcript().len(), 3);
        assert_eq!(app.chat_input, "de novo");
    }

    #[tokio::test]
    async fn test_logout_with_pending_reply_closes_the_exchange() {
        let mut app = app();
        app.name_input = "Igor".to_string();
        app.submit_login();
        app.open_chat();

        app.chat_input = "Oi".to_string();
        app.send_chat();
        assert!(app.reply_task.is_some());

        app.logout();
        app.poll_tasks().await;

        let roles: Vec<Role> = app.session.transcript().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Model, Role::User, Role::Model]);
        assert_eq!(app.session.transcript()[2].text, CONNECTION_ERROR_REPLY);
        assert!(!app.chat_loading);
        assert!(app.reply_task.is_none());
    }

    #[tokio::test]
    async fn test_shutdown_with_pending_reply_appends_one_reply() {
        let mut app = app();
        app.name_input = "Igor".to_string();
        app.submit_login();
        app.open_chat();

        app.chat_input = "Oi".to_string();
        app.send_chat();
        app.shutdown();
        app.shutdown();

        let transcript = app.session.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[2].role, Role::Model);
    }

    #[test]
    fn test_chat_scroll_stops_at_last_line() {
        let mut app = app();
        app.name_input = "Igor".to_string();
        app.submit_login();
        app.open_chat();
        app.chat_height = 2;
        app.chat_width = 40;

        for _ in 0..50 {
            app.chat_scroll_down();
        }
        assert_eq!(app.chat_scroll, app.max_chat_scroll());

        app.scroll_chat_to_bottom();
        let bottom = app.chat_scroll;
        app.chat_scroll_down();
        assert_eq!(app.chat_scroll, bottom);
    }
}
