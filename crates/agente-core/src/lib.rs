pub mod ai;
pub mod audio;
pub mod chat;
pub mod config;
pub mod ebook;
pub mod error;
pub mod prompts;
pub mod session;
pub mod state;
pub mod storage;

// Re-export main types for convenience
pub use ai::GeminiClient;
pub use audio::{AudioBuffer, AudioOutput, AudioPlayer, PlaybackStream, SilentOutput};
pub use chat::ChatSession;
pub use config::Config;
pub use ebook::EbookChapter;
pub use error::{AgentError, Result};
pub use session::Session;
pub use state::{Message, Role, UserState};
pub use storage::{FileStore, KeyValueStore, MemoryStore, Storage};
