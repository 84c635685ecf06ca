pub mod gemini;

pub use gemini::{Content, GeminiClient, InlineData, Part};
