pub mod conversation;
pub mod faq;
pub mod gemini;

pub use gemini::GeminiClient;
